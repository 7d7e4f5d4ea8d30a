//! Message Handler module for routing incoming Telegram messages
//!
//! Text goes to the slash commands first, then to whichever flow the chat's
//! dialogue is in; photos only matter to the two flows with an image step.
//! Command-shaped text we do not recognize is dropped so it never becomes a
//! form answer.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::FileId;
use tracing::{debug, error};

use crate::dialogue::{BotDialogue, State};
use crate::pending::PendingLedger;
use crate::session::Sessions;
use crate::storage::Storage;

use super::commands::{self, Command};
use super::flows;

/// Fetch a file from the Bot API and store it at `dest`, creating the parent
/// directory if needed.
pub async fn download_photo(bot: &Bot, file_id: FileId, dest: &Path) -> Result<()> {
    let file = bot.get_file(file_id).await?;
    let url = format!(
        "https://api.telegram.org/file/bot{}/{}",
        bot.token(),
        file.path
    );

    let response = reqwest::get(&url).await?;
    let bytes = response.bytes().await?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    tokio::fs::write(dest, &bytes)
        .await
        .with_context(|| format!("writing {}", dest.display()))?;

    debug!(dest = %dest.display(), bytes = bytes.len(), "photo downloaded");
    Ok(())
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    dialogue: BotDialogue,
    storage: Arc<Storage>,
    sessions: Sessions,
    pending: PendingLedger,
) -> Result<()> {
    if let Err(err) = dispatch_message(&bot, &msg, dialogue, &storage, &sessions, &pending).await {
        error!(chat_id = %msg.chat.id, error = %err, "message handler failed");
        // The failure note joins the screen so the next render sweeps it away.
        if let Ok(sent) = bot
            .send_message(msg.chat.id, "❌ Something went wrong. Please try again.")
            .await
        {
            sessions.track(msg.chat.id, sent.id).await;
        }
    }
    Ok(())
}

/// Slash-prefixed text that is not one of our commands, like `/help`.
/// Mid-flow it must not be taken as the answer to the current prompt, so it
/// is dropped and the flow keeps waiting.
fn is_stray_command(text: &str) -> bool {
    text.trim_start().starts_with('/') && Command::parse(text).is_none()
}

async fn dispatch_message(
    bot: &Bot,
    msg: &Message,
    dialogue: BotDialogue,
    storage: &Storage,
    sessions: &Sessions,
    pending: &PendingLedger,
) -> Result<()> {
    if let Some(text) = msg.text() {
        if let Some(command) = Command::parse(text) {
            return commands::handle_command(bot, msg, command, dialogue, storage, sessions, pending)
                .await;
        }
        if is_stray_command(text) {
            debug!(chat_id = %msg.chat.id, text, "unknown command, ignored");
            return Ok(());
        }
        return handle_flow_text(bot, msg, text, dialogue, storage, sessions).await;
    }
    if msg.photo().is_some() {
        return handle_photo(bot, msg, dialogue, storage, sessions).await;
    }

    debug!(chat_id = %msg.chat.id, "ignoring unsupported message kind");
    Ok(())
}

/// Route plain text into the active flow. Outside of any flow the text is
/// dropped: every screen of this bot is driven by buttons.
async fn handle_flow_text(
    bot: &Bot,
    msg: &Message,
    text: &str,
    dialogue: BotDialogue,
    storage: &Storage,
    sessions: &Sessions,
) -> Result<()> {
    let state = dialogue.get().await?.unwrap_or_default();
    match state {
        State::Idle => {
            debug!(chat_id = %msg.chat.id, "text outside any flow, ignored");
            Ok(())
        }
        State::Register(state) => {
            flows::registration::handle_text(bot, msg, text, dialogue, storage, sessions, state)
                .await
        }
        State::Login(state) => {
            flows::login::handle_text(bot, msg, text, dialogue, storage, sessions, state).await
        }
        State::EditProfile { field } => {
            flows::profile::field_input(bot, msg, text, dialogue, storage, sessions, field).await
        }
        State::ChangePassword => {
            flows::profile::password_input(bot, msg, text, dialogue, storage, sessions).await
        }
        State::CreateEvent(state) => {
            flows::events::handle_text(bot, msg, text, dialogue, sessions, state).await
        }
        State::Purchase(state) => {
            flows::purchase::handle_text(bot, msg, text, dialogue, storage, sessions, state).await
        }
        State::PostNews(state) => {
            flows::news::handle_text(bot, msg, text, dialogue, sessions, state).await
        }
    }
}

/// Photos are only meaningful on the image step of the event and news forms.
async fn handle_photo(
    bot: &Bot,
    msg: &Message,
    dialogue: BotDialogue,
    storage: &Storage,
    sessions: &Sessions,
) -> Result<()> {
    let state = dialogue.get().await?.unwrap_or_default();
    match state {
        State::CreateEvent(state) => {
            flows::events::photo_input(bot, msg, dialogue, storage, sessions, state).await
        }
        State::PostNews(state) => {
            flows::news::photo_input(bot, msg, dialogue, storage, sessions, state).await
        }
        _ => {
            debug!(chat_id = %msg.chat.id, "photo outside an image step, ignored");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_commands_are_kept_out_of_flows() {
        // "/help" typed mid-registration must not become the full name.
        assert!(is_stray_command("/help"));
        assert!(is_stray_command("/menu please"));
        assert!(is_stray_command("  /oops"));

        // Known commands and plain answers keep their routes.
        assert!(!is_stray_command("/start"));
        assert!(!is_stray_command("/cancel"));
        assert!(!is_stray_command("/confirm @anna"));
        assert!(!is_stray_command("Boris Ivanov"));
    }
}
