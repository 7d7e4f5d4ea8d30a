//! Login flow: email, password.

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::{info, warn};

use crate::bot::ui_builder::main_menu_keyboard;
use crate::dialogue::{BotDialogue, LoginState, State};
use crate::session::{Screen, Sessions};
use crate::storage::Storage;
use crate::validation::hash_password;

/// Entry point, reached from the welcome screen's Log in button.
pub async fn start(
    bot: &Bot,
    chat_id: ChatId,
    anchor: MessageId,
    dialogue: BotDialogue,
) -> Result<()> {
    bot.edit_message_text(chat_id, anchor, "🔑 Welcome back!\n\nEnter your email:")
        .await?;
    dialogue
        .update(State::Login(LoginState::AwaitEmail { anchor }))
        .await?;
    Ok(())
}

pub async fn handle_text(
    bot: &Bot,
    msg: &Message,
    text: &str,
    dialogue: BotDialogue,
    storage: &Storage,
    sessions: &Sessions,
    state: LoginState,
) -> Result<()> {
    sessions.track(msg.chat.id, msg.id).await;

    match state {
        LoginState::AwaitEmail { anchor } => {
            let sent = bot.send_message(msg.chat.id, "🔒 And your password:").await?;
            sessions.track(msg.chat.id, sent.id).await;
            dialogue
                .update(State::Login(LoginState::AwaitPassword {
                    anchor,
                    email: text.trim().to_string(),
                }))
                .await?;
            Ok(())
        }
        LoginState::AwaitPassword { anchor, email } => {
            password_input(bot, msg, text, dialogue, storage, sessions, anchor, email).await
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn password_input(
    bot: &Bot,
    msg: &Message,
    text: &str,
    dialogue: BotDialogue,
    storage: &Storage,
    sessions: &Sessions,
    anchor: MessageId,
    email: String,
) -> Result<()> {
    match storage
        .find_user_by_credentials(&email, &hash_password(text))
        .await
    {
        Some(user) => {
            sessions.clear_screen(bot, msg.chat.id).await;
            // The welcome message has served its purpose.
            if let Err(err) = bot.delete_message(msg.chat.id, anchor).await {
                warn!(chat_id = %msg.chat.id, error = %err, "failed to delete the welcome message");
            }

            let sent = bot
                .send_message(
                    msg.chat.id,
                    format!(
                        "✅ Hi, {}! Great to see you.\n\n🏠 Main menu. Where to next?",
                        user.full_name
                    ),
                )
                .reply_markup(main_menu_keyboard())
                .await?;
            sessions.set_screen(msg.chat.id, Screen::single(sent.id)).await;
            dialogue.exit().await?;

            info!(user_id = user.id, "user logged in");
        }
        None => {
            // The failure notice doubles as the re-prompt: the next text is
            // treated as a fresh email.
            let sent = bot
                .send_message(
                    msg.chat.id,
                    "❌ Wrong email or password. Let's try again.\n\nEnter your email:",
                )
                .await?;
            sessions.track(msg.chat.id, sent.id).await;
            dialogue
                .update(State::Login(LoginState::AwaitEmail { anchor }))
                .await?;
        }
    }
    Ok(())
}
