//! Slash commands: `/start`, `/cancel` and the admin-only `/confirm`.

use anyhow::Result;
use teloxide::prelude::*;
use tracing::{info, warn};

use crate::bot::menu;
use crate::bot::ui_builder::{login_register_keyboard, main_menu_keyboard};
use crate::dialogue::BotDialogue;
use crate::pending::PendingLedger;
use crate::session::{Screen, Sessions};
use crate::storage::Storage;
use crate::tickets;

/// A recognized slash command. Anything else is treated as plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start`: reset the session and show the welcome screen.
    Start,
    /// `/cancel`: abandon the active flow without side effects.
    Cancel,
    /// `/confirm @handle`: issue tickets for a buyer's pending payments.
    Confirm { argument: Option<String> },
}

impl Command {
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.trim().split_whitespace();
        let head = parts.next()?;
        // Group chats suffix commands with the bot name, e.g. /start@SomeBot.
        let name = head.strip_prefix('/')?.split('@').next()?;
        match name {
            "start" => Some(Command::Start),
            "cancel" => Some(Command::Cancel),
            "confirm" => Some(Command::Confirm {
                argument: parts.next().map(str::to_string),
            }),
            _ => None,
        }
    }
}

pub async fn handle_command(
    bot: &Bot,
    msg: &Message,
    command: Command,
    dialogue: BotDialogue,
    storage: &Storage,
    sessions: &Sessions,
    pending: &PendingLedger,
) -> Result<()> {
    match command {
        Command::Start => start(bot, msg, dialogue, sessions).await,
        Command::Cancel => cancel(bot, msg, dialogue, storage, sessions).await,
        Command::Confirm { argument } => confirm(bot, msg, storage, pending, argument).await,
    }
}

/// `/start`: drop whatever was going on and show the welcome screen.
async fn start(
    bot: &Bot,
    msg: &Message,
    dialogue: BotDialogue,
    sessions: &Sessions,
) -> Result<()> {
    if dialogue.get().await?.is_some() {
        dialogue.exit().await?;
    }
    sessions.clear_screen(bot, msg.chat.id).await;

    let first_name = msg
        .from
        .as_ref()
        .map(|user| user.first_name.as_str())
        .unwrap_or("friend");
    menu::show_welcome(bot, sessions, msg.chat.id, first_name).await
}

/// `/cancel`: the universal escape hatch out of any flow. The accumulated
/// inputs are discarded untouched; nothing has been persisted yet.
async fn cancel(
    bot: &Bot,
    msg: &Message,
    dialogue: BotDialogue,
    storage: &Storage,
    sessions: &Sessions,
) -> Result<()> {
    // The /cancel message itself is part of the exchange being swept away.
    sessions.track(msg.chat.id, msg.id).await;

    if dialogue.get().await?.is_some() {
        dialogue.exit().await?;
    }
    sessions.clear_screen(bot, msg.chat.id).await;

    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or_default();
    if storage.is_registered(user_id).await {
        let sent = bot
            .send_message(msg.chat.id, "❌ Cancelled.\n\n🏠 Main menu. Where to next?")
            .reply_markup(main_menu_keyboard())
            .await?;
        sessions.set_screen(msg.chat.id, Screen::single(sent.id)).await;
    } else {
        // Untracked on purpose: this message becomes the anchor if the user
        // enters the register or login flow from it.
        bot.send_message(
            msg.chat.id,
            "❌ Cancelled.\n\nLog in or create an account to continue:",
        )
        .reply_markup(login_register_keyboard())
        .await?;
    }
    Ok(())
}

/// `/confirm @handle`: an admin acknowledges an external payment. Every
/// pending purchase for that buyer is drained in one go and the tickets are
/// issued to the buyer's chat; a second `/confirm` finds nothing left.
async fn confirm(
    bot: &Bot,
    msg: &Message,
    storage: &Storage,
    pending: &PendingLedger,
    argument: Option<String>,
) -> Result<()> {
    let admin_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or_default();
    if !storage.is_admin(admin_id).await {
        warn!(admin_id, "payment confirmation denied for non-admin");
        bot.send_message(msg.chat.id, "🚫 Only administrators can confirm payments.")
            .await?;
        return Ok(());
    }

    let Some(handle) = argument.as_deref().and_then(|a| a.strip_prefix('@')) else {
        bot.send_message(msg.chat.id, "⚠️ Usage: /confirm @username")
            .await?;
        return Ok(());
    };

    let Some(buyer) = storage.find_user_by_username(handle).await else {
        bot.send_message(msg.chat.id, "❌ No registered user with that handle.")
            .await?;
        return Ok(());
    };

    let drained = pending.drain_for(buyer.id).await;
    if drained.is_empty() {
        bot.send_message(msg.chat.id, "❌ This user has no pending purchases.")
            .await?;
        return Ok(());
    }

    for payment in &drained {
        tickets::issue_purchase(
            bot,
            storage,
            payment.user_id,
            &payment.event_id,
            &payment.event_title,
            payment.qty,
            payment.total,
        )
        .await?;
    }

    info!(
        admin_id,
        buyer_id = buyer.id,
        purchases = drained.len(),
        "pending payments confirmed"
    );
    bot.send_message(
        msg.chat.id,
        format!("✅ Payment confirmed. Tickets were sent to @{handle}."),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("  /cancel  "), Some(Command::Cancel));
        assert_eq!(Command::parse("/start@LumaMapBot"), Some(Command::Start));

        // Not commands at all.
        assert_eq!(Command::parse("hello"), None);
        assert_eq!(Command::parse("start"), None);
        assert_eq!(Command::parse("/unknown"), None);
    }

    #[test]
    fn test_confirm_keeps_its_argument() {
        assert_eq!(
            Command::parse("/confirm @anna"),
            Some(Command::Confirm {
                argument: Some("@anna".to_string())
            })
        );
        assert_eq!(
            Command::parse("/confirm"),
            Some(Command::Confirm { argument: None })
        );
    }
}
