//! Profile editing and password change flows.

use anyhow::Result;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::{info, warn};

use crate::bot::menu;
use crate::bot::ui_builder::yes_no_keyboard;
use crate::dialogue::{BotDialogue, ProfileField, State};
use crate::session::Sessions;
use crate::storage::Storage;
use crate::validation::{
    hash_password, validate_email, validate_full_name, validate_password, validate_phone,
};

/// Pause before a saved change redirects back to the parent screen, long
/// enough to read the confirmation.
const REDIRECT_DELAY: Duration = Duration::from_secs(5);

/// Turn the edit-profile menu into a prompt for one field.
pub async fn start_field_edit(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    dialogue: BotDialogue,
    field: ProfileField,
) -> Result<()> {
    bot.edit_message_text(chat_id, message_id, format!("✏️ Enter your new {}:", field.label()))
        .await?;
    dialogue.update(State::EditProfile { field }).await?;
    Ok(())
}

pub async fn field_input(
    bot: &Bot,
    msg: &Message,
    text: &str,
    dialogue: BotDialogue,
    storage: &Storage,
    sessions: &Sessions,
    field: ProfileField,
) -> Result<()> {
    sessions.track(msg.chat.id, msg.id).await;

    let validated = match field {
        ProfileField::FullName => validate_full_name(text),
        ProfileField::Email => validate_email(text),
        ProfileField::Phone => validate_phone(text),
    };
    let value = match validated {
        Ok(value) => value,
        Err(_) => {
            let hint = match field {
                ProfileField::FullName => "❌ The name cannot be empty. Try again:",
                ProfileField::Email => "❌ That doesn't look like an email. Try again:",
                ProfileField::Phone => "❌ The phone must look like +77051234567. Try again:",
            };
            let sent = bot.send_message(msg.chat.id, hint).await?;
            sessions.track(msg.chat.id, sent.id).await;
            return Ok(());
        }
    };

    let Some(from) = msg.from.as_ref() else {
        warn!(chat_id = %msg.chat.id, "profile edit message without a sender");
        return Ok(());
    };
    let user_id = from.id.0 as i64;

    let updated = storage
        .update_user(user_id, |user| match field {
            ProfileField::FullName => user.full_name = value,
            ProfileField::Email => user.email = value,
            ProfileField::Phone => user.phone = value,
        })
        .await?;
    dialogue.exit().await?;

    if !updated {
        warn!(user_id, "profile edit for an unknown user");
        return menu::show_profile(bot, storage, sessions, msg.chat.id, user_id).await;
    }
    info!(user_id, field = ?field, "profile field updated");

    confirm_and_return(bot, sessions, msg.chat.id, "✅ Saved! Taking you back to your profile…")
        .await?;
    menu::show_profile(bot, storage, sessions, msg.chat.id, user_id).await
}

/// The "are you sure" screen in front of the password change.
pub async fn confirm_change_password(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
) -> Result<()> {
    bot.edit_message_text(chat_id, message_id, "🔑 Change your password?")
        .reply_markup(yes_no_keyboard("change_password_yes", "settings"))
        .await?;
    Ok(())
}

pub async fn start_change_password(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    dialogue: BotDialogue,
) -> Result<()> {
    bot.edit_message_text(chat_id, message_id, "🔑 Enter a new password:")
        .await?;
    dialogue.update(State::ChangePassword).await?;
    Ok(())
}

pub async fn password_input(
    bot: &Bot,
    msg: &Message,
    text: &str,
    dialogue: BotDialogue,
    storage: &Storage,
    sessions: &Sessions,
) -> Result<()> {
    sessions.track(msg.chat.id, msg.id).await;

    let password = match validate_password(text) {
        Ok(password) => password,
        Err(_) => {
            let sent = bot
                .send_message(msg.chat.id, "❌ The password cannot be empty. Try again:")
                .await?;
            sessions.track(msg.chat.id, sent.id).await;
            return Ok(());
        }
    };

    let Some(from) = msg.from.as_ref() else {
        warn!(chat_id = %msg.chat.id, "password change message without a sender");
        return Ok(());
    };
    let user_id = from.id.0 as i64;

    let hash = hash_password(&password);
    let updated = storage.update_user(user_id, |user| user.password = hash).await?;
    dialogue.exit().await?;

    if !updated {
        warn!(user_id, "password change for an unknown user");
        return menu::show_settings(bot, sessions, msg.chat.id).await;
    }
    info!(user_id, "password changed");

    confirm_and_return(bot, sessions, msg.chat.id, "✅ Password changed! Back to settings…")
        .await?;
    menu::show_settings(bot, sessions, msg.chat.id).await
}

/// Show a short confirmation, wait, and clean it up again.
async fn confirm_and_return(
    bot: &Bot,
    sessions: &Sessions,
    chat_id: ChatId,
    note: &str,
) -> Result<()> {
    sessions.clear_screen(bot, chat_id).await;
    let sent = bot.send_message(chat_id, note).await?;
    tokio::time::sleep(REDIRECT_DELAY).await;
    if let Err(err) = bot.delete_message(chat_id, sent.id).await {
        warn!(chat_id = %chat_id, error = %err, "failed to delete the confirmation note");
    }
    Ok(())
}
