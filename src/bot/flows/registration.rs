//! Registration flow: full name, email, phone, password, confirmation.

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::{info, warn};

use crate::bot::ui_builder::main_menu_keyboard;
use crate::dialogue::{BotDialogue, RegisterState, State};
use crate::models::User;
use crate::session::{Screen, Sessions};
use crate::storage::Storage;
use crate::validation::{
    hash_password, validate_email, validate_full_name, validate_password, validate_phone,
};

/// Entry point, reached from the welcome screen's Register button. The
/// pressed message becomes the anchor the finished form morphs into the
/// main menu.
pub async fn start(
    bot: &Bot,
    chat_id: ChatId,
    anchor: MessageId,
    dialogue: BotDialogue,
) -> Result<()> {
    bot.edit_message_text(
        chat_id,
        anchor,
        "📝 Let's get you set up!\n\nEnter your full name:",
    )
    .await?;
    dialogue
        .update(State::Register(RegisterState::AwaitFullName { anchor }))
        .await?;
    Ok(())
}

/// Route a text message to the step the form is waiting on.
pub async fn handle_text(
    bot: &Bot,
    msg: &Message,
    text: &str,
    dialogue: BotDialogue,
    storage: &Storage,
    sessions: &Sessions,
    state: RegisterState,
) -> Result<()> {
    // The typed answer is part of the form screen and gets cleaned up with it.
    sessions.track(msg.chat.id, msg.id).await;

    match state {
        RegisterState::AwaitFullName { anchor } => {
            full_name_input(bot, msg, text, dialogue, sessions, anchor).await
        }
        RegisterState::AwaitEmail { anchor, full_name } => {
            email_input(bot, msg, text, dialogue, storage, sessions, anchor, full_name).await
        }
        RegisterState::AwaitPhone {
            anchor,
            full_name,
            email,
        } => phone_input(bot, msg, text, dialogue, sessions, anchor, full_name, email).await,
        RegisterState::AwaitPassword {
            anchor,
            full_name,
            email,
            phone,
        } => {
            password_input(
                bot, msg, text, dialogue, sessions, anchor, full_name, email, phone,
            )
            .await
        }
        RegisterState::AwaitConfirm {
            anchor,
            full_name,
            email,
            phone,
            password_hash,
        } => {
            confirm_input(
                bot,
                msg,
                text,
                dialogue,
                storage,
                sessions,
                anchor,
                full_name,
                email,
                phone,
                password_hash,
            )
            .await
        }
    }
}

async fn full_name_input(
    bot: &Bot,
    msg: &Message,
    text: &str,
    dialogue: BotDialogue,
    sessions: &Sessions,
    anchor: MessageId,
) -> Result<()> {
    match validate_full_name(text) {
        Ok(full_name) => {
            let sent = bot
                .send_message(msg.chat.id, "📧 Nice to meet you! Now your email:")
                .await?;
            sessions.track(msg.chat.id, sent.id).await;
            dialogue
                .update(State::Register(RegisterState::AwaitEmail { anchor, full_name }))
                .await?;
        }
        Err(_) => {
            let sent = bot
                .send_message(msg.chat.id, "❌ The name cannot be empty. Enter your full name:")
                .await?;
            sessions.track(msg.chat.id, sent.id).await;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn email_input(
    bot: &Bot,
    msg: &Message,
    text: &str,
    dialogue: BotDialogue,
    storage: &Storage,
    sessions: &Sessions,
    anchor: MessageId,
    full_name: String,
) -> Result<()> {
    let email = match validate_email(text) {
        Ok(email) => email,
        Err(_) => {
            let sent = bot
                .send_message(msg.chat.id, "❌ That doesn't look like an email. Try again:")
                .await?;
            sessions.track(msg.chat.id, sent.id).await;
            return Ok(());
        }
    };

    if storage.email_taken(&email).await {
        let sent = bot
            .send_message(
                msg.chat.id,
                "⚠️ This email is already registered. Enter another one:",
            )
            .await?;
        sessions.track(msg.chat.id, sent.id).await;
        return Ok(());
    }

    let sent = bot
        .send_message(
            msg.chat.id,
            "📱 Your phone number, like +77051234567:",
        )
        .await?;
    sessions.track(msg.chat.id, sent.id).await;
    dialogue
        .update(State::Register(RegisterState::AwaitPhone {
            anchor,
            full_name,
            email,
        }))
        .await?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn phone_input(
    bot: &Bot,
    msg: &Message,
    text: &str,
    dialogue: BotDialogue,
    sessions: &Sessions,
    anchor: MessageId,
    full_name: String,
    email: String,
) -> Result<()> {
    match validate_phone(text) {
        Ok(phone) => {
            let sent = bot
                .send_message(msg.chat.id, "🔑 Almost done. Choose a password:")
                .await?;
            sessions.track(msg.chat.id, sent.id).await;
            dialogue
                .update(State::Register(RegisterState::AwaitPassword {
                    anchor,
                    full_name,
                    email,
                    phone,
                }))
                .await?;
        }
        Err(_) => {
            let sent = bot
                .send_message(
                    msg.chat.id,
                    "❌ The phone must look like +77051234567. Try again:",
                )
                .await?;
            sessions.track(msg.chat.id, sent.id).await;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn password_input(
    bot: &Bot,
    msg: &Message,
    text: &str,
    dialogue: BotDialogue,
    sessions: &Sessions,
    anchor: MessageId,
    full_name: String,
    email: String,
    phone: String,
) -> Result<()> {
    match validate_password(text) {
        Ok(password) => {
            let sent = bot
                .send_message(msg.chat.id, "🔒 Now repeat the password to confirm:")
                .await?;
            sessions.track(msg.chat.id, sent.id).await;
            dialogue
                .update(State::Register(RegisterState::AwaitConfirm {
                    anchor,
                    full_name,
                    email,
                    phone,
                    password_hash: hash_password(&password),
                }))
                .await?;
        }
        Err(_) => {
            let sent = bot
                .send_message(msg.chat.id, "❌ The password cannot be empty. Choose a password:")
                .await?;
            sessions.track(msg.chat.id, sent.id).await;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn confirm_input(
    bot: &Bot,
    msg: &Message,
    text: &str,
    dialogue: BotDialogue,
    storage: &Storage,
    sessions: &Sessions,
    anchor: MessageId,
    full_name: String,
    email: String,
    phone: String,
    password_hash: String,
) -> Result<()> {
    if hash_password(text) != password_hash {
        let sent = bot
            .send_message(
                msg.chat.id,
                "❌ The passwords do not match. Choose a password:",
            )
            .await?;
        sessions.track(msg.chat.id, sent.id).await;
        // Back to the first password step; the mismatching pair is discarded.
        dialogue
            .update(State::Register(RegisterState::AwaitPassword {
                anchor,
                full_name,
                email,
                phone,
            }))
            .await?;
        return Ok(());
    }

    let Some(from) = msg.from.as_ref() else {
        warn!(chat_id = %msg.chat.id, "registration message without a sender");
        return Ok(());
    };
    let user_id = from.id.0 as i64;

    if storage.is_registered(user_id).await {
        sessions.clear_screen(bot, msg.chat.id).await;
        bot.edit_message_text(
            msg.chat.id,
            anchor,
            "⚠️ You are already registered!\n\n🏠 Main menu. Where to next?",
        )
        .reply_markup(main_menu_keyboard())
        .await?;
        sessions.set_screen(msg.chat.id, Screen::single(anchor)).await;
        dialogue.exit().await?;
        return Ok(());
    }

    storage
        .add_user(User {
            id: user_id,
            username: from.username.clone(),
            full_name: full_name.clone(),
            email,
            phone,
            password: password_hash,
            is_admin: false,
            notifications: true,
            points: 0,
            tickets_bought: 0,
        })
        .await?;

    // The form's prompts and echoes disappear; the welcome message becomes
    // the main menu.
    sessions.clear_screen(bot, msg.chat.id).await;
    bot.edit_message_text(
        msg.chat.id,
        anchor,
        format!("🎉 Welcome to LumaMap, {full_name}!\n\nYour account is ready. Where to next?"),
    )
    .reply_markup(main_menu_keyboard())
    .await?;
    sessions.set_screen(msg.chat.id, Screen::single(anchor)).await;
    dialogue.exit().await?;

    info!(user_id, "new user registered");
    Ok(())
}
