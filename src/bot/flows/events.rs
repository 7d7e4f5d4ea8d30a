//! Event creation flow: title, description, date, location, price, image.

use anyhow::Result;
use chrono::Local;
use teloxide::prelude::*;
use tracing::{info, warn};
use uuid::Uuid;

use crate::bot::menu;
use crate::bot::message_handler::download_photo;
use crate::bot::ui_builder::image_prompt_keyboard;
use crate::dialogue::{BotDialogue, CreateEventState, State};
use crate::models::Event;
use crate::session::{Screen, Sessions};
use crate::storage::Storage;
use crate::validation::parse_event_date;

/// Entry point, reached from the events listing's create button. Admins
/// only; the gate lives here at the entry, not at the terminal step.
pub async fn start(
    bot: &Bot,
    storage: &Storage,
    sessions: &Sessions,
    chat_id: ChatId,
    user_id: i64,
    dialogue: BotDialogue,
) -> Result<()> {
    if !storage.is_admin(user_id).await {
        warn!(user_id, "event creation denied for non-admin");
        sessions.clear_screen(bot, chat_id).await;
        let sent = bot
            .send_message(chat_id, "🚫 Only administrators can create events.")
            .await?;
        sessions.set_screen(chat_id, Screen::single(sent.id)).await;
        return Ok(());
    }

    sessions.clear_screen(bot, chat_id).await;
    let sent = bot
        .send_message(chat_id, "🎨 New event!\n\nEnter the event title:")
        .await?;
    sessions.set_screen(chat_id, Screen::single(sent.id)).await;
    dialogue
        .update(State::CreateEvent(CreateEventState::AwaitTitle))
        .await?;
    Ok(())
}

/// Route a text message to the step the form is waiting on.
pub async fn handle_text(
    bot: &Bot,
    msg: &Message,
    text: &str,
    dialogue: BotDialogue,
    sessions: &Sessions,
    state: CreateEventState,
) -> Result<()> {
    sessions.track(msg.chat.id, msg.id).await;

    match state {
        CreateEventState::AwaitTitle => {
            let sent = bot
                .send_message(msg.chat.id, "📋 Now a short description:")
                .await?;
            sessions.track(msg.chat.id, sent.id).await;
            dialogue
                .update(State::CreateEvent(CreateEventState::AwaitDescription {
                    title: text.trim().to_string(),
                }))
                .await?;
        }
        CreateEventState::AwaitDescription { title } => {
            let sent = bot
                .send_message(msg.chat.id, "📅 The date, like 2026-09-14:")
                .await?;
            sessions.track(msg.chat.id, sent.id).await;
            dialogue
                .update(State::CreateEvent(CreateEventState::AwaitDate {
                    title,
                    description: text.trim().to_string(),
                }))
                .await?;
        }
        CreateEventState::AwaitDate { title, description } => match parse_event_date(text) {
            Ok(date) => {
                let sent = bot
                    .send_message(msg.chat.id, "📍 Where does it take place?")
                    .await?;
                sessions.track(msg.chat.id, sent.id).await;
                dialogue
                    .update(State::CreateEvent(CreateEventState::AwaitLocation {
                        title,
                        description,
                        date,
                    }))
                    .await?;
            }
            Err(_) => {
                let sent = bot
                    .send_message(
                        msg.chat.id,
                        "❌ The date must look like 2026-09-14. Try again:",
                    )
                    .await?;
                sessions.track(msg.chat.id, sent.id).await;
            }
        },
        CreateEventState::AwaitLocation {
            title,
            description,
            date,
        } => {
            let sent = bot
                .send_message(
                    msg.chat.id,
                    "💰 The ticket price, like \"5000 KZT\" or \"Free\":",
                )
                .await?;
            sessions.track(msg.chat.id, sent.id).await;
            dialogue
                .update(State::CreateEvent(CreateEventState::AwaitPrice {
                    title,
                    description,
                    date,
                    location: text.trim().to_string(),
                }))
                .await?;
        }
        CreateEventState::AwaitPrice {
            title,
            description,
            date,
            location,
        } => {
            let sent = bot
                .send_message(msg.chat.id, "Would you like to add a poster image?")
                .reply_markup(image_prompt_keyboard("upload_image", "skip_image"))
                .await?;
            sessions.track(msg.chat.id, sent.id).await;
            dialogue
                .update(State::CreateEvent(CreateEventState::AwaitImage {
                    title,
                    description,
                    date,
                    location,
                    price: text.trim().to_string(),
                }))
                .await?;
        }
        // A photo is expected here; a stray text just stays on screen until
        // the user picks upload or skip.
        CreateEventState::AwaitImage { .. } => {}
    }
    Ok(())
}

/// The upload button: ask for the photo itself, staying in the image step.
pub async fn prompt_upload(bot: &Bot, sessions: &Sessions, chat_id: ChatId) -> Result<()> {
    sessions.clear_screen(bot, chat_id).await;
    let sent = bot
        .send_message(chat_id, "📤 Please send the poster image:")
        .await?;
    sessions.set_screen(chat_id, Screen::single(sent.id)).await;
    Ok(())
}

/// A photo arrived while the form waits for one: store it under the event
/// images directory and finish the form with it attached.
pub async fn photo_input(
    bot: &Bot,
    msg: &Message,
    dialogue: BotDialogue,
    storage: &Storage,
    sessions: &Sessions,
    state: CreateEventState,
) -> Result<()> {
    sessions.track(msg.chat.id, msg.id).await;

    let CreateEventState::AwaitImage {
        title,
        description,
        date,
        location,
        price,
    } = state
    else {
        return Ok(());
    };

    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or_default();
    let image = match msg.photo().and_then(|sizes| sizes.last()) {
        Some(photo) => {
            let stamp = Local::now().format("%Y%m%d_%H%M%S");
            let dest = storage
                .event_images_dir()
                .join(format!("poster_{user_id}_{stamp}.jpg"));
            download_photo(bot, photo.file.id.clone(), &dest).await?;
            Some(dest.to_string_lossy().into_owned())
        }
        None => None,
    };

    finish(
        bot, storage, sessions, msg.chat.id, user_id, dialogue, title, description, date,
        location, price, image,
    )
    .await
}

/// The skip button: finish the form without an image.
pub async fn skip_image(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    dialogue: BotDialogue,
    storage: &Storage,
    sessions: &Sessions,
    state: CreateEventState,
) -> Result<()> {
    let CreateEventState::AwaitImage {
        title,
        description,
        date,
        location,
        price,
    } = state
    else {
        return Ok(());
    };

    finish(
        bot, storage, sessions, chat_id, user_id, dialogue, title, description, date, location,
        price, None,
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn finish(
    bot: &Bot,
    storage: &Storage,
    sessions: &Sessions,
    chat_id: ChatId,
    user_id: i64,
    dialogue: BotDialogue,
    title: String,
    description: String,
    date: chrono::NaiveDate,
    location: String,
    price: String,
    image: Option<String>,
) -> Result<()> {
    let event = Event {
        id: Uuid::new_v4().to_string(),
        title,
        description,
        date,
        location,
        image,
        price,
    };
    let event_id = event.id.clone();
    storage.add_event(event).await?;
    dialogue.exit().await?;

    info!(event_id = %event_id, "event created");

    // The fresh listing doubles as the confirmation.
    menu::show_events(bot, storage, sessions, chat_id, user_id).await
}
