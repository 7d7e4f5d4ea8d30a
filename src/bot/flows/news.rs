//! News post creation flow: text, optional image.

use anyhow::Result;
use chrono::{Local, Utc};
use teloxide::prelude::*;
use tracing::{info, warn};

use crate::bot::menu;
use crate::bot::message_handler::download_photo;
use crate::bot::ui_builder::image_prompt_keyboard;
use crate::dialogue::{BotDialogue, NewsState, State};
use crate::models::NewsPost;
use crate::session::{Screen, Sessions};
use crate::storage::Storage;
use crate::validation::validate_news_text;

/// Entry point, reached from the news feed's create button. Admins only.
pub async fn start(
    bot: &Bot,
    storage: &Storage,
    sessions: &Sessions,
    chat_id: ChatId,
    user_id: i64,
    dialogue: BotDialogue,
) -> Result<()> {
    if !storage.is_admin(user_id).await {
        warn!(user_id, "news creation denied for non-admin");
        sessions.clear_screen(bot, chat_id).await;
        let sent = bot
            .send_message(chat_id, "🚫 Only administrators can post news.")
            .await?;
        sessions.set_screen(chat_id, Screen::single(sent.id)).await;
        return Ok(());
    }

    sessions.clear_screen(bot, chat_id).await;
    let sent = bot
        .send_message(chat_id, "✍️ Enter the text of the news post:")
        .await?;
    sessions.set_screen(chat_id, Screen::single(sent.id)).await;
    dialogue
        .update(State::PostNews(NewsState::AwaitText))
        .await?;
    Ok(())
}

pub async fn handle_text(
    bot: &Bot,
    msg: &Message,
    text: &str,
    dialogue: BotDialogue,
    sessions: &Sessions,
    state: NewsState,
) -> Result<()> {
    sessions.track(msg.chat.id, msg.id).await;

    match state {
        NewsState::AwaitText => match validate_news_text(text) {
            Ok(description) => {
                let sent = bot
                    .send_message(msg.chat.id, "Would you like to attach an image?")
                    .reply_markup(image_prompt_keyboard("upload_news_image", "skip_news_image"))
                    .await?;
                sessions.track(msg.chat.id, sent.id).await;
                dialogue
                    .update(State::PostNews(NewsState::AwaitImage { description }))
                    .await?;
            }
            Err(_) => {
                let sent = bot
                    .send_message(msg.chat.id, "❌ The post cannot be empty. Enter the text:")
                    .await?;
                sessions.track(msg.chat.id, sent.id).await;
            }
        },
        // A photo or a button press is expected here.
        NewsState::AwaitImage { .. } => {}
    }
    Ok(())
}

/// The upload button: ask for the photo itself, staying in the image step.
pub async fn prompt_upload(bot: &Bot, sessions: &Sessions, chat_id: ChatId) -> Result<()> {
    sessions.clear_screen(bot, chat_id).await;
    let sent = bot
        .send_message(chat_id, "📤 Please send the image for the post:")
        .await?;
    sessions.set_screen(chat_id, Screen::single(sent.id)).await;
    Ok(())
}

/// A photo arrived for the post: store it and publish.
pub async fn photo_input(
    bot: &Bot,
    msg: &Message,
    dialogue: BotDialogue,
    storage: &Storage,
    sessions: &Sessions,
    state: NewsState,
) -> Result<()> {
    sessions.track(msg.chat.id, msg.id).await;

    let NewsState::AwaitImage { description } = state else {
        return Ok(());
    };

    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or_default();
    let image = match msg.photo().and_then(|sizes| sizes.last()) {
        Some(photo) => {
            let stamp = Local::now().format("%Y%m%d%H%M%S");
            let dest = storage
                .news_images_dir()
                .join(format!("news_{user_id}_{stamp}.jpg"));
            download_photo(bot, photo.file.id.clone(), &dest).await?;
            Some(dest.to_string_lossy().into_owned())
        }
        None => None,
    };

    finish(bot, storage, sessions, msg.chat.id, user_id, dialogue, description, image).await
}

/// The skip button: publish without an image.
pub async fn skip_image(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    dialogue: BotDialogue,
    storage: &Storage,
    sessions: &Sessions,
    state: NewsState,
) -> Result<()> {
    let NewsState::AwaitImage { description } = state else {
        return Ok(());
    };

    finish(bot, storage, sessions, chat_id, user_id, dialogue, description, None).await
}

#[allow(clippy::too_many_arguments)]
async fn finish(
    bot: &Bot,
    storage: &Storage,
    sessions: &Sessions,
    chat_id: ChatId,
    user_id: i64,
    dialogue: BotDialogue,
    description: String,
    image: Option<String>,
) -> Result<()> {
    storage
        .add_news(NewsPost {
            description,
            image,
            created_at: Utc::now(),
        })
        .await?;
    dialogue.exit().await?;

    info!(user_id, "news post published");

    // The refreshed feed doubles as the confirmation.
    menu::show_news(bot, storage, sessions, chat_id, user_id).await
}
