//! One-shot menu screens: welcome, main menu, events, tickets, news, settings.
//!
//! Every renderer here takes the target chat and user explicitly, so flows
//! and callbacks alike can redraw a screen after they finish. Each render
//! replaces the chat's previous screen wholesale.

use anyhow::Result;
use chrono::Local;
use std::collections::HashSet;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile};
use tracing::{info, warn};

use crate::config::BotConfig;
use crate::session::{PriceRange, Screen, Sessions};
use crate::storage::Storage;
use crate::validation::parse_price;

use super::ui_builder::{
    back_keyboard, edit_profile_keyboard, event_keyboard, events_footer_keyboard,
    format_event_card, format_news_post, format_profile, login_register_keyboard,
    main_menu_keyboard, news_footer_keyboard, price_filter_keyboard, price_range_label,
    profile_keyboard, settings_keyboard, ticket_events_keyboard,
};

/// `/start` screen: fresh session, log in or register.
pub async fn show_welcome(
    bot: &Bot,
    sessions: &Sessions,
    chat_id: ChatId,
    first_name: &str,
) -> Result<()> {
    sessions.reset(chat_id).await;

    let text = format!(
        "👋 Welcome to LumaMap, {first_name}!\n\n\
         Concerts, festivals and city events, with tickets right in this chat.\n\n\
         Log in or create an account to get started:"
    );
    // The welcome message is the anchor the register/login flows edit in
    // place, so it deliberately stays out of the tracked screen.
    bot.send_message(chat_id, text)
        .reply_markup(login_register_keyboard())
        .await?;
    Ok(())
}

/// Main menu. Also drops any active price filter, matching the idea that
/// "back to main" starts navigation over.
pub async fn back_to_main(bot: &Bot, sessions: &Sessions, chat_id: ChatId) -> Result<()> {
    sessions.clear_price_filter(chat_id).await;
    sessions.clear_screen(bot, chat_id).await;

    let sent = bot
        .send_message(chat_id, "🏠 Main menu. Where to next?")
        .reply_markup(main_menu_keyboard())
        .await?;
    sessions.set_screen(chat_id, Screen::single(sent.id)).await;
    Ok(())
}

/// The city events listing, honoring the chat's price filter.
pub async fn show_events(
    bot: &Bot,
    storage: &Storage,
    sessions: &Sessions,
    chat_id: ChatId,
    user_id: i64,
) -> Result<()> {
    let today = Local::now().date_naive();
    let mut events = storage.upcoming_events(today).await;

    let filter = sessions.price_filter(chat_id).await;
    if let Some(range) = filter {
        events.retain(|event| range.contains(parse_price(&event.price)));
    }

    sessions.clear_screen(bot, chat_id).await;
    let mut screen = Screen::new();

    if let Some(range) = filter {
        let banner = bot
            .send_message(
                chat_id,
                format!("🔎 Price filter: {}", price_range_label(range)),
            )
            .await?;
        screen.push(banner.id);
    }

    if events.is_empty() {
        let text = if filter.is_some() {
            "😔 Nothing in this price range yet."
        } else {
            "😔 No upcoming events right now. Check back soon!"
        };
        let sent = bot.send_message(chat_id, text).await?;
        screen.push(sent.id);
    } else {
        for event in &events {
            let text = format_event_card(event);
            let poster = event
                .image
                .as_ref()
                .filter(|p| std::path::Path::new(p).exists());
            let card_id = match poster {
                Some(path) => {
                    bot.send_photo(chat_id, InputFile::file(std::path::PathBuf::from(path)))
                        .caption(text)
                        .reply_markup(event_keyboard(event))
                        .await?
                        .id
                }
                None => {
                    bot.send_message(chat_id, text)
                        .reply_markup(event_keyboard(event))
                        .await?
                        .id
                }
            };
            screen.push(card_id);
        }
    }

    let footer = bot
        .send_message(chat_id, "Choose an action:")
        .reply_markup(events_footer_keyboard(storage.is_admin(user_id).await))
        .await?;
    screen.push(footer.id);

    sessions.set_screen(chat_id, screen).await;
    Ok(())
}

/// The price band picker for the events listing.
pub async fn show_price_filter(bot: &Bot, sessions: &Sessions, chat_id: ChatId) -> Result<()> {
    sessions.clear_screen(bot, chat_id).await;
    let sent = bot
        .send_message(chat_id, "💰 Pick a price range:")
        .reply_markup(price_filter_keyboard())
        .await?;
    sessions.set_screen(chat_id, Screen::single(sent.id)).await;
    Ok(())
}

/// Remember the chosen band and redraw the listing with it applied.
pub async fn apply_price_filter(
    bot: &Bot,
    storage: &Storage,
    sessions: &Sessions,
    chat_id: ChatId,
    user_id: i64,
    range: PriceRange,
) -> Result<()> {
    sessions.set_price_filter(chat_id, range).await;
    show_events(bot, storage, sessions, chat_id, user_id).await
}

pub async fn reset_price_filter(
    bot: &Bot,
    storage: &Storage,
    sessions: &Sessions,
    chat_id: ChatId,
    user_id: i64,
) -> Result<()> {
    sessions.clear_price_filter(chat_id).await;
    show_events(bot, storage, sessions, chat_id, user_id).await
}

/// Upcoming events the user holds tickets for, one button each.
pub async fn show_my_tickets(
    bot: &Bot,
    storage: &Storage,
    sessions: &Sessions,
    chat_id: ChatId,
    user_id: i64,
) -> Result<()> {
    let today = Local::now().date_naive();
    let purchases = storage.purchases_for_user(user_id).await;
    let purchased_ids: HashSet<&str> =
        purchases.iter().map(|r| r.event_id.as_str()).collect();

    let mut events: Vec<_> = storage
        .events
        .load()
        .await
        .into_iter()
        .filter(|e| purchased_ids.contains(e.id.as_str()) && e.is_upcoming(today))
        .collect();
    events.sort_by(|a, b| a.title.cmp(&b.title));

    sessions.clear_screen(bot, chat_id).await;
    let sent = if events.is_empty() {
        bot.send_message(chat_id, "🎫 You have no tickets for upcoming events.")
            .reply_markup(back_keyboard("back_to_main"))
            .await?
    } else {
        bot.send_message(chat_id, "🎟 Your events. Pick one to see the tickets:")
            .reply_markup(ticket_events_keyboard(&events))
            .await?
    };
    sessions.set_screen(chat_id, Screen::single(sent.id)).await;
    Ok(())
}

/// The QR tickets the user holds for one event.
pub async fn show_event_tickets(
    bot: &Bot,
    storage: &Storage,
    sessions: &Sessions,
    chat_id: ChatId,
    user_id: i64,
    event_id: &str,
) -> Result<()> {
    sessions.clear_screen(bot, chat_id).await;
    let mut screen = Screen::new();

    let event = storage.find_event(event_id).await;
    let today = Local::now().date_naive();

    match event {
        None => {
            let sent = bot
                .send_message(chat_id, "❌ This event no longer exists.")
                .reply_markup(back_keyboard("tickets"))
                .await?;
            screen.push(sent.id);
        }
        Some(event) if !event.is_upcoming(today) => {
            let sent = bot
                .send_message(chat_id, "⌛ This event has already taken place.")
                .reply_markup(back_keyboard("tickets"))
                .await?;
            screen.push(sent.id);
        }
        Some(event) => {
            let records: Vec<_> = storage
                .purchases_for_user(user_id)
                .await
                .into_iter()
                .filter(|r| r.event_id == event.id)
                .collect();

            if records.is_empty() {
                let sent = bot
                    .send_message(chat_id, "❌ You have no tickets for this event.")
                    .reply_markup(back_keyboard("tickets"))
                    .await?;
                screen.push(sent.id);
            } else {
                let header = bot
                    .send_message(chat_id, format!("🎟 Your tickets for {}:", event.title))
                    .await?;
                screen.push(header.id);

                let tickets_dir = storage.tickets_dir();
                for record in &records {
                    for (index, code) in record.codes.iter().enumerate() {
                        let path = tickets_dir.join(format!("{code}.png"));
                        if !path.exists() {
                            warn!(user_id, code, "ticket QR file is missing");
                            continue;
                        }
                        let photo = bot
                            .send_photo(chat_id, InputFile::file(path))
                            .caption(format!("🎫 Ticket #{}", index + 1))
                            .await?;
                        screen.push(photo.id);
                    }
                }

                let footer = bot
                    .send_message(chat_id, "Show the QR code at the entrance. Enjoy!")
                    .reply_markup(back_keyboard("tickets"))
                    .await?;
                screen.push(footer.id);
            }
        }
    }

    sessions.set_screen(chat_id, screen).await;
    Ok(())
}

/// The announcements feed, newest first.
pub async fn show_news(
    bot: &Bot,
    storage: &Storage,
    sessions: &Sessions,
    chat_id: ChatId,
    user_id: i64,
) -> Result<()> {
    let posts = storage.latest_news().await;

    sessions.clear_screen(bot, chat_id).await;
    let mut screen = Screen::new();

    if posts.is_empty() {
        let sent = bot.send_message(chat_id, "📰 No news yet.").await?;
        screen.push(sent.id);
    } else {
        for post in &posts {
            let text = format_news_post(post);
            let image = post.image.as_ref().filter(|p| std::path::Path::new(p).exists());
            let sent_id = match image {
                Some(path) => {
                    bot.send_photo(chat_id, InputFile::file(std::path::PathBuf::from(path)))
                        .caption(text)
                        .await?
                        .id
                }
                None => bot.send_message(chat_id, text).await?.id,
            };
            screen.push(sent_id);
        }
    }

    let footer = bot
        .send_message(chat_id, "Choose an action:")
        .reply_markup(news_footer_keyboard(storage.is_admin(user_id).await))
        .await?;
    screen.push(footer.id);

    sessions.set_screen(chat_id, screen).await;
    Ok(())
}

pub async fn show_settings(bot: &Bot, sessions: &Sessions, chat_id: ChatId) -> Result<()> {
    sessions.clear_screen(bot, chat_id).await;
    let sent = bot
        .send_message(chat_id, "⚙️ Settings. What would you like to adjust?")
        .reply_markup(settings_keyboard())
        .await?;
    sessions.set_screen(chat_id, Screen::single(sent.id)).await;
    Ok(())
}

pub async fn show_profile(
    bot: &Bot,
    storage: &Storage,
    sessions: &Sessions,
    chat_id: ChatId,
    user_id: i64,
) -> Result<()> {
    sessions.clear_screen(bot, chat_id).await;
    let sent = match storage.find_user(user_id).await {
        Some(user) => {
            bot.send_message(chat_id, format_profile(&user))
                .reply_markup(profile_keyboard())
                .await?
        }
        None => {
            bot.send_message(chat_id, "❌ You are not registered yet.")
                .reply_markup(back_keyboard("settings"))
                .await?
        }
    };
    sessions.set_screen(chat_id, Screen::single(sent.id)).await;
    Ok(())
}

pub async fn show_edit_profile(bot: &Bot, sessions: &Sessions, chat_id: ChatId) -> Result<()> {
    sessions.clear_screen(bot, chat_id).await;
    let sent = bot
        .send_message(chat_id, "✏️ What do you want to change?")
        .reply_markup(edit_profile_keyboard())
        .await?;
    sessions.set_screen(chat_id, Screen::single(sent.id)).await;
    Ok(())
}

pub async fn toggle_notifications(
    bot: &Bot,
    storage: &Storage,
    sessions: &Sessions,
    chat_id: ChatId,
    user_id: i64,
) -> Result<()> {
    let text = match storage.toggle_notifications(user_id).await? {
        Some(true) => "🔔 Notifications are on.",
        Some(false) => "🔕 Notifications are off.",
        None => "❌ You are not registered yet.",
    };

    sessions.clear_screen(bot, chat_id).await;
    let sent = bot
        .send_message(chat_id, text)
        .reply_markup(back_keyboard("settings"))
        .await?;
    sessions.set_screen(chat_id, Screen::single(sent.id)).await;
    Ok(())
}

pub async fn show_support(
    bot: &Bot,
    config: &BotConfig,
    sessions: &Sessions,
    chat_id: ChatId,
) -> Result<()> {
    let url = reqwest::Url::parse(&config.support_link())?;
    let keyboard = InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::url("📲 Open WhatsApp", url)],
        vec![InlineKeyboardButton::callback("⬅️ Back", "settings")],
    ]);

    sessions.clear_screen(bot, chat_id).await;
    let sent = bot
        .send_message(
            chat_id,
            "📞 Questions? Our support team replies on WhatsApp:",
        )
        .reply_markup(keyboard)
        .await?;
    sessions.set_screen(chat_id, Screen::single(sent.id)).await;
    Ok(())
}

/// Drop the session and show the log-in screen again.
pub async fn logout(bot: &Bot, sessions: &Sessions, chat_id: ChatId) -> Result<()> {
    sessions.clear_screen(bot, chat_id).await;
    sessions.reset(chat_id).await;

    bot.send_message(
        chat_id,
        "🚪 You are logged out. See you soon!\n\nLog in or register to continue:",
    )
    .reply_markup(login_register_keyboard())
    .await?;

    info!(chat_id = chat_id.0, "user logged out");
    Ok(())
}
