//! Callback Handler module for processing inline keyboard actions
//!
//! One flat dispatch table: exact action names first, then the three
//! parameterized prefixes. Unknown actions are logged and dropped.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, error, warn};

use crate::config::BotConfig;
use crate::dialogue::{BotDialogue, ProfileField, State};
use crate::pending::PendingLedger;
use crate::session::{PriceRange, Sessions};
use crate::storage::Storage;

use super::flows;
use super::menu;

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    dialogue: BotDialogue,
    storage: Arc<Storage>,
    sessions: Sessions,
    pending: PendingLedger,
    config: Arc<BotConfig>,
) -> Result<()> {
    if let Err(err) =
        dispatch_callback(&bot, &q, dialogue, &storage, &sessions, &pending, &config).await
    {
        error!(user_id = %q.from.id, error = %err, "callback handler failed");
        if let Some(message) = &q.message {
            let chat_id = message.chat().id;
            if let Ok(sent) = bot
                .send_message(chat_id, "❌ Something went wrong. Please try again.")
                .await
            {
                sessions.track(chat_id, sent.id).await;
            }
        }
    }

    // Answer the callback query to remove the loading state.
    if let Err(err) = bot.answer_callback_query(q.id).await {
        warn!(error = %err, "failed to answer callback query");
    }
    Ok(())
}

/// Actions that open a menu screen. Pressing any of them abandons whatever
/// flow was in progress, so a stale form cannot swallow later text input.
fn is_menu_action(data: &str) -> bool {
    matches!(
        data,
        "back_to_main"
            | "events"
            | "tickets"
            | "news"
            | "settings"
            | "logout"
            | "profile"
            | "edit_profile"
            | "support"
            | "toggle_notifications"
            | "price_filter"
            | "reset_filter"
    ) || data.starts_with("filter_")
        || data.starts_with("tickets_event_")
}

async fn dispatch_callback(
    bot: &Bot,
    q: &CallbackQuery,
    dialogue: BotDialogue,
    storage: &Storage,
    sessions: &Sessions,
    pending: &PendingLedger,
    config: &BotConfig,
) -> Result<()> {
    let Some(message) = &q.message else {
        debug!(user_id = %q.from.id, "callback without an accessible message, ignored");
        return Ok(());
    };
    let chat_id = message.chat().id;
    let message_id = message.id();
    let user_id = q.from.id.0 as i64;
    let data = q.data.as_deref().unwrap_or("");

    debug!(user_id, data, "callback action");

    if is_menu_action(data) && dialogue.get().await?.is_some() {
        dialogue.exit().await?;
    }

    match data {
        // Welcome screen
        "login" => flows::login::start(bot, chat_id, message_id, dialogue).await?,
        "register" => flows::registration::start(bot, chat_id, message_id, dialogue).await?,

        // Main menu
        "back_to_main" => menu::back_to_main(bot, sessions, chat_id).await?,
        "events" => menu::show_events(bot, storage, sessions, chat_id, user_id).await?,
        "tickets" => menu::show_my_tickets(bot, storage, sessions, chat_id, user_id).await?,
        "news" => menu::show_news(bot, storage, sessions, chat_id, user_id).await?,
        "settings" => menu::show_settings(bot, sessions, chat_id).await?,
        "logout" => menu::logout(bot, sessions, chat_id).await?,

        // Settings
        "profile" => menu::show_profile(bot, storage, sessions, chat_id, user_id).await?,
        "edit_profile" => menu::show_edit_profile(bot, sessions, chat_id).await?,
        "edit_fullname" => {
            flows::profile::start_field_edit(bot, chat_id, message_id, dialogue, ProfileField::FullName)
                .await?
        }
        "edit_email" => {
            flows::profile::start_field_edit(bot, chat_id, message_id, dialogue, ProfileField::Email)
                .await?
        }
        "edit_phone" => {
            flows::profile::start_field_edit(bot, chat_id, message_id, dialogue, ProfileField::Phone)
                .await?
        }
        "change_password" => flows::profile::confirm_change_password(bot, chat_id, message_id).await?,
        "change_password_yes" => {
            flows::profile::start_change_password(bot, chat_id, message_id, dialogue).await?
        }
        "toggle_notifications" => {
            menu::toggle_notifications(bot, storage, sessions, chat_id, user_id).await?
        }
        "support" => menu::show_support(bot, config, sessions, chat_id).await?,

        // Events listing
        "price_filter" => menu::show_price_filter(bot, sessions, chat_id).await?,
        "reset_filter" => menu::reset_price_filter(bot, storage, sessions, chat_id, user_id).await?,
        "create_event" => {
            flows::events::start(bot, storage, sessions, chat_id, user_id, dialogue).await?
        }
        "upload_image" => flows::events::prompt_upload(bot, sessions, chat_id).await?,
        "skip_image" => {
            if let State::CreateEvent(state) = current_state(&dialogue).await? {
                flows::events::skip_image(bot, chat_id, user_id, dialogue, storage, sessions, state)
                    .await?;
            }
        }

        // Purchase
        "confirm_buy" => {
            if let State::Purchase(state) = current_state(&dialogue).await? {
                flows::purchase::confirm(bot, sessions, chat_id, dialogue, state).await?;
            }
        }
        "pay_whatsapp" => {
            if let State::Purchase(state) = current_state(&dialogue).await? {
                flows::purchase::pay_whatsapp(
                    bot, storage, sessions, pending, config, chat_id, user_id, dialogue, state,
                )
                .await?;
            }
        }
        "finalize_purchase" => {
            if let State::Purchase(state) = current_state(&dialogue).await? {
                flows::purchase::finalize(bot, storage, sessions, chat_id, user_id, dialogue, state)
                    .await?;
            }
        }

        // News feed
        "create_news" => {
            flows::news::start(bot, storage, sessions, chat_id, user_id, dialogue).await?
        }
        "upload_news_image" => flows::news::prompt_upload(bot, sessions, chat_id).await?,
        "skip_news_image" => {
            if let State::PostNews(state) = current_state(&dialogue).await? {
                flows::news::skip_image(bot, chat_id, user_id, dialogue, storage, sessions, state)
                    .await?;
            }
        }

        // Parameterized actions
        d if d.starts_with("filter_") => match parse_filter_range(d) {
            Some(range) => {
                menu::apply_price_filter(bot, storage, sessions, chat_id, user_id, range).await?
            }
            None => debug!(data = d, "malformed price filter action"),
        },
        d if d.starts_with("buy_ticket_id_") => {
            if let Some(event_id) = d.strip_prefix("buy_ticket_id_") {
                flows::purchase::start(bot, sessions, chat_id, dialogue, event_id.to_string())
                    .await?;
            }
        }
        d if d.starts_with("tickets_event_") => {
            if let Some(event_id) = d.strip_prefix("tickets_event_") {
                menu::show_event_tickets(bot, storage, sessions, chat_id, user_id, event_id)
                    .await?;
            }
        }

        other => debug!(user_id, data = other, "unhandled callback action, ignored"),
    }

    Ok(())
}

async fn current_state(dialogue: &BotDialogue) -> Result<State> {
    Ok(dialogue.get().await?.unwrap_or_default())
}

/// `filter_{min}_{max}` carries the band bounds inline.
fn parse_filter_range(data: &str) -> Option<PriceRange> {
    let mut parts = data.strip_prefix("filter_")?.splitn(2, '_');
    let min = parts.next()?.parse().ok()?;
    let max = parts.next()?.parse().ok()?;
    Some(PriceRange { min, max })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_range_parsing() {
        let range = parse_filter_range("filter_5000_10000").unwrap();
        assert_eq!(range.min, 5000);
        assert_eq!(range.max, 10000);

        assert!(parse_filter_range("filter_abc_10").is_none());
        assert!(parse_filter_range("filter_10").is_none());
    }

    #[test]
    fn test_menu_actions_cover_navigation() {
        assert!(is_menu_action("back_to_main"));
        assert!(is_menu_action("filter_0_5000"));
        assert!(is_menu_action("tickets_event_abc"));

        // Flow-internal actions must not reset the dialogue.
        assert!(!is_menu_action("confirm_buy"));
        assert!(!is_menu_action("skip_image"));
        assert!(!is_menu_action("buy_ticket_id_abc"));
    }
}
