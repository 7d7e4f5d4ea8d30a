//! Ticket purchase flow: confirm intent, quantity, pay or finalize.

use anyhow::Result;
use std::time::Duration;
use teloxide::prelude::*;
use tracing::{info, warn};

use crate::bot::menu;
use crate::bot::ui_builder::{
    back_keyboard, payment_choice_keyboard, url_keyboard, whatsapp_payment_link, yes_no_keyboard,
};
use crate::config::BotConfig;
use crate::dialogue::{BotDialogue, PurchaseState, State};
use crate::models::PendingPayment;
use crate::pending::PendingLedger;
use crate::session::{Screen, Sessions};
use crate::storage::Storage;
use crate::tickets;
use crate::validation::{order_total, parse_quantity};

/// UX pacing after the WhatsApp hand-off, before the menu comes back.
const PAYMENT_REDIRECT_DELAY: Duration = Duration::from_secs(20);

/// Entry point, reached from an event card's buy button.
pub async fn start(
    bot: &Bot,
    sessions: &Sessions,
    chat_id: ChatId,
    dialogue: BotDialogue,
    event_id: String,
) -> Result<()> {
    sessions.clear_screen(bot, chat_id).await;
    let sent = bot
        .send_message(
            chat_id,
            "🎟 Buy a ticket for this event?",
        )
        .reply_markup(yes_no_keyboard("confirm_buy", "events"))
        .await?;
    sessions.set_screen(chat_id, Screen::single(sent.id)).await;
    dialogue
        .update(State::Purchase(PurchaseState::ConfirmIntent { event_id }))
        .await?;
    Ok(())
}

/// The yes button on the confirmation screen: ask how many tickets.
pub async fn confirm(
    bot: &Bot,
    sessions: &Sessions,
    chat_id: ChatId,
    dialogue: BotDialogue,
    state: PurchaseState,
) -> Result<()> {
    let PurchaseState::ConfirmIntent { event_id } = state else {
        return Ok(());
    };

    sessions.clear_screen(bot, chat_id).await;
    let sent = bot
        .send_message(chat_id, "🔢 How many tickets?")
        .await?;
    sessions.set_screen(chat_id, Screen::single(sent.id)).await;
    dialogue
        .update(State::Purchase(PurchaseState::AwaitQuantity { event_id }))
        .await?;
    Ok(())
}

/// Route a text message to the step the purchase is waiting on. Only the
/// quantity step reads text; the other steps are button-driven, so a typed
/// message there is just swept up with the screen.
pub async fn handle_text(
    bot: &Bot,
    msg: &Message,
    text: &str,
    dialogue: BotDialogue,
    storage: &Storage,
    sessions: &Sessions,
    state: PurchaseState,
) -> Result<()> {
    sessions.track(msg.chat.id, msg.id).await;

    let PurchaseState::AwaitQuantity { event_id } = state else {
        return Ok(());
    };

    let qty = match parse_quantity(text) {
        Ok(qty) => qty,
        Err(_) => {
            let sent = bot
                .send_message(
                    msg.chat.id,
                    "❌ Enter a whole number of tickets, at least 1:",
                )
                .await?;
            sessions.track(msg.chat.id, sent.id).await;
            return Ok(());
        }
    };

    let Some(event) = storage.find_event(&event_id).await else {
        warn!(event_id = %event_id, "purchase against a missing event");
        sessions.clear_screen(bot, msg.chat.id).await;
        let sent = bot
            .send_message(msg.chat.id, "❌ This event no longer exists.")
            .reply_markup(back_keyboard("events"))
            .await?;
        sessions.set_screen(msg.chat.id, Screen::single(sent.id)).await;
        dialogue.exit().await?;
        return Ok(());
    };

    let total = order_total(qty, &event.price);
    let sent = bot
        .send_message(
            msg.chat.id,
            format!(
                "💸 {} × {}: total {total} KZT.\n\nHow would you like to pay?",
                event.title, qty
            ),
        )
        .reply_markup(payment_choice_keyboard())
        .await?;
    sessions.track(msg.chat.id, sent.id).await;
    dialogue
        .update(State::Purchase(PurchaseState::AwaitPaymentChoice {
            event_id,
            qty,
            total,
        }))
        .await?;
    Ok(())
}

/// The WhatsApp hand-off: record the purchase as pending, show the chat
/// link, and bring the menu back after a pause. Tickets are issued later by
/// an admin `/confirm`.
#[allow(clippy::too_many_arguments)]
pub async fn pay_whatsapp(
    bot: &Bot,
    storage: &Storage,
    sessions: &Sessions,
    pending: &PendingLedger,
    config: &BotConfig,
    chat_id: ChatId,
    user_id: i64,
    dialogue: BotDialogue,
    state: PurchaseState,
) -> Result<()> {
    let PurchaseState::AwaitPaymentChoice {
        event_id,
        qty,
        total,
    } = state
    else {
        return Ok(());
    };

    let Some(event) = storage.find_event(&event_id).await else {
        warn!(event_id = %event_id, "payment hand-off against a missing event");
        sessions.clear_screen(bot, chat_id).await;
        let sent = bot
            .send_message(chat_id, "❌ This event no longer exists.")
            .reply_markup(back_keyboard("events"))
            .await?;
        sessions.set_screen(chat_id, Screen::single(sent.id)).await;
        dialogue.exit().await?;
        return Ok(());
    };

    sessions.clear_screen(bot, chat_id).await;

    let buyer = storage
        .find_user(user_id)
        .await
        .map(|u| u.full_name)
        .unwrap_or_else(|| "a LumaMap user".to_string());
    let link = whatsapp_payment_link(&config.support_phone, qty, &event.title, total, &buyer);
    let url = reqwest::Url::parse(&link)?;
    // Deliberately untracked: the link has to survive the redirect back to
    // the menu so the user can still open the payment chat.
    bot.send_message(
        chat_id,
        "📲 Tap the button to finish the payment in WhatsApp.\n\
         You'll be taken back to the menu in 20 seconds.",
    )
    .reply_markup(url_keyboard("💬 Open WhatsApp", url))
    .await?;

    pending
        .push(PendingPayment {
            user_id,
            event_id: event.id.clone(),
            event_title: event.title.clone(),
            qty,
            total,
        })
        .await;
    dialogue.exit().await?;

    info!(user_id, event_id = %event.id, qty, total, "payment pending admin confirmation");

    tokio::time::sleep(PAYMENT_REDIRECT_DELAY).await;
    menu::back_to_main(bot, sessions, chat_id).await
}

/// Direct finalization: issue the tickets right away.
pub async fn finalize(
    bot: &Bot,
    storage: &Storage,
    sessions: &Sessions,
    chat_id: ChatId,
    user_id: i64,
    dialogue: BotDialogue,
    state: PurchaseState,
) -> Result<()> {
    let PurchaseState::AwaitPaymentChoice {
        event_id,
        qty,
        total,
    } = state
    else {
        return Ok(());
    };

    let Some(event) = storage.find_event(&event_id).await else {
        warn!(event_id = %event_id, "finalize against a missing event");
        sessions.clear_screen(bot, chat_id).await;
        let sent = bot
            .send_message(chat_id, "❌ This event no longer exists.")
            .reply_markup(back_keyboard("events"))
            .await?;
        sessions.set_screen(chat_id, Screen::single(sent.id)).await;
        dialogue.exit().await?;
        return Ok(());
    };

    sessions.clear_screen(bot, chat_id).await;
    let batch =
        tickets::issue_purchase(bot, storage, user_id, &event.id, &event.title, qty, total)
            .await?;

    // The QR photos belong to this screen; opening another menu replaces
    // them, and they stay reachable under My tickets.
    let mut screen = Screen::new();
    for photo_id in batch.photo_messages {
        screen.push(photo_id);
    }

    let sent = bot
        .send_message(
            chat_id,
            format!("✅ You bought {qty} ticket(s) for {}.", event.title),
        )
        .reply_markup(back_keyboard("back_to_main"))
        .await?;
    screen.push(sent.id);
    sessions.set_screen(chat_id, screen).await;
    dialogue.exit().await?;
    Ok(())
}
