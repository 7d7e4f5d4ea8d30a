//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::models::{Event, NewsPost, User};
use crate::session::PriceRange;

/// Price bands offered by the events filter, with their button labels.
pub const PRICE_RANGES: &[(u64, u64, &str)] = &[
    (0, 0, "🆓 Free"),
    (1_000, 5_000, "1 000 – 5 000"),
    (5_001, 10_000, "5 001 – 10 000"),
    (10_001, 50_000, "10 001 – 50 000"),
    (50_001, 100_000, "50 001 – 100 000"),
    (100_001, 500_000, "100 001 – 500 000"),
];

/// Human label for a selected price band.
pub fn price_range_label(range: PriceRange) -> String {
    PRICE_RANGES
        .iter()
        .find(|(min, max, _)| *min == range.min && *max == range.max)
        .map(|(_, _, label)| (*label).to_string())
        .unwrap_or_else(|| format!("{} – {}", range.min, range.max))
}

/// Entry keyboard shown to unauthenticated chats.
pub fn login_register_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("🔑 Log in", "login"),
        InlineKeyboardButton::callback("📝 Register", "register"),
    ]])
}

pub fn main_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("🎭 City events", "events")],
        vec![InlineKeyboardButton::callback("🎫 My tickets", "tickets")],
        vec![InlineKeyboardButton::callback(
            "📰 News & announcements",
            "news",
        )],
        vec![InlineKeyboardButton::callback("⚙️ Settings", "settings")],
        vec![InlineKeyboardButton::callback("🚪 Log out", "logout")],
    ])
}

pub fn settings_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("👤 My profile", "profile")],
        vec![InlineKeyboardButton::callback(
            "🔔 Toggle notifications",
            "toggle_notifications",
        )],
        vec![InlineKeyboardButton::callback(
            "🔑 Change password",
            "change_password",
        )],
        vec![InlineKeyboardButton::callback("📞 Support", "support")],
        vec![InlineKeyboardButton::callback("⬅️ Back", "back_to_main")],
    ])
}

pub fn profile_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "✏️ Edit details",
            "edit_profile",
        )],
        vec![InlineKeyboardButton::callback("⬅️ Back", "settings")],
    ])
}

pub fn edit_profile_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("👤 Change name", "edit_fullname")],
        vec![InlineKeyboardButton::callback("📧 Change email", "edit_email")],
        vec![InlineKeyboardButton::callback("📱 Change phone", "edit_phone")],
        vec![InlineKeyboardButton::callback("⬅️ Back", "profile")],
    ])
}

/// A single back button pointing at the given menu action.
pub fn back_keyboard(action: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "⬅️ Back", action,
    )]])
}

/// Generic confirmation keyboard.
pub fn yes_no_keyboard(yes_action: &str, no_action: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("✅ Yes", yes_action),
        InlineKeyboardButton::callback("❌ No", no_action),
    ]])
}

/// Buy button attached to one event card.
pub fn event_keyboard(event: &Event) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "🎟 Buy a ticket",
        format!("buy_ticket_id_{}", event.id),
    )]])
}

/// Footer under the events listing; admins also get the create button.
pub fn events_footer_keyboard(is_admin: bool) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    if is_admin {
        rows.push(vec![InlineKeyboardButton::callback(
            "🎨 Create an event",
            "create_event",
        )]);
    }
    rows.push(vec![InlineKeyboardButton::callback(
        "🔎 Filter by price",
        "price_filter",
    )]);
    rows.push(vec![InlineKeyboardButton::callback(
        "⬅️ Back",
        "back_to_main",
    )]);
    InlineKeyboardMarkup::new(rows)
}

pub fn price_filter_keyboard() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = PRICE_RANGES
        .iter()
        .map(|(min, max, label)| {
            vec![InlineKeyboardButton::callback(
                *label,
                format!("filter_{min}_{max}"),
            )]
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback(
        "♻️ Reset filter",
        "reset_filter",
    )]);
    rows.push(vec![InlineKeyboardButton::callback("⬅️ Back", "events")]);
    InlineKeyboardMarkup::new(rows)
}

/// Payment options shown once the quantity and total are known.
pub fn payment_choice_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "💬 Pay via WhatsApp",
            "pay_whatsapp",
        )],
        vec![InlineKeyboardButton::callback(
            "✅ Complete purchase",
            "finalize_purchase",
        )],
    ])
}

/// One event button per row, targeting that event's tickets.
pub fn ticket_events_keyboard(events: &[Event]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = events
        .iter()
        .map(|event| {
            vec![InlineKeyboardButton::callback(
                event.title.clone(),
                format!("tickets_event_{}", event.id),
            )]
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback(
        "⬅️ Back",
        "back_to_main",
    )]);
    InlineKeyboardMarkup::new(rows)
}

/// Footer under the news feed; admins also get the create button.
pub fn news_footer_keyboard(is_admin: bool) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    if is_admin {
        rows.push(vec![InlineKeyboardButton::callback(
            "✍️ New post",
            "create_news",
        )]);
    }
    rows.push(vec![InlineKeyboardButton::callback(
        "⬅️ Back",
        "back_to_main",
    )]);
    InlineKeyboardMarkup::new(rows)
}

/// Upload-or-skip choice for the optional image steps.
pub fn image_prompt_keyboard(upload_action: &str, skip_action: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("📷 Upload an image", upload_action),
        InlineKeyboardButton::callback("⏭ Skip", skip_action),
    ]])
}

/// Single button opening an external link.
pub fn url_keyboard(label: &str, url: reqwest::Url) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(label, url)]])
}

pub fn format_event_card(event: &Event) -> String {
    format!(
        "🎪 {}\n📅 Date: {}\n📍 Location: {}\n💰 Price: {}\n\n📝 {}",
        event.title, event.date, event.location, event.price, event.description
    )
}

pub fn format_profile(user: &User) -> String {
    format!(
        "👤 Your profile\n\n\
         🆔 ID: {}\n\
         👤 Name: {}\n\
         📧 Email: {}\n\
         📱 Phone: {}\n\
         ⭐ Points: {}\n\
         🎫 Tickets bought: {}",
        user.id, user.full_name, user.email, user.phone, user.points, user.tickets_bought
    )
}

pub fn format_news_post(post: &NewsPost) -> String {
    format!(
        "{}\n\n🕒 {}",
        post.description,
        post.created_at.format("%Y-%m-%d %H:%M")
    )
}

/// wa.me link with a prefilled order message for the payment hand-off. The
/// buyer's name is included so the admin can match the chat to an account.
pub fn whatsapp_payment_link(
    phone: &str,
    qty: u32,
    event_title: &str,
    total: u64,
    buyer: &str,
) -> String {
    let text = format!(
        "Hello! I want to buy {qty} ticket(s) for {event_title} (total {total} KZT). My name is {buyer}."
    );
    format!("https://wa.me/{}?text={}", phone, text.replace(' ', "%20"))
}
