//! Domain records persisted in the JSON collections.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_price() -> String {
    "0".to_string()
}

/// A registered account. `id` is the Telegram user id, which in private
/// chats doubles as the chat id tickets are delivered to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    /// SHA-256 hex digest, never the plain password.
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default = "default_true")]
    pub notifications: bool,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub tickets_bought: u32,
}

/// A published event shown in the city events listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Random UUID. Purchases reference this id, so equally-titled events
    /// stay distinct.
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub location: String,
    /// Poster image path on disk, if the organizer attached one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Free-form price text as entered by the organizer, e.g. "5000 KZT".
    #[serde(default = "default_price")]
    pub price: String,
}

impl Event {
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.date >= today
    }
}

/// One completed purchase: a batch of ticket codes issued to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub user_id: i64,
    pub event_id: String,
    /// Title at purchase time, kept for display even if the event changes.
    pub event_title: String,
    pub qty: u32,
    pub total: u64,
    pub codes: Vec<String>,
    pub purchased_at: DateTime<Utc>,
}

/// An announcement shown in the news feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsPost {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A purchase paid externally, waiting for an admin to confirm it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPayment {
    pub user_id: i64,
    pub event_id: String,
    pub event_title: String,
    pub qty: u32,
    pub total: u64,
}
