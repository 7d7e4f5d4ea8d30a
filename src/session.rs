//! # Session Module
//!
//! Per-chat UI state: the tracked message "screen" and the events price
//! filter. The bot keeps each chat pointed at one screen of messages;
//! rendering a new screen deletes the previous one's messages wholesale, so
//! stale keyboards never linger. Sessions live in memory only and reset on
//! restart.

use std::collections::HashMap;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tokio::sync::Mutex;
use tracing::warn;

/// Inclusive price band applied to the events listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: u64,
    pub max: u64,
}

impl PriceRange {
    pub fn contains(&self, price: u64) -> bool {
        price >= self.min && price <= self.max
    }
}

/// One rendered screen: the bot messages (and echoed user inputs) that make
/// up the chat's current view.
#[derive(Debug, Default, Clone)]
pub struct Screen {
    messages: Vec<MessageId>,
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(message_id: MessageId) -> Self {
        Self {
            messages: vec![message_id],
        }
    }

    pub fn push(&mut self, message_id: MessageId) {
        self.messages.push(message_id);
    }

    pub fn ids(&self) -> &[MessageId] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[derive(Debug, Default)]
struct ChatSession {
    screen: Screen,
    price_filter: Option<PriceRange>,
}

/// Registry of in-memory chat sessions.
#[derive(Clone, Default)]
pub struct Sessions {
    inner: Arc<Mutex<HashMap<ChatId, ChatSession>>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the chat's current screen.
    pub async fn track(&self, chat_id: ChatId, message_id: MessageId) {
        let mut sessions = self.inner.lock().await;
        sessions.entry(chat_id).or_default().screen.push(message_id);
    }

    /// Replace the chat's screen wholesale.
    pub async fn set_screen(&self, chat_id: ChatId, screen: Screen) {
        let mut sessions = self.inner.lock().await;
        sessions.entry(chat_id).or_default().screen = screen;
    }

    /// Message ids currently tracked for the chat.
    pub async fn screen_ids(&self, chat_id: ChatId) -> Vec<MessageId> {
        let sessions = self.inner.lock().await;
        sessions
            .get(&chat_id)
            .map(|s| s.screen.ids().to_vec())
            .unwrap_or_default()
    }

    /// Delete every tracked message in the chat and leave the screen empty.
    ///
    /// Deletion is best effort: messages may already be gone or too old to
    /// delete, and a failed delete must never break the flow that asked for
    /// the redraw.
    pub async fn clear_screen(&self, bot: &Bot, chat_id: ChatId) {
        let stale = {
            let mut sessions = self.inner.lock().await;
            match sessions.get_mut(&chat_id) {
                Some(session) => std::mem::take(&mut session.screen),
                None => return,
            }
        };

        for message_id in stale.ids() {
            if let Err(err) = bot.delete_message(chat_id, *message_id).await {
                warn!(
                    chat_id = %chat_id,
                    message_id = message_id.0,
                    error = %err,
                    "failed to delete tracked message"
                );
            }
        }
    }

    pub async fn set_price_filter(&self, chat_id: ChatId, range: PriceRange) {
        let mut sessions = self.inner.lock().await;
        sessions.entry(chat_id).or_default().price_filter = Some(range);
    }

    pub async fn clear_price_filter(&self, chat_id: ChatId) {
        let mut sessions = self.inner.lock().await;
        if let Some(session) = sessions.get_mut(&chat_id) {
            session.price_filter = None;
        }
    }

    pub async fn price_filter(&self, chat_id: ChatId) -> Option<PriceRange> {
        let sessions = self.inner.lock().await;
        sessions.get(&chat_id).and_then(|s| s.price_filter)
    }

    /// Forget everything about the chat without touching Telegram.
    pub async fn reset(&self, chat_id: ChatId) {
        let mut sessions = self.inner.lock().await;
        sessions.remove(&chat_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_collects_ids() {
        let mut screen = Screen::new();
        assert!(screen.is_empty());

        screen.push(MessageId(10));
        screen.push(MessageId(11));
        assert_eq!(screen.ids(), &[MessageId(10), MessageId(11)]);
    }

    #[test]
    fn test_price_range_bounds_are_inclusive() {
        let range = PriceRange { min: 1000, max: 5000 };
        assert!(range.contains(1000));
        assert!(range.contains(5000));
        assert!(!range.contains(999));
        assert!(!range.contains(5001));

        let free = PriceRange { min: 0, max: 0 };
        assert!(free.contains(0));
        assert!(!free.contains(1));
    }

    #[tokio::test]
    async fn test_set_screen_replaces_tracked_messages() {
        let sessions = Sessions::new();
        let chat = ChatId(1);

        sessions.track(chat, MessageId(1)).await;
        sessions.track(chat, MessageId(2)).await;
        assert_eq!(sessions.screen_ids(chat).await.len(), 2);

        sessions.set_screen(chat, Screen::single(MessageId(3))).await;
        assert_eq!(sessions.screen_ids(chat).await, vec![MessageId(3)]);
    }

    #[tokio::test]
    async fn test_reset_drops_filter_and_screen() {
        let sessions = Sessions::new();
        let chat = ChatId(7);

        sessions.track(chat, MessageId(1)).await;
        sessions
            .set_price_filter(chat, PriceRange { min: 0, max: 0 })
            .await;
        sessions.reset(chat).await;

        assert!(sessions.screen_ids(chat).await.is_empty());
        assert!(sessions.price_filter(chat).await.is_none());
    }
}
