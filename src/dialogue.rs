//! Conversation state machine for the multi-step bot flows.
//!
//! Every flow owns its own state enum and the top-level [`State`] wraps them,
//! so a chat is always in exactly one step of at most one flow. Collected
//! inputs ride inside the variants; a half-finished form can never leak into
//! another flow.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};
use teloxide::types::MessageId;

/// Top-level conversation state for a chat.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum State {
    /// No flow in progress; the chat is navigating menus.
    #[default]
    Idle,
    Register(RegisterState),
    Login(LoginState),
    /// Waiting for the replacement value of one profile field.
    EditProfile { field: ProfileField },
    /// Waiting for the new password after the user confirmed the change.
    ChangePassword,
    CreateEvent(CreateEventState),
    Purchase(PurchaseState),
    PostNews(NewsState),
}

/// Registration form steps. `anchor` is the welcome message the form was
/// entered from; it is edited into the main menu when the form completes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum RegisterState {
    AwaitFullName {
        anchor: MessageId,
    },
    AwaitEmail {
        anchor: MessageId,
        full_name: String,
    },
    AwaitPhone {
        anchor: MessageId,
        full_name: String,
        email: String,
    },
    AwaitPassword {
        anchor: MessageId,
        full_name: String,
        email: String,
        phone: String,
    },
    /// Holds the hash of the first password entry; the confirmation is
    /// compared hash-to-hash so the plain text is never kept around.
    AwaitConfirm {
        anchor: MessageId,
        full_name: String,
        email: String,
        phone: String,
        password_hash: String,
    },
}

/// Login form steps. `anchor` is the welcome message, deleted on success.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum LoginState {
    AwaitEmail {
        anchor: MessageId,
    },
    AwaitPassword {
        anchor: MessageId,
        email: String,
    },
}

/// Which profile field an edit targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileField {
    FullName,
    Email,
    Phone,
}

impl ProfileField {
    pub fn label(&self) -> &'static str {
        match self {
            ProfileField::FullName => "name",
            ProfileField::Email => "email",
            ProfileField::Phone => "phone number",
        }
    }
}

/// Event creation form steps, admin only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum CreateEventState {
    AwaitTitle,
    AwaitDescription {
        title: String,
    },
    AwaitDate {
        title: String,
        description: String,
    },
    AwaitLocation {
        title: String,
        description: String,
        date: NaiveDate,
    },
    AwaitPrice {
        title: String,
        description: String,
        date: NaiveDate,
        location: String,
    },
    /// Waiting for a poster photo, or an upload/skip button press.
    AwaitImage {
        title: String,
        description: String,
        date: NaiveDate,
        location: String,
        price: String,
    },
}

/// Ticket purchase steps for one event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum PurchaseState {
    /// The "are you sure" screen is showing.
    ConfirmIntent { event_id: String },
    AwaitQuantity { event_id: String },
    /// Quantity chosen; waiting for WhatsApp hand-off or direct finalize.
    AwaitPaymentChoice {
        event_id: String,
        qty: u32,
        total: u64,
    },
}

/// News post creation steps, admin only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum NewsState {
    AwaitText,
    AwaitImage { description: String },
}

/// Type alias for the bot dialogue
pub type BotDialogue = Dialogue<State, InMemStorage<State>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_idle() {
        assert!(matches!(State::default(), State::Idle));
    }

    #[test]
    fn test_state_round_trips_through_serde() {
        let state = State::Register(RegisterState::AwaitConfirm {
            anchor: MessageId(42),
            full_name: "Anna Petrova".to_string(),
            email: "anna@example.com".to_string(),
            phone: "+77051234567".to_string(),
            password_hash: "deadbeef".to_string(),
        });

        let json = serde_json::to_string(&state).expect("state should serialize");
        let parsed: State = serde_json::from_str(&json).expect("state should deserialize");

        match parsed {
            State::Register(RegisterState::AwaitConfirm { anchor, email, .. }) => {
                assert_eq!(anchor, MessageId(42));
                assert_eq!(email, "anna@example.com");
            }
            other => panic!("unexpected state after round trip: {other:?}"),
        }
    }

    #[test]
    fn test_purchase_state_carries_the_quantity_and_total() {
        let state = State::Purchase(PurchaseState::AwaitPaymentChoice {
            event_id: "6d4c0b2e".to_string(),
            qty: 3,
            total: 15_000,
        });

        match state {
            State::Purchase(PurchaseState::AwaitPaymentChoice { qty, total, .. }) => {
                assert_eq!(qty, 3);
                assert_eq!(total, 15_000);
            }
            other => panic!("unexpected state: {other:?}"),
        }
    }
}
