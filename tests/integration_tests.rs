//! # Integration Tests
//!
//! End-to-end scenarios for the LumaMap bot below the Telegram transport:
//! account uniqueness, the purchase ledger, ticket issuance records and the
//! price filter, exercised against real files in a temp directory.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::types::{ChatId, MessageId};

use lumamap::bot::ui_builder::whatsapp_payment_link;
use lumamap::dialogue::{BotDialogue, CreateEventState, RegisterState, State};
use lumamap::models::{Event, PendingPayment, PurchaseRecord, User};
use lumamap::pending::PendingLedger;
use lumamap::session::PriceRange;
use lumamap::storage::Storage;
use lumamap::tickets::generate_codes;
use lumamap::validation::{hash_password, parse_price};

fn registered_user(id: i64, username: &str, email: &str) -> User {
    User {
        id,
        username: Some(username.to_string()),
        full_name: "Anna Petrova".to_string(),
        email: email.to_string(),
        phone: "+77051234567".to_string(),
        password: hash_password("secret"),
        is_admin: false,
        notifications: true,
        points: 0,
        tickets_bought: 0,
    }
}

fn event(id: &str, title: &str, price: &str) -> Event {
    Event {
        id: id.to_string(),
        title: title.to_string(),
        description: "description".to_string(),
        date: NaiveDate::from_ymd_opt(2026, 9, 14).unwrap(),
        location: "Old Square".to_string(),
        image: None,
        price: price.to_string(),
    }
}

/// Registration must refuse an already-registered Telegram account and an
/// already-used email, exactly the checks the registration flow performs.
#[tokio::test]
async fn test_account_uniqueness_checks() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let storage = Storage::open(dir.path());

    storage
        .add_user(registered_user(100, "anna", "anna@example.com"))
        .await?;

    // Same Telegram account cannot register twice.
    assert!(storage.is_registered(100).await);

    // A different account cannot reuse the email.
    assert!(storage.email_taken("anna@example.com").await);
    assert!(!storage.email_taken("boris@example.com").await);

    Ok(())
}

/// The WhatsApp path parks the purchase in the pending ledger; an admin
/// confirmation drains it exactly once and only for the targeted buyer.
#[tokio::test]
async fn test_whatsapp_purchase_waits_in_the_pending_ledger() -> Result<()> {
    let pending = PendingLedger::new();

    let park = |user_id: i64, event_id: &str, qty: u32, total: u64| PendingPayment {
        user_id,
        event_id: event_id.to_string(),
        event_title: "Jazz Night".to_string(),
        qty,
        total,
    };

    pending.push(park(100, "a", 2, 10_000)).await;
    pending.push(park(100, "b", 1, 3_000)).await;
    pending.push(park(200, "a", 4, 20_000)).await;

    // The confirmation drains every entry the buyer has, in order.
    let drained = pending.drain_for(100).await;
    assert_eq!(drained.len(), 2);
    assert_eq!(drained[0].event_id, "a");
    assert_eq!(drained[1].event_id, "b");

    // A second confirmation finds nothing; the other buyer is untouched.
    assert!(pending.drain_for(100).await.is_empty());
    assert_eq!(pending.len().await, 1);

    Ok(())
}

/// What an issued purchase leaves behind: a persisted record with one code
/// per ticket and a bumped counter on the buyer.
#[tokio::test]
async fn test_issued_purchase_leaves_a_full_record() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let storage = Storage::open(dir.path());
    storage
        .add_user(registered_user(100, "anna", "anna@example.com"))
        .await?;
    storage.add_event(event("ev1", "Jazz Night", "5000 KZT")).await?;

    let qty = 3;
    let unit = parse_price("5000 KZT");
    let total = u64::from(qty) * unit;
    assert_eq!(total, 15_000);

    let issued_at = Utc::now();
    let codes = generate_codes(100, "ev1", qty, issued_at);
    storage
        .add_purchase(PurchaseRecord {
            user_id: 100,
            event_id: "ev1".to_string(),
            event_title: "Jazz Night".to_string(),
            qty,
            total,
            codes: codes.clone(),
            purchased_at: issued_at,
        })
        .await?;
    storage
        .update_user(100, |user| user.tickets_bought += qty)
        .await?;

    let records = storage.purchases_for_user(100).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].codes.len(), 3);
    assert_eq!(records[0].total, 15_000);

    let buyer = storage.find_user(100).await.unwrap();
    assert_eq!(buyer.tickets_bought, 3);

    Ok(())
}

/// Two events may share a title; tickets and lookups key on the event id.
#[tokio::test]
async fn test_equally_titled_events_stay_distinct() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let storage = Storage::open(dir.path());

    storage.add_event(event("spring", "Open Air", "1000")).await?;
    storage.add_event(event("autumn", "Open Air", "2000")).await?;

    let spring = storage.find_event("spring").await.unwrap();
    let autumn = storage.find_event("autumn").await.unwrap();
    assert_eq!(spring.title, autumn.title);
    assert_ne!(spring.price, autumn.price);

    // Codes generated for one never reference the other.
    let codes = generate_codes(100, "spring", 1, Utc::now());
    assert!(codes[0].contains("_spring_"));
    assert!(!codes[0].contains("autumn"));

    Ok(())
}

/// The price bands are inclusive on both edges, and free events (no digits
/// in the price text) land in the lowest band.
#[tokio::test]
async fn test_price_filter_bands_are_inclusive() -> Result<()> {
    let band = PriceRange {
        min: 5_000,
        max: 10_000,
    };

    assert!(band.contains(parse_price("5000 KZT")));
    assert!(band.contains(parse_price("10000 KZT")));
    assert!(!band.contains(parse_price("4999")));
    assert!(!band.contains(parse_price("10001")));

    let free_band = PriceRange { min: 0, max: 5_000 };
    assert!(free_band.contains(parse_price("Free")));

    Ok(())
}

/// The payment hand-off link must target the configured number and carry
/// the order summary and the buyer's name, URL-escaped.
#[tokio::test]
async fn test_whatsapp_link_carries_the_order() -> Result<()> {
    let link = whatsapp_payment_link("77059821077", 2, "Jazz Night", 10_000, "Anna Petrova");

    assert!(link.starts_with("https://wa.me/77059821077?text="));
    assert!(link.contains("2%20ticket(s)"));
    assert!(link.contains("Jazz%20Night"));
    assert!(link.contains("10000%20KZT"));
    assert!(link.contains("Anna%20Petrova"));
    assert!(!link.contains(' '));

    Ok(())
}

/// Cancelling mid-flow discards the accumulated inputs together with the
/// dialogue state; the collections on disk stay exactly as they were.
#[tokio::test]
async fn test_cancel_discards_flow_state_and_leaves_storage_untouched() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let storage = Storage::open(dir.path());
    storage
        .add_user(registered_user(100, "anna", "anna@example.com"))
        .await?;

    let dialogue = BotDialogue::new(InMemStorage::<State>::new(), ChatId(100));

    // A registration one input short of the terminal step. Everything
    // collected so far rides in the dialogue state, nowhere else.
    dialogue
        .update(State::Register(RegisterState::AwaitConfirm {
            anchor: MessageId(7),
            full_name: "Boris Ivanov".to_string(),
            email: "boris@example.com".to_string(),
            phone: "+77057654321".to_string(),
            password_hash: hash_password("hunter2"),
        }))
        .await?;

    // `/cancel` exits the dialogue; the inputs go with it.
    dialogue.exit().await?;
    assert!(dialogue.get().await?.is_none());

    // Same for an event form at its final step.
    dialogue
        .update(State::CreateEvent(CreateEventState::AwaitImage {
            title: "Open Air".to_string(),
            description: "description".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 9, 14).unwrap(),
            location: "Old Square".to_string(),
            price: "1000".to_string(),
        }))
        .await?;
    dialogue.exit().await?;
    assert!(dialogue.get().await?.is_none());

    let users = storage.users.load().await;
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].email, "anna@example.com");
    assert!(storage.events.load().await.is_empty());
    assert!(storage.purchases_for_user(100).await.is_empty());

    Ok(())
}
