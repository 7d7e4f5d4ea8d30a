use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use tempfile::TempDir;

use lumamap::models::{Event, NewsPost, PurchaseRecord, User};
use lumamap::storage::Storage;
use lumamap::validation::hash_password;

/// Fresh storage over a throwaway directory. The TempDir must be kept alive
/// for the duration of the test or the files vanish under the storage.
fn test_storage() -> Result<(TempDir, Storage)> {
    let dir = tempfile::tempdir()?;
    let storage = Storage::open(dir.path());
    Ok((dir, storage))
}

fn sample_user(id: i64, email: &str) -> User {
    User {
        id,
        username: Some(format!("user{id}")),
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

fn sample_event(id: &str, title: &str, date: NaiveDate) -> Event {
    Event {
        id: id.to_string(),
        title: title.to_string(),
        description: "An evening of music".to_string(),
        date,
        location: "Central Park".to_string(),
        image: None,
        price: "5000 KZT".to_string(),
    }
}

#[tokio::test]
async fn test_fresh_directory_has_empty_collections() -> Result<()> {
    let (_dir, storage) = test_storage()?;

    assert!(storage.users.load().await.is_empty());
    assert!(storage.events.load().await.is_empty());
    assert!(storage.find_user(1).await.is_none());
    assert!(!storage.is_registered(1).await);
    assert!(storage.purchases_for_user(1).await.is_empty());
    assert!(storage.latest_news().await.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_user_persistence_and_lookups() -> Result<()> {
    let (_dir, storage) = test_storage()?;

    storage.add_user(sample_user(100, "anna@example.com")).await?;

    let found = storage.find_user(100).await.expect("user should persist");
    assert_eq!(found.email, "anna@example.com");
    assert!(!found.is_admin); // never granted at registration
    assert!(found.notifications); // on by default

    assert!(storage.is_registered(100).await);
    assert!(storage.email_taken("anna@example.com").await);
    assert!(!storage.email_taken("other@example.com").await);

    let by_username = storage.find_user_by_username("user100").await;
    assert_eq!(by_username.map(|u| u.id), Some(100));

    Ok(())
}

#[tokio::test]
async fn test_credentials_match_on_hash_not_plaintext() -> Result<()> {
    let (_dir, storage) = test_storage()?;
    storage.add_user(sample_user(100, "anna@example.com")).await?;

    let good = storage
        .find_user_by_credentials("anna@example.com", &hash_password("secret"))
        .await;
    assert_eq!(good.map(|u| u.id), Some(100));

    // The plain password must never match the stored digest.
    assert!(storage
        .find_user_by_credentials("anna@example.com", "secret")
        .await
        .is_none());
    assert!(storage
        .find_user_by_credentials("anna@example.com", &hash_password("wrong"))
        .await
        .is_none());

    Ok(())
}

#[tokio::test]
async fn test_update_user_reports_whether_the_user_existed() -> Result<()> {
    let (_dir, storage) = test_storage()?;

    let missing = storage.update_user(100, |u| u.points += 1).await?;
    assert!(!missing);

    storage.add_user(sample_user(100, "anna@example.com")).await?;
    let updated = storage
        .update_user(100, |u| u.full_name = "Anna K.".to_string())
        .await?;
    assert!(updated);

    let user = storage.find_user(100).await.unwrap();
    assert_eq!(user.full_name, "Anna K.");

    Ok(())
}

#[tokio::test]
async fn test_toggle_notifications_flips_and_persists() -> Result<()> {
    let (_dir, storage) = test_storage()?;
    storage.add_user(sample_user(100, "anna@example.com")).await?;

    assert_eq!(storage.toggle_notifications(100).await?, Some(false));
    assert_eq!(storage.toggle_notifications(100).await?, Some(true));
    assert_eq!(storage.toggle_notifications(999).await?, None);

    Ok(())
}

#[tokio::test]
async fn test_upcoming_events_drop_the_past_and_sort_by_date() -> Result<()> {
    let (_dir, storage) = test_storage()?;
    let today = NaiveDate::from_ymd_opt(2026, 9, 14).unwrap();

    storage
        .add_event(sample_event("a", "Yesterday's show", today - Duration::days(1)))
        .await?;
    storage
        .add_event(sample_event("b", "Next week", today + Duration::days(7)))
        .await?;
    storage
        .add_event(sample_event("c", "Tonight", today))
        .await?;

    let upcoming = storage.upcoming_events(today).await;
    let ids: Vec<&str> = upcoming.iter().map(|e| e.id.as_str()).collect();

    // Today's event counts as upcoming; the past one is gone; soonest first.
    assert_eq!(ids, vec!["c", "b"]);

    Ok(())
}

#[tokio::test]
async fn test_purchases_are_scoped_to_their_buyer() -> Result<()> {
    let (_dir, storage) = test_storage()?;

    let record = |user_id: i64, event_id: &str| PurchaseRecord {
        user_id,
        event_id: event_id.to_string(),
        event_title: "Concert".to_string(),
        qty: 2,
        total: 10_000,
        codes: vec!["c1".to_string(), "c2".to_string()],
        purchased_at: Utc::now(),
    };

    storage.add_purchase(record(100, "a")).await?;
    storage.add_purchase(record(100, "b")).await?;
    storage.add_purchase(record(200, "a")).await?;

    assert_eq!(storage.purchases_for_user(100).await.len(), 2);
    assert_eq!(storage.purchases_for_user(200).await.len(), 1);
    assert!(storage.purchases_for_user(300).await.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_latest_news_is_newest_first() -> Result<()> {
    let (_dir, storage) = test_storage()?;
    let base = Utc::now();

    for (offset, text) in [(2, "oldest"), (0, "newest"), (1, "middle")] {
        storage
            .add_news(NewsPost {
                description: text.to_string(),
                image: None,
                created_at: base - Duration::hours(offset),
            })
            .await?;
    }

    let posts = storage.latest_news().await;
    let order: Vec<&str> = posts.iter().map(|p| p.description.as_str()).collect();
    assert_eq!(order, vec!["newest", "middle", "oldest"]);

    Ok(())
}

#[tokio::test]
async fn test_collections_use_the_envelope_file_shape() -> Result<()> {
    let (dir, storage) = test_storage()?;
    storage.add_user(sample_user(100, "anna@example.com")).await?;

    let raw = std::fs::read_to_string(dir.path().join("users.json"))?;
    let doc: serde_json::Value = serde_json::from_str(&raw)?;

    let users = doc
        .get("users")
        .and_then(|v| v.as_array())
        .expect("users.json should hold a {\"users\": [...]} envelope");
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], 100);

    Ok(())
}

#[tokio::test]
async fn test_corrupt_collection_file_reads_as_empty() -> Result<()> {
    let (dir, storage) = test_storage()?;

    std::fs::write(dir.path().join("users.json"), "not json at all")?;
    assert!(storage.users.load().await.is_empty());

    // The next write recovers the file.
    storage.add_user(sample_user(100, "anna@example.com")).await?;
    assert!(storage.is_registered(100).await);

    Ok(())
}

#[tokio::test]
async fn test_records_survive_a_storage_reopen() -> Result<()> {
    let dir = tempfile::tempdir()?;

    {
        let storage = Storage::open(dir.path());
        storage.add_user(sample_user(100, "anna@example.com")).await?;
    }

    let reopened = Storage::open(dir.path());
    assert!(reopened.is_registered(100).await);

    Ok(())
}
