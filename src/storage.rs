//! # Storage Module
//!
//! JSON-file persistence for users, events, purchases and news.
//!
//! Each collection lives in its own file under the data directory as a
//! single-key envelope, e.g. `users.json` holds `{"users": [...]}`. Every
//! write rewrites the whole file, and a per-collection mutex serializes
//! read-modify-write cycles so concurrent handlers cannot lose updates.
//! A missing or unreadable file is treated as an empty collection, so the
//! bot bootstraps itself on first run; failed writes are reported to the
//! caller instead of being swallowed.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::warn;

use crate::models::{Event, NewsPost, PurchaseRecord, User};

/// One JSON-backed collection of records.
pub struct Collection<T> {
    path: PathBuf,
    key: &'static str,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> Collection<T> {
    fn new(dir: &Path, file_name: &str, key: &'static str) -> Self {
        Self {
            path: dir.join(file_name),
            key,
            lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    /// Load every record in the collection.
    pub async fn load(&self) -> Vec<T> {
        let _guard = self.lock.lock().await;
        self.read_items().await
    }

    /// Append one record and persist the whole collection.
    pub async fn append(&self, item: T) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut items = self.read_items().await;
        items.push(item);
        self.write_items(&items).await
    }

    /// Run a read-modify-write cycle under the collection lock.
    pub async fn update<R>(&self, apply: impl FnOnce(&mut Vec<T>) -> R) -> Result<R> {
        let _guard = self.lock.lock().await;
        let mut items = self.read_items().await;
        let outcome = apply(&mut items);
        self.write_items(&items).await?;
        Ok(outcome)
    }

    async fn read_items(&self) -> Vec<T> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            // First run: the file does not exist yet.
            Err(_) => return Vec::new(),
        };

        let doc: Value = match serde_json::from_str(&raw) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "collection file is not valid JSON, treating as empty"
                );
                return Vec::new();
            }
        };

        match doc.get(self.key) {
            Some(items) => serde_json::from_value(items.clone()).unwrap_or_else(|err| {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "collection entries have an unexpected shape, treating as empty"
                );
                Vec::new()
            }),
            None => Vec::new(),
        }
    }

    async fn write_items(&self, items: &[T]) -> Result<()> {
        let mut doc = serde_json::Map::new();
        doc.insert(self.key.to_string(), serde_json::to_value(items)?);
        let body = serde_json::to_string_pretty(&Value::Object(doc))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        tokio::fs::write(&self.path, body)
            .await
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

/// Typed access to every collection plus the generated-media directories.
pub struct Storage {
    pub users: Collection<User>,
    pub events: Collection<Event>,
    pub tickets: Collection<PurchaseRecord>,
    pub news: Collection<NewsPost>,
    data_dir: PathBuf,
}

impl Storage {
    /// Open (or lazily create) the collections under `data_dir`.
    pub fn open(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            users: Collection::new(&data_dir, "users.json", "users"),
            events: Collection::new(&data_dir, "events.json", "events"),
            tickets: Collection::new(&data_dir, "tickets.json", "tickets"),
            news: Collection::new(&data_dir, "news.json", "news"),
            data_dir,
        }
    }

    /// Directory ticket QR images are written to.
    pub fn tickets_dir(&self) -> PathBuf {
        self.data_dir.join("tickets")
    }

    /// Directory event posters are written to.
    pub fn event_images_dir(&self) -> PathBuf {
        self.data_dir.join("event_images")
    }

    /// Directory news images are written to.
    pub fn news_images_dir(&self) -> PathBuf {
        self.data_dir.join("news_images")
    }

    pub async fn find_user(&self, user_id: i64) -> Option<User> {
        self.users.load().await.into_iter().find(|u| u.id == user_id)
    }

    /// Look up a user by Telegram username, without the leading `@`.
    pub async fn find_user_by_username(&self, username: &str) -> Option<User> {
        self.users
            .load()
            .await
            .into_iter()
            .find(|u| u.username.as_deref() == Some(username))
    }

    pub async fn find_user_by_credentials(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Option<User> {
        self.users
            .load()
            .await
            .into_iter()
            .find(|u| u.email == email && u.password == password_hash)
    }

    pub async fn is_registered(&self, user_id: i64) -> bool {
        self.find_user(user_id).await.is_some()
    }

    pub async fn email_taken(&self, email: &str) -> bool {
        self.users.load().await.iter().any(|u| u.email == email)
    }

    pub async fn is_admin(&self, user_id: i64) -> bool {
        self.find_user(user_id).await.map(|u| u.is_admin).unwrap_or(false)
    }

    pub async fn add_user(&self, user: User) -> Result<()> {
        self.users.append(user).await
    }

    /// Apply a mutation to one user. Returns whether the user existed.
    pub async fn update_user(
        &self,
        user_id: i64,
        apply: impl FnOnce(&mut User),
    ) -> Result<bool> {
        self.users
            .update(|users| match users.iter_mut().find(|u| u.id == user_id) {
                Some(user) => {
                    apply(user);
                    true
                }
                None => false,
            })
            .await
    }

    /// Flip the notifications flag, returning the new value if the user exists.
    pub async fn toggle_notifications(&self, user_id: i64) -> Result<Option<bool>> {
        self.users
            .update(|users| {
                users.iter_mut().find(|u| u.id == user_id).map(|user| {
                    user.notifications = !user.notifications;
                    user.notifications
                })
            })
            .await
    }

    pub async fn add_event(&self, event: Event) -> Result<()> {
        self.events.append(event).await
    }

    pub async fn find_event(&self, event_id: &str) -> Option<Event> {
        self.events.load().await.into_iter().find(|e| e.id == event_id)
    }

    /// Events happening today or later, soonest first.
    pub async fn upcoming_events(&self, today: NaiveDate) -> Vec<Event> {
        let mut events: Vec<Event> = self
            .events
            .load()
            .await
            .into_iter()
            .filter(|e| e.is_upcoming(today))
            .collect();
        events.sort_by_key(|e| e.date);
        events
    }

    pub async fn add_purchase(&self, record: PurchaseRecord) -> Result<()> {
        self.tickets.append(record).await
    }

    pub async fn purchases_for_user(&self, user_id: i64) -> Vec<PurchaseRecord> {
        self.tickets
            .load()
            .await
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .collect()
    }

    pub async fn add_news(&self, post: NewsPost) -> Result<()> {
        self.news.append(post).await
    }

    /// All news posts, newest first.
    pub async fn latest_news(&self) -> Vec<NewsPost> {
        let mut posts = self.news.load().await;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }
}
