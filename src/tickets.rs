//! Ticket issuance: code generation, QR rendering, delivery and persistence.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use image::Luma;
use qrcode::QrCode;
use std::path::{Path, PathBuf};
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId};
use tracing::info;

use crate::models::PurchaseRecord;
use crate::storage::Storage;

/// Build the unique codes for one purchase.
///
/// A code embeds the buyer, the event id, the position in the batch and the
/// issuance timestamp in microseconds, so two purchases of the same event
/// never collide and the code doubles as a QR file name.
pub fn generate_codes(
    user_id: i64,
    event_id: &str,
    qty: u32,
    issued_at: DateTime<Utc>,
) -> Vec<String> {
    let stamp = issued_at.timestamp_micros();
    (1..=qty)
        .map(|index| format!("{user_id}_{event_id}_{index}_{stamp}"))
        .collect()
}

/// Render a ticket code as a QR PNG under `dir` and return the file path.
pub fn render_qr(code: &str, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let qr = QrCode::new(code.as_bytes()).context("encoding ticket code as QR")?;
    let png = qr.render::<Luma<u8>>().build();

    let path = dir.join(format!("{code}.png"));
    png.save(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// Render a whole batch of codes. The PNG encode and the file writes block,
/// so the batch runs on the blocking pool instead of a runtime worker.
pub async fn render_qr_batch(codes: Vec<String>, dir: PathBuf) -> Result<Vec<PathBuf>> {
    tokio::task::spawn_blocking(move || {
        codes
            .iter()
            .map(|code| render_qr(code, &dir))
            .collect::<Result<Vec<_>>>()
    })
    .await
    .context("QR render task failed")?
}

/// One finalized purchase: the persisted record plus the photo messages the
/// QR codes were delivered in, so a caller can track them in the chat's
/// screen if it owns one.
pub struct IssuedBatch {
    pub record: PurchaseRecord,
    pub photo_messages: Vec<MessageId>,
}

/// Issue one paid-for batch: generate the codes, render and deliver one QR
/// photo per ticket to the buyer's chat, persist the purchase and bump the
/// buyer's ticket counter. Self-service purchases and admin confirmations
/// both go through here.
pub async fn issue_purchase(
    bot: &Bot,
    storage: &Storage,
    user_id: i64,
    event_id: &str,
    event_title: &str,
    qty: u32,
    total: u64,
) -> Result<IssuedBatch> {
    let issued_at = Utc::now();
    let codes = generate_codes(user_id, event_id, qty, issued_at);
    let paths = render_qr_batch(codes.clone(), storage.tickets_dir()).await?;

    let mut photo_messages = Vec::with_capacity(paths.len());
    for (index, path) in paths.into_iter().enumerate() {
        let sent = bot
            .send_photo(ChatId(user_id), InputFile::file(path))
            .caption(format!("🎫 Ticket #{}", index + 1))
            .await?;
        photo_messages.push(sent.id);
    }

    let record = PurchaseRecord {
        user_id,
        event_id: event_id.to_string(),
        event_title: event_title.to_string(),
        qty,
        total,
        codes,
        purchased_at: issued_at,
    };
    storage.add_purchase(record.clone()).await?;
    storage
        .update_user(user_id, |user| user.tickets_bought += qty)
        .await?;

    info!(user_id, event_id, qty, total, "tickets issued");
    Ok(IssuedBatch {
        record,
        photo_messages,
    })
}
