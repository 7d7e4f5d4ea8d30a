//! Runtime configuration read from the environment.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// WhatsApp number used when SUPPORT_PHONE is not set.
const DEFAULT_SUPPORT_PHONE: &str = "77059821077";

/// Bot configuration resolved once at startup.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token.
    pub token: String,
    /// Directory holding the JSON collections and generated media.
    pub data_dir: PathBuf,
    /// WhatsApp number for support questions and payment hand-off,
    /// digits only (no `+`), as wa.me links expect.
    pub support_phone: String,
}

impl BotConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let token =
            env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        let support_phone = env::var("SUPPORT_PHONE")
            .unwrap_or_else(|_| DEFAULT_SUPPORT_PHONE.to_string());

        Ok(Self {
            token,
            data_dir,
            support_phone,
        })
    }

    /// WhatsApp chat link for the support contact.
    pub fn support_link(&self) -> String {
        format!("https://wa.me/{}", self.support_phone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_support_link_uses_the_configured_number() {
        let config = BotConfig {
            token: "token".to_string(),
            data_dir: PathBuf::from("."),
            support_phone: "77001112233".to_string(),
        };
        assert_eq!(config.support_link(), "https://wa.me/77001112233");
    }
}
