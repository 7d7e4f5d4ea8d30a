use anyhow::Result;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lumamap::bot::{callback_handler, message_handler};
use lumamap::config::BotConfig;
use lumamap::dialogue::State;
use lumamap::pending::PendingLedger;
use lumamap::session::Sessions;
use lumamap::storage::Storage;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    info!("Starting LumaMap Telegram bot");

    let config = Arc::new(BotConfig::from_env()?);
    let storage = Arc::new(Storage::open(&config.data_dir));
    let sessions = Sessions::new();
    let pending = PendingLedger::new();

    let bot = Bot::new(config.token.clone());

    info!(data_dir = %config.data_dir.display(), "Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .enter_dialogue::<Message, InMemStorage<State>, State>()
                .endpoint(message_handler),
        )
        .branch(
            Update::filter_callback_query()
                .enter_dialogue::<CallbackQuery, InMemStorage<State>, State>()
                .endpoint(callback_handler),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![
            InMemStorage::<State>::new(),
            config,
            storage,
            sessions,
            pending
        ])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
