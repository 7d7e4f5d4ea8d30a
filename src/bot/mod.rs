//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `message_handler`: Routes incoming text and photo messages
//! - `callback_handler`: Routes inline keyboard callback queries
//! - `commands`: The /start, /cancel and /confirm slash commands
//! - `flows`: Multi-step conversations (registration, login, purchase, ...)
//! - `menu`: One-shot screens reachable from the main menu
//! - `ui_builder`: Creates keyboards and formats messages

pub mod callback_handler;
pub mod commands;
pub mod flows;
pub mod menu;
pub mod message_handler;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;
