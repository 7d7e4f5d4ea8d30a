//! # LumaMap Telegram Bot
//!
//! A conversational ticketing bot for city events: users register and log in,
//! browse upcoming events with a price filter, buy tickets (paid externally
//! via WhatsApp or completed directly) and receive QR-coded tickets, while
//! administrators publish events and news and confirm pending payments.

pub mod bot;
pub mod config;
pub mod dialogue;
pub mod models;
pub mod pending;
pub mod session;
pub mod storage;
pub mod tickets;
pub mod validation;
