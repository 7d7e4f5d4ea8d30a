//! Multi-step conversation flows, one module per form.

pub mod events;
pub mod login;
pub mod news;
pub mod profile;
pub mod purchase;
pub mod registration;
