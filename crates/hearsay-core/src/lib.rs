//! # hearsay-core
//!
//! Core types, traits, configuration, and error handling for the hearsay bot.

pub mod config;
pub mod error;
pub mod line;
pub mod message;
pub mod traits;
