//! # hearsay-channels
//!
//! Chat-network sessions for hearsay.

pub mod irc;
