//! Shared test utilities
//!
//! A hub with recording service handlers, an in-memory Music Assistant
//! client and payload fixtures.

#![allow(dead_code)]

mod fake_client;
mod fixtures;
mod test_hub;

pub use fake_client::*;
pub use fixtures::*;
pub use test_hub::*;
