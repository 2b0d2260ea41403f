//! Core domain + application logic for heartbot.
//!
//! This crate is intentionally framework-agnostic. The Twitter HTTP API and the
//! SQLite data store live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod ports;
pub mod poster;
pub mod tokenizer;

pub use errors::{Error, Result};
