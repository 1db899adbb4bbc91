//! # chatlink-store
//!
//! Persistent storage for server setup entries, chat networks and
//! front-end settings, backed by SQLite.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every stored
//! record.

pub mod chatnets;
pub mod database;
pub mod migrations;
pub mod models;
pub mod servers;
pub mod settings;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
