//! # photoshare-store
//!
//! Document storage for photoshare, backed by SQLite.
//!
//! Each user, photo and activity is one row. Collections nested inside a
//! record (favorites, comments, the mention index, the visibility allow-list,
//! likes) are kept as JSON inside that row, so a record is always read and
//! written as a whole. The crate exposes a synchronous [`Database`] handle
//! with typed CRUD helpers per collection.

pub mod accounts;
pub mod activities;
pub mod database;
pub mod migrations;
pub mod models;
pub mod photos;
pub mod users;

mod codec;
mod error;

pub use accounts::AccountDeletion;
pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
