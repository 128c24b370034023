//! # duochat-store
//!
//! Backing-service contracts for the duochat sync core, plus a local
//! implementation of each of them.
//!
//! The [`DocumentStore`], [`ProfileSource`] and [`FileStore`] traits are what
//! the core consumes. [`LocalStore`] implements the first two on top of a
//! SQLite [`Database`] with in-process live queries, and [`LocalFileStore`]
//! keeps uploaded images on disk.

pub mod chats;
pub mod database;
pub mod document;
pub mod files;
pub mod local;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod query;
pub mod subscription;
pub mod users;

mod error;

pub use database::{default_db_path, Database, DIRECTORY_INDEX};
pub use document::{DocumentStore, FileStore, ProfileSource};
pub use error::{Result, StoreError};
pub use files::LocalFileStore;
pub use local::LocalStore;
pub use models::*;
pub use query::*;
pub use subscription::{Snapshot, SnapshotSender, Subscription};
