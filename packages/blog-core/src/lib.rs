//! Core storage engine for the blog service.
//!
//! Provides the post and category data model, the in-memory relational
//! store with its post/category link table, slug derivation, fixture
//! seeding, and snapshot persistence.

pub mod config;
pub mod database;
pub mod error;
pub mod fixtures;
pub mod persistence;
pub mod slug;
pub mod table;

pub use database::Database;
pub use error::{BlogError, ResourceKind};
