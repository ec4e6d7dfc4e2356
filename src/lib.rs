//! Watchlist - team and watch-list document API
//!
//! Stateless HTTP endpoints over a small document store:
//! - `Teams` documents holding a `members` map
//! - Per-team `Lists` documents holding a timestamp and schedule data
//! - Local filesystem, S3 or in-memory object storage underneath
//! - Atomic, journaled multi-document writes for team renames

pub mod api;
pub mod config;
pub mod error;
pub mod repository;
pub mod storage;
pub mod store;
pub mod types;

pub use error::{Error, Result};
