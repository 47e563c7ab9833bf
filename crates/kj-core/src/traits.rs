//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::Category;

/// String key-value persistence, the shape of browser local storage.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> anyhow::Result<()>;
    /// Writes every entry or none of them.
    async fn set_many(&self, entries: Vec<(String, String)>) -> anyhow::Result<()>;
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}

/// Produces a discussion prompt for a category.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, category: Category) -> anyhow::Result<String>;
}

/// Source of "now" for id allocation, timestamps and ranking.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
