//! Key/value cache with per-key TTL.
//!
//! The pipeline only stores strings; typed values are JSON-encoded by the caller.

mod memory;
mod redis;

use std::time::Duration;

use async_trait::async_trait;

use crate::constants::{FEED_CACHE_VERSION, SUBJECT_CACHE_VERSION};
use crate::error::CalendarResult;

pub use memory::MemoryCache;
pub use redis::{RedisCache, RedisSettings};

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> CalendarResult<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CalendarResult<()>;
}

pub fn subject_key(subject_id: u64) -> String {
    format!("subject-{SUBJECT_CACHE_VERSION}-{subject_id}")
}

pub fn feed_key(username: &str) -> String {
    format!("episode-calendar-{FEED_CACHE_VERSION}-{username}")
}
