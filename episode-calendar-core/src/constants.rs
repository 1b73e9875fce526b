//! Tunables shared by the pipeline.
//!
//! Bump a cache version whenever the shape or computation of the value stored
//! under that key changes; old entries then expire on their own.

use std::time::Duration;

const DAY: u64 = 24 * 60 * 60;

/// Version segment of per-subject cache keys.
pub const SUBJECT_CACHE_VERSION: &str = "v3";

/// Version segment of rendered feed cache keys.
pub const FEED_CACHE_VERSION: &str = "v5.0";

pub const COLLECTION_PAGE_SIZE: u32 = 50;
pub const EPISODE_PAGE_SIZE: u32 = 200;

/// Subjects with more parsed episodes than this never get the long TTL.
pub const LONG_TTL_MAX_EPISODES: usize = 200;

pub const NOT_FOUND_SUBJECT_TTL: Duration = Duration::from_secs(DAY);
pub const SUBJECT_LONG_TTL: Duration = Duration::from_secs(7 * DAY);
pub const SUBJECT_SHORT_TTL: Duration = Duration::from_secs(3 * DAY);
pub const FEED_CACHE_TTL: Duration = Duration::from_secs(23 * 60 * 60);

/// Episodes airing further out than this are left out of the feed.
pub const LOOKAHEAD_DAYS: i64 = 30;

/// Episodes that aired up to this many days ago still count as upcoming.
pub const DEFAULT_FUTURE_GRACE_DAYS: i64 = 0;

/// Largest grace window accepted from configuration.
pub const MAX_FUTURE_GRACE_DAYS: i64 = 365;

pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Collection statuses scanned for a user: wish (1) and doing (3).
pub const FEED_COLLECTION_TYPES: [u8; 2] = [1, 3];

pub const CALENDAR_NAME: &str = "Bangumi Episode Air Calendar";
pub const PRODUCT_ID: &str = "-//episode-calendar//bangumi-icalendar//CN";

/// Refresh hint advertised to subscribing calendar clients.
pub const PUBLISHED_TTL: &str = "PT8H";

pub const EPISODE_URL_BASE: &str = "https://bgm.tv/ep";
