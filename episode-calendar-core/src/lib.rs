//! Core of the Bangumi episode calendar.
//!
//! Fetches a user's collection from the Bangumi API, resolves upcoming episode
//! air dates per subject (through a TTL cache), and renders an ICS feed:
//! - `bangumi`: API client and pagination
//! - `cache`: cache trait with in-memory and Redis backends
//! - `episode` / `subject`: date parsing, resolution and cache lifetimes
//! - `ics`: feed generation
//! - `service`: the pipeline tying it together

pub mod bangumi;
pub mod cache;
pub mod constants;
pub mod episode;
pub mod error;
pub mod ics;
pub mod service;
pub mod subject;

pub use error::{CalendarError, CalendarResult};
pub use service::{CalendarService, ServiceOptions};
pub use subject::SlimSubject;
