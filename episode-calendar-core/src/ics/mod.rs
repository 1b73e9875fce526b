//! ICS feed generation.
//!
//! Events are whole-day `VALUE=DATE` entries, so no timezone is attached.

mod generate;

pub use generate::{event_uid, generate_ics};
