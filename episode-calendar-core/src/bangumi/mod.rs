//! Access to the Bangumi tracker API.

mod client;
mod types;

pub use client::{ApiResponse, Client, DEFAULT_BASE_URL};
pub use types::{Episode, Paged, Subject, SubjectType, UserCollection};
