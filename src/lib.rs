//! HTTP front end for the episode calendar.

pub mod config;
pub mod routes;
pub mod state;

pub use state::AppState;
