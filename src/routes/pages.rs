//! Static HTML pages

use axum::{Router, response::Html, routing::get};

use crate::state::AppState;

pub static HOME_HTML: &str = include_str!("../../assets/home.html");
pub static CALENDAR_HTML: &str = include_str!("../../assets/episode-calendar.html");

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(home))
}

/// GET / - Landing page
async fn home() -> Html<&'static str> {
    Html(HOME_HTML)
}
