use std::sync::Arc;

use episode_calendar_core::CalendarService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CalendarService>,
}

impl AppState {
    pub fn new(service: CalendarService) -> Self {
        AppState {
            service: Arc::new(service),
        }
    }
}
