//! # Event Commands
//!
//! Every order and refund is booked against the active event. Switching
//! events starts a new sales session; existing rows keep their event.

use stand_core::Event;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub async fn active(state: &AppState) -> AppResult<Event> {
    Ok(state.db.events().active_event().await?)
}

/// Activates `name`, creating the event when it does not exist yet.
pub async fn activate(state: &AppState, name: &str) -> AppResult<Event> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Event name must not be empty"));
    }

    let event = state.db.events().activate(name).await?;
    info!(event_id = event.id, name = %event.name, "Event switched");
    Ok(event)
}
