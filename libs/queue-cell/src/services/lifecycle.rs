use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::QueueError;
use crate::models::{QueueEntry, QueueStatus};

/// Checks `current -> target` against the queue transition table.
pub fn validate_status_transition(current: QueueStatus, target: QueueStatus) -> Result<(), QueueError> {
    if current.can_transition_to(target) {
        debug!("Queue status transition validated: {} -> {}", current, target);
        return Ok(());
    }

    warn!("Invalid queue status transition attempted: {} -> {}", current, target);
    Err(QueueError::InvalidStatusTransition {
        from: current,
        to: target,
    })
}

/// Moves `entry` to `target`, stamping `called_at` / `completed_at` with
/// `now` on the way in. Returns `false` when the entry already had that
/// status, in which case nothing is touched.
pub fn apply_status(entry: &mut QueueEntry, target: QueueStatus, now: DateTime<Utc>) -> Result<bool, QueueError> {
    if entry.status == target {
        return Ok(false);
    }

    validate_status_transition(entry.status, target)?;

    match target {
        QueueStatus::WithDoctor => entry.called_at = Some(now),
        QueueStatus::Completed => entry.completed_at = Some(now),
        QueueStatus::Waiting | QueueStatus::Cancelled => {}
    }
    entry.status = target;
    entry.updated_at = now;

    Ok(true)
}
