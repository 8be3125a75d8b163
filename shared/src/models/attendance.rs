//! Attendance Model

use serde::{Deserialize, Serialize};

use crate::ids::{LocalId, RemoteId};

/// Confirmed assistance to an event that does not require a table
///
/// Confirming twice is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub event_id: LocalId,
    pub person: RemoteId,
}
