//! Seating Table Model

use serde::{Deserialize, Serialize};

use crate::ids::{FingerprintBuilder, LocalId, RemoteId};

/// Seating group for an event
///
/// A person may appear in at most one table per event, as responsible or as a
/// member. The authority enforces the invariant globally; locally it is only
/// queried through the reconciler's seating index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: i64,
    pub event_id: LocalId,
    pub responsible: RemoteId,
    /// Ordered member list, authority numbering
    pub members: Vec<RemoteId>,
}

impl Table {
    /// Whether the person sits at this table, as responsible or member
    pub fn seats(&self, person: RemoteId) -> bool {
        self.responsible == person || self.members.contains(&person)
    }

    pub(crate) fn feed(&self, mut builder: FingerprintBuilder) -> FingerprintBuilder {
        builder = builder
            .int(self.id)
            .int(self.responsible.0)
            .int(self.members.len() as i64);
        for member in &self.members {
            builder = builder.int(member.0);
        }
        builder
    }
}
