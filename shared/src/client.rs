//! Wire-level types shared between the gateway and the authority
//!
//! Every response body from the authority is a JSON object with a boolean
//! `success` field and, for data calls, a `data` field. Remote records use the
//! authority's zero-based numbering; conversion into cache entities goes
//! through [`crate::ids`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{LocalId, RemoteId};
use crate::models::{Event, EventKind, Grade, Menu, ModelError, Person, Table};

// =============================================================================
// Response envelope
// =============================================================================

/// The authority's response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }

    pub fn ok_empty() -> Self {
        Self {
            success: true,
            data: None,
        }
    }

    pub fn failure() -> Self {
        Self {
            success: false,
            data: None,
        }
    }
}

// =============================================================================
// Auth API DTOs
// =============================================================================

/// Login request, `POST /v1/user/auth`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub nif: String,
    pub password: String,
}

/// Login response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginData {
    pub token: String,
}

// =============================================================================
// Data API DTOs
// =============================================================================

/// Person record as the authority serves it, `GET /v1/user/data`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePerson {
    pub id: RemoteId,
    pub name: String,
    pub family_name: String,
    pub nif: String,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub mobile_phone: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl From<RemotePerson> for Person {
    fn from(remote: RemotePerson) -> Self {
        Person {
            id: LocalId::from(remote.id),
            name: remote.name,
            family_name: remote.family_name,
            nif: remote.nif,
            grade: Grade::parse(remote.grade.as_deref()),
            email: remote.email,
            phone: remote.phone,
            mobile_phone: remote.mobile_phone,
            permissions: remote.permissions,
        }
    }
}

/// Seating table embedded in an event record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteTable {
    pub id: i64,
    pub responsible: RemoteId,
    pub members: Vec<RemoteId>,
}

/// Event record as the authority serves it, `GET /v1/events/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEvent {
    pub id: RemoteId,
    pub display_name: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub menu: Option<Menu>,
    #[serde(default)]
    pub attending: Vec<RemoteId>,
    #[serde(default)]
    pub tables: Vec<RemoteTable>,
    pub category: i64,
}

impl TryFrom<RemoteEvent> for Event {
    type Error = ModelError;

    fn try_from(remote: RemoteEvent) -> Result<Self, Self::Error> {
        let event_id = LocalId::from(remote.id);
        let tables = remote
            .tables
            .into_iter()
            .map(|t| Table {
                id: t.id,
                event_id,
                responsible: t.responsible,
                members: t.members,
            })
            .collect();
        Event::new(
            event_id,
            remote.display_name,
            remote.date,
            remote.contact,
            remote.description,
            remote.menu,
            EventKind::from_category(remote.category),
            tables,
            remote.attending,
        )
    }
}

/// Join request, `POST /v1/events/{id}/join`
///
/// No `table_id` creates a new table with the caller as responsible; `assists`
/// sets or clears the attendance flag for table-less events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoinRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assists: Option<bool>,
}
