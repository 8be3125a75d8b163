//! Event Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{Fingerprint, FingerprintBuilder, Fingerprinted, LocalId, RemoteId};
use crate::models::{AttendanceRecord, Menu, ModelError, Table};

/// What an event kind supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Table,
    Payment,
    Menu,
    Reservation,
}

/// Event kind, mapped from the authority's numeric category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Generic,
    Meal,
    Gathering,
}

impl EventKind {
    /// Map the authority's category number; unrecognised values fall back to
    /// `Generic`, matching the authority's own behavior for retired kinds
    pub fn from_category(category: i64) -> EventKind {
        match category {
            1 => EventKind::Meal,
            2 => EventKind::Gathering,
            _ => EventKind::Generic,
        }
    }

    pub fn category(&self) -> i64 {
        match self {
            EventKind::Generic => 0,
            EventKind::Meal => 1,
            EventKind::Gathering => 2,
        }
    }

    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            EventKind::Generic => &[],
            EventKind::Meal => &[Capability::Table, Capability::Payment, Capability::Menu],
            EventKind::Gathering => &[Capability::Reservation],
        }
    }
}

/// Scheduled happening, with its embedded tables and attendance roll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: LocalId,
    pub name: String,
    pub date: DateTime<Utc>,
    pub contact: Option<String>,
    pub description: Option<String>,
    pub menu: Option<Menu>,
    pub kind: EventKind,
    pub tables: Vec<Table>,
    /// People attending without a table, authority numbering
    pub attending: Vec<RemoteId>,
}

impl Event {
    /// Build an event, rejecting a menu-capable kind without a menu
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: LocalId,
        name: String,
        date: DateTime<Utc>,
        contact: Option<String>,
        description: Option<String>,
        menu: Option<Menu>,
        kind: EventKind,
        tables: Vec<Table>,
        attending: Vec<RemoteId>,
    ) -> Result<Self, ModelError> {
        if kind.capabilities().contains(&Capability::Menu) && menu.is_none() {
            return Err(ModelError::MissingMenu(name));
        }
        Ok(Self {
            id,
            name,
            date,
            contact,
            description,
            menu,
            kind,
            tables,
            attending,
        })
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.kind.capabilities().contains(&capability)
    }

    /// The table-less attendance roll as individual records
    pub fn attendance_roll(&self) -> Vec<AttendanceRecord> {
        self.attending
            .iter()
            .map(|person| AttendanceRecord {
                event_id: self.id,
                person: *person,
            })
            .collect()
    }

    /// Whether the person confirmed attendance without a table
    pub fn is_attending(&self, person: RemoteId) -> bool {
        self.attending.contains(&person)
    }
}

impl Fingerprinted for Event {
    fn fingerprint(&self) -> Fingerprint {
        let mut builder = FingerprintBuilder::new()
            .int(self.id.0)
            .field(&self.name)
            .int(self.date.timestamp_millis())
            .opt(self.contact.as_deref())
            .opt(self.description.as_deref())
            .int(self.kind.category());
        builder = match &self.menu {
            Some(menu) => menu.feed(builder.flag(true)),
            None => builder.flag(false),
        };
        builder = builder.int(self.tables.len() as i64);
        for table in &self.tables {
            builder = table.feed(builder);
        }
        builder = builder.int(self.attending.len() as i64);
        for person in &self.attending {
            builder = builder.int(person.0);
        }
        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    use crate::models::Grade;

    fn date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 4, 22, 14, 0, 0).unwrap()
    }

    fn menu() -> Menu {
        Menu {
            price: BTreeMap::from([(Grade::Unknown, 20.0)]),
            starters: vec![],
            firsts: vec!["paella".into()],
            seconds: vec![],
            desserts: vec![],
            drink_included: true,
            coffee_included: true,
        }
    }

    fn meal(tables: Vec<Table>) -> Event {
        Event::new(
            LocalId(5),
            "Dinar de Festes".into(),
            date(),
            None,
            None,
            Some(menu()),
            EventKind::Meal,
            tables,
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn meal_without_menu_is_rejected() {
        let err = Event::new(
            LocalId(5),
            "Dinar".into(),
            date(),
            None,
            None,
            None,
            EventKind::Meal,
            vec![],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::MissingMenu(_)));
    }

    #[test]
    fn generic_event_needs_no_menu() {
        let event = Event::new(
            LocalId(1),
            "Assemblea".into(),
            date(),
            None,
            None,
            None,
            EventKind::Generic,
            vec![],
            vec![],
        )
        .unwrap();
        assert!(!event.has_capability(Capability::Menu));
    }

    #[test]
    fn unknown_category_maps_to_generic() {
        assert_eq!(EventKind::from_category(99), EventKind::Generic);
    }

    #[test]
    fn fingerprint_separates_table_members_from_attendance() {
        let table = |members: Vec<RemoteId>| Table {
            id: 1,
            event_id: LocalId(5),
            responsible: RemoteId(3),
            members,
        };

        // Person 2 attending without a table vs seated at the last table
        let mut a = meal(vec![table(vec![RemoteId(1)])]);
        a.attending = vec![RemoteId(2)];
        let b = meal(vec![table(vec![RemoteId(1), RemoteId(2)])]);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn attendance_roll_expands_the_roster() {
        let mut event = meal(vec![]);
        event.attending = vec![RemoteId(3), RemoteId(9)];
        assert!(event.is_attending(RemoteId(9)));
        assert!(!event.is_attending(RemoteId(4)));
        assert_eq!(
            event.attendance_roll(),
            vec![
                AttendanceRecord {
                    event_id: LocalId(5),
                    person: RemoteId(3)
                },
                AttendanceRecord {
                    event_id: LocalId(5),
                    person: RemoteId(9)
                },
            ]
        );
    }

    #[test]
    fn fingerprint_is_stable_and_sensitive() {
        let a = meal(vec![]);
        assert_eq!(a.fingerprint(), meal(vec![]).fingerprint());

        let table = Table {
            id: 1,
            event_id: LocalId(5),
            responsible: RemoteId(3),
            members: vec![],
        };
        assert_ne!(a.fingerprint(), meal(vec![table]).fingerprint());

        let mut renamed = meal(vec![]);
        renamed.name = "Sopar de Festes".into();
        assert_ne!(a.fingerprint(), renamed.fingerprint());
    }
}
