//! Local cache
//!
//! The engine treats persistence abstractly: an ordered key-indexed store per
//! entity kind with CRUD, list-all, and live-query subscriptions. Upserts and
//! deletes are atomic in isolation; a whole patch is not, so a storage fault
//! aborts the in-flight pass and leaves already-applied mutations in place.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{watch, RwLock};

use shared::ids::LocalId;
use shared::models::{Event, Person};

/// Storage fault
#[derive(Debug, Error)]
#[error("storage fault: {0}")]
pub struct StoreError(pub String);

/// Contract of the local cache
///
/// May be invoked concurrently from multiple account sync passes; the
/// reconciler is the only writer for entity data.
#[async_trait]
pub trait LocalCache: Send + Sync {
    /// Snapshot of all cached people, ordered by id
    async fn people(&self) -> Result<Vec<Person>, StoreError>;

    async fn person(&self, id: LocalId) -> Result<Option<Person>, StoreError>;

    /// Insert if absent, overwrite if present; never partially applies
    async fn upsert_person(&self, person: Person) -> Result<(), StoreError>;

    async fn delete_person(&self, id: LocalId) -> Result<(), StoreError>;

    /// Snapshot of all cached events, ordered by id
    async fn events(&self) -> Result<Vec<Event>, StoreError>;

    async fn event(&self, id: LocalId) -> Result<Option<Event>, StoreError>;

    async fn upsert_event(&self, event: Event) -> Result<(), StoreError>;

    async fn delete_event(&self, id: LocalId) -> Result<(), StoreError>;

    /// Live query over the people store, updated after every committed
    /// mutation
    fn subscribe_people(&self) -> watch::Receiver<Vec<Person>>;

    /// Live query over the events store
    fn subscribe_events(&self) -> watch::Receiver<Vec<Event>>;

    /// Last successful reconciliation time for the account
    async fn watermark(&self, account: &str) -> Result<Option<DateTime<Utc>>, StoreError>;

    async fn set_watermark(&self, account: &str, at: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Ordered in-memory cache, the default backing store
pub struct MemoryCache {
    people: RwLock<BTreeMap<LocalId, Person>>,
    events: RwLock<BTreeMap<LocalId, Event>>,
    watermarks: RwLock<HashMap<String, DateTime<Utc>>>,
    people_tx: watch::Sender<Vec<Person>>,
    events_tx: watch::Sender<Vec<Event>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            people: RwLock::new(BTreeMap::new()),
            events: RwLock::new(BTreeMap::new()),
            watermarks: RwLock::new(HashMap::new()),
            people_tx: watch::channel(Vec::new()).0,
            events_tx: watch::channel(Vec::new()).0,
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocalCache for MemoryCache {
    async fn people(&self) -> Result<Vec<Person>, StoreError> {
        Ok(self.people.read().await.values().cloned().collect())
    }

    async fn person(&self, id: LocalId) -> Result<Option<Person>, StoreError> {
        Ok(self.people.read().await.get(&id).cloned())
    }

    async fn upsert_person(&self, person: Person) -> Result<(), StoreError> {
        let mut people = self.people.write().await;
        people.insert(person.id, person);
        self.people_tx.send_replace(people.values().cloned().collect());
        Ok(())
    }

    async fn delete_person(&self, id: LocalId) -> Result<(), StoreError> {
        let mut people = self.people.write().await;
        if people.remove(&id).is_some() {
            self.people_tx.send_replace(people.values().cloned().collect());
        }
        Ok(())
    }

    async fn events(&self) -> Result<Vec<Event>, StoreError> {
        Ok(self.events.read().await.values().cloned().collect())
    }

    async fn event(&self, id: LocalId) -> Result<Option<Event>, StoreError> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn upsert_event(&self, event: Event) -> Result<(), StoreError> {
        let mut events = self.events.write().await;
        events.insert(event.id, event);
        self.events_tx.send_replace(events.values().cloned().collect());
        Ok(())
    }

    async fn delete_event(&self, id: LocalId) -> Result<(), StoreError> {
        let mut events = self.events.write().await;
        if events.remove(&id).is_some() {
            self.events_tx.send_replace(events.values().cloned().collect());
        }
        Ok(())
    }

    fn subscribe_people(&self) -> watch::Receiver<Vec<Person>> {
        self.people_tx.subscribe()
    }

    fn subscribe_events(&self) -> watch::Receiver<Vec<Event>> {
        self.events_tx.subscribe()
    }

    async fn watermark(&self, account: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.watermarks.read().await.get(account).copied())
    }

    async fn set_watermark(&self, account: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.watermarks.write().await.insert(account.to_string(), at);
        Ok(())
    }
}
