//! Reconciliation engine
//!
//! One pass per account: fetch the full remote snapshot, diff it against the
//! local cache by fingerprint, apply a minimal upsert/delete patch, and
//! advance the sync watermark. Passes for different accounts run
//! concurrently; passes for the same account are serialized, and a trigger
//! arriving while a pass is in flight adopts that pass's outcome instead of
//! starting another.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use casal_client::{ClientError, JoinRequest, RemoteEvent, RemotePerson};
use shared::ids::{Fingerprinted, LocalId, RemoteId};
use shared::models::{Event, Person, Table};

use crate::accounts::AccountBroker;
use crate::error::{EngineError, EngineResult};
use crate::remote::Authority;
use crate::store::LocalCache;

/// Reconciler tuning
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Bound on token renewal waits inside a pass
    pub token_timeout: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            token_timeout: Duration::from_secs(10),
        }
    }
}

/// Outcome of one successful pass
#[derive(Debug, Clone, Copy)]
pub struct PassReport {
    pub upserts: usize,
    pub deletes: usize,
    pub finished_at: DateTime<Utc>,
}

/// How a remote entity relates to its cached counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delta {
    New,
    Changed,
    Unchanged,
}

fn classify<T: Fingerprinted>(remote: &T, local: Option<&T>) -> Delta {
    match local {
        None => Delta::New,
        Some(existing) if existing.fingerprint() == remote.fingerprint() => Delta::Unchanged,
        Some(_) => Delta::Changed,
    }
}

/// Orchestrates sync passes and table/attendance mutations
pub struct Reconciler<A, C> {
    authority: Arc<A>,
    broker: Arc<AccountBroker<A>>,
    cache: Arc<C>,
    config: ReconcilerConfig,
    /// Per-account pass locks (mutual exclusion, never ordering)
    locks: DashMap<String, Arc<Mutex<()>>>,
    /// Completed-pass counter and last successful report, for coalescing
    completed: DashMap<String, (u64, Option<PassReport>)>,
    /// (event, person) -> table id, rebuilt during every applied patch
    seating: DashMap<(LocalId, RemoteId), i64>,
}

impl<A: Authority, C: LocalCache> Reconciler<A, C> {
    pub fn new(authority: Arc<A>, broker: Arc<AccountBroker<A>>, cache: Arc<C>) -> Self {
        Self::with_config(authority, broker, cache, ReconcilerConfig::default())
    }

    pub fn with_config(
        authority: Arc<A>,
        broker: Arc<AccountBroker<A>>,
        cache: Arc<C>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            authority,
            broker,
            cache,
            config,
            locks: DashMap::new(),
            completed: DashMap::new(),
            seating: DashMap::new(),
        }
    }

    /// Run (or coalesce into) a reconciliation pass for the account
    pub async fn sync(&self, account: &str) -> EngineResult<PassReport> {
        let lock = self
            .locks
            .entry(account.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let seq_before = self.completed.get(account).map(|e| e.0).unwrap_or(0);

        let _guard = lock.lock().await;

        // If a pass finished while we waited for the lock, this trigger
        // overlapped it: adopt its outcome. A failed pass is re-run, which is
        // the retry the caller would schedule anyway.
        if let Some(entry) = self.completed.get(account) {
            if entry.0 > seq_before {
                if let Some(report) = entry.1 {
                    tracing::debug!(account = %account, "coalesced into finished pass");
                    return Ok(report);
                }
            }
        }

        let outcome = self.run_pass(account).await;
        let seq = self.completed.get(account).map(|e| e.0).unwrap_or(0) + 1;
        self.completed
            .insert(account.to_string(), (seq, outcome.as_ref().ok().copied()));
        outcome
    }

    /// FETCH_REMOTE -> DIFF -> APPLY_PATCH -> ADVANCE_WATERMARK
    async fn run_pass(&self, account: &str) -> EngineResult<PassReport> {
        tracing::debug!(account = %account, "sync pass started");

        // FETCH_REMOTE. A failure here leaves cache and watermark untouched:
        // stale-but-valid local data beats no data.
        let token = self.broker.token(account, self.config.token_timeout).await?;
        let (remote_person, remote_events) = match self.fetch_snapshot(&token).await {
            Err(EngineError::Client(ClientError::Authorisation)) => {
                // Rejected-token signal: renew once, retry the fetch once
                self.broker.invalidate(account).await;
                let token = self.broker.token(account, self.config.token_timeout).await?;
                self.fetch_snapshot(&token).await?
            }
            other => other?,
        };

        let mut upserts = 0usize;
        let mut deletes = 0usize;

        // The account's own person record: upsert-only, other cached people
        // are owned by their own fetches.
        let person: Person = remote_person.into();
        if classify(&person, self.cache.person(person.id).await?.as_ref()) != Delta::Unchanged {
            self.cache.upsert_person(person).await?;
            upserts += 1;
        }

        // Records the authority serves in violation of a model invariant are
        // skipped, not fatal. They are still present in the snapshot, so their
        // cached copies must survive the delete sweep.
        let mut events: Vec<Event> = Vec::with_capacity(remote_events.len());
        let mut skipped: Vec<LocalId> = Vec::new();
        for remote in remote_events {
            let id = LocalId::from(remote.id);
            match Event::try_from(remote) {
                Ok(event) => events.push(event),
                Err(e) => {
                    tracing::warn!(event = %id, error = %e, "skipping invalid event record");
                    skipped.push(id);
                }
            }
        }

        // DIFF + APPLY_PATCH. Upserts before deletes, so an entity replaced
        // under a reused id is never transiently absent.
        let local = self.cache.events().await?;
        let local_by_id: BTreeMap<LocalId, &Event> = local.iter().map(|e| (e.id, e)).collect();
        for event in &events {
            if classify(event, local_by_id.get(&event.id).copied()) != Delta::Unchanged {
                self.cache.upsert_event(event.clone()).await?;
                upserts += 1;
            }
        }
        let mut remote_ids: HashSet<LocalId> = events.iter().map(|e| e.id).collect();
        remote_ids.extend(skipped);
        for event in &local {
            if !remote_ids.contains(&event.id) {
                self.cache.delete_event(event.id).await?;
                deletes += 1;
            }
        }

        self.rebuild_seating(&events);

        // ADVANCE_WATERMARK, only reached when the whole patch committed
        let finished_at = Utc::now();
        self.cache.set_watermark(account, finished_at).await?;

        tracing::debug!(account = %account, upserts, deletes, "sync pass finished");
        Ok(PassReport {
            upserts,
            deletes,
            finished_at,
        })
    }

    async fn fetch_snapshot(
        &self,
        token: &str,
    ) -> EngineResult<(RemotePerson, Vec<RemoteEvent>)> {
        let person = self.authority.person_data(token).await?;
        let events = self.authority.events_list(token).await?;
        Ok((person, events))
    }

    /// The full snapshot is authoritative: rebuild the whole index
    fn rebuild_seating(&self, events: &[Event]) {
        self.seating.clear();
        for event in events {
            for table in &event.tables {
                self.seating.insert((event.id, table.responsible), table.id);
                for member in &table.members {
                    self.seating.insert((event.id, *member), table.id);
                }
            }
        }
    }

    /// The table the person sits at for the event, if any
    pub fn table_for(&self, event: LocalId, person: RemoteId) -> Option<i64> {
        self.seating.get(&(event, person)).map(|entry| *entry)
    }

    // ========== Mutations ==========

    /// Create a table for the event with the caller as responsible, then
    /// re-sync so it appears locally
    pub async fn create_table(&self, account: &str, event: &Event) -> EngineResult<PassReport> {
        let token = self.broker.token(account, self.config.token_timeout).await?;
        self.authority
            .join_event(&token, RemoteId::from(event.id), &JoinRequest::default())
            .await?;
        self.sync(account).await
    }

    /// Join an existing table, then re-sync
    ///
    /// `AlreadySeated` and `TableNotFound` surface verbatim; no local
    /// mutation happens on failure.
    pub async fn join_table(&self, account: &str, table: &Table) -> EngineResult<PassReport> {
        let token = self.broker.token(account, self.config.token_timeout).await?;
        let request = JoinRequest {
            table_id: Some(table.id),
            assists: None,
        };
        self.authority
            .join_event(&token, RemoteId::from(table.event_id), &request)
            .await?;
        self.sync(account).await
    }

    /// Set or clear the attendance flag for a table-less event; idempotent
    pub async fn confirm_attendance(
        &self,
        account: &str,
        event: &Event,
        attending: bool,
    ) -> EngineResult<PassReport> {
        let token = self.broker.token(account, self.config.token_timeout).await?;
        let request = JoinRequest {
            table_id: None,
            assists: Some(attending),
        };
        self.authority
            .join_event(&token, RemoteId::from(event.id), &request)
            .await?;
        self.sync(account).await
    }

    /// Resolve a member's record from the cache, falling back to an
    /// authenticated fetch
    pub async fn person_summary(&self, account: &str, person: RemoteId) -> EngineResult<Person> {
        let id = LocalId::from(person);
        if let Some(cached) = self.cache.person(id).await? {
            return Ok(cached);
        }
        let token = self.broker.token(account, self.config.token_timeout).await?;
        let fetched: Person = self.authority.account_data(&token, person).await?.into();
        self.cache.upsert_person(fetched.clone()).await?;
        Ok(fetched)
    }
}
