//! Credential broker
//!
//! Owns the mapping from logical account (NIF) to cached bearer token. Tokens
//! are opaque: the broker never inspects them, it only reacts to the
//! rejected-token signal reported by callers. Sessions persist to a JSON file
//! so a restart keeps users logged in.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex, RwLock};

use crate::error::{EngineError, EngineResult};
use crate::remote::Authority;

/// Cached credential for one logical account
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AuthSession {
    /// Backing secret for silent re-authentication
    secret: String,
    token: String,
    /// Set when a caller reports the token rejected; never persisted
    #[serde(skip)]
    rejected: bool,
}

/// Session file layout: `{data_dir}/accounts.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionFile {
    sessions: BTreeMap<String, AuthSession>,
}

/// Issues, caches, and renews per-account bearer tokens
pub struct AccountBroker<A> {
    authority: Arc<A>,
    sessions: RwLock<BTreeMap<String, AuthSession>>,
    /// Per-account renewal locks so concurrent callers trigger exactly one
    /// re-authentication
    renewals: DashMap<String, Arc<Mutex<()>>>,
    file_path: Option<PathBuf>,
    logged_in: watch::Sender<bool>,
    accounts_tx: watch::Sender<Vec<String>>,
}

impl<A: Authority> AccountBroker<A> {
    /// Create an in-memory broker
    pub fn new(authority: Arc<A>) -> Self {
        Self {
            authority,
            sessions: RwLock::new(BTreeMap::new()),
            renewals: DashMap::new(),
            file_path: None,
            logged_in: watch::channel(false).0,
            accounts_tx: watch::channel(Vec::new()).0,
        }
    }

    /// Create a broker persisting sessions under `data_dir`, reloading any
    /// previously saved sessions
    pub fn with_session_file(authority: Arc<A>, data_dir: &Path) -> EngineResult<Self> {
        let file_path = data_dir.join("accounts.json");
        let file = if file_path.exists() {
            let content = std::fs::read_to_string(&file_path)?;
            serde_json::from_str(&content)?
        } else {
            SessionFile::default()
        };

        let accounts: Vec<String> = file.sessions.keys().cloned().collect();
        tracing::debug!(count = accounts.len(), "loaded persisted sessions");

        Ok(Self {
            authority,
            logged_in: watch::channel(!accounts.is_empty()).0,
            accounts_tx: watch::channel(accounts).0,
            sessions: RwLock::new(file.sessions),
            renewals: DashMap::new(),
            file_path: Some(file_path),
        })
    }

    /// Exchange credentials for a token and store the session
    pub async fn login(&self, nif: &str, secret: &str) -> EngineResult<String> {
        let token = self.authority.login(nif, secret).await?;
        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(
                nif.to_string(),
                AuthSession {
                    secret: secret.to_string(),
                    token: token.clone(),
                    rejected: false,
                },
            );
            self.persist(&sessions).await?;
            self.notify(&sessions);
        }
        tracing::debug!(account = %nif, "logged in");
        Ok(token)
    }

    /// Return the cached token, re-authenticating first if it is known
    /// rejected; the renewal is bounded by `timeout`
    pub async fn token(&self, account: &str, timeout: Duration) -> EngineResult<String> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(account) {
                None => return Err(EngineError::NoSuchAccount(account.to_string())),
                Some(session) if !session.rejected => return Ok(session.token.clone()),
                Some(_) => {}
            }
        }

        tokio::time::timeout(timeout, self.renew(account))
            .await
            .map_err(|_| EngineError::TimedOut)?
    }

    /// Record a rejected-token signal; the next `token` call renews
    pub async fn invalidate(&self, account: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(account) {
            session.rejected = true;
            tracing::debug!(account = %account, "token marked rejected");
        }
    }

    /// Logical accounts with a cached session
    pub async fn accounts(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }

    /// Drop an account's session immediately
    ///
    /// In-flight sync passes for the account observe subsequent `token` calls
    /// failing with `NoSuchAccount`.
    pub async fn remove(&self, account: &str) -> EngineResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(account).is_none() {
            return Err(EngineError::NoSuchAccount(account.to_string()));
        }
        self.persist(&sessions).await?;
        self.notify(&sessions);
        tracing::debug!(account = %account, "account removed");
        Ok(())
    }

    /// Observable "some account is logged in" flag, consumed by the UI layer
    pub fn subscribe_logged_in(&self) -> watch::Receiver<bool> {
        self.logged_in.subscribe()
    }

    /// Observable accounts list, consumed by the UI layer
    pub fn subscribe_accounts(&self) -> watch::Receiver<Vec<String>> {
        self.accounts_tx.subscribe()
    }

    /// Re-authenticate with the stored secret, serialized per account
    async fn renew(&self, account: &str) -> EngineResult<String> {
        let lock = self
            .renewals
            .entry(account.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another caller may have renewed while we waited, and the account
        // may have been removed concurrently.
        let secret = {
            let sessions = self.sessions.read().await;
            match sessions.get(account) {
                None => return Err(EngineError::NoSuchAccount(account.to_string())),
                Some(session) if !session.rejected => return Ok(session.token.clone()),
                Some(session) => session.secret.clone(),
            }
        };

        tracing::debug!(account = %account, "re-authenticating with stored secret");
        let token = self.authority.login(account, &secret).await?;

        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(account) {
            None => Err(EngineError::NoSuchAccount(account.to_string())),
            Some(session) => {
                session.token = token.clone();
                session.rejected = false;
                self.persist(&sessions).await?;
                Ok(token)
            }
        }
    }

    /// Write the session file; runs under the sessions lock so saved states
    /// never reorder
    async fn persist(&self, sessions: &BTreeMap<String, AuthSession>) -> EngineResult<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = SessionFile {
            sessions: sessions.clone(),
        };
        tokio::fs::write(path, serde_json::to_string_pretty(&file)?).await?;
        Ok(())
    }

    fn notify(&self, sessions: &BTreeMap<String, AuthSession>) {
        let accounts: Vec<String> = sessions.keys().cloned().collect();
        self.logged_in.send_replace(!accounts.is_empty());
        self.accounts_tx.send_replace(accounts);
    }
}
