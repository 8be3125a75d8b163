//! Casal Engine - synchronization and identity core
//!
//! Keeps a local cache coherent with the remote membership authority while
//! juggling multiple simultaneously-authenticated identities. Three
//! collaborators: the credential broker ([`AccountBroker`]), the remote
//! authority seam ([`Authority`], implemented by the HTTP gateway), and the
//! reconciliation engine ([`Reconciler`]).

pub mod accounts;
pub mod error;
pub mod reconcile;
pub mod remote;
pub mod store;

pub use accounts::AccountBroker;
pub use error::{EngineError, EngineResult};
pub use reconcile::{PassReport, Reconciler, ReconcilerConfig};
pub use remote::Authority;
pub use store::{LocalCache, MemoryCache, StoreError};
