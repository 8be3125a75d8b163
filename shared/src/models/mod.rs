//! Cache entities
//!
//! The records the reconciler mirrors into the local cache. All entity ids are
//! `LocalId` (one-based); person references inside tables and attendance lists
//! stay in the authority's numbering because the authority owns those
//! relations.

pub mod attendance;
pub mod event;
pub mod menu;
pub mod person;
pub mod table;

// Re-exports
pub use attendance::*;
pub use event::*;
pub use menu::*;
pub use person::*;
pub use table::*;

use thiserror::Error;

/// Entity-level invariant violations
#[derive(Debug, Error)]
pub enum ModelError {
    /// The event's kind requires a menu but none was provided
    #[error("event '{0}' requires a menu but none is present")]
    MissingMenu(String),
}
