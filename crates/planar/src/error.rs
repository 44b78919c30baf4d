//! Error types for the planar binding

use crate::registry::EntityKind;
use thiserror::Error;

/// Errors surfaced by the planar binding
///
/// Only creation paths can fail recoverably. Stale references during event
/// decode or callback resolution are not errors; they resolve to `None`.
/// Programmer errors (double registration, unknown layout fields) and fatal
/// initialization errors (a dead native layer) fail fast instead.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The native engine rejected world creation
    #[error("native engine rejected world creation")]
    WorldCreate,

    /// The native engine rejected creation of an entity
    #[error("native engine rejected {0} creation")]
    EntityCreate(EntityKind),
}

/// Result type for planar operations
pub type Result<T> = std::result::Result<T, Error>;
