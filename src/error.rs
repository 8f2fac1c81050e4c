//! Error types for the engine.
//!
//! The numeric core never fails: malformed notation, unknown stats and bad
//! amounts are normalized. Errors only arise at the engine boundary, where
//! a caller can hold a stale handle or feed in text that does not parse.

use crate::entity::EntityHandle;
use thiserror::Error;

/// Errors surfaced by [`Engine`](crate::Engine) and the JSON loaders.
///
/// # Examples
///
/// ```rust
/// use wavecore::{EngineError, EntityHandle};
///
/// let err = EngineError::UnknownEntity(EntityHandle(7));
/// assert_eq!(err.to_string(), "Unknown entity: entity#7");
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// The handle was never issued, or the entity has been despawned.
    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityHandle),

    /// No archetype with this name was supplied.
    #[error("Unknown archetype: {0}")]
    UnknownArchetype(String),

    /// Configuration or archetype text failed to deserialize.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
