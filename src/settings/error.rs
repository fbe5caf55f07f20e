use std::path::PathBuf;

use super::StoreId;

/// Errors that can occur during settings operations.
///
/// Registry lookups never surface these to callers of `get`/`set`; those
/// degrade to defaults. The error type exists for the seams where a caller
/// does want to know: `bind`, store loading and persistence.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The encoded store path did not have exactly three segments.
    #[error("malformed encoded store path '{encoded}': expected 3 comma-separated segments, got {segments}")]
    MalformedPath {
        /// The encoded path as supplied.
        encoded: String,
        /// Number of segments actually found.
        segments: usize,
    },

    /// The provider could not create or resolve the store.
    #[error("store '{id}' unavailable")]
    StoreUnavailable {
        /// Identity of the unresolvable store.
        id: StoreId,
    },

    /// The key is not part of the store's declared key list.
    #[error("unknown key '{key}' in store '{id}'")]
    UnknownKey {
        /// Identity of the store.
        id: StoreId,
        /// The rejected key.
        key: String,
    },

    /// Failed to parse a store document.
    #[error("failed to parse store document '{path}': {details}")]
    ParseError {
        /// Path of the document that failed to parse.
        path: PathBuf,
        /// Parse error details.
        details: String,
    },

    /// Failed to persist a store document to disk.
    #[error("failed to persist store document '{path}': {details}")]
    PersistenceError {
        /// Path where persistence failed.
        path: PathBuf,
        /// Error details from the persistence operation.
        details: String,
    },

    /// The registry actor has shut down and no longer accepts operations.
    #[error("settings registry is shut down")]
    RegistryClosed,
}
