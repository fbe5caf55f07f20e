use thiserror::Error;

use crate::dock_item::DockItemError;
use crate::settings::SettingsError;

/// Top-level error type for wharf operations.
#[derive(Error, Debug)]
pub enum WharfError {
    /// Settings registry or store failure.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Dock item failure.
    #[error("Dock item error: {0}")]
    DockItem(#[from] DockItemError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias using [`WharfError`].
pub type Result<T> = std::result::Result<T, WharfError>;
