//! Settings registry with store multiplexing and change fan-out.
//!
//! Translates (app id, schema name, subpath, key) lookups into shared store
//! instances and mirrors store-level change events into per-binder callbacks.
//! All registry state is owned by a dedicated actor task; failures degrade to
//! caller-supplied defaults rather than propagating.

mod binding;
mod error;
mod paths;
mod provider;
mod registry;
mod store;
mod store_id;

#[cfg(test)]
mod tests;

pub use binding::{Binding, BinderId, ChangeCallback};
pub use error::SettingsError;
pub use paths::SettingsPaths;
pub use provider::{DirectoryProvider, StoreProvider};
pub use registry::SettingsRegistry;
pub use store::{DocumentStore, SettingsStore};
pub use store_id::StoreId;
