use std::sync::Arc;

use tokio::sync::mpsc::Sender;
use toml::Value;

use super::registry::RegistryCommand;

/// Callback invoked when a bound key changes.
///
/// Receives the changed key, its new value and the identity of the binder
/// the callback was registered for. Invoked on the registry actor task;
/// callbacks must not block.
pub type ChangeCallback = Arc<dyn Fn(&str, &Value, BinderId) + Send + Sync>;

/// Opaque identity of one settings subscriber.
///
/// A binder owns at most one callback slot in the registry regardless of how
/// many keys or stores it binds; rebinding reuses the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BinderId(pub(crate) u64);

/// A bound (binder, key) pair that releases itself when dropped.
///
/// Dropping the handle unbinds exactly the key it was created for; the
/// binder's callback slot is dropped once its last key is released. This is
/// the automatic-release path for subscribers that go away without calling
/// unbind explicitly.
pub struct Binding {
    pub(crate) binder: BinderId,
    pub(crate) key: String,
    pub(crate) command_tx: Sender<RegistryCommand>,
}

impl Binding {
    /// Identity of the binder this handle belongs to.
    pub fn binder(&self) -> BinderId {
        self.binder
    }

    /// The bound key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        let _ = self.command_tx.try_send(RegistryCommand::Unbind {
            binder: self.binder,
            key: Some(std::mem::take(&mut self.key)),
        });
    }
}
