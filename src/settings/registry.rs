use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::{
    sync::{
        broadcast::error::RecvError,
        mpsc::{self, Receiver, Sender},
        oneshot,
    },
    task::JoinHandle,
};
use toml::Value;
use tracing::{debug, warn};

use super::{
    BinderId, Binding, ChangeCallback, SettingsError, StoreId,
    provider::StoreProvider, store::SettingsStore,
};

/// Capacity of the registry's command channel.
const COMMAND_CHANNEL_CAPACITY: usize = 100;

/// Commands sent to the registry actor task.
pub(crate) enum RegistryCommand {
    /// Resolve (or create) the store for `id`.
    Resolve {
        id: StoreId,
        reply: oneshot::Sender<Option<Arc<dyn SettingsStore>>>,
    },
    /// Bind a (binder, key) pair on a store and install the binder's callback.
    Bind {
        id: StoreId,
        binder: BinderId,
        key: String,
        callback: ChangeCallback,
        reply: oneshot::Sender<Result<(), SettingsError>>,
    },
    /// Release bindings: all of a binder's keys, or one key across all stores.
    Unbind {
        binder: BinderId,
        key: Option<String>,
    },
    /// Read a value, falling back to `default`.
    Get {
        id: StoreId,
        key: String,
        default: Value,
        reply: oneshot::Sender<Value>,
    },
    /// Write a value through to a store.
    Set {
        id: StoreId,
        key: String,
        value: Value,
    },
    /// A store reported that `key` changed.
    Changed { id: StoreId, key: String },
    /// Release all stores and stop the actor.
    Shutdown { reply: oneshot::Sender<()> },
}

/// Handle to the settings registry.
///
/// The registry is the single access point translating [`StoreId`] lookups
/// into live store instances and fanning store change events out to bound
/// callbacks. All state is owned by a dedicated actor task; the handle posts
/// commands and is cheap to clone. Construct one per process scope and pass
/// it to consumers explicitly.
///
/// Configuration access is best-effort by design: resolution failures,
/// unknown keys and malformed encoded paths log a diagnostic and degrade to
/// the caller-supplied default. A missing setting must never take the dock
/// down with it.
#[derive(Clone)]
pub struct SettingsRegistry {
    command_tx: Sender<RegistryCommand>,
    next_binder: Arc<AtomicU64>,
    _actor: Arc<JoinHandle<()>>,
}

impl SettingsRegistry {
    /// Creates a registry backed by `provider` and spawns its actor task.
    ///
    /// The actor runs until [`shutdown`](Self::shutdown) is called.
    pub fn new(provider: Arc<dyn StoreProvider>) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        let actor_tx = command_tx.clone();
        let actor = tokio::spawn(async move {
            registry_actor_loop(provider, actor_tx, command_rx).await;
        });

        Self {
            command_tx,
            next_binder: Arc::new(AtomicU64::new(1)),
            _actor: Arc::new(actor),
        }
    }

    /// Allocates a fresh binder identity.
    pub fn next_binder(&self) -> BinderId {
        BinderId(self.next_binder.fetch_add(1, Ordering::Relaxed))
    }

    /// Resolves the store for `id`, creating it on first access.
    ///
    /// Returns `None` if the provider cannot create the store or the registry
    /// is shut down. Repeated calls for the same id return the identical
    /// instance.
    pub async fn store(&self, id: &StoreId) -> Option<Arc<dyn SettingsStore>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let command = RegistryCommand::Resolve {
            id: id.clone(),
            reply: reply_tx,
        };

        if self.command_tx.send(command).await.is_err() {
            warn!("Resolve failed, registry is shut down, id: {id}");
            return None;
        }

        reply_rx.await.unwrap_or_default()
    }

    /// Binds `key` on the store `id` for `binder`.
    ///
    /// Installs (or overwrites) the binder's single callback slot and records
    /// the (binder, key) pair; binding the same pair twice is a no-op. The
    /// returned guard releases the pair when dropped.
    ///
    /// # Errors
    /// * [`SettingsError::StoreUnavailable`] - if the store cannot be resolved
    /// * [`SettingsError::RegistryClosed`] - if the registry is shut down
    pub async fn bind(
        &self,
        id: &StoreId,
        binder: BinderId,
        key: &str,
        callback: ChangeCallback,
    ) -> Result<Binding, SettingsError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let command = RegistryCommand::Bind {
            id: id.clone(),
            binder,
            key: key.to_string(),
            callback,
            reply: reply_tx,
        };

        self.command_tx
            .send(command)
            .await
            .map_err(|_| SettingsError::RegistryClosed)?;

        reply_rx
            .await
            .map_err(|_| SettingsError::RegistryClosed)??;

        Ok(Binding {
            binder,
            key: key.to_string(),
            command_tx: self.command_tx.clone(),
        })
    }

    /// [`bind`](Self::bind) accepting the encoded form `"appId,name,subpath"`.
    ///
    /// # Errors
    /// * [`SettingsError::MalformedPath`] - if the encoded path is invalid;
    ///   nothing is created or bound in that case
    /// * everything [`bind`](Self::bind) returns
    pub async fn bind_encoded(
        &self,
        encoded: &str,
        binder: BinderId,
        key: &str,
        callback: ChangeCallback,
    ) -> Result<Binding, SettingsError> {
        let id = StoreId::parse_encoded(encoded).inspect_err(|e| warn!("Bind failed: {e}"))?;
        self.bind(&id, binder, key, callback).await
    }

    /// Removes `binder` from every store's binding table and drops its
    /// callback unconditionally.
    pub async fn unbind(&self, binder: BinderId) {
        self.send_unbind(binder, None).await;
    }

    /// Removes `key` from `binder`'s bound set across all stores.
    ///
    /// The binder's callback is dropped only if no bound keys remain
    /// anywhere.
    pub async fn unbind_key(&self, binder: BinderId, key: &str) {
        self.send_unbind(binder, Some(key.to_string())).await;
    }

    async fn send_unbind(&self, binder: BinderId, key: Option<String>) {
        debug!("Settings unbind, binder: {binder:?}, key: {key:?}");
        let command = RegistryCommand::Unbind { binder, key };
        if self.command_tx.send(command).await.is_err() {
            warn!("Unbind dropped, registry is shut down, binder: {binder:?}");
        }
    }

    /// Reads `key` from the store `id`, falling back to `default`.
    ///
    /// The default is returned when the store cannot be resolved or `key` is
    /// not in its declared key list. Never errors.
    pub async fn get(&self, id: &StoreId, key: &str, default: Value) -> Value {
        let (reply_tx, reply_rx) = oneshot::channel();
        let command = RegistryCommand::Get {
            id: id.clone(),
            key: key.to_string(),
            default: default.clone(),
            reply: reply_tx,
        };

        if self.command_tx.send(command).await.is_err() {
            warn!("Get failed, registry is shut down, id: {id}, key: {key}");
            return default;
        }

        reply_rx.await.unwrap_or(default)
    }

    /// [`get`](Self::get) accepting the encoded form `"appId,name,subpath"`.
    pub async fn get_encoded(&self, encoded: &str, key: &str, default: Value) -> Value {
        match StoreId::parse_encoded(encoded) {
            Ok(id) => self.get(&id, key, default).await,
            Err(e) => {
                warn!("Get failed: {e}");
                default
            }
        }
    }

    /// Writes `value` to `key` in the store `id`.
    ///
    /// No-op with a warning if the store cannot be resolved or the key is not
    /// declared by the store.
    pub async fn set(&self, id: &StoreId, key: &str, value: Value) {
        let command = RegistryCommand::Set {
            id: id.clone(),
            key: key.to_string(),
            value,
        };

        if self.command_tx.send(command).await.is_err() {
            warn!("Set failed, registry is shut down, id: {id}, key: {key}");
        }
    }

    /// [`set`](Self::set) accepting the encoded form `"appId,name,subpath"`.
    pub async fn set_encoded(&self, encoded: &str, key: &str, value: Value) {
        match StoreId::parse_encoded(encoded) {
            Ok(id) => self.set(&id, key, value).await,
            Err(e) => warn!("Set failed: {e}"),
        }
    }

    /// Releases every store handle and stops the actor.
    ///
    /// Pending bindings become inert; subsequent operations degrade to
    /// defaults with a warning.
    pub async fn shutdown(&self) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .command_tx
            .send(RegistryCommand::Shutdown { reply: reply_tx })
            .await
            .is_ok()
        {
            let _ = reply_rx.await;
        }
    }
}

/// Per-store actor state: the live handle plus which binder holds which keys.
struct StoreEntry {
    store: Arc<dyn SettingsStore>,
    bindings: HashMap<BinderId, HashSet<String>>,
}

/// All state owned by the registry actor.
struct RegistryState {
    provider: Arc<dyn StoreProvider>,
    command_tx: Sender<RegistryCommand>,
    stores: HashMap<StoreId, StoreEntry>,
    callbacks: HashMap<BinderId, ChangeCallback>,
    forwarders: Vec<JoinHandle<()>>,
}

impl RegistryState {
    /// Get-or-create the store for `id`.
    ///
    /// Creation happens at most once per id; the change-event forwarder is
    /// installed before the handle is handed out, so no event can slip
    /// between creation and subscription.
    fn resolve(&mut self, id: &StoreId) -> Option<Arc<dyn SettingsStore>> {
        if let Some(entry) = self.stores.get(id) {
            return Some(Arc::clone(&entry.store));
        }

        let Some(store) = self.provider.create(id) else {
            warn!(
                "Create store failed, app id: {}, name: {}, subpath: {}",
                id.app_id, id.name, id.subpath
            );
            return None;
        };

        self.forwarders
            .push(spawn_change_forwarder(id.clone(), &store, self.command_tx.clone()));

        self.stores.insert(
            id.clone(),
            StoreEntry {
                store: Arc::clone(&store),
                bindings: HashMap::new(),
            },
        );

        Some(store)
    }

    fn bind(
        &mut self,
        id: &StoreId,
        binder: BinderId,
        key: String,
        callback: ChangeCallback,
    ) -> Result<(), SettingsError> {
        if self.resolve(id).is_none() {
            warn!("Bind failed, store unavailable, id: {id}, key: {key}");
            return Err(SettingsError::StoreUnavailable { id: id.clone() });
        }

        // resolve() just guaranteed the entry exists.
        if let Some(entry) = self.stores.get_mut(id) {
            entry.bindings.entry(binder).or_default().insert(key);
        }

        self.callbacks.insert(binder, callback);
        Ok(())
    }

    /// Release bindings for `binder`.
    ///
    /// With no key, the binder is purged from every store and its callback
    /// dropped. With a key, only that key is removed across all stores; the
    /// callback survives while any other key remains bound anywhere, which
    /// requires scanning every store's table.
    fn unbind(&mut self, binder: BinderId, key: Option<&str>) {
        let mut still_useful = false;

        for entry in self.stores.values_mut() {
            match key {
                None => {
                    entry.bindings.remove(&binder);
                }
                Some(key) => {
                    if let Some(keys) = entry.bindings.get_mut(&binder) {
                        keys.remove(key);
                        if keys.is_empty() {
                            entry.bindings.remove(&binder);
                        } else {
                            still_useful = true;
                        }
                    }
                }
            }
        }

        if key.is_none() || !still_useful {
            self.callbacks.remove(&binder);
        }
    }

    fn get(&mut self, id: &StoreId, key: &str, default: Value) -> Value {
        let Some(store) = self.resolve(id) else {
            warn!("Get failed, store unavailable, id: {id}");
            return default;
        };

        if !store.key_list().iter().any(|k| k == key) {
            return default;
        }

        store.value(key).unwrap_or(default)
    }

    fn set(&mut self, id: &StoreId, key: &str, value: Value) {
        let Some(store) = self.resolve(id) else {
            warn!("Set failed, store unavailable, id: {id}");
            return;
        };

        if !store.key_list().iter().any(|k| k == key) {
            warn!("Set failed, store does not declare key: {key}, id: {id}");
            return;
        }

        if let Err(e) = store.set_value(key, value) {
            warn!("Set failed, id: {id}, key: {key}: {e}");
        }
    }

    /// Fan a store change out to every binder that bound the changed key.
    ///
    /// The value is read once; each matching binder's callback fires exactly
    /// once per raw change. Iteration order across binders is unspecified.
    fn fan_out(&self, id: &StoreId, key: &str) {
        let Some(entry) = self.stores.get(id) else {
            return;
        };

        let Some(value) = entry.store.value(key) else {
            debug!("Change for absent key ignored, id: {id}, key: {key}");
            return;
        };

        for (binder, keys) in &entry.bindings {
            if keys.contains(key)
                && let Some(callback) = self.callbacks.get(binder)
            {
                callback(key, &value, *binder);
            }
        }
    }

    fn shutdown(&mut self) {
        for forwarder in self.forwarders.drain(..) {
            forwarder.abort();
        }
        self.stores.clear();
        self.callbacks.clear();
    }
}

/// Drains one store's change stream into the registry command queue.
fn spawn_change_forwarder(
    id: StoreId,
    store: &Arc<dyn SettingsStore>,
    command_tx: Sender<RegistryCommand>,
) -> JoinHandle<()> {
    let mut receiver = store.subscribe();

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(key) => {
                    let command = RegistryCommand::Changed {
                        id: id.clone(),
                        key,
                    };
                    if command_tx.send(command).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!("Change stream lagged, id: {id}, missed: {missed}");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// The actor loop owning all registry state.
///
/// Commands are processed strictly in order on one task, which is what makes
/// create-if-absent atomic and keeps the binding tables lock-free.
async fn registry_actor_loop(
    provider: Arc<dyn StoreProvider>,
    command_tx: Sender<RegistryCommand>,
    mut command_rx: Receiver<RegistryCommand>,
) {
    let mut state = RegistryState {
        provider,
        command_tx,
        stores: HashMap::new(),
        callbacks: HashMap::new(),
        forwarders: Vec::new(),
    };

    while let Some(command) = command_rx.recv().await {
        match command {
            RegistryCommand::Resolve { id, reply } => {
                let _ = reply.send(state.resolve(&id));
            }

            RegistryCommand::Bind {
                id,
                binder,
                key,
                callback,
                reply,
            } => {
                let _ = reply.send(state.bind(&id, binder, key, callback));
            }

            RegistryCommand::Unbind { binder, key } => {
                state.unbind(binder, key.as_deref());
            }

            RegistryCommand::Get {
                id,
                key,
                default,
                reply,
            } => {
                let _ = reply.send(state.get(&id, &key, default));
            }

            RegistryCommand::Set { id, key, value } => {
                state.set(&id, &key, value);
            }

            RegistryCommand::Changed { id, key } => {
                state.fan_out(&id, &key);
            }

            RegistryCommand::Shutdown { reply } => {
                state.shutdown();
                let _ = reply.send(());
                break;
            }
        }
    }
}
