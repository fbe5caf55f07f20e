//! Wharf - Dock shell building blocks.
//!
//! Wharf provides the non-visual core of a desktop taskbar/dock: a settings
//! registry that mirrors persisted stores into in-process callbacks, and the
//! plugin-item glue that turns mouse interaction into commands, popups and
//! context menus. The main features include:
//!
//! - Settings registry multiplexing (binder, key) subscriptions onto shared
//!   store instances
//! - File-backed TOML document stores with change notification
//! - Toolkit-agnostic dock item with popup/tooltip/menu placement
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wharf::settings::{DirectoryProvider, SettingsRegistry, StoreId};
//!
//! # async fn demo() {
//! let provider = Arc::new(DirectoryProvider::new("/etc/wharf/stores"));
//! let registry = SettingsRegistry::new(provider);
//!
//! let id = StoreId::new("org.wharf.dock", "appearance", "");
//! let size = registry.get(&id, "icon-size", toml::Value::Integer(48)).await;
//! println!("icon size: {size:?}");
//! # }
//! ```

/// Core error types and result aliases.
pub mod core;

/// Settings registry, store instances and bindings.
pub mod settings;

/// Dock item glue: plugin interface, mouse routing, popups.
pub mod dock_item;

/// Tracing initialization for dock processes.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use core::{Result, WharfError};
