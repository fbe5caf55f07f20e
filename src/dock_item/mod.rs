//! Dock item glue between loaded plugins and the shell.
//!
//! A [`PluginItem`] represents one plugin-contributed icon on the dock. It
//! routes mouse interaction to plugin commands or popup surfaces, builds the
//! context menu from the plugin's JSON description and computes popup
//! placement. Widgets are abstracted behind the [`Surface`] trait; no
//! windowing toolkit is assumed.

mod error;
mod geometry;
mod item;
mod menu;
mod plugin;
mod popup;

pub use error::DockItemError;
pub use geometry::{Point, Rect, Size};
pub use item::{MouseButton, MouseEvent, PluginItem};
pub use menu::{ContextMenu, MenuEntry};
pub use plugin::{DockPlugin, PluginFlags, Surface};
pub use popup::{PluginPopup, PopupType};
