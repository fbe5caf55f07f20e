use std::sync::Arc;

use bitflags::bitflags;

use super::Size;

bitflags! {
    /// Placement and capability flags a plugin item advertises to the dock.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PluginFlags: u32 {
        /// Ordinary item in the plugin area.
        const TYPE_COMMON = 1 << 0;
        /// Item living in the tray area.
        const TYPE_TRAY = 1 << 1;
        /// Item pinned at a fixed position.
        const TYPE_FIXED = 1 << 2;
        /// Item may be reordered by dragging.
        const ATTRIBUTE_CAN_DRAG = 1 << 8;
        /// Item offers a settings entry in the dock configuration.
        const ATTRIBUTE_CAN_SETTING = 1 << 9;
    }
}

/// Minimal handle to a plugin-owned widget surface.
///
/// The dock does not render plugin content; it only shows, hides and sizes
/// the surfaces a plugin hands out. Whatever toolkit backs a surface is the
/// plugin host's business.
pub trait Surface: Send + Sync {
    /// Preferred size of the surface.
    fn size_hint(&self) -> Size;

    /// Pins the surface to a fixed size.
    fn set_fixed_size(&self, size: Size);

    /// Makes the surface visible.
    fn show(&self);

    /// Hides the surface.
    fn hide(&self);

    /// Whether the surface is currently visible.
    fn is_visible(&self) -> bool;
}

/// Interface a loaded dock plugin exposes per contributed item.
///
/// Item keys distinguish multiple items contributed by one plugin. All
/// accessors are optional: a plugin without a tooltip simply returns `None`.
pub trait DockPlugin: Send + Sync {
    /// Stable name of the plugin.
    fn plugin_name(&self) -> &str;

    /// Command line to launch on left click, if the item is command-driven.
    fn item_command(&self, item_key: &str) -> Option<String>;

    /// JSON description of the item's context menu.
    fn item_context_menu(&self, item_key: &str) -> Option<String>;

    /// The item's main widget shown on the dock.
    fn item_widget(&self, item_key: &str) -> Option<Arc<dyn Surface>>;

    /// Tooltip surface shown on hover.
    fn item_tips_widget(&self, item_key: &str) -> Option<Arc<dyn Surface>>;

    /// Popup applet surface toggled on left click.
    fn item_popup_applet(&self, item_key: &str) -> Option<Arc<dyn Surface>>;
}
