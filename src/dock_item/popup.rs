use super::{Point, Rect};

/// Kind of popup window requested from the popup subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupType {
    /// Panel popup applet toggled by left click.
    Panel,
    /// Context menu opened by right click.
    Menu,
    /// Hover tooltip.
    Tooltip,
}

/// Placement request for one plugin popup window.
///
/// Carries everything the popup subsystem needs to position and attribute a
/// window: which plugin and item it belongs to, what kind of popup it is and
/// the anchor point, which is the center of the originating item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginPopup {
    /// Name of the owning plugin.
    pub plugin_id: String,
    /// Item key within the plugin.
    pub item_key: String,
    /// Popup kind.
    pub popup_type: PopupType,
    /// Anchor position in panel coordinates.
    pub pos: Point,
}

impl PluginPopup {
    /// Builds a placement anchored at the center of `item_rect`.
    pub fn anchored(
        plugin_id: impl Into<String>,
        item_key: impl Into<String>,
        popup_type: PopupType,
        item_rect: Rect,
    ) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            item_key: item_key.into(),
            popup_type,
            pos: item_rect.center(),
        }
    }
}
