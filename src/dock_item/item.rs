use std::{process::Command, sync::Arc};

use tracing::{debug, info, warn};

use super::{
    ContextMenu, DockItemError, DockPlugin, PluginFlags, PluginPopup, PopupType, Rect, Size,
    Surface,
};

/// Mouse buttons the dock cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Secondary button.
    Right,
    /// Middle button.
    Middle,
}

/// Mouse events delivered to a dock item by the shell's event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEvent {
    /// A button was pressed over the item.
    Pressed(MouseButton),
    /// A button was released over the item.
    Released(MouseButton),
    /// The pointer entered the item.
    Entered,
    /// The pointer left the item.
    Exited,
}

/// One plugin-contributed item on the dock.
///
/// Owns the interaction state for a single icon: command dispatch, popup
/// applet toggling, lazy context-menu construction and tooltip handling.
/// Mouse events come in from the shell; popup placement requests go back out
/// for the windowing layer to realize.
pub struct PluginItem {
    plugin: Arc<dyn DockPlugin>,
    item_key: String,
    flags: PluginFlags,
    geometry: Rect,
    menu: Option<ContextMenu>,
    panel_popup_visible: bool,
}

impl PluginItem {
    /// Creates an item for `plugin`'s entry identified by `item_key`.
    pub fn new(plugin: Arc<dyn DockPlugin>, item_key: impl Into<String>) -> Self {
        Self {
            plugin,
            item_key: item_key.into(),
            flags: PluginFlags::default(),
            geometry: Rect::default(),
            menu: None,
            panel_popup_visible: false,
        }
    }

    /// The plugin interface backing this item.
    pub fn plugin(&self) -> &Arc<dyn DockPlugin> {
        &self.plugin
    }

    /// Key of this item within its plugin.
    pub fn item_key(&self) -> &str {
        &self.item_key
    }

    /// The item's main widget surface.
    pub fn central_widget(&self) -> Option<Arc<dyn Surface>> {
        self.plugin.item_widget(&self.item_key)
    }

    /// Current plugin flags.
    pub fn flags(&self) -> PluginFlags {
        self.flags
    }

    /// Replaces the plugin flags.
    pub fn set_flags(&mut self, flags: PluginFlags) {
        self.flags = flags;
    }

    /// The item's rectangle in panel coordinates.
    pub fn geometry(&self) -> Rect {
        self.geometry
    }

    /// Updates the item's rectangle; popups anchor at its center.
    pub fn set_geometry(&mut self, geometry: Rect) {
        self.geometry = geometry;
    }

    /// The lazily built context menu, if one has been constructed.
    pub fn context_menu(&self) -> Option<&ContextMenu> {
        self.menu.as_ref()
    }

    /// Resizes the popup applet after the windowing layer settled its
    /// geometry.
    pub fn update_popup_size(&self, rect: Rect) {
        if let Some(popup) = self.plugin.item_popup_applet(&self.item_key) {
            popup.set_fixed_size(rect.size());
        }
    }

    /// Pins the central widget to `size`.
    pub fn update_item_size(&self, size: Size) {
        if let Some(widget) = self.central_widget() {
            widget.set_fixed_size(size);
        }
    }

    /// Routes a mouse event, returning a popup placement when one should be
    /// shown.
    pub fn handle_mouse(&mut self, event: MouseEvent) -> Option<PluginPopup> {
        match event {
            MouseEvent::Released(MouseButton::Left) => self.left_clicked(),
            MouseEvent::Released(MouseButton::Right) => Some(self.right_clicked()),
            MouseEvent::Entered => self.pointer_entered(),
            MouseEvent::Exited => {
                self.pointer_exited();
                None
            }
            MouseEvent::Pressed(_) | MouseEvent::Released(MouseButton::Middle) => None,
        }
    }

    /// Left click: launch the plugin command if one exists, otherwise toggle
    /// the popup applet.
    fn left_clicked(&mut self) -> Option<PluginPopup> {
        if let Some(command) = self
            .plugin
            .item_command(&self.item_key)
            .filter(|c| !c.is_empty())
        {
            info!("command: {command}");
            if let Err(e) = spawn_detached(&command) {
                warn!("{e}");
            }
            return None;
        }

        let popup = self.plugin.item_popup_applet(&self.item_key)?;

        if self.panel_popup_visible {
            popup.hide();
            self.panel_popup_visible = false;
            return None;
        }

        popup.show();
        self.panel_popup_visible = true;

        Some(PluginPopup::anchored(
            self.plugin.plugin_name(),
            &self.item_key,
            PopupType::Panel,
            self.geometry,
        ))
    }

    /// Right click: build the menu on first use, then request a menu popup.
    fn right_clicked(&mut self) -> PluginPopup {
        if self.menu.as_ref().is_none_or(ContextMenu::is_empty) {
            match self.build_menu() {
                Ok(menu) => self.menu = Some(menu),
                Err(e) => warn!("{e}"),
            }
        }

        debug!(
            "right click: {}, entries: {}",
            self.item_key,
            self.menu.as_ref().map_or(0, |m| m.items.len())
        );

        self.panel_popup_visible = false;
        PluginPopup::anchored(
            self.plugin.plugin_name(),
            &self.item_key,
            PopupType::Menu,
            self.geometry,
        )
    }

    fn build_menu(&self) -> Result<ContextMenu, DockItemError> {
        let json = self
            .plugin
            .item_context_menu(&self.item_key)
            .filter(|j| !j.is_empty())
            .ok_or_else(|| DockItemError::EmptyContextMenu {
                plugin: self.plugin.plugin_name().to_string(),
                item_key: self.item_key.clone(),
            })?;

        ContextMenu::from_json(&self.item_key, &json)
    }

    /// Pointer enter: the popup applet yields to the tooltip.
    fn pointer_entered(&mut self) -> Option<PluginPopup> {
        if let Some(popup) = self.plugin.item_popup_applet(&self.item_key)
            && popup.is_visible()
        {
            popup.hide();
            self.panel_popup_visible = false;
        }

        let tooltip = self.plugin.item_tips_widget(&self.item_key)?;

        let hint = tooltip.size_hint();
        if hint.is_valid() {
            tooltip.set_fixed_size(hint);
        }
        tooltip.show();

        Some(PluginPopup::anchored(
            self.plugin.plugin_name(),
            &self.item_key,
            PopupType::Tooltip,
            self.geometry,
        ))
    }

    fn pointer_exited(&self) {
        if let Some(tooltip) = self.plugin.item_tips_widget(&self.item_key) {
            tooltip.hide();
        }
    }
}

/// Launches a plugin command without waiting for it.
///
/// The first whitespace-separated token is the program, the rest are
/// arguments. The child is left to run on its own.
fn spawn_detached(command: &str) -> Result<(), DockItemError> {
    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        return Ok(());
    };

    Command::new(program)
        .args(parts)
        .spawn()
        .map(|_| ())
        .map_err(|e| DockItemError::CommandFailed {
            command: command.to_string(),
            details: e.to_string(),
        })
}
