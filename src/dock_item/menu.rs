use serde::Deserialize;

use super::DockItemError;

/// One entry of a plugin context menu.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuEntry {
    /// Identifier reported back to the plugin when the entry is triggered.
    pub item_id: String,
    /// Text shown in the menu.
    pub item_text: String,
    /// Whether the entry renders a check mark slot.
    #[serde(default)]
    pub is_checkable: bool,
    /// Current check state.
    #[serde(default)]
    pub checked: bool,
    /// Whether the entry can be triggered.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// A context menu built from a plugin's JSON description.
///
/// The description is an object with an `items` array; unknown fields are
/// ignored so plugins can carry extra data for their own menu handling.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ContextMenu {
    /// Menu entries in display order.
    #[serde(default)]
    pub items: Vec<MenuEntry>,
}

impl ContextMenu {
    /// Parses a menu from its JSON description.
    ///
    /// # Errors
    /// Returns [`DockItemError::MenuParseError`] if the description is not
    /// valid JSON of the expected shape.
    pub fn from_json(item_key: &str, json: &str) -> Result<Self, DockItemError> {
        serde_json::from_str(json).map_err(|e| DockItemError::MenuParseError {
            item_key: item_key.to_string(),
            details: e.to_string(),
        })
    }

    /// Whether the menu has no entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
