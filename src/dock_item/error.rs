/// Errors that can occur while driving a dock item.
#[derive(Debug, thiserror::Error)]
pub enum DockItemError {
    /// The plugin supplied no context menu description.
    #[error("plugin '{plugin}' supplied no context menu for item '{item_key}'")]
    EmptyContextMenu {
        /// Name of the plugin.
        plugin: String,
        /// Item key the menu was requested for.
        item_key: String,
    },

    /// The context menu description could not be parsed.
    #[error("failed to parse context menu for item '{item_key}': {details}")]
    MenuParseError {
        /// Item key the menu was requested for.
        item_key: String,
        /// Parse error details.
        details: String,
    },

    /// A plugin command could not be launched.
    #[error("failed to launch command '{command}': {details}")]
    CommandFailed {
        /// The command line that failed.
        command: String,
        /// Launch error details.
        details: String,
    },
}
