use std::{
    env,
    io::{Error, ErrorKind},
    path::PathBuf,
};

/// Utility struct for locating settings directories on disk.
///
/// Follows the XDG Base Directory specification for the default store root
/// and keeps logs under the application data directory.
pub struct SettingsPaths;

impl SettingsPaths {
    /// Returns the default root directory for store documents.
    ///
    /// - First checks `XDG_CONFIG_HOME`
    /// - Falls back to `$HOME/.config`
    /// - Appends "wharf" to the base config directory
    ///
    /// # Errors
    /// Returns an error if neither `XDG_CONFIG_HOME` nor `HOME` environment
    /// variables are set.
    pub fn store_root() -> Result<PathBuf, Error> {
        let config_home = env::var("XDG_CONFIG_HOME")
            .or_else(|_| env::var("HOME").map(|home| format!("{home}/.config")))
            .map_err(|_| {
                Error::new(
                    ErrorKind::NotFound,
                    "Neither XDG_CONFIG_HOME nor HOME environment variable found",
                )
            })?;

        Ok(PathBuf::from(config_home).join("wharf"))
    }

    /// Returns the application data directory path.
    ///
    /// Creates the directory if it doesn't exist.
    ///
    /// # Errors
    /// Returns an error if HOME is not set or the directory cannot be created.
    pub fn app_data_dir() -> Result<PathBuf, Error> {
        let data_dir = env::var("HOME")
            .map(|home| format!("{home}/.wharf"))
            .map_err(|_| Error::new(ErrorKind::NotFound, "HOME environment variable found"))?;

        let app_dir = PathBuf::from(data_dir);

        if !app_dir.exists() {
            std::fs::create_dir_all(&app_dir)?;
        }

        Ok(app_dir)
    }

    /// Get the application log directory.
    ///
    /// Creates the directory if it doesn't exist.
    ///
    /// # Errors
    /// Returns error if directory cannot be created.
    pub fn log_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let app_dir = Self::app_data_dir()?;
        let log_dir = app_dir.join("logs");

        if !log_dir.exists() {
            std::fs::create_dir_all(&log_dir)?;
        }

        Ok(log_dir)
    }
}
