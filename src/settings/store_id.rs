use std::fmt;

use super::SettingsError;

/// Number of segments in the encoded convenience form.
const ENCODED_SEGMENTS: usize = 3;

/// Composite identity of one settings store.
///
/// A store is addressed by application id, schema name and an optional
/// subpath. The three parts form the identity as a structured tuple, so
/// `("ab", "c", "")` and `("a", "bc", "")` name different stores even though
/// their concatenations collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreId {
    /// Application id owning the store (e.g. "org.wharf.dock").
    pub app_id: String,
    /// Schema name within the application.
    pub name: String,
    /// Subpath selecting a variant of the schema, empty for the default.
    pub subpath: String,
}

impl StoreId {
    /// Creates a store id from its three parts.
    pub fn new(
        app_id: impl Into<String>,
        name: impl Into<String>,
        subpath: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            name: name.into(),
            subpath: subpath.into(),
        }
    }

    /// Parses the encoded convenience form `"appId,name,subpath"`.
    ///
    /// Exactly three comma-separated segments are required; anything else is
    /// a format error. Empty segments are allowed (a store commonly has no
    /// subpath).
    ///
    /// # Errors
    /// Returns [`SettingsError::MalformedPath`] if the segment count is not
    /// three.
    pub fn parse_encoded(encoded: &str) -> Result<Self, SettingsError> {
        let segments: Vec<&str> = encoded.split(',').collect();
        if segments.len() != ENCODED_SEGMENTS {
            return Err(SettingsError::MalformedPath {
                encoded: encoded.to_string(),
                segments: segments.len(),
            });
        }

        Ok(Self::new(segments[0], segments[1], segments[2]))
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.app_id, self.name, self.subpath)
    }
}
