use std::{fmt, sync::Arc};

use serde::Serialize;

/// Stable, externally assigned key of a zone.
/// Keeps the original identifier text (with leading zeros) but avoids repeated owned Strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ZoneId(Arc<str>);

impl ZoneId {
    pub fn new(id: impl AsRef<str>) -> Self { Self(Arc::from(id.as_ref())) }

    /// Get the identifier text.
    #[inline] pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for ZoneId {
    fn from(id: &str) -> Self { Self::new(id) }
}

impl From<String> for ZoneId {
    fn from(id: String) -> Self { Self(Arc::from(id)) }
}

impl From<u64> for ZoneId {
    fn from(id: u64) -> Self { Self::new(id.to_string()) }
}
