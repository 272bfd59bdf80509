//! IL2CPP metadata format versions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Version of the global metadata format, e.g. `24.1` or `29.0`.
///
/// Several on-disk layouts changed over time; the thresholds the decompiler cares about
/// are exposed as predicates so callers never compare raw numbers.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MetadataVersion {
    /// Major format version
    pub major: u32,
    /// Minor format revision
    #[serde(default)]
    pub minor: u32,
}

impl MetadataVersion {
    /// Create a new version
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        MetadataVersion { major, minor }
    }

    /// Custom attributes are recorded in the metadata (21 and later).
    #[must_use]
    pub fn supports_attributes(&self) -> bool {
        self.major >= 21
    }

    /// Custom attributes are stored as raw data blobs instead of generator functions
    /// (29 and later).
    #[must_use]
    pub fn uses_attribute_data(&self) -> bool {
        self.major >= 29
    }

    /// Custom attribute ranges are keyed by metadata token rather than addressed by the
    /// definition's attribute index (24.1 and later).
    #[must_use]
    pub fn uses_attribute_tokens(&self) -> bool {
        *self >= MetadataVersion::new(24, 1)
    }
}

impl fmt::Display for MetadataVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds() {
        assert!(!MetadataVersion::new(20, 0).supports_attributes());
        assert!(MetadataVersion::new(21, 0).supports_attributes());
        assert!(!MetadataVersion::new(27, 2).uses_attribute_data());
        assert!(MetadataVersion::new(29, 0).uses_attribute_data());
        assert!(!MetadataVersion::new(24, 0).uses_attribute_tokens());
        assert!(MetadataVersion::new(24, 1).uses_attribute_tokens());
        assert!(MetadataVersion::new(27, 0).uses_attribute_tokens());
    }

    #[test]
    fn display() {
        assert_eq!(MetadataVersion::new(24, 1).to_string(), "24.1");
    }
}
