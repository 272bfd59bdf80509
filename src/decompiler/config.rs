//! Configuration for the declaration dump.
//!
//! [`DumpConfig`] selects which artifacts are produced and which optional sections they
//! contain. It deserializes from the `config.json` layout used by existing IL2CPP dumping
//! tools (PascalCase keys); unknown keys are ignored and missing keys keep their defaults.
//!
//! ```json
//! {
//!   "DumpMethod": true,
//!   "DumpField": true,
//!   "DumpProperty": false,
//!   "DumpAttribute": true,
//!   "DumpFieldOffset": true,
//!   "DumpMethodOffset": true,
//!   "DumpTypeDefIndex": true,
//!   "DumpToCs": true,
//!   "DumpToJson": false
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// File name of the text artifact
pub const TEXT_OUTPUT_FILE: &str = "dump.cs";
/// File name of the JSON artifact
pub const JSON_OUTPUT_FILE: &str = "dump.json";

/// Output selection of a dump run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DumpConfig {
    /// Include methods (default: true).
    pub dump_method: bool,

    /// Include fields (default: true).
    pub dump_field: bool,

    /// Include properties (default: true).
    pub dump_property: bool,

    /// Include custom attributes (default: true).
    pub dump_attribute: bool,

    /// Annotate fields with their offsets (default: true).
    pub dump_field_offset: bool,

    /// Annotate methods with their addresses and vtable slots (default: true).
    pub dump_method_offset: bool,

    /// Annotate types with their type definition index (default: true).
    pub dump_type_def_index: bool,

    /// Write the text artifact `dump.cs` (default: true).
    pub dump_to_cs: bool,

    /// Write the JSON artifact `dump.json` (default: true).
    pub dump_to_json: bool,

    /// Assemble images on the rayon thread pool (default: false).
    /// Output order is unaffected.
    pub parallel: bool,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            dump_method: true,
            dump_field: true,
            dump_property: true,
            dump_attribute: true,
            dump_field_offset: true,
            dump_method_offset: true,
            dump_type_def_index: true,
            dump_to_cs: true,
            dump_to_json: true,
            parallel: false,
        }
    }
}

impl DumpConfig {
    /// Creates a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration that only lists declarations: no attributes, no offsets,
    /// no addresses and no type definition indices.
    #[must_use]
    pub fn declarations_only() -> Self {
        Self {
            dump_attribute: false,
            dump_field_offset: false,
            dump_method_offset: false,
            dump_type_def_index: false,
            ..Self::default()
        }
    }

    /// Load a configuration file.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be read, or
    /// [`crate::Error::Json`] if it is not valid configuration JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a configuration from JSON text.
    ///
    /// # Errors
    /// Returns [`crate::Error::Json`] if the text is not valid configuration JSON.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DumpConfig::default();
        assert!(config.dump_method && config.dump_to_cs && config.dump_to_json);
        assert!(!config.parallel);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = DumpConfig::from_json(
            r#"{ "DumpProperty": false, "DumpToJson": false, "GenerateStruct": true }"#,
        )
        .unwrap();
        assert!(!config.dump_property);
        assert!(!config.dump_to_json);
        assert!(config.dump_field);
        assert!(config.dump_type_def_index);
    }

    #[test]
    fn test_round_trip_keys() {
        let json = serde_json::to_string(&DumpConfig::declarations_only()).unwrap();
        assert!(json.contains("\"DumpTypeDefIndex\":false"));
        assert!(json.contains("\"DumpToCs\":true"));
    }

    #[test]
    fn test_invalid_config() {
        let result = DumpConfig::from_json("{ \"DumpMethod\": 3 }");
        assert!(matches!(result, Err(crate::Error::Json(_))));
    }
}
