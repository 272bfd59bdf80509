//! IL2CPP runtime metadata model and access.
//!
//! This module contains everything the decompiler needs to know about the metadata it
//! dumps, without tying it to a particular loader:
//!
//! # Key Components
//!
//! - [`definitions`] - raw definition rows (images, types, fields, properties, methods,
//!   parameters) with their contiguous member ranges
//! - [`flags`] - ECMA-335 attribute bit masks and typed method flag views
//! - [`version`] - metadata format versions and the layout thresholds derived from them
//! - [`provider`] - the [`provider::MetadataProvider`] query trait
//! - [`snapshot`] - a serializable in-memory provider
//! - [`customattributes`] - both custom attribute schemes
//!
//! # Examples
//!
//! ```rust
//! use il2scope::metadata::{provider::MetadataProvider, snapshot::MetadataSnapshot};
//!
//! let snapshot = MetadataSnapshot::from_json(
//!     r#"{ "version": { "major": 24, "minor": 1 }, "strings": ["", "Game.dll"],
//!          "images": [{ "name_index": 1 }] }"#,
//! )?;
//! assert_eq!(snapshot.string_at(snapshot.images()[0].name_index)?, "Game.dll");
//! # Ok::<(), il2scope::Error>(())
//! ```

/// Implementation of custom attribute decoding for both storage schemes
pub mod customattributes;
/// Raw metadata definition rows
pub mod definitions;
/// Attribute flag constants and typed flag views
pub mod flags;
/// The query interface consumed by the decompiler
pub mod provider;
/// Serializable in-memory metadata provider
pub mod snapshot;
/// Metadata format versions
pub mod version;
