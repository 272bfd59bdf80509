// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # il2scope
//!
//! Reconstructs C#-style declarations from resolved IL2CPP runtime metadata and emits them
//! twice: as a human readable pseudo-source file (`dump.cs`) and as a machine readable JSON
//! document tree (`dump.json`).
//!
//! Unity's IL2CPP backend compiles managed assemblies to native code but keeps a global
//! metadata file describing every type, field, property and method. `il2scope` walks that
//! metadata through the [`MetadataProvider`] trait and rebuilds every declaration with its
//! modifiers, custom attributes, default values, field offsets, method addresses and
//! generic method specializations.
//!
//! ## Features
//!
//! - **Declaration reconstruction** - visibility and modifier keywords decoded from the
//!   ECMA-335 flag words, parents and interfaces, accessor-derived property signatures
//! - **Both custom attribute schemes** - generator function addresses (before metadata 29)
//!   and fully decoded constructor arguments (29 and later)
//! - **Dual emission** - text and JSON are rendered from the same declaration tree
//! - **Failure isolation** - an image that cannot be assembled is reported in place; every
//!   other image is still dumped
//! - **Parallel assembly** - optional, with deterministic output order
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use il2scope::prelude::*;
//! use std::path::Path;
//!
//! let snapshot = MetadataSnapshot::from_file(Path::new("snapshot.json"))?;
//! let config = DumpConfig::from_file(Path::new("config.json"))?;
//!
//! let summary = Decompiler::new(&snapshot, config).decompile(Path::new("."))?;
//! println!("Dumped {} images, {} failed", summary.images, summary.failed);
//! # Ok::<(), il2scope::Error>(())
//! ```
//!
//! ### Rendering into memory
//!
//! ```rust
//! use il2scope::{Decompiler, DumpConfig, MetadataSnapshot};
//!
//! let snapshot = MetadataSnapshot::from_json(
//!     r#"{ "version": { "major": 24, "minor": 1 }, "strings": ["", "Empty.dll"],
//!          "images": [{ "name_index": 1 }] }"#,
//! )?;
//! let decompiler = Decompiler::new(&snapshot, DumpConfig::default());
//! let outcomes = decompiler.assemble();
//!
//! let mut text = Vec::new();
//! decompiler.render_text(&outcomes, &mut text)?;
//! assert_eq!(String::from_utf8_lossy(&text), "// Image 0: Empty.dll - 0\n");
//! # Ok::<(), il2scope::Error>(())
//! ```

#[macro_use]
pub(crate) mod error;

/// Byte-level reading primitives
pub mod file;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,no_run
/// use il2scope::prelude::*;
///
/// let snapshot = MetadataSnapshot::from_file(std::path::Path::new("snapshot.json"))?;
/// let outcomes = Decompiler::new(&snapshot, DumpConfig::new()).assemble();
/// # Ok::<(), il2scope::Error>(())
/// ```
pub mod prelude;

/// IL2CPP metadata model, the provider interface and custom attribute decoding
pub mod metadata;

/// Declaration assembly and the text and JSON renderers
pub mod decompiler;

/// `il2scope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `il2scope` Error type
///
/// Covers malformed metadata, out of range table indices and I/O or JSON failures.
pub use error::Error;

/// Cursor-based reader over a byte buffer, with the IL2CPP compressed integer encodings.
pub use file::parser::Parser;

/// The query interface every metadata source implements.
pub use metadata::provider::MetadataProvider;

/// Serializable in-memory metadata, the default [`MetadataProvider`].
pub use metadata::snapshot::MetadataSnapshot;

/// Format version of the global metadata.
pub use metadata::version::MetadataVersion;

/// Drives assembly and rendering of a dump.
pub use decompiler::{Decompiler, DumpConfig, DumpSummary, ImageOutcome};
