//! # il2scope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the il2scope library. Import this module to get quick access to everything needed
//! to load metadata and produce a dump.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all il2scope operations
pub use crate::Error;

/// The result type used throughout il2scope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Drives assembly and rendering of a dump
pub use crate::decompiler::{Decompiler, DumpSummary};

/// Output selection of a dump run
pub use crate::decompiler::DumpConfig;

/// Low-level buffer parsing
pub use crate::Parser;

// ================================================================================================
// Metadata Access
// ================================================================================================

/// The query interface every metadata source implements
pub use crate::metadata::provider::{AddressTriple, DefaultValue, MetadataProvider};

/// Serializable in-memory metadata
pub use crate::metadata::snapshot::MetadataSnapshot;

/// Metadata format versions
pub use crate::metadata::version::MetadataVersion;

/// Raw definition rows
pub use crate::metadata::definitions::{
    FieldDefinition, ImageDefinition, MethodDefinition, ParameterDefinition, PropertyDefinition,
    TypeDefinition, TypeIndex, TypeReference,
};

// ================================================================================================
// Declaration Tree
// ================================================================================================

/// Assembled declarations as consumed by the renderers
pub use crate::decompiler::model::{
    Field, GenericGroup, GenericInstantiation, Image, ImageFailure, ImageOutcome, Method,
    Parameter, Property, PropertyAccessor, TypeCategory, TypeDeclaration,
};
