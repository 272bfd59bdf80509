//! The query interface the decompiler consumes.
//!
//! Loading the binary container, reading the metadata tables and resolving type
//! references into printable names are the job of a [`MetadataProvider`]. The decompiler
//! only ever talks to this trait, so any backing store (a live loader, a cached snapshot,
//! a test fixture) can drive it.
//!
//! # Resolution outcomes
//!
//! Lookups that index a table return [`crate::Result`] and fail with
//! [`crate::Error::IndexOutOfRange`] for rows that do not exist; such failures abort the
//! assembly of the current image only. Queries whose answer may legitimately be absent
//! (method pointers, default values, custom attribute indices) return `Option`, `0` or a
//! tagged value instead.

use serde::{Deserialize, Serialize};

use crate::{
    metadata::{
        definitions::{
            DefaultValueRef, FieldDefinition, ImageDefinition, MethodDefinition, MethodSpecIndex,
            ParameterDefinition, PropertyDefinition, TypeDefinition, TypeIndex, TypeReference,
        },
        version::MetadataVersion,
    },
    Result,
};

/// The three ways of addressing a compiled function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressTriple {
    /// Relative virtual address (offset from the module load base)
    pub rva: u64,
    /// Byte offset within the on-disk binary
    pub offset: u64,
    /// Absolute virtual address
    pub va: u64,
}

/// A decoded literal default value of a field or parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum DefaultValue {
    /// UTF-16 string literal
    String(String),
    /// Character literal, as a UTF-16 code unit
    Char(u16),
    /// Boolean literal
    Bool(bool),
    /// Signed integer literal
    Int(i64),
    /// Unsigned integer literal
    UInt(u64),
    /// Floating point literal
    Float(f64),
    /// `null`
    Null,
    /// The value exists but could not be decoded; carries its raw metadata offset
    Unresolved(u32),
}

/// Source of resolved IL2CPP metadata.
///
/// Implementations must be [`Sync`]: the decompiler may assemble several images in
/// parallel against the same provider.
pub trait MetadataProvider: Sync {
    /// Version of the metadata format
    fn version(&self) -> MetadataVersion;

    /// All image definitions, in metadata order
    fn images(&self) -> &[ImageDefinition];

    /// Type definition by global index
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] if the row does not exist.
    fn type_def(&self, index: usize) -> Result<&TypeDefinition>;

    /// Field definition by global index
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] if the row does not exist.
    fn field_def(&self, index: usize) -> Result<&FieldDefinition>;

    /// Property definition by global index
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] if the row does not exist.
    fn property_def(&self, index: usize) -> Result<&PropertyDefinition>;

    /// Method definition by global index
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] if the row does not exist.
    fn method_def(&self, index: usize) -> Result<&MethodDefinition>;

    /// Parameter definition by global index
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] if the row does not exist.
    fn parameter_def(&self, index: usize) -> Result<&ParameterDefinition>;

    /// Entry of the interface index table
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] if the row does not exist.
    fn interface_index(&self, index: usize) -> Result<TypeIndex>;

    /// String table lookup
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] if no string starts at `index`.
    fn string_at(&self, index: u32) -> Result<&str>;

    /// The runtime type reference behind a type index
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] if the type index does not exist.
    fn type_of(&self, type_index: TypeIndex) -> Result<TypeReference>;

    /// Printable name of a type reference
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] if the type index does not exist.
    fn type_name_of(
        &self,
        type_index: TypeIndex,
        use_full_name: bool,
        nested_qualified: bool,
    ) -> Result<String>;

    /// Printable declared name of a type definition, optionally with its generic
    /// parameter suffix
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] if the definition does not exist.
    fn type_def_name(
        &self,
        type_def_index: usize,
        use_full_name: bool,
        with_generic_params: bool,
    ) -> Result<String>;

    /// Offset of a field within its object or static storage
    fn field_offset_of(
        &self,
        type_def_index: usize,
        field_local_index: usize,
        field_global_index: usize,
        is_value_type: bool,
        is_static: bool,
    ) -> i32;

    /// Compiled code pointer of a method, `0` if none exists
    fn method_pointer_of(&self, image_name: &str, method: &MethodDefinition) -> u64;

    /// Resolve a code pointer into its RVA, file offset and VA
    fn address_triple(&self, pointer: u64) -> AddressTriple;

    /// Default value location of a field, if it has one
    fn field_default_value(&self, field_index: usize) -> Option<DefaultValueRef>;

    /// Default value location of a parameter, if it has one
    fn parameter_default_value(&self, parameter_index: usize) -> Option<DefaultValueRef>;

    /// Decode a literal default value
    fn default_value(&self, type_index: TypeIndex, data_index: i32) -> DefaultValue;

    /// Generic parameter suffix of a generic container, e.g. `<TKey, TValue>`
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] if the container does not exist.
    fn generic_container_params(&self, container_index: i32) -> Result<String>;

    /// Known specializations of a method definition, in source order
    fn method_specs_of(&self, method_index: usize) -> Vec<MethodSpecIndex>;

    /// Shared generic code pointer of a specialization, `0` if unresolved
    fn method_spec_pointer(&self, spec: MethodSpecIndex) -> u64;

    /// Concrete declaring type name and method name of a specialization
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] if the specialization does not exist.
    fn method_spec_name(&self, spec: MethodSpecIndex) -> Result<(String, String)>;

    /// Resolve the custom attribute range of a definition, `None` if it has no attributes
    fn custom_attribute_index(
        &self,
        image: &ImageDefinition,
        custom_attribute_index: i32,
        token: u32,
    ) -> Option<usize>;

    /// Generator function pointer of an attribute range (pre 29 metadata)
    fn attribute_generator(&self, attribute_index: usize) -> u64;

    /// Attribute types of an attribute range (pre 29 metadata)
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] if the range does not exist.
    fn attribute_types(&self, attribute_index: usize) -> Result<Vec<TypeIndex>>;

    /// Start offset of an attribute data range within the attribute data section
    /// (29 and later); `attribute_index + 1` yields the end of the range
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] if the range does not exist.
    fn attribute_data_offset(&self, attribute_index: usize) -> Result<u32>;

    /// Raw bytes of the attribute data section between two offsets
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the section.
    fn attribute_data(&self, start: u32, end: u32) -> Result<&[u8]>;

    /// Element type tag underlying an enum type reference
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] if the type index does not exist.
    fn enum_element_type(&self, type_index: TypeIndex) -> Result<u8>;
}
