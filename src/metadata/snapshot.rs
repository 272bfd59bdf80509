//! In-memory metadata snapshot.
//!
//! [`MetadataSnapshot`] is a self-contained, serializable image of everything the
//! decompiler queries: the definition tables, a string table, pre-resolved type names,
//! code pointers per image and the section layout of the binary. It implements
//! [`MetadataProvider`] directly, which makes it usable both as an exchange format
//! (a loader writes a snapshot once, the dumper consumes it) and as a test fixture.
//!
//! # File format
//!
//! Snapshots are stored as JSON; every table is optional and defaults to empty.
//!
//! ```json
//! {
//!   "version": { "major": 24, "minor": 1 },
//!   "image_base": 6442450944,
//!   "strings": ["", "Assembly-CSharp.dll", "Player"],
//!   "images": [{ "name_index": 1, "type_start": 0, "type_count": 1 }],
//!   "type_defs": [{ "name_index": 2, "parent_index": 0 }],
//!   "types": [{ "name": "object" }]
//! }
//! ```
//!
//! Strings are addressed by their position in `strings`. Method pointers are stored per
//! image name and addressed by the row id of the method token, as the runtime's code
//! generation modules do.
//!
//! Specializations per method and attribute ranges per token are indexed on the first
//! query that needs them. Populate every table before handing the snapshot to a
//! decompiler.

use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
    sync::OnceLock,
};

use serde::{Deserialize, Serialize};

use crate::{
    metadata::{
        definitions::{
            DefaultValueRef, FieldDefinition, ImageDefinition, MethodDefinition, MethodSpecIndex,
            ParameterDefinition, PropertyDefinition, TypeDefinition, TypeIndex, TypeReference,
        },
        provider::{AddressTriple, DefaultValue, MetadataProvider},
        version::MetadataVersion,
    },
    Error, Result,
};

/// A loaded section of the binary, used to translate virtual addresses to file offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionMapping {
    /// Virtual address of the section start
    pub virtual_address: u64,
    /// Size of the section in memory
    pub size: u64,
    /// File offset of the section start
    pub file_offset: u64,
}

impl SectionMapping {
    fn contains(&self, va: u64) -> bool {
        va >= self.virtual_address && va - self.virtual_address < self.size
    }
}

/// A runtime type reference with its pre-resolved printable names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeEntry {
    /// Short printable name, e.g. `List<int>`
    pub name: String,
    /// Namespace-qualified name, falls back to `name`
    pub full_name: Option<String>,
    /// Attribute word of the referencing member
    pub attrs: u16,
    /// Element type tag
    pub kind: u8,
    /// By-ref reference
    pub byref: bool,
    /// Underlying element type tag, for enum types
    pub enum_element: Option<u8>,
}

/// Generic parameters declared by a type or method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericContainer {
    /// Parameter names in declaration order
    pub params: Vec<String>,
}

/// A resolved generic method specialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodSpecEntry {
    /// The generic method definition this specializes
    pub method_definition_index: usize,
    /// Concrete declaring type name
    pub type_name: String,
    /// Concrete method name including its type arguments
    pub method_name: String,
    /// Shared generic code pointer, `0` if unresolved
    pub pointer: u64,
}

/// Custom attribute type range (pre 29 metadata).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeTypeRange {
    /// Token of the owning definition (24.1 and later)
    pub token: u32,
    /// First entry in `attribute_types`
    pub start: u32,
    /// Number of attribute types
    pub count: u32,
}

/// Custom attribute data range (29 and later).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeDataRange {
    /// Token of the owning definition
    pub token: u32,
    /// Start offset within `attribute_data`
    pub start_offset: u32,
}

/// Serializable, fully in-memory [`MetadataProvider`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataSnapshot {
    /// Metadata format version
    pub version: MetadataVersion,
    /// Load base of the binary
    pub image_base: u64,
    /// Pointer width of the target in bytes
    pub pointer_size: u32,
    /// Section layout for VA to file offset translation
    pub sections: Vec<SectionMapping>,
    /// String table
    pub strings: Vec<String>,
    /// Image definitions
    pub images: Vec<ImageDefinition>,
    /// Type definitions
    pub type_defs: Vec<TypeDefinition>,
    /// Field definitions
    pub fields: Vec<FieldDefinition>,
    /// Property definitions
    pub properties: Vec<PropertyDefinition>,
    /// Method definitions
    pub methods: Vec<MethodDefinition>,
    /// Parameter definitions
    pub parameters: Vec<ParameterDefinition>,
    /// Interface index table
    pub interface_indices: Vec<TypeIndex>,
    /// Runtime type references
    pub types: Vec<TypeEntry>,
    /// Generic containers
    pub generic_containers: Vec<GenericContainer>,
    /// Field offsets per type definition, by local field index
    pub field_offsets: BTreeMap<usize, Vec<i32>>,
    /// Method pointers per image name, by method token row id
    pub method_pointers: BTreeMap<String, Vec<u64>>,
    /// Field default values by global field index
    pub field_default_values: BTreeMap<usize, DefaultValueRef>,
    /// Parameter default values by global parameter index
    pub parameter_default_values: BTreeMap<usize, DefaultValueRef>,
    /// Offset of the default value data blob within the metadata file
    pub default_value_data_offset: u32,
    /// Decoded literals by data index
    pub literals: BTreeMap<i32, DefaultValue>,
    /// Generic method specializations
    pub method_specs: Vec<MethodSpecEntry>,
    /// Custom attribute type ranges (pre 29)
    pub attribute_type_ranges: Vec<AttributeTypeRange>,
    /// Custom attribute types (pre 29)
    pub attribute_types: Vec<TypeIndex>,
    /// Custom attribute generator pointers (pre 29)
    pub attribute_generators: Vec<u64>,
    /// Custom attribute data ranges, including the closing sentinel (29 and later)
    pub attribute_data_ranges: Vec<AttributeDataRange>,
    /// Custom attribute data section (29 and later)
    pub attribute_data: Vec<u8>,
    #[serde(skip)]
    lookups: OnceLock<Lookups>,
}

/// Reverse indices over the snapshot tables.
#[derive(Debug, Clone, Default)]
struct Lookups {
    /// Specializations per method definition, in table order
    specs_by_method: HashMap<usize, Vec<MethodSpecIndex>>,
    /// Attribute type range positions per token, ascending
    type_ranges_by_token: HashMap<u32, Vec<usize>>,
    /// Attribute data range positions per token, ascending
    data_ranges_by_token: HashMap<u32, Vec<usize>>,
}

impl Lookups {
    fn build(snapshot: &MetadataSnapshot) -> Self {
        let mut lookups = Lookups::default();
        for (index, spec) in snapshot.method_specs.iter().enumerate() {
            lookups
                .specs_by_method
                .entry(spec.method_definition_index)
                .or_default()
                .push(index);
        }
        for (index, range) in snapshot.attribute_type_ranges.iter().enumerate() {
            lookups
                .type_ranges_by_token
                .entry(range.token)
                .or_default()
                .push(index);
        }
        for (index, range) in snapshot.attribute_data_ranges.iter().enumerate() {
            lookups
                .data_ranges_by_token
                .entry(range.token)
                .or_default()
                .push(index);
        }
        lookups
    }
}

impl MetadataSnapshot {
    /// Load a snapshot from a JSON file.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be read, or
    /// [`crate::Error::Json`] if it is not a valid snapshot.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a snapshot from JSON text.
    ///
    /// # Errors
    /// Returns [`crate::Error::Json`] if the text is not a valid snapshot.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Number of images in the snapshot
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    fn lookups(&self) -> &Lookups {
        self.lookups.get_or_init(|| Lookups::build(self))
    }

    fn type_entry(&self, type_index: TypeIndex) -> Result<&TypeEntry> {
        usize::try_from(type_index)
            .ok()
            .and_then(|index| self.types.get(index))
            .ok_or(Error::IndexOutOfRange {
                table: "types",
                index: i64::from(type_index),
            })
    }
}

fn lookup<'a, T>(table: &'a [T], name: &'static str, index: usize) -> Result<&'a T> {
    table.get(index).ok_or(Error::IndexOutOfRange {
        table: name,
        index: i64::try_from(index).unwrap_or(i64::MAX),
    })
}

impl MetadataProvider for MetadataSnapshot {
    fn version(&self) -> MetadataVersion {
        self.version
    }

    fn images(&self) -> &[ImageDefinition] {
        &self.images
    }

    fn type_def(&self, index: usize) -> Result<&TypeDefinition> {
        lookup(&self.type_defs, "type_defs", index)
    }

    fn field_def(&self, index: usize) -> Result<&FieldDefinition> {
        lookup(&self.fields, "fields", index)
    }

    fn property_def(&self, index: usize) -> Result<&PropertyDefinition> {
        lookup(&self.properties, "properties", index)
    }

    fn method_def(&self, index: usize) -> Result<&MethodDefinition> {
        lookup(&self.methods, "methods", index)
    }

    fn parameter_def(&self, index: usize) -> Result<&ParameterDefinition> {
        lookup(&self.parameters, "parameters", index)
    }

    fn interface_index(&self, index: usize) -> Result<TypeIndex> {
        lookup(&self.interface_indices, "interface_indices", index).copied()
    }

    fn string_at(&self, index: u32) -> Result<&str> {
        lookup(&self.strings, "strings", index as usize).map(String::as_str)
    }

    fn type_of(&self, type_index: TypeIndex) -> Result<TypeReference> {
        let entry = self.type_entry(type_index)?;
        Ok(TypeReference {
            attrs: entry.attrs,
            kind: entry.kind,
            byref: entry.byref,
        })
    }

    fn type_name_of(
        &self,
        type_index: TypeIndex,
        use_full_name: bool,
        _nested_qualified: bool,
    ) -> Result<String> {
        let entry = self.type_entry(type_index)?;
        match (&entry.full_name, use_full_name) {
            (Some(full_name), true) => Ok(full_name.clone()),
            _ => Ok(entry.name.clone()),
        }
    }

    fn type_def_name(
        &self,
        type_def_index: usize,
        use_full_name: bool,
        with_generic_params: bool,
    ) -> Result<String> {
        let type_def = self.type_def(type_def_index)?;
        let mut name = String::new();
        if use_full_name {
            let namespace = self.string_at(type_def.namespace_index)?;
            if !namespace.is_empty() {
                name.push_str(namespace);
                name.push('.');
            }
        }
        name.push_str(self.string_at(type_def.name_index)?);
        if with_generic_params && type_def.generic_container_index >= 0 {
            name.push_str(&self.generic_container_params(type_def.generic_container_index)?);
        }
        Ok(name)
    }

    fn field_offset_of(
        &self,
        type_def_index: usize,
        field_local_index: usize,
        _field_global_index: usize,
        is_value_type: bool,
        is_static: bool,
    ) -> i32 {
        let offset = self
            .field_offsets
            .get(&type_def_index)
            .and_then(|offsets| offsets.get(field_local_index))
            .copied()
            .unwrap_or(0);

        // Instance fields of value types are recorded relative to the boxed object
        if is_value_type && !is_static {
            let header = i32::try_from(self.pointer_size.saturating_mul(2)).unwrap_or(0);
            offset.wrapping_sub(header)
        } else {
            offset
        }
    }

    fn method_pointer_of(&self, image_name: &str, method: &MethodDefinition) -> u64 {
        let rid = (method.token & 0x00FF_FFFF) as usize;
        if rid == 0 {
            return 0;
        }

        self.method_pointers
            .get(image_name)
            .and_then(|pointers| pointers.get(rid - 1))
            .copied()
            .unwrap_or(0)
    }

    fn address_triple(&self, pointer: u64) -> AddressTriple {
        let offset = self
            .sections
            .iter()
            .find(|section| section.contains(pointer))
            .map_or(0, |section| {
                pointer - section.virtual_address + section.file_offset
            });

        AddressTriple {
            rva: pointer.wrapping_sub(self.image_base),
            offset,
            va: pointer,
        }
    }

    fn field_default_value(&self, field_index: usize) -> Option<DefaultValueRef> {
        self.field_default_values.get(&field_index).copied()
    }

    fn parameter_default_value(&self, parameter_index: usize) -> Option<DefaultValueRef> {
        self.parameter_default_values.get(&parameter_index).copied()
    }

    fn default_value(&self, _type_index: TypeIndex, data_index: i32) -> DefaultValue {
        self.literals.get(&data_index).cloned().unwrap_or_else(|| {
            #[allow(clippy::cast_sign_loss)]
            DefaultValue::Unresolved(
                self.default_value_data_offset
                    .wrapping_add(data_index as u32),
            )
        })
    }

    fn generic_container_params(&self, container_index: i32) -> Result<String> {
        let container = usize::try_from(container_index)
            .ok()
            .and_then(|index| self.generic_containers.get(index))
            .ok_or(Error::IndexOutOfRange {
                table: "generic_containers",
                index: i64::from(container_index),
            })?;

        Ok(format!("<{}>", container.params.join(", ")))
    }

    fn method_specs_of(&self, method_index: usize) -> Vec<MethodSpecIndex> {
        self.lookups()
            .specs_by_method
            .get(&method_index)
            .cloned()
            .unwrap_or_default()
    }

    fn method_spec_pointer(&self, spec: MethodSpecIndex) -> u64 {
        self.method_specs.get(spec).map_or(0, |entry| entry.pointer)
    }

    fn method_spec_name(&self, spec: MethodSpecIndex) -> Result<(String, String)> {
        let entry = lookup(&self.method_specs, "method_specs", spec)?;
        Ok((entry.type_name.clone(), entry.method_name.clone()))
    }

    fn custom_attribute_index(
        &self,
        image: &ImageDefinition,
        custom_attribute_index: i32,
        token: u32,
    ) -> Option<usize> {
        if !self.version.uses_attribute_tokens() {
            return usize::try_from(custom_attribute_index).ok();
        }

        let start = image.custom_attribute_start as usize;
        let end = start.saturating_add(image.custom_attribute_count as usize);
        let lookups = self.lookups();
        let by_token = if self.version.uses_attribute_data() {
            &lookups.data_ranges_by_token
        } else {
            &lookups.type_ranges_by_token
        };

        // Tokens repeat across images, the image's own range picks the match
        by_token
            .get(&token)?
            .iter()
            .copied()
            .find(|index| (start..end).contains(index))
    }

    fn attribute_generator(&self, attribute_index: usize) -> u64 {
        self.attribute_generators
            .get(attribute_index)
            .copied()
            .unwrap_or(0)
    }

    fn attribute_types(&self, attribute_index: usize) -> Result<Vec<TypeIndex>> {
        let range = lookup(
            &self.attribute_type_ranges,
            "attribute_type_ranges",
            attribute_index,
        )?;
        let start = range.start as usize;
        let end = start + range.count as usize;
        self.attribute_types
            .get(start..end)
            .map(<[TypeIndex]>::to_vec)
            .ok_or(Error::IndexOutOfRange {
                table: "attribute_types",
                index: i64::try_from(end).unwrap_or(i64::MAX),
            })
    }

    fn attribute_data_offset(&self, attribute_index: usize) -> Result<u32> {
        lookup(
            &self.attribute_data_ranges,
            "attribute_data_ranges",
            attribute_index,
        )
        .map(|range| range.start_offset)
    }

    fn attribute_data(&self, start: u32, end: u32) -> Result<&[u8]> {
        if start > end {
            return Err(malformed_error!(
                "Attribute data range is inverted - {}..{}",
                start,
                end
            ));
        }

        self.attribute_data
            .get(start as usize..end as usize)
            .ok_or(out_of_bounds_error!())
    }

    fn enum_element_type(&self, type_index: TypeIndex) -> Result<u8> {
        let entry = self.type_entry(type_index)?;
        entry.enum_element.ok_or_else(|| {
            malformed_error!("Type '{}' is not an enum", entry.name)
        })
    }
}
