//! Raw definition records of the IL2CPP global metadata.
//!
//! These structures mirror the rows of the metadata tables after they have been read
//! from disk. Member ownership is expressed with contiguous `start`/`count` ranges into
//! the global tables, and absent references use `-1`, exactly as the runtime stores them:
//!
//! ```text
//! // Type T owns fields [T.field_start .. T.field_start + T.field_count)
//! // Property getters/setters are indices relative to T.method_start
//! ```
//!
//! The records are plain data and carry no resolution logic; names, type references
//! and addresses are resolved through [`crate::MetadataProvider`].

use serde::{Deserialize, Serialize};

use crate::{metadata::flags::METHOD_SLOT_UNASSIGNED, Error, Result};

/// Index into the runtime's type reference table (`Il2CppType`).
pub type TypeIndex = i32;

/// One compilation unit (assembly image) of the metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageDefinition {
    /// String table index of the image name
    pub name_index: u32,
    /// First type definition owned by this image
    pub type_start: u32,
    /// Number of type definitions owned by this image
    pub type_count: u32,
    /// First custom attribute range owned by this image (24.1 and later)
    pub custom_attribute_start: u32,
    /// Number of custom attribute ranges owned by this image (24.1 and later)
    pub custom_attribute_count: u32,
    /// Metadata token of the image
    pub token: u32,
}

impl ImageDefinition {
    /// Global type definition indices owned by this image, in metadata order.
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] if the range end does not fit the index space.
    pub fn type_range(&self) -> Result<std::ops::Range<usize>> {
        let start = self.type_start as usize;
        let end = start
            .checked_add(self.type_count as usize)
            .ok_or(Error::IndexOutOfRange {
                table: "type_defs",
                index: i64::from(self.type_start) + i64::from(self.type_count),
            })?;
        Ok(start..end)
    }
}

/// A type definition row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeDefinition {
    /// String table index of the simple name
    pub name_index: u32,
    /// String table index of the namespace
    pub namespace_index: u32,
    /// Type reference of the parent type, `-1` if none
    pub parent_index: TypeIndex,
    /// Underlying type reference for enums
    pub element_type_index: TypeIndex,
    /// Generic container of a generic type definition, `-1` if none
    pub generic_container_index: i32,
    /// [`crate::metadata::flags::TypeAttributes`] bit mask
    pub flags: u32,
    /// First field owned by this type
    pub field_start: i32,
    /// First method owned by this type
    pub method_start: i32,
    /// First property owned by this type
    pub property_start: i32,
    /// First entry of this type's interface list
    pub interfaces_start: i32,
    /// Number of methods
    pub method_count: u16,
    /// Number of properties
    pub property_count: u16,
    /// Number of fields
    pub field_count: u16,
    /// Number of implemented interfaces
    pub interfaces_count: u16,
    /// Packed bits: bit 0 = value type, bit 1 = enum
    pub bitfield: u32,
    /// Custom attribute index (pre 24.1 metadata)
    pub custom_attribute_index: i32,
    /// Metadata token
    pub token: u32,
}

impl Default for TypeDefinition {
    fn default() -> Self {
        TypeDefinition {
            name_index: 0,
            namespace_index: 0,
            parent_index: -1,
            element_type_index: -1,
            generic_container_index: -1,
            flags: 0,
            field_start: 0,
            method_start: 0,
            property_start: 0,
            interfaces_start: 0,
            method_count: 0,
            property_count: 0,
            field_count: 0,
            interfaces_count: 0,
            bitfield: 0,
            custom_attribute_index: -1,
            token: 0,
        }
    }
}

impl TypeDefinition {
    /// Returns true if the type is a value type (struct or enum)
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        self.bitfield & 0x1 != 0
    }

    /// Returns true if the type is an enum
    #[must_use]
    pub fn is_enum(&self) -> bool {
        (self.bitfield >> 1) & 0x1 != 0
    }

    /// Global field indices owned by this type
    #[must_use]
    pub fn field_range(&self) -> std::ops::Range<i64> {
        range(self.field_start, self.field_count)
    }

    /// Global property indices owned by this type
    #[must_use]
    pub fn property_range(&self) -> std::ops::Range<i64> {
        range(self.property_start, self.property_count)
    }

    /// Global method indices owned by this type
    #[must_use]
    pub fn method_range(&self) -> std::ops::Range<i64> {
        range(self.method_start, self.method_count)
    }

    /// Positions in the interface index table owned by this type
    #[must_use]
    pub fn interface_range(&self) -> std::ops::Range<i64> {
        range(self.interfaces_start, self.interfaces_count)
    }
}

fn range(start: i32, count: u16) -> std::ops::Range<i64> {
    let start = i64::from(start);
    start..start + i64::from(count)
}

/// A field definition row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDefinition {
    /// String table index of the name
    pub name_index: u32,
    /// Type reference; its attrs carry the [`crate::metadata::flags::FieldAttributes`]
    pub type_index: TypeIndex,
    /// Custom attribute index (pre 24.1 metadata)
    pub custom_attribute_index: i32,
    /// Metadata token
    pub token: u32,
}

impl Default for FieldDefinition {
    fn default() -> Self {
        FieldDefinition {
            name_index: 0,
            type_index: -1,
            custom_attribute_index: -1,
            token: 0,
        }
    }
}

/// A property definition row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyDefinition {
    /// String table index of the name
    pub name_index: u32,
    /// Getter, relative to the declaring type's `method_start`, `-1` if none
    pub get: i32,
    /// Setter, relative to the declaring type's `method_start`, `-1` if none
    pub set: i32,
    /// Property attributes
    pub attrs: u32,
    /// Custom attribute index (pre 24.1 metadata)
    pub custom_attribute_index: i32,
    /// Metadata token
    pub token: u32,
}

impl Default for PropertyDefinition {
    fn default() -> Self {
        PropertyDefinition {
            name_index: 0,
            get: -1,
            set: -1,
            attrs: 0,
            custom_attribute_index: -1,
            token: 0,
        }
    }
}

/// A method definition row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodDefinition {
    /// String table index of the name
    pub name_index: u32,
    /// Declaring type definition
    pub declaring_type: u32,
    /// Type reference of the return type
    pub return_type: TypeIndex,
    /// First parameter definition
    pub parameter_start: i32,
    /// Generic container of a generic method, `-1` if none
    pub generic_container_index: i32,
    /// Metadata token
    pub token: u32,
    /// [`crate::metadata::flags::MethodAttributes`] bit mask
    pub flags: u16,
    /// Implementation flags
    pub iflags: u16,
    /// Vtable slot, [`METHOD_SLOT_UNASSIGNED`] if none
    pub slot: u16,
    /// Number of parameters
    pub parameter_count: u16,
    /// Custom attribute index (pre 24.1 metadata)
    pub custom_attribute_index: i32,
}

impl Default for MethodDefinition {
    fn default() -> Self {
        MethodDefinition {
            name_index: 0,
            declaring_type: 0,
            return_type: -1,
            parameter_start: 0,
            generic_container_index: -1,
            token: 0,
            flags: 0,
            iflags: 0,
            slot: METHOD_SLOT_UNASSIGNED,
            parameter_count: 0,
            custom_attribute_index: -1,
        }
    }
}

impl MethodDefinition {
    /// Global parameter indices of this method, in declaration order
    #[must_use]
    pub fn parameter_range(&self) -> std::ops::Range<i64> {
        range(self.parameter_start, self.parameter_count)
    }

    /// The vtable slot, if one was assigned
    #[must_use]
    pub fn vtable_slot(&self) -> Option<u16> {
        (self.slot != METHOD_SLOT_UNASSIGNED).then_some(self.slot)
    }
}

/// A parameter definition row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterDefinition {
    /// String table index of the name
    pub name_index: u32,
    /// Metadata token
    pub token: u32,
    /// Type reference; its attrs carry the [`crate::metadata::flags::ParamAttributes`]
    pub type_index: TypeIndex,
}

impl Default for ParameterDefinition {
    fn default() -> Self {
        ParameterDefinition {
            name_index: 0,
            token: 0,
            type_index: -1,
        }
    }
}

/// The parts of a runtime type reference that declarations depend on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeReference {
    /// Attribute word (field or parameter attributes of the referencing member)
    pub attrs: u16,
    /// Element type tag of the runtime type enumeration
    pub kind: u8,
    /// The reference is by-ref (`ref T`)
    pub byref: bool,
}

/// Location of a literal default value of a field or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultValueRef {
    /// Type reference of the literal
    pub type_index: TypeIndex,
    /// Index into the default value data blob, `-1` if no data
    pub data_index: i32,
}

/// Identifies one generic method specialization.
pub type MethodSpecIndex = usize;
