//! Flag words of IL2CPP metadata definitions.
//!
//! IL2CPP keeps the ECMA-335 attribute encodings for types, fields, methods and
//! parameters. Type flags live on the type definition itself, field and parameter flags
//! are carried by the attrs word of the referenced type entry, and method flags are stored
//! on the method definition.
//!
//! Constant modules mirror the layout of the runtime headers. Method attributes are
//! additionally exposed as [`bitflags`] groups so that the access, vtable layout and
//! modifier bits can be extracted independently.

use bitflags::bitflags;

#[allow(non_snake_case)]
/// Type attribute flag constants for type definitions.
///
/// ## Visibility Flags
/// - [`TypeAttributes::NOT_PUBLIC`] / [`TypeAttributes::PUBLIC`] - Top-level type visibility
/// - [`TypeAttributes::NESTED_PUBLIC`], [`TypeAttributes::NESTED_PRIVATE`], etc. - Nested type
///   accessibility levels
///
/// ## Semantic Flags
/// - [`TypeAttributes::INTERFACE`] - Type category
/// - [`TypeAttributes::ABSTRACT`] / [`TypeAttributes::SEALED`] - Inheritance modifiers
/// - [`TypeAttributes::SERIALIZABLE`] - Legacy serialization marker
pub mod TypeAttributes {
    /// Mask for extracting type visibility information.
    pub const VISIBILITY_MASK: u32 = 0x0000_0007;
    /// Type has no public scope (internal to assembly).
    pub const NOT_PUBLIC: u32 = 0x0000_0000;
    /// Type has public scope (visible outside assembly).
    pub const PUBLIC: u32 = 0x0000_0001;
    /// Nested type with public visibility.
    pub const NESTED_PUBLIC: u32 = 0x0000_0002;
    /// Nested type with private visibility.
    pub const NESTED_PRIVATE: u32 = 0x0000_0003;
    /// Nested type with family (protected) visibility.
    pub const NESTED_FAMILY: u32 = 0x0000_0004;
    /// Nested type with assembly (internal) visibility.
    pub const NESTED_ASSEMBLY: u32 = 0x0000_0005;
    /// Nested type with family AND assembly visibility.
    pub const NESTED_FAM_AND_ASSEM: u32 = 0x0000_0006;
    /// Nested type with family OR assembly visibility.
    pub const NESTED_FAM_OR_ASSEM: u32 = 0x0000_0007;

    /// Mask for extracting class semantics information.
    pub const CLASS_SEMANTICS_MASK: u32 = 0x0000_0020;
    /// Type is a class (reference or value type).
    pub const CLASS: u32 = 0x0000_0000;
    /// Type is an interface definition.
    pub const INTERFACE: u32 = 0x0000_0020;

    /// Class is abstract and cannot be instantiated directly.
    pub const ABSTRACT: u32 = 0x0000_0080;
    /// Class is sealed and cannot be inherited from.
    pub const SEALED: u32 = 0x0000_0100;
    /// Class name has special meaning to the runtime.
    pub const SPECIAL_NAME: u32 = 0x0000_0400;
    /// Class/Interface is imported from external metadata.
    pub const IMPORT: u32 = 0x0000_1000;
    /// Type is serializable (legacy attribute).
    pub const SERIALIZABLE: u32 = 0x0000_2000;
}

#[allow(non_snake_case)]
/// All possible flags for `FieldAttributes`
pub mod FieldAttributes {
    /// These 3 bits contain one of the following values:
    pub const FIELD_ACCESS_MASK: u32 = 0x0007;
    /// Member not referenceable
    pub const COMPILER_CONTROLLED: u32 = 0x0000;
    /// Accessible only by the parent type
    pub const PRIVATE: u32 = 0x0001;
    /// Accessible by sub-types only in this Assembly
    pub const FAM_AND_ASSEM: u32 = 0x0002;
    /// Accessibly by anyone in the Assembly
    pub const ASSEMBLY: u32 = 0x0003;
    /// Accessible only by type and sub-types
    pub const FAMILY: u32 = 0x0004;
    /// Accessibly by sub-types anywhere, plus anyone in assembly
    pub const FAM_OR_ASSEM: u32 = 0x0005;
    /// Accessibly by anyone who has visibility to this scope
    pub const PUBLIC: u32 = 0x0006;
    /// Defined on type, else per instance
    pub const STATIC: u32 = 0x0010;
    /// Field can only be initialized, not written to after init
    pub const INIT_ONLY: u32 = 0x0020;
    /// Value is compile time constant
    pub const LITERAL: u32 = 0x0040;
    /// Reserved (to indicate this field should not be serialized when type is remoted)
    pub const NOT_SERIALIZED: u32 = 0x0080;
    /// Field is special
    pub const SPECIAL_NAME: u32 = 0x0200;
    /// Field has default
    pub const HAS_DEFAULT: u32 = 0x8000;
}

#[allow(non_snake_case)]
/// Raw `MethodAttributes` constants as stored in a method definition.
pub mod MethodAttributes {
    /// Member access bits
    pub const MEMBER_ACCESS_MASK: u32 = 0x0007;
    /// Accessible only by the parent type
    pub const PRIVATE: u32 = 0x0001;
    /// Accessible by sub-types only in this Assembly
    pub const FAM_AND_ASSEM: u32 = 0x0002;
    /// Accessibly by anyone in the Assembly
    pub const ASSEM: u32 = 0x0003;
    /// Accessible only by type and sub-types
    pub const FAMILY: u32 = 0x0004;
    /// Accessibly by sub-types anywhere, plus anyone in assembly
    pub const FAM_OR_ASSEM: u32 = 0x0005;
    /// Accessibly by anyone who has visibility to this scope
    pub const PUBLIC: u32 = 0x0006;
    /// Defined on type, else per instance
    pub const STATIC: u32 = 0x0010;
    /// Method cannot be overridden
    pub const FINAL: u32 = 0x0020;
    /// Method is virtual
    pub const VIRTUAL: u32 = 0x0040;
    /// Method hides by name+sig, else just by name
    pub const HIDE_BY_SIG: u32 = 0x0080;
    /// Vtable layout bit
    pub const VTABLE_LAYOUT_MASK: u32 = 0x0100;
    /// Method reuses existing slot in vtable
    pub const REUSE_SLOT: u32 = 0x0000;
    /// Method always gets a new slot in the vtable
    pub const NEW_SLOT: u32 = 0x0100;
    /// Method does not provide an implementation
    pub const ABSTRACT: u32 = 0x0400;
    /// Method is special
    pub const SPECIAL_NAME: u32 = 0x0800;
    /// Implementation is forwarded through PInvoke
    pub const PINVOKE_IMPL: u32 = 0x2000;
}

#[allow(non_snake_case)]
/// All possible flags for `ParamAttributes`
pub mod ParamAttributes {
    /// Param is [In]
    pub const IN: u32 = 0x0001;
    /// Param is [Out]
    pub const OUT: u32 = 0x0002;
    /// Param is optional
    pub const OPTIONAL: u32 = 0x0010;
    /// Param has default value
    pub const HAS_DEFAULT: u32 = 0x1000;
    /// Param has `FieldMarshal`
    pub const HAS_FIELD_MARSHAL: u32 = 0x2000;
}

/// Slot value of a method definition that never received a vtable slot.
pub const METHOD_SLOT_UNASSIGNED: u16 = u16::MAX;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method access flags
    pub struct MethodAccessFlags: u32 {
        /// Member not referenceable
        const COMPILER_CONTROLLED = 0x0000;
        /// Accessible only by the parent type
        const PRIVATE = 0x0001;
        /// Accessible by sub-types only in this Assembly
        const FAM_AND_ASSEM = 0x0002;
        /// Accessibly by anyone in the Assembly
        const ASSEM = 0x0003;
        /// Accessible only by type and sub-types
        const FAMILY = 0x0004;
        /// Accessibly by sub-types anywhere, plus anyone in assembly
        const FAM_OR_ASSEM = 0x0005;
        /// Accessibly by anyone who has visibility to this scope
        const PUBLIC = 0x0006;
    }
}

impl MethodAccessFlags {
    /// Extract access flags from raw method attributes
    #[must_use]
    pub fn from_method_flags(flags: u32) -> Self {
        Self::from_bits_truncate(flags & MethodAttributes::MEMBER_ACCESS_MASK)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method vtable layout flags
    pub struct MethodVtableFlags: u32 {
        /// Method reuses existing slot in vtable
        const REUSE_SLOT = 0x0000;
        /// Method always gets a new slot in the vtable
        const NEW_SLOT = 0x0100;
    }
}

impl MethodVtableFlags {
    /// Extract vtable layout flags from raw method attributes
    #[must_use]
    pub fn from_method_flags(flags: u32) -> Self {
        Self::from_bits_truncate(flags & MethodAttributes::VTABLE_LAYOUT_MASK)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method modifiers and properties
    pub struct MethodModifiers: u32 {
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Method cannot be overridden
        const FINAL = 0x0020;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method hides by name+sig, else just by name
        const HIDE_BY_SIG = 0x0080;
        /// Method can only be overriden if also accessible
        const STRICT = 0x0200;
        /// Method does not provide an implementation
        const ABSTRACT = 0x0400;
        /// Method is special
        const SPECIAL_NAME = 0x0800;
        /// CLI provides 'special' behavior, dpending upon the name of the method
        const RTSPECIAL_NAME = 0x1000;
        /// Implementation is forwarded through PInvoke
        const PINVOKE_IMPL = 0x2000;
    }
}

impl MethodModifiers {
    /// Extract method modifiers from raw method attributes
    #[must_use]
    pub fn from_method_flags(flags: u32) -> Self {
        let modifiers =
            flags & !MethodAttributes::MEMBER_ACCESS_MASK & !MethodAttributes::VTABLE_LAYOUT_MASK;
        Self::from_bits_truncate(modifiers)
    }
}
