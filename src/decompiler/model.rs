//! The declaration tree.
//!
//! The assembler turns the metadata of one image into an [`Image`] tree; both renderers
//! consume that same tree. Entities are plain data, never mutated once assembled, and
//! strictly owned by their parent.

use std::sync::Arc;

use serde::Serialize;
use strum::{Display, EnumIter, IntoStaticStr};

use crate::{
    decompiler::literals::{DefaultLiteral, ParamDirection},
    metadata::provider::AddressTriple,
    Error,
};

/// Declaration keyword of a type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr, Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TypeCategory {
    /// Reference type
    Class,
    /// Value type
    Struct,
    /// Interface
    Interface,
    /// Enumeration
    Enum,
}

/// One assembled compilation unit.
#[derive(Debug, Clone)]
pub struct Image {
    /// Position of the image in the metadata
    pub index: usize,
    /// Image name, e.g. `Assembly-CSharp.dll`
    pub name: String,
    /// First type definition index of the image
    pub type_start: u32,
    /// Type declarations in metadata order
    pub types: Vec<TypeDeclaration>,
}

/// An image whose assembly failed.
#[derive(Debug)]
pub struct ImageFailure {
    /// Position of the image in the metadata
    pub index: usize,
    /// Image name, empty if it could not be resolved
    pub name: String,
    /// First type definition index of the image
    pub type_start: u32,
    /// What went wrong
    pub error: Error,
}

/// Result of assembling one image.
#[derive(Debug)]
pub enum ImageOutcome {
    /// The complete declaration tree of the image
    Assembled(Image),
    /// Diagnostic for an image that could not be assembled
    Failed(ImageFailure),
}

impl ImageOutcome {
    /// Position of the image in the metadata
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            ImageOutcome::Assembled(image) => image.index,
            ImageOutcome::Failed(failure) => failure.index,
        }
    }

    /// Image name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            ImageOutcome::Assembled(image) => &image.name,
            ImageOutcome::Failed(failure) => &failure.name,
        }
    }

    /// First type definition index of the image
    #[must_use]
    pub fn type_start(&self) -> u32 {
        match self {
            ImageOutcome::Assembled(image) => image.type_start,
            ImageOutcome::Failed(failure) => failure.type_start,
        }
    }

    /// Returns true if the image could not be assembled
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, ImageOutcome::Failed(_))
    }
}

/// A type definition with its members.
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    /// Global type definition index
    pub index: usize,
    /// Namespace, empty for the global namespace
    pub namespace: String,
    /// Declared name including a generic parameter suffix
    pub name: String,
    /// Declaration keyword
    pub category: TypeCategory,
    /// Visibility token
    pub visibility: &'static str,
    /// `static`, `abstract` or `sealed`
    pub modifier: Option<&'static str>,
    /// Parent (when shown) followed by the implemented interfaces
    pub extends: Vec<String>,
    /// Custom attribute lines
    pub attributes: String,
    /// Carries the legacy serializable flag
    pub serializable: bool,
    /// Fields in index order
    pub fields: Vec<Field>,
    /// Properties in index order
    pub properties: Vec<Property>,
    /// Methods in index order
    pub methods: Vec<Method>,
}

impl TypeDeclaration {
    /// Visibility followed by the modifier, as listed in the JSON tree
    #[must_use]
    pub fn visibility_tokens(&self) -> Vec<&'static str> {
        std::iter::once(self.visibility).chain(self.modifier).collect()
    }
}

/// A field declaration.
#[derive(Debug, Clone)]
pub struct Field {
    /// Custom attribute lines
    pub attributes: String,
    /// Access and storage tokens
    pub modifiers: Vec<&'static str>,
    /// Compile time constant
    pub is_const: bool,
    /// Field type name
    pub type_name: String,
    /// Field name
    pub name: String,
    /// Literal default value
    pub default: Option<DefaultLiteral>,
    /// Byte offset, present when offsets are dumped and the field is not const
    pub offset: Option<i32>,
}

/// One accessor of a property.
#[derive(Debug, Clone)]
pub struct PropertyAccessor {
    /// Global method definition index of the accessor
    pub method_index: usize,
    /// Modifier tokens of the accessor method
    pub modifiers: Arc<[&'static str]>,
    /// Property type as seen by this accessor
    pub type_name: String,
}

/// A property declaration.
#[derive(Debug, Clone)]
pub struct Property {
    /// Custom attribute lines
    pub attributes: String,
    /// Property name
    pub name: String,
    /// Getter
    pub get: Option<PropertyAccessor>,
    /// Setter
    pub set: Option<PropertyAccessor>,
}

impl Property {
    /// The accessor that defines the exposed type and modifiers, the getter if present
    #[must_use]
    pub fn primary(&self) -> Option<&PropertyAccessor> {
        self.get.as_ref().or(self.set.as_ref())
    }

    /// `get` and/or `set`
    #[must_use]
    pub fn accessors(&self) -> Vec<&'static str> {
        let mut accessors = Vec::with_capacity(2);
        if self.get.is_some() {
            accessors.push("get");
        }
        if self.set.is_some() {
            accessors.push("set");
        }
        accessors
    }
}

/// A method declaration.
#[derive(Debug, Clone)]
pub struct Method {
    /// Global method definition index
    pub index: usize,
    /// Custom attribute lines
    pub attributes: String,
    /// Modifier tokens
    pub modifiers: Arc<[&'static str]>,
    /// The return value is by-ref
    pub returns_by_ref: bool,
    /// Return type name
    pub return_type: String,
    /// Name including a generic parameter suffix
    pub name: String,
    /// Parameters in declaration order
    pub parameters: Vec<Parameter>,
    /// The method has no body
    pub is_abstract: bool,
    /// Resolved code location of a concrete method
    pub address: Option<AddressTriple>,
    /// Assigned vtable slot
    pub slot: Option<u16>,
    /// Known specializations grouped by shared code pointer
    pub generic_groups: Vec<GenericGroup>,
}

/// A method parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Passing direction
    pub direction: ParamDirection,
    /// Parameter type name
    pub type_name: String,
    /// Parameter name
    pub name: String,
    /// Literal default value
    pub default: Option<DefaultLiteral>,
}

/// Specializations of a generic method that share one code pointer.
#[derive(Debug, Clone)]
pub struct GenericGroup {
    /// Shared code pointer, `0` if unresolved
    pub pointer: u64,
    /// Resolved location, absent for unresolved pointers
    pub address: Option<AddressTriple>,
    /// Specializations in source order
    pub instances: Vec<GenericInstantiation>,
}

/// One concrete specialization of a generic method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericInstantiation {
    /// Concrete declaring type name
    pub type_name: String,
    /// Concrete method name
    pub method_name: String,
}
