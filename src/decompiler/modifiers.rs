//! Flag decoding into C# visibility and modifier tokens.
//!
//! Each decoder is a pure function of the flag word it reads, which lets the method
//! decoder be memoized per method definition through [`ModifierCache`] without any
//! invalidation concerns.
//!
//! | Input                                    | Tokens                 |
//! |------------------------------------------|------------------------|
//! | type `abstract + sealed`                 | `static`               |
//! | method `virtual + newslot`               | `virtual`              |
//! | method `virtual + reuseslot`             | `override`             |
//! | method `abstract + reuseslot`            | `abstract override`    |
//! | method `final + virtual + reuseslot`     | `sealed override`      |

use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    decompiler::model::TypeCategory,
    metadata::flags::{
        FieldAttributes, MethodAccessFlags, MethodModifiers, MethodVtableFlags, TypeAttributes,
    },
};

/// Decoded header tokens of a type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeModifiers {
    /// Visibility token, e.g. `public` or `protected internal`
    pub visibility: &'static str,
    /// At most one of `static`, `abstract` or `sealed`
    pub modifier: Option<&'static str>,
    /// Declaration keyword
    pub category: TypeCategory,
}

/// Decode type flags together with the value type and enum bits of the definition.
#[must_use]
pub fn decode_type_modifiers(flags: u32, is_value_type: bool, is_enum: bool) -> TypeModifiers {
    let visibility = match flags & TypeAttributes::VISIBILITY_MASK {
        TypeAttributes::PUBLIC | TypeAttributes::NESTED_PUBLIC => "public",
        TypeAttributes::NESTED_PRIVATE => "private",
        TypeAttributes::NESTED_FAMILY => "protected",
        TypeAttributes::NESTED_FAM_OR_ASSEM => "protected internal",
        // NOT_PUBLIC, NESTED_ASSEMBLY, NESTED_FAM_AND_ASSEM
        _ => "internal",
    };

    let is_abstract = flags & TypeAttributes::ABSTRACT != 0;
    let is_sealed = flags & TypeAttributes::SEALED != 0;
    let is_interface = flags & TypeAttributes::INTERFACE != 0;

    let modifier = if is_abstract && is_sealed {
        Some("static")
    } else if !is_interface && is_abstract {
        Some("abstract")
    } else if !is_value_type && !is_enum && is_sealed {
        Some("sealed")
    } else {
        None
    };

    let category = if is_interface {
        TypeCategory::Interface
    } else if is_enum {
        TypeCategory::Enum
    } else if is_value_type {
        TypeCategory::Struct
    } else {
        TypeCategory::Class
    };

    TypeModifiers {
        visibility,
        modifier,
        category,
    }
}

/// Decoded tokens of a field declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldModifiers {
    /// Access token, absent for compiler controlled fields
    pub visibility: Option<&'static str>,
    /// `const`, or any of `static` and `readonly`
    pub storage: Vec<&'static str>,
    /// The field is static (never set for constants)
    pub is_static: bool,
    /// The field is a compile time constant
    pub is_const: bool,
}

impl FieldModifiers {
    /// All tokens in declaration order
    #[must_use]
    pub fn tokens(&self) -> Vec<&'static str> {
        self.visibility
            .into_iter()
            .chain(self.storage.iter().copied())
            .collect()
    }
}

/// Decode the field attributes carried by a field's type reference.
#[must_use]
pub fn decode_field_modifiers(attrs: u32) -> FieldModifiers {
    let visibility = match attrs & FieldAttributes::FIELD_ACCESS_MASK {
        FieldAttributes::PRIVATE => Some("private"),
        FieldAttributes::PUBLIC => Some("public"),
        FieldAttributes::FAMILY => Some("protected"),
        FieldAttributes::ASSEMBLY | FieldAttributes::FAM_AND_ASSEM => Some("internal"),
        FieldAttributes::FAM_OR_ASSEM => Some("protected internal"),
        _ => None,
    };

    let mut storage = Vec::new();
    let mut is_static = false;
    let is_const = attrs & FieldAttributes::LITERAL != 0;
    if is_const {
        storage.push("const");
    } else {
        if attrs & FieldAttributes::STATIC != 0 {
            is_static = true;
            storage.push("static");
        }
        if attrs & FieldAttributes::INIT_ONLY != 0 {
            storage.push("readonly");
        }
    }

    FieldModifiers {
        visibility,
        storage,
        is_static,
        is_const,
    }
}

/// Decode method flags into modifier tokens.
#[must_use]
pub fn decode_method_modifiers(flags: u32) -> Vec<&'static str> {
    let mut tokens = Vec::with_capacity(4);

    let access = MethodAccessFlags::from_method_flags(flags);
    if access == MethodAccessFlags::PRIVATE {
        tokens.push("private");
    } else if access == MethodAccessFlags::PUBLIC {
        tokens.push("public");
    } else if access == MethodAccessFlags::FAMILY {
        tokens.push("protected");
    } else if access == MethodAccessFlags::ASSEM || access == MethodAccessFlags::FAM_AND_ASSEM {
        tokens.push("internal");
    } else if access == MethodAccessFlags::FAM_OR_ASSEM {
        tokens.push("protected internal");
    }

    let modifiers = MethodModifiers::from_method_flags(flags);
    let reuse_slot = MethodVtableFlags::from_method_flags(flags) == MethodVtableFlags::REUSE_SLOT;

    if modifiers.contains(MethodModifiers::STATIC) {
        tokens.push("static");
    }

    // A final method never falls through to the virtual check
    if modifiers.contains(MethodModifiers::ABSTRACT) {
        tokens.push("abstract");
        if reuse_slot {
            tokens.push("override");
        }
    } else if modifiers.contains(MethodModifiers::FINAL) {
        if reuse_slot {
            tokens.push("sealed override");
        }
    } else if modifiers.contains(MethodModifiers::VIRTUAL) {
        tokens.push(if reuse_slot { "override" } else { "virtual" });
    }

    if modifiers.contains(MethodModifiers::PINVOKE_IMPL) {
        tokens.push("extern");
    }

    tokens
}

/// Memo of decoded method modifiers keyed by method definition index.
///
/// Shared across images and safe to use from several assembly workers at once.
#[derive(Debug, Default)]
pub struct ModifierCache {
    entries: DashMap<usize, Arc<[&'static str]>>,
}

impl ModifierCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Modifier tokens of the method definition at `method_index`, decoding `flags` on
    /// first use.
    pub fn get_or_decode(&self, method_index: usize, flags: u32) -> Arc<[&'static str]> {
        self.entries
            .entry(method_index)
            .or_insert_with(|| decode_method_modifiers(flags).into())
            .value()
            .clone()
    }

    /// Number of memoized definitions
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was memoized yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
