//! Custom attribute value types and element type tags.
//!
//! Decoded attribute records render themselves in C# attribute syntax through
//! [`std::fmt::Display`]:
//!
//! ```text
//! [Header("General")]
//! [Range(0, 1.5)]
//! [DllImport("user32", EntryPoint = "MessageBoxW")]
//! [SerializeField]
//! ```

use std::fmt;

use crate::decompiler::literals::{char_literal, quote_string};

/// A decoded custom attribute: its type name and argument values.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAttributeValue {
    /// Attribute type name without the `Attribute` suffix
    pub type_name: String,
    /// Constructor arguments in declaration order
    pub fixed_args: Vec<CustomAttributeArgument>,
    /// Field assignments followed by property assignments
    pub named_args: Vec<CustomAttributeNamedArgument>,
}

impl fmt::Display for CustomAttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.type_name)?;
        if !self.fixed_args.is_empty() || !self.named_args.is_empty() {
            write!(f, "(")?;
            let mut first = true;
            for arg in &self.fixed_args {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
                first = false;
            }
            for named in &self.named_args {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{} = {}", named.name, named.value)?;
                first = false;
            }
            write!(f, ")")?;
        }
        write!(f, "]")
    }
}

/// A field or property assignment of a custom attribute
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAttributeNamedArgument {
    /// Name of the field or property
    pub name: String,
    /// Assigned value
    pub value: CustomAttributeArgument,
}

/// A single custom attribute argument value
#[derive(Debug, Clone, PartialEq)]
pub enum CustomAttributeArgument {
    /// `null` string, array or type
    Null,
    /// Boolean value
    Bool(bool),
    /// UTF-16 code unit
    Char(u16),
    /// Signed 8-bit integer
    I1(i8),
    /// Unsigned 8-bit integer
    U1(u8),
    /// Signed 16-bit integer
    I2(i16),
    /// Unsigned 16-bit integer
    U2(u16),
    /// Signed 32-bit integer
    I4(i32),
    /// Unsigned 32-bit integer
    U4(u32),
    /// Signed 64-bit integer
    I8(i64),
    /// Unsigned 64-bit integer
    U8(u64),
    /// 32-bit floating point
    R4(f32),
    /// 64-bit floating point
    R8(f64),
    /// UTF-8 string
    String(String),
    /// Type reference, as its printable name
    Type(String),
    /// Single dimensional array
    Array(Vec<CustomAttributeArgument>),
    /// Enum value (enum type name + underlying value)
    Enum(String, Box<CustomAttributeArgument>),
}

impl fmt::Display for CustomAttributeArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomAttributeArgument::Null => write!(f, "null"),
            CustomAttributeArgument::Bool(value) => write!(f, "{value}"),
            CustomAttributeArgument::Char(value) => write!(f, "{}", char_literal(*value)),
            CustomAttributeArgument::I1(value) => write!(f, "{value}"),
            CustomAttributeArgument::U1(value) => write!(f, "{value}"),
            CustomAttributeArgument::I2(value) => write!(f, "{value}"),
            CustomAttributeArgument::U2(value) => write!(f, "{value}"),
            CustomAttributeArgument::I4(value) => write!(f, "{value}"),
            CustomAttributeArgument::U4(value) => write!(f, "{value}"),
            CustomAttributeArgument::I8(value) => write!(f, "{value}"),
            CustomAttributeArgument::U8(value) => write!(f, "{value}"),
            CustomAttributeArgument::R4(value) => write!(f, "{value}"),
            CustomAttributeArgument::R8(value) => write!(f, "{value}"),
            CustomAttributeArgument::String(value) => write!(f, "{}", quote_string(value)),
            CustomAttributeArgument::Type(name) => write!(f, "typeof({name})"),
            CustomAttributeArgument::Array(elements) => {
                write!(f, "new[] {{ ")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, " }}")
            }
            CustomAttributeArgument::Enum(type_name, value) => write!(f, "({type_name}){value}"),
        }
    }
}

/// Runtime element type tags used by the attribute data encoding
#[allow(non_snake_case, missing_docs)]
pub mod ELEMENT_TYPE {
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0A;
    pub const U8: u8 = 0x0B;
    pub const R4: u8 = 0x0C;
    pub const R8: u8 = 0x0D;
    pub const STRING: u8 = 0x0E;
    pub const OBJECT: u8 = 0x1C;
    pub const SZARRAY: u8 = 0x1D;
    pub const ENUM: u8 = 0x55;
    pub const IL2CPP_TYPE_INDEX: u8 = 0xFF;
}
