//! Literal formatting for default values and attribute arguments.
//!
//! Literals are rendered in C# source syntax. Strings are double-quoted with the
//! control and quote characters escaped, characters are printed as `'\x{hex}'`, and
//! default values the provider could not decode are replaced by a comment carrying
//! their raw metadata offset so that "present but unreadable" stays distinguishable
//! from "absent".

use strum::{Display, IntoStaticStr};

use crate::metadata::{definitions::TypeReference, flags::ParamAttributes, provider::DefaultValue};

/// Escape a string for use inside a C# string or character literal.
///
/// # Examples
///
/// ```rust
/// use il2scope::decompiler::literals::escape_string;
///
/// assert_eq!(escape_string("He said \"hi\""), "He said \\\"hi\\\"");
/// assert_eq!(escape_string("a\tb"), "a\\tb");
/// ```
#[must_use]
pub fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\u{0C}' => escaped.push_str("\\f"),
            '\u{08}' => escaped.push_str("\\b"),
            '\\' => escaped.push_str("\\\\"),
            '\0' => escaped.push_str("\\0"),
            '\u{0085}' => escaped.push_str("\\u0085"),
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Quote and escape a string literal
#[must_use]
pub fn quote_string(value: &str) -> String {
    format!("\"{}\"", escape_string(value))
}

/// Render a UTF-16 code unit as a hex character literal, e.g. `'\xa'`
#[must_use]
pub fn char_literal(value: u16) -> String {
    format!("'\\x{value:x}'")
}

/// A default value as it appears in a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultLiteral {
    /// Decoded literal in source syntax
    Value(String),
    /// Undecodable value at the given raw metadata offset
    Unresolved(u32),
}

impl DefaultLiteral {
    /// Text that follows the member name in a declaration line,
    /// either ` = <literal>` or an offset comment.
    #[must_use]
    pub fn declaration_suffix(&self) -> String {
        match self {
            DefaultLiteral::Value(value) => format!(" = {value}"),
            DefaultLiteral::Unresolved(offset) => format!(" /*Metadata offset 0x{offset:X}*/"),
        }
    }

    /// Standalone form used by the JSON tree.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            DefaultLiteral::Value(value) => value.clone(),
            DefaultLiteral::Unresolved(offset) => format!("/*Metadata offset 0x{offset:X}*/"),
        }
    }
}

impl From<&DefaultValue> for DefaultLiteral {
    fn from(value: &DefaultValue) -> Self {
        match value {
            DefaultValue::String(s) => DefaultLiteral::Value(quote_string(s)),
            DefaultValue::Char(c) => DefaultLiteral::Value(char_literal(*c)),
            DefaultValue::Bool(b) => DefaultLiteral::Value(b.to_string()),
            DefaultValue::Int(i) => DefaultLiteral::Value(i.to_string()),
            DefaultValue::UInt(u) => DefaultLiteral::Value(u.to_string()),
            DefaultValue::Float(f) => DefaultLiteral::Value(f.to_string()),
            DefaultValue::Null => DefaultLiteral::Value("null".to_string()),
            DefaultValue::Unresolved(offset) => DefaultLiteral::Unresolved(*offset),
        }
    }
}

/// Passing direction of a method parameter.
///
/// By-ref parameters carry a C# keyword, by-value parameters may carry marshaling
/// markers instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum ParamDirection {
    /// Plain by-value parameter
    #[strum(serialize = "")]
    None,
    /// `ref`, by-ref with neither or both of in/out
    #[strum(serialize = "ref")]
    Ref,
    /// `out`, by-ref with only the out flag
    #[strum(serialize = "out")]
    Out,
    /// `in`, by-ref with only the in flag
    #[strum(serialize = "in")]
    In,
    /// By-value with the in marshaling flag
    #[strum(serialize = "[In]")]
    MarshalIn,
    /// By-value with the out marshaling flag
    #[strum(serialize = "[Out]")]
    MarshalOut,
    /// By-value with both marshaling flags
    #[strum(serialize = "[In] [Out]")]
    MarshalInOut,
}

impl ParamDirection {
    /// Derive the direction from a parameter's type reference
    #[must_use]
    pub fn from_type_reference(reference: &TypeReference) -> Self {
        let attrs = u32::from(reference.attrs);
        let is_in = attrs & ParamAttributes::IN != 0;
        let is_out = attrs & ParamAttributes::OUT != 0;

        match (reference.byref, is_in, is_out) {
            (true, false, true) => ParamDirection::Out,
            (true, true, false) => ParamDirection::In,
            (true, _, _) => ParamDirection::Ref,
            (false, true, true) => ParamDirection::MarshalInOut,
            (false, true, false) => ParamDirection::MarshalIn,
            (false, false, true) => ParamDirection::MarshalOut,
            (false, false, false) => ParamDirection::None,
        }
    }

    /// The keyword as written before the parameter type, empty for [`ParamDirection::None`]
    #[must_use]
    pub fn keyword(self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_quotes() {
        assert_eq!(quote_string("He said \"hi\""), "\"He said \\\"hi\\\"\"");
        assert_eq!(escape_string("it's"), "it\\'s");
    }

    #[test]
    fn test_escape_control_characters() {
        assert_eq!(
            escape_string("\r\n\t\u{0C}\u{08}\0\\"),
            "\\r\\n\\t\\f\\b\\0\\\\"
        );
        assert_eq!(
            escape_string("\u{0085}\u{2028}\u{2029}"),
            "\\u0085\\u2028\\u2029"
        );
        assert_eq!(escape_string("plain äöü"), "plain äöü");
    }

    #[test]
    fn test_char_literal() {
        assert_eq!(char_literal(10), "'\\xa'");
        assert_eq!(char_literal(0x41), "'\\x41'");
        assert_eq!(char_literal(0), "'\\x0'");
    }

    #[test]
    fn test_default_literals() {
        assert_eq!(
            DefaultLiteral::from(&DefaultValue::Int(-5)).declaration_suffix(),
            " = -5"
        );
        assert_eq!(
            DefaultLiteral::from(&DefaultValue::Null).declaration_suffix(),
            " = null"
        );
        assert_eq!(
            DefaultLiteral::from(&DefaultValue::Bool(true)).as_text(),
            "true"
        );
        assert_eq!(
            DefaultLiteral::from(&DefaultValue::Float(1.5)).as_text(),
            "1.5"
        );

        let unresolved = DefaultLiteral::from(&DefaultValue::Unresolved(0x40));
        assert_eq!(unresolved.declaration_suffix(), " /*Metadata offset 0x40*/");
        assert_eq!(unresolved.as_text(), "/*Metadata offset 0x40*/");
        assert_eq!(
            DefaultLiteral::Unresolved(0xbeef).as_text(),
            "/*Metadata offset 0xBEEF*/"
        );
    }

    #[test]
    fn test_param_direction() {
        let by_ref = |attrs: u32| TypeReference {
            attrs: attrs as u16,
            kind: 0,
            byref: true,
        };
        let by_value = |attrs: u32| TypeReference {
            attrs: attrs as u16,
            kind: 0,
            byref: false,
        };

        assert_eq!(
            ParamDirection::from_type_reference(&by_ref(ParamAttributes::OUT)),
            ParamDirection::Out
        );
        assert_eq!(
            ParamDirection::from_type_reference(&by_ref(ParamAttributes::IN)),
            ParamDirection::In
        );
        assert_eq!(
            ParamDirection::from_type_reference(&by_ref(0)),
            ParamDirection::Ref
        );
        assert_eq!(
            ParamDirection::from_type_reference(&by_ref(
                ParamAttributes::IN | ParamAttributes::OUT
            )),
            ParamDirection::Ref
        );
        assert_eq!(
            ParamDirection::from_type_reference(&by_value(
                ParamAttributes::IN | ParamAttributes::OUT
            ))
            .keyword(),
            "[In] [Out]"
        );
        assert_eq!(
            ParamDirection::from_type_reference(&by_value(ParamAttributes::OUT)).keyword(),
            "[Out]"
        );
        assert_eq!(ParamDirection::None.keyword(), "");
    }
}
