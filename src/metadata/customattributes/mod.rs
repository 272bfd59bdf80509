//! Custom attribute decoding for IL2CPP metadata.
//!
//! IL2CPP stored custom attributes in two incompatible ways over time:
//!
//! - **Generator functions** (before version 29) - each attribute range lists the attribute
//!   types and shares one compiled generator function that constructs them at runtime. Only
//!   the type names and the generator's address can be recovered.
//! - **Attribute data** (version 29 and later) - each range points at a binary record of the
//!   constructor calls, including argument values, see [`CustomAttributeDataReader`].
//!
//! The scheme is selected once per run through [`decoder_for`], and the resulting
//! [`AttributeDecoder`] is consulted for every declaration. Both schemes produce one line
//! per attribute, each prefixed with the requested indentation:
//!
//! ```text
//! [Serializable] // RVA: 0x1A2B3C Offset: 0x1A1B3C VA: 0x1801A2B3C
//! [Tooltip("Movement speed")]
//! ```
//!
//! # Examples
//!
//! ```rust
//! use il2scope::metadata::{customattributes::decoder_for, version::MetadataVersion};
//!
//! assert!(decoder_for(MetadataVersion::new(20, 0)).is_none());
//! assert!(decoder_for(MetadataVersion::new(24, 1)).is_some());
//! ```

mod parser;
mod types;

pub use parser::CustomAttributeDataReader;
pub use types::*;

use std::fmt::Write;

use log::warn;

use crate::{
    metadata::{
        definitions::ImageDefinition, provider::MetadataProvider, version::MetadataVersion,
    },
    Result,
};

/// Strategy that renders the attribute range at `attribute_index`.
pub trait AttributeDecoder: Send + Sync {
    /// Render all attributes of a range, one indented line each.
    ///
    /// # Errors
    /// Returns an error if the range refers to metadata that does not exist.
    fn decode(
        &self,
        provider: &dyn MetadataProvider,
        attribute_index: usize,
        indent: &str,
    ) -> Result<String>;
}

/// Attribute types plus the address of their shared generator function.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeneratorAttributes;

impl AttributeDecoder for GeneratorAttributes {
    fn decode(
        &self,
        provider: &dyn MetadataProvider,
        attribute_index: usize,
        indent: &str,
    ) -> Result<String> {
        let generator = provider.address_triple(provider.attribute_generator(attribute_index));

        let mut lines = String::new();
        for type_index in provider.attribute_types(attribute_index)? {
            let _ = writeln!(
                lines,
                "{indent}[{}] // RVA: 0x{:X} Offset: 0x{:X} VA: 0x{:X}",
                provider.type_name_of(type_index, false, false)?,
                generator.rva,
                generator.offset,
                generator.va
            );
        }
        Ok(lines)
    }
}

/// Attributes decoded from the binary attribute data section.
///
/// Decoding never fails the surrounding declaration: the lines decoded before a malformed
/// record are kept and followed by a comment describing the failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataAttributes;

impl DataAttributes {
    fn decode_into(
        provider: &dyn MetadataProvider,
        attribute_index: usize,
        indent: &str,
        lines: &mut String,
    ) -> Result<()> {
        let start = provider.attribute_data_offset(attribute_index)?;
        let end = provider.attribute_data_offset(attribute_index + 1)?;
        let data = provider.attribute_data(start, end)?;
        if data.is_empty() {
            return Ok(());
        }

        let mut reader = CustomAttributeDataReader::new(provider, data)?;
        for _ in 0..reader.count() {
            let attribute = reader.read_attribute()?;
            let _ = writeln!(lines, "{indent}{attribute}");
        }
        Ok(())
    }
}

impl AttributeDecoder for DataAttributes {
    fn decode(
        &self,
        provider: &dyn MetadataProvider,
        attribute_index: usize,
        indent: &str,
    ) -> Result<String> {
        let mut lines = String::new();
        if let Err(error) = Self::decode_into(provider, attribute_index, indent, &mut lines) {
            warn!("Custom attribute data {attribute_index} could not be decoded - {error}");
            let _ = writeln!(lines, "{indent}/* Undecodable custom attribute data: {error} */");
        }
        Ok(lines)
    }
}

/// Select the attribute scheme of a metadata version, `None` if the version predates
/// custom attribute support.
#[must_use]
pub fn decoder_for(version: MetadataVersion) -> Option<Box<dyn AttributeDecoder>> {
    if !version.supports_attributes() {
        None
    } else if version.uses_attribute_data() {
        Some(Box::new(DataAttributes))
    } else {
        Some(Box::new(GeneratorAttributes))
    }
}

/// Render the custom attributes of one declaration.
///
/// Returns an empty string when no decoder is active or the declaration carries no
/// attributes.
///
/// # Errors
/// Propagates decoder errors, see [`AttributeDecoder::decode`].
pub fn custom_attributes(
    provider: &dyn MetadataProvider,
    decoder: Option<&dyn AttributeDecoder>,
    image: &ImageDefinition,
    custom_attribute_index: i32,
    token: u32,
    indent: &str,
) -> Result<String> {
    let Some(decoder) = decoder else {
        return Ok(String::new());
    };

    match provider.custom_attribute_index(image, custom_attribute_index, token) {
        Some(attribute_index) => decoder.decode(provider, attribute_index, indent),
        None => Ok(String::new()),
    }
}
