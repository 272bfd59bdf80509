//! Custom attribute data reader for metadata version 29 and later.
//!
//! From version 29 on, IL2CPP no longer emits generator functions for custom attributes.
//! Each attribute range instead points at a slice of the attribute data section that
//! encodes the constructor calls directly:
//!
//! ```text
//! count              compressed uint
//! ctor[count]        i32 LE, method definition index of each constructor
//! record[count]:
//!   argument count   compressed uint
//!   field count      compressed uint
//!   property count   compressed uint
//!   arguments        value*
//!   fields           (value, member)*
//!   properties       (value, member)*
//! ```
//!
//! A value is an encoded type tag followed by its payload. The enum tag `0x55` is followed
//! by the compressed type index of the enum, whose underlying element type replaces the
//! tag. A member is a compressed int index into the fields or properties of the
//! attribute type; a negative index `-(i + 1)` is followed by the compressed uint type
//! definition index that declares the member.
//!
//! Constructors and records are consumed through two independent cursors, so records
//! must be read in order.

use crate::{
    file::parser::Parser,
    metadata::{
        customattributes::types::{
            CustomAttributeArgument, CustomAttributeNamedArgument, CustomAttributeValue,
            ELEMENT_TYPE,
        },
        definitions::TypeDefinition,
        provider::MetadataProvider,
    },
    Result,
};

/// Maximum nesting depth of boxed and array values
const MAX_NESTING_DEPTH: usize = 64;

/// Stateful reader over one attribute data range.
pub struct CustomAttributeDataReader<'a> {
    parser: Parser<'a>,
    provider: &'a dyn MetadataProvider,
    count: u32,
    ctor_position: usize,
    data_position: usize,
}

impl<'a> CustomAttributeDataReader<'a> {
    /// Open a reader over `data`, reading the record count and locating the first record.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the header is truncated, or
    /// [`crate::Error::Malformed`] if the constructor table exceeds the buffer.
    pub fn new(provider: &'a dyn MetadataProvider, data: &'a [u8]) -> Result<Self> {
        let mut parser = Parser::new(data);
        let count = parser.read_compressed_uint()?;
        let ctor_position = parser.pos();
        let data_position = (count as usize)
            .checked_mul(4)
            .and_then(|size| size.checked_add(ctor_position))
            .filter(|&end| end <= data.len())
            .ok_or_else(|| {
                malformed_error!(
                    "Attribute constructor table exceeds data - {} entries in {} bytes",
                    count,
                    data.len()
                )
            })?;

        Ok(CustomAttributeDataReader {
            parser,
            provider,
            count,
            ctor_position,
            data_position,
        })
    }

    /// Number of attribute records in the range
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Decode the next attribute record.
    ///
    /// # Errors
    /// Returns an error if the record is truncated, uses an unknown type tag, or refers
    /// to a definition the provider does not know.
    pub fn read_attribute(&mut self) -> Result<CustomAttributeValue> {
        self.parser.seek(self.ctor_position)?;
        let ctor_index = self.parser.read_le::<i32>()?;
        self.ctor_position = self.parser.pos();

        let ctor_index = usize::try_from(ctor_index)
            .map_err(|_| malformed_error!("Invalid attribute constructor - {}", ctor_index))?;
        let ctor = self.provider.method_def(ctor_index)?;
        let attribute_type = self.provider.type_def(ctor.declaring_type as usize)?;

        self.parser.seek(self.data_position)?;
        let argument_count = self.parser.read_compressed_uint()?;
        let field_count = self.parser.read_compressed_uint()?;
        let property_count = self.parser.read_compressed_uint()?;

        let mut fixed_args = Vec::new();
        for _ in 0..argument_count {
            fixed_args.push(self.read_value(0)?);
        }

        let mut named_args = Vec::new();
        for _ in 0..field_count {
            let value = self.read_value(0)?;
            let (declaring, member) = self.read_member(attribute_type)?;
            let field = self
                .provider
                .field_def(member_index(declaring.field_start, member)?)?;
            named_args.push(CustomAttributeNamedArgument {
                name: self.provider.string_at(field.name_index)?.to_string(),
                value,
            });
        }
        for _ in 0..property_count {
            let value = self.read_value(0)?;
            let (declaring, member) = self.read_member(attribute_type)?;
            let property = self
                .provider
                .property_def(member_index(declaring.property_start, member)?)?;
            named_args.push(CustomAttributeNamedArgument {
                name: self.provider.string_at(property.name_index)?.to_string(),
                value,
            });
        }
        self.data_position = self.parser.pos();

        Ok(CustomAttributeValue {
            type_name: self
                .provider
                .string_at(attribute_type.name_index)?
                .replace("Attribute", ""),
            fixed_args,
            named_args,
        })
    }

    fn read_member(
        &mut self,
        attribute_type: &'a TypeDefinition,
    ) -> Result<(&'a TypeDefinition, usize)> {
        let member = self.parser.read_compressed_int()?;
        if member >= 0 {
            return Ok((attribute_type, member as usize));
        }

        let member = -(i64::from(member) + 1);
        let declaring = self.parser.read_compressed_uint()?;
        Ok((
            self.provider.type_def(declaring as usize)?,
            usize::try_from(member).map_err(|_| out_of_bounds_error!())?,
        ))
    }

    fn read_encoded_type(&mut self) -> Result<(u8, Option<String>)> {
        let tag = self.parser.read_le::<u8>()?;
        if tag != ELEMENT_TYPE::ENUM {
            return Ok((tag, None));
        }

        let enum_type = self.parser.read_compressed_int()?;
        let element = self.provider.enum_element_type(enum_type)?;
        let name = self.provider.type_name_of(enum_type, false, false)?;
        Ok((element, Some(name)))
    }

    fn read_value(&mut self, depth: usize) -> Result<CustomAttributeArgument> {
        let (tag, enum_type) = self.read_encoded_type()?;
        self.read_tagged_value(tag, enum_type, depth)
    }

    fn read_tagged_value(
        &mut self,
        tag: u8,
        enum_type: Option<String>,
        depth: usize,
    ) -> Result<CustomAttributeArgument> {
        if depth >= MAX_NESTING_DEPTH {
            return Err(malformed_error!(
                "Attribute value nesting exceeds {} levels",
                MAX_NESTING_DEPTH
            ));
        }

        let value = self.read_payload(tag, depth)?;
        Ok(match enum_type {
            Some(type_name) => CustomAttributeArgument::Enum(type_name, Box::new(value)),
            None => value,
        })
    }

    fn read_payload(&mut self, tag: u8, depth: usize) -> Result<CustomAttributeArgument> {
        Ok(match tag {
            ELEMENT_TYPE::BOOLEAN => {
                CustomAttributeArgument::Bool(self.parser.read_le::<u8>()? != 0)
            }
            ELEMENT_TYPE::CHAR => CustomAttributeArgument::Char(self.parser.read_le::<u16>()?),
            ELEMENT_TYPE::I1 => CustomAttributeArgument::I1(self.parser.read_le::<i8>()?),
            ELEMENT_TYPE::U1 => CustomAttributeArgument::U1(self.parser.read_le::<u8>()?),
            ELEMENT_TYPE::I2 => CustomAttributeArgument::I2(self.parser.read_le::<i16>()?),
            ELEMENT_TYPE::U2 => CustomAttributeArgument::U2(self.parser.read_le::<u16>()?),
            ELEMENT_TYPE::I4 => CustomAttributeArgument::I4(self.parser.read_compressed_int()?),
            ELEMENT_TYPE::U4 => CustomAttributeArgument::U4(self.parser.read_compressed_uint()?),
            ELEMENT_TYPE::I8 => CustomAttributeArgument::I8(self.parser.read_le::<i64>()?),
            ELEMENT_TYPE::U8 => CustomAttributeArgument::U8(self.parser.read_le::<u64>()?),
            ELEMENT_TYPE::R4 => CustomAttributeArgument::R4(self.parser.read_le::<f32>()?),
            ELEMENT_TYPE::R8 => CustomAttributeArgument::R8(self.parser.read_le::<f64>()?),
            ELEMENT_TYPE::STRING => {
                let length = self.parser.read_compressed_int()?;
                if length == -1 {
                    CustomAttributeArgument::Null
                } else {
                    let length = usize::try_from(length)
                        .map_err(|_| malformed_error!("Invalid string length - {}", length))?;
                    CustomAttributeArgument::String(self.parser.read_string_utf8_len(length)?)
                }
            }
            ELEMENT_TYPE::IL2CPP_TYPE_INDEX => {
                let type_index = self.parser.read_compressed_int()?;
                if type_index == -1 {
                    CustomAttributeArgument::Null
                } else {
                    CustomAttributeArgument::Type(
                        self.provider.type_name_of(type_index, false, false)?,
                    )
                }
            }
            ELEMENT_TYPE::OBJECT => {
                let (tag, enum_type) = self.read_encoded_type()?;
                self.read_tagged_value(tag, enum_type, depth + 1)?
            }
            ELEMENT_TYPE::SZARRAY => {
                let length = self.parser.read_compressed_int()?;
                if length == -1 {
                    CustomAttributeArgument::Null
                } else {
                    let length = usize::try_from(length)
                        .map_err(|_| malformed_error!("Invalid array length - {}", length))?;
                    let (element_tag, element_enum) = self.read_encoded_type()?;
                    let different_types = self.parser.read_le::<u8>()? == 1;

                    let mut elements = Vec::with_capacity(length.min(self.parser.len()));
                    for _ in 0..length {
                        let element = if different_types {
                            self.read_value(depth + 1)?
                        } else {
                            self.read_tagged_value(element_tag, element_enum.clone(), depth + 1)?
                        };
                        elements.push(element);
                    }
                    CustomAttributeArgument::Array(elements)
                }
            }
            _ => {
                return Err(malformed_error!(
                    "Unsupported attribute value type - 0x{:02X}",
                    tag
                ))
            }
        })
    }
}

fn member_index(start: i32, member: usize) -> Result<usize> {
    usize::try_from(start)
        .ok()
        .and_then(|start| start.checked_add(member))
        .ok_or_else(|| malformed_error!("Invalid named argument member - {} + {}", start, member))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::SnapshotBuilder;

    /// `ObsoleteAttribute` at type index 0 (ctor method 0, two fields, one property),
    /// enum `Mode` at type index 1 backed by i4.
    fn provider() -> crate::MetadataSnapshot {
        let mut builder = SnapshotBuilder::new();
        let attribute_ref = builder.add_type_ref("ObsoleteAttribute");
        builder.add_enum_type_ref("Mode", ELEMENT_TYPE::I4);
        let string_ref = builder.add_type_ref("string");

        let attribute = builder.add_type("System", "ObsoleteAttribute");
        builder.add_method(attribute, ".ctor", 0x1886, attribute_ref);
        builder.add_field(attribute, "Message", string_ref);
        builder.add_field(attribute, "IsError", string_ref);
        builder.add_property(attribute, "DiagnosticId", 0, -1);
        builder.build()
    }

    #[test]
    fn test_read_empty_range() {
        let provider = provider();
        let reader = CustomAttributeDataReader::new(&provider, &[0x00]).unwrap();
        assert_eq!(reader.count(), 0);
    }

    #[test]
    fn test_read_attribute_without_arguments() {
        let provider = provider();
        let data = [
            0x01, // count
            0x00, 0x00, 0x00, 0x00, // ctor method 0
            0x00, 0x00, 0x00, // no arguments, fields or properties
        ];
        let mut reader = CustomAttributeDataReader::new(&provider, &data).unwrap();
        assert_eq!(reader.count(), 1);
        assert_eq!(reader.read_attribute().unwrap().to_string(), "[Obsolete]");
    }

    #[test]
    fn test_read_arguments_and_named_values() {
        let provider = provider();
        let data = [
            0x01, // count
            0x00, 0x00, 0x00, 0x00, // ctor method 0
            0x02, 0x01, 0x01, // two arguments, one field, one property
            0x0E, 0x04, b'h', b'i', // string "hi"
            0x55, 0x02, 0x0A, // enum Mode (type 1), i4 zig-zag 5
            0x02, 0x01, // bool true
            0x02, // field 1 (IsError)
            0x0E, 0x01, // string null
            0x00, // property 0 (DiagnosticId)
        ];
        let mut reader = CustomAttributeDataReader::new(&provider, &data).unwrap();
        assert_eq!(
            reader.read_attribute().unwrap().to_string(),
            "[Obsolete(\"hi\", (Mode)5, IsError = true, DiagnosticId = null)]"
        );
    }

    #[test]
    fn test_read_arrays() {
        let provider = provider();
        let data = [
            0x01, // count
            0x00, 0x00, 0x00, 0x00, // ctor method 0
            0x02, 0x00, 0x00, // two arguments
            0x1D, 0x06, 0x08, 0x00, 0x02, 0x04, 0x06, // i4[] { 1, 2, 3 }
            0x1D, 0x04, 0x1C, 0x01, // object[] with per-element tags
            0x0E, 0x02, b'a', // "a"
            0xFF, 0x00, // typeof(ObsoleteAttribute)
        ];
        let mut reader = CustomAttributeDataReader::new(&provider, &data).unwrap();
        assert_eq!(
            reader.read_attribute().unwrap().to_string(),
            "[Obsolete(new[] { 1, 2, 3 }, new[] { \"a\", typeof(ObsoleteAttribute) })]"
        );
    }

    #[test]
    fn test_read_two_records() {
        let provider = provider();
        let data = [
            0x02, // count
            0x00, 0x00, 0x00, 0x00, // ctor method 0
            0x00, 0x00, 0x00, 0x00, // ctor method 0
            0x01, 0x00, 0x00, 0x08, 0x0E, // (7)
            0x01, 0x00, 0x00, 0x03, 0x41, 0x00, // ('A')
        ];
        let mut reader = CustomAttributeDataReader::new(&provider, &data).unwrap();
        assert_eq!(reader.read_attribute().unwrap().to_string(), "[Obsolete(7)]");
        assert_eq!(
            reader.read_attribute().unwrap().to_string(),
            "[Obsolete('\\x41')]"
        );
    }

    #[test]
    fn test_truncated_constructor_table() {
        let provider = provider();
        let result = CustomAttributeDataReader::new(&provider, &[0x02, 0x00, 0x00]);
        assert!(result.is_err());
        assert!(result
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default()
            .contains("Attribute constructor table exceeds data"));
    }

    #[test]
    fn test_unknown_tag() {
        let provider = provider();
        let data = [
            0x01, 0x00, 0x00, 0x00, 0x00, // one record, ctor 0
            0x01, 0x00, 0x00, 0x42, // unknown tag 0x42
        ];
        let mut reader = CustomAttributeDataReader::new(&provider, &data).unwrap();
        let result = reader.read_attribute();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unsupported attribute value type - 0x42"));
    }
}
