//! Low-level byte stream parser for IL2CPP metadata payloads.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a cursor-based binary data
//! parser used to decode the variable-length custom attribute data blobs stored in metadata
//! version 29 and later. It offers bounds-checked access to binary data and the compressed
//! integer encodings used by the IL2CPP runtime.
//!
//! # Key Components
//!
//! ## Navigation Methods
//! - [`crate::file::parser::Parser::seek`] - Move to specific position
//! - [`crate::file::parser::Parser::pos`] - Get current position
//!
//! ## Data Access Methods
//! - [`crate::file::parser::Parser::read_le`] - Read primitive types (little-endian)
//! - [`crate::file::parser::Parser::read_bytes`] - Borrow a run of raw bytes
//!
//! ## Metadata Reading Methods
//! - [`crate::file::parser::Parser::read_compressed_uint`] - Read compressed unsigned integers
//! - [`crate::file::parser::Parser::read_compressed_int`] - Read compressed signed integers
//! - [`crate::file::parser::Parser::read_string_utf8_len`] - Read a UTF-8 string of known length
//!
//! # Usage Examples
//!
//! ```rust
//! use il2scope::Parser;
//!
//! let data = [0x05, 0x80, 0x80, 0x2A, 0x00];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_compressed_uint()?, 5);
//! assert_eq!(parser.read_compressed_uint()?, 128);
//! assert_eq!(parser.read_le::<u16>()?, 0x2A);
//! # Ok::<(), il2scope::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, MetaIO},
    Result,
};

/// A binary data parser for reading IL2CPP metadata payloads.
///
/// `Parser` maintains an internal position cursor and provides bounds checking
/// to prevent buffer overruns when reading malformed or truncated data.
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the current position to the specified index.
    ///
    /// Seeking to exactly the end of the buffer is allowed, it leaves the parser with
    /// no data remaining.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if position is beyond the data length.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Read a type `T` from the current position in little-endian format.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    pub fn read_le<T: MetaIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Borrow the next `length` bytes and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `length` bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let Some(end) = self.position.checked_add(length) else {
            return Err(out_of_bounds_error!());
        };
        if end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Read a compressed unsigned integer in the IL2CPP runtime encoding.
    ///
    /// The encoding extends the ECMA-335 II.23.2 scheme with three single-byte
    /// markers:
    ///
    /// | Prefix       | Meaning                                |
    /// |--------------|----------------------------------------|
    /// | `0xxxxxxx`   | 7-bit value                            |
    /// | `10xxxxxx`   | 14-bit value, one more byte            |
    /// | `110xxxxx`   | 29-bit value, three more bytes         |
    /// | `0xF0`       | raw little-endian `u32` follows        |
    /// | `0xFE`       | `u32::MAX - 1`                         |
    /// | `0xFF`       | `u32::MAX`                             |
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length or
    /// [`crate::Error::Malformed`] for an unknown prefix.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use il2scope::Parser;
    ///
    /// let data = [0x7F, 0xF0, 0x78, 0x56, 0x34, 0x12, 0xFF];
    /// let mut parser = Parser::new(&data);
    /// assert_eq!(parser.read_compressed_uint()?, 127);
    /// assert_eq!(parser.read_compressed_uint()?, 0x1234_5678);
    /// assert_eq!(parser.read_compressed_uint()?, u32::MAX);
    /// # Ok::<(), il2scope::Error>(())
    /// ```
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        let first_byte = self.read_le::<u8>()?;

        // 1-byte encoding: 0xxxxxxx
        if (first_byte & 0x80) == 0 {
            return Ok(u32::from(first_byte));
        }

        // 2-byte encoding: 10xxxxxx xxxxxxxx
        if (first_byte & 0xC0) == 0x80 {
            let second_byte = self.read_le::<u8>()?;
            let value = ((u32::from(first_byte) & 0x3F) << 8) | u32::from(second_byte);
            return Ok(value);
        }

        // 4-byte encoding: 110xxxxx xxxxxxxx xxxxxxxx xxxxxxxx
        if (first_byte & 0xE0) == 0xC0 {
            let b1 = u32::from(self.read_le::<u8>()?);
            let b2 = u32::from(self.read_le::<u8>()?);
            let b3 = u32::from(self.read_le::<u8>()?);
            let value = ((u32::from(first_byte) & 0x1F) << 24) | (b1 << 16) | (b2 << 8) | b3;
            return Ok(value);
        }

        match first_byte {
            0xF0 => self.read_le::<u32>(),
            0xFE => Ok(u32::MAX - 1),
            0xFF => Ok(u32::MAX),
            _ => Err(malformed_error!(
                "Invalid compressed uint prefix - 0x{:02X}",
                first_byte
            )),
        }
    }

    /// Read a compressed signed integer in the IL2CPP runtime encoding.
    ///
    /// The value is stored zig-zag style on top of [`Parser::read_compressed_uint`]: the lowest
    /// bit carries the sign and the remaining bits the magnitude. The reserved encoding
    /// `u32::MAX` stands for `i32::MIN`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length or
    /// [`crate::Error::Malformed`] for invalid encoding.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use il2scope::Parser;
    ///
    /// // 10 is encoded as 20, -1 as 1
    /// let data = [20, 1];
    /// let mut parser = Parser::new(&data);
    /// assert_eq!(parser.read_compressed_int()?, 10);
    /// assert_eq!(parser.read_compressed_int()?, -1);
    /// # Ok::<(), il2scope::Error>(())
    /// ```
    pub fn read_compressed_int(&mut self) -> Result<i32> {
        let encoded = self.read_compressed_uint()?;
        if encoded == u32::MAX {
            return Ok(i32::MIN);
        }

        let magnitude = encoded >> 1;
        #[allow(clippy::cast_possible_wrap)]
        let signed = if (encoded & 1) == 0 {
            magnitude as i32
        } else {
            -(magnitude as i32) - 1
        };

        Ok(signed)
    }

    /// Read `length` bytes and decode them as UTF-8.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length or
    /// [`crate::Error::Malformed`] for invalid UTF-8 encoding.
    pub fn read_string_utf8_len(&mut self, length: usize) -> Result<String> {
        let start = self.position;
        let string_data = self.read_bytes(length)?;

        String::from_utf8(string_data.to_vec()).map_err(|e| {
            malformed_error!(
                "Invalid UTF-8 string at offset {}-{}: {}",
                start,
                start + length,
                e.utf8_error()
            )
        })
    }
}
