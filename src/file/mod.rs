//! Byte-level reading primitives.
//!
//! - [`io`] - bounds-checked little-endian primitive decoding
//! - [`parser`] - cursor-based reader with the IL2CPP compressed integer encodings

pub mod io;
pub mod parser;
