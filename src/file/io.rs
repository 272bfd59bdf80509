//! Little-endian primitive decoding used by the metadata readers.
//!
//! IL2CPP metadata and the custom attribute data blobs it contains are always stored in
//! little-endian byte order, so only the little-endian direction is provided here. The
//! [`MetaIO`] trait abstracts over the primitive types that can be read, and
//! [`read_le_at`] performs a bounds-checked read at a caller-owned offset.

use crate::Result;

/// Trait for primitive types that can be decoded from little-endian bytes.
///
/// Implemented for all fixed-width integers and floats that appear in custom attribute
/// value encodings.
///
/// # Examples
///
/// ```rust,ignore
/// use il2scope::file::io::{read_le_at, MetaIO};
///
/// let data = [0x01, 0x00, 0x00, 0x00];
/// let mut offset = 0;
/// let value: u32 = read_le_at(&data, &mut offset)?;
/// assert_eq!(value, 1);
/// # Ok::<(), il2scope::Error>(())
/// ```
pub trait MetaIO: Sized {
    /// Associated type representing the byte array type for this numeric type.
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_meta_io {
    ($($ty:ty => $len:expr),* $(,)?) => {
        $(
            impl MetaIO for $ty {
                type Bytes = [u8; $len];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_meta_io! {
    u8 => 1,
    i8 => 1,
    u16 => 2,
    i16 => 2,
    u32 => 4,
    i32 => 4,
    u64 => 8,
    i64 => 8,
    f32 => 4,
    f64 => 8,
}

/// Safely reads a value of type `T` in little-endian byte order from a data buffer.
///
/// The offset is advanced by `size_of::<T>()` on success and left untouched on failure.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes remaining.
pub fn read_le_at<T: MetaIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(out_of_bounds_error!());
    };
    if end > data.len() {
        return Err(out_of_bounds_error!());
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(out_of_bounds_error!());
    };

    *offset = end;

    Ok(T::from_le_bytes(read))
}
