use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds {
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Only two kinds of failure ever leave the library as an [`Error`]: an unexpected failure while
/// assembling the declarations of one image (which the decompiler captures into that image's
/// [`crate::decompiler::ImageOutcome`] instead of aborting), and a failure of the output sink,
/// which aborts the run. Metadata queries that may legitimately come back empty, such as an
/// unresolvable default value or a missing custom attribute index, are modelled with `Option`
/// or tagged values and never produce an error.
///
/// # Error Categories
///
/// ## Metadata Errors
/// - [`Error::Malformed`] - Corrupted or inconsistent metadata
/// - [`Error::OutOfBounds`] - Attempted to read beyond a buffer boundary
/// - [`Error::IndexOutOfRange`] - A metadata table index does not exist
///
/// ## I/O and External Errors
/// - [`Error::FileError`] - Filesystem I/O errors (output sinks, snapshot files)
/// - [`Error::Json`] - JSON (de)serialization errors
///
/// # Examples
///
/// ```rust
/// use il2scope::{Error, MetadataSnapshot};
/// use std::path::Path;
///
/// match MetadataSnapshot::from_file(Path::new("metadata.json")) {
///     Ok(snapshot) => println!("Loaded {} images", snapshot.image_count()),
///     Err(Error::FileError(io_err)) => eprintln!("I/O error: {}", io_err),
///     Err(Error::Json(json_err)) => eprintln!("Invalid snapshot: {}", json_err),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The metadata is damaged or inconsistent and could not be processed.
    ///
    /// The error includes the source location where the malformation was detected
    /// for debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while reading a buffer.
    #[error("Out of Bound read would have occurred - {file}:{line}")]
    OutOfBounds {
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A metadata table was indexed outside of its bounds.
    ///
    /// Raised by [`crate::MetadataProvider`] implementations when a definition range
    /// points past the end of the table it refers to.
    #[error("Index {index} is out of range for table '{table}'")]
    IndexOutOfRange {
        /// Name of the table that was indexed
        table: &'static str,
        /// The offending index
        index: i64,
    },

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur while creating or writing the
    /// output artifacts, or while reading snapshot and configuration files.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}
