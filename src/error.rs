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

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all possible error conditions that can occur while parsing DEX containers
/// and walking their class definitions. Each variant provides specific context about the
/// failure mode to enable appropriate error handling.
///
/// # Error Categories
///
/// ## File Parsing Errors
/// - [`Error::Malformed`] - Corrupted or invalid container structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond buffer boundaries
/// - [`Error::NotSupported`] - Unsupported file format or feature
/// - [`Error::Empty`] - Empty input provided
///
/// ## Access Errors
/// - [`Error::IndexOutOfRange`] - Requested element index past a table's declared size
/// - [`Error::InconsistentHeader`] - Header field disagreeing with the file contents
///
/// ## I/O and Limits
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::RecursionLimit`] - Maximum nesting depth exceeded
///
/// # Examples
///
/// ```rust,no_run
/// use dexscope::{DexFile, Error};
/// use std::path::Path;
///
/// match DexFile::from_file(Path::new("classes.dex")) {
///     Ok(dex) => {
///         println!("Loaded {} classes", dex.class_defs().size());
///     }
///     Err(Error::NotSupported) => {
///         eprintln!("File format is not supported");
///     }
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed file: {} ({}:{})", message, file, line);
///     }
///     Err(e) => {
///         eprintln!("Other error: {}", e);
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The file is damaged and could not be parsed.
    ///
    /// This error indicates that the container structure is corrupted or doesn't
    /// conform to the DEX format - a variable-length integer that does not terminate,
    /// a declared count that would read past the end of the buffer, or an invalid
    /// encoding tag. The error includes the source location where the malformation
    /// was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    ///
    /// This error occurs when trying to read data beyond the end of the buffer.
    /// It's a safety check to prevent buffer overruns during parsing.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// A list element was requested past the list's declared size.
    ///
    /// Unlike [`Error::OutOfBounds`], which guards raw buffer reads, this error
    /// reports a caller asking for an element index that the owning table or
    /// stream does not contain. It is a usage error, not a parsing error.
    #[error("Index {index} is out of range for a list of size {size}")]
    IndexOutOfRange {
        /// The index that was requested
        index: u32,
        /// The declared size of the list
        size: u32,
    },

    /// A header field disagrees with the actual file contents.
    ///
    /// The disagreement is surfaced, not silently repaired, because downstream
    /// consumers may depend on either side of it. Typical causes are a stale
    /// checksum after patching, or a truncated copy of a container.
    #[error("Inconsistent header - {0}")]
    InconsistentHeader(String),

    /// This file type is not supported.
    ///
    /// Indicates that the input is not a DEX container this library understands,
    /// such as a wrong magic, an unknown format version, or a byte-swapped
    /// (big-endian) container.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur during file operations
    /// such as reading from disk, permission issues, or filesystem errors.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Recursion limit reached.
    ///
    /// Encoded values may nest (arrays of annotations of arrays). To prevent stack
    /// overflow on hostile input, a maximum nesting depth is enforced while skipping
    /// over them. The associated value shows the limit that was reached.
    #[error("Reached the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),
}
