#![doc = include_str!("../README.md")]
//!
//! ## Architecture
//!
//! The crate is a lazy, zero-copy view layer over one immutable buffer. Three
//! access shapes cover everything the class-definition subsystem needs:
//!
//! 1. **Fixed-stride random access** - id tables, interface lists and annotation
//!    sets have constant element widths, so element `i` is found by arithmetic
//!    ([`metadata::tables::ItemTable`]).
//! 2. **Sequential variable-stride decoding** - field and method streams are
//!    delta-compressed; an element's value and byte length emerge only while
//!    decoding everything before it ([`metadata::classes::FieldList`],
//!    [`metadata::classes::MethodList`]).
//! 3. **Side-channel synchronization** - annotations and static initial values
//!    live in independently encoded streams that are advanced in lockstep with
//!    the member streams, matched purely by ordinal position
//!    ([`metadata::annotations::AnnotationIterator`],
//!    [`metadata::values::StaticValuesIterator`]).
//!
//! Everything is read-only: there is no mutation or re-serialization path.
//!
//! ## Module Organization
//!
//! - [`file`] (crate-internal backends) - memory-mapped or owned buffers behind
//!   one bounds-checked trait, plus the [`Parser`] cursor
//! - [`metadata`] - the container header, pools, and every lazy view
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use dexscope::DexFile;
//! use std::path::Path;
//!
//! let dex = DexFile::from_file(Path::new("classes.dex"))?;
//!
//! for class in dex.class_defs().iter() {
//!     let class = class?;
//!     println!("{} fields: {}", class.name(), class.fields()?.size());
//! }
//! # Ok::<(), dexscope::Error>(())
//! ```

#[macro_use]
pub(crate) mod error;
pub mod file;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types
/// from across the dexscope library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust,no_run
/// use dexscope::prelude::*;
///
/// let dex = DexFile::from_file("classes.dex".as_ref())?;
/// let classes = dex.class_defs();
/// # Ok::<(), dexscope::Error>(())
/// ```
pub mod prelude;

/// Definitions, parsing and lazy views over DEX metadata.
///
/// This module implements the class-definition subsystem: the container header,
/// the string/type pools, the class-definition table, and the lazy member,
/// annotation and static-value views.
pub mod metadata;

/// `dexscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
/// This is used consistently throughout the crate for all fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `dexscope` Error type
///
/// The main error type for all operations in this crate. Provides detailed error
/// information for container parsing and class-data decoding.
pub use error::Error;

/// Main entry point for working with DEX containers.
///
/// See [`metadata::dexfile::DexFile`] for loading and metadata access.
pub use metadata::dexfile::DexFile;

/// Low-level cursor for decoding binary data.
///
/// The [`Parser`] type is used throughout the crate for fixed-width and LEB128
/// decoding, and is exposed for external decoders resuming at offsets this
/// crate hands out (encoded values, code bodies).
pub use file::Parser;
