//! Definitions, parsing and lazy views over DEX metadata.
//!
//! This module implements the class-definition subsystem of the DEX format: the
//! container header, the string and type id pools, the class-definition table, and
//! the lazy views over class data (fields, methods, annotations, static initial
//! values).
//!
//! # Key Components
//!
//! ## Container
//! - [`crate::metadata::dexfile::DexFile`] - Main entry point for container analysis
//! - [`crate::metadata::header::DexHeader`] - The fixed 112-byte container header
//! - [`crate::metadata::DexData`] - Borrowed handle (buffer + header) threaded
//!   through every view
//!
//! ## Pools
//! - [`crate::metadata::pools::StringPool`] - MUTF-8 string resolution by index
//! - [`crate::metadata::pools::TypePool`] - Type descriptor resolution by index
//!
//! ## Class Definitions
//! - [`crate::metadata::classes::ClassDef`] - Lazy record view of one class
//! - [`crate::metadata::classes::FieldList`] / [`crate::metadata::classes::MethodList`] -
//!   delta-encoded member streams
//! - [`crate::metadata::annotations`] - Annotation directory, sets and iterators
//! - [`crate::metadata::values`] - Static initial value stream
//!
//! # Laziness
//!
//! Nothing below the header is decoded upfront. Every accessor on a view
//! constructs fresh iterator state from byte offsets; repeated calls yield
//! structurally identical but fully independent traversals. No decoded result is
//! cached - the views are restartable, not memoized.

pub mod annotations;
pub mod classes;
pub mod dexfile;
pub mod flags;
pub mod header;
pub mod pools;
pub mod tables;
pub mod values;

use crate::{
    file::{io::read_le_at, Parser},
    metadata::{
        header::DexHeader,
        pools::{StringPool, TypePool},
    },
    Result,
};

/// Borrowed handle to one parsed container: the raw buffer plus its header.
///
/// `DexData` is the arena handle of this crate. It is `Copy`, costs two pointers,
/// and is embedded in every view so that each of them can dereference the shared
/// buffer and resolve string/type indexes without owning anything. All views built
/// from one `DexData` are bounded by the lifetime of the owning
/// [`crate::DexFile`].
#[derive(Clone, Copy)]
pub struct DexData<'a> {
    data: &'a [u8],
    header: &'a DexHeader,
}

impl<'a> DexData<'a> {
    pub(crate) fn new(data: &'a [u8], header: &'a DexHeader) -> DexData<'a> {
        DexData { data, header }
    }

    /// The complete container buffer.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The parsed container header.
    #[must_use]
    pub fn header(&self) -> &'a DexHeader {
        self.header
    }

    /// A fresh view over the string id pool.
    #[must_use]
    pub fn strings(&self) -> StringPool<'a> {
        StringPool::new(
            self.data,
            self.header.string_ids_offset,
            self.header.string_ids_size,
        )
    }

    /// A fresh view over the type id pool.
    #[must_use]
    pub fn types(&self) -> TypePool<'a> {
        TypePool::new(
            self.data,
            self.header.type_ids_offset,
            self.header.type_ids_size,
            self.strings(),
        )
    }

    /// Resolve a string by its index in the string id pool.
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] for an index past the pool, or a
    /// decoding error for malformed string data.
    pub fn string_at(&self, index: u32) -> Result<String> {
        self.strings().get(index)
    }

    /// Resolve a type descriptor by its index in the type id pool.
    ///
    /// # Errors
    /// Same as [`DexData::string_at`].
    pub fn type_name_at(&self, index: u32) -> Result<String> {
        self.types().get(index)
    }

    /// Resolve an optional string index, where `0` means absent.
    ///
    /// # Errors
    /// Same as [`DexData::string_at`] for a nonzero index.
    pub fn optional_string_at(&self, index: u32) -> Result<Option<String>> {
        if index == 0 {
            return Ok(None);
        }
        self.string_at(index).map(Some)
    }

    /// Resolve an optional type index, where `0` means absent.
    ///
    /// # Errors
    /// Same as [`DexData::type_name_at`] for a nonzero index.
    pub fn optional_type_name_at(&self, index: u32) -> Result<Option<String>> {
        if index == 0 {
            return Ok(None);
        }
        self.type_name_at(index).map(Some)
    }

    /// A parser positioned at `offset` within the container buffer.
    pub(crate) fn parser_at(&self, offset: usize) -> Result<Parser<'a>> {
        let mut parser = Parser::new(self.data);
        parser.seek(offset)?;
        Ok(parser)
    }

    /// Read one fixed-width `u32` at an absolute offset.
    pub(crate) fn read_u32_at(&self, offset: usize) -> Result<u32> {
        read_le_at::<u32>(self.data, &mut { offset })
    }
}
