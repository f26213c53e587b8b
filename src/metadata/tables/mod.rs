//! Fixed-stride table infrastructure.
//!
//! Several DEX sections are tables whose elements all occupy the same number of
//! bytes: the interface type list (2 bytes per entry), annotation set lists and the
//! id sections (4 bytes per entry). For such tables element `i` lives at
//! `i * stride`, so random access is pure arithmetic - no iterator state, no
//! sequential decode.
//!
//! ## Key Components
//!
//! - [`ItemTable`]: Generic container for fixed-stride table data with typed row access
//! - [`RowReadable`]: Trait defining how to read and parse individual table rows
//! - [`TableIterator`]: Sequential iterator for table rows
//! - [`TableParIterator`]: Parallel iterator for read-only fan-out over rows
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use dexscope::metadata::tables::{ItemTable, RowReadable};
//!
//! # struct ExampleRow { id: u32 }
//! # impl RowReadable for ExampleRow {
//! #     const ROW_SIZE: usize = 4;
//! #     fn row_read(_: &[u8], offset: &mut usize, index: u32) -> dexscope::Result<Self> {
//! #         *offset += 4;
//! #         Ok(ExampleRow { id: index })
//! #     }
//! # }
//! #
//! # fn example(data: &[u8]) -> dexscope::Result<()> {
//! let table: ItemTable<ExampleRow> = ItemTable::new(data, 100)?;
//!
//! // Sequential iteration
//! for row in &table {
//!     println!("Row: {}", row.id);
//! }
//!
//! // Parallel processing with error handling
//! table.par_iter().try_for_each(|row| {
//!     println!("Processing row: {}", row.id);
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! ```

mod typelist;

pub use typelist::{TypeItem, TypeList};

use crate::Result;
use rayon::iter::{plumbing, IndexedParallelIterator, ParallelIterator};
use std::{
    marker::PhantomData,
    sync::{Arc, Mutex},
};

/// Trait defining the interface for reading and parsing fixed-stride table rows.
///
/// Implementors describe one table element: its constant byte width and how to
/// decode it. Because every element has the same width, [`ItemTable::new`]
/// validates the whole table extent up front - a `row_read` for an in-range index
/// over a validated table cannot run out of bounds.
///
/// Types implementing this trait must be `Send` to support parallel processing.
pub trait RowReadable: Sized + Send {
    /// The size in bytes of a single row of this table type.
    const ROW_SIZE: usize;

    /// Reads and parses a single row from the provided byte buffer.
    ///
    /// ## Arguments
    ///
    /// * `data` - The byte buffer containing the table data, starting at row 0
    /// * `offset` - Mutable reference to the current read position, advanced by
    ///   the number of bytes consumed
    /// * `index` - The 0-based index of this row
    ///
    /// ## Errors
    ///
    /// Returns an error if the buffer contains insufficient data for a complete
    /// row. Over a table validated by [`ItemTable::new`] this cannot happen for
    /// in-range indexes.
    fn row_read(data: &[u8], offset: &mut usize, index: u32) -> Result<Self>;
}

/// Generic container for fixed-stride table data with typed row access.
///
/// Wraps a raw byte slice (starting at row 0 of the table) and provides type-safe
/// access to individual rows through the [`RowReadable`] trait. The table holds no
/// mutable state, so any number of readers may call [`ItemTable::get`] or iterate
/// concurrently.
///
/// ## Type Parameters
///
/// * `'a` - Lifetime of the underlying byte data
/// * `T` - The row type that implements [`RowReadable`]
pub struct ItemTable<'a, T> {
    /// Reference to the raw table data bytes, starting at row 0
    data: &'a [u8],
    /// Total number of rows in this table
    row_count: u32,
    /// Phantom data to maintain type information
    _phantom: PhantomData<T>,
}

impl<'a, T: RowReadable> ItemTable<'a, T> {
    /// Creates a new table over raw byte data.
    ///
    /// ## Arguments
    ///
    /// * `data` - The raw byte buffer, beginning at the table's first row
    /// * `row_count` - The declared number of rows
    ///
    /// ## Errors
    ///
    /// Returns [`crate::Error::Malformed`] if `row_count` rows would extend past
    /// the end of `data` - a declared count that does not fit its buffer.
    pub fn new(data: &'a [u8], row_count: u32) -> Result<Self> {
        if u64::from(row_count) * T::ROW_SIZE as u64 > data.len() as u64 {
            return Err(malformed_error!(
                "Table of {} rows ({} bytes each) does not fit in {} bytes",
                row_count,
                T::ROW_SIZE,
                data.len()
            ));
        }

        Ok(ItemTable {
            data,
            row_count,
            _phantom: PhantomData,
        })
    }

    /// Creates an empty table.
    #[must_use]
    pub fn empty() -> Self {
        ItemTable {
            data: &[],
            row_count: 0,
            _phantom: PhantomData,
        }
    }

    /// Returns the total number of rows in this table.
    #[must_use]
    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    /// Returns `true` if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Returns the total size of this table in bytes.
    #[must_use]
    pub fn byte_size(&self) -> u64 {
        u64::from(self.row_count) * T::ROW_SIZE as u64
    }

    /// Retrieves a specific row by its 0-based index.
    ///
    /// ## Arguments
    ///
    /// * `index` - The row index to retrieve
    ///
    /// ## Errors
    ///
    /// Returns [`crate::Error::IndexOutOfRange`] if `index >= row_count`.
    pub fn get(&self, index: u32) -> Result<T> {
        if index >= self.row_count {
            return Err(crate::Error::IndexOutOfRange {
                index,
                size: self.row_count,
            });
        }

        T::row_read(self.data, &mut (index as usize * T::ROW_SIZE), index)
    }

    /// Creates a sequential iterator over all rows in the table.
    ///
    /// Rows are parsed on demand as the iterator advances; memory usage is
    /// constant regardless of table size.
    #[must_use]
    pub fn iter(&'a self) -> TableIterator<'a, T> {
        TableIterator {
            table: self,
            current_row: 0,
            current_offset: 0,
        }
    }

    /// Creates a parallel iterator over all rows in the table.
    ///
    /// Rows are processed concurrently across threads via rayon. This is pure
    /// read sharing: each split decodes its own rows out of the shared buffer.
    #[must_use]
    pub fn par_iter(&'a self) -> TableParIterator<'a, T> {
        TableParIterator {
            table: self,
            range: 0..self.row_count,
        }
    }
}

impl<'a, T: RowReadable> IntoIterator for &'a ItemTable<'a, T> {
    type Item = T;
    type IntoIter = TableIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Sequential iterator for fixed-stride table rows.
///
/// Lazy and allocation-free: each call to `next` decodes one row at the current
/// offset. Because table extents are validated at construction, iteration over a
/// well-formed table never fails mid-way.
pub struct TableIterator<'a, T> {
    /// Reference to the table being iterated
    table: &'a ItemTable<'a, T>,
    /// Current row number
    current_row: u32,
    /// Current byte offset in the table data
    current_offset: usize,
}

impl<'a, T: RowReadable> Iterator for TableIterator<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row >= self.table.row_count {
            return None;
        }

        match T::row_read(self.table.data, &mut self.current_offset, self.current_row) {
            Ok(row) => {
                self.current_row += 1;
                Some(row)
            }
            Err(_) => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = (self.table.row_count - self.current_row) as usize;
        (len, Some(len))
    }
}

impl<'a, T: RowReadable> ExactSizeIterator for TableIterator<'a, T> {}

/// Parallel iterator for fixed-stride table rows.
///
/// Integrates with the rayon work-stealing scheduler; the row type `T` must be
/// `Send + Sync` so decoded rows can cross threads. Created through
/// [`ItemTable::par_iter`].
pub struct TableParIterator<'a, T> {
    /// Reference to the table being iterated
    table: &'a ItemTable<'a, T>,
    /// Range of row indices to process
    range: std::ops::Range<u32>,
}

impl<'a, T: RowReadable + Send + Sync + 'a> TableParIterator<'a, T> {
    /// Processes the iterator in parallel with early error detection.
    ///
    /// Parallel equivalent of the standard iterator's `try_for_each`: if any
    /// operation fails, remaining work is abandoned and the first error
    /// encountered is returned.
    ///
    /// # Panics
    ///
    /// Panics if the internal error mutex is poisoned.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `op`.
    pub fn try_for_each<F>(self, op: F) -> crate::Result<()>
    where
        F: Fn(T) -> crate::Result<()> + Send + Sync,
    {
        let error = Arc::new(Mutex::new(None));

        self.for_each(|item| {
            if error.lock().unwrap().is_some() {
                return;
            }

            if let Err(e) = op(item) {
                let mut guard = error.lock().unwrap();
                if guard.is_none() {
                    *guard = Some(e);
                }
            }
        });

        match Arc::into_inner(error).unwrap().into_inner().unwrap() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<'a, T: RowReadable + Send + Sync> ParallelIterator for TableParIterator<'a, T> {
    type Item = T;

    fn drive_unindexed<C>(self, consumer: C) -> C::Result
    where
        C: rayon::iter::plumbing::UnindexedConsumer<Self::Item>,
    {
        plumbing::bridge(self, consumer)
    }
}

impl<'a, T: RowReadable + Send + Sync> IndexedParallelIterator for TableParIterator<'a, T> {
    fn len(&self) -> usize {
        self.range.len()
    }

    fn drive<C>(self, consumer: C) -> C::Result
    where
        C: rayon::iter::plumbing::Consumer<Self::Item>,
    {
        plumbing::bridge(self, consumer)
    }

    fn with_producer<CB>(self, callback: CB) -> CB::Output
    where
        CB: rayon::iter::plumbing::ProducerCallback<Self::Item>,
    {
        callback.callback(TableProducer {
            table: self.table,
            range: self.range,
        })
    }
}

/// Internal producer for parallel iteration work distribution.
///
/// Implements the rayon `Producer` trait: splits the row range into chunks that
/// worker threads decode independently.
struct TableProducer<'a, T> {
    /// Reference to the table being processed
    table: &'a ItemTable<'a, T>,
    /// Range of row indices for this producer to handle
    range: std::ops::Range<u32>,
}

impl<'a, T: RowReadable + Send + Sync> rayon::iter::plumbing::Producer for TableProducer<'a, T> {
    type Item = T;
    type IntoIter = TableProducerIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        TableProducerIterator {
            table: self.table,
            range: self.range,
        }
    }

    fn split_at(self, index: usize) -> (Self, Self) {
        // Index represents table row positions which are expected to fit in u32
        #[allow(clippy::cast_possible_truncation)]
        let mid = self.range.start + index as u32;
        let left = TableProducer {
            table: self.table,
            range: self.range.start..mid,
        };
        let right = TableProducer {
            table: self.table,
            range: mid..self.range.end,
        };
        (left, right)
    }
}

/// Internal iterator over one parallel chunk of table rows.
struct TableProducerIterator<'a, T> {
    /// Reference to the table being processed
    table: &'a ItemTable<'a, T>,
    /// Range of row indices for this iterator to process
    range: std::ops::Range<u32>,
}

impl<'a, T: RowReadable + Send + Sync> Iterator for TableProducerIterator<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.range.start >= self.range.end {
            return None;
        }

        let row_index = self.range.start;
        self.range.start += 1;

        self.table.get(row_index).ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.range.len();
        (len, Some(len))
    }
}

impl<'a, T: RowReadable + Send + Sync> ExactSizeIterator for TableProducerIterator<'a, T> {}

// Implement DoubleEndedIterator for compatibility with rayon
impl<'a, T: RowReadable + Send + Sync> DoubleEndedIterator for TableProducerIterator<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.range.start >= self.range.end {
            return None;
        }

        self.range.end -= 1;

        self.table.get(self.range.end).ok()
    }
}
