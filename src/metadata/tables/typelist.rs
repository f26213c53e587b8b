//! Fixed-stride type lists, as used by a class definition's interface table.
//!
//! A `type_list` is a `u32` element count followed by that many 2-byte type
//! indexes. Because the stride is constant, element `i` is located by arithmetic
//! and random access never touches any other element.

use crate::{
    file::io::read_le_at,
    metadata::{
        tables::{ItemTable, RowReadable, TableIterator, TableParIterator},
        DexData,
    },
    Result,
};

/// One entry of a type list: a position and the type index stored there.
#[derive(Clone, Copy, Debug)]
pub struct TypeItem {
    /// 0-based position within the list
    pub index: u32,
    /// Index into the container's type id pool
    pub type_index: u16,
}

impl RowReadable for TypeItem {
    const ROW_SIZE: usize = 2;

    fn row_read(data: &[u8], offset: &mut usize, index: u32) -> Result<Self> {
        Ok(TypeItem {
            index,
            type_index: read_le_at::<u16>(data, offset)?,
        })
    }
}

/// Random-access view over one `type_list`.
///
/// Constructed from the list's byte offset; an offset of `0` produces an empty
/// list, matching the container convention that `0` means "no list". The view
/// validates the declared element count against the buffer once, so in-range
/// access cannot fail on the buffer afterwards.
///
/// # Examples
///
/// ```rust,no_run
/// use dexscope::DexFile;
///
/// let dex = DexFile::from_file(std::path::Path::new("classes.dex"))?;
/// let class = dex.class_defs().get(0)?;
/// for name in class.interfaces()?.names() {
///     println!("implements {}", name?);
/// }
/// # Ok::<(), dexscope::Error>(())
/// ```
pub struct TypeList<'a> {
    dex: DexData<'a>,
    table: ItemTable<'a, TypeItem>,
}

impl<'a> TypeList<'a> {
    /// Build a view over the type list at `offset`, or an empty view for offset `0`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `offset` lies outside the buffer,
    /// or [`crate::Error::Malformed`] if the declared element count does not fit.
    pub fn read_or_empty(dex: DexData<'a>, offset: u32) -> Result<TypeList<'a>> {
        if offset == 0 {
            return Ok(TypeList {
                dex,
                table: ItemTable::empty(),
            });
        }

        let size = dex.read_u32_at(offset as usize)?;
        let rows = dex
            .data()
            .get(offset as usize + 4..)
            .ok_or(crate::Error::OutOfBounds)?;

        Ok(TypeList {
            dex,
            table: ItemTable::new(rows, size)?,
        })
    }

    /// Number of entries in the list.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.table.row_count()
    }

    /// Returns `true` if the list has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The entry at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] if `index >= size()`.
    pub fn get(&self, index: u32) -> Result<TypeItem> {
        self.table.get(index)
    }

    /// Resolve the descriptor string of the entry at `index`.
    ///
    /// # Errors
    /// Same as [`TypeList::get`], plus any type pool resolution error.
    pub fn type_name(&self, index: u32) -> Result<String> {
        let item = self.table.get(index)?;
        self.dex.type_name_at(u32::from(item.type_index))
    }

    /// Sequential iterator over the raw entries.
    #[must_use]
    pub fn iter(&'a self) -> TableIterator<'a, TypeItem> {
        self.table.iter()
    }

    /// Parallel iterator over the raw entries.
    #[must_use]
    pub fn par_iter(&'a self) -> TableParIterator<'a, TypeItem> {
        self.table.par_iter()
    }

    /// Sequential iterator over resolved descriptor strings.
    pub fn names(&'a self) -> impl Iterator<Item = Result<String>> + 'a {
        let dex = self.dex;
        self.table
            .iter()
            .map(move |item| dex.type_name_at(u32::from(item.type_index)))
    }
}
