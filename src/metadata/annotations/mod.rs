//! Annotation directory, annotation sets and the ordinal-matched iterator.
//!
//! Annotations live in a side structure, the `annotations_directory_item`: class
//! annotations are referenced directly, while field and method annotations are
//! sparse sorted tables of `(member index, annotation set offset)` pairs. The
//! member streams never point at their annotations; instead the directory tables
//! are walked *in lockstep* with the member stream and matched by ordinal - see
//! [`AnnotationIterator`].
//!
//! # Structure
//!
//! ```text
//! annotations_directory_item
//! ├── class_annotations_off   -> annotation_set_item (u32 count + u32 offsets)
//! ├── field_annotations[]     -> sorted (field_idx, annotation_set_off) pairs
//! └── method_annotations[]    -> sorted (method_idx, annotation_set_off) pairs
//! annotation_set_item entry   -> annotation_item: visibility byte + encoded annotation
//! ```
//!
//! Annotation *element values* are not decoded by this crate; an
//! [`Annotation`] exposes its visibility, type and the byte offset of its
//! element list for external value decoders.

use strum::FromRepr;

use crate::{
    file::io::read_le_at,
    metadata::{
        tables::{ItemTable, RowReadable},
        DexData,
    },
    Result,
};

/// Byte size of one `(member index, annotation set offset)` directory pair.
const DIRECTORY_PAIR_SIZE: usize = 8;

/// Retention of one annotation, from the `annotation_item` visibility byte.
#[derive(FromRepr, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum AnnotationVisibility {
    /// Only visible to the build toolchain
    Build = 0x00,
    /// Visible at runtime through reflection
    Runtime = 0x01,
    /// Visible to the runtime system only
    System = 0x02,
}

/// Lazy view over one `annotations_directory_item`.
///
/// Holds nothing but the directory's byte offset (`0` meaning "no directory");
/// every accessor reads the directory header afresh and builds independent
/// iterator state.
pub struct AnnotationsDirectory<'a> {
    dex: DexData<'a>,
    offset: u32,
}

impl<'a> AnnotationsDirectory<'a> {
    /// Wrap the directory at `offset`; `0` yields a directory with no annotations.
    #[must_use]
    pub fn new_or_empty(dex: DexData<'a>, offset: u32) -> AnnotationsDirectory<'a> {
        AnnotationsDirectory { dex, offset }
    }

    /// Returns `true` if no directory is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offset == 0
    }

    /// The class-level annotation set.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] or [`crate::Error::Malformed`] if the
    /// directory or the referenced set does not fit the buffer.
    pub fn class_annotations(&self) -> Result<AnnotationSetList<'a>> {
        if self.offset == 0 {
            return Ok(AnnotationSetList::empty(self.dex));
        }

        let class_set_offset = self.dex.read_u32_at(self.offset as usize)?;
        AnnotationSetList::read_or_empty(self.dex, class_set_offset)
    }

    /// An ordinal-matched iterator over the field annotation table.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] or [`crate::Error::Malformed`] if the
    /// declared pair table does not fit the buffer.
    pub fn field_annotations(&self) -> Result<AnnotationIterator<'a>> {
        if self.offset == 0 {
            return Ok(AnnotationIterator::empty());
        }

        let count = self.dex.read_u32_at(self.offset as usize + 4)?;
        AnnotationIterator::new(self.dex, self.offset as usize + 16, count)
    }

    /// An ordinal-matched iterator over the method annotation table.
    ///
    /// # Errors
    /// Same as [`AnnotationsDirectory::field_annotations`].
    pub fn method_annotations(&self) -> Result<AnnotationIterator<'a>> {
        if self.offset == 0 {
            return Ok(AnnotationIterator::empty());
        }

        let field_count = self.dex.read_u32_at(self.offset as usize + 4)?;
        let method_count = self.dex.read_u32_at(self.offset as usize + 8)?;
        let start = self.offset as usize + 16 + field_count as usize * DIRECTORY_PAIR_SIZE;
        AnnotationIterator::new(self.dex, start, method_count)
    }
}

/// Cursor over a sorted `(member index, annotation set offset)` table, advanced in
/// lockstep with a member stream.
///
/// The member stream calls [`AnnotationIterator::advance`] exactly once per
/// element it produces *or skips*, passing the element's resolved ordinal. If the
/// cursor's pending pair carries that ordinal, its set offset is handed out and
/// the cursor moves on; pairs for ordinals the stream has already passed are
/// dropped. Alignment therefore depends only on the *count* of advance calls
/// matching the count of stream elements - which the member walker guarantees by
/// construction.
///
/// The pair table's extent is validated at construction, so `advance` itself is
/// infallible.
pub struct AnnotationIterator<'a> {
    data: &'a [u8],
    start: usize,
    count: u32,
    cursor: u32,
}

impl<'a> AnnotationIterator<'a> {
    pub(crate) fn new(dex: DexData<'a>, start: usize, count: u32) -> Result<AnnotationIterator<'a>> {
        let end = start as u64 + u64::from(count) * DIRECTORY_PAIR_SIZE as u64;
        if end > dex.data().len() as u64 {
            return Err(malformed_error!(
                "Annotation table of {} pairs at {:#x} does not fit the container",
                count,
                start
            ));
        }

        Ok(AnnotationIterator {
            data: dex.data(),
            start,
            count,
            cursor: 0,
        })
    }

    /// An iterator that never matches anything.
    #[must_use]
    pub(crate) fn empty() -> AnnotationIterator<'static> {
        AnnotationIterator {
            data: &[],
            start: 0,
            count: 0,
            cursor: 0,
        }
    }

    /// Advance past one member with the given ordinal; returns the annotation set
    /// offset associated with it, if any.
    pub(crate) fn advance(&mut self, ordinal: u32) -> Option<u32> {
        while self.cursor < self.count {
            let (member_index, set_offset) = self.pair(self.cursor);

            if member_index < ordinal {
                // Stale pair for an ordinal the stream already passed
                self.cursor += 1;
                continue;
            }

            if member_index == ordinal {
                self.cursor += 1;
                return Some(set_offset);
            }

            return None;
        }

        None
    }

    fn pair(&self, index: u32) -> (u32, u32) {
        let mut offset = self.start + index as usize * DIRECTORY_PAIR_SIZE;
        // Extent validated in new(); these reads cannot fail
        let member_index = read_le_at::<u32>(self.data, &mut offset).unwrap_or(u32::MAX);
        let set_offset = read_le_at::<u32>(self.data, &mut offset).unwrap_or(0);
        (member_index, set_offset)
    }
}

/// One entry of an `annotation_set_item`: the offset of an `annotation_item`.
#[derive(Clone, Copy, Debug)]
pub struct AnnotationOffsetItem {
    /// 0-based position within the set
    pub index: u32,
    /// Absolute offset of the `annotation_item`
    pub offset: u32,
}

impl RowReadable for AnnotationOffsetItem {
    const ROW_SIZE: usize = 4;

    fn row_read(data: &[u8], offset: &mut usize, index: u32) -> Result<Self> {
        Ok(AnnotationOffsetItem {
            index,
            offset: read_le_at::<u32>(data, offset)?,
        })
    }
}

/// Fixed-stride view over one `annotation_set_item`.
///
/// The set is a `u32` count followed by that many `u32` offsets of
/// `annotation_item`s. An offset of `0` produces an empty set.
pub struct AnnotationSetList<'a> {
    dex: DexData<'a>,
    table: ItemTable<'a, AnnotationOffsetItem>,
}

impl<'a> AnnotationSetList<'a> {
    pub(crate) fn empty(dex: DexData<'a>) -> AnnotationSetList<'a> {
        AnnotationSetList {
            dex,
            table: ItemTable::empty(),
        }
    }

    /// Build a view over the set at `offset`, or an empty view for offset `0`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `offset` lies outside the buffer,
    /// or [`crate::Error::Malformed`] if the declared entry count does not fit.
    pub fn read_or_empty(dex: DexData<'a>, offset: u32) -> Result<AnnotationSetList<'a>> {
        if offset == 0 {
            return Ok(AnnotationSetList::empty(dex));
        }

        let size = dex.read_u32_at(offset as usize)?;
        let rows = dex
            .data()
            .get(offset as usize + 4..)
            .ok_or(crate::Error::OutOfBounds)?;

        Ok(AnnotationSetList {
            dex,
            table: ItemTable::new(rows, size)?,
        })
    }

    /// Number of annotations in the set.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.table.row_count()
    }

    /// Returns `true` if the set holds no annotations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Decode the annotation at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] if `index >= size()`, or a
    /// decoding error for a malformed `annotation_item`.
    pub fn get(&self, index: u32) -> Result<Annotation<'a>> {
        let item = self.table.get(index)?;
        Annotation::read(self.dex, item.offset)
    }

    /// Iterator over decoded annotations.
    pub fn iter(&'a self) -> impl Iterator<Item = Result<Annotation<'a>>> + 'a {
        let dex = self.dex;
        self.table
            .iter()
            .map(move |item| Annotation::read(dex, item.offset))
    }
}

/// Header view of one `annotation_item`.
///
/// Decodes the visibility byte and the encoded annotation's type and element
/// count. Element values are left in place; [`Annotation::elements_offset`] points
/// at the first `(name index, encoded value)` pair for external decoders.
pub struct Annotation<'a> {
    dex: DexData<'a>,
    visibility: AnnotationVisibility,
    type_index: u32,
    element_count: u32,
    elements_offset: usize,
}

impl<'a> Annotation<'a> {
    pub(crate) fn read(dex: DexData<'a>, offset: u32) -> Result<Annotation<'a>> {
        let mut parser = dex.parser_at(offset as usize)?;

        let visibility_byte = parser.read_le::<u8>()?;
        let Some(visibility) = AnnotationVisibility::from_repr(visibility_byte) else {
            return Err(malformed_error!(
                "Invalid annotation visibility {:#04x} at offset {}",
                visibility_byte,
                offset
            ));
        };

        let type_index = parser.read_uleb128()?;
        let element_count = parser.read_uleb128()?;

        Ok(Annotation {
            dex,
            visibility,
            type_index,
            element_count,
            elements_offset: parser.pos(),
        })
    }

    /// Retention of this annotation.
    #[must_use]
    pub fn visibility(&self) -> AnnotationVisibility {
        self.visibility
    }

    /// Index of the annotation's type in the type id pool.
    #[must_use]
    pub fn type_index(&self) -> u32 {
        self.type_index
    }

    /// Resolve the annotation's type descriptor.
    ///
    /// # Errors
    /// Returns any type pool resolution error.
    pub fn type_name(&self) -> Result<String> {
        self.dex.type_name_at(self.type_index)
    }

    /// Number of name/value elements in the annotation.
    #[must_use]
    pub fn element_count(&self) -> u32 {
        self.element_count
    }

    /// Absolute offset of the first element pair, for external value decoders.
    #[must_use]
    pub fn elements_offset(&self) -> usize {
        self.elements_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::DexBuilder;

    #[test]
    fn iterator_matches_sorted_pairs() {
        let mut builder = DexBuilder::new();
        let pairs_offset = builder.pos();
        // Pairs for ordinals 3 and 7
        builder.u32(3);
        builder.u32(0x100);
        builder.u32(7);
        builder.u32(0x200);

        let (data, header) = builder.finish();
        let dex = DexData::new(&data, &header);

        let mut iter = AnnotationIterator::new(dex, pairs_offset as usize, 2).unwrap();
        assert_eq!(iter.advance(1), None);
        assert_eq!(iter.advance(3), Some(0x100));
        assert_eq!(iter.advance(4), None);
        assert_eq!(iter.advance(7), Some(0x200));
        assert_eq!(iter.advance(9), None);
    }

    #[test]
    fn iterator_drops_stale_pairs() {
        let mut builder = DexBuilder::new();
        let pairs_offset = builder.pos();
        builder.u32(2);
        builder.u32(0x100);
        builder.u32(5);
        builder.u32(0x200);

        let (data, header) = builder.finish();
        let dex = DexData::new(&data, &header);

        // The stream jumps straight past ordinal 2; its pair must not leak
        // onto a later ordinal
        let mut iter = AnnotationIterator::new(dex, pairs_offset as usize, 2).unwrap();
        assert_eq!(iter.advance(4), None);
        assert_eq!(iter.advance(5), Some(0x200));
    }

    #[test]
    fn iterator_validates_extent() {
        let builder = DexBuilder::new();
        let (data, header) = builder.finish();
        let dex = DexData::new(&data, &header);

        assert!(matches!(
            AnnotationIterator::new(dex, data.len() - 4, 10),
            Err(crate::Error::Malformed { .. })
        ));
    }

    #[test]
    fn crafted_set_and_items() {
        let mut builder = DexBuilder::new();
        builder.strings(&["LDeprecated;"]);
        builder.types(&[0]);

        let item_offset = builder.pos();
        builder.u8(0x01); // visibility: runtime
        builder.uleb128(0); // type index
        builder.uleb128(0); // element count

        let set_offset = builder.pos();
        builder.u32(1);
        builder.u32(item_offset);

        let (data, header) = builder.finish();
        let dex = DexData::new(&data, &header);

        let set = AnnotationSetList::read_or_empty(dex, set_offset).unwrap();
        assert_eq!(set.size(), 1);

        let annotation = set.get(0).unwrap();
        assert_eq!(annotation.visibility(), AnnotationVisibility::Runtime);
        assert_eq!(annotation.type_name().unwrap(), "LDeprecated;");
        assert_eq!(annotation.element_count(), 0);

        assert!(matches!(
            set.get(1),
            Err(crate::Error::IndexOutOfRange { index: 1, size: 1 })
        ));
    }

    #[test]
    fn invalid_visibility_is_malformed() {
        let mut builder = DexBuilder::new();
        let item_offset = builder.pos();
        builder.u8(0x07);
        builder.uleb128(0);
        builder.uleb128(0);

        let set_offset = builder.pos();
        builder.u32(1);
        builder.u32(item_offset);

        let (data, header) = builder.finish();
        let dex = DexData::new(&data, &header);

        let set = AnnotationSetList::read_or_empty(dex, set_offset).unwrap();
        assert!(matches!(set.get(0), Err(crate::Error::Malformed { .. })));
    }

    #[test]
    fn empty_directory() {
        let builder = DexBuilder::new();
        let (data, header) = builder.finish();
        let dex = DexData::new(&data, &header);

        let directory = AnnotationsDirectory::new_or_empty(dex, 0);
        assert!(directory.is_empty());
        assert!(directory.class_annotations().unwrap().is_empty());
        assert_eq!(directory.field_annotations().unwrap().advance(0), None);
        assert_eq!(directory.method_annotations().unwrap().advance(0), None);
    }

    #[test]
    fn directory_sections() {
        let mut builder = DexBuilder::new();

        let class_set_offset = builder.pos();
        builder.u32(0); // empty class annotation set

        let dir_offset = builder.pos();
        builder.u32(class_set_offset); // class_annotations_off
        builder.u32(1); // annotated fields
        builder.u32(1); // annotated methods
        builder.u32(0); // annotated parameters
        builder.u32(4); // field 4
        builder.u32(0x111);
        builder.u32(9); // method 9
        builder.u32(0x222);

        let (data, header) = builder.finish();
        let dex = DexData::new(&data, &header);

        let directory = AnnotationsDirectory::new_or_empty(dex, dir_offset);
        assert!(directory.class_annotations().unwrap().is_empty());

        let mut fields = directory.field_annotations().unwrap();
        assert_eq!(fields.advance(4), Some(0x111));

        let mut methods = directory.method_annotations().unwrap();
        assert_eq!(methods.advance(9), Some(0x222));
    }
}
