//! Field views over the delta-encoded field stream.

use crate::{
    metadata::{
        annotations::{AnnotationSetList, AnnotationsDirectory},
        classes::members::{MemberKind, MemberWalker, RawMember},
        flags::AccessFlags,
        values::{EncodedValueRef, StaticValuesIterator},
        DexData,
    },
    Result,
};

/// One field of a class, decoded from the field stream.
///
/// Carries the field's true index into the container's global field id table
/// (reconstructed from cumulative deltas), its access flags, and whatever the two
/// side channels associated with it: an optional static initial value reference
/// and an optional annotation set.
pub struct EncodedField<'a> {
    dex: DexData<'a>,
    ordinal: u32,
    access_flags: u32,
    initial_value: Option<EncodedValueRef>,
    annotations_offset: u32,
}

impl<'a> EncodedField<'a> {
    pub(crate) fn from_raw(dex: DexData<'a>, raw: RawMember) -> EncodedField<'a> {
        EncodedField {
            dex,
            ordinal: raw.ordinal,
            access_flags: raw.access_flags,
            initial_value: raw.initial_value,
            annotations_offset: raw.annotations_offset,
        }
    }

    /// Index into the container's global field id table.
    #[must_use]
    pub fn field_index(&self) -> u32 {
        self.ordinal
    }

    /// The field's access flags.
    #[must_use]
    pub fn access_flags(&self) -> AccessFlags {
        AccessFlags::from_raw(self.access_flags)
    }

    /// Returns `true` if the field is static.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.access_flags().contains(AccessFlags::STATIC)
    }

    /// Reference to the field's explicit static initial value, if one exists.
    ///
    /// `None` means the field takes its type's default value - either because the
    /// class has no value array, the array was exhausted, or the field is an
    /// instance field.
    #[must_use]
    pub fn initial_value(&self) -> Option<EncodedValueRef> {
        self.initial_value
    }

    /// The field's annotation set.
    ///
    /// # Errors
    /// Returns a decoding error if the referenced set is malformed.
    pub fn annotations(&self) -> Result<AnnotationSetList<'a>> {
        AnnotationSetList::read_or_empty(self.dex, self.annotations_offset)
    }
}

/// Index-based view over a class's field stream.
///
/// Presents `size()` and `get(i)` semantics over the delta-encoded stream. There
/// is no random access underneath: `get(i)` constructs a fresh traversal, skips
/// `i` entries and decodes the next one. Callers iterating more than a handful of
/// fields should use [`FieldList::iter`] instead, which decodes each entry once.
pub struct FieldList<'a> {
    dex: DexData<'a>,
    start_offset: usize,
    size: u32,
    static_size: u32,
    annotations_offset: u32,
    static_values_offset: u32,
}

impl<'a> FieldList<'a> {
    pub(crate) fn new(
        dex: DexData<'a>,
        start_offset: usize,
        size: u32,
        static_size: u32,
        annotations_offset: u32,
        static_values_offset: u32,
    ) -> FieldList<'a> {
        FieldList {
            dex,
            start_offset,
            size,
            static_size,
            annotations_offset,
            static_values_offset,
        }
    }

    pub(crate) fn empty(dex: DexData<'a>) -> FieldList<'a> {
        FieldList {
            dex,
            start_offset: 0,
            size: 0,
            static_size: 0,
            annotations_offset: 0,
            static_values_offset: 0,
        }
    }

    /// Total number of fields (static plus instance).
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Returns `true` if the class declares no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of static fields; they precede the instance fields in the stream.
    #[must_use]
    pub fn static_size(&self) -> u32 {
        self.static_size
    }

    /// Number of instance fields.
    #[must_use]
    pub fn instance_size(&self) -> u32 {
        self.size - self.static_size
    }

    /// Begin a fresh traversal of the stream.
    ///
    /// Every call constructs new, independent cursor state - including fresh
    /// side-channel iterators - so concurrent or repeated traversals never
    /// interfere.
    ///
    /// # Errors
    /// Returns a decoding error if the stream offset, the annotation directory or
    /// the static value array header is invalid.
    pub fn iter(&self) -> Result<FieldIterator<'a>> {
        let parser = if self.size == 0 {
            crate::file::Parser::new(&[])
        } else {
            self.dex.parser_at(self.start_offset)?
        };

        let annotations =
            AnnotationsDirectory::new_or_empty(self.dex, self.annotations_offset)
                .field_annotations()?;
        let values = StaticValuesIterator::new_or_empty(self.dex, self.static_values_offset)?;

        Ok(FieldIterator {
            dex: self.dex,
            walker: MemberWalker::new(parser, MemberKind::Field, self.size, annotations, values),
            failed: false,
        })
    }

    /// Decode the field at `index`.
    ///
    /// Skips entries `0..index` (advancing side channels as any traversal must)
    /// and decodes entry `index`; cost is linear in `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] if `index >= size()`, or any
    /// decoding error encountered on the way.
    pub fn get(&self, index: u32) -> Result<EncodedField<'a>> {
        if index >= self.size {
            return Err(crate::Error::IndexOutOfRange {
                index,
                size: self.size,
            });
        }

        let mut iter = self.iter()?;
        for _ in 0..index {
            FieldIterator::skip(&mut iter)?;
        }

        match iter.walker.read_next()? {
            Some(raw) => Ok(EncodedField::from_raw(self.dex, raw)),
            // Unreachable: index was validated against size above
            None => Err(crate::Error::IndexOutOfRange {
                index,
                size: self.size,
            }),
        }
    }
}

/// Forward-only iterator over a field stream.
///
/// Yields `Result` items because each entry is decoded on demand from untrusted
/// data. After the first error the iterator fuses: the cursor sits mid-entry and
/// the running ordinal can no longer be trusted, so resuming would silently
/// desynchronize the side channels.
pub struct FieldIterator<'a> {
    dex: DexData<'a>,
    walker: MemberWalker<'a>,
    failed: bool,
}

impl<'a> FieldIterator<'a> {
    /// Skip one entry without materializing a view; `false` once exhausted.
    ///
    /// Consumes exactly the bytes a decode would and advances both side channels,
    /// keeping later annotation and value associations correct.
    ///
    /// # Errors
    /// Identical to decoding the entry.
    pub fn skip(&mut self) -> Result<bool> {
        self.walker.skip_next()
    }

    /// Number of entries produced or skipped so far.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.walker.index()
    }

    /// Field index of the most recently consumed entry; 0 before the first.
    ///
    /// After full traversal this is the true index of the stream's last field,
    /// whether or not any entries were skipped.
    #[must_use]
    pub fn previous_index(&self) -> u32 {
        self.walker.previous_ordinal()
    }

    /// Byte offset of the next undecoded entry; after full traversal this is the
    /// offset of the section following the stream.
    #[must_use]
    pub fn byte_offset(&self) -> usize {
        self.walker.position()
    }
}

impl<'a> Iterator for FieldIterator<'a> {
    type Item = Result<EncodedField<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.walker.read_next() {
            Ok(Some(raw)) => Some(Ok(EncodedField::from_raw(self.dex, raw))),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
