//! Method views over the delta-encoded method stream.
//!
//! Method entries follow the field entries inside a `class_data_item` and share
//! their encoding, with one extra uleb128 per entry: the offset of the method's
//! code body. Code decoding is out of scope for this crate - the offset is
//! surfaced raw and otherwise skipped byte-exactly.

use crate::{
    metadata::{
        annotations::{AnnotationSetList, AnnotationsDirectory},
        classes::members::{MemberKind, MemberWalker, RawMember},
        flags::AccessFlags,
        values::StaticValuesIterator,
        DexData,
    },
    Result,
};

/// One method of a class, decoded from the method stream.
pub struct EncodedMethod<'a> {
    dex: DexData<'a>,
    ordinal: u32,
    access_flags: u32,
    code_offset: u32,
    annotations_offset: u32,
}

impl<'a> EncodedMethod<'a> {
    pub(crate) fn from_raw(dex: DexData<'a>, raw: RawMember) -> EncodedMethod<'a> {
        EncodedMethod {
            dex,
            ordinal: raw.ordinal,
            access_flags: raw.access_flags,
            code_offset: raw.code_offset,
            annotations_offset: raw.annotations_offset,
        }
    }

    /// Index into the container's global method id table.
    #[must_use]
    pub fn method_index(&self) -> u32 {
        self.ordinal
    }

    /// The method's access flags.
    #[must_use]
    pub fn access_flags(&self) -> AccessFlags {
        AccessFlags::from_raw(self.access_flags)
    }

    /// Absolute offset of the method's code body, or `None` for abstract and
    /// native methods.
    ///
    /// Instruction decoding is outside this crate; the offset is handed out for
    /// external disassemblers.
    #[must_use]
    pub fn code_offset(&self) -> Option<u32> {
        if self.code_offset == 0 {
            None
        } else {
            Some(self.code_offset)
        }
    }

    /// The method's annotation set.
    ///
    /// # Errors
    /// Returns a decoding error if the referenced set is malformed.
    pub fn annotations(&self) -> Result<AnnotationSetList<'a>> {
        AnnotationSetList::read_or_empty(self.dex, self.annotations_offset)
    }
}

/// Index-based view over a class's method stream.
///
/// Mirrors [`crate::metadata::classes::FieldList`]: `size()` plus linear-cost
/// `get(i)`, with [`MethodList::iter`] as the efficient traversal.
pub struct MethodList<'a> {
    dex: DexData<'a>,
    start_offset: usize,
    size: u32,
    direct_size: u32,
    annotations_offset: u32,
}

impl<'a> MethodList<'a> {
    pub(crate) fn new(
        dex: DexData<'a>,
        start_offset: usize,
        size: u32,
        direct_size: u32,
        annotations_offset: u32,
    ) -> MethodList<'a> {
        MethodList {
            dex,
            start_offset,
            size,
            direct_size,
            annotations_offset,
        }
    }

    pub(crate) fn empty(dex: DexData<'a>) -> MethodList<'a> {
        MethodList {
            dex,
            start_offset: 0,
            size: 0,
            direct_size: 0,
            annotations_offset: 0,
        }
    }

    /// Total number of methods (direct plus virtual).
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Returns `true` if the class declares no methods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of direct methods; they precede the virtual methods in the stream.
    #[must_use]
    pub fn direct_size(&self) -> u32 {
        self.direct_size
    }

    /// Number of virtual methods.
    #[must_use]
    pub fn virtual_size(&self) -> u32 {
        self.size - self.direct_size
    }

    /// Begin a fresh traversal of the stream.
    ///
    /// # Errors
    /// Returns a decoding error if the stream offset or the annotation directory
    /// is invalid.
    pub fn iter(&self) -> Result<MethodIterator<'a>> {
        let parser = if self.size == 0 {
            crate::file::Parser::new(&[])
        } else {
            self.dex.parser_at(self.start_offset)?
        };

        let annotations =
            AnnotationsDirectory::new_or_empty(self.dex, self.annotations_offset)
                .method_annotations()?;

        Ok(MethodIterator {
            dex: self.dex,
            walker: MemberWalker::new(
                parser,
                MemberKind::Method,
                self.size,
                annotations,
                StaticValuesIterator::empty(),
            ),
            failed: false,
        })
    }

    /// Decode the method at `index`; cost is linear in `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] if `index >= size()`, or any
    /// decoding error encountered on the way.
    pub fn get(&self, index: u32) -> Result<EncodedMethod<'a>> {
        if index >= self.size {
            return Err(crate::Error::IndexOutOfRange {
                index,
                size: self.size,
            });
        }

        let mut iter = self.iter()?;
        for _ in 0..index {
            MethodIterator::skip(&mut iter)?;
        }

        match iter.walker.read_next()? {
            Some(raw) => Ok(EncodedMethod::from_raw(self.dex, raw)),
            // Unreachable: index was validated against size above
            None => Err(crate::Error::IndexOutOfRange {
                index,
                size: self.size,
            }),
        }
    }
}

/// Forward-only iterator over a method stream.
///
/// Fuses after the first error, for the same reason as
/// [`crate::metadata::classes::FieldIterator`].
pub struct MethodIterator<'a> {
    dex: DexData<'a>,
    walker: MemberWalker<'a>,
    failed: bool,
}

impl<'a> MethodIterator<'a> {
    /// Skip one entry without materializing a view; `false` once exhausted.
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

    /// Method index of the most recently consumed entry; 0 before the first.
    #[must_use]
    pub fn previous_index(&self) -> u32 {
        self.walker.previous_ordinal()
    }

    /// Byte offset of the next undecoded entry.
    #[must_use]
    pub fn byte_offset(&self) -> usize {
        self.walker.position()
    }
}

impl<'a> Iterator for MethodIterator<'a> {
    type Item = Result<EncodedMethod<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.walker.read_next() {
            Ok(Some(raw)) => Some(Ok(EncodedMethod::from_raw(self.dex, raw))),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
