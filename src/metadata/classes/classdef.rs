//! The class definition record view.
//!
//! A `class_def_item` is eight fixed-width `u32` fields. The cheap ones - name,
//! access flags, superclass, source file - are resolved eagerly at construction;
//! everything reachable through an offset (interfaces, class data, annotations,
//! static values) is kept as an offset and resolved lazily, with fresh view state
//! on every accessor call.

use crate::{
    metadata::{
        annotations::{AnnotationSetList, AnnotationsDirectory},
        classes::{
            field::FieldList,
            members::{ClassDataHeader, MemberKind, MemberWalker},
            method::MethodList,
        },
        flags::AccessFlags,
        header::CLASS_DEF_ITEM_SIZE,
        tables::TypeList,
        values::StaticValuesIterator,
        DexData,
    },
    Result,
};

// class_def_item field offsets
const OFFSET_ACCESS_FLAGS: usize = 4;
const OFFSET_SUPERCLASS: usize = 8;
const OFFSET_INTERFACES: usize = 12;
const OFFSET_SOURCE_FILE: usize = 16;
const OFFSET_ANNOTATIONS: usize = 20;
const OFFSET_CLASS_DATA: usize = 24;
const OFFSET_STATIC_VALUES: usize = 28;

/// Lazy, read-only view of one class definition.
///
/// Constructed from the record's byte offset. Construction reads only the eight
/// fixed header fields (resolving the name, superclass and source-file strings);
/// the member streams, interface list and annotations are untouched until their
/// accessor is called. The view is immutable after construction and holds no
/// iterator state, so it can be shared freely across threads.
///
/// An offset field of `0` means absent: no superclass, no source file, no
/// interfaces, no class data, no annotations, no explicit static values.
///
/// # Examples
///
/// ```rust,no_run
/// use dexscope::DexFile;
///
/// let dex = DexFile::from_file(std::path::Path::new("classes.dex"))?;
/// let class = dex.class_defs().get(0)?;
///
/// println!("{}", class.name());
/// if let Some(superclass) = class.superclass() {
///     println!("  extends {}", superclass);
/// }
/// for interface in class.interfaces()?.names() {
///     println!("  implements {}", interface?);
/// }
/// # Ok::<(), dexscope::Error>(())
/// ```
pub struct ClassDef<'a> {
    dex: DexData<'a>,
    name: String,
    access_flags: u32,
    superclass: Option<String>,
    source_file: Option<String>,
    interfaces_offset: u32,
    annotations_offset: u32,
    class_data_offset: u32,
    static_values_offset: u32,
}

impl<'a> ClassDef<'a> {
    /// Read the class definition record at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the record does not fit the
    /// buffer, or a pool resolution error for its name, superclass or source
    /// file.
    pub fn read(dex: DexData<'a>, offset: usize) -> Result<ClassDef<'a>> {
        let end = offset
            .checked_add(CLASS_DEF_ITEM_SIZE)
            .ok_or(crate::Error::OutOfBounds)?;
        if end > dex.data().len() {
            return Err(crate::Error::OutOfBounds);
        }

        let type_index = dex.read_u32_at(offset)?;
        let superclass_index = dex.read_u32_at(offset + OFFSET_SUPERCLASS)?;
        let source_file_index = dex.read_u32_at(offset + OFFSET_SOURCE_FILE)?;

        Ok(ClassDef {
            dex,
            name: dex.type_name_at(type_index)?,
            access_flags: dex.read_u32_at(offset + OFFSET_ACCESS_FLAGS)?,
            superclass: dex.optional_type_name_at(superclass_index)?,
            source_file: dex.optional_string_at(source_file_index)?,
            interfaces_offset: dex.read_u32_at(offset + OFFSET_INTERFACES)?,
            annotations_offset: dex.read_u32_at(offset + OFFSET_ANNOTATIONS)?,
            class_data_offset: dex.read_u32_at(offset + OFFSET_CLASS_DATA)?,
            static_values_offset: dex.read_u32_at(offset + OFFSET_STATIC_VALUES)?,
        })
    }

    /// The class's type descriptor (e.g. `Lcom/example/Main;`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The class's access flags.
    #[must_use]
    pub fn access_flags(&self) -> AccessFlags {
        AccessFlags::from_raw(self.access_flags)
    }

    /// The superclass descriptor, or `None` for a class without one.
    #[must_use]
    pub fn superclass(&self) -> Option<&str> {
        self.superclass.as_deref()
    }

    /// The source file name, or `None` if the compiler did not record one.
    #[must_use]
    pub fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }

    /// The interfaces this class implements, as a fixed-stride list.
    ///
    /// # Errors
    /// Returns a decoding error if the referenced list is malformed.
    pub fn interfaces(&self) -> Result<TypeList<'a>> {
        TypeList::read_or_empty(self.dex, self.interfaces_offset)
    }

    /// The class-level annotation set.
    ///
    /// Resolved through the annotations directory, independently of the member
    /// streams.
    ///
    /// # Errors
    /// Returns a decoding error if the directory or the set is malformed.
    pub fn annotations(&self) -> Result<AnnotationSetList<'a>> {
        AnnotationsDirectory::new_or_empty(self.dex, self.annotations_offset).class_annotations()
    }

    /// The class's fields as a sequential stream view.
    ///
    /// Reads the class-data header afresh and scopes a
    /// [`crate::metadata::classes::FieldList`] to the field entries, wired to
    /// fresh annotation and static-value side channels. Returns an empty list if
    /// the class has no class data or declares zero fields.
    ///
    /// # Errors
    /// Returns a decoding error if the class-data header is malformed.
    pub fn fields(&self) -> Result<FieldList<'a>> {
        if self.class_data_offset == 0 {
            return Ok(FieldList::empty(self.dex));
        }

        let mut parser = self.dex.parser_at(self.class_data_offset as usize)?;
        let header = ClassDataHeader::read(&mut parser)?;

        let field_count = header.field_count()?;
        if field_count == 0 {
            return Ok(FieldList::empty(self.dex));
        }

        Ok(FieldList::new(
            self.dex,
            parser.pos(),
            field_count,
            header.static_fields,
            self.annotations_offset,
            self.static_values_offset,
        ))
    }

    /// The class's methods as a sequential stream view.
    ///
    /// Decoded symmetrically with [`ClassDef::fields`]: the same class-data
    /// header is read, the field entries are skipped byte-exactly, and the
    /// method entries follow at the resulting cursor position. Returns an empty
    /// list if the class has no class data or declares zero methods.
    ///
    /// # Errors
    /// Returns a decoding error if the class-data header or any field entry on
    /// the way is malformed.
    pub fn methods(&self) -> Result<MethodList<'a>> {
        if self.class_data_offset == 0 {
            return Ok(MethodList::empty(self.dex));
        }

        let mut parser = self.dex.parser_at(self.class_data_offset as usize)?;
        let header = ClassDataHeader::read(&mut parser)?;

        let method_count = header.method_count()?;
        if method_count == 0 {
            return Ok(MethodList::empty(self.dex));
        }

        // The method entries start where the field entries end; walking is the
        // only way to find that position
        let mut fields = MemberWalker::new(
            parser,
            MemberKind::Field,
            header.field_count()?,
            crate::metadata::annotations::AnnotationIterator::empty(),
            StaticValuesIterator::empty(),
        );
        while fields.skip_next()? {}
        let parser = fields.into_parser();

        Ok(MethodList::new(
            self.dex,
            parser.pos(),
            method_count,
            header.direct_methods,
            self.annotations_offset,
        ))
    }
}

/// Fixed-stride view over the container's class definition table.
///
/// Every `class_def_item` is 32 bytes, so the record at index `i` lives at
/// `class_defs_offset + 32 * i`. Each `get` constructs a fresh
/// [`ClassDef`]; nothing is cached between calls.
pub struct ClassDefList<'a> {
    dex: DexData<'a>,
    offset: u32,
    count: u32,
}

impl<'a> ClassDefList<'a> {
    pub(crate) fn new(dex: DexData<'a>) -> ClassDefList<'a> {
        ClassDefList {
            dex,
            offset: dex.header().class_defs_offset,
            count: dex.header().class_defs_size,
        }
    }

    /// Number of class definitions in the container.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.count
    }

    /// Returns `true` if the container defines no classes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Read the class definition at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfRange`] if `index >= size()`, or any
    /// error from [`ClassDef::read`].
    pub fn get(&self, index: u32) -> Result<ClassDef<'a>> {
        if index >= self.count {
            return Err(crate::Error::IndexOutOfRange {
                index,
                size: self.count,
            });
        }

        ClassDef::read(
            self.dex,
            self.offset as usize + index as usize * CLASS_DEF_ITEM_SIZE,
        )
    }

    /// Iterator over all class definitions.
    pub fn iter(&self) -> ClassDefIterator<'a> {
        ClassDefIterator {
            list: ClassDefList {
                dex: self.dex,
                offset: self.offset,
                count: self.count,
            },
            current: 0,
        }
    }
}

/// Iterator over the class definition table.
pub struct ClassDefIterator<'a> {
    list: ClassDefList<'a>,
    current: u32,
}

impl<'a> Iterator for ClassDefIterator<'a> {
    type Item = Result<ClassDef<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.list.count {
            return None;
        }

        let item = self.list.get(self.current);
        self.current += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = (self.list.count - self.current) as usize;
        (len, Some(len))
    }
}

impl<'a> ExactSizeIterator for ClassDefIterator<'a> {}
