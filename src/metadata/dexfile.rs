//! Main entry point for DEX container analysis.

use std::path::Path;

use crate::{
    file::File,
    metadata::{
        classes::{ClassDef, ClassDefList},
        header::DexHeader,
        pools::{StringPool, TypePool},
        DexData,
    },
    Result,
};

/// One loaded DEX container.
///
/// `DexFile` owns the backing bytes (a memory map or an owned buffer) and the
/// parsed header - nothing else. Every accessor below hands out a *fresh* view
/// constructed from header offsets: pools, class tables and record views are
/// restartable, never memoized, and independent traversals never share cursor
/// state. The buffer itself is immutable, so any number of threads may hold and
/// walk views concurrently.
///
/// # Examples
///
/// ```rust,no_run
/// use dexscope::DexFile;
/// use std::path::Path;
///
/// let dex = DexFile::from_file(Path::new("classes.dex"))?;
/// println!("format version {:03}", dex.header().version());
///
/// for class in dex.class_defs().iter() {
///     println!("{}", class?.name());
/// }
/// # Ok::<(), dexscope::Error>(())
/// ```
pub struct DexFile {
    file: File,
    header: DexHeader,
}

impl DexFile {
    /// Load a container from disk via memory mapping.
    ///
    /// # Arguments
    /// * `path` - Path of the `.dex` file to load
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] for I/O failures, plus anything
    /// [`DexHeader::parse`] rejects.
    pub fn from_file(path: &Path) -> Result<DexFile> {
        Self::from_backing(File::from_file(path)?)
    }

    /// Take ownership of an in-memory container.
    ///
    /// # Arguments
    /// * `data` - The raw container bytes
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for an empty buffer, plus anything
    /// [`DexHeader::parse`] rejects.
    pub fn from_mem(data: Vec<u8>) -> Result<DexFile> {
        Self::from_backing(File::from_mem(data)?)
    }

    fn from_backing(file: File) -> Result<DexFile> {
        let header = DexHeader::parse(file.data())?;
        Ok(DexFile { file, header })
    }

    /// The parsed container header.
    #[must_use]
    pub fn header(&self) -> &DexHeader {
        &self.header
    }

    /// The complete container buffer.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.file.data()
    }

    /// The borrowed handle (buffer + header) every view is built from.
    ///
    /// Useful for constructing views directly, e.g.
    /// [`crate::metadata::classes::ClassDef::read`] at an offset obtained
    /// elsewhere.
    #[must_use]
    pub fn view(&self) -> DexData<'_> {
        DexData::new(self.file.data(), &self.header)
    }

    /// A fresh view over the string id pool.
    #[must_use]
    pub fn strings(&self) -> StringPool<'_> {
        self.view().strings()
    }

    /// A fresh view over the type id pool.
    #[must_use]
    pub fn types(&self) -> TypePool<'_> {
        self.view().types()
    }

    /// A fresh view over the class definition table.
    #[must_use]
    pub fn class_defs(&self) -> ClassDefList<'_> {
        ClassDefList::new(self.view())
    }

    /// Read the class definition record at an absolute byte offset.
    ///
    /// # Errors
    /// Returns anything [`ClassDef::read`] rejects.
    pub fn class_def_at(&self, offset: usize) -> Result<ClassDef<'_>> {
        ClassDef::read(self.view(), offset)
    }

    /// Recompute the container's adler32 checksum and SHA-1 signature and
    /// compare them against the header.
    ///
    /// # Errors
    /// Returns [`crate::Error::InconsistentHeader`] naming the first mismatch.
    pub fn verify(&self) -> Result<()> {
        self.header.verify(self.file.data())
    }
}
