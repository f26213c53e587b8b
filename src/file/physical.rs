//! Physical file backend for memory-mapped I/O.
//!
//! This module provides the [`crate::file::physical::Physical`] backend that implements the
//! [`crate::file::Backend`] trait for accessing files from disk using memory-mapped I/O.
//! DEX containers are read in a non-sequential pattern when walking class definitions, so
//! mapping the file beats loading it upfront: pages are faulted in on demand and the
//! operating system handles caching.
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use dexscope::file::{Backend, Physical};
//! use std::path::Path;
//!
//! let physical = Physical::new(Path::new("classes.dex"))?;
//!
//! // DEX magic
//! let magic = physical.data_slice(0, 4)?;
//! assert_eq!(magic, b"dex\n");
//! # Ok::<(), dexscope::Error>(())
//! ```

use super::Backend;
use crate::Result;

use memmap2::Mmap;
use std::{fs, path::Path};

/// A file backend that uses memory-mapped I/O for efficient access to files on disk.
///
/// [`crate::file::physical::Physical`] maps the container directly into the process's
/// virtual address space. The mapping is read-only and shared; all access operations
/// include bounds checking to ensure memory safety.
#[derive(Debug)]
pub struct Physical {
    /// Memory-mapped file data
    data: Mmap,
}

impl Physical {
    /// Create a new physical file backend by memory-mapping the specified file.
    ///
    /// # Arguments
    /// * `path` - Path to the DEX file on disk. Accepts `&Path`, `&str`, `String`, or `PathBuf`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or memory
    /// mapping fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = fs::File::open(path)?;
        let mmap = unsafe { Mmap::map(&file) }?;

        Ok(Physical { data: mmap })
    }
}

impl Backend for Physical {
    fn data(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn physical_roundtrip() {
        let tmp = tempfile_path();
        {
            let mut f = fs::File::create(&tmp).unwrap();
            f.write_all(b"dex\n039\0rest-of-container").unwrap();
        }

        let physical = Physical::new(&tmp).unwrap();
        assert_eq!(physical.len(), 25);
        assert_eq!(physical.data_slice(0, 4).unwrap(), b"dex\n");
        assert!(physical.data_slice(20, 20).is_err());

        fs::remove_file(&tmp).unwrap();
    }

    #[test]
    fn physical_missing_file() {
        assert!(Physical::new("does-not-exist.dex").is_err());
    }

    fn tempfile_path() -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("dexscope-physical-{}.bin", std::process::id()));
        path
    }
}
