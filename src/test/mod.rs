//! Shared functionality for assembling synthetic containers in unit tests.

use sha1::{Digest, Sha1};

use crate::metadata::header::{adler32, DexHeader, HEADER_SIZE};

/// Incremental builder for a minimal, internally consistent DEX buffer.
///
/// Content is appended in call order after a reserved header block; `finish`
/// stamps the magic, sizes, checksum and signature and re-parses the result so
/// tests get a validated [`DexHeader`] alongside the bytes.
///
/// String helpers are ASCII-only: for ASCII the MUTF-8 encoding is the identity
/// and the UTF-16 length equals the byte length. Tests exercising non-ASCII
/// decoding craft their bytes by hand.
pub(crate) struct DexBuilder {
    data: Vec<u8>,
}

impl DexBuilder {
    pub(crate) fn new() -> DexBuilder {
        DexBuilder {
            data: vec![0_u8; HEADER_SIZE],
        }
    }

    /// Current append position.
    pub(crate) fn pos(&self) -> u32 {
        self.data.len() as u32
    }

    pub(crate) fn u8(&mut self, value: u8) {
        self.data.push(value);
    }

    pub(crate) fn u16(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn u32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn uleb128(&mut self, mut value: u32) {
        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                self.data.push(byte);
                break;
            }
            self.data.push(byte | 0x80);
        }
    }

    pub(crate) fn align4(&mut self) {
        while self.data.len() % 4 != 0 {
            self.data.push(0);
        }
    }

    /// Append a `u32` placeholder, returning its position for later patching.
    pub(crate) fn reserve_u32(&mut self) -> usize {
        let at = self.data.len();
        self.u32(0);
        at
    }

    pub(crate) fn patch_u32(&mut self, at: usize, value: u32) {
        self.data[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Emit string data items and the string id table for the given ASCII strings.
    pub(crate) fn strings(&mut self, items: &[&str]) {
        let mut offsets = Vec::with_capacity(items.len());
        for item in items {
            assert!(item.is_ascii(), "builder strings must be ASCII");
            offsets.push(self.pos());
            self.uleb128(item.len() as u32);
            self.data.extend_from_slice(item.as_bytes());
            self.u8(0);
        }

        self.align4();
        let ids_offset = self.pos();
        for offset in offsets {
            self.u32(offset);
        }

        self.patch_u32(0x38, items.len() as u32);
        self.patch_u32(0x3C, ids_offset);
    }

    /// Emit the type id table, each entry naming a string by index.
    pub(crate) fn types(&mut self, string_indexes: &[u32]) {
        self.align4();
        let ids_offset = self.pos();
        for index in string_indexes {
            self.u32(*index);
        }

        self.patch_u32(0x40, string_indexes.len() as u32);
        self.patch_u32(0x44, ids_offset);
    }

    /// Record the class definition table's position in the header.
    pub(crate) fn class_defs(&mut self, offset: u32, count: u32) {
        self.patch_u32(0x60, count);
        self.patch_u32(0x64, offset);
    }

    /// Stamp the header, compute integrity fields, and parse the result.
    pub(crate) fn finish(mut self) -> (Vec<u8>, DexHeader) {
        self.data[0..8].copy_from_slice(b"dex\n039\0");
        let file_size = self.data.len() as u32;
        self.patch_u32(0x20, file_size);
        self.patch_u32(0x24, HEADER_SIZE as u32);
        self.patch_u32(0x28, 0x1234_5678);
        self.patch_u32(0x68, file_size - HEADER_SIZE as u32);
        self.patch_u32(0x6C, HEADER_SIZE as u32);

        let signature = Sha1::digest(&self.data[32..]);
        self.data[12..32].copy_from_slice(signature.as_slice());
        let checksum = adler32(&self.data[12..]);
        self.patch_u32(0x08, checksum);

        let header = DexHeader::parse(&self.data).expect("builder produced an invalid header");
        (self.data, header)
    }
}
