//! Static initial value stream.
//!
//! A class with explicit static initial values points at an `encoded_array_item`:
//! a uleb128 element count followed by one `encoded_value` per static field, in
//! declaration order. The array may be shorter than the static field count -
//! remaining fields take their type's default value.
//!
//! This crate does not decode values. The iterator advances over each value
//! byte-exactly and hands out an [`EncodedValueRef`] - the value's tag and its
//! absolute offset - so that alignment with the field stream is preserved while
//! value decoding stays with external consumers.

use strum::FromRepr;

use crate::{file::Parser, metadata::DexData, Result};

/// Deepest `encoded_value` nesting accepted while skipping.
const MAX_VALUE_DEPTH: usize = 64;

/// Tag of an `encoded_value`, from the low five bits of its header byte.
#[derive(FromRepr, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ValueType {
    /// Signed one-byte integer
    Byte = 0x00,
    /// Signed two-byte integer
    Short = 0x02,
    /// Unsigned two-byte integer
    Char = 0x03,
    /// Signed four-byte integer
    Int = 0x04,
    /// Signed eight-byte integer
    Long = 0x06,
    /// Four-byte floating point value
    Float = 0x10,
    /// Eight-byte floating point value
    Double = 0x11,
    /// Index into the prototype id table
    MethodType = 0x15,
    /// Index into the method handle table
    MethodHandle = 0x16,
    /// Index into the string id table
    String = 0x17,
    /// Index into the type id table
    Type = 0x18,
    /// Index into the field id table
    Field = 0x19,
    /// Index into the method id table
    Method = 0x1A,
    /// Index into the field id table, naming an enum constant
    Enum = 0x1B,
    /// Inline `encoded_array`
    Array = 0x1C,
    /// Inline `encoded_annotation`
    Annotation = 0x1D,
    /// `null`, no payload
    Null = 0x1E,
    /// Boolean, stored in the header's argument bits
    Boolean = 0x1F,
}

/// Position and tag of one undecoded `encoded_value`.
///
/// The offset points at the value's header byte; external decoders can resume
/// there with full knowledge of the tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodedValueRef {
    offset: usize,
    value_type: ValueType,
}

impl EncodedValueRef {
    /// Absolute offset of the value's header byte.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The value's tag.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }
}

/// Positional iterator over one `encoded_array_item` of static initial values.
///
/// The field stream advances this iterator exactly once per field element it
/// produces or skips. Static fields come first in the stream and the array never
/// holds more entries than there are static fields, so positional consumption
/// keeps values aligned with their fields. Once the declared element count is
/// exhausted the iterator yields `None` forever - the remaining fields have
/// implicit default values.
pub struct StaticValuesIterator<'a> {
    parser: Parser<'a>,
    remaining: u32,
}

impl<'a> StaticValuesIterator<'a> {
    /// Build an iterator over the array at `offset`, or an exhausted iterator for
    /// offset `0`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `offset` lies outside the buffer,
    /// or [`crate::Error::Malformed`] if the element count is not a valid uleb128.
    pub fn new_or_empty(dex: DexData<'a>, offset: u32) -> Result<StaticValuesIterator<'a>> {
        if offset == 0 {
            return Ok(StaticValuesIterator::empty());
        }

        let mut parser = dex.parser_at(offset as usize)?;
        let remaining = parser.read_uleb128()?;

        Ok(StaticValuesIterator { parser, remaining })
    }

    /// An iterator that is exhausted from the start.
    #[must_use]
    pub(crate) fn empty() -> StaticValuesIterator<'static> {
        StaticValuesIterator {
            parser: Parser::new(&[]),
            remaining: 0,
        }
    }

    /// Number of values not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Advance past one value; `None` once the array is exhausted.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] or [`crate::Error::Malformed`] if the
    /// value's encoding is invalid - skipping validates exactly as much as a
    /// decode would.
    pub(crate) fn advance(&mut self) -> Result<Option<EncodedValueRef>> {
        if self.remaining == 0 {
            return Ok(None);
        }

        let offset = self.parser.pos();
        let value_type = skip_encoded_value(&mut self.parser, 0)?;
        self.remaining -= 1;

        Ok(Some(EncodedValueRef { offset, value_type }))
    }
}

/// Consume one `encoded_value`, returning its tag.
///
/// The header byte carries the tag in its low five bits and a size argument in the
/// high three. Scalar values occupy `argument + 1` payload bytes; arrays and
/// annotations recurse over their elements; `null` and booleans have no payload.
fn skip_encoded_value(parser: &mut Parser, depth: usize) -> Result<ValueType> {
    if depth > MAX_VALUE_DEPTH {
        return Err(crate::Error::RecursionLimit(MAX_VALUE_DEPTH));
    }

    let header = parser.read_le::<u8>()?;
    let argument = usize::from(header >> 5);

    let Some(value_type) = ValueType::from_repr(header & 0x1F) else {
        return Err(malformed_error!(
            "Invalid encoded value tag {:#04x} at offset {}",
            header & 0x1F,
            parser.pos() - 1
        ));
    };

    match value_type {
        ValueType::Byte
        | ValueType::Short
        | ValueType::Char
        | ValueType::Int
        | ValueType::Long
        | ValueType::Float
        | ValueType::Double
        | ValueType::MethodType
        | ValueType::MethodHandle
        | ValueType::String
        | ValueType::Type
        | ValueType::Field
        | ValueType::Method
        | ValueType::Enum => parser.advance_by(argument + 1)?,
        ValueType::Array => {
            let size = parser.read_uleb128()?;
            for _ in 0..size {
                skip_encoded_value(parser, depth + 1)?;
            }
        }
        ValueType::Annotation => {
            parser.skip_uleb128()?; // type index
            let size = parser.read_uleb128()?;
            for _ in 0..size {
                parser.skip_uleb128()?; // element name index
                skip_encoded_value(parser, depth + 1)?;
            }
        }
        ValueType::Null | ValueType::Boolean => {}
    }

    Ok(value_type)
}
