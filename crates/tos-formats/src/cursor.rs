//! Little-endian byte cursor shared by the table and archive codecs.
//!
//! [`ByteReader`] walks a borrowed slice and [`ByteWriter`] grows an owned
//! buffer. Both know the three string encodings used by the formats:
//!
//! - fixed-width fields, NUL-terminated inside the field and zero padded
//! - 16-bit length-prefixed byte strings, no terminator
//! - either of the above passed through [`bit_flip`]
//!
//! Integer accessors read and write unsigned widths directly. Where a format
//! field is unsigned but was historically handled through a signed type,
//! `read_u16`/`read_u32` reinterpret the same bits, so a value such as
//! `0xFFFF` stays `65535` and is never sign-extended.
//!
//! Strings decode as UTF-8; invalid sequences are replaced rather than
//! rejected, since the game data contains a few broken encodings.

use thiserror::Error;

/// Errors raised by cursor reads and writes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CursorError {
    /// Not enough bytes left in the input
    #[error("unexpected end of data at offset {offset}: needed {needed} bytes, {available} available")]
    UnexpectedEof {
        /// Position of the failed read
        offset: usize,
        /// Bytes the read needed
        needed: usize,
        /// Bytes that were left
        available: usize,
    },

    /// String does not fit its fixed-width field
    #[error("string of {len} bytes does not fit a {max} byte field")]
    StringTooLong {
        /// UTF-8 length of the string
        len: usize,
        /// Field width
        max: usize,
    },

    /// Value does not fit a 16-bit length prefix
    #[error("length {0} exceeds the 16-bit length prefix")]
    LengthOverflow(usize),

    /// Seek target lies outside the input
    #[error("seek to {target} is outside the {len} byte input")]
    SeekOutOfBounds {
        /// Requested position
        target: usize,
        /// Input length
        len: usize,
    },
}

/// Result alias for cursor operations.
pub type CursorResult<T> = std::result::Result<T, CursorError>;

/// XOR every byte with `0x01`.
///
/// Applying it twice restores the input.
pub fn bit_flip(bytes: &mut [u8]) {
    for byte in bytes {
        *byte ^= 1;
    }
}

/// Copy of `bytes` with [`bit_flip`] applied.
pub fn bit_flipped(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().map(|byte| byte ^ 1).collect()
}

/// Decode the bytes of a fixed field up to its first NUL.
fn decode_fixed(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Forward-only reader over a byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    /// Reader positioned at offset 0.
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current offset.
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Bytes left after the current offset.
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Move to an absolute offset. The end of input is a valid target.
    pub fn seek(&mut self, target: usize) -> CursorResult<()> {
        if target > self.data.len() {
            return Err(CursorError::SeekOutOfBounds {
                target,
                len: self.data.len(),
            });
        }
        self.position = target;
        Ok(())
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn read_bytes(&mut self, len: usize) -> CursorResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(CursorError::UnexpectedEof {
                offset: self.position,
                needed: len,
                available: self.remaining(),
            });
        }
        let slice = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> CursorResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> CursorResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read a little-endian `i16`.
    pub fn read_i16(&mut self) -> CursorResult<i16> {
        self.read_array().map(i16::from_le_bytes)
    }

    /// Read a little-endian `u16`.
    pub fn read_u16(&mut self) -> CursorResult<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// Read a little-endian `i32`.
    pub fn read_i32(&mut self) -> CursorResult<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Read a little-endian `u32`.
    pub fn read_u32(&mut self) -> CursorResult<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Read a little-endian IEEE-754 `f32`.
    pub fn read_f32(&mut self) -> CursorResult<f32> {
        self.read_array().map(f32::from_le_bytes)
    }

    /// Read a NUL-terminated string from a `max_len` byte field.
    ///
    /// Always consumes exactly `max_len` bytes.
    pub fn read_fixed_string(&mut self, max_len: usize) -> CursorResult<String> {
        self.read_bytes(max_len).map(decode_fixed)
    }

    /// Read a bit-flipped NUL-terminated string from a `max_len` byte field.
    ///
    /// Padding is stored unflipped, so the terminator is found on the raw
    /// bytes before the flip is undone.
    pub fn read_flipped_fixed_string(&mut self, max_len: usize) -> CursorResult<String> {
        let field = self.read_bytes(max_len)?;
        let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
        Ok(String::from_utf8_lossy(&bit_flipped(&field[..end])).into_owned())
    }

    /// Read a `u16` length followed by that many bytes.
    pub fn read_length_prefixed_bytes(&mut self) -> CursorResult<&'a [u8]> {
        let len = self.read_u16()?;
        self.read_bytes(usize::from(len))
    }

    /// Read a length-prefixed string.
    pub fn read_length_prefixed_string(&mut self) -> CursorResult<String> {
        self.read_length_prefixed_bytes()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a length-prefixed, bit-flipped string.
    pub fn read_flipped_string(&mut self) -> CursorResult<String> {
        self.read_length_prefixed_bytes()
            .map(|bytes| String::from_utf8_lossy(&bit_flipped(bytes)).into_owned())
    }
}

/// Growable little-endian writer.
#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
    buffer: Vec<u8>,
}

impl ByteWriter {
    /// Empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty writer with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Finish and return the buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Append one byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Append a little-endian `i16`.
    pub fn write_i16(&mut self, value: i16) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Append a little-endian `u16`.
    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Append a little-endian `i32`.
    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Append a little-endian `u32`.
    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Append a little-endian IEEE-754 `f32`.
    pub fn write_f32(&mut self, value: f32) {
        self.write_bytes(&value.to_le_bytes());
    }

    fn write_fixed(&mut self, bytes: &[u8], max_len: usize) -> CursorResult<()> {
        if bytes.len() > max_len {
            return Err(CursorError::StringTooLong {
                len: bytes.len(),
                max: max_len,
            });
        }
        self.write_bytes(bytes);
        self.buffer.resize(self.buffer.len() + max_len - bytes.len(), 0);
        Ok(())
    }

    /// Write `value` into a `max_len` byte field, zero padded.
    ///
    /// A string that fills the field exactly has no terminator.
    pub fn write_fixed_string(&mut self, value: &str, max_len: usize) -> CursorResult<()> {
        self.write_fixed(value.as_bytes(), max_len)
    }

    /// Write a bit-flipped string into a `max_len` byte field.
    ///
    /// Only the string bytes are flipped; padding stays `0x00`.
    pub fn write_flipped_fixed_string(&mut self, value: &str, max_len: usize) -> CursorResult<()> {
        self.write_fixed(&bit_flipped(value.as_bytes()), max_len)
    }

    /// Write a `u16` length followed by the bytes.
    pub fn write_length_prefixed_bytes(&mut self, bytes: &[u8]) -> CursorResult<()> {
        let len = u16::try_from(bytes.len()).map_err(|_| CursorError::LengthOverflow(bytes.len()))?;
        self.write_u16(len);
        self.write_bytes(bytes);
        Ok(())
    }

    /// Write a length-prefixed string.
    pub fn write_length_prefixed_string(&mut self, value: &str) -> CursorResult<()> {
        self.write_length_prefixed_bytes(value.as_bytes())
    }

    /// Write a length-prefixed, bit-flipped string.
    pub fn write_flipped_string(&mut self, value: &str) -> CursorResult<()> {
        self.write_length_prefixed_bytes(&bit_flipped(value.as_bytes()))
    }
}
