use crate::{Error, LengthMismatchStrategy};
use std::borrow::Cow;
use std::fmt;

/// Growable big-endian byte buffer with independent read and write positions.
///
/// Reads start at the read offset and move it forward. Writes always append
/// to the end of the written region. Every integer writer accepts any integer
/// type and verifies that the value fits the wire width before a single byte
/// is written, so a value that would be truncated surfaces as an
/// [`OutOfRange`](crate::ErrorKind::OutOfRange) error instead of corrupt
/// output.
///
/// ```
/// use msav::{ByteCursor, ErrorKind};
///
/// let mut cursor = ByteCursor::new();
/// cursor.write_i16(-2)?;
/// cursor.write_string("duo")?;
/// assert!(matches!(
///     cursor.write_u8(256).unwrap_err().kind(),
///     ErrorKind::OutOfRange { .. }
/// ));
///
/// assert_eq!(cursor.read_i16()?, -2);
/// assert_eq!(cursor.read_string()?, "duo");
/// assert_eq!(cursor.remaining(), 0);
/// # Ok::<(), msav::Error>(())
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ByteCursor {
    buf: Vec<u8>,
    pos: usize,
    pub(crate) mismatch: LengthMismatchStrategy,
}

macro_rules! be_reader {
    ($(#[$attr:meta])* $name:ident, $ty:ty) => {
        $(#[$attr])*
        #[inline]
        pub fn $name(&mut self) -> Result<$ty, Error> {
            self.take().map(<$ty>::from_be_bytes)
        }
    };
}

macro_rules! be_writer {
    ($(#[$attr:meta])* $name:ident, $ty:ty, $wire:literal) => {
        $(#[$attr])*
        #[inline]
        pub fn $name<T>(&mut self, value: T) -> Result<(), Error>
        where
            T: TryInto<$ty> + Copy + fmt::Display,
        {
            let data: $ty = value
                .try_into()
                .map_err(|_| Error::out_of_range(value, $wire))?;
            self.buf.extend_from_slice(&data.to_be_bytes());
            Ok(())
        }
    };
}

impl ByteCursor {
    /// Create an empty cursor
    pub fn new() -> Self {
        ByteCursor::default()
    }

    /// Create a cursor that reads the given bytes from the start
    pub fn from_vec(buf: Vec<u8>) -> Self {
        ByteCursor {
            buf,
            ..ByteCursor::default()
        }
    }

    /// Set how [`read_chunk`](Self::read_chunk) reacts to a chunk whose body
    /// does not consume its declared length
    pub fn with_length_mismatch(mut self, strategy: LengthMismatchStrategy) -> Self {
        self.mismatch = strategy;
        self
    }

    /// Rewind the read offset to the start of the buffer
    pub fn reset(&mut self) {
        self.pos = 0;
    }

    /// Replace the backing buffer. The read offset is left untouched, so
    /// callers decoding a fresh buffer follow up with [`reset`](Self::reset).
    pub fn set_buffer(&mut self, buf: Vec<u8>) {
        self.buf = buf;
    }

    /// Drop all data and start over with `reserve` bytes of capacity set
    /// aside for writes
    pub fn clear(&mut self, reserve: usize) {
        self.buf = Vec::with_capacity(reserve);
        self.pos = 0;
    }

    /// The read offset
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes written so far (the write offset)
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been written
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes left between the read offset and the write offset
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// View the written bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the cursor and return the written bytes
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Move the read offset to an absolute position within the written data
    pub fn seek(&mut self, pos: usize) -> Result<(), Error> {
        if pos > self.buf.len() {
            let len = self.buf.len();
            return Err(Error::end_of_buffer(len, pos - len));
        }

        self.pos = pos;
        Ok(())
    }

    #[inline]
    fn take<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let data = self
            .buf
            .get(self.pos..)
            .and_then(|rest| rest.first_chunk::<N>())
            .copied()
            .ok_or_else(|| Error::end_of_buffer(self.pos, N))?;
        self.pos += N;
        Ok(data)
    }

    /// Read a fixed number of raw bytes
    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8], Error> {
        let start = self.pos;
        let data = start
            .checked_add(len)
            .and_then(|end| self.buf.get(start..end))
            .ok_or_else(|| Error::end_of_buffer(start, len))?;
        self.pos += len;
        Ok(data)
    }

    /// Read a fixed size array of raw bytes
    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        self.take()
    }

    /// Read a single byte where any nonzero value is true
    #[inline]
    pub fn read_bool(&mut self) -> Result<bool, Error> {
        Ok(self.read_u8()? != 0)
    }

    be_reader!(
        /// Read a signed byte
        read_i8,
        i8
    );
    be_reader!(
        /// Read an unsigned byte
        read_u8,
        u8
    );
    be_reader!(read_i16, i16);
    be_reader!(read_u16, u16);
    be_reader!(read_i32, i32);
    be_reader!(read_u32, u32);
    be_reader!(read_i64, i64);
    be_reader!(read_u64, u64);
    be_reader!(read_f32, f32);
    be_reader!(read_f64, f64);

    /// Read `len` bytes as text. Invalid UTF-8 sequences are replaced rather
    /// than rejected.
    pub fn read_utf8(&mut self, len: usize) -> Result<String, Error> {
        let data = self.read_bytes(len)?;
        Ok(String::from_utf8_lossy(data).into_owned())
    }

    /// Read text prefixed by its byte length as an unsigned 16 bit integer.
    /// The text is in the game's modified UTF-8: nul is stored as `C0 80`
    /// and characters past U+FFFF as two three byte surrogates.
    pub fn read_string(&mut self) -> Result<String, Error> {
        let len = self.read_u16()?;
        let data = self.read_bytes(usize::from(len))?;
        Ok(decode_modified_utf8(data).into_owned())
    }

    /// Read a counted sequence of key value string pairs, keeping wire order
    pub fn read_string_map(&mut self) -> Result<Vec<(String, String)>, Error> {
        let count = self.read_u16()?;
        let mut result = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let key = self.read_string()?;
            let value = self.read_string()?;
            result.push((key, value));
        }

        Ok(result)
    }

    /// Append raw bytes
    #[inline]
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Write a bool as a single byte
    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    be_writer!(
        /// Write a signed byte
        write_i8,
        i8,
        "int8"
    );
    be_writer!(
        /// Write an unsigned byte
        write_u8,
        u8,
        "uint8"
    );
    be_writer!(write_i16, i16, "int16");
    be_writer!(write_u16, u16, "uint16");
    be_writer!(write_i32, i32, "int32");
    be_writer!(write_u32, u32, "uint32");
    be_writer!(write_i64, i64, "int64");
    be_writer!(write_u64, u64, "uint64");

    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    #[inline]
    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write text without a length prefix
    #[inline]
    pub fn write_utf8(&mut self, value: &str) {
        self.buf.extend_from_slice(value.as_bytes());
    }

    /// Write text in modified UTF-8 prefixed by its encoded byte length
    pub fn write_string(&mut self, value: &str) -> Result<(), Error> {
        let data = encode_modified_utf8(value);
        self.write_u16(data.len())?;
        self.write_bytes(&data);
        Ok(())
    }

    /// Write a counted sequence of key value string pairs
    pub fn write_string_map<'a, I>(&mut self, entries: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
        I::IntoIter: ExactSizeIterator,
    {
        let entries = entries.into_iter();
        self.write_u16(entries.len())?;
        for (key, value) in entries {
            self.write_string(key)?;
            self.write_string(value)?;
        }

        Ok(())
    }

    /// Overwrite two previously written bytes
    pub fn patch_u16(&mut self, at: usize, value: usize) -> Result<(), Error> {
        let data = u16::try_from(value).map_err(|_| Error::out_of_range(value, "uint16"))?;
        self.patch(at, &data.to_be_bytes())
    }

    /// Overwrite four previously written bytes
    pub fn patch_i32(&mut self, at: usize, value: usize) -> Result<(), Error> {
        let data = i32::try_from(value).map_err(|_| Error::out_of_range(value, "int32"))?;
        self.patch(at, &data.to_be_bytes())
    }

    fn patch(&mut self, at: usize, data: &[u8]) -> Result<(), Error> {
        let len = self.buf.len();
        let dst = at
            .checked_add(data.len())
            .and_then(|end| self.buf.get_mut(at..end))
            .ok_or_else(|| Error::end_of_buffer(len, data.len()))?;
        dst.copy_from_slice(data);
        Ok(())
    }
}

#[inline]
fn is_continuation(x: u8) -> bool {
    x & 0xc0 == 0x80
}

fn decode_modified_utf8(data: &[u8]) -> Cow<'_, str> {
    if !data.iter().any(|&x| x == 0xc0 || x == 0xed) {
        if let Ok(text) = std::str::from_utf8(data) {
            return Cow::Borrowed(text);
        }
    }

    // collect utf-16 units so surrogate halves pair up
    let mut units: Vec<u16> = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        let b = data[i];
        let next = move |n: usize| data.get(i + n).copied().filter(|&x| is_continuation(x));
        match b {
            0x00..=0x7f => {
                units.push(u16::from(b));
                i += 1;
            }
            0xc0..=0xdf => match next(1) {
                Some(c) => {
                    units.push(u16::from(b & 0x1f) << 6 | u16::from(c & 0x3f));
                    i += 2;
                }
                None => {
                    units.push(0xfffd);
                    i += 1;
                }
            },
            0xe0..=0xef => match (next(1), next(2)) {
                (Some(c1), Some(c2)) => {
                    units.push(
                        u16::from(b & 0x0f) << 12
                            | u16::from(c1 & 0x3f) << 6
                            | u16::from(c2 & 0x3f),
                    );
                    i += 3;
                }
                _ => {
                    units.push(0xfffd);
                    i += 1;
                }
            },
            0xf0..=0xf4 => {
                let end = (i + 4).min(data.len());
                match std::str::from_utf8(&data[i..end]).ok().and_then(|x| x.chars().next()) {
                    Some(c) => {
                        let mut pair = [0u16; 2];
                        units.extend_from_slice(c.encode_utf16(&mut pair));
                        i += 4;
                    }
                    None => {
                        units.push(0xfffd);
                        i += 1;
                    }
                }
            }
            _ => {
                units.push(0xfffd);
                i += 1;
            }
        }
    }

    Cow::Owned(String::from_utf16_lossy(&units))
}

fn encode_modified_utf8(value: &str) -> Cow<'_, [u8]> {
    if !value.chars().any(|c| c == '\0' || c > '\u{ffff}') {
        return Cow::Borrowed(value.as_bytes());
    }

    let mut out = Vec::with_capacity(value.len() + 4);
    for c in value.chars() {
        if c == '\0' {
            out.extend_from_slice(&[0xc0, 0x80]);
        } else if c > '\u{ffff}' {
            let mut pair = [0u16; 2];
            for &unit in c.encode_utf16(&mut pair).iter() {
                out.push(0xe0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3f) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            }
        } else {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
    }

    Cow::Owned(out)
}
