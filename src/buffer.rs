use crate::encoding::Encoding;
use crate::error::CoreError;
use bytes::{BufMut, BytesMut};
use std::fmt::{self, Display};

/// An auto-growing sequence of bytes, addressable both sequentially and
/// randomly.
///
/// There are two write disciplines over the same storage: the `append_*`
/// methods write at the current length and advance it, while the `set_*`
/// methods write at an absolute position, extending the length (and
/// zero-filling any gap) when the write lands past the end. The `get_*`
/// methods read at an absolute position and fail with
/// [`CoreError::OutOfBounds`] rather than truncating.
///
/// All multi-byte values use network byte order (big-endian). Length never
/// decreases and capacity never shrinks. Write methods return `&mut Self`
/// so operations can be chained:
///
/// ```
/// use bytepump::Buffer;
///
/// let mut buf = Buffer::new();
/// buf.append_i32(42).append_str("hello");
/// assert_eq!(buf.len(), 9);
/// assert_eq!(buf.get_i32(0).unwrap(), 42);
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Buffer {
    data: BytesMut,
}

impl Buffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            data: BytesMut::new(),
        }
    }

    /// Create an empty buffer with pre-allocated backing storage.
    ///
    /// The hint affects only the initial capacity; the length of a new
    /// buffer is always zero.
    pub fn with_capacity(hint: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(hint),
        }
    }

    /// Create a buffer containing a copy of `bytes`.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            data: BytesMut::from(bytes),
        }
    }

    /// Create a buffer containing `s` encoded with the named encoding.
    ///
    /// Fails with [`CoreError::UnsupportedEncoding`] if the name is not
    /// recognized.
    pub fn from_string(s: &str, encoding: &str) -> Result<Self, CoreError> {
        let enc = Encoding::for_name(encoding)?;
        Ok(Self {
            data: BytesMut::from(enc.encode(s).as_slice()),
        })
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Allocated backing size. Always >= `len()`; grows automatically and
    /// never shrinks.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    // --- appends ---------------------------------------------------------

    pub fn append_u8(&mut self, v: u8) -> &mut Self {
        self.data.put_u8(v);
        self
    }

    pub fn append_i16(&mut self, v: i16) -> &mut Self {
        self.data.put_i16(v);
        self
    }

    pub fn append_i32(&mut self, v: i32) -> &mut Self {
        self.data.put_i32(v);
        self
    }

    pub fn append_i64(&mut self, v: i64) -> &mut Self {
        self.data.put_i64(v);
        self
    }

    pub fn append_f32(&mut self, v: f32) -> &mut Self {
        self.data.put_f32(v);
        self
    }

    pub fn append_f64(&mut self, v: f64) -> &mut Self {
        self.data.put_f64(v);
        self
    }

    /// Append a raw byte sequence.
    pub fn append_slice(&mut self, bytes: &[u8]) -> &mut Self {
        self.data.put_slice(bytes);
        self
    }

    /// Append the full contents of another buffer. The source is not
    /// modified.
    pub fn append_buffer(&mut self, other: &Buffer) -> &mut Self {
        self.data.put_slice(&other.data);
        self
    }

    /// Append `s` encoded as UTF-8.
    pub fn append_str(&mut self, s: &str) -> &mut Self {
        self.data.put_slice(s.as_bytes());
        self
    }

    /// Append `s` encoded with the given encoding.
    pub fn append_string(&mut self, s: &str, encoding: Encoding) -> &mut Self {
        self.data.put_slice(&encoding.encode(s));
        self
    }

    // --- positional sets -------------------------------------------------

    /// Write `src` starting at absolute position `pos`.
    ///
    /// If `pos + src.len()` exceeds the current length, the buffer grows
    /// to cover it; bytes between the old length and `pos` are
    /// zero-filled.
    pub fn set_slice(&mut self, pos: usize, src: &[u8]) -> &mut Self {
        let end = pos + src.len();
        if self.data.len() < end {
            self.data.resize(end, 0);
        }
        self.data[pos..end].copy_from_slice(src);
        self
    }

    pub fn set_u8(&mut self, pos: usize, v: u8) -> &mut Self {
        self.set_slice(pos, &[v])
    }

    pub fn set_i16(&mut self, pos: usize, v: i16) -> &mut Self {
        self.set_slice(pos, &v.to_be_bytes())
    }

    pub fn set_i32(&mut self, pos: usize, v: i32) -> &mut Self {
        self.set_slice(pos, &v.to_be_bytes())
    }

    pub fn set_i64(&mut self, pos: usize, v: i64) -> &mut Self {
        self.set_slice(pos, &v.to_be_bytes())
    }

    pub fn set_f32(&mut self, pos: usize, v: f32) -> &mut Self {
        self.set_slice(pos, &v.to_be_bytes())
    }

    pub fn set_f64(&mut self, pos: usize, v: f64) -> &mut Self {
        self.set_slice(pos, &v.to_be_bytes())
    }

    /// Write the full contents of another buffer at `pos`. The source is
    /// not modified.
    pub fn set_buffer(&mut self, pos: usize, other: &Buffer) -> &mut Self {
        self.set_slice(pos, &other.data)
    }

    /// Write `s` encoded with the given encoding at `pos`.
    pub fn set_string(&mut self, pos: usize, s: &str, encoding: Encoding) -> &mut Self {
        self.set_slice(pos, &encoding.encode(s))
    }

    // --- positional gets -------------------------------------------------

    fn checked(&self, pos: usize, width: usize) -> Result<&[u8], CoreError> {
        let end = pos.checked_add(width).ok_or(CoreError::OutOfBounds {
            start: pos,
            end: usize::MAX,
            len: self.data.len(),
        })?;
        if end > self.data.len() {
            return Err(CoreError::OutOfBounds {
                start: pos,
                end,
                len: self.data.len(),
            });
        }
        Ok(&self.data[pos..end])
    }

    pub fn get_u8(&self, pos: usize) -> Result<u8, CoreError> {
        Ok(self.checked(pos, 1)?[0])
    }

    pub fn get_i16(&self, pos: usize) -> Result<i16, CoreError> {
        Ok(i16::from_be_bytes(self.checked(pos, 2)?.try_into().unwrap()))
    }

    pub fn get_i32(&self, pos: usize) -> Result<i32, CoreError> {
        Ok(i32::from_be_bytes(self.checked(pos, 4)?.try_into().unwrap()))
    }

    pub fn get_i64(&self, pos: usize) -> Result<i64, CoreError> {
        Ok(i64::from_be_bytes(self.checked(pos, 8)?.try_into().unwrap()))
    }

    pub fn get_f32(&self, pos: usize) -> Result<f32, CoreError> {
        Ok(f32::from_be_bytes(self.checked(pos, 4)?.try_into().unwrap()))
    }

    pub fn get_f64(&self, pos: usize) -> Result<f64, CoreError> {
        Ok(f64::from_be_bytes(self.checked(pos, 8)?.try_into().unwrap()))
    }

    /// Copy of the entire contents.
    pub fn get_bytes(&self) -> Vec<u8> {
        self.data.to_vec()
    }

    /// Copy of the bytes in `[start, end)`.
    ///
    /// Fails with [`CoreError::InvalidArgument`] when `start > end` and
    /// with [`CoreError::OutOfBounds`] when `end` exceeds the length.
    pub fn get_bytes_range(&self, start: usize, end: usize) -> Result<Vec<u8>, CoreError> {
        self.check_range(start, end)?;
        Ok(self.data[start..end].to_vec())
    }

    /// Independent snapshot of the entire buffer.
    pub fn copy(&self) -> Buffer {
        self.clone()
    }

    /// Independent snapshot of the bytes in `[start, end)`.
    pub fn copy_range(&self, start: usize, end: usize) -> Result<Buffer, CoreError> {
        self.check_range(start, end)?;
        Ok(Buffer::from_slice(&self.data[start..end]))
    }

    fn check_range(&self, start: usize, end: usize) -> Result<(), CoreError> {
        if start > end {
            return Err(CoreError::InvalidArgument(format!(
                "range start {} exceeds end {}",
                start, end
            )));
        }
        if end > self.data.len() {
            return Err(CoreError::OutOfBounds {
                start,
                end,
                len: self.data.len(),
            });
        }
        Ok(())
    }

    /// Decode the entire contents as text with the given encoding.
    ///
    /// Malformed input produces replacement characters per the encoding's
    /// policy; this never fails.
    pub fn string(&self, encoding: Encoding) -> String {
        encoding.decode(&self.data)
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<&[u8]> for Buffer {
    fn from(bytes: &[u8]) -> Self {
        Self::from_slice(bytes)
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            data: BytesMut::from(bytes.as_slice()),
        }
    }
}

impl From<&str> for Buffer {
    fn from(s: &str) -> Self {
        Self::from_slice(s.as_bytes())
    }
}

impl Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.data))
    }
}
