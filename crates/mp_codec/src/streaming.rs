use core::fmt;
use core::str;

use crate::format::{Deformatter, MSGPACK};
use crate::primitives::{DecodeOutcome, try_read_structure_len_with};
use crate::{DecodeError, DecodeErrorKind, Extension, ExtensionHeader, Integer, Timestamp, TokenType};

// -----------------------------------------------------------------------------
// DecodeResult

/// The outcome of a decode attempt that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum DecodeResult<T> {
    Success(T),
    /// No bytes at all were available.
    EmptyBuffer,
    /// A token was started but not all of its bytes are available.
    InsufficientBuffer,
}

impl<T> DecodeResult<T> {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Converts into an `Option`, discarding why data was missing.
    #[inline]
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DecodeResult<U> {
        match self {
            Self::Success(v) => DecodeResult::Success(f(v)),
            Self::EmptyBuffer => DecodeResult::EmptyBuffer,
            Self::InsufficientBuffer => DecodeResult::InsufficientBuffer,
        }
    }
}

/// The outcome of a [`StreamingReader`] read.
pub type DecodeStep<T> = Result<DecodeResult<T>, DecodeError>;

macro_rules! pending {
    ($res:expr) => {
        match $res {
            DecodeResult::Success(found) => found,
            DecodeResult::EmptyBuffer => return Ok(DecodeResult::EmptyBuffer),
            DecodeResult::InsufficientBuffer => return Ok(DecodeResult::InsufficientBuffer),
        }
    };
}

// -----------------------------------------------------------------------------
// StreamingReader

/// A cursor that never fails on incomplete data.
///
/// Reads that run out of bytes return `EmptyBuffer` or `InsufficientBuffer`
/// and leave the cursor where it was, so the caller can append more input and
/// retry from the same position. The reader is `Copy`: taking a copy is how a
/// caller saves a position to roll back to.
///
/// # Examples
///
/// ```
/// use mp_codec::{DecodeResult, StreamingReader};
///
/// let mut reader = StreamingReader::new(&[0xa3, b'a', b'b']);
/// assert_eq!(reader.try_read_str().unwrap(), DecodeResult::InsufficientBuffer);
/// assert_eq!(reader.position(), 0);
/// ```
#[derive(Clone, Copy)]
pub struct StreamingReader<'a> {
    buffer: &'a [u8],
    position: usize,
    deformatter: &'a dyn Deformatter,
}

impl fmt::Debug for StreamingReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingReader")
            .field("len", &self.buffer.len())
            .field("position", &self.position)
            .field("deformatter", &self.deformatter)
            .finish()
    }
}

impl<'a> StreamingReader<'a> {
    #[inline]
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::with_deformatter(buffer, &MSGPACK)
    }

    #[inline]
    pub fn with_deformatter(buffer: &'a [u8], deformatter: &'a dyn Deformatter) -> Self {
        Self {
            buffer,
            position: 0,
            deformatter,
        }
    }

    /// Offset of the next unread byte.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        &self.buffer[self.position..]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.position >= self.buffer.len()
    }

    #[inline]
    pub fn deformatter(&self) -> &'a dyn Deformatter {
        self.deformatter
    }

    #[inline]
    fn error(&self, kind: DecodeErrorKind) -> DecodeError {
        DecodeError::new(kind, self.position)
    }

    /// Runs a primitive decode and advances past the token on success.
    #[inline]
    fn step<T>(
        &mut self,
        decode: impl FnOnce(&dyn Deformatter, &'a [u8]) -> DecodeOutcome<(T, usize)>,
    ) -> DecodeStep<T> {
        match decode(self.deformatter, self.remaining()) {
            Ok(DecodeResult::Success((value, consumed))) => {
                self.position += consumed;
                Ok(DecodeResult::Success(value))
            }
            Ok(DecodeResult::EmptyBuffer) => Ok(DecodeResult::EmptyBuffer),
            Ok(DecodeResult::InsufficientBuffer) => Ok(DecodeResult::InsufficientBuffer),
            Err(kind) => Err(self.error(kind)),
        }
    }

    pub fn try_peek_token_type(&self) -> DecodeStep<TokenType> {
        self.deformatter
            .peek_token_type(self.remaining())
            .map_err(|kind| self.error(kind))
    }

    /// Returns `true` if the next token is nil, without consuming it.
    pub fn try_peek_nil(&self) -> DecodeStep<bool> {
        Ok(self.try_peek_token_type()?.map(|ty| ty == TokenType::Nil))
    }

    pub fn try_read_nil(&mut self) -> DecodeStep<()> {
        self.step(|d, src| Ok(d.try_read_nil(src)?.map(|n| ((), n))))
    }

    pub fn try_read_bool(&mut self) -> DecodeStep<bool> {
        self.step(|d, src| d.try_read_bool(src))
    }

    pub fn try_read_integer(&mut self) -> DecodeStep<Integer> {
        self.step(|d, src| d.try_read_integer(src))
    }

    /// Reads an integer and narrows it, failing without advancing if the
    /// value does not fit in `T`.
    pub fn try_read_int<T: TryFrom<u64> + TryFrom<i64>>(&mut self) -> DecodeStep<T> {
        let start = *self;
        let int = pending!(self.try_read_integer()?);
        match int.narrow::<T>() {
            Some(v) => Ok(DecodeResult::Success(v)),
            None => {
                *self = start;
                Err(self.error(DecodeErrorKind::IntegerOverflow {
                    target: core::any::type_name::<T>(),
                }))
            }
        }
    }

    pub fn try_read_f32(&mut self) -> DecodeStep<f32> {
        self.step(|d, src| d.try_read_f32(src))
    }

    pub fn try_read_f64(&mut self) -> DecodeStep<f64> {
        self.step(|d, src| d.try_read_f64(src))
    }

    pub fn try_read_array_header(&mut self) -> DecodeStep<u32> {
        self.step(|d, src| d.try_read_array_header(src))
    }

    pub fn try_read_map_header(&mut self) -> DecodeStep<u32> {
        self.step(|d, src| d.try_read_map_header(src))
    }

    pub fn try_read_string_header(&mut self) -> DecodeStep<u32> {
        self.step(|d, src| d.try_read_string_header(src))
    }

    pub fn try_read_binary_header(&mut self) -> DecodeStep<u32> {
        self.step(|d, src| d.try_read_binary_header(src))
    }

    pub fn try_read_extension_header(&mut self) -> DecodeStep<ExtensionHeader> {
        self.step(|d, src| d.try_read_extension_header(src))
    }

    /// Reads `len` raw bytes that follow an already consumed header.
    pub fn try_read_bytes(&mut self, len: usize) -> DecodeStep<&'a [u8]> {
        let rest = self.remaining();
        match rest.get(..len) {
            Some(bytes) => {
                self.position += len;
                Ok(DecodeResult::Success(bytes))
            }
            None if rest.is_empty() && len > 0 => Ok(DecodeResult::EmptyBuffer),
            None => Ok(DecodeResult::InsufficientBuffer),
        }
    }

    /// Reads a header and its payload as one unit: if the payload is not
    /// fully buffered the header is not consumed either.
    fn try_read_with_payload(
        &mut self,
        header: impl FnOnce(&mut Self) -> DecodeStep<u32>,
    ) -> DecodeStep<&'a [u8]> {
        let start = *self;
        let len = pending!(header(self)?);
        match self.try_read_bytes(len as usize)? {
            DecodeResult::Success(bytes) => Ok(DecodeResult::Success(bytes)),
            _ => {
                *self = start;
                Ok(DecodeResult::InsufficientBuffer)
            }
        }
    }

    pub fn try_read_str(&mut self) -> DecodeStep<&'a str> {
        let start = *self;
        let bytes = pending!(self.try_read_with_payload(Self::try_read_string_header)?);
        match str::from_utf8(bytes) {
            Ok(s) => Ok(DecodeResult::Success(s)),
            Err(_) => {
                *self = start;
                Err(self.error(DecodeErrorKind::InvalidUtf8))
            }
        }
    }

    /// Reads the raw UTF-8 bytes of a string without validating them.
    pub fn try_read_str_bytes(&mut self) -> DecodeStep<&'a [u8]> {
        self.try_read_with_payload(Self::try_read_string_header)
    }

    pub fn try_read_binary(&mut self) -> DecodeStep<&'a [u8]> {
        self.try_read_with_payload(Self::try_read_binary_header)
    }

    pub fn try_read_extension(&mut self) -> DecodeStep<Extension<'a>> {
        let start = *self;
        let header = pending!(self.try_read_extension_header()?);
        match self.try_read_bytes(header.length as usize)? {
            DecodeResult::Success(data) => Ok(DecodeResult::Success(Extension { header, data })),
            _ => {
                *self = start;
                Ok(DecodeResult::InsufficientBuffer)
            }
        }
    }

    pub fn try_read_timestamp(&mut self) -> DecodeStep<Timestamp> {
        self.step(|d, src| d.try_read_timestamp(src))
    }

    /// Reads one complete value of any type and returns its encoded bytes.
    pub fn try_read_raw(&mut self) -> DecodeStep<&'a [u8]> {
        let rest = self.remaining();
        let len = pending!(
            try_read_structure_len_with(self.deformatter, rest).map_err(|kind| self.error(kind))?
        );
        self.position += len;
        Ok(DecodeResult::Success(&rest[..len]))
    }

    /// Skips one complete value, including everything nested in it.
    pub fn try_skip(&mut self) -> DecodeStep<()> {
        Ok(self.try_read_raw()?.map(|_| ()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_overflow_does_not_advance() {
        let mut reader = StreamingReader::new(&[0xcd, 0x01, 0x00]);
        let err = reader.try_read_int::<u8>().unwrap_err();
        assert_eq!(err.offset, 0);
        assert!(matches!(err.kind, DecodeErrorKind::IntegerOverflow { .. }));
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.try_read_int::<u16>().unwrap(), DecodeResult::Success(256));
    }

    #[test]
    fn partial_payload_keeps_header() {
        let mut reader = StreamingReader::new(&[0xc4, 0x03, 1, 2]);
        assert_eq!(reader.try_read_binary().unwrap(), DecodeResult::InsufficientBuffer);
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn empty_vs_insufficient() {
        let mut reader = StreamingReader::new(&[]);
        assert_eq!(reader.try_read_bool().unwrap(), DecodeResult::EmptyBuffer);
        let mut reader = StreamingReader::new(&[0x92, 0x01]);
        assert_eq!(reader.try_skip().unwrap(), DecodeResult::InsufficientBuffer);
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn copy_is_a_checkpoint() {
        let mut reader = StreamingReader::new(&[0x01, 0x02]);
        let saved = reader;
        assert_eq!(reader.try_read_int::<u8>().unwrap(), DecodeResult::Success(1));
        assert_eq!(saved.position(), 0);
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn invalid_utf8() {
        let mut reader = StreamingReader::new(&[0xa2, 0xff, 0xfe]);
        let err = reader.try_read_str().unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::InvalidUtf8);
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn raw_spans_whole_structure() {
        let bytes = [0x82, 0xa1, b'k', 0x90, 0x01, 0xc3, 0x07];
        let mut reader = StreamingReader::new(&bytes);
        assert_eq!(reader.try_read_raw().unwrap(), DecodeResult::Success(&bytes[..6]));
        assert_eq!(reader.try_read_int::<u8>().unwrap(), DecodeResult::Success(7));
        assert!(reader.is_empty());
    }
}
