use alloc::string::String;
use alloc::vec::Vec;

use crate::format::{Deformatter, MSGPACK};
use crate::streaming::DecodeStep;
use crate::{
    DecodeError, DecodeErrorKind, DecodeResult, Extension, ExtensionHeader, Integer,
    StreamingReader, Timestamp, TokenType,
};

/// A cursor over a buffer that holds complete data.
///
/// Wraps a [`StreamingReader`] and reports running out of bytes as a
/// [`DecodeErrorKind::EndOfData`] error instead of a retryable outcome.
///
/// # Examples
///
/// ```
/// use mp_codec::Reader;
///
/// let mut reader = Reader::new(&[0x92, 0x01, 0xa1, b'a']);
/// assert_eq!(reader.read_array_header().unwrap(), 2);
/// assert_eq!(reader.read_int::<u8>().unwrap(), 1);
/// assert_eq!(reader.read_str().unwrap(), "a");
/// assert!(reader.read_nil().is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    inner: StreamingReader<'a>,
}

impl<'a> Reader<'a> {
    #[inline]
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::with_deformatter(buffer, &MSGPACK)
    }

    #[inline]
    pub fn with_deformatter(buffer: &'a [u8], deformatter: &'a dyn Deformatter) -> Self {
        Self {
            inner: StreamingReader::with_deformatter(buffer, deformatter),
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.inner.position()
    }

    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        self.inner.remaining()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// The underlying cursor, for callers that want tri-state reads.
    #[inline]
    pub fn streaming(&mut self) -> &mut StreamingReader<'a> {
        &mut self.inner
    }

    #[inline]
    pub fn error(&self, kind: DecodeErrorKind) -> DecodeError {
        DecodeError::new(kind, self.position())
    }

    #[inline]
    fn complete<T>(&self, step: DecodeStep<T>) -> Result<T, DecodeError> {
        match step? {
            DecodeResult::Success(value) => Ok(value),
            DecodeResult::EmptyBuffer | DecodeResult::InsufficientBuffer => {
                Err(self.error(DecodeErrorKind::EndOfData))
            }
        }
    }

    pub fn peek_token_type(&self) -> Result<TokenType, DecodeError> {
        self.complete(self.inner.try_peek_token_type())
    }

    /// Returns `true` if the next token is nil. Does not consume it.
    pub fn peek_nil(&self) -> Result<bool, DecodeError> {
        self.complete(self.inner.try_peek_nil())
    }

    /// Consumes the next token if it is nil.
    pub fn try_read_nil(&mut self) -> Result<bool, DecodeError> {
        if self.peek_nil()? {
            self.read_nil()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Peeks the header of the next token if it is an extension.
    pub fn peek_extension_header(&self) -> Result<Option<ExtensionHeader>, DecodeError> {
        if self.peek_token_type()? != TokenType::Extension {
            return Ok(None);
        }
        let mut probe = self.inner;
        self.complete(probe.try_read_extension_header()).map(Some)
    }

    pub fn read_nil(&mut self) -> Result<(), DecodeError> {
        let step = self.inner.try_read_nil();
        self.complete(step)
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        let step = self.inner.try_read_bool();
        self.complete(step)
    }

    pub fn read_integer(&mut self) -> Result<Integer, DecodeError> {
        let step = self.inner.try_read_integer();
        self.complete(step)
    }

    /// Reads an integer of any encoded width that fits in `T`.
    pub fn read_int<T: TryFrom<u64> + TryFrom<i64>>(&mut self) -> Result<T, DecodeError> {
        let step = self.inner.try_read_int::<T>();
        self.complete(step)
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        let step = self.inner.try_read_f32();
        self.complete(step)
    }

    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        let step = self.inner.try_read_f64();
        self.complete(step)
    }

    pub fn read_str(&mut self) -> Result<&'a str, DecodeError> {
        let step = self.inner.try_read_str();
        self.complete(step)
    }

    #[inline]
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        self.read_str().map(String::from)
    }

    pub fn read_str_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let step = self.inner.try_read_str_bytes();
        self.complete(step)
    }

    pub fn read_binary(&mut self) -> Result<&'a [u8], DecodeError> {
        let step = self.inner.try_read_binary();
        self.complete(step)
    }

    #[inline]
    pub fn read_byte_buf(&mut self) -> Result<Vec<u8>, DecodeError> {
        self.read_binary().map(<[u8]>::to_vec)
    }

    pub fn read_array_header(&mut self) -> Result<u32, DecodeError> {
        let step = self.inner.try_read_array_header();
        self.complete(step)
    }

    pub fn read_map_header(&mut self) -> Result<u32, DecodeError> {
        let step = self.inner.try_read_map_header();
        self.complete(step)
    }

    pub fn read_extension_header(&mut self) -> Result<ExtensionHeader, DecodeError> {
        let step = self.inner.try_read_extension_header();
        self.complete(step)
    }

    pub fn read_extension(&mut self) -> Result<Extension<'a>, DecodeError> {
        let step = self.inner.try_read_extension();
        self.complete(step)
    }

    pub fn read_timestamp(&mut self) -> Result<Timestamp, DecodeError> {
        let step = self.inner.try_read_timestamp();
        self.complete(step)
    }

    /// Reads `len` raw bytes, for payloads whose framing the caller decodes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let step = self.inner.try_read_bytes(len);
        self.complete(step)
    }

    /// Reads one complete value and returns its encoded bytes.
    pub fn read_raw(&mut self) -> Result<&'a [u8], DecodeError> {
        let step = self.inner.try_read_raw();
        self.complete(step)
    }

    /// Skips one complete value of any type.
    pub fn skip(&mut self) -> Result<(), DecodeError> {
        let step = self.inner.try_skip();
        self.complete(step)
    }

    /// Fails if any bytes remain after the last value.
    pub fn expect_end(&self) -> Result<(), DecodeError> {
        match self.remaining().len() {
            0 => Ok(()),
            remaining => Err(self.error(DecodeErrorKind::TrailingData { remaining })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_of_data_reports_offset() {
        let mut reader = Reader::new(&[0x01, 0xcd, 0x00]);
        assert_eq!(reader.read_int::<u32>().unwrap(), 1);
        let err = reader.read_int::<u32>().unwrap_err();
        assert_eq!(err, DecodeError::new(DecodeErrorKind::EndOfData, 1));
    }

    #[test]
    fn try_read_nil_only_consumes_nil() {
        let mut reader = Reader::new(&[0xc0, 0x05]);
        assert!(reader.try_read_nil().unwrap());
        assert!(!reader.try_read_nil().unwrap());
        assert_eq!(reader.read_int::<i32>().unwrap(), 5);
    }

    #[test]
    fn peek_extension() {
        let reader = Reader::new(&[0xd4, 0x01, 0x07]);
        assert_eq!(
            reader.peek_extension_header().unwrap(),
            Some(ExtensionHeader::new(1, 1))
        );
        assert_eq!(reader.position(), 0);
        assert_eq!(Reader::new(&[0x01]).peek_extension_header().unwrap(), None);
    }

    #[test]
    fn trailing_data() {
        let mut reader = Reader::new(&[0xc3, 0xc3]);
        assert!(reader.read_bool().unwrap());
        assert_eq!(
            reader.expect_end().unwrap_err().kind,
            DecodeErrorKind::TrailingData { remaining: 1 }
        );
    }

    #[test]
    fn skip_nested() {
        let mut reader = Reader::new(&[0x91, 0x81, 0x01, 0x92, 0xc0, 0xc0, 0x2a]);
        reader.skip().unwrap();
        assert_eq!(reader.read_int::<u8>().unwrap(), 42);
        reader.expect_end().unwrap();
    }
}
