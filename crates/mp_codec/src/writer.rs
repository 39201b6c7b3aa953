use alloc::vec::Vec;
use core::fmt;

use crate::format::{ExactInt, Formatter, MSGPACK};
use crate::{EncodeError, ExtensionHeader, Timestamp};

/// Appends encoded tokens to a byte buffer.
///
/// # Examples
///
/// ```
/// use mp_codec::Writer;
///
/// let mut out = Vec::new();
/// let mut writer = Writer::new(&mut out);
/// writer.write_array_header(2).unwrap();
/// writer.write_u64(1);
/// writer.write_str("a").unwrap();
/// assert_eq!(out, [0x92, 0x01, 0xa1, b'a']);
/// ```
pub struct Writer<'a> {
    out: &'a mut Vec<u8>,
    formatter: &'a dyn Formatter,
}

impl fmt::Debug for Writer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Writer")
            .field("written", &self.out.len())
            .field("formatter", &self.formatter)
            .finish()
    }
}

#[inline]
fn len32(len: usize) -> Result<u32, EncodeError> {
    u32::try_from(len).map_err(|_| EncodeError::LengthOverflow { len })
}

impl<'a> Writer<'a> {
    #[inline]
    pub fn new(out: &'a mut Vec<u8>) -> Self {
        Self::with_formatter(out, &MSGPACK)
    }

    #[inline]
    pub fn with_formatter(out: &'a mut Vec<u8>, formatter: &'a dyn Formatter) -> Self {
        Self { out, formatter }
    }

    /// Total length of the underlying buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.out.len()
    }

    #[inline]
    pub fn formatter(&self) -> &'a dyn Formatter {
        self.formatter
    }

    /// Reserves room for at least `additional` more bytes.
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        self.out.reserve(additional);
    }

    #[inline]
    pub fn write_nil(&mut self) {
        self.formatter.write_nil(self.out);
    }

    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.formatter.write_bool(self.out, value);
    }

    /// Writes an unsigned integer in its most compact form.
    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.formatter.write_unsigned(self.out, value);
    }

    /// Writes a signed integer in its most compact form.
    #[inline]
    pub fn write_i64(&mut self, value: i64) {
        self.formatter.write_signed(self.out, value);
    }

    /// Writes an integer with its own width tag.
    #[inline]
    pub fn write_exact(&mut self, value: ExactInt) {
        self.formatter.write_exact(self.out, value);
    }

    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.formatter.write_f32(self.out, value);
    }

    #[inline]
    pub fn write_f64(&mut self, value: f64) {
        self.formatter.write_f64(self.out, value);
    }

    pub fn write_str(&mut self, value: &str) -> Result<(), EncodeError> {
        self.formatter.write_string_header(self.out, len32(value.len())?);
        self.out.extend_from_slice(value.as_bytes());
        Ok(())
    }

    /// Writes a string whose bytes are already known to be UTF-8.
    pub fn write_str_bytes(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        self.formatter.write_string_header(self.out, len32(value.len())?);
        self.out.extend_from_slice(value);
        Ok(())
    }

    pub fn write_binary(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        self.formatter.write_binary_header(self.out, len32(value.len())?);
        self.out.extend_from_slice(value);
        Ok(())
    }

    pub fn write_array_header(&mut self, len: usize) -> Result<(), EncodeError> {
        self.formatter.write_array_header(self.out, len32(len)?);
        Ok(())
    }

    pub fn write_map_header(&mut self, len: usize) -> Result<(), EncodeError> {
        self.formatter.write_map_header(self.out, len32(len)?);
        Ok(())
    }

    pub fn write_extension(&mut self, type_code: i8, data: &[u8]) -> Result<(), EncodeError> {
        let header = ExtensionHeader::new(type_code, len32(data.len())?);
        self.formatter.write_extension_header(self.out, header);
        self.out.extend_from_slice(data);
        Ok(())
    }

    #[inline]
    pub fn write_timestamp(&mut self, value: Timestamp) {
        self.formatter.write_timestamp(self.out, value);
    }

    /// Appends bytes that already hold one or more encoded values.
    #[inline]
    pub fn write_raw(&mut self, encoded: &[u8]) {
        self.out.extend_from_slice(encoded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars() {
        let mut out = Vec::new();
        let mut writer = Writer::new(&mut out);
        writer.write_nil();
        writer.write_bool(true);
        writer.write_i64(-1);
        writer.write_exact(ExactInt::U16(1));
        writer.write_f32(1.5);
        assert_eq!(out, [0xc0, 0xc3, 0xff, 0xcd, 0, 1, 0xca, 0x3f, 0xc0, 0, 0]);
    }

    #[test]
    fn extension_uses_fixext() {
        let mut out = Vec::new();
        Writer::new(&mut out).write_extension(3, &[9, 9]).unwrap();
        assert_eq!(out, [0xd5, 3, 9, 9]);
    }

    #[test]
    fn raw_passthrough() {
        let mut out = Vec::new();
        let mut writer = Writer::new(&mut out);
        writer.write_raw(&[0x91, 0x01]);
        assert_eq!(writer.position(), 2);
    }
}
