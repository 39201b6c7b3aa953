use alloc::vec::Vec;
use core::fmt::Debug;

use crate::primitives::{self, DecodeOutcome, EncodeResult, MAX_HEADER_LEN};
use crate::{ExtensionHeader, Integer, Timestamp, TokenType};

pub use crate::primitives::TokenSpan;

// -----------------------------------------------------------------------------
// ExactInt

/// An integer that must be written with its own width tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExactInt {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
}

// -----------------------------------------------------------------------------
// Formatter

/// Emits the tokens of a tag/length/value format.
///
/// Writers hold a `&dyn Formatter`, so converters never name the concrete
/// wire format. Methods append whole tokens; payload bytes of strings,
/// binaries and extensions are appended by the writer after the header.
pub trait Formatter: Send + Sync + Debug {
    fn write_nil(&self, out: &mut Vec<u8>);
    fn write_bool(&self, out: &mut Vec<u8>, value: bool);
    fn write_unsigned(&self, out: &mut Vec<u8>, value: u64);
    fn write_signed(&self, out: &mut Vec<u8>, value: i64);
    fn write_exact(&self, out: &mut Vec<u8>, value: ExactInt);
    fn write_f32(&self, out: &mut Vec<u8>, value: f32);
    fn write_f64(&self, out: &mut Vec<u8>, value: f64);
    fn write_string_header(&self, out: &mut Vec<u8>, len: u32);
    fn write_binary_header(&self, out: &mut Vec<u8>, len: u32);
    fn write_array_header(&self, out: &mut Vec<u8>, len: u32);
    fn write_map_header(&self, out: &mut Vec<u8>, len: u32);
    fn write_extension_header(&self, out: &mut Vec<u8>, header: ExtensionHeader);
    fn write_timestamp(&self, out: &mut Vec<u8>, value: Timestamp);
}

// -----------------------------------------------------------------------------
// Deformatter

/// Decodes the tokens of a tag/length/value format.
///
/// Every method inspects the start of `src` and returns the decoded value
/// together with the number of bytes it spans.
pub trait Deformatter: Send + Sync + Debug {
    fn peek_token_type(&self, src: &[u8]) -> DecodeOutcome<TokenType>;
    fn try_read_nil(&self, src: &[u8]) -> DecodeOutcome<usize>;
    fn try_read_bool(&self, src: &[u8]) -> DecodeOutcome<(bool, usize)>;
    fn try_read_integer(&self, src: &[u8]) -> DecodeOutcome<(Integer, usize)>;
    fn try_read_f32(&self, src: &[u8]) -> DecodeOutcome<(f32, usize)>;
    fn try_read_f64(&self, src: &[u8]) -> DecodeOutcome<(f64, usize)>;
    fn try_read_string_header(&self, src: &[u8]) -> DecodeOutcome<(u32, usize)>;
    fn try_read_binary_header(&self, src: &[u8]) -> DecodeOutcome<(u32, usize)>;
    fn try_read_array_header(&self, src: &[u8]) -> DecodeOutcome<(u32, usize)>;
    fn try_read_map_header(&self, src: &[u8]) -> DecodeOutcome<(u32, usize)>;
    fn try_read_extension_header(&self, src: &[u8]) -> DecodeOutcome<(ExtensionHeader, usize)>;
    fn try_read_timestamp(&self, src: &[u8]) -> DecodeOutcome<(Timestamp, usize)>;
    fn try_read_token_span(&self, src: &[u8]) -> DecodeOutcome<TokenSpan>;
}

// -----------------------------------------------------------------------------
// MsgPackFormat

/// The MessagePack implementation of [`Formatter`] and [`Deformatter`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MsgPackFormat;

/// Shared instance used by readers and writers unless told otherwise.
pub static MSGPACK: MsgPackFormat = MsgPackFormat;

#[inline]
fn emit(out: &mut Vec<u8>, encode: impl FnOnce(&mut [u8]) -> EncodeResult) {
    let mut scratch = [0u8; MAX_HEADER_LEN];
    let res = encode(&mut scratch);
    debug_assert!(res.fits, "header of {} bytes exceeds scratch space", res.len);
    out.extend_from_slice(&scratch[..res.len]);
}

impl Formatter for MsgPackFormat {
    fn write_nil(&self, out: &mut Vec<u8>) {
        emit(out, primitives::try_write_nil);
    }

    fn write_bool(&self, out: &mut Vec<u8>, value: bool) {
        emit(out, |dst| primitives::try_write_bool(dst, value));
    }

    fn write_unsigned(&self, out: &mut Vec<u8>, value: u64) {
        emit(out, |dst| primitives::try_write_u64(dst, value));
    }

    fn write_signed(&self, out: &mut Vec<u8>, value: i64) {
        emit(out, |dst| primitives::try_write_i64(dst, value));
    }

    fn write_exact(&self, out: &mut Vec<u8>, value: ExactInt) {
        emit(out, |dst| match value {
            ExactInt::U8(v) => primitives::try_write_u8_exact(dst, v),
            ExactInt::U16(v) => primitives::try_write_u16_exact(dst, v),
            ExactInt::U32(v) => primitives::try_write_u32_exact(dst, v),
            ExactInt::U64(v) => primitives::try_write_u64_exact(dst, v),
            ExactInt::I8(v) => primitives::try_write_i8_exact(dst, v),
            ExactInt::I16(v) => primitives::try_write_i16_exact(dst, v),
            ExactInt::I32(v) => primitives::try_write_i32_exact(dst, v),
            ExactInt::I64(v) => primitives::try_write_i64_exact(dst, v),
        });
    }

    fn write_f32(&self, out: &mut Vec<u8>, value: f32) {
        emit(out, |dst| primitives::try_write_f32(dst, value));
    }

    fn write_f64(&self, out: &mut Vec<u8>, value: f64) {
        emit(out, |dst| primitives::try_write_f64(dst, value));
    }

    fn write_string_header(&self, out: &mut Vec<u8>, len: u32) {
        emit(out, |dst| primitives::try_write_string_header(dst, len));
    }

    fn write_binary_header(&self, out: &mut Vec<u8>, len: u32) {
        emit(out, |dst| primitives::try_write_binary_header(dst, len));
    }

    fn write_array_header(&self, out: &mut Vec<u8>, len: u32) {
        emit(out, |dst| primitives::try_write_array_header(dst, len));
    }

    fn write_map_header(&self, out: &mut Vec<u8>, len: u32) {
        emit(out, |dst| primitives::try_write_map_header(dst, len));
    }

    fn write_extension_header(&self, out: &mut Vec<u8>, header: ExtensionHeader) {
        emit(out, |dst| primitives::try_write_extension_header(dst, header));
    }

    fn write_timestamp(&self, out: &mut Vec<u8>, value: Timestamp) {
        emit(out, |dst| primitives::try_write_timestamp(dst, value));
    }
}

impl Deformatter for MsgPackFormat {
    #[inline]
    fn peek_token_type(&self, src: &[u8]) -> DecodeOutcome<TokenType> {
        primitives::peek_token_type(src)
    }

    #[inline]
    fn try_read_nil(&self, src: &[u8]) -> DecodeOutcome<usize> {
        primitives::try_read_nil(src)
    }

    #[inline]
    fn try_read_bool(&self, src: &[u8]) -> DecodeOutcome<(bool, usize)> {
        primitives::try_read_bool(src)
    }

    #[inline]
    fn try_read_integer(&self, src: &[u8]) -> DecodeOutcome<(Integer, usize)> {
        primitives::try_read_integer(src)
    }

    #[inline]
    fn try_read_f32(&self, src: &[u8]) -> DecodeOutcome<(f32, usize)> {
        primitives::try_read_f32(src)
    }

    #[inline]
    fn try_read_f64(&self, src: &[u8]) -> DecodeOutcome<(f64, usize)> {
        primitives::try_read_f64(src)
    }

    #[inline]
    fn try_read_string_header(&self, src: &[u8]) -> DecodeOutcome<(u32, usize)> {
        primitives::try_read_string_header(src)
    }

    #[inline]
    fn try_read_binary_header(&self, src: &[u8]) -> DecodeOutcome<(u32, usize)> {
        primitives::try_read_binary_header(src)
    }

    #[inline]
    fn try_read_array_header(&self, src: &[u8]) -> DecodeOutcome<(u32, usize)> {
        primitives::try_read_array_header(src)
    }

    #[inline]
    fn try_read_map_header(&self, src: &[u8]) -> DecodeOutcome<(u32, usize)> {
        primitives::try_read_map_header(src)
    }

    #[inline]
    fn try_read_extension_header(&self, src: &[u8]) -> DecodeOutcome<(ExtensionHeader, usize)> {
        primitives::try_read_extension_header(src)
    }

    #[inline]
    fn try_read_timestamp(&self, src: &[u8]) -> DecodeOutcome<(Timestamp, usize)> {
        primitives::try_read_timestamp(src)
    }

    #[inline]
    fn try_read_token_span(&self, src: &[u8]) -> DecodeOutcome<TokenSpan> {
        primitives::try_read_token_span(src)
    }
}
