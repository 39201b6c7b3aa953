use crate::code::*;
use crate::format::{Deformatter, MSGPACK};
use crate::{DecodeErrorKind, DecodeResult, ExtensionHeader, Integer, Timestamp, TokenType};

use super::DecodeOutcome;

// -----------------------------------------------------------------------------
// Helpers

/// Returns the leading byte, or bails out with `EmptyBuffer`.
macro_rules! lead {
    ($src:expr) => {
        match $src.first() {
            Some(&code) => code,
            None => return Ok(DecodeResult::EmptyBuffer),
        }
    };
}

/// Reads `N` big-endian bytes after the leading byte, or bails out with
/// `InsufficientBuffer`.
macro_rules! payload {
    ($src:expr, $n:literal) => {
        match $src.get(1..1 + $n) {
            Some(bytes) => {
                let mut out = [0u8; $n];
                out.copy_from_slice(bytes);
                out
            }
            None => return Ok(DecodeResult::InsufficientBuffer),
        }
    };
}

/// Unwraps a successful nested decode, forwarding the other outcomes.
macro_rules! step {
    ($res:expr) => {
        match $res? {
            DecodeResult::Success(found) => found,
            DecodeResult::EmptyBuffer => return Ok(DecodeResult::EmptyBuffer),
            DecodeResult::InsufficientBuffer => return Ok(DecodeResult::InsufficientBuffer),
        }
    };
}

#[inline]
fn unexpected<T>(expected: &'static str, found: u8) -> DecodeOutcome<T> {
    if found == NEVER_USED {
        Err(DecodeErrorKind::ReservedCode)
    } else {
        Err(DecodeErrorKind::UnexpectedCode { expected, found })
    }
}

#[inline]
fn ok<T>(value: T, consumed: usize) -> DecodeOutcome<(T, usize)> {
    Ok(DecodeResult::Success((value, consumed)))
}

// -----------------------------------------------------------------------------
// Scalars

pub fn peek_token_type(src: &[u8]) -> DecodeOutcome<TokenType> {
    let code = lead!(src);
    match TokenType::from_code(code) {
        Some(ty) => Ok(DecodeResult::Success(ty)),
        None => Err(DecodeErrorKind::ReservedCode),
    }
}

pub fn try_read_nil(src: &[u8]) -> DecodeOutcome<usize> {
    match lead!(src) {
        NIL => Ok(DecodeResult::Success(1)),
        other => unexpected("nil", other),
    }
}

pub fn try_read_bool(src: &[u8]) -> DecodeOutcome<(bool, usize)> {
    match lead!(src) {
        TRUE => ok(true, 1),
        FALSE => ok(false, 1),
        other => unexpected("boolean", other),
    }
}

/// Reads an integer in any of its encoded forms.
///
/// # Examples
///
/// ```
/// use mp_codec::{DecodeResult, Integer};
/// use mp_codec::primitives::try_read_integer;
///
/// let res = try_read_integer(&[0xd1, 0xff, 0x7f]).unwrap();
/// assert_eq!(res, DecodeResult::Success((Integer::Signed(-129), 3)));
///
/// let res = try_read_integer(&[0xcd, 0x01]).unwrap();
/// assert_eq!(res, DecodeResult::InsufficientBuffer);
/// ```
pub fn try_read_integer(src: &[u8]) -> DecodeOutcome<(Integer, usize)> {
    let code = lead!(src);
    match code {
        0x00..=MAX_POSITIVE_FIXINT => ok(Integer::Unsigned(u64::from(code)), 1),
        MIN_NEGATIVE_FIXINT..=0xff => ok(Integer::Signed(i64::from(code as i8)), 1),
        UINT8 => ok(Integer::Unsigned(u64::from(payload!(src, 1)[0])), 2),
        UINT16 => ok(Integer::Unsigned(u64::from(u16::from_be_bytes(payload!(src, 2)))), 3),
        UINT32 => ok(Integer::Unsigned(u64::from(u32::from_be_bytes(payload!(src, 4)))), 5),
        UINT64 => ok(Integer::Unsigned(u64::from_be_bytes(payload!(src, 8))), 9),
        INT8 => ok(Integer::Signed(i64::from(i8::from_be_bytes(payload!(src, 1)))), 2),
        INT16 => ok(Integer::Signed(i64::from(i16::from_be_bytes(payload!(src, 2)))), 3),
        INT32 => ok(Integer::Signed(i64::from(i32::from_be_bytes(payload!(src, 4)))), 5),
        INT64 => ok(Integer::Signed(i64::from_be_bytes(payload!(src, 8))), 9),
        other => unexpected("integer", other),
    }
}

/// Reads a `float64`, widening `float32` and converting integers.
pub fn try_read_f64(src: &[u8]) -> DecodeOutcome<(f64, usize)> {
    match lead!(src) {
        FLOAT64 => ok(f64::from_be_bytes(payload!(src, 8)), 9),
        FLOAT32 => ok(f64::from(f32::from_be_bytes(payload!(src, 4))), 5),
        _ => read_integer_as_float(src, |v| v),
    }
}

/// Reads a `float32`, narrowing `float64` and converting integers.
pub fn try_read_f32(src: &[u8]) -> DecodeOutcome<(f32, usize)> {
    match lead!(src) {
        FLOAT32 => ok(f32::from_be_bytes(payload!(src, 4)), 5),
        FLOAT64 => ok(f64::from_be_bytes(payload!(src, 8)) as f32, 9),
        _ => read_integer_as_float(src, |v| v as f32),
    }
}

fn read_integer_as_float<T>(src: &[u8], narrow: impl Fn(f64) -> T) -> DecodeOutcome<(T, usize)> {
    match try_read_integer(src) {
        Ok(DecodeResult::Success((int, n))) => ok(narrow(int.to_f64()), n),
        Ok(DecodeResult::EmptyBuffer) => Ok(DecodeResult::EmptyBuffer),
        Ok(DecodeResult::InsufficientBuffer) => Ok(DecodeResult::InsufficientBuffer),
        Err(_) => unexpected("float", src[0]),
    }
}

// -----------------------------------------------------------------------------
// Headers

pub fn try_read_string_header(src: &[u8]) -> DecodeOutcome<(u32, usize)> {
    let code = lead!(src);
    match code {
        MIN_FIXSTR..=MAX_FIXSTR => ok(u32::from(code & 0x1f), 1),
        STR8 => ok(u32::from(payload!(src, 1)[0]), 2),
        STR16 => ok(u32::from(u16::from_be_bytes(payload!(src, 2))), 3),
        STR32 => ok(u32::from_be_bytes(payload!(src, 4)), 5),
        other => unexpected("string", other),
    }
}

pub fn try_read_binary_header(src: &[u8]) -> DecodeOutcome<(u32, usize)> {
    match lead!(src) {
        BIN8 => ok(u32::from(payload!(src, 1)[0]), 2),
        BIN16 => ok(u32::from(u16::from_be_bytes(payload!(src, 2))), 3),
        BIN32 => ok(u32::from_be_bytes(payload!(src, 4)), 5),
        other => unexpected("binary", other),
    }
}

pub fn try_read_array_header(src: &[u8]) -> DecodeOutcome<(u32, usize)> {
    let code = lead!(src);
    match code {
        MIN_FIXARRAY..=MAX_FIXARRAY => ok(u32::from(code & 0x0f), 1),
        ARRAY16 => ok(u32::from(u16::from_be_bytes(payload!(src, 2))), 3),
        ARRAY32 => ok(u32::from_be_bytes(payload!(src, 4)), 5),
        other => unexpected("array", other),
    }
}

pub fn try_read_map_header(src: &[u8]) -> DecodeOutcome<(u32, usize)> {
    let code = lead!(src);
    match code {
        MIN_FIXMAP..=MAX_FIXMAP => ok(u32::from(code & 0x0f), 1),
        MAP16 => ok(u32::from(u16::from_be_bytes(payload!(src, 2))), 3),
        MAP32 => ok(u32::from_be_bytes(payload!(src, 4)), 5),
        other => unexpected("map", other),
    }
}

pub fn try_read_extension_header(src: &[u8]) -> DecodeOutcome<(ExtensionHeader, usize)> {
    let code = lead!(src);
    let fixed = |len: u32, src: &[u8]| match src.get(1) {
        Some(&ty) => ok(ExtensionHeader::new(ty as i8, len), 2),
        None => Ok(DecodeResult::InsufficientBuffer),
    };
    match code {
        FIXEXT1 => fixed(1, src),
        FIXEXT2 => fixed(2, src),
        FIXEXT4 => fixed(4, src),
        FIXEXT8 => fixed(8, src),
        FIXEXT16 => fixed(16, src),
        EXT8 => {
            let [len, ty] = payload!(src, 2);
            ok(ExtensionHeader::new(ty as i8, u32::from(len)), 3)
        }
        EXT16 => {
            let [a, b, ty] = payload!(src, 3);
            ok(ExtensionHeader::new(ty as i8, u32::from(u16::from_be_bytes([a, b]))), 4)
        }
        EXT32 => {
            let [a, b, c, d, ty] = payload!(src, 5);
            ok(ExtensionHeader::new(ty as i8, u32::from_be_bytes([a, b, c, d])), 6)
        }
        other => unexpected("extension", other),
    }
}

/// Reads a whole timestamp extension (header and payload).
pub fn try_read_timestamp(src: &[u8]) -> DecodeOutcome<(Timestamp, usize)> {
    let (header, head_len) = step!(try_read_extension_header(src));
    if header.type_code != Timestamp::EXTENSION_TYPE {
        return Err(DecodeErrorKind::UnexpectedCode {
            expected: "timestamp extension",
            found: header.type_code as u8,
        });
    }
    let end = head_len + header.length as usize;
    let Some(payload) = src.get(head_len..end) else {
        return Ok(DecodeResult::InsufficientBuffer);
    };
    match Timestamp::decode_payload(payload) {
        Some(ts) => ok(ts, end),
        None => Err(DecodeErrorKind::InvalidTimestamp { len: header.length }),
    }
}

// -----------------------------------------------------------------------------
// Structure

/// The extent of the token at the start of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    /// Bytes of the token itself, including any inline string, binary or
    /// extension payload.
    pub len: usize,
    /// Number of nested values that follow the token (two per map entry).
    pub children: u64,
}

/// Measures the token at the start of `src` without decoding it.
///
/// A string, binary or extension token only counts as available once its
/// whole payload is buffered.
pub fn try_read_token_span(src: &[u8]) -> DecodeOutcome<TokenSpan> {
    let code = lead!(src);
    let Some(ty) = TokenType::from_code(code) else {
        return Err(DecodeErrorKind::ReservedCode);
    };
    let (len, children) = match ty {
        TokenType::Nil | TokenType::Boolean => (1, 0),
        TokenType::Integer => (step!(try_read_integer(src)).1, 0),
        TokenType::Float => (if code == FLOAT32 { 5 } else { 9 }, 0),
        TokenType::String => {
            let (payload, head) = step!(try_read_string_header(src));
            (head + payload as usize, 0)
        }
        TokenType::Binary => {
            let (payload, head) = step!(try_read_binary_header(src));
            (head + payload as usize, 0)
        }
        TokenType::Extension => {
            let (header, head) = step!(try_read_extension_header(src));
            (head + header.length as usize, 0)
        }
        TokenType::Array => {
            let (count, head) = step!(try_read_array_header(src));
            (head, u64::from(count))
        }
        TokenType::Map => {
            let (count, head) = step!(try_read_map_header(src));
            (head, u64::from(count) * 2)
        }
    };
    if src.len() < len {
        return Ok(DecodeResult::InsufficientBuffer);
    }
    Ok(DecodeResult::Success(TokenSpan { len, children }))
}

/// Measures one complete value, including everything nested inside it.
///
/// Returns `InsufficientBuffer` until the last byte of the value is present.
/// Nesting is walked iteratively, so depth is bounded only by the input.
pub fn try_read_structure_len(src: &[u8]) -> DecodeOutcome<usize> {
    try_read_structure_len_with(&MSGPACK, src)
}

/// [`try_read_structure_len`] over the tokens of any [`Deformatter`].
pub fn try_read_structure_len_with(deformatter: &dyn Deformatter, src: &[u8]) -> DecodeOutcome<usize> {
    StructureScan::new().resume(deformatter, src)
}

/// A structure measurement that can stop when input runs out and pick up
/// where it stopped once more arrives.
///
/// Tokens already measured are never visited again, so feeding a value in
/// many small pieces costs one pass over its bytes. A scan is tied to the
/// start of one value; start a new one for the next value.
///
/// # Examples
///
/// ```
/// use mp_codec::DecodeResult;
/// use mp_codec::MSGPACK;
/// use mp_codec::primitives::StructureScan;
///
/// let mut scan = StructureScan::new();
/// let bytes = [0x92, 0x01, 0xa1, b'x'];
/// assert_eq!(scan.resume(&MSGPACK, &bytes[..3]), Ok(DecodeResult::InsufficientBuffer));
/// assert_eq!(scan.scanned(), 2);
/// assert_eq!(scan.resume(&MSGPACK, &bytes), Ok(DecodeResult::Success(4)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructureScan {
    scanned: usize,
    pending: u64,
}

impl Default for StructureScan {
    fn default() -> Self {
        Self::new()
    }
}

impl StructureScan {
    pub const fn new() -> Self {
        Self {
            scanned: 0,
            pending: 1,
        }
    }

    /// Bytes of whole tokens measured so far.
    #[inline]
    pub const fn scanned(&self) -> usize {
        self.scanned
    }

    /// Continues measuring over `src`, which must start with the bytes
    /// given to earlier calls.
    ///
    /// On error the scan stays at the start of the offending token.
    pub fn resume(&mut self, deformatter: &dyn Deformatter, src: &[u8]) -> DecodeOutcome<usize> {
        while self.pending > 0 {
            let rest = src.get(self.scanned..).unwrap_or_default();
            match deformatter.try_read_token_span(rest)? {
                DecodeResult::Success(span) => {
                    self.scanned += span.len;
                    self.pending = self.pending - 1 + span.children;
                }
                DecodeResult::EmptyBuffer if self.scanned == 0 => return Ok(DecodeResult::EmptyBuffer),
                DecodeResult::EmptyBuffer | DecodeResult::InsufficientBuffer => {
                    return Ok(DecodeResult::InsufficientBuffer);
                }
            }
        }
        Ok(DecodeResult::Success(self.scanned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tri_state() {
        assert_eq!(try_read_bool(&[]), Ok(DecodeResult::EmptyBuffer));
        assert_eq!(try_read_integer(&[0xcf, 0, 0]), Ok(DecodeResult::InsufficientBuffer));
        assert_eq!(
            try_read_bool(&[0xc0]),
            Err(DecodeErrorKind::UnexpectedCode { expected: "boolean", found: 0xc0 })
        );
        assert_eq!(try_read_nil(&[0xc1]), Err(DecodeErrorKind::ReservedCode));
    }

    #[test]
    fn integers_accept_every_width() {
        let cases: &[(&[u8], Integer)] = &[
            (&[0x05], Integer::Unsigned(5)),
            (&[0xcc, 5], Integer::Unsigned(5)),
            (&[0xcd, 0, 5], Integer::Unsigned(5)),
            (&[0xce, 0, 0, 0, 5], Integer::Unsigned(5)),
            (&[0xd0, 5], Integer::Signed(5)),
            (&[0xe0], Integer::Signed(-32)),
            (&[0xd3, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe], Integer::Signed(-2)),
        ];
        for &(bytes, expected) in cases {
            assert_eq!(
                try_read_integer(bytes),
                Ok(DecodeResult::Success((expected, bytes.len())))
            );
        }
    }

    #[test]
    fn floats_widen_and_accept_integers() {
        let f32_bytes = [0xca, 0x3f, 0xc0, 0x00, 0x00];
        assert_eq!(try_read_f64(&f32_bytes), Ok(DecodeResult::Success((1.5, 5))));
        assert_eq!(try_read_f32(&[0x03]), Ok(DecodeResult::Success((3.0, 1))));
        assert!(try_read_f64(&[0xa1, b'x']).is_err());
    }

    #[test]
    fn headers() {
        assert_eq!(try_read_string_header(&[0xa3]), Ok(DecodeResult::Success((3, 1))));
        assert_eq!(try_read_array_header(&[0xdc, 1, 0]), Ok(DecodeResult::Success((256, 3))));
        assert_eq!(try_read_map_header(&[0x81]), Ok(DecodeResult::Success((1, 1))));
        assert_eq!(
            try_read_extension_header(&[0xc7, 3, 0x7f]),
            Ok(DecodeResult::Success((ExtensionHeader::new(127, 3), 3)))
        );
        assert_eq!(try_read_extension_header(&[0xd4]), Ok(DecodeResult::InsufficientBuffer));
    }

    #[test]
    fn timestamps() {
        let ts32 = [0xd6, 0xff, 0, 0, 0, 7];
        assert_eq!(
            try_read_timestamp(&ts32),
            Ok(DecodeResult::Success((Timestamp::new(7, 0).unwrap(), 6)))
        );
        assert_eq!(try_read_timestamp(&ts32[..4]), Ok(DecodeResult::InsufficientBuffer));
        assert!(try_read_timestamp(&[0xd6, 0x01, 0, 0, 0, 7]).is_err());
        assert_eq!(
            try_read_timestamp(&[0xd5, 0xff, 0, 0]),
            Err(DecodeErrorKind::InvalidTimestamp { len: 2 })
        );
    }

    #[test]
    fn structure_length() {
        // [1, {"a": [nil]}, "xy"]
        let bytes = [0x93, 0x01, 0x81, 0xa1, b'a', 0x91, 0xc0, 0xa2, b'x', b'y', 0xff];
        assert_eq!(try_read_structure_len(&bytes), Ok(DecodeResult::Success(10)));
        for cut in 1..10 {
            assert_eq!(
                try_read_structure_len(&bytes[..cut]),
                Ok(DecodeResult::InsufficientBuffer)
            );
        }
        assert_eq!(try_read_structure_len(&[]), Ok(DecodeResult::EmptyBuffer));
    }

    #[test]
    fn structure_scan_does_not_revisit_measured_tokens() {
        let bytes = [0x93, 0x01, 0x81, 0xa1, b'a', 0x91, 0xc0, 0xa2, b'x', b'y'];
        let mut scan = StructureScan::new();
        let mut last = 0;
        for end in 0..bytes.len() {
            let expected = if end == 0 { DecodeResult::EmptyBuffer } else { DecodeResult::InsufficientBuffer };
            assert_eq!(scan.resume(&MSGPACK, &bytes[..end]), Ok(expected));
            assert!(scan.scanned() >= last);
            last = scan.scanned();
        }
        assert_eq!(scan.resume(&MSGPACK, &bytes), Ok(DecodeResult::Success(10)));

        // Measured bytes are not read again: garbage in their place is ignored.
        let mut scan = StructureScan::new();
        assert_eq!(scan.resume(&MSGPACK, &[0x92, 0x01]), Ok(DecodeResult::InsufficientBuffer));
        assert_eq!(scan.scanned(), 2);
        assert_eq!(scan.resume(&MSGPACK, &[0xc1, 0xc1, 0x02]), Ok(DecodeResult::Success(3)));
    }

    #[test]
    fn span_requires_whole_payload() {
        assert_eq!(try_read_token_span(&[0xa2, b'x']), Ok(DecodeResult::InsufficientBuffer));
        assert_eq!(try_read_token_span(&[0xcb, 0, 0]), Ok(DecodeResult::InsufficientBuffer));
    }
}
