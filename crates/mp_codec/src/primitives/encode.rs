use crate::code::*;
use crate::{ExtensionHeader, Timestamp};

use super::EncodeResult;

#[inline]
fn put(dst: &mut [u8], code: u8, payload: &[u8]) -> EncodeResult {
    let len = 1 + payload.len();
    match dst.get_mut(..len) {
        Some(slot) => {
            slot[0] = code;
            slot[1..].copy_from_slice(payload);
            EncodeResult::written(len)
        }
        None => EncodeResult::needs(len),
    }
}

// -----------------------------------------------------------------------------
// Scalars

pub fn try_write_nil(dst: &mut [u8]) -> EncodeResult {
    put(dst, NIL, &[])
}

pub fn try_write_bool(dst: &mut [u8], value: bool) -> EncodeResult {
    put(dst, if value { TRUE } else { FALSE }, &[])
}

/// Writes an unsigned integer in its most compact form.
///
/// # Examples
///
/// ```
/// use mp_codec::primitives::try_write_u64;
///
/// let mut buf = [0u8; 9];
/// assert_eq!(try_write_u64(&mut buf, 127).len, 1);
/// assert_eq!(try_write_u64(&mut buf, 128).len, 2);
/// assert_eq!(try_write_u64(&mut buf, 65_536).len, 5);
/// assert_eq!(try_write_u64(&mut [], 1 << 40).len, 9);
/// ```
pub fn try_write_u64(dst: &mut [u8], value: u64) -> EncodeResult {
    if value <= u64::from(MAX_POSITIVE_FIXINT) {
        put(dst, value as u8, &[])
    } else if value <= u64::from(u8::MAX) {
        put(dst, UINT8, &[value as u8])
    } else if value <= u64::from(u16::MAX) {
        put(dst, UINT16, &(value as u16).to_be_bytes())
    } else if value <= u64::from(u32::MAX) {
        put(dst, UINT32, &(value as u32).to_be_bytes())
    } else {
        put(dst, UINT64, &value.to_be_bytes())
    }
}

/// Writes a signed integer in its most compact form.
///
/// Non-negative values use the unsigned forms, so `100i64` and `100u64`
/// encode identically.
pub fn try_write_i64(dst: &mut [u8], value: i64) -> EncodeResult {
    if value >= 0 {
        try_write_u64(dst, value as u64)
    } else if value >= MIN_NEGATIVE_FIXINT_VALUE {
        put(dst, value as i8 as u8, &[])
    } else if value >= i64::from(i8::MIN) {
        put(dst, INT8, &[value as i8 as u8])
    } else if value >= i64::from(i16::MIN) {
        put(dst, INT16, &(value as i16).to_be_bytes())
    } else if value >= i64::from(i32::MIN) {
        put(dst, INT32, &(value as i32).to_be_bytes())
    } else {
        put(dst, INT64, &value.to_be_bytes())
    }
}

macro_rules! exact_writers {
    ($($name:ident($ty:ty) => $code:ident;)*) => {$(
        /// Writes the value with its own width tag, never compacting.
        pub fn $name(dst: &mut [u8], value: $ty) -> EncodeResult {
            put(dst, $code, &value.to_be_bytes())
        }
    )*};
}

exact_writers! {
    try_write_u8_exact(u8) => UINT8;
    try_write_u16_exact(u16) => UINT16;
    try_write_u32_exact(u32) => UINT32;
    try_write_u64_exact(u64) => UINT64;
    try_write_i8_exact(i8) => INT8;
    try_write_i16_exact(i16) => INT16;
    try_write_i32_exact(i32) => INT32;
    try_write_i64_exact(i64) => INT64;
}

pub fn try_write_f32(dst: &mut [u8], value: f32) -> EncodeResult {
    put(dst, FLOAT32, &value.to_be_bytes())
}

pub fn try_write_f64(dst: &mut [u8], value: f64) -> EncodeResult {
    put(dst, FLOAT64, &value.to_be_bytes())
}

// -----------------------------------------------------------------------------
// Headers

fn collection_header(dst: &mut [u8], len: u32, fix_base: u8, code16: u8, code32: u8) -> EncodeResult {
    if len <= MAX_FIX_COLLECTION_LEN {
        put(dst, fix_base | len as u8, &[])
    } else if len <= u32::from(u16::MAX) {
        put(dst, code16, &(len as u16).to_be_bytes())
    } else {
        put(dst, code32, &len.to_be_bytes())
    }
}

pub fn try_write_array_header(dst: &mut [u8], len: u32) -> EncodeResult {
    collection_header(dst, len, MIN_FIXARRAY, ARRAY16, ARRAY32)
}

pub fn try_write_map_header(dst: &mut [u8], len: u32) -> EncodeResult {
    collection_header(dst, len, MIN_FIXMAP, MAP16, MAP32)
}

/// Writes a string header announcing `len` UTF-8 bytes.
pub fn try_write_string_header(dst: &mut [u8], len: u32) -> EncodeResult {
    if len <= MAX_FIXSTR_LEN {
        put(dst, MIN_FIXSTR | len as u8, &[])
    } else if len <= u32::from(u8::MAX) {
        put(dst, STR8, &[len as u8])
    } else if len <= u32::from(u16::MAX) {
        put(dst, STR16, &(len as u16).to_be_bytes())
    } else {
        put(dst, STR32, &len.to_be_bytes())
    }
}

pub fn try_write_binary_header(dst: &mut [u8], len: u32) -> EncodeResult {
    if len <= u32::from(u8::MAX) {
        put(dst, BIN8, &[len as u8])
    } else if len <= u32::from(u16::MAX) {
        put(dst, BIN16, &(len as u16).to_be_bytes())
    } else {
        put(dst, BIN32, &len.to_be_bytes())
    }
}

/// Writes an extension header, using a fixext form for payloads of
/// 1, 2, 4, 8 or 16 bytes.
pub fn try_write_extension_header(dst: &mut [u8], header: ExtensionHeader) -> EncodeResult {
    let ty = header.type_code as u8;
    match header.length {
        1 => put(dst, FIXEXT1, &[ty]),
        2 => put(dst, FIXEXT2, &[ty]),
        4 => put(dst, FIXEXT4, &[ty]),
        8 => put(dst, FIXEXT8, &[ty]),
        16 => put(dst, FIXEXT16, &[ty]),
        len if len <= u32::from(u8::MAX) => put(dst, EXT8, &[len as u8, ty]),
        len if len <= u32::from(u16::MAX) => {
            let [a, b] = (len as u16).to_be_bytes();
            put(dst, EXT16, &[a, b, ty])
        }
        len => {
            let [a, b, c, d] = len.to_be_bytes();
            put(dst, EXT32, &[a, b, c, d, ty])
        }
    }
}

/// Writes a complete timestamp extension in its smallest form.
///
/// # Examples
///
/// ```
/// use mp_codec::Timestamp;
/// use mp_codec::primitives::try_write_timestamp;
///
/// let mut buf = [0u8; 15];
/// let ts = Timestamp::new(1, 0).unwrap();
/// let res = try_write_timestamp(&mut buf, ts);
/// assert_eq!(&buf[..res.len], &[0xd6, 0xff, 0, 0, 0, 1]);
/// ```
pub fn try_write_timestamp(dst: &mut [u8], value: Timestamp) -> EncodeResult {
    let payload_len = value.payload_len();
    let header = ExtensionHeader::new(Timestamp::EXTENSION_TYPE, payload_len);
    // fixext4, fixext8 or ext8 with a 12 byte payload
    let header_len = if payload_len == 12 { 3 } else { 2 };
    let total = header_len + payload_len as usize;
    if dst.len() < total {
        return EncodeResult::needs(total);
    }
    let head = try_write_extension_header(dst, header);
    debug_assert_eq!(head.len, header_len);
    value.encode_payload(&mut dst[header_len..]);
    EncodeResult::written(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(f: impl Fn(&mut [u8]) -> EncodeResult) -> Vec<u8> {
        let mut buf = [0u8; 16];
        let res = f(&mut buf);
        assert!(res.fits);
        buf[..res.len].to_vec()
    }

    #[test]
    fn unsigned_boundaries() {
        assert_eq!(encode(|b| try_write_u64(b, 0)), [0x00]);
        assert_eq!(encode(|b| try_write_u64(b, 127)), [0x7f]);
        assert_eq!(encode(|b| try_write_u64(b, 128)), [0xcc, 0x80]);
        assert_eq!(encode(|b| try_write_u64(b, 255)), [0xcc, 0xff]);
        assert_eq!(encode(|b| try_write_u64(b, 256)), [0xcd, 0x01, 0x00]);
        assert_eq!(encode(|b| try_write_u64(b, 65_535)).len(), 3);
        assert_eq!(encode(|b| try_write_u64(b, 65_536)).len(), 5);
        assert_eq!(encode(|b| try_write_u64(b, u64::from(u32::MAX))).len(), 5);
        assert_eq!(encode(|b| try_write_u64(b, u64::from(u32::MAX) + 1)).len(), 9);
    }

    #[test]
    fn signed_boundaries() {
        assert_eq!(encode(|b| try_write_i64(b, -1)), [0xff]);
        assert_eq!(encode(|b| try_write_i64(b, -32)), [0xe0]);
        assert_eq!(encode(|b| try_write_i64(b, -33)), [0xd0, 0xdf]);
        assert_eq!(encode(|b| try_write_i64(b, -128)), [0xd0, 0x80]);
        assert_eq!(encode(|b| try_write_i64(b, -129)), [0xd1, 0xff, 0x7f]);
        assert_eq!(encode(|b| try_write_i64(b, i64::from(i32::MIN))).len(), 5);
        assert_eq!(encode(|b| try_write_i64(b, i64::MIN)).len(), 9);
        assert_eq!(encode(|b| try_write_i64(b, 200)), encode(|b| try_write_u64(b, 200)));
    }

    #[test]
    fn exact_width_never_compacts() {
        assert_eq!(encode(|b| try_write_u32_exact(b, 1)), [0xce, 0, 0, 0, 1]);
        assert_eq!(encode(|b| try_write_i8_exact(b, 1)), [0xd0, 1]);
    }

    #[test]
    fn too_small_reports_exact_need() {
        let mut small = [0u8; 2];
        assert_eq!(try_write_u64(&mut small, 1 << 20), EncodeResult::needs(5));
        assert_eq!(small, [0, 0]);
        assert_eq!(try_write_f64(&mut small, 1.5), EncodeResult::needs(9));
        assert_eq!(try_write_nil(&mut []), EncodeResult::needs(1));
    }

    #[test]
    fn header_escalation() {
        assert_eq!(encode(|b| try_write_array_header(b, 15)), [0x9f]);
        assert_eq!(encode(|b| try_write_array_header(b, 16)), [0xdc, 0, 16]);
        assert_eq!(encode(|b| try_write_map_header(b, 70_000)).len(), 5);
        assert_eq!(encode(|b| try_write_string_header(b, 31)), [0xbf]);
        assert_eq!(encode(|b| try_write_string_header(b, 32)), [0xd9, 32]);
        assert_eq!(encode(|b| try_write_binary_header(b, 0)), [0xc4, 0]);
    }

    #[test]
    fn extension_headers() {
        let h = |len| ExtensionHeader::new(5, len);
        assert_eq!(encode(|b| try_write_extension_header(b, h(1))), [0xd4, 5]);
        assert_eq!(encode(|b| try_write_extension_header(b, h(16))), [0xd8, 5]);
        assert_eq!(encode(|b| try_write_extension_header(b, h(3))), [0xc7, 3, 5]);
        assert_eq!(encode(|b| try_write_extension_header(b, h(300))), [0xc8, 1, 44, 5]);
    }

    #[test]
    fn timestamp_forms() {
        let ts = |s, n| Timestamp::new(s, n).unwrap();
        assert_eq!(encode(|b| try_write_timestamp(b, ts(0, 0)))[..2], [0xd6, 0xff]);
        assert_eq!(encode(|b| try_write_timestamp(b, ts(0, 1))).len(), 10);
        let ts96 = encode(|b| try_write_timestamp(b, ts(-1, 0)));
        assert_eq!(ts96[..3], [0xc7, 12, 0xff]);
        assert_eq!(ts96.len(), 15);
    }
}
