//! MessagePack format codes and token classification.
//!
//! Every value starts with one leading byte. Some codes carry their payload
//! inline (fixint, fixstr, fixarray, fixmap), the rest announce a fixed-size
//! or length-prefixed payload.

use core::fmt;

// -----------------------------------------------------------------------------
// Codes

pub const MAX_POSITIVE_FIXINT: u8 = 0x7f;
pub const MIN_FIXMAP: u8 = 0x80;
pub const MAX_FIXMAP: u8 = 0x8f;
pub const MIN_FIXARRAY: u8 = 0x90;
pub const MAX_FIXARRAY: u8 = 0x9f;
pub const MIN_FIXSTR: u8 = 0xa0;
pub const MAX_FIXSTR: u8 = 0xbf;
pub const NIL: u8 = 0xc0;
pub const NEVER_USED: u8 = 0xc1;
pub const FALSE: u8 = 0xc2;
pub const TRUE: u8 = 0xc3;
pub const BIN8: u8 = 0xc4;
pub const BIN16: u8 = 0xc5;
pub const BIN32: u8 = 0xc6;
pub const EXT8: u8 = 0xc7;
pub const EXT16: u8 = 0xc8;
pub const EXT32: u8 = 0xc9;
pub const FLOAT32: u8 = 0xca;
pub const FLOAT64: u8 = 0xcb;
pub const UINT8: u8 = 0xcc;
pub const UINT16: u8 = 0xcd;
pub const UINT32: u8 = 0xce;
pub const UINT64: u8 = 0xcf;
pub const INT8: u8 = 0xd0;
pub const INT16: u8 = 0xd1;
pub const INT32: u8 = 0xd2;
pub const INT64: u8 = 0xd3;
pub const FIXEXT1: u8 = 0xd4;
pub const FIXEXT2: u8 = 0xd5;
pub const FIXEXT4: u8 = 0xd6;
pub const FIXEXT8: u8 = 0xd7;
pub const FIXEXT16: u8 = 0xd8;
pub const STR8: u8 = 0xd9;
pub const STR16: u8 = 0xda;
pub const STR32: u8 = 0xdb;
pub const ARRAY16: u8 = 0xdc;
pub const ARRAY32: u8 = 0xdd;
pub const MAP16: u8 = 0xde;
pub const MAP32: u8 = 0xdf;
pub const MIN_NEGATIVE_FIXINT: u8 = 0xe0;

/// Smallest value representable as a negative fixint.
pub const MIN_NEGATIVE_FIXINT_VALUE: i64 = -32;

/// Largest element count stored inline in a fixarray or fixmap header.
pub const MAX_FIX_COLLECTION_LEN: u32 = 0x0f;

/// Largest byte length stored inline in a fixstr header.
pub const MAX_FIXSTR_LEN: u32 = 0x1f;

// -----------------------------------------------------------------------------
// TokenType

/// The kind of value a leading byte announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Nil,
    Boolean,
    Integer,
    Float,
    String,
    Binary,
    Array,
    Map,
    Extension,
}

impl TokenType {
    /// Classifies a leading byte.
    ///
    /// Returns `None` for `0xc1`, the one code the format never uses.
    ///
    /// # Examples
    ///
    /// ```
    /// use mp_codec::TokenType;
    ///
    /// assert_eq!(TokenType::from_code(0x05), Some(TokenType::Integer));
    /// assert_eq!(TokenType::from_code(0x93), Some(TokenType::Array));
    /// assert_eq!(TokenType::from_code(0xc1), None);
    /// ```
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0x00..=MAX_POSITIVE_FIXINT => Self::Integer,
            MIN_FIXMAP..=MAX_FIXMAP => Self::Map,
            MIN_FIXARRAY..=MAX_FIXARRAY => Self::Array,
            MIN_FIXSTR..=MAX_FIXSTR => Self::String,
            NIL => Self::Nil,
            NEVER_USED => return None,
            FALSE | TRUE => Self::Boolean,
            BIN8 | BIN16 | BIN32 => Self::Binary,
            EXT8 | EXT16 | EXT32 => Self::Extension,
            FLOAT32 | FLOAT64 => Self::Float,
            UINT8 | UINT16 | UINT32 | UINT64 => Self::Integer,
            INT8 | INT16 | INT32 | INT64 => Self::Integer,
            FIXEXT1 | FIXEXT2 | FIXEXT4 | FIXEXT8 | FIXEXT16 => Self::Extension,
            STR8 | STR16 | STR32 => Self::String,
            ARRAY16 | ARRAY32 => Self::Array,
            MAP16 | MAP32 => Self::Map,
            MIN_NEGATIVE_FIXINT..=0xff => Self::Integer,
        })
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.pad("nil"),
            Self::Boolean => f.pad("boolean"),
            Self::Integer => f.pad("integer"),
            Self::Float => f.pad("float"),
            Self::String => f.pad("string"),
            Self::Binary => f.pad("binary"),
            Self::Array => f.pad("array"),
            Self::Map => f.pad("map"),
            Self::Extension => f.pad("extension"),
        }
    }
}
