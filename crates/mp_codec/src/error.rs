use thiserror::Error;

// -----------------------------------------------------------------------------
// DecodeErrorKind

/// The reason a byte sequence could not be decoded.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    #[error("expected {expected} but found code {found:#04x}")]
    UnexpectedCode { expected: &'static str, found: u8 },

    #[error("code 0xc1 is reserved and never used")]
    ReservedCode,

    #[error("integer does not fit in `{target}`")]
    IntegerOverflow { target: &'static str },

    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("timestamp extension has an invalid payload of {len} bytes")]
    InvalidTimestamp { len: u32 },

    #[error("unexpected end of data")]
    EndOfData,

    #[error("{remaining} trailing bytes after the value")]
    TrailingData { remaining: usize },
}

// -----------------------------------------------------------------------------
// DecodeError

/// A decode failure with the buffer offset at which the failing token starts.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{kind} at offset {offset}")]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    pub offset: usize,
}

impl DecodeError {
    #[inline]
    pub const fn new(kind: DecodeErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

// -----------------------------------------------------------------------------
// EncodeError

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum EncodeError {
    #[error("length {len} exceeds the 32-bit limit of the format")]
    LengthOverflow { len: usize },
}
