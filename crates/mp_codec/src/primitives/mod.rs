//! Stateless encoders and decoders over raw byte slices.
//!
//! Encoders never allocate. Each returns an [`EncodeResult`]: when `fits` is
//! false nothing was written and `len` is the exact space required, so the
//! caller can grow its buffer and retry.
//!
//! Decoders return `Ok(DecodeResult::Success((value, consumed)))` when a whole
//! token was available, `EmptyBuffer` or `InsufficientBuffer` when more input
//! is needed, and `Err` only for data that can never decode.

mod decode;
mod encode;

pub use decode::*;
pub use encode::*;

use crate::{DecodeErrorKind, DecodeResult};

/// The outcome of a primitive decode.
pub type DecodeOutcome<T> = Result<DecodeResult<T>, DecodeErrorKind>;

/// The outcome of a primitive encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct EncodeResult {
    /// Whether the value was written.
    pub fits: bool,
    /// Bytes written, or bytes required when `fits` is false.
    pub len: usize,
}

impl EncodeResult {
    #[inline]
    pub(crate) const fn written(len: usize) -> Self {
        Self { fits: true, len }
    }

    #[inline]
    pub(crate) const fn needs(len: usize) -> Self {
        Self { fits: false, len }
    }
}

/// Longest header any encoder in this module emits (the 96-bit timestamp).
pub const MAX_HEADER_LEN: usize = 15;
