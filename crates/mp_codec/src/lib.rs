#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern crates

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod extension;
mod format;
mod incremental;
mod integer;
mod reader;
mod streaming;
mod timestamp;
mod writer;

pub mod code;
pub mod primitives;

// -----------------------------------------------------------------------------
// Top-level exports

pub use code::TokenType;
pub use error::{DecodeError, DecodeErrorKind, EncodeError};
pub use extension::{Extension, ExtensionHeader};
pub use format::{Deformatter, ExactInt, Formatter, MSGPACK, MsgPackFormat, TokenSpan};
pub use incremental::{IncrementalReader, RentalError, RentedReader};
pub use integer::Integer;
pub use reader::Reader;
pub use streaming::{DecodeResult, DecodeStep, StreamingReader};
pub use timestamp::Timestamp;
pub use writer::Writer;
