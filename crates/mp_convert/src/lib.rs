#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern crates

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod cache;
mod context;
mod converter;
mod converters;
mod error;
mod naming;
mod options;
mod references;
mod serializer;
mod shared;
mod union;

pub mod shape;

#[cfg(feature = "async")]
mod stream;

#[cfg(test)]
mod tests;

// -----------------------------------------------------------------------------
// Exports

pub use cache::{ConverterCache, ConverterFactory, ConverterRegistry, FactoryConverter, FactoryRequest};
pub use context::{CancellationToken, SerializationContext};
pub use converter::{Converter, DynConverter};
pub use error::{ErrorKind, SerdeError};
pub use naming::{NamingPolicy, to_camel_case, to_pascal_case};
pub use options::{EnumFormat, SerializeDefaultValues, SerializerOptions};
pub use serializer::{Serializer, SerializerBuilder};
pub use shared::Shared;

#[cfg(feature = "async")]
pub use stream::{MessageStream, deserialize_async, serialize_async};

// -----------------------------------------------------------------------------
// Re-Exports

pub use mp_codec;
