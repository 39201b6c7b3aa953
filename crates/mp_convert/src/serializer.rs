use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::type_name;

use mp_codec::{Deformatter, Formatter, IncrementalReader, MSGPACK, Reader, Writer};

use crate::cache::{ConverterCache, ConverterFactory, ConverterRegistry};
use crate::shape::Shaped;
use crate::{Converter, SerdeError, SerializationContext, SerializerOptions};

// -----------------------------------------------------------------------------
// Serializer

/// Entry point of the engine: owns the options and the converter cache.
///
/// Converters are synthesized on first use of a type and shared by every
/// later call, including calls from other threads.
///
/// # Examples
///
/// ```
/// use mp_convert::Serializer;
///
/// let serializer = Serializer::new();
/// let bytes = serializer.serialize(&vec![1u16, 300]).unwrap();
/// assert_eq!(bytes, [0x92, 0x01, 0xcd, 0x01, 0x2c]);
///
/// let back: Vec<u16> = serializer.deserialize(&bytes).unwrap();
/// assert_eq!(back, [1, 300]);
/// ```
pub struct Serializer {
    cache: ConverterCache,
    deformatter: &'static dyn Deformatter,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Serializer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Serializer")
            .field("options", self.options())
            .field("converters", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl Serializer {
    pub fn new() -> Self {
        Self::with_options(SerializerOptions::default())
    }

    pub fn with_options(options: SerializerOptions) -> Self {
        Self {
            cache: ConverterCache::new(options, ConverterRegistry::new()),
            deformatter: &MSGPACK,
        }
    }

    pub fn builder() -> SerializerBuilder {
        SerializerBuilder::new()
    }

    #[inline]
    pub fn options(&self) -> &SerializerOptions {
        self.cache.options()
    }

    #[inline]
    pub fn cache(&self) -> &ConverterCache {
        &self.cache
    }

    /// Returns the converter of `T`, synthesizing it on first use.
    pub fn converter<T: Shaped>(&self) -> Result<Arc<dyn Converter<T>>, SerdeError> {
        self.cache.get_or_create::<T>()
    }

    /// A fresh context for one operation.
    pub fn context(&self) -> SerializationContext {
        SerializationContext::new(self.options())
    }

    fn writer<'a>(&self, out: &'a mut Vec<u8>) -> Writer<'a> {
        Writer::with_formatter(out, self.cache.formatter())
    }

    /// Serializes `value` into a new buffer.
    pub fn serialize<T: Shaped>(&self, value: &T) -> Result<Vec<u8>, SerdeError> {
        let mut out = Vec::new();
        self.serialize_into(&mut out, value)?;
        Ok(out)
    }

    /// Appends the encoding of `value` to `out`.
    ///
    /// On error `out` may hold a partial value.
    pub fn serialize_into<T: Shaped>(&self, out: &mut Vec<u8>, value: &T) -> Result<(), SerdeError> {
        self.serialize_with(out, value, &mut self.context())
    }

    /// Serializes with a caller-provided context.
    pub fn serialize_with<T: Shaped>(
        &self,
        out: &mut Vec<u8>,
        value: &T,
        ctx: &mut SerializationContext,
    ) -> Result<(), SerdeError> {
        self.write_one(out, value, ctx)
            .map_err(|err| err.in_operation::<T>("serialize"))
    }

    /// Deserializes one value that must span all of `bytes`.
    pub fn deserialize<T: Shaped>(&self, bytes: &[u8]) -> Result<T, SerdeError> {
        self.deserialize_with(bytes, &mut self.context())
    }

    pub fn deserialize_with<T: Shaped>(
        &self,
        bytes: &[u8],
        ctx: &mut SerializationContext,
    ) -> Result<T, SerdeError> {
        let mut reader = Reader::with_deformatter(bytes, self.deformatter);
        self.read_one::<T>(&mut reader, ctx)
            .and_then(|value| {
                reader.expect_end()?;
                Ok(value)
            })
            .map_err(|err| err.in_operation::<T>("deserialize"))
    }

    /// Deserializes the first value of `bytes`, returning it with the
    /// number of bytes it spans.
    pub fn deserialize_prefix<T: Shaped>(&self, bytes: &[u8]) -> Result<(T, usize), SerdeError> {
        let mut reader = Reader::with_deformatter(bytes, self.deformatter);
        self.read_one::<T>(&mut reader, &mut self.context())
            .map(|value| (value, reader.position()))
            .map_err(|err| err.in_operation::<T>("deserialize"))
    }

    /// Reads the next value from an incremental transport.
    ///
    /// Returns `Ok(None)` while the value is incomplete; feed more input and
    /// call again.
    pub fn deserialize_incremental<T: Shaped>(
        &self,
        input: &mut IncrementalReader,
        ctx: &mut SerializationContext,
    ) -> Result<Option<T>, SerdeError> {
        self.converter::<T>()
            .and_then(|converter| {
                ctx.reset_for_next_value();
                converter.read_incremental(input, ctx)
            })
            .map_err(|err| err.in_operation::<T>("deserialize"))
    }

    /// An incremental reader using this serializer's wire format.
    pub fn incremental_reader(&self) -> IncrementalReader {
        IncrementalReader::with_deformatter(self.deformatter)
    }

    fn write_one<T: Shaped>(
        &self,
        out: &mut Vec<u8>,
        value: &T,
        ctx: &mut SerializationContext,
    ) -> Result<(), SerdeError> {
        let converter = self.converter::<T>()?;
        ctx.reset_for_next_value();
        converter.write(&mut self.writer(out), value, ctx)
    }

    fn read_one<T: Shaped>(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<T, SerdeError> {
        let converter = self.converter::<T>()?;
        ctx.reset_for_next_value();
        log::trace!("reading `{}` at offset {}", type_name::<T>(), reader.position());
        converter.read(reader, ctx)
    }
}

// -----------------------------------------------------------------------------
// SerializerBuilder

/// Configures a [`Serializer`] before its first use.
///
/// Registrations are fixed once the serializer is built.
#[derive(Debug, Default)]
pub struct SerializerBuilder {
    options: SerializerOptions,
    registry: ConverterRegistry,
    format: Option<WireFormat>,
}

#[derive(Debug, Clone, Copy)]
struct WireFormat {
    formatter: &'static dyn Formatter,
    deformatter: &'static dyn Deformatter,
}

impl SerializerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(mut self, options: SerializerOptions) -> Self {
        self.options = options;
        self
    }

    /// Uses `converter` for every occurrence of `T`.
    pub fn register<T: 'static>(mut self, converter: impl Converter<T>) -> Self {
        self.registry.register::<T>(converter);
        self
    }

    /// Consults `factory` for every type without an exact registration.
    pub fn factory(mut self, factory: impl ConverterFactory) -> Self {
        self.registry.register_factory(factory);
        self
    }

    /// Replaces the token encoding of the wire format.
    pub fn format<F: Formatter + Deformatter>(mut self, format: &'static F) -> Self {
        self.format = Some(WireFormat {
            formatter: format,
            deformatter: format,
        });
        self
    }

    pub fn build(self) -> Serializer {
        let format = self.format.unwrap_or(WireFormat {
            formatter: &MSGPACK,
            deformatter: &MSGPACK,
        });
        Serializer {
            cache: ConverterCache::with_formatter(self.options, self.registry, format.formatter),
            deformatter: format.deformatter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn trailing_bytes_are_rejected() {
        let serializer = Serializer::new();
        let err = serializer.deserialize::<u8>(&[0x01, 0x02]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);

        let (value, len) = serializer.deserialize_prefix::<u8>(&[0x01, 0x02]).unwrap();
        assert_eq!((value, len), (1, 1));
    }

    #[test]
    fn errors_name_the_operation() {
        let serializer = Serializer::new();
        let err = serializer.deserialize::<String>(&[0x01]).unwrap_err();
        assert!(err.to_string().contains("deserialize"), "{err}");
    }

    #[test]
    fn serialize_into_appends() {
        let serializer = Serializer::new();
        let mut out = vec![0xff];
        serializer.serialize_into(&mut out, &true).unwrap();
        assert_eq!(out, [0xff, 0xc3]);
    }

    #[test]
    fn incremental_waits_for_complete_value() {
        let serializer = Serializer::new();
        let mut input = serializer.incremental_reader();
        let mut ctx = serializer.context();
        input.feed(&[0xcd, 0x01]);
        assert_eq!(serializer.deserialize_incremental::<u16>(&mut input, &mut ctx).unwrap(), None);
        input.feed(&[0x2c]);
        assert_eq!(serializer.deserialize_incremental::<u16>(&mut input, &mut ctx).unwrap(), Some(300));
    }
}
