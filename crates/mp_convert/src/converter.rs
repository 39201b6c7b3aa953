use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::{Any, type_name};
use core::marker::PhantomData;

use mp_codec::{IncrementalReader, Reader, Writer};

use crate::{SerdeError, SerializationContext};

// -----------------------------------------------------------------------------
// Converter

/// A bidirectional codec for values of one type.
///
/// Every call reads or writes exactly one complete wire value. Converters
/// are shared between threads and operations, so per-call state belongs in
/// the [`SerializationContext`], never in the converter.
///
/// # Examples
///
/// ```
/// use mp_codec::{Reader, Writer};
/// use mp_convert::{Converter, SerdeError, SerializationContext};
///
/// /// Stores a bool as 0 or 1.
/// struct BitConverter;
///
/// impl Converter<bool> for BitConverter {
///     fn write(&self, w: &mut Writer<'_>, v: &bool, _: &mut SerializationContext) -> Result<(), SerdeError> {
///         w.write_u64(u64::from(*v));
///         Ok(())
///     }
///
///     fn read(&self, r: &mut Reader<'_>, _: &mut SerializationContext) -> Result<bool, SerdeError> {
///         Ok(r.read_int::<u8>()? != 0)
///     }
/// }
///
/// let mut out = Vec::new();
/// let mut ctx = SerializationContext::default();
/// BitConverter.write(&mut Writer::new(&mut out), &true, &mut ctx).unwrap();
/// assert_eq!(out, [0x01]);
/// ```
pub trait Converter<T>: Send + Sync + 'static {
    fn write(
        &self,
        writer: &mut Writer<'_>,
        value: &T,
        ctx: &mut SerializationContext,
    ) -> Result<(), SerdeError>;

    fn read(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<T, SerdeError>;

    /// Reads the next value from an incremental transport.
    ///
    /// Returns `Ok(None)` until the whole value is buffered. The default
    /// rents a reader over the buffered value, delegates to
    /// [`read`](Converter::read) and returns the reader before returning.
    fn read_incremental(
        &self,
        input: &mut IncrementalReader,
        ctx: &mut SerializationContext,
    ) -> Result<Option<T>, SerdeError> {
        let Some(mut rented) = input.rent()? else {
            return Ok(None);
        };
        match self.read(rented.reader(), ctx) {
            Ok(value) => {
                rented.return_reader()?;
                Ok(Some(value))
            }
            Err(err) => {
                // The value stays in the transport; the error is what matters.
                rented.return_reader().ok();
                Err(err)
            }
        }
    }
}

/// Reinterprets a converter for `A` as a converter for `B`.
///
/// Succeeds only when `A` and `B` are the same type.
pub(crate) fn cast_converter<A: 'static, B: 'static>(
    converter: Arc<dyn Converter<A>>,
) -> Option<Arc<dyn Converter<B>>> {
    let erased: Box<dyn Any> = Box::new(converter);
    erased
        .downcast::<Arc<dyn Converter<B>>>()
        .ok()
        .map(|converter| *converter)
}

// -----------------------------------------------------------------------------
// DynConverter

/// A converter over type-erased values.
///
/// Returned by [`ConverterFactory`](crate::ConverterFactory) implementations
/// that serve a whole family of types without naming each one.
pub trait DynConverter: Send + Sync + 'static {
    fn write_dyn(
        &self,
        writer: &mut Writer<'_>,
        value: &dyn Any,
        ctx: &mut SerializationContext,
    ) -> Result<(), SerdeError>;

    fn read_dyn(
        &self,
        reader: &mut Reader<'_>,
        ctx: &mut SerializationContext,
    ) -> Result<Box<dyn Any + Send>, SerdeError>;
}

/// Presents a [`DynConverter`] as a typed converter.
pub(crate) struct DynAdapter<T> {
    inner: Arc<dyn DynConverter>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> DynAdapter<T> {
    pub(crate) fn new(inner: Arc<dyn DynConverter>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<T: Any + Send> Converter<T> for DynAdapter<T> {
    fn write(
        &self,
        writer: &mut Writer<'_>,
        value: &T,
        ctx: &mut SerializationContext,
    ) -> Result<(), SerdeError> {
        self.inner.write_dyn(writer, value, ctx)
    }

    fn read(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<T, SerdeError> {
        let value: Box<dyn Any> = self.inner.read_dyn(reader, ctx)?;
        match value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(_) => Err(SerdeError::misuse(alloc::format!(
                "dynamic converter produced a value that is not `{}`",
                type_name::<T>()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unit;

    impl Converter<()> for Unit {
        fn write(&self, w: &mut Writer<'_>, _: &(), _: &mut SerializationContext) -> Result<(), SerdeError> {
            w.write_nil();
            Ok(())
        }

        fn read(&self, r: &mut Reader<'_>, _: &mut SerializationContext) -> Result<(), SerdeError> {
            Ok(r.read_nil()?)
        }
    }

    #[test]
    fn cast_only_between_identical_types() {
        let conv: Arc<dyn Converter<()>> = Arc::new(Unit);
        assert!(cast_converter::<(), ()>(conv.clone()).is_some());
        assert!(cast_converter::<(), u8>(conv).is_none());
    }

    #[test]
    fn incremental_default_waits_for_whole_value() {
        let mut input = IncrementalReader::new();
        let mut ctx = SerializationContext::default();
        assert!(Unit.read_incremental(&mut input, &mut ctx).unwrap().is_none());
        input.feed(&[0xc0]);
        assert_eq!(Unit.read_incremental(&mut input, &mut ctx).unwrap(), Some(()));
        assert!(input.is_empty());
    }
}
