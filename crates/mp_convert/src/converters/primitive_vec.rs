//! Specialized converters of `Vec`s of scalars.
//!
//! Selected in place of the element-by-element converter when the element
//! type has no override. They skip the dynamic element converter and,
//! for fixed-width elements, decode whole runs of canonical tokens at once.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{TypeId, type_name};

use log::trace;
use mp_codec::code::{FALSE, FLOAT32, FLOAT64, TRUE};
use mp_codec::{DecodeError, Reader, TokenType, Writer};

use super::collection::bounded_capacity;
use crate::cache::SynthesisVisitor;
use crate::converter::cast_converter;
use crate::shape::Shaped;
use crate::{Converter, SerdeError, SerializationContext};

/// Returns a specialized converter if `T` is `Vec<E>` of a supported
/// scalar `E`.
pub(super) fn specialize<T: 'static, E: Shaped>(visitor: &SynthesisVisitor<'_>) -> Option<Arc<dyn Converter<T>>> {
    if TypeId::of::<T>() != TypeId::of::<Vec<E>>() || visitor.has_override::<E>() {
        return None;
    }

    macro_rules! select {
        ($($elem:ty => $converter:expr,)*) => {$(
            if TypeId::of::<E>() == TypeId::of::<$elem>() {
                trace!("specialized converter selected for `{}`", type_name::<T>());
                let converter: Arc<dyn Converter<Vec<$elem>>> = Arc::new($converter);
                return cast_converter::<Vec<$elem>, T>(converter);
            }
        )*};
    }

    select! {
        u8 => BinaryConverter,
        bool => FixedWidthConverter,
        f32 => FixedWidthConverter,
        f64 => FixedWidthConverter,
        u16 => IntArrayConverter,
        u32 => IntArrayConverter,
        u64 => IntArrayConverter,
        i8 => IntArrayConverter,
        i16 => IntArrayConverter,
        i32 => IntArrayConverter,
        i64 => IntArrayConverter,
    }

    None
}

// -----------------------------------------------------------------------------
// Binary

/// Writes bytes as a binary token. Also reads arrays of small integers.
pub(crate) struct BinaryConverter;

impl Converter<Vec<u8>> for BinaryConverter {
    fn write(&self, writer: &mut Writer<'_>, value: &Vec<u8>, _: &mut SerializationContext) -> Result<(), SerdeError> {
        Ok(writer.write_binary(value)?)
    }

    fn read(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<Vec<u8>, SerdeError> {
        if reader.peek_token_type()? == TokenType::Array {
            return IntArrayConverter.read(reader, ctx);
        }
        Ok(reader.read_byte_buf()?)
    }
}

// -----------------------------------------------------------------------------
// Fixed width

/// A scalar whose canonical encoding has a fixed size.
pub(crate) trait FixedWidth: Copy + Send + Sync + 'static {
    const WIDTH: usize;

    fn write(writer: &mut Writer<'_>, value: Self);

    fn read(reader: &mut Reader<'_>) -> Result<Self, DecodeError>;

    /// Decodes exactly [`WIDTH`](Self::WIDTH) bytes of the canonical
    /// encoding, or returns `None` for any other encoding.
    fn decode(chunk: &[u8]) -> Option<Self>;
}

impl FixedWidth for bool {
    const WIDTH: usize = 1;

    #[inline]
    fn write(writer: &mut Writer<'_>, value: Self) {
        writer.write_bool(value);
    }

    #[inline]
    fn read(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        reader.read_bool()
    }

    #[inline]
    fn decode(chunk: &[u8]) -> Option<Self> {
        match chunk {
            [FALSE] => Some(false),
            [TRUE] => Some(true),
            _ => None,
        }
    }
}

impl FixedWidth for f32 {
    const WIDTH: usize = 5;

    #[inline]
    fn write(writer: &mut Writer<'_>, value: Self) {
        writer.write_f32(value);
    }

    #[inline]
    fn read(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        reader.read_f32()
    }

    #[inline]
    fn decode(chunk: &[u8]) -> Option<Self> {
        match chunk {
            [FLOAT32, payload @ ..] => Some(f32::from_be_bytes(payload.try_into().ok()?)),
            _ => None,
        }
    }
}

impl FixedWidth for f64 {
    const WIDTH: usize = 9;

    #[inline]
    fn write(writer: &mut Writer<'_>, value: Self) {
        writer.write_f64(value);
    }

    #[inline]
    fn read(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        reader.read_f64()
    }

    #[inline]
    fn decode(chunk: &[u8]) -> Option<Self> {
        match chunk {
            [FLOAT64, payload @ ..] => Some(f64::from_be_bytes(payload.try_into().ok()?)),
            _ => None,
        }
    }
}

pub(crate) struct FixedWidthConverter;

impl<E: FixedWidth> Converter<Vec<E>> for FixedWidthConverter {
    fn write(&self, writer: &mut Writer<'_>, value: &Vec<E>, ctx: &mut SerializationContext) -> Result<(), SerdeError> {
        ctx.nested(|_| {
            writer.write_array_header(value.len())?;
            writer.reserve(value.len().saturating_mul(E::WIDTH));
            for &element in value {
                E::write(writer, element);
            }
            Ok(())
        })
    }

    fn read(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<Vec<E>, SerdeError> {
        ctx.nested(|_| {
            let len = reader.read_array_header()?;
            let total = (len as usize).saturating_mul(E::WIDTH);

            if let Some(run) = reader.remaining().get(..total) {
                let decoded: Option<Vec<E>> = run.chunks_exact(E::WIDTH).map(E::decode).collect();
                if let Some(values) = decoded {
                    reader.read_bytes(total)?;
                    return Ok(values);
                }
            }

            // Mixed or non-canonical encodings.
            let mut values = Vec::with_capacity(bounded_capacity(reader, len));
            for _ in 0..len {
                values.push(E::read(reader)?);
            }
            Ok(values)
        })
    }
}

// -----------------------------------------------------------------------------
// Integers

/// An integer written in its most compact form.
pub(crate) trait PrimitiveInt: Copy + Send + Sync + TryFrom<u64> + TryFrom<i64> + 'static {
    fn write(writer: &mut Writer<'_>, value: Self);
}

macro_rules! impl_primitive_int {
    ($($ty:ty => $wide:ty, $write:ident;)*) => {$(
        impl PrimitiveInt for $ty {
            #[inline]
            fn write(writer: &mut Writer<'_>, value: Self) {
                writer.$write(value as $wide);
            }
        }
    )*};
}

impl_primitive_int! {
    u8 => u64, write_u64;
    u16 => u64, write_u64;
    u32 => u64, write_u64;
    u64 => u64, write_u64;
    i8 => i64, write_i64;
    i16 => i64, write_i64;
    i32 => i64, write_i64;
    i64 => i64, write_i64;
}

pub(crate) struct IntArrayConverter;

impl<E: PrimitiveInt> Converter<Vec<E>> for IntArrayConverter {
    fn write(&self, writer: &mut Writer<'_>, value: &Vec<E>, ctx: &mut SerializationContext) -> Result<(), SerdeError> {
        ctx.nested(|_| {
            writer.write_array_header(value.len())?;
            for &element in value {
                E::write(writer, element);
            }
            Ok(())
        })
    }

    fn read(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<Vec<E>, SerdeError> {
        ctx.nested(|_| {
            let len = reader.read_array_header()?;
            let mut values = Vec::with_capacity(bounded_capacity(reader, len));
            for _ in 0..len {
                values.push(reader.read_int::<E>()?);
            }
            Ok(values)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<T>(conv: &impl Converter<T>, value: &T) -> Vec<u8> {
        let mut out = Vec::new();
        conv.write(&mut Writer::new(&mut out), value, &mut SerializationContext::default())
            .unwrap();
        out
    }

    fn decode<T>(conv: &impl Converter<T>, bytes: &[u8]) -> T {
        let mut reader = Reader::new(bytes);
        let value = conv.read(&mut reader, &mut SerializationContext::default()).unwrap();
        assert!(reader.is_empty());
        value
    }

    #[test]
    fn bytes_are_binary() {
        assert_eq!(encode(&BinaryConverter, &alloc::vec![1u8, 2]), [0xc4, 0x02, 0x01, 0x02]);
        assert_eq!(decode(&BinaryConverter, &[0xc4, 0x01, 0x07]), [7]);
        assert_eq!(decode(&BinaryConverter, &[0x92, 0x01, 0xcc, 0xff]), [1, 255]);
    }

    #[test]
    fn bools_bulk_and_fallback() {
        let bytes = encode(&FixedWidthConverter, &alloc::vec![true, false, true]);
        assert_eq!(bytes, [0x93, 0xc3, 0xc2, 0xc3]);
        assert_eq!(decode::<Vec<bool>>(&FixedWidthConverter, &bytes), [true, false, true]);
    }

    #[test]
    fn floats_accept_mixed_encodings() {
        let values = alloc::vec![1.5f64, -2.0];
        let bytes = encode(&FixedWidthConverter, &values);
        assert_eq!(bytes.len(), 1 + 2 * 9);
        assert_eq!(decode::<Vec<f64>>(&FixedWidthConverter, &bytes), values);

        // float32 and integer elements take the element-by-element path
        let mixed = [0x93, 0xca, 0x3f, 0xc0, 0x00, 0x00, 0x02, 0xcb, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(decode::<Vec<f64>>(&FixedWidthConverter, &mixed), [1.5, 2.0, 0.0]);
    }

    #[test]
    fn ints_reject_overflow() {
        let bytes = encode(&IntArrayConverter, &alloc::vec![1i16, -300]);
        assert_eq!(bytes, [0x92, 0x01, 0xd1, 0xfe, 0xd4]);
        let mut reader = Reader::new(&bytes);
        let err = Converter::<Vec<i8>>::read(&IntArrayConverter, &mut reader, &mut SerializationContext::default());
        assert!(err.is_err());
    }
}
