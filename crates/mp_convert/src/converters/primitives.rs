//! Converters of scalar types.

use alloc::string::String;
use std::time::SystemTime;

use mp_codec::{Reader, Timestamp, Writer};

use crate::{Converter, SerdeError, SerializationContext};

pub(crate) struct UnitConverter;

impl Converter<()> for UnitConverter {
    fn write(&self, writer: &mut Writer<'_>, _: &(), _: &mut SerializationContext) -> Result<(), SerdeError> {
        writer.write_nil();
        Ok(())
    }

    fn read(&self, reader: &mut Reader<'_>, _: &mut SerializationContext) -> Result<(), SerdeError> {
        Ok(reader.read_nil()?)
    }
}

pub(crate) struct BoolConverter;

impl Converter<bool> for BoolConverter {
    fn write(&self, writer: &mut Writer<'_>, value: &bool, _: &mut SerializationContext) -> Result<(), SerdeError> {
        writer.write_bool(*value);
        Ok(())
    }

    fn read(&self, reader: &mut Reader<'_>, _: &mut SerializationContext) -> Result<bool, SerdeError> {
        Ok(reader.read_bool()?)
    }
}

/// Writes integers in their most compact form and reads any width that
/// fits.
pub(crate) struct IntConverter;

macro_rules! impl_int_converter {
    ($($ty:ty => $wide:ty, $write:ident;)*) => {$(
        impl Converter<$ty> for IntConverter {
            #[inline]
            fn write(&self, writer: &mut Writer<'_>, value: &$ty, _: &mut SerializationContext) -> Result<(), SerdeError> {
                writer.$write(*value as $wide);
                Ok(())
            }

            #[inline]
            fn read(&self, reader: &mut Reader<'_>, _: &mut SerializationContext) -> Result<$ty, SerdeError> {
                Ok(reader.read_int::<$ty>()?)
            }
        }
    )*};
}

impl_int_converter! {
    u8 => u64, write_u64;
    u16 => u64, write_u64;
    u32 => u64, write_u64;
    u64 => u64, write_u64;
    usize => u64, write_u64;
    i8 => i64, write_i64;
    i16 => i64, write_i64;
    i32 => i64, write_i64;
    i64 => i64, write_i64;
    isize => i64, write_i64;
}

pub(crate) struct FloatConverter;

impl Converter<f32> for FloatConverter {
    fn write(&self, writer: &mut Writer<'_>, value: &f32, _: &mut SerializationContext) -> Result<(), SerdeError> {
        writer.write_f32(*value);
        Ok(())
    }

    fn read(&self, reader: &mut Reader<'_>, _: &mut SerializationContext) -> Result<f32, SerdeError> {
        Ok(reader.read_f32()?)
    }
}

impl Converter<f64> for FloatConverter {
    fn write(&self, writer: &mut Writer<'_>, value: &f64, _: &mut SerializationContext) -> Result<(), SerdeError> {
        writer.write_f64(*value);
        Ok(())
    }

    fn read(&self, reader: &mut Reader<'_>, _: &mut SerializationContext) -> Result<f64, SerdeError> {
        Ok(reader.read_f64()?)
    }
}

/// Writes a `char` as its scalar value.
pub(crate) struct CharConverter;

impl Converter<char> for CharConverter {
    fn write(&self, writer: &mut Writer<'_>, value: &char, _: &mut SerializationContext) -> Result<(), SerdeError> {
        writer.write_u64(u64::from(u32::from(*value)));
        Ok(())
    }

    fn read(&self, reader: &mut Reader<'_>, _: &mut SerializationContext) -> Result<char, SerdeError> {
        let start = *reader;
        let scalar = reader.read_int::<u32>()?;
        char::from_u32(scalar)
            .ok_or_else(|| SerdeError::invalid(&start, alloc::format!("{scalar:#x} is not a unicode scalar value")))
    }
}

pub(crate) struct StringConverter;

impl Converter<String> for StringConverter {
    fn write(&self, writer: &mut Writer<'_>, value: &String, _: &mut SerializationContext) -> Result<(), SerdeError> {
        Ok(writer.write_str(value)?)
    }

    fn read(&self, reader: &mut Reader<'_>, _: &mut SerializationContext) -> Result<String, SerdeError> {
        Ok(reader.read_string()?)
    }
}

pub(crate) struct TimestampConverter;

impl Converter<Timestamp> for TimestampConverter {
    fn write(&self, writer: &mut Writer<'_>, value: &Timestamp, _: &mut SerializationContext) -> Result<(), SerdeError> {
        writer.write_timestamp(*value);
        Ok(())
    }

    fn read(&self, reader: &mut Reader<'_>, _: &mut SerializationContext) -> Result<Timestamp, SerdeError> {
        Ok(reader.read_timestamp()?)
    }
}

pub(crate) struct SystemTimeConverter;

impl Converter<SystemTime> for SystemTimeConverter {
    fn write(&self, writer: &mut Writer<'_>, value: &SystemTime, _: &mut SerializationContext) -> Result<(), SerdeError> {
        writer.write_timestamp(Timestamp::from(*value));
        Ok(())
    }

    fn read(&self, reader: &mut Reader<'_>, _: &mut SerializationContext) -> Result<SystemTime, SerdeError> {
        let start = *reader;
        reader
            .read_timestamp()?
            .to_system_time()
            .ok_or_else(|| SerdeError::invalid(&start, "timestamp is out of range for `SystemTime`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn encode<T>(conv: &impl Converter<T>, value: T) -> Vec<u8> {
        let mut out = Vec::new();
        conv.write(&mut Writer::new(&mut out), &value, &mut SerializationContext::default())
            .unwrap();
        out
    }

    fn decode<T>(conv: &impl Converter<T>, bytes: &[u8]) -> Result<T, SerdeError> {
        let mut reader = Reader::new(bytes);
        let value = conv.read(&mut reader, &mut SerializationContext::default())?;
        assert!(reader.is_empty());
        Ok(value)
    }

    #[test]
    fn integer_boundaries() {
        assert_eq!(encode::<u8>(&IntConverter, 127), [0x7f]);
        assert_eq!(encode::<u8>(&IntConverter, 128), [0xcc, 0x80]);
        assert_eq!(encode::<u16>(&IntConverter, 256), [0xcd, 0x01, 0x00]);
        assert_eq!(encode::<i32>(&IntConverter, -32), [0xe0]);
        assert_eq!(encode::<i32>(&IntConverter, -33), [0xd0, 0xdf]);
        assert_eq!(encode::<u64>(&IntConverter, 1 << 32).len(), 9);
        assert_eq!(decode::<i64>(&IntConverter, &[0xcc, 0xff]).unwrap(), 255);
        assert!(decode::<u8>(&IntConverter, &[0xcd, 0x01, 0x00]).is_err());
        assert!(decode::<u32>(&IntConverter, &[0xff]).is_err());
    }

    #[test]
    fn chars_are_scalar_values() {
        assert_eq!(encode(&CharConverter, 'a'), [0x61]);
        assert_eq!(decode(&CharConverter, &[0xcd, 0x00, 0xe9]).unwrap(), 'é');
        let err = decode(&CharConverter, &[0xcd, 0xd8, 0x00]).unwrap_err();
        assert!(matches!(err, SerdeError::InvalidData { offset: 0, .. }));
    }

    #[test]
    fn floats_accept_narrower_encodings() {
        assert_eq!(encode(&FloatConverter, 1.5f32), [0xca, 0x3f, 0xc0, 0x00, 0x00]);
        assert_eq!(decode::<f64>(&FloatConverter, &[0xca, 0x3f, 0xc0, 0x00, 0x00]).unwrap(), 1.5);
        assert_eq!(decode::<f64>(&FloatConverter, &[0x03]).unwrap(), 3.0);
    }

    #[test]
    fn system_time_round_trip() {
        let time = SystemTime::UNIX_EPOCH + core::time::Duration::new(1_700_000_000, 5);
        let bytes = encode(&SystemTimeConverter, time);
        assert_eq!(decode(&SystemTimeConverter, &bytes).unwrap(), time);
    }
}
