use alloc::boxed::Box;
use alloc::vec::Vec;

use mp_codec::{Reader, TokenType, Writer};
use mp_utils::hash::HashMap;

use crate::cache::SynthesisVisitor;
use crate::shape::EnumShape;
use crate::{Converter, EnumFormat, SerdeError, SerializationContext};

/// Writes an enum as its value or its member name.
///
/// Reading accepts both forms regardless of the configured format.
pub(crate) struct EnumConverter<T> {
    to_value: fn(&T) -> i64,
    from_value: fn(i64) -> Option<T>,
    format: EnumFormat,
    /// Pre-encoded member names by value.
    names: HashMap<i64, Box<[u8]>>,
    values: HashMap<&'static str, i64>,
}

impl<T: 'static> EnumConverter<T> {
    pub(crate) fn build(visitor: &SynthesisVisitor<'_>, shape: &EnumShape<T>) -> Result<Self, SerdeError> {
        let mut names = HashMap::default();
        let mut values = HashMap::default();
        for member in shape.members() {
            if values.insert(member.name, member.value).is_some() {
                return Err(SerdeError::shape::<T>(alloc::format!(
                    "member name `{}` is declared twice",
                    member.name
                )));
            }
            // Aliased values are written with the first declared name.
            if !names.contains_key(&member.value) {
                names.insert(member.value, visitor.encode_name(member.name)?);
            }
        }
        Ok(Self {
            to_value: shape.to_value,
            from_value: shape.from_value,
            format: visitor.options().enum_format,
            names,
            values,
        })
    }

    /// Declared member names.
    #[cfg(test)]
    fn member_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.values.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl<T: Send + Sync + 'static> Converter<T> for EnumConverter<T> {
    fn write(&self, writer: &mut Writer<'_>, value: &T, _: &mut SerializationContext) -> Result<(), SerdeError> {
        let value = (self.to_value)(value);
        match (self.format, self.names.get(&value)) {
            (EnumFormat::Name, Some(name)) => writer.write_raw(name),
            _ => writer.write_i64(value),
        }
        Ok(())
    }

    fn read(&self, reader: &mut Reader<'_>, _: &mut SerializationContext) -> Result<T, SerdeError> {
        let start = *reader;
        let value = match reader.peek_token_type()? {
            TokenType::String => {
                let name = reader.read_str()?;
                *self.values.get(name).ok_or_else(|| {
                    SerdeError::invalid(&start, alloc::format!("`{name}` is not a member name"))
                })?
            }
            _ => reader.read_int::<i64>()?,
        };
        (self.from_value)(value)
            .ok_or_else(|| SerdeError::invalid(&start, alloc::format!("{value} is not a member value")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::EnumMember;
    use crate::{ConverterCache, ConverterRegistry, SerializerOptions};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Mode {
        Read = 1,
        Write = 2,
    }

    fn shape() -> EnumShape<Mode> {
        EnumShape::new(
            [EnumMember::new("Read", 1), EnumMember::new("Write", 2), EnumMember::new("Output", 2)],
            |m: &Mode| *m as i64,
            |v| match v {
                1 => Some(Mode::Read),
                2 => Some(Mode::Write),
                _ => None,
            },
        )
    }

    fn converter(format: EnumFormat) -> EnumConverter<Mode> {
        let options = SerializerOptions {
            enum_format: format,
            ..Default::default()
        };
        let cache = ConverterCache::new(options, ConverterRegistry::new());
        let visitor = SynthesisVisitor::new(&cache);
        EnumConverter::build(&visitor, &shape()).unwrap()
    }

    #[test]
    fn aliases_write_first_name() {
        let conv = converter(EnumFormat::Name);
        assert_eq!(conv.member_names(), ["Output", "Read", "Write"]);
        let mut out = Vec::new();
        conv.write(&mut Writer::new(&mut out), &Mode::Write, &mut SerializationContext::default())
            .unwrap();
        assert_eq!(out, [0xa5, b'W', b'r', b'i', b't', b'e']);
    }

    #[test]
    fn reads_both_forms() {
        let conv = converter(EnumFormat::Numeric);
        let mut ctx = SerializationContext::default();
        assert_eq!(conv.read(&mut Reader::new(&[0x01]), &mut ctx).unwrap(), Mode::Read);
        let output = [0xa6, b'O', b'u', b't', b'p', b'u', b't'];
        assert_eq!(conv.read(&mut Reader::new(&output), &mut ctx).unwrap(), Mode::Write);
        assert!(conv.read(&mut Reader::new(&[0x07]), &mut ctx).is_err());
        assert!(conv.read(&mut Reader::new(&[0xa1, b'x']), &mut ctx).is_err());
    }
}
