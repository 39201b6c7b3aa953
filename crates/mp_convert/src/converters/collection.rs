use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::type_name;

use mp_codec::{Reader, Writer};

use super::primitive_vec::specialize;
use crate::cache::SynthesisVisitor;
use crate::shape::{
    ConstructionKind, DictionaryConstruction, DictionaryParts, EnumerableConstruction,
    EnumerableParts, ErasedDictionary, ErasedEnumerable, Shaped, TypeIdent,
};
use crate::{Converter, SerdeError, SerializationContext};

/// Initial capacity for `len` elements, bounded by the bytes left to read.
///
/// Every element takes at least one byte, so a forged length cannot make
/// the reader allocate more than the input justifies.
#[inline]
pub(crate) fn bounded_capacity(reader: &Reader<'_>, len: u32) -> usize {
    (len as usize).min(reader.remaining().len())
}

fn cannot_construct<T>() -> SerdeError {
    SerdeError::shape::<T>("has no construction strategy and can only be written")
}

fn length_mismatch<T>(declared: usize, visited: usize) -> SerdeError {
    SerdeError::misuse(alloc::format!(
        "`{}` reported {declared} elements but visited {visited}",
        type_name::<T>()
    ))
}

// -----------------------------------------------------------------------------
// Enumerable

struct EnumerableConverter<T, E: 'static> {
    parts: EnumerableParts<T, E>,
    element: Arc<dyn Converter<E>>,
}

impl<T: Send + Sync + 'static, E: Send + Sync + 'static> Converter<T> for EnumerableConverter<T, E> {
    fn write(&self, writer: &mut Writer<'_>, value: &T, ctx: &mut SerializationContext) -> Result<(), SerdeError> {
        ctx.nested(|ctx| {
            let len = (self.parts.len)(value);
            writer.write_array_header(len)?;
            let mut visited = 0;
            (self.parts.for_each)(value, &mut |element| {
                visited += 1;
                self.element.write(writer, element, ctx)
            })?;
            if visited != len {
                return Err(length_mismatch::<T>(len, visited));
            }
            Ok(())
        })
    }

    fn read(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<T, SerdeError> {
        ctx.nested(|ctx| match self.parts.construction {
            EnumerableConstruction::None => Err(cannot_construct::<T>()),
            EnumerableConstruction::Mutable { with_capacity, add } => {
                let len = reader.read_array_header()?;
                let mut value = with_capacity(bounded_capacity(reader, len));
                for _ in 0..len {
                    add(&mut value, self.element.read(reader, ctx)?);
                }
                Ok(value)
            }
            EnumerableConstruction::Span(build) => {
                let len = reader.read_array_header()?;
                let mut elements = Vec::with_capacity(bounded_capacity(reader, len));
                for _ in 0..len {
                    elements.push(self.element.read(reader, ctx)?);
                }
                Ok(build(elements))
            }
            EnumerableConstruction::Sequence(build) => {
                let len = reader.read_array_header()? as usize;
                let mut failure = None;
                let mut taken = 0;
                let value = {
                    let mut elements = (0..len).map_while(|_| match self.element.read(reader, ctx) {
                        Ok(element) => {
                            taken += 1;
                            Some(element)
                        }
                        Err(err) => {
                            failure = Some(err);
                            None
                        }
                    });
                    build(&mut elements)
                };
                if let Some(err) = failure {
                    return Err(err);
                }
                if taken != len {
                    return Err(SerdeError::misuse(alloc::format!(
                        "`{}` stopped after {taken} of {len} elements",
                        type_name::<T>()
                    )));
                }
                Ok(value)
            }
        })
    }
}

impl<T: Send + Sync + 'static, E: Shaped> ErasedEnumerable<T> for EnumerableParts<T, E> {
    fn element(&self) -> TypeIdent {
        TypeIdent::of::<E>()
    }

    fn construction(&self) -> ConstructionKind {
        self.construction.kind()
    }

    fn build(&self, visitor: &mut SynthesisVisitor<'_>) -> Result<Arc<dyn Converter<T>>, SerdeError> {
        if let Some(converter) = specialize::<T, E>(visitor) {
            return Ok(converter);
        }
        Ok(Arc::new(EnumerableConverter {
            parts: *self,
            element: visitor.resolve::<E>()?,
        }))
    }
}

// -----------------------------------------------------------------------------
// Dictionary

struct DictionaryConverter<T, K: 'static, V: 'static> {
    parts: DictionaryParts<T, K, V>,
    key: Arc<dyn Converter<K>>,
    value: Arc<dyn Converter<V>>,
}

impl<T, K, V> Converter<T> for DictionaryConverter<T, K, V>
where
    T: Send + Sync + 'static,
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn write(&self, writer: &mut Writer<'_>, value: &T, ctx: &mut SerializationContext) -> Result<(), SerdeError> {
        ctx.nested(|ctx| {
            let len = (self.parts.len)(value);
            writer.write_map_header(len)?;
            let mut visited = 0;
            (self.parts.for_each)(value, &mut |key, entry| {
                visited += 1;
                self.key.write(writer, key, ctx)?;
                self.value.write(writer, entry, ctx)
            })?;
            if visited != len {
                return Err(length_mismatch::<T>(len, visited));
            }
            Ok(())
        })
    }

    fn read(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<T, SerdeError> {
        ctx.nested(|ctx| match self.parts.construction {
            DictionaryConstruction::None => Err(cannot_construct::<T>()),
            DictionaryConstruction::Mutable {
                with_capacity,
                insert,
            } => {
                let len = reader.read_map_header()?;
                let mut map = with_capacity(bounded_capacity(reader, len));
                for _ in 0..len {
                    let at = *reader;
                    let key = self.key.read(reader, ctx)?;
                    let value = self.value.read(reader, ctx)?;
                    if !insert(&mut map, key, value) {
                        return Err(SerdeError::invalid(&at, "duplicate key"));
                    }
                }
                Ok(map)
            }
            DictionaryConstruction::Span(build) => {
                let len = reader.read_map_header()?;
                let mut entries = Vec::with_capacity(bounded_capacity(reader, len));
                for _ in 0..len {
                    let key = self.key.read(reader, ctx)?;
                    entries.push((key, self.value.read(reader, ctx)?));
                }
                Ok(build(entries))
            }
        })
    }
}

impl<T: Send + Sync + 'static, K: Shaped, V: Shaped> ErasedDictionary<T> for DictionaryParts<T, K, V> {
    fn key(&self) -> TypeIdent {
        TypeIdent::of::<K>()
    }

    fn value(&self) -> TypeIdent {
        TypeIdent::of::<V>()
    }

    fn construction(&self) -> ConstructionKind {
        self.construction.kind()
    }

    fn build(&self, visitor: &mut SynthesisVisitor<'_>) -> Result<Arc<dyn Converter<T>>, SerdeError> {
        Ok(Arc::new(DictionaryConverter {
            parts: *self,
            key: visitor.resolve::<K>()?,
            value: visitor.resolve::<V>()?,
        }))
    }
}
