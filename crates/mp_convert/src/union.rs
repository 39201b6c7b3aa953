//! Subtype unions.
//!
//! A base type with declared subtypes is written as `[alias, value]`. The
//! alias selects the concrete type on read; `nil` selects the base type.

use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{TypeId, type_name};

use mp_codec::{Reader, TokenType, Writer};
use mp_utils::TypeIdMap;
use mp_utils::hash::HashMap;

use crate::cache::SynthesisVisitor;
use crate::shape::{ErasedSubtype, Shaped, SubtypeAlias, SubtypeParts, SubtypeUnionShape, TypeIdent};
use crate::{Converter, SerdeError, SerializationContext};

// -----------------------------------------------------------------------------
// SubtypeConverter

/// Reads and writes one subtype of a base type `T`.
pub(crate) trait SubtypeConverter<T>: Send + Sync {
    fn write(&self, writer: &mut Writer<'_>, value: &T, ctx: &mut SerializationContext) -> Result<(), SerdeError>;

    fn read(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<T, SerdeError>;
}

struct SubtypeEntry<T: 'static, S: 'static> {
    upcast: fn(S) -> T,
    downcast: fn(&T) -> Option<&S>,
    converter: Arc<dyn Converter<S>>,
}

impl<T: Send + Sync + 'static, S: Send + Sync + 'static> SubtypeConverter<T> for SubtypeEntry<T, S> {
    fn write(&self, writer: &mut Writer<'_>, value: &T, ctx: &mut SerializationContext) -> Result<(), SerdeError> {
        let value = (self.downcast)(value).ok_or_else(|| {
            SerdeError::misuse(alloc::format!(
                "value of `{}` reported runtime type `{}` but does not hold one",
                type_name::<T>(),
                type_name::<S>()
            ))
        })?;
        self.converter.write(writer, value, ctx)
    }

    fn read(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<T, SerdeError> {
        Ok((self.upcast)(self.converter.read(reader, ctx)?))
    }
}

impl<T: Send + Sync + 'static, S: Shaped> ErasedSubtype<T> for SubtypeParts<T, S> {
    fn alias(&self) -> SubtypeAlias {
        self.alias
    }

    fn subtype(&self) -> TypeIdent {
        TypeIdent::of::<S>()
    }

    fn build(&self, visitor: &mut SynthesisVisitor<'_>) -> Result<Box<dyn SubtypeConverter<T>>, SerdeError> {
        Ok(Box::new(SubtypeEntry {
            upcast: self.upcast,
            downcast: self.downcast,
            converter: visitor.resolve::<S>()?,
        }))
    }
}

// -----------------------------------------------------------------------------
// UnionConverter

struct Member<T> {
    /// Pre-encoded alias token.
    alias: Box<[u8]>,
    converter: Box<dyn SubtypeConverter<T>>,
}

/// Dispatches on the runtime type on write and on the alias on read.
pub(crate) struct UnionConverter<T: 'static> {
    runtime_type: fn(&T) -> TypeId,
    base: Option<Arc<dyn Converter<T>>>,
    members: Vec<Member<T>>,
    by_type: TypeIdMap<usize>,
    by_int: HashMap<i64, usize>,
    by_str: HashMap<&'static str, usize>,
}

impl<T: Send + Sync + 'static> UnionConverter<T> {
    /// Validates the union and builds the converter of every subtype.
    ///
    /// `base` handles values whose runtime type is `T` itself.
    pub(crate) fn build(
        visitor: &mut SynthesisVisitor<'_>,
        union: SubtypeUnionShape<T>,
        base: Option<Arc<dyn Converter<T>>>,
    ) -> Result<Self, SerdeError> {
        let mut this = Self {
            runtime_type: union.runtime_type,
            base,
            members: Vec::with_capacity(union.len()),
            by_type: TypeIdMap::new(),
            by_int: HashMap::default(),
            by_str: HashMap::default(),
        };

        for (index, member) in union.members.iter().enumerate() {
            let subtype = member.subtype();
            if subtype.is::<T>() {
                return Err(SerdeError::shape::<T>("lists itself as a subtype"));
            }
            if this.by_type.insert(subtype.id(), index).is_some() {
                return Err(SerdeError::shape::<T>(alloc::format!("lists subtype `{subtype}` more than once")));
            }

            let alias = member.alias();
            let duplicate = match alias {
                SubtypeAlias::Int(value) => this.by_int.insert(value, index).is_some(),
                SubtypeAlias::Str(value) => this.by_str.insert(value, index).is_some(),
            };
            if duplicate {
                return Err(SerdeError::shape::<T>(alloc::format!("subtype alias {alias} is used more than once")));
            }

            let encoded = visitor.encode(|w| match alias {
                SubtypeAlias::Int(value) => {
                    w.write_i64(value);
                    Ok(())
                }
                SubtypeAlias::Str(value) => w.write_str(value),
            })?;
            this.members.push(Member {
                alias: encoded,
                converter: member.build(visitor)?,
            });
        }

        Ok(this)
    }

    fn unknown_alias(alias: impl ToString) -> SerdeError {
        SerdeError::UnknownAlias {
            base: type_name::<T>(),
            alias: alias.to_string(),
        }
    }

    fn read_alias(&self, reader: &mut Reader<'_>) -> Result<Option<usize>, SerdeError> {
        let start = *reader;
        match reader.peek_token_type()? {
            TokenType::Nil => {
                reader.read_nil()?;
                Ok(None)
            }
            TokenType::Integer => {
                let alias = reader.read_int::<i64>()?;
                self.by_int
                    .get(&alias)
                    .map(|&index| Some(index))
                    .ok_or_else(|| Self::unknown_alias(alias))
            }
            TokenType::String => {
                let alias = reader.read_str()?;
                self.by_str
                    .get(alias)
                    .map(|&index| Some(index))
                    .ok_or_else(|| Self::unknown_alias(alloc::format!("{alias:?}")))
            }
            _ => Err(SerdeError::invalid(&start, "subtype alias must be nil, an integer or a string")),
        }
    }
}

impl<T: Send + Sync + 'static> Converter<T> for UnionConverter<T> {
    fn write(&self, writer: &mut Writer<'_>, value: &T, ctx: &mut SerializationContext) -> Result<(), SerdeError> {
        let runtime = (self.runtime_type)(value);
        let member = if runtime == TypeId::of::<T>() {
            None
        } else {
            let index = self.by_type.get(&runtime).copied().ok_or_else(|| {
                SerdeError::shape::<T>("holds a value whose runtime type is not a declared subtype")
            })?;
            Some(&self.members[index])
        };

        ctx.nested(|ctx| {
            match member {
                Some(member) => {
                    writer.write_array_header(2)?;
                    writer.write_raw(&member.alias);
                    member.converter.write(writer, value, ctx)
                }
                None => {
                    let base = self.base.as_ref().ok_or_else(|| {
                        SerdeError::shape::<T>("cannot write values of the base type itself")
                    })?;
                    writer.write_array_header(2)?;
                    writer.write_nil();
                    base.write(writer, value, ctx)
                }
            }
        })
    }

    fn read(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<T, SerdeError> {
        ctx.nested(|ctx| {
            let start = *reader;
            if reader.read_array_header()? != 2 {
                return Err(SerdeError::invalid(&start, "expected an [alias, value] pair"));
            }
            match self.read_alias(reader)? {
                Some(index) => self.members[index].converter.read(reader, ctx),
                None => match &self.base {
                    Some(base) => base.read(reader, ctx),
                    None => Err(Self::unknown_alias("nil")),
                },
            }
        })
    }
}
