use alloc::sync::Arc;

use mp_codec::{Reader, Writer};

use crate::cache::SynthesisVisitor;
use crate::references::{PointerConverter, ReferenceConverter};
use crate::shape::{
    ErasedNullable, ErasedShared, ErasedSurrogate, Marshal, NullableParts, SharedParts,
    SharedPointer, Shaped, SurrogateParts, TypeIdent, Unmarshal,
};
use crate::{Converter, SerdeError, SerializationContext};

// -----------------------------------------------------------------------------
// Nullable

struct NullableConverter<T, E: 'static> {
    parts: NullableParts<T, E>,
    element: Arc<dyn Converter<E>>,
}

impl<T: Send + Sync + 'static, E: Send + Sync + 'static> Converter<T> for NullableConverter<T, E> {
    fn write(&self, writer: &mut Writer<'_>, value: &T, ctx: &mut SerializationContext) -> Result<(), SerdeError> {
        match (self.parts.get)(value) {
            Some(element) => self.element.write(writer, element, ctx),
            None => {
                writer.write_nil();
                Ok(())
            }
        }
    }

    fn read(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<T, SerdeError> {
        if reader.try_read_nil()? {
            Ok((self.parts.none)())
        } else {
            Ok((self.parts.some)(self.element.read(reader, ctx)?))
        }
    }
}

impl<T: Send + Sync + 'static, E: Shaped> ErasedNullable<T> for NullableParts<T, E> {
    fn element(&self) -> TypeIdent {
        TypeIdent::of::<E>()
    }

    fn build(&self, visitor: &mut SynthesisVisitor<'_>) -> Result<Arc<dyn Converter<T>>, SerdeError> {
        Ok(Arc::new(NullableConverter {
            parts: *self,
            element: visitor.resolve::<E>()?,
        }))
    }
}

// -----------------------------------------------------------------------------
// Surrogate

struct SurrogateConverter<T, S: 'static> {
    parts: SurrogateParts<T, S>,
    surrogate: Arc<dyn Converter<S>>,
}

impl<T: Send + Sync + 'static, S: Send + Sync + 'static> Converter<T> for SurrogateConverter<T, S> {
    fn write(&self, writer: &mut Writer<'_>, value: &T, ctx: &mut SerializationContext) -> Result<(), SerdeError> {
        match self.parts.marshal {
            Marshal::Owned(to) => self.surrogate.write(writer, &to(value), ctx),
            Marshal::Borrowed(project) => self.surrogate.write(writer, project(value), ctx),
        }
    }

    fn read(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<T, SerdeError> {
        let surrogate = self.surrogate.read(reader, ctx)?;
        match self.parts.unmarshal {
            Unmarshal::Fallible(from) => from(surrogate),
            Unmarshal::Infallible(from) => Ok(from(surrogate)),
        }
    }
}

impl<T: Send + Sync + 'static, S: Shaped> ErasedSurrogate<T> for SurrogateParts<T, S> {
    fn surrogate(&self) -> TypeIdent {
        TypeIdent::of::<S>()
    }

    fn build(&self, visitor: &mut SynthesisVisitor<'_>) -> Result<Arc<dyn Converter<T>>, SerdeError> {
        Ok(Arc::new(SurrogateConverter {
            parts: *self,
            surrogate: visitor.resolve::<S>()?,
        }))
    }
}

// -----------------------------------------------------------------------------
// Shared

impl<P: SharedPointer> ErasedShared<P> for SharedParts<P> {
    fn target(&self) -> TypeIdent {
        TypeIdent::of::<P::Target>()
    }

    fn build(&self, visitor: &mut SynthesisVisitor<'_>) -> Result<Arc<dyn Converter<P>>, SerdeError> {
        let target = visitor.resolve::<P::Target>()?;
        if visitor.options().preserve_references {
            Ok(Arc::new(ReferenceConverter::<P>::new(target)))
        } else {
            Ok(Arc::new(PointerConverter::<P>::new(target)))
        }
    }
}
