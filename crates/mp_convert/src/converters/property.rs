use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::{Any, type_name};

use mp_codec::{Reader, Writer};

use crate::cache::SynthesisVisitor;
use crate::shape::{
    DefaultPredicate, ErasedParameter, ErasedProperty, ParameterShape, PropertyShape, Shaped,
    TypeIdent,
};
use crate::{Converter, SerdeError, SerializationContext, SerializeDefaultValues};

// -----------------------------------------------------------------------------
// Properties

/// What an object tells a property while building it.
#[derive(Clone, Copy, Default)]
pub(crate) struct PropertyContext<'a> {
    /// Linked to a constructor parameter.
    pub linked: bool,
    /// Boxed [`DefaultPredicate`] of the linked parameter.
    pub parameter_default: Option<&'a (dyn Any + Send + Sync)>,
    /// Linked to a required constructor parameter.
    pub required: bool,
}

/// A compiled object member.
pub(crate) trait PropertyConverter<T>: Send + Sync {
    /// Whether the member is written for this value, under the default
    /// policy fixed at synthesis time.
    fn should_write(&self, value: &T) -> bool;

    fn write(&self, writer: &mut Writer<'_>, value: &T, ctx: &mut SerializationContext) -> Result<(), SerdeError>;

    fn can_set(&self) -> bool;

    fn read_into(&self, reader: &mut Reader<'_>, target: &mut T, ctx: &mut SerializationContext) -> Result<(), SerdeError>;

    /// Reads the member before the object exists.
    fn read_boxed(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<Box<dyn Any + Send>, SerdeError>;

    /// Assigns a value produced by [`read_boxed`](Self::read_boxed).
    fn apply_boxed(&self, target: &mut T, value: Box<dyn Any + Send>) -> Result<(), SerdeError>;
}

struct PropertyAccessor<T: 'static, F: 'static> {
    name: &'static str,
    getter: fn(&T) -> &F,
    setter: Option<fn(&mut T, F)>,
    elide: Option<DefaultPredicate<F>>,
    converter: Arc<dyn Converter<F>>,
}

impl<T: 'static, F: 'static> PropertyAccessor<T, F> {
    fn setter(&self) -> Result<fn(&mut T, F), SerdeError> {
        self.setter.ok_or_else(|| {
            SerdeError::misuse(alloc::format!(
                "member `{}` of `{}` has no setter",
                self.name,
                type_name::<T>()
            ))
        })
    }
}

impl<T: Send + Sync + 'static, F: Send + Sync + 'static> PropertyConverter<T> for PropertyAccessor<T, F> {
    #[inline]
    fn should_write(&self, value: &T) -> bool {
        match &self.elide {
            Some(is_default) => !is_default((self.getter)(value)),
            None => true,
        }
    }

    #[inline]
    fn write(&self, writer: &mut Writer<'_>, value: &T, ctx: &mut SerializationContext) -> Result<(), SerdeError> {
        self.converter.write(writer, (self.getter)(value), ctx)
    }

    #[inline]
    fn can_set(&self) -> bool {
        self.setter.is_some()
    }

    fn read_into(&self, reader: &mut Reader<'_>, target: &mut T, ctx: &mut SerializationContext) -> Result<(), SerdeError> {
        let setter = self.setter()?;
        setter(target, self.converter.read(reader, ctx)?);
        Ok(())
    }

    fn read_boxed(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<Box<dyn Any + Send>, SerdeError> {
        Ok(Box::new(self.converter.read(reader, ctx)?))
    }

    fn apply_boxed(&self, target: &mut T, value: Box<dyn Any + Send>) -> Result<(), SerdeError> {
        let setter = self.setter()?;
        let value: Box<dyn Any> = value;
        match value.downcast::<F>() {
            Ok(value) => {
                setter(target, *value);
                Ok(())
            }
            Err(_) => Err(SerdeError::misuse(alloc::format!(
                "deferred value of member `{}` is not a `{}`",
                self.name,
                type_name::<F>()
            ))),
        }
    }
}

impl<T: Send + Sync + 'static, F: Shaped> ErasedProperty<T> for PropertyShape<T, F> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn key(&self) -> Option<u32> {
        self.key
    }

    fn value_type(&self) -> TypeIdent {
        TypeIdent::of::<F>()
    }

    fn converter_override(&self) -> Option<Box<dyn Any + Send + Sync>> {
        self.converter
            .as_ref()
            .map(|converter| Box::new(Arc::clone(converter)) as Box<dyn Any + Send + Sync>)
    }

    fn build(
        &self,
        visitor: &mut SynthesisVisitor<'_>,
        context: PropertyContext<'_>,
    ) -> Result<Box<dyn PropertyConverter<T>>, SerdeError> {
        let converter = match &self.converter {
            Some(converter) => Arc::clone(converter),
            None => visitor.resolve::<F>()?,
        };

        let policy = visitor.options().default_values;
        let is_reference = visitor.is_reference_type::<F>();
        // A required parameter has nothing to fall back on when its member is absent.
        let forced = context.required
            || (self.required && policy.contains(SerializeDefaultValues::REQUIRED))
            || (is_reference && policy.contains(SerializeDefaultValues::REFERENCE_TYPES))
            || (!is_reference && policy.contains(SerializeDefaultValues::VALUE_TYPES));

        // A linked member is elided only when the parameter default restores it.
        let elide = if forced {
            None
        } else if context.linked {
            context
                .parameter_default
                .and_then(|erased| erased.downcast_ref::<DefaultPredicate<F>>())
                .cloned()
        } else {
            self.default.clone()
        };

        Ok(Box::new(PropertyAccessor {
            name: self.name,
            getter: self.getter,
            setter: self.setter,
            elide,
            converter,
        }))
    }
}

// -----------------------------------------------------------------------------
// Parameters

/// A compiled constructor parameter.
pub(crate) trait ParameterConverter: Send + Sync {
    fn read(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<Box<dyn Any + Send>, SerdeError>;

    /// The value used when the member is absent, if the parameter has one.
    fn default_value(&self) -> Option<Box<dyn Any + Send>>;
}

struct ParameterSlot<F: 'static> {
    converter: Arc<dyn Converter<F>>,
    default: Option<Arc<dyn Fn() -> F + Send + Sync>>,
}

impl<F: Send + Sync + 'static> ParameterConverter for ParameterSlot<F> {
    fn read(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<Box<dyn Any + Send>, SerdeError> {
        Ok(Box::new(self.converter.read(reader, ctx)?))
    }

    fn default_value(&self) -> Option<Box<dyn Any + Send>> {
        self.default
            .as_ref()
            .map(|make| Box::new(make()) as Box<dyn Any + Send>)
    }
}

impl<F: Shaped> ErasedParameter for ParameterShape<F> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn value_type(&self) -> TypeIdent {
        TypeIdent::of::<F>()
    }

    fn is_required(&self) -> bool {
        self.default.is_none()
    }

    fn default_predicate(&self) -> Option<Box<dyn Any + Send + Sync>> {
        self.default
            .as_ref()
            .map(|default| Box::new(Arc::clone(&default.is_default)) as Box<dyn Any + Send + Sync>)
    }

    fn build(
        &self,
        visitor: &mut SynthesisVisitor<'_>,
        converter: Option<&(dyn Any + Send + Sync)>,
    ) -> Result<Box<dyn ParameterConverter>, SerdeError> {
        let converter = match converter.and_then(|erased| erased.downcast_ref::<Arc<dyn Converter<F>>>()) {
            Some(converter) => Arc::clone(converter),
            None => visitor.resolve::<F>()?,
        };
        Ok(Box::new(ParameterSlot {
            converter,
            default: self.default.as_ref().map(|default| Arc::clone(&default.make)),
        }))
    }
}
