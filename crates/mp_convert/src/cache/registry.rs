use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use super::ErasedConverter;
use crate::converter::DynAdapter;
use crate::shape::{Attributes, ShapeKindTag, TypeIdent};
use crate::{Converter, DynConverter};

// -----------------------------------------------------------------------------
// ConverterFactory

/// What a [`ConverterFactory`] is told about the type it is asked for.
#[derive(Debug, Clone, Copy)]
pub struct FactoryRequest<'a> {
    ident: TypeIdent,
    kind: ShapeKindTag,
    attributes: &'a Attributes,
}

impl<'a> FactoryRequest<'a> {
    pub(crate) fn new(ident: TypeIdent, kind: ShapeKindTag, attributes: &'a Attributes) -> Self {
        Self {
            ident,
            kind,
            attributes,
        }
    }

    #[inline]
    pub fn ident(&self) -> TypeIdent {
        self.ident
    }

    #[inline]
    pub fn kind(&self) -> ShapeKindTag {
        self.kind
    }

    #[inline]
    pub fn attributes(&self) -> &'a Attributes {
        self.attributes
    }
}

/// The converter produced by a [`ConverterFactory`].
pub struct FactoryConverter(Produced);

enum Produced {
    Typed(ErasedConverter),
    Dynamic(Arc<dyn DynConverter>),
}

impl FactoryConverter {
    /// A converter for exactly the requested type `T`.
    ///
    /// If `T` is not the requested type the result is ignored.
    pub fn typed<T: 'static>(converter: impl Converter<T>) -> Self {
        let converter: Arc<dyn Converter<T>> = Arc::new(converter);
        Self(Produced::Typed(Box::new(converter)))
    }

    /// A converter over type-erased values.
    pub fn dynamic(converter: impl DynConverter) -> Self {
        Self(Produced::Dynamic(Arc::new(converter)))
    }

    fn into_converter<T: Any + Send>(self) -> Option<Arc<dyn Converter<T>>> {
        match self.0 {
            Produced::Typed(erased) => erased.downcast::<Arc<dyn Converter<T>>>().ok().map(|c| *c),
            Produced::Dynamic(inner) => Some(Arc::new(DynAdapter::<T>::new(inner))),
        }
    }
}

/// Produces converters for a family of types.
///
/// Factories are consulted when a type is first synthesized, in
/// registration order. Returning `None` passes the type on.
///
/// # Examples
///
/// ```
/// use mp_codec::{Reader, Writer};
/// use mp_convert::shape::{Shaped, TypeShape};
/// use mp_convert::*;
///
/// struct Hidden;
///
/// struct Secret(u64);
///
/// impl Shaped for Secret {
///     fn shape() -> TypeShape<Self> {
///         TypeShape::opaque().with_attribute(Hidden)
///     }
/// }
///
/// struct RedactSecret;
///
/// impl Converter<Secret> for RedactSecret {
///     fn write(&self, w: &mut Writer<'_>, _: &Secret, _: &mut SerializationContext) -> Result<(), SerdeError> {
///         w.write_nil();
///         Ok(())
///     }
///
///     fn read(&self, r: &mut Reader<'_>, _: &mut SerializationContext) -> Result<Secret, SerdeError> {
///         r.read_nil()?;
///         Ok(Secret(0))
///     }
/// }
///
/// struct Redactor;
///
/// impl ConverterFactory for Redactor {
///     fn create(&self, request: &FactoryRequest<'_>) -> Option<FactoryConverter> {
///         request
///             .attributes()
///             .contains::<Hidden>()
///             .then(|| FactoryConverter::typed::<Secret>(RedactSecret))
///     }
/// }
///
/// let serializer = Serializer::builder().factory(Redactor).build();
/// assert_eq!(serializer.serialize(&Secret(42)).unwrap(), [0xc0]);
/// ```
pub trait ConverterFactory: Send + Sync + 'static {
    fn create(&self, request: &FactoryRequest<'_>) -> Option<FactoryConverter>;
}

// -----------------------------------------------------------------------------
// ConverterRegistry

enum Rule {
    Type {
        ident: TypeIdent,
        converter: ErasedConverter,
    },
    Factory(Box<dyn ConverterFactory>),
}

/// Ordered converter registrations of one cache.
///
/// Rules are tried in registration order and the first match wins. They
/// take precedence over converters declared by shapes and over built-in
/// converters.
#[derive(Default)]
pub struct ConverterRegistry {
    rules: Vec<Rule>,
}

impl ConverterRegistry {
    pub const fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Uses `converter` for every value of type `T`.
    pub fn register<T: 'static>(&mut self, converter: impl Converter<T>) -> &mut Self {
        let converter: Arc<dyn Converter<T>> = Arc::new(converter);
        self.rules.push(Rule::Type {
            ident: TypeIdent::of::<T>(),
            converter: Box::new(converter),
        });
        self
    }

    pub fn register_factory(&mut self, factory: impl ConverterFactory) -> &mut Self {
        self.rules.push(Rule::Factory(Box::new(factory)));
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The converter of the first rule that matches the request.
    pub(crate) fn resolve<T: Any + Send>(
        &self,
        request: &FactoryRequest<'_>,
    ) -> Option<Arc<dyn Converter<T>>> {
        self.rules.iter().find_map(|rule| match rule {
            Rule::Type { ident, converter } if *ident == request.ident() => converter
                .downcast_ref::<Arc<dyn Converter<T>>>()
                .cloned(),
            Rule::Type { .. } => None,
            Rule::Factory(factory) => factory.create(request)?.into_converter::<T>(),
        })
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for rule in &self.rules {
            match rule {
                Rule::Type { ident, .. } => list.entry(ident),
                Rule::Factory(_) => list.entry(&"<factory>"),
            };
        }
        list.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp_codec::{Reader, Writer};

    use crate::{SerdeError, SerializationContext};

    struct Fixed(u8);

    impl Converter<u8> for Fixed {
        fn write(&self, w: &mut Writer<'_>, _: &u8, _: &mut SerializationContext) -> Result<(), SerdeError> {
            w.write_u64(u64::from(self.0));
            Ok(())
        }

        fn read(&self, r: &mut Reader<'_>, _: &mut SerializationContext) -> Result<u8, SerdeError> {
            Ok(r.read_int()?)
        }
    }

    struct Never;

    impl ConverterFactory for Never {
        fn create(&self, _: &FactoryRequest<'_>) -> Option<FactoryConverter> {
            None
        }
    }

    fn write_with(conv: &Arc<dyn Converter<u8>>) -> Vec<u8> {
        let mut out = Vec::new();
        conv.write(&mut Writer::new(&mut out), &0, &mut SerializationContext::default())
            .unwrap();
        out
    }

    #[test]
    fn first_matching_rule_wins() {
        let mut registry = ConverterRegistry::new();
        registry.register_factory(Never).register(Fixed(1)).register(Fixed(2));
        assert_eq!(registry.len(), 3);

        let attrs = Attributes::new();
        let request = FactoryRequest::new(TypeIdent::of::<u8>(), ShapeKindTag::Opaque, &attrs);
        let conv = registry.resolve::<u8>(&request).unwrap();
        assert_eq!(write_with(&conv), [0x01]);

        let request = FactoryRequest::new(TypeIdent::of::<u16>(), ShapeKindTag::Opaque, &attrs);
        assert!(registry.resolve::<u16>(&request).is_none());
    }

    #[test]
    fn mistyped_factory_output_is_ignored() {
        struct Wrong;

        impl ConverterFactory for Wrong {
            fn create(&self, _: &FactoryRequest<'_>) -> Option<FactoryConverter> {
                Some(FactoryConverter::typed::<u8>(Fixed(9)))
            }
        }

        let mut registry = ConverterRegistry::new();
        registry.register_factory(Wrong);
        let attrs = Attributes::new();
        let request = FactoryRequest::new(TypeIdent::of::<u32>(), ShapeKindTag::Opaque, &attrs);
        assert!(registry.resolve::<u32>(&request).is_none());
    }
}
