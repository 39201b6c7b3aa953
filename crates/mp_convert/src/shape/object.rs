use alloc::boxed::Box;
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, type_name};

use super::{Attributes, Shaped, TypeIdent};
use crate::cache::SynthesisVisitor;
use crate::converters::{ParameterConverter, PropertyContext, PropertyConverter};
use crate::{Converter, SerdeError};

/// Returns `true` when a value equals a statically known default.
pub(crate) type DefaultPredicate<F> = Arc<dyn Fn(&F) -> bool + Send + Sync>;

// -----------------------------------------------------------------------------
// ObjectShape

/// A type made of named members.
///
/// Members are written as a map keyed by name, or as a positional array if
/// every member declares a [`key`](PropertyShape::with_key).
pub struct ObjectShape<T: 'static> {
    pub(crate) properties: Vec<Box<dyn ErasedProperty<T>>>,
    pub(crate) constructor: ConstructorShape<T>,
}

impl<T: Send + Sync + 'static> ObjectShape<T> {
    pub fn new(constructor: ConstructorShape<T>) -> Self {
        Self {
            properties: Vec::new(),
            constructor,
        }
    }

    /// An object built with `T::default()` and populated through setters.
    pub fn default_constructed() -> Self
    where
        T: Default,
    {
        Self::new(ConstructorShape::Default(T::default))
    }

    /// An object that can be written but not read.
    pub fn write_only() -> Self {
        Self::new(ConstructorShape::None)
    }

    pub fn property<F: Shaped>(mut self, property: PropertyShape<T, F>) -> Self {
        self.properties.push(Box::new(property));
        self
    }

    /// Declared member names, in declaration order.
    pub fn property_names(&self) -> impl ExactSizeIterator<Item = &'static str> + '_ {
        self.properties.iter().map(|p| p.name())
    }

    #[inline]
    pub fn constructor(&self) -> &ConstructorShape<T> {
        &self.constructor
    }
}

// -----------------------------------------------------------------------------
// PropertyShape

/// A member of an object: its name, accessors and serialization policy.
pub struct PropertyShape<T: 'static, F: 'static> {
    pub(crate) name: &'static str,
    pub(crate) key: Option<u32>,
    pub(crate) getter: fn(&T) -> &F,
    pub(crate) setter: Option<fn(&mut T, F)>,
    pub(crate) default: Option<DefaultPredicate<F>>,
    pub(crate) required: bool,
    pub(crate) converter: Option<Arc<dyn Converter<F>>>,
    pub(crate) attributes: Attributes,
}

impl<T: 'static, F: 'static> PropertyShape<T, F> {
    /// A read-only member. Add a setter to make it deserializable.
    pub fn new(name: &'static str, getter: fn(&T) -> &F) -> Self {
        Self {
            name,
            key: None,
            getter,
            setter: None,
            default: None,
            required: false,
            converter: None,
            attributes: Attributes::new(),
        }
    }

    pub fn with_setter(mut self, setter: fn(&mut T, F)) -> Self {
        self.setter = Some(setter);
        self
    }

    /// Assigns a fixed slot in the positional array form.
    pub fn with_key(mut self, key: u32) -> Self {
        self.key = Some(key);
        self
    }

    /// Declares the default of this member. Matching values are elided.
    pub fn with_default(mut self, value: F) -> Self
    where
        F: PartialEq + Send + Sync,
    {
        self.default = Some(Arc::new(move |v: &F| *v == value));
        self
    }

    /// Declares `F::default()` as the default of this member.
    pub fn with_zero_default(self) -> Self
    where
        F: Default + PartialEq + Send + Sync,
    {
        self.with_default(F::default())
    }

    /// Marks the member as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Uses `converter` for this member instead of the type's converter.
    pub fn with_converter(mut self, converter: impl Converter<F>) -> Self {
        self.converter = Some(Arc::new(converter));
        self
    }

    pub fn with_attribute<A: Any + Send + Sync>(mut self, value: A) -> Self {
        self.attributes.insert(value);
        self
    }
}

/// Type-erased view of a [`PropertyShape`].
pub(crate) trait ErasedProperty<T>: Send + Sync {
    fn name(&self) -> &'static str;
    fn key(&self) -> Option<u32>;
    fn value_type(&self) -> TypeIdent;
    /// The declared converter as a boxed `Arc<dyn Converter<F>>`.
    fn converter_override(&self) -> Option<Box<dyn Any + Send + Sync>>;
    fn build(
        &self,
        visitor: &mut SynthesisVisitor<'_>,
        context: PropertyContext<'_>,
    ) -> Result<Box<dyn PropertyConverter<T>>, SerdeError>;
}

// -----------------------------------------------------------------------------
// ConstructorShape

/// How an object is created on read.
pub enum ConstructorShape<T: 'static> {
    /// The object cannot be read.
    None,
    /// Create a default value and assign members through setters.
    Default(fn() -> T),
    /// Collect parameters first, then build the value.
    Parameterized(ParameterizedConstructor<T>),
}

/// A constructor that takes arguments read from the wire.
///
/// # Examples
///
/// ```
/// use mp_convert::Serializer;
/// use mp_convert::shape::*;
///
/// #[derive(Debug, PartialEq)]
/// struct Span {
///     start: u32,
///     len: u32,
/// }
///
/// impl Shaped for Span {
///     fn shape() -> TypeShape<Self> {
///         let ctor = ParameterizedConstructor::new(|args| {
///             Ok(Span { start: args.take(0)?, len: args.take(1)? })
///         })
///         .parameter(ParameterShape::<u32>::new("start"))
///         .parameter(ParameterShape::<u32>::new("len").with_default(1));
///
///         TypeShape::object(
///             ObjectShape::new(ConstructorShape::Parameterized(ctor))
///                 .property(PropertyShape::new("start", |s: &Span| &s.start))
///                 .property(PropertyShape::new("len", |s: &Span| &s.len)),
///         )
///     }
/// }
///
/// let serializer = Serializer::new();
/// let bytes = serializer.serialize(&Span { start: 4, len: 1 }).unwrap();
/// // `len` equals its declared default and is elided
/// assert_eq!(bytes, [0x81, 0xa5, b's', b't', b'a', b'r', b't', 0x04]);
/// assert_eq!(serializer.deserialize::<Span>(&bytes).unwrap(), Span { start: 4, len: 1 });
/// ```
pub struct ParameterizedConstructor<T: 'static> {
    pub(crate) parameters: Vec<Box<dyn ErasedParameter>>,
    pub(crate) build: fn(&mut Arguments) -> Result<T, SerdeError>,
}

impl<T: 'static> ParameterizedConstructor<T> {
    pub fn new(build: fn(&mut Arguments) -> Result<T, SerdeError>) -> Self {
        Self {
            parameters: Vec::new(),
            build,
        }
    }

    /// Appends a parameter. Arguments are indexed in declaration order.
    pub fn parameter<F: Shaped>(mut self, parameter: ParameterShape<F>) -> Self {
        self.parameters.push(Box::new(parameter));
        self
    }

    pub fn parameter_names(&self) -> impl ExactSizeIterator<Item = &'static str> + '_ {
        self.parameters.iter().map(|p| p.name())
    }
}

// -----------------------------------------------------------------------------
// ParameterShape

/// A constructor parameter.
///
/// A parameter without a default is required: reading fails if the wire
/// value has no matching member.
pub struct ParameterShape<F: 'static> {
    pub(crate) name: &'static str,
    pub(crate) default: Option<ParameterDefault<F>>,
}

pub(crate) struct ParameterDefault<F> {
    pub(crate) make: Arc<dyn Fn() -> F + Send + Sync>,
    pub(crate) is_default: DefaultPredicate<F>,
}

impl<F: 'static> ParameterShape<F> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            default: None,
        }
    }

    /// Value used when the member is absent. Members equal to it are elided.
    pub fn with_default(mut self, value: F) -> Self
    where
        F: Clone + PartialEq + Send + Sync,
    {
        let probe = value.clone();
        self.default = Some(ParameterDefault {
            make: Arc::new(move || value.clone()),
            is_default: Arc::new(move |v: &F| *v == probe),
        });
        self
    }

    pub fn with_zero_default(self) -> Self
    where
        F: Default + Clone + PartialEq + Send + Sync,
    {
        self.with_default(F::default())
    }
}

/// Type-erased view of a [`ParameterShape`].
pub(crate) trait ErasedParameter: Send + Sync {
    fn name(&self) -> &'static str;
    fn value_type(&self) -> TypeIdent;
    fn is_required(&self) -> bool;
    /// The default predicate as a boxed [`DefaultPredicate`].
    fn default_predicate(&self) -> Option<Box<dyn Any + Send + Sync>>;
    /// Compiles the parameter. `converter` is the declared converter of the
    /// linked member, used instead of the type's converter when it matches.
    fn build(
        &self,
        visitor: &mut SynthesisVisitor<'_>,
        converter: Option<&(dyn Any + Send + Sync)>,
    ) -> Result<Box<dyn ParameterConverter>, SerdeError>;
}

// -----------------------------------------------------------------------------
// Arguments

/// Constructor arguments read from the wire, indexed by parameter order.
pub struct Arguments {
    slots: Vec<Option<Box<dyn Any + Send>>>,
}

impl Arguments {
    pub(crate) fn new(slots: Vec<Option<Box<dyn Any + Send>>>) -> Self {
        Self { slots }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Moves out the argument at `index`.
    ///
    /// Each argument can be taken once.
    pub fn take<F: Any>(&mut self, index: usize) -> Result<F, SerdeError> {
        let slot = self
            .slots
            .get_mut(index)
            .and_then(Option::take)
            .ok_or_else(|| SerdeError::misuse(format!("argument {index} is missing or was already taken")))?;
        slot.downcast::<F>().map(|value| *value).map_err(|_| {
            SerdeError::misuse(format!("argument {index} is not a `{}`", type_name::<F>()))
        })
    }
}
