use alloc::boxed::Box;
use alloc::sync::Arc;
use core::marker::PhantomData;

use super::{Shaped, TypeIdent};
use crate::cache::SynthesisVisitor;
use crate::{Converter, SerdeError};

// -----------------------------------------------------------------------------
// NullableShape

pub(crate) struct NullableParts<T, E> {
    pub(crate) get: fn(&T) -> Option<&E>,
    pub(crate) some: fn(E) -> T,
    pub(crate) none: fn() -> T,
}

impl<T, E> Clone for NullableParts<T, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, E> Copy for NullableParts<T, E> {}

pub(crate) trait ErasedNullable<T>: Send + Sync {
    fn element(&self) -> TypeIdent;
    fn build(&self, visitor: &mut SynthesisVisitor<'_>) -> Result<Arc<dyn Converter<T>>, SerdeError>;
}

/// A value that may be absent, written as nil when it is.
pub struct NullableShape<T: 'static>(pub(crate) Box<dyn ErasedNullable<T>>);

impl<T: Send + Sync + 'static> NullableShape<T> {
    pub fn new<E: Shaped>(get: fn(&T) -> Option<&E>, some: fn(E) -> T, none: fn() -> T) -> Self {
        Self(Box::new(NullableParts { get, some, none }))
    }

    pub fn element(&self) -> TypeIdent {
        self.0.element()
    }
}

// -----------------------------------------------------------------------------
// SurrogateShape

/// How a value is turned into its surrogate.
pub(crate) enum Marshal<T, S> {
    Owned(fn(&T) -> S),
    Borrowed(fn(&T) -> &S),
}

impl<T, S> Clone for Marshal<T, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, S> Copy for Marshal<T, S> {}

/// How a surrogate is turned back into the value.
pub(crate) enum Unmarshal<T, S> {
    Fallible(fn(S) -> Result<T, SerdeError>),
    Infallible(fn(S) -> T),
}

impl<T, S> Clone for Unmarshal<T, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, S> Copy for Unmarshal<T, S> {}

pub(crate) struct SurrogateParts<T, S> {
    pub(crate) marshal: Marshal<T, S>,
    pub(crate) unmarshal: Unmarshal<T, S>,
}

impl<T, S> Clone for SurrogateParts<T, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, S> Copy for SurrogateParts<T, S> {}

pub(crate) trait ErasedSurrogate<T>: Send + Sync {
    fn surrogate(&self) -> TypeIdent;
    fn build(&self, visitor: &mut SynthesisVisitor<'_>) -> Result<Arc<dyn Converter<T>>, SerdeError>;
}

/// A type written through a stand-in type.
///
/// # Examples
///
/// ```
/// use mp_convert::shape::{Shaped, SurrogateShape, TypeShape};
///
/// /// Third-party type with private fields.
/// #[derive(Debug, PartialEq)]
/// struct Rgb(u8, u8, u8);
///
/// impl Shaped for Rgb {
///     fn shape() -> TypeShape<Self> {
///         TypeShape::surrogate(SurrogateShape::new(
///             |c: &Rgb| u32::from_be_bytes([0, c.0, c.1, c.2]),
///             |v: u32| {
///                 let [_, r, g, b] = v.to_be_bytes();
///                 Ok(Rgb(r, g, b))
///             },
///         ))
///     }
/// }
///
/// let serializer = mp_convert::Serializer::new();
/// let bytes = serializer.serialize(&Rgb(0, 0, 200)).unwrap();
/// assert_eq!(bytes, [0xcc, 200]);
/// assert_eq!(serializer.deserialize::<Rgb>(&bytes).unwrap(), Rgb(0, 0, 200));
/// ```
pub struct SurrogateShape<T: 'static>(pub(crate) Box<dyn ErasedSurrogate<T>>);

impl<T: Send + Sync + 'static> SurrogateShape<T> {
    /// Converts to an owned surrogate on write.
    pub fn new<S: Shaped>(to: fn(&T) -> S, from: fn(S) -> Result<T, SerdeError>) -> Self {
        Self(Box::new(SurrogateParts {
            marshal: Marshal::Owned(to),
            unmarshal: Unmarshal::Fallible(from),
        }))
    }

    /// Writes a borrowed projection of the value, for transparent wrappers.
    pub fn transparent<S: Shaped>(project: fn(&T) -> &S, from: fn(S) -> T) -> Self {
        Self(Box::new(SurrogateParts {
            marshal: Marshal::Borrowed(project),
            unmarshal: Unmarshal::Infallible(from),
        }))
    }

    pub fn surrogate(&self) -> TypeIdent {
        self.0.surrogate()
    }
}

// -----------------------------------------------------------------------------
// SharedShape

/// A pointer whose target may be shared by several owners.
///
/// With reference preservation enabled, a target reached twice in one
/// operation is written once and referenced by ordinal afterwards.
pub trait SharedPointer: Clone + Send + Sync + 'static {
    type Target: Shaped;

    /// Address identifying the shared target.
    fn identity(&self) -> usize;

    fn with_target<R>(&self, f: impl FnOnce(&Self::Target) -> R) -> R;

    fn from_target(target: Self::Target) -> Self;

    /// A pointer that can be referenced before its target is read.
    ///
    /// Types returning `None` reject back-references to values that are
    /// still being read.
    fn placeholder() -> Option<Self>;

    /// Stores the target of a pointer returned by
    /// [`placeholder`](Self::placeholder).
    fn fill(&self, target: Self::Target);
}

pub(crate) struct SharedParts<P>(PhantomData<fn() -> P>);

impl<P> SharedParts<P> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}

pub(crate) trait ErasedShared<T>: Send + Sync {
    fn target(&self) -> TypeIdent;
    fn build(&self, visitor: &mut SynthesisVisitor<'_>) -> Result<Arc<dyn Converter<T>>, SerdeError>;
}

/// A shared pointer type.
pub struct SharedShape<T: 'static>(pub(crate) Box<dyn ErasedShared<T>>);

impl<P: SharedPointer> SharedShape<P> {
    pub fn new() -> Self {
        Self(Box::new(SharedParts::<P>::new()))
    }
}

impl<T: 'static> SharedShape<T> {
    pub fn target(&self) -> TypeIdent {
        self.0.target()
    }
}
