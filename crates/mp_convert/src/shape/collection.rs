use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;

use super::{Shaped, TypeIdent};
use crate::cache::SynthesisVisitor;
use crate::{Converter, SerdeError};

/// Visits each element of a collection in order.
pub type ForEach<T, E> =
    fn(&T, &mut dyn FnMut(&E) -> Result<(), SerdeError>) -> Result<(), SerdeError>;

/// Visits each entry of a dictionary.
pub type ForEachEntry<T, K, V> =
    fn(&T, &mut dyn FnMut(&K, &V) -> Result<(), SerdeError>) -> Result<(), SerdeError>;

/// The construction strategy of a collection, without its functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructionKind {
    /// Write-only.
    None,
    /// Start empty and add elements one by one.
    Mutable,
    /// Build from a fully materialized buffer of elements.
    Span,
    /// Build from a lazily read sequence of elements.
    Sequence,
}

// -----------------------------------------------------------------------------
// EnumerableShape

/// How an enumerable type is built from its elements.
pub enum EnumerableConstruction<T, E> {
    None,
    Mutable {
        with_capacity: fn(usize) -> T,
        add: fn(&mut T, E),
    },
    Span(fn(Vec<E>) -> T),
    Sequence(fn(&mut dyn Iterator<Item = E>) -> T),
}

impl<T, E> Clone for EnumerableConstruction<T, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, E> Copy for EnumerableConstruction<T, E> {}

impl<T, E> EnumerableConstruction<T, E> {
    pub fn kind(&self) -> ConstructionKind {
        match self {
            Self::None => ConstructionKind::None,
            Self::Mutable { .. } => ConstructionKind::Mutable,
            Self::Span(_) => ConstructionKind::Span,
            Self::Sequence(_) => ConstructionKind::Sequence,
        }
    }
}

pub(crate) struct EnumerableParts<T, E> {
    pub(crate) len: fn(&T) -> usize,
    pub(crate) for_each: ForEach<T, E>,
    pub(crate) construction: EnumerableConstruction<T, E>,
}

impl<T, E> Clone for EnumerableParts<T, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, E> Copy for EnumerableParts<T, E> {}

pub(crate) trait ErasedEnumerable<T>: Send + Sync {
    fn element(&self) -> TypeIdent;
    fn construction(&self) -> ConstructionKind;
    fn build(&self, visitor: &mut SynthesisVisitor<'_>) -> Result<Arc<dyn Converter<T>>, SerdeError>;
}

/// A sequence of elements, written as an array.
///
/// # Examples
///
/// ```
/// use mp_convert::shape::{EnumerableConstruction, EnumerableShape, Shaped, TypeShape};
///
/// struct Bag(Vec<String>);
///
/// impl Shaped for Bag {
///     fn shape() -> TypeShape<Self> {
///         TypeShape::enumerable(EnumerableShape::new(
///             |b: &Bag| b.0.len(),
///             |b, f| b.0.iter().try_for_each(f),
///             EnumerableConstruction::Span(Bag),
///         ))
///     }
/// }
///
/// let bytes = mp_convert::Serializer::new().serialize(&Bag(vec!["a".into()])).unwrap();
/// assert_eq!(bytes, [0x91, 0xa1, b'a']);
/// ```
pub struct EnumerableShape<T: 'static>(pub(crate) Box<dyn ErasedEnumerable<T>>);

impl<T: Send + Sync + 'static> EnumerableShape<T> {
    pub fn new<E: Shaped>(
        len: fn(&T) -> usize,
        for_each: ForEach<T, E>,
        construction: EnumerableConstruction<T, E>,
    ) -> Self {
        Self(Box::new(EnumerableParts {
            len,
            for_each,
            construction,
        }))
    }

    pub fn element(&self) -> TypeIdent {
        self.0.element()
    }

    pub fn construction(&self) -> ConstructionKind {
        self.0.construction()
    }
}

// -----------------------------------------------------------------------------
// DictionaryShape

/// How a dictionary is built from its entries.
pub enum DictionaryConstruction<T, K, V> {
    None,
    /// `insert` returns `false` if the key was already present.
    Mutable {
        with_capacity: fn(usize) -> T,
        insert: fn(&mut T, K, V) -> bool,
    },
    Span(fn(Vec<(K, V)>) -> T),
}

impl<T, K, V> Clone for DictionaryConstruction<T, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, K, V> Copy for DictionaryConstruction<T, K, V> {}

impl<T, K, V> DictionaryConstruction<T, K, V> {
    pub fn kind(&self) -> ConstructionKind {
        match self {
            Self::None => ConstructionKind::None,
            Self::Mutable { .. } => ConstructionKind::Mutable,
            Self::Span(_) => ConstructionKind::Span,
        }
    }
}

pub(crate) struct DictionaryParts<T, K, V> {
    pub(crate) len: fn(&T) -> usize,
    pub(crate) for_each: ForEachEntry<T, K, V>,
    pub(crate) construction: DictionaryConstruction<T, K, V>,
}

impl<T, K, V> Clone for DictionaryParts<T, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, K, V> Copy for DictionaryParts<T, K, V> {}

pub(crate) trait ErasedDictionary<T>: Send + Sync {
    fn key(&self) -> TypeIdent;
    fn value(&self) -> TypeIdent;
    fn construction(&self) -> ConstructionKind;
    fn build(&self, visitor: &mut SynthesisVisitor<'_>) -> Result<Arc<dyn Converter<T>>, SerdeError>;
}

/// A set of key/value entries, written as a map.
pub struct DictionaryShape<T: 'static>(pub(crate) Box<dyn ErasedDictionary<T>>);

impl<T: Send + Sync + 'static> DictionaryShape<T> {
    pub fn new<K: Shaped, V: Shaped>(
        len: fn(&T) -> usize,
        for_each: ForEachEntry<T, K, V>,
        construction: DictionaryConstruction<T, K, V>,
    ) -> Self {
        Self(Box::new(DictionaryParts {
            len,
            for_each,
            construction,
        }))
    }

    pub fn key(&self) -> TypeIdent {
        self.0.key()
    }

    pub fn value(&self) -> TypeIdent {
        self.0.value()
    }

    pub fn construction(&self) -> ConstructionKind {
        self.0.construction()
    }
}
