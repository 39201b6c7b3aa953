use alloc::sync::Arc;
use core::any::{Any, TypeId, type_name};
use core::fmt;

use super::{
    Attributes, DictionaryShape, EnumShape, EnumerableShape, NullableShape, ObjectShape,
    SharedShape, SubtypeUnionShape, SurrogateShape,
};
use crate::Converter;

// -----------------------------------------------------------------------------
// TypeIdent

/// Identity and readable name of a type.
#[derive(Clone, Copy)]
pub struct TypeIdent {
    id: TypeId,
    name: &'static str,
}

impl TypeIdent {
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeIdent {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeIdent {}

impl core::hash::Hash for TypeIdent {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// -----------------------------------------------------------------------------
// ShapeKind

/// The kind of a shape without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKindTag {
    Opaque,
    Object,
    Enumerable,
    Dictionary,
    Enum,
    Nullable,
    Surrogate,
    Shared,
}

impl ShapeKindTag {
    /// Whether members of this kind count as reference types for the
    /// default-value policy.
    pub fn is_reference(self) -> bool {
        matches!(self, Self::Object | Self::Enumerable | Self::Dictionary | Self::Shared)
    }
}

/// How a type is structured.
pub enum ShapeKind<T: 'static> {
    /// No structure is known. Needs a declared, registered or built-in
    /// converter.
    Opaque,
    Object(ObjectShape<T>),
    Enumerable(EnumerableShape<T>),
    Dictionary(DictionaryShape<T>),
    Enum(EnumShape<T>),
    Nullable(NullableShape<T>),
    Surrogate(SurrogateShape<T>),
    Shared(SharedShape<T>),
}

impl<T: 'static> ShapeKind<T> {
    pub fn tag(&self) -> ShapeKindTag {
        match self {
            Self::Opaque => ShapeKindTag::Opaque,
            Self::Object(_) => ShapeKindTag::Object,
            Self::Enumerable(_) => ShapeKindTag::Enumerable,
            Self::Dictionary(_) => ShapeKindTag::Dictionary,
            Self::Enum(_) => ShapeKindTag::Enum,
            Self::Nullable(_) => ShapeKindTag::Nullable,
            Self::Surrogate(_) => ShapeKindTag::Surrogate,
            Self::Shared(_) => ShapeKindTag::Shared,
        }
    }
}

// -----------------------------------------------------------------------------
// TypeShape

/// The complete description of a type handed to the synthesis visitor.
pub struct TypeShape<T: 'static> {
    ident: TypeIdent,
    pub(crate) kind: ShapeKind<T>,
    pub(crate) converter: Option<Arc<dyn Converter<T>>>,
    pub(crate) subtypes: Option<SubtypeUnionShape<T>>,
    attributes: Attributes,
}

impl<T: 'static> fmt::Debug for TypeShape<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeShape")
            .field("type", &self.ident)
            .field("kind", &self.kind.tag())
            .field("converter", &self.converter.is_some())
            .field("subtypes", &self.subtypes.as_ref().map(SubtypeUnionShape::len))
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl<T: 'static> TypeShape<T> {
    pub fn new(kind: ShapeKind<T>) -> Self {
        Self {
            ident: TypeIdent::of::<T>(),
            kind,
            converter: None,
            subtypes: None,
            attributes: Attributes::new(),
        }
    }

    /// A shape with no known structure.
    #[inline]
    pub fn opaque() -> Self {
        Self::new(ShapeKind::Opaque)
    }

    #[inline]
    pub fn object(shape: ObjectShape<T>) -> Self {
        Self::new(ShapeKind::Object(shape))
    }

    #[inline]
    pub fn enumerable(shape: EnumerableShape<T>) -> Self {
        Self::new(ShapeKind::Enumerable(shape))
    }

    #[inline]
    pub fn dictionary(shape: DictionaryShape<T>) -> Self {
        Self::new(ShapeKind::Dictionary(shape))
    }

    #[inline]
    pub fn enumeration(shape: EnumShape<T>) -> Self {
        Self::new(ShapeKind::Enum(shape))
    }

    #[inline]
    pub fn nullable(shape: NullableShape<T>) -> Self {
        Self::new(ShapeKind::Nullable(shape))
    }

    #[inline]
    pub fn surrogate(shape: SurrogateShape<T>) -> Self {
        Self::new(ShapeKind::Surrogate(shape))
    }

    #[inline]
    pub fn shared(shape: SharedShape<T>) -> Self {
        Self::new(ShapeKind::Shared(shape))
    }

    /// Declares the converter of this type, bypassing synthesis.
    pub fn with_converter(mut self, converter: impl Converter<T>) -> Self {
        self.converter = Some(Arc::new(converter));
        self
    }

    /// Declares the permitted subtypes of this type.
    pub fn with_subtypes(mut self, subtypes: SubtypeUnionShape<T>) -> Self {
        self.subtypes = Some(subtypes);
        self
    }

    pub fn with_attribute<A: Any + Send + Sync>(mut self, value: A) -> Self {
        self.attributes.insert(value);
        self
    }

    #[inline]
    pub fn ident(&self) -> TypeIdent {
        self.ident
    }

    #[inline]
    pub fn kind(&self) -> &ShapeKind<T> {
        &self.kind
    }

    #[inline]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    #[inline]
    pub fn has_converter(&self) -> bool {
        self.converter.is_some()
    }

    #[inline]
    pub fn subtypes(&self) -> Option<&SubtypeUnionShape<T>> {
        self.subtypes.as_ref()
    }
}
