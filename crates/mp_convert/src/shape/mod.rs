//! Structural descriptions of types.
//!
//! A [`TypeShape`] says what a type is made of: its kind, its members and
//! how to construct it. The synthesis visitor walks a shape once to compile
//! a [`Converter`](crate::Converter); shapes are never consulted per value.
//!
//! Types describe themselves by implementing [`Shaped`]. Shapes of standard
//! library types are provided.

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod collection;
mod enumeration;
mod impls;
mod object;
mod type_shape;
mod union;
mod wrappers;

// -----------------------------------------------------------------------------
// Exports

pub use attributes::Attributes;
pub use collection::{
    ConstructionKind, DictionaryConstruction, DictionaryShape, EnumerableConstruction,
    EnumerableShape, ForEach, ForEachEntry,
};
pub use enumeration::{EnumMember, EnumShape};
pub use object::{
    Arguments, ConstructorShape, ObjectShape, ParameterShape, ParameterizedConstructor,
    PropertyShape,
};
pub use type_shape::{ShapeKind, ShapeKindTag, TypeIdent, TypeShape};
pub use union::{SubtypeAlias, SubtypeUnionShape};
pub use wrappers::{NullableShape, SharedPointer, SharedShape, SurrogateShape};

pub(crate) use collection::{DictionaryParts, EnumerableParts, ErasedDictionary, ErasedEnumerable};
pub(crate) use object::{DefaultPredicate, ErasedParameter, ErasedProperty, ParameterDefault};
pub(crate) use union::{ErasedSubtype, SubtypeParts};
pub(crate) use wrappers::{
    ErasedNullable, ErasedShared, ErasedSurrogate, Marshal, NullableParts, SharedParts,
    SurrogateParts, Unmarshal,
};

// -----------------------------------------------------------------------------
// Shaped

/// Provides the shape of a type.
///
/// This is the engine's only view of user types. A type without a useful
/// structure can return [`TypeShape::opaque`] and rely on a registered or
/// declared converter.
///
/// # Examples
///
/// ```
/// use mp_convert::Serializer;
/// use mp_convert::shape::{ObjectShape, PropertyShape, Shaped, TypeShape};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Shaped for Point {
///     fn shape() -> TypeShape<Self> {
///         TypeShape::object(
///             ObjectShape::default_constructed()
///                 .property(PropertyShape::new("x", |p: &Point| &p.x).with_setter(|p, v| p.x = v))
///                 .property(PropertyShape::new("y", |p: &Point| &p.y).with_setter(|p, v| p.y = v)),
///         )
///     }
/// }
///
/// let serializer = Serializer::new();
/// let bytes = serializer.serialize(&Point { x: 1, y: -2 }).unwrap();
/// assert_eq!(bytes, [0x82, 0xa1, b'x', 0x01, 0xa1, b'y', 0xfe]);
/// assert_eq!(serializer.deserialize::<Point>(&bytes).unwrap(), Point { x: 1, y: -2 });
/// ```
pub trait Shaped: Sized + Send + Sync + 'static {
    fn shape() -> TypeShape<Self>;
}
