use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt::Debug;

use crate::shape::{ObjectShape, PropertyShape, Shaped, SubtypeUnionShape, TypeShape};
use crate::{ErrorKind, Serializer};

trait Animal: Any + Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Dog {
    name: String,
    good: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Cat {
    name: String,
    lives: u8,
}

/// Not listed as a subtype.
#[derive(Debug)]
struct Fish;

impl Animal for Dog {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Animal for Cat {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Animal for Fish {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Shaped for Dog {
    fn shape() -> TypeShape<Self> {
        TypeShape::object(
            ObjectShape::default_constructed()
                .property(PropertyShape::new("name", |d: &Dog| &d.name).with_setter(|d, v| d.name = v))
                .property(PropertyShape::new("good", |d: &Dog| &d.good).with_setter(|d, v| d.good = v)),
        )
    }
}

impl Shaped for Cat {
    fn shape() -> TypeShape<Self> {
        TypeShape::object(
            ObjectShape::default_constructed()
                .property(PropertyShape::new("name", |c: &Cat| &c.name).with_setter(|c, v| c.name = v))
                .property(PropertyShape::new("lives", |c: &Cat| &c.lives).with_setter(|c, v| c.lives = v)),
        )
    }
}

#[derive(Debug, Clone)]
struct AnyAnimal(Arc<dyn Animal>);

impl AnyAnimal {
    fn get<A: Animal>(&self) -> Option<&A> {
        self.0.as_any().downcast_ref::<A>()
    }
}

impl Shaped for AnyAnimal {
    fn shape() -> TypeShape<Self> {
        TypeShape::opaque().with_subtypes(
            SubtypeUnionShape::new(|a: &AnyAnimal| a.0.as_any().type_id())
                .with(1i64, |d: Dog| AnyAnimal(Arc::new(d)), AnyAnimal::get::<Dog>)
                .with("cat", |c: Cat| AnyAnimal(Arc::new(c)), AnyAnimal::get::<Cat>),
        )
    }
}

#[test]
fn subtypes_keep_their_concrete_type() {
    let serializer = Serializer::new();
    let zoo = vec![
        AnyAnimal(Arc::new(Dog {
            name: "Rex".to_string(),
            good: true,
        })),
        AnyAnimal(Arc::new(Cat {
            name: "Tom".to_string(),
            lives: 9,
        })),
    ];

    let bytes = serializer.serialize(&zoo).unwrap();
    // [[1, {..dog..}], ["cat", {..cat..}]]
    assert_eq!(&bytes[..3], [0x92, 0x92, 0x01]);

    let back: Vec<AnyAnimal> = serializer.deserialize(&bytes).unwrap();
    assert_eq!(back[0].get::<Dog>().unwrap().name, "Rex");
    assert!(back[0].get::<Cat>().is_none());
    assert_eq!(back[1].get::<Cat>().unwrap().lives, 9);
}

#[test]
fn string_alias_on_the_wire() {
    let cat = AnyAnimal(Arc::new(Cat::default()));
    let bytes = Serializer::new().serialize(&cat).unwrap();
    assert_eq!(&bytes[..5], [0x92, 0xa3, b'c', b'a', b't']);
}

#[test]
fn unknown_alias() {
    let serializer = Serializer::new();
    let err = serializer.deserialize::<AnyAnimal>(&[0x92, 0x07, 0x80]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownAlias);

    // Integer and string aliases never match each other.
    let err = serializer.deserialize::<AnyAnimal>(&[0x92, 0xa1, b'1', 0x80]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownAlias);

    // The base type has no converter of its own.
    let err = serializer.deserialize::<AnyAnimal>(&[0x92, 0xc0, 0x80]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownAlias);
}

#[test]
fn malformed_union_envelope() {
    let serializer = Serializer::new();
    let err = serializer.deserialize::<AnyAnimal>(&[0x91, 0x01]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    let err = serializer.deserialize::<AnyAnimal>(&[0x92, 0xc3, 0x80]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn unlisted_runtime_type_is_rejected() {
    let err = Serializer::new().serialize(&AnyAnimal(Arc::new(Fish))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Shape);
}

#[derive(Debug)]
struct Twice;

impl Shaped for Twice {
    fn shape() -> TypeShape<Self> {
        TypeShape::opaque().with_subtypes(
            SubtypeUnionShape::new(|_: &Twice| TypeId::of::<Twice>())
                .with(1i64, |_: Dog| Twice, |_| None)
                .with(1i64, |_: Cat| Twice, |_| None),
        )
    }
}

#[test]
fn duplicate_alias_fails_synthesis() {
    let err = Serializer::new().converter::<Twice>().err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Shape);
}
