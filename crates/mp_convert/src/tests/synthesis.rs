use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use super::{Account, Person, person};
use crate::shape::{ObjectShape, PropertyShape, Shaped, TypeShape};
use crate::{ErrorKind, Serializer, SerializerOptions};

/// No structure and no converter.
#[derive(Debug, Default)]
struct Mystery;

impl Shaped for Mystery {
    fn shape() -> TypeShape<Self> {
        TypeShape::opaque()
    }
}

#[derive(Debug, Default)]
struct Broken {
    ok: u8,
    bad: Vec<Mystery>,
}

impl Shaped for Broken {
    fn shape() -> TypeShape<Self> {
        TypeShape::object(
            ObjectShape::default_constructed()
                .property(PropertyShape::new("ok", |b: &Broken| &b.ok).with_setter(|b, v| b.ok = v))
                .property(PropertyShape::new("bad", |b: &Broken| &b.bad).with_setter(|b, v| b.bad = v)),
        )
    }
}

#[derive(Debug, Default, PartialEq)]
struct Tree {
    label: String,
    children: Vec<Tree>,
}

impl Shaped for Tree {
    fn shape() -> TypeShape<Self> {
        TypeShape::object(
            ObjectShape::default_constructed()
                .property(PropertyShape::new("label", |t: &Tree| &t.label).with_setter(|t, v| t.label = v))
                .property(
                    PropertyShape::new("children", |t: &Tree| &t.children)
                        .with_setter(|t, v| t.children = v)
                        .with_zero_default(),
                ),
        )
    }
}

fn leaf(label: &str) -> Tree {
    Tree {
        label: label.to_string(),
        children: Vec::new(),
    }
}

#[test]
fn converters_are_cached_once() {
    let serializer = Serializer::new();
    let first = serializer.converter::<Person>().unwrap();
    let len = serializer.cache().len();
    let second = serializer.converter::<Person>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(serializer.cache().len(), len);
}

#[test]
fn concurrent_first_use_yields_one_converter() {
    let serializer = Serializer::new();
    let converters: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| serializer.converter::<Account>().unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for converter in &converters[1..] {
        assert!(Arc::ptr_eq(&converters[0], converter));
    }
}

#[test]
fn concurrent_round_trips() {
    let serializer = Serializer::new();
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..50 {
                    let bytes = serializer.serialize(&person()).unwrap();
                    assert_eq!(serializer.deserialize::<Person>(&bytes).unwrap(), person());
                }
            });
        }
    });
}

#[test]
fn failed_synthesis_commits_nothing() {
    let serializer = Serializer::new();
    let err = serializer.serialize(&Broken::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Shape);
    assert_eq!(serializer.cache().len(), 0);

    // The path from the requested type to the failing one is reported.
    let message = err.root().to_string();
    assert!(message.contains("Broken") && message.contains("Mystery"), "{message}");

    // Unrelated types still synthesize afterwards.
    assert!(serializer.converter::<Person>().is_ok());
}

#[test]
fn recursive_type() {
    let serializer = Serializer::new();
    let tree = Tree {
        label: "root".to_string(),
        children: vec![
            leaf("a"),
            Tree {
                label: "b".to_string(),
                children: vec![leaf("c")],
            },
        ],
    };
    let bytes = serializer.serialize(&tree).unwrap();
    assert_eq!(serializer.deserialize::<Tree>(&bytes).unwrap(), tree);
}

#[test]
fn depth_limit_applies_both_ways() {
    let shallow = Serializer::with_options(SerializerOptions {
        max_depth: 3,
        ..Default::default()
    });

    let mut deep = leaf("x");
    for _ in 0..3 {
        deep = Tree {
            label: "x".to_string(),
            children: vec![deep],
        };
    }
    let err = shallow.serialize(&deep).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DepthLimit);

    let bytes = Serializer::new().serialize(&deep).unwrap();
    let err = shallow.deserialize::<Tree>(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DepthLimit);

    let nested = vec![vec![vec![1u32]]];
    assert!(shallow.serialize(&nested).is_ok());
    let err = shallow.deserialize::<Vec<Vec<Vec<Vec<u32>>>>>(&[0x91, 0x91, 0x91, 0x91, 0x01]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DepthLimit);
}
