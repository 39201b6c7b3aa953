use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use super::Node;
use crate::shape::{Shaped, SurrogateShape, TypeShape};
use crate::{ErrorKind, Serializer, SerializerOptions, Shared};

/// Written through an `Arc` that only lives while the value is written.
#[derive(Debug, Clone, PartialEq)]
struct Boxed(u32);

impl Shaped for Boxed {
    fn shape() -> TypeShape<Self> {
        TypeShape::surrogate(SurrogateShape::new(
            |b: &Boxed| Arc::new(b.0),
            |v: Arc<u32>| Ok(Boxed(*v)),
        ))
    }
}

fn preserving() -> Serializer {
    Serializer::with_options(SerializerOptions {
        preserve_references: true,
        ..Default::default()
    })
}

fn cycle() -> Shared<Node> {
    let a = Shared::new(Node {
        name: "a".to_string(),
        next: None,
    });
    let b = Shared::new(Node {
        name: "b".to_string(),
        next: Some(a.clone()),
    });
    a.write().next = Some(b);
    a
}

/// Breaks the cycle so the test does not leak.
fn unlink(node: &Shared<Node>) {
    let next = node.write().next.take();
    if let Some(next) = next {
        next.write().next.take();
    }
}

#[test]
fn cycle_round_trips_with_identity() {
    let serializer = preserving();
    let a = cycle();
    let bytes = serializer.serialize(&a).unwrap();
    unlink(&a);

    let back: Shared<Node> = serializer.deserialize(&bytes).unwrap();
    let b = back.read().next.clone().unwrap();
    assert_eq!(back.read().name, "a");
    assert_eq!(b.read().name, "b");
    let again = b.read().next.clone().unwrap();
    assert!(again.ptr_eq(&back));
    unlink(&back);
}

#[test]
fn cycle_without_preservation_hits_depth_limit() {
    let serializer = Serializer::new();
    let a = cycle();
    let err = serializer.serialize(&a).unwrap_err();
    unlink(&a);
    assert_eq!(err.kind(), ErrorKind::DepthLimit);
}

#[test]
fn repeated_arc_is_written_once() {
    let serializer = preserving();
    let name: Arc<String> = Arc::new("shared".to_string());
    let list = vec![Arc::clone(&name), Arc::clone(&name), Arc::new("other".to_string())];

    let bytes = serializer.serialize(&list).unwrap();
    let plain = Serializer::new().serialize(&list).unwrap();
    assert!(bytes.len() < plain.len());

    let back: Vec<Arc<String>> = serializer.deserialize(&bytes).unwrap();
    assert!(Arc::ptr_eq(&back[0], &back[1]));
    assert!(!Arc::ptr_eq(&back[0], &back[2]));
    assert_eq!(*back[2], "other");
}

#[test]
fn references_do_not_leak_between_values() {
    let serializer = preserving();
    let shared = Shared::new(5u32);
    let first = serializer.serialize(&vec![shared.clone(), shared.clone()]).unwrap();
    let second = serializer.serialize(&vec![shared.clone(), shared]).unwrap();
    assert_eq!(first, second);
}

#[test]
fn dangling_reference_is_rejected() {
    // A back-reference to ordinal 3 before anything was read.
    let bytes = [0x91, 0xd4, 0x01, 0x03];
    let err = preserving().deserialize::<Vec<Arc<u32>>>(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn transient_pointers_are_never_aliased() {
    let serializer = preserving();
    let values = vec![Boxed(1), Boxed(2), Boxed(3)];
    let bytes = serializer.serialize(&values).unwrap();
    assert_eq!(bytes, [0x93, 0x01, 0x02, 0x03]);
    assert_eq!(serializer.deserialize::<Vec<Boxed>>(&bytes).unwrap(), values);

    // Equal values behind distinct pointers are still written in full.
    let same = vec![Boxed(4), Boxed(4)];
    let bytes = serializer.serialize(&same).unwrap();
    assert_eq!(bytes, [0x92, 0x04, 0x04]);
}
