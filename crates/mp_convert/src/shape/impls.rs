use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet, VecDeque};
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::hash::{BuildHasher, Hash};
use core::net::Ipv4Addr;
use core::time::Duration;
use std::collections::{HashMap, HashSet};
use std::time::SystemTime;

use mp_codec::Timestamp;
use mp_utils::hash::hashbrown;

use super::{
    ConstructorShape, DictionaryConstruction, DictionaryShape, EnumerableConstruction,
    EnumerableShape, NullableShape, ObjectShape, ParameterShape, ParameterizedConstructor,
    PropertyShape, SharedPointer, SharedShape, Shaped, SurrogateShape, TypeShape,
};
use crate::SerdeError;

// -----------------------------------------------------------------------------
// Scalars

macro_rules! impl_opaque {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Shaped for $ty {
                #[inline]
                fn shape() -> TypeShape<Self> {
                    TypeShape::opaque()
                }
            }
        )*
    };
}

impl_opaque!(
    (), bool, char, u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64, String,
    Timestamp, SystemTime,
);

impl Shaped for Duration {
    fn shape() -> TypeShape<Self> {
        TypeShape::surrogate(SurrogateShape::new(
            |d: &Duration| (d.as_secs(), d.subsec_nanos()),
            |(secs, nanos): (u64, u32)| {
                if nanos >= 1_000_000_000 {
                    return Err(SerdeError::custom(format_args!(
                        "duration nanoseconds out of range: {nanos}"
                    )));
                }
                Ok(Duration::new(secs, nanos))
            },
        ))
    }
}

impl Shaped for Ipv4Addr {
    fn shape() -> TypeShape<Self> {
        TypeShape::surrogate(SurrogateShape::new(|a: &Ipv4Addr| u32::from(*a), |v: u32| {
            Ok(Ipv4Addr::from(v))
        }))
    }
}

// -----------------------------------------------------------------------------
// Wrappers

impl<T: Shaped> Shaped for Option<T> {
    fn shape() -> TypeShape<Self> {
        TypeShape::nullable(NullableShape::new(Option::as_ref, Some, || None))
    }
}

impl<T: Shaped> Shaped for Box<T> {
    fn shape() -> TypeShape<Self> {
        TypeShape::surrogate(SurrogateShape::transparent(|b: &Box<T>| &**b, Box::new))
    }
}

impl<T: Shaped> SharedPointer for Arc<T> {
    type Target = T;

    #[inline]
    fn identity(&self) -> usize {
        Arc::as_ptr(self) as *const () as usize
    }

    #[inline]
    fn with_target<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(self)
    }

    #[inline]
    fn from_target(target: T) -> Self {
        Arc::new(target)
    }

    #[inline]
    fn placeholder() -> Option<Self> {
        None
    }

    fn fill(&self, _target: T) {}
}

impl<T: Shaped> Shaped for Arc<T> {
    fn shape() -> TypeShape<Self> {
        TypeShape::shared(SharedShape::new())
    }
}

// -----------------------------------------------------------------------------
// Sequences

impl<T: Shaped> Shaped for Vec<T> {
    fn shape() -> TypeShape<Self> {
        TypeShape::enumerable(EnumerableShape::new(
            Vec::len,
            |v: &Vec<T>, f| v.iter().try_for_each(f),
            EnumerableConstruction::Mutable {
                with_capacity: Vec::with_capacity,
                add: Vec::push,
            },
        ))
    }
}

impl<T: Shaped> Shaped for VecDeque<T> {
    fn shape() -> TypeShape<Self> {
        TypeShape::enumerable(EnumerableShape::new(
            VecDeque::len,
            |v: &VecDeque<T>, f| v.iter().try_for_each(f),
            EnumerableConstruction::Sequence(|items| items.collect()),
        ))
    }
}

impl<T: Shaped + Ord> Shaped for BTreeSet<T> {
    fn shape() -> TypeShape<Self> {
        TypeShape::enumerable(EnumerableShape::new(
            BTreeSet::len,
            |v: &BTreeSet<T>, f| v.iter().try_for_each(f),
            EnumerableConstruction::Span(|items| items.into_iter().collect()),
        ))
    }
}

impl<T, S> Shaped for HashSet<T, S>
where
    T: Shaped + Eq + Hash,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    fn shape() -> TypeShape<Self> {
        TypeShape::enumerable(EnumerableShape::new(
            HashSet::len,
            |v: &HashSet<T, S>, f| v.iter().try_for_each(f),
            EnumerableConstruction::Mutable {
                with_capacity: |n| HashSet::with_capacity_and_hasher(n, S::default()),
                add: |set, item| {
                    set.insert(item);
                },
            },
        ))
    }
}

// -----------------------------------------------------------------------------
// Maps

macro_rules! impl_hash_map {
    ($($map:ident)::+) => {
        impl<K, V, S> Shaped for $($map)::+<K, V, S>
        where
            K: Shaped + Eq + Hash,
            V: Shaped,
            S: BuildHasher + Default + Send + Sync + 'static,
        {
            fn shape() -> TypeShape<Self> {
                TypeShape::dictionary(DictionaryShape::new(
                    $($map)::+::len,
                    |m: &Self, f| m.iter().try_for_each(|(k, v)| f(k, v)),
                    DictionaryConstruction::Mutable {
                        with_capacity: |n| $($map)::+::with_capacity_and_hasher(n, S::default()),
                        insert: |m, k, v| m.insert(k, v).is_none(),
                    },
                ))
            }
        }
    };
}

impl_hash_map!(HashMap);
impl_hash_map!(hashbrown::HashMap);

impl<K: Shaped + Ord, V: Shaped> Shaped for BTreeMap<K, V> {
    fn shape() -> TypeShape<Self> {
        TypeShape::dictionary(DictionaryShape::new(
            BTreeMap::len,
            |m: &Self, f| m.iter().try_for_each(|(k, v)| f(k, v)),
            DictionaryConstruction::Mutable {
                with_capacity: |_| BTreeMap::new(),
                insert: |m, k, v| m.insert(k, v).is_none(),
            },
        ))
    }
}

// -----------------------------------------------------------------------------
// Tuples

impl<A: Shaped, B: Shaped> Shaped for (A, B) {
    fn shape() -> TypeShape<Self> {
        let constructor = ParameterizedConstructor::new(|args| Ok((args.take(0)?, args.take(1)?)))
            .parameter(ParameterShape::<A>::new("0"))
            .parameter(ParameterShape::<B>::new("1"));

        TypeShape::object(
            ObjectShape::new(ConstructorShape::Parameterized(constructor))
                .property(PropertyShape::new("0", |t: &Self| &t.0).with_key(0))
                .property(PropertyShape::new("1", |t: &Self| &t.1).with_key(1)),
        )
    }
}

impl<A: Shaped, B: Shaped, C: Shaped> Shaped for (A, B, C) {
    fn shape() -> TypeShape<Self> {
        let constructor = ParameterizedConstructor::new(|args| {
            Ok((args.take(0)?, args.take(1)?, args.take(2)?))
        })
        .parameter(ParameterShape::<A>::new("0"))
        .parameter(ParameterShape::<B>::new("1"))
        .parameter(ParameterShape::<C>::new("2"));

        TypeShape::object(
            ObjectShape::new(ConstructorShape::Parameterized(constructor))
                .property(PropertyShape::new("0", |t: &Self| &t.0).with_key(0))
                .property(PropertyShape::new("1", |t: &Self| &t.1).with_key(1))
                .property(PropertyShape::new("2", |t: &Self| &t.2).with_key(2)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{ConstructionKind, ShapeKindTag};

    #[test]
    fn std_kinds() {
        assert_eq!(u32::shape().kind().tag(), ShapeKindTag::Opaque);
        assert_eq!(Option::<u8>::shape().kind().tag(), ShapeKindTag::Nullable);
        assert_eq!(Arc::<String>::shape().kind().tag(), ShapeKindTag::Shared);
        assert_eq!(<(u8, bool)>::shape().kind().tag(), ShapeKindTag::Object);
        assert_eq!(BTreeMap::<String, u8>::shape().kind().tag(), ShapeKindTag::Dictionary);
    }

    #[test]
    fn sequence_construction() {
        let vec = Vec::<u16>::shape();
        let crate::shape::ShapeKind::Enumerable(vec) = vec.kind() else {
            panic!("vec is not enumerable");
        };
        assert_eq!(vec.construction(), ConstructionKind::Mutable);

        let deque = VecDeque::<u16>::shape();
        let crate::shape::ShapeKind::Enumerable(deque) = deque.kind() else {
            panic!("deque is not enumerable");
        };
        assert_eq!(deque.construction(), ConstructionKind::Sequence);
        assert!(deque.element().is::<u16>());
    }

    #[test]
    fn arc_identity_follows_allocation() {
        let a = Arc::new(5u8);
        let b = Arc::clone(&a);
        let c = Arc::new(5u8);
        assert_eq!(a.identity(), b.identity());
        assert_ne!(a.identity(), c.identity());
    }
}
