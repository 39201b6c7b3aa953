//! Whole-engine tests over a handful of realistic model types.

mod config;
mod graphs;
mod incremental;
mod synthesis;
mod unions;

use alloc::string::String;
use alloc::vec::Vec;

use crate::Shared;
use crate::shape::{
    ConstructorShape, ObjectShape, ParameterShape, ParameterizedConstructor, PropertyShape, Shaped,
    TypeShape,
};

// -----------------------------------------------------------------------------
// Fixtures

#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct Person {
    pub name: String,
    pub age: u32,
    pub email: Option<String>,
    pub tags: Vec<String>,
}

impl Shaped for Person {
    fn shape() -> TypeShape<Self> {
        TypeShape::object(
            ObjectShape::default_constructed()
                .property(PropertyShape::new("name", |p: &Person| &p.name).with_setter(|p, v| p.name = v))
                .property(
                    PropertyShape::new("age", |p: &Person| &p.age)
                        .with_setter(|p, v| p.age = v)
                        .with_zero_default(),
                )
                .property(
                    PropertyShape::new("email", |p: &Person| &p.email)
                        .with_setter(|p, v| p.email = v)
                        .with_zero_default(),
                )
                .property(
                    PropertyShape::new("tags", |p: &Person| &p.tags)
                        .with_setter(|p, v| p.tags = v)
                        .with_zero_default(),
                ),
        )
    }
}

/// Built through a constructor; `balance` is settable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Account {
    pub account_id: u64,
    pub owner: String,
    pub balance: i64,
}

impl Shaped for Account {
    fn shape() -> TypeShape<Self> {
        let constructor = ParameterizedConstructor::new(|args| {
            Ok(Account {
                account_id: args.take(0)?,
                owner: args.take(1)?,
                balance: 0,
            })
        })
        .parameter(ParameterShape::<u64>::new("account_id"))
        .parameter(ParameterShape::new("owner").with_default(String::from("bank")));

        TypeShape::object(
            ObjectShape::new(ConstructorShape::Parameterized(constructor))
                .property(PropertyShape::new("account_id", |a: &Account| &a.account_id))
                .property(PropertyShape::new("owner", |a: &Account| &a.owner))
                .property(
                    PropertyShape::new("balance", |a: &Account| &a.balance)
                        .with_setter(|a, v| a.balance = v)
                        .with_zero_default(),
                ),
        )
    }
}

/// Positional layout with a gap at key 2.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(super) struct Pixel {
    pub x: i16,
    pub y: i16,
    pub color: u32,
}

impl Shaped for Pixel {
    fn shape() -> TypeShape<Self> {
        TypeShape::object(
            ObjectShape::default_constructed()
                .property(PropertyShape::new("x", |p: &Pixel| &p.x).with_setter(|p, v| p.x = v).with_key(0))
                .property(PropertyShape::new("y", |p: &Pixel| &p.y).with_setter(|p, v| p.y = v).with_key(1))
                .property(
                    PropertyShape::new("color", |p: &Pixel| &p.color)
                        .with_setter(|p, v| p.color = v)
                        .with_key(3)
                        .with_zero_default(),
                ),
        )
    }
}

/// A linked node that may point back at an ancestor.
#[derive(Debug, Default)]
pub(super) struct Node {
    pub name: String,
    pub next: Option<Shared<Node>>,
}

impl Shaped for Node {
    fn shape() -> TypeShape<Self> {
        TypeShape::object(
            ObjectShape::default_constructed()
                .property(PropertyShape::new("name", |n: &Node| &n.name).with_setter(|n, v| n.name = v))
                .property(PropertyShape::new("next", |n: &Node| &n.next).with_setter(|n, v| n.next = v)),
        )
    }
}

pub(super) fn person() -> Person {
    Person {
        name: String::from("Ada"),
        age: 36,
        email: Some(String::from("ada@example.com")),
        tags: alloc::vec![String::from("math"), String::from("engines")],
    }
}
