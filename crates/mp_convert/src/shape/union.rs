use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;

use super::{Shaped, TypeIdent};
use crate::SerdeError;
use crate::cache::SynthesisVisitor;
use crate::union::SubtypeConverter;

// -----------------------------------------------------------------------------
// SubtypeAlias

/// Discriminator written before a subtype value.
///
/// Integer and string aliases are separate namespaces: `1` and `"1"` never
/// match each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubtypeAlias {
    Int(i64),
    Str(&'static str),
}

impl From<i64> for SubtypeAlias {
    #[inline]
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&'static str> for SubtypeAlias {
    #[inline]
    fn from(value: &'static str) -> Self {
        Self::Str(value)
    }
}

impl fmt::Display for SubtypeAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s:?}"),
        }
    }
}

// -----------------------------------------------------------------------------
// SubtypeUnionShape

/// The concrete types a base type may hold at run time.
///
/// Values are written as `[alias, value]`, with `nil` as the alias of the
/// base type itself. Reading an alias that is not listed fails.
pub struct SubtypeUnionShape<T: 'static> {
    pub(crate) runtime_type: fn(&T) -> TypeId,
    pub(crate) members: Vec<Box<dyn ErasedSubtype<T>>>,
}

impl<T: Send + Sync + 'static> SubtypeUnionShape<T> {
    /// `runtime_type` reports the concrete type held by a value, or
    /// `TypeId::of::<T>()` for a plain base value.
    pub fn new(runtime_type: fn(&T) -> TypeId) -> Self {
        Self {
            runtime_type,
            members: Vec::new(),
        }
    }

    /// Adds a permitted subtype.
    ///
    /// `upcast` wraps a subtype value into the base type; `downcast` returns
    /// the subtype value held by a base value, if it holds one.
    pub fn with<S: Shaped>(
        mut self,
        alias: impl Into<SubtypeAlias>,
        upcast: fn(S) -> T,
        downcast: fn(&T) -> Option<&S>,
    ) -> Self {
        self.members.push(Box::new(SubtypeParts {
            alias: alias.into(),
            upcast,
            downcast,
        }));
        self
    }
}

impl<T: 'static> SubtypeUnionShape<T> {
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn aliases(&self) -> impl ExactSizeIterator<Item = SubtypeAlias> + '_ {
        self.members.iter().map(|m| m.alias())
    }
}

pub(crate) struct SubtypeParts<T, S> {
    pub(crate) alias: SubtypeAlias,
    pub(crate) upcast: fn(S) -> T,
    pub(crate) downcast: fn(&T) -> Option<&S>,
}

pub(crate) trait ErasedSubtype<T>: Send + Sync {
    fn alias(&self) -> SubtypeAlias;
    fn subtype(&self) -> TypeIdent;
    fn build(&self, visitor: &mut SynthesisVisitor<'_>) -> Result<Box<dyn SubtypeConverter<T>>, SerdeError>;
}
