use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

use mp_utils::TypeIdMap;

// -----------------------------------------------------------------------------
// Attributes

/// Open set of annotations on a type shape or property.
///
/// Attributes are keyed by their type, so there is at most one attribute of
/// each type. Converter factories inspect them to decide whether they handle
/// a type.
///
/// # Examples
///
/// ```
/// use mp_convert::shape::Attributes;
///
/// struct Hex;
///
/// let attrs = Attributes::new().with(Hex).with(8u32);
/// assert!(attrs.contains::<Hex>());
/// assert_eq!(attrs.get::<u32>(), Some(&8));
/// assert_eq!(attrs.len(), 2);
/// ```
#[derive(Default)]
pub struct Attributes {
    attributes: TypeIdMap<Box<dyn Any + Send + Sync>>,
}

impl Attributes {
    #[inline]
    pub const fn new() -> Self {
        Self {
            attributes: TypeIdMap::new(),
        }
    }

    /// Adds an attribute, replacing an earlier one of the same type.
    #[inline]
    pub fn with<A: Any + Send + Sync>(mut self, value: A) -> Self {
        self.insert(value);
        self
    }

    #[inline]
    pub fn insert<A: Any + Send + Sync>(&mut self, value: A) {
        self.attributes.insert(TypeId::of::<A>(), Box::new(value));
    }

    #[inline]
    pub fn contains<A: Any>(&self) -> bool {
        self.attributes.contains_type::<A>()
    }

    #[inline]
    pub fn get<A: Any>(&self) -> Option<&A> {
        self.attributes.get_type::<A>()?.downcast_ref::<A>()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attributes").field("len", &self.len()).finish()
    }
}
