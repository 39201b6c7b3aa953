use alloc::sync::Arc;
use core::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::shape::{SharedPointer, SharedShape, Shaped, TypeShape};

/// A shared, mutable pointer that can close reference cycles.
///
/// Unlike [`Arc`], a `Shared` can be handed out before its target is read,
/// so a graph whose values point back at their ancestors round-trips with
/// reference preservation enabled.
///
/// # Examples
///
/// ```
/// use mp_convert::{Serializer, SerializerOptions, Shared};
///
/// let options = SerializerOptions {
///     preserve_references: true,
///     ..Default::default()
/// };
/// let serializer = Serializer::with_options(options);
///
/// let a = Shared::new(7u32);
/// let pair = vec![a.clone(), a];
/// let bytes = serializer.serialize(&pair).unwrap();
///
/// let back: Vec<Shared<u32>> = serializer.deserialize(&bytes).unwrap();
/// assert!(back[0].ptr_eq(&back[1]));
/// ```
pub struct Shared<T>(Arc<RwLock<T>>);

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether both pointers share one target.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for Shared<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_read() {
            Ok(guard) => f.debug_tuple("Shared").field(&*guard).finish(),
            Err(_) => f.write_str("Shared(<locked>)"),
        }
    }
}

impl<T: Shaped + Default> SharedPointer for Shared<T> {
    type Target = T;

    #[inline]
    fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    fn with_target<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.read())
    }

    fn from_target(target: T) -> Self {
        Self::new(target)
    }

    fn placeholder() -> Option<Self> {
        Some(Self::default())
    }

    fn fill(&self, target: T) {
        *self.write() = target;
    }
}

impl<T: Shaped + Default> Shaped for Shared<T> {
    fn shape() -> TypeShape<Self> {
        TypeShape::shared(SharedShape::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_filled_in_place() {
        let slot = Shared::<u32>::placeholder().unwrap();
        let alias = slot.clone();
        slot.fill(9);
        assert_eq!(*alias.read(), 9);
        assert_eq!(slot.identity(), alias.identity());
    }

    #[test]
    fn debug_shows_target() {
        assert_eq!(alloc::format!("{:?}", Shared::new(3u8)), "Shared(3)");
    }
}
