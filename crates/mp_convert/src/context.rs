use alloc::sync::Arc;
use core::any::Any;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use mp_utils::hash::HashMap;

use crate::SerdeError;
use crate::options::SerializerOptions;
use crate::references::ReferenceTable;

type PropertyBag = HashMap<&'static str, Arc<dyn Any + Send + Sync>>;

// -----------------------------------------------------------------------------
// CancellationToken

/// A cooperative cancellation flag shared between a caller and the
/// operations it started.
///
/// Checked between top-level values, never in the middle of one.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// -----------------------------------------------------------------------------
// SerializationContext

/// Per-operation state handed to every converter call.
///
/// Holds the remaining nesting budget, the reference table of the current
/// top-level value and a bag of converter-defined properties. A fresh
/// context is created for every top-level call, so nothing leaks between
/// operations.
///
/// # Examples
///
/// ```
/// use mp_convert::SerializationContext;
///
/// let mut ctx = SerializationContext::default();
/// let key_len = ctx.with_scoped_property("key", 32usize, |ctx| {
///     Ok(*ctx.property::<usize>("key").unwrap())
/// });
/// assert_eq!(key_len.unwrap(), 32);
/// assert!(ctx.property::<usize>("key").is_none());
/// ```
pub struct SerializationContext {
    max_depth: usize,
    remaining_depth: usize,
    properties: Arc<PropertyBag>,
    pub(crate) references: ReferenceTable,
    reference_code: i8,
    cancellation: Option<CancellationToken>,
}

impl fmt::Debug for SerializationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializationContext")
            .field("max_depth", &self.max_depth)
            .field("remaining_depth", &self.remaining_depth)
            .field("properties", &self.properties.keys().collect::<alloc::vec::Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Default for SerializationContext {
    fn default() -> Self {
        Self::new(&SerializerOptions::default())
    }
}

impl SerializationContext {
    pub fn new(options: &SerializerOptions) -> Self {
        Self {
            max_depth: options.max_depth,
            remaining_depth: options.max_depth,
            properties: Arc::new(PropertyBag::default()),
            references: ReferenceTable::default(),
            reference_code: options.object_reference_code,
            cancellation: None,
        }
    }

    /// Attaches a cancellation token checked by streaming drivers.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Adds a property visible to every converter of this operation.
    pub fn with_property<V: Any + Send + Sync>(mut self, key: &'static str, value: V) -> Self {
        Arc::make_mut(&mut self.properties).insert(key, Arc::new(value));
        self
    }

    #[inline]
    pub fn remaining_depth(&self) -> usize {
        self.remaining_depth
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[inline]
    pub(crate) fn reference_code(&self) -> i8 {
        self.reference_code
    }

    /// Runs `f` one nesting level deeper.
    ///
    /// Fails with [`SerdeError::DepthExceeded`] when the budget is spent.
    #[inline]
    pub fn nested<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, SerdeError>,
    ) -> Result<R, SerdeError> {
        if self.remaining_depth == 0 {
            return Err(SerdeError::DepthExceeded {
                max_depth: self.max_depth,
            });
        }
        self.remaining_depth -= 1;
        let result = f(self);
        self.remaining_depth += 1;
        result
    }

    /// Returns the property stored under `key` if it has type `V`.
    pub fn property<V: Any>(&self, key: &str) -> Option<&V> {
        self.properties.get(key)?.downcast_ref::<V>()
    }

    /// Runs `f` with `key` set to `value`, restoring the previous set of
    /// properties afterwards.
    ///
    /// The bag is copied on write: sibling calls never observe the
    /// property.
    pub fn with_scoped_property<V: Any + Send + Sync, R>(
        &mut self,
        key: &'static str,
        value: V,
        f: impl FnOnce(&mut Self) -> Result<R, SerdeError>,
    ) -> Result<R, SerdeError> {
        let saved = Arc::clone(&self.properties);
        Arc::make_mut(&mut self.properties).insert(key, Arc::new(value));
        let result = f(self);
        self.properties = saved;
        result
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Fails with [`SerdeError::Cancelled`] if cancellation was requested.
    pub fn check_cancelled(&self) -> Result<(), SerdeError> {
        if self.is_cancelled() {
            Err(SerdeError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Prepares the context for the next top-level value.
    pub(crate) fn reset_for_next_value(&mut self) {
        self.remaining_depth = self.max_depth;
        self.references.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_budget() {
        let options = SerializerOptions {
            max_depth: 2,
            ..Default::default()
        };
        let mut ctx = SerializationContext::new(&options);
        let ok = ctx.nested(|ctx| ctx.nested(|ctx| Ok(ctx.remaining_depth())));
        assert_eq!(ok.unwrap(), 0);
        let err = ctx.nested(|ctx| ctx.nested(|ctx| ctx.nested(|_| Ok(()))));
        assert!(matches!(err, Err(SerdeError::DepthExceeded { max_depth: 2 })));
        assert_eq!(ctx.remaining_depth(), 2);
    }

    #[test]
    fn scoped_property_shadows_and_restores() {
        let mut ctx = SerializationContext::default().with_property("mode", 1u8);
        ctx.with_scoped_property("mode", 2u8, |ctx| {
            assert_eq!(ctx.property::<u8>("mode"), Some(&2));
            Ok(())
        })
        .unwrap();
        assert_eq!(ctx.property::<u8>("mode"), Some(&1));
        assert_eq!(ctx.property::<u16>("mode"), None);
    }

    #[test]
    fn cancellation() {
        let token = CancellationToken::new();
        let ctx = SerializationContext::default().with_cancellation(token.clone());
        assert!(ctx.check_cancelled().is_ok());
        token.cancel();
        assert!(matches!(ctx.check_cancelled(), Err(SerdeError::Cancelled)));
    }
}
