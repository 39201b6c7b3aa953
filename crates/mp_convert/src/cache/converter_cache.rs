use alloc::sync::Arc;
use core::fmt;
use std::sync::{Mutex, PoisonError, RwLock};

use log::{debug, trace};
use mp_codec::{Formatter, MSGPACK};
use mp_utils::TypeIdMap;

use super::builtin::builtin_converters;
use super::{ConverterRegistry, ErasedConverter, SynthesisVisitor};
use crate::shape::Shaped;
use crate::{Converter, SerdeError, SerializerOptions};

/// Memoizes one converter per type.
///
/// Lookups of committed converters take a shared lock only. Synthesis is
/// serialized by a separate lock, so concurrent first requests for the same
/// type build it once and all observe the same instance.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use mp_convert::{ConverterCache, ConverterRegistry, SerializerOptions};
///
/// let cache = ConverterCache::new(SerializerOptions::default(), ConverterRegistry::new());
/// let a = cache.get_or_create::<Vec<u32>>().unwrap();
/// let b = cache.get_or_create::<Vec<u32>>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
pub struct ConverterCache {
    options: SerializerOptions,
    formatter: &'static dyn Formatter,
    registry: ConverterRegistry,
    builtins: TypeIdMap<ErasedConverter>,
    converters: RwLock<TypeIdMap<ErasedConverter>>,
    build_lock: Mutex<()>,
}

impl ConverterCache {
    pub fn new(options: SerializerOptions, registry: ConverterRegistry) -> Self {
        Self::with_formatter(options, registry, &MSGPACK)
    }

    /// A cache whose synthesized converters pre-encode names with `formatter`.
    pub fn with_formatter(
        options: SerializerOptions,
        registry: ConverterRegistry,
        formatter: &'static dyn Formatter,
    ) -> Self {
        Self {
            options,
            formatter,
            registry,
            builtins: builtin_converters(),
            converters: RwLock::new(TypeIdMap::new()),
            build_lock: Mutex::new(()),
        }
    }

    #[inline]
    pub fn options(&self) -> &SerializerOptions {
        &self.options
    }

    #[inline]
    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    #[inline]
    pub(crate) fn formatter(&self) -> &'static dyn Formatter {
        self.formatter
    }

    /// Number of committed converters.
    pub fn len(&self) -> usize {
        self.converters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the converter of `T`, synthesizing it on first use.
    ///
    /// Every type reached while synthesizing `T` is committed together with
    /// it. On failure nothing is committed.
    pub fn get_or_create<T: Shaped>(&self) -> Result<Arc<dyn Converter<T>>, SerdeError> {
        if let Some(converter) = self.lookup::<T>() {
            trace!("converter cache hit for `{}`", core::any::type_name::<T>());
            return Ok(converter);
        }

        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Another thread may have finished while we waited.
        if let Some(converter) = self.lookup::<T>() {
            return Ok(converter);
        }

        let mut visitor = SynthesisVisitor::new(self);
        let converter = visitor.resolve::<T>()?;
        let (built, order) = visitor.finish();

        let mut converters = self.converters.write().unwrap_or_else(PoisonError::into_inner);
        for ident in &order {
            debug!("synthesized converter for `{ident}`");
        }
        converters.merge(built);

        Ok(converter)
    }

    /// The committed converter of `T`, if any.
    pub(crate) fn lookup<T: 'static>(&self) -> Option<Arc<dyn Converter<T>>> {
        downcast::<T>(
            self.converters
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get_type::<T>()?,
        )
    }

    pub(crate) fn builtin<T: 'static>(&self) -> Option<Arc<dyn Converter<T>>> {
        downcast::<T>(self.builtins.get_type::<T>()?)
    }
}

#[inline]
pub(super) fn downcast<T: 'static>(erased: &ErasedConverter) -> Option<Arc<dyn Converter<T>>> {
    erased.downcast_ref::<Arc<dyn Converter<T>>>().cloned()
}

impl fmt::Debug for ConverterCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterCache")
            .field("options", &self.options)
            .field("registry", &self.registry)
            .field("converters", &self.len())
            .finish_non_exhaustive()
    }
}
