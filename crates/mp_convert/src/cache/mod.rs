//! Converter memoization and synthesis.
//!
//! A [`ConverterCache`] owns one converter per type. The first request for a
//! type runs a [`SynthesisVisitor`] over its shape, which resolves every
//! nested type through the same cache and commits the whole converter graph
//! at once.

// -----------------------------------------------------------------------------
// Modules

mod builtin;
mod converter_cache;
mod deferred;
mod registry;
mod shape_stack;
mod visitor;

// -----------------------------------------------------------------------------
// Exports

pub use converter_cache::ConverterCache;
pub use registry::{ConverterFactory, ConverterRegistry, FactoryConverter, FactoryRequest};

pub(crate) use visitor::SynthesisVisitor;

use alloc::boxed::Box;
use core::any::Any;

/// An `Arc<dyn Converter<T>>` with `T` erased.
pub(crate) type ErasedConverter = Box<dyn Any + Send + Sync>;
