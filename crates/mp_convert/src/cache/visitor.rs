use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;

use mp_codec::{EncodeError, Formatter, Writer};
use mp_utils::TypeIdMap;

use super::converter_cache::downcast;
use super::deferred::{DeferredConverter, DeferredSlot};
use super::registry::FactoryRequest;
use super::shape_stack::ShapeStack;
use super::{ConverterCache, ErasedConverter};
use crate::converters::{EnumConverter, build_object};
use crate::shape::{ShapeKind, Shaped, TypeIdent, TypeShape};
use crate::union::UnionConverter;
use crate::{Converter, SerdeError, SerializerOptions};

/// Walks type shapes and compiles converters.
///
/// One visitor serves one top-level request of a [`ConverterCache`]. Types
/// it builds are kept in its own map until the request succeeds, then
/// committed to the cache together.
pub(crate) struct SynthesisVisitor<'c> {
    cache: &'c ConverterCache,
    built: TypeIdMap<ErasedConverter>,
    in_progress: TypeIdMap<Box<dyn core::any::Any + Send + Sync>>,
    stack: ShapeStack,
    order: Vec<TypeIdent>,
}

impl<'c> SynthesisVisitor<'c> {
    pub(crate) fn new(cache: &'c ConverterCache) -> Self {
        Self {
            cache,
            built: TypeIdMap::new(),
            in_progress: TypeIdMap::new(),
            stack: ShapeStack::new(),
            order: Vec::new(),
        }
    }

    /// Hands over the converters built so far, in completion order.
    pub(super) fn finish(self) -> (TypeIdMap<ErasedConverter>, Vec<TypeIdent>) {
        (self.built, self.order)
    }

    #[inline]
    pub(crate) fn options(&self) -> &'c SerializerOptions {
        self.cache.options()
    }

    #[inline]
    pub(crate) fn formatter(&self) -> &'static dyn Formatter {
        self.cache.formatter()
    }

    /// Returns the converter of `U`, building it if needed.
    ///
    /// A type that is already being built yields a handle that forwards to
    /// its converter once it is finished.
    pub(crate) fn resolve<U: Shaped>(&mut self) -> Result<Arc<dyn Converter<U>>, SerdeError> {
        let id = TypeId::of::<U>();

        if let Some(converter) = self.cache.lookup::<U>() {
            return Ok(converter);
        }
        if let Some(converter) = self.built.get(&id).and_then(downcast::<U>) {
            return Ok(converter);
        }
        if let Some(slot) = self
            .in_progress
            .get(&id)
            .and_then(|slot| slot.downcast_ref::<Arc<DeferredSlot<U>>>())
        {
            return Ok(Arc::new(DeferredConverter::new(Arc::clone(slot))));
        }

        let slot = Arc::new(DeferredSlot::<U>::new());
        self.in_progress.insert(id, Box::new(Arc::clone(&slot)));

        let shape = U::shape();
        let ident = shape.ident();
        self.stack.push(ident);
        let result = self.synthesize(shape).map_err(|err| self.stack.annotate(err));
        self.stack.pop();
        self.in_progress.remove(&id);

        let converter = result?;
        slot.fill(&converter);
        self.built.insert(id, Box::new(Arc::clone(&converter)));
        self.order.push(ident);
        Ok(converter)
    }

    fn synthesize<U: Shaped>(&mut self, mut shape: TypeShape<U>) -> Result<Arc<dyn Converter<U>>, SerdeError> {
        let request = FactoryRequest::new(shape.ident(), shape.kind.tag(), shape.attributes());

        let base = match self.cache.registry().resolve::<U>(&request) {
            Some(converter) => Some(converter),
            None => match shape.converter.take() {
                Some(converter) => Some(converter),
                None => match self.cache.builtin::<U>() {
                    Some(converter) => Some(converter),
                    None => self.dispatch(&shape)?,
                },
            },
        };

        match (shape.subtypes.take(), base) {
            (Some(union), base) => Ok(Arc::new(UnionConverter::build(self, union, base)?)),
            (None, Some(base)) => Ok(base),
            (None, None) => Err(SerdeError::shape::<U>(
                "no structure is known and no converter is declared, registered or built in",
            )),
        }
    }

    fn dispatch<U: Shaped>(&mut self, shape: &TypeShape<U>) -> Result<Option<Arc<dyn Converter<U>>>, SerdeError> {
        let converter = match &shape.kind {
            ShapeKind::Opaque => return Ok(None),
            ShapeKind::Object(object) => build_object(self, object)?,
            ShapeKind::Enumerable(enumerable) => enumerable.0.build(self)?,
            ShapeKind::Dictionary(dictionary) => dictionary.0.build(self)?,
            ShapeKind::Enum(enumeration) => Arc::new(EnumConverter::build(self, enumeration)?),
            ShapeKind::Nullable(nullable) => nullable.0.build(self)?,
            ShapeKind::Surrogate(surrogate) => surrogate.0.build(self)?,
            ShapeKind::Shared(shared) => shared.0.build(self)?,
        };
        Ok(Some(converter))
    }

    /// Whether `U` is handled by something other than synthesis from its
    /// structure: a registration or a declared converter.
    pub(crate) fn has_override<U: Shaped>(&self) -> bool {
        let shape = U::shape();
        let request = FactoryRequest::new(shape.ident(), shape.kind.tag(), shape.attributes());
        shape.has_converter() || self.cache.registry().resolve::<U>(&request).is_some()
    }

    /// Whether members of type `U` follow the reference-type default policy.
    pub(crate) fn is_reference_type<U: Shaped>(&self) -> bool {
        TypeId::of::<U>() == TypeId::of::<String>() || U::shape().kind.tag().is_reference()
    }

    /// Encodes a token once, for converters that copy it into every output.
    pub(crate) fn encode(
        &self,
        write: impl FnOnce(&mut Writer<'_>) -> Result<(), EncodeError>,
    ) -> Result<Box<[u8]>, SerdeError> {
        let mut out = Vec::new();
        write(&mut Writer::with_formatter(&mut out, self.formatter()))?;
        Ok(out.into_boxed_slice())
    }

    pub(crate) fn encode_name(&self, name: &str) -> Result<Box<[u8]>, SerdeError> {
        self.encode(|w| w.write_str(name))
    }
}
