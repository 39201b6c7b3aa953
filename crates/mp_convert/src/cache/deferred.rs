use alloc::sync::{Arc, Weak};
use std::sync::OnceLock;

use mp_codec::{IncrementalReader, Reader, Writer};

use crate::{Converter, SerdeError, SerializationContext};

/// The converter of a type that is still being synthesized.
///
/// Filled once synthesis of the type finishes. Holds a weak handle so that
/// cyclic converter graphs are owned by the cache alone.
pub(super) struct DeferredSlot<T: 'static> {
    target: OnceLock<Weak<dyn Converter<T>>>,
}

impl<T: 'static> DeferredSlot<T> {
    pub fn new() -> Self {
        Self {
            target: OnceLock::new(),
        }
    }

    pub fn fill(&self, converter: &Arc<dyn Converter<T>>) {
        // A slot is only filled by the visitor that created it.
        let _ = self.target.set(Arc::downgrade(converter));
    }
}

/// Forwards to the converter held by a [`DeferredSlot`].
pub(super) struct DeferredConverter<T: 'static> {
    slot: Arc<DeferredSlot<T>>,
}

impl<T: 'static> DeferredConverter<T> {
    pub fn new(slot: Arc<DeferredSlot<T>>) -> Self {
        Self { slot }
    }

    fn target(&self) -> Result<Arc<dyn Converter<T>>, SerdeError> {
        match self.slot.target.get() {
            Some(weak) => weak.upgrade().ok_or_else(|| {
                SerdeError::misuse(alloc::format!(
                    "recursive converter for `{}` outlived its cache",
                    core::any::type_name::<T>()
                ))
            }),
            None => Err(SerdeError::misuse(alloc::format!(
                "recursive converter for `{}` used before synthesis finished",
                core::any::type_name::<T>()
            ))),
        }
    }
}

impl<T: Send + Sync + 'static> Converter<T> for DeferredConverter<T> {
    fn write(
        &self,
        writer: &mut Writer<'_>,
        value: &T,
        ctx: &mut SerializationContext,
    ) -> Result<(), SerdeError> {
        self.target()?.write(writer, value, ctx)
    }

    fn read(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<T, SerdeError> {
        self.target()?.read(reader, ctx)
    }

    fn read_incremental(
        &self,
        input: &mut IncrementalReader,
        ctx: &mut SerializationContext,
    ) -> Result<Option<T>, SerdeError> {
        self.target()?.read_incremental(input, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    struct Nil;

    impl Converter<()> for Nil {
        fn write(&self, w: &mut Writer<'_>, _: &(), _: &mut SerializationContext) -> Result<(), SerdeError> {
            w.write_nil();
            Ok(())
        }

        fn read(&self, r: &mut Reader<'_>, _: &mut SerializationContext) -> Result<(), SerdeError> {
            Ok(r.read_nil()?)
        }
    }

    #[test]
    fn forwards_once_filled() {
        let slot = Arc::new(DeferredSlot::<()>::new());
        let deferred = DeferredConverter::new(slot.clone());
        let mut ctx = SerializationContext::default();
        let mut out = alloc::vec::Vec::new();

        let err = deferred.write(&mut Writer::new(&mut out), &(), &mut ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Misuse);

        let target: Arc<dyn Converter<()>> = Arc::new(Nil);
        slot.fill(&target);
        deferred.write(&mut Writer::new(&mut out), &(), &mut ctx).unwrap();
        assert_eq!(out, [0xc0]);

        drop(target);
        assert!(deferred.read(&mut Reader::new(&[0xc0]), &mut ctx).is_err());
    }
}
