//! Reference preservation.
//!
//! Shared pointers reached more than once in one top-level value are written
//! in full the first time and as a back-reference afterwards. Both sides
//! number targets in the order they are first met, so the ordinal of a
//! back-reference is the index of the target in the read table.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::marker::PhantomData;

use log::trace;
use mp_codec::{Reader, Writer};
use mp_utils::hash::HashMap;

use crate::shape::SharedPointer;
use crate::{Converter, SerdeError, SerializationContext};

// -----------------------------------------------------------------------------
// ReferenceTable

/// Targets seen by the current top-level operation.
#[derive(Default)]
pub(crate) struct ReferenceTable {
    /// Ordinal of each written target, keyed by pointer type and address.
    /// The pointer itself is held until the table is cleared, so its
    /// address cannot be handed to another target meanwhile.
    written: HashMap<(TypeId, usize), (u32, Box<dyn Any + Send + Sync>)>,
    /// Read targets by ordinal. `None` while the target is being read.
    read: Vec<Option<Box<dyn Any + Send + Sync>>>,
}

impl ReferenceTable {
    pub(crate) fn clear(&mut self) {
        self.written.clear();
        self.read.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> (usize, usize) {
        (self.written.len(), self.read.len())
    }
}

// -----------------------------------------------------------------------------
// ReferenceConverter

/// Writes repeated targets as back-references and restores aliasing on
/// read.
pub(crate) struct ReferenceConverter<P: SharedPointer> {
    target: Arc<dyn Converter<P::Target>>,
    _marker: PhantomData<fn() -> P>,
}

impl<P: SharedPointer> ReferenceConverter<P> {
    pub(crate) fn new(target: Arc<dyn Converter<P::Target>>) -> Self {
        Self {
            target,
            _marker: PhantomData,
        }
    }

    fn write_back_reference(writer: &mut Writer<'_>, code: i8, ordinal: u32) -> Result<(), SerdeError> {
        let mut payload = Vec::with_capacity(5);
        writer.formatter().write_unsigned(&mut payload, u64::from(ordinal));
        Ok(writer.write_extension(code, &payload)?)
    }

    fn resolve(reader: &mut Reader<'_>, ctx: &SerializationContext) -> Result<P, SerdeError> {
        let start = *reader;
        let extension = reader.read_extension()?;
        let ordinal = Reader::with_deformatter(extension.data, reader.streaming().deformatter())
            .read_int::<u32>()
            .map_err(|_| SerdeError::invalid(&start, "malformed back-reference"))?;
        trace!("back-reference to ordinal {ordinal}");

        match ctx.references.read.get(ordinal as usize) {
            Some(Some(target)) => target.downcast_ref::<P>().cloned().ok_or_else(|| {
                SerdeError::invalid(&start, alloc::format!("back-reference {ordinal} points to a value of another type"))
            }),
            Some(None) => Err(SerdeError::invalid(
                &start,
                alloc::format!("back-reference {ordinal} points to a value that is still being read"),
            )),
            None => Err(SerdeError::invalid(&start, alloc::format!("back-reference {ordinal} is unknown"))),
        }
    }
}

impl<P: SharedPointer> Converter<P> for ReferenceConverter<P> {
    fn write(&self, writer: &mut Writer<'_>, value: &P, ctx: &mut SerializationContext) -> Result<(), SerdeError> {
        let key = (TypeId::of::<P>(), value.identity());
        if let Some(&(ordinal, _)) = ctx.references.written.get(&key) {
            trace!("writing back-reference to ordinal {ordinal}");
            return Self::write_back_reference(writer, ctx.reference_code(), ordinal);
        }

        // The ordinal is taken before the target is written so cycles find it.
        let ordinal = ctx.references.written.len() as u32;
        ctx.references.written.insert(key, (ordinal, Box::new(value.clone())));
        value.with_target(|target| self.target.write(writer, target, ctx))
    }

    fn read(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<P, SerdeError> {
        if let Some(header) = reader.peek_extension_header()?
            && header.type_code == ctx.reference_code()
        {
            return Self::resolve(reader, ctx);
        }

        let ordinal = ctx.references.read.len();
        ctx.references.read.push(None);

        match P::placeholder() {
            Some(pointer) => {
                ctx.references.read[ordinal] = Some(Box::new(pointer.clone()));
                let target = self.target.read(reader, ctx)?;
                pointer.fill(target);
                Ok(pointer)
            }
            None => {
                let pointer = P::from_target(self.target.read(reader, ctx)?);
                ctx.references.read[ordinal] = Some(Box::new(pointer.clone()));
                Ok(pointer)
            }
        }
    }
}

// -----------------------------------------------------------------------------
// PointerConverter

/// Writes every target in full. Used when references are not preserved.
pub(crate) struct PointerConverter<P: SharedPointer> {
    target: Arc<dyn Converter<P::Target>>,
    _marker: PhantomData<fn() -> P>,
}

impl<P: SharedPointer> PointerConverter<P> {
    pub(crate) fn new(target: Arc<dyn Converter<P::Target>>) -> Self {
        Self {
            target,
            _marker: PhantomData,
        }
    }
}

impl<P: SharedPointer> Converter<P> for PointerConverter<P> {
    fn write(&self, writer: &mut Writer<'_>, value: &P, ctx: &mut SerializationContext) -> Result<(), SerdeError> {
        value.with_target(|target| self.target.write(writer, target, ctx))
    }

    fn read(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<P, SerdeError> {
        Ok(P::from_target(self.target.read(reader, ctx)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::primitives::IntConverter;

    fn converter() -> ReferenceConverter<Arc<u32>> {
        ReferenceConverter::new(Arc::new(IntConverter))
    }

    #[test]
    fn repeated_targets_become_back_references() {
        let conv = converter();
        let shared = Arc::new(7u32);
        let mut ctx = SerializationContext::default();
        let mut out = Vec::new();
        let mut writer = Writer::new(&mut out);
        conv.write(&mut writer, &shared, &mut ctx).unwrap();
        conv.write(&mut writer, &Arc::new(7u32), &mut ctx).unwrap();
        conv.write(&mut writer, &shared, &mut ctx).unwrap();
        // fixext1, code 1, ordinal 0
        assert_eq!(out, [0x07, 0x07, 0xd4, 0x01, 0x00]);
        assert_eq!(ctx.references.len(), (2, 0));

        let mut ctx = SerializationContext::default();
        let mut reader = Reader::new(&out);
        let a = conv.read(&mut reader, &mut ctx).unwrap();
        let b = conv.read(&mut reader, &mut ctx).unwrap();
        let c = conv.read(&mut reader, &mut ctx).unwrap();
        assert!(Arc::ptr_eq(&a, &c));
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn written_targets_stay_alive_until_cleared() {
        let conv = converter();
        let mut ctx = SerializationContext::default();
        let mut out = Vec::new();
        let mut writer = Writer::new(&mut out);
        // Each temporary is dropped right after writing; its address must
        // not be reused by the next one.
        for n in 1..=3u32 {
            conv.write(&mut writer, &Arc::new(n), &mut ctx).unwrap();
        }
        assert_eq!(out, [0x01, 0x02, 0x03]);
        assert_eq!(ctx.references.len(), (3, 0));

        let shared = Arc::new(9u32);
        conv.write(&mut Writer::new(&mut Vec::new()), &shared, &mut ctx).unwrap();
        assert_eq!(Arc::strong_count(&shared), 2);
        ctx.reset_for_next_value();
        assert_eq!(Arc::strong_count(&shared), 1);
    }

    #[test]
    fn unknown_ordinal_is_rejected() {
        let conv = converter();
        let mut ctx = SerializationContext::default();
        let err = conv.read(&mut Reader::new(&[0xd4, 0x01, 0x03]), &mut ctx).unwrap_err();
        assert!(matches!(err, SerdeError::InvalidData { offset: 0, .. }));
    }

    #[test]
    fn clear_forgets_everything() {
        let conv = converter();
        let mut ctx = SerializationContext::default();
        let mut out = Vec::new();
        conv.write(&mut Writer::new(&mut out), &Arc::new(1), &mut ctx).unwrap();
        ctx.reset_for_next_value();
        assert_eq!(ctx.references.len(), (0, 0));
    }
}
