use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use std::time::SystemTime;

use mp_codec::Timestamp;
use mp_utils::TypeIdMap;

use super::ErasedConverter;
use crate::Converter;
use crate::converters::primitives::{
    BoolConverter, CharConverter, FloatConverter, IntConverter, StringConverter,
    SystemTimeConverter, TimestampConverter, UnitConverter,
};

fn add<T: 'static>(map: &mut TypeIdMap<ErasedConverter>, converter: impl Converter<T>) {
    let converter: Arc<dyn Converter<T>> = Arc::new(converter);
    map.insert_type::<T>(Box::new(converter));
}

/// Hand-written converters of scalar types, skipped by synthesis.
pub(super) fn builtin_converters() -> TypeIdMap<ErasedConverter> {
    let mut map = TypeIdMap::new();

    add::<()>(&mut map, UnitConverter);
    add::<bool>(&mut map, BoolConverter);
    add::<char>(&mut map, CharConverter);

    add::<u8>(&mut map, IntConverter);
    add::<u16>(&mut map, IntConverter);
    add::<u32>(&mut map, IntConverter);
    add::<u64>(&mut map, IntConverter);
    add::<usize>(&mut map, IntConverter);
    add::<i8>(&mut map, IntConverter);
    add::<i16>(&mut map, IntConverter);
    add::<i32>(&mut map, IntConverter);
    add::<i64>(&mut map, IntConverter);
    add::<isize>(&mut map, IntConverter);

    add::<f32>(&mut map, FloatConverter);
    add::<f64>(&mut map, FloatConverter);

    add::<String>(&mut map, StringConverter);
    add::<Timestamp>(&mut map, TimestampConverter);
    add::<SystemTime>(&mut map, SystemTimeConverter);

    map
}
