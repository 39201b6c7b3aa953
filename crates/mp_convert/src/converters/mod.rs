//! Converters compiled from shapes.

// -----------------------------------------------------------------------------
// Modules

mod collection;
mod enums;
mod object;
mod primitive_vec;
mod property;
mod wrappers;

pub(crate) mod primitives;

// -----------------------------------------------------------------------------
// Exports

pub(crate) use enums::EnumConverter;
pub(crate) use object::build_object;
pub(crate) use property::{ParameterConverter, PropertyContext, PropertyConverter};
