use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::any::Any;

use log::warn;
use mp_codec::{Reader, Writer};
use mp_utils::hash::HashMap;
use mp_utils::hash::hashbrown::hash_map::Entry;

use super::property::{ParameterConverter, PropertyContext, PropertyConverter};
use crate::cache::SynthesisVisitor;
use crate::naming::{to_camel_case, to_pascal_case};
use crate::shape::{Arguments, ConstructorShape, ObjectShape, Shaped};
use crate::{Converter, SerdeError, SerializationContext};

// -----------------------------------------------------------------------------
// Layout

/// Where a wire member goes on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Member(usize),
    Parameter(usize),
}

struct Member<T> {
    name: &'static str,
    /// Encoded wire name, for the map form.
    wire_name: Box<[u8]>,
    /// Linked constructor parameter.
    parameter: Option<usize>,
    property: Box<dyn PropertyConverter<T>>,
}

impl<T> Member<T> {
    #[inline]
    fn target(&self, index: usize) -> Target {
        match self.parameter {
            Some(parameter) => Target::Parameter(parameter),
            None => Target::Member(index),
        }
    }
}

struct Parameter {
    name: &'static str,
    converter: Box<dyn ParameterConverter>,
}

enum Layout {
    /// Map keyed by wire name.
    Named { lookup: HashMap<String, Target> },
    /// Array indexed by member key. `slots[key]` is the member index.
    Positional { slots: Vec<Option<usize>> },
}

enum Construction<T> {
    None,
    Default(fn() -> T),
    Parameterized {
        parameters: Vec<Parameter>,
        build: fn(&mut Arguments) -> Result<T, SerdeError>,
    },
}

/// Reads and writes an object member by member.
struct ObjectConverter<T> {
    members: Vec<Member<T>>,
    layout: Layout,
    construction: Construction<T>,
}

// -----------------------------------------------------------------------------
// Synthesis

/// Compiles the converter of an object shape.
pub(crate) fn build_object<T: Shaped>(
    visitor: &mut SynthesisVisitor<'_>,
    shape: &ObjectShape<T>,
) -> Result<Arc<dyn Converter<T>>, SerdeError> {
    let parameters = match &shape.constructor {
        ConstructorShape::Parameterized(ctor) => ctor.parameters.as_slice(),
        _ => &[],
    };

    // Parameters bind to members of the same name, ignoring case.
    let links: Vec<Option<usize>> = shape
        .properties
        .iter()
        .map(|property| {
            parameters
                .iter()
                .position(|p| p.name().eq_ignore_ascii_case(property.name()))
        })
        .collect();
    let predicates: Vec<Option<Box<dyn Any + Send + Sync>>> =
        parameters.iter().map(|p| p.default_predicate()).collect();
    // A linked member's declared converter reads the parameter too.
    let overrides: Vec<Option<Box<dyn Any + Send + Sync>>> = (0..parameters.len())
        .map(|index| {
            shape
                .properties
                .iter()
                .zip(&links)
                .filter(|(_, link)| **link == Some(index))
                .find_map(|(property, _)| property.converter_override())
        })
        .collect();

    let policy = visitor.options().naming_policy;
    let wire_names: Vec<String> = shape
        .properties
        .iter()
        .map(|p| policy.apply(p.name()).into_owned())
        .collect();

    let mut members = Vec::with_capacity(shape.properties.len());
    for ((property, &parameter), wire_name) in shape.properties.iter().zip(&links).zip(&wire_names) {
        let context = match parameter {
            Some(index) => PropertyContext {
                linked: true,
                parameter_default: predicates[index].as_deref(),
                required: parameters[index].is_required(),
            },
            None => PropertyContext::default(),
        };
        members.push(Member {
            name: property.name(),
            wire_name: visitor.encode_name(wire_name)?,
            parameter,
            property: property.build(visitor, context)?,
        });
    }

    let keys: Vec<Option<u32>> = shape.properties.iter().map(|p| p.key()).collect();
    let layout = if !keys.is_empty() && keys.iter().all(Option::is_some) {
        positional_layout::<T>(&keys)?
    } else if keys.iter().any(Option::is_some) {
        return Err(SerdeError::shape::<T>("mixes keyed and named members"));
    } else {
        named_layout::<T>(&members, wire_names, parameters.iter().map(|p| p.name()))?
    };

    let construction = match &shape.constructor {
        ConstructorShape::None => Construction::None,
        ConstructorShape::Default(ctor) => Construction::Default(*ctor),
        ConstructorShape::Parameterized(ctor) => {
            if matches!(layout, Layout::Positional { .. }) {
                // Positional parameters are only reachable through a member.
                for (index, param) in ctor.parameters.iter().enumerate() {
                    if param.is_required() && !links.contains(&Some(index)) {
                        return Err(SerdeError::shape::<T>(alloc::format!(
                            "required parameter `{}` has no keyed member",
                            param.name()
                        )));
                    }
                }
            }
            let mut built = Vec::with_capacity(ctor.parameters.len());
            for (param, converter) in ctor.parameters.iter().zip(&overrides) {
                built.push(Parameter {
                    name: param.name(),
                    converter: param.build(visitor, converter.as_deref())?,
                });
            }
            Construction::Parameterized {
                parameters: built,
                build: ctor.build,
            }
        }
    };

    Ok(Arc::new(ObjectConverter {
        members,
        layout,
        construction,
    }))
}

fn positional_layout<T>(keys: &[Option<u32>]) -> Result<Layout, SerdeError> {
    let len = keys.iter().flatten().max().map_or(0, |&max| max as usize + 1);
    let mut slots = vec![None; len];
    for (index, key) in keys.iter().enumerate() {
        let Some(key) = *key else { continue };
        let slot = &mut slots[key as usize];
        if slot.is_some() {
            return Err(SerdeError::shape::<T>(alloc::format!("key {key} is used by more than one member")));
        }
        *slot = Some(index);
    }
    Ok(Layout::Positional { slots })
}

fn named_layout<T>(
    members: &[Member<T>],
    wire_names: Vec<String>,
    parameters: impl Iterator<Item = &'static str>,
) -> Result<Layout, SerdeError> {
    let mut lookup = HashMap::<String, Target>::default();

    for ((index, member), wire_name) in members.iter().enumerate().zip(wire_names) {
        if lookup.insert(wire_name, member.target(index)).is_some() {
            return Err(SerdeError::shape::<T>(alloc::format!(
                "more than one member is written as `{}`",
                member.name
            )));
        }
    }

    // Wire names of other conventions still reach constructor parameters.
    for (index, name) in parameters.enumerate() {
        let camel = to_camel_case(name);
        let pascal = to_pascal_case(name);
        let aliases = if camel == pascal { vec![camel] } else { vec![camel, pascal] };
        for alias in aliases {
            match lookup.entry(alias) {
                Entry::Vacant(entry) => {
                    entry.insert(Target::Parameter(index));
                }
                Entry::Occupied(entry) if *entry.get() != Target::Parameter(index) => {
                    warn!(
                        "wire name `{}` of `{}` matches parameter `{name}` and another member; the first registration is kept",
                        entry.key(),
                        core::any::type_name::<T>(),
                    );
                }
                Entry::Occupied(_) => {}
            }
        }
    }

    Ok(Layout::Named { lookup })
}

// -----------------------------------------------------------------------------
// Execution

/// Values collected before a parameterized constructor runs.
struct Pending {
    arguments: Vec<Option<Box<dyn Any + Send>>>,
    deferred: Vec<(usize, Box<dyn Any + Send>)>,
}

impl<T: Send + Sync + 'static> ObjectConverter<T> {
    fn duplicate(reader: &Reader<'_>, name: &str) -> SerdeError {
        SerdeError::invalid(reader, alloc::format!("member `{name}` appears more than once"))
    }

    /// Reads the member routed to `target`, or skips it.
    fn read_member(
        &self,
        reader: &mut Reader<'_>,
        target: Option<Target>,
        value: &mut T,
        seen: &mut [bool],
        ctx: &mut SerializationContext,
    ) -> Result<(), SerdeError> {
        match target {
            Some(Target::Member(index)) if self.members[index].property.can_set() => {
                if core::mem::replace(&mut seen[index], true) {
                    return Err(Self::duplicate(reader, self.members[index].name));
                }
                self.members[index].property.read_into(reader, value, ctx)
            }
            _ => Ok(reader.skip()?),
        }
    }

    fn read_pending(
        &self,
        reader: &mut Reader<'_>,
        target: Option<Target>,
        parameters: &[Parameter],
        pending: &mut Pending,
        seen: &mut [bool],
        ctx: &mut SerializationContext,
    ) -> Result<(), SerdeError> {
        match target {
            Some(Target::Parameter(index)) => {
                if pending.arguments[index].is_some() {
                    return Err(Self::duplicate(reader, parameters[index].name));
                }
                pending.arguments[index] = Some(parameters[index].converter.read(reader, ctx)?);
                Ok(())
            }
            Some(Target::Member(index)) if self.members[index].property.can_set() => {
                if core::mem::replace(&mut seen[index], true) {
                    return Err(Self::duplicate(reader, self.members[index].name));
                }
                let value = self.members[index].property.read_boxed(reader, ctx)?;
                pending.deferred.push((index, value));
                Ok(())
            }
            _ => Ok(reader.skip()?),
        }
    }

    fn construct(
        &self,
        reader: &Reader<'_>,
        parameters: &[Parameter],
        build: fn(&mut Arguments) -> Result<T, SerdeError>,
        pending: Pending,
    ) -> Result<T, SerdeError> {
        let mut slots = pending.arguments;
        for (slot, parameter) in slots.iter_mut().zip(parameters) {
            if slot.is_none() {
                match parameter.converter.default_value() {
                    Some(default) => *slot = Some(default),
                    None => {
                        return Err(SerdeError::invalid(
                            reader,
                            alloc::format!("required member `{}` is missing", parameter.name),
                        ));
                    }
                }
            }
        }

        let mut value = build(&mut Arguments::new(slots))?;
        for (index, deferred) in pending.deferred {
            self.members[index].property.apply_boxed(&mut value, deferred)?;
        }
        Ok(value)
    }

    fn target_at(&self, reader: &mut Reader<'_>, position: usize) -> Result<Option<Target>, SerdeError> {
        match &self.layout {
            Layout::Named { lookup } => {
                let name = reader.read_str()?;
                Ok(lookup.get(name).copied())
            }
            Layout::Positional { slots } => Ok(slots
                .get(position)
                .copied()
                .flatten()
                .map(|index| self.members[index].target(index))),
        }
    }

    fn read_header(&self, reader: &mut Reader<'_>) -> Result<u32, SerdeError> {
        Ok(match self.layout {
            Layout::Named { .. } => reader.read_map_header()?,
            Layout::Positional { .. } => reader.read_array_header()?,
        })
    }
}

impl<T: Send + Sync + 'static> Converter<T> for ObjectConverter<T> {
    fn write(&self, writer: &mut Writer<'_>, value: &T, ctx: &mut SerializationContext) -> Result<(), SerdeError> {
        ctx.nested(|ctx| match &self.layout {
            Layout::Named { .. } => {
                let count = self
                    .members
                    .iter()
                    .filter(|m| m.property.should_write(value))
                    .count();
                writer.write_map_header(count)?;
                for member in &self.members {
                    if member.property.should_write(value) {
                        writer.write_raw(&member.wire_name);
                        member.property.write(writer, value, ctx)?;
                    }
                }
                Ok(())
            }
            Layout::Positional { slots } => {
                // Only trailing members holding their default are dropped.
                let len = slots
                    .iter()
                    .rposition(|slot| slot.is_some_and(|index| self.members[index].property.should_write(value)))
                    .map_or(0, |last| last + 1);
                writer.write_array_header(len)?;
                for slot in &slots[..len] {
                    match slot {
                        Some(index) => self.members[*index].property.write(writer, value, ctx)?,
                        None => writer.write_nil(),
                    }
                }
                Ok(())
            }
        })
    }

    fn read(&self, reader: &mut Reader<'_>, ctx: &mut SerializationContext) -> Result<T, SerdeError> {
        ctx.nested(|ctx| {
            let mut seen = vec![false; self.members.len()];
            match &self.construction {
                Construction::None => Err(SerdeError::shape::<T>("has no constructor and can only be written")),
                Construction::Default(ctor) => {
                    let len = self.read_header(reader)?;
                    let mut value = ctor();
                    for position in 0..len as usize {
                        let target = self.target_at(reader, position)?;
                        self.read_member(reader, target, &mut value, &mut seen, ctx)?;
                    }
                    Ok(value)
                }
                Construction::Parameterized { parameters, build } => {
                    let len = self.read_header(reader)?;
                    let mut pending = Pending {
                        arguments: parameters.iter().map(|_| None).collect(),
                        deferred: Vec::new(),
                    };
                    for position in 0..len as usize {
                        let target = self.target_at(reader, position)?;
                        self.read_pending(reader, target, parameters, &mut pending, &mut seen, ctx)?;
                    }
                    self.construct(reader, parameters, *build, pending)
                }
            }
        })
    }
}
