use alloc::vec::Vec;

/// A named value of an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumMember {
    pub name: &'static str,
    pub value: i64,
}

impl EnumMember {
    #[inline]
    pub const fn new(name: &'static str, value: i64) -> Self {
        Self { name, value }
    }
}

/// A C-like enum, written as its integer value or its member name.
///
/// # Examples
///
/// ```
/// use mp_convert::shape::{EnumMember, EnumShape, Shaped, TypeShape};
/// use mp_convert::{EnumFormat, Serializer, SerializerOptions};
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Level { Low = 1, High = 2 }
///
/// impl Shaped for Level {
///     fn shape() -> TypeShape<Self> {
///         TypeShape::enumeration(EnumShape::new(
///             [EnumMember::new("Low", 1), EnumMember::new("High", 2)],
///             |l: &Level| *l as i64,
///             |v| match v { 1 => Some(Level::Low), 2 => Some(Level::High), _ => None },
///         ))
///     }
/// }
///
/// let numeric = Serializer::new();
/// assert_eq!(numeric.serialize(&Level::High).unwrap(), [0x02]);
///
/// let named = Serializer::with_options(SerializerOptions {
///     enum_format: EnumFormat::Name,
///     ..Default::default()
/// });
/// let bytes = named.serialize(&Level::Low).unwrap();
/// assert_eq!(bytes, [0xa3, b'L', b'o', b'w']);
/// // both forms are accepted on read
/// assert_eq!(numeric.deserialize::<Level>(&bytes).unwrap(), Level::Low);
/// ```
pub struct EnumShape<T: 'static> {
    pub(crate) members: Vec<EnumMember>,
    pub(crate) to_value: fn(&T) -> i64,
    pub(crate) from_value: fn(i64) -> Option<T>,
}

impl<T: 'static> EnumShape<T> {
    pub fn new(
        members: impl IntoIterator<Item = EnumMember>,
        to_value: fn(&T) -> i64,
        from_value: fn(i64) -> Option<T>,
    ) -> Self {
        Self {
            members: members.into_iter().collect(),
            to_value,
            from_value,
        }
    }

    #[inline]
    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }
}
