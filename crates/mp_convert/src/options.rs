use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::naming::NamingPolicy;

// -----------------------------------------------------------------------------
// SerializeDefaultValues

bitflags! {
    /// Which members are written even when they hold their declared default.
    ///
    /// The empty set elides every member whose value equals a known default.
    ///
    /// # Examples
    ///
    /// ```
    /// use mp_convert::SerializeDefaultValues;
    ///
    /// let flags: SerializeDefaultValues = serde_json::from_str("\"VALUE_TYPES | REQUIRED\"").unwrap();
    /// assert!(flags.contains(SerializeDefaultValues::REQUIRED));
    /// assert!(!flags.contains(SerializeDefaultValues::REFERENCE_TYPES));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct SerializeDefaultValues: u8 {
        /// Members of scalar, enum and nullable types.
        const VALUE_TYPES = 1 << 0;
        /// Members of object, collection, string and shared pointer types.
        const REFERENCE_TYPES = 1 << 1;
        /// Members marked [`required`](crate::shape::PropertyShape::required).
        /// Members bound to a constructor parameter without a default are
        /// always written.
        const REQUIRED = 1 << 2;
        /// Every member.
        const ALWAYS = Self::VALUE_TYPES.bits() | Self::REFERENCE_TYPES.bits() | Self::REQUIRED.bits();
    }
}

impl Default for SerializeDefaultValues {
    fn default() -> Self {
        Self::empty()
    }
}

// -----------------------------------------------------------------------------
// EnumFormat

/// Wire form of enum values.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumFormat {
    /// The underlying integer value.
    #[default]
    Numeric,
    /// The member name, falling back to the integer for unnamed values.
    Name,
}

// -----------------------------------------------------------------------------
// SerializerOptions

/// Configuration of a [`Serializer`](crate::Serializer).
///
/// Every field has a default, so partial configuration files load.
///
/// # Examples
///
/// ```
/// use mp_convert::{EnumFormat, SerializerOptions};
///
/// let options: SerializerOptions =
///     serde_json::from_str(r#"{ "max_depth": 16, "enum_format": "name" }"#).unwrap();
/// assert_eq!(options.max_depth, 16);
/// assert_eq!(options.enum_format, EnumFormat::Name);
/// assert!(!options.preserve_references);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerOptions {
    /// Deepest nesting accepted on read and produced on write.
    pub max_depth: usize,
    /// Encode repeated shared pointers as back-references.
    pub preserve_references: bool,
    pub enum_format: EnumFormat,
    pub default_values: SerializeDefaultValues,
    /// Transform applied to member names on the wire.
    pub naming_policy: NamingPolicy,
    /// Extension type code of back-reference tokens.
    pub object_reference_code: i8,
}

impl SerializerOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 64;
    pub const DEFAULT_OBJECT_REFERENCE_CODE: i8 = 1;
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            preserve_references: false,
            enum_format: EnumFormat::Numeric,
            default_values: SerializeDefaultValues::empty(),
            naming_policy: NamingPolicy::AsDeclared,
            object_reference_code: Self::DEFAULT_OBJECT_REFERENCE_CODE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_from_ron() {
        let options: SerializerOptions = ron::from_str(
            "(preserve_references: true, default_values: \"ALWAYS\", naming_policy: camel_case)",
        )
        .unwrap();
        assert!(options.preserve_references);
        assert_eq!(options.default_values, SerializeDefaultValues::ALWAYS);
        assert_eq!(options.naming_policy, NamingPolicy::CamelCase);
        assert_eq!(options.max_depth, SerializerOptions::DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn json_round_trip() {
        let options = SerializerOptions {
            object_reference_code: 7,
            default_values: SerializeDefaultValues::REQUIRED,
            ..Default::default()
        };
        let text = serde_json::to_string(&options).unwrap();
        let back: SerializerOptions = serde_json::from_str(&text).unwrap();
        assert_eq!(back, options);
    }

    #[test]
    fn empty_config_is_default() {
        let options: SerializerOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, SerializerOptions::default());
    }
}
