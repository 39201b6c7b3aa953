use alloc::borrow::Cow;
use alloc::string::String;

use serde::{Deserialize, Serialize};

/// Transform applied to declared member names when they are written.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingPolicy {
    #[default]
    AsDeclared,
    /// `first_name` becomes `firstName`.
    CamelCase,
    /// `first_name` becomes `FirstName`.
    PascalCase,
}

impl NamingPolicy {
    /// Applies the policy to a declared name.
    ///
    /// # Examples
    ///
    /// ```
    /// use mp_convert::NamingPolicy;
    ///
    /// assert_eq!(NamingPolicy::CamelCase.apply("max_depth"), "maxDepth");
    /// assert_eq!(NamingPolicy::PascalCase.apply("max_depth"), "MaxDepth");
    /// assert_eq!(NamingPolicy::AsDeclared.apply("max_depth"), "max_depth");
    /// ```
    pub fn apply<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match self {
            Self::AsDeclared => Cow::Borrowed(name),
            Self::CamelCase => Cow::Owned(to_camel_case(name)),
            Self::PascalCase => Cow::Owned(to_pascal_case(name)),
        }
    }
}

fn convert(name: &str, upper_first: bool) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = upper_first;
    let mut first = true;
    for ch in name.chars() {
        if ch == '_' && !out.is_empty() {
            upper_next = true;
            continue;
        }
        if first {
            first = false;
            if upper_first {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            upper_next = false;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// `first_name` and `FirstName` both become `firstName`.
pub fn to_camel_case(name: &str) -> String {
    convert(name, false)
}

/// `first_name` and `firstName` both become `FirstName`.
pub fn to_pascal_case(name: &str) -> String {
    convert(name, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transforms() {
        assert_eq!(to_camel_case("Name"), "name");
        assert_eq!(to_pascal_case("name"), "Name");
        assert_eq!(to_camel_case("a_b_c"), "aBC");
        assert_eq!(to_pascal_case("userId"), "UserId");
        assert_eq!(to_camel_case("_private"), "_private");
        assert_eq!(to_camel_case(""), "");
    }
}
