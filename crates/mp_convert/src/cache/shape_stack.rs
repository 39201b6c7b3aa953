use alloc::vec::Vec;
use core::fmt;

use crate::SerdeError;
use crate::shape::TypeIdent;

/// The chain of types currently being synthesized, outermost first.
#[derive(Default, Clone)]
pub(super) struct ShapeStack {
    stack: Vec<TypeIdent>,
}

impl ShapeStack {
    pub const fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn push(&mut self, ident: TypeIdent) {
        self.stack.push(ident);
    }

    pub fn pop(&mut self) {
        self.stack.pop();
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, TypeIdent> {
        self.stack.iter()
    }

    /// Records the current chain in a shape error that has none yet.
    pub fn annotate(&self, err: SerdeError) -> SerdeError {
        match err {
            SerdeError::Shape {
                type_name,
                message,
                path,
            } if path.is_empty() && self.len() > 1 => SerdeError::Shape {
                type_name,
                message,
                path: alloc::format!("{self:?}"),
            },
            other => other,
        }
    }
}

impl fmt::Debug for ShapeStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.iter();

        if let Some(first) = iter.next() {
            write!(f, "`{first}`")?;
        }

        for ident in iter {
            write!(f, " -> `{ident}`")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotates_only_nested_failures() {
        let mut stack = ShapeStack::new();
        stack.push(TypeIdent::of::<u8>());
        let err = stack.annotate(SerdeError::shape::<u8>("x"));
        assert!(matches!(&err, SerdeError::Shape { path, .. } if path.is_empty()));

        stack.push(TypeIdent::of::<u16>());
        let err = stack.annotate(SerdeError::shape::<u16>("x"));
        assert!(matches!(&err, SerdeError::Shape { path, .. } if path == "`u8` -> `u16`"));

        // The innermost annotation is kept.
        stack.pop();
        let err = stack.annotate(err);
        assert!(matches!(&err, SerdeError::Shape { path, .. } if path == "`u8` -> `u16`"));
    }
}
