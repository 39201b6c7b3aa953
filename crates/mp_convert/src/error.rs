use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use mp_codec::{DecodeError, EncodeError, Reader, RentalError};
use thiserror::Error;

// -----------------------------------------------------------------------------
// ErrorKind

/// The class of a [`SerdeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The bytes do not match the expected structure.
    Format,
    /// A converter could not be synthesized for a type.
    Shape,
    /// Nesting exceeded the configured maximum depth.
    DepthLimit,
    /// A converter broke the reader/writer protocol.
    Misuse,
    /// A subtype alias on the wire is not registered for the base type.
    UnknownAlias,
    Io,
    Cancelled,
}

// -----------------------------------------------------------------------------
// SerdeError

/// Error produced by converter synthesis and by (de)serialization.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SerdeError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("{message} at offset {offset}")]
    InvalidData { message: Cow<'static, str>, offset: usize },

    /// A value was decoded but is not acceptable to the type being built.
    #[error("{0}")]
    Custom(String),

    #[error("cannot convert `{type_name}`: {message}{}", DisplayPath(.path))]
    Shape {
        type_name: &'static str,
        message: Cow<'static, str>,
        path: String,
    },

    #[error("maximum nesting depth of {max_depth} exceeded")]
    DepthExceeded { max_depth: usize },

    #[error("unknown subtype alias {alias} for `{base}`")]
    UnknownAlias { base: &'static str, alias: String },

    #[error("converter protocol violated: {0}")]
    Misuse(Cow<'static, str>),

    #[error(transparent)]
    Rental(#[from] RentalError),

    #[error("operation was cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to {operation} `{type_name}`")]
    Operation {
        operation: &'static str,
        type_name: &'static str,
        #[source]
        source: Box<SerdeError>,
    },
}

struct DisplayPath<'a>(&'a str);

impl fmt::Display for DisplayPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            Ok(())
        } else {
            write!(f, " (while building {})", self.0)
        }
    }
}

impl SerdeError {
    /// Classifies the error, looking through [`SerdeError::Operation`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) | Self::Encode(_) | Self::InvalidData { .. } | Self::Custom(_) => {
                ErrorKind::Format
            }
            Self::Shape { .. } => ErrorKind::Shape,
            Self::DepthExceeded { .. } => ErrorKind::DepthLimit,
            Self::UnknownAlias { .. } => ErrorKind::UnknownAlias,
            Self::Misuse(_) | Self::Rental(_) => ErrorKind::Misuse,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Io(_) => ErrorKind::Io,
            Self::Operation { source, .. } => source.kind(),
        }
    }

    /// The innermost error, skipping operation context.
    pub fn root(&self) -> &SerdeError {
        match self {
            Self::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    /// A format error raised by user conversion code.
    pub fn custom(message: impl fmt::Display) -> Self {
        Self::Custom(alloc::format!("{message}"))
    }

    pub(crate) fn shape<T: ?Sized>(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Shape {
            type_name: core::any::type_name::<T>(),
            message: message.into(),
            path: String::new(),
        }
    }

    pub(crate) fn invalid(reader: &Reader<'_>, message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidData {
            message: message.into(),
            offset: reader.position(),
        }
    }

    pub(crate) fn misuse(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Misuse(message.into())
    }

    pub(crate) fn in_operation<T: ?Sized>(self, operation: &'static str) -> Self {
        Self::Operation {
            operation,
            type_name: core::any::type_name::<T>(),
            source: Box::new(self),
        }
    }
}
