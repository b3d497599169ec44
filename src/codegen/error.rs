//! Error types for codegen operations.

use std::fmt;
use std::io;

use thiserror::Error;

/// Boxed error returned by marshaling hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Where inside a value an error happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A record field, by declared name.
    Field(String),
    /// A map entry, by resolved key.
    Key(String),
    /// The key of a map entry whose key could not be resolved.
    MapKey {
        /// Zero-based entry index.
        index: usize,
    },
    /// A sequence element.
    Index {
        /// Zero-based element index.
        index: usize,
        /// Sequence length.
        len: usize,
    },
    /// A top-level `#let` binding.
    Binding(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "struct field {name:?}"),
            Self::Key(key) => write!(f, "map field {key:?}"),
            Self::MapKey { index } => write!(f, "key of map entry {}", index + 1),
            Self::Index { index, len } => write!(f, "element {} of {len}", index + 1),
            Self::Binding(name) => write!(f, "binding {name:?}"),
        }
    }
}

/// Error while encoding a value into Typst markup.
///
/// Every error aborts the whole encode. Errors raised below the top level are
/// wrapped in [`EncodeError::Nested`], one layer per field, key or element,
/// so [`EncodeError::path`] can tell where the failure happened.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The value kind has no Typst representation.
    #[error("unsupported type {0:?}")]
    UnsupportedType(String),

    /// A `ValueMarshaler` or `TextMarshaler` hook failed.
    #[error("error calling marshaler for type {type_name}: {source}")]
    MarshalHook {
        /// Name of the type implementing the hook.
        type_name: &'static str,
        /// The hook's own error.
        source: BoxError,
    },

    /// Writing to the output sink failed.
    #[error("failed to write into writer: {0}")]
    SinkWrite(#[from] io::Error),

    /// A map key is neither a string, an integer, nor text-marshalable.
    #[error("unsupported map key type {0:?}")]
    InvalidMapKeyType(&'static str),

    /// Two map keys resolved to the same string.
    #[error("duplicate map key {0:?}")]
    DuplicateKey(String),

    /// A top-level binding name is not a valid Typst identifier.
    #[error("{0:?} is not a valid identifier")]
    InvalidIdentifier(String),

    /// Custom error raised by a `Serialize` implementation.
    #[error("{0}")]
    Custom(String),

    /// An error inside a nested field, key or element.
    #[error("failed to encode {segment}: {source}")]
    Nested {
        /// Location of the failing value inside its parent.
        segment: PathSegment,
        /// The error raised by the nested value.
        source: Box<EncodeError>,
    },
}

impl EncodeError {
    /// Wrap this error with the location of the value it was raised for.
    pub fn within(self, segment: PathSegment) -> Self {
        Self::Nested {
            segment,
            source: Box::new(self),
        }
    }

    /// The path to the failing value, outermost segment first.
    pub fn path(&self) -> Vec<&PathSegment> {
        let mut path = Vec::new();
        let mut current = self;
        while let Self::Nested { segment, source } = current {
            path.push(segment);
            current = source;
        }
        path
    }

    /// The innermost error, with all path wrappers removed.
    pub fn root_cause(&self) -> &EncodeError {
        let mut current = self;
        while let Self::Nested { source, .. } = current {
            current = source;
        }
        current
    }
}

impl serde::ser::Error for EncodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}
