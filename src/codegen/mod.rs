//! Rust → Typst code generation.
//!
//! Turns host values into Typst literal expressions, ready to be spliced into
//! a document or injected as `#let` bindings ahead of its content.
//!
//! # Modules
//!
//! - [`value`] - The [`Value`] model and the [`ToValue`] conversion trait
//! - [`mod@marshal`] - Custom marshaling hooks and [`Literal`]
//! - [`encoder`] - [`ValueEncoder`] and the [`marshal()`] shortcut
//! - [`ser`] - Serde bridge ([`to_value`]) and `serialize_with` [`forms`]
//! - [`ident`] - Identifier validation and cleaning
//! - [`inject`] - `#let` binding injection
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```ignore
//! use typst_bridge::codegen::{marshal, Record, Value};
//!
//! let post = Record::new()
//!     .field("title", "Hello")
//!     .field("tags", vec!["a", "b"]);
//! assert_eq!(
//!     marshal(&Value::from(post))?,
//!     "(\n  \"title\": \"Hello\",\n  \"tags\": (\"a\", \"b\"),\n)"
//! );
//! ```

pub mod encoder;
pub mod error;
pub mod ident;
pub mod inject;
pub mod marshal;
pub mod ser;
pub mod value;

// Value model
pub use value::{Field, Record, ToValue, Value, OMIT};

// Marshaling hooks
pub use marshal::{Hook, Literal, TextMarshaler, ValueMarshaler};

// Encoding
pub use encoder::{marshal, marshal_serialize, ValueEncoder};

// Serde bridge
pub use ser::{forms, to_value, ValueSerializer};

// Identifiers and injection
pub use ident::{clean_identifier, is_identifier, is_keyword};
pub use inject::{inject_to_string, inject_values};

// Errors
pub use error::{BoxError, EncodeError, PathSegment};
