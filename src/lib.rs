//! # typst-bridge
//!
//! Helpers for driving the typst CLI from Rust: hand values to a document
//! as Typst literals, and read back what the compiler reported.
//!
//! - **Codegen**: encode Rust values (via [`ToValue`] or serde) into Typst
//!   literal expressions, or into `#let` bindings ahead of document content
//! - **Diagnostics**: parse the CLI's stderr into structured [`Entry`] values
//!   with severity, location and hints
//!
//! Invoking the CLI itself is left to the caller; [`config`] only records
//! which executable to use.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::collections::BTreeMap;
//! use std::process::Command;
//! use typst_bridge::{inject_values, Report, Value};
//!
//! // Preamble with the document's inputs
//! let mut source = Vec::new();
//! inject_values(&mut source, BTreeMap::from([
//!     ("title", Value::Str("Quarterly report".into())),
//!     ("pages", Value::Int(12)),
//! ]))?;
//! source.extend_from_slice(b"= #title\n");
//!
//! // ... run typst with `source` on stdin ...
//! let output = Command::new(&typst_bridge::config::get().executable)
//!     .args(["compile", "-", "out.pdf"])
//!     .output()?;
//!
//! if !output.status.success() {
//!     let report = Report::parse(String::from_utf8_lossy(&output.stderr));
//!     eprintln!("{}: {report}", report.summary());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`codegen`]: Value model, encoder, serde bridge and binding injection
//! - [`diagnostic`]: Diagnostic parsing and formatting
//! - [`config`]: Runtime configuration (executable, display options)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codegen;
pub mod config;
pub mod diagnostic;

// =============================================================================
// Prelude - import commonly used items with a single `use`
// =============================================================================

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
///
/// ```ignore
/// use typst_bridge::prelude::*;
/// ```
///
/// This includes:
/// - Encoding: `marshal`, `marshal_serialize`, `inject_values`, `ValueEncoder`
/// - Values: `Value`, `ToValue`, `Record`, `Literal` and the marshaler traits
/// - Diagnostics: `Report`, `Entry`, `Severity`, `DiagnosticOptions`
pub mod prelude {
    // Encoding
    pub use crate::{
        inject_to_string, inject_values, marshal, marshal_serialize, EncodeError, ValueEncoder,
    };

    // Values
    pub use crate::{Literal, Record, TextMarshaler, ToValue, Value, ValueMarshaler};

    // Diagnostics
    pub use crate::{DiagnosticOptions, Entry, Report, Severity};
}

// =============================================================================
// Codegen
// =============================================================================

pub use codegen::{
    // Encoding
    inject_to_string, inject_values, marshal, marshal_serialize, to_value, ValueEncoder,
    // Value model
    Field, Literal, Record, ToValue, Value, OMIT,
    // Custom marshaling
    TextMarshaler, ValueMarshaler,
    // Identifiers
    clean_identifier, is_identifier, is_keyword,
    // Errors
    EncodeError, PathSegment,
};

// =============================================================================
// Diagnostics
// =============================================================================

pub use diagnostic::{
    // Parsed output
    Entry, Report, Severity,
    // Options for formatting
    DiagnosticOptions, DisplayStyle,
    // Summary
    DiagnosticSummary,
};

// =============================================================================
// Infrastructure
// =============================================================================

pub use config::{Config, ConfigBuilder};
