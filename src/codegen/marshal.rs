//! Marshaling hooks that override structural encoding.
//!
//! A type opts into custom output by implementing one of two traits and
//! returning [`Value::literal`] or [`Value::text`] from its
//! [`ToValue`](super::ToValue) impl:
//!
//! - [`ValueMarshaler`]: the returned markup is spliced verbatim.
//! - [`TextMarshaler`]: the returned text is emitted as a string literal.
//!   Map keys of this kind resolve through the hook as well.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use super::error::BoxError;
use super::value::{ToValue, Value};

/// Custom Typst marshaling.
///
/// The returned markup is trusted to be a valid Typst expression.
pub trait ValueMarshaler {
    /// Render `self` as Typst markup.
    fn marshal_typst_value(&self) -> Result<String, BoxError>;
}

/// Text marshaling, encoded as a Typst string literal.
pub trait TextMarshaler {
    /// Render `self` as plain text.
    fn marshal_text(&self) -> Result<String, BoxError>;
}

/// A shared marshaling hook, tagged with the implementing type's name.
pub struct Hook<T: ?Sized> {
    type_name: &'static str,
    inner: Arc<T>,
}

impl<T: ?Sized> Hook<T> {
    /// Name of the type behind the hook.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl Hook<dyn ValueMarshaler> {
    pub(crate) fn literal<M: ValueMarshaler + 'static>(marshaler: M) -> Self {
        Self {
            type_name: type_name::<M>(),
            inner: Arc::new(marshaler),
        }
    }

    pub(crate) fn call(&self) -> Result<String, BoxError> {
        tracing::trace!(type_name = self.type_name, "calling value marshaler");
        self.inner.marshal_typst_value()
    }
}

impl Hook<dyn TextMarshaler> {
    pub(crate) fn text<M: TextMarshaler + 'static>(marshaler: M) -> Self {
        Self {
            type_name: type_name::<M>(),
            inner: Arc::new(marshaler),
        }
    }

    pub(crate) fn call(&self) -> Result<String, BoxError> {
        tracing::trace!(type_name = self.type_name, "calling text marshaler");
        self.inner.marshal_text()
    }
}

impl<T: ?Sized> Clone for Hook<T> {
    fn clone(&self) -> Self {
        Self {
            type_name: self.type_name,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Hook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hook").field(&self.type_name).finish()
    }
}

impl<T: ?Sized> PartialEq for Hook<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

// ---------------------------------------------------------------------------
// Literal
// ---------------------------------------------------------------------------

/// Pre-rendered Typst markup, spliced into the output as is.
///
/// Works both as a [`ToValue`] and through serde, so a struct field of this
/// type keeps its markup when the struct is encoded via
/// [`to_value`](super::to_value).
///
/// ```ignore
/// use typst_bridge::codegen::{marshal, Literal};
///
/// assert_eq!(marshal(&Literal::new("rgb(\"#ff0000\")"))?, "rgb(\"#ff0000\")");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal(pub String);

/// Newtype name that carries a [`Literal`] through serde.
pub(crate) const LITERAL_TOKEN: &str = "$typst_bridge::private::Literal";

impl Literal {
    /// Wrap pre-rendered markup.
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    /// The wrapped markup.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueMarshaler for Literal {
    fn marshal_typst_value(&self) -> Result<String, BoxError> {
        Ok(self.0.clone())
    }
}

impl ToValue for Literal {
    fn to_value(&self) -> Value {
        Value::literal(self.clone())
    }
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(LITERAL_TOKEN, &self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper(&'static str);

    impl TextMarshaler for Upper {
        fn marshal_text(&self) -> Result<String, BoxError> {
            Ok(self.0.to_uppercase())
        }
    }

    #[test]
    fn test_hook_records_type_name() {
        let hook = Hook::<dyn TextMarshaler>::text(Upper("abc"));
        assert!(hook.type_name().ends_with("Upper"));
        assert_eq!(hook.call().unwrap(), "ABC");
    }

    #[test]
    fn test_hook_equality_is_identity() {
        let a = Hook::<dyn ValueMarshaler>::literal(Literal::new("1"));
        let b = Hook::<dyn ValueMarshaler>::literal(Literal::new("1"));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_literal_marshals_verbatim() {
        let lit = Literal::new("(1, 2)");
        assert_eq!(lit.marshal_typst_value().unwrap(), "(1, 2)");
        assert_eq!(lit.as_str(), "(1, 2)");
    }
}
