//! Type representation for access paths and taintability queries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural type of a variable or access path.
///
/// Only the shape the analysis inspects is modeled: pointer and array
/// nesting decides whether a sink argument subsumes everything reachable
/// from it, and whether a trailing parameter looks variadic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Typ {
    Void,
    Bool,
    Int,
    Str,
    /// Named aggregate
    Struct(String),
    Ptr(Box<Typ>),
    Array(Box<Typ>),
    Unknown,
}

impl Typ {
    pub fn ptr(inner: Typ) -> Self {
        Typ::Ptr(Box::new(inner))
    }

    pub fn array(elem: Typ) -> Self {
        Typ::Array(Box::new(elem))
    }

    pub fn strukt(name: impl Into<String>) -> Self {
        Typ::Struct(name.into())
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Typ::Void)
    }

    /// Array-like shapes whose contents a write can reach: `T*[]`,
    /// `T**`, `T[]`. Sinks over these report everything below the
    /// argument, not just the argument itself.
    pub fn is_array_like(&self) -> bool {
        match self {
            Typ::Array(_) => true,
            Typ::Ptr(inner) => matches!(inner.as_ref(), Typ::Array(_) | Typ::Ptr(_)),
            _ => false,
        }
    }

    /// Heuristic for a variadic tail parameter: a reference to an array
    /// of pointers (`Object[]` passed by reference) or a plain pointer
    /// array.
    pub fn is_variadic_array(&self) -> bool {
        match self {
            Typ::Ptr(inner) => matches!(inner.as_ref(), Typ::Array(elem) if matches!(elem.as_ref(), Typ::Ptr(_) | Typ::Struct(_) | Typ::Unknown)),
            Typ::Array(elem) => matches!(elem.as_ref(), Typ::Ptr(_)),
            _ => false,
        }
    }

    /// Element type for arrays and pointers, `Unknown` otherwise.
    pub fn deref(&self) -> Typ {
        match self {
            Typ::Ptr(inner) | Typ::Array(inner) => (**inner).clone(),
            _ => Typ::Unknown,
        }
    }
}

impl fmt::Display for Typ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Typ::Void => write!(f, "void"),
            Typ::Bool => write!(f, "bool"),
            Typ::Int => write!(f, "int"),
            Typ::Str => write!(f, "string"),
            Typ::Struct(name) => write!(f, "{}", name),
            Typ::Ptr(inner) => write!(f, "{}*", inner),
            Typ::Array(elem) => write!(f, "{}[]", elem),
            Typ::Unknown => write!(f, "?"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_like_shapes() {
        assert!(Typ::array(Typ::Int).is_array_like());
        assert!(Typ::ptr(Typ::array(Typ::Int)).is_array_like());
        assert!(Typ::ptr(Typ::ptr(Typ::Int)).is_array_like());
        assert!(!Typ::ptr(Typ::Int).is_array_like());
        assert!(!Typ::Str.is_array_like());
    }

    #[test]
    fn test_variadic_tail() {
        let object_array_ref = Typ::ptr(Typ::array(Typ::strukt("Object")));
        assert!(object_array_ref.is_variadic_array());
        assert!(!Typ::array(Typ::Int).is_variadic_array());
        assert!(!Typ::Str.is_variadic_array());
    }

    #[test]
    fn test_display_nesting() {
        assert_eq!(Typ::ptr(Typ::array(Typ::Int)).to_string(), "int[]*");
        assert_eq!(Typ::strukt("Request").to_string(), "Request");
    }
}
