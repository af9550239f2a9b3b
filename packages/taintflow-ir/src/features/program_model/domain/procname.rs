//! Procedure names and source languages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source language of a procedure.
///
/// The distinction the analysis cares about is managed (garbage
/// collected, no by-reference return temporaries, no `operator=`) versus
/// unmanaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Language {
    Java,
    Python,
    TypeScript,
    Cpp,
    C,
}

impl Language {
    pub fn is_managed(&self) -> bool {
        !matches!(self, Language::Cpp | Language::C)
    }
}

/// Name of a procedure, optionally qualified by its declaring class.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcName {
    /// Unqualified method or function name
    pub name: String,

    /// Declaring class, when the procedure is a method
    pub class_name: Option<String>,

    pub language: Language,

    /// Constructor flag; empty constructor summaries are skipped rather
    /// than applied
    pub is_constructor: bool,
}

impl ProcName {
    /// Free function.
    pub fn plain(name: impl Into<String>, language: Language) -> Self {
        Self {
            name: name.into(),
            class_name: None,
            language,
            is_constructor: false,
        }
    }

    /// Method on `class_name`.
    pub fn method(
        class_name: impl Into<String>,
        name: impl Into<String>,
        language: Language,
    ) -> Self {
        Self {
            name: name.into(),
            class_name: Some(class_name.into()),
            language,
            is_constructor: false,
        }
    }

    pub fn constructor(class_name: impl Into<String>, language: Language) -> Self {
        let class_name = class_name.into();
        Self {
            name: "<init>".to_string(),
            class_name: Some(class_name),
            language,
            is_constructor: true,
        }
    }

    /// Short method name, without qualification.
    pub fn base_name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ProcName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.class_name {
            Some(class) => write!(f, "{}.{}", class, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_managed_languages() {
        assert!(Language::Java.is_managed());
        assert!(Language::Python.is_managed());
        assert!(!Language::Cpp.is_managed());
        assert!(!Language::C.is_managed());
    }

    #[test]
    fn test_display_qualification() {
        let free = ProcName::plain("source", Language::Java);
        let method = ProcName::method("HttpHandler", "handle", Language::Java);
        assert_eq!(free.to_string(), "source");
        assert_eq!(method.to_string(), "HttpHandler.handle");
    }

    #[test]
    fn test_constructor_flag() {
        let ctor = ProcName::constructor("Widget", Language::Cpp);
        assert!(ctor.is_constructor);
        assert_eq!(ctor.base_name(), "<init>");
    }
}
