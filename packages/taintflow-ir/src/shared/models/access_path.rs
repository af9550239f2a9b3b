//! Access paths: a rooted variable plus field and index steps.
//!
//! An access path names a symbolic heap location (`request.params[i]`).
//! The abstracted flavor additionally covers everything reachable below
//! the named location, which is how writes through arrays and pointers
//! are over-approximated.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::Typ;
use super::var::{Base, Var};

/// One step of an access path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PathStep {
    /// Field selection, typed with the field's type
    Field { name: String, typ: Typ },

    /// Array or container indexing, typed with the element type.
    /// Indices are not distinguished.
    Index(Typ),
}

impl PathStep {
    pub fn field(name: impl Into<String>, typ: Typ) -> Self {
        PathStep::Field {
            name: name.into(),
            typ,
        }
    }

    pub fn typ(&self) -> &Typ {
        match self {
            PathStep::Field { typ, .. } => typ,
            PathStep::Index(typ) => typ,
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Field { name, .. } => write!(f, ".{}", name),
            PathStep::Index(_) => write!(f, "[_]"),
        }
    }
}

/// A concrete access path: typed base plus ordered steps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccessPath {
    pub base: Base,
    pub steps: Vec<PathStep>,
}

impl AccessPath {
    pub fn new(base: Base, steps: Vec<PathStep>) -> Self {
        Self { base, steps }
    }

    /// Path consisting of just a base.
    pub fn of_base(base: Base) -> Self {
        Self {
            base,
            steps: Vec::new(),
        }
    }

    pub fn of_var(var: Var, typ: Typ) -> Self {
        Self::of_base(Base::new(var, typ))
    }

    /// Split into base and steps.
    pub fn extract(&self) -> (&Base, &[PathStep]) {
        (&self.base, &self.steps)
    }

    /// Same steps on a different base.
    pub fn with_base(&self, base: Base) -> Self {
        Self {
            base,
            steps: self.steps.clone(),
        }
    }

    /// `prefix` extended with `suffix` steps.
    pub fn append(prefix: &AccessPath, suffix: &[PathStep]) -> Self {
        let mut steps = prefix.steps.clone();
        steps.extend_from_slice(suffix);
        Self {
            base: prefix.base.clone(),
            steps,
        }
    }

    /// Static type of the location the path names: the type of the last
    /// step, or the base type for a bare base.
    pub fn typ(&self) -> &Typ {
        self.steps.last().map(PathStep::typ).unwrap_or(&self.base.typ)
    }

    /// Re-root onto the footprint variable for `formal_index`, keeping
    /// the steps. Used when an unseen read of a formal acquires a
    /// symbolic provenance.
    pub fn to_footprint(&self, formal_index: usize) -> Self {
        self.with_base(Base::new(Var::footprint(formal_index), self.base.typ.clone()))
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for step in &self.steps {
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

/// An access path together with its abstraction flavor.
///
/// `Exact` names one location; `Abstracted` names the location and every
/// path reachable below it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AbsAccessPath {
    Exact(AccessPath),
    Abstracted(AccessPath),
}

impl AbsAccessPath {
    pub fn raw(&self) -> &AccessPath {
        match self {
            AbsAccessPath::Exact(ap) | AbsAccessPath::Abstracted(ap) => ap,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, AbsAccessPath::Exact(_))
    }

    pub fn extract(&self) -> (&Base, &[PathStep]) {
        self.raw().extract()
    }

    pub fn base(&self) -> &Base {
        &self.raw().base
    }

    pub fn typ(&self) -> &Typ {
        self.raw().typ()
    }

    /// Same flavor over a transformed raw path.
    pub fn map_raw(&self, raw: AccessPath) -> Self {
        match self {
            AbsAccessPath::Exact(_) => AbsAccessPath::Exact(raw),
            AbsAccessPath::Abstracted(_) => AbsAccessPath::Abstracted(raw),
        }
    }

    pub fn to_footprint(&self, formal_index: usize) -> Self {
        self.map_raw(self.raw().to_footprint(formal_index))
    }
}

impl fmt::Display for AbsAccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbsAccessPath::Exact(ap) => write!(f, "{}", ap),
            AbsAccessPath::Abstracted(ap) => write!(f, "{}*", ap),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_params() -> AccessPath {
        AccessPath::new(
            Base::new(Var::named("request"), Typ::strukt("Request")),
            vec![
                PathStep::field("params", Typ::array(Typ::Str)),
                PathStep::Index(Typ::Str),
            ],
        )
    }

    #[test]
    fn test_typ_follows_last_step() {
        assert_eq!(*request_params().typ(), Typ::Str);

        let bare = AccessPath::of_var(Var::named("x"), Typ::Int);
        assert_eq!(*bare.typ(), Typ::Int);
    }

    #[test]
    fn test_append_preserves_prefix() {
        let prefix = AccessPath::of_var(Var::named("obj"), Typ::strukt("Obj"));
        let appended = AccessPath::append(&prefix, &[PathStep::field("f", Typ::Int)]);
        assert_eq!(appended.base, prefix.base);
        assert_eq!(appended.steps.len(), 1);
    }

    #[test]
    fn test_footprint_rebase_keeps_steps() {
        let fp = request_params().to_footprint(1);
        assert_eq!(fp.base.var.footprint_index(), Some(1));
        assert_eq!(fp.steps, request_params().steps);
    }

    #[test]
    fn test_flavor_preserved_by_map_raw() {
        let exact = AbsAccessPath::Exact(request_params());
        let abstracted = AbsAccessPath::Abstracted(request_params());
        let rebased = AccessPath::of_var(Var::named("y"), Typ::Int);

        assert!(exact.map_raw(rebased.clone()).is_exact());
        assert!(!abstracted.map_raw(rebased).is_exact());
    }

    #[test]
    fn test_display() {
        assert_eq!(request_params().to_string(), "request.params[_]");
        assert_eq!(
            AbsAccessPath::Abstracted(request_params()).to_string(),
            "request.params[_]*"
        );
    }
}
