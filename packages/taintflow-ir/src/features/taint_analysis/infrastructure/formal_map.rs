//! Formal parameter indexing.

use rustc_hash::FxHashMap;

use crate::features::program_model::domain::Procedure;
use crate::shared::models::Base;

/// Maps a procedure's formal bases to their 0-based declaration index.
#[derive(Debug, Clone, Default)]
pub struct FormalMap {
    by_base: FxHashMap<Base, usize>,
}

impl FormalMap {
    pub fn of_procedure(proc: &Procedure) -> Self {
        let mut by_base = FxHashMap::default();
        for index in 0..proc.formals.len() {
            if let Some(base) = proc.formal_base(index) {
                by_base.insert(base, index);
            }
        }
        Self { by_base }
    }

    pub fn formal_index(&self, base: &Base) -> Option<usize> {
        self.by_base.get(base).copied()
    }

    pub fn is_formal(&self, base: &Base) -> bool {
        self.by_base.contains_key(base)
    }

    pub fn len(&self) -> usize {
        self.by_base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_base.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::program_model::domain::{CfgBuilder, Language, ProcName, Procedure};
    use crate::shared::models::{Typ, Var};

    #[test]
    fn test_indices_follow_declaration_order() {
        let proc = Procedure::new(
            ProcName::plain("f", Language::Java),
            vec![("a".to_string(), Typ::Str), ("b".to_string(), Typ::Int)],
            Typ::Void,
            CfgBuilder::linear(vec![]),
        );
        let formals = FormalMap::of_procedure(&proc);

        assert_eq!(formals.formal_index(&Base::new(Var::named("a"), Typ::Str)), Some(0));
        assert_eq!(formals.formal_index(&Base::new(Var::named("b"), Typ::Int)), Some(1));
        assert_eq!(formals.formal_index(&Base::new(Var::named("c"), Typ::Int)), None);
        assert_eq!(formals.len(), 2);
    }
}
