//! Procedure definitions.

use serde::{Deserialize, Serialize};

use super::cfg::ProcCfg;
use super::procname::ProcName;
use crate::shared::models::{AccessPath, Base, Typ, Var};

/// A procedure with its signature and lowered body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Procedure {
    pub pname: ProcName,

    /// Formal parameters in declaration order
    pub formals: Vec<(String, Typ)>,

    pub ret_typ: Typ,

    pub cfg: ProcCfg,
}

impl Procedure {
    pub fn new(pname: ProcName, formals: Vec<(String, Typ)>, ret_typ: Typ, cfg: ProcCfg) -> Self {
        Self {
            pname,
            formals,
            ret_typ,
            cfg,
        }
    }

    /// Base of the formal at `index`.
    pub fn formal_base(&self, index: usize) -> Option<Base> {
        self.formals
            .get(index)
            .map(|(name, typ)| Base::new(Var::named(name.clone()), typ.clone()))
    }

    /// Access path naming the formal at `index`.
    pub fn formal_path(&self, index: usize) -> Option<AccessPath> {
        self.formal_base(index).map(AccessPath::of_base)
    }

    /// Base of the procedure's return slot.
    pub fn ret_base(&self) -> Base {
        Base::new(Var::ret(), self.ret_typ.clone())
    }
}
