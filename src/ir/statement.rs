// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result};
use std::rc::Rc;

use super::{Field, Var};

/// A control-flow node classified by its effect on pointers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    /// `lhs = new ...`. The site label identifies the allocation statement;
    /// the front end must always provide it.
    Alloc {
        lhs: Var,
        #[serde(default)]
        site: Option<Rc<str>>,
    },
    /// `lhs = rhs`
    Copy { lhs: Var, rhs: Var },
    /// `lhs = base.field`
    Load { lhs: Var, base: Var, field: Field },
    /// `base.field = rhs`
    Store { base: Var, field: Field, rhs: Var },
    /// Anything without a pointer effect.
    Other,
}

impl Statement {
    pub fn alloc(lhs: &str, site: &str) -> Self {
        Statement::Alloc {
            lhs: Var::from(lhs),
            site: Some(Rc::from(site)),
        }
    }

    pub fn copy(lhs: &str, rhs: &str) -> Self {
        Statement::Copy {
            lhs: Var::from(lhs),
            rhs: Var::from(rhs),
        }
    }

    pub fn load(lhs: &str, base: &str, field: &str) -> Self {
        Statement::Load {
            lhs: Var::from(lhs),
            base: Var::from(base),
            field: Field::from(field),
        }
    }

    pub fn store(base: &str, field: &str, rhs: &str) -> Self {
        Statement::Store {
            base: Var::from(base),
            field: Field::from(field),
            rhs: Var::from(rhs),
        }
    }

    /// The variable this statement strongly updates, if any.
    pub fn defined_var(&self) -> Option<&Var> {
        match self {
            Statement::Alloc { lhs, .. }
            | Statement::Copy { lhs, .. }
            | Statement::Load { lhs, .. } => Some(lhs),
            Statement::Store { .. } | Statement::Other => None,
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Statement::Alloc { lhs, site: Some(site) } => write!(f, "{} = new @{}", lhs, site),
            Statement::Alloc { lhs, site: None } => write!(f, "{} = new @?", lhs),
            Statement::Copy { lhs, rhs } => write!(f, "{} = {}", lhs, rhs),
            Statement::Load { lhs, base, field } => write!(f, "{} = {}.{}", lhs, base, field),
            Statement::Store { base, field, rhs } => write!(f, "{}.{} = {}", base, field, rhs),
            Statement::Other => write!(f, "nop"),
        }
    }
}
