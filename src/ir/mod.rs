// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The statement-level view of a procedure that the analysis consumes.
//!
//! A host front end classifies every control-flow node into a [`Statement`]
//! and names the allocation site of every `new`; this module owns those
//! types and the interning of site labels into graph nodes.

use std::rc::Rc;

pub mod site;
pub mod statement;

/// Name of a local variable.
pub type Var = Rc<str>;
/// Name of an object field.
pub type Field = Rc<str>;
