// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! May-alias queries over a converged points-to graph.
//!
//! A `true` answer is a sound over-approximation; `false` guarantees the two
//! access paths never refer to the same abstract object. Untracked variables
//! point nowhere and so never alias anything.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use thiserror::Error;

use super::{AnalysisResult, PointsTo};
use crate::graph::points_to_graph::PointsToGraph;
use crate::ir::site::NodeId;
use crate::pts_set::points_to::PointsToSet;

pub struct AliasOracle<'a> {
    graph: &'a PointsToGraph,
}

impl<'a> AliasOracle<'a> {
    pub fn new(graph: &'a PointsToGraph) -> Self {
        AliasOracle { graph }
    }

    /// Objects `var` may point to; empty when `var` is untracked.
    pub fn points_to(&self, var: &str) -> PointsTo<NodeId> {
        self.graph.get_nodes_for_variable(var).cloned().unwrap_or_default()
    }

    /// Objects reachable through `var.field`.
    pub fn field_points_to(&self, var: &str, field: &str) -> PointsTo<NodeId> {
        match self.graph.get_nodes_for_variable(var) {
            Some(pts) => self.graph.reachable_from_all(pts, field),
            None => PointsTo::new(),
        }
    }

    /// Whether `a` and `b` may point to a common object.
    pub fn may_alias(&self, a: &str, b: &str) -> bool {
        match (
            self.graph.get_nodes_for_variable(a),
            self.graph.get_nodes_for_variable(b),
        ) {
            (Some(a_pts), Some(b_pts)) => a_pts.intersects(b_pts),
            _ => false,
        }
    }

    /// Whether `a.field` may point to an object `b` points to.
    pub fn may_alias_via_field(&self, a: &str, field: &str, b: &str) -> bool {
        match self.graph.get_nodes_for_variable(b) {
            Some(b_pts) => self.field_points_to(a, field).intersects(b_pts),
            None => false,
        }
    }

    pub fn answer(&self, query: &AliasQuery) -> bool {
        match query {
            AliasQuery::Vars { left, right } => self.may_alias(left, right),
            AliasQuery::Field { left, field, right } => self.may_alias_via_field(left, field, right),
        }
    }
}

/// `may_alias` against the summary graph of `result`.
pub fn may_alias<N: Copy + Eq + Hash>(result: &AnalysisResult<N>, a: &str, b: &str) -> bool {
    result.oracle().may_alias(a, b)
}

/// `may_alias_via_field` against the summary graph of `result`.
pub fn may_alias_via_field<N: Copy + Eq + Hash>(
    result: &AnalysisResult<N>,
    a: &str,
    field: &str,
    b: &str,
) -> bool {
    result.oracle().may_alias_via_field(a, field, b)
}

/// A query as written on the command line: `a~b` or `a.f~b`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AliasQuery {
    Vars { left: String, right: String },
    Field { left: String, field: String, right: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QueryParseError {
    #[error("alias query `{0}` has no `~` separator")]
    MissingSeparator(String),
    #[error("alias query `{0}` has an empty operand")]
    EmptyOperand(String),
}

impl FromStr for AliasQuery {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lhs, rhs) = s
            .split_once('~')
            .ok_or_else(|| QueryParseError::MissingSeparator(s.to_string()))?;
        let (lhs, rhs) = (lhs.trim(), rhs.trim());
        let empty = || QueryParseError::EmptyOperand(s.to_string());
        if rhs.is_empty() || rhs.contains('~') {
            return Err(empty());
        }
        match lhs.split_once('.') {
            Some((left, field)) => {
                if left.is_empty() || field.is_empty() {
                    return Err(empty());
                }
                Ok(AliasQuery::Field {
                    left: left.to_string(),
                    field: field.to_string(),
                    right: rhs.to_string(),
                })
            }
            None if lhs.is_empty() => Err(empty()),
            None => Ok(AliasQuery::Vars {
                left: lhs.to_string(),
                right: rhs.to_string(),
            }),
        }
    }
}

impl fmt::Display for AliasQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AliasQuery::Vars { left, right } => write!(f, "{}~{}", left, right),
            AliasQuery::Field { left, field, right } => write!(f, "{}.{}~{}", left, field, right),
        }
    }
}
