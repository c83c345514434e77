// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The lattice element of the analysis: which abstract objects every local
//! variable and every object field may reference at one program point.

use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Formatter, Result};

use crate::ir::site::{NodeId, SiteCache};
use crate::ir::{Field, Var};
use crate::pta::PointsTo;
use crate::pts_set::points_to::PointsToSet;

/// `(src, field, dst)`: objects of `src` have a field `field` that may
/// reference objects of `dst`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub src: NodeId,
    pub field: Field,
    pub dst: NodeId,
}

impl Edge {
    pub fn new(src: NodeId, field: Field, dst: NodeId) -> Self {
        Edge { src, field, dst }
    }

    /// Renders the edge as `((src), field, (dst))` using the site labels.
    pub fn to_labelled_string(&self, sites: &SiteCache) -> String {
        format!(
            "({}, {}, {})",
            sites.display(self.src),
            self.field,
            sites.display(self.dst)
        )
    }
}

impl Debug for Edge {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "({:?}, {}, {:?})", self.src, self.field, self.dst)
    }
}

/// Nodes, field edges and the variable mapping.
///
/// A variable missing from the mapping is untracked (never assigned on any
/// path reaching this point); a variable mapped to the empty set is tracked
/// but points to nothing.
#[derive(Clone, Default)]
pub struct PointsToGraph {
    nodes: PointsTo<NodeId>,
    edges: HashSet<Edge>,
    /// Index over `edges` keyed by source node and field.
    field_targets: HashMap<(NodeId, Field), PointsTo<NodeId>>,
    mapping: HashMap<Var, PointsTo<NodeId>>,
}

impl PartialEq for PointsToGraph {
    fn eq(&self, other: &Self) -> bool {
        // `field_targets` is derived from `edges`.
        self.nodes == other.nodes && self.edges == other.edges && self.mapping == other.mapping
    }
}

impl Eq for PointsToGraph {}

impl Debug for PointsToGraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let mut edges = self.edges.iter().collect::<Vec<_>>();
        edges.sort();
        let mut mapping = self.mapping.iter().collect::<Vec<_>>();
        mapping.sort_by(|a, b| a.0.cmp(b.0));
        f.debug_struct("PointsToGraph")
            .field("nodes", &self.nodes)
            .field("edges", &edges)
            .field("mapping", &mapping)
            .finish()
    }
}

impl PointsToGraph {
    /// The bottom element.
    pub fn new() -> Self {
        PointsToGraph {
            nodes: PointsTo::new(),
            edges: HashSet::new(),
            field_targets: HashMap::new(),
            mapping: HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.field_targets.clear();
        self.mapping.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.mapping.is_empty()
    }

    /// Replaces the contents of this graph with an independent duplicate of
    /// `source`.
    pub fn copy(&mut self, source: &PointsToGraph) {
        self.clone_from(source);
    }

    /// `self = self ⊔ other`. Returns whether `self` changed.
    pub fn union(&mut self, other: &PointsToGraph) -> bool {
        let mut changed = self.nodes.union(&other.nodes);
        for edge in &other.edges {
            changed |= self.add_edge(edge.src, edge.field.clone(), edge.dst);
        }
        for (var, other_pts) in &other.mapping {
            match self.mapping.get_mut(var) {
                Some(pts) => changed |= pts.union(other_pts),
                None => {
                    self.mapping.insert(var.clone(), other_pts.clone());
                    changed = true;
                }
            }
        }
        changed
    }

    /// The abstract objects `var` may point to, or `None` if `var` is untracked.
    pub fn get_nodes_for_variable(&self, var: &str) -> Option<&PointsTo<NodeId>> {
        self.mapping.get(var)
    }

    /// Strong update: `var` now points to exactly `nodes`.
    pub fn set_nodes_for_variable(&mut self, var: Var, nodes: PointsTo<NodeId>) {
        self.nodes.union(&nodes);
        self.mapping.insert(var, nodes);
    }

    /// Registers an abstract object without any variable referencing it.
    pub fn add_node(&mut self, node: NodeId) -> bool {
        self.nodes.insert(node)
    }

    /// Adds `(src, field, dst)`. Returns false if the edge was already present.
    pub fn add_edge(&mut self, src: NodeId, field: Field, dst: NodeId) -> bool {
        let edge = Edge::new(src, field, dst);
        if self.edges.contains(&edge) {
            return false;
        }
        self.nodes.insert(src);
        self.nodes.insert(dst);
        self.field_targets
            .entry((src, edge.field.clone()))
            .or_default()
            .insert(dst);
        self.edges.insert(edge)
    }

    pub fn contains_edge(&self, src: NodeId, field: &str, dst: NodeId) -> bool {
        self.field_targets
            .get(&(src, Field::from(field)))
            .map_or(false, |targets| targets.contains(dst))
    }

    /// Targets of the `field` edges leaving `node`. Empty when none match.
    pub fn reachable_via_field(&self, node: NodeId, field: &str) -> PointsTo<NodeId> {
        self.field_targets
            .get(&(node, Field::from(field)))
            .cloned()
            .unwrap_or_default()
    }

    /// `⋃ reachable_via_field(n, field)` over every `n` in `sources`.
    pub fn reachable_from_all(&self, sources: &PointsTo<NodeId>, field: &str) -> PointsTo<NodeId> {
        let field = Field::from(field);
        let mut result = PointsTo::new();
        for src in sources {
            if let Some(targets) = self.field_targets.get(&(src, field.clone())) {
                result.union(targets);
            }
        }
        result
    }

    pub fn nodes(&self) -> &PointsTo<NodeId> {
        &self.nodes
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Tracked variables and their points-to sets, in no particular order.
    pub fn variables(&self) -> impl Iterator<Item = (&Var, &PointsTo<NodeId>)> {
        self.mapping.iter()
    }

    pub fn variable_count(&self) -> usize {
        self.mapping.len()
    }
}
