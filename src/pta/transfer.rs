// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Per-statement transfer functions.
//!
//! Assignments to a local (`Alloc`, `Copy`, `Load`) are strong updates: the
//! variable's points-to set is replaced. A `Store` is a weak update: `base`
//! may denote several abstract objects at once, so field facts are only ever
//! added. Every rule is monotone, which together with the finite number of
//! sites and variables in a procedure bounds the fixpoint iteration.

use log::*;
use std::iter;

use crate::graph::points_to_graph::PointsToGraph;
use crate::ir::site::{NodeId, SiteCache};
use crate::ir::statement::Statement;
use crate::ir::{Field, Var};
use crate::pta::PointsTo;
use crate::pts_set::points_to::PointsToSet;

/// A statement with its allocation site resolved to an abstract object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transfer {
    Alloc { lhs: Var, node: NodeId },
    Copy { lhs: Var, rhs: Var },
    Load { lhs: Var, base: Var, field: Field },
    Store { base: Var, field: Field, rhs: Var },
    Identity,
}

impl Transfer {
    /// Resolves `stmt` against `sites`, interning its allocation site.
    /// Returns `None` for an allocation without a site label.
    pub fn lower(stmt: &Statement, sites: &mut SiteCache) -> Option<Transfer> {
        let transfer = match stmt {
            Statement::Alloc { lhs, site } => Transfer::Alloc {
                lhs: lhs.clone(),
                node: sites.get_node_id(site.as_deref()?),
            },
            Statement::Copy { lhs, rhs } => Transfer::Copy {
                lhs: lhs.clone(),
                rhs: rhs.clone(),
            },
            Statement::Load { lhs, base, field } => Transfer::Load {
                lhs: lhs.clone(),
                base: base.clone(),
                field: field.clone(),
            },
            Statement::Store { base, field, rhs } => Transfer::Store {
                base: base.clone(),
                field: field.clone(),
                rhs: rhs.clone(),
            },
            Statement::Other => Transfer::Identity,
        };
        Some(transfer)
    }

    /// `out = transfer(in)`. `out` is overwritten.
    pub fn transfer(&self, in_fact: &PointsToGraph, out: &mut PointsToGraph) {
        out.copy(in_fact);
        self.apply(out);
    }

    /// Applies the statement's effect to `graph` in place.
    pub fn apply(&self, graph: &mut PointsToGraph) {
        match self {
            Transfer::Alloc { lhs, node } => {
                trace!("{} = new {:?}", lhs, node);
                graph.set_nodes_for_variable(lhs.clone(), iter::once(*node).collect());
            }
            Transfer::Copy { lhs, rhs } => {
                // An untracked source copies as the empty set.
                let pts = graph
                    .get_nodes_for_variable(rhs)
                    .cloned()
                    .unwrap_or_default();
                trace!("{} = {}: {:?}", lhs, rhs, pts);
                graph.set_nodes_for_variable(lhs.clone(), pts);
            }
            Transfer::Load { lhs, base, field } => {
                let pts = match graph.get_nodes_for_variable(base) {
                    Some(base_pts) => graph.reachable_from_all(base_pts, field),
                    None => PointsTo::new(),
                };
                trace!("{} = {}.{}: {:?}", lhs, base, field, pts);
                graph.set_nodes_for_variable(lhs.clone(), pts);
            }
            Transfer::Store { base, field, rhs } => {
                let (Some(base_pts), Some(rhs_pts)) = (
                    graph.get_nodes_for_variable(base).cloned(),
                    graph.get_nodes_for_variable(rhs).cloned(),
                ) else {
                    return;
                };
                for src in &base_pts {
                    for dst in &rhs_pts {
                        if graph.add_edge(src, field.clone(), dst) {
                            trace!("{}.{} = {}: new edge ({:?}, {}, {:?})", base, field, rhs, src, field, dst);
                        }
                    }
                }
            }
            Transfer::Identity => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower_all(stmts: &[Statement], sites: &mut SiteCache) -> Vec<Transfer> {
        stmts
            .iter()
            .map(|s| Transfer::lower(s, sites).unwrap())
            .collect()
    }

    fn run(stmts: &[Statement], sites: &mut SiteCache) -> PointsToGraph {
        let mut graph = PointsToGraph::new();
        for t in lower_all(stmts, sites) {
            t.apply(&mut graph);
        }
        graph
    }

    #[test]
    fn missing_site_does_not_lower() {
        let mut sites = SiteCache::new();
        let stmt = Statement::Alloc {
            lhs: Var::from("x"),
            site: None,
        };
        assert_eq!(Transfer::lower(&stmt, &mut sites), None);
        assert!(sites.is_empty());
    }

    #[test]
    fn alloc_is_a_strong_update() {
        let mut sites = SiteCache::new();
        let g = run(
            &[Statement::alloc("a", "7"), Statement::alloc("a", "10")],
            &mut sites,
        );
        let n10 = sites.get_node_id("10");
        let n7 = sites.get_node_id("7");
        assert_eq!(g.get_nodes_for_variable("a"), Some(&iter::once(n10).collect()));
        // The old object is still part of the graph.
        assert!(g.nodes().contains(n7));
    }

    #[test]
    fn copy_of_untracked_variable_is_tracked_and_empty() {
        let mut sites = SiteCache::new();
        let g = run(&[Statement::copy("v", "u")], &mut sites);
        assert!(g.get_nodes_for_variable("v").unwrap().is_empty());
        assert!(g.get_nodes_for_variable("u").is_none());
    }

    #[test]
    fn copy_is_independent_of_source() {
        let mut sites = SiteCache::new();
        let g = run(
            &[
                Statement::alloc("u", "1"),
                Statement::copy("v", "u"),
                Statement::alloc("u", "2"),
            ],
            &mut sites,
        );
        let n1 = sites.get_node_id("1");
        assert_eq!(g.get_nodes_for_variable("v"), Some(&iter::once(n1).collect()));
    }

    #[test]
    fn store_is_a_weak_update() {
        let mut sites = SiteCache::new();
        let g = run(
            &[
                Statement::alloc("x", "1"),
                Statement::alloc("y", "2"),
                Statement::alloc("z", "3"),
                Statement::store("x", "f", "y"),
                Statement::store("x", "f", "z"),
            ],
            &mut sites,
        );
        let (n1, n2, n3) = (sites.get_node_id("1"), sites.get_node_id("2"), sites.get_node_id("3"));
        assert!(g.contains_edge(n1, "f", n2));
        assert!(g.contains_edge(n1, "f", n3));
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn store_through_untracked_base_adds_nothing() {
        let mut sites = SiteCache::new();
        let g = run(
            &[Statement::alloc("y", "2"), Statement::store("x", "f", "y")],
            &mut sites,
        );
        assert_eq!(g.edge_count(), 0);
        assert!(g.get_nodes_for_variable("x").is_none());
    }

    #[test]
    fn load_unions_over_base_objects() {
        let mut sites = SiteCache::new();
        let (n1, n2, n3, n4) = (
            sites.get_node_id("1"),
            sites.get_node_id("2"),
            sites.get_node_id("3"),
            sites.get_node_id("4"),
        );
        let mut g = PointsToGraph::new();
        g.set_nodes_for_variable(Var::from("u"), [n1, n2].into_iter().collect());
        g.add_edge(n1, Field::from("f"), n3);
        g.add_edge(n2, Field::from("f"), n4);
        g.add_edge(n2, Field::from("g"), n1);

        let load = Transfer::lower(&Statement::load("v", "u", "f"), &mut sites).unwrap();
        let mut out = PointsToGraph::new();
        load.transfer(&g, &mut out);
        assert_eq!(out.get_nodes_for_variable("v"), Some(&[n3, n4].into_iter().collect()));
        // The input fact is left alone.
        assert!(g.get_nodes_for_variable("v").is_none());

        let missing = Transfer::lower(&Statement::load("w", "u", "nope"), &mut sites).unwrap();
        missing.apply(&mut out);
        assert!(out.get_nodes_for_variable("w").unwrap().is_empty());
    }

    #[test]
    fn identity_leaves_graph_unchanged() {
        let mut sites = SiteCache::new();
        let g = run(&[Statement::alloc("x", "1")], &mut sites);
        let mut out = PointsToGraph::new();
        Transfer::Identity.transfer(&g, &mut out);
        assert_eq!(out, g);
    }

    #[test]
    fn transfer_is_monotone() {
        let mut sites = SiteCache::new();
        let (n1, n2, n3) = (sites.get_node_id("1"), sites.get_node_id("2"), sites.get_node_id("3"));
        let mut small = PointsToGraph::new();
        small.set_nodes_for_variable(Var::from("x"), iter::once(n1).collect());
        small.set_nodes_for_variable(Var::from("y"), iter::once(n2).collect());
        let mut large = small.clone();
        large.set_nodes_for_variable(Var::from("x"), [n1, n3].into_iter().collect());
        large.add_edge(n3, Field::from("f"), n2);

        let stmts = [
            Statement::store("x", "f", "y"),
            Statement::load("z", "x", "f"),
            Statement::copy("w", "x"),
            Statement::alloc("x", "4"),
        ];
        for t in lower_all(&stmts, &mut sites) {
            let (mut out_small, mut out_large) = (PointsToGraph::new(), PointsToGraph::new());
            t.transfer(&small, &mut out_small);
            t.transfer(&large, &mut out_large);
            let mut joined = out_large.clone();
            joined.union(&out_small);
            assert_eq!(joined, out_large, "{:?} is not monotone", t);
        }
    }
}
