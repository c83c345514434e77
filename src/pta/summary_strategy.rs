// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Strategies for collapsing the converged per-node facts into the single
//! graph that whole-procedure alias queries run against.

use std::fmt;

use crate::graph::points_to_graph::PointsToGraph;

/// The converged facts a strategy may draw on. Positions index the
/// program order of the control-flow graph.
pub struct FixpointFacts<'a> {
    pub out_facts: &'a [PointsToGraph],
    /// Positions of nodes without successors.
    pub exits: &'a [usize],
    /// Position of the node visited last in the final pass.
    pub last_visited: usize,
}

pub trait SummaryStrategy {
    fn summarize(&self, facts: &FixpointFacts<'_>) -> PointsToGraph;
}

/// The OUT fact of the last node visited. For procedures with several exits,
/// or whose last node in program order is not an exit, this may miss facts
/// that hold on other exit paths.
pub struct LastVisited;

impl SummaryStrategy for LastVisited {
    fn summarize(&self, facts: &FixpointFacts<'_>) -> PointsToGraph {
        facts
            .out_facts
            .get(facts.last_visited)
            .cloned()
            .unwrap_or_default()
    }
}

/// The join of the OUT facts of every exit node. A procedure without exits
/// (it never returns) joins the OUT facts of all nodes instead.
pub struct JoinExits;

impl SummaryStrategy for JoinExits {
    fn summarize(&self, facts: &FixpointFacts<'_>) -> PointsToGraph {
        let mut summary = PointsToGraph::new();
        if facts.exits.is_empty() {
            for fact in facts.out_facts {
                summary.union(fact);
            }
        } else {
            for &exit in facts.exits {
                summary.union(&facts.out_facts[exit]);
            }
        }
        summary
    }
}

/// Selects one of the strategies above at run time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SummaryKind {
    #[default]
    LastVisited,
    JoinExits,
}

impl SummaryStrategy for SummaryKind {
    fn summarize(&self, facts: &FixpointFacts<'_>) -> PointsToGraph {
        match self {
            SummaryKind::LastVisited => LastVisited.summarize(facts),
            SummaryKind::JoinExits => JoinExits.summarize(facts),
        }
    }
}

impl fmt::Display for SummaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryKind::LastVisited => f.write_str("last-visited"),
            SummaryKind::JoinExits => f.write_str("join-exits"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::site::SiteCache;
    use crate::ir::Var;
    use crate::pts_set::points_to::PointsToSet;

    fn facts_for(labels: &[&str], sites: &mut SiteCache) -> Vec<PointsToGraph> {
        labels
            .iter()
            .map(|label| {
                let mut g = PointsToGraph::new();
                g.set_nodes_for_variable(Var::from("x"), std::iter::once(sites.get_node_id(label)).collect());
                g
            })
            .collect()
    }

    #[test]
    fn last_visited_picks_one_fact() {
        let mut sites = SiteCache::new();
        let out_facts = facts_for(&["1", "2", "3"], &mut sites);
        let facts = FixpointFacts {
            out_facts: &out_facts,
            exits: &[0, 2],
            last_visited: 2,
        };
        assert_eq!(LastVisited.summarize(&facts), out_facts[2]);
        assert_eq!(SummaryKind::LastVisited.summarize(&facts), out_facts[2]);
    }

    #[test]
    fn join_exits_joins_every_exit() {
        let mut sites = SiteCache::new();
        let out_facts = facts_for(&["1", "2", "3"], &mut sites);
        let facts = FixpointFacts {
            out_facts: &out_facts,
            exits: &[0, 2],
            last_visited: 2,
        };
        let summary = SummaryKind::JoinExits.summarize(&facts);
        let x = summary.get_nodes_for_variable("x").unwrap();
        assert_eq!(x.count(), 2);
        assert!(x.contains(sites.get_node_id("1")));
        assert!(!x.contains(sites.get_node_id("2")));
    }

    #[test]
    fn join_exits_without_exits_joins_everything() {
        let mut sites = SiteCache::new();
        let out_facts = facts_for(&["1", "2"], &mut sites);
        let facts = FixpointFacts {
            out_facts: &out_facts,
            exits: &[],
            last_visited: 1,
        };
        let summary = JoinExits.summarize(&facts);
        assert_eq!(summary.get_nodes_for_variable("x").unwrap().count(), 2);
    }
}
