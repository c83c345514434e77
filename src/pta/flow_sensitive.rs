// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Intraprocedural flow-sensitive points-to analysis.
//!
//! Every control-flow node owns an IN and an OUT points-to graph. Nodes are
//! visited round-robin in program order; a node's IN is the join of its
//! predecessors' OUT facts and its OUT is the transfer of its statement over
//! IN. Passes repeat until one full pass changes no fact.

use std::collections::HashMap;
use std::time::Instant;

use log::*;

use super::summary_strategy::{FixpointFacts, SummaryStrategy};
use super::transfer::Transfer;
use super::{AnalysisError, AnalysisResult, PointerAnalysis};
use crate::graph::cfg::FlowGraph;
use crate::graph::points_to_graph::PointsToGraph;
use crate::ir::site::SiteCache;

pub struct FlowSensitivePTA<'cfg, G: FlowGraph, S: SummaryStrategy> {
    cfg: &'cfg G,
    /// Nodes in program order. Every per-node vector below is indexed by
    /// position in this order.
    order: Vec<G::Node>,
    positions: HashMap<G::Node, usize>,
    preds: Vec<Vec<usize>>,
    /// Positions of nodes without successors.
    exits: Vec<usize>,
    transfers: Vec<Transfer>,
    sites: SiteCache,

    in_facts: Vec<PointsToGraph>,
    out_facts: Vec<PointsToGraph>,

    passes: usize,
    last_visited: usize,
    max_passes: Option<usize>,

    strategy: S,
}

impl<'cfg, G: FlowGraph, S: SummaryStrategy> FlowSensitivePTA<'cfg, G, S> {
    /// Checks the front-end contract on `cfg` and resolves every statement.
    /// All facts start at bottom.
    pub fn new(cfg: &'cfg G, strategy: S) -> Result<Self, AnalysisError> {
        let order = cfg.nodes();
        if order.is_empty() {
            return Err(AnalysisError::EmptyCfg);
        }
        let positions: HashMap<G::Node, usize> = order
            .iter()
            .enumerate()
            .map(|(pos, node)| (*node, pos))
            .collect();

        let entry = cfg.entry();
        let Some(&entry_pos) = positions.get(&entry) else {
            return Err(AnalysisError::UnknownEntry {
                entry: format!("{:?}", entry),
            });
        };

        let position_of = |from: G::Node, to: G::Node, endpoint: G::Node| {
            positions
                .get(&endpoint)
                .copied()
                .ok_or_else(|| AnalysisError::DanglingEdge {
                    from: format!("{:?}", from),
                    to: format!("{:?}", to),
                })
        };
        let mut preds = Vec::with_capacity(order.len());
        let mut succs = Vec::with_capacity(order.len());
        for &node in &order {
            let node_preds = cfg
                .predecessors(node)
                .into_iter()
                .map(|pred| position_of(pred, node, pred))
                .collect::<Result<Vec<_>, _>>()?;
            let node_succs = cfg
                .successors(node)
                .into_iter()
                .map(|succ| position_of(node, succ, succ))
                .collect::<Result<Vec<_>, _>>()?;
            preds.push(node_preds);
            succs.push(node_succs);
        }

        let mut reached = vec![false; order.len()];
        let mut stack = vec![entry_pos];
        reached[entry_pos] = true;
        while let Some(pos) = stack.pop() {
            for &succ in &succs[pos] {
                if !reached[succ] {
                    reached[succ] = true;
                    stack.push(succ);
                }
            }
        }
        if let Some(pos) = reached.iter().position(|r| !r) {
            return Err(AnalysisError::UnreachableNode {
                node: format!("{:?}", order[pos]),
            });
        }

        let mut sites = SiteCache::new();
        let mut transfers = Vec::with_capacity(order.len());
        for &node in &order {
            match Transfer::lower(cfg.statement(node), &mut sites) {
                Some(transfer) => transfers.push(transfer),
                None => {
                    return Err(AnalysisError::MissingSiteIdentifier {
                        node: format!("{:?}", node),
                    })
                }
            }
        }

        let exits = succs
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_empty())
            .map(|(pos, _)| pos)
            .collect();

        let num_nodes = order.len();
        Ok(FlowSensitivePTA {
            cfg,
            order,
            positions,
            preds,
            exits,
            transfers,
            sites,
            in_facts: vec![PointsToGraph::new(); num_nodes],
            out_facts: vec![PointsToGraph::new(); num_nodes],
            passes: 0,
            last_visited: num_nodes - 1,
            max_passes: None,
            strategy,
        })
    }

    /// Gives up with `PassLimitExceeded` once `max_passes` passes have run
    /// without reaching the fixpoint.
    pub fn with_max_passes(mut self, max_passes: Option<usize>) -> Self {
        self.max_passes = max_passes;
        self
    }

    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn sites(&self) -> &SiteCache {
        &self.sites
    }

    /// One round-robin pass over all nodes. Returns whether any IN or OUT
    /// fact changed.
    pub fn propagate_once(&mut self) -> bool {
        self.passes += 1;
        let mut changed = false;
        let mut in_fact = PointsToGraph::new();
        let mut out_fact = PointsToGraph::new();
        for pos in 0..self.order.len() {
            in_fact.clear();
            for &pred in &self.preds[pos] {
                in_fact.union(&self.out_facts[pred]);
            }
            self.transfers[pos].transfer(&in_fact, &mut out_fact);
            trace!(
                "pass {}, {:?}: {}",
                self.passes,
                self.order[pos],
                self.cfg.statement(self.order[pos])
            );

            if out_fact != self.out_facts[pos] {
                changed = true;
                std::mem::swap(&mut self.out_facts[pos], &mut out_fact);
            }
            if in_fact != self.in_facts[pos] {
                changed = true;
                std::mem::swap(&mut self.in_facts[pos], &mut in_fact);
            }
            self.last_visited = pos;
        }
        debug!("Pass {} finished, changed: {}", self.passes, changed);
        changed
    }

    /// Runs passes until one full pass leaves every fact unchanged.
    pub fn solve(&mut self) -> Result<(), AnalysisError> {
        loop {
            if let Some(max) = self.max_passes {
                if self.passes >= max {
                    warn!("No fixpoint after {} passes", self.passes);
                    return Err(AnalysisError::PassLimitExceeded { passes: self.passes });
                }
            }
            if !self.propagate_once() {
                return Ok(());
            }
        }
    }

    pub fn in_fact(&self, node: G::Node) -> Option<&PointsToGraph> {
        self.positions.get(&node).map(|pos| &self.in_facts[*pos])
    }

    pub fn out_fact(&self, node: G::Node) -> Option<&PointsToGraph> {
        self.positions.get(&node).map(|pos| &self.out_facts[*pos])
    }

    /// The whole-procedure graph chosen by the summary strategy.
    pub fn summary(&self) -> PointsToGraph {
        self.strategy.summarize(&FixpointFacts {
            out_facts: &self.out_facts,
            exits: &self.exits,
            last_visited: self.last_visited,
        })
    }

    /// Consumes the analysis and packages its converged facts.
    pub fn finish(self) -> AnalysisResult<G::Node> {
        let summary = self.summary();
        AnalysisResult {
            order: self.order,
            positions: self.positions,
            in_facts: self.in_facts,
            out_facts: self.out_facts,
            summary,
            sites: self.sites,
            passes: self.passes,
        }
    }
}

impl<'cfg, G: FlowGraph, S: SummaryStrategy> PointerAnalysis for FlowSensitivePTA<'cfg, G, S> {
    fn analyze(&mut self) -> Result<(), AnalysisError> {
        let now = Instant::now();
        info!("Analyzing {} control-flow nodes...", self.order.len());
        self.solve()?;
        let elapsed = now.elapsed();
        info!("Fixpoint reached after {} passes", self.passes);
        info!(
            "Analysis time: {}",
            humantime::format_duration(elapsed).to_string()
        );
        Ok(())
    }
}
