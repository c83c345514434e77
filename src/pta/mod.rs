// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;
use std::hash::Hash;
use thiserror::Error;

use self::alias::AliasOracle;
use self::flow_sensitive::FlowSensitivePTA;
use crate::graph::cfg::FlowGraph;
use crate::graph::points_to_graph::PointsToGraph;
use crate::ir::site::SiteCache;
use crate::pts_set::points_to::HybridPointsToSet;
use crate::util::options::AnalysisOptions;

pub mod alias;
pub mod flow_sensitive;
pub mod summary_strategy;
pub mod transfer;

pub type PointsTo<T> = HybridPointsToSet<T>;

/// Front-end contract violations and resource limits. Each one aborts the
/// analysis run that hit it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("allocation at {node} has no site identifier")]
    MissingSiteIdentifier { node: String },
    #[error("the control-flow graph has no nodes")]
    EmptyCfg,
    #[error("entry {entry} is not a node of the control-flow graph")]
    UnknownEntry { entry: String },
    #[error("edge {from} -> {to} leaves the control-flow graph")]
    DanglingEdge { from: String, to: String },
    #[error("{node} is unreachable from the entry")]
    UnreachableNode { node: String },
    #[error("no fixpoint after {passes} passes")]
    PassLimitExceeded { passes: usize },
}

pub trait PointerAnalysis {
    fn analyze(&mut self) -> Result<(), AnalysisError>;
}

/// The converged facts of one procedure.
#[derive(Debug)]
pub struct AnalysisResult<N> {
    /// Control-flow nodes in program order; the fact vectors are parallel to it.
    pub(crate) order: Vec<N>,
    pub(crate) positions: HashMap<N, usize>,
    pub(crate) in_facts: Vec<PointsToGraph>,
    pub(crate) out_facts: Vec<PointsToGraph>,
    pub(crate) summary: PointsToGraph,
    pub(crate) sites: SiteCache,
    pub(crate) passes: usize,
}

impl<N: Copy + Eq + Hash> AnalysisResult<N> {
    /// The graph whole-procedure queries run against.
    pub fn summary(&self) -> &PointsToGraph {
        &self.summary
    }

    /// Alias queries over the summary graph.
    pub fn oracle(&self) -> AliasOracle<'_> {
        AliasOracle::new(&self.summary)
    }

    pub fn sites(&self) -> &SiteCache {
        &self.sites
    }

    /// Number of passes run, including the final one that changed nothing.
    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn nodes(&self) -> &[N] {
        &self.order
    }

    pub fn in_fact(&self, node: N) -> Option<&PointsToGraph> {
        self.positions.get(&node).map(|pos| &self.in_facts[*pos])
    }

    pub fn out_fact(&self, node: N) -> Option<&PointsToGraph> {
        self.positions.get(&node).map(|pos| &self.out_facts[*pos])
    }
}

/// Runs the analysis to convergence, summarising with the OUT fact of the
/// last visited node.
pub fn analyze<G: FlowGraph>(cfg: &G) -> Result<AnalysisResult<G::Node>, AnalysisError> {
    analyze_with(cfg, &AnalysisOptions::default())
}

/// Runs the analysis with the summary strategy and pass limit in `options`.
pub fn analyze_with<G: FlowGraph>(
    cfg: &G,
    options: &AnalysisOptions,
) -> Result<AnalysisResult<G::Node>, AnalysisError> {
    let mut pta = FlowSensitivePTA::new(cfg, options.summary)?
        .with_max_passes(options.max_passes);
    pta.analyze()?;
    Ok(pta.finish())
}
