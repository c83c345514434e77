// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use petgraph::graph::{DefaultIx, NodeIndex};
use petgraph::{Direction, Graph};
use std::fmt::Debug;
use std::hash::Hash;

use crate::ir::statement::Statement;

/// Unique identifiers for nodes of a `ControlFlowGraph`.
pub type CfgNodeId = NodeIndex<DefaultIx>;

/// What the analysis needs to know about a procedure. Implemented by the
/// host front end; the engine never builds control flow itself.
pub trait FlowGraph {
    type Node: Copy + Eq + Hash + Debug;

    /// The unique entry node.
    fn entry(&self) -> Self::Node;
    /// Every node, in a stable program order.
    fn nodes(&self) -> Vec<Self::Node>;
    fn predecessors(&self, node: Self::Node) -> Vec<Self::Node>;
    fn successors(&self, node: Self::Node) -> Vec<Self::Node>;
    /// The classified statement at `node`.
    fn statement(&self, node: Self::Node) -> &Statement;
}

#[derive(Debug)]
pub struct CfgNode {
    pub stmt: Statement,
}

/// A procedure body held in a petgraph graph, one statement per node.
/// Node order is insertion order.
#[derive(Debug)]
pub struct ControlFlowGraph {
    pub(crate) name: String,
    pub(crate) graph: Graph<CfgNode, ()>,
    entry: Option<CfgNodeId>,
}

impl Default for ControlFlowGraph {
    fn default() -> Self {
        Self::new("")
    }
}

impl ControlFlowGraph {
    pub fn new(name: &str) -> Self {
        ControlFlowGraph {
            name: name.to_string(),
            graph: Graph::new(),
            entry: None,
        }
    }

    /// Builds a straight-line procedure where each statement falls through
    /// to the next one.
    pub fn straight_line(name: &str, stmts: Vec<Statement>) -> Self {
        let mut cfg = Self::new(name);
        let mut prev: Option<CfgNodeId> = None;
        for stmt in stmts {
            let node = cfg.add_stmt(stmt);
            if let Some(prev) = prev {
                cfg.add_edge(prev, node);
            }
            prev = Some(node);
        }
        cfg
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a statement node. The first node added is the entry unless
    /// `set_entry` says otherwise.
    pub fn add_stmt(&mut self, stmt: Statement) -> CfgNodeId {
        let node = self.graph.add_node(CfgNode { stmt });
        if self.entry.is_none() {
            self.entry = Some(node);
        }
        node
    }

    /// Adds a control-flow edge; duplicates are ignored.
    pub fn add_edge(&mut self, from: CfgNodeId, to: CfgNodeId) {
        self.graph.update_edge(from, to, ());
    }

    pub fn set_entry(&mut self, entry: CfgNodeId) {
        self.entry = Some(entry);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    fn neighbors(&self, node: CfgNodeId, dir: Direction) -> Vec<CfgNodeId> {
        let mut neighbors = self.graph.neighbors_directed(node, dir).collect::<Vec<_>>();
        // petgraph yields the most recently added edge first
        neighbors.sort();
        neighbors
    }
}

impl FlowGraph for ControlFlowGraph {
    type Node = CfgNodeId;

    /// An empty graph reports index 0, which the engine rejects as unknown.
    fn entry(&self) -> CfgNodeId {
        self.entry.unwrap_or_else(|| CfgNodeId::new(0))
    }

    fn nodes(&self) -> Vec<CfgNodeId> {
        self.graph.node_indices().collect()
    }

    fn predecessors(&self, node: CfgNodeId) -> Vec<CfgNodeId> {
        self.neighbors(node, Direction::Incoming)
    }

    fn successors(&self, node: CfgNodeId) -> Vec<CfgNodeId> {
        self.neighbors(node, Direction::Outgoing)
    }

    fn statement(&self, node: CfgNodeId) -> &Statement {
        &self.graph[node].stmt
    }
}
