// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Builds control-flow graphs from the JSON procedure description.

use log::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::graph::cfg::ControlFlowGraph;
use crate::ir::statement::Statement;

/// A procedure body as written by a front end. Statement indices double as
/// control-flow node indices.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcedureDesc {
    #[serde(default)]
    pub name: Option<String>,
    /// Index of the entry statement, 0 when absent.
    #[serde(default)]
    pub entry: Option<usize>,
    pub statements: Vec<Statement>,
    /// Control-flow edges as `[from, to]` pairs. When absent every statement
    /// falls through to the next one.
    #[serde(default)]
    pub edges: Option<Vec<(usize, usize)>>,
}

#[derive(Debug, Error)]
pub enum ProcedureError {
    #[error("unable to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed procedure description")]
    Json(#[from] serde_json::Error),
    #[error("edge {from} -> {to} refers to a statement outside 0..{len}")]
    EdgeOutOfRange { from: usize, to: usize, len: usize },
    #[error("entry {entry} refers to a statement outside 0..{len}")]
    EntryOutOfRange { entry: usize, len: usize },
}

/// Builds the control-flow graph described by `desc`.
pub fn build_cfg(desc: &ProcedureDesc) -> Result<ControlFlowGraph, ProcedureError> {
    let len = desc.statements.len();
    let name = desc.name.as_deref().unwrap_or("anonymous");
    let mut cfg = ControlFlowGraph::new(name);
    let nodes = desc
        .statements
        .iter()
        .map(|stmt| cfg.add_stmt(stmt.clone()))
        .collect::<Vec<_>>();

    match &desc.edges {
        Some(edges) => {
            for &(from, to) in edges {
                if from >= len || to >= len {
                    return Err(ProcedureError::EdgeOutOfRange { from, to, len });
                }
                cfg.add_edge(nodes[from], nodes[to]);
            }
        }
        None => {
            for pair in nodes.windows(2) {
                cfg.add_edge(pair[0], pair[1]);
            }
        }
    }

    if let Some(entry) = desc.entry {
        let Some(&node) = nodes.get(entry) else {
            return Err(ProcedureError::EntryOutOfRange { entry, len });
        };
        cfg.set_entry(node);
    }

    debug!(
        "Built control-flow graph for {} with {} nodes and {} edges",
        name,
        cfg.node_count(),
        cfg.graph.edge_count()
    );
    Ok(cfg)
}

pub fn parse_procedure(json: &str) -> Result<ProcedureDesc, ProcedureError> {
    Ok(serde_json::from_str(json)?)
}

/// Reads and builds the procedure stored at `path`.
pub fn load_procedure<P: AsRef<Path>>(path: P) -> Result<ControlFlowGraph, ProcedureError> {
    let path = path.as_ref();
    info!("Loading procedure from {}", path.display());
    let json = fs::read_to_string(path).map_err(|source| ProcedureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    build_cfg(&parse_procedure(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::cfg::FlowGraph;

    #[test]
    fn missing_edges_fall_through() {
        let desc = parse_procedure(
            r#"{
                "name": "main",
                "statements": [
                    {"kind": "alloc", "lhs": "x", "site": "7"},
                    {"kind": "copy", "lhs": "y", "rhs": "x"},
                    {"kind": "other"}
                ]
            }"#,
        )
        .unwrap();
        let cfg = build_cfg(&desc).unwrap();
        assert_eq!(cfg.name(), "main");
        let nodes = cfg.nodes();
        assert_eq!(cfg.entry(), nodes[0]);
        assert_eq!(cfg.successors(nodes[0]), vec![nodes[1]]);
        assert_eq!(cfg.successors(nodes[1]), vec![nodes[2]]);
        assert_eq!(cfg.statement(nodes[2]), &Statement::Other);
    }

    #[test]
    fn explicit_edges_and_entry() {
        let desc = parse_procedure(
            r#"{
                "entry": 1,
                "statements": [
                    {"kind": "load", "lhs": "v", "base": "u", "field": "f"},
                    {"kind": "store", "base": "u", "field": "f", "rhs": "u"}
                ],
                "edges": [[1, 0], [0, 1]]
            }"#,
        )
        .unwrap();
        let cfg = build_cfg(&desc).unwrap();
        let nodes = cfg.nodes();
        assert_eq!(cfg.name(), "anonymous");
        assert_eq!(cfg.entry(), nodes[1]);
        assert_eq!(cfg.predecessors(nodes[0]), vec![nodes[1]]);
        assert_eq!(cfg.successors(nodes[0]), vec![nodes[1]]);
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        let mut desc = ProcedureDesc {
            statements: vec![Statement::Other, Statement::Other],
            edges: Some(vec![(0, 2)]),
            ..Default::default()
        };
        assert!(matches!(
            build_cfg(&desc),
            Err(ProcedureError::EdgeOutOfRange { from: 0, to: 2, len: 2 })
        ));
        desc.edges = None;
        desc.entry = Some(3);
        assert!(matches!(
            build_cfg(&desc),
            Err(ProcedureError::EntryOutOfRange { entry: 3, len: 2 })
        ));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            parse_procedure(r#"{"statements": [{"kind": "jump"}]}"#),
            Err(ProcedureError::Json(_))
        ));
        assert!(matches!(
            load_procedure("/nonexistent/procedure.json"),
            Err(ProcedureError::Io { .. })
        ));
    }
}
