// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.
//
// Whole-procedure alias queries over the JSON procedures in `tests/procedures`.

use std::path::PathBuf;

use flowpta::builder::cfg_builder::{self, ProcedureError};
use flowpta::graph::cfg::ControlFlowGraph;
use flowpta::pta::alias::{may_alias, may_alias_via_field};
use flowpta::pta::summary_strategy::SummaryKind;
use flowpta::pta::{self, AnalysisError, AnalysisResult};
use flowpta::pts_set::points_to::PointsToSet;
use flowpta::util::options::AnalysisOptions;

fn procedure(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("procedures")
        .join(format!("{}.json", name))
}

fn load(name: &str) -> ControlFlowGraph {
    cfg_builder::load_procedure(procedure(name)).unwrap()
}

fn analyze(cfg: &ControlFlowGraph, summary: SummaryKind) -> AnalysisResult<flowpta::graph::cfg::CfgNodeId> {
    let options = AnalysisOptions {
        summary,
        ..Default::default()
    };
    pta::analyze_with(cfg, &options).unwrap()
}

fn has_edge<N: Copy + Eq + std::hash::Hash>(result: &AnalysisResult<N>, src: &str, field: &str, dst: &str) -> bool {
    let sites = result.sites();
    match (sites.find_node_id(src), sites.find_node_id(dst)) {
        (Some(src), Some(dst)) => result.summary().contains_edge(src, field, dst),
        _ => false,
    }
}

#[test]
fn three_way_cycle() {
    let cfg = load("three_way_cycle");
    let result = analyze(&cfg, SummaryKind::LastVisited);
    assert_eq!(result.summary().edge_count(), 3);
    assert!(has_edge(&result, "7", "f1", "8"));
    assert!(has_edge(&result, "8", "f1", "9"));
    assert!(has_edge(&result, "9", "f1", "7"));

    assert!(may_alias(&result, "t", "y"));
    assert!(!may_alias(&result, "t", "x"));
    assert!(!may_alias(&result, "t", "z"));
}

#[test]
fn reassigned_base_kills_old_site() {
    let cfg = load("reassigned_base");
    let result = analyze(&cfg, SummaryKind::LastVisited);
    assert_eq!(result.summary().edge_count(), 3);
    assert!(has_edge(&result, "7", "f1", "8"));
    assert!(has_edge(&result, "10", "f1", "11"));
    assert!(has_edge(&result, "11", "f1", "8"));

    let a = result.summary().get_nodes_for_variable("a").unwrap();
    assert_eq!(a.count(), 1);
    assert!(a.contains(result.sites().find_node_id("10").unwrap()));

    assert!(may_alias(&result, "a", "c"));
    assert!(!may_alias(&result, "a", "b"));
    assert!(may_alias_via_field(&result, "a", "f1", "e"));
    assert!(may_alias_via_field(&result, "c", "f1", "d"));
    assert!(may_alias_via_field(&result, "d", "f1", "b"));
    assert!(!may_alias_via_field(&result, "a", "f1", "b"));
}

#[test]
fn linked_list_loop() {
    let cfg = load("linked_list");
    let result = analyze(&cfg, SummaryKind::LastVisited);
    assert!(has_edge(&result, "1", "next", "2"));
    assert!(has_edge(&result, "2", "next", "2"));
    assert_eq!(result.summary().edge_count(), 2);

    assert!(may_alias(&result, "p", "q"));
    assert!(!may_alias(&result, "head", "p"));
    assert!(may_alias_via_field(&result, "head", "next", "q"));
    assert!(may_alias_via_field(&result, "p", "next", "p"));
}

#[test]
fn summary_strategy_decides_multi_exit_answers() {
    let cfg = load("two_exits");

    let last = analyze(&cfg, SummaryKind::LastVisited);
    assert!(may_alias(&last, "x", "r"));
    assert!(!may_alias_via_field(&last, "x", "f", "r"));
    assert_eq!(last.summary().edge_count(), 0);

    let joined = analyze(&cfg, SummaryKind::JoinExits);
    assert!(may_alias(&joined, "x", "r"));
    assert!(may_alias_via_field(&joined, "x", "f", "r"));
    assert_eq!(joined.summary().get_nodes_for_variable("r").unwrap().count(), 2);
}

#[test]
fn per_node_facts_are_flow_sensitive() {
    let cfg = load("reassigned_base");
    let result = analyze(&cfg, SummaryKind::LastVisited);
    let nodes = result.nodes().to_vec();
    let n7 = result.sites().find_node_id("7").unwrap();
    let n10 = result.sites().find_node_id("10").unwrap();

    let a_before = result.out_fact(nodes[2]).unwrap().get_nodes_for_variable("a").unwrap();
    assert!(a_before.contains(n7) && !a_before.contains(n10));
    assert!(result.in_fact(nodes[0]).unwrap().is_empty());
    assert!(result.out_fact(nodes[2]).unwrap().get_nodes_for_variable("c").is_none());
}

#[test]
fn contract_violations_abort() {
    let cfg = load("missing_site");
    assert!(matches!(
        pta::analyze(&cfg),
        Err(AnalysisError::MissingSiteIdentifier { .. })
    ));

    let cfg = load("unreachable");
    assert!(matches!(
        pta::analyze(&cfg),
        Err(AnalysisError::UnreachableNode { .. })
    ));

    let options = AnalysisOptions {
        max_passes: Some(2),
        ..Default::default()
    };
    assert_eq!(
        pta::analyze_with(&load("linked_list"), &options).err(),
        Some(AnalysisError::PassLimitExceeded { passes: 2 })
    );
}

#[test]
fn bad_procedure_files() {
    assert!(matches!(
        cfg_builder::load_procedure(procedure("does_not_exist")),
        Err(ProcedureError::Io { .. })
    ));
}
