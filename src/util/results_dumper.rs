// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use itertools::Itertools;
use log::*;
use petgraph::dot::Dot;
use petgraph::Graph;
use std::collections::HashMap;
use std::fmt::Debug;
use std::fs::File;
use std::hash::Hash;
use std::io::{self, BufWriter, Write};

use crate::graph::points_to_graph::PointsToGraph;
use crate::ir::site::{NodeId, SiteCache};
use crate::pta::AnalysisResult;
use crate::util::options::AnalysisOptions;

/// Writes every output requested in `options`.
pub fn dump_results<N>(result: &AnalysisResult<N>, options: &AnalysisOptions) -> io::Result<()>
where
    N: Copy + Eq + Hash + Debug,
{
    // dump points-to results
    if let Some(pts_output) = &options.pts_output {
        info!("Dumping points-to results...");
        let mut pts_writer = open_writer(pts_output)?;
        dump_pts(result.summary(), result.sites(), &mut pts_writer)?;
        pts_writer.flush()?;
    }

    // dump per-node facts
    if let Some(facts_output) = &options.facts_output {
        info!("Dumping per-node facts...");
        let mut facts_writer = open_writer(facts_output)?;
        dump_facts(result, &mut facts_writer)?;
        facts_writer.flush()?;
    }

    // dump the summary graph
    if let Some(dot_output) = &options.dot_output {
        info!("Dumping points-to graph...");
        let mut dot_writer = open_writer(dot_output)?;
        dump_dot(result.summary(), result.sites(), &mut dot_writer)?;
        dot_writer.flush()?;
    }
    Ok(())
}

/// `stdout` or a file created at `path`.
pub fn open_writer(path: &str) -> io::Result<BufWriter<Box<dyn Write>>> {
    Ok(BufWriter::new(match path {
        "stdout" => Box::new(io::stdout()) as Box<dyn Write>,
        _ => Box::new(File::create(path)?) as Box<dyn Write>,
    }))
}

/// One line per variable, sorted by name: `x (2) ==> { (7) (8) }`.
pub fn dump_pts<W: Write>(graph: &PointsToGraph, sites: &SiteCache, pts_writer: &mut W) -> io::Result<()> {
    for (var, pts) in graph.variables().sorted_by(|a, b| a.0.cmp(b.0)) {
        let pointees = pts.into_iter().sorted().collect::<Vec<NodeId>>();
        write!(pts_writer, "{} ({}) ==> {{ ", var, pointees.len())?;
        for pointee in pointees {
            write!(pts_writer, "{} ", sites.display(pointee))?;
        }
        pts_writer.write_all("}\n".as_bytes())?;
    }
    Ok(())
}

fn dump_edges<W: Write>(graph: &PointsToGraph, sites: &SiteCache, writer: &mut W) -> io::Result<()> {
    for edge in graph.edges().sorted() {
        writeln!(writer, "\t{}", edge.to_labelled_string(sites))?;
    }
    Ok(())
}

/// The OUT fact of every node in program order.
pub fn dump_facts<N, W>(result: &AnalysisResult<N>, facts_writer: &mut W) -> io::Result<()>
where
    N: Copy + Eq + Hash + Debug,
    W: Write,
{
    for &node in result.nodes() {
        let Some(out) = result.out_fact(node) else {
            continue;
        };
        writeln!(facts_writer, "{:?}:", node)?;
        let mut variables = Vec::new();
        dump_pts(out, result.sites(), &mut variables)?;
        for line in String::from_utf8_lossy(&variables).lines() {
            writeln!(facts_writer, "\t{}", line)?;
        }
        dump_edges(out, result.sites(), facts_writer)?;
    }
    Ok(())
}

/// Renders `graph` in DOT format. Abstract objects are labelled with their
/// site, variables with their name, field edges with the field.
pub fn dump_dot<W: Write>(graph: &PointsToGraph, sites: &SiteCache, dot_writer: &mut W) -> io::Result<()> {
    let mut dot_graph: Graph<String, String> = Graph::new();
    let mut objects = HashMap::new();
    for node in graph.nodes().into_iter().sorted() {
        objects.insert(node, dot_graph.add_node(sites.display(node).to_string()));
    }
    for (var, pts) in graph.variables().sorted_by(|a, b| a.0.cmp(b.0)) {
        let var_node = dot_graph.add_node(var.to_string());
        for pointee in pts.into_iter().sorted() {
            if let Some(&obj) = objects.get(&pointee) {
                dot_graph.add_edge(var_node, obj, String::new());
            }
        }
    }
    for edge in graph.edges().sorted() {
        if let (Some(&src), Some(&dst)) = (objects.get(&edge.src), objects.get(&edge.dst)) {
            dot_graph.add_edge(src, dst, edge.field.to_string());
        }
    }
    write!(dot_writer, "{}", Dot::new(&dot_graph))
}
