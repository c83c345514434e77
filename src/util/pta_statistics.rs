// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use log::*;
use std::hash::Hash;
use std::io::{self, BufWriter, Write};

use crate::pta::AnalysisResult;
use crate::pts_set::points_to::PointsToSet;

pub struct FlowSensitiveStat<'a, N> {
    result: &'a AnalysisResult<N>,
}

impl<'a, N: Copy + Eq + Hash> FlowSensitiveStat<'a, N> {
    pub fn new(result: &'a AnalysisResult<N>) -> Self {
        FlowSensitiveStat { result }
    }

    pub fn dump_stats(&self) -> io::Result<()> {
        let mut stat_writer = BufWriter::new(Box::new(io::stdout()) as Box<dyn Write>);
        self.write_stats(&mut stat_writer)?;
        stat_writer.flush()
    }

    pub fn write_stats<W: Write>(&self, stat_writer: &mut W) -> io::Result<()> {
        info!("Dumping pta statistics...");
        stat_writer.write_all("##########################################################\n".as_bytes())?;
        self.dump_fixpoint_stat(stat_writer)?;
        stat_writer.write_all("----------------------------------------------------------\n".as_bytes())?;
        self.dump_pts_stat(stat_writer)?;
        stat_writer.write_all("##########################################################\n".as_bytes())
    }

    pub fn dump_fixpoint_stat<W: Write>(&self, stat_writer: &mut W) -> io::Result<()> {
        stat_writer.write_all("Fixpoint Statistics: \n".as_bytes())?;
        stat_writer.write_all(format!("#CFG nodes: {}\n", self.result.nodes().len()).as_bytes())?;
        stat_writer.write_all(format!("#Passes: {}\n", self.result.passes()).as_bytes())?;
        stat_writer.write_all(format!("#Allocation sites: {}\n", self.result.sites().len()).as_bytes())
    }

    pub fn dump_pts_stat<W: Write>(&self, stat_writer: &mut W) -> io::Result<()> {
        let summary = self.result.summary();
        let num_pointers = summary.variable_count();
        let num_pts_relations: usize = summary.variables().map(|(_, pts)| pts.count()).sum();
        let avg_pts = if num_pointers == 0 {
            0.0
        } else {
            num_pts_relations as f64 / num_pointers as f64
        };

        stat_writer.write_all("Points-to Statistics: \n".as_bytes())?;
        stat_writer.write_all(format!("#Abstract objects: {}\n", summary.nodes().count()).as_bytes())?;
        stat_writer.write_all(format!("#Field edges: {}\n", summary.edge_count()).as_bytes())?;
        stat_writer.write_all(format!("#Pointers: {}\n", num_pointers).as_bytes())?;
        stat_writer.write_all(format!("#Points-to relations: {}\n", num_pts_relations).as_bytes())?;
        stat_writer.write_all(format!("#Avg points-to size: {}\n", avg_pts).as_bytes())
    }
}
