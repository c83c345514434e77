// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Analysis options.

use clap::{Arg, ArgMatches, Command};

use crate::pta::alias::AliasQuery;
use crate::pta::summary_strategy::SummaryKind;

const PTA_USAGE: &str = r#"pta [OPTIONS] PROCEDURE"#;

/// The version information from Cargo.toml.
fn version() -> &'static str {
    let version_info = rustc_tools_util::get_version_info!();
    let version = format!("v{}.{}.{}", version_info.major, version_info.minor, version_info.patch);
    Box::leak(version.into_boxed_str())
}

fn parse_alias_query(s: &str) -> Result<AliasQuery, crate::pta::alias::QueryParseError> {
    s.parse()
}

/// Creates the clap::Command metadata for argument parsing.
fn make_options_parser() -> Command<'static> {
    Command::new("pta")
        .no_binary_name(true)
        .override_usage(PTA_USAGE)
        .version(version())
        .arg(Arg::new("summary")
            .long("summary")
            .takes_value(true)
            .value_parser(["last-visited", "join-exits"])
            .help("How the per-node facts are collapsed for whole-procedure queries.")
            .long_help("`last-visited` answers queries against the OUT fact of the last node visited in the \
                        final pass. `join-exits` answers them against the join of the OUT facts of all exit nodes."))
        .arg(Arg::new("max-passes")
            .long("max-passes")
            .takes_value(true)
            .value_parser(clap::value_parser!(u32))
            .help("Give up if no fixpoint is reached after this many passes."))
        .arg(Arg::new("alias")
            .long("alias")
            .takes_value(true)
            .multiple_occurrences(true)
            .value_parser(parse_alias_query)
            .help("An alias query, `a~b` or `a.f~b`. May be repeated."))
        .arg(Arg::new("dump-stats")
            .long("dump-stats")
            .takes_value(false)
            .help("Dump the statistics of the analysis results."))
        .arg(Arg::new("pts-output")
            .long("dump-pts")
            .takes_value(true)
            .help("Dump the summary points-to sets to the output file, or `stdout`."))
        .arg(Arg::new("dot-output")
            .long("dump-dot")
            .takes_value(true)
            .help("Dump the summary points-to graph in DOT format to the output file, or `stdout`."))
        .arg(Arg::new("facts-output")
            .long("dump-facts")
            .takes_value(true)
            .help("Dump the OUT fact of every control-flow node to the output file, or `stdout`."))
        .arg(Arg::new("PROCEDURE")
            .help("The JSON procedure description to be analyzed."))
}

#[derive(Clone, Debug)]
pub struct AnalysisOptions {
    pub summary: SummaryKind,
    pub max_passes: Option<usize>,
    pub alias_queries: Vec<AliasQuery>,

    pub dump_stats: bool,
    pub pts_output: Option<String>,
    pub dot_output: Option<String>,
    pub facts_output: Option<String>,

    pub procedure: Option<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            summary: SummaryKind::LastVisited,
            max_passes: None,
            alias_queries: Vec::new(),
            dump_stats: false,
            pts_output: None,
            dot_output: None,
            facts_output: None,
            procedure: None,
        }
    }
}

impl AnalysisOptions {
    /// Parses options from a list of strings. Options already set are only
    /// overridden by those present in `args`; alias queries accumulate.
    pub fn parse_from_args(&mut self, args: &[String]) -> Result<(), clap::Error> {
        let matches = make_options_parser().try_get_matches_from(args.iter())?;
        self.update_from_matches(&matches);
        Ok(())
    }

    fn update_from_matches(&mut self, matches: &ArgMatches) {
        if let Some(summary) = matches.get_one::<String>("summary") {
            self.summary = match summary.as_str() {
                "join-exits" => SummaryKind::JoinExits,
                _ => SummaryKind::LastVisited,
            };
        }
        if let Some(max) = matches.get_one::<u32>("max-passes") {
            self.max_passes = Some(*max as usize);
        }
        if let Some(queries) = matches.get_many::<AliasQuery>("alias") {
            self.alias_queries.extend(queries.cloned());
        }

        if matches.contains_id("dump-stats") {
            self.dump_stats = true;
        }
        if let Some(s) = matches.get_one::<String>("pts-output") {
            self.pts_output = Some(s.clone());
        }
        if let Some(s) = matches.get_one::<String>("dot-output") {
            self.dot_output = Some(s.clone());
        }
        if let Some(s) = matches.get_one::<String>("facts-output") {
            self.facts_output = Some(s.clone());
        }
        if let Some(s) = matches.get_one::<String>("PROCEDURE") {
            self.procedure = Some(s.clone());
        }
    }
}
