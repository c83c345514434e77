// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The main routine of `pta`.
//!
//! Loads a JSON procedure description, runs the flow-sensitive analysis over
//! it and answers the alias queries given on the command line.

use anyhow::{anyhow, Context, Result};
use log::*;
use std::env;
use std::io::{self, Write};

use flowpta::builder::cfg_builder;
use flowpta::pta;
use flowpta::util::options::AnalysisOptions;
use flowpta::util::pta_statistics::FlowSensitiveStat;
use flowpta::util::results_dumper;

fn run(options: &AnalysisOptions) -> Result<()> {
    let procedure = options
        .procedure
        .as_deref()
        .ok_or_else(|| anyhow!("no procedure given, usage: pta [OPTIONS] PROCEDURE"))?;
    let cfg = cfg_builder::load_procedure(procedure)
        .with_context(|| format!("failed to load procedure {}", procedure))?;

    info!("Summary strategy: {}", options.summary);
    let result = pta::analyze_with(&cfg, options)
        .with_context(|| format!("analysis of {} failed", cfg.name()))?;

    let oracle = result.oracle();
    let mut stdout = io::stdout().lock();
    for query in &options.alias_queries {
        writeln!(stdout, "{}: {}", query, oracle.answer(query))?;
    }
    stdout.flush()?;
    drop(stdout);

    results_dumper::dump_results(&result, options).context("failed to dump results")?;
    if options.dump_stats {
        FlowSensitiveStat::new(&result)
            .dump_stats()
            .context("failed to dump statistics")?;
    }
    Ok(())
}

fn main() {
    // Initialize loggers.
    if env::var("PTA_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("PTA_LOG")
            .write_style("PTA_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    // Get any options specified via the PTA_FLAGS environment variable
    let mut options = AnalysisOptions::default();
    let pta_flags = env::var("PTA_FLAGS").unwrap_or_default();
    let pta_args: Vec<String> = serde_json::from_str(&pta_flags).unwrap_or_default();
    if let Err(e) = options.parse_from_args(&pta_args) {
        e.exit();
    }

    // Let arguments supplied on the command line override the environment variable.
    let args = env::args().skip(1).collect::<Vec<_>>();
    if let Err(e) = options.parse_from_args(&args) {
        e.exit();
    }
    info!("PTA Options: {:?}", options);

    let exit_code = match run(&options) {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            1
        }
    };
    std::process::exit(exit_code);
}
