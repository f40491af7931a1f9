//! banker-check: run Banker's-algorithm request checks over a stream of cases.
//!
//! Usage:
//!   banker-check < cases.txt
//!   banker-check --input cases.txt --strict --trace
//!   banker-check --config banker.json --summary-json
//!   banker-check --generate 20 --seed 12345 > cases.txt

use anyhow::Result;
use bankers_core::{
    config::{BankerConfig, RequestPolicy},
    engine::{BankerEngine, RunSummary},
    scenario::ScenarioGenerator,
};
use std::env;
use std::fs::File;
use std::io::{self, BufReader, Write};

#[derive(serde::Serialize)]
struct CliSummary<'a> {
    input:   &'a str,
    policy:  RequestPolicy,
    #[serde(flatten)]
    summary: RunSummary,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let trace = args.iter().any(|a| a == "--trace");
    let summary_json = args.iter().any(|a| a == "--summary-json");
    let input = flag_value(&args, "--input").unwrap_or("-");

    let mut config = match flag_value(&args, "--config") {
        Some(path) => BankerConfig::load(path)?,
        None => BankerConfig::default(),
    };
    if args.iter().any(|a| a == "--strict") {
        config.policy = RequestPolicy::Strict;
    }

    if let Some(count) = flag_value(&args, "--generate") {
        let count: usize = count
            .parse()
            .map_err(|e| anyhow::anyhow!("--generate expects a count, got '{count}': {e}"))?;
        let seed = parse_arg(&args, "--seed", 42u64);
        return generate(&config, count, seed);
    }

    log::info!("banker-check: input={input} policy={:?}", config.policy);

    let policy = config.policy;
    let mut engine = BankerEngine::new(config);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let stderr = io::stderr();
    let mut err = stderr.lock();

    let summary = if input == "-" {
        engine.run(io::stdin().lock(), &mut out, &mut err)?
    } else {
        let file = File::open(input).map_err(|e| anyhow::anyhow!("Cannot open {input}: {e}"))?;
        engine.run(BufReader::new(file), &mut out, &mut err)?
    };

    if trace {
        engine.write_trace(&mut err)?;
    }
    if summary_json {
        let report = CliSummary { input, policy, summary };
        writeln!(err, "{}", serde_json::to_string(&report)?)?;
    }
    Ok(())
}

/// Write `count` seeded random cases in the record grammar to stdout.
fn generate(config: &BankerConfig, count: usize, seed: u64) -> Result<()> {
    let mut generator = ScenarioGenerator::new(seed);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for _ in 0..count {
        let case = generator.random_case();
        write!(out, "{}", case.to_record(&config.grammar))?;
    }
    out.flush()?;
    log::info!("generated {count} cases from seed {seed}");
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
