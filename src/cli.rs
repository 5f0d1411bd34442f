use std::collections::HashMap;
use std::env;

use tracing::error;

use crate::config::{RosterConfig, RosterConstraints};
use crate::data::export::{render_table, write_solution_csv, RosterSummary};
use crate::data::load::load_candidates;
use crate::data::merge::{merge_files, AliasMap, DEFAULT_MERGED_OUTPUT_PATH};
use crate::data::validate::{validate_candidate_file, ValidationSeverity};
use crate::optimizer::sweep::sweep_salary_caps;
use crate::optimizer::{optimize_roster, OptimizeError};
use crate::parallel::WorkerPool;
use crate::server;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_INFEASIBLE: i32 = 3;
pub const EXIT_SOLVER: i32 = 4;

const USAGE: &str = "usage: rinkroster <optimize|sweep|merge|validate|serve>";

/// Flags that take no value.
const SWITCHES: &[&str] = &["--json", "--table"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Optimize,
    Sweep,
    Merge,
    Validate,
    Serve,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("optimize") => Some(Command::Optimize),
        Some("sweep") => Some(Command::Sweep),
        Some("merge") => Some(Command::Merge),
        Some("validate") => Some(Command::Validate),
        Some("serve") => Some(Command::Serve),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    let Some(command) = parse_command(args) else {
        eprintln!("{USAGE}");
        return EXIT_USAGE;
    };
    let parsed = match ParsedArgs::parse(args.get(2..).unwrap_or_default()) {
        Ok(parsed) => parsed,
        Err(msg) => {
            eprintln!("{msg}");
            return EXIT_USAGE;
        }
    };

    match command {
        Command::Optimize => handle_optimize(&parsed),
        Command::Sweep => handle_sweep(&parsed),
        Command::Merge => handle_merge(&parsed),
        Command::Validate => handle_validate(&parsed),
        Command::Serve => handle_serve(),
    }
}

/// Positional arguments plus `--flag value` pairs, in any order.
#[derive(Debug, Default)]
struct ParsedArgs {
    positional: Vec<String>,
    flags: HashMap<String, String>,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Result<Self, String> {
        let mut parsed = Self::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if SWITCHES.contains(&arg.as_str()) {
                parsed.flags.insert(arg.clone(), String::new());
            } else if arg.starts_with("--") {
                let value = iter
                    .next()
                    .ok_or_else(|| format!("missing value for {arg}"))?;
                parsed.flags.insert(arg.clone(), value.clone());
            } else {
                parsed.positional.push(arg.clone());
            }
        }
        Ok(parsed)
    }

    fn has(&self, flag: &str) -> bool {
        self.flags.contains_key(flag)
    }

    fn value(&self, flag: &str) -> Option<&str> {
        self.flags.get(flag).map(String::as_str)
    }

    fn parsed<T: std::str::FromStr>(&self, flag: &str) -> Result<Option<T>, String> {
        match self.value(flag) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| format!("invalid value '{raw}' for {flag}")),
        }
    }
}

/// Config file (explicit `--config` or the default path) with flag overrides applied.
fn resolve_config(parsed: &ParsedArgs) -> Result<RosterConfig, String> {
    let mut config = match parsed.value("--config") {
        Some(path) => RosterConfig::load(path),
        None => RosterConfig::load_default(),
    }
    .map_err(|err| format!("config error: {err}"))?;

    let constraints: &mut RosterConstraints = &mut config.constraints;
    if let Some(cap) = parsed.parsed::<f64>("--cap")? {
        constraints.salary_cap = cap;
    }
    if let Some(forwards) = parsed.parsed::<u32>("--forwards")? {
        constraints.forwards_needed = forwards;
    }
    if let Some(defense) = parsed.parsed::<u32>("--defense")? {
        constraints.defensemen_needed = defense;
    }
    if let Some(goalies) = parsed.parsed::<u32>("--goalies")? {
        constraints.goalies_needed = goalies;
    }
    if let Some(limit) = parsed.parsed::<f64>("--time-limit")? {
        constraints.time_limit_seconds = Some(limit);
    }
    if let Some(out) = parsed.value("--out") {
        config.output_path = Some(out.to_string());
    }
    config.check().map_err(|err| format!("config error: {err}"))
}

fn optimize_exit_code(err: &OptimizeError) -> i32 {
    match err {
        OptimizeError::Validation { .. } => EXIT_FAILURE,
        OptimizeError::Infeasible(_) => EXIT_INFEASIBLE,
        OptimizeError::Solver(_) => EXIT_SOLVER,
    }
}

fn handle_optimize(parsed: &ParsedArgs) -> i32 {
    let Some(input) = parsed.positional.first() else {
        eprintln!("usage: rinkroster optimize <players.csv> [--out path] [--json] [--config file] [--cap n] [--forwards n] [--defense n] [--goalies n] [--time-limit secs]");
        return EXIT_USAGE;
    };
    let config = match resolve_config(parsed) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("{msg}");
            return EXIT_USAGE;
        }
    };

    let candidates = match load_candidates(input) {
        Ok(candidates) => candidates,
        Err(err) => {
            error!(error = %err, "failed to load candidates");
            eprintln!("load failed: {err}");
            return EXIT_FAILURE;
        }
    };

    let solution = match optimize_roster(&candidates, &config.constraints) {
        Ok(solution) => solution,
        Err(err) => {
            error!(kind = err.kind(), error = %err, "roster optimization failed");
            eprintln!("{err}");
            return optimize_exit_code(&err);
        }
    };

    let output_path = config.output_path();
    let summary: RosterSummary = match write_solution_csv(output_path, &solution) {
        Ok(summary) => summary,
        Err(err) => {
            eprintln!("failed to write roster: {err}");
            return EXIT_FAILURE;
        }
    };

    if parsed.has("--json") {
        let payload = serde_json::json!({
            "output_path": output_path,
            "roster": solution.selected,
            "summary": summary,
        });
        match serde_json::to_string_pretty(&payload) {
            Ok(payload) => println!("{payload}"),
            Err(err) => {
                eprintln!("failed to serialize optimization result: {err}");
                return EXIT_FAILURE;
            }
        }
    } else {
        println!("{}", render_table(&solution));
        println!("roster written to {output_path}");
    }
    EXIT_OK
}

fn handle_sweep(parsed: &ParsedArgs) -> i32 {
    let usage = "usage: rinkroster sweep <players.csv> <cap> [<cap>...] [--workers n] [--config file]";
    let Some((input, raw_caps)) = parsed.positional.split_first() else {
        eprintln!("{usage}");
        return EXIT_USAGE;
    };
    if raw_caps.is_empty() {
        eprintln!("{usage}");
        return EXIT_USAGE;
    }
    let caps: Vec<f64> = match raw_caps
        .iter()
        .map(|raw| raw.parse::<f64>().map_err(|_| format!("invalid cap '{raw}'")))
        .collect()
    {
        Ok(caps) => caps,
        Err(msg) => {
            eprintln!("{msg}");
            return EXIT_USAGE;
        }
    };
    let (config, workers) = match resolve_config(parsed)
        .and_then(|config| Ok((config, parsed.parsed::<usize>("--workers")?.unwrap_or(0))))
    {
        Ok(resolved) => resolved,
        Err(msg) => {
            eprintln!("{msg}");
            return EXIT_USAGE;
        }
    };

    let candidates = match load_candidates(input) {
        Ok(candidates) => candidates,
        Err(err) => {
            eprintln!("load failed: {err}");
            return EXIT_FAILURE;
        }
    };

    match sweep_salary_caps(&candidates, &config.constraints, &caps, &WorkerPool::with_workers(workers)) {
        Ok(points) => match serde_json::to_string_pretty(&points) {
            Ok(payload) => {
                println!("{payload}");
                EXIT_OK
            }
            Err(err) => {
                eprintln!("failed to serialize sweep result: {err}");
                EXIT_FAILURE
            }
        },
        Err(err) => {
            eprintln!("{err}");
            optimize_exit_code(&err)
        }
    }
}

fn handle_merge(parsed: &ParsedArgs) -> i32 {
    let [scores, salaries, ..] = parsed.positional.as_slice() else {
        eprintln!("usage: rinkroster merge <scores.csv> <salaries.csv> [--out path] [--aliases aliases.json]");
        return EXIT_USAGE;
    };
    let aliases = match parsed.value("--aliases") {
        Some(path) => match AliasMap::load(path) {
            Ok(aliases) => aliases,
            Err(err) => {
                eprintln!("alias map error: {err}");
                return EXIT_FAILURE;
            }
        },
        None => AliasMap::builtin(),
    };
    let output = parsed.value("--out").unwrap_or(DEFAULT_MERGED_OUTPUT_PATH);

    match merge_files(scores, salaries, output, &aliases) {
        Ok(report) => {
            println!(
                "merge complete: matched={}, unmatched={}, duplicates_dropped={}, output='{}'",
                report.matched_rows,
                report.unmatched_players.len(),
                report.score_duplicates_dropped + report.salary_duplicates_dropped,
                output
            );
            EXIT_OK
        }
        Err(err) => {
            eprintln!("merge failed: {err}");
            EXIT_FAILURE
        }
    }
}

fn handle_validate(parsed: &ParsedArgs) -> i32 {
    let Some(path) = parsed.positional.first() else {
        eprintln!("usage: rinkroster validate <players.csv>");
        return EXIT_USAGE;
    };

    match validate_candidate_file(path) {
        Ok(report) if report.has_errors() => {
            eprintln!(
                "validation failed: {} error(s), {} warning(s)",
                report.count(ValidationSeverity::Error),
                report.count(ValidationSeverity::Warning)
            );
            for diagnostic in &report.diagnostics {
                eprintln!("- {diagnostic}");
            }
            EXIT_FAILURE
        }
        Ok(report) => {
            println!("validation passed: {path} ({} rows)", report.rows);
            for diagnostic in &report.diagnostics {
                println!("- {diagnostic}");
            }
            EXIT_OK
        }
        Err(err) => {
            eprintln!("validation failed: {err}");
            EXIT_FAILURE
        }
    }
}

fn handle_serve() -> i32 {
    let bind_addr = env::var("RINKROSTER_BIND").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    match server::run_server(&bind_addr) {
        Ok(()) => EXIT_OK,
        Err(err) => {
            eprintln!("server error: {err}");
            EXIT_FAILURE
        }
    }
}
