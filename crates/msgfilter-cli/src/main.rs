//! msgfilter command-line tool
//!
//! Usage:
//!   msgfilter check --config rules.yaml [--input messages.ndjson] [--output json]
//!   msgfilter validate --config rules.yaml
//!   msgfilter eval --filter '{"path": "$.a", "value": 1}' --message '{"a": 1}'

use anyhow::Context;
use clap::{Parser, Subcommand};
use msgfilter::{GateConfig, Interpreters, Matcher};
use msgfilter_cli::{check_stream, eval_filter, CheckSummary, OutputFormat};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Declarative message filters for queue consumers
#[derive(Parser, Debug)]
#[command(name = "msgfilter")]
#[command(author, version, about = "Validate rule files and run JSON messages through them")]
struct Args {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decide on newline-delimited JSON messages
    Check {
        /// Rule file (YAML, or JSON when the extension is .json)
        #[arg(short, long, env = "MSGFILTER_CONFIG")]
        config: PathBuf,

        /// Message file; stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output format: text (default), json
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },
    /// Load a rule file and compile its scripts
    Validate {
        #[arg(short, long, env = "MSGFILTER_CONFIG")]
        config: PathBuf,
    },
    /// Evaluate one filter document against one message
    Eval {
        /// Filter document as JSON
        #[arg(short, long)]
        filter: String,

        /// Message as JSON
        #[arg(short, long)]
        message: String,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{RED}{BOLD}error:{RESET} {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, rust_log.as_deref()))
        .with_writer(io::stderr)
        .init();
}

/// A non-empty, parseable `RUST_LOG` wins; otherwise `--verbose` picks the level.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(if verbose { "debug" } else { "info" }))
}

fn run(command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Check {
            config,
            input,
            output,
        } => check(&config, input.as_deref(), output),
        Command::Validate { config } => validate(&config),
        Command::Eval { filter, message } => {
            let passed = eval_filter(&filter, &message)?;
            println!("{}", if passed { "pass" } else { "fail" });
            Ok(if passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }
    }
}

fn check(config: &Path, input: Option<&Path>, output: OutputFormat) -> anyhow::Result<ExitCode> {
    let gate = GateConfig::from_file(config)
        .with_context(|| format!("failed to load {}", config.display()))?
        .into_gate();
    tracing::info!("Loaded {} rules from {}", gate.rules().len(), config.display());

    let mut stdout = io::stdout().lock();
    let summary = match input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            check_stream(&gate, BufReader::new(file), &mut stdout, output)?
        }
        None => check_stream(&gate, io::stdin().lock(), &mut stdout, output)?,
    };

    if output == OutputFormat::Text {
        print_summary(&summary);
    }
    Ok(if summary.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_summary(summary: &CheckSummary) {
    eprintln!("{DIM}━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━{RESET}");
    eprintln!("  {DIM}Messages:{RESET} {BOLD}{}{RESET}", summary.messages);
    eprintln!("  {GREEN}Accepted:{RESET} {BOLD}{}{RESET}", summary.accepted);
    eprintln!("  {YELLOW}Requeued:{RESET} {BOLD}{}{RESET}", summary.requeued);
    eprintln!("  {CYAN}Rejected:{RESET} {BOLD}{}{RESET}", summary.rejected);
    if summary.errors > 0 {
        eprintln!("  {RED}Errors:{RESET}   {BOLD}{RED}{}{RESET}", summary.errors);
    } else {
        eprintln!("  {GREEN}Errors:{RESET}   {BOLD}0{RESET}");
    }
}

fn validate(path: &Path) -> anyhow::Result<ExitCode> {
    let config = GateConfig::from_file(path)?;

    println!("{BOLD}{CYAN}{}{RESET}", path.display());
    for rule in &config.rules {
        let kind = match &rule.filter.matcher {
            Matcher::Path { .. } => "path",
            Matcher::Template { .. } => "template",
            Matcher::Script(_) => "script",
        };
        println!(
            "  {GREEN}ok{RESET} {BOLD}{}{RESET} {DIM}({kind}, {} node(s){}){RESET}",
            rule.name,
            rule.filter.node_count(),
            if rule.filter.requeue { ", requeue" } else { "" }
        );
    }
    println!(
        "{DIM}Interpreters:{RESET} {}",
        Interpreters::builtin().names().join(", ")
    );
    println!("{GREEN}{BOLD}{} rule(s) valid{RESET}", config.rules.len());
    Ok(ExitCode::SUCCESS)
}
