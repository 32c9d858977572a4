//! CSP Repair - counterexample-guided repair of CSP# models
//!
//! The `csp-repair` command checks models with PAT, traces each failed
//! assertion back to the regions that can influence it, and asks a repair
//! oracle to rewrite exactly those regions.
//!
//! ## Commands
//!
//! - `verify`: run the model checker and write the failure trace
//! - `targets`: show what a repair would touch, without calling the oracle
//! - `repair`: repair models from an existing failure trace
//! - `pipeline`: verify, repair and optionally re-verify

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use csp_repair_core::{
    discover_models, run_pipeline, verify_and_record, BatchRepairer, BatchSummary, RepairConfig,
    RepairMode,
};
use csp_slicer::{analyze_assertion, extract_region};
use pat_verifier::{load_trace, records_for, VerificationRun, Verifier};
use repair_oracle::{GeminiOracle, OracleConfig};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "csp-repair")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Counterexample-guided localized repair of CSP# models", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "CSP_REPAIR_CONFIG")]
    config: Option<PathBuf>,

    /// Directory of input models
    #[arg(long, global = true)]
    models_dir: Option<PathBuf>,

    /// Directory for repaired models
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Failure trace file
    #[arg(long, global = true)]
    trace: Option<PathBuf>,

    /// PAT console executable
    #[arg(long, global = true, env = "PAT_CONSOLE_PATH")]
    pat: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the model checker on every model and write the failure trace
    Verify,

    /// Show repair targets for a model without calling the oracle
    Targets {
        /// Model file to analyse
        model: PathBuf,

        /// Assertion to analyse (default: the model's records in the trace)
        #[arg(short, long)]
        assertion: Vec<String>,
    },

    /// Repair models using the failure trace
    Repair {
        /// Models to repair (default: every model in the models directory)
        models: Vec<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Verify, repair, and optionally re-verify the repaired models
    Pipeline {
        /// Run the checker again on the repaired outputs
        #[arg(long)]
        reverify: bool,

        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(clap::Args, Default)]
struct RunArgs {
    /// What the oracle sees and rewrites
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Models repaired at the same time
    #[arg(long)]
    concurrency: Option<usize>,

    /// Minimum delay between oracle calls, in milliseconds
    #[arg(long)]
    oracle_delay_ms: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Only the region tied to each event
    Region,
    /// The whole model, once per event
    WholeFile,
}

impl From<ModeArg> for RepairMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Region => RepairMode::Region,
            ModeArg::WholeFile => RepairMode::WholeFile,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    csp_repair_core::init_tracing(cli.json, level);

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Verify => cmd_verify(&config).await,
        Commands::Targets { model, assertion } => cmd_targets(&config, &model, &assertion),
        Commands::Repair { models, run } => cmd_repair(apply_run_args(config, &run)?, models).await,
        Commands::Pipeline { reverify, run } => {
            cmd_pipeline(apply_run_args(config, &run)?, reverify).await
        }
    }
}

/// Config file (or defaults) with global flag overrides applied.
fn load_config(cli: &Cli) -> Result<RepairConfig> {
    let mut config = RepairConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;

    if let Some(dir) = &cli.models_dir {
        config.models_dir = dir.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(trace) = &cli.trace {
        config.trace_file = trace.clone();
    }
    if let Some(pat) = &cli.pat {
        config.verifier.executable = pat.clone();
    }
    Ok(config)
}

fn apply_run_args(mut config: RepairConfig, run: &RunArgs) -> Result<RepairConfig> {
    if let Some(mode) = run.mode {
        config.mode = mode.into();
    }
    if let Some(concurrency) = run.concurrency {
        config.max_concurrency = concurrency;
    }
    if let Some(delay) = run.oracle_delay_ms {
        config.oracle_delay_ms = delay;
    }
    config.validate().context("Invalid run options")?;
    Ok(config)
}

fn models_in(config: &RepairConfig) -> Result<Vec<PathBuf>> {
    let models = discover_models(&config.models_dir, config.extension())
        .with_context(|| format!("Failed to scan models directory {:?}", config.models_dir))?;
    if models.is_empty() {
        bail!(
            "No .{} files found in {:?}",
            config.extension(),
            config.models_dir
        );
    }
    Ok(models)
}

fn build_oracle() -> Result<GeminiOracle> {
    GeminiOracle::new(OracleConfig::from_env()).context("Failed to configure the repair oracle")
}

/// Run the checker and write the failure trace
async fn cmd_verify(config: &RepairConfig) -> Result<()> {
    let models = models_in(config)?;
    let verifier = Verifier::new(config.verifier.clone());
    let run = verify_and_record(&verifier, &models, &config.trace_file)
        .await
        .context("Verification failed")?;

    print_verification(&run);
    println!();
    println!(
        "Failure trace: {:?} ({} records)",
        config.trace_file,
        run.records().len()
    );
    Ok(())
}

/// Print the analysis and regions for each failed assertion of `model`
fn cmd_targets(config: &RepairConfig, model: &Path, assertions: &[String]) -> Result<()> {
    let source = std::fs::read_to_string(model)
        .context(format!("Failed to read model file: {:?}", model))?;

    let assertions: Vec<String> = if assertions.is_empty() {
        let records = load_trace(&config.trace_file).context(format!(
            "Failed to read failure trace {:?}; run `csp-repair verify` first",
            config.trace_file
        ))?;
        records_for(&records, model)
            .into_iter()
            .map(|r| r.assertion.clone())
            .collect()
    } else {
        assertions.to_vec()
    };

    if assertions.is_empty() {
        println!("No failed assertions for {:?}", model);
        return Ok(());
    }

    let keywords = config.keywords();
    let rules = config.rule_book();
    for assertion in &assertions {
        let analysis = analyze_assertion(assertion, &source, &keywords);
        println!("assertion {}", assertion);
        println!("  expanded:  {}", analysis.expanded);
        println!(
            "  variables: {}",
            analysis
                .variables
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
        for event in &analysis.events {
            let rule = &rules.resolve(event).name;
            match extract_region(&source, event) {
                Ok(region) => println!(
                    "  - {:<32} rule={:<28} {}",
                    event.as_str(),
                    rule,
                    excerpt(&region.full_text, 60)
                ),
                Err(e) => println!("  - {:<32} rule={:<28} ({})", event.as_str(), rule, e),
            }
        }
        for malformed in &analysis.malformed_macros {
            println!("  ! {}", malformed);
        }
        println!();
    }
    Ok(())
}

/// Repair models from the existing failure trace
async fn cmd_repair(config: RepairConfig, models: Vec<PathBuf>) -> Result<()> {
    let records = load_trace(&config.trace_file).context(format!(
        "Failed to read failure trace {:?}; run `csp-repair verify` first",
        config.trace_file
    ))?;
    let models = if models.is_empty() {
        models_in(&config)?
    } else {
        models
    };
    let oracle = build_oracle()?;

    info!(
        models = models.len(),
        records = records.len(),
        mode = %config.mode,
        "starting repair"
    );
    let repairer = Arc::new(BatchRepairer::new(config, Arc::new(oracle)));
    let summary = repairer.repair_all(models, Arc::new(records)).await;

    print_batch(&summary);
    if !summary.failed.is_empty() {
        bail!("{} model(s) could not be repaired", summary.failed.len());
    }
    Ok(())
}

/// Verify → repair → (re-verify)
async fn cmd_pipeline(config: RepairConfig, reverify: bool) -> Result<()> {
    let verifier = Verifier::new(config.verifier.clone());
    let oracle = build_oracle()?;
    let repairer = Arc::new(BatchRepairer::new(config, Arc::new(oracle)));

    let summary = run_pipeline(&verifier, &repairer, reverify)
        .await
        .context("Pipeline failed")?;

    println!("== verification ==");
    print_verification(&summary.verification);
    println!();
    println!("== repair ==");
    print_batch(&summary.batch);
    if let Some(run) = &summary.reverification {
        println!();
        println!("== re-verification ==");
        print_verification(run);
    }

    if !summary.batch.failed.is_empty() {
        bail!("{} model(s) could not be repaired", summary.batch.failed.len());
    }
    Ok(())
}

fn print_verification(run: &VerificationRun) {
    for outcome in &run.outcomes {
        let status = if outcome.passed() {
            "ok"
        } else if outcome.report_found {
            "FAILED"
        } else {
            "NO REPORT"
        };
        println!(
            "{:<10} {} ({} ms)",
            status,
            outcome.model.display(),
            outcome.duration_ms
        );
        for failure in &outcome.failures {
            println!("    - {}", failure.assertion);
        }
        for warning in &outcome.warnings {
            println!("    ! {}", warning);
        }
    }
    for (model, error) in &run.errors {
        println!("{:<10} {}: {}", "ERROR", model.display(), error);
    }
}

fn print_batch(summary: &BatchSummary) {
    for outcome in &summary.repaired {
        let report = &outcome.report;
        println!(
            "{} -> {}",
            outcome.model.display(),
            outcome.repaired.display()
        );
        println!(
            "    applied: {}  rejected: {}  oracle failures: {}  missing regions: {}{}",
            report.applied(),
            report.count("rejected"),
            report.count("oracle_failed"),
            report.count("region_not_found"),
            if report.changed() { "" } else { "  (unchanged)" }
        );
    }
    for (model, error) in &summary.failed {
        println!("{} -> FAILED: {}", model.display(), error);
    }
    println!("Total patches applied: {}", summary.applied());
}

/// First line of `text`, cut to `max` characters.
fn excerpt(text: &str, max: usize) -> String {
    let first = text.lines().next().unwrap_or_default().trim();
    let more = text.lines().nth(1).is_some();
    if first.chars().count() > max {
        let cut: String = first.chars().take(max).collect();
        format!("{}...", cut)
    } else if more {
        format!("{} ...", first)
    } else {
        first.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = "\
var x = 0;
P() = inc { x = x + 1; } -> P();
";

    #[test]
    fn test_repair_args_parse() {
        let cli = Cli::try_parse_from([
            "csp-repair",
            "repair",
            "--mode",
            "whole-file",
            "--concurrency",
            "2",
            "a.csp",
        ])
        .unwrap();
        match cli.command {
            Commands::Repair { models, run } => {
                assert_eq!(models, vec![PathBuf::from("a.csp")]);
                assert!(matches!(run.mode, Some(ModeArg::WholeFile)));
                assert_eq!(run.concurrency, Some(2));
            }
            _ => panic!("expected repair"),
        }
    }

    #[test]
    fn test_global_flags_override_config() {
        let cli = Cli::try_parse_from([
            "csp-repair",
            "--models-dir",
            "in",
            "--output-dir",
            "out",
            "--pat",
            "/opt/pat/PAT3.Console.exe",
            "verify",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.models_dir, PathBuf::from("in"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(
            config.verifier.executable,
            PathBuf::from("/opt/pat/PAT3.Console.exe")
        );
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let run = RunArgs {
            concurrency: Some(0),
            ..RunArgs::default()
        };
        assert!(apply_run_args(RepairConfig::default(), &run).is_err());
    }

    #[test]
    fn test_run_args_set_mode() {
        let run = RunArgs {
            mode: Some(ModeArg::WholeFile),
            oracle_delay_ms: Some(250),
            ..RunArgs::default()
        };
        let config = apply_run_args(RepairConfig::default(), &run).unwrap();
        assert_eq!(config.mode, RepairMode::WholeFile);
        assert_eq!(config.oracle_delay_ms, 250);
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("inc { x = 1; }", 60), "inc { x = 1; }");
        assert_eq!(excerpt("inc {\n  x = 1;\n}", 60), "inc { ...");
        assert_eq!(excerpt("abcdef", 3), "abc...");
    }

    #[test]
    fn test_targets_with_explicit_assertion() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("counter.csp");
        std::fs::write(&model, MODEL).unwrap();

        let result = cmd_targets(
            &RepairConfig::default(),
            &model,
            &["P() |= [] x < 5".to_string()],
        );
        assert!(result.is_ok(), "targets failed: {:?}", result.err());
    }

    #[test]
    fn test_targets_without_trace_fails() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("counter.csp");
        std::fs::write(&model, MODEL).unwrap();
        let config = RepairConfig {
            trace_file: dir.path().join("missing.json"),
            ..RepairConfig::default()
        };
        assert!(cmd_targets(&config, &model, &[]).is_err());
    }
}
