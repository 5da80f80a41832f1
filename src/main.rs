//! sbatch-verify CLI
//!
//! Entry point for the `sbatch-verify` command-line tool.

use clap::{ArgAction, Parser, Subcommand};
use sbatch_verify::config::{EffectiveConfig, Settings};
use sbatch_verify::query::{JobQueryClient, UreqTransport};
use sbatch_verify::submit::{JobSubmitter, ProcessRunner, SubmissionOutcome, SubmitCommand};
use sbatch_verify::summary::{ExitCode, SuiteSummary};
use sbatch_verify::token::{self, Token};
use sbatch_verify::{Suite, Verifier};
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sbatch-verify")]
#[command(about = "Verify Slurm job submission policy by submitting real jobs", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file layered over ~/.config/sbatch-verify/config.toml
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// slurmrestd base URL (e.g. http://localhost:6820)
    #[arg(long, global = true)]
    controller: Option<String>,

    /// REST API version segment (e.g. v0.0.40)
    #[arg(long, global = true)]
    api_version: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a verification suite (the built-in one by default)
    Run {
        /// Suite file with [[case]] tables
        #[arg(long, short = 's')]
        suite: Option<PathBuf>,

        /// Print the suite summary as JSON
        #[arg(long)]
        json: bool,

        /// Stop after the first case that does not pass
        #[arg(long)]
        fail_fast: bool,

        /// Also write suite_summary.json to this path
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Submit one job and print the outcome
    Submit {
        /// Output in JSON format
        #[arg(long)]
        json: bool,

        /// Parameters appended to the submission command, as one string
        #[arg(allow_hyphen_values = true, default_value = "")]
        params: String,
    },

    /// Fetch a job record from slurmrestd
    Job {
        /// Job id
        id: u64,

        /// Output the raw record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a user's QOS list and default QOS
    Qos {
        /// User name
        user: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration with provenance
    Config,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli);

    match cli.command {
        Commands::Run {
            suite,
            json,
            fail_fast,
            output,
        } => run_suite(&config, suite, json, fail_fast, output),
        Commands::Submit { json, params } => run_submit(&config, &params, json),
        Commands::Job { id, json } => run_job(&config, id, json),
        Commands::Qos { user, json } => run_qos(&config, &user, json),
        Commands::Config => match config.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => fail(&format!("Error serializing config: {}", e)),
        },
    }
}

/// Logs go to stderr. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> EffectiveConfig {
    let host = EffectiveConfig::default_host_path();
    let overrides = EffectiveConfig::cli_layer(cli.controller.as_deref(), cli.api_version.as_deref());
    match EffectiveConfig::build(host.as_deref(), cli.config.as_deref(), overrides) {
        Ok(config) => config,
        Err(e) => fail(&format!("Error loading config: {}", e)),
    }
}

fn settings(config: &EffectiveConfig) -> &Settings {
    match config.settings() {
        Some(settings) => settings,
        None => fail("Error loading config: no typed settings available"),
    }
}

fn acquire_token(settings: &Settings) -> Token {
    match token::acquire(&settings.token, &ProcessRunner) {
        Ok((token, source)) => {
            tracing::debug!(%source, "token acquired");
            token
        }
        Err(e) => fail(&format!("Error acquiring token: {}", e)),
    }
}

fn client(settings: &Settings) -> JobQueryClient<UreqTransport> {
    JobQueryClient::new(&settings.controller, acquire_token(settings), UreqTransport::new())
}

fn run_suite(config: &EffectiveConfig, suite_path: Option<PathBuf>, json: bool, fail_fast: bool, output: Option<PathBuf>) {
    let settings = settings(config);

    let suite = match suite_path {
        Some(path) => match Suite::load(&path) {
            Ok(suite) => suite,
            Err(e) => fail(&format!("Error loading suite: {}", e)),
        },
        None => Suite::builtin(),
    };

    let token = acquire_token(settings);
    let user = std::env::var("USER").ok();
    let verifier = Verifier::from_settings(settings, token, ProcessRunner, UreqTransport::new(), user.as_deref());

    let started = Instant::now();
    let reports = verifier.run_suite(suite.cases(), fail_fast);
    let summary = SuiteSummary::new_run(reports, started.elapsed().as_millis() as u64);

    if let Some(path) = output {
        if let Err(e) = summary.write_to_file(&path) {
            eprintln!("Error writing summary to {}: {}", path.display(), e);
        }
    }

    if json {
        print_json(&summary);
    } else {
        print!("{}", summary.render());
    }

    process::exit(summary.exit_code);
}

fn run_submit(config: &EffectiveConfig, params: &str, json: bool) {
    let settings = settings(config);
    let submitter = JobSubmitter::new(SubmitCommand::from_settings(&settings.submit), ProcessRunner);

    let outcome = match submitter.submit(params) {
        Ok(outcome) => outcome,
        Err(e) => fail(&format!("Error submitting job: {}", e)),
    };

    if json {
        print_json(&outcome);
    } else {
        match &outcome {
            SubmissionOutcome::Accepted { job_id } => println!("Accepted: job {}", job_id),
            SubmissionOutcome::Rejected { message, full_output } => {
                println!("Rejected: {}", message);
                for line in full_output.iter().filter(|l| !l.trim().is_empty() && l.as_str() != message) {
                    println!("  {}", line);
                }
            }
        }
    }

    if !outcome.is_accepted() {
        process::exit(ExitCode::Failed.as_i32());
    }
}

fn run_job(config: &EffectiveConfig, id: u64, json: bool) {
    let client = client(settings(config));

    let record = match client.query_job(id) {
        Ok(record) => record,
        Err(e) => fail(&format!("Error querying job {}: {}", id, e)),
    };

    if json {
        print_json(&record);
        return;
    }

    println!("Job {}:", id);
    for name in record.field_names() {
        if let Some(value) = record.get(name) {
            println!("  {}: {}", name, value);
        }
    }
}

fn run_qos(config: &EffectiveConfig, user: &str, json: bool) {
    let client = client(settings(config));

    let qos = match client.query_user_qos(user) {
        Ok(qos) => qos,
        Err(e) => fail(&format!("Error querying QOS for {}: {}", user, e)),
    };

    if json {
        print_json(&qos);
    } else {
        println!("QOS: {}", qos.qos.join(", "));
        println!("Default QOS: {}", qos.default_qos);
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(&format!("Error serializing output: {}", e)),
    }
}

/// Report a setup failure and exit with its code.
fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    process::exit(ExitCode::Setup.as_i32());
}
