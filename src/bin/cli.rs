use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use navshield::config::Config;
use navshield::download::DownloadCandidate;
use navshield::error::ShieldError;
use navshield::ir::{hostname_of, DetectionInput};
use navshield::output::{self, OutputFormat};
use navshield::pipeline::{ExceptionStore, InMemoryExceptionStore};
use navshield::rules::{DecisionLevel, ScoreEngine, ScoreReport, ScoreResult};

#[derive(Parser)]
#[command(
    name = "navshield",
    about = "Heuristic risk scoring for browser navigations and downloads",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a navigation described by a JSON detection input
    Score {
        /// Path to the JSON input
        input: PathBuf,

        /// Config file path
        #[arg(long, short = 'c', default_value = ".navshield.toml")]
        config: PathBuf,

        /// Output format (console, json)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,

        /// Decision level that fails the run (warn, block)
        #[arg(long, default_value = "block")]
        fail_on: String,
    },

    /// Score a download candidate
    Download {
        /// Suggested filename of the download
        #[arg(long)]
        filename: String,

        /// Source URL
        #[arg(long, default_value = "")]
        url: String,

        /// Referrer URL
        #[arg(long)]
        referrer: Option<String>,

        /// Output format (console, json)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,
    },

    /// List navigation signals and their weights
    ListSignals {
        /// Output format (table, json)
        #[arg(long, short = 'f', default_value = "table")]
        format: String,
    },

    /// Generate a starter .navshield.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("NAVSHIELD_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Score {
            input,
            config,
            format,
            fail_on,
        } => cmd_score(input, config, format, fail_on),
        Commands::Download {
            filename,
            url,
            referrer,
            format,
        } => cmd_download(filename, url, referrer, format),
        Commands::ListSignals { format } => cmd_list_signals(format),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn parse_format(format_str: &str) -> OutputFormat {
    OutputFormat::from_str_lenient(format_str).unwrap_or_else(|| {
        eprintln!("Warning: unknown format '{}', using console", format_str);
        OutputFormat::Console
    })
}

fn cmd_score(
    input_path: PathBuf,
    config_path: PathBuf,
    format_str: String,
    fail_on_str: String,
) -> Result<i32, ShieldError> {
    let format = parse_format(&format_str);
    let fail_on = DecisionLevel::from_str_lenient(&fail_on_str).unwrap_or_else(|| {
        eprintln!("Warning: unknown level '{}', using block", fail_on_str);
        DecisionLevel::Block
    });
    let config = Config::load(&config_path)?;

    let content = std::fs::read_to_string(&input_path)?;
    let invalid = |message: String| ShieldError::Input {
        source_name: input_path.display().to_string(),
        message,
    };
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
    if !value.is_object() {
        return Err(invalid("expected a JSON object".into()));
    }
    let mut input = DetectionInput::from_value(&value);
    input.fill_derived();

    let exceptions = InMemoryExceptionStore::from_entries(&config.exceptions.allowed_hosts);
    let host = hostname_of(&input.url);
    let report = if exceptions.is_allowed(&host) {
        tracing::info!(host = %host, "host is allow-listed, not scored");
        ScoreReport {
            url: input.url.clone(),
            result: ScoreResult::from_score(0),
            sub_scores: Vec::new(),
            hits: Vec::new(),
        }
    } else {
        navshield::evaluate(&input)
    };

    print!("{}", output::render_score(&report, format)?);

    // Exit code: 0 = below fail-on, 1 = decision reached it
    Ok(if report.result.decision_level >= fail_on { 1 } else { 0 })
}

fn cmd_download(
    filename: String,
    url: String,
    referrer: Option<String>,
    format_str: String,
) -> Result<i32, ShieldError> {
    let format = parse_format(&format_str);
    let candidate = DownloadCandidate {
        id: 0,
        filename,
        source_url: url,
        referrer,
    };
    let result = navshield::score_download(&candidate);

    print!("{}", output::render_download(&candidate, &result, format)?);

    Ok(if result.should_cancel { 1 } else { 0 })
}

fn cmd_list_signals(format_str: String) -> Result<i32, ShieldError> {
    let engine = ScoreEngine::new();
    let extractors = engine.list_extractors();

    match format_str.as_str() {
        "json" => {
            let rows: Vec<serde_json::Value> = extractors
                .iter()
                .flat_map(|meta| {
                    meta.signals.iter().map(move |s| {
                        serde_json::json!({
                            "extractor": meta.id,
                            "category": meta.category,
                            "signal": s.as_str(),
                            "weight": s.weight(),
                            "description": s.describe(),
                        })
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        _ => {
            println!(
                "{:<9} {:<24} {:<7} DESCRIPTION",
                "ID", "SIGNAL", "WEIGHT"
            );
            println!("{}", "-".repeat(80));
            for meta in &extractors {
                for signal in &meta.signals {
                    println!(
                        "{:<9} {:<24} {:<7} {}",
                        meta.id,
                        signal.as_str(),
                        signal.weight(),
                        signal.describe()
                    );
                }
            }
        }
    }

    Ok(0)
}

fn cmd_init(force: bool) -> Result<i32, ShieldError> {
    let path = PathBuf::from(".navshield.toml");

    if path.exists() && !force {
        eprintln!(".navshield.toml already exists. Use --force to overwrite.");
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created .navshield.toml");

    Ok(0)
}
