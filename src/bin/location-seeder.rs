//! Location Seeder CLI
//!
//! Replays a CSV of administrative locations against a location registry

use anyhow::Result;
use clap::{Parser, Subcommand};
use location_seeder::{
    ConfigLoadOptions, ConfigLoader, EXIT_FATAL, LocationLevel, LogFormat, LogLevel, SeedError,
    SeedPipeline, SeederConfig, SeederConfigFile, init_logging,
};
use std::path::PathBuf;
use std::process;
use tracing::error;

/// Seed a location registry from a CSV file
#[derive(Parser)]
#[command(name = "location-seeder")]
#[command(version)]
#[command(about = "Seed a location registry from a CSV file", long_about = None)]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text|json)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Config file (defaults to ./.seeder-config.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish every location in the input file
    Seed {
        /// Input CSV file
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,

        /// Field separator of the input file
        #[arg(long)]
        delimiter: Option<char>,

        /// Registry base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Pause between requests in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Write the run report as JSON to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Build requests without sending them
        #[arg(long)]
        dry_run: bool,

        /// Exit with status 2 if any record was not saved
        #[arg(long)]
        fail_on_error: bool,
    },

    /// Load and order the input file without contacting the registry
    Check {
        /// Input CSV file
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,

        /// Field separator of the input file
        #[arg(long)]
        delimiter: Option<char>,
    },
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("\n❌ Error");
            eprintln!("{:#}", e);

            if let Some(seed_error) = e.downcast_ref::<SeedError>() {
                eprintln!("\n💡 Suggested actions:");
                for action in seed_error.suggested_actions() {
                    eprintln!("  - {}", action);
                }
            }
            process::exit(EXIT_FATAL);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let cli_args = match &cli.command {
        Commands::Seed {
            input,
            delimiter,
            base_url,
            delay_ms,
            timeout_secs,
            report,
            dry_run,
            ..
        } => SeederConfigFile {
            base_url: base_url.clone(),
            input_path: input.clone(),
            delimiter: *delimiter,
            request_delay_ms: *delay_ms,
            request_timeout_secs: *timeout_secs,
            report_path: report.clone(),
            dry_run: dry_run.then_some(true),
            logging: None,
        },
        Commands::Check { input, delimiter } => SeederConfigFile {
            input_path: input.clone(),
            delimiter: *delimiter,
            ..Default::default()
        },
    };

    let config = ConfigLoader::load(ConfigLoadOptions {
        project_path: PathBuf::from("."),
        config_path: cli.config.clone(),
        cli_args: Some(cli_args),
        env: std::env::vars().collect(),
    })
    .await?;

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        config.log_level
    };
    init_logging(level, cli.log_format.unwrap_or(config.log_format))?;

    let validation = ConfigLoader::validate(&config);
    if !validation.valid {
        eprintln!("{}", ConfigLoader::format_validation_result(&validation));
        return Ok(EXIT_FATAL);
    }
    if !validation.warnings.is_empty() {
        eprintln!("{}", ConfigLoader::format_validation_result(&validation));
    }

    match cli.command {
        Commands::Seed { fail_on_error, .. } => seed_command(config, fail_on_error).await,
        Commands::Check { .. } => check_command(config).await,
    }
}

async fn seed_command(config: SeederConfig, fail_on_error: bool) -> Result<i32> {
    println!("\n🌍 location-seeder\n");
    println!("Registry: {}", config.base_url);
    println!("Input: {}\n", config.input_path.display());

    let pipeline = SeedPipeline::from_config(config)?;
    let report = pipeline.run().await?;

    println!("{}", report.markdown_summary());

    Ok(report.exit_code(fail_on_error))
}

async fn check_command(config: SeederConfig) -> Result<i32> {
    println!("\n🔍 Input Check\n");

    let pipeline = SeedPipeline::from_config(config)?;
    let summary = pipeline.check().await?;

    println!("File: {}", pipeline.config().input_path.display());
    println!("Records: {}\n", summary.records.len());
    for level in LocationLevel::HIERARCHY {
        println!("  {:<10} {}", level.as_str(), summary.counts.count(&level));
    }
    if summary.counts.unrecognized > 0 {
        println!("  {:<10} {}", "(unknown)", summary.counts.unrecognized);
    }

    if summary.issues.is_empty() {
        println!("\n✅ All records are well-formed");
    } else {
        println!("\n⚠️  Malformed records: {}", summary.issues.len());
        for issue in &summary.issues {
            println!("  - line {}: [{}] {}", issue.line, issue.code, issue.reason);
        }
    }

    Ok(summary.exit_code())
}
