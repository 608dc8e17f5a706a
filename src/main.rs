use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tabled::{Table, Tabled};

use allostat::import::{load_reports, ReportFormat};
use allostat::logging::{init_logging, LogConfig, LogLevel};
use allostat::pipeline::{PipelineOutput, ScoringPipeline};
use allostat::ScoringConfig;

/// allostat - Allostatic Load Index scoring CLI
///
/// Scores daily self-reports (sleep, load, recovery, stress, energy) into a
/// bounded strain index with adaptive factor weights, EMA trends and
/// model-conflict detection.
#[derive(Parser)]
#[command(name = "allostat")]
#[command(version = "0.1.0")]
#[command(about = "Allostatic load scoring from daily self-reports", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a report file and print the sALI series
    Score {
        /// Input file of daily reports (CSV or JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// File format (inferred from the extension if not specified)
        #[arg(short = 'F', long)]
        format: Option<String>,

        /// Emit the full pipeline output as JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Show the weight-state history for a report file
    Weights {
        /// Input file of daily reports (CSV or JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// File format (inferred from the extension if not specified)
        #[arg(short = 'F', long)]
        format: Option<String>,
    },

    /// List detected conflict patterns for a report file
    Conflicts {
        /// Input file of daily reports (CSV or JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// File format (inferred from the extension if not specified)
        #[arg(short = 'F', long)]
        format: Option<String>,
    },
}

#[derive(Tabled)]
struct ScoreRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Raw sALI")]
    raw: String,
    #[tabled(rename = "EMA7")]
    ema7: String,
    #[tabled(rename = "EMA28")]
    ema28: String,
    #[tabled(rename = "Weights")]
    weights: String,
}

#[derive(Tabled)]
struct WeightRow {
    #[tabled(rename = "Calculated")]
    calculated_on: String,
    #[tabled(rename = "Window")]
    window: String,
    #[tabled(rename = "Sleep")]
    sleep: String,
    #[tabled(rename = "Load")]
    load: String,
    #[tabled(rename = "Recovery")]
    recovery: String,
    #[tabled(rename = "Stress")]
    stress: String,
}

#[derive(Tabled)]
struct ConflictRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Type")]
    conflict_type: String,
    #[tabled(rename = "Magnitude")]
    magnitude: String,
    #[tabled(rename = "Pattern")]
    pattern: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig {
        level: LogLevel::from_verbosity(cli.verbose),
        ..LogConfig::default()
    };
    if let Err(e) = init_logging(&log_config) {
        eprintln!("{}: {}", "warning".yellow(), e);
    }

    let config = ScoringConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Score { file, format, json } => {
            let output = run_pipeline(&config, &file, format.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_scores(&output);
            }
        }
        Commands::Weights { file, format } => {
            let output = run_pipeline(&config, &file, format.as_deref())?;
            print_weights(&output);
        }
        Commands::Conflicts { file, format } => {
            let output = run_pipeline(&config, &file, format.as_deref())?;
            print_conflicts(&output);
        }
    }

    Ok(())
}

fn run_pipeline(
    config: &ScoringConfig,
    file: &PathBuf,
    format: Option<&str>,
) -> Result<PipelineOutput> {
    let format = ReportFormat::resolve(format, file)?;
    let reports = load_reports(file, format)
        .with_context(|| format!("Failed to load reports from {}", file.display()))?;

    let pipeline = ScoringPipeline::new(config.clone());
    let output = pipeline
        .run(&reports)
        .context("Scoring pipeline failed")?;

    for skipped in &output.skipped {
        eprintln!(
            "{}: skipped {}: {}",
            "warning".yellow(),
            skipped.date,
            skipped.reason
        );
    }
    Ok(output)
}

fn print_scores(output: &PipelineOutput) {
    if output.entries.is_empty() {
        println!("{}", "No entries scored.".yellow());
        return;
    }

    let rows: Vec<ScoreRow> = output
        .entries
        .iter()
        .map(|e| ScoreRow {
            date: e.date.to_string(),
            raw: format!("{:.3}", e.raw_sali),
            ema7: format!("{:.3}", e.sali_ema7),
            ema28: format!("{:.3}", e.sali_ema28),
            weights: match e.weight_state_id {
                Some(_) => "adapted".to_string(),
                None => "default".to_string(),
            },
        })
        .collect();
    println!("{}", Table::new(rows));

    let latest = &output.entries[output.entries.len() - 1];
    let summary = format!(
        "Latest sALI {:.3} (EMA7 {:.3}, EMA28 {:.3}) over {} days",
        latest.raw_sali,
        latest.sali_ema7,
        latest.sali_ema28,
        output.entries.len()
    );
    if latest.sali_ema7 > latest.sali_ema28 {
        println!("{} {}", summary.bold(), "- strain trending up".red());
    } else {
        println!("{} {}", summary.bold(), "- strain stable or easing".green());
    }

    if !output.conflicts.is_empty() {
        println!(
            "{}",
            format!("{} conflict(s) detected; see `allostat conflicts`", output.conflicts.len())
                .yellow()
        );
    }
}

fn print_weights(output: &PipelineOutput) {
    if output.weight_states.is_empty() {
        println!(
            "{}",
            "No weight states yet; scoring used the equal-weight default.".yellow()
        );
        return;
    }

    let rows: Vec<WeightRow> = output
        .weight_states
        .iter()
        .map(|s| WeightRow {
            calculated_on: s.calculated_on.to_string(),
            window: format!("{}d", s.window_size),
            sleep: format!("{:.3}", s.weights.sleep),
            load: format!("{:.3}", s.weights.load),
            recovery: format!("{:.3}", s.weights.recovery),
            stress: format!("{:.3}", s.weights.stress),
        })
        .collect();
    println!("{}", Table::new(rows));
}

fn print_conflicts(output: &PipelineOutput) {
    if output.conflicts.is_empty() {
        println!("{}", "No conflicts detected.".green());
        return;
    }

    let rows: Vec<ConflictRow> = output
        .conflicts
        .iter()
        .map(|c| ConflictRow {
            date: c.date.to_string(),
            conflict_type: c.conflict_type.to_string(),
            magnitude: format!("{:.2}", c.magnitude),
            pattern: c.pattern.clone(),
        })
        .collect();
    println!("{}", Table::new(rows));
}
