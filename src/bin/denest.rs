// src/bin/denest.rs
use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use denest_core::config::RefactorConfig;
use denest_core::discovery;
use denest_core::engine::RefactorEngine;
use denest_core::reporting;

#[derive(Parser)]
#[command(name = "denest")]
#[command(about = "Finds deeply nested conditionals and flattens them")]
struct Cli {
    /// File or directory to process
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Emit the full report as JSON instead of console output
    #[arg(long)]
    json: bool,

    /// Write rewritten units back to disk
    #[arg(long)]
    write: bool,

    /// Exit non-zero if any region was left unflattened
    #[arg(long)]
    check: bool,

    /// Override the nesting depth threshold
    #[arg(long)]
    threshold: Option<usize>,

    /// Override the repair attempt budget
    #[arg(long)]
    max_repairs: Option<usize>,

    /// Override the acceptance confidence
    #[arg(long)]
    min_confidence: Option<f64>,

    /// Enable verbose logging
    #[arg(long, short)]
    verbose: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "error:".red().bold());
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_root = if cli.path.is_dir() {
        cli.path.clone()
    } else {
        cli.path.parent().map_or_else(|| PathBuf::from("."), PathBuf::from)
    };
    let mut config = RefactorConfig::load(&config_root);
    if let Some(threshold) = cli.threshold {
        config.depth_threshold = threshold;
    }
    if let Some(max_repairs) = cli.max_repairs {
        config.max_repair_attempts = max_repairs;
    }
    if let Some(min_confidence) = cli.min_confidence {
        config.acceptance_confidence = min_confidence;
    }
    config.validate()?;

    let paths = discovery::discover(&cli.path)?;
    let units = discovery::load_units(&paths);
    if units.is_empty() {
        println!("No files to process.");
        return Ok(());
    }
    if cli.verbose {
        println!("Processing {} unit(s)...", units.len());
    }

    let engine = RefactorEngine::new(config);
    let report = engine.refactor_units(&units);

    if cli.json {
        println!("{}", reporting::to_json(&report)?);
    } else {
        reporting::print_report(&report, cli.verbose);
    }

    if cli.write {
        for unit in report.units.iter().filter(|u| u.changed()) {
            fs::write(&unit.identity, &unit.text)?;
            if cli.verbose {
                println!("wrote {}", unit.identity);
            }
        }
    }

    if cli.check && report.has_unflattened() {
        process::exit(1);
    }
    Ok(())
}
