//! sqlfold command-line front end.
//!
//! Thin wrapper around the core pipeline: argument parsing, logging setup,
//! colored progress output, and exit codes. Exit code 0 on success, 1 on
//! any error.

mod verify;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use sqlfold_core::Consolidator;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sqlfold")]
#[command(version)]
#[command(about = "Consolidate a SQL migration history into a minimal equivalent set")]
struct Cli {
    /// Directory containing numbered .up.sql/.down.sql migration pairs
    #[arg(default_value = "./migrations")]
    input_dir: PathBuf,

    /// Directory the consolidated migrations are written to
    #[arg(default_value = "./consolidated")]
    output_dir: PathBuf,

    /// Print the consolidated migrations instead of writing files
    #[arg(long)]
    dry_run: bool,

    /// Replay the generated migrations against a disposable PostgreSQL
    /// container (requires Docker)
    #[arg(long)]
    verify: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if let Err(err) = run(&cli) {
        eprintln!();
        eprintln!("{} {:#}", "✗ Error:".red().bold(), err);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    if !cli.input_dir.is_dir() {
        bail!("input directory does not exist: {}", cli.input_dir.display());
    }

    if !cli.quiet {
        println!();
        println!("{} consolidator", "SQLFOLD".purple().bold());
        println!();
        println!("Input:  {}", cli.input_dir.display().to_string().cyan());
        println!("Output: {}", cli.output_dir.display().to_string().cyan());
        println!();
    }

    let summary = Consolidator::new(&cli.input_dir, &cli.output_dir)
        .run(cli.dry_run)
        .context("consolidation failed")?;

    if !cli.quiet {
        print_summary(summary.input_count, summary.output_count, cli.dry_run);
    }

    if cli.verify {
        if cli.dry_run {
            bail!("--verify needs written output; drop --dry-run");
        }
        println!("{}", "Verifying migrations...".yellow().bold());
        verify::verify_output(&cli.output_dir).context("verification failed")?;
        println!();
        println!(
            "{} All migrations apply and roll back.",
            "✓ Verification successful!".green().bold()
        );
        println!();
    }

    Ok(())
}

fn print_summary(input_count: usize, output_count: usize, dry_run: bool) {
    let reduction = if input_count > 0 {
        (input_count.saturating_sub(output_count)) * 100 / input_count
    } else {
        0
    };

    println!();
    if dry_run {
        println!("{} (dry run, nothing written)", "✓ Complete!".green().bold());
    } else {
        println!("{}", "✓ Complete!".green().bold());
    }
    println!();
    println!("Input migrations:  {}", input_count.to_string().cyan());
    println!("Output migrations: {}", output_count.to_string().cyan());
    println!(
        "Reduction:         {} ({} eliminated)",
        format!("{}%", reduction).green().bold(),
        (input_count.saturating_sub(output_count)).to_string().yellow()
    );
    println!();
}
