//! csv-merger CLI
//!
//! Command-line tool for consolidating repeated historical-price CSV downloads.

mod logging;

use clap::{Parser, Subcommand};
use csvmerge_core::{copy_number, file_pattern, find_files, merge, normalize};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "csv-merger")]
#[command(about = "Merge repeated historical-price CSV downloads", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory for the run log file
    #[arg(long, global = true, default_value = ".")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge all matching files into <DIRECTORY>/<PATTERN>_TOTAL.csv
    Merge {
        /// Directory holding the downloads
        directory: PathBuf,

        /// Base file name, e.g. "USD_THB Historical Data"
        pattern: String,

        /// Also write a JSON summary of the run
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// List the files a merge would pick up
    List {
        /// Directory holding the downloads
        directory: PathBuf,

        /// Base file name
        pattern: String,
    },

    /// Normalize a single file and show its schema
    Inspect {
        /// Path to CSV file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let log = match logging::init(&cli.log_dir) {
        Ok(log) => log,
        Err(e) => {
            eprintln!("Error: cannot create log file in {}: {}", cli.log_dir.display(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        eprintln!("See {} for details.", log.path.display());
        std::process::exit(1);
    }

    println!("See {} for details.", log.path.display());
}

fn run(command: Commands) -> csvmerge_core::Result<()> {
    match command {
        Commands::Merge {
            directory,
            pattern,
            report,
        } => cmd_merge(&directory, &pattern, report.as_deref()),
        Commands::List { directory, pattern } => cmd_list(&directory, &pattern),
        Commands::Inspect { file } => cmd_inspect(&file),
    }
}

fn cmd_merge(directory: &Path, pattern: &str, report_path: Option<&Path>) -> csvmerge_core::Result<()> {
    let report = merge(directory, pattern)?;

    if !report.failures.is_empty() {
        println!("Skipped {} file(s):", report.failures.len());
        for failure in &report.failures {
            println!("  {}: {}", failure.path.display(), failure.error);
        }
        println!();
    }

    println!(
        "Merged {} of {} file(s) into {} ({} records)",
        report.files_merged,
        report.files_matched,
        report.output_path.display(),
        report.record_count
    );
    println!("Columns: {}", report.columns.join(", "));

    if let Some(path) = report_path {
        report.save(path)?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

fn cmd_list(directory: &Path, pattern: &str) -> csvmerge_core::Result<()> {
    let files = find_files(directory, pattern)?;
    let rule = file_pattern(pattern)?;

    println!("Files matching '{}' ({}):", pattern, files.len());
    for path in &files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let copy = match copy_number(&rule, &name) {
            Some(n) => format!(" [copy {}]", n),
            None => " [original]".to_string(),
        };
        println!("  {}{}", name, copy);
    }

    Ok(())
}

fn cmd_inspect(file: &Path) -> csvmerge_core::Result<()> {
    let table = normalize(file)?;

    println!("File: {}", file.display());
    println!("Original columns: {}", table.original_headers.join(", "));
    let columns: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    println!("Columns: {}", columns.join(", "));
    println!("Records: {}", table.record_count());

    if let Some((first, last)) = table.date_range() {
        println!("Dates: {} to {}", first, last);
    }

    Ok(())
}
