//! Nimar PDF CLI tool
//!
//! A command-line tool for batch-converting documents to PDF and merging
//! them, in user-given order.

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use glob::glob;
use tracing_subscriber::EnvFilter;

use nimar_pdf::convert::{install_instructions, Converter};
use nimar_pdf::manifest::{JobStatus, OverwritePolicy};
use nimar_pdf::pdf::{extract_metadata, extract_text};
use nimar_pdf::pipeline::{open_path, run_batch, BatchOptions};
use nimar_pdf::{BatchReport, Format};

/// Nimar PDF - convert documents to PDF individually or into one merged file
#[derive(Parser)]
#[command(name = "nimar-pdf")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Convert each file to <name>_converted.pdf
    nimar-pdf convert report.docx notes.txt photo.png -d out/

    # Convert and merge everything into handout_merged.pdf, in order
    nimar-pdf merge \"chapter-*.md\" cover.pdf -d out/ -n handout

    # Verify LibreOffice and fonts are available
    nimar-pdf check

    # Inspect a PDF
    nimar-pdf info out/handout_merged.pdf --text")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert each input to its own PDF (<stem>_converted.pdf)
    Convert {
        /// Input files (in order). Supports glob patterns like "*.docx"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output directory
        #[arg(short = 'd', long, default_value = ".")]
        out_dir: PathBuf,

        /// Overwrite existing destination files
        #[arg(long)]
        force: bool,

        /// TrueType font to use for text rendering
        #[arg(long)]
        font_file: Option<PathBuf>,

        /// Open the output directory after conversion
        #[arg(long)]
        open: bool,
    },

    /// Convert all inputs and merge them into one PDF (<base>_merged.pdf)
    Merge {
        /// Input files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output directory
        #[arg(short = 'd', long, default_value = ".")]
        out_dir: PathBuf,

        /// Base name for the merged output
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Overwrite an existing destination file
        #[arg(long)]
        force: bool,

        /// TrueType font to use for text rendering
        #[arg(long)]
        font_file: Option<PathBuf>,

        /// Open the merged file after creation
        #[arg(long)]
        open: bool,
    },

    /// List supported input formats
    Formats,

    /// Check external converter and font availability
    Check,

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,

        /// Also print extracted text
        #[arg(long)]
        text: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            inputs,
            out_dir,
            force,
            font_file,
            open,
        } => cmd_convert(inputs, out_dir, force, font_file, open),
        Commands::Merge {
            inputs,
            out_dir,
            name,
            force,
            font_file,
            open,
        } => cmd_merge(inputs, out_dir, name, force, font_file, open),
        Commands::Formats => cmd_formats(),
        Commands::Check => cmd_check(),
        Commands::Info { input, text } => cmd_info(input, text),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

/// Expand glob patterns in input arguments, preserving argument order.
///
/// Matches within one pattern are sorted; literal paths pass through as-is so
/// the user's ordering is never disturbed.
fn expand_globs(patterns: Vec<String>) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched: Vec<PathBuf> = Vec::new();
            for entry in glob(&pattern).with_context(|| format!("bad pattern: {pattern}"))? {
                match entry {
                    Ok(path) => matched.push(path),
                    Err(e) => eprintln!("Warning: glob error for {pattern}: {e}"),
                }
            }
            if matched.is_empty() {
                anyhow::bail!("no files matched pattern: {pattern}");
            }
            matched.sort();
            paths.extend(matched);
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

/// Print the per-file report the way the batch ran it.
fn print_report(report: &BatchReport) {
    for entry in &report.entries {
        match &entry.status {
            JobStatus::Converted(output) => {
                eprintln!("  ok   {} -> {}", entry.source.path.display(), output.display());
            }
            JobStatus::Failed(reason) => {
                eprintln!("  FAIL {}: {}", entry.source.path.display(), reason);
            }
        }
    }
    if report.has_failures() {
        let failed = report.entries.len() - report.converted_count();
        eprintln!(
            "Converted {}/{} files ({failed} failed)",
            report.converted_count(),
            report.entries.len()
        );
    } else {
        let n = report.converted_count();
        eprintln!("Converted {n}/{n} files");
    }
}

fn cmd_convert(
    inputs: Vec<String>,
    out_dir: PathBuf,
    force: bool,
    font_file: Option<PathBuf>,
    open: bool,
) -> anyhow::Result<()> {
    let inputs = expand_globs(inputs)?;
    eprintln!("Converting {} files...", inputs.len());

    let mut options = BatchOptions::individual(inputs, out_dir.clone());
    options.overwrite = if force {
        OverwritePolicy::Overwrite
    } else {
        OverwritePolicy::Refuse
    };
    options.font_file = font_file;

    let report = run_batch(&options)?;
    print_report(&report);

    if open {
        open_path(&out_dir)?;
    }
    Ok(())
}

fn cmd_merge(
    inputs: Vec<String>,
    out_dir: PathBuf,
    name: Option<String>,
    force: bool,
    font_file: Option<PathBuf>,
    open: bool,
) -> anyhow::Result<()> {
    let inputs = expand_globs(inputs)?;
    eprintln!("Converting and merging {} files...", inputs.len());

    let mut options = BatchOptions::merge(inputs, out_dir, name);
    options.overwrite = if force {
        OverwritePolicy::Overwrite
    } else {
        OverwritePolicy::Refuse
    };
    options.font_file = font_file;

    let report = run_batch(&options)?;
    print_report(&report);

    if let Some(output) = report.outputs.last() {
        eprintln!("Merged to: {}", output.display());
        if open {
            open_path(output)?;
        }
    }
    Ok(())
}

fn cmd_formats() -> anyhow::Result<()> {
    println!("Supported input formats:");
    for fmt in [
        Format::Office,
        Format::Html,
        Format::Text,
        Format::Csv,
        Format::Markdown,
        Format::Xml,
        Format::Image,
        Format::Pdf,
    ] {
        println!(
            "  {:<12} {}",
            fmt.converter_name(),
            fmt.extensions().join(", ")
        );
    }
    Ok(())
}

fn cmd_check() -> anyhow::Result<()> {
    let converter = Converter::new(None);

    match converter.office() {
        Some(office) => {
            println!("LibreOffice: {}", office.executable().display());
            match office.version() {
                Ok(version) => println!("Version:     {version}"),
                Err(e) => println!("Version:     unavailable ({e})"),
            }
        }
        None => {
            println!("LibreOffice: NOT FOUND");
            println!("  Office document conversion (doc/docx/xls/xlsx/ppt/pptx/odt/ods/odp/html)");
            println!("  will not work until it is installed.");
            println!("  {}", install_instructions());
        }
    }

    println!();
    println!("Fonts ({} TrueType files found):", converter.fonts().file_count());
    for (label, path) in converter.fonts().summary() {
        match path {
            Some(p) => println!("  {label}: {}", p.display()),
            None => println!("  {label}: not found"),
        }
    }

    Ok(())
}

fn cmd_info(input: PathBuf, text: bool) -> anyhow::Result<()> {
    let metadata = extract_metadata(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);
    if let Some(title) = metadata.title {
        println!("Title: {title}");
    }
    if let Some(author) = metadata.author {
        println!("Author: {author}");
    }

    if text {
        println!();
        println!("{}", extract_text(&input)?);
    }

    Ok(())
}
