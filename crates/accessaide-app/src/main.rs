// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Access Aide: accessibility annotation for unpacked EPUB books.
//
// Entry point. Resolves configuration, opens the book, picks the alt text
// reviewer and runs the pipeline. Failures are reported in plain English
// and mapped to the process exit code.

mod prompt;
mod settings;

use std::io::IsTerminal;
use std::path::PathBuf;

use accessaide_core::config::ReviewMode;
use accessaide_core::error::AccessAideError;
use accessaide_core::human_errors::{Severity, humanize_error};
use accessaide_epub::{AltTextReview, DirBook, JsonExchange, KeepExisting, Pipeline, RunReport};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use prompt::TerminalReview;
use settings::Overrides;

/// Add accessibility metadata, ARIA roles, landmarks and alt text to an EPUB
#[derive(Parser)]
#[command(name = "accessaide")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Unpacked book directory (the one holding META-INF/container.xml)
    book: PathBuf,

    /// Config file (defaults to the per-user accessaide/config.json)
    #[arg(long, env = "ACCESSAIDE_CONFIG")]
    config: Option<PathBuf>,

    /// SVG to PNG converter program
    #[arg(long, env = "ACCESSAIDE_CONVERTER")]
    converter: Option<PathBuf>,

    /// How image alt text is reviewed
    #[arg(long)]
    review: Option<ReviewArg>,

    /// Review alt text through a JSON file instead of the terminal
    #[arg(long, conflicts_with = "review")]
    alt_file: Option<PathBuf>,

    /// Apply landmarks that target a whole document to its body tag
    #[arg(long)]
    document_landmarks: bool,

    /// Run every pass but write nothing back to the book
    #[arg(long)]
    dry_run: bool,

    /// Write the run report as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReviewArg {
    Prompt,
    Skip,
}

impl From<ReviewArg> for ReviewMode {
    fn from(arg: ReviewArg) -> Self {
        match arg {
            ReviewArg::Prompt => ReviewMode::Prompt,
            ReviewArg::Skip => ReviewMode::Skip,
        }
    }
}

/// `--verbose` turns on debug output for the binary and every library crate.
const VERBOSE_FILTER: &str = "accessaide=debug,accessaide_core=debug,accessaide_markup=debug,\
    accessaide_media=debug,accessaide_epub=debug";

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = settings::resolve(
        cli.config.as_deref(),
        Overrides {
            converter: cli.converter.clone(),
            review: cli.review.map(ReviewMode::from),
            document_landmarks: cli.document_landmarks,
        },
    )?;

    let mut reviewer: Box<dyn AltTextReview> = match (&cli.alt_file, config.review) {
        (Some(path), _) => Box::new(JsonExchange::new(path)),
        (None, ReviewMode::Skip) => Box::new(KeepExisting),
        (None, ReviewMode::Prompt) if std::io::stdin().is_terminal() => Box::new(TerminalReview),
        (None, ReviewMode::Prompt) => {
            warn!("stdin is not a terminal; keeping existing alt text");
            Box::new(KeepExisting)
        }
    };

    let pipeline = Pipeline::new(config).with_dry_run(cli.dry_run);
    let outcome = DirBook::open(&cli.book)
        .and_then(|mut book| pipeline.run(&mut book, reviewer.as_mut()));

    let report = match outcome {
        Ok(report) => report,
        Err(err) => fail(&err),
    };

    if let Some(path) = &cli.report {
        report.save(path)?;
        info!(path = %path.display(), "report written");
    }
    print_summary(&report);
    Ok(())
}

fn fail(err: &AccessAideError) -> ! {
    let human = humanize_error(err);
    let label = match human.severity {
        Severity::Precondition => "not annotated",
        Severity::ActionRequired => "error",
        Severity::Internal => "internal error",
    };
    eprintln!("{label}: {}", human.message);
    eprintln!("  {}", human.suggestion);
    if human.severity == Severity::Internal {
        eprintln!("  detail: {err}");
    }
    std::process::exit(err.exit_code());
}

fn print_summary(report: &RunReport) {
    let verb = if report.dry_run { "would change" } else { "changed" };
    println!(
        "{} book, language {}: {verb} {} of {} document(s)",
        report.generation,
        report.primary_language,
        report.documents_changed(),
        report.documents.len(),
    );
    if report.metadata_injected {
        println!("  accessibility metadata added");
    }
    if report.review_cancelled {
        println!("  alt text review cancelled; alt text left as found");
    } else if report.images_reviewed > 0 {
        println!(
            "  {} image(s) reviewed, {} alt text update(s)",
            report.images_reviewed,
            report.alt_updates()
        );
    }
    if report.placeholders > 0 {
        println!("  {} SVG image(s) shown as a placeholder", report.placeholders);
    }
    for missing in &report.unmatched_images {
        println!("  no image at {missing}; its review entry was skipped");
    }
}
