//! CLI binary for scansplit.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig`, runs the batch loop, and prints results. The `split`
//! and `scan-image` subcommands are direct single-call conveniences on top
//! of the page extractor and the scanner — they never touch the pipeline.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use scansplit::{
    export_page_range, run_batch, BarcodeScanner, BatchSummary, Environment, JsonlCatalog,
    PipelineConfig, RxingScanner,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Process the scan inbox with the default folder layout
  scansplit

  # Explicit folders, production catalog
  scansplit --scan-dir /srv/scans/inbox --work-dir /srv/scans/in-progress \
            --processed-dir /srv/scans/processed --archive-dir /srv/scans/archive \
            --environment prod

  # Pick up files dropped into the work folder by hand until it is empty
  scansplit --recheck

  # Machine-readable batch summary
  scansplit --json > summary.json

  # Copy pages 3-7 of a PDF into a new file (original untouched)
  scansplit split batch.pdf --pages 3-7

  # See which barcodes a single image decodes to
  scansplit scan-image page4.png

ENVIRONMENT VARIABLES:
  SCANSPLIT_SCAN_DIR        Scan-device inbox folder
  SCANSPLIT_WORK_DIR        In-progress folder files are moved to first
  SCANSPLIT_PROCESSED_DIR   Root folder for segmented output documents
  SCANSPLIT_ARCHIVE_DIR     Folder originals are archived to
  SCANSPLIT_CATALOG_DIR     Barcode catalog folder (default: processed dir)
  SCANSPLIT_ENV             Catalog environment: prod, dev, test, local
  SCANSPLIT_FETCH           Files fetched per sweep, oldest first
  SCANSPLIT_SCAN_TIMEOUT    Per-page barcode scan timeout in seconds
  PDFIUM_LIB_PATH           Path to an existing libpdfium

EXIT STATUS:
  0 when the batch loop ran to completion — individual documents or pages may
  still have failed; check the summary (or --json) for per-document results.
"#;

/// Split scanned multi-page PDFs into per-sample documents at barcode boundaries.
#[derive(Parser, Debug)]
#[command(
    name = "scansplit",
    version,
    about = "Split scanned multi-page PDFs into per-sample documents at barcode boundaries",
    long_about = "Watch a scan-device inbox, scan every page of every PDF for barcodes, and cut \
each batch into one output document per sample submission. Originals are archived; sample \
barcodes are cataloged against the output file that holds them.",
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SCANSPLIT_VERBOSE", global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SCANSPLIT_QUIET", global = true)]
    quiet: bool,

    /// Output a structured JSON summary instead of human-readable text.
    #[arg(long, env = "SCANSPLIT_JSON", global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy a 1-indexed page range of a PDF into a new time-stamped file.
    Split {
        /// Source PDF. Left untouched.
        file: PathBuf,

        /// Page range, inclusive: "3-7" or a single page "5".
        #[arg(long)]
        pages: String,
    },

    /// Decode barcodes in a single image file and print them.
    ScanImage {
        /// PNG or JPEG image to scan.
        image: PathBuf,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Folder the scanning device drops new PDFs into.
    #[arg(long, env = "SCANSPLIT_SCAN_DIR", default_value = "scans")]
    scan_dir: PathBuf,

    /// Folder files are moved to before processing.
    #[arg(long, env = "SCANSPLIT_WORK_DIR", default_value = "in-progress")]
    work_dir: PathBuf,

    /// Root folder for segmented output documents.
    #[arg(long, env = "SCANSPLIT_PROCESSED_DIR", default_value = "processed")]
    processed_dir: PathBuf,

    /// Folder originals are archived to after processing.
    #[arg(long, env = "SCANSPLIT_ARCHIVE_DIR", default_value = "archive")]
    archive_dir: PathBuf,

    /// Barcode catalog folder. Default: the processed folder.
    #[arg(long, env = "SCANSPLIT_CATALOG_DIR")]
    catalog_dir: Option<PathBuf>,

    /// Catalog environment: prod, dev, test, local.
    #[arg(long, env = "SCANSPLIT_ENV", default_value = "local")]
    environment: String,

    /// Maximum files fetched per sweep, oldest first.
    #[arg(long, env = "SCANSPLIT_FETCH", default_value_t = 5)]
    fetch: usize,

    /// Sweep the work folder again after draining it.
    #[arg(long, env = "SCANSPLIT_RECHECK")]
    recheck: bool,

    /// Per-page barcode scan timeout in seconds.
    #[arg(long, env = "SCANSPLIT_SCAN_TIMEOUT", default_value_t = 300)]
    scan_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner owns the terminal during a batch run; library INFO logs
    // would tear it, so they are raised to WARN unless --verbose asks for
    // everything.
    let show_spinner = !cli.quiet && !cli.verbose && !cli.json;
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else if show_spinner {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Some(Command::Split { file, pages }) => cmd_split(&file, &pages, cli.json),
        Some(Command::ScanImage { image }) => cmd_scan_image(&image, cli.json),
        None => cmd_run(&cli.run, cli.quiet, cli.json, show_spinner).await,
    }
}

// ── run (default command) ────────────────────────────────────────────────────

async fn cmd_run(args: &RunArgs, quiet: bool, json: bool, show_spinner: bool) -> Result<()> {
    let mut builder = PipelineConfig::builder()
        .scan_folder(&args.scan_dir)
        .work_folder(&args.work_dir)
        .processed_folder(&args.processed_dir)
        .archive_folder(&args.archive_dir)
        .environment(Environment::from_name(&args.environment))
        .fetch_count(args.fetch)
        .recheck_work_folder(args.recheck)
        .scan_timeout_secs(args.scan_timeout);
    if let Some(ref dir) = args.catalog_dir {
        builder = builder.catalog_folder(dir);
    }
    let config = builder.build().context("Invalid configuration")?;

    let scanner: Arc<dyn BarcodeScanner> = Arc::new(RxingScanner);
    let catalog = Arc::new(JsonlCatalog::for_environment(
        config.catalog_folder(),
        config.environment,
    ));

    let spinner = if show_spinner {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Processing");
        bar.set_message(format!("sweeping {}", config.scan_folder.display()));
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let start = Instant::now();
    let summary = run_batch(&config, scanner, catalog)
        .await
        .context("Batch run failed")?;
    let elapsed = start.elapsed();

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
        return Ok(());
    }

    if !quiet {
        print_summary(&summary, elapsed);
    }

    Ok(())
}

fn print_summary(summary: &BatchSummary, elapsed: Duration) {
    for outcome in &summary.documents {
        let report = &outcome.report;
        let mark = if report.errors.is_empty() {
            green("✔")
        } else {
            cyan("⚠")
        };
        let name = outcome
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| outcome.source.display().to_string());
        println!(
            "{mark} {}  {} page(s) → {} document(s)  {}",
            bold(&name),
            report.total_pages,
            report.outputs.len(),
            dim(&format!(
                "{} sample barcode(s), {} error page(s)",
                report.records.iter().filter(|r| r.is_sample).count(),
                report.error_pages()
            )),
        );
        for output in &report.outputs {
            println!("    {}", dim(&output.path.display().to_string()));
        }
        if outcome.archived_to.is_none() {
            println!("    {}", red("original not archived: name already taken"));
        }
    }

    if summary.failed_documents > 0 {
        println!(
            "{} {} document(s) failed and were left in the work folder",
            red("✘"),
            summary.failed_documents
        );
    }

    println!(
        "{} {} document(s) in {:.1}s",
        if summary.failed_documents == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        summary.documents.len(),
        elapsed.as_secs_f64()
    );
}

// ── split ────────────────────────────────────────────────────────────────────

fn cmd_split(file: &Path, pages: &str, json: bool) -> Result<()> {
    let (first, last) = parse_page_range(pages)?;
    let closed = export_page_range(file, first, last)
        .with_context(|| format!("Failed to split {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&closed)?);
    } else {
        println!(
            "{} pages {first}-{last} → {}",
            green("✔"),
            bold(&closed.path.display().to_string())
        );
    }
    Ok(())
}

/// Parse "3-7" or "5" into an inclusive 1-indexed range.
fn parse_page_range(s: &str) -> Result<(usize, usize)> {
    let s = s.trim();
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start.trim().parse().context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;
        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {start})");
        }
        if start > end {
            anyhow::bail!("Invalid page range '{start}-{end}': start must be <= end");
        }
        return Ok((start, end));
    }

    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {page})");
    }
    Ok((page, page))
}

// ── scan-image ───────────────────────────────────────────────────────────────

fn cmd_scan_image(path: &Path, json: bool) -> Result<()> {
    let image = image::open(path)
        .with_context(|| format!("Failed to open image {}", path.display()))?
        .to_luma8();

    let scanner = RxingScanner;
    let decoded = scanner
        .scan(&image)
        .context("Barcode recognition failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&decoded)?);
    } else if decoded.is_empty() {
        println!("{}", dim("no barcodes detected"));
    } else {
        for barcode in &decoded {
            println!("{barcode}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_range_parses_span_and_single() {
        assert_eq!(parse_page_range("3-7").unwrap(), (3, 7));
        assert_eq!(parse_page_range(" 5 ").unwrap(), (5, 5));
    }

    #[test]
    fn page_range_rejects_nonsense() {
        assert!(parse_page_range("7-3").is_err());
        assert!(parse_page_range("0").is_err());
        assert!(parse_page_range("0-4").is_err());
        assert!(parse_page_range("abc").is_err());
    }
}
