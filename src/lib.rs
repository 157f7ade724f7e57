//! # scansplit
//!
//! Split scanned multi-page PDFs into per-sample documents at barcode
//! boundaries.
//!
//! ## Why this crate?
//!
//! Lab scanning devices batch whole trays of paperwork into one long PDF.
//! Somewhere in that stream, each sample submission starts with a sheet
//! carrying a sample barcode. This crate walks the batch page by page, scans
//! each page's embedded images for barcodes, and cuts the stream into one
//! output PDF per submission — then archives the original and catalogs every
//! sample barcode against the file that now holds it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! scan folder
//!  │
//!  ├─ 1. Intake    move the oldest N scans into the work folder
//!  ├─ 2. Extract   embedded page images via pdfium (blocking, spawn_blocking)
//!  ├─ 3. Scan      barcode recognition with a hard per-page timeout
//!  ├─ 4. Split     boundary pages open a new output document
//!  ├─ 5. Catalog   sample barcodes recorded per page, as pages complete
//!  └─ 6. Archive   original moved away; unscannable pages kept as error files
//! ```
//!
//! A page whose scan hangs or whose images cannot be read is *isolated*, not
//! fatal: it stays in the current output document, is exported once more as a
//! single-page error file, and the run continues. A document that fails
//! outright is skipped and the batch moves on.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scansplit::{run_batch, JsonlCatalog, PipelineConfig, RxingScanner};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder()
//!         .scan_folder("/srv/scans/inbox")
//!         .work_folder("/srv/scans/in-progress")
//!         .processed_folder("/srv/scans/processed")
//!         .archive_folder("/srv/scans/archive")
//!         .build()?;
//!
//!     let scanner = Arc::new(RxingScanner);
//!     let catalog = Arc::new(JsonlCatalog::for_environment(
//!         config.catalog_folder(),
//!         config.environment,
//!     ));
//!
//!     let summary = run_batch(&config, scanner, catalog).await?;
//!     println!(
//!         "{} document(s) processed, {} sample barcode(s)",
//!         summary.documents.len(),
//!         summary.sample_records()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `scansplit` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! scansplit = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod archive;
pub mod barcode;
pub mod batch;
pub mod catalog;
pub mod config;
pub mod error;
pub mod intake;
pub mod output;
pub mod pipeline;
pub mod scanner;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use barcode::{is_sample_barcode, normalize_sample_barcode};
pub use batch::{process_document, run_batch};
pub use catalog::{BarcodeCatalog, CatalogEntry, CatalogError, JsonlCatalog, MemoryCatalog};
pub use config::{Environment, PipelineConfig, PipelineConfigBuilder};
pub use error::{PageError, SplitError};
pub use output::{
    BatchSummary, ClosedOutput, Detection, OutputRecord, PipelineOutcome, SegmentationReport,
};
pub use pipeline::document::export_page_range;
pub use pipeline::split::segment_file;
pub use scanner::{scan_with_timeout, BarcodeScanner, RxingScanner, ScanError, ScanOutcome};
