//! The batch loop: sweep the intake folder, process every document, repeat.
//!
//! Documents are processed strictly one after another — the pipeline's only
//! concurrency lives inside the scan gateway. A document that fails is
//! logged and skipped for the rest of this run (a later run's folder sweep
//! picks it up again, since it was never archived); the batch itself always
//! runs to completion.

use crate::archive;
use crate::catalog::BarcodeCatalog;
use crate::config::PipelineConfig;
use crate::error::SplitError;
use crate::intake;
use crate::output::{BatchSummary, PipelineOutcome};
use crate::pipeline::split;
use crate::scanner::BarcodeScanner;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Run one batch: move up to `fetch_count` files from the scan folder into
/// the work folder, then drain the work folder document by document.
///
/// With [`PipelineConfig::recheck_work_folder`] set, the work folder is swept
/// again after draining so files dropped in by hand mid-run are picked up;
/// the loop exits when a sweep fetches nothing new.
///
/// Only startup-level problems (inaccessible folders) abort the run; a
/// failing document is logged, counted, and skipped.
pub async fn run_batch(
    config: &PipelineConfig,
    scanner: Arc<dyn BarcodeScanner>,
    catalog: Arc<dyn BarcodeCatalog>,
) -> Result<BatchSummary, SplitError> {
    intake::ensure_folder(&config.scan_folder)?;
    intake::ensure_folder(&config.work_folder)?;

    let moved = intake::sweep_into(
        &config.scan_folder,
        &config.work_folder,
        "pdf",
        config.fetch_count,
    )?;
    info!("moved {moved} file(s) into {}", config.work_folder.display());

    let mut summary = BatchSummary::default();
    // Failed documents stay in the work folder (they were never archived);
    // remembering them keeps the recheck loop from retrying endlessly.
    let mut failed: HashSet<PathBuf> = HashSet::new();

    loop {
        let files: Vec<PathBuf> = intake::oldest_files(&config.work_folder, "pdf", None)?
            .into_iter()
            .filter(|f| !failed.contains(f))
            .take(config.fetch_count)
            .collect();
        if files.is_empty() {
            break;
        }

        info!("processing {} file(s)...", files.len());
        for file in files {
            match process_document(&file, config, &scanner, &catalog).await {
                Ok(outcome) => summary.documents.push(outcome),
                Err(e) => {
                    error!("an error occurred processing {}: {e}", file.display());
                    failed.insert(file);
                    summary.failed_documents += 1;
                }
            }
        }

        if !config.recheck_work_folder {
            break;
        }
    }

    Ok(summary)
}

/// Segment one source document, then archive it.
///
/// Segmentation holds pdfium handles and blocks, so it runs on the blocking
/// thread pool; archival is a single rename afterwards.
pub async fn process_document(
    source: &Path,
    config: &PipelineConfig,
    scanner: &Arc<dyn BarcodeScanner>,
    catalog: &Arc<dyn BarcodeCatalog>,
) -> Result<PipelineOutcome, SplitError> {
    let report = {
        let source = source.to_path_buf();
        let config = config.clone();
        let scanner = Arc::clone(scanner);
        let catalog = Arc::clone(catalog);
        tokio::task::spawn_blocking(move || {
            split::segment_file(&source, &config, &scanner, &catalog)
        })
        .await
        .map_err(|e| SplitError::Internal(format!("segmentation task panicked: {e}")))??
    };

    let archived_to = archive::archive_source(source, &config.archive_folder)?;

    Ok(PipelineOutcome {
        source: source.to_path_buf(),
        report,
        archived_to,
    })
}
