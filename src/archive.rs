//! Archival coordination: cataloging records and retiring the source file.
//!
//! Records are forwarded per page while the segmentation run is still going —
//! not batched at the end — so a crash mid-document loses at most the current
//! page's records. The source file is moved to the archive only after the
//! whole document is done; an existing archive file with the same name is a
//! reported skip, never an overwrite.

use crate::barcode::normalize_sample_barcode;
use crate::catalog::{BarcodeCatalog, CatalogEntry};
use crate::error::SplitError;
use crate::intake;
use crate::output::OutputRecord;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

/// Express an output location relative to the processed root so catalog
/// entries survive the root being remounted or relocated.
pub fn relative_to_root(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

/// Forward one page's records to the catalog.
///
/// Only sample-flagged records are persisted; their barcodes are normalised
/// to the canonical form on the way in. A record the catalog rejects is
/// logged and skipped — the remaining records and the rest of the run are
/// unaffected.
pub fn catalog_page_records(
    catalog: &dyn BarcodeCatalog,
    records: &[OutputRecord],
    processed_root: &Path,
) {
    for record in records.iter().filter(|r| r.is_sample) {
        let entry = CatalogEntry {
            barcode: normalize_sample_barcode(&record.barcode),
            processed_on: Utc::now(),
            stored_location: relative_to_root(&record.stored_at, processed_root),
        };
        match catalog.store(&entry) {
            Ok(()) => trace!(
                "cataloged barcode {} at {}",
                entry.barcode,
                entry.stored_location
            ),
            Err(e) => warn!("could not catalog barcode {}: {e}", entry.barcode),
        }
    }
}

/// Move the processed source file into the archive folder.
///
/// Returns the archived path, or `None` when a file with that name already
/// exists there (the move is skipped and reported, never overwritten).
pub fn archive_source(source: &Path, archive_folder: &Path) -> Result<Option<PathBuf>, SplitError> {
    let name = source
        .file_name()
        .ok_or_else(|| SplitError::Internal(format!("no file name in {}", source.display())))?;
    let destination = archive_folder.join(name);

    if intake::move_file(source, &destination)? {
        trace!(
            "moved {} to archive folder",
            name.to_string_lossy()
        );
        Ok(Some(destination))
    } else {
        warn!(
            "archive already holds {}; source left in place",
            name.to_string_lossy()
        );
        Ok(None)
    }
}
