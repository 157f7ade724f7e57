//! Result types produced by a segmentation run.
//!
//! Everything here is plain serialisable data: the CLI's `--json` mode and
//! the JSONL catalog both feed off these structs, and tests assert against
//! them directly.

use crate::barcode::is_sample_barcode;
use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One decoded barcode from one page, classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    /// Raw decoded string, as produced by the recognizer.
    pub text: String,
    /// True when the string matches one of the accepted sample shapes.
    pub is_sample: bool,
}

impl Detection {
    /// Classify a raw decoded string.
    pub fn classify(text: String) -> Self {
        let is_sample = is_sample_barcode(&text);
        Detection { text, is_sample }
    }
}

/// Links one decoded barcode to the output document that holds the page it
/// was found on.
///
/// Created once per decoded string per page. The barcode is stored raw here;
/// normalization to the canonical form happens when the record is cataloged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// Decoded barcode string (un-normalised).
    pub barcode: String,
    /// Absolute path of the output document the page landed in.
    pub stored_at: PathBuf,
    /// File name component of `stored_at`.
    pub file_name: String,
    /// Whether this barcode identifies a sample submission.
    pub is_sample: bool,
}

impl OutputRecord {
    /// Build one record per detection on a page, all referencing the output
    /// document the page was imported into.
    pub fn for_page(detections: &[Detection], stored_at: &Path) -> Vec<OutputRecord> {
        let file_name = stored_at
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        detections
            .iter()
            .map(|d| OutputRecord {
                barcode: d.text.clone(),
                stored_at: stored_at.to_path_buf(),
                file_name: file_name.clone(),
                is_sample: d.is_sample,
            })
            .collect()
    }
}

/// A finished output document: where it was saved and how many pages it got.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedOutput {
    pub path: PathBuf,
    pub pages: usize,
}

/// What one pass over a source document produced, before archival.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentationReport {
    /// One record per decoded barcode per successfully scanned page,
    /// in page order.
    pub records: Vec<OutputRecord>,
    /// Output documents in the order they were closed.
    pub outputs: Vec<ClosedOutput>,
    /// Pages isolated to the error path (scan timeout or extraction failure),
    /// in page order.
    pub errors: Vec<PageError>,
    /// Total pages in the source document.
    pub total_pages: usize,
}

impl SegmentationReport {
    /// How many pages were isolated to the error path.
    pub fn error_pages(&self) -> usize {
        self.errors.len()
    }
}

/// Terminal aggregate for one source document: the segmentation report plus
/// where the original ended up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    /// Source file the run started from.
    pub source: PathBuf,
    pub report: SegmentationReport,
    /// Where the original was archived to; `None` when the move was skipped
    /// because a file with that name already existed.
    pub archived_to: Option<PathBuf>,
}

/// Summary of one batch run over the work folder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Outcomes for documents that processed to completion.
    pub documents: Vec<PipelineOutcome>,
    /// Documents that failed with a fatal error and were skipped.
    pub failed_documents: usize,
}

impl BatchSummary {
    /// Total pages isolated to the error path across all documents.
    pub fn error_pages(&self) -> usize {
        self.documents.iter().map(|d| d.report.error_pages()).sum()
    }

    /// Total sample-barcode records across all documents.
    pub fn sample_records(&self) -> usize {
        self.documents
            .iter()
            .flat_map(|d| &d.report.records)
            .filter(|r| r.is_sample)
            .count()
    }
}
