//! Error types for the scansplit library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SplitError`] — **Fatal for one document**: segmentation of a source
//!   file cannot proceed at all (missing file, corrupt PDF, output folder not
//!   writable). Returned as `Err(SplitError)` from the pipeline entry points.
//!   The batch loop catches it, logs it, and moves on to the next document.
//!
//! * [`PageError`] — **Non-fatal**: one page could not be scanned (timeout,
//!   unreadable embedded image). The page is still imported into the current
//!   output document and additionally exported as a single-page error file;
//!   the run continues with the next page.
//!
//! The separation keeps the isolation ladder explicit: an image problem never
//! escalates past its page, a page problem never escalates past its document,
//! a document problem never aborts the batch.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the scansplit library.
///
/// Page-level failures use [`PageError`] and are counted in
/// [`crate::output::SegmentationReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum SplitError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Source file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// Requested page numbers exceed the actual page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    // ── Output errors ─────────────────────────────────────────────────────
    /// A page could not be copied into an output document.
    #[error("Failed to import page {page} into '{path}': {detail}")]
    PageImportFailed {
        page: usize,
        path: PathBuf,
        detail: String,
    },

    /// An output document could not be created or saved.
    #[error("Failed to write output document '{path}': {detail}")]
    OutputWriteFailed { path: PathBuf, detail: String },

    /// A folder required by the pipeline could not be created or listed.
    #[error("Folder '{path}' is not accessible: {source}")]
    FolderInaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Moving a file between pipeline folders failed (I/O, not a conflict —
    /// an existing destination is reported as a skip, never as this error).
    #[error("Failed to move '{from}' to '{to}': {source}")]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Pages that fail this way are imported into the current output document
/// unscanned, exported as a single-page error file, and counted in
/// [`crate::output::SegmentationReport::error_pages`]. The run continues.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Barcode recognition did not finish within the configured timeout.
    /// The in-flight recognition is abandoned, not cancelled.
    #[error("Page {page}: barcode scan timed out after {secs}s")]
    ScanTimeout { page: usize, secs: u64 },

    /// Embedded images on the page could not be extracted or decoded.
    #[error("Page {page}: image extraction failed: {detail}")]
    Extraction { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::ScanTimeout { page, .. } => *page,
            PageError::Extraction { page, .. } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_timeout_display() {
        let e = PageError::ScanTimeout { page: 7, secs: 300 };
        let msg = e.to_string();
        assert!(msg.contains("Page 7"), "got: {msg}");
        assert!(msg.contains("300s"), "got: {msg}");
        assert_eq!(e.page(), 7);
    }

    #[test]
    fn extraction_display() {
        let e = PageError::Extraction {
            page: 2,
            detail: "truncated JPEG stream".into(),
        };
        assert!(e.to_string().contains("truncated JPEG stream"));
        assert_eq!(e.page(), 2);
    }

    #[test]
    fn page_out_of_range_display() {
        let e = SplitError::PageOutOfRange { page: 12, total: 4 };
        assert!(e.to_string().contains("12"));
        assert!(e.to_string().contains("4 pages"));
    }

    #[test]
    fn invalid_config_display() {
        let e = SplitError::InvalidConfig("fetch count must be ≥ 1".into());
        assert!(e.to_string().contains("fetch count"));
    }
}
