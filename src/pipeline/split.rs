//! The segmentation engine: one pass over a source document's pages.
//!
//! Each page is classified as either the start of a new output document (a
//! "boundary": any page after the first carrying at least one sample barcode)
//! or a continuation of the current one. Pages whose barcode scan times out
//! or whose images cannot be extracted are isolated: imported into the
//! current output anyway, exported once more as a standalone error document
//! for manual inspection, and excluded from detection records. One bad page
//! never aborts the document.
//!
//! The whole run is synchronous and strictly page-ordered — pdfium is not
//! async-safe, so callers drive this from `spawn_blocking` (see
//! [`crate::batch`]). The only concurrency inside is the single background
//! recognition thread the scan gateway waits on.

use crate::archive;
use crate::catalog::BarcodeCatalog;
use crate::config::PipelineConfig;
use crate::error::{PageError, SplitError};
use crate::output::{Detection, OutputRecord, SegmentationReport};
use crate::pipeline::document::{bind_pdfium, export_single_page, OutputDocument};
use crate::pipeline::extract;
use crate::pipeline::naming::OutputNamer;
use crate::scanner::{scan_with_timeout, BarcodeScanner, ScanOutcome};
use chrono::Utc;
use pdfium_render::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, trace};

/// Segment one source PDF into output documents at sample-barcode boundaries.
///
/// Records for each page are forwarded to `catalog` as the page completes,
/// not batched at the end. Returns the per-document report; the caller owns
/// archival of the source file afterwards.
pub fn segment_file(
    source_path: &Path,
    config: &PipelineConfig,
    scanner: &Arc<dyn BarcodeScanner>,
    catalog: &Arc<dyn BarcodeCatalog>,
) -> Result<SegmentationReport, SplitError> {
    validate_source(source_path)?;
    trace!("start processing: {}", source_path.display());

    let stem = source_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scan".to_string());

    let pdfium = bind_pdfium()?;
    let source =
        pdfium
            .load_pdf_from_file(source_path, None)
            .map_err(|e| SplitError::CorruptPdf {
                path: source_path.to_path_buf(),
                detail: format!("{e:?}"),
            })?;
    let total_pages = source.pages().len() as usize;

    let mut namer = OutputNamer::new(
        &config.processed_folder,
        &config.archive_folder,
        &stem,
        Utc::now(),
    )?;
    let timeout = Duration::from_secs(config.scan_timeout_secs);

    let mut report = SegmentationReport {
        total_pages,
        ..Default::default()
    };
    let mut current: Option<OutputDocument> = None;

    for index in 0..total_pages {
        let page_num = index + 1;
        let page_index = index as u16;
        trace!("processing page {page_num} of {total_pages}");

        // The first page always opens the first output document, before its
        // scan result is known — a timed-out first page still has somewhere
        // to land.
        if current.is_none() {
            let path = namer.next_output_path(Utc::now());
            current = Some(OutputDocument::create(&pdfium, path)?);
        }

        let scanned = match extract::page_images(&source, page_index) {
            Ok(images) => scan_with_timeout(scanner, images, timeout),
            Err(e) => ScanOutcome::Failed(format!("{e:?}")),
        };

        let decoded = match scanned {
            ScanOutcome::Decoded(decoded) => decoded,
            ScanOutcome::TimedOut => {
                let page_error = PageError::ScanTimeout {
                    page: page_num,
                    secs: config.scan_timeout_secs,
                };
                isolate_page(
                    &pdfium, &source, &mut current, &mut namer, page_index, page_num,
                    &page_error,
                )?;
                report.errors.push(page_error);
                continue;
            }
            ScanOutcome::Failed(detail) => {
                let page_error = PageError::Extraction {
                    page: page_num,
                    detail,
                };
                isolate_page(
                    &pdfium, &source, &mut current, &mut namer, page_index, page_num,
                    &page_error,
                )?;
                report.errors.push(page_error);
                continue;
            }
        };

        let detections: Vec<Detection> = decoded.into_iter().map(Detection::classify).collect();

        if starts_new_document(page_num, &detections) {
            if let Some(finished) = current.take() {
                report.outputs.push(finished.close()?);
            }
            let path = namer.next_output_path(Utc::now());
            current = Some(OutputDocument::create(&pdfium, path)?);
        }

        let doc = match current.as_mut() {
            Some(doc) => doc,
            None => return Err(SplitError::Internal("no open output document".into())),
        };
        doc.import_page(&source, page_index, page_num)?;

        if detections.iter().any(|d| d.is_sample) {
            let texts: Vec<&str> = detections.iter().map(|d| d.text.as_str()).collect();
            debug!("barcodes on page {page_num}: {texts:?}");
        } else {
            debug!("no sample barcodes detected on page {page_num}");
        }

        // Forward this page's records immediately: a crash later in the run
        // cannot lose records for pages already processed.
        let records = OutputRecord::for_page(&detections, doc.path());
        archive::catalog_page_records(catalog.as_ref(), &records, &config.processed_folder);
        report.records.extend(records);
    }

    if let Some(finished) = current.take() {
        report.outputs.push(finished.close()?);
    }

    trace!(
        "finished {}: {} output document(s), {} error page(s)",
        source_path.display(),
        report.outputs.len(),
        report.error_pages()
    );
    Ok(report)
}

/// A page after the first carrying at least one sample barcode closes the
/// current output document and becomes the first page of a new one. Page 1
/// never triggers a split, whatever it carries.
pub(crate) fn starts_new_document(page_num: usize, detections: &[Detection]) -> bool {
    page_num > 1 && detections.iter().any(|d| d.is_sample)
}

/// Error path for one page: import it into the current output document so it
/// is not lost, export it once more as a standalone error document, and log
/// where both copies went.
fn isolate_page<'a>(
    pdfium: &'a Pdfium,
    source: &PdfDocument<'a>,
    current: &mut Option<OutputDocument<'a>>,
    namer: &mut OutputNamer,
    page_index: u16,
    page_num: usize,
    page_error: &PageError,
) -> Result<(), SplitError> {
    let doc = match current.as_mut() {
        Some(doc) => doc,
        None => return Err(SplitError::Internal("no open output document".into())),
    };
    doc.import_page(source, page_index, page_num)?;

    let error_path = namer.next_error_path(Utc::now());
    export_single_page(pdfium, source, page_index, page_num, error_path.clone())?;

    error!(
        "{page_error}; the page was added to {} and saved separately as {}",
        doc.path().display(),
        error_path.display()
    );
    Ok(())
}

/// Check the source exists, is readable, and starts with the PDF magic bytes
/// before handing it to pdfium.
fn validate_source(path: &Path) -> Result<(), SplitError> {
    if !path.exists() {
        return Err(SplitError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(SplitError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(SplitError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(SplitError::FileNotFound {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detections(texts: &[(&str, bool)]) -> Vec<Detection> {
        texts
            .iter()
            .map(|(t, s)| Detection {
                text: t.to_string(),
                is_sample: *s,
            })
            .collect()
    }

    #[test]
    fn first_page_never_starts_a_new_document() {
        let d = detections(&[("003123456789012345", true)]);
        assert!(!starts_new_document(1, &d));
    }

    #[test]
    fn later_pages_split_on_any_sample_barcode() {
        let d = detections(&[("COURIER", false), ("003123456789012345", true)]);
        assert!(starts_new_document(2, &d));
        assert!(starts_new_document(57, &d));
    }

    #[test]
    fn pages_without_sample_barcodes_continue() {
        assert!(!starts_new_document(2, &detections(&[])));
        assert!(!starts_new_document(3, &detections(&[("COURIER", false)])));
    }

    #[test]
    fn validate_rejects_missing_file() {
        let result = validate_source(Path::new("/definitely/not/here.pdf"));
        assert!(matches!(result, Err(SplitError::FileNotFound { .. })));
    }

    #[test]
    fn validate_rejects_non_pdf_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"MZ\x90\x00 not a pdf at all").unwrap();

        match validate_source(&path) {
            Err(SplitError::NotAPdf { magic, .. }) => assert_eq!(&magic, b"MZ\x90\x00"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn validate_accepts_pdf_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("real.pdf");
        std::fs::write(&path, b"%PDF-1.7\n%rest of file").unwrap();
        validate_source(&path).unwrap();
    }
}
