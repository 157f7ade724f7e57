//! Barcode recognition: the scanner seam and its bounded-time gateway.
//!
//! Recognition is an external capability hidden behind [`BarcodeScanner`], a
//! trait object the caller hands to the pipeline. The default implementation
//! is [`RxingScanner`], built on the pure-Rust rxing decoder; tests inject
//! their own implementations to script detections and delays.
//!
//! ## Why a thread and a timeout?
//!
//! Recognition on a dense or degraded scan can run essentially forever — the
//! decoder has no intrinsic deadline. [`scan_with_timeout`] runs the scan on
//! a dedicated thread and waits on a channel with a deadline. On expiry the
//! thread is *abandoned*, not killed: it finishes on its own and its result
//! is discarded when it tries to send into a dropped receiver. One orphaned
//! thread per timed-out page is the accepted cost; forcibly terminating a
//! thread mid-decode is not something a safe API offers anyway.

use image::GrayImage;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

/// Recognition failed in a way the implementation considers unrecoverable.
///
/// "No barcode found" is not an error — implementations return an empty list
/// for that.
#[derive(Debug, Clone, Error)]
#[error("barcode recognition failed: {0}")]
pub struct ScanError(pub String);

/// Maps one raster image to the barcode strings visible in it.
///
/// Implementations hold no per-call state and may be invoked from a worker
/// thread, hence `Send + Sync`.
pub trait BarcodeScanner: Send + Sync {
    /// Decode every barcode in the image. Zero results is a normal outcome.
    fn scan(&self, image: &GrayImage) -> Result<Vec<String>, ScanError>;
}

/// Default scanner backed by the rxing multi-format decoder.
#[derive(Debug, Default)]
pub struct RxingScanner;

impl BarcodeScanner for RxingScanner {
    fn scan(&self, image: &GrayImage) -> Result<Vec<String>, ScanError> {
        let (width, height) = image.dimensions();
        // rxing's luma helpers take height before width. It also reports
        // "nothing decodable here" as an error; for this pipeline an
        // undecodable image simply contributes no detections.
        match rxing::helpers::detect_multiple_in_luma(image.as_raw().clone(), height, width) {
            Ok(results) => Ok(results.iter().map(|r| r.getText().to_string()).collect()),
            Err(e) => {
                debug!("rxing found no barcodes ({e})");
                Ok(Vec::new())
            }
        }
    }
}

/// What the bounded-time gateway reports back for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Recognition finished: deduplicated union of decoded strings across all
    /// of the page's images. May be empty.
    Decoded(Vec<String>),
    /// Recognition did not finish within the deadline. The in-flight scan was
    /// abandoned; the page must go down the error path.
    TimedOut,
    /// The scanner itself failed (or its worker disappeared). Handled like a
    /// page-level extraction failure by callers.
    Failed(String),
}

/// Scan all images of one page on a background thread, waiting at most
/// `timeout`.
///
/// Decoded strings are unioned across images and deduplicated,
/// first-seen-order preserved. The gateway holds no state between calls and
/// never retries; retry policy (there is none) belongs to the caller's error
/// path.
pub fn scan_with_timeout(
    scanner: &Arc<dyn BarcodeScanner>,
    images: Vec<GrayImage>,
    timeout: Duration,
) -> ScanOutcome {
    if images.is_empty() {
        // No embedded raster, no barcode possible. Not worth a thread.
        return ScanOutcome::Decoded(Vec::new());
    }

    let worker_scanner = Arc::clone(scanner);
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let mut decoded: Vec<String> = Vec::new();
        let mut failure: Option<ScanError> = None;
        for image in &images {
            match worker_scanner.scan(image) {
                Ok(strings) => {
                    for s in strings {
                        if !decoded.contains(&s) {
                            decoded.push(s);
                        }
                    }
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        let result = match failure {
            Some(e) => Err(e),
            None => Ok(decoded),
        };
        // The receiver is gone if the caller already timed out; the result is
        // simply discarded in that case.
        let _ = tx.send(result);
    });

    match rx.recv_timeout(timeout) {
        Ok(Ok(decoded)) => {
            trace!("scan finished with {} distinct barcode(s)", decoded.len());
            ScanOutcome::Decoded(decoded)
        }
        Ok(Err(e)) => ScanOutcome::Failed(e.to_string()),
        Err(mpsc::RecvTimeoutError::Timeout) => ScanOutcome::TimedOut,
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            ScanOutcome::Failed("scanner worker exited without a result".into())
        }
    }
}
