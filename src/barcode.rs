//! Sample-barcode classification and normalization.
//!
//! A scanned page may carry any number of barcodes — courier labels, form
//! identifiers, QR codes — but only *sample submission* barcodes mark the
//! start of a new document. A sample barcode is recognised purely by its
//! shape: one of three accepted (prefix, length) pairs. Before a barcode is
//! persisted it is rewritten to the canonical 18-character form so that the
//! shorter legacy encodings land in storage under a single representation.

/// Accepted (prefix, total length) shapes, checked in order.
///
/// The order matters: "003" is tested before "03" so that an 18-character
/// code is never mis-read as an un-normalised 17-character one.
const SAMPLE_SHAPES: [(&str, usize); 3] = [("003", 18), ("03", 17), ("400", 15)];

/// Returns true if the decoded string has one of the accepted sample shapes.
///
/// Empty strings and strings of the wrong length never match, whatever their
/// prefix.
pub fn is_sample_barcode(barcode: &str) -> bool {
    SAMPLE_SHAPES
        .iter()
        .any(|(prefix, len)| barcode.starts_with(prefix) && barcode.len() == *len)
}

/// Rewrite a sample barcode to its canonical 18-character form.
///
/// * `"03…"` (but not already `"003…"`) → `"0"` is prepended.
/// * `"400…"` → `"003"` is prepended.
///
/// Anything else — including already-canonical `"003…"` codes — is returned
/// unchanged, which makes the rewrite idempotent.
pub fn normalize_sample_barcode(barcode: &str) -> String {
    if barcode.starts_with("03") && !barcode.starts_with("003") {
        return format!("0{barcode}");
    }
    if barcode.starts_with("400") {
        return format!("003{barcode}");
    }
    barcode.to_string()
}
