//! Destination naming for output and error documents.
//!
//! Outputs land in a date-stamped subfolder of the processed root
//! (`processed/20260806/`), named `{source-stem}-{HHMMSS}-{NN}.pdf`. Error
//! documents (single pages whose scan failed) land directly in the archive
//! folder under the same name with an `Error_` prefix.
//!
//! The `NN` suffix is a per-run monotonic counter. The second-granularity
//! time stamp alone can collide when two documents open within the same
//! wall-clock second; the counter makes every name generated by one run
//! unique while keeping names sortable.

use crate::error::SplitError;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// Generates destination paths for one segmentation run.
pub struct OutputNamer {
    date_folder: PathBuf,
    archive_folder: PathBuf,
    stem: String,
    seq: u32,
}

impl OutputNamer {
    /// Set up naming for one source document, creating the date subfolder and
    /// the archive folder if they do not exist yet.
    pub fn new(
        processed_root: &Path,
        archive_folder: &Path,
        stem: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, SplitError> {
        let date_folder = processed_root.join(now.format("%Y%m%d").to_string());
        let archive_folder = archive_folder.to_path_buf();
        for folder in [&date_folder, &archive_folder] {
            fs::create_dir_all(folder).map_err(|e| SplitError::FolderInaccessible {
                path: folder.clone(),
                source: e,
            })?;
        }
        Ok(Self {
            date_folder,
            archive_folder,
            stem: stem.to_string(),
            seq: 0,
        })
    }

    fn next_file_name(&mut self, now: DateTime<Utc>) -> String {
        self.seq += 1;
        format!("{}-{}-{:02}.pdf", self.stem, now.format("%H%M%S"), self.seq)
    }

    /// Path for the next output document.
    pub fn next_output_path(&mut self, now: DateTime<Utc>) -> PathBuf {
        let name = self.next_file_name(now);
        self.date_folder.join(name)
    }

    /// Path for the next single-page error document.
    pub fn next_error_path(&mut self, now: DateTime<Utc>) -> PathBuf {
        let name = self.next_file_name(now);
        self.archive_folder.join(format!("Error_{name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, 10, 15, 30).unwrap()
    }

    #[test]
    fn output_names_carry_date_folder_time_and_counter() {
        let dir = tempfile::tempdir().unwrap();
        let processed = dir.path().join("processed");
        let archive = dir.path().join("archive");

        let mut namer = OutputNamer::new(&processed, &archive, "batch7", fixed_time()).unwrap();

        let first = namer.next_output_path(fixed_time());
        let second = namer.next_output_path(fixed_time());

        assert_eq!(
            first,
            processed.join("20260806").join("batch7-101530-01.pdf")
        );
        assert_eq!(
            second,
            processed.join("20260806").join("batch7-101530-02.pdf")
        );
        assert_ne!(first, second, "same-second names must not collide");
    }

    #[test]
    fn error_names_go_to_archive_with_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let processed = dir.path().join("processed");
        let archive = dir.path().join("archive");

        let mut namer = OutputNamer::new(&processed, &archive, "batch7", fixed_time()).unwrap();
        let _ = namer.next_output_path(fixed_time());
        let error = namer.next_error_path(fixed_time());

        assert_eq!(error, archive.join("Error_batch7-101530-02.pdf"));
    }

    #[test]
    fn new_creates_both_folders() {
        let dir = tempfile::tempdir().unwrap();
        let processed = dir.path().join("deep").join("processed");
        let archive = dir.path().join("deep").join("archive");

        OutputNamer::new(&processed, &archive, "x", fixed_time()).unwrap();

        assert!(processed.join("20260806").is_dir());
        assert!(archive.is_dir());
    }
}
