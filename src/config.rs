//! Configuration for a segmentation run.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`] and passed by reference into the batch entry
//! point. Keeping every knob in one struct makes it trivial to share the
//! config across the blocking segmentation task, log it, and diff two runs to
//! understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! The pipeline touches five folders plus an environment selector; a
//! positional constructor over that many paths is an accident waiting to
//! happen. The builder lets callers set only what they care about and rely on
//! documented defaults for the rest.

use crate::error::SplitError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which cataloging target records are persisted to.
///
/// Selection is done by the caller (CLI flag or environment variable), never
/// by the segmentation engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Prod,
    Dev,
    Test,
    /// Default when nothing is configured.
    #[default]
    Local,
}

impl Environment {
    /// Parse the usual short names; anything unrecognised falls back to
    /// [`Environment::Local`].
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "prod" | "production" => Environment::Prod,
            "dev" => Environment::Dev,
            "test" => Environment::Test,
            _ => Environment::Local,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Prod => "prod",
            Environment::Dev => "dev",
            Environment::Test => "test",
            Environment::Local => "local",
        };
        f.write_str(name)
    }
}

/// Configuration for the scan-split pipeline.
///
/// Built via [`PipelineConfig::builder()`] or [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use scansplit::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .scan_folder("/srv/scans/inbox")
///     .work_folder("/srv/scans/in-progress")
///     .processed_folder("/srv/scans/processed")
///     .archive_folder("/srv/scans/archive")
///     .fetch_count(10)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Folder the scanning device drops new PDFs into.
    pub scan_folder: PathBuf,

    /// Folder files are moved to before processing. Files placed here by hand
    /// are picked up too (see [`PipelineConfig::recheck_work_folder`]).
    pub work_folder: PathBuf,

    /// Root folder for segmented output documents. Outputs land in a
    /// date-stamped subfolder beneath it.
    pub processed_folder: PathBuf,

    /// Folder the original source files are moved to after processing.
    /// Single-page error documents for unscannable pages are written here too.
    pub archive_folder: PathBuf,

    /// Folder holding the barcode catalog files. Default: the processed
    /// folder.
    pub catalog_folder: Option<PathBuf>,

    /// Cataloging target. Default: [`Environment::Local`].
    pub environment: Environment,

    /// Maximum number of files fetched from a folder per sweep, oldest first.
    /// Default: 5.
    ///
    /// Caps how much one run bites off when a scanner has been filling the
    /// inbox for days. The repeat-until-empty loop drains the rest in
    /// subsequent sweeps.
    pub fetch_count: usize,

    /// Sweep the work folder again after it has been drained. Default: false.
    ///
    /// With this off, one batch run processes exactly the files moved in at
    /// the start. With it on, files dropped into the work folder by hand
    /// while the run is going are picked up before the run ends.
    pub recheck_work_folder: bool,

    /// Per-page barcode recognition timeout in seconds. Default: 300.
    ///
    /// Recognition on a dense or degraded scan can effectively hang. After
    /// this many seconds the page is routed to the error path and the run
    /// moves on; the abandoned recognition keeps its thread until it finishes
    /// on its own (at most one per timed-out page).
    pub scan_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scan_folder: PathBuf::from("scans"),
            work_folder: PathBuf::from("in-progress"),
            processed_folder: PathBuf::from("processed"),
            archive_folder: PathBuf::from("archive"),
            catalog_folder: None,
            environment: Environment::default(),
            fetch_count: 5,
            recheck_work_folder: false,
            scan_timeout_secs: 300,
        }
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Folder the barcode catalog lives in (explicit setting, else the
    /// processed folder).
    pub fn catalog_folder(&self) -> &PathBuf {
        self.catalog_folder.as_ref().unwrap_or(&self.processed_folder)
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn scan_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.scan_folder = path.into();
        self
    }

    pub fn work_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.work_folder = path.into();
        self
    }

    pub fn processed_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.processed_folder = path.into();
        self
    }

    pub fn archive_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.archive_folder = path.into();
        self
    }

    pub fn catalog_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.catalog_folder = Some(path.into());
        self
    }

    pub fn environment(mut self, env: Environment) -> Self {
        self.config.environment = env;
        self
    }

    pub fn fetch_count(mut self, n: usize) -> Self {
        self.config.fetch_count = n.max(1);
        self
    }

    pub fn recheck_work_folder(mut self, v: bool) -> Self {
        self.config.recheck_work_folder = v;
        self
    }

    pub fn scan_timeout_secs(mut self, secs: u64) -> Self {
        self.config.scan_timeout_secs = secs.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, SplitError> {
        let c = &self.config;
        if c.fetch_count == 0 {
            return Err(SplitError::InvalidConfig("fetch count must be ≥ 1".into()));
        }
        if c.scan_timeout_secs == 0 {
            return Err(SplitError::InvalidConfig(
                "scan timeout must be ≥ 1 second".into(),
            ));
        }
        if c.scan_folder == c.work_folder {
            return Err(SplitError::InvalidConfig(
                "scan folder and work folder must differ (files are moved between them)".into(),
            ));
        }
        Ok(self.config)
    }
}
