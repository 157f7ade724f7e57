//! Pipeline stages for scan-batch segmentation.
//!
//! Each submodule implements exactly one concern of the per-document run.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different page-image source) without touching
//! the engine.
//!
//! ## Data Flow
//!
//! ```text
//! source.pdf ──▶ extract ──▶ scan ──▶ split ──▶ output documents
//!   (pdfium)   (page images) (gateway) (state     + records
//!                                       machine)
//! ```
//!
//! 1. [`extract`]  — pull the embedded raster images off one page; pdfium is
//!    not async-safe, so the whole per-document run executes inside one
//!    `spawn_blocking` call
//! 2. [`naming`]   — date-stamped destination folders and collision-free
//!    output file names
//! 3. [`document`] — the currently open output document: create, import a
//!    page verbatim, close (save)
//! 4. [`split`]    — the per-page engine: classify each page as boundary or
//!    continuation, route it, isolate pages whose scan fails or times out

pub mod document;
pub mod extract;
pub mod naming;
pub mod split;
