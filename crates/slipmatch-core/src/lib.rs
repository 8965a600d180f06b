pub mod classify;
pub mod config;
pub mod error;
pub mod extraction;
pub mod folder;
pub mod matching;
pub mod model;
pub mod parsing;
pub mod pipeline;
pub mod service;
pub mod voting;
pub mod watcher;

use error::SlipmatchError;
use model::{DocumentKind, OrderRecord};
use pipeline::Pipeline;
use std::path::Path;

/// Main API entry point: pair two PDFs into order records without watching.
///
/// The order of `first` and `second` does not matter; the packing slip is
/// recognized by its content. Rendered pages stay in the work folder until
/// the next job, so the returned image paths can be inspected.
pub fn match_pdfs(
    pipeline: &Pipeline,
    first: &Path,
    second: &Path,
) -> Result<Vec<OrderRecord>, SlipmatchError> {
    pipeline.run_job(first, second)
}

/// Detect whether a PDF is a packing slip or a shipping label.
pub fn classify_pdf(pipeline: &Pipeline, pdf: &Path) -> Result<DocumentKind, SlipmatchError> {
    pipeline.classify_pdf(pdf)
}
