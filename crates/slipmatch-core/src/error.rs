use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SlipmatchError {
    #[error("extraction failed on page {page} of '{document}': {reason}")]
    Extraction {
        document: String,
        page: usize,
        reason: String,
    },

    #[error("couldn't extract the tracking number from shipping label page {page}:\n--------------------\n{text}\n--------------------")]
    TrackingNotFound { page: usize, text: String },

    #[error("packing slips and shipping labels do not correspond: {0}")]
    Join(String),

    #[error("order ID {order_id} appears on both page {first_page} and page {second_page}")]
    DuplicateOrderId {
        order_id: String,
        first_page: usize,
        second_page: usize,
    },

    #[error("unexpected state in the watched folder: {0}")]
    Anomaly(String),

    #[error("pdftoppm not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    RasterizerNotFound,

    #[error("pdftoppm failed with exit code {code}: {stderr}")]
    RasterizerFailed { code: i32, stderr: String },

    #[error("tesseract not found. Install it: brew install tesseract (macOS) or apt install tesseract-ocr (Linux)")]
    RecognizerNotFound,

    #[error("tesseract failed with exit code {code}: {stderr}")]
    RecognizerFailed { code: i32, stderr: String },

    #[error("failed to load config from {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SlipmatchError {
    /// Errors that abandon the current job but leave the service running.
    pub fn is_job_fatal(&self) -> bool {
        matches!(
            self,
            SlipmatchError::Extraction { .. }
                | SlipmatchError::TrackingNotFound { .. }
                | SlipmatchError::Join(_)
                | SlipmatchError::DuplicateOrderId { .. }
                | SlipmatchError::Anomaly(_)
        )
    }
}
