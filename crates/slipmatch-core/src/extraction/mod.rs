pub mod pdftoppm;
pub mod tesseract;

use crate::error::SlipmatchError;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Page number (1-based) to rendered image, ascending.
pub type PageImages = BTreeMap<usize, PathBuf>;

/// Inclusive, 1-based range of pages to render.
pub type PageRange = RangeInclusive<usize>;

/// Trait for PDF rasterization backends.
pub trait PageRasterizer: Send + Sync {
    /// Render `pdf` at `dpi` into `out_dir`, returning one image per page.
    ///
    /// With `pages` set, only that range is rendered and the keys keep the
    /// page numbers of the source document.
    fn rasterize(
        &self,
        pdf: &Path,
        dpi: u32,
        pages: Option<PageRange>,
        out_dir: &Path,
    ) -> Result<PageImages, SlipmatchError>;

    /// Name of this rasterization backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Trait for OCR backends.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &Path) -> Result<String, SlipmatchError>;

    fn backend_name(&self) -> &str;
}
