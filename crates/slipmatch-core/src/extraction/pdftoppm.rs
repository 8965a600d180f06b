use crate::error::SlipmatchError;
use crate::extraction::{PageImages, PageRange, PageRasterizer};
use std::path::Path;
use std::process::Command;

/// Rasterization backend using pdftoppm (from poppler-utils).
///
/// Renders PNGs named `<prefix>-<page>.png`; pdftoppm zero-pads the page
/// number depending on the document length, so pages are discovered by
/// reading the output directory back.
pub struct PdftoppmRasterizer {
    binary: String,
}

impl PdftoppmRasterizer {
    pub fn new() -> Self {
        Self::with_binary("pdftoppm")
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        PdftoppmRasterizer {
            binary: binary.into(),
        }
    }

    /// Check if pdftoppm is available on the system.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn rasterize(
        &self,
        pdf: &Path,
        dpi: u32,
        pages: Option<PageRange>,
        out_dir: &Path,
    ) -> Result<PageImages, SlipmatchError> {
        let prefix = output_prefix(pdf);

        let mut cmd = Command::new(&self.binary);
        cmd.arg("-png").arg("-r").arg(dpi.to_string());
        if let Some(range) = &pages {
            cmd.arg("-f")
                .arg(range.start().to_string())
                .arg("-l")
                .arg(range.end().to_string());
        }
        cmd.arg(pdf).arg(out_dir.join(&prefix));

        tracing::debug!(pdf = %pdf.display(), dpi, ?pages, "running pdftoppm");

        let output = cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SlipmatchError::RasterizerNotFound
            } else {
                SlipmatchError::Io(e)
            }
        })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(SlipmatchError::RasterizerFailed { code, stderr });
        }

        let mut images = PageImages::new();
        for entry in std::fs::read_dir(out_dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(page) = parse_page_number(name, &prefix) {
                if pages.as_ref().map_or(true, |r| r.contains(&page)) {
                    images.insert(page, path);
                }
            }
        }

        Ok(images)
    }

    fn backend_name(&self) -> &str {
        "pdftoppm"
    }
}

fn output_prefix(pdf: &Path) -> String {
    pdf.file_stem()
        .map(|s| s.to_string_lossy().replace(char::is_whitespace, "_"))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "page".to_string())
}

/// Parse `<prefix>-<digits>.png` into the page number.
fn parse_page_number(file_name: &str, prefix: &str) -> Option<usize> {
    let rest = file_name.strip_prefix(prefix)?.strip_prefix('-')?;
    let digits = rest.strip_suffix(".png")?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
