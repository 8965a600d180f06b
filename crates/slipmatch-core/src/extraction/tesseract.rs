use crate::error::SlipmatchError;
use crate::extraction::TextRecognizer;
use std::path::Path;
use std::process::Command;

/// OCR backend using the tesseract CLI, reading the result from stdout.
pub struct TesseractRecognizer {
    binary: String,
    language: String,
}

impl TesseractRecognizer {
    pub fn new() -> Self {
        Self::with_options("tesseract", "eng")
    }

    pub fn with_options(binary: impl Into<String>, language: impl Into<String>) -> Self {
        TesseractRecognizer {
            binary: binary.into(),
            language: language.into(),
        }
    }

    /// Check if tesseract is available on the system.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &Path) -> Result<String, SlipmatchError> {
        let output = Command::new(&self.binary)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SlipmatchError::RecognizerNotFound
                } else {
                    SlipmatchError::Io(e)
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(SlipmatchError::RecognizerFailed { code, stderr });
        }

        // tesseract terminates each page with a form feed
        Ok(String::from_utf8_lossy(&output.stdout).replace('\x0c', ""))
    }

    fn backend_name(&self) -> &str {
        "tesseract"
    }
}
