use crate::domain::model::PageImage;
use crate::domain::ports::TextRecognizer;
use crate::utils::error::{Result, StatementError};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

/// Runs the `tesseract` CLI once per page image.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    program: PathBuf,
    language: String,
}

impl TesseractRecognizer {
    pub fn new(program: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    async fn recognize_text(&self, image: &PageImage) -> Result<String> {
        let output = Command::new(&self.program)
            .arg(&image.path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .await
            .map_err(|e| {
                StatementError::recognition(format!(
                    "failed to execute {} for page {}: {}",
                    self.program.display(),
                    image.number,
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StatementError::recognition(format!(
                "{} returned non-zero exit status for page {}: {}",
                self.program.display(),
                image.number,
                stderr.trim()
            )));
        }

        // Text is returned as produced; the extractor relies on line breaks.
        Ok(String::from_utf8_lossy(&output.stdout).replace('\u{0000}', ""))
    }
}
