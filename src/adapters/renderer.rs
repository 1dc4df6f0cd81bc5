use crate::domain::model::PageImage;
use crate::domain::ports::PageRenderer;
use crate::utils::error::{Result, StatementError};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::process::Command;

const RAW_PREFIX: &str = "raw";

/// Renders pages with poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdftoppmRenderer {
    program: PathBuf,
    dpi: u32,
}

impl PdftoppmRenderer {
    pub fn new(program: impl Into<PathBuf>, dpi: u32) -> Self {
        Self {
            program: program.into(),
            dpi,
        }
    }
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self::new("pdftoppm", 300)
    }
}

/// `raw-7.png`, `raw-07.png` and `raw-007.png` all mean page 7; pdftoppm pads
/// to the width of the page count.
fn raw_page_number(file_name: &str) -> Option<usize> {
    static RAW_RE: OnceLock<Regex> = OnceLock::new();
    let re = RAW_RE.get_or_init(|| {
        Regex::new(&format!(r"^{}-(\d+)\.png$", RAW_PREFIX)).expect("raw page pattern is valid")
    });
    re.captures(file_name)?.get(1)?.as_str().parse().ok()
}

pub fn page_file_name(number: usize) -> String {
    format!("page_{}.png", number)
}

#[async_trait]
impl PageRenderer for PdftoppmRenderer {
    async fn render(&self, pdf_path: &Path, out_dir: &Path) -> Result<Vec<PageImage>> {
        tokio::fs::create_dir_all(out_dir).await?;

        tracing::debug!(
            "Running {} at {} dpi on {}",
            self.program.display(),
            self.dpi,
            pdf_path.display()
        );
        let output = Command::new(&self.program)
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(pdf_path)
            .arg(out_dir.join(RAW_PREFIX))
            .output()
            .await
            .map_err(|e| {
                StatementError::render(format!(
                    "failed to execute {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StatementError::render(format!(
                "{} returned non-zero exit status for {}: {}",
                self.program.display(),
                pdf_path.display(),
                stderr.trim()
            )));
        }

        let mut raw_pages = Vec::new();
        let mut entries = tokio::fs::read_dir(out_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            if let Some(number) = file_name.to_str().and_then(raw_page_number) {
                raw_pages.push((number, entry.path()));
            }
        }
        raw_pages.sort_by_key(|(number, _)| *number);

        if raw_pages.is_empty() {
            return Err(StatementError::render(format!(
                "{} produced no page images for {}",
                self.program.display(),
                pdf_path.display()
            )));
        }

        let mut pages = Vec::with_capacity(raw_pages.len());
        for (number, raw_path) in raw_pages {
            let path = out_dir.join(page_file_name(number));
            tokio::fs::rename(&raw_path, &path).await?;
            pages.push(PageImage { number, path });
        }

        tracing::info!("Rendered {} page(s) from {}", pages.len(), pdf_path.display());
        Ok(pages)
    }
}
