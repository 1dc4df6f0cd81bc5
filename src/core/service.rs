//! Request/response boundary: raw PDF bytes in, OCR text plus a structured
//! result and an export file out.

use crate::core::engine::StatementEngine;
use crate::core::pipeline::EXPORT_FILE;
use crate::core::{Pipeline, RunContext, Storage};
use crate::domain::model::{ExtractionMode, RunId, SubmitResult};
use crate::utils::error::{Result, StatementError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const INPUT_FILE: &str = "input.pdf";
pub const MANIFEST_FILE: &str = "run.json";

/// PDF readers accept the header anywhere in the first kilobyte.
const PDF_HEADER_WINDOW: usize = 1024;

pub fn looks_like_pdf(data: &[u8]) -> bool {
    let window = &data[..data.len().min(PDF_HEADER_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

#[derive(Debug, Serialize)]
struct RunManifest {
    pipeline: String,
    run_id: RunId,
    mode: ExtractionMode,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    pages: usize,
    failed_pages: usize,
    items: usize,
    export_path: PathBuf,
}

/// Removes the staged upload when dropped, whatever way the run ended.
struct StagedInput {
    dir: PathBuf,
}

impl Drop for StagedInput {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => tracing::debug!("Removed staged input {}", self.dir.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to remove staged input {}: {}",
                self.dir.display(),
                e
            ),
        }
    }
}

pub struct StatementService<P: Pipeline, S: Storage> {
    engine: StatementEngine<P>,
    uploads: S,
    outputs: S,
    latest_export: Mutex<Option<PathBuf>>,
}

impl<P: Pipeline, S: Storage> StatementService<P, S> {
    /// `outputs` must be the same storage the pipeline writes its artifacts to.
    pub fn new(engine: StatementEngine<P>, uploads: S, outputs: S) -> Self {
        Self {
            engine,
            uploads,
            outputs,
            latest_export: Mutex::new(None),
        }
    }

    /// Run the whole pipeline on one uploaded document. `mode` is the raw
    /// caller choice: `"all"` for entities, anything else for statement fields.
    pub async fn submit(&self, pdf_bytes: &[u8], mode: &str) -> Result<SubmitResult> {
        if pdf_bytes.is_empty() {
            return Err(StatementError::input("uploaded file is empty"));
        }
        if !looks_like_pdf(pdf_bytes) {
            return Err(StatementError::input("uploaded file is not a PDF"));
        }

        let run_id = RunId::generate();
        let started_at = Utc::now();
        let run = RunContext {
            run_id,
            input_pdf: self.uploads.resolve(&format!("{}/{}", run_id, INPUT_FILE)),
            mode: ExtractionMode::from_choice(mode),
        };

        let _staged = StagedInput {
            dir: self.uploads.resolve(&run_id.to_string()),
        };
        self.uploads
            .write_file(&format!("{}/{}", run_id, INPUT_FILE), pdf_bytes)
            .await?;

        let output = self.engine.run(&run).await?;

        let manifest = RunManifest {
            pipeline: self.engine.pipeline_name().to_string(),
            run_id,
            mode: run.mode,
            started_at,
            finished_at: Utc::now(),
            pages: output.text.pages.len(),
            failed_pages: output.text.failed_pages(),
            items: output.structured.len(),
            export_path: output.export_path.clone(),
        };
        self.outputs
            .write_file(
                &run.artifact(MANIFEST_FILE),
                &serde_json::to_vec_pretty(&manifest)?,
            )
            .await?;

        *self
            .latest_export
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(output.export_path.clone());

        Ok(SubmitResult {
            run_id,
            ocr_text: output.text.text,
            structured: output.structured,
            export_path: output.export_path,
        })
    }

    /// Convenience for callers holding a path rather than bytes.
    pub async fn submit_file(&self, path: &Path, mode: &str) -> Result<SubmitResult> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            StatementError::input(format!("cannot read {}: {}", path.display(), e))
        })?;
        self.submit(&data, mode).await
    }

    /// Bytes of the most recent export produced by this service.
    pub async fn fetch_export(&self) -> Result<Vec<u8>> {
        let latest = self
            .latest_export
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        let path = latest.ok_or_else(|| StatementError::NotFound {
            what: "no export has been generated yet".to_string(),
        })?;

        tokio::fs::read(&path).await.map_err(|e| not_found_or_io(e, &path))
    }

    pub async fn fetch_export_for(&self, run_id: RunId) -> Result<Vec<u8>> {
        let key = format!("{}/{}", run_id, EXPORT_FILE);
        match self.outputs.read_file(&key).await {
            Err(StatementError::IoError(e)) => Err(not_found_or_io(e, &self.outputs.resolve(&key))),
            other => other,
        }
    }
}

fn not_found_or_io(e: std::io::Error, path: &Path) -> StatementError {
    if e.kind() == std::io::ErrorKind::NotFound {
        StatementError::NotFound {
            what: format!("export {}", path.display()),
        }
    } else {
        StatementError::IoError(e)
    }
}
