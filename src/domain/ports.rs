use crate::domain::model::{
    AmountScope, Entity, ExtractionMode, PageFailurePolicy, PageImage, RecognizedText, RunId,
    StructuredResult,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Turns a PDF into one PNG per page, written as `page_<n>.png` in `out_dir`.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, pdf_path: &Path, out_dir: &Path) -> Result<Vec<PageImage>>;
}

#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize_text(&self, image: &PageImage) -> Result<String>;
}

#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    async fn recognize(&self, text: &str) -> Result<Vec<Entity>>;
}

/// Byte storage addressed by paths relative to a root directory.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Filesystem location of `path`, for tools that need a real path.
    fn resolve(&self, path: &str) -> PathBuf;
}

pub trait ConfigProvider: Send + Sync {
    /// Label attached to run logs and manifests.
    fn pipeline_name(&self) -> &str;
    fn upload_dir(&self) -> &str;
    fn output_dir(&self) -> &str;
    fn page_failure_policy(&self) -> PageFailurePolicy;
    fn amount_scope(&self) -> AmountScope;
    fn monitoring_enabled(&self) -> bool;
}

/// Per-run context handed to each pipeline phase.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: RunId,
    pub input_pdf: PathBuf,
    pub mode: ExtractionMode,
}

impl RunContext {
    /// Storage key of an artifact belonging to this run.
    pub fn artifact(&self, name: &str) -> String {
        format!("{}/{}", self.run_id, name)
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    fn name(&self) -> &str;
    async fn extract(&self, run: &RunContext) -> Result<RecognizedText>;
    async fn transform(&self, run: &RunContext, text: &RecognizedText)
        -> Result<StructuredResult>;
    async fn load(&self, run: &RunContext, result: &StructuredResult) -> Result<PathBuf>;
}
