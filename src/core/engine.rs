use crate::core::{Pipeline, RecognizedText, RunContext, StructuredResult};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub text: RecognizedText,
    pub structured: StructuredResult,
    pub export_path: PathBuf,
}

/// Drives the three pipeline phases in order. Any phase error ends the run.
pub struct StatementEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> StatementEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline_name(&self) -> &str {
        self.pipeline.name()
    }

    pub async fn run(&self, run: &RunContext) -> Result<RunOutput> {
        tracing::info!(
            pipeline = self.pipeline.name(),
            run_id = %run.run_id,
            mode = %run.mode,
            "Starting statement run"
        );

        tracing::info!("Rendering and recognizing pages...");
        let text = self.pipeline.extract(run).await?;
        tracing::info!(
            "Recognized {} page(s), {} failed, {} chars",
            text.pages.len(),
            text.failed_pages(),
            text.text.chars().count()
        );
        self.monitor.log_phase("recognize");

        tracing::info!("Extracting structured fields...");
        let structured = self.pipeline.transform(run, &text).await?;
        tracing::info!("Extracted {} item(s)", structured.len());
        self.monitor.log_phase("extract");

        tracing::info!("Exporting...");
        let export_path = self.pipeline.load(run, &structured).await?;
        tracing::info!("Export saved to: {}", export_path.display());
        self.monitor.log_phase("export");
        self.monitor.log_final();

        Ok(RunOutput {
            text,
            structured,
            export_path,
        })
    }
}
