// Wiring of the production adapters from a resolved configuration.

use crate::adapters::{ConfiguredEntityRecognizer, LocalStorage, PdftoppmRenderer, TesseractRecognizer};
use crate::config::TomlConfig;
use crate::core::engine::StatementEngine;
use crate::core::pipeline::StatementPipeline;
use crate::core::service::StatementService;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::Validate;

pub type DefaultPipeline = StatementPipeline<
    PdftoppmRenderer,
    TesseractRecognizer,
    ConfiguredEntityRecognizer,
    LocalStorage,
    TomlConfig,
>;

pub type DefaultService = StatementService<DefaultPipeline, LocalStorage>;

pub fn build_service(config: TomlConfig) -> Result<DefaultService> {
    config.validate()?;

    let renderer = PdftoppmRenderer::new(&config.render.pdftoppm_path, config.render.dpi);
    let recognizer = TesseractRecognizer::new(&config.ocr.tesseract_path, &config.ocr.language);
    let entities = ConfiguredEntityRecognizer::from_command(config.entities.command.as_deref())?;
    let uploads = LocalStorage::new(config.upload_dir());
    let outputs = LocalStorage::new(config.output_dir());
    let monitor_enabled = config.monitoring_enabled();

    tracing::debug!(
        "Building service '{}': pdftoppm={}, tesseract={} ({}), uploads={}, outputs={}",
        config.pipeline.name,
        config.render.pdftoppm_path,
        config.ocr.tesseract_path,
        config.ocr.language,
        config.upload_dir(),
        config.output_dir()
    );

    let pipeline = StatementPipeline::new(renderer, recognizer, entities, outputs.clone(), config);
    let engine = StatementEngine::new_with_monitoring(pipeline, monitor_enabled);
    Ok(StatementService::new(engine, uploads, outputs))
}
