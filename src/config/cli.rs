use crate::config::toml_config::TomlConfig;
use crate::domain::model::{AmountScope, PageFailurePolicy};
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "statement-ocr")]
#[command(about = "OCR a scanned PDF bank statement and export its transactions")]
pub struct CliConfig {
    /// Scanned statement to process
    #[arg(long, short)]
    pub input: PathBuf,

    /// TOML configuration file; flags below override its values
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// "all" extracts named entities, anything else statement fields
    #[arg(long, short)]
    pub mode: Option<String>,

    #[arg(long)]
    pub upload_dir: Option<String>,

    #[arg(long)]
    pub output_dir: Option<String>,

    /// Tesseract language profile, e.g. eng or eng+deu
    #[arg(long)]
    pub language: Option<String>,

    #[arg(long)]
    pub dpi: Option<u32>,

    /// skip or abort
    #[arg(long)]
    pub on_page_failure: Option<PageFailurePolicy>,

    /// document or date_window
    #[arg(long)]
    pub amount_scope: Option<AmountScope>,

    /// External NER command, split on whitespace (reads text on stdin, writes JSON lines)
    #[arg(long)]
    pub entity_command: Option<String>,

    #[arg(long, help = "Print the recognized text to stdout")]
    pub print_text: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub log_json: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

impl CliConfig {
    /// File configuration (or defaults) with command line overrides applied.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(mode) = &self.mode {
            config.extract.mode.clone_from(mode);
        }
        if let Some(dir) = &self.upload_dir {
            config.storage.upload_dir.clone_from(dir);
        }
        if let Some(dir) = &self.output_dir {
            config.storage.output_dir.clone_from(dir);
        }
        if let Some(language) = &self.language {
            config.ocr.language.clone_from(language);
        }
        if let Some(dpi) = self.dpi {
            config.render.dpi = dpi;
        }
        if let Some(policy) = self.on_page_failure {
            config.ocr.on_page_failure = policy;
        }
        if let Some(scope) = self.amount_scope {
            config.extract.amount_scope = scope;
        }
        if let Some(command) = &self.entity_command {
            config.entities.command = Some(command.split_whitespace().map(str::to_string).collect());
        }
        if self.monitor {
            config.monitoring.enabled = true;
        }
    }
}
