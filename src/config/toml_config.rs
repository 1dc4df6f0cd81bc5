use crate::domain::model::{AmountScope, PageFailurePolicy};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, StatementError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub render: RenderConfig,
    pub ocr: OcrConfig,
    pub entities: EntitiesConfig,
    pub extract: ExtractConfig,
    pub storage: StorageConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "statement-ocr".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub pdftoppm_path: String,
    pub dpi: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pdftoppm_path: "pdftoppm".to_string(),
            dpi: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub tesseract_path: String,
    pub language: String,
    pub on_page_failure: PageFailurePolicy,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: "tesseract".to_string(),
            language: "eng".to_string(),
            on_page_failure: PageFailurePolicy::default(),
        }
    }
}

/// Without a command the built-in pattern recognizer is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntitiesConfig {
    pub command: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Raw mode choice; `"all"` means entities.
    pub mode: String,
    pub amount_scope: AmountScope,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            mode: "statement".to_string(),
            amount_scope: AmountScope::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub upload_dir: String,
    pub output_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: "./uploads".to_string(),
            output_dir: "./outputs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    /// Load and parse a TOML file. Missing sections fall back to defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| StatementError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| StatementError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> String {
        static ENV_RE: OnceLock<Regex> = OnceLock::new();
        let re = ENV_RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env pattern is valid"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("render.pdftoppm_path", &self.render.pdftoppm_path)?;
        validation::validate_range("render.dpi", self.render.dpi, 72, 1200)?;
        validation::validate_non_empty_string("ocr.tesseract_path", &self.ocr.tesseract_path)?;
        validation::validate_ocr_language("ocr.language", &self.ocr.language)?;
        validation::validate_path("storage.upload_dir", &self.storage.upload_dir)?;
        validation::validate_path("storage.output_dir", &self.storage.output_dir)?;

        if let Some(command) = &self.entities.command {
            match command.first() {
                Some(program) => {
                    validation::validate_non_empty_string("entities.command", program)?
                }
                None => {
                    return Err(StatementError::InvalidConfigValueError {
                        field: "entities.command".to_string(),
                        value: "[]".to_string(),
                        reason: "Command must name a program".to_string(),
                    })
                }
            }
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn pipeline_name(&self) -> &str {
        &self.pipeline.name
    }

    fn upload_dir(&self) -> &str {
        &self.storage.upload_dir
    }

    fn output_dir(&self) -> &str {
        &self.storage.output_dir
    }

    fn page_failure_policy(&self) -> PageFailurePolicy {
        self.ocr.on_page_failure
    }

    fn amount_scope(&self) -> AmountScope {
        self.extract.amount_scope
    }

    fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
