pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use app::{build_service, DefaultService};
pub use core::{
    engine::StatementEngine, extractor::StatementExtractor, pipeline::StatementPipeline,
    service::StatementService,
};
pub use domain::model::{
    EntityBundle, ExtractionMode, StructuredResult, SubmitResult, TransactionRecord,
};
pub use utils::error::{Result, StatementError};
