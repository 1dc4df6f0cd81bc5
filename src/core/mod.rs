pub mod engine;
pub mod entities;
pub mod export;
pub mod extractor;
pub mod pipeline;
pub mod service;

pub use crate::domain::model::{RecognizedText, StructuredResult, TransactionRecord};
pub use crate::domain::ports::{
    ConfigProvider, EntityRecognizer, PageRenderer, Pipeline, RunContext, Storage, TextRecognizer,
};
pub use crate::utils::error::Result;
