// Adapters layer: concrete implementations of the domain ports (external tools, storage).

pub mod entities;
pub mod ocr;
pub mod renderer;
pub mod storage;

pub use entities::{
    CommandEntityRecognizer, ConfiguredEntityRecognizer, PatternEntityRecognizer,
};
pub use ocr::TesseractRecognizer;
pub use renderer::PdftoppmRenderer;
pub use storage::LocalStorage;
