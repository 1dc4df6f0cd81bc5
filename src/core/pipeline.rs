use crate::core::entities::bucket_entities;
use crate::core::export::ExportTable;
use crate::core::extractor::StatementExtractor;
use crate::core::{
    ConfigProvider, EntityRecognizer, PageRenderer, Pipeline, RecognizedText, RunContext, Storage,
    StructuredResult, TextRecognizer,
};
use crate::domain::model::{ExtractionMode, PageFailurePolicy, PageText};
use crate::utils::error::{Result, StatementError};
use std::path::PathBuf;

pub const PAGES_DIR: &str = "pages";
pub const OCR_TEXT_FILE: &str = "ocr_text.txt";
pub const EXPORT_FILE: &str = "export.csv";

/// Render, recognize, extract and export one statement, with every artifact
/// written under the run's own directory in `storage`.
pub struct StatementPipeline<R, T, E, S, C>
where
    R: PageRenderer,
    T: TextRecognizer,
    E: EntityRecognizer,
    S: Storage,
    C: ConfigProvider,
{
    renderer: R,
    recognizer: T,
    entities: E,
    storage: S,
    config: C,
}

impl<R, T, E, S, C> StatementPipeline<R, T, E, S, C>
where
    R: PageRenderer,
    T: TextRecognizer,
    E: EntityRecognizer,
    S: Storage,
    C: ConfigProvider,
{
    pub fn new(renderer: R, recognizer: T, entities: E, storage: S, config: C) -> Self {
        Self {
            renderer,
            recognizer,
            entities,
            storage,
            config,
        }
    }
}

#[async_trait::async_trait]
impl<R, T, E, S, C> Pipeline for StatementPipeline<R, T, E, S, C>
where
    R: PageRenderer,
    T: TextRecognizer,
    E: EntityRecognizer,
    S: Storage,
    C: ConfigProvider,
{
    fn name(&self) -> &str {
        self.config.pipeline_name()
    }

    async fn extract(&self, run: &RunContext) -> Result<RecognizedText> {
        let pages_dir = self.storage.resolve(&run.artifact(PAGES_DIR));
        let images = self.renderer.render(&run.input_pdf, &pages_dir).await?;
        if images.is_empty() {
            return Err(StatementError::render("document has no pages"));
        }

        let policy = self.config.page_failure_policy();
        let mut pages = Vec::with_capacity(images.len());
        for image in &images {
            match self.recognizer.recognize_text(image).await {
                Ok(text) => {
                    tracing::debug!(
                        "Page {} recognized ({} chars)",
                        image.number,
                        text.chars().count()
                    );
                    pages.push(PageText {
                        number: image.number,
                        text,
                        failed: false,
                    });
                }
                Err(e) if policy == PageFailurePolicy::Skip => {
                    tracing::warn!("OCR failed on page {}, using empty text: {}", image.number, e);
                    pages.push(PageText {
                        number: image.number,
                        text: String::new(),
                        failed: true,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let recognized = RecognizedText::from_pages(pages);
        if recognized.failed_pages() == recognized.pages.len() {
            return Err(StatementError::recognition(format!(
                "OCR failed on all {} page(s)",
                recognized.pages.len()
            )));
        }

        self.storage
            .write_file(&run.artifact(OCR_TEXT_FILE), recognized.text.as_bytes())
            .await?;

        Ok(recognized)
    }

    async fn transform(
        &self,
        run: &RunContext,
        text: &RecognizedText,
    ) -> Result<StructuredResult> {
        match run.mode {
            ExtractionMode::Entities => {
                let entities = self.entities.recognize(&text.text).await?;
                Ok(StructuredResult::Entities(bucket_entities(entities)))
            }
            ExtractionMode::Statement => {
                let extractor = StatementExtractor::new(self.config.amount_scope());
                Ok(StructuredResult::Transactions(extractor.extract(&text.text)))
            }
        }
    }

    async fn load(&self, run: &RunContext, result: &StructuredResult) -> Result<PathBuf> {
        let table = ExportTable::from_structured(result)?;
        let data = table.to_csv()?;

        let key = run.artifact(EXPORT_FILE);
        tracing::debug!("Writing export ({} bytes, {} rows)", data.len(), table.rows.len());
        self.storage
            .write_file(&key, &data)
            .await
            .map_err(|e| StatementError::export(format!("failed to write {}: {}", key, e)))?;

        Ok(self.storage.resolve(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AmountScope, Entity, PageImage, RunId};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| StatementError::NotFound {
                what: path.to_string(),
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }

        fn resolve(&self, path: &str) -> PathBuf {
            Path::new("/mock").join(path)
        }
    }

    struct MockConfig {
        policy: PageFailurePolicy,
    }

    impl ConfigProvider for MockConfig {
        fn pipeline_name(&self) -> &str {
            "mock-statements"
        }

        fn upload_dir(&self) -> &str {
            "uploads"
        }

        fn output_dir(&self) -> &str {
            "outputs"
        }

        fn page_failure_policy(&self) -> PageFailurePolicy {
            self.policy
        }

        fn amount_scope(&self) -> AmountScope {
            AmountScope::Document
        }

        fn monitoring_enabled(&self) -> bool {
            false
        }
    }

    struct FakeRenderer {
        pages: usize,
    }

    #[async_trait]
    impl PageRenderer for FakeRenderer {
        async fn render(&self, _pdf_path: &Path, out_dir: &Path) -> Result<Vec<PageImage>> {
            Ok((1..=self.pages)
                .map(|number| PageImage {
                    number,
                    path: out_dir.join(format!("page_{}.png", number)),
                })
                .collect())
        }
    }

    /// Returns canned text per page number; pages without text fail.
    struct FakeRecognizer {
        texts: HashMap<usize, String>,
    }

    impl FakeRecognizer {
        fn new(texts: &[(usize, &str)]) -> Self {
            Self {
                texts: texts.iter().map(|(n, t)| (*n, t.to_string())).collect(),
            }
        }
    }

    #[async_trait]
    impl TextRecognizer for FakeRecognizer {
        async fn recognize_text(&self, image: &PageImage) -> Result<String> {
            self.texts.get(&image.number).cloned().ok_or_else(|| {
                StatementError::recognition(format!("no text for page {}", image.number))
            })
        }
    }

    #[derive(Clone, Default)]
    struct CountingEntities {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EntityRecognizer for CountingEntities {
        async fn recognize(&self, _text: &str) -> Result<Vec<Entity>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                Entity::new("May 1", "DATE"),
                Entity::new("Acme", "ORG"),
            ])
        }
    }

    fn run(mode: ExtractionMode) -> RunContext {
        RunContext {
            run_id: RunId::generate(),
            input_pdf: PathBuf::from("input.pdf"),
            mode,
        }
    }

    fn pipeline(
        pages: usize,
        recognizer: FakeRecognizer,
        policy: PageFailurePolicy,
    ) -> (
        StatementPipeline<FakeRenderer, FakeRecognizer, CountingEntities, MockStorage, MockConfig>,
        MockStorage,
        CountingEntities,
    ) {
        let storage = MockStorage::default();
        let entities = CountingEntities::default();
        let pipeline = StatementPipeline::new(
            FakeRenderer { pages },
            recognizer,
            entities.clone(),
            storage.clone(),
            MockConfig { policy },
        );
        (pipeline, storage, entities)
    }

    #[tokio::test]
    async fn test_extract_concatenates_pages_and_saves_text() {
        let recognizer = FakeRecognizer::new(&[(1, "10/05/2023\n"), (2, "Debit 123.45\n")]);
        let (pipeline, storage, _) = pipeline(2, recognizer, PageFailurePolicy::Abort);
        let ctx = run(ExtractionMode::Statement);

        let text = pipeline.extract(&ctx).await.unwrap();

        assert_eq!(text.text, "10/05/2023\nDebit 123.45\n");
        let saved = storage.get_file(&ctx.artifact(OCR_TEXT_FILE)).await.unwrap();
        assert_eq!(saved, text.text.as_bytes());
    }

    #[tokio::test]
    async fn test_extract_skips_failed_page() {
        let recognizer = FakeRecognizer::new(&[(1, "first "), (3, "third")]);
        let (pipeline, _, _) = pipeline(3, recognizer, PageFailurePolicy::Skip);

        let text = pipeline.extract(&run(ExtractionMode::Statement)).await.unwrap();

        assert_eq!(text.text, "first third");
        assert_eq!(text.failed_pages(), 1);
        assert!(text.pages[1].failed);
    }

    #[tokio::test]
    async fn test_extract_aborts_on_failed_page() {
        let recognizer = FakeRecognizer::new(&[(1, "first")]);
        let (pipeline, _, _) = pipeline(2, recognizer, PageFailurePolicy::Abort);

        let result = pipeline.extract(&run(ExtractionMode::Statement)).await;
        assert!(matches!(
            result,
            Err(StatementError::RecognitionError { .. })
        ));
    }

    #[tokio::test]
    async fn test_extract_fails_when_every_page_fails() {
        let (pipeline, _, _) = pipeline(2, FakeRecognizer::new(&[]), PageFailurePolicy::Skip);

        let result = pipeline.extract(&run(ExtractionMode::Statement)).await;
        assert!(matches!(
            result,
            Err(StatementError::RecognitionError { .. })
        ));
    }

    #[tokio::test]
    async fn test_extract_rejects_empty_document() {
        let (pipeline, _, _) = pipeline(0, FakeRecognizer::new(&[]), PageFailurePolicy::Skip);

        let result = pipeline.extract(&run(ExtractionMode::Statement)).await;
        assert!(matches!(result, Err(StatementError::RenderError { .. })));
    }

    #[tokio::test]
    async fn test_statement_mode_never_calls_entity_recognizer() {
        let (pipeline, _, entities) =
            pipeline(1, FakeRecognizer::new(&[]), PageFailurePolicy::Skip);
        let text = RecognizedText::from_pages(vec![PageText {
            number: 1,
            text: "10/05/2023\nDebit 123.45\n".to_string(),
            failed: false,
        }]);

        let result = pipeline
            .transform(&run(ExtractionMode::Statement), &text)
            .await
            .unwrap();

        assert_eq!(entities.calls.load(Ordering::SeqCst), 0);
        match result {
            StructuredResult::Transactions(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].debit, "123.45");
            }
            other => panic!("expected transactions, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_entity_mode_buckets_entities() {
        let (pipeline, _, entities) =
            pipeline(1, FakeRecognizer::new(&[]), PageFailurePolicy::Skip);
        let text = RecognizedText::from_pages(vec![PageText {
            number: 1,
            text: "10/05/2023\nDebit 123.45\n".to_string(),
            failed: false,
        }]);

        let result = pipeline
            .transform(&run(ExtractionMode::Entities), &text)
            .await
            .unwrap();

        assert_eq!(entities.calls.load(Ordering::SeqCst), 1);
        match result {
            StructuredResult::Entities(bundle) => {
                assert_eq!(bundle.dates, vec!["May 1"]);
                assert_eq!(bundle.other, vec![("Acme".to_string(), "ORG".to_string())]);
            }
            other => panic!("expected entities, got {:?}", other),
        }
    }

    #[test]
    fn test_name_comes_from_config() {
        let (pipeline, _, _) = pipeline(1, FakeRecognizer::new(&[]), PageFailurePolicy::Skip);
        assert_eq!(pipeline.name(), "mock-statements");
    }

    #[tokio::test]
    async fn test_load_writes_export_under_run() {
        let (pipeline, storage, _) =
            pipeline(1, FakeRecognizer::new(&[]), PageFailurePolicy::Skip);
        let ctx = run(ExtractionMode::Statement);

        let path = pipeline
            .load(&ctx, &StructuredResult::Transactions(Vec::new()))
            .await
            .unwrap();

        assert_eq!(
            path,
            Path::new("/mock").join(ctx.run_id.to_string()).join(EXPORT_FILE)
        );
        let data = storage.get_file(&ctx.artifact(EXPORT_FILE)).await.unwrap();
        assert_eq!(
            String::from_utf8(data).unwrap(),
            "Date,Particulars,Debit,Credit,Running Balance\n"
        );
    }
}
