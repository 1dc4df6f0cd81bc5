use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// One rendered page of the input PDF. Numbers start at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    pub number: usize,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub number: usize,
    pub text: String,
    pub failed: bool,
}

/// OCR output for a whole document, pages concatenated in order with no
/// separator between them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedText {
    pub text: String,
    pub pages: Vec<PageText>,
}

impl RecognizedText {
    pub fn from_pages(pages: Vec<PageText>) -> Self {
        let text = pages.iter().map(|page| page.text.as_str()).collect();
        Self { text, pages }
    }

    pub fn failed_pages(&self) -> usize {
        self.pages.iter().filter(|page| page.failed).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityBundle {
    pub dates: Vec<String>,
    pub other: Vec<(String, String)>,
}

impl EntityBundle {
    pub fn len(&self) -> usize {
        self.dates.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() && self.other.is_empty()
    }
}

pub const COLUMN_DATE: &str = "Date";
pub const COLUMN_PARTICULARS: &str = "Particulars";
pub const COLUMN_DEBIT: &str = "Debit";
pub const COLUMN_CREDIT: &str = "Credit";
pub const COLUMN_RUNNING_BALANCE: &str = "Running Balance";

pub const TRANSACTION_COLUMNS: [&str; 5] = [
    COLUMN_DATE,
    COLUMN_PARTICULARS,
    COLUMN_DEBIT,
    COLUMN_CREDIT,
    COLUMN_RUNNING_BALANCE,
];

/// A statement line as guessed by the field extractor. Empty strings mean the
/// field was not found; `particulars` is never filled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Particulars")]
    pub particulars: String,
    #[serde(rename = "Debit")]
    pub debit: String,
    #[serde(rename = "Credit")]
    pub credit: String,
    #[serde(rename = "Running Balance")]
    pub running_balance: String,
}

impl TransactionRecord {
    pub fn for_date(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Self::default()
        }
    }

    /// Column/value pairs in export order.
    pub fn to_row(&self) -> Vec<(String, String)> {
        TRANSACTION_COLUMNS
            .iter()
            .zip([
                &self.date,
                &self.particulars,
                &self.debit,
                &self.credit,
                &self.running_balance,
            ])
            .map(|(column, value)| (column.to_string(), value.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Named entities, selected by the literal mode string `all`.
    Entities,
    Statement,
}

impl ExtractionMode {
    /// `"all"` selects entities; every other value selects statement fields.
    pub fn from_choice(choice: &str) -> Self {
        if choice == "all" {
            Self::Entities
        } else {
            Self::Statement
        }
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entities => write!(f, "all"),
            Self::Statement => write!(f, "statement"),
        }
    }
}

/// Structured output of one run. Exactly one variant per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum StructuredResult {
    Entities(EntityBundle),
    Transactions(Vec<TransactionRecord>),
}

impl StructuredResult {
    pub fn len(&self) -> usize {
        match self {
            Self::Entities(bundle) => bundle.len(),
            Self::Transactions(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Identifies one `submit` call; every artifact of the run lives under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What to do when OCR fails on a single page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageFailurePolicy {
    /// Substitute empty text for the page and keep going.
    #[default]
    Skip,
    Abort,
}

/// Which part of the text amounts are classified against for each record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountScope {
    /// Every amount in the document is classified for every record.
    #[default]
    Document,
    /// Only amounts between a record's date and the next date match.
    DateWindow,
}

impl std::str::FromStr for PageFailurePolicy {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            other => Err(format!("unknown page failure policy '{}', expected skip or abort", other)),
        }
    }
}

impl std::str::FromStr for AmountScope {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "document" => Ok(Self::Document),
            "date_window" => Ok(Self::DateWindow),
            other => Err(format!(
                "unknown amount scope '{}', expected document or date_window",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitResult {
    pub run_id: RunId,
    pub ocr_text: String,
    pub structured: StructuredResult,
    pub export_path: PathBuf,
}
