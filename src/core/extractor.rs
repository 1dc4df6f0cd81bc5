//! Statement field extraction.
//!
//! OCR output of a bank statement is noisy, so fields are located with three
//! fixed patterns and amounts are assigned to a column by looking at the text
//! that precedes them on the same line:
//!
//! ```text
//! 10/05/2023
//! Debit 123.45        -> Debit
//! Credit 50.00        -> Credit
//! Balance: 999.99     -> Running Balance
//! ```
//!
//! One record is produced per date match. With [`AmountScope::Document`] each
//! record is classified against the whole text, so every record carries the
//! same amounts; [`AmountScope::DateWindow`] limits a record to the text
//! between its date and the next one.

use crate::domain::model::{AmountScope, TransactionRecord};
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

const DATE_PATTERN: &str = r"\d{1,2}/\d{1,2}/\d{2,4}";
const AMOUNT_PATTERN: &str = r"\d+\.\d{2}";
const BALANCE_PATTERN: &str = r"Balance:?\s*(\d+\.\d{2})";

struct Patterns {
    date: Regex,
    amount: Regex,
    balance: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        date: Regex::new(DATE_PATTERN).expect("date pattern is valid"),
        amount: Regex::new(AMOUNT_PATTERN).expect("amount pattern is valid"),
        balance: Regex::new(BALANCE_PATTERN).expect("balance pattern is valid"),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct AmountFields {
    debit: String,
    credit: String,
    running_balance: String,
}

impl AmountFields {
    fn apply(&self, mut record: TransactionRecord) -> TransactionRecord {
        record.debit.clone_from(&self.debit);
        record.credit.clone_from(&self.credit);
        record.running_balance.clone_from(&self.running_balance);
        record
    }
}

/// Text between the last newline before `index` and `index`, lower-cased.
fn line_context(text: &str, index: usize) -> String {
    let head = &text[..index];
    let line_start = head.rfind('\n').map_or(0, |pos| pos + 1);
    head[line_start..].to_lowercase()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatementExtractor {
    scope: AmountScope,
}

impl StatementExtractor {
    pub fn new(scope: AmountScope) -> Self {
        Self { scope }
    }

    /// Extract one record per date match, in match order.
    pub fn extract(&self, text: &str) -> Vec<TransactionRecord> {
        let dates: Vec<_> = patterns().date.find_iter(text).collect();
        if dates.is_empty() {
            tracing::debug!("No date matches, nothing to extract");
            return Vec::new();
        }

        let records: Vec<TransactionRecord> = match self.scope {
            AmountScope::Document => {
                let fields = classify_amounts(text, 0..text.len());
                dates
                    .iter()
                    .map(|date| fields.apply(TransactionRecord::for_date(date.as_str())))
                    .collect()
            }
            AmountScope::DateWindow => dates
                .iter()
                .enumerate()
                .map(|(i, date)| {
                    let end = dates.get(i + 1).map_or(text.len(), |next| next.start());
                    let fields = classify_amounts(text, date.start()..end);
                    fields.apply(TransactionRecord::for_date(date.as_str()))
                })
                .collect(),
        };

        tracing::debug!(
            records = records.len(),
            scope = ?self.scope,
            "Extracted statement records"
        );
        records
    }
}

/// Assign every amount and balance match inside `window` to a column. Later
/// matches overwrite earlier ones; amounts with no keyword on their line are
/// dropped. Line context is always taken from the full `text`, so a keyword
/// ahead of the window on the same line still counts.
fn classify_amounts(text: &str, window: Range<usize>) -> AmountFields {
    let patterns = patterns();
    let scoped = &text[window.clone()];
    let mut fields = AmountFields::default();

    for amount in patterns.amount.find_iter(scoped) {
        let amount = amount.as_str();
        // Context comes from the first occurrence of the amount, not this match.
        let Some(local) = scoped.find(amount) else {
            continue;
        };
        let context = line_context(text, window.start + local);
        if context.contains("debit") {
            fields.debit = amount.to_string();
        } else if context.contains("credit") {
            fields.credit = amount.to_string();
        }
    }

    for caps in patterns.balance.captures_iter(scoped) {
        let (Some(whole), Some(amount)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Some(local) = scoped.find(whole.as_str()) else {
            continue;
        };
        let amount_index = window.start + local + (amount.start() - whole.start());
        if line_context(text, amount_index).contains("balance") {
            fields.running_balance = amount.as_str().to_string();
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<TransactionRecord> {
        StatementExtractor::default().extract(text)
    }

    #[test]
    fn test_no_dates_yields_no_records() {
        assert!(extract("").is_empty());
        assert!(extract("Debit 123.45\nCredit 9.99\nBalance: 1.00\n").is_empty());
        assert!(extract("2023-05-10 is not a slash date").is_empty());
    }

    #[test]
    fn test_one_record_per_date_in_order() {
        let records = extract("01/02/2023 a\n3/4/23 b\n01/02/2023 c\n99/99/9999\n");
        let dates: Vec<&str> = records.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["01/02/2023", "3/4/23", "01/02/2023", "99/99/9999"]);
    }

    #[test]
    fn test_debit_line() {
        let records = extract("10/05/2023\nDebit 123.45\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, "10/05/2023");
        assert_eq!(records[0].debit, "123.45");
        assert_eq!(records[0].credit, "");
        assert_eq!(records[0].running_balance, "");
        assert_eq!(records[0].particulars, "");
    }

    #[test]
    fn test_credit_and_balance_lines() {
        let records = extract("01/01/99\nCredit 50.00\nBalance: 999.99\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].credit, "50.00");
        assert_eq!(records[0].running_balance, "999.99");
        assert_eq!(records[0].debit, "");
    }

    #[test]
    fn test_balance_without_colon() {
        let records = extract("01/01/2024\nClosing Balance   12.34\n");
        assert_eq!(records[0].running_balance, "12.34");
        assert_eq!(records[0].debit, "");
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let records = extract("01/01/2024\nDEBIT CARD PURCHASE 7.50\n");
        assert_eq!(records[0].debit, "7.50");
    }

    #[test]
    fn test_debit_wins_over_credit_on_same_line() {
        let records = extract("01/01/2024\nDebit to credit card 20.00\n");
        assert_eq!(records[0].debit, "20.00");
        assert_eq!(records[0].credit, "");
    }

    #[test]
    fn test_later_matches_overwrite_earlier() {
        let records = extract("01/01/2024\nDebit 1.00\nDebit 2.00\n");
        assert_eq!(records[0].debit, "2.00");
    }

    #[test]
    fn test_unclassified_amounts_are_dropped() {
        let records = extract("01/01/2024\nATM withdrawal 40.00\n");
        assert_eq!(records[0].debit, "");
        assert_eq!(records[0].credit, "");
    }

    #[test]
    fn test_context_stops_at_newline() {
        // The keyword is on the previous line, so the amount stays unclassified.
        let records = extract("01/01/2024 Debit\n12.00\n");
        assert_eq!(records[0].debit, "");
    }

    #[test]
    fn test_first_occurrence_decides_context() {
        // 5.00 first appears on an unlabelled line; the later debit line does not count.
        let records = extract("01/01/2024 fee 5.00\nDebit 5.00\n");
        assert_eq!(records[0].debit, "");
    }

    #[test]
    fn test_document_scope_fills_every_record_identically() {
        let text = "01/01/2024\nDebit 10.00\n02/01/2024\nCredit 20.00\nBalance: 30.00\n";
        let records = extract(text);
        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.debit, "10.00");
            assert_eq!(record.credit, "20.00");
            assert_eq!(record.running_balance, "30.00");
        }
    }

    #[test]
    fn test_date_window_scope_separates_records() {
        let text = "01/01/2024\nDebit 10.00\n02/01/2024\nCredit 20.00\nBalance: 30.00\n";
        let records = StatementExtractor::new(AmountScope::DateWindow).extract(text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].debit, "10.00");
        assert_eq!(records[0].credit, "");
        assert_eq!(records[0].running_balance, "");
        assert_eq!(records[1].debit, "");
        assert_eq!(records[1].credit, "20.00");
        assert_eq!(records[1].running_balance, "30.00");
    }

    #[test]
    fn test_date_window_keeps_keyword_before_date() {
        let text = "Debit 01/01/2024 10.00\n";
        let document = extract(text);
        let window = StatementExtractor::new(AmountScope::DateWindow).extract(text);
        assert_eq!(document[0].debit, "10.00");
        assert_eq!(window[0].debit, "10.00");
    }

    #[test]
    fn test_date_window_balance_on_date_line() {
        let text = "Opening 01/02/2024 Balance: 75.00\n02/02/2024 Credit 5.00\n";
        let window = StatementExtractor::new(AmountScope::DateWindow).extract(text);
        assert_eq!(window[0].running_balance, "75.00");
        assert_eq!(window[1].running_balance, "");
        assert_eq!(window[1].credit, "5.00");
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let text = "01/01/2024\nDebit 10.00\nBalance: 5.00\n15/02/2024\nCredit 3.50\n";
        let extractor = StatementExtractor::default();
        assert_eq!(extractor.extract(text), extractor.extract(text));
    }

    #[test]
    fn test_non_ascii_text_does_not_break_context() {
        let records = extract("01/01/2024\nDébit Überweisung debit 8.25\n");
        assert_eq!(records[0].debit, "8.25");
    }
}
