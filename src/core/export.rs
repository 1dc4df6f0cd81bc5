use crate::domain::model::{EntityBundle, StructuredResult, TransactionRecord, TRANSACTION_COLUMNS};
use crate::utils::error::{Result, StatementError};
use std::collections::HashMap;

pub const ENTITY_COLUMNS: [&str; 3] = ["Category", "Text", "Label"];

/// Rows of string cells under a fixed header. There is no index column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    /// Build a table from keyed rows. The first row fixes the column order;
    /// every other row must have exactly the same keys, in any order.
    pub fn from_rows(rows: Vec<Vec<(String, String)>>) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Ok(Self::default());
        };
        let header: Vec<String> = first.iter().map(|(key, _)| key.clone()).collect();

        let mut table = Self {
            header,
            rows: Vec::with_capacity(rows.len()),
        };
        for (index, row) in rows.into_iter().enumerate() {
            let cells = table.align(index, row)?;
            table.rows.push(cells);
        }
        Ok(table)
    }

    fn align(&self, index: usize, row: Vec<(String, String)>) -> Result<Vec<String>> {
        let row_len = row.len();
        let mut by_key: HashMap<String, String> = row.into_iter().collect();
        if by_key.len() != row_len {
            return Err(StatementError::export(format!(
                "row {} repeats a column name",
                index + 1
            )));
        }
        if row_len != self.header.len() {
            return Err(StatementError::export(format!(
                "row {} has {} columns, expected {}",
                index + 1,
                row_len,
                self.header.len()
            )));
        }

        self.header
            .iter()
            .map(|column| {
                by_key.remove(column).ok_or_else(|| {
                    StatementError::export(format!(
                        "row {} is missing column '{}'",
                        index + 1,
                        column
                    ))
                })
            })
            .collect()
    }

    pub fn from_transactions(records: &[TransactionRecord]) -> Result<Self> {
        if records.is_empty() {
            return Ok(Self::with_header(&TRANSACTION_COLUMNS));
        }
        Self::from_rows(records.iter().map(TransactionRecord::to_row).collect())
    }

    /// One row per entity: dates first, then the other entities.
    pub fn from_entities(bundle: &EntityBundle) -> Result<Self> {
        let mut table = Self::with_header(&ENTITY_COLUMNS);
        for date in &bundle.dates {
            table
                .rows
                .push(vec!["dates".to_string(), date.clone(), String::new()]);
        }
        for (text, label) in &bundle.other {
            table
                .rows
                .push(vec!["other".to_string(), text.clone(), label.clone()]);
        }
        Ok(table)
    }

    pub fn from_structured(result: &StructuredResult) -> Result<Self> {
        match result {
            StructuredResult::Entities(bundle) => Self::from_entities(bundle),
            StructuredResult::Transactions(records) => Self::from_transactions(records),
        }
    }

    fn with_header(columns: &[&str]) -> Self {
        Self {
            header: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        if !self.header.is_empty() {
            writer.write_record(&self.header)?;
        }
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| StatementError::export(format!("failed to flush CSV writer: {}", e)))
    }

    pub fn from_csv(data: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(data);
        let header = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }
        Ok(Self { header, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_header_follows_first_row_order() {
        let table = ExportTable::from_rows(vec![
            row(&[("b", "1"), ("a", "2")]),
            row(&[("a", "4"), ("b", "3")]),
        ])
        .unwrap();
        assert_eq!(table.header, vec!["b", "a"]);
        assert_eq!(table.rows[1], vec!["3", "4"]);
    }

    #[test]
    fn test_heterogeneous_rows_are_rejected() {
        let missing = ExportTable::from_rows(vec![
            row(&[("a", "1"), ("b", "2")]),
            row(&[("a", "1"), ("c", "2")]),
        ]);
        assert!(matches!(missing, Err(StatementError::ExportError { .. })));

        let extra = ExportTable::from_rows(vec![
            row(&[("a", "1")]),
            row(&[("a", "1"), ("b", "2")]),
        ]);
        assert!(matches!(extra, Err(StatementError::ExportError { .. })));

        let repeated = ExportTable::from_rows(vec![row(&[("a", "1"), ("a", "2")])]);
        assert!(matches!(repeated, Err(StatementError::ExportError { .. })));
    }

    #[test]
    fn test_empty_transactions_still_write_header() {
        let table = ExportTable::from_transactions(&[]).unwrap();
        let csv = String::from_utf8(table.to_csv().unwrap()).unwrap();
        assert_eq!(csv, "Date,Particulars,Debit,Credit,Running Balance\n");
    }

    #[test]
    fn test_empty_rows_give_empty_file() {
        let table = ExportTable::from_rows(Vec::new()).unwrap();
        assert!(table.to_csv().unwrap().is_empty());
    }

    #[test]
    fn test_entities_flatten_to_rows() {
        let bundle = EntityBundle {
            dates: vec!["May 1, 2024".to_string()],
            other: vec![("$12.00".to_string(), "MONEY".to_string())],
        };
        let table = ExportTable::from_entities(&bundle).unwrap();
        assert_eq!(table.header, ENTITY_COLUMNS);
        assert_eq!(
            table.rows,
            vec![
                vec!["dates", "May 1, 2024", ""],
                vec!["other", "$12.00", "MONEY"],
            ]
        );
    }

    #[test]
    fn test_csv_round_trip_quotes_commas() {
        let records = vec![TransactionRecord {
            date: "01/02/2024".to_string(),
            debit: "1,234.00".to_string(),
            ..TransactionRecord::default()
        }];
        let table = ExportTable::from_transactions(&records).unwrap();
        let parsed = ExportTable::from_csv(&table.to_csv().unwrap()).unwrap();
        assert_eq!(parsed, table);
    }
}
