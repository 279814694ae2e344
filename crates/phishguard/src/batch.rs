//! Batch classification of pre-extracted feature tables.
//!
//! Input is a header-first CSV whose columns include every canonical feature
//! name, in any order and alongside any other columns. A `status` column
//! (the ground-truth label in training exports) is dropped on load.

use std::io::{Read, Write};
use std::path::Path;

use crate::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::types::{PhishError, PhishResult, Prediction};

/// Column dropped from uploaded tables before inference.
pub const STATUS_COLUMN: &str = "status";

/// Appended column holding the predicted label.
pub const PREDICTION_COLUMN: &str = "Prediction";

/// Appended column holding the phishing confidence, two decimals.
pub const CONFIDENCE_COLUMN: &str = "Confidence_Phishing_%";

/// Default export file name.
pub const DEFAULT_OUTPUT_FILE: &str = "phishing_predictions.csv";

/// An in-memory CSV table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
}

impl FeatureTable {
    /// Read a table from a CSV file.
    pub fn from_path(path: &Path) -> PhishResult<Self> {
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file)?;
        tracing::info!(
            "Read {} rows x {} columns from {}",
            table.len(),
            table.headers.len(),
            path.display()
        );
        Ok(table)
    }

    /// Read a table from any CSV source.
    pub fn from_reader<R: Read>(reader: R) -> PhishResult<Self> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

        let all_headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let keep: Vec<bool> = all_headers.iter().map(|h| h != STATUS_COLUMN).collect();
        if keep.iter().any(|k| !k) {
            tracing::debug!("Dropping '{STATUS_COLUMN}' column");
        }

        let headers = select(&all_headers, &keep, |h| h.clone());
        let mut records = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let fields: Vec<&str> = record.iter().collect();
            records.push(select(&fields, &keep, |f| f.to_string()));
        }

        Ok(Self { headers, records })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Vec<String>] {
        &self.records
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Canonical feature names absent from the header row.
    pub fn missing_columns(&self) -> Vec<String> {
        missing_names(&self.feature_columns())
    }

    /// Column position of every canonical feature, in canonical order.
    fn feature_columns(&self) -> [Option<usize>; FEATURE_COUNT] {
        FEATURE_NAMES.map(|name| self.column_index(name))
    }

    /// Project every row onto the canonical feature order.
    ///
    /// Fails without producing any rows if a canonical column is missing or a
    /// feature cell is not a number. Row numbers in errors are 1-based data
    /// rows (the header is not counted).
    pub fn feature_rows(&self) -> PhishResult<Vec<FeatureVector>> {
        let lookup = self.feature_columns();
        let Some(columns) = lookup.iter().copied().collect::<Option<Vec<usize>>>() else {
            return Err(PhishError::MissingColumns(missing_names(&lookup)));
        };

        self.records
            .iter()
            .enumerate()
            .map(|(row, record)| -> PhishResult<FeatureVector> {
                let mut fv = FeatureVector::zeroed();
                for (feat, &col) in columns.iter().enumerate() {
                    let cell = record[col].trim();
                    fv[feat] = cell.parse::<f64>().map_err(|_| PhishError::InvalidValue {
                        row: row + 1,
                        column: FEATURE_NAMES[feat].to_string(),
                        value: cell.to_string(),
                    })?;
                }
                Ok(fv)
            })
            .collect()
    }

    /// Add (or overwrite) the prediction and confidence columns.
    pub fn append_predictions(&mut self, predictions: &[Prediction]) -> PhishResult<()> {
        if predictions.len() != self.records.len() {
            return Err(PhishError::DimensionMismatch {
                expected: self.records.len(),
                actual: predictions.len(),
            });
        }

        let label_col = self.ensure_column(PREDICTION_COLUMN);
        let confidence_col = self.ensure_column(CONFIDENCE_COLUMN);
        for (record, prediction) in self.records.iter_mut().zip(predictions) {
            record[label_col] = prediction.verdict.label().to_string();
            record[confidence_col] = prediction.phishing_confidence();
        }
        Ok(())
    }

    /// Write the table as CSV.
    pub fn write_to<W: Write>(&self, writer: W) -> PhishResult<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.headers)?;
        for record in &self.records {
            wtr.write_record(record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write the table to a CSV file, creating parent directories.
    pub fn write_to_path(&self, path: &Path) -> PhishResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(path)?;
        self.write_to(file)?;
        tracing::info!("Wrote {} rows to {}", self.len(), path.display());
        Ok(())
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for record in &mut self.records {
            record.push(String::new());
        }
        self.headers.len() - 1
    }
}

fn missing_names(lookup: &[Option<usize>]) -> Vec<String> {
    FEATURE_NAMES
        .iter()
        .zip(lookup)
        .filter(|(_, col)| col.is_none())
        .map(|(name, _)| name.to_string())
        .collect()
}

fn select<T, U>(items: &[T], keep: &[bool], f: impl Fn(&T) -> U) -> Vec<U> {
    items
        .iter()
        .zip(keep)
        .filter(|(_, k)| **k)
        .map(|(item, _)| f(item))
        .collect()
}
