//! CSV loader for the comparable dataset.
//!
//! The file must start with a header row naming exactly the seven attribute
//! columns plus `price_value`, `price_currency` and `price_unit`, in any
//! order. Every following row is one listing. A single malformed row fails
//! the whole load.

use crate::dataset::Dataset;
use csv::{ReaderBuilder, StringRecord, Trim};
use homeprice_core::{Error, Price, PropertyAttributes, PropertyRecord, Result, ATTRIBUTE_COLUMNS, DIMENSIONS};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub const PRICE_VALUE_COLUMN: &str = "price_value";
pub const PRICE_CURRENCY_COLUMN: &str = "price_currency";
pub const PRICE_UNIT_COLUMN: &str = "price_unit";

/// Every column the dataset header must contain.
pub fn expected_columns() -> Vec<&'static str> {
    let mut columns = ATTRIBUTE_COLUMNS.to_vec();
    columns.extend([PRICE_VALUE_COLUMN, PRICE_CURRENCY_COLUMN, PRICE_UNIT_COLUMN]);
    columns
}

/// Column positions resolved from the header row.
struct ColumnLayout {
    attributes: [usize; DIMENSIONS],
    price_value: usize,
    price_currency: usize,
    price_unit: usize,
    width: usize,
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        if headers.is_empty() {
            return Err(Error::DatasetLoad("missing header row".to_string()));
        }

        let expected = expected_columns();
        if headers.len() != expected.len() {
            return Err(Error::DatasetLoad(format!(
                "expected {} columns, found {}: {:?}",
                expected.len(),
                headers.len(),
                headers.iter().collect::<Vec<_>>()
            )));
        }

        let position = |name: &str| -> Result<usize> {
            let mut matches = headers.iter().enumerate().filter(|(_, h)| *h == name);
            match (matches.next(), matches.next()) {
                (Some((idx, _)), None) => Ok(idx),
                (Some(_), Some(_)) => Err(Error::DatasetLoad(format!("duplicate column '{}'", name))),
                (None, _) => Err(Error::DatasetLoad(format!("missing column '{}'", name))),
            }
        };

        let mut attributes = [0usize; DIMENSIONS];
        for (slot, name) in attributes.iter_mut().zip(ATTRIBUTE_COLUMNS) {
            *slot = position(name)?;
        }

        Ok(Self {
            attributes,
            price_value: position(PRICE_VALUE_COLUMN)?,
            price_currency: position(PRICE_CURRENCY_COLUMN)?,
            price_unit: position(PRICE_UNIT_COLUMN)?,
            width: headers.len(),
        })
    }

    fn parse_record(&self, record: &StringRecord, line: u64) -> Result<PropertyRecord> {
        if record.len() != self.width {
            return Err(Error::DatasetLoad(format!(
                "line {}: expected {} fields, found {}",
                line,
                self.width,
                record.len()
            )));
        }

        let mut values = [0.0; DIMENSIONS];
        for ((slot, &idx), name) in values.iter_mut().zip(&self.attributes).zip(ATTRIBUTE_COLUMNS) {
            *slot = parse_number(record, idx, name, line)?;
        }

        let price = Price::new(
            parse_number(record, self.price_value, PRICE_VALUE_COLUMN, line)?,
            field(record, self.price_currency),
            field(record, self.price_unit),
        );

        Ok(PropertyRecord::new(PropertyAttributes::from_array(values), price))
    }
}

fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or_default()
}

fn parse_number(record: &StringRecord, idx: usize, name: &str, line: u64) -> Result<f64> {
    let raw = field(record, idx);
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(Error::DatasetLoad(format!(
            "line {}: column '{}' value '{}' is not a valid number",
            line, name, raw
        ))),
    }
}

/// Parse a dataset from any reader. `source` labels the snapshot and errors.
pub fn parse_dataset<R: Read>(reader: R, source: &str) -> Result<Dataset> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| Error::DatasetLoad(format!("{}: failed to read header: {}", source, e)))?
        .clone();
    let layout = ColumnLayout::from_headers(&headers)
        .map_err(|e| Error::DatasetLoad(format!("{}: {}", source, strip_prefix(&e))))?;

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| Error::DatasetLoad(format!("{}: failed to read row {}: {}", source, row + 1, e)))?;
        let line = record.position().map(|p| p.line()).unwrap_or(row as u64 + 2);
        let parsed = layout
            .parse_record(&record, line)
            .map_err(|e| Error::DatasetLoad(format!("{}: {}", source, strip_prefix(&e))))?;
        records.push(parsed);
    }

    if records.is_empty() {
        return Err(Error::DatasetLoad(format!("{}: dataset contains no records", source)));
    }

    Ok(Dataset::new(records, source))
}

/// Load the dataset from a CSV file.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let file = File::open(path)
        .map_err(|e| Error::DatasetLoad(format!("failed to open '{}': {}", source, e)))?;
    parse_dataset(BufReader::new(file), &source)
}

// Avoid "Dataset load error: " appearing twice when adding the source label.
fn strip_prefix(err: &Error) -> String {
    match err {
        Error::DatasetLoad(msg) => msg.clone(),
        other => other.to_string(),
    }
}
