use chrono::{DateTime, Utc};
use homeprice_core::{estimate, PriceRange, PropertyRecord, QueryAttributes, Result};
use serde::{Deserialize, Serialize};

/// An immutable, fully parsed copy of the comparable dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<PropertyRecord>,
    source: String,
    loaded_at: DateTime<Utc>,
}

/// Summary of a dataset snapshot for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub source: String,
    pub records: usize,
    pub loaded_at: String,
}

impl Dataset {
    pub fn new(records: Vec<PropertyRecord>, source: impl Into<String>) -> Self {
        Self {
            records,
            source: source.into(),
            loaded_at: Utc::now(),
        }
    }

    #[inline]
    pub fn records(&self) -> &[PropertyRecord] {
        &self.records
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn info(&self) -> DatasetInfo {
        DatasetInfo {
            source: self.source.clone(),
            records: self.records.len(),
            loaded_at: self.loaded_at.to_rfc3339(),
        }
    }

    /// Estimate a price range for `query` against this snapshot.
    pub fn estimate(&self, query: &QueryAttributes, k: usize) -> Result<PriceRange> {
        estimate(query, &self.records, k)
    }
}
