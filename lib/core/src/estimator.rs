use crate::{Error, Result, PropertyRecord, Price, QueryAttributes};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Number of comparables used when the caller does not ask for a specific `k`.
pub const DEFAULT_K: usize = 3;

/// Datasets at least this large are scored on the rayon pool.
const PARALLEL_THRESHOLD: usize = 4096;

/// Configuration for the nearest-neighbor estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    pub k: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self { k: DEFAULT_K }
    }
}

/// A reference record paired with its distance to the current query.
#[derive(Debug, Clone, Copy)]
pub struct DistanceEntry<'a> {
    /// Position of the record in the dataset.
    pub index: usize,
    pub record: &'a PropertyRecord,
    pub distance: f64,
}

/// A selected comparable as reported back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparable {
    pub row: usize,
    pub distance: f64,
    pub price: Price,
}

impl From<DistanceEntry<'_>> for Comparable {
    fn from(entry: DistanceEntry<'_>) -> Self {
        Self {
            row: entry.index,
            distance: entry.distance,
            price: entry.record.price.clone(),
        }
    }
}

/// Price range derived from the k nearest comparables.
///
/// `min` and `max` are picked by raw price value; their currency and unit are
/// whatever the winning records carry and may differ from each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Price,
    pub max: Price,
    /// Selected comparables, nearest first.
    pub comparables: Vec<Comparable>,
}

impl PriceRange {
    /// The human-readable range, e.g. `Rp. 500.00 juta - Rp. 700.00 juta`.
    pub fn display(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for PriceRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.min, self.max)
    }
}

/// Compute the distance from `query` to every record, nearest first.
///
/// The sort is stable, so records at equal distance keep dataset order.
pub fn rank<'a>(query: &QueryAttributes, records: &'a [PropertyRecord]) -> Vec<DistanceEntry<'a>> {
    let score = |(index, record): (usize, &'a PropertyRecord)| DistanceEntry {
        index,
        record,
        distance: record.attributes.l2_distance(query),
    };

    let mut entries: Vec<DistanceEntry<'a>> = if records.len() >= PARALLEL_THRESHOLD {
        records.par_iter().enumerate().map(score).collect()
    } else {
        records.iter().enumerate().map(score).collect()
    };

    entries.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    entries
}

/// Select the `k` records closest to `query`.
pub fn nearest<'a>(
    query: &QueryAttributes,
    records: &'a [PropertyRecord],
    k: usize,
) -> Result<Vec<DistanceEntry<'a>>> {
    if k == 0 {
        return Err(Error::InvalidQuery("k must be at least 1".to_string()));
    }
    query.validate()?;

    if records.len() < k {
        return Err(Error::InsufficientData {
            required: k,
            available: records.len(),
        });
    }

    let mut entries = rank(query, records);
    entries.truncate(k);
    Ok(entries)
}

/// Estimate a price range for `query` from its `k` nearest comparables.
pub fn estimate(query: &QueryAttributes, records: &[PropertyRecord], k: usize) -> Result<PriceRange> {
    let neighbors = nearest(query, records, k)?;

    // On equal values the later neighbor wins, for both ends of the range.
    let min = neighbors
        .iter()
        .map(|e| &e.record.price)
        .reduce(|prev, curr| if prev.value < curr.value { prev } else { curr });
    let max = neighbors
        .iter()
        .map(|e| &e.record.price)
        .reduce(|prev, curr| if prev.value > curr.value { prev } else { curr });

    let (min, max) = match (min, max) {
        (Some(min), Some(max)) => (min.clone(), max.clone()),
        _ => {
            return Err(Error::InsufficientData {
                required: k,
                available: 0,
            })
        }
    };

    Ok(PriceRange {
        min,
        max,
        comparables: neighbors.into_iter().map(Comparable::from).collect(),
    })
}

/// Nearest-neighbor estimator bound to a configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Estimator {
    config: EstimatorConfig,
}

impl Estimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> EstimatorConfig {
        self.config
    }

    /// Estimate with the configured `k`.
    pub fn estimate(&self, query: &QueryAttributes, records: &[PropertyRecord]) -> Result<PriceRange> {
        estimate(query, records, self.config.k)
    }

    /// Estimate with a per-call `k`, falling back to the configured one.
    pub fn estimate_with_k(
        &self,
        query: &QueryAttributes,
        records: &[PropertyRecord],
        k: Option<usize>,
    ) -> Result<PriceRange> {
        estimate(query, records, k.unwrap_or(self.config.k))
    }
}
