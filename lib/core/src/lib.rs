//! # homeprice Core
//!
//! Core library for the homeprice estimation service.
//!
//! This crate provides the data model and the estimation algorithm:
//!
//! - [`PropertyAttributes`] - The seven numeric attributes of a property
//! - [`PropertyRecord`] - A historical listing with its [`Price`]
//! - [`estimate`] - k-nearest-neighbor price range over a set of records
//! - [`Estimator`] - The same, bound to an [`EstimatorConfig`]
//!
//! ## Example
//!
//! ```rust
//! use homeprice_core::{estimate, Price, PropertyAttributes, PropertyRecord};
//!
//! let a = PropertyAttributes::from_array([1.0, 2.0, 1.0, 80.0, 100.0, 1.0, 0.0]);
//! let records = vec![
//!     PropertyRecord::new(a, Price::new(500.0, "Rp", "juta")),
//!     PropertyRecord::new(a, Price::new(600.0, "Rp", "juta")),
//!     PropertyRecord::new(a, Price::new(700.0, "Rp", "juta")),
//! ];
//!
//! let range = estimate(&a, &records, 3).unwrap();
//! assert_eq!(range.to_string(), "Rp. 500.00 juta - Rp. 700.00 juta");
//! ```

pub mod attributes;
pub mod error;
pub mod estimator;
pub mod record;

pub use attributes::{parse_attribute, PropertyAttributes, QueryAttributes, ATTRIBUTE_COLUMNS, DIMENSIONS};
pub use error::{Error, ErrorKind, Result};
pub use estimator::{
    estimate, nearest, rank, Comparable, DistanceEntry, Estimator, EstimatorConfig, PriceRange,
    DEFAULT_K,
};
pub use record::{Price, PropertyRecord};
