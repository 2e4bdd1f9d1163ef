//! # homeprice
//!
//! Nearest-neighbor house price estimation for a home-construction marketplace.
//!
//! Given the seven attributes of a planned house (floors, bedrooms, bathrooms,
//! building area, land area, carports, garages), homeprice finds the closest
//! historical listings in a CSV reference dataset and reports the price range
//! they span.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! homeprice --dataset ./dataset/datasetprice.csv --http-port 3000
//! curl -X POST localhost:3000/estimate -H 'content-type: application/json' \
//!   -d '{"jumlah_lantai":1,"kamar_tidur":2,"kamar_mandi":1,"luas_bangunan":80,"luas_tanah":100,"jumlah_carport":1,"jumlah_garage":0}'
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use homeprice::prelude::*;
//!
//! let dataset = load_dataset("./dataset/datasetprice.csv").unwrap();
//! let query = PropertyAttributes::from_array([1.0, 2.0, 1.0, 80.0, 100.0, 1.0, 0.0]);
//! let range = dataset.estimate(&query, DEFAULT_K).unwrap();
//! println!("{}", range);
//! ```
//!
//! ## Crate Structure
//!
//! - `homeprice-core` - Attributes, records, distance and the estimator
//! - `homeprice-storage` - CSV loading and the refreshable dataset snapshot
//! - `homeprice-api` - REST API and the order flow

// Re-export core types
pub use homeprice_core::{
    estimate, Comparable, Error, ErrorKind, Estimator, EstimatorConfig, Price, PriceRange,
    PropertyAttributes, PropertyRecord, QueryAttributes, Result, DEFAULT_K,
};

// Re-export storage
pub use homeprice_storage::{load_dataset, Dataset, DatasetStore, LoadMode, StoreConfig};

// Re-export API
pub use homeprice_api::{InMemoryOrderRepository, OrderRepository, OrderService, PricingService, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        estimate, load_dataset, Dataset, DatasetStore, Error, Estimator, EstimatorConfig,
        LoadMode, Price, PriceRange, PropertyAttributes, PropertyRecord, Result, StoreConfig,
        DEFAULT_K,
    };
}
