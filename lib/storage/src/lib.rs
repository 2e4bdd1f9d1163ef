pub mod dataset;
pub mod loader;
pub mod manager;

pub use dataset::{Dataset, DatasetInfo};
pub use loader::{expected_columns, load_dataset, parse_dataset};
pub use manager::{load_with_timeout, DatasetStore, LoadMode, StoreConfig};
