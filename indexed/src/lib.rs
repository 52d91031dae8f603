//! Binary outputs of a binarization run.
//!
//! - [`IndexedDatasetBuilder`] / [`IndexedDataset`]: append-only record
//!   container (`<prefix>.data` + `<prefix>.idx`) sealed by `finalize`
//! - [`npy`]: 1-D `.npy` arrays for lengths and statistics

mod dataset;
mod error;
pub mod npy;

pub use dataset::{data_path, index_path, IndexedDataset, IndexedDatasetBuilder};
pub use error::IndexedError;
pub use npy::{read_npy, write_npy, NpyElement};
