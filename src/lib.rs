//! Air-quality dataset utilities.
//!
//! Two surfaces share this crate: [`chunking`] streams large CSV files
//! into bounded JSON chunk files, and [`dataset`] loads the daily
//! air-quality table into memory and answers read-only queries over it.

pub mod chunking;
pub mod dataset;
pub mod error;

pub use error::AppError;
