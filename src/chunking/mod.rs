//! Streaming conversion of large CSV files into JSON chunk files.
//!
//! This module reads a tabular source in bounded row windows, serializes
//! each window in one of six orientations, and writes one output file per
//! window, optionally compressed. It never holds more than one window in
//! memory, and every output file is written atomically with automatic
//! cleanup on failure.

mod atomic_writer;
mod compression;
mod converter;
mod json;
mod orient;

pub use atomic_writer::AtomicFileWriter;
pub use compression::Compression;
pub use converter::{chunk_csv_to_json, ChunkConfig, ChunkSummary};
pub use orient::Orientation;
