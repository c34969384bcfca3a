//! Bounded-memory CSV-to-JSON chunk conversion.
//!
//! Streams the source file once through the `csv` crate, accumulating at
//! most `rows_per_chunk` parsed rows before serializing the window in the
//! configured orientation and writing it out as one chunk file. Peak
//! memory is proportional to the window size, never to the source size.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use serde::Serialize;
use serde_json::Value;

use crate::chunking::atomic_writer::AtomicFileWriter;
use crate::chunking::json;
use crate::chunking::orient::{parse_cell, Chunk, Orientation};
use crate::chunking::Compression;
use crate::error::AppError;

/// Configuration for one conversion run.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Rows per chunk file (default: 50,000).
    pub rows_per_chunk: usize,
    /// Output shape for each chunk.
    pub orient: Orientation,
    /// Optional output codec.
    pub compression: Option<Compression>,
    /// Escape non-ASCII characters in the output.
    pub ensure_ascii: bool,
    /// Pretty-print width; compact output when `None`.
    pub indent: Option<usize>,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            rows_per_chunk: 50_000,
            orient: Orientation::Records,
            compression: None,
            ensure_ascii: false,
            indent: None,
        }
    }
}

impl ChunkConfig {
    /// Sets the rows-per-chunk window size.
    pub fn rows_per_chunk(mut self, rows: usize) -> Self {
        self.rows_per_chunk = rows;
        self
    }

    /// Sets the output orientation.
    pub fn orient(mut self, orient: Orientation) -> Self {
        self.orient = orient;
        self
    }

    /// Sets the output codec.
    pub fn compression(mut self, compression: Option<Compression>) -> Self {
        self.compression = compression;
        self
    }

    /// Sets the non-ASCII escape policy.
    pub fn ensure_ascii(mut self, ensure_ascii: bool) -> Self {
        self.ensure_ascii = ensure_ascii;
        self
    }

    /// Sets the indentation width.
    pub fn indent(mut self, indent: Option<usize>) -> Self {
        self.indent = indent;
        self
    }
}

/// Result of one conversion run.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkSummary {
    /// Number of chunk files written.
    pub chunks: u64,
    /// Total data rows processed.
    pub rows: u64,
    /// Directory the chunks were written to.
    pub output_dir: PathBuf,
    /// Base name used for chunk file naming.
    pub base: String,
}

/// Splits a CSV file into JSON chunk files.
///
/// Each window of up to `rows_per_chunk` rows becomes one file named
/// `{base}.part{index}.json`, plus the codec suffix when compression is
/// configured. Chunk boundaries are positional; row order is preserved.
///
/// # Errors
///
/// Returns `AppError::InvalidConfiguration` for a zero window size,
/// `AppError::NotFound` if `source` does not exist (checked before the
/// destination directory is touched), `AppError::Csv` for malformed
/// input, and `AppError::Io` for write failures.
pub fn chunk_csv_to_json(
    source: &Path,
    output_dir: &Path,
    config: &ChunkConfig,
) -> Result<ChunkSummary, AppError> {
    if config.rows_per_chunk == 0 {
        return Err(AppError::InvalidConfiguration(
            "rows_per_chunk must be a positive integer".into(),
        ));
    }
    if !source.exists() {
        return Err(AppError::NotFound(source.to_path_buf()));
    }

    fs::create_dir_all(output_dir)?;

    let base = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "chunk".to_string());

    let file = File::open(source)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(BufReader::new(file));

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    #[cfg(debug_assertions)]
    tracing::debug!(
        source = %source.display(),
        columns = headers.len(),
        rows_per_chunk = config.rows_per_chunk,
        "starting chunk conversion"
    );

    let mut window: Vec<Vec<Value>> = Vec::new();
    let mut window_offset: u64 = 0;
    let mut chunk_index: u64 = 0;
    let mut total_rows: u64 = 0;

    for result in reader.records() {
        let record = result?;
        window.push(record.iter().map(parse_cell).collect());
        total_rows += 1;

        if window.len() == config.rows_per_chunk {
            write_chunk(output_dir, &base, chunk_index, &headers, &window, window_offset, config)?;
            chunk_index += 1;
            window_offset = total_rows;
            window.clear();
        }
    }

    // Final short window, if any.
    if !window.is_empty() {
        write_chunk(output_dir, &base, chunk_index, &headers, &window, window_offset, config)?;
        chunk_index += 1;
    }

    #[cfg(debug_assertions)]
    tracing::debug!(total_rows, chunks = chunk_index, "chunk conversion complete");

    Ok(ChunkSummary {
        chunks: chunk_index,
        rows: total_rows,
        output_dir: output_dir.to_path_buf(),
        base,
    })
}

fn write_chunk(
    output_dir: &Path,
    base: &str,
    index: u64,
    headers: &[String],
    rows: &[Vec<Value>],
    offset: u64,
    config: &ChunkConfig,
) -> Result<(), AppError> {
    let chunk = Chunk { headers, rows, offset };
    let value = config.orient.serialize_chunk(&chunk);
    let text = json::render(&value, config.indent, config.ensure_ascii)?;

    let plain_name = format!("{base}.part{index}.json");
    let plain_path = output_dir.join(&plain_name);

    // The uncompressed unit is written first. With compression configured
    // it is the transient intermediate; the codec consumes the same bytes,
    // so the two paths cannot drift apart.
    let mut writer = AtomicFileWriter::new(&plain_path)?;
    writer.write_all(&text)?;
    writer.finish()?;

    if let Some(codec) = config.compression {
        let encoded = codec.encode(&text, &plain_name)?;
        let final_path = output_dir.join(format!("{plain_name}.{}", codec.extension()));

        let mut writer = AtomicFileWriter::new(&final_path)?;
        writer.write_all(&encoded)?;
        writer.finish()?;

        // Removal of the intermediate is best-effort; the compressed unit
        // is already in place.
        if let Err(err) = fs::remove_file(&plain_path) {
            tracing::warn!(
                path = %plain_path.display(),
                error = %err,
                "failed to remove intermediate chunk file"
            );
        }
    }

    #[cfg(debug_assertions)]
    tracing::debug!(chunk_index = index, rows = rows.len(), "wrote chunk");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    /// Helper to create a test CSV file and return its path.
    fn create_test_csv(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("aqi.csv");
        fs::write(&path, content).expect("write test CSV");
        path
    }

    fn read_json(path: &Path) -> Value {
        let text = fs::read_to_string(path).expect("read chunk");
        serde_json::from_str(&text).expect("parse chunk")
    }

    #[test]
    fn splits_rows_into_expected_chunks() {
        let source_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let source = create_test_csv(&source_dir, "A,B\n1,2\n3,4\n5,6\n");

        let config = ChunkConfig::default().rows_per_chunk(2);
        let summary = chunk_csv_to_json(&source, out_dir.path(), &config).expect("convert");

        assert_eq!(summary.chunks, 2);
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.base, "aqi");
        assert_eq!(summary.output_dir, out_dir.path());

        let part0 = read_json(&out_dir.path().join("aqi.part0.json"));
        let part1 = read_json(&out_dir.path().join("aqi.part1.json"));
        assert_eq!(part0, json!([{"A": 1, "B": 2}, {"A": 3, "B": 4}]));
        assert_eq!(part1, json!([{"A": 5, "B": 6}]));
        assert!(!out_dir.path().join("aqi.part2.json").exists());
    }

    #[test]
    fn chunk_count_is_ceiling_of_rows_over_window() {
        let source_dir = TempDir::new().unwrap();
        let rows: String = (0..10).map(|i| format!("{i},{}\n", i * 2)).collect();
        let source = create_test_csv(&source_dir, &format!("A,B\n{rows}"));

        for (window, expected_chunks) in [(3usize, 4u64), (5, 2), (10, 1), (100, 1)] {
            let out_dir = TempDir::new().unwrap();
            let config = ChunkConfig::default().rows_per_chunk(window);
            let summary = chunk_csv_to_json(&source, out_dir.path(), &config).expect("convert");
            assert_eq!(summary.chunks, expected_chunks, "window {window}");
            assert_eq!(summary.rows, 10);
        }
    }

    #[test]
    fn exact_multiple_produces_no_short_final_chunk() {
        let source_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let source = create_test_csv(&source_dir, "A\n1\n2\n3\n4\n");

        let config = ChunkConfig::default().rows_per_chunk(2);
        let summary = chunk_csv_to_json(&source, out_dir.path(), &config).expect("convert");

        assert_eq!(summary.chunks, 2);
        let part1 = read_json(&out_dir.path().join("aqi.part1.json"));
        assert_eq!(part1.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn concatenated_chunks_preserve_row_order() {
        let source_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let rows: String = (0..10).map(|i| format!("{i}\n")).collect();
        let source = create_test_csv(&source_dir, &format!("n\n{rows}"));

        let config = ChunkConfig::default().rows_per_chunk(3);
        let summary = chunk_csv_to_json(&source, out_dir.path(), &config).expect("convert");

        let mut seen = Vec::new();
        for index in 0..summary.chunks {
            let chunk = read_json(&out_dir.path().join(format!("aqi.part{index}.json")));
            for row in chunk.as_array().expect("records array") {
                seen.push(row["n"].as_i64().expect("number"));
            }
        }
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn empty_source_creates_directory_but_no_files() {
        let source_dir = TempDir::new().unwrap();
        let out_root = TempDir::new().unwrap();
        let out_dir = out_root.path().join("chunks");

        for content in ["A,B\n", ""] {
            let source = create_test_csv(&source_dir, content);
            let summary =
                chunk_csv_to_json(&source, &out_dir, &ChunkConfig::default()).expect("convert");

            assert_eq!(summary.chunks, 0);
            assert_eq!(summary.rows, 0);
            assert!(out_dir.is_dir(), "destination must still be created");
            let entries: Vec<_> = fs::read_dir(&out_dir).unwrap().collect();
            assert!(entries.is_empty(), "no chunk files for {content:?}");
        }
    }

    #[test]
    fn missing_source_fails_without_side_effects() {
        let out_root = TempDir::new().unwrap();
        let out_dir = out_root.path().join("chunks");

        let result = chunk_csv_to_json(
            Path::new("/nonexistent/aqi.csv"),
            &out_dir,
            &ChunkConfig::default(),
        );

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(!out_dir.exists(), "destination must not be created");
    }

    #[test]
    fn zero_window_is_rejected_eagerly() {
        let source_dir = TempDir::new().unwrap();
        let out_root = TempDir::new().unwrap();
        let out_dir = out_root.path().join("chunks");
        let source = create_test_csv(&source_dir, "A\n1\n");

        let config = ChunkConfig::default().rows_per_chunk(0);
        let result = chunk_csv_to_json(&source, &out_dir, &config);

        assert!(matches!(result, Err(AppError::InvalidConfiguration(_))));
        assert!(!out_dir.exists());
    }

    #[test]
    fn pre_existing_destination_is_fine() {
        let source_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let source = create_test_csv(&source_dir, "A\n1\n");

        chunk_csv_to_json(&source, out_dir.path(), &ChunkConfig::default()).expect("first run");
        chunk_csv_to_json(&source, out_dir.path(), &ChunkConfig::default()).expect("second run");
    }

    #[test]
    fn reruns_are_byte_identical() {
        let source_dir = TempDir::new().unwrap();
        let source = create_test_csv(&source_dir, "city,aqi\nDelhi,472\nMumbai,161\nChennai,\n");

        let mut snapshots = Vec::new();
        for _ in 0..2 {
            let out_dir = TempDir::new().unwrap();
            let config = ChunkConfig::default()
                .rows_per_chunk(2)
                .compression(Some(Compression::Gzip));
            chunk_csv_to_json(&source, out_dir.path(), &config).expect("convert");

            let mut files: Vec<(String, Vec<u8>)> = fs::read_dir(out_dir.path())
                .unwrap()
                .map(|entry| {
                    let entry = entry.unwrap();
                    let name = entry.file_name().to_string_lossy().into_owned();
                    let bytes = fs::read(entry.path()).unwrap();
                    (name, bytes)
                })
                .collect();
            files.sort();
            snapshots.push(files);
        }

        assert_eq!(snapshots[0], snapshots[1]);
    }

    #[test]
    fn missing_and_non_finite_values_serialize_as_null() {
        let source_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let source = create_test_csv(&source_dir, "city,aqi\nDelhi,NaN\nMumbai,\nChennai,inf\n");

        chunk_csv_to_json(&source, out_dir.path(), &ChunkConfig::default()).expect("convert");

        let chunk = read_json(&out_dir.path().join("aqi.part0.json"));
        for row in chunk.as_array().expect("records") {
            assert!(row["aqi"].is_null(), "row {row}");
        }
        let text = fs::read_to_string(out_dir.path().join("aqi.part0.json")).unwrap();
        assert!(!text.contains("NaN"));
    }

    #[test]
    fn compression_leaves_no_intermediate_behind() {
        let source_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let source = create_test_csv(&source_dir, "A,B\n1,2\n3,4\n5,6\n");

        let config = ChunkConfig::default()
            .rows_per_chunk(2)
            .compression(Some(Compression::Gzip));
        let summary = chunk_csv_to_json(&source, out_dir.path(), &config).expect("convert");
        assert_eq!(summary.chunks, 2);

        assert!(out_dir.path().join("aqi.part0.json.gz").exists());
        assert!(out_dir.path().join("aqi.part1.json.gz").exists());
        assert!(!out_dir.path().join("aqi.part0.json").exists());
        assert!(!out_dir.path().join("aqi.part1.json").exists());
    }

    #[test]
    fn compressed_bytes_match_uncompressed_run() {
        let source_dir = TempDir::new().unwrap();
        let source = create_test_csv(&source_dir, "A,B\n1,2\n3,4\n");

        let plain_dir = TempDir::new().unwrap();
        chunk_csv_to_json(&source, plain_dir.path(), &ChunkConfig::default()).expect("plain");
        let plain = fs::read(plain_dir.path().join("aqi.part0.json")).unwrap();

        let gz_dir = TempDir::new().unwrap();
        let config = ChunkConfig::default().compression(Some(Compression::Gzip));
        chunk_csv_to_json(&source, gz_dir.path(), &config).expect("compressed");

        let encoded = fs::read(gz_dir.path().join("aqi.part0.json.gz")).unwrap();
        let mut decoder = flate2::read::GzDecoder::new(encoded.as_slice());
        let mut decoded = Vec::new();
        decoder.read_to_end(&mut decoded).unwrap();

        assert_eq!(decoded, plain);
    }

    #[test]
    fn zip_units_carry_the_plain_entry_name() {
        let source_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let source = create_test_csv(&source_dir, "A\n1\n");

        let config = ChunkConfig::default().compression(Some(Compression::Zip));
        chunk_csv_to_json(&source, out_dir.path(), &config).expect("convert");

        let file = fs::File::open(out_dir.path().join("aqi.part0.json.zip")).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        assert!(archive.by_name("aqi.part0.json").is_ok());
    }

    #[test]
    fn indent_and_ascii_policies_are_applied() {
        let source_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let source = create_test_csv(&source_dir, "city\nZürich\n");

        let config = ChunkConfig::default().indent(Some(2)).ensure_ascii(true);
        chunk_csv_to_json(&source, out_dir.path(), &config).expect("convert");

        let text = fs::read_to_string(out_dir.path().join("aqi.part0.json")).unwrap();
        assert!(text.is_ascii());
        assert!(text.contains("u00fc"), "umlaut should be escaped: {text}");
        assert!(text.contains("\n  "), "indentation should be applied");
    }

    #[test]
    fn split_orientation_keeps_global_indices() {
        let source_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let source = create_test_csv(&source_dir, "A\n10\n20\n30\n");

        let config = ChunkConfig::default()
            .rows_per_chunk(2)
            .orient(Orientation::Split);
        chunk_csv_to_json(&source, out_dir.path(), &config).expect("convert");

        let part0 = read_json(&out_dir.path().join("aqi.part0.json"));
        let part1 = read_json(&out_dir.path().join("aqi.part1.json"));
        assert_eq!(part0["index"], json!([0, 1]));
        assert_eq!(part1["index"], json!([2]));
        assert_eq!(part1["data"], json!([[30]]));
    }
}
