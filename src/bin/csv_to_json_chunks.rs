//! Split a CSV file into multiple JSON chunk files.

use std::path::PathBuf;
use std::process::ExitCode;

use aqdata::chunking::{chunk_csv_to_json, ChunkConfig, Compression, Orientation};
use clap::Parser;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "csv-to-json-chunks")]
#[command(about = "Split a CSV file into multiple JSON chunk files")]
#[command(version)]
struct Cli {
    /// Path to the source CSV file
    source: PathBuf,

    /// Directory to write JSON chunks
    #[arg(short, long, value_name = "DIR", default_value = "chunks")]
    output_dir: PathBuf,

    /// Rows per JSON chunk
    #[arg(short, long, value_name = "N", default_value_t = 50_000)]
    rows_per_chunk: usize,

    /// JSON layout: records, split, index, columns, values or table
    #[arg(long, value_name = "ORIENT", default_value = "records")]
    orient: Orientation,

    /// Optional output compression: gz, bz2, zip or xz
    #[arg(long, value_name = "CODEC")]
    compression: Option<Compression>,

    /// JSON indentation width (compact output when omitted)
    #[arg(long, value_name = "N")]
    indent: Option<usize>,

    /// Escape non-ASCII characters in the output
    #[arg(long)]
    ensure_ascii: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = ChunkConfig::default()
        .rows_per_chunk(cli.rows_per_chunk)
        .orient(cli.orient)
        .compression(cli.compression)
        .ensure_ascii(cli.ensure_ascii)
        .indent(cli.indent);

    match chunk_csv_to_json(&cli.source, &cli.output_dir, &config) {
        Ok(summary) => {
            println!("{:#}", json!({ "status": "ok", "result": summary }));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{:#}", json!({ "status": "error", "error": err.to_payload() }));
            ExitCode::FAILURE
        }
    }
}
