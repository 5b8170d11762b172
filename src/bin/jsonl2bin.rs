//! Converts JSONL on stdin into a stream of framed binary records on stdout.
//!
//! Exit codes: 0 on success, 2 when the schema file cannot be loaded,
//! 3 when a record fails to convert.

use clap::Parser;
use recordwire::{jsonl_to_frames, JsonCodec, Schema};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "jsonl2bin")]
#[command(about = "Convert JSONL records into a framed binary record stream")]
struct Args {
    /// Schema file used to encode the records
    schema: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let schema = match Schema::load(&args.schema).await {
        Ok(schema) => Arc::new(schema),
        Err(err) => {
            error!("could not load schema {}: {err}", args.schema.display());
            return ExitCode::from(2);
        }
    };

    let codec = JsonCodec::new(schema);
    let input = BufReader::new(tokio::io::stdin());
    let output = tokio::io::stdout();
    match jsonl_to_frames(&codec, input, output).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("conversion failed: {err}");
            ExitCode::from(3)
        }
    }
}
