//! Converts a stream of framed binary records on stdin into JSONL on stdout.
//!
//! Exit codes: 0 on success, 2 when the schema file cannot be loaded,
//! 3 when a record fails to convert.

use clap::Parser;
use recordwire::{frames_to_jsonl, JsonCodec, Schema};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "bin2jsonl")]
#[command(about = "Convert a framed binary record stream into JSONL records")]
struct Args {
    /// Schema file used to decode the records
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
    let input = tokio::io::stdin();
    let output = tokio::io::stdout();
    match frames_to_jsonl(&codec, input, output).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("conversion failed: {err}");
            ExitCode::from(3)
        }
    }
}
