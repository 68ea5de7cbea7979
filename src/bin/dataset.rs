//! Build a chat fine-tuning dataset from the assistant's episode log.

use arjun::app_dirs::{self, StoragePaths};
use arjun::dataset::{self, DatasetOptions};
use std::path::PathBuf;

fn main() {
    if let Err(e) = run() {
        eprintln!("arjun-dataset failed: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut log = StoragePaths::under(&app_dirs::data_dir()).episode_log;
    let mut out = PathBuf::from("data").join("dataset.jsonl");
    let mut options = DatasetOptions::default();

    let mut args = std::env::args().skip(1);
    while let Some(flag) = args.next() {
        if matches!(flag.as_str(), "help" | "--help" | "-h") {
            print_usage();
            return Ok(());
        }
        let Some(value) = args.next() else {
            anyhow::bail!("{flag} requires a value");
        };
        match flag.as_str() {
            "--log" => log = PathBuf::from(value),
            "--out" => out = PathBuf::from(value),
            "--max-examples" => options.max_examples = Some(value.parse()?),
            "--min-user-len" => options.min_user_len = value.parse()?,
            "--min-assist-len" => options.min_assistant_len = value.parse()?,
            other => anyhow::bail!("unknown flag `{other}`"),
        }
    }

    tracing::info!(log = %log.display(), out = %out.display(), "building dataset");
    let report = dataset::build_file(&log, &out, &options)?;
    println!("Total lines read: {}", report.total_lines);
    println!("Examples written: {}", report.written);
    println!("Skipped (malformed JSON): {}", report.malformed);
    println!("Skipped (missing or short fields): {}", report.missing_fields);
    println!("Dataset saved to {}", out.display());
    Ok(())
}

fn print_usage() {
    println!("arjun-dataset - convert the episode log into a chat dataset");
    println!();
    println!("Usage:");
    println!("  arjun-dataset [--log <path>] [--out <path>] [--max-examples <n>]");
    println!("                [--min-user-len <n>] [--min-assist-len <n>]");
}
