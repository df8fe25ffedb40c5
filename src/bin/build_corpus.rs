//! Corpus builder
//!
//! Runs every task of one split of a dataset meta file and writes the shuffled
//! corpus as JSONL.
//!
//! Usage:
//!   cargo run --bin build_corpus -- --meta meta.json --output train.jsonl
//!   cargo run --bin build_corpus -- --meta meta.json --split val --output val.jsonl --seed 7

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::process::ExitCode;
use ui_corpus::annotation::AnnotationCache;
use ui_corpus::config::{load_dataset_meta, FilterConfig};
use ui_corpus::corpus::Corpus;

#[derive(Parser)]
#[command(name = "build_corpus")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build a shuffled multi-task SFT corpus from a dataset meta file", long_about = None)]
struct Cli {
    /// Dataset meta JSON (`{split: {task: spec}}`)
    #[arg(long)]
    meta: PathBuf,

    /// Split to build
    #[arg(long, default_value = "train")]
    split: String,

    /// Output `.jsonl` file
    #[arg(long)]
    output: PathBuf,

    /// Random seed
    #[arg(long, default_value_t = 46)]
    seed: u64,

    /// Keep elements whose text repeats on the page
    #[arg(long)]
    keep_duplicate_text: bool,
}

fn run(cli: &Cli) -> ui_corpus::Result<()> {
    let meta = load_dataset_meta(&cli.meta, &cli.split)?;
    let config = FilterConfig::new().with_duplicate_suppression(!cli.keep_duplicate_text);
    let mut cache = AnnotationCache::with_config(config);
    let mut rng = StdRng::seed_from_u64(cli.seed);

    let corpus = Corpus::build(&meta, &mut cache, &mut rng)?;
    for (task, elem_task, size) in corpus.bucket_sizes() {
        println!("{:<24} {:<20} {:>8}", task, elem_task, size);
    }
    let report = corpus.dump_jsonl(&cli.output)?;
    println!(
        "Wrote {} items ({} QAs) to {} ({} encode errors)",
        report.written,
        corpus.num_qas(),
        cli.output.display(),
        report.encode_errors
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}
