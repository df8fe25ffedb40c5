//! Advanced-task generator
//!
//! Sends annotated webpages to a vision-language model to produce function
//! inference, detailed description or conversation intention artifacts.
//!
//! Usage:
//!   cargo run --features api --bin gen_advanced -- --task-type detail_desc --webpage-dir pages/
//!   cargo run --features api --bin gen_advanced -- --task-type convers_intent --webpage-dir pages/ --page-part top,mid

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use ui_corpus::generation::{
    run_generation, AdvancedTaskKind, AnthropicClient, GenerationOptions, PagePart, PromptSet, SampleOutcome,
};

#[derive(Parser)]
#[command(name = "gen_advanced")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate advanced-task artifacts with a vision-language model", long_about = None)]
struct Cli {
    /// func_infer, detail_desc or convers_intent
    #[arg(long = "task-type")]
    task_type: AdvancedTaskKind,

    /// Directory holding anno/, raw/ and som/
    #[arg(long = "webpage-dir")]
    webpage_dir: PathBuf,

    /// Page parts to use
    #[arg(long = "page-part", value_delimiter = ',', default_value = "top")]
    page_part: Vec<PagePart>,

    /// Largest page id; defaults per task type
    #[arg(long = "max-id")]
    max_id: Option<u64>,

    /// Regenerate pages that already have an output
    #[arg(long)]
    overwrite: bool,

    /// Directory with the *_prompt.txt files
    #[arg(long = "prompt-dir", default_value = "prompt")]
    prompt_dir: PathBuf,

    /// Model name
    #[arg(long, default_value = ui_corpus::generation::client::DEFAULT_MODEL)]
    model: String,

    /// Worker count; defaults to min(samples, 32, cores)
    #[arg(long)]
    concurrency: Option<usize>,
}

fn run(cli: &Cli) -> ui_corpus::Result<usize> {
    let prompts = PromptSet::load(&cli.prompt_dir)?;
    let client = AnthropicClient::from_env()?.with_model(cli.model.clone());

    let mut options = GenerationOptions::new(cli.task_type)
        .with_parts(cli.page_part.clone())
        .with_overwrite(cli.overwrite);
    if let Some(max_id) = cli.max_id {
        options = options.with_max_id(max_id);
    }
    if let Some(workers) = cli.concurrency {
        options = options.with_concurrency(workers);
    }

    let report = run_generation(&cli.webpage_dir, &prompts, &client, &options)?;
    for (name, outcome) in &report.outcomes {
        if let SampleOutcome::Failed(reason) = outcome {
            eprintln!("  {}: {}", name, reason);
        }
    }
    println!(
        "{}: {} written, {} skipped, {} failed",
        cli.task_type,
        report.written(),
        report.skipped(),
        report.failed()
    );
    Ok(report.failed())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}
