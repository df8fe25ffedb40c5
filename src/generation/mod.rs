//! Advanced-task artifact generation with a vision-language model.
//!
//! For every selected page the annotation is rendered as text, combined with
//! the task prompt and sent with the screenshot to a [`VisionModel`]. Responses
//! are written next to the page:
//!
//! ```text
//! <page_dir>/anno/<name>.json          input annotation
//! <page_dir>/raw/<name>.png            screenshot (function, detail)
//! <page_dir>/som/<name>.png            set-of-marks screenshot (intention)
//! <page_dir>/intention/<name>.json     parsed intention turns
//! <page_dir>/intention/<name>.txt      unparsable intention response
//! <page_dir>/function/<name>.txt
//! <page_dir>/detail/<name>.txt
//! ```
//!
//! These artifacts are what [`crate::tasks::advanced`] reads back.

pub mod render;
pub mod select;

#[cfg(feature = "api")]
#[cfg_attr(docsrs, doc(cfg(feature = "api")))]
pub mod client;

pub use render::{render_annotation, RenderOptions};
pub use select::{page_number, select_samples};

#[cfg(feature = "api")]
pub use client::AnthropicClient;

use crate::annotation::{parse_page, StructureRules};
use crate::error::{Error, Result};
use log::{info, warn};
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Upper bound on concurrent model requests.
pub const MAX_CONCURRENCY: usize = 32;

/// Which advanced task to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvancedTaskKind {
    /// Function inference
    FuncInfer,
    /// Detailed description
    DetailDesc,
    /// Conversation intention
    ConversIntent,
}

impl AdvancedTaskKind {
    /// Command-line name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AdvancedTaskKind::FuncInfer => "func_infer",
            AdvancedTaskKind::DetailDesc => "detail_desc",
            AdvancedTaskKind::ConversIntent => "convers_intent",
        }
    }

    /// Output directory under the page directory.
    pub fn output_dir(&self) -> &'static str {
        match self {
            AdvancedTaskKind::FuncInfer => "function",
            AdvancedTaskKind::DetailDesc => "detail",
            AdvancedTaskKind::ConversIntent => "intention",
        }
    }

    /// Screenshot directory under the page directory.
    pub fn image_dir(&self) -> &'static str {
        match self {
            AdvancedTaskKind::ConversIntent => "som",
            _ => "raw",
        }
    }

    /// Default page id bound.
    pub fn default_max_id(&self) -> u64 {
        match self {
            AdvancedTaskKind::FuncInfer => 1_000_000,
            AdvancedTaskKind::DetailDesc => 100_000,
            AdvancedTaskKind::ConversIntent => 9_999,
        }
    }

    /// Rendering options for the annotation text.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions::default()
            .with_index(*self == AdvancedTaskKind::ConversIntent)
            .with_title_desc(true)
    }

    fn response_cue(&self) -> &'static str {
        match self {
            AdvancedTaskKind::FuncInfer => "Generated function inference:\n",
            AdvancedTaskKind::DetailDesc => "Generated detailed description:\n",
            AdvancedTaskKind::ConversIntent => "Generated QA pairs:\n",
        }
    }
}

impl fmt::Display for AdvancedTaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdvancedTaskKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "func_infer" => Ok(AdvancedTaskKind::FuncInfer),
            "detail_desc" => Ok(AdvancedTaskKind::DetailDesc),
            "convers_intent" => Ok(AdvancedTaskKind::ConversIntent),
            _ => Err(Error::Config(format!(
                "unknown task type '{}', expected func_infer, detail_desc or convers_intent",
                s
            ))),
        }
    }
}

/// Vertical slice of a long page screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PagePart {
    /// `_top`
    Top,
    /// `_mid`
    Mid,
    /// `_btm`
    Btm,
}

impl PagePart {
    /// Every part.
    pub const ALL: [PagePart; 3] = [PagePart::Top, PagePart::Mid, PagePart::Btm];

    /// File name suffix.
    pub fn suffix(&self) -> &'static str {
        match self {
            PagePart::Top => "_top",
            PagePart::Mid => "_mid",
            PagePart::Btm => "_btm",
        }
    }
}

impl FromStr for PagePart {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "top" => Ok(PagePart::Top),
            "mid" => Ok(PagePart::Mid),
            "btm" => Ok(PagePart::Btm),
            _ => Err(Error::Config(format!("unknown page part '{}', expected top, mid or btm", s))),
        }
    }
}

/// A vision-language model that answers one prompt about one image.
pub trait VisionModel: Send + Sync {
    /// Complete `user` under `system` with the image at `image` attached.
    fn complete(&self, system: &str, user: &str, image: &Path) -> Result<String>;
}

/// Prompt texts loaded from a prompt directory.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSet {
    /// System prompt
    pub system: String,
    /// Preamble shared by all tasks
    pub share: String,
    /// Intention task prompt
    pub intention: String,
    /// Function task prompt
    pub function: String,
    /// Detail task prompt
    pub detail: String,
}

impl PromptSet {
    /// Read `{system,share,intention,function,detail}_prompt.txt` from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let read = |name: &str| -> Result<String> {
            let path = dir.join(format!("{}_prompt.txt", name));
            fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("cannot read prompt {}: {}", path.display(), e)))
        };
        Ok(Self {
            system: read("system")?,
            share: read("share")?,
            intention: read("intention")?,
            function: read("function")?,
            detail: read("detail")?,
        })
    }

    /// Task-specific prompt.
    pub fn task_prompt(&self, kind: AdvancedTaskKind) -> &str {
        match kind {
            AdvancedTaskKind::FuncInfer => &self.function,
            AdvancedTaskKind::DetailDesc => &self.detail,
            AdvancedTaskKind::ConversIntent => &self.intention,
        }
    }

    /// Full user prompt for one rendered annotation.
    pub fn user_prompt(&self, kind: AdvancedTaskKind, annotation: &str) -> String {
        format!(
            "{}\n{}\nPrompt ends.\n\nSample annotation:\n{}Annotation ends.\n\n{}",
            self.share,
            self.task_prompt(kind),
            annotation,
            kind.response_cue()
        )
    }
}

/// Settings of one generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// Task to generate
    pub kind: AdvancedTaskKind,
    /// Selected page parts
    pub parts: Vec<PagePart>,
    /// Largest page id to consider
    pub max_id: u64,
    /// Regenerate even when an output exists
    pub overwrite: bool,
    /// Worker count, `None` for `min(samples, 32, cores)`
    pub concurrency: Option<usize>,
}

impl GenerationOptions {
    /// Defaults for a task: top parts only, the task's id bound, no overwrite.
    pub fn new(kind: AdvancedTaskKind) -> Self {
        Self {
            kind,
            parts: vec![PagePart::Top],
            max_id: kind.default_max_id(),
            overwrite: false,
            concurrency: None,
        }
    }

    /// Set the selected page parts.
    pub fn with_parts(mut self, parts: Vec<PagePart>) -> Self {
        self.parts = parts;
        self
    }

    /// Set the page id bound.
    pub fn with_max_id(mut self, max_id: u64) -> Self {
        self.max_id = max_id;
        self
    }

    /// Enable or disable overwriting existing outputs.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Fix the worker count.
    pub fn with_concurrency(mut self, workers: usize) -> Self {
        self.concurrency = Some(workers.max(1));
        self
    }
}

/// What happened to one sample.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    /// Output already present
    Skipped,
    /// Response written to the path
    Written(PathBuf),
    /// Intention response did not parse; raw text written to the path
    Unparsed(PathBuf),
    /// The sample failed; the message says why
    Failed(String),
}

/// Per-sample outcomes of a run, in selection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationReport {
    /// `(sample name, outcome)`
    pub outcomes: Vec<(String, SampleOutcome)>,
}

impl GenerationReport {
    fn count(&self, pred: impl Fn(&SampleOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }

    /// Samples with a new output, parsed or not.
    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, SampleOutcome::Written(_) | SampleOutcome::Unparsed(_)))
    }

    /// Samples skipped because their output existed.
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, SampleOutcome::Skipped))
    }

    /// Failed samples.
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SampleOutcome::Failed(_)))
    }
}

fn output_exists(out_dir: &Path, name: &str, kind: AdvancedTaskKind) -> bool {
    let txt = out_dir.join(format!("{}.txt", name));
    let json = out_dir.join(format!("{}.json", name));
    txt.exists() || (kind == AdvancedTaskKind::ConversIntent && json.exists())
}

fn generate_sample(
    page_dir: &Path,
    name: &str,
    prompts: &PromptSet,
    model: &dyn VisionModel,
    options: &GenerationOptions,
) -> Result<SampleOutcome> {
    let kind = options.kind;
    let out_dir = page_dir.join(kind.output_dir());
    if !options.overwrite && output_exists(&out_dir, name, kind) {
        return Ok(SampleOutcome::Skipped);
    }

    let anno_path = page_dir.join("anno").join(format!("{}.json", name));
    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&anno_path)?)?;
    let page = parse_page(&raw, &StructureRules::unbounded()).map_err(|e| Error::InvalidRecord {
        source_name: anno_path.display().to_string(),
        reason: e.to_string(),
    })?;
    let user = prompts.user_prompt(kind, &render_annotation(&page, kind.render_options()));
    let image = page_dir.join(kind.image_dir()).join(format!("{}.png", name));

    let response = model.complete(&prompts.system, &user, &image)?;

    if kind == AdvancedTaskKind::ConversIntent {
        match serde_json::from_str::<serde_json::Value>(&response) {
            Ok(parsed) => {
                let path = out_dir.join(format!("{}.json", name));
                fs::write(&path, serde_json::to_string_pretty(&parsed)?)?;
                return Ok(SampleOutcome::Written(path));
            },
            Err(e) => {
                warn!("{}: intention response is not JSON ({}), keeping raw text", name, e);
                let path = out_dir.join(format!("{}.txt", name));
                fs::write(&path, &response)?;
                return Ok(SampleOutcome::Unparsed(path));
            },
        }
    }

    let path = out_dir.join(format!("{}.txt", name));
    fs::write(&path, &response)?;
    Ok(SampleOutcome::Written(path))
}

/// Generate artifacts for every selected page of `page_dir`.
///
/// Samples run on a dedicated pool of `min(samples, 32, cores)` workers unless
/// the options fix the count. A failing sample is recorded in the report and
/// never stops the others.
pub fn run_generation(
    page_dir: &Path,
    prompts: &PromptSet,
    model: &dyn VisionModel,
    options: &GenerationOptions,
) -> Result<GenerationReport> {
    let samples = select_samples(page_dir, &options.parts, options.max_id)?;
    fs::create_dir_all(page_dir.join(options.kind.output_dir()))?;
    if samples.is_empty() {
        return Ok(GenerationReport::default());
    }

    let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
    let workers = options
        .concurrency
        .unwrap_or_else(|| samples.len().min(MAX_CONCURRENCY).min(cores))
        .max(1);
    info!("Generating {} for {} samples with {} workers", options.kind, samples.len(), workers);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| Error::Generation(format!("cannot start worker pool: {}", e)))?;

    let outcomes = pool.install(|| {
        samples
            .par_iter()
            .map(|name| {
                let outcome = generate_sample(page_dir, name, prompts, model, options).unwrap_or_else(|e| {
                    warn!("{}: {}", name, e);
                    SampleOutcome::Failed(e.to_string())
                });
                (name.clone(), outcome)
            })
            .collect()
    });

    let report = GenerationReport { outcomes };
    info!(
        "Done: {} written, {} skipped, {} failed",
        report.written(),
        report.skipped(),
        report.failed()
    );
    Ok(report)
}
