//! Task-specific QA generators.
//!
//! Every dataset task named in the meta file maps to one [`TaskFamily`].
//! Each family has its own generator type implementing [`QaGenerator`], and
//! [`Generator`] is the closed enum over all of them:
//!
//! ```text
//! TaskSpec ──► Generator::from_spec ──► read_annotations(cache) ──► create_qa_items(rng)
//!                                                                          │
//!                                        TaskBase buckets: ElementTask → [ConversationItem]
//! ```
//!
//! All randomness comes from the `rng` argument, so a seeded generator
//! produces the same items every run.

pub mod accessibility;
pub mod advanced;
pub mod basic;
pub mod captioning;
pub mod encoding;
pub mod icon_desc;
pub mod icon_mixed;
pub mod instruct;
pub mod prompts;
pub mod som;
pub mod widget;

pub use accessibility::AccessibilityTask;
pub use advanced::AdvancedTask;
pub use basic::BasicTask;
pub use captioning::CaptioningTask;
pub use encoding::{add_encoding_suffix, format_box, CoordFormat};
pub use icon_desc::IconDescTask;
pub use icon_mixed::IconMixedTask;
pub use instruct::{LlavaTask, MonkeyTask};
pub use som::SomTask;
pub use widget::WidgetTask;

use crate::annotation::AnnotationCache;
use crate::config::TaskSpec;
use crate::conversation::{ConversationItem, ItemId};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Element-level task: what a single QA pair asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementTask {
    /// Element text → box
    Grounding,
    /// Box → element text
    Ocr,
    /// Box → aria label or title
    GeneralAcb,
    /// Image/icon box → alt text
    ImageAlt,
    /// Page → `<title>`
    Title,
    /// Page → meta description
    Description,
    /// Page → meta keywords
    Keywords,
    /// Icon description → box
    IconGrounding,
    /// Icon box → description
    IconReferring,
    /// Every pasted icon with its box
    IconAllGrounding,
    /// Framed general element → text and box
    SomGeneral,
    /// Framed icon → text and box
    SomIcon,
    /// Icon image → description
    IconDesc,
    /// Synthetic widget grounding
    Ricosca,
    /// Widget instruction → box
    WidgetGrounding,
    /// Widget box → instruction
    WidgetCaption,
    /// Screen → summary
    Screen2Words,
    /// Multi-turn conversational intent
    Intention,
    /// Page function inference
    Function,
    /// Detailed page description
    Detail,
    /// Caption/VQA bulk corpus
    MonkeyTraining,
    /// Multi-turn visual instruction corpus
    LlavaInstruct,
}

impl ElementTask {
    /// Name used in meta files and item ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementTask::Grounding => "grounding",
            ElementTask::Ocr => "ocr",
            ElementTask::GeneralAcb => "general_acb",
            ElementTask::ImageAlt => "image_alt",
            ElementTask::Title => "title",
            ElementTask::Description => "description",
            ElementTask::Keywords => "keywords",
            ElementTask::IconGrounding => "icon_grounding",
            ElementTask::IconReferring => "icon_referring",
            ElementTask::IconAllGrounding => "icon_all_grounding",
            ElementTask::SomGeneral => "som_general",
            ElementTask::SomIcon => "som_icon",
            ElementTask::IconDesc => "icon_desc",
            ElementTask::Ricosca => "ricosca",
            ElementTask::WidgetGrounding => "widget-grounding",
            ElementTask::WidgetCaption => "widget-caption",
            ElementTask::Screen2Words => "screen2words",
            ElementTask::Intention => "intention",
            ElementTask::Function => "function",
            ElementTask::Detail => "detail",
            ElementTask::MonkeyTraining => "monkey_training",
            ElementTask::LlavaInstruct => "llava_instruct",
        }
    }

    const ALL: [ElementTask; 22] = [
        ElementTask::Grounding,
        ElementTask::Ocr,
        ElementTask::GeneralAcb,
        ElementTask::ImageAlt,
        ElementTask::Title,
        ElementTask::Description,
        ElementTask::Keywords,
        ElementTask::IconGrounding,
        ElementTask::IconReferring,
        ElementTask::IconAllGrounding,
        ElementTask::SomGeneral,
        ElementTask::SomIcon,
        ElementTask::IconDesc,
        ElementTask::Ricosca,
        ElementTask::WidgetGrounding,
        ElementTask::WidgetCaption,
        ElementTask::Screen2Words,
        ElementTask::Intention,
        ElementTask::Function,
        ElementTask::Detail,
        ElementTask::MonkeyTraining,
        ElementTask::LlavaInstruct,
    ];
}

impl fmt::Display for ElementTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementTask {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ElementTask::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::Config(format!("unknown element task '{}'", s)))
    }
}

/// Generator family a dataset task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskFamily {
    /// `basic`, `basic_cropped`
    Basic,
    /// `accessibility`
    Accessibility,
    /// `captioning`
    Captioning,
    /// `icon_mixed`, `icon_mixed_cropped`
    IconMixed,
    /// `som`, `som_cropped`
    Som,
    /// `icon_desc`
    IconDesc,
    /// `rico_tasks`
    RicoTasks,
    /// `advanced_tasks`
    AdvancedTasks,
    /// `monkey_training`
    MonkeyTraining,
    /// `llava_instruct`
    LlavaInstruct,
}

impl TaskFamily {
    /// Resolve a dataset task name.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownTask`] for names outside the closed set.
    pub fn from_task_name(task: &str) -> Result<Self> {
        let family = match task {
            "basic" | "basic_cropped" => TaskFamily::Basic,
            "accessibility" => TaskFamily::Accessibility,
            "captioning" => TaskFamily::Captioning,
            "icon_mixed" | "icon_mixed_cropped" => TaskFamily::IconMixed,
            "som" | "som_cropped" => TaskFamily::Som,
            "icon_desc" => TaskFamily::IconDesc,
            "rico_tasks" => TaskFamily::RicoTasks,
            "advanced_tasks" => TaskFamily::AdvancedTasks,
            "monkey_training" => TaskFamily::MonkeyTraining,
            "llava_instruct" => TaskFamily::LlavaInstruct,
            _ => return Err(Error::UnknownTask(task.to_string())),
        };
        Ok(family)
    }

    /// Element tasks a family may be configured with.
    pub fn legal_tasks(&self) -> &'static [ElementTask] {
        use ElementTask::*;
        match self {
            TaskFamily::Basic => &[Grounding, Ocr],
            TaskFamily::Accessibility => &[GeneralAcb, ImageAlt],
            TaskFamily::Captioning => &[Title, Description, Keywords],
            TaskFamily::IconMixed => &[IconGrounding, IconReferring, IconAllGrounding],
            TaskFamily::Som => &[SomGeneral, SomIcon],
            TaskFamily::IconDesc => &[IconDesc],
            TaskFamily::RicoTasks => &[Ricosca, WidgetGrounding, WidgetCaption, Screen2Words],
            TaskFamily::AdvancedTasks => &[Intention, Function, Detail],
            TaskFamily::MonkeyTraining => &[MonkeyTraining],
            TaskFamily::LlavaInstruct => &[LlavaInstruct],
        }
    }
}

/// State shared by every generator: configuration and output buckets.
#[derive(Debug, Clone)]
pub struct TaskBase {
    task: String,
    family: TaskFamily,
    spec: TaskSpec,
    elem_tasks: Vec<ElementTask>,
    qa_data: IndexMap<ElementTask, Vec<ConversationItem>>,
}

impl TaskBase {
    /// Validate a task spec against its family.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownTask`] for an unknown task name and
    /// [`Error::IllegalElementTask`] when an element task is outside the
    /// family's legal set.
    pub fn new(task: &str, spec: TaskSpec) -> Result<Self> {
        let family = TaskFamily::from_task_name(task)?;
        let mut elem_tasks = Vec::new();
        for name in &spec.elem_tasks {
            let elem_task = name
                .parse::<ElementTask>()
                .ok()
                .filter(|t| family.legal_tasks().contains(t))
                .ok_or_else(|| Error::IllegalElementTask {
                    task: task.to_string(),
                    elem_task: name.clone(),
                })?;
            if !elem_tasks.contains(&elem_task) {
                elem_tasks.push(elem_task);
            }
        }
        Ok(Self {
            task: task.to_string(),
            family,
            spec,
            elem_tasks,
            qa_data: IndexMap::new(),
        })
    }

    /// Dataset task name.
    pub fn task(&self) -> &str {
        &self.task
    }

    /// Family of the task.
    pub fn family(&self) -> TaskFamily {
        self.family
    }

    /// Task configuration.
    pub fn spec(&self) -> &TaskSpec {
        &self.spec
    }

    /// Enabled element tasks, in configuration order.
    pub fn elem_tasks(&self) -> &[ElementTask] {
        &self.elem_tasks
    }

    /// Whether an element task is enabled.
    pub fn has_elem_task(&self, elem_task: ElementTask) -> bool {
        self.elem_tasks.contains(&elem_task)
    }

    /// Pick one enabled element task uniformly.
    pub fn pick_elem_task<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<ElementTask> {
        self.elem_tasks.choose(rng).copied()
    }

    /// Empty every bucket of the enabled element tasks.
    pub fn reset_buckets(&mut self) {
        self.qa_data = self.elem_tasks.iter().map(|t| (*t, Vec::new())).collect();
    }

    /// Whether a bucket is still below the item cap.
    pub fn has_room(&self, elem_task: ElementTask) -> bool {
        self.bucket_len(elem_task) < self.spec.item_limit()
    }

    /// Add an item for `img_path`.
    ///
    /// A missing image is logged and skipped. Pairs containing a raw image tag
    /// are dropped, and nothing is added when no pair survives.
    ///
    /// # Errors
    ///
    /// [`Error::Construction`] when the question and answer lists differ in length.
    pub fn add_item(
        &mut self,
        elem_task: ElementTask,
        img_path: &Path,
        sys_prompt: &str,
        questions: Vec<String>,
        answers: Vec<String>,
    ) -> Result<()> {
        if !img_path.exists() {
            log::warn!("Image {} not found in task {}, skipping", img_path.display(), elem_task);
            return Ok(());
        }
        let id = ItemId::new(self.task.as_str(), elem_task.as_str());
        if let Some(item) = ConversationItem::from_qa_pairs(id, img_path.to_path_buf(), sys_prompt, questions, answers)? {
            self.qa_data.entry(elem_task).or_default().push(item);
        }
        Ok(())
    }

    /// Items of one element task.
    pub fn items(&self, elem_task: ElementTask) -> &[ConversationItem] {
        self.qa_data.get(&elem_task).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of items of one element task.
    pub fn bucket_len(&self, elem_task: ElementTask) -> usize {
        self.items(elem_task).len()
    }

    /// `(images, QA pairs)` of one element task.
    pub fn count(&self, elem_task: ElementTask) -> (usize, usize) {
        let items = self.items(elem_task);
        (items.len(), items.iter().map(ConversationItem::num_qas).sum())
    }

    /// `(images, QA pairs)` over all element tasks.
    pub fn total_count(&self) -> (usize, usize) {
        self.qa_data.values().fold((0, 0), |(images, qas), items| {
            (images + items.len(), qas + items.iter().map(ConversationItem::num_qas).sum::<usize>())
        })
    }

    /// Human-readable per-element-task counts.
    pub fn summary(&self) -> String {
        let (images, qas) = self.total_count();
        let mut message = format!("{} images ({} QAs), where", images, qas);
        for elem_task in &self.elem_tasks {
            let (images, qas) = self.count(*elem_task);
            message.push_str(&format!("\n\t{}: {} ({})", elem_task, images, qas));
        }
        message
    }

    /// Hand over the buckets.
    pub fn into_buckets(self) -> IndexMap<ElementTask, Vec<ConversationItem>> {
        self.qa_data
    }
}

/// Common operations of every generator family.
pub trait QaGenerator {
    /// Shared configuration and output.
    fn base(&self) -> &TaskBase;

    /// Take the shared state out of the generator.
    fn into_base(self: Box<Self>) -> TaskBase;

    /// Load (and for webpage families, filter) the source records.
    fn read_annotations(&mut self, cache: &mut AnnotationCache, rng: &mut dyn RngCore) -> Result<()>;

    /// One-line description of what was read.
    fn read_summary(&self) -> String;

    /// Turn the loaded records into conversation items.
    fn create_qa_items(&mut self, rng: &mut dyn RngCore) -> Result<()>;
}

/// Closed set of generator families.
pub enum Generator {
    /// Grounding / OCR over webpages
    Basic(BasicTask),
    /// Accessibility labels and alt text
    Accessibility(AccessibilityTask),
    /// Page-level captions
    Captioning(CaptioningTask),
    /// Pasted-icon grounding and referring
    IconMixed(IconMixedTask),
    /// Set-of-marks
    Som(SomTask),
    /// Icon descriptions
    IconDesc(IconDescTask),
    /// Mobile UI widget tasks
    Widget(WidgetTask),
    /// Intention / function / detail
    Advanced(AdvancedTask),
    /// Caption + VQA bulk corpus
    Monkey(MonkeyTask),
    /// Visual instruction bulk corpus
    Llava(LlavaTask),
}

impl Generator {
    /// Build the generator for a dataset task.
    pub fn from_spec(task: &str, spec: TaskSpec) -> Result<Self> {
        let base = TaskBase::new(task, spec)?;
        let generator = match base.family() {
            TaskFamily::Basic => Generator::Basic(BasicTask::new(base)),
            TaskFamily::Accessibility => Generator::Accessibility(AccessibilityTask::new(base)),
            TaskFamily::Captioning => Generator::Captioning(CaptioningTask::new(base)),
            TaskFamily::IconMixed => Generator::IconMixed(IconMixedTask::new(base)),
            TaskFamily::Som => Generator::Som(SomTask::new(base)),
            TaskFamily::IconDesc => Generator::IconDesc(IconDescTask::new(base)),
            TaskFamily::RicoTasks => Generator::Widget(WidgetTask::new(base)),
            TaskFamily::AdvancedTasks => Generator::Advanced(AdvancedTask::new(base)),
            TaskFamily::MonkeyTraining => Generator::Monkey(MonkeyTask::new(base)),
            TaskFamily::LlavaInstruct => Generator::Llava(LlavaTask::new(base)),
        };
        Ok(generator)
    }

    fn inner(&self) -> &dyn QaGenerator {
        match self {
            Generator::Basic(g) => g,
            Generator::Accessibility(g) => g,
            Generator::Captioning(g) => g,
            Generator::IconMixed(g) => g,
            Generator::Som(g) => g,
            Generator::IconDesc(g) => g,
            Generator::Widget(g) => g,
            Generator::Advanced(g) => g,
            Generator::Monkey(g) => g,
            Generator::Llava(g) => g,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn QaGenerator {
        match self {
            Generator::Basic(g) => g,
            Generator::Accessibility(g) => g,
            Generator::Captioning(g) => g,
            Generator::IconMixed(g) => g,
            Generator::Som(g) => g,
            Generator::IconDesc(g) => g,
            Generator::Widget(g) => g,
            Generator::Advanced(g) => g,
            Generator::Monkey(g) => g,
            Generator::Llava(g) => g,
        }
    }

    /// Shared configuration and output.
    pub fn base(&self) -> &TaskBase {
        self.inner().base()
    }

    /// See [`QaGenerator::read_annotations`].
    pub fn read_annotations(&mut self, cache: &mut AnnotationCache, rng: &mut dyn RngCore) -> Result<()> {
        self.inner_mut().read_annotations(cache, rng)
    }

    /// See [`QaGenerator::read_summary`].
    pub fn read_summary(&self) -> String {
        self.inner().read_summary()
    }

    /// See [`QaGenerator::create_qa_items`].
    pub fn create_qa_items(&mut self, rng: &mut dyn RngCore) -> Result<()> {
        self.inner_mut().create_qa_items(rng)
    }

    /// Take the shared state, with its buckets, out of the generator.
    pub fn into_base(self) -> TaskBase {
        match self {
            Generator::Basic(g) => Box::new(g).into_base(),
            Generator::Accessibility(g) => Box::new(g).into_base(),
            Generator::Captioning(g) => Box::new(g).into_base(),
            Generator::IconMixed(g) => Box::new(g).into_base(),
            Generator::Som(g) => Box::new(g).into_base(),
            Generator::IconDesc(g) => Box::new(g).into_base(),
            Generator::Widget(g) => Box::new(g).into_base(),
            Generator::Advanced(g) => Box::new(g).into_base(),
            Generator::Monkey(g) => Box::new(g).into_base(),
            Generator::Llava(g) => Box::new(g).into_base(),
        }
    }
}

/// Pick one template; empty tables yield an empty prompt.
pub(crate) fn pick<R: Rng + ?Sized>(table: &[&'static str], rng: &mut R) -> &'static str {
    table.choose(rng).copied().unwrap_or_default()
}

/// Parse a JSON array of records from `path`.
pub(crate) fn read_json_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| Error::InvalidRecord {
        source_name: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// `*.json` files directly inside `dir`, in name order.
pub(crate) fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}
