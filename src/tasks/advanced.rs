//! Intention, function and detail tasks built from generated artifacts.
//!
//! Artifacts live at `<data_dir>/<task>/<page>.json` (intention) or
//! `<data_dir>/<task>/<page>.txt` (function, detail); the screenshot is
//! `<data_dir>/raw/<page>.png`. See [`crate::generation`] for how they are
//! produced.

use super::{pick, prompts, ElementTask, QaGenerator, TaskBase};
use crate::annotation::AnnotationCache;
use crate::error::Result;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

lazy_static! {
    /// A coordinate quadruple, optionally wrapped as `{idx: ...}`, in brackets or parentheses.
    static ref RE_INTENTION_BOX: Regex =
        Regex::new(r"(\{\d+: )?[\[\(](\d\.\d+, \d\.\d+, \d\.\d+, \d\.\d+)[\]\)]\}?").unwrap();
}

/// One generated intention exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentionTurn {
    /// User utterance
    #[serde(rename = "User")]
    pub user: String,
    /// Assistant reply, expected to reference an element box
    #[serde(rename = "System")]
    pub system: String,
}

/// Content of one artifact file.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    /// Intention QA turns
    Intention(Vec<IntentionTurn>),
    /// Free text for function/detail
    Text(String),
}

/// Rewrite every box reference in an intention answer to `(a, b, c, d)`.
///
/// Returns `None` when the answer references no box.
///
/// # Examples
///
/// ```
/// use ui_corpus::tasks::advanced::normalize_intention_answer;
///
/// assert_eq!(
///     normalize_intention_answer("Click {3: [0.1, 0.2, 0.3, 0.4]} now").as_deref(),
///     Some("Click (0.1, 0.2, 0.3, 0.4) now")
/// );
/// assert_eq!(normalize_intention_answer("No box here"), None);
/// ```
pub fn normalize_intention_answer(answer: &str) -> Option<String> {
    if !RE_INTENTION_BOX.is_match(answer) {
        return None;
    }
    Some(RE_INTENTION_BOX.replace_all(answer, "(${2})").into_owned())
}

/// File extension of an element task's artifacts.
pub fn artifact_extension(elem_task: ElementTask) -> &'static str {
    match elem_task {
        ElementTask::Intention => "json",
        _ => "txt",
    }
}

/// `advanced_tasks`.
pub struct AdvancedTask {
    base: TaskBase,
    artifacts: Vec<(ElementTask, PathBuf, String, Artifact)>,
}

impl AdvancedTask {
    /// Create the generator.
    pub fn new(base: TaskBase) -> Self {
        Self {
            base,
            artifacts: Vec::new(),
        }
    }

    fn read_task_dir(&mut self, data_dir: &Path, elem_task: ElementTask) -> Result<()> {
        let dir = data_dir.join(elem_task.as_str());
        if !dir.is_dir() {
            return Ok(());
        }
        let ext = artifact_extension(elem_task);
        let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|e| e == ext))
            .collect();
        files.sort();

        for file in files {
            let Some(page) = file.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            let text = fs::read_to_string(&file)?;
            let artifact = if elem_task == ElementTask::Intention {
                match serde_json::from_str(&text) {
                    Ok(turns) => Artifact::Intention(turns),
                    Err(e) => {
                        log::warn!("Skipping unparsable intention file {}: {}", file.display(), e);
                        continue;
                    },
                }
            } else {
                Artifact::Text(text)
            };
            self.artifacts.push((elem_task, data_dir.to_path_buf(), page, artifact));
        }
        Ok(())
    }
}

impl QaGenerator for AdvancedTask {
    fn base(&self) -> &TaskBase {
        &self.base
    }

    fn into_base(self: Box<Self>) -> TaskBase {
        self.base
    }

    fn read_annotations(&mut self, _cache: &mut AnnotationCache, _rng: &mut dyn rand::RngCore) -> Result<()> {
        let elem_tasks = self.base.elem_tasks().to_vec();
        let dirs: Vec<PathBuf> = self.base.spec().data_dir.paths().iter().map(|p| p.to_path_buf()).collect();
        for elem_task in elem_tasks {
            for dir in &dirs {
                self.read_task_dir(dir, elem_task)?;
            }
        }
        Ok(())
    }

    fn read_summary(&self) -> String {
        let mut message = String::from("Successfully read: ");
        for elem_task in self.base.elem_tasks() {
            let count = self.artifacts.iter().filter(|(t, ..)| t == elem_task).count();
            message.push_str(&format!("\n\t{}: {}", elem_task, count));
        }
        message
    }

    fn create_qa_items(&mut self, rng: &mut dyn rand::RngCore) -> Result<()> {
        self.base.reset_buckets();
        let limit = self.base.spec().item_limit();
        let repeated_time = self.base.spec().repeated_time;
        let elem_tasks = self.base.elem_tasks().to_vec();

        for elem_task in elem_tasks {
            let entries = self.artifacts.iter().filter(|(t, ..)| *t == elem_task).take(limit);
            for (_, dir, page, artifact) in entries {
                let img_path = dir.join("raw").join(format!("{}.png", page));
                for _ in 0..repeated_time {
                    let (questions, answers) = match artifact {
                        Artifact::Intention(turns) => turns
                            .iter()
                            .filter_map(|turn| {
                                normalize_intention_answer(&turn.system).map(|answer| (turn.user.clone(), answer))
                            })
                            .unzip(),
                        Artifact::Text(text) => {
                            let table = match elem_task {
                                ElementTask::Detail => prompts::DETAIL,
                                _ => prompts::FUNCTION,
                            };
                            (vec![pick(table, rng).to_string()], vec![text.clone()])
                        },
                    };
                    self.base.add_item(elem_task, &img_path, "", questions, answers)?;
                }
            }
        }
        Ok(())
    }
}
