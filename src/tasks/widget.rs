//! Mobile UI widget tasks (Rico-style screens).
//!
//! Each element task reads every `*.json` file of its own directory under
//! `data_dir`; `widget-grounding` shares the `widget-caption` directory.
//! Boxes in these files are already normalized to the unit square.

use super::encoding::{add_encoding_suffix, format_box, CoordFormat};
use super::prompts::{self, fill_slot};
use super::{json_files, pick, read_json_records, ElementTask, QaGenerator, TaskBase};
use crate::annotation::AnnotationCache;
use crate::error::{Error, Result};
use crate::geometry::BBox;
use indexmap::IndexMap;
use rand::seq::SliceRandom;
use rand::RngCore;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Screenshot directory used when the task spec names none.
pub const DEFAULT_IMG_DIR: &str = "datasets/Rico/combined";

/// One widget or screen annotation.
#[derive(Debug, Clone, Deserialize)]
pub struct WidgetRecord {
    /// Screenshot file name
    pub img_filename: String,
    /// Command or caption of the widget
    #[serde(default)]
    pub instruction: Option<String>,
    /// Normalized widget box
    #[serde(default)]
    pub bbox: Option<[f64; 4]>,
    /// Candidate screen summaries
    #[serde(default)]
    pub captions: Option<Vec<String>>,
}

impl WidgetRecord {
    fn widget(&self) -> Option<(&str, BBox)> {
        let instruction = self.instruction.as_deref()?;
        let [x1, y1, x2, y2] = self.bbox?;
        Some((instruction, BBox::new(x1, y1, x2, y2)))
    }
}

/// Directory holding the annotations of an element task.
pub fn task_dir(data_dir: &Path, elem_task: ElementTask) -> PathBuf {
    match elem_task {
        ElementTask::WidgetGrounding => data_dir.join(ElementTask::WidgetCaption.as_str()),
        _ => data_dir.join(elem_task.as_str()),
    }
}

/// `rico_tasks`.
pub struct WidgetTask {
    base: TaskBase,
    img_dir: PathBuf,
    records: IndexMap<ElementTask, Vec<WidgetRecord>>,
}

impl WidgetTask {
    /// Create the generator.
    pub fn new(base: TaskBase) -> Self {
        let img_dir = base.spec().img_dir.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_IMG_DIR));
        Self {
            base,
            img_dir,
            records: IndexMap::new(),
        }
    }

    /// Question and answer for one record, `None` when it lacks the needed fields.
    fn qa_pair(
        elem_task: ElementTask,
        record: &WidgetRecord,
        format: CoordFormat,
        rng: &mut dyn RngCore,
    ) -> Option<(String, String)> {
        match elem_task {
            ElementTask::Screen2Words => {
                let caption = record.captions.as_ref()?.choose(rng)?.clone();
                Some((pick(prompts::SCREEN2WORDS, rng).to_string(), caption))
            },
            ElementTask::WidgetCaption => {
                let (instruction, bbox) = record.widget()?;
                let encoded = format_box(format, &bbox, true, rng);
                let question = fill_slot(pick(prompts::WIDGET_CAPTION, rng), "bbox", &encoded);
                Some((question, instruction.to_string()))
            },
            // ricosca shares the grounding templates
            _ => {
                let (instruction, bbox) = record.widget()?;
                let template = fill_slot(pick(prompts::WIDGET_GROUNDING, rng), "instruction", instruction);
                Some((add_encoding_suffix(&template, format), format_box(format, &bbox, false, rng)))
            },
        }
    }
}

impl QaGenerator for WidgetTask {
    fn base(&self) -> &TaskBase {
        &self.base
    }

    fn into_base(self: Box<Self>) -> TaskBase {
        self.base
    }

    fn read_annotations(&mut self, _cache: &mut AnnotationCache, rng: &mut dyn RngCore) -> Result<()> {
        let data_dir = self
            .base
            .spec()
            .data_dir
            .first()
            .ok_or_else(|| Error::Config(format!("task {} has no data_dir", self.base.task())))?
            .to_path_buf();

        for &elem_task in self.base.elem_tasks() {
            let dir = task_dir(&data_dir, elem_task);
            if !dir.is_dir() {
                return Err(Error::Config(format!("missing annotation directory {}", dir.display())));
            }
            let mut records = Vec::new();
            for file in json_files(&dir)? {
                records.extend(read_json_records::<WidgetRecord>(&file)?);
            }
            records.shuffle(rng);
            self.records.insert(elem_task, records);
        }
        Ok(())
    }

    fn read_summary(&self) -> String {
        let mut message = String::new();
        for (elem_task, records) in &self.records {
            message.push_str(&format!("\n\t{}: Successfully read {} records.", elem_task, records.len()));
        }
        message
    }

    fn create_qa_items(&mut self, rng: &mut dyn RngCore) -> Result<()> {
        self.base.reset_buckets();
        for (&elem_task, records) in &self.records {
            let mut skipped = 0usize;
            for record in records {
                if !self.base.has_room(elem_task) {
                    break;
                }
                let format = CoordFormat::choose(rng);
                let Some((question, answer)) = Self::qa_pair(elem_task, record, format, rng) else {
                    skipped += 1;
                    continue;
                };
                let img_path = self.img_dir.join(&record.img_filename);
                self.base.add_item(elem_task, &img_path, "", vec![question], vec![answer])?;
            }
            if skipped > 0 {
                log::debug!("{}: skipped {} records without the needed fields", elem_task, skipped);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(json: &str) -> WidgetRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_widget_grounding_reads_caption_dir() {
        let root = Path::new("rico");
        assert_eq!(task_dir(root, ElementTask::WidgetGrounding), root.join("widget-caption"));
        assert_eq!(task_dir(root, ElementTask::Screen2Words), root.join("screen2words"));
    }

    #[test]
    fn test_grounding_pair() {
        let mut rng = StdRng::seed_from_u64(5);
        let r = record(r#"{"img_filename": "1.jpg", "instruction": "open settings", "bbox": [0.1, 0.2, 0.3, 0.4]}"#);
        let (q, a) = WidgetTask::qa_pair(ElementTask::Ricosca, &r, CoordFormat::Bbox, &mut rng).unwrap();
        assert!(q.contains("open settings"));
        assert!(q.contains("(with bbox (x1, x2, y1, y2))"));
        assert_eq!(a, "(0.1, 0.2, 0.3, 0.4)");
    }

    #[test]
    fn test_caption_pair_puts_box_in_question() {
        let mut rng = StdRng::seed_from_u64(5);
        let r = record(r#"{"img_filename": "1.jpg", "instruction": "go back", "bbox": [0.1, 0.2, 0.3, 0.4]}"#);
        let (q, a) = WidgetTask::qa_pair(ElementTask::WidgetCaption, &r, CoordFormat::Point, &mut rng).unwrap();
        assert!(!q.contains("{bbox}"));
        assert!(q.contains('('));
        assert_eq!(a, "go back");
    }

    #[test]
    fn test_screen2words_needs_captions() {
        let mut rng = StdRng::seed_from_u64(5);
        let r = record(r#"{"img_filename": "1.jpg", "captions": ["a login screen"]}"#);
        let (_, a) = WidgetTask::qa_pair(ElementTask::Screen2Words, &r, CoordFormat::Point, &mut rng).unwrap();
        assert_eq!(a, "a login screen");
        let bare = record(r#"{"img_filename": "1.jpg"}"#);
        assert!(WidgetTask::qa_pair(ElementTask::Screen2Words, &bare, CoordFormat::Point, &mut rng).is_none());
        assert!(WidgetTask::qa_pair(ElementTask::WidgetCaption, &bare, CoordFormat::Point, &mut rng).is_none());
    }
}
