//! Set-of-marks: screenshots with one element framed by a drawn box.

use super::encoding::{add_encoding_suffix, format_box, CoordFormat};
use super::{pick, prompts, read_json_records, ElementTask, QaGenerator, TaskBase};
use crate::annotation::{AnnotationCache, TYPE_ICON, TYPE_IMAGE};
use crate::error::Result;
use crate::geometry::{is_valid_box, normalize_box, BBox, Size};
use indexmap::IndexMap;
use rand::seq::SliceRandom;
use rand::RngCore;
use serde::Deserialize;
use std::path::PathBuf;

/// One marked screenshot.
#[derive(Debug, Clone, Deserialize)]
pub struct SomRecord {
    /// Image file name
    pub image: String,
    /// `[width, height]`
    pub size: [u32; 2],
    /// Pixel box of the marked element
    pub bbox: [f64; 4],
    /// Text of the marked element
    pub text: String,
    /// Type tags, absent for icon records
    #[serde(default)]
    pub types: Option<Vec<String>>,
}

/// Index file and image directory of a set-of-marks element task.
pub fn som_layout(elem_task: ElementTask) -> (&'static str, &'static str) {
    match elem_task {
        ElementTask::SomIcon => ("record_icon_mixed.json", "images_icon_mixed"),
        _ => ("record_general.json", "images_general"),
    }
}

/// `som` / `som_cropped`.
pub struct SomTask {
    base: TaskBase,
    records: IndexMap<ElementTask, Vec<(PathBuf, SomRecord)>>,
}

impl SomTask {
    /// Create the generator.
    pub fn new(base: TaskBase) -> Self {
        Self {
            base,
            records: IndexMap::new(),
        }
    }
}

impl QaGenerator for SomTask {
    fn base(&self) -> &TaskBase {
        &self.base
    }

    fn into_base(self: Box<Self>) -> TaskBase {
        self.base
    }

    fn read_annotations(&mut self, _cache: &mut AnnotationCache, rng: &mut dyn RngCore) -> Result<()> {
        for &elem_task in self.base.elem_tasks() {
            let (index_file, _) = som_layout(elem_task);
            let mut entries = Vec::new();
            for dir in self.base.spec().data_dir.paths() {
                let records: Vec<SomRecord> = read_json_records(&dir.join(index_file))?;
                entries.extend(records.into_iter().map(|r| (dir.to_path_buf(), r)));
            }
            entries.shuffle(rng);
            self.records.insert(elem_task, entries);
        }
        Ok(())
    }

    fn read_summary(&self) -> String {
        let parts: Vec<String> = self
            .records
            .iter()
            .map(|(task, records)| format!("{} {}", records.len(), task))
            .collect();
        format!("Successfully read {} images.", parts.join(" and "))
    }

    fn create_qa_items(&mut self, rng: &mut dyn RngCore) -> Result<()> {
        self.base.reset_buckets();
        let limit = self.base.spec().item_limit();

        for (&elem_task, records) in &self.records {
            let (_, img_dir) = som_layout(elem_task);
            for (dir, record) in records.iter().take(limit) {
                let size = Size::new(record.size[0], record.size[1]);
                let [x1, y1, x2, y2] = record.bbox;
                let bbox = BBox::new(x1, y1, x2, y2);
                if !is_valid_box(&bbox, size) {
                    continue;
                }
                if elem_task == ElementTask::SomGeneral {
                    let is_image = record
                        .types
                        .as_ref()
                        .is_some_and(|types| types.iter().any(|t| t == TYPE_IMAGE || t == TYPE_ICON));
                    if record.text.is_empty() || is_image {
                        continue;
                    }
                }

                let format = CoordFormat::choose(rng);
                let encoded = format_box(format, &normalize_box(&bbox, size), false, rng);
                let question = add_encoding_suffix(pick(prompts::SOM, rng), format);
                let answer = format!("{} {}", record.text, encoded);
                let img_path = dir.join(img_dir).join(&record.image);
                self.base.add_item(elem_task, &img_path, "", vec![question], vec![answer])?;
            }
        }
        Ok(())
    }
}
