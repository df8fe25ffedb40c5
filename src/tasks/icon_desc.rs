//! Icon descriptions from `<data_dir>/icon_desc.json`, images in `pngs_bg/`.

use super::{pick, prompts, read_json_records, ElementTask, QaGenerator, TaskBase};
use crate::annotation::AnnotationCache;
use crate::error::Result;
use rand::RngCore;
use serde::Deserialize;
use std::path::PathBuf;

/// One icon image with its description.
#[derive(Debug, Clone, Deserialize)]
pub struct IconDescRecord {
    /// Image file name
    pub image: String,
    /// Description text
    pub desc: String,
}

/// `icon_desc`.
pub struct IconDescTask {
    base: TaskBase,
    parts: Vec<(PathBuf, Vec<IconDescRecord>)>,
}

impl IconDescTask {
    /// Create the generator.
    pub fn new(base: TaskBase) -> Self {
        Self { base, parts: Vec::new() }
    }
}

impl QaGenerator for IconDescTask {
    fn base(&self) -> &TaskBase {
        &self.base
    }

    fn into_base(self: Box<Self>) -> TaskBase {
        self.base
    }

    fn read_annotations(&mut self, _cache: &mut AnnotationCache, _rng: &mut dyn RngCore) -> Result<()> {
        for dir in self.base.spec().data_dir.paths() {
            let records = read_json_records(&dir.join("icon_desc.json"))?;
            self.parts.push((dir.to_path_buf(), records));
        }
        Ok(())
    }

    fn read_summary(&self) -> String {
        format!("Successfully read {} parts of icon annotations.", self.parts.len())
    }

    fn create_qa_items(&mut self, rng: &mut dyn RngCore) -> Result<()> {
        self.base.reset_buckets();
        let limit = self.base.spec().item_limit();
        for (dir, records) in &self.parts {
            for record in records.iter().take(limit) {
                let img_path = dir.join("pngs_bg").join(&record.image);
                let question = pick(prompts::ICON_DESCRIPTION, rng).to_string();
                self.base
                    .add_item(ElementTask::IconDesc, &img_path, "", vec![question], vec![record.desc.clone()])?;
            }
        }
        Ok(())
    }
}
