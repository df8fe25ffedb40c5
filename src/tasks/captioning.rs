//! Page-level captions: title, description and keywords.

use super::{pick, prompts, ElementTask, QaGenerator, TaskBase};
use crate::annotation::{AnnotationCache, PageAnnotation};
use crate::error::Result;
use rand::RngCore;
use std::sync::Arc;

/// `captioning`: one caption field per page.
pub struct CaptioningTask {
    base: TaskBase,
    pages: Vec<Arc<Vec<PageAnnotation>>>,
}

impl CaptioningTask {
    /// Create the generator.
    pub fn new(base: TaskBase) -> Self {
        Self { base, pages: Vec::new() }
    }
}

fn prompt_table(elem_task: ElementTask) -> &'static [&'static str] {
    match elem_task {
        ElementTask::Description => prompts::CAPTION_DESCRIPTION,
        ElementTask::Keywords => prompts::CAPTION_KEYWORDS,
        _ => prompts::CAPTION_TITLE,
    }
}

impl QaGenerator for CaptioningTask {
    fn base(&self) -> &TaskBase {
        &self.base
    }

    fn into_base(self: Box<Self>) -> TaskBase {
        self.base
    }

    fn read_annotations(&mut self, cache: &mut AnnotationCache, _rng: &mut dyn RngCore) -> Result<()> {
        for dir in self.base.spec().data_dir.paths() {
            self.pages.push(cache.get_or_read(dir, None)?);
        }
        Ok(())
    }

    fn read_summary(&self) -> String {
        let num_pages: usize = self.pages.iter().map(|p| p.len()).sum();
        format!("Successfully read {} pages.", num_pages)
    }

    fn create_qa_items(&mut self, rng: &mut dyn RngCore) -> Result<()> {
        self.base.reset_buckets();
        for page in self.pages.iter().flat_map(|p| p.iter()) {
            let Some(elem_task) = self.base.pick_elem_task(rng) else {
                return Ok(());
            };
            let caption = page.caption_field(elem_task.as_str()).unwrap_or_default();
            if caption.is_empty() || !self.base.has_room(elem_task) {
                continue;
            }
            let question = pick(prompt_table(elem_task), rng).to_string();
            self.base
                .add_item(elem_task, &page.image_path, "", vec![question], vec![caption.to_string()])?;
        }
        Ok(())
    }
}
