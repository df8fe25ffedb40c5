//! Accessibility labels and image alt text.

use super::encoding::{add_encoding_suffix, format_box, CoordFormat};
use super::{pick, prompts, ElementTask, QaGenerator, TaskBase};
use crate::annotation::{AnnotationCache, Element, PageAnnotation};
use crate::error::Result;
use crate::geometry::normalize_box;
use rand::seq::SliceRandom;
use rand::RngCore;
use std::sync::Arc;

/// `accessibility`: box → aria label / title, or image box → alt text.
pub struct AccessibilityTask {
    base: TaskBase,
    pages: Vec<Arc<Vec<PageAnnotation>>>,
}

impl AccessibilityTask {
    /// Create the generator.
    pub fn new(base: TaskBase) -> Self {
        Self { base, pages: Vec::new() }
    }
}

/// Answer for an element, or `None` when the element does not fit the task.
///
/// `general_acb` needs a non-empty accessibility text that differs from the
/// visible text; `image_alt` needs an image-like element with alt text.
pub fn accessibility_answer(elem_task: ElementTask, element: &Element) -> Option<String> {
    match elem_task {
        ElementTask::GeneralAcb => {
            let label = element.accessibility_text();
            (!label.is_empty() && label != element.text).then(|| label.to_string())
        },
        ElementTask::ImageAlt => {
            (element.is_image_like() && !element.text.is_empty()).then(|| element.text.clone())
        },
        _ => None,
    }
}

impl QaGenerator for AccessibilityTask {
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
        let num_per_page = self.base.spec().num_per_page;

        for page in self.pages.iter().flat_map(|p| p.iter()) {
            let mut elements: Vec<&Element> = page.elements.iter().collect();
            elements.shuffle(rng);

            let Some(elem_task) = self.base.pick_elem_task(rng) else {
                return Ok(());
            };
            let format = CoordFormat::choose(rng);
            let table = match elem_task {
                ElementTask::ImageAlt => prompts::IMAGE_ALT,
                _ => prompts::GENERAL_ACB,
            };
            let sys_prompt = add_encoding_suffix(pick(table, rng), format);

            let mut questions = Vec::new();
            let mut answers = Vec::new();
            for element in elements {
                if questions.len() == num_per_page {
                    break;
                }
                let Some(answer) = accessibility_answer(elem_task, element) else {
                    continue;
                };
                let bbox = normalize_box(&element.bbox, page.viewport);
                questions.push(format_box(format, &bbox, true, rng));
                answers.push(answer);
            }
            if self.base.has_room(elem_task) {
                self.base.add_item(elem_task, &page.image_path, &sys_prompt, questions, answers)?;
            }
        }
        Ok(())
    }
}
