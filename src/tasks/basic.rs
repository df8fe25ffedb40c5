//! Grounding and OCR over filtered webpage annotations.

use super::encoding::{add_encoding_suffix, format_box, CoordFormat};
use super::{pick, prompts, ElementTask, QaGenerator, TaskBase};
use crate::annotation::{AnnotationCache, Element, PageAnnotation};
use crate::error::Result;
use crate::geometry::{is_valid_box, normalize_box};
use crate::text::truncate_text;
use rand::seq::SliceRandom;
use rand::RngCore;
use std::sync::Arc;

/// Word limit of element text in questions and answers.
pub const MAX_TEXT_WORDS: usize = 30;
/// Character limit of element text in questions and answers.
pub const MAX_TEXT_LEN: usize = 300;

/// `basic` / `basic_cropped`: one element task per page, many elements.
pub struct BasicTask {
    base: TaskBase,
    pages: Vec<Arc<Vec<PageAnnotation>>>,
}

impl BasicTask {
    /// Create the generator.
    pub fn new(base: TaskBase) -> Self {
        Self { base, pages: Vec::new() }
    }

    fn num_pages(&self) -> usize {
        self.pages.iter().map(|p| p.len()).sum()
    }
}

/// Elements usable for grounding/OCR: text, a valid box, not an image.
pub fn text_elements(page: &PageAnnotation) -> Vec<&Element> {
    page.elements
        .iter()
        .filter(|e| !e.text.is_empty() && is_valid_box(&e.bbox, page.viewport) && !e.is_image_like())
        .collect()
}

impl QaGenerator for BasicTask {
    fn base(&self) -> &TaskBase {
        &self.base
    }

    fn into_base(self: Box<Self>) -> TaskBase {
        self.base
    }

    fn read_annotations(&mut self, cache: &mut AnnotationCache, _rng: &mut dyn RngCore) -> Result<()> {
        // The item cap limits pages read, not items created.
        let max_pages = self.base.spec().max_items;
        for dir in self.base.spec().data_dir.paths() {
            self.pages.push(cache.get_or_read(dir, max_pages)?);
        }
        Ok(())
    }

    fn read_summary(&self) -> String {
        let num_elements: usize = self.pages.iter().flat_map(|p| p.iter()).map(|p| p.elements.len()).sum();
        format!("Successfully read {} valid elements in {} pages.", num_elements, self.num_pages())
    }

    fn create_qa_items(&mut self, rng: &mut dyn RngCore) -> Result<()> {
        self.base.reset_buckets();
        let num_per_page = self.base.spec().num_per_page;

        for page in self.pages.iter().flat_map(|p| p.iter()) {
            let candidates = text_elements(page);
            let Some(elem_task) = self.base.pick_elem_task(rng) else {
                return Ok(());
            };
            let format = CoordFormat::choose(rng);
            let table = match elem_task {
                ElementTask::Ocr => prompts::OCR,
                _ => prompts::GROUNDING,
            };
            let sys_prompt = add_encoding_suffix(pick(table, rng), format);

            let mut questions = Vec::new();
            let mut answers = Vec::new();
            let amount = candidates.len().min(num_per_page);
            for element in candidates.choose_multiple(rng, amount) {
                let text = truncate_text(&element.text, MAX_TEXT_WORDS, MAX_TEXT_LEN);
                let bbox = normalize_box(&element.bbox, page.viewport);
                match elem_task {
                    ElementTask::Ocr => {
                        questions.push(format_box(format, &bbox, true, rng));
                        answers.push(text);
                    },
                    _ => {
                        questions.push(text);
                        answers.push(format_box(format, &bbox, false, rng));
                    },
                }
            }
            self.base.add_item(elem_task, &page.image_path, &sys_prompt, questions, answers)?;
        }
        Ok(())
    }
}
