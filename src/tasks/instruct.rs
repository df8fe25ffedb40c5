//! Bulk instruction corpora passed through with light reformatting.
//!
//! - `monkey_training`: `train_monkey.json`, single-turn caption and VQA pairs
//! - `llava_instruct`: `llava_instruct_150k.json`, multi-turn human/gpt dialogues

use super::{pick, prompts, read_json_records, ElementTask, QaGenerator, TaskBase};
use crate::annotation::AnnotationCache;
use crate::conversation::{Role, Turn, IMAGE_PLACEHOLDER};
use crate::error::Result;
use rand::seq::SliceRandom;
use rand::RngCore;
use serde::Deserialize;
use std::path::PathBuf;

/// Default image root of the caption/VQA corpus.
pub const DEFAULT_MONKEY_IMG_DIR: &str = "datasets/MonkeyData/Monkey_Train_data";
/// Default image path prefix of the visual instruction corpus.
pub const DEFAULT_LLAVA_IMG_PREFIX: &str = "datasets/MonkeyData/Monkey_Train_data/COCO2014/train2014/COCO_train2014_";

const VQA_SUFFIX: &str = " Answer: ";
const CAPTION_SUFFIX: &str = "in English: ";
const IMG_CLOSE: &str = "</img> ";

/// A record of either bulk corpus.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkRecord {
    /// Image path relative to the corpus image root (caption/VQA corpus)
    #[serde(default)]
    pub id: Option<String>,
    /// Image name appended to the prefix (instruction corpus)
    #[serde(default)]
    pub image: Option<String>,
    /// Dialogue in `from`/`value` form
    pub conversations: Vec<Turn>,
}

/// Kind of a caption/VQA corpus question after cleanup.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkQuestion {
    /// VQA question with the image tag and answer cue removed
    Vqa(String),
    /// Caption request, to be replaced by a caption prompt
    Caption,
}

/// Classify and clean a caption/VQA corpus question.
///
/// VQA questions end with ` Answer: `; the cue and everything up to the
/// closing `</img> ` tag are removed. Caption requests end with `in English: `.
pub fn classify_bulk_question(question: &str) -> Option<BulkQuestion> {
    if let Some(stripped) = question.strip_suffix(VQA_SUFFIX) {
        let cleaned = match stripped.find(IMG_CLOSE) {
            Some(pos) => &stripped[pos + IMG_CLOSE.len()..],
            None => stripped,
        };
        Some(BulkQuestion::Vqa(cleaned.to_string()))
    } else if question.ends_with(CAPTION_SUFFIX) {
        Some(BulkQuestion::Caption)
    } else {
        None
    }
}

/// Remove the `<image>\n` prefix or `\n<image>` suffix of a first instruction question.
pub fn strip_image_marker(question: &str) -> Option<&str> {
    let prefix = format!("{}\n", IMAGE_PLACEHOLDER);
    let suffix = format!("\n{}", IMAGE_PLACEHOLDER);
    question
        .strip_prefix(prefix.as_str())
        .or_else(|| question.strip_suffix(suffix.as_str()))
}

fn read_bulk(base: &TaskBase, file_name: &str, rng: &mut dyn RngCore) -> Result<Vec<BulkRecord>> {
    let mut records = Vec::new();
    for dir in base.spec().data_dir.paths() {
        records.extend(read_json_records::<BulkRecord>(&dir.join(file_name))?);
    }
    records.shuffle(rng);
    Ok(records)
}

/// `monkey_training`: caption and VQA pairs at a fixed ratio.
pub struct MonkeyTask {
    base: TaskBase,
    img_dir: PathBuf,
    records: Vec<BulkRecord>,
}

impl MonkeyTask {
    /// Create the generator.
    pub fn new(base: TaskBase) -> Self {
        let img_dir = base
            .spec()
            .img_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MONKEY_IMG_DIR));
        Self {
            base,
            img_dir,
            records: Vec::new(),
        }
    }

    /// `(caption, vqa)` caps derived from the item cap and the description ratio.
    pub fn quotas(&self) -> (usize, usize) {
        let max_items = self.base.spec().item_limit();
        let total_desc = (max_items as f64 * self.base.spec().desc_ratio).floor() as usize;
        (total_desc, max_items - total_desc.min(max_items))
    }
}

impl QaGenerator for MonkeyTask {
    fn base(&self) -> &TaskBase {
        &self.base
    }

    fn into_base(self: Box<Self>) -> TaskBase {
        self.base
    }

    fn read_annotations(&mut self, _cache: &mut AnnotationCache, rng: &mut dyn RngCore) -> Result<()> {
        self.records = read_bulk(&self.base, "train_monkey.json", rng)?;
        Ok(())
    }

    fn read_summary(&self) -> String {
        format!("Successfully read {} qa_pairs.", self.records.len())
    }

    fn create_qa_items(&mut self, rng: &mut dyn RngCore) -> Result<()> {
        self.base.reset_buckets();
        let max_items = self.base.spec().item_limit();
        let (total_desc, total_vqa) = self.quotas();
        let (mut num_desc, mut num_vqa) = (0usize, 0usize);

        for record in &self.records {
            if num_desc + num_vqa == max_items {
                break;
            }
            let (Some(id), [question, answer]) = (record.id.as_deref(), record.conversations.as_slice()) else {
                log::warn!("Skipping caption/VQA record without id or with more than one exchange");
                continue;
            };
            let question = match classify_bulk_question(&question.content) {
                Some(BulkQuestion::Vqa(q)) => {
                    if num_vqa == total_vqa {
                        continue;
                    }
                    num_vqa += 1;
                    q
                },
                Some(BulkQuestion::Caption) => {
                    if num_desc == total_desc {
                        continue;
                    }
                    num_desc += 1;
                    pick(prompts::MONKEY_CAPTION, rng).to_string()
                },
                None => {
                    log::warn!("Skipping {}: unrecognized question format {:?}", id, question.content);
                    continue;
                },
            };
            let img_path = self.img_dir.join(id);
            self.base
                .add_item(ElementTask::MonkeyTraining, &img_path, "", vec![question], vec![answer.content.clone()])?;
        }
        Ok(())
    }
}

/// `llava_instruct`: multi-turn visual instruction dialogues.
pub struct LlavaTask {
    base: TaskBase,
    img_prefix: String,
    records: Vec<BulkRecord>,
}

impl LlavaTask {
    /// Create the generator.
    pub fn new(base: TaskBase) -> Self {
        let img_prefix = base
            .spec()
            .img_prefix
            .clone()
            .unwrap_or_else(|| DEFAULT_LLAVA_IMG_PREFIX.to_string());
        Self {
            base,
            img_prefix,
            records: Vec::new(),
        }
    }
}

/// Split a human/gpt dialogue into questions and answers.
///
/// The first question loses its image marker. Returns `None` for dialogues
/// that do not alternate or whose first question carries no marker.
pub fn split_dialogue(turns: &[Turn]) -> Option<(Vec<String>, Vec<String>)> {
    if turns.len() % 2 != 0 {
        return None;
    }
    let mut questions = Vec::with_capacity(turns.len() / 2);
    let mut answers = Vec::with_capacity(turns.len() / 2);
    for (i, pair) in turns.chunks(2).enumerate() {
        let [q, a] = pair else {
            return None;
        };
        if q.role != Role::User || a.role != Role::Assistant {
            return None;
        }
        let question = if i == 0 { strip_image_marker(&q.content)? } else { q.content.as_str() };
        questions.push(question.to_string());
        answers.push(a.content.clone());
    }
    Some((questions, answers))
}

impl QaGenerator for LlavaTask {
    fn base(&self) -> &TaskBase {
        &self.base
    }

    fn into_base(self: Box<Self>) -> TaskBase {
        self.base
    }

    fn read_annotations(&mut self, _cache: &mut AnnotationCache, rng: &mut dyn RngCore) -> Result<()> {
        self.records = read_bulk(&self.base, "llava_instruct_150k.json", rng)?;
        Ok(())
    }

    fn read_summary(&self) -> String {
        format!("Successfully read {} images.", self.records.len())
    }

    fn create_qa_items(&mut self, _rng: &mut dyn RngCore) -> Result<()> {
        self.base.reset_buckets();
        let limit = self.base.spec().item_limit();
        for record in self.records.iter().take(limit) {
            let Some(image) = record.image.as_deref() else {
                log::warn!("Skipping instruction record without image");
                continue;
            };
            let Some((questions, answers)) = split_dialogue(&record.conversations) else {
                log::warn!("Skipping malformed dialogue for image {}", image);
                continue;
            };
            let img_path = PathBuf::from(format!("{}{}", self.img_prefix, image));
            self.base
                .add_item(ElementTask::LlavaInstruct, &img_path, "", questions, answers)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vqa_question_cleaned() {
        assert_eq!(
            classify_bulk_question("<img>a.jpg</img> What color is the bus? Answer: "),
            Some(BulkQuestion::Vqa("What color is the bus?".to_string()))
        );
    }

    #[test]
    fn test_caption_question_detected() {
        assert_eq!(
            classify_bulk_question("<img>a.jpg</img> Generate the detailed caption in English: "),
            Some(BulkQuestion::Caption)
        );
        assert_eq!(classify_bulk_question("What is this?"), None);
    }

    #[test]
    fn test_strip_image_marker() {
        assert_eq!(strip_image_marker("<image>\nWhat is shown?"), Some("What is shown?"));
        assert_eq!(strip_image_marker("What is shown?\n<image>"), Some("What is shown?"));
        assert_eq!(strip_image_marker("What is shown?"), None);
    }

    #[test]
    fn test_split_dialogue() {
        let turns = vec![
            Turn::user("<image>\nWhat is it?"),
            Turn::assistant("A cat."),
            Turn::user("Color?"),
            Turn::assistant("Black."),
        ];
        let (q, a) = split_dialogue(&turns).unwrap();
        assert_eq!(q, vec!["What is it?", "Color?"]);
        assert_eq!(a, vec!["A cat.", "Black."]);
        assert!(split_dialogue(&turns[..3]).is_none());
        assert!(split_dialogue(&[Turn::assistant("x"), Turn::user("y")]).is_none());
    }

    #[test]
    fn test_quotas() {
        let base = TaskBase::new(
            "monkey_training",
            crate::config::TaskSpec::new(PathBuf::from("m"), &["monkey_training"]).with_max_items(10),
        )
        .unwrap();
        assert_eq!(MonkeyTask::new(base).quotas(), (7, 3));
    }
}
