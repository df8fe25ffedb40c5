//! Icons pasted onto screenshots: grounding, referring and listing all icons.
//!
//! Records come from `<data_dir>/record.json`:
//!
//! ```text
//! [{"image": "0001.png", "size": [W, H], "bboxes": [[x1, y1, x2, y2], ...], "icons_desc": ["...", ...]}]
//! ```
//!
//! with images under `<data_dir>/images/`.

use super::encoding::{add_encoding_suffix, format_box, CoordFormat};
use super::{pick, prompts, read_json_records, ElementTask, QaGenerator, TaskBase};
use crate::annotation::AnnotationCache;
use crate::error::Result;
use crate::geometry::{normalize_box, BBox, Size};
use crate::utils::safe_float_cmp;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::Deserialize;
use std::path::PathBuf;

/// Probability of per-icon items when listing all icons is also enabled.
pub const PER_ICON_PROBABILITY: f64 = 0.7;

/// One screenshot with pasted icons.
#[derive(Debug, Clone, Deserialize)]
pub struct IconRecord {
    /// Image file name
    pub image: String,
    /// `[width, height]`
    pub size: [u32; 2],
    /// Pixel boxes, parallel to `icons_desc`
    pub bboxes: Vec<[f64; 4]>,
    /// Icon descriptions
    pub icons_desc: Vec<String>,
}

/// `icon_mixed` / `icon_mixed_cropped`.
pub struct IconMixedTask {
    base: TaskBase,
    records: Vec<(PathBuf, IconRecord)>,
}

impl IconMixedTask {
    /// Create the generator.
    pub fn new(base: TaskBase) -> Self {
        Self {
            base,
            records: Vec::new(),
        }
    }

    fn per_icon_item(
        &mut self,
        rng: &mut dyn RngCore,
        img_path: PathBuf,
        bboxes: &[BBox],
        descs: &[String],
    ) -> Result<()> {
        let single_tasks: Vec<ElementTask> = self
            .base
            .elem_tasks()
            .iter()
            .copied()
            .filter(|t| matches!(t, ElementTask::IconGrounding | ElementTask::IconReferring))
            .collect();
        let Some(&elem_task) = single_tasks.choose(rng) else {
            return Ok(());
        };
        let format = CoordFormat::choose(rng);
        let table = match elem_task {
            ElementTask::IconReferring => prompts::ICON_REFERRING,
            _ => prompts::ICON_GROUNDING,
        };
        let sys_prompt = add_encoding_suffix(pick(table, rng), format);

        let count = bboxes.len().min(self.base.spec().num_per_page);
        let mut questions = Vec::with_capacity(count);
        let mut answers = Vec::with_capacity(count);
        for (bbox, desc) in bboxes.iter().zip(descs).take(count) {
            if elem_task == ElementTask::IconReferring {
                questions.push(format_box(format, bbox, true, rng));
                answers.push(desc.clone());
            } else {
                questions.push(desc.clone());
                answers.push(format_box(format, bbox, false, rng));
            }
        }
        self.base.add_item(elem_task, &img_path, &sys_prompt, questions, answers)
    }
}

/// Order icons for listing: landscape images by the full box, others by `(y1, x1)`.
pub fn sort_icons(size: Size, icons: &mut [(BBox, String)]) {
    if size.is_landscape() {
        icons.sort_by(|(a, _), (b, _)| {
            a.to_array()
                .iter()
                .zip(b.to_array().iter())
                .map(|(x, y)| safe_float_cmp(*x, *y))
                .find(|o| o.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    } else {
        icons.sort_by(|(a, _), (b, _)| safe_float_cmp(a.y1, b.y1).then(safe_float_cmp(a.x1, b.x1)));
    }
}

/// Answer listing every icon with its exact encoding.
///
/// `There are {n} pasted icons in this screenshot: {desc} {box}, ..., {desc} {box}.`
pub fn all_icons_answer<R: Rng + ?Sized>(
    size: Size,
    bboxes: &[BBox],
    descs: &[String],
    format: CoordFormat,
    rng: &mut R,
) -> String {
    let mut icons: Vec<(BBox, String)> = bboxes.iter().copied().zip(descs.iter().cloned()).collect();
    sort_icons(size, &mut icons);

    let mut answer = format!("There are {} pasted icons in this screenshot:", icons.len());
    for (i, (bbox, desc)) in icons.iter().enumerate() {
        let punct = if i + 1 < icons.len() { "," } else { "." };
        answer.push_str(&format!(" {} {}{}", desc, format_box(format, bbox, false, rng), punct));
    }
    answer
}

impl QaGenerator for IconMixedTask {
    fn base(&self) -> &TaskBase {
        &self.base
    }

    fn into_base(self: Box<Self>) -> TaskBase {
        self.base
    }

    fn read_annotations(&mut self, _cache: &mut AnnotationCache, rng: &mut dyn RngCore) -> Result<()> {
        for dir in self.base.spec().data_dir.paths() {
            let records: Vec<IconRecord> = read_json_records(&dir.join("record.json"))?;
            self.records.extend(records.into_iter().map(|r| (dir.to_path_buf(), r)));
        }
        self.records.shuffle(rng);
        Ok(())
    }

    fn read_summary(&self) -> String {
        format!("Successfully read {} images.", self.records.len())
    }

    fn create_qa_items(&mut self, rng: &mut dyn RngCore) -> Result<()> {
        self.base.reset_buckets();
        let all_enabled = self.base.has_elem_task(ElementTask::IconAllGrounding);
        let limit = self.base.spec().item_limit();
        let records: Vec<(PathBuf, IconRecord)> = self.records.iter().take(limit).cloned().collect();

        for (dir, record) in records {
            if record.bboxes.len() != record.icons_desc.len() {
                log::warn!(
                    "Skipping {}: {} boxes but {} descriptions",
                    record.image,
                    record.bboxes.len(),
                    record.icons_desc.len()
                );
                continue;
            }
            let size = Size::new(record.size[0], record.size[1]);
            let img_path = dir.join("images").join(&record.image);
            let bboxes: Vec<BBox> = record
                .bboxes
                .iter()
                .map(|b| normalize_box(&BBox::new(b[0], b[1], b[2], b[3]), size))
                .collect();

            if !all_enabled || bboxes.len() < 2 || rng.gen::<f64>() < PER_ICON_PROBABILITY {
                self.per_icon_item(rng, img_path, &bboxes, &record.icons_desc)?;
            } else {
                let format = CoordFormat::choose(rng);
                let question = add_encoding_suffix(pick(prompts::ICON_ALL_GROUNDING, rng), format);
                let answer = all_icons_answer(size, &bboxes, &record.icons_desc, format, rng);
                self.base
                    .add_item(ElementTask::IconAllGrounding, &img_path, "", vec![question], vec![answer])?;
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

    fn descs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_landscape_sorted_by_x() {
        let mut rng = StdRng::seed_from_u64(0);
        let bboxes = vec![
            BBox::new(0.5, 0.1, 0.6, 0.2),
            BBox::new(0.1, 0.8, 0.2, 0.9),
            BBox::new(0.3, 0.4, 0.4, 0.5),
        ];
        let answer = all_icons_answer(
            Size::new(1920, 1080),
            &bboxes,
            &descs(&["cart", "home", "search"]),
            CoordFormat::Bbox,
            &mut rng,
        );
        assert_eq!(
            answer,
            "There are 3 pasted icons in this screenshot: home (0.1, 0.8, 0.2, 0.9), \
             search (0.3, 0.4, 0.4, 0.5), cart (0.5, 0.1, 0.6, 0.2)."
        );
    }

    #[test]
    fn test_portrait_sorted_by_y_then_x() {
        let mut icons = vec![
            (BBox::new(0.5, 0.5, 0.6, 0.6), "b".to_string()),
            (BBox::new(0.1, 0.5, 0.2, 0.6), "a".to_string()),
            (BBox::new(0.9, 0.1, 1.0, 0.2), "top".to_string()),
        ];
        sort_icons(Size::new(1080, 1920), &mut icons);
        let order: Vec<&str> = icons.iter().map(|(_, d)| d.as_str()).collect();
        assert_eq!(order, vec!["top", "a", "b"]);
    }

    #[test]
    fn test_point_listing_uses_centers() {
        let mut rng = StdRng::seed_from_u64(0);
        let answer = all_icons_answer(
            Size::new(100, 100),
            &[BBox::new(0.0, 0.0, 0.2, 0.2), BBox::new(0.4, 0.4, 0.6, 0.6)],
            &descs(&["x", "y"]),
            CoordFormat::Point,
            &mut rng,
        );
        assert_eq!(answer, "There are 2 pasted icons in this screenshot: x (0.1, 0.1), y (0.5, 0.5).");
    }
}
