//! Configuration for filtering and corpus generation.
//!
//! Two kinds of configuration live here:
//! - [`FilterConfig`]: the quality thresholds applied to raw webpage annotations
//! - [`TaskSpec`] / [`DatasetMeta`]: the dataset meta file that names which
//!   generator families run, on which directories, with which limits

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Thresholds used by the annotation reader and quality filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    /// Minimum element count accepted by structural validation
    pub structural_min_elements: usize,
    /// Maximum element count accepted by structural validation
    pub structural_max_elements: usize,

    /// Minimum element count for the quality filter
    pub min_elements: usize,
    /// Maximum element count for the quality filter
    pub max_elements: usize,
    /// Strip and text-share rules only apply above this many elements
    pub crowd_threshold: usize,
    /// Width/height ratio above which an element counts as a thin strip
    pub strip_aspect_ratio: f64,
    /// Share of thin strips that rejects a page
    pub strip_fraction: f64,
    /// An element is tiny when its area is below `viewport_area / tiny_area_divisor`
    pub tiny_area_divisor: f64,
    /// Share of tiny elements that rejects a page
    pub tiny_fraction: f64,
    /// Share of pure-`Text` elements that rejects a page
    pub text_fraction: f64,
    /// Total words in `Text` elements above which a page may be a wall of text
    pub max_page_text_words: usize,
    /// Mean words per `Text` element above which a page is a wall of text
    pub max_mean_text_words: f64,

    /// Longest element text, in characters
    pub max_text_chars: usize,
    /// Longest element text, in words
    pub max_text_words: usize,
    /// Widest accepted aspect ratio (its inverse is the narrowest)
    pub max_aspect_ratio: f64,
    /// Minimum element width and height in pixels
    pub min_side: f64,
    /// Minimum element area in px²
    pub min_area: f64,
    /// Drop every copy of a non-empty text that appears more than once on a page.
    ///
    /// This also removes legitimately repeated labels such as several "OK"
    /// buttons on one page.
    pub drop_duplicate_text: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterConfig {
    /// Create the default thresholds.
    pub fn new() -> Self {
        Self {
            structural_min_elements: 5,
            structural_max_elements: 50,
            min_elements: 5,
            max_elements: 60,
            crowd_threshold: 5,
            strip_aspect_ratio: 20.0,
            strip_fraction: 0.5,
            tiny_area_divisor: 2500.0,
            tiny_fraction: 0.4,
            text_fraction: 0.8,
            max_page_text_words: 300,
            max_mean_text_words: 30.0,
            max_text_chars: 300,
            max_text_words: 60,
            max_aspect_ratio: 30.0,
            min_side: 20.0,
            min_area: 500.0,
            drop_duplicate_text: true,
        }
    }

    /// Set the element count range of structural validation.
    pub fn with_structural_elements(mut self, min: usize, max: usize) -> Self {
        self.structural_min_elements = min;
        self.structural_max_elements = max;
        self
    }

    /// Set the element count range of the quality filter.
    pub fn with_element_range(mut self, min: usize, max: usize) -> Self {
        self.min_elements = min;
        self.max_elements = max;
        self
    }

    /// Enable or disable duplicate-text suppression.
    pub fn with_duplicate_suppression(mut self, enable: bool) -> Self {
        self.drop_duplicate_text = enable;
        self
    }
}

/// One or several data directories.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DataDirs {
    /// A single directory
    One(PathBuf),
    /// Several directories read in order
    Many(Vec<PathBuf>),
}

impl DataDirs {
    /// All directories, in order.
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            DataDirs::One(p) => vec![p.as_path()],
            DataDirs::Many(ps) => ps.iter().map(PathBuf::as_path).collect(),
        }
    }

    /// The first directory.
    pub fn first(&self) -> Option<&Path> {
        self.paths().into_iter().next()
    }
}

impl From<PathBuf> for DataDirs {
    fn from(path: PathBuf) -> Self {
        DataDirs::One(path)
    }
}

fn default_repeated_time() -> usize {
    1
}

fn default_num_per_page() -> usize {
    99
}

fn default_desc_ratio() -> f64 {
    0.75
}

/// Settings of one dataset task in the meta file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskSpec {
    /// Source directory (or directories)
    pub data_dir: DataDirs,
    /// Element tasks to generate, from the family's legal set
    pub elem_tasks: Vec<String>,
    /// Item cap; unlimited when absent
    #[serde(default)]
    pub max_items: Option<usize>,
    /// How many independent samples to draw per source record
    #[serde(default = "default_repeated_time")]
    pub repeated_time: usize,
    /// Maximum QA pairs per page or image
    #[serde(default = "default_num_per_page")]
    pub num_per_page: usize,
    /// Image directory for families whose records hold bare file names
    #[serde(default)]
    pub img_dir: Option<PathBuf>,
    /// Path prefix prepended to image names (instruction corpora)
    #[serde(default)]
    pub img_prefix: Option<String>,
    /// Share of description items in caption/VQA corpora
    #[serde(default = "default_desc_ratio")]
    pub desc_ratio: f64,
}

impl TaskSpec {
    /// Create a spec with default limits.
    pub fn new(data_dir: impl Into<DataDirs>, elem_tasks: &[&str]) -> Self {
        Self {
            data_dir: data_dir.into(),
            elem_tasks: elem_tasks.iter().map(|t| t.to_string()).collect(),
            max_items: None,
            repeated_time: default_repeated_time(),
            num_per_page: default_num_per_page(),
            img_dir: None,
            img_prefix: None,
            desc_ratio: default_desc_ratio(),
        }
    }

    /// Cap the number of items.
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    /// Set the repetition factor.
    pub fn with_repeated_time(mut self, repeated_time: usize) -> Self {
        self.repeated_time = repeated_time;
        self
    }

    /// Set the per-page QA cap.
    pub fn with_num_per_page(mut self, num_per_page: usize) -> Self {
        self.num_per_page = num_per_page;
        self
    }

    /// Set the image directory.
    pub fn with_img_dir(mut self, img_dir: impl Into<PathBuf>) -> Self {
        self.img_dir = Some(img_dir.into());
        self
    }

    /// Set the image path prefix.
    pub fn with_img_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.img_prefix = Some(prefix.into());
        self
    }

    /// Item cap as a number.
    pub fn item_limit(&self) -> usize {
        self.max_items.unwrap_or(usize::MAX)
    }
}

/// Dataset tasks of one split, in file order.
pub type DatasetMeta = IndexMap<String, TaskSpec>;

/// Load one split (e.g. `train`) of a dataset meta file.
///
/// The file maps split names to task tables:
///
/// ```text
/// {"train": {"basic": {"data_dir": ["web/part1"], "elem_tasks": ["grounding", "ocr"]}}}
/// ```
pub fn load_dataset_meta(path: &Path, split: &str) -> Result<DatasetMeta> {
    let text = std::fs::read_to_string(path)?;
    let mut splits: IndexMap<String, DatasetMeta> = serde_json::from_str(&text)?;
    splits
        .shift_remove(split)
        .ok_or_else(|| Error::Config(format!("split '{}' not found in {}", split, path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_config_defaults() {
        let config = FilterConfig::default();
        assert_eq!(config.min_elements, 5);
        assert_eq!(config.max_elements, 60);
        assert_eq!(config.structural_max_elements, 50);
        assert!(config.drop_duplicate_text);
    }

    #[test]
    fn test_filter_config_builder() {
        let config = FilterConfig::new()
            .with_element_range(3, 10)
            .with_structural_elements(3, 10)
            .with_duplicate_suppression(false);
        assert_eq!(config.min_elements, 3);
        assert_eq!(config.structural_max_elements, 10);
        assert!(!config.drop_duplicate_text);
    }

    #[test]
    fn test_task_spec_defaults_from_json() {
        let spec: TaskSpec = serde_json::from_str(r#"{"data_dir": "web/part1", "elem_tasks": ["grounding"]}"#).unwrap();
        assert_eq!(spec.data_dir, DataDirs::One(PathBuf::from("web/part1")));
        assert_eq!(spec.max_items, None);
        assert_eq!(spec.item_limit(), usize::MAX);
        assert_eq!(spec.repeated_time, 1);
        assert_eq!(spec.num_per_page, 99);
        assert_eq!(spec.desc_ratio, 0.75);
    }

    #[test]
    fn test_task_spec_many_dirs() {
        let spec: TaskSpec = serde_json::from_str(
            r#"{"data_dir": ["a", "b"], "elem_tasks": ["ocr"], "max_items": 10, "num_per_page": 3}"#,
        )
        .unwrap();
        assert_eq!(spec.data_dir.paths(), vec![Path::new("a"), Path::new("b")]);
        assert_eq!(spec.data_dir.first(), Some(Path::new("a")));
        assert_eq!(spec.item_limit(), 10);
        assert_eq!(spec.num_per_page, 3);
    }

    #[test]
    fn test_load_dataset_meta_split() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.json");
        std::fs::write(
            &path,
            r#"{"train": {"captioning": {"data_dir": ["web"], "elem_tasks": ["title"]},
                          "basic": {"data_dir": ["web"], "elem_tasks": ["ocr"]}}}"#,
        )
        .unwrap();
        let meta = load_dataset_meta(&path, "train").unwrap();
        assert_eq!(meta.keys().collect::<Vec<_>>(), vec!["captioning", "basic"]);
        assert!(matches!(load_dataset_meta(&path, "eval"), Err(Error::Config(_))));
    }
}
