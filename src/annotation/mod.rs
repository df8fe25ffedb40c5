//! Webpage annotations: parsing, validation and quality filtering.
//!
//! ```text
//! <data_dir>/anno/*.json
//!     ↓
//! [validate]  structural checks, whitespace cleanup  → StructuralError
//!     ↓
//! [filter]    page quality, then per-element rules   → PageRejection
//!     ↓
//! [reader]    AnnotationCache, one read per directory name
//!     ↓
//! PageAnnotation[]
//! ```

pub mod filter;
pub mod reader;
pub mod validate;

pub use filter::{check_page_quality, filter_elements, filter_page, FilterStats, PageRejection};
pub use reader::{read_annotation_dir, AnnotationCache};
pub use validate::{parse_page, StructuralError, StructureRules};

use crate::geometry::{BBox, Size};
use indexmap::IndexSet;
use std::path::PathBuf;

/// Type tag of plain text nodes.
pub const TYPE_TEXT: &str = "Text";
/// Type tag of images.
pub const TYPE_IMAGE: &str = "Image";
/// Type tag of icons.
pub const TYPE_ICON: &str = "Icon";

/// One annotated UI node.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Pixel box inside the viewport
    pub bbox: BBox,
    /// Visible text, whitespace-normalized
    pub text: String,
    /// Type tags; the first one is the primary type
    pub types: IndexSet<String>,
    /// `aria-label` attribute
    pub aria_label: Option<String>,
    /// `title` attribute
    pub title: Option<String>,
}

impl Element {
    /// The primary type tag.
    pub fn primary_type(&self) -> Option<&str> {
        self.types.first().map(String::as_str)
    }

    /// True when the element carries the `Image` or `Icon` tag.
    pub fn is_image_like(&self) -> bool {
        self.types.contains(TYPE_IMAGE) || self.types.contains(TYPE_ICON)
    }

    /// True when `Text` is the only type tag.
    pub fn is_pure_text(&self) -> bool {
        self.types.len() == 1 && self.types.contains(TYPE_TEXT)
    }

    /// Accessibility text: the aria label, or the title attribute if the label is empty.
    pub fn accessibility_text(&self) -> &str {
        match self.aria_label.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => self.title.as_deref().unwrap_or(""),
        }
    }
}

/// One webpage screenshot with its surviving elements.
#[derive(Debug, Clone, PartialEq)]
pub struct PageAnnotation {
    /// Screenshot path
    pub image_path: PathBuf,
    /// Viewport size in pixels
    pub viewport: Size,
    /// Page URL, empty if unknown
    pub url: String,
    /// `<title>` of the page
    pub title: String,
    /// Meta description
    pub description: String,
    /// Meta keywords
    pub keywords: String,
    /// Annotated elements, in document order
    pub elements: Vec<Element>,
}

impl PageAnnotation {
    /// Page-level caption field by name (`title`, `description`, `keywords`).
    pub fn caption_field(&self, name: &str) -> Option<&str> {
        match name {
            "title" => Some(&self.title),
            "description" => Some(&self.description),
            "keywords" => Some(&self.keywords),
            _ => None,
        }
    }
}
