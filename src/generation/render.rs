//! Text rendering of a page annotation for the vision-model prompt.

use crate::annotation::PageAnnotation;
use crate::geometry::{format_coord, normalize_box, round_to};

/// Which optional parts of the rendering to include.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Prefix each element line with `i. `
    pub show_index: bool,
    /// Emit the `Title:` and `Description:` lines
    pub show_title_desc: bool,
}

impl RenderOptions {
    /// Enable or disable element indices.
    pub fn with_index(mut self, show: bool) -> Self {
        self.show_index = show;
        self
    }

    /// Enable or disable the title and description lines.
    pub fn with_title_desc(mut self, show: bool) -> Self {
        self.show_title_desc = show;
        self
    }
}

/// Render a page as prompt text.
///
/// One line per element: `{ types }, "text", "aria label or title", [x1, y1, x2, y2]`
/// with the box normalized to the viewport and rounded to 4 digits.
///
/// # Examples
///
/// ```
/// use ui_corpus::annotation::{parse_page, StructureRules};
/// use ui_corpus::generation::{render_annotation, RenderOptions};
///
/// let raw = serde_json::json!({
///     "image": "1.png", "viewport": [1920, 1080], "url": "https://example.com",
///     "title": "Example", "description": null, "keywords": null,
///     "elements": [{"bbox": [0, 0, 960, 540], "text": "Home", "types": ["Link", "Text"]}]
/// });
/// let page = parse_page(&raw, &StructureRules::unbounded()).unwrap();
/// let text = render_annotation(&page, RenderOptions::default().with_index(true));
/// assert_eq!(text, "URL: https://example.com\n0. { Link Text }, \"Home\", \"\", [0.0, 0.0, 0.5, 0.5]\n");
/// ```
pub fn render_annotation(page: &PageAnnotation, options: RenderOptions) -> String {
    let mut out = format!("URL: {}\n", page.url);
    if options.show_title_desc {
        out.push_str(&format!("Title: {}\n", page.title));
        out.push_str(&format!("Description: {}\n", page.description));
    }

    for (i, element) in page.elements.iter().enumerate() {
        if options.show_index {
            out.push_str(&format!("{}. ", i));
        }
        out.push_str("{ ");
        for tag in &element.types {
            out.push_str(tag);
            out.push(' ');
        }
        out.push('}');

        let coords: Vec<String> = normalize_box(&element.bbox, page.viewport)
            .to_array()
            .iter()
            .map(|&v| format_coord(round_to(v, 4)))
            .collect();
        out.push_str(&format!(
            ", \"{}\", \"{}\", [{}]\n",
            element.text,
            element.accessibility_text(),
            coords.join(", ")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::test_support::{element, page};

    #[test]
    fn test_title_and_description_lines() {
        let mut p = page(vec![]);
        p.url = "https://a.org".to_string();
        p.title = "A".to_string();
        p.description = "About A".to_string();
        let text = render_annotation(&p, RenderOptions::default().with_title_desc(true));
        assert_eq!(text, "URL: https://a.org\nTitle: A\nDescription: About A\n");
    }

    #[test]
    fn test_aria_label_then_title() {
        let mut e = element([0, 0, 128, 72], "Go", &["Button"]);
        e.title = Some("Submit form".to_string());
        let mut p = page(vec![e.clone()]);
        let text = render_annotation(&p, RenderOptions::default());
        assert!(text.ends_with("{ Button }, \"Go\", \"Submit form\", [0.0, 0.0, 0.1, 0.1]\n"));

        e.aria_label = Some("Search".to_string());
        p.elements = vec![e];
        let text = render_annotation(&p, RenderOptions::default());
        assert!(text.contains("\"Search\""));
    }

    #[test]
    fn test_rounding_to_four_digits() {
        let p = page(vec![element([1, 1, 4, 4], "x", &["Text"])]);
        let text = render_annotation(&p, RenderOptions::default());
        // 1/1280, 1/720, 4/1280, 4/720
        assert!(text.contains("[0.0008, 0.0014, 0.0031, 0.0056]"), "{}", text);
    }
}
