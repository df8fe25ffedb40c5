//! Structural validation of raw page annotation records.
//!
//! Raw records are untyped JSON produced by the browser annotation script:
//!
//! ```text
//! {image, viewport:[W,H], url?, title, description, keywords,
//!  elements:[{bbox:[x1,y1,x2,y2], text, types:[str,...], ariaLabel?, title?}]}
//! ```
//!
//! A record that violates the expected shape is rejected as a whole with a
//! [`StructuralError`]. Validation also performs the in-place cleanups the
//! rest of the pipeline relies on: null descriptions/keywords become empty
//! strings, type lists become ordered sets and text is whitespace-normalized.

use super::{Element, PageAnnotation};
use crate::geometry::{is_valid_box, BBox, Size};
use crate::text::normalize_whitespace;
use indexmap::IndexSet;
use serde_json::{Map, Value};
use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Why a raw record was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructuralError {
    /// Top-level value is not an object
    #[error("page record is not a JSON object")]
    NotAnObject,

    /// Required field absent
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    /// Field present with the wrong JSON type
    #[error("field '{field}' should be {expected}")]
    WrongType {
        /// Field name
        field: &'static str,
        /// Expected JSON type
        expected: &'static str,
    },

    /// Viewport is not two positive integers
    #[error("viewport must be two positive integers")]
    InvalidViewport,

    /// Element count outside the accepted range
    #[error("{count} elements, expected {min}..={max}")]
    ElementCount {
        /// Elements in the record
        count: usize,
        /// Lower bound
        min: usize,
        /// Upper bound
        max: usize,
    },

    /// An element is missing keys or has wrongly typed values
    #[error("element {index}: {reason}")]
    MalformedElement {
        /// Position in the element list
        index: usize,
        /// What is wrong
        reason: &'static str,
    },

    /// An element box leaves the viewport
    #[error("element {index}: box outside the viewport")]
    BoxOutsideViewport {
        /// Position in the element list
        index: usize,
    },
}

/// Shape rules applied before quality filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureRules {
    /// Accepted element count, `None` to skip the check
    pub element_count: Option<RangeInclusive<usize>>,
}

impl Default for StructureRules {
    fn default() -> Self {
        Self {
            element_count: Some(5..=50),
        }
    }
}

impl StructureRules {
    /// Rules without an element count limit.
    pub fn unbounded() -> Self {
        Self { element_count: None }
    }
}

/// Validate a raw record and convert it into a [`PageAnnotation`].
///
/// The returned page's `image_path` is the raw `image` value; callers
/// resolve it against their screenshot directory.
pub fn parse_page(value: &Value, rules: &StructureRules) -> Result<PageAnnotation, StructuralError> {
    let obj = value.as_object().ok_or(StructuralError::NotAnObject)?;

    let description = optional_text(obj, "description")?;
    let keywords = optional_text(obj, "keywords")?;
    let title = optional_text(obj, "title")?;
    let url = optional_text(obj, "url")?;

    let image = obj
        .get("image")
        .ok_or(StructuralError::MissingField("image"))?
        .as_str()
        .ok_or(StructuralError::WrongType {
            field: "image",
            expected: "a string",
        })?;
    let viewport = parse_viewport(obj.get("viewport").ok_or(StructuralError::MissingField("viewport"))?)?;

    let raw_elements = obj
        .get("elements")
        .ok_or(StructuralError::MissingField("elements"))?
        .as_array()
        .ok_or(StructuralError::WrongType {
            field: "elements",
            expected: "an array",
        })?;

    if let Some(range) = &rules.element_count {
        if !range.contains(&raw_elements.len()) {
            return Err(StructuralError::ElementCount {
                count: raw_elements.len(),
                min: *range.start(),
                max: *range.end(),
            });
        }
    }

    let elements = raw_elements
        .iter()
        .enumerate()
        .map(|(index, raw)| parse_element(index, raw, viewport))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PageAnnotation {
        image_path: PathBuf::from(image),
        viewport,
        url,
        title,
        description,
        keywords,
        elements,
    })
}

/// String field that may be missing or null; anything else must be a string.
fn optional_text(obj: &Map<String, Value>, field: &'static str) -> Result<String, StructuralError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(StructuralError::WrongType {
            field,
            expected: "a string",
        }),
    }
}

fn parse_viewport(value: &Value) -> Result<Size, StructuralError> {
    let dims = value.as_array().ok_or(StructuralError::InvalidViewport)?;
    if dims.len() != 2 {
        return Err(StructuralError::InvalidViewport);
    }
    let mut out = [0u32; 2];
    for (slot, dim) in out.iter_mut().zip(dims) {
        *slot = dim
            .as_u64()
            .filter(|&d| d > 0)
            .and_then(|d| u32::try_from(d).ok())
            .ok_or(StructuralError::InvalidViewport)?;
    }
    Ok(Size::new(out[0], out[1]))
}

fn parse_element(index: usize, raw: &Value, viewport: Size) -> Result<Element, StructuralError> {
    let malformed = |reason| StructuralError::MalformedElement { index, reason };

    let obj = raw
        .as_object()
        .filter(|o| !o.is_empty())
        .ok_or_else(|| malformed("not a non-empty object"))?;

    let coords = obj
        .get("bbox")
        .ok_or_else(|| malformed("missing bbox"))?
        .as_array()
        .ok_or_else(|| malformed("bbox is not a list"))?;
    if coords.len() != 4 {
        return Err(malformed("bbox must have four coordinates"));
    }
    let mut pixels = [0i64; 4];
    for (slot, coord) in pixels.iter_mut().zip(coords) {
        *slot = coord.as_i64().ok_or_else(|| malformed("bbox coordinates must be integers"))?;
    }
    let bbox = BBox::from_pixels(pixels);
    if !is_valid_box(&bbox, viewport) {
        return Err(StructuralError::BoxOutsideViewport { index });
    }

    let text = obj
        .get("text")
        .ok_or_else(|| malformed("missing text"))?
        .as_str()
        .ok_or_else(|| malformed("text is not a string"))?;

    let raw_types = obj
        .get("types")
        .ok_or_else(|| malformed("missing types"))?
        .as_array()
        .ok_or_else(|| malformed("types is not a list"))?;
    match raw_types.first() {
        Some(Value::String(_)) => {},
        _ => return Err(malformed("types must start with a string")),
    }
    let types: IndexSet<String> = raw_types.iter().filter_map(|t| t.as_str().map(str::to_string)).collect();

    Ok(Element {
        bbox,
        text: normalize_whitespace(text),
        types,
        aria_label: obj.get("ariaLabel").and_then(Value::as_str).map(str::to_string),
        title: obj.get("title").and_then(Value::as_str).map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_element(bbox: [i64; 4], text: &str) -> Value {
        json!({"bbox": bbox, "text": text, "types": ["Text"]})
    }

    fn raw_page(elements: Vec<Value>) -> Value {
        json!({
            "image": "0001_top.png",
            "viewport": [1280, 720],
            "title": "Shop",
            "description": null,
            "keywords": null,
            "elements": elements,
        })
    }

    fn five_elements() -> Vec<Value> {
        (0..5).map(|i| raw_element([10, i * 100, 200, i * 100 + 50], &format!("item {}", i))).collect()
    }

    #[test]
    fn test_parse_valid_page() {
        let page = parse_page(&raw_page(five_elements()), &StructureRules::default()).unwrap();
        assert_eq!(page.viewport, Size::new(1280, 720));
        assert_eq!(page.elements.len(), 5);
        assert_eq!(page.description, "");
        assert_eq!(page.keywords, "");
        assert_eq!(page.url, "");
        assert_eq!(page.image_path, PathBuf::from("0001_top.png"));
    }

    #[test]
    fn test_four_elements_rejected() {
        let mut elements = five_elements();
        elements.pop();
        let err = parse_page(&raw_page(elements), &StructureRules::default()).unwrap_err();
        assert_eq!(
            err,
            StructuralError::ElementCount {
                count: 4,
                min: 5,
                max: 50
            }
        );
    }

    #[test]
    fn test_unbounded_rules_accept_any_count() {
        let elements = vec![raw_element([0, 0, 10, 10], "x")];
        assert!(parse_page(&raw_page(elements), &StructureRules::unbounded()).is_ok());
    }

    #[test]
    fn test_non_string_description_rejected() {
        let mut page = raw_page(five_elements());
        page["description"] = json!(42);
        let err = parse_page(&page, &StructureRules::default()).unwrap_err();
        assert!(matches!(err, StructuralError::WrongType { field: "description", .. }));
    }

    #[test]
    fn test_float_coordinates_rejected() {
        let mut elements = five_elements();
        elements[2] = json!({"bbox": [1.5, 0, 20, 20], "text": "x", "types": ["Text"]});
        let err = parse_page(&raw_page(elements), &StructureRules::default()).unwrap_err();
        assert!(matches!(err, StructuralError::MalformedElement { index: 2, .. }));
    }

    #[test]
    fn test_box_outside_viewport_rejected() {
        let mut elements = five_elements();
        elements[4] = raw_element([10, 10, 1300, 50], "wide");
        let err = parse_page(&raw_page(elements), &StructureRules::default()).unwrap_err();
        assert_eq!(err, StructuralError::BoxOutsideViewport { index: 4 });
    }

    #[test]
    fn test_empty_types_rejected() {
        let mut elements = five_elements();
        elements[0] = json!({"bbox": [0, 0, 20, 20], "text": "x", "types": []});
        assert!(parse_page(&raw_page(elements), &StructureRules::default()).is_err());
    }

    #[test]
    fn test_missing_text_rejected() {
        let mut elements = five_elements();
        elements[1] = json!({"bbox": [0, 0, 20, 20], "types": ["Text"]});
        assert!(parse_page(&raw_page(elements), &StructureRules::default()).is_err());
    }

    #[test]
    fn test_types_become_ordered_set_and_text_normalized() {
        let mut elements = five_elements();
        elements[0] = json!({
            "bbox": [0, 0, 20, 20],
            "text": "Buy\u{00A0}\u{00A0}now",
            "types": ["Button", "Text", "Button"],
            "ariaLabel": "Purchase",
        });
        let page = parse_page(&raw_page(elements), &StructureRules::default()).unwrap();
        let el = &page.elements[0];
        assert_eq!(el.text, "Buy now");
        assert_eq!(el.types.iter().collect::<Vec<_>>(), vec!["Button", "Text"]);
        assert_eq!(el.aria_label.as_deref(), Some("Purchase"));
        assert_eq!(el.title, None);
    }

    #[test]
    fn test_invalid_viewport_rejected() {
        let mut page = raw_page(five_elements());
        page["viewport"] = json!([0, 720]);
        assert_eq!(
            parse_page(&page, &StructureRules::default()).unwrap_err(),
            StructuralError::InvalidViewport
        );
    }
}
