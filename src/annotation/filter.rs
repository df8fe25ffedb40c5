//! Page- and element-level quality heuristics.
//!
//! Page rules look at the whole element population and reject pages whose
//! annotations are mostly degenerate (thin strips, tiny boxes, walls of text).
//! Element rules then drop individual outliers from the surviving pages.

use super::{Element, PageAnnotation};
use crate::config::FilterConfig;
use crate::geometry::Size;
use crate::text::word_count;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;

/// Why a page was dropped by the quality filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageRejection {
    /// Fewer elements than the minimum
    TooFewElements(usize),
    /// More elements than the maximum
    TooManyElements(usize),
    /// Some element has zero width or height
    DegenerateBox,
    /// Most elements are extremely wide strips
    ThinStrips,
    /// Most elements are tiny relative to the viewport
    TinyBoxes,
    /// The page is mostly plain text
    TextHeavy,
    /// Every element was removed by the element rules
    NoElementsLeft,
}

impl PageRejection {
    /// Short key used in summary counters.
    pub fn reason(&self) -> &'static str {
        match self {
            PageRejection::TooFewElements(_) => "too_few_elements",
            PageRejection::TooManyElements(_) => "too_many_elements",
            PageRejection::DegenerateBox => "degenerate_box",
            PageRejection::ThinStrips => "thin_strips",
            PageRejection::TinyBoxes => "tiny_boxes",
            PageRejection::TextHeavy => "text_heavy",
            PageRejection::NoElementsLeft => "no_elements_left",
        }
    }
}

impl fmt::Display for PageRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageRejection::TooFewElements(n) | PageRejection::TooManyElements(n) => {
                write!(f, "{} ({} elements)", self.reason(), n)
            },
            _ => f.write_str(self.reason()),
        }
    }
}

/// Counters gathered while reading one annotation directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterStats {
    /// Annotation files seen
    pub pages_seen: usize,
    /// Pages accepted
    pub pages_kept: usize,
    /// Pages rejected by structural validation (including unparsable JSON)
    pub structural_rejections: usize,
    /// Pages rejected by quality rules, by reason
    pub quality_rejections: IndexMap<&'static str, usize>,
    /// Elements dropped from accepted pages
    pub elements_dropped: usize,
    /// Elements kept on accepted pages
    pub elements_kept: usize,
}

impl FilterStats {
    /// Record a quality rejection.
    pub fn record_rejection(&mut self, rejection: PageRejection) {
        *self.quality_rejections.entry(rejection.reason()).or_insert(0) += 1;
    }

    /// Pages rejected for any reason.
    pub fn pages_rejected(&self) -> usize {
        self.structural_rejections + self.quality_rejections.values().sum::<usize>()
    }
}

/// Fraction of `elements` matching `pred`.
fn fraction<F>(elements: &[Element], pred: F) -> f64
where
    F: Fn(&Element) -> bool,
{
    if elements.is_empty() {
        return 0.0;
    }
    elements.iter().filter(|e| pred(e)).count() as f64 / elements.len() as f64
}

/// Apply the page-level rules.
pub fn check_page_quality(elements: &[Element], viewport: Size, config: &FilterConfig) -> Result<(), PageRejection> {
    let count = elements.len();
    if count < config.min_elements {
        return Err(PageRejection::TooFewElements(count));
    }
    if count > config.max_elements {
        return Err(PageRejection::TooManyElements(count));
    }

    if elements.iter().any(|e| e.bbox.width() == 0.0 || e.bbox.height() == 0.0) {
        return Err(PageRejection::DegenerateBox);
    }

    let many = count > config.crowd_threshold;
    if many && fraction(elements, |e| e.bbox.width() / e.bbox.height() > config.strip_aspect_ratio) > config.strip_fraction
    {
        return Err(PageRejection::ThinStrips);
    }

    let tiny_area = viewport.area() / config.tiny_area_divisor;
    if fraction(elements, |e| e.bbox.area() < tiny_area) > config.tiny_fraction {
        return Err(PageRejection::TinyBoxes);
    }

    let text_elements: Vec<&Element> = elements.iter().filter(|e| e.is_pure_text()).collect();
    let text_share = text_elements.len() as f64 / count as f64;
    let total_words: usize = text_elements.iter().map(|e| word_count(&e.text)).sum();
    let wall_of_text = total_words > config.max_page_text_words
        && total_words as f64 / text_elements.len() as f64 > config.max_mean_text_words;
    if (many && text_share > config.text_fraction) || wall_of_text {
        return Err(PageRejection::TextHeavy);
    }

    Ok(())
}

/// Apply the element-level rules, returning the survivors in order.
///
/// Duplicate suppression counts texts over the whole input, so every copy of
/// a repeated non-empty text is dropped, not just the later ones.
pub fn filter_elements(elements: Vec<Element>, config: &FilterConfig) -> Vec<Element> {
    let mut text_counts: HashMap<&str, usize> = HashMap::new();
    for element in &elements {
        *text_counts.entry(element.text.as_str()).or_insert(0) += 1;
    }
    let keep: Vec<bool> = elements
        .iter()
        .map(|e| element_passes(e, &text_counts, config))
        .collect();

    elements
        .into_iter()
        .zip(keep)
        .filter_map(|(element, keep)| keep.then_some(element))
        .collect()
}

fn element_passes(element: &Element, text_counts: &HashMap<&str, usize>, config: &FilterConfig) -> bool {
    let text = element.text.as_str();
    if text.chars().count() > config.max_text_chars || word_count(text) > config.max_text_words {
        return false;
    }

    let (w, h) = (element.bbox.width(), element.bbox.height());
    match element.bbox.aspect_ratio() {
        None => return false,
        Some(ratio) if ratio > config.max_aspect_ratio || ratio < 1.0 / config.max_aspect_ratio => {
            return false
        },
        Some(_) => {},
    }

    if w < config.min_side || h < config.min_side || w * h < config.min_area {
        return false;
    }

    if element.types.is_empty() {
        return false;
    }

    if config.drop_duplicate_text && !text.is_empty() && text_counts.get(text).copied().unwrap_or(0) > 1 {
        return false;
    }

    true
}

/// Run page rules then element rules on a validated page.
///
/// Returns the page with only its surviving elements, plus how many were dropped.
pub fn filter_page(mut page: PageAnnotation, config: &FilterConfig) -> Result<(PageAnnotation, usize), PageRejection> {
    check_page_quality(&page.elements, page.viewport, config)?;
    let before = page.elements.len();
    page.elements = filter_elements(std::mem::take(&mut page.elements), config);
    if page.elements.is_empty() {
        return Err(PageRejection::NoElementsLeft);
    }
    let dropped = before - page.elements.len();
    Ok((page, dropped))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{element, good_elements, page};
    use super::*;

    fn config() -> FilterConfig {
        FilterConfig::default()
    }

    #[test]
    fn test_good_page_accepted() {
        let (page, dropped) = filter_page(page(good_elements()), &config()).unwrap();
        assert_eq!(page.elements.len(), 5);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_four_elements_rejected() {
        let mut elements = good_elements();
        elements.pop();
        assert_eq!(
            filter_page(page(elements), &config()).unwrap_err(),
            PageRejection::TooFewElements(4)
        );
    }

    #[test]
    fn test_too_many_elements_rejected() {
        let elements: Vec<Element> = (0..61)
            .map(|i| element([0, 0, 30, 30], &format!("e{}", i), &["Button"]))
            .collect();
        assert_eq!(
            check_page_quality(&elements, Size::new(1280, 720), &config()),
            Err(PageRejection::TooManyElements(61))
        );
    }

    #[test]
    fn test_zero_height_rejects_page() {
        let mut elements = good_elements();
        elements[1] = element([250, 10, 450, 10], "Flat", &["Link"]);
        assert_eq!(
            filter_page(page(elements), &config()).unwrap_err(),
            PageRejection::DegenerateBox
        );
    }

    #[test]
    fn test_thin_strips_reject_page() {
        let mut elements: Vec<Element> = (0..4)
            .map(|i| element([0, i * 30, 1000, i * 30 + 10], &format!("strip {}", i), &["Link"]))
            .collect();
        elements.extend(good_elements().into_iter().take(2));
        assert_eq!(elements.len(), 6);
        assert_eq!(
            check_page_quality(&elements, Size::new(1280, 720), &config()),
            Err(PageRejection::ThinStrips)
        );
    }

    #[test]
    fn test_thin_strips_need_more_than_five_elements() {
        let mut elements: Vec<Element> = (0..3)
            .map(|i| element([0, i * 30, 1000, i * 30 + 10], &format!("strip {}", i), &["Link"]))
            .collect();
        elements.extend(good_elements().into_iter().take(2));
        assert_eq!(check_page_quality(&elements, Size::new(1280, 720), &config()), Ok(()));
    }

    #[test]
    fn test_tiny_boxes_reject_page() {
        // 1280*720/2500 = 368.64 px²
        let mut elements: Vec<Element> = (0..3)
            .map(|i| element([i * 30, 0, i * 30 + 15, 15], &format!("dot {}", i), &["Icon"]))
            .collect();
        elements.extend(good_elements().into_iter().take(2));
        assert_eq!(
            check_page_quality(&elements, Size::new(1280, 720), &config()),
            Err(PageRejection::TinyBoxes)
        );
    }

    #[test]
    fn test_mostly_text_rejects_page() {
        let elements: Vec<Element> = (0..6)
            .map(|i| element([0, i * 60, 300, i * 60 + 50], &format!("para {}", i), &["Text"]))
            .collect();
        assert_eq!(
            check_page_quality(&elements, Size::new(1280, 720), &config()),
            Err(PageRejection::TextHeavy)
        );
    }

    #[test]
    fn test_wall_of_text_rejects_page() {
        let long = vec!["word"; 160].join(" ");
        let mut elements = good_elements();
        elements[0] = element([10, 10, 600, 400], &long, &["Text"]);
        elements[4] = element([10, 400, 600, 700], &long, &["Text"]);
        assert_eq!(
            check_page_quality(&elements, Size::new(1280, 720), &config()),
            Err(PageRejection::TextHeavy)
        );
    }

    #[test]
    fn test_duplicate_text_drops_all_copies() {
        let mut elements = good_elements();
        elements.push(element([900, 300, 1000, 350], "Home", &["Button"]));
        let (page, dropped) = filter_page(page(elements), &config()).unwrap();
        assert_eq!(dropped, 2);
        assert!(page.elements.iter().all(|e| e.text != "Home"));
    }

    #[test]
    fn test_duplicate_empty_text_kept() {
        let mut elements = good_elements();
        elements.push(element([900, 300, 1000, 350], "", &["Icon"]));
        elements.push(element([1000, 400, 1100, 450], "", &["Icon"]));
        let (page, _) = filter_page(page(elements), &config()).unwrap();
        assert_eq!(page.elements.len(), 7);
    }

    #[test]
    fn test_extreme_aspect_ratio_element_dropped() {
        let mut elements = good_elements();
        elements.push(element([0, 500, 500, 501], "Ticker", &["Text", "Link"]));
        let survivors = filter_elements(elements, &config());
        assert_eq!(survivors.len(), 5);
        assert!(survivors.iter().all(|e| e.text != "Ticker"));
    }

    #[test]
    fn test_small_elements_dropped() {
        let elements = vec![
            element([0, 0, 19, 100], "narrow", &["Link"]),
            element([0, 0, 100, 19], "short", &["Link"]),
            element([0, 0, 22, 22], "small area", &["Link"]),
            element([0, 0, 25, 20], "ok", &["Link"]),
        ];
        let survivors = filter_elements(elements, &config());
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].text, "ok");
    }

    #[test]
    fn test_long_text_dropped() {
        let elements = vec![
            element([0, 0, 100, 100], &"x".repeat(301), &["Text"]),
            element([0, 0, 100, 100], &vec!["w"; 61].join(" "), &["Text"]),
            element([0, 0, 100, 100], &"y".repeat(300), &["Text"]),
        ];
        let survivors = filter_elements(elements, &config());
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].text.len(), 300);
    }

    #[test]
    fn test_empty_types_dropped() {
        let elements = vec![element([0, 0, 100, 100], "untyped", &[])];
        assert!(filter_elements(elements, &config()).is_empty());
    }

    #[test]
    fn test_stats_counters() {
        let mut stats = FilterStats::default();
        stats.structural_rejections = 2;
        stats.record_rejection(PageRejection::TinyBoxes);
        stats.record_rejection(PageRejection::TinyBoxes);
        stats.record_rejection(PageRejection::TooFewElements(3));
        assert_eq!(stats.quality_rejections["tiny_boxes"], 2);
        assert_eq!(stats.pages_rejected(), 5);
    }
}
