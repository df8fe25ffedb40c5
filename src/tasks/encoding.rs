//! Coordinate encodings shared by all box-bearing tasks.
//!
//! A box in the unit square is printed either as its center point `(x, y)`
//! or as the full box `(x1, y1, x2, y2)`. One item uses one encoding for all
//! of its turns, and its prompt announces the choice with a suffix.

use crate::geometry::{center_point, format_coord, round_coords, sample_point_in_box, BBox, Point, Precision};
use rand::Rng;

/// Margin used when sampling a point inside a box for referring questions.
pub const REFERRING_MARGIN: f64 = 0.3;

/// How coordinates are written into questions and answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordFormat {
    /// `(x, y)`
    Point,
    /// `(x1, y1, x2, y2)`
    Bbox,
}

impl CoordFormat {
    /// Both formats.
    pub const ALL: [CoordFormat; 2] = [CoordFormat::Point, CoordFormat::Bbox];

    /// Pick a format uniformly.
    pub fn choose<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            CoordFormat::Point
        } else {
            CoordFormat::Bbox
        }
    }

    /// Prompt suffix announcing the format.
    pub fn suffix(&self) -> &'static str {
        match self {
            CoordFormat::Point => " (with point (x, y))",
            CoordFormat::Bbox => " (with bbox (x1, x2, y1, y2))",
        }
    }
}

/// Print a normalized box in the given format.
///
/// Exact encodings (`jitter == false`) use four digits and the box center.
/// Jittered encodings use 2 to 4 random digits per coordinate and, for points,
/// a random point inside the box shrunk by [`REFERRING_MARGIN`].
pub fn format_box<R: Rng + ?Sized>(format: CoordFormat, bbox: &BBox, jitter: bool, rng: &mut R) -> String {
    match (format, jitter) {
        (CoordFormat::Bbox, false) => format_tuple(&round_coords(bbox, Precision::Fixed(4), rng).to_array()),
        (CoordFormat::Bbox, true) => format_tuple(&round_coords(bbox, Precision::Random, rng).to_array()),
        (CoordFormat::Point, false) => format_point(&center_point(bbox, Precision::Fixed(4), rng)),
        (CoordFormat::Point, true) => {
            format_point(&sample_point_in_box(bbox, REFERRING_MARGIN, Precision::Random, rng))
        },
    }
}

/// Insert the format suffix before the last character of `prompt`.
///
/// # Examples
///
/// ```
/// use ui_corpus::tasks::encoding::{add_encoding_suffix, CoordFormat};
///
/// assert_eq!(
///     add_encoding_suffix("Locate the element.", CoordFormat::Point),
///     "Locate the element (with point (x, y))."
/// );
/// ```
pub fn add_encoding_suffix(prompt: &str, format: CoordFormat) -> String {
    match prompt.char_indices().last() {
        Some((idx, _)) => format!("{}{}{}", &prompt[..idx], format.suffix(), &prompt[idx..]),
        None => format.suffix().to_string(),
    }
}

/// `(a, b, ...)` with coordinates printed like floats.
pub fn format_tuple(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format_coord(*v)).collect();
    format!("({})", parts.join(", "))
}

fn format_point(point: &Point) -> String {
    format_tuple(&[point.x, point.y])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn parse_tuple(s: &str) -> Vec<f64> {
        s.trim_start_matches('(')
            .trim_end_matches(')')
            .split(", ")
            .map(|v| v.parse().unwrap())
            .collect()
    }

    #[test]
    fn test_exact_bbox_four_digits() {
        let mut rng = StdRng::seed_from_u64(1);
        let bbox = BBox::new(0.123456, 0.5, 0.75, 1.0);
        assert_eq!(format_box(CoordFormat::Bbox, &bbox, false, &mut rng), "(0.1235, 0.5, 0.75, 1.0)");
    }

    #[test]
    fn test_exact_point_is_center() {
        let mut rng = StdRng::seed_from_u64(1);
        let bbox = BBox::new(0.1, 0.2, 0.3, 0.4);
        assert_eq!(format_box(CoordFormat::Point, &bbox, false, &mut rng), "(0.2, 0.3)");
    }

    #[test]
    fn test_jittered_point_stays_in_shrunk_box() {
        let mut rng = StdRng::seed_from_u64(7);
        let bbox = BBox::new(0.2, 0.2, 0.6, 0.4);
        for _ in 0..200 {
            let p = parse_tuple(&format_box(CoordFormat::Point, &bbox, true, &mut rng));
            // Half-extent of the shrunk box plus rounding slack of two digits
            assert!((p[0] - 0.4).abs() <= 0.2 * 0.7 + 0.005);
            assert!((p[1] - 0.3).abs() <= 0.1 * 0.7 + 0.005);
        }
    }

    #[test]
    fn test_jittered_bbox_has_four_values() {
        let mut rng = StdRng::seed_from_u64(3);
        let values = parse_tuple(&format_box(CoordFormat::Bbox, &BBox::new(0.11111, 0.2, 0.3, 0.4), true, &mut rng));
        assert_eq!(values.len(), 4);
        assert!((values[0] - 0.11111).abs() < 0.006);
    }

    #[test]
    fn test_suffix_before_final_punctuation() {
        assert_eq!(
            add_encoding_suffix("Where is it?", CoordFormat::Bbox),
            "Where is it (with bbox (x1, x2, y1, y2))?"
        );
        assert_eq!(add_encoding_suffix("", CoordFormat::Point), " (with point (x, y))");
    }

    #[test]
    fn test_format_tuple() {
        assert_eq!(format_tuple(&[0.0, 1.0]), "(0.0, 1.0)");
    }
}
