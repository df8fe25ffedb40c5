//! Geometric primitives for annotation boxes.
//!
//! Boxes cross two coordinate systems: integer pixel space of the screenshot
//! and the unit square used in prompts and answers. Everything here is pure;
//! operations that need randomness take the RNG as an argument.

use rand::Rng;

/// Image or viewport dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Size {
    /// Create a new size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The unit square, used for boxes that are already normalized.
    pub fn unit() -> Self {
        Self::new(1, 1)
    }

    /// Total pixel area.
    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    /// Whether the image is wider than it is tall.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned box in corner form `(x1, y1, x2, y2)`.
///
/// # Examples
///
/// ```
/// use ui_corpus::geometry::BBox;
///
/// let bbox = BBox::new(10.0, 20.0, 110.0, 70.0);
/// assert_eq!(bbox.width(), 100.0);
/// assert_eq!(bbox.height(), 50.0);
/// assert_eq!(bbox.area(), 5000.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    /// Left edge
    pub x1: f64,
    /// Top edge
    pub y1: f64,
    /// Right edge
    pub x2: f64,
    /// Bottom edge
    pub y2: f64,
}

impl BBox {
    /// Create a box from its corners.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a box from integer pixel corners.
    pub fn from_pixels(coords: [i64; 4]) -> Self {
        Self::new(
            coords[0] as f64,
            coords[1] as f64,
            coords[2] as f64,
            coords[3] as f64,
        )
    }

    /// Corners as an array.
    pub fn to_array(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Horizontal extent.
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Vertical extent.
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Area of the box.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Width divided by height.
    ///
    /// Returns `None` for zero-height boxes.
    pub fn aspect_ratio(&self) -> Option<f64> {
        let h = self.height();
        if h == 0.0 {
            None
        } else {
            Some(self.width() / h)
        }
    }
}

/// A box in center form `(cx, cy, w, h)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterBox {
    /// Center x
    pub cx: f64,
    /// Center y
    pub cy: f64,
    /// Width
    pub w: f64,
    /// Height
    pub h: f64,
}

/// How many decimal digits to keep when printing coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// Always the same number of digits
    Fixed(u32),
    /// 2 to 4 digits, drawn independently for every coordinate.
    ///
    /// Keeps the model from latching onto one coordinate "signature".
    Random,
}

impl Default for Precision {
    fn default() -> Self {
        Precision::Fixed(4)
    }
}

impl Precision {
    fn digits<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        match self {
            Precision::Fixed(d) => *d,
            Precision::Random => rng.gen_range(2..=4),
        }
    }
}

/// Check that a box lies inside an image of the given size.
///
/// # Examples
///
/// ```
/// use ui_corpus::geometry::{is_valid_box, BBox, Size};
///
/// let size = Size::new(100, 50);
/// assert!(is_valid_box(&BBox::new(0.0, 0.0, 100.0, 50.0), size));
/// assert!(!is_valid_box(&BBox::new(10.0, 0.0, 5.0, 50.0), size));
/// assert!(!is_valid_box(&BBox::new(0.0, 0.0, 101.0, 50.0), size));
/// ```
pub fn is_valid_box(bbox: &BBox, size: Size) -> bool {
    let (w, h) = (size.width as f64, size.height as f64);
    0.0 <= bbox.x1 && bbox.x1 <= bbox.x2 && bbox.x2 <= w && 0.0 <= bbox.y1 && bbox.y1 <= bbox.y2 && bbox.y2 <= h
}

/// Scale a pixel box into the unit square.
pub fn normalize_box(bbox: &BBox, size: Size) -> BBox {
    let (w, h) = (size.width as f64, size.height as f64);
    BBox::new(bbox.x1 / w, bbox.y1 / h, bbox.x2 / w, bbox.y2 / h)
}

/// Scale a unit-square box back to pixels, rounding to the nearest integer.
pub fn denormalize_box(bbox: &BBox, size: Size) -> BBox {
    let (w, h) = (size.width as f64, size.height as f64);
    BBox::new(
        (bbox.x1 * w).round(),
        (bbox.y1 * h).round(),
        (bbox.x2 * w).round(),
        (bbox.y2 * h).round(),
    )
}

/// Convert `(x1, y1, x2, y2)` to `(cx, cy, w, h)`.
pub fn to_center_form(bbox: &BBox) -> CenterBox {
    CenterBox {
        cx: (bbox.x1 + bbox.x2) / 2.0,
        cy: (bbox.y1 + bbox.y2) / 2.0,
        w: bbox.x2 - bbox.x1,
        h: bbox.y2 - bbox.y1,
    }
}

/// Convert `(cx, cy, w, h)` back to `(x1, y1, x2, y2)`.
pub fn to_corner_form(center: &CenterBox) -> BBox {
    BBox::new(
        center.cx - center.w / 2.0,
        center.cy - center.h / 2.0,
        center.cx + center.w / 2.0,
        center.cy + center.h / 2.0,
    )
}

/// Convert `(x0, y0, w, h)` to corner form.
pub fn xywh_to_corners(x0: f64, y0: f64, w: f64, h: f64) -> BBox {
    BBox::new(x0, y0, x0 + w, y0 + h)
}

/// Round a value to `digits` decimal places.
pub fn round_to(value: f64, digits: u32) -> f64 {
    let scale = 10f64.powi(digits as i32);
    (value * scale).round() / scale
}

/// Round each coordinate of a box.
///
/// With [`Precision::Random`] every coordinate gets its own digit count.
pub fn round_coords<R: Rng + ?Sized>(bbox: &BBox, precision: Precision, rng: &mut R) -> BBox {
    BBox::new(
        round_to(bbox.x1, precision.digits(rng)),
        round_to(bbox.y1, precision.digits(rng)),
        round_to(bbox.x2, precision.digits(rng)),
        round_to(bbox.y2, precision.digits(rng)),
    )
}

/// Center of the box, rounded.
pub fn center_point<R: Rng + ?Sized>(bbox: &BBox, precision: Precision, rng: &mut R) -> Point {
    let c = to_center_form(bbox);
    Point::new(round_to(c.cx, precision.digits(rng)), round_to(c.cy, precision.digits(rng)))
}

/// Draw a point inside the box shrunk by `margin_ratio` around its center.
///
/// Offsets are uniform in `[-0.5, 0.5) * (1 - margin_ratio) * extent` on each axis.
pub fn sample_point_in_box<R: Rng + ?Sized>(
    bbox: &BBox,
    margin_ratio: f64,
    precision: Precision,
    rng: &mut R,
) -> Point {
    let c = to_center_form(bbox);
    let x_offset = (rng.gen::<f64>() - 0.5) * c.w * (1.0 - margin_ratio);
    let y_offset = (rng.gen::<f64>() - 0.5) * c.h * (1.0 - margin_ratio);
    Point::new(
        round_to(c.cx + x_offset, precision.digits(rng)),
        round_to(c.cy + y_offset, precision.digits(rng)),
    )
}

/// Print a coordinate the way the training prompts expect.
///
/// Integral values keep a trailing `.0` so `1` prints as `1.0`.
///
/// # Examples
///
/// ```
/// use ui_corpus::geometry::format_coord;
///
/// assert_eq!(format_coord(0.5), "0.5");
/// assert_eq!(format_coord(1.0), "1.0");
/// assert_eq!(format_coord(0.1234), "0.1234");
/// ```
pub fn format_coord(value: f64) -> String {
    let s = format!("{}", value);
    if s.contains('.') || s.contains('e') || s.contains("inf") || s.contains("NaN") {
        s
    } else {
        format!("{}.0", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_is_valid_box_edges() {
        let size = Size::new(1920, 1080);
        assert!(is_valid_box(&BBox::new(0.0, 0.0, 0.0, 0.0), size));
        assert!(is_valid_box(&BBox::new(0.0, 0.0, 1920.0, 1080.0), size));
        assert!(!is_valid_box(&BBox::new(-1.0, 0.0, 10.0, 10.0), size));
        assert!(!is_valid_box(&BBox::new(0.0, 20.0, 10.0, 10.0), size));
        assert!(!is_valid_box(&BBox::new(0.0, 0.0, 10.0, 1081.0), size));
    }

    #[test]
    fn test_normalize_box() {
        let bbox = normalize_box(&BBox::new(96.0, 54.0, 960.0, 540.0), Size::new(1920, 1080));
        assert_eq!(bbox, BBox::new(0.05, 0.05, 0.5, 0.5));
    }

    #[test]
    fn test_denormalize_rounds_to_int() {
        let bbox = denormalize_box(&BBox::new(0.33333, 0.5, 0.66666, 1.0), Size::new(100, 10));
        assert_eq!(bbox, BBox::new(33.0, 5.0, 67.0, 10.0));
    }

    #[test]
    fn test_center_form_roundtrip() {
        let bbox = BBox::new(10.0, 20.0, 31.0, 45.0);
        let center = to_center_form(&bbox);
        assert_eq!(center.cx, 20.5);
        assert_eq!(center.cy, 32.5);
        assert_eq!(center.w, 21.0);
        assert_eq!(center.h, 25.0);
        assert_eq!(to_corner_form(&center), bbox);
    }

    #[test]
    fn test_xywh_to_corners() {
        assert_eq!(xywh_to_corners(5.0, 5.0, 10.0, 20.0), BBox::new(5.0, 5.0, 15.0, 25.0));
    }

    #[test]
    fn test_round_coords_fixed() {
        let mut rng = StdRng::seed_from_u64(0);
        let rounded = round_coords(&BBox::new(0.123456, 0.5, 0.99999, 0.00004), Precision::Fixed(4), &mut rng);
        assert_eq!(rounded, BBox::new(0.1235, 0.5, 1.0, 0.0));
    }

    #[test]
    fn test_round_coords_random_digits_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let bbox = BBox::new(0.123456, 0.654321, 0.777777, 0.888888);
        for _ in 0..50 {
            let rounded = round_coords(&bbox, Precision::Random, &mut rng);
            for (orig, r) in bbox.to_array().iter().zip(rounded.to_array()) {
                assert!((orig - r).abs() <= 0.005 + 1e-12);
                let digits = format_coord(r).split('.').nth(1).map(|d| d.len()).unwrap_or(0);
                assert!(digits <= 4);
            }
        }
    }

    #[test]
    fn test_sample_point_stays_in_shrunk_box() {
        let mut rng = StdRng::seed_from_u64(42);
        let bbox = BBox::new(0.2, 0.4, 0.6, 0.8);
        for _ in 0..200 {
            let p = sample_point_in_box(&bbox, 0.3, Precision::Fixed(6), &mut rng);
            assert!(p.x >= 0.4 - 0.14 - 1e-6 && p.x <= 0.4 + 0.14 + 1e-6);
            assert!(p.y >= 0.6 - 0.14 - 1e-6 && p.y <= 0.6 + 0.14 + 1e-6);
        }
    }

    #[test]
    fn test_center_point_fixed() {
        let mut rng = StdRng::seed_from_u64(1);
        let p = center_point(&BBox::new(0.1, 0.2, 0.3, 0.4), Precision::Fixed(4), &mut rng);
        assert_eq!(p, Point::new(0.2, 0.3));
    }

    #[test]
    fn test_aspect_ratio() {
        assert_eq!(BBox::new(0.0, 0.0, 500.0, 1.0).aspect_ratio(), Some(500.0));
        assert_eq!(BBox::new(0.0, 0.0, 5.0, 0.0).aspect_ratio(), None);
    }

    #[test]
    fn test_format_coord() {
        assert_eq!(format_coord(0.0), "0.0");
        assert_eq!(format_coord(0.25), "0.25");
        assert_eq!(format_coord(12.0), "12.0");
    }
}
