//! Screenshot → normalized image patches for the vision encoder.
//!
//! The image is resized to 896×896 (bicubic), normalized per channel with the
//! CLIP statistics and laid out channel-first. It is then cut into four
//! 448×448 windows (row-major, stride 448) and one 448×448 global view.

use crate::error::Result;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use rayon::prelude::*;
use std::path::Path;

/// Side of the resized input image.
pub const INPUT_SIZE: u32 = 896;
/// Side of one patch.
pub const PATCH_SIZE: u32 = 448;
/// Patches per image: four windows plus the global view.
pub const NUM_PATCHES: usize = 5;

/// Per-channel mean of the CLIP normalization.
pub const CLIP_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
/// Per-channel standard deviation of the CLIP normalization.
pub const CLIP_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// A normalized `3 × size × size` tensor in CHW order.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// Side length in pixels
    pub size: u32,
    /// `3 * size * size` values, channel planes one after another
    pub data: Vec<f32>,
}

impl Patch {
    /// Value at `(channel, y, x)`.
    pub fn at(&self, channel: usize, y: u32, x: u32) -> f32 {
        let side = self.size as usize;
        self.data[channel * side * side + y as usize * side + x as usize]
    }
}

/// Convert an RGB image to a normalized CHW buffer.
pub fn image_to_chw(image: &RgbImage, mean: &[f32; 3], std: &[f32; 3]) -> Vec<f32> {
    let num_pixels = (image.width() * image.height()) as usize;
    let mut output = vec![0.0f32; num_pixels * 3];
    let (r_plane, rest) = output.split_at_mut(num_pixels);
    let (g_plane, b_plane) = rest.split_at_mut(num_pixels);

    r_plane
        .par_iter_mut()
        .zip(g_plane.par_iter_mut())
        .zip(b_plane.par_iter_mut())
        .zip(image.as_raw().par_chunks_exact(3))
        .for_each(|(((r, g), b), px)| {
            *r = (f32::from(px[0]) / 255.0 - mean[0]) / std[0];
            *g = (f32::from(px[1]) / 255.0 - mean[1]) / std[1];
            *b = (f32::from(px[2]) / 255.0 - mean[2]) / std[2];
        });
    output
}

/// Copy a `size × size` window at `(top, left)` out of a square CHW buffer.
fn crop_chw(chw: &[f32], side: u32, top: u32, left: u32, size: u32) -> Vec<f32> {
    let (side, top, left, size) = (side as usize, top as usize, left as usize, size as usize);
    let mut out = Vec::with_capacity(3 * size * size);
    for channel in 0..3 {
        let plane = &chw[channel * side * side..(channel + 1) * side * side];
        for y in top..top + size {
            out.extend_from_slice(&plane[y * side + left..y * side + left + size]);
        }
    }
    out
}

/// Split an already decoded image into the five patches.
pub fn patches_from_image(image: &DynamicImage) -> Vec<Patch> {
    let resized = image
        .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom)
        .to_rgb8();
    let chw = image_to_chw(&resized, &CLIP_MEAN, &CLIP_STD);

    let steps = INPUT_SIZE / PATCH_SIZE;
    let mut patches = Vec::with_capacity(NUM_PATCHES);
    for row in 0..steps {
        for col in 0..steps {
            patches.push(Patch {
                size: PATCH_SIZE,
                data: crop_chw(&chw, INPUT_SIZE, row * PATCH_SIZE, col * PATCH_SIZE, PATCH_SIZE),
            });
        }
    }

    let global = image::imageops::resize(&resized, PATCH_SIZE, PATCH_SIZE, FilterType::CatmullRom);
    patches.push(Patch {
        size: PATCH_SIZE,
        data: image_to_chw(&global, &CLIP_MEAN, &CLIP_STD),
    });
    patches
}

/// Load an image file and split it into patches.
pub fn load_patches(path: impl AsRef<Path>) -> Result<Vec<Patch>> {
    let image = image::open(path.as_ref())?;
    Ok(patches_from_image(&image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_chw_layout_and_normalization() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 255, 0]));
        let chw = image_to_chw(&img, &[0.0; 3], &[1.0; 3]);
        assert_eq!(chw, vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_five_patches_of_expected_shape() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 200, Rgb([128, 128, 128])));
        let patches = patches_from_image(&img);
        assert_eq!(patches.len(), NUM_PATCHES);
        for patch in &patches {
            assert_eq!(patch.size, PATCH_SIZE);
            assert_eq!(patch.data.len(), 3 * 448 * 448);
        }
    }

    #[test]
    fn test_windows_are_row_major() {
        // Left half black, right half white
        let img = RgbImage::from_fn(896, 896, |x, _| if x < 448 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) });
        let patches = patches_from_image(&DynamicImage::ImageRgb8(img));
        let black = (0.0 - CLIP_MEAN[0]) / CLIP_STD[0];
        let white = (1.0 - CLIP_MEAN[0]) / CLIP_STD[0];
        assert!((patches[0].at(0, 10, 10) - black).abs() < 1e-4);
        assert!((patches[1].at(0, 10, 10) - white).abs() < 1e-4);
        assert!((patches[2].at(0, 400, 10) - black).abs() < 1e-4);
        assert!((patches[3].at(0, 400, 400) - white).abs() < 1e-4);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        assert!(load_patches("/nonexistent/screen.png").is_err());
    }
}
