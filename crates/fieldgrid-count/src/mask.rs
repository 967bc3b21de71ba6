use crate::hsv::{rgb_to_hsv, HsvRange};
use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};
use serde::{Deserialize, Serialize};

pub const FOREGROUND: u8 = 255;

/// Foreground mask: 255 where the pixel falls outside the background range.
pub fn foreground_mask(img: &RgbImage, background: &HsvRange) -> GrayImage {
    let mut mask = GrayImage::new(img.width(), img.height());
    for (x, y, px) in img.enumerate_pixels() {
        if !background.contains(rgb_to_hsv(px.0)) {
            mask.put_pixel(x, y, Luma([FOREGROUND]));
        }
    }
    mask
}

/// Opening then closing with the 3×3 cross; iteration counts are the number
/// of times the cross is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphologyParams {
    pub open_iterations: u8,
    pub close_iterations: u8,
}

impl Default for MorphologyParams {
    fn default() -> Self {
        Self {
            open_iterations: 1,
            close_iterations: 2,
        }
    }
}

/// Remove speckle, then bridge small gaps.
///
/// `k` cross iterations equal a single pass with an L1 ball of radius `k`.
pub fn clean_mask(mask: &GrayImage, params: &MorphologyParams) -> GrayImage {
    let opened = if params.open_iterations > 0 {
        open(mask, Norm::L1, params.open_iterations)
    } else {
        mask.clone()
    };
    if params.close_iterations > 0 {
        close(&opened, Norm::L1, params.close_iterations)
    } else {
        opened
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn square_mask(size: u32, x0: u32, y0: u32, side: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            let inside = (x0..x0 + side).contains(&x) && (y0..y0 + side).contains(&y);
            Luma([if inside { FOREGROUND } else { 0 }])
        })
    }

    fn lit(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p.0[0] == FOREGROUND).count()
    }

    #[test]
    fn mask_marks_bright_pixels() {
        let mut img = RgbImage::from_pixel(4, 4, Rgb([5, 5, 5]));
        img.put_pixel(1, 2, Rgb([40, 220, 60]));
        let mask = foreground_mask(&img, &HsvRange::default());
        assert_eq!(lit(&mask), 1);
        assert_eq!(mask.get_pixel(1, 2).0[0], FOREGROUND);
    }

    #[test]
    fn opening_removes_speckle() {
        let mut mask = GrayImage::new(20, 20);
        mask.put_pixel(5, 5, Luma([FOREGROUND]));
        mask.put_pixel(12, 9, Luma([FOREGROUND]));
        mask.put_pixel(13, 9, Luma([FOREGROUND]));
        assert_eq!(lit(&clean_mask(&mask, &MorphologyParams::default())), 0);
    }

    #[test]
    fn square_loses_only_its_corners() {
        let mask = square_mask(30, 8, 8, 8);
        let cleaned = clean_mask(&mask, &MorphologyParams::default());
        assert_eq!(lit(&cleaned), 64 - 4);
        assert_eq!(cleaned.get_pixel(8, 8).0[0], 0);
        assert_eq!(cleaned.get_pixel(9, 8).0[0], FOREGROUND);
    }

    #[test]
    fn zero_iterations_is_identity() {
        let mask = square_mask(10, 1, 1, 3);
        let params = MorphologyParams {
            open_iterations: 0,
            close_iterations: 0,
        };
        assert_eq!(clean_mask(&mask, &params), mask);
    }
}
