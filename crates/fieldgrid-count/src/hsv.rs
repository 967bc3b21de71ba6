//! 8-bit HSV conversion and range thresholding.
//!
//! Hue is stored halved (0..180) so it fits a byte; saturation and value use
//! the full 0..=255 range.

use palette::{FromColor, Srgb};
use serde::{Deserialize, Serialize};

/// `[h, s, v]` with `h` in `0..180`.
pub type Hsv = [u8; 3];

/// Convert one RGB pixel to 8-bit HSV.
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> Hsv {
    let hsv: palette::Hsv = palette::Hsv::from_color(Srgb::new(r, g, b).into_format::<f32>());
    let s = (hsv.saturation * 255.0).round().clamp(0.0, 255.0) as u8;
    let v = (hsv.value * 255.0).round().clamp(0.0, 255.0) as u8;
    // Greys have no hue.
    let h = if s == 0 {
        0
    } else {
        ((hsv.hue.into_positive_degrees() / 2.0).round() as u16 % 180) as u8
    };
    [h, s, v]
}

/// Inclusive HSV box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HsvRange {
    pub lower: Hsv,
    pub upper: Hsv,
}

impl Default for HsvRange {
    /// Near-black: the background of a fluorescence image.
    fn default() -> Self {
        Self {
            lower: [0, 0, 0],
            upper: [31, 31, 31],
        }
    }
}

impl HsvRange {
    #[inline]
    pub fn contains(&self, hsv: Hsv) -> bool {
        (0..3).all(|c| self.lower[c] <= hsv[c] && hsv[c] <= self.upper[c])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_and_greys() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 0]), [0, 0, 0]);
        assert_eq!(rgb_to_hsv([128, 128, 128]), [0, 0, 128]);
    }

    #[test]
    fn magenta_side_wraps_hue() {
        // 300 deg -> 150; a hair below 360 deg rounds up and wraps to 0.
        assert_eq!(rgb_to_hsv([255, 0, 255])[0], 150);
        assert_eq!(rgb_to_hsv([255, 0, 1])[0], 0);
    }

    #[test]
    fn default_range_is_dark_background() {
        let range = HsvRange::default();
        assert!(range.contains(rgb_to_hsv([10, 10, 10])));
        assert!(range.contains(rgb_to_hsv([31, 28, 28])));
        assert!(!range.contains(rgb_to_hsv([32, 32, 32])));
        assert!(!range.contains(rgb_to_hsv([40, 220, 60])));
    }
}
