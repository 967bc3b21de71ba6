//! Image leveling: rotate so two chosen points share a row.
//!
//! The canvas grows to hold the whole rotated image; uncovered pixels are
//! black. Both images of a sample must go through the same
//! [`LevelingTransform`] so they stay registered.

use fieldgrid_core::{warp_rgb, Corner, Homography, RgbImage, RgbImageView};
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LevelError {
    #[error("leveling points coincide at {0}")]
    CoincidentPoints(Corner),
    #[error("image is empty ({width}x{height})")]
    EmptyImage { width: usize, height: usize },
    #[error("leveling transform is not invertible")]
    Singular,
}

/// Rotation plus canvas growth shared by both images of a sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelingTransform {
    /// Source pixel → leveled pixel.
    pub homography: Homography,
    pub out_width: usize,
    pub out_height: usize,
    pub angle_deg: f64,
}

/// Angle (degrees) that brings the segment `p0 → p1` onto a horizontal line.
pub fn leveling_angle(p0: Corner, p1: Corner) -> Result<f64, LevelError> {
    let dx = f64::from(p1.x - p0.x);
    let dy = f64::from(p1.y - p0.y);
    let dist = dx.hypot(dy);
    if dist == 0.0 {
        return Err(LevelError::CoincidentPoints(p0));
    }
    let angle = (dx / dist).acos().to_degrees();
    Ok(if p0.y < p1.y { angle } else { -angle })
}

#[cfg_attr(feature = "tracing", instrument(level = "debug"))]
pub fn leveling_transform(
    p0: Corner,
    p1: Corner,
    width: usize,
    height: usize,
) -> Result<LevelingTransform, LevelError> {
    if width == 0 || height == 0 {
        return Err(LevelError::EmptyImage { width, height });
    }
    let angle_deg = leveling_angle(p0, p1)?;

    let (w, h) = (width as f64, height as f64);
    let center = Point2::new(w / 2.0, h / 2.0);
    let rotation = Homography::rotation_about(center, angle_deg, 1.0);

    let cos = rotation.h[(0, 0)].abs();
    let sin = rotation.h[(0, 1)].abs();
    let out_width = (h * sin + w * cos) as usize;
    let out_height = (h * cos + w * sin) as usize;

    let homography = rotation.then_translate(
        out_width as f64 / 2.0 - center.x,
        out_height as f64 / 2.0 - center.y,
    );
    log::debug!("leveling by {angle_deg:.3} deg: {width}x{height} -> {out_width}x{out_height}");

    Ok(LevelingTransform {
        homography,
        out_width,
        out_height,
        angle_deg,
    })
}

impl LevelingTransform {
    /// Where a source pixel lands after leveling.
    pub fn map_point(&self, p: Point2<f64>) -> Point2<f64> {
        self.homography.apply(p)
    }

    pub fn apply(&self, src: &RgbImageView<'_>) -> Result<RgbImage, LevelError> {
        let inv = self.homography.inverse().ok_or(LevelError::Singular)?;
        Ok(warp_rgb(src, inv, self.out_width, self.out_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn chosen_points_end_on_one_row() {
        for (p0, p1) in [
            (Corner::new(30, 40), Corner::new(250, 90)),
            (Corner::new(30, 140), Corner::new(250, 60)),
            (Corner::new(200, 10), Corner::new(20, 30)),
        ] {
            let t = leveling_transform(p0, p1, 320, 200).unwrap();
            let a = t.map_point(Point2::new(f64::from(p0.x), f64::from(p0.y)));
            let b = t.map_point(Point2::new(f64::from(p1.x), f64::from(p1.y)));
            assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn angle_sign_follows_first_point() {
        let down = leveling_angle(Corner::new(0, 0), Corner::new(10, 10)).unwrap();
        assert_abs_diff_eq!(down, 45.0, epsilon = 1e-12);
        let up = leveling_angle(Corner::new(0, 10), Corner::new(10, 0)).unwrap();
        assert_abs_diff_eq!(up, -45.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            leveling_angle(Corner::new(5, 5), Corner::new(9, 5)).unwrap(),
            0.0
        );
    }

    #[test]
    fn quarter_turn_swaps_canvas() {
        let t = leveling_transform(Corner::new(0, 0), Corner::new(0, 10), 40, 20).unwrap();
        assert_abs_diff_eq!(t.angle_deg, 90.0, epsilon = 1e-12);
        assert_eq!((t.out_width, t.out_height), (20, 40));
    }

    #[test]
    fn level_points_leave_image_untouched() {
        let mut img = RgbImage::new(6, 4);
        for (i, px) in img.data.chunks_exact_mut(3).enumerate() {
            px.copy_from_slice(&[i as u8, 100, 200]);
        }
        let t = leveling_transform(Corner::new(1, 1), Corner::new(5, 1), 6, 4).unwrap();
        assert_eq!((t.out_width, t.out_height), (6, 4));
        let out = t.apply(&img.view()).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn coincident_points_fail() {
        assert_eq!(
            leveling_transform(Corner::new(3, 3), Corner::new(3, 3), 10, 10).unwrap_err(),
            LevelError::CoincidentPoints(Corner::new(3, 3))
        );
    }
}
