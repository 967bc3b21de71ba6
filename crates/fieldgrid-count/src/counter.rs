use crate::contours::{external_contours, polygon_area};
use crate::hsv::HsvRange;
use crate::mask::{clean_mask, foreground_mask, MorphologyParams};
use fieldgrid_core::Corner;
use image::RgbImage;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Blob area thresholds in px².
///
/// All comparisons are strict: an area equal to a threshold stays on the
/// lower side of it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaThresholds {
    /// At or below: noise.
    pub min_area: f64,
    /// Area of one cell, used to split merged blobs.
    pub average_cell_area: f64,
    /// Above: several cells merged into one blob.
    pub connected_area: f64,
    /// Above: an artifact, not counted at all.
    pub too_large_area: f64,
}

impl Default for AreaThresholds {
    fn default() -> Self {
        Self {
            min_area: 10.0,
            average_cell_area: 60.0,
            connected_area: 150.0,
            too_large_area: 200.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobVerdict {
    Noise,
    Single,
    Merged(u32),
    Artifact,
}

impl BlobVerdict {
    pub fn cells(self) -> u32 {
        match self {
            BlobVerdict::Noise | BlobVerdict::Artifact => 0,
            BlobVerdict::Single => 1,
            BlobVerdict::Merged(n) => n,
        }
    }
}

impl AreaThresholds {
    pub fn classify(&self, area: f64) -> BlobVerdict {
        if area <= self.min_area {
            BlobVerdict::Noise
        } else if area > self.too_large_area {
            BlobVerdict::Artifact
        } else if area > self.connected_area {
            BlobVerdict::Merged((area / self.average_cell_area).floor() as u32)
        } else {
            BlobVerdict::Single
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CountParamsError {
    #[error("average cell area must be positive, got {0}")]
    NonPositiveAverage(f64),
    #[error("area threshold `{name}` must be finite and non-negative, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
    #[error("background range is inverted on channel {channel}: {lower} > {upper}")]
    InvertedRange { channel: usize, lower: u8, upper: u8 },
}

/// Everything the counter needs; defaults are the lab's standard settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountParams {
    /// Pixels inside this range are background.
    pub background: HsvRange,
    pub morphology: MorphologyParams,
    pub areas: AreaThresholds,
}

impl CountParams {
    pub fn validate(&self) -> Result<(), CountParamsError> {
        let a = &self.areas;
        for (name, value) in [
            ("min_area", a.min_area),
            ("average_cell_area", a.average_cell_area),
            ("connected_area", a.connected_area),
            ("too_large_area", a.too_large_area),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CountParamsError::InvalidThreshold { name, value });
            }
        }
        if a.average_cell_area <= 0.0 {
            return Err(CountParamsError::NonPositiveAverage(a.average_cell_area));
        }
        for channel in 0..3 {
            let (lower, upper) = (self.background.lower[channel], self.background.upper[channel]);
            if lower > upper {
                return Err(CountParamsError::InvertedRange {
                    channel,
                    lower,
                    upper,
                });
            }
        }
        Ok(())
    }
}

/// One external contour and how it was counted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Blob {
    pub area: f64,
    pub verdict: BlobVerdict,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldCount {
    pub count: u32,
    pub blobs: Vec<Blob>,
}

/// Counts fluorescent cells in one field crop.
#[derive(Clone, Debug)]
pub struct CellCounter {
    params: CountParams,
}

impl CellCounter {
    pub fn new(params: CountParams) -> Result<Self, CountParamsError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &CountParams {
        &self.params
    }

    /// Cell count for a field crop. An empty crop counts 0.
    pub fn count(&self, field: &RgbImage) -> u32 {
        self.count_detailed(field).count
    }

    /// Per-blob breakdown, for inspecting a single field.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, field), fields(w = field.width(), h = field.height()))
    )]
    pub fn count_detailed(&self, field: &RgbImage) -> FieldCount {
        if field.width() == 0 || field.height() == 0 {
            return FieldCount::default();
        }
        let mask = foreground_mask(field, &self.params.background);
        let mask = clean_mask(&mask, &self.params.morphology);

        let blobs: Vec<Blob> = external_contours(&mask)
            .iter()
            .map(|c| {
                let area = polygon_area(&c.points);
                Blob {
                    area,
                    verdict: self.params.areas.classify(area),
                }
            })
            .collect();
        let count = blobs.iter().map(|b| b.verdict.cells()).sum();
        log::trace!("{} blob(s), {count} cell(s)", blobs.len());
        FieldCount { count, blobs }
    }

    /// Crop the `size × size` field at `origin` and count it.
    pub fn count_field(&self, image: &RgbImage, origin: Corner, size: u32) -> u32 {
        self.count(&crop_field(image, origin, size))
    }
}

/// `size × size` crop at `origin`, clamped to the image. Negative origins
/// clamp to zero.
pub fn crop_field(image: &RgbImage, origin: Corner, size: u32) -> RgbImage {
    let x = origin.x.max(0) as u32;
    let y = origin.y.max(0) as u32;
    image::imageops::crop_imm(image, x, y, size, size).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const CELL: Rgb<u8> = Rgb([40, 220, 60]);
    const BG: Rgb<u8> = Rgb([10, 10, 10]);

    fn field_with_squares(size: u32, squares: &[(u32, u32, u32)]) -> RgbImage {
        let mut img = RgbImage::from_pixel(size, size, BG);
        for &(x0, y0, side) in squares {
            for y in y0..y0 + side {
                for x in x0..x0 + side {
                    img.put_pixel(x, y, CELL);
                }
            }
        }
        img
    }

    fn counter() -> CellCounter {
        CellCounter::new(CountParams::default()).unwrap()
    }

    #[test]
    fn classify_is_strict_at_every_threshold() {
        let t = AreaThresholds::default();
        assert_eq!(t.classify(10.0), BlobVerdict::Noise);
        assert_eq!(t.classify(10.5), BlobVerdict::Single);
        assert_eq!(t.classify(150.0), BlobVerdict::Single);
        assert_eq!(t.classify(150.5), BlobVerdict::Merged(2));
        assert_eq!(t.classify(200.0), BlobVerdict::Merged(3));
        assert_eq!(t.classify(200.5), BlobVerdict::Artifact);
    }

    #[test]
    fn uniform_background_counts_zero() {
        assert_eq!(counter().count(&RgbImage::from_pixel(40, 40, BG)), 0);
        assert_eq!(counter().count(&RgbImage::new(40, 40)), 0);
    }

    #[test]
    fn empty_crop_counts_zero() {
        assert_eq!(counter().count(&RgbImage::new(0, 0)), 0);
        let img = RgbImage::from_pixel(20, 20, CELL);
        assert_eq!(counter().count_field(&img, Corner::new(50, 50), 10), 0);
    }

    #[test]
    fn single_cell() {
        // 8x8 square: area 47 after cleanup.
        let detail = counter().count_detailed(&field_with_squares(40, &[(10, 10, 8)]));
        assert_eq!(detail.count, 1);
        assert_eq!(detail.blobs.len(), 1);
        assert_eq!(detail.blobs[0].area, 47.0);
    }

    #[test]
    fn merged_blob_just_above_connected_threshold() {
        // 14x14 square: area 167, floor(167 / 60) = 2.
        let detail = counter().count_detailed(&field_with_squares(40, &[(10, 10, 14)]));
        assert_eq!(detail.blobs[0].area, 167.0);
        assert_eq!(detail.count, 2);
    }

    #[test]
    fn blob_above_too_large_contributes_nothing() {
        // 16x16 square: area 223 is an artifact; the 8x8 next to it still counts.
        let detail = counter().count_detailed(&field_with_squares(60, &[(5, 5, 16), (40, 40, 8)]));
        assert_eq!(detail.count, 1);
        assert!(detail
            .blobs
            .iter()
            .any(|b| b.verdict == BlobVerdict::Artifact && b.area == 223.0));
    }

    #[test]
    fn small_specks_are_noise() {
        // 4x4 square: area 7.
        let detail = counter().count_detailed(&field_with_squares(30, &[(10, 10, 4)]));
        assert_eq!(detail.count, 0);
        assert_eq!(detail.blobs[0].verdict, BlobVerdict::Noise);
    }

    #[test]
    fn crop_clamps_to_image() {
        let img = RgbImage::new(50, 40);
        let crop = crop_field(&img, Corner::new(30, 30), 30);
        assert_eq!(crop.dimensions(), (20, 10));
    }

    #[test]
    fn invalid_params_are_rejected() {
        let mut params = CountParams::default();
        params.areas.average_cell_area = 0.0;
        assert_eq!(
            CellCounter::new(params).unwrap_err(),
            CountParamsError::NonPositiveAverage(0.0)
        );

        let mut params = CountParams::default();
        params.areas.min_area = f64::NAN;
        assert!(matches!(
            params.validate(),
            Err(CountParamsError::InvalidThreshold {
                name: "min_area",
                ..
            })
        ));

        let mut params = CountParams::default();
        params.background.lower[1] = 40;
        assert!(matches!(
            params.validate(),
            Err(CountParamsError::InvertedRange { channel: 1, .. })
        ));
    }

    #[test]
    fn params_fill_defaults_from_partial_json() {
        let params: CountParams =
            serde_json::from_str(r#"{"areas": {"too_large_area": 500.0}}"#).unwrap();
        assert_eq!(params.areas.too_large_area, 500.0);
        assert_eq!(params.areas.min_area, 10.0);
        assert_eq!(params.morphology, MorphologyParams::default());
        assert_eq!(params.background, HsvRange::default());
    }
}
