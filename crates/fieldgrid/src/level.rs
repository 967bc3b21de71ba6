//! Leveling image files on disk.

use std::path::{Path, PathBuf};

use fieldgrid_calib::leveling_transform;
use fieldgrid_core::Corner;
use image::RgbImage;

use crate::pipeline::PipelineError;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Copy an `image` buffer into the core RGB layout.
pub fn to_core_rgb(img: &RgbImage) -> fieldgrid_core::RgbImage {
    fieldgrid_core::RgbImage {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw().clone(),
    }
}

/// Move a core RGB buffer back into an `image` buffer.
pub fn from_core_rgb(img: fieldgrid_core::RgbImage) -> Option<RgbImage> {
    RgbImage::from_raw(img.width as u32, img.height as u32, img.data)
}

/// Level one decoded image so that `from` and `to` end on the same row.
pub fn level_image(img: &RgbImage, from: Corner, to: Corner) -> Result<RgbImage, PipelineError> {
    let core = to_core_rgb(img);
    let transform = leveling_transform(from, to, core.width, core.height)?;
    let leveled = transform.apply(&core.view())?;
    let (w, h) = (leveled.width, leveled.height);
    from_core_rgb(leveled).ok_or(PipelineError::BufferSize {
        width: w,
        height: h,
    })
}

/// Output name for a leveled image: `BF.tif` → `Zbehandlet - Rotated BF image.tif`.
pub fn leveled_file_name(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("Zbehandlet - Rotated {stem} image");
    if let Some(ext) = input.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    PathBuf::from(name)
}

/// Level every image with the same two points and write the results into
/// `out_dir` (or next to each input). Returns the written paths.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip(inputs, out_dir)))]
pub fn level_files(
    inputs: &[PathBuf],
    from: Corner,
    to: Corner,
    out_dir: Option<&Path>,
) -> Result<Vec<PathBuf>, PipelineError> {
    for input in inputs {
        if !input.is_file() {
            return Err(PipelineError::MissingInput(input.clone()));
        }
    }

    let mut written = Vec::with_capacity(inputs.len());
    for input in inputs {
        let img = image::open(input)
            .map_err(|source| PipelineError::ImageDecode {
                path: input.clone(),
                source,
            })?
            .to_rgb8();
        let leveled = level_image(&img, from, to)?;

        let dir = match out_dir {
            Some(d) => d.to_path_buf(),
            None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        let out = dir.join(leveled_file_name(input));
        leveled
            .save(&out)
            .map_err(|source| PipelineError::ImageEncode {
                path: out.clone(),
                source,
            })?;
        log::info!("leveled image saved as {}", out.display());
        written.push(out);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn names_follow_lab_convention() {
        assert_eq!(
            leveled_file_name(Path::new("/data/s1/BF.tif")),
            PathBuf::from("Zbehandlet - Rotated BF image.tif")
        );
        assert_eq!(
            leveled_file_name(Path::new("UV.tif")),
            PathBuf::from(crate::io::DEFAULT_FLUORESCENCE_IMAGE)
        );
    }

    #[test]
    fn core_round_trip_keeps_pixels() {
        let img = RgbImage::from_fn(5, 3, |x, y| Rgb([x as u8, y as u8, 7]));
        let back = from_core_rgb(to_core_rgb(&img)).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn tilted_line_becomes_horizontal() {
        // A bright diagonal segment from (10, 10) to (50, 30).
        let mut img = RgbImage::new(64, 48);
        for i in 0..=40 {
            let x = 10 + i;
            let y = 10 + i / 2;
            img.put_pixel(x, y, Rgb([255, 255, 255]));
        }
        let leveled = level_image(&img, Corner::new(10, 10), Corner::new(50, 30)).unwrap();
        assert!(leveled.width() > 64 && leveled.height() > 48);

        let bright_rows: Vec<u32> = (0..leveled.height())
            .filter(|&y| (0..leveled.width()).any(|x| leveled.get_pixel(x, y).0[0] > 120))
            .collect();
        let spread = bright_rows.last().unwrap() - bright_rows.first().unwrap();
        assert!(spread <= 2, "rows {bright_rows:?}");
    }

    #[test]
    fn missing_file_is_reported_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let err = level_files(
            &[dir.path().join("BF.tif")],
            Corner::new(0, 0),
            Corner::new(10, 1),
            Some(dir.path()),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput(_)));
    }
}
