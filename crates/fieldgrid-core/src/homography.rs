use crate::image::{sample_bilinear_rgb, RgbImage, RgbImageView};
use nalgebra::{Matrix3, Point2, Vector3};

/// Projective 2D transform `p_dst ~ H * p_src`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    /// Rotation by `angle_deg` about `center` with isotropic `scale`.
    ///
    /// Positive angles turn the image counter-clockwise as displayed (y axis
    /// pointing down).
    pub fn rotation_about(center: Point2<f64>, angle_deg: f64, scale: f64) -> Self {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        let alpha = scale * cos;
        let beta = scale * sin;
        Self::new(Matrix3::new(
            alpha,
            beta,
            (1.0 - alpha) * center.x - beta * center.y,
            -beta,
            alpha,
            beta * center.x + (1.0 - alpha) * center.y,
            0.0,
            0.0,
            1.0,
        ))
    }

    /// Append a translation applied after this transform.
    pub fn then_translate(&self, dx: f64, dy: f64) -> Self {
        let t = Matrix3::new(1.0, 0.0, dx, 0.0, 1.0, dy, 0.0, 0.0, 1.0);
        Self::new(t * self.h)
    }

    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        let w = v[2];
        Point2::new(v[0] / w, v[1] / w)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

/// Warp `src` into an `out_w × out_h` canvas: every destination pixel is
/// mapped back through `h_src_from_dst` and sampled bilinearly.
pub fn warp_rgb(
    src: &RgbImageView<'_>,
    h_src_from_dst: Homography,
    out_w: usize,
    out_h: usize,
) -> RgbImage {
    let mut out = RgbImage::new(out_w, out_h);

    for y in 0..out_h {
        for x in 0..out_w {
            let ps = h_src_from_dst.apply(Point2::new(x as f64, y as f64));
            let rgb = sample_bilinear_rgb(src, ps.x as f32, ps.y as f32);
            let o = (y * out_w + x) * 3;
            out.data[o..o + 3].copy_from_slice(&rgb);
        }
    }

    out
}
