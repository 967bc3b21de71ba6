//! Field boxes drawn over the fluorescence image for visual checks.

use fieldgrid_core::Corner;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

pub const BOX_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const BOX_THICKNESS: u32 = 2;

/// Draw a `size × size` box around every origin, `BOX_THICKNESS` px thick,
/// growing inward.
pub fn draw_field_boxes(image: &mut RgbImage, origins: &[Corner], size: u32) {
    for &o in origins {
        for t in 0..BOX_THICKNESS.min(size.div_ceil(2)) {
            let side = size + 1 - 2 * t;
            let inset = t as i32;
            draw_hollow_rect_mut(
                image,
                Rect::at(o.x + inset, o.y + inset).of_size(side, side),
                BOX_COLOR,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_edges_are_two_pixels_thick() {
        let mut img = RgbImage::new(40, 40);
        draw_field_boxes(&mut img, &[Corner::new(5, 5)], 20);
        assert_eq!(*img.get_pixel(5, 15), BOX_COLOR);
        assert_eq!(*img.get_pixel(6, 15), BOX_COLOR);
        assert_eq!(*img.get_pixel(7, 15), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(25, 15), BOX_COLOR);
        assert_eq!(*img.get_pixel(15, 15), Rgb([0, 0, 0]));
    }

    #[test]
    fn boxes_past_the_border_are_clipped() {
        let mut img = RgbImage::new(10, 10);
        draw_field_boxes(&mut img, &[Corner::new(6, 6), Corner::new(40, 40)], 10);
        assert_eq!(*img.get_pixel(6, 9), BOX_COLOR);
    }
}
