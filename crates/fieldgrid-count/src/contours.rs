use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::point::Point;

/// Outer borders that are not nested inside another region's hole.
pub fn external_contours(mask: &GrayImage) -> Vec<Contour<i32>> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .collect()
}

/// Shoelace area of the closed polygon through `points`.
///
/// The polygon runs through pixel centres, so a lone pixel or a one-pixel
/// line has zero area.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, q)| i64::from(p.x) * i64::from(q.y) - i64::from(q.x) * i64::from(p.y))
        .sum();
    twice.abs() as f64 / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn fill(mask: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }

    #[test]
    fn square_area_runs_through_pixel_centres() {
        let pts = [
            Point::new(0, 0),
            Point::new(4, 0),
            Point::new(4, 4),
            Point::new(0, 4),
        ];
        assert_eq!(polygon_area(&pts), 16.0);
        assert_eq!(polygon_area(&pts[..2]), 0.0);
    }

    #[test]
    fn island_inside_hole_is_not_external() {
        let mut mask = GrayImage::new(30, 30);
        // Ring with a hole, and an island inside the hole.
        fill(&mut mask, 2, 2, 20, 20);
        for y in 6..18 {
            for x in 6..18 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
        fill(&mut mask, 10, 10, 3, 3);
        // Separate blob.
        fill(&mut mask, 25, 25, 3, 3);

        let outer = external_contours(&mask);
        assert_eq!(outer.len(), 2);
        let mut areas: Vec<f64> = outer.iter().map(|c| polygon_area(&c.points)).collect();
        areas.sort_by(f64::total_cmp);
        assert_eq!(areas, vec![4.0, 361.0]);
    }

    #[test]
    fn empty_mask_has_no_contours() {
        assert!(external_contours(&GrayImage::new(8, 8)).is_empty());
    }
}
