use bit_set::BitSet;
use image::{DynamicImage, Luma};

use crate::cells::GridCoordinate;

/// Boundary shapes a grid can be cut down to, evaluated over each cell's
/// normalized [-1, 1] coordinate.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Shape {
    Rectangle,
    Circle,
    Triangle,
    Hexagon,
}

impl Shape {
    pub fn from_name(name: &str) -> Option<Shape> {
        match name {
            "rectangle" | "rect" => Some(Shape::Rectangle),
            "circle" => Some(Shape::Circle),
            "triangle" => Some(Shape::Triangle),
            "hexagon" => Some(Shape::Hexagon),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match *self {
            Shape::Rectangle => "rectangle",
            Shape::Circle => "circle",
            Shape::Triangle => "triangle",
            Shape::Hexagon => "hexagon",
        }
    }

    /// Does the normalized point survive the mask?
    pub fn contains(&self, x: f64, y: f64) -> bool {
        match *self {
            Shape::Rectangle => true,
            Shape::Circle => x * x + y * y <= 1.0,
            // An equilateral-ish triangle: apex towards row zero, base along
            // the far rows, as three half-plane tests.
            Shape::Triangle => y <= 0.95 && y >= 2.0 * x.abs() - 1.05,
            Shape::Hexagon => f64::max(x.abs(), 0.5 * x.abs() + 0.866 * y.abs()) <= 0.95,
        }
    }
}

/// A per-pixel on/off mask loaded from a grayscale image: dark pixels mask
/// the matching (row, column) off on every level.
#[derive(Debug)]
pub struct BinaryMask2D {
    mask: BitSet,
    pub width: u32,
    pub height: u32,
}

impl BinaryMask2D {
    pub fn from_image(data_image: &DynamicImage) -> BinaryMask2D {
        let gray_scale_image = data_image.to_luma8();
        let w = gray_scale_image.width();
        let h = gray_scale_image.height();
        let mut mask = BitSet::with_capacity((w * h) as usize);

        for x in 0..w {
            for y in 0..h {
                let pix: &Luma<u8> = gray_scale_image.get_pixel(x, y);
                let off = pix.0[0] < 128;
                if off {
                    mask.insert((y * w + x) as usize);
                }
            }
        }

        BinaryMask2D { mask, width: w, height: h }
    }

    /// Is the given cell masked out / turned off?
    ///
    /// Cells outside the mask's own 2d bounds are not masked.
    pub fn is_masked(&self, coord: GridCoordinate) -> bool {
        let (x, y) = (coord.column, coord.row);
        if x < self.width && y < self.height {
            self.mask.contains((y * self.width + x) as usize)
        } else {
            false
        }
    }

    /// The first (row-major) planar position the mask leaves on, if any.
    pub fn first_unmasked_coordinate(&self) -> Option<GridCoordinate> {
        let mask_size = (self.width * self.height) as usize;
        (0..mask_size)
            .position(|bit_index| !self.mask.contains(bit_index))
            .map(|i| {
                let x = i as u32 % self.width;
                let y = i as u32 / self.width;
                GridCoordinate::new(y, x, 0)
            })
    }
}

#[cfg(test)]
mod tests {

    use image::{DynamicImage, GrayImage};

    use super::*;

    #[test]
    fn rectangle_masks_nothing() {
        assert!(Shape::Rectangle.contains(-1.0, 1.0));
        assert!(Shape::Rectangle.contains(0.0, 0.0));
    }

    #[test]
    fn circle_drops_corners() {
        assert!(Shape::Circle.contains(0.0, 0.0));
        assert!(Shape::Circle.contains(0.9, 0.0));
        assert!(!Shape::Circle.contains(0.9, 0.9));
    }

    #[test]
    fn triangle_keeps_the_apex_and_base_centre() {
        assert!(Shape::Triangle.contains(0.0, -1.0));
        assert!(Shape::Triangle.contains(0.0, 0.9));
        assert!(!Shape::Triangle.contains(0.9, -0.9));
        assert!(!Shape::Triangle.contains(-0.9, -0.9));
    }

    #[test]
    fn hexagon_is_tighter_than_the_square() {
        assert!(Shape::Hexagon.contains(0.0, 0.0));
        assert!(Shape::Hexagon.contains(0.9, 0.0));
        assert!(!Shape::Hexagon.contains(0.9, 0.9));
    }

    #[test]
    fn shape_names_round_trip() {
        for shape in [Shape::Rectangle, Shape::Circle, Shape::Triangle, Shape::Hexagon] {
            assert_eq!(Shape::from_name(shape.name()), Some(shape));
        }
        assert_eq!(Shape::from_name("pentagon"), None);
    }

    #[test]
    fn image_mask_turns_dark_pixels_off() {
        let mut img = GrayImage::new(3, 2);
        img.put_pixel(0, 0, Luma([0u8]));
        img.put_pixel(1, 0, Luma([255u8]));
        img.put_pixel(2, 0, Luma([10u8]));
        img.put_pixel(0, 1, Luma([255u8]));
        img.put_pixel(1, 1, Luma([255u8]));
        img.put_pixel(2, 1, Luma([255u8]));
        let mask = BinaryMask2D::from_image(&DynamicImage::ImageLuma8(img));

        assert!(mask.is_masked(GridCoordinate::new(0, 0, 0)));
        assert!(!mask.is_masked(GridCoordinate::new(0, 1, 0)));
        assert!(mask.is_masked(GridCoordinate::new(0, 2, 0)));
        assert!(!mask.is_masked(GridCoordinate::new(1, 0, 0)));
        // Out of mask bounds is unmasked.
        assert!(!mask.is_masked(GridCoordinate::new(9, 9, 0)));

        assert_eq!(mask.first_unmasked_coordinate(), Some(GridCoordinate::new(0, 1, 0)));
    }
}
