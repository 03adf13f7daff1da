//! Primitive rasterizers
//!
//! Every rasterizer writes through [`PixelBuffer::plot`] or
//! [`PixelBuffer::span`], so each pixel obeys the depth test and the final
//! image does not depend on the order primitives are drawn in.
//!
//! [`PixelBuffer::plot`]: crate::display::PixelBuffer::plot
//! [`PixelBuffer::span`]: crate::display::PixelBuffer::span

pub mod circle;
pub mod cylinder;
pub mod font;
pub mod hermite;
pub mod line;
pub mod sphere;
pub mod text;
pub mod triangle;

/// Integer screen-space point. z grows away from the viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point3i {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Point3i {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Midpoint, rounding toward the first point
    #[inline]
    pub fn midpoint(self, other: Point3i) -> Point3i {
        Point3i::new(
            self.x + (other.x - self.x) / 2,
            self.y + (other.y - self.y) / 2,
            self.z + (other.z - self.z) / 2,
        )
    }
}

impl From<(i32, i32, i32)> for Point3i {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Point3i::new(x, y, z)
    }
}

/// Style of the two flat ends of a cylinder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EndCaps {
    /// Nothing drawn at the ends
    #[default]
    None,
    /// One-pixel rim outline at the far end, so the tube reads as hollow
    Open,
    /// Filled disc at the end facing the viewer
    Flat,
    /// A sphere of the cylinder's diameter at each end
    Spherical,
}

/// Which rendering path a primitive's bounding box calls for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Entirely inside the buffer; no per-pixel bounds checks needed
    Unclipped,
    /// Straddles a buffer edge
    Clipped,
    /// Entirely outside the buffer
    Offscreen,
}

impl Visibility {
    /// Classify the box [x0, x1] x [y0, y1] against a `width` x `height` buffer
    pub fn of_box(x0: i32, y0: i32, x1: i32, y1: i32, width: i32, height: i32) -> Self {
        if x1 < 0 || y1 < 0 || x0 >= width || y0 >= height {
            Visibility::Offscreen
        } else if x0 >= 0 && y0 >= 0 && x1 < width && y1 < height {
            Visibility::Unclipped
        } else {
            Visibility::Clipped
        }
    }
}
