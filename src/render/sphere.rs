//! Shaded spheres
//!
//! Spheres smaller than [`SHAPE_CACHE_LIMIT`] are drawn from a per-diameter
//! [`SphereShape`]: one quadrant of height offsets with the dithered shade
//! index of all four mirrored quadrants baked into each cell. Larger spheres
//! compute their half-chords per row and look intensities up in a shared
//! 256x256 table.
//!
//! Both are cached in a [`SphereCache`] and must be flushed whenever the
//! lighting changes.

use std::sync::Arc;

use super::Visibility;
use crate::display::PixelBuffer;
use crate::shade::{ShadeModel, Shades, SHADE_LAST};

/// Diameters at or above this use the large-sphere path
pub const SHAPE_CACHE_LIMIT: i32 = 128;

const LARGE_TABLE_SIDE: usize = 256;

/// One cell of a sphere quadrant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShapeCell {
    /// Distance of the surface in front of the sphere's center plane
    pub height: u8,
    /// Shade index for quadrants (+x,+y), (-x,+y), (+x,-y), (-x,-y)
    pub intensities: [u8; 4],
}

/// Precomputed quadrant of a sphere of one diameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SphereShape {
    diameter: i32,
    rows: Vec<Vec<ShapeCell>>,
}

impl SphereShape {
    pub fn build(diameter: i32, model: &mut ShadeModel) -> Self {
        let radius = diameter as f32 / 2.0;
        let r2 = radius * radius;
        let off = offset(diameter);
        let half = (diameter + 1) / 2;

        let rows = (0..half)
            .map(|i| {
                let oy = i as f32 + off;
                let mut row = Vec::with_capacity(half as usize);
                for j in 0..half {
                    let ox = j as f32 + off;
                    let h2 = r2 - ox * ox - oy * oy;
                    if h2 < 0.0 {
                        break;
                    }
                    let h = h2.sqrt();
                    row.push(ShapeCell {
                        height: (h + 0.5) as u8,
                        intensities: [
                            model.dithered_intensity(ox, oy, h),
                            model.dithered_intensity(-ox, oy, h),
                            model.dithered_intensity(ox, -oy, h),
                            model.dithered_intensity(-ox, -oy, h),
                        ],
                    });
                }
                row
            })
            .collect();

        Self { diameter, rows }
    }

    #[inline]
    pub fn diameter(&self) -> i32 {
        self.diameter
    }

    /// Rows of the quadrant, nearest the center first
    #[inline]
    pub fn rows(&self) -> &[Vec<ShapeCell>] {
        &self.rows
    }
}

/// Pixel-center offset from the sphere center: 0.5 for even diameters
#[inline]
fn offset(diameter: i32) -> f32 {
    if diameter & 1 == 0 {
        0.5
    } else {
        0.0
    }
}

/// Lazily built sphere shapes and the large-sphere intensity table
#[derive(Debug, Default)]
pub struct SphereCache {
    shapes: Vec<Option<Arc<SphereShape>>>,
    large: Option<Arc<[u8]>>,
}

impl SphereCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shape for a small diameter, built on first request
    pub fn shape(&mut self, diameter: i32, model: &mut ShadeModel) -> Arc<SphereShape> {
        debug_assert!(
            diameter > 0 && diameter < SHAPE_CACHE_LIMIT,
            "diameter {} not cacheable",
            diameter
        );
        let index = diameter.clamp(1, SHAPE_CACHE_LIMIT - 1) as usize;
        if self.shapes.len() <= index {
            self.shapes.resize(SHAPE_CACHE_LIMIT as usize, None);
        }
        if let Some(shape) = &self.shapes[index] {
            return Arc::clone(shape);
        }
        let shape = Arc::new(SphereShape::build(index as i32, model));
        self.shapes[index] = Some(Arc::clone(&shape));
        shape
    }

    /// Shared intensity table for large spheres, built on first request
    pub fn large_table(&mut self, model: &mut ShadeModel) -> Arc<[u8]> {
        if let Some(table) = &self.large {
            return Arc::clone(table);
        }
        log::debug!("building large sphere intensity table");
        let mut table = Vec::with_capacity(LARGE_TABLE_SIDE * LARGE_TABLE_SIDE);
        let half = (LARGE_TABLE_SIDE / 2) as f32;
        for v in 0..LARGE_TABLE_SIDE {
            let ny = (v as f32 + 0.5 - half) / half;
            for u in 0..LARGE_TABLE_SIDE {
                let nx = (u as f32 + 0.5 - half) / half;
                let s = nx * nx + ny * ny;
                let nz = if s < 1.0 { (1.0 - s).sqrt() } else { 0.0 };
                table.push(model.dithered_intensity(nx, ny, nz));
            }
        }
        let table: Arc<[u8]> = table.into();
        self.large = Some(Arc::clone(&table));
        table
    }

    /// Number of diameters with a built shape
    pub fn cached_shapes(&self) -> usize {
        self.shapes.iter().filter(|s| s.is_some()).count()
    }

    /// Drop every shape and the large table (lighting changed)
    pub fn flush(&mut self) {
        let count = self.cached_shapes();
        self.shapes.clear();
        self.large = None;
        log::debug!("flushed {} sphere shapes", count);
    }
}

/// Draw a sphere of any diameter centered at (cx, cy) with center depth z
pub fn render_sphere(
    buf: &mut PixelBuffer,
    shades: &Shades,
    cache: &mut SphereCache,
    model: &mut ShadeModel,
    diameter: i32,
    cx: i32,
    cy: i32,
    z: i32,
) {
    if diameter <= 0 {
        return;
    }
    if sphere_visibility(buf, diameter, cx, cy) == Visibility::Offscreen {
        return;
    }
    if diameter < SHAPE_CACHE_LIMIT {
        let shape = cache.shape(diameter, model);
        draw_shape(buf, shades, &shape, cx, cy, z);
    } else {
        let table = cache.large_table(model);
        draw_large(buf, shades, &table, diameter, cx, cy, z);
    }
}

fn sphere_visibility(buf: &PixelBuffer, diameter: i32, cx: i32, cy: i32) -> Visibility {
    let left = cx - diameter / 2;
    let top = cy - diameter / 2;
    Visibility::of_box(
        left,
        top,
        left + diameter - 1,
        top + diameter - 1,
        buf.width(),
        buf.height(),
    )
}

/// Draw from a cached shape
pub fn draw_shape(
    buf: &mut PixelBuffer,
    shades: &Shades,
    shape: &SphereShape,
    cx: i32,
    cy: i32,
    z: i32,
) {
    let path = sphere_visibility(buf, shape.diameter, cx, cy);
    if path == Visibility::Offscreen {
        return;
    }
    let quad = Quadrants::new(shape.diameter, cx, cy, z, path);
    for (i, row) in shape.rows.iter().enumerate() {
        quad.emit_row(buf, shades, i as i32, row);
    }
}

/// Draw a sphere too large for the shape cache
pub fn draw_large(
    buf: &mut PixelBuffer,
    shades: &Shades,
    table: &[u8],
    diameter: i32,
    cx: i32,
    cy: i32,
    z: i32,
) {
    let path = sphere_visibility(buf, diameter, cx, cy);
    if path == Visibility::Offscreen || table.len() < LARGE_TABLE_SIDE * LARGE_TABLE_SIDE {
        return;
    }
    let quad = Quadrants::new(diameter, cx, cy, z, path);
    let radius = diameter as f32 / 2.0;
    let r2 = radius * radius;
    let off = offset(diameter);
    let lookup = |x: f32, y: f32| {
        let u = ((x / radius + 1.0) * 128.0).clamp(0.0, 255.0) as usize;
        let v = ((y / radius + 1.0) * 128.0).clamp(0.0, 255.0) as usize;
        table[v * LARGE_TABLE_SIDE + u]
    };

    for i in 0..(diameter + 1) / 2 {
        if path == Visibility::Clipped && !quad.row_visible(buf, i) {
            continue;
        }
        let oy = i as f32 + off;
        let chord2 = r2 - oy * oy;
        if chord2 < 0.0 {
            break;
        }
        let chord = chord2.sqrt();
        let mut j = 0;
        loop {
            let ox = j as f32 + off;
            if ox > chord {
                break;
            }
            let h = (chord2 - ox * ox).max(0.0).sqrt();
            let intensities = [
                lookup(ox, oy),
                lookup(-ox, oy),
                lookup(ox, -oy),
                lookup(-ox, -oy),
            ];
            quad.emit(buf, shades, i, j, z - (h + 0.5) as i32, intensities);
            j += 1;
        }
    }
}

/// Maps quadrant cells onto pixels around a sphere center
struct Quadrants {
    cx: i32,
    cy: i32,
    z: i32,
    /// 1 for even diameters, where the negative side starts one pixel over
    neg: i32,
    path: Visibility,
}

impl Quadrants {
    fn new(diameter: i32, cx: i32, cy: i32, z: i32, path: Visibility) -> Self {
        Self {
            cx,
            cy,
            z,
            neg: 1 - (diameter & 1),
            path,
        }
    }

    #[inline]
    fn row_visible(&self, buf: &PixelBuffer, i: i32) -> bool {
        let y_pos = self.cy + i;
        let y_neg = self.cy - self.neg - i;
        (0..buf.height()).contains(&y_pos) || (0..buf.height()).contains(&y_neg)
    }

    #[inline]
    fn put(&self, buf: &mut PixelBuffer, x: i32, y: i32, z: i32, argb: u32) {
        if self.path == Visibility::Clipped {
            buf.plot(x, y, z, argb);
        } else {
            buf.plot_in_bounds(x, y, z, argb);
        }
    }

    /// Write one row of cells to all four quadrants
    fn emit_row(&self, buf: &mut PixelBuffer, shades: &Shades, i: i32, cells: &[ShapeCell]) {
        for (j, cell) in cells.iter().enumerate() {
            let z = self.z - i32::from(cell.height);
            self.emit(buf, shades, i, j as i32, z, cell.intensities);
        }
    }

    /// Write cell (i, j) to each distinct mirrored pixel
    fn emit(
        &self,
        buf: &mut PixelBuffer,
        shades: &Shades,
        i: i32,
        j: i32,
        z: i32,
        intensities: [u8; 4],
    ) {
        let x_pos = self.cx + j;
        let x_neg = self.cx - self.neg - j;
        let y_pos = self.cy + i;
        let y_neg = self.cy - self.neg - i;
        let [a, b, c, d] = intensities.map(|s| shades[usize::from(s).min(SHADE_LAST)]);

        self.put(buf, x_pos, y_pos, z, a);
        if x_neg != x_pos {
            self.put(buf, x_neg, y_pos, z, b);
        }
        if y_neg != y_pos {
            self.put(buf, x_pos, y_neg, z, c);
            if x_neg != x_pos {
                self.put(buf, x_neg, y_neg, z, d);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::BACKGROUND_DEPTH;

    fn ramp() -> Shades {
        let mut shades = [0u32; crate::shade::SHADE_COUNT];
        for (i, s) in shades.iter_mut().enumerate() {
            *s = 0xFF00_0000 | (i as u32) << 8;
        }
        shades
    }

    fn lit(buf: &PixelBuffer) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        for y in 0..buf.height() {
            for x in 0..buf.width() {
                if buf.depth_at(x, y) != Some(BACKGROUND_DEPTH) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    fn render(buf: &mut PixelBuffer, cache: &mut SphereCache, d: i32, x: i32, y: i32, z: i32) {
        let mut model = ShadeModel::default();
        render_sphere(buf, &ramp(), cache, &mut model, d, x, y, z);
    }

    #[test]
    fn test_small_sphere_footprints() {
        for (d, expected) in [(1, 1), (4, 12), (5, 21)] {
            let mut buf = PixelBuffer::with_size(16, 16);
            render(&mut buf, &mut SphereCache::new(), d, 8, 8, 100);
            assert_eq!(lit(&buf).len(), expected, "diameter {}", d);
        }
    }

    #[test]
    fn test_even_sphere_box() {
        let mut buf = PixelBuffer::with_size(32, 32);
        render(&mut buf, &mut SphereCache::new(), 10, 16, 16, 100);
        let pixels = lit(&buf);
        let min_x = pixels.iter().map(|p| p.0).min().unwrap();
        let max_x = pixels.iter().map(|p| p.0).max().unwrap();
        let min_y = pixels.iter().map(|p| p.1).min().unwrap();
        let max_y = pixels.iter().map(|p| p.1).max().unwrap();
        assert_eq!((min_x, max_x, min_y, max_y), (11, 20, 11, 20));
    }

    #[test]
    fn test_center_is_nearest() {
        let mut buf = PixelBuffer::with_size(32, 32);
        render(&mut buf, &mut SphereCache::new(), 21, 16, 16, 100);
        // Height 10.5 rounds up
        assert_eq!(buf.depth_at(16, 16), Some(89));
        let rim = buf.depth_at(6, 16).unwrap();
        assert!(rim > 89 && rim <= 100);
    }

    #[test]
    fn test_shape_cached_until_flush() {
        let mut cache = SphereCache::new();
        let mut model = ShadeModel::default();
        let a = cache.shape(9, &mut model);
        let b = cache.shape(9, &mut model);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.cached_shapes(), 1);
        cache.flush();
        assert_eq!(cache.cached_shapes(), 0);
        let c = cache.shape(9, &mut model);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(c.diameter(), 9);
    }

    #[test]
    fn test_cached_shape_renders_identically() {
        let mut cache = SphereCache::new();
        let mut first = PixelBuffer::with_size(40, 40);
        let mut second = PixelBuffer::with_size(40, 40);
        render(&mut first, &mut cache, 31, 20, 20, 500);
        render(&mut second, &mut cache, 31, 20, 20, 500);
        assert_eq!(first.pixels(), second.pixels());
        assert_eq!(first.depths(), second.depths());
    }

    #[test]
    fn test_large_sphere() {
        let mut buf = PixelBuffer::with_size(256, 256);
        let mut cache = SphereCache::new();
        render(&mut buf, &mut cache, 200, 128, 128, 1000);
        assert_eq!(buf.depth_at(128, 128), Some(900));
        assert_eq!(buf.depth_at(2, 2), Some(BACKGROUND_DEPTH));
        assert_ne!(buf.depth_at(30, 128), Some(BACKGROUND_DEPTH));
        assert_eq!(buf.depth_at(27, 128), Some(BACKGROUND_DEPTH));
        assert_eq!(cache.cached_shapes(), 0);
    }

    #[test]
    fn test_clipped_sphere_stays_in_bounds() {
        let mut buf = PixelBuffer::with_size(20, 20);
        let mut cache = SphereCache::new();
        render(&mut buf, &mut cache, 15, 0, 19, 100);
        render(&mut buf, &mut cache, 300, 10, 10, 1000);
        assert!(buf.has_content());
        render(&mut buf, &mut cache, 15, -40, 5, 0);
    }

    #[test]
    fn test_intensities_brighter_toward_light() {
        let mut model = ShadeModel::default();
        let shape = SphereShape::build(61, &mut model);
        // Upper-left (-x, -y) faces the light; lower-right faces away
        let cell = shape.rows()[15][15];
        assert!(cell.intensities[3] > cell.intensities[0]);
    }
}
