//! Scanline triangle filling
//!
//! Vertices are sorted by y. The long edge (top to bottom vertex) and the two
//! short edges are rasterized into per-row samples, then each row is filled
//! between the two samples with z (and, for Gouraud fills, the shade index)
//! interpolated across the span. Edge buffers are kept between calls.

use super::{Point3i, Visibility};
use crate::display::{PixelBuffer, Z_SHIFT};
use crate::shade::{Shades, SHADE_LAST};

const EDGE_SHIFT: u32 = 16;
const SHADE_SHIFT: u32 = 8;

/// One row's sample of an edge
#[derive(Debug, Clone, Copy, Default)]
struct EdgePoint {
    x: i32,
    z: i32,
    /// Shade index in 24.8 fixed point
    shade: i32,
}

#[derive(Debug, Clone, Copy)]
struct Vertex {
    x: i32,
    y: i32,
    z: i32,
    shade: i32,
}

#[derive(Clone, Copy)]
enum Paint<'a> {
    Flat(u32),
    Gouraud(&'a Shades),
}

/// Triangle rasterizer with reusable edge buffers
#[derive(Debug, Default)]
pub struct Triangle3d {
    long: Vec<EdgePoint>,
    short: Vec<EdgePoint>,
}

impl Triangle3d {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill with a single color
    pub fn fill(&mut self, buf: &mut PixelBuffer, vertices: [Point3i; 3], argb: u32) {
        self.rasterize(buf, vertices.map(|p| vertex(p, 0)), Paint::Flat(argb));
    }

    /// Fill with the shade index interpolated between per-vertex intensities
    pub fn fill_gouraud(
        &mut self,
        buf: &mut PixelBuffer,
        vertices: [Point3i; 3],
        intensities: [u8; 3],
        shades: &Shades,
    ) {
        let v = [
            vertex(vertices[0], intensities[0]),
            vertex(vertices[1], intensities[1]),
            vertex(vertices[2], intensities[2]),
        ];
        self.rasterize(buf, v, Paint::Gouraud(shades));
    }

    fn rasterize(&mut self, buf: &mut PixelBuffer, mut v: [Vertex; 3], paint: Paint<'_>) {
        v.sort_by_key(|p| p.y);
        let [v0, v1, v2] = v;

        let min_x = v0.x.min(v1.x).min(v2.x);
        let max_x = v0.x.max(v1.x).max(v2.x);
        if Visibility::of_box(min_x, v0.y, max_x, v2.y, buf.width(), buf.height())
            == Visibility::Offscreen
        {
            return;
        }

        if v0.y == v2.y {
            // Degenerate: all three on one row
            let left = [v0, v1, v2].into_iter().min_by_key(|p| p.x).unwrap_or(v0);
            let right = [v0, v1, v2].into_iter().max_by_key(|p| p.x).unwrap_or(v2);
            fill_row(buf, v0.y, edge_point(left), edge_point(right), paint);
            return;
        }

        let clip = (0, buf.height() - 1);
        self.long.clear();
        self.short.clear();
        rasterize_edge(&mut self.long, v0, v2, true, clip);
        rasterize_edge(&mut self.short, v0, v1, false, clip);
        rasterize_edge(&mut self.short, v1, v2, true, clip);

        let top = v0.y.max(clip.0);
        for (row, (&a, &b)) in self.long.iter().zip(self.short.iter()).enumerate() {
            fill_row(buf, top + row as i32, a, b, paint);
        }
    }
}

#[inline]
fn vertex(p: Point3i, intensity: u8) -> Vertex {
    Vertex {
        x: p.x,
        y: p.y,
        z: p.z,
        shade: i32::from(intensity) << SHADE_SHIFT,
    }
}

#[inline]
fn edge_point(v: Vertex) -> EdgePoint {
    EdgePoint {
        x: v.x,
        z: v.z,
        shade: v.shade,
    }
}

/// Append one sample per row from a.y up to b.y (inclusive if `include_last`),
/// restricted to rows inside `clip`. A flat edge contributes its start point.
fn rasterize_edge(
    out: &mut Vec<EdgePoint>,
    a: Vertex,
    b: Vertex,
    include_last: bool,
    clip: (i32, i32),
) {
    let dy = i64::from(b.y) - i64::from(a.y);
    if dy == 0 {
        if include_last && a.y >= clip.0 && a.y <= clip.1 {
            out.push(edge_point(a));
        }
        return;
    }

    let rows = if include_last { dy + 1 } else { dy };
    let first = (i64::from(clip.0) - i64::from(a.y)).max(0);
    let last = rows.min(i64::from(clip.1) - i64::from(a.y) + 1);
    if first >= last {
        return;
    }

    let half = 1i64 << (EDGE_SHIFT - 1);
    let dx = ((i64::from(b.x) - i64::from(a.x)) << EDGE_SHIFT) / dy;
    let dz = ((i64::from(b.z) - i64::from(a.z)) << EDGE_SHIFT) / dy;
    let ds = ((i64::from(b.shade) - i64::from(a.shade)) << EDGE_SHIFT) / dy;
    let mut xf = (i64::from(a.x) << EDGE_SHIFT) + half + dx * first;
    let mut zf = (i64::from(a.z) << EDGE_SHIFT) + half + dz * first;
    let mut sf = (i64::from(a.shade) << EDGE_SHIFT) + half + ds * first;

    for i in first..last {
        let point = if i == dy {
            edge_point(b)
        } else {
            EdgePoint {
                x: (xf >> EDGE_SHIFT) as i32,
                z: (zf >> EDGE_SHIFT) as i32,
                shade: (sf >> EDGE_SHIFT) as i32,
            }
        };
        out.push(point);
        xf += dx;
        zf += dz;
        sf += ds;
    }
}

fn fill_row(buf: &mut PixelBuffer, y: i32, a: EdgePoint, b: EdgePoint, paint: Paint<'_>) {
    match paint {
        Paint::Flat(argb) => buf.span(y, a.x, a.z, b.x, b.z, argb),
        Paint::Gouraud(shades) => shaded_span(buf, y, a, b, shades),
    }
}

fn shaded_span(buf: &mut PixelBuffer, y: i32, a: EdgePoint, b: EdgePoint, shades: &Shades) {
    if y < 0 || y >= buf.height() {
        return;
    }
    let (a, b) = if a.x <= b.x { (a, b) } else { (b, a) };
    let start = a.x.max(0);
    let end = b.x.min(buf.width() - 1);
    if start > end {
        return;
    }

    let run = (i64::from(b.x) - i64::from(a.x)).max(1);
    let dz = ((i64::from(b.z) - i64::from(a.z)) << Z_SHIFT) / run;
    let ds = ((i64::from(b.shade) - i64::from(a.shade)) << Z_SHIFT) / run;
    let skip = i64::from(start) - i64::from(a.x);
    let half = 1i64 << (Z_SHIFT - 1);
    let mut zf = (i64::from(a.z) << Z_SHIFT) + half + dz * skip;
    let mut sf = (i64::from(a.shade) << Z_SHIFT) + half + ds * skip;

    for x in start..=end {
        let shade = ((sf >> Z_SHIFT) as i32 >> SHADE_SHIFT).clamp(0, SHADE_LAST as i32);
        buf.plot_in_bounds(x, y, (zf >> Z_SHIFT) as i32, shades[shade as usize]);
        zf += dz;
        sf += ds;
    }
}

/// Screen-space face normal of a triangle, oriented toward the viewer.
///
/// Input z is depth (away from the viewer); the result uses the shading
/// convention of z toward the viewer. Returns zeros for degenerate triangles.
pub fn face_normal(a: Point3i, b: Point3i, c: Point3i) -> [f32; 3] {
    let d = |p: i32, q: i32| (i64::from(p) - i64::from(q)) as f32;
    let u = [d(b.x, a.x), d(b.y, a.y), d(a.z, b.z)];
    let v = [d(c.x, a.x), d(c.y, a.y), d(a.z, c.z)];
    let mut n = [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ];
    // Two-sided lighting
    if n[2] < 0.0 {
        n = [-n[0], -n[1], -n[2]];
    }
    n
}
