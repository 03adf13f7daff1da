//! Cardinal hermite splines
//!
//! A [`HermiteCurve`] runs from `p1` to `p2`; `p0` and `p3` are the
//! neighbouring control points that set the end tangents. Curves are sampled
//! adaptively and drawn as a polyline, a tube of spheres or, for two strands,
//! a ribbon of triangles.

use super::sphere::{render_sphere, SphereCache};
use super::triangle::{face_normal, Triangle3d};
use super::{line, Point3i};
use crate::display::PixelBuffer;
use crate::shade::{ShadeModel, Shades};

/// Tension giving a Catmull-Rom spline
pub const DEFAULT_TENSION: f32 = 1.0;

const MIN_DS: f32 = 1.0 / 1024.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HermiteCurve {
    pub p0: Point3i,
    pub p1: Point3i,
    pub p2: Point3i,
    pub p3: Point3i,
    pub tension: f32,
}

impl HermiteCurve {
    pub fn new(p0: Point3i, p1: Point3i, p2: Point3i, p3: Point3i) -> Self {
        Self {
            p0,
            p1,
            p2,
            p3,
            tension: DEFAULT_TENSION,
        }
    }

    #[must_use]
    pub fn with_tension(mut self, tension: f32) -> Self {
        self.tension = tension;
        self
    }

    /// Point on the curve at s in [0, 1]
    pub fn point(&self, s: f32) -> [f32; 3] {
        let s2 = s * s;
        let s3 = s2 * s;
        let h1 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h2 = -2.0 * s3 + 3.0 * s2;
        let h3 = s3 - 2.0 * s2 + s;
        let h4 = s3 - s2;
        let k = self.tension / 2.0;

        let axis = |p0: i32, p1: i32, p2: i32, p3: i32| {
            let t1 = (p2 - p0) as f32 * k;
            let t2 = (p3 - p1) as f32 * k;
            h1 * p1 as f32 + h2 * p2 as f32 + h3 * t1 + h4 * t2
        };
        [
            axis(self.p0.x, self.p1.x, self.p2.x, self.p3.x),
            axis(self.p0.y, self.p1.y, self.p2.y, self.p3.y),
            axis(self.p0.z, self.p1.z, self.p2.z, self.p3.z),
        ]
    }

    /// Nearest integer point on the curve at s
    pub fn point_i(&self, s: f32) -> Point3i {
        let [x, y, z] = self.point(s);
        Point3i::new(x.round() as i32, y.round() as i32, z.round() as i32)
    }
}

/// Tube diameters at the start, middle and end of a curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TubeDiameters {
    pub begin: i32,
    pub mid: i32,
    pub end: i32,
}

impl TubeDiameters {
    pub fn uniform(diameter: i32) -> Self {
        Self {
            begin: diameter,
            mid: diameter,
            end: diameter,
        }
    }

    /// Piecewise-linear diameter at s
    pub fn at(&self, s: f32) -> i32 {
        let (from, to, f) = if s <= 0.5 {
            (self.begin, self.mid, s * 2.0)
        } else {
            (self.mid, self.end, s * 2.0 - 1.0)
        };
        (from as f32 + (to - from) as f32 * f).round() as i32
    }
}

/// Spline rasterizer with reusable sample and triangle buffers
#[derive(Debug, Default)]
pub struct Hermite3d {
    params: Vec<f32>,
    triangles: Triangle3d,
}

impl Hermite3d {
    pub fn new() -> Self {
        Self::default()
    }

    /// Polyline along the curve; the second half uses `argb_b`
    pub fn render_polyline(
        &mut self,
        buf: &mut PixelBuffer,
        curve: &HermiteCurve,
        argb_a: u32,
        argb_b: u32,
    ) {
        self.sample(&[curve], 2.0);
        let mut prev = curve.point_i(0.0);
        for &s in &self.params[1..] {
            let next = curve.point_i(s);
            let argb = if s <= 0.5 { argb_a } else { argb_b };
            line::draw_line(buf, prev, next, argb, argb);
            prev = next;
        }
    }

    /// Tube of overlapping spheres whose diameter tapers along the curve
    pub fn render_tube(
        &mut self,
        buf: &mut PixelBuffer,
        spheres: &mut SphereCache,
        model: &mut ShadeModel,
        shades: &Shades,
        curve: &HermiteCurve,
        diameters: TubeDiameters,
    ) {
        self.sample(&[curve], 1.0);
        for &s in &self.params {
            let p = curve.point_i(s);
            render_sphere(buf, shades, spheres, model, diameters.at(s), p.x, p.y, p.z);
        }
    }

    /// Flat-shaded ribbon between two strands sampled at the same parameters
    pub fn render_ribbon(
        &mut self,
        buf: &mut PixelBuffer,
        model: &ShadeModel,
        shades: &Shades,
        top: &HermiteCurve,
        bottom: &HermiteCurve,
    ) {
        self.sample(&[top, bottom], 2.0);
        let mut a0 = top.point_i(0.0);
        let mut b0 = bottom.point_i(0.0);
        for i in 1..self.params.len() {
            let s = self.params[i];
            let a1 = top.point_i(s);
            let b1 = bottom.point_i(s);
            for tri in [[a0, b0, a1], [b0, b1, a1]] {
                let [nx, ny, nz] = face_normal(tri[0], tri[1], tri[2]);
                let argb = shades[usize::from(model.intensity(nx, ny, nz))];
                self.triangles.fill(buf, tri, argb);
            }
            a0 = a1;
            b0 = b1;
        }
    }

    /// Fill `params` with ascending samples in [0, 1] so that consecutive
    /// points on every curve are at most `max_gap` apart (x + y distance)
    fn sample(&mut self, curves: &[&HermiteCurve], max_gap: f32) {
        self.params.clear();
        self.params.push(0.0);
        self.subdivide(curves, 0.0, 1.0, max_gap);
    }

    fn subdivide(&mut self, curves: &[&HermiteCurve], s0: f32, s1: f32, max_gap: f32) {
        let gap = curves
            .iter()
            .map(|c| {
                let a = c.point(s0);
                let b = c.point(s1);
                (b[0] - a[0]).abs() + (b[1] - a[1]).abs()
            })
            .fold(0.0, f32::max);
        if gap <= max_gap || s1 - s0 < MIN_DS {
            self.params.push(s1);
            return;
        }
        let mid = (s0 + s1) / 2.0;
        self.subdivide(curves, s0, mid, max_gap);
        self.subdivide(curves, mid, s1, max_gap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::BACKGROUND_DEPTH;
    use crate::shade::SHADE_COUNT;

    const RED: u32 = 0xFFFF_0000;
    const BLUE: u32 = 0xFF00_00FF;

    fn straight(y: i32) -> HermiteCurve {
        HermiteCurve::new(
            Point3i::new(0, y, 0),
            Point3i::new(10, y, 0),
            Point3i::new(50, y, 0),
            Point3i::new(60, y, 0),
        )
    }

    fn is_lit(buf: &PixelBuffer, x: i32, y: i32) -> bool {
        buf.depth_at(x, y).is_some_and(|d| d != BACKGROUND_DEPTH)
    }

    #[test]
    fn test_curve_hits_inner_control_points() {
        let curve = HermiteCurve::new(
            Point3i::new(-5, 3, 1),
            Point3i::new(4, 8, 10),
            Point3i::new(20, -2, 30),
            Point3i::new(31, 7, 2),
        )
        .with_tension(0.7);
        assert_eq!(curve.point_i(0.0), curve.p1);
        assert_eq!(curve.point_i(1.0), curve.p2);
    }

    #[test]
    fn test_straight_polyline() {
        let mut buf = PixelBuffer::with_size(64, 16);
        Hermite3d::new().render_polyline(&mut buf, &straight(5), RED, BLUE);
        for x in 10..=50 {
            assert!(is_lit(&buf, x, 5), "x = {}", x);
        }
        assert_eq!(buf.pixel_at(15, 5), Some(RED));
        assert_eq!(buf.pixel_at(45, 5), Some(BLUE));
        assert!(!is_lit(&buf, 9, 5));
        assert!(!is_lit(&buf, 30, 4));
    }

    #[test]
    fn test_curved_polyline_is_connected() {
        let curve = HermiteCurve::new(
            Point3i::new(0, 40, 0),
            Point3i::new(5, 5, 0),
            Point3i::new(40, 30, 0),
            Point3i::new(60, 0, 0),
        );
        let mut buf = PixelBuffer::with_size(64, 64);
        let mut hermite = Hermite3d::new();
        hermite.render_polyline(&mut buf, &curve, RED, RED);
        assert!(is_lit(&buf, 5, 5));
        assert!(is_lit(&buf, 40, 30));
        for pair in hermite.params.windows(2) {
            let a = curve.point(pair[0]);
            let b = curve.point(pair[1]);
            assert!((b[0] - a[0]).abs() + (b[1] - a[1]).abs() <= 2.0);
        }
    }

    #[test]
    fn test_tapered_tube() {
        let shades = [RED; SHADE_COUNT];
        let mut buf = PixelBuffer::with_size(64, 32);
        let mut spheres = SphereCache::new();
        let mut model = ShadeModel::default();
        let diameters = TubeDiameters {
            begin: 3,
            mid: 11,
            end: 3,
        };
        Hermite3d::new().render_tube(
            &mut buf,
            &mut spheres,
            &mut model,
            &shades,
            &straight(16),
            diameters,
        );
        // Thick in the middle, thin at the ends
        assert!(is_lit(&buf, 30, 11));
        assert!(!is_lit(&buf, 11, 11));
        assert!(is_lit(&buf, 10, 16));
        assert!(spheres.cached_shapes() > 3);
    }

    #[test]
    fn test_tube_diameters() {
        let d = TubeDiameters {
            begin: 2,
            mid: 10,
            end: 4,
        };
        assert_eq!(d.at(0.0), 2);
        assert_eq!(d.at(0.25), 6);
        assert_eq!(d.at(0.5), 10);
        assert_eq!(d.at(1.0), 4);
        assert_eq!(TubeDiameters::uniform(7).at(0.8), 7);
    }

    #[test]
    fn test_ribbon_fills_between_strands() {
        let shades = [RED; SHADE_COUNT];
        let mut buf = PixelBuffer::with_size(64, 32);
        Hermite3d::new().render_ribbon(
            &mut buf,
            &ShadeModel::default(),
            &shades,
            &straight(8),
            &straight(20),
        );
        for y in 8..=20 {
            assert!(is_lit(&buf, 30, y), "y = {}", y);
        }
        assert!(!is_lit(&buf, 30, 22));
        assert!(!is_lit(&buf, 5, 14));
    }
}
