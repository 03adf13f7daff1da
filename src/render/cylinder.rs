//! Cylinders and cones
//!
//! The circular cross-section is projected to an ellipse around each end
//! point. The rim is sampled adaptively so that neighbouring samples are at
//! most one pixel apart, and every sample becomes a depth-interpolated line
//! parallel to the axis (or converging on the tip, for cones). Each sample
//! `P` also yields the mirrored line through `-P`, so only half the rim is
//! sampled.

use std::f32::consts::PI;

use super::sphere::{render_sphere, SphereCache};
use super::{circle, line, EndCaps, Point3i};
use crate::display::PixelBuffer;
use crate::shade::{ShadeModel, Shades, SHADE_NORMAL};

/// Stop subdividing below this parameter step
const MIN_DT: f32 = 1.0 / 4096.0;

/// A rim sample relative to the end point, with precomputed intensities
#[derive(Debug, Clone, Copy)]
struct RimPoint {
    x: i32,
    y: i32,
    /// Depth of the surface in front of the axis
    z: i32,
    front: u8,
    back: u8,
}

impl RimPoint {
    /// Surface point in front of the axis at `end`
    fn front_of(&self, end: Point3i) -> Point3i {
        Point3i::new(
            end.x.saturating_add(self.x),
            end.y.saturating_add(self.y),
            end.z.saturating_sub(self.z),
        )
    }

    /// The mirrored point behind the axis
    fn back_of(&self, end: Point3i) -> Point3i {
        Point3i::new(
            end.x.saturating_sub(self.x),
            end.y.saturating_sub(self.y),
            end.z.saturating_add(self.z),
        )
    }
}

/// Direction from `a` to `b`, halved until every component (and its
/// negation) fits in i32
fn axis_between(a: Point3i, b: Point3i) -> (i32, i32, i32) {
    let mut d = [
        i64::from(b.x) - i64::from(a.x),
        i64::from(b.y) - i64::from(a.y),
        i64::from(b.z) - i64::from(a.z),
    ];
    while d.iter().any(|&v| v.abs() > i64::from(i32::MAX)) {
        for v in &mut d {
            *v /= 2;
        }
    }
    (d[0] as i32, d[1] as i32, d[2] as i32)
}

/// Orientation of a cylinder axis, for projecting its cross-section
#[derive(Debug, Clone, Copy)]
struct Axis {
    cos_theta: f32,
    cos_phi: f32,
    sin_phi: f32,
    radius: f32,
}

impl Axis {
    /// `None` when the axis points (nearly) straight at the viewer
    fn new(dx: i32, dy: i32, dz: i32, diameter: i32) -> Option<Self> {
        let mag2d2 = i64::from(dx) * i64::from(dx) + i64::from(dy) * i64::from(dy);
        if mag2d2 <= 1 {
            return None;
        }
        let mag2d = (mag2d2 as f32).sqrt();
        let mag3d = (mag2d2 as f32 + (dz as f32) * (dz as f32)).sqrt();
        Some(Self {
            cos_theta: dz as f32 / mag3d,
            cos_phi: dx as f32 / mag2d,
            sin_phi: dy as f32 / mag2d,
            radius: (diameter - 1) as f32 / 2.0,
        })
    }

    /// Rim point at parameter t in [0, 1]: (x, y, depth in front of the axis)
    fn rotated(&self, t: f32) -> (f32, f32, f32) {
        let (sin, cos) = (t * PI).sin_cos();
        let x_t = sin * self.cos_theta;
        let y_t = cos;
        let x_r = self.radius * (x_t * self.cos_phi - y_t * self.sin_phi);
        let y_r = self.radius * (x_t * self.sin_phi + y_t * self.cos_phi);
        let z_r = (self.radius * self.radius - x_r * x_r - y_r * y_r)
            .max(0.0)
            .sqrt();
        (x_r, y_r, z_r)
    }
}

/// Cylinder and cone rasterizer with reusable rim and row buffers
#[derive(Debug, Default)]
pub struct Cylinder3d {
    rim: Vec<RimPoint>,
    row_min: Vec<i32>,
    row_max: Vec<i32>,
}

impl Cylinder3d {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw a cylinder from `a` to `b`. The half nearer `a` uses `shades_a`.
    pub fn render(
        &mut self,
        buf: &mut PixelBuffer,
        spheres: &mut SphereCache,
        model: &mut ShadeModel,
        caps: EndCaps,
        diameter: i32,
        a: Point3i,
        b: Point3i,
        shades_a: &Shades,
        shades_b: &Shades,
    ) {
        if diameter <= 0 {
            return;
        }
        if diameter == 1 {
            line::draw_line(buf, a, b, shades_a[SHADE_NORMAL], shades_b[SHADE_NORMAL]);
            return;
        }
        if caps == EndCaps::Spherical {
            render_sphere(buf, shades_a, spheres, model, diameter, a.x, a.y, a.z);
            render_sphere(buf, shades_b, spheres, model, diameter, b.x, b.y, b.z);
        }

        let (dx, dy, dz) = axis_between(a, b);
        let Some(axis) = Axis::new(dx, dy, dz, diameter) else {
            if caps != EndCaps::Spherical {
                let (end, shades) = if a.z <= b.z { (a, shades_a) } else { (b, shades_b) };
                end_on(buf, model, diameter, end, shades);
            }
            return;
        };

        self.sample_rim(&axis, model);
        for p in &self.rim {
            line::draw_line(
                buf,
                p.front_of(a),
                p.front_of(b),
                shades_a[usize::from(p.front)],
                shades_b[usize::from(p.front)],
            );
            line::draw_line(
                buf,
                p.back_of(a),
                p.back_of(b),
                shades_a[usize::from(p.back)],
                shades_b[usize::from(p.back)],
            );
        }

        if dz == 0 {
            return;
        }
        // Outward normals of the two ends, z toward the viewer
        let out_a = [-dx as f32, -dy as f32, dz as f32];
        let out_b = [dx as f32, dy as f32, -dz as f32];
        let (near, far) = if dz > 0 {
            ((a, out_a, shades_a), (b, out_b, shades_b))
        } else {
            ((b, out_b, shades_b), (a, out_a, shades_a))
        };
        match caps {
            EndCaps::Flat => {
                let (end, outward, shades) = near;
                self.cap(buf, model, end, (dx, dy, dz), outward, shades, false);
            },
            EndCaps::Open => {
                let (end, outward, shades) = far;
                self.cap(buf, model, end, (dx, dy, dz), outward, shades, true);
            },
            _ => {},
        }
    }

    /// Draw a cone with its base disc at `base` and apex at `tip`
    pub fn render_cone(
        &mut self,
        buf: &mut PixelBuffer,
        model: &ShadeModel,
        caps: EndCaps,
        diameter: i32,
        base: Point3i,
        tip: Point3i,
        shades: &Shades,
    ) {
        if diameter <= 0 {
            return;
        }
        let (dx, dy, dz) = axis_between(base, tip);
        let Some(axis) = Axis::new(dx, dy, dz, diameter) else {
            if dz >= 0 {
                end_on(buf, model, diameter, base, shades);
            } else {
                buf.plot(tip.x, tip.y, tip.z, shades[SHADE_NORMAL]);
            }
            return;
        };

        self.sample_rim(&axis, model);
        for p in &self.rim {
            let front = shades[usize::from(p.front)];
            let back = shades[usize::from(p.back)];
            line::draw_line(
                buf,
                p.front_of(base),
                tip,
                front,
                front,
            );
            line::draw_line(
                buf,
                p.back_of(base),
                tip,
                back,
                back,
            );
        }

        // A filled base shows only when turned toward the viewer; the rim
        // outline is drawn either way
        let outward = [-dx as f32, -dy as f32, dz as f32];
        match caps {
            EndCaps::Flat if dz > 0 => {
                self.cap(buf, model, base, (dx, dy, dz), outward, shades, false);
            },
            EndCaps::Open if dz != 0 => {
                self.cap(buf, model, base, (dx, dy, dz), outward, shades, true);
            },
            _ => {},
        }
    }

    fn sample_rim(&mut self, axis: &Axis, model: &ShadeModel) {
        self.rim.clear();
        let p0 = axis.rotated(0.0);
        let p1 = axis.rotated(1.0);
        self.push_rim(model, p0);
        self.subdivide(axis, model, 0.0, p0, 1.0, p1);
    }

    fn subdivide(
        &mut self,
        axis: &Axis,
        model: &ShadeModel,
        t0: f32,
        p0: (f32, f32, f32),
        t1: f32,
        p1: (f32, f32, f32),
    ) {
        let gap = (p1.0.round() - p0.0.round()).abs() + (p1.1.round() - p0.1.round()).abs();
        if gap <= 1.0 || t1 - t0 < MIN_DT {
            self.push_rim(model, p1);
            return;
        }
        let tm = (t0 + t1) / 2.0;
        let pm = axis.rotated(tm);
        self.subdivide(axis, model, t0, p0, tm, pm);
        self.subdivide(axis, model, tm, pm, t1, p1);
    }

    fn push_rim(&mut self, model: &ShadeModel, (x, y, z): (f32, f32, f32)) {
        self.rim.push(RimPoint {
            x: x.round() as i32,
            y: y.round() as i32,
            z: z.round() as i32,
            front: model.intensity(x, y, z),
            back: model.intensity(-x, -y, z),
        });
    }

    /// Fill (or outline) the rim ellipse around `center` in the plane
    /// perpendicular to `axis`, one unit in front of it
    fn cap(
        &mut self,
        buf: &mut PixelBuffer,
        model: &ShadeModel,
        center: Point3i,
        axis: (i32, i32, i32),
        outward: [f32; 3],
        shades: &Shades,
        outline: bool,
    ) {
        let argb = shades[usize::from(model.intensity(outward[0], outward[1], outward[2]))];
        let (nx, ny, nz) = (axis.0 as f32, axis.1 as f32, axis.2 as f32);
        let plane_z = |x: i32, y: i32| {
            center.z + (-(nx * x as f32 + ny * y as f32) / nz).round() as i32 - 1
        };

        if outline {
            for p in &self.rim {
                for (x, y) in [(p.x, p.y), (-p.x, -p.y)] {
                    buf.plot(center.x + x, center.y + y, plane_z(x, y), argb);
                }
            }
            return;
        }

        let reach = self.rim.iter().map(|p| p.y.abs()).max().unwrap_or(0);
        let rows = (2 * reach + 1) as usize;
        self.row_min.clear();
        self.row_min.resize(rows, i32::MAX);
        self.row_max.clear();
        self.row_max.resize(rows, i32::MIN);
        for p in &self.rim {
            for (x, y) in [(p.x, p.y), (-p.x, -p.y)] {
                let row = (y + reach) as usize;
                self.row_min[row] = self.row_min[row].min(x);
                self.row_max[row] = self.row_max[row].max(x);
            }
        }

        for (row, (&min, &max)) in self.row_min.iter().zip(&self.row_max).enumerate() {
            let y = row as i32 - reach;
            for x in min..=max {
                buf.plot(center.x + x, center.y + y, plane_z(x, y), argb);
            }
        }
    }
}

/// A cylinder seen straight down its axis: a flat disc facing the viewer
fn end_on(
    buf: &mut PixelBuffer,
    model: &ShadeModel,
    diameter: i32,
    end: Point3i,
    shades: &Shades,
) {
    // An open tube's far rim lies behind this disc, so caps change nothing
    let argb = shades[usize::from(model.intensity(0.0, 0.0, 1.0))];
    circle::fill_circle(buf, diameter, end.x, end.y, end.z, argb, false);
}
