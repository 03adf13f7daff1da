//! Drawing facade
//!
//! [`Graphics3D`] is what application code talks to. It owns the
//! [`RenderContext`] and the frame buffers, keeps the current drawing color,
//! font and clip planes, and forwards each draw call to its rasterizer.
//!
//! Coordinates are in buffer space. With antialiasing on, the buffer is
//! twice the window size, so callers scale their projection by
//! [`Graphics3D::scale`].
//!
//! ```no_run
//! use molraster::{Colix, Graphics3D, Point3i};
//!
//! let mut g3d = Graphics3D::new(false);
//! g3d.set_window_size(320, 240, false);
//! g3d.begin_rendering();
//! g3d.set_colix(Colix::RED);
//! g3d.fill_sphere(40, 160, 120, 500);
//! g3d.draw_line(Point3i::new(0, 0, 100), Point3i::new(319, 239, 900));
//! g3d.end_rendering();
//! let image = g3d.image();
//! ```

use std::sync::Arc;

use crate::color::{parse_color, Colix, ColorRef};
use crate::config::EngineConfig;
use crate::context::RenderContext;
use crate::display::{Image, PixelBuffer, Platform};
use crate::error::ColorError;
use crate::render::cylinder::Cylinder3d;
use crate::render::hermite::{Hermite3d, HermiteCurve, TubeDiameters};
use crate::render::sphere::render_sphere;
use crate::render::text::{draw_text, Font, FontRasterizer};
use crate::render::triangle::{face_normal, Triangle3d};
use crate::render::{circle, line, EndCaps, Point3i};
use crate::shade::{Lighting, Shades, SHADE_NORMAL};
use crate::util::opaque;
use crate::xyzd::Xyzd;

/// Drawn for color strings that do not parse
pub const FALLBACK_ARGB: u32 = 0xFFFF_69B4;

/// Ramp distance of the noisy up/down colors from the base color
const NOISE_STEP: usize = 3;

/// Reusable rasterizer scratch space
#[derive(Debug, Default)]
struct Scratch {
    triangle: Triangle3d,
    cylinder: Cylinder3d,
    hermite: Hermite3d,
}

/// Everything a draw call needs, borrowed for the duration of the call
struct Frame<'a> {
    buf: &'a mut PixelBuffer,
    ctx: &'a mut RenderContext,
    scratch: &'a mut Scratch,
}

pub struct Graphics3D {
    ctx: RenderContext,
    platform: Platform,
    scratch: Scratch,
    rendering: bool,

    color: ColorRef,
    shades: Arc<Shades>,
    argb: u32,
    argb_noisy_up: u32,
    argb_noisy_dn: u32,

    slab: i32,
    depth: i32,
    font: Font,
}

impl Graphics3D {
    /// Facade with default lighting and no window size yet
    pub fn new(use_clear_thread: bool) -> Self {
        let mut ctx = RenderContext::default();
        let shades = ctx.colix_shades(Colix::WHITE);
        Self {
            ctx,
            platform: Platform::new(use_clear_thread),
            scratch: Scratch::default(),
            rendering: false,
            color: ColorRef::Direct(Colix::WHITE),
            argb: shades[SHADE_NORMAL],
            argb_noisy_up: shades[SHADE_NORMAL + NOISE_STEP],
            argb_noisy_dn: shades[SHADE_NORMAL - NOISE_STEP],
            shades,
            slab: 0,
            depth: i32::MAX,
            font: Font::default(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let mut g3d = Self::new(config.clear_thread);
        g3d.set_lighting(config.lighting);
        g3d.set_window_size(config.width, config.height, config.antialias);
        g3d.set_background(Self::argb_from_string(&config.background));
        g3d
    }

    // ========================================================================
    // Window and lifecycle
    // ========================================================================

    /// Set the output size. Buffers are reallocated lazily.
    pub fn set_window_size(&mut self, width: u32, height: u32, antialias: bool) {
        self.platform.configure(width, height, antialias);
    }

    pub fn window_width(&self) -> u32 {
        self.platform.window_width()
    }

    pub fn window_height(&self) -> u32 {
        self.platform.window_height()
    }

    pub fn buffer_width(&self) -> u32 {
        self.platform.buffer_width()
    }

    pub fn buffer_height(&self) -> u32 {
        self.platform.buffer_height()
    }

    pub fn antialias(&self) -> bool {
        self.platform.antialias()
    }

    /// Buffer pixels per window pixel along each axis
    pub fn scale(&self) -> i32 {
        self.platform.scale() as i32
    }

    /// Start a frame on a cleared buffer. A frame still in progress is
    /// ended first.
    pub fn begin_rendering(&mut self) {
        if self.rendering {
            log::debug!("begin_rendering while rendering; ending previous frame");
            self.end_rendering();
        }
        self.platform.begin_frame();
        if let Some(buf) = self.platform.buffer_mut() {
            buf.set_clip_planes(self.slab, self.depth);
        }
        self.rendering = true;
    }

    /// Finish the frame and publish it through [`image`](Self::image)
    pub fn end_rendering(&mut self) {
        if !self.rendering {
            return;
        }
        self.platform.end_frame();
        self.rendering = false;
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    /// The last finished frame at window resolution
    pub fn image(&self) -> Option<Image<'_>> {
        self.platform.image()
    }

    /// True if anything was drawn into the current frame
    pub fn has_content(&self) -> bool {
        self.platform.has_content()
    }

    /// Drop the frame buffers and stop the clearing thread. The next
    /// [`begin_rendering`](Self::begin_rendering) reallocates.
    pub fn release(&mut self) {
        self.rendering = false;
        self.platform.release();
    }

    fn frame(&mut self) -> Option<Frame<'_>> {
        debug_assert!(self.rendering, "draw call outside begin_rendering/end_rendering");
        if !self.rendering {
            return None;
        }
        let buf = self.platform.buffer_mut()?;
        Some(Frame {
            buf,
            ctx: &mut self.ctx,
            scratch: &mut self.scratch,
        })
    }

    // ========================================================================
    // Context, lighting and caches
    // ========================================================================

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut RenderContext {
        &mut self.ctx
    }

    pub fn set_font_rasterizer(&mut self, rasterizer: Box<dyn FontRasterizer>) {
        self.ctx.set_font_rasterizer(rasterizer);
    }

    pub fn lighting(&self) -> &Lighting {
        self.ctx.lighting()
    }

    pub fn set_lighting(&mut self, lighting: Lighting) {
        self.ctx.set_lighting(lighting);
        self.refresh_color();
    }

    pub fn set_ambient_percent(&mut self, percent: u8) {
        self.ctx.set_ambient_percent(percent);
        self.refresh_color();
    }

    pub fn set_diffuse_percent(&mut self, percent: u8) {
        self.ctx.set_diffuse_percent(percent);
        self.refresh_color();
    }

    pub fn set_specular(&mut self, on: bool) {
        self.ctx.set_specular(on);
        self.refresh_color();
    }

    pub fn set_specular_percent(&mut self, percent: u8) {
        self.ctx.set_specular_percent(percent);
        self.refresh_color();
    }

    pub fn set_specular_exponent(&mut self, exponent: u8) {
        self.ctx.set_specular_exponent(exponent);
        self.refresh_color();
    }

    pub fn set_light_z(&mut self, z: f32) {
        self.ctx.set_light_z(z);
        self.refresh_color();
    }

    /// Drop shade ramps, sphere shapes and text bitmaps
    pub fn flush_caches(&mut self) {
        self.ctx.flush_caches();
        self.refresh_color();
    }

    // ========================================================================
    // Background and clip planes
    // ========================================================================

    pub fn background(&self) -> u32 {
        self.platform.background()
    }

    /// Clear color for the following frames
    pub fn set_background(&mut self, argb: u32) {
        self.platform.set_background(argb);
    }

    /// Near and far z bounds. Primitives entirely outside are skipped and
    /// pixels outside are never written.
    pub fn set_slab_and_depth(&mut self, slab: i32, depth: i32) {
        self.slab = slab;
        self.depth = depth;
        if let Some(buf) = self.platform.buffer_mut() {
            buf.set_clip_planes(slab, depth);
        }
    }

    pub fn slab(&self) -> i32 {
        self.slab
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// True if a primitive spanning [near, far] in z lies wholly outside
    /// the clip planes
    #[inline]
    fn z_rejected(&self, near: i32, far: i32) -> bool {
        far < self.slab || near > self.depth
    }

    // ========================================================================
    // Colors
    // ========================================================================

    pub fn intern_color(&mut self, argb: u32) -> Colix {
        self.ctx.colors.intern(argb)
    }

    pub fn changeable_color(&mut self, id: u16, argb: u32) -> ColorRef {
        self.ctx.colors.changeable(id, argb)
    }

    /// Re-point a changeable color; the current color follows if it is
    /// that id
    pub fn change_color(&mut self, id: u16, argb: u32) {
        self.ctx.colors.change_color(id, argb);
        if self.color == ColorRef::Changeable(id) {
            self.refresh_color();
        }
    }

    pub fn argb(&self, colix: Colix) -> u32 {
        self.ctx.colors.argb(colix)
    }

    pub fn rgb(&self, colix: Colix) -> (u8, u8, u8) {
        self.ctx.colors.rgb(colix)
    }

    /// Parse a color name or `#RRGGBB`; unknown strings give [`FALLBACK_ARGB`]
    pub fn argb_from_string(s: &str) -> u32 {
        match parse_color(s) {
            Ok(argb) => argb,
            Err(e) => {
                log::warn!("{}; using hot pink", e);
                FALLBACK_ARGB
            }
        }
    }

    pub fn try_argb_from_string(s: &str) -> Result<u32, ColorError> {
        parse_color(s)
    }

    /// Interned handle for a color string, falling back to hot pink
    pub fn colix_from_string(&mut self, s: &str) -> Colix {
        self.intern_color(Self::argb_from_string(s))
    }

    pub fn color(&self) -> ColorRef {
        self.color
    }

    /// ARGB of the current color
    pub fn current_argb(&self) -> u32 {
        self.argb
    }

    /// Make `color` current for the following draw calls
    pub fn set_color(&mut self, color: ColorRef) {
        self.color = color;
        self.shades = self.ctx.shades(color);
        self.argb = self.shades[SHADE_NORMAL];
        self.argb_noisy_up = self.shades[SHADE_NORMAL + NOISE_STEP];
        self.argb_noisy_dn = self.shades[SHADE_NORMAL - NOISE_STEP];
    }

    pub fn set_colix(&mut self, colix: Colix) {
        self.set_color(ColorRef::Direct(colix));
    }

    /// Intern `argb` and make it current
    pub fn set_argb(&mut self, argb: u32) {
        let colix = self.intern_color(argb);
        self.set_colix(colix);
    }

    fn refresh_color(&mut self) {
        self.set_color(self.color);
    }

    fn argb_of(&self, color: ColorRef) -> u32 {
        self.ctx.colors.argb(self.ctx.colors.resolve(color))
    }

    // ========================================================================
    // Points and rectangles
    // ========================================================================

    pub fn draw_pixel(&mut self, x: i32, y: i32, z: i32) {
        let argb = self.argb;
        if let Some(f) = self.frame() {
            f.buf.plot(x, y, z, argb);
        }
    }

    pub fn draw_points(&mut self, points: &[Point3i]) {
        let argb = self.argb;
        let Some(f) = self.frame() else {
            return;
        };
        for p in points {
            f.buf.plot(p.x, p.y, p.z, argb);
        }
    }

    /// Points colored at random from the current color and its noisy
    /// neighbours, for dotted surfaces
    pub fn draw_points_noisy(&mut self, points: &[Point3i]) {
        let palette = [self.argb, self.argb_noisy_up, self.argb_noisy_dn];
        let Some(f) = self.frame() else {
            return;
        };
        for p in points {
            let pick = f.ctx.shade.random_below(3) as usize;
            f.buf.plot(p.x, p.y, p.z, palette[pick]);
        }
    }

    /// One-pixel rectangle outline at constant z
    pub fn draw_rect(&mut self, x: i32, y: i32, z: i32, width: i32, height: i32) {
        if width <= 0 || height <= 0 {
            return;
        }
        let argb = self.argb;
        let Some(f) = self.frame() else {
            return;
        };
        let (x1, y1) = (x.saturating_add(width - 1), y.saturating_add(height - 1));
        let corners = [
            Point3i::new(x, y, z),
            Point3i::new(x1, y, z),
            Point3i::new(x1, y1, z),
            Point3i::new(x, y1, z),
        ];
        for i in 0..4 {
            line::draw_line(f.buf, corners[i], corners[(i + 1) % 4], argb, argb);
        }
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, z: i32, width: i32, height: i32) {
        if width <= 0 || height <= 0 {
            return;
        }
        let argb = self.argb;
        let Some(f) = self.frame() else {
            return;
        };
        let top = y.max(0);
        let bottom = y.saturating_add(height).min(f.buf.height());
        let right = x.saturating_add(width - 1);
        for row in top..bottom {
            f.buf.span(row, x, z, right, z, argb);
        }
    }

    // ========================================================================
    // Lines
    // ========================================================================

    pub fn draw_line(&mut self, a: Point3i, b: Point3i) {
        let argb = self.argb;
        self.line(a, b, argb, argb, None);
    }

    /// Line whose far half is drawn in `color_b`, as for a bond between two
    /// differently colored atoms
    pub fn draw_line_bicolor(
        &mut self,
        color_a: ColorRef,
        color_b: ColorRef,
        a: Point3i,
        b: Point3i,
    ) {
        let argb_a = self.argb_of(color_a);
        let argb_b = self.argb_of(color_b);
        self.line(a, b, argb_a, argb_b, None);
    }

    pub fn draw_dashed_line(&mut self, run: i32, rise: i32, a: Point3i, b: Point3i) {
        let argb = self.argb;
        self.line(a, b, argb, argb, Some((run, rise)));
    }

    pub fn draw_dotted_line(&mut self, a: Point3i, b: Point3i) {
        self.draw_dashed_line(1, 1, a, b);
    }

    fn line(&mut self, a: Point3i, b: Point3i, argb_a: u32, argb_b: u32, dash: Option<(i32, i32)>) {
        if self.z_rejected(a.z.min(b.z), a.z.max(b.z)) {
            return;
        }
        let Some(f) = self.frame() else {
            return;
        };
        match dash {
            Some((run, rise)) => line::draw_dashed_line(f.buf, run, rise, a, b, argb_a, argb_b),
            None => line::draw_line(f.buf, a, b, argb_a, argb_b),
        }
    }

    // ========================================================================
    // Circles
    // ========================================================================

    pub fn draw_circle(&mut self, diameter: i32, cx: i32, cy: i32, z: i32) {
        if self.z_rejected(z, z) {
            return;
        }
        let argb = self.argb;
        if let Some(f) = self.frame() {
            circle::draw_circle(f.buf, diameter, cx, cy, z, argb);
        }
    }

    pub fn fill_circle(&mut self, diameter: i32, cx: i32, cy: i32, z: i32) {
        self.disc(diameter, cx, cy, z, false);
    }

    /// Checkerboard-stippled disc
    pub fn fill_screened_circle(&mut self, diameter: i32, cx: i32, cy: i32, z: i32) {
        self.disc(diameter, cx, cy, z, true);
    }

    pub fn draw_circle_xyzd(&mut self, p: Xyzd) {
        self.draw_circle(p.diameter, p.x, p.y, p.z);
    }

    pub fn fill_circle_xyzd(&mut self, p: Xyzd) {
        self.fill_circle(p.diameter, p.x, p.y, p.z);
    }

    fn disc(&mut self, diameter: i32, cx: i32, cy: i32, z: i32, screened: bool) {
        if self.z_rejected(z, z) {
            return;
        }
        let argb = self.argb;
        if let Some(f) = self.frame() {
            circle::fill_circle(f.buf, diameter, cx, cy, z, argb, screened);
        }
    }

    // ========================================================================
    // Triangles and quadrilaterals
    // ========================================================================

    /// Triangle in the current color, unshaded
    pub fn fill_triangle(&mut self, a: Point3i, b: Point3i, c: Point3i) {
        if self.triangle_rejected(&[a, b, c]) {
            return;
        }
        let argb = self.argb;
        if let Some(f) = self.frame() {
            f.scratch.triangle.fill(f.buf, [a, b, c], argb);
        }
    }

    /// Triangle lit by its own face normal
    pub fn fill_triangle_shaded(&mut self, a: Point3i, b: Point3i, c: Point3i) {
        if self.triangle_rejected(&[a, b, c]) {
            return;
        }
        let shades = Arc::clone(&self.shades);
        if let Some(f) = self.frame() {
            let [nx, ny, nz] = face_normal(a, b, c);
            let argb = shades[usize::from(f.ctx.shade.intensity(nx, ny, nz))];
            f.scratch.triangle.fill(f.buf, [a, b, c], argb);
        }
    }

    /// Triangle with intensity interpolated from per-vertex normals
    pub fn fill_triangle_gouraud(&mut self, vertices: [Point3i; 3], normals: [[f32; 3]; 3]) {
        if self.triangle_rejected(&vertices) {
            return;
        }
        let shades = Arc::clone(&self.shades);
        if let Some(f) = self.frame() {
            let intensities = normals.map(|[x, y, z]| f.ctx.shade.intensity(x, y, z));
            f.scratch
                .triangle
                .fill_gouraud(f.buf, vertices, intensities, &shades);
        }
    }

    pub fn draw_triangle(&mut self, a: Point3i, b: Point3i, c: Point3i) {
        self.draw_line(a, b);
        self.draw_line(b, c);
        self.draw_line(c, a);
    }

    /// Quadrilateral a-b-c-d as two unshaded triangles
    pub fn fill_quad(&mut self, a: Point3i, b: Point3i, c: Point3i, d: Point3i) {
        self.fill_triangle(a, b, c);
        self.fill_triangle(a, c, d);
    }

    pub fn draw_quad(&mut self, a: Point3i, b: Point3i, c: Point3i, d: Point3i) {
        self.draw_line(a, b);
        self.draw_line(b, c);
        self.draw_line(c, d);
        self.draw_line(d, a);
    }

    fn triangle_rejected(&self, vertices: &[Point3i]) -> bool {
        let near = vertices.iter().map(|p| p.z).min().unwrap_or(0);
        let far = vertices.iter().map(|p| p.z).max().unwrap_or(0);
        self.z_rejected(near, far)
    }

    // ========================================================================
    // Cylinders, cones and splines
    // ========================================================================

    /// Cylinder in the current color
    pub fn fill_cylinder(&mut self, caps: EndCaps, diameter: i32, a: Point3i, b: Point3i) {
        let shades = Arc::clone(&self.shades);
        self.cylinder(caps, diameter, a, b, &shades, &shades);
    }

    /// Cylinder whose halves take the colors of the atoms at each end
    pub fn fill_cylinder_bicolor(
        &mut self,
        color_a: ColorRef,
        color_b: ColorRef,
        caps: EndCaps,
        diameter: i32,
        a: Point3i,
        b: Point3i,
    ) {
        let shades_a = self.ctx.shades(color_a);
        let shades_b = self.ctx.shades(color_b);
        self.cylinder(caps, diameter, a, b, &shades_a, &shades_b);
    }

    fn cylinder(
        &mut self,
        caps: EndCaps,
        diameter: i32,
        a: Point3i,
        b: Point3i,
        shades_a: &Shades,
        shades_b: &Shades,
    ) {
        let r = diameter / 2;
        if self.z_rejected(a.z.min(b.z) - r, a.z.max(b.z) + r) {
            return;
        }
        let Some(f) = self.frame() else {
            return;
        };
        f.scratch.cylinder.render(
            f.buf,
            &mut f.ctx.spheres,
            &mut f.ctx.shade,
            caps,
            diameter,
            a,
            b,
            shades_a,
            shades_b,
        );
    }

    /// Cone from a base disc at `base` to its apex at `tip`
    pub fn fill_cone(&mut self, caps: EndCaps, diameter: i32, base: Point3i, tip: Point3i) {
        let r = diameter / 2;
        if self.z_rejected(base.z.min(tip.z) - r, base.z.max(tip.z) + r) {
            return;
        }
        let shades = Arc::clone(&self.shades);
        if let Some(f) = self.frame() {
            f.scratch
                .cylinder
                .render_cone(f.buf, &f.ctx.shade, caps, diameter, base, tip, &shades);
        }
    }

    /// Spline polyline in the current color
    pub fn draw_hermite(&mut self, curve: &HermiteCurve) {
        let argb = self.argb;
        if let Some(f) = self.frame() {
            f.scratch.hermite.render_polyline(f.buf, curve, argb, argb);
        }
    }

    pub fn draw_hermite_bicolor(
        &mut self,
        color_a: ColorRef,
        color_b: ColorRef,
        curve: &HermiteCurve,
    ) {
        let argb_a = self.argb_of(color_a);
        let argb_b = self.argb_of(color_b);
        if let Some(f) = self.frame() {
            f.scratch.hermite.render_polyline(f.buf, curve, argb_a, argb_b);
        }
    }

    /// Tube of spheres along the spline
    pub fn fill_hermite(&mut self, curve: &HermiteCurve, diameters: TubeDiameters) {
        let shades = Arc::clone(&self.shades);
        if let Some(f) = self.frame() {
            f.scratch.hermite.render_tube(
                f.buf,
                &mut f.ctx.spheres,
                &mut f.ctx.shade,
                &shades,
                curve,
                diameters,
            );
        }
    }

    /// Ribbon between two parallel splines
    pub fn fill_ribbon(&mut self, top: &HermiteCurve, bottom: &HermiteCurve) {
        let shades = Arc::clone(&self.shades);
        if let Some(f) = self.frame() {
            f.scratch
                .hermite
                .render_ribbon(f.buf, &f.ctx.shade, &shades, top, bottom);
        }
    }

    // ========================================================================
    // Spheres
    // ========================================================================

    pub fn fill_sphere(&mut self, diameter: i32, cx: i32, cy: i32, z: i32) {
        let r = diameter / 2;
        if diameter <= 0 || self.z_rejected(z.saturating_sub(r), z.saturating_add(r)) {
            return;
        }
        let shades = Arc::clone(&self.shades);
        if let Some(f) = self.frame() {
            render_sphere(
                f.buf,
                &shades,
                &mut f.ctx.spheres,
                &mut f.ctx.shade,
                diameter,
                cx,
                cy,
                z,
            );
        }
    }

    pub fn fill_sphere_xyzd(&mut self, p: Xyzd) {
        self.fill_sphere(p.diameter, p.x, p.y, p.z);
    }

    // ========================================================================
    // Text and images
    // ========================================================================

    pub fn font(&self) -> Font {
        self.font
    }

    /// Font for following text, in window pixels
    pub fn set_font(&mut self, font: Font) {
        self.font = font;
    }

    /// Current font at buffer resolution
    fn buffer_font(&self) -> Font {
        self.font.scaled(self.platform.scale() as u16)
    }

    /// Width of `text` in buffer pixels
    pub fn string_width(&self, text: &str) -> u32 {
        self.ctx.glyphs.string_width(text, self.buffer_font())
    }

    /// Text with its baseline at `y`
    pub fn draw_string(&mut self, text: &str, x: i32, y: i32, z: i32) {
        self.text(text, x, y, z, None);
    }

    /// Text on a filled box of `background`, for label callouts
    pub fn draw_string_on(&mut self, text: &str, x: i32, y: i32, z: i32, background: ColorRef) {
        let bg = self.argb_of(background);
        self.text(text, x, y, z, Some(bg));
    }

    fn text(&mut self, text: &str, x: i32, y: i32, z: i32, background: Option<u32>) {
        if text.is_empty() || self.z_rejected(z, z) {
            return;
        }
        let font = self.buffer_font();
        let argb = self.argb;
        if let Some(f) = self.frame() {
            let bitmap = f.ctx.glyphs.bitmap(text, font);
            draw_text(f.buf, &bitmap, x, y, z, argb, background);
        }
    }

    /// Composite a `width` x `height` ARGB image with its top-left corner at
    /// (x, y). Fully transparent pixels are skipped.
    pub fn draw_image(&mut self, pixels: &[u32], width: u32, height: u32, x: i32, y: i32, z: i32) {
        if pixels.len() < (width as usize) * (height as usize) {
            log::warn!(
                "image of {} pixels is too small for {}x{}",
                pixels.len(),
                width,
                height
            );
            return;
        }
        if self.z_rejected(z, z) {
            return;
        }
        let Some(f) = self.frame() else {
            return;
        };
        for (row, row_pixels) in pixels
            .chunks_exact(width as usize)
            .take(height as usize)
            .enumerate()
        {
            for (col, &argb) in row_pixels.iter().enumerate() {
                if argb >> 24 != 0 {
                    f.buf.plot(x + col as i32, y + row as i32, z, opaque(argb));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: u32 = 0xFF00_0000;
    const RED: u32 = 0xFFFF_0000;
    const BLUE: u32 = 0xFF00_00FF;
    const GREEN: u32 = 0xFF00_8000;

    fn graphics(width: u32, height: u32) -> Graphics3D {
        let mut g3d = Graphics3D::new(false);
        g3d.set_window_size(width, height, false);
        g3d
    }

    fn frame_pixels(g3d: &Graphics3D) -> Vec<u32> {
        g3d.image().unwrap().pixels.to_vec()
    }

    #[test]
    fn test_single_red_line() {
        let mut g3d = graphics(20, 20);
        g3d.begin_rendering();
        g3d.set_colix(Colix::RED);
        g3d.draw_line(Point3i::new(0, 0, 0), Point3i::new(10, 0, 0));
        g3d.end_rendering();

        let image = g3d.image().unwrap();
        assert_eq!((image.width, image.height), (20, 20));
        for y in 0..20 {
            for x in 0..20 {
                let expected = if y == 0 && x <= 10 { RED } else { BLACK };
                assert_eq!(image.pixel_at(x, y), Some(expected), "({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_nearer_circle_wins() {
        let mut g3d = graphics(20, 20);
        g3d.begin_rendering();
        g3d.set_colix(Colix::RED);
        g3d.fill_circle(9, 10, 10, 5);
        g3d.set_colix(Colix::BLUE);
        g3d.fill_circle(9, 10, 10, 10);
        g3d.end_rendering();
        assert_eq!(g3d.image().unwrap().pixel_at(10, 10), Some(RED));
    }

    #[test]
    fn test_has_content() {
        let mut g3d = graphics(8, 8);
        g3d.begin_rendering();
        assert!(!g3d.has_content());
        g3d.draw_pixel(3, 4, 100);
        assert!(g3d.has_content());
        g3d.end_rendering();
    }

    #[test]
    fn test_far_offscreen_coordinates_are_clipped() {
        let far = 2_000_000_000;
        let mut g3d = graphics(10, 10);
        g3d.begin_rendering();
        g3d.set_colix(Colix::RED);
        g3d.draw_line(Point3i::new(-far, 3, 0), Point3i::new(far, 3, 0));
        g3d.set_colix(Colix::BLUE);
        g3d.fill_triangle(
            Point3i::new(-far, 0, 5),
            Point3i::new(far, 0, 5),
            Point3i::new(0, 7, 5),
        );
        g3d.set_colix(Colix::GREEN);
        g3d.fill_cylinder(
            EndCaps::Flat,
            3,
            Point3i::new(-far, 8, 50),
            Point3i::new(far, 8, 50),
        );
        g3d.fill_rect(i32::MAX - 5, 0, 0, 100, 3);
        g3d.draw_rect(-far, -far, 0, i32::MAX, i32::MAX);
        g3d.end_rendering();

        let image = g3d.image().unwrap();
        for x in 0..10 {
            assert_eq!(image.pixel_at(x, 3), Some(RED), "x = {}", x);
            assert_eq!(image.pixel_at(x, 5), Some(BLUE), "x = {}", x);
            assert_ne!(image.pixel_at(x, 9), Some(BLACK), "x = {}", x);
        }
    }

    #[test]
    fn test_changeable_color_between_renders() {
        let mut g3d = graphics(8, 8);
        let color = g3d.changeable_color(2, BLUE);

        g3d.begin_rendering();
        g3d.set_color(color);
        g3d.draw_pixel(1, 1, 10);
        g3d.end_rendering();
        assert_eq!(g3d.image().unwrap().pixel_at(1, 1), Some(BLUE));

        g3d.change_color(2, GREEN);
        g3d.begin_rendering();
        g3d.draw_pixel(1, 1, 10);
        g3d.end_rendering();
        assert_eq!(g3d.image().unwrap().pixel_at(1, 1), Some(GREEN));
    }

    #[test]
    fn test_unbound_changeable_color_draws_fallback() {
        let mut g3d = graphics(8, 8);
        g3d.begin_rendering();
        g3d.set_color(ColorRef::Changeable(99));
        assert_eq!(g3d.current_argb(), FALLBACK_ARGB);
        g3d.draw_pixel(1, 1, 10);
        g3d.fill_sphere(5, 5, 5, 20);
        g3d.end_rendering();
        let image = g3d.image().unwrap();
        assert_eq!(image.pixel_at(1, 1), Some(FALLBACK_ARGB));
        assert_ne!(image.pixel_at(5, 5), Some(BLACK));

        // Binding the id later takes over
        g3d.change_color(99, RED);
        assert_eq!(g3d.current_argb(), RED);
    }

    fn scene(g3d: &mut Graphics3D, reverse: bool) {
        let mut steps: Vec<Box<dyn Fn(&mut Graphics3D)>> = vec![
            Box::new(|g| {
                g.set_colix(Colix::GRAY);
                g.fill_triangle_shaded(
                    Point3i::new(0, 0, 150),
                    Point3i::new(39, 5, 150),
                    Point3i::new(10, 39, 150),
                );
            }),
            Box::new(|g| {
                g.set_colix(Colix::RED);
                g.fill_sphere(21, 20, 20, 100);
            }),
            Box::new(|g| {
                g.fill_cylinder_bicolor(
                    Colix::BLUE.into(),
                    Colix::YELLOW.into(),
                    EndCaps::Flat,
                    7,
                    Point3i::new(4, 30, 58),
                    Point3i::new(36, 26, 64),
                );
            }),
            Box::new(|g| {
                g.set_colix(Colix::WHITE);
                g.draw_line(Point3i::new(0, 0, 30), Point3i::new(39, 39, 30));
            }),
            Box::new(|g| {
                g.set_colix(Colix::LIME);
                g.fill_circle(8, 30, 10, 10);
            }),
            Box::new(|g| {
                g.set_colix(Colix::ORANGE);
                g.draw_string("N", 2, 38, 5);
            }),
        ];
        if reverse {
            steps.reverse();
        }
        g3d.begin_rendering();
        for step in &steps {
            step(g3d);
        }
        g3d.end_rendering();
    }

    #[test]
    fn test_draw_order_does_not_matter() {
        let mut g3d = graphics(40, 40);
        scene(&mut g3d, false);
        let forward = frame_pixels(&g3d);
        scene(&mut g3d, true);
        let backward = frame_pixels(&g3d);
        assert!(forward.iter().any(|&p| p != BLACK));
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_sphere_cache_reuse_is_stable() {
        let mut g3d = graphics(32, 32);
        let mut frames = Vec::new();
        for _ in 0..2 {
            g3d.begin_rendering();
            g3d.set_colix(Colix::TEAL);
            g3d.fill_sphere(15, 16, 16, 200);
            g3d.end_rendering();
            frames.push(frame_pixels(&g3d));
        }
        assert_eq!(frames[0], frames[1]);
        assert_eq!(g3d.context().spheres.cached_shapes(), 1);
    }

    #[test]
    fn test_clear_thread_frames_match_inline() {
        let mut threaded = Graphics3D::new(true);
        threaded.set_window_size(40, 40, false);
        let mut inline = graphics(40, 40);
        for _ in 0..3 {
            scene(&mut threaded, false);
            scene(&mut inline, false);
            assert_eq!(frame_pixels(&threaded), frame_pixels(&inline));
        }
    }

    #[test]
    fn test_slab_and_depth_preclip() {
        let mut g3d = graphics(32, 32);
        g3d.set_slab_and_depth(50, 200);
        g3d.begin_rendering();
        g3d.fill_sphere(10, 16, 16, 20);
        g3d.draw_line(Point3i::new(0, 0, 10), Point3i::new(31, 31, 40));
        g3d.fill_circle(6, 5, 5, 300);
        assert!(!g3d.has_content());
        g3d.fill_sphere(10, 16, 16, 100);
        assert!(g3d.has_content());
        g3d.end_rendering();
    }

    #[test]
    fn test_antialias_downsamples() {
        let mut g3d = Graphics3D::new(false);
        g3d.set_window_size(10, 10, true);
        assert_eq!(g3d.scale(), 2);
        assert_eq!((g3d.buffer_width(), g3d.buffer_height()), (20, 20));
        g3d.begin_rendering();
        g3d.set_colix(Colix::RED);
        g3d.fill_rect(0, 0, 10, 20, 20);
        // Half-covered block at the right edge
        g3d.set_colix(Colix::BLUE);
        g3d.fill_rect(18, 0, 5, 1, 20);
        g3d.end_rendering();

        let image = g3d.image().unwrap();
        assert_eq!((image.width, image.height), (10, 10));
        assert_eq!(image.pixels.len(), 100);
        assert_eq!(image.pixel_at(0, 0), Some(RED));
        assert_eq!(image.pixel_at(9, 3), Some(0xFF80_0080));
    }

    #[test]
    fn test_background_color() {
        let mut g3d = graphics(4, 4);
        g3d.set_background(0x0010_2030);
        assert_eq!(g3d.background(), 0xFF10_2030);
        g3d.begin_rendering();
        g3d.end_rendering();
        assert!(frame_pixels(&g3d).iter().all(|&p| p == 0xFF10_2030));
    }

    #[test]
    fn test_color_strings() {
        assert_eq!(Graphics3D::argb_from_string("red"), RED);
        assert_eq!(Graphics3D::argb_from_string("#00ff00"), 0xFF00_FF00);
        assert_eq!(Graphics3D::argb_from_string("not-a-color"), FALLBACK_ARGB);
        assert!(Graphics3D::try_argb_from_string("not-a-color").is_err());

        let mut g3d = Graphics3D::new(false);
        let colix = g3d.colix_from_string("hotpink");
        assert_eq!(colix, Colix::HOTPINK);
        assert_eq!(g3d.colix_from_string("bogus"), Colix::HOTPINK);
        assert_eq!(g3d.rgb(Colix::GOLD), (0xFF, 0xD7, 0x00));
    }

    #[test]
    fn test_noisy_points_stay_near_base_color() {
        let mut g3d = graphics(16, 16);
        g3d.begin_rendering();
        g3d.set_colix(Colix::SILVER);
        let shades = g3d.context_mut().colix_shades(Colix::SILVER);
        let points: Vec<_> = (0..16).map(|x| Point3i::new(x, 3, 10)).collect();
        g3d.draw_points_noisy(&points);
        g3d.end_rendering();

        let allowed = [
            shades[SHADE_NORMAL],
            shades[SHADE_NORMAL + NOISE_STEP],
            shades[SHADE_NORMAL - NOISE_STEP],
        ];
        let image = g3d.image().unwrap();
        for x in 0..16 {
            let pixel = image.pixel_at(x, 3).unwrap();
            assert!(allowed.contains(&pixel));
        }
    }

    #[test]
    fn test_image_skips_transparent_pixels() {
        let mut g3d = graphics(4, 4);
        g3d.begin_rendering();
        let pixels = [0x80FF_0000, 0x0000_FF00, 0xFF00_00FF, 0x0000_0000];
        g3d.draw_image(&pixels, 2, 2, 1, 1, 10);
        g3d.draw_image(&pixels, 3, 3, 0, 0, 10);
        g3d.end_rendering();
        let image = g3d.image().unwrap();
        assert_eq!(image.pixel_at(1, 1), Some(RED));
        assert_eq!(image.pixel_at(2, 1), Some(BLACK));
        assert_eq!(image.pixel_at(1, 2), Some(BLUE));
        assert_eq!(image.pixel_at(2, 2), Some(BLACK));
    }

    #[test]
    fn test_text_and_rects() {
        let mut g3d = graphics(32, 16);
        assert_eq!(g3d.string_width("OH"), 12);
        g3d.begin_rendering();
        g3d.set_colix(Colix::WHITE);
        g3d.draw_string_on("OH", 1, 8, 20, Colix::NAVY.into());
        g3d.draw_rect(20, 2, 30, 6, 5);
        g3d.end_rendering();
        let image = g3d.image().unwrap();
        // Callout box covers the whole cell
        assert_eq!(image.pixel_at(6, 2), Some(0xFF00_0080));
        assert_eq!(image.pixel_at(2, 1), Some(0xFFFF_FFFF));
        assert_eq!(image.pixel_at(20, 2), Some(0xFFFF_FFFF));
        assert_eq!(image.pixel_at(25, 6), Some(0xFFFF_FFFF));
        assert_eq!(image.pixel_at(22, 4), Some(BLACK));
    }

    #[test]
    fn test_nested_begin_ends_previous_frame() {
        let mut g3d = graphics(8, 8);
        g3d.begin_rendering();
        g3d.draw_pixel(0, 0, 1);
        g3d.begin_rendering();
        assert!(g3d.is_rendering());
        assert!(!g3d.has_content());
        g3d.end_rendering();
        assert!(g3d.image().is_some());
        g3d.release();
        assert!(g3d.image().is_none());
    }

    #[test]
    fn test_from_config() {
        let config = EngineConfig {
            width: 12,
            height: 9,
            antialias: true,
            background: "navy".into(),
            clear_thread: false,
            ..EngineConfig::default()
        };
        let g3d = Graphics3D::from_config(&config);
        assert_eq!((g3d.window_width(), g3d.window_height()), (12, 9));
        assert_eq!((g3d.buffer_width(), g3d.buffer_height()), (24, 18));
        assert_eq!(g3d.background(), 0xFF00_0080);
    }
}
