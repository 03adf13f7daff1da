//! Shared rendering state
//!
//! [`RenderContext`] owns everything that outlives a frame: the color table
//! with its shade ramps, the lighting model, sphere shapes and text bitmaps.
//! Changing a lighting parameter goes through the context so that every cache
//! derived from the old lighting is dropped in the same step.

use std::sync::Arc;

use crate::color::{Colix, ColorRef, ColorTable};
use crate::render::sphere::SphereCache;
use crate::render::text::{FontRasterizer, GlyphCache};
use crate::shade::{Lighting, ShadeModel, Shades};

#[derive(Debug)]
pub struct RenderContext {
    pub colors: ColorTable,
    pub shade: ShadeModel,
    pub spheres: SphereCache,
    pub glyphs: GlyphCache,
}

impl RenderContext {
    pub fn new(lighting: Lighting) -> Self {
        Self {
            colors: ColorTable::new(),
            shade: ShadeModel::new(lighting),
            spheres: SphereCache::new(),
            glyphs: GlyphCache::new(),
        }
    }

    /// Swap in a host font rasterizer; cached text is dropped
    pub fn set_font_rasterizer(&mut self, rasterizer: Box<dyn FontRasterizer>) {
        self.glyphs = GlyphCache::with_rasterizer(rasterizer);
    }

    #[inline]
    pub fn lighting(&self) -> &Lighting {
        self.shade.lighting()
    }

    /// Replace all lighting parameters. A no-op when nothing changed.
    pub fn set_lighting(&mut self, lighting: Lighting) {
        if *self.shade.lighting() == lighting {
            return;
        }
        log::debug!("lighting changed: {:?}", lighting);
        self.shade.set_lighting(lighting);
        self.colors.flush_shades();
        self.spheres.flush();
    }

    fn update_lighting(&mut self, f: impl FnOnce(&mut Lighting)) {
        let mut lighting = *self.shade.lighting();
        f(&mut lighting);
        self.set_lighting(lighting);
    }

    pub fn set_ambient_percent(&mut self, percent: u8) {
        self.update_lighting(|l| l.ambient_percent = percent.min(100));
    }

    pub fn set_diffuse_percent(&mut self, percent: u8) {
        self.update_lighting(|l| l.diffuse_percent = percent.min(100));
    }

    pub fn set_specular(&mut self, on: bool) {
        self.update_lighting(|l| l.specular = on);
    }

    pub fn set_specular_percent(&mut self, percent: u8) {
        self.update_lighting(|l| l.specular_percent = percent.min(100));
    }

    pub fn set_specular_exponent(&mut self, exponent: u8) {
        self.update_lighting(|l| l.specular_exponent = exponent);
    }

    pub fn set_light_z(&mut self, z: f32) {
        self.update_lighting(|l| l.light_z = z);
    }

    /// Shade ramp of a color reference, resolved through the table
    pub fn shades(&mut self, color: ColorRef) -> Arc<Shades> {
        let colix = self.colors.resolve(color);
        self.colix_shades(colix)
    }

    pub fn colix_shades(&mut self, colix: Colix) -> Arc<Shades> {
        self.colors.shades(colix, &self.shade)
    }

    /// Drop every derived cache. Colors and their handles survive.
    pub fn flush_caches(&mut self) {
        self.colors.flush_shades();
        self.spheres.flush();
        self.glyphs.flush();
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(Lighting::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shade::SHADE_NORMAL;

    #[test]
    fn test_shades_follow_changeable_colors() {
        let mut ctx = RenderContext::default();
        let color = ctx.colors.changeable(3, 0xFF11_2233);
        assert_eq!(ctx.shades(color)[SHADE_NORMAL], 0xFF11_2233);
        ctx.colors.change_color(3, 0xFF44_5566);
        assert_eq!(ctx.shades(color)[SHADE_NORMAL], 0xFF44_5566);
    }

    #[test]
    fn test_lighting_change_flushes_caches() {
        let mut ctx = RenderContext::default();
        let before = ctx.colix_shades(Colix::RED);
        ctx.spheres.shape(9, &mut ctx.shade);
        assert_eq!(ctx.spheres.cached_shapes(), 1);

        ctx.set_ambient_percent(10);
        assert_eq!(ctx.lighting().ambient_percent, 10);
        assert_eq!(ctx.spheres.cached_shapes(), 0);
        let after = ctx.colix_shades(Colix::RED);
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(after[0] < before[0]);
        // The base color itself never moves
        assert_eq!(after[SHADE_NORMAL], before[SHADE_NORMAL]);
    }

    #[test]
    fn test_unchanged_lighting_keeps_caches() {
        let mut ctx = RenderContext::default();
        let before = ctx.colix_shades(Colix::BLUE);
        ctx.set_specular(true);
        ctx.set_ambient_percent(ctx.lighting().ambient_percent);
        assert!(Arc::ptr_eq(&before, &ctx.colix_shades(Colix::BLUE)));
    }

    #[test]
    fn test_specular_toggle_changes_highlights() {
        let mut ctx = RenderContext::default();
        // Normal close to the half vector between light and viewer
        let lit = ctx.shade.intensity(-0.2, -0.2, 1.0);
        ctx.set_specular(false);
        assert!(!ctx.lighting().specular);
        assert!(ctx.shade.intensity(-0.2, -0.2, 1.0) < lit);
    }

    #[test]
    fn test_flush_caches_keeps_colors() {
        let mut ctx = RenderContext::default();
        let colix = ctx.colors.intern(0xFF12_3456);
        ctx.glyphs.bitmap("OH", Default::default());
        ctx.flush_caches();
        assert!(ctx.glyphs.is_empty());
        assert_eq!(ctx.colors.intern(0xFF12_3456), colix);
    }
}
