//! Shading model
//!
//! Every color is expanded into a 64-entry ramp running from ambient-darkened
//! (index 0) through the unmodified color ([`SHADE_NORMAL`]) up to a specular
//! highlight (index 63). Surface normals are quantized to a ramp index by a
//! single directional light.
//!
//! Normals are given in screen orientation: x to the right, y down, z toward
//! the viewer.

use serde::{Deserialize, Serialize};

use crate::util::{argb_from_rgb, opaque, rgb_components, DitherRng};

pub const SHADE_COUNT: usize = 64;
pub const SHADE_LAST: usize = SHADE_COUNT - 1;
/// Ramp index holding the unmodified base color
pub const SHADE_NORMAL: usize = 52;

/// How far the top of the ramp moves from the base color toward white.
/// Fixed; `specular_percent` scales the lookup intensity, not the ramp.
const HIGHLIGHT_FRACTION: f32 = 0.9;

const LIGHT_SOURCE_X: f32 = -1.0;
const LIGHT_SOURCE_Y: f32 = -1.0;

/// One color's shade ramp
pub type Shades = [u32; SHADE_COUNT];

/// Global lighting parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lighting {
    /// Brightness of ramp index 0, as a percentage of the base color
    pub ambient_percent: u8,
    /// Weight of the Lambert term
    pub diffuse_percent: u8,
    pub specular: bool,
    /// Weight of the highlight term
    pub specular_percent: u8,
    pub specular_exponent: u8,
    /// Height of the light source above the screen plane
    pub light_z: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient_percent: 45,
            diffuse_percent: 84,
            specular: true,
            specular_percent: 22,
            specular_exponent: 25,
            light_z: 2.5,
        }
    }
}

/// Lighting state plus the dither generator used for noisy intensities
#[derive(Debug, Clone)]
pub struct ShadeModel {
    lighting: Lighting,
    light: [f32; 3],
    rng: DitherRng,
}

impl ShadeModel {
    pub fn new(lighting: Lighting) -> Self {
        Self {
            light: light_direction(lighting.light_z),
            lighting,
            rng: DitherRng::default(),
        }
    }

    #[inline]
    pub fn lighting(&self) -> &Lighting {
        &self.lighting
    }

    /// Replace the lighting parameters.
    ///
    /// Only [`RenderContext`](crate::RenderContext) calls this, because every
    /// cached ramp and sphere shape has to be dropped alongside.
    pub(crate) fn set_lighting(&mut self, lighting: Lighting) {
        self.light = light_direction(lighting.light_z);
        self.lighting = lighting;
    }

    /// Unit vector toward the light source
    #[inline]
    pub fn light_direction(&self) -> [f32; 3] {
        self.light
    }

    /// Build the 64-entry shade ramp for a base color
    pub fn shade_ramp(&self, argb: u32) -> Shades {
        let (r, g, b) = rgb_components(argb);
        let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
        let mut shades = [0u32; SHADE_COUNT];

        shades[SHADE_NORMAL] = opaque(argb);

        let ambient = f32::from(self.lighting.ambient_percent.min(100)) / 100.0;
        let ambient_range = 1.0 - ambient;
        for (i, shade) in shades.iter_mut().enumerate().take(SHADE_NORMAL) {
            let fraction = ambient + ambient_range * i as f32 / SHADE_NORMAL as f32;
            *shade = argb_from_rgb(
                channel(r * fraction),
                channel(g * fraction),
                channel(b * fraction),
            );
        }

        let steps = SHADE_LAST - SHADE_NORMAL;
        let (rr, gr, br) = (
            (255.5 - r) * HIGHLIGHT_FRACTION,
            (255.5 - g) * HIGHLIGHT_FRACTION,
            (255.5 - b) * HIGHLIGHT_FRACTION,
        );
        for i in 1..=steps {
            let t = i as f32 / steps as f32;
            shades[SHADE_NORMAL + i] =
                argb_from_rgb(channel(r + rr * t), channel(g + gr * t), channel(b + br * t));
        }
        shades
    }

    /// Light intensity in [0, 1] for a unit normal
    pub fn intensity_normalized(&self, x: f32, y: f32, z: f32) -> f32 {
        let [lx, ly, lz] = self.light;
        let cos_theta = x * lx + y * ly + z * lz;
        let mut intensity = 0.0;
        if cos_theta > 0.0 {
            intensity += cos_theta * f32::from(self.lighting.diffuse_percent) / 100.0;
            if self.lighting.specular {
                let reflect = z * 2.0 * cos_theta - lz;
                if reflect > 0.0 {
                    intensity += reflect.powi(i32::from(self.lighting.specular_exponent))
                        * f32::from(self.lighting.specular_percent)
                        / 100.0;
                }
            }
        }
        intensity.min(1.0)
    }

    /// Ramp index for an arbitrary (non-zero) normal vector
    pub fn intensity(&self, x: f32, y: f32, z: f32) -> u8 {
        let magnitude = (x * x + y * y + z * z).sqrt();
        if magnitude <= f32::EPSILON {
            return 0;
        }
        let f = self.intensity_normalized(x / magnitude, y / magnitude, z / magnitude);
        (f * SHADE_LAST as f32 + 0.5) as u8
    }

    /// Ramp index with dithering noise.
    ///
    /// The fractional part of the exact index is used as the probability of
    /// rounding up, then the result is nudged one level up or down about a
    /// third of the time each. Advances the generator, so identical inputs give
    /// varying results.
    pub fn dithered_intensity(&mut self, x: f32, y: f32, z: f32) -> u8 {
        let magnitude = (x * x + y * y + z * z).sqrt();
        if magnitude <= f32::EPSILON {
            return 0;
        }
        let f = self.intensity_normalized(x / magnitude, y / magnitude, z / magnitude);
        let fp8 = (f * SHADE_LAST as f32 * 256.0) as u32;
        let mut index = (fp8 >> 8) as usize;
        if (fp8 & 0xFF) > self.rng.next_u8() {
            index += 1;
        }
        let noise = self.rng.low16();
        if noise < 65536 / 3 && index > 0 {
            index -= 1;
        } else if noise > 65536 * 2 / 3 && index < SHADE_LAST {
            index += 1;
        }
        index.min(SHADE_LAST) as u8
    }

    /// Uniform pick in [0, n), from the same generator as the dither
    #[inline]
    pub fn random_below(&mut self, n: u32) -> u32 {
        self.rng.below(n)
    }
}

impl Default for ShadeModel {
    fn default() -> Self {
        Self::new(Lighting::default())
    }
}

fn light_direction(light_z: f32) -> [f32; 3] {
    let magnitude =
        (LIGHT_SOURCE_X * LIGHT_SOURCE_X + LIGHT_SOURCE_Y * LIGHT_SOURCE_Y + light_z * light_z)
            .sqrt();
    [
        LIGHT_SOURCE_X / magnitude,
        LIGHT_SOURCE_Y / magnitude,
        light_z / magnitude,
    ]
}

#[inline]
fn channel(v: f32) -> u8 {
    (v + 0.5).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_normal_is_base_color() {
        let model = ShadeModel::default();
        for argb in [0x00FF_0000, 0x8012_3456, 0xFFFF_FFFF, 0x0000_0000, 0xFF7F_7F7F] {
            let ramp = model.shade_ramp(argb);
            assert_eq!(ramp[SHADE_NORMAL], argb | 0xFF00_0000);
        }
    }

    #[test]
    fn test_ramp_ambient_never_brightens() {
        let model = ShadeModel::default();
        for argb in [0xFFFF_8000, 0xFF01_02FE, 0xFFFF_FFFF, 0xFF00_0000] {
            let (r, g, b) = rgb_components(argb);
            let (r0, g0, b0) = rgb_components(model.shade_ramp(argb)[0]);
            assert!(r0 <= r && g0 <= g && b0 <= b, "{:08x}", argb);
        }
    }

    #[test]
    fn test_ramp_is_monotonic_per_channel() {
        let model = ShadeModel::default();
        let ramp = model.shade_ramp(0xFF40_80C0);
        for pair in ramp.windows(2) {
            let (r0, g0, b0) = rgb_components(pair[0]);
            let (r1, g1, b1) = rgb_components(pair[1]);
            assert!(r0 <= r1 && g0 <= g1 && b0 <= b1);
        }
        // Highlight end tends toward white
        let (r, g, b) = rgb_components(ramp[SHADE_LAST]);
        assert!(r > 0xE0 && g > 0xE0 && b > 0xE0);
    }

    #[test]
    fn test_ramp_highlight_ignores_specular_percent() {
        let dull = ShadeModel::new(Lighting {
            specular_percent: 0,
            ..Lighting::default()
        });
        let shiny = ShadeModel::new(Lighting {
            specular_percent: 100,
            ..Lighting::default()
        });
        let ramp = dull.shade_ramp(0xFF40_80C0);
        assert_eq!(ramp, shiny.shade_ramp(0xFF40_80C0));
        // 0x40 + (255.5 - 0x40) * 0.9 = 236.35
        let (r, _, _) = rgb_components(ramp[SHADE_LAST]);
        assert!((235..=237).contains(&r), "r = {}", r);
    }

    #[test]
    fn test_ramp_is_opaque() {
        let model = ShadeModel::default();
        assert!(model.shade_ramp(0x0011_2233).iter().all(|s| s >> 24 == 0xFF));
    }

    #[test]
    fn test_intensity_range_and_direction() {
        let model = ShadeModel::default();
        // Facing away from the light gets pure ambient
        assert_eq!(model.intensity(1.0, 1.0, -2.5), 0);
        // Facing the light head-on is brighter than facing the viewer
        let lit = model.intensity(-1.0, -1.0, 2.5);
        let front = model.intensity(0.0, 0.0, 1.0);
        assert!(lit >= front);
        assert!(usize::from(lit) <= SHADE_LAST);
        // Scale invariant
        assert_eq!(model.intensity(0.0, 0.0, 1.0), model.intensity(0.0, 0.0, 40.0));
        assert_eq!(model.intensity(0.0, 0.0, 0.0), 0);
    }

    #[test]
    fn test_specular_off_lowers_highlight() {
        let on = ShadeModel::default();
        let off = ShadeModel::new(Lighting {
            specular: false,
            ..Lighting::default()
        });
        let [lx, ly, lz] = on.light_direction();
        assert!(on.intensity_normalized(lx, ly, lz) >= off.intensity_normalized(lx, ly, lz));
    }

    #[test]
    fn test_dithered_intensity_stays_near_exact() {
        let mut model = ShadeModel::default();
        let exact = i32::from(model.intensity(0.3, -0.2, 0.9));
        let mut sum = 0i32;
        for _ in 0..2000 {
            let d = i32::from(model.dithered_intensity(0.3, -0.2, 0.9));
            assert!((d - exact).abs() <= 2, "dither {} vs exact {}", d, exact);
            sum += d;
        }
        let mean = sum as f32 / 2000.0;
        assert!((mean - exact as f32).abs() < 1.0);
    }

    #[test]
    fn test_set_lighting_moves_light() {
        let mut model = ShadeModel::default();
        let before = model.light_direction();
        model.set_lighting(Lighting {
            light_z: 10.0,
            ..Lighting::default()
        });
        assert!(model.light_direction()[2] > before[2]);
    }
}
