//! Shared utilities

/// Initial dither seed; the low bit must stay set.
pub const DITHER_SEED: u32 = 0x1234_5679;

/// Multiplicative LCG used for shading dither (x * 65539, the RANDU multiplier)
///
/// Statistically weak and only meant for visual noise. Each `ShadeModel` owns
/// its own generator, so there is no shared global seed.
#[derive(Debug, Clone)]
pub struct DitherRng {
    state: u32,
}

impl DitherRng {
    /// Create a new generator with the given seed
    pub fn new(seed: u32) -> Self {
        Self {
            state: (seed & 0x7FFF_FFFF) | 1,
        }
    }

    /// Advance the generator and return the new 31-bit state
    #[inline]
    pub fn next_u31(&mut self) -> u32 {
        let t = self.state;
        self.state = (t << 16).wrapping_add(t << 1).wrapping_add(t) & 0x7FFF_FFFF;
        self.state
    }

    /// Get a random value in [0, 255]
    #[inline]
    pub fn next_u8(&mut self) -> u32 {
        self.next_u31() >> 23
    }

    /// Low 16 bits of the current state, without advancing
    #[inline]
    pub fn low16(&self) -> u32 {
        self.state & 0xFFFF
    }

    /// Get a random value in [0, n)
    #[inline]
    pub fn below(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        (self.next_u31() >> 8) % n
    }
}

impl Default for DitherRng {
    fn default() -> Self {
        Self::new(DITHER_SEED)
    }
}

/// Force the alpha channel of an ARGB value to opaque
#[inline]
pub const fn opaque(argb: u32) -> u32 {
    argb | 0xFF00_0000
}

/// Split an ARGB value into (r, g, b)
#[inline]
pub const fn rgb_components(argb: u32) -> (u8, u8, u8) {
    ((argb >> 16) as u8, (argb >> 8) as u8, argb as u8)
}

/// Pack (r, g, b) into an opaque ARGB value
#[inline]
pub const fn argb_from_rgb(r: u8, g: u8, b: u8) -> u32 {
    0xFF00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dither_rng_deterministic_per_seed() {
        let mut a = DitherRng::default();
        let mut b = DitherRng::default();
        for _ in 0..100 {
            assert_eq!(a.next_u31(), b.next_u31());
        }
    }

    #[test]
    fn test_dither_rng_ranges() {
        let mut rng = DitherRng::new(42);
        for _ in 0..1000 {
            assert!(rng.next_u8() < 256);
            assert!(rng.low16() < 65536);
            assert!(rng.below(7) < 7);
        }
        assert_eq!(rng.below(0), 0);
    }

    #[test]
    fn test_rgb_round_trip() {
        let argb = argb_from_rgb(0x12, 0x34, 0x56);
        assert_eq!(argb, 0xFF12_3456);
        assert_eq!(rgb_components(argb), (0x12, 0x34, 0x56));
        assert_eq!(opaque(0x0012_3456), 0xFF12_3456);
    }
}
