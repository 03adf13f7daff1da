// ============================================================================
// PixelBuffer
// ============================================================================

/// Depth of a pixel nothing has been drawn to
pub const BACKGROUND_DEPTH: i16 = i16::MAX;

/// Fixed-point shift used for interpolated z along spans and lines
pub const Z_SHIFT: u32 = 10;

/// ARGB32 color buffer with a parallel 16-bit depth buffer
///
/// Lower depth is nearer. A write lands only if its z is strictly less than
/// the stored depth and lies inside the current slab/depth clip range, so the
/// final image does not depend on draw order.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    pixels: Vec<u32>,
    depth: Vec<i16>,
    width: i32,
    height: i32,
    slab: i32,
    depth_plane: i32,
    cleared_to: Option<u32>,
}

impl PixelBuffer {
    /// Create a buffer filled with opaque black at background depth
    pub fn with_size(width: u32, height: u32) -> Self {
        let count = (width as usize) * (height as usize);
        Self {
            pixels: vec![0xFF00_0000; count],
            depth: vec![BACKGROUND_DEPTH; count],
            width: width as i32,
            height: height as i32,
            slab: 0,
            depth_plane: i32::from(BACKGROUND_DEPTH) - 1,
            cleared_to: Some(0xFF00_0000),
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    #[inline]
    pub fn depths(&self) -> &[i16] {
        &self.depth
    }

    /// Check if coordinates are within bounds
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    /// True if the box [x0, x1] x [y0, y1] lies entirely inside the buffer
    #[inline]
    pub fn contains_box(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> bool {
        x0 >= 0 && y0 >= 0 && x1 < self.width && y1 < self.height
    }

    /// True if the box [x0, x1] x [y0, y1] misses the buffer entirely
    #[inline]
    pub fn misses_box(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> bool {
        x1 < 0 || y1 < 0 || x0 >= self.width || y0 >= self.height
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    /// Clear color to `background` (forced opaque) and depth to background
    pub fn clear(&mut self, background: u32) {
        let background = background | 0xFF00_0000;
        self.pixels.fill(background);
        self.depth.fill(BACKGROUND_DEPTH);
        self.cleared_to = Some(background);
    }

    /// Background this buffer was last cleared to, if untouched since
    #[inline]
    pub fn cleared_to(&self) -> Option<u32> {
        self.cleared_to
    }

    /// Mark the buffer as handed to a renderer; it no longer counts as clear
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.cleared_to = None;
    }

    // ========================================================================
    // Clip planes
    // ========================================================================

    /// Set the near (slab) and far (depth) z bounds; writes outside are dropped
    pub fn set_clip_planes(&mut self, slab: i32, depth: i32) {
        self.slab = slab.max(i32::from(i16::MIN));
        self.depth_plane = depth.min(i32::from(BACKGROUND_DEPTH) - 1);
    }

    #[inline]
    pub fn slab(&self) -> i32 {
        self.slab
    }

    #[inline]
    pub fn depth_plane(&self) -> i32 {
        self.depth_plane
    }

    /// True if z lies outside the slab/depth range
    #[inline]
    pub fn is_z_clipped(&self, z: i32) -> bool {
        z < self.slab || z > self.depth_plane
    }

    // ========================================================================
    // Depth-tested writes
    // ========================================================================

    /// Depth-tested write at a precomputed offset
    #[inline]
    fn write(&mut self, offset: usize, z: i32, argb: u32) {
        if z < self.slab || z > self.depth_plane {
            return;
        }
        // depth_plane < BACKGROUND_DEPTH, so z fits in i16 here
        let z = z as i16;
        if z < self.depth[offset] {
            self.depth[offset] = z;
            self.pixels[offset] = argb;
        }
    }

    /// Depth-tested pixel write with bounds check
    #[inline]
    pub fn plot(&mut self, x: i32, y: i32, z: i32, argb: u32) {
        if self.in_bounds(x, y) {
            let offset = self.offset(x, y);
            self.write(offset, z, argb);
        }
    }

    /// Depth-tested pixel write for coordinates the caller already bounded
    #[inline]
    pub fn plot_in_bounds(&mut self, x: i32, y: i32, z: i32, argb: u32) {
        debug_assert!(self.in_bounds(x, y), "plot_in_bounds({}, {})", x, y);
        let offset = self.offset(x, y);
        self.write(offset, z, argb);
    }

    /// Horizontal run [x0, x1] on row y with z interpolated from z0 to z1
    pub fn span(&mut self, y: i32, x0: i32, z0: i32, x1: i32, z1: i32, argb: u32) {
        if y < 0 || y >= self.height {
            return;
        }
        let (x0, z0, x1, z1) = if x0 <= x1 {
            (x0, z0, x1, z1)
        } else {
            (x1, z1, x0, z0)
        };
        let start = x0.max(0);
        let end = x1.min(self.width - 1);
        if start > end {
            return;
        }

        // Off-screen end points can be far enough apart to overflow i32
        let run = i64::from(x1) - i64::from(x0);
        let mut zf = (i64::from(z0) << Z_SHIFT) + (1 << (Z_SHIFT - 1));
        let dz = if run > 0 {
            ((i64::from(z1) - i64::from(z0)) << Z_SHIFT) / run
        } else {
            0
        };
        // Adjust for clipping on the left
        zf += dz * (i64::from(start) - i64::from(x0));

        let mut offset = self.offset(start, y);
        for _ in start..=end {
            self.write(offset, (zf >> Z_SHIFT) as i32, argb);
            zf += dz;
            offset += 1;
        }
    }

    /// Read a pixel from the buffer (bounds checked)
    #[inline]
    pub fn pixel_at(&self, x: i32, y: i32) -> Option<u32> {
        self.in_bounds(x, y).then(|| self.pixels[self.offset(x, y)])
    }

    /// Read depth value at (x, y)
    #[inline]
    pub fn depth_at(&self, x: i32, y: i32) -> Option<i16> {
        self.in_bounds(x, y).then(|| self.depth[self.offset(x, y)])
    }

    /// True if any pixel has been written since the last clear
    pub fn has_content(&self) -> bool {
        self.depth.iter().any(|&d| d != BACKGROUND_DEPTH)
    }

    // ========================================================================
    // Buffer Operations
    // ========================================================================

    /// Average each 2x2 block into `out` (half width, half height)
    pub fn downsample_into(&self, out: &mut Vec<u32>) {
        let w = (self.width / 2) as usize;
        let h = (self.height / 2) as usize;
        let stride = self.width as usize;
        out.clear();
        out.reserve(w * h);
        for row in 0..h {
            let top = row * 2 * stride;
            let bottom = top + stride;
            for col in 0..w {
                let i = col * 2;
                out.push(average4(
                    self.pixels[top + i],
                    self.pixels[top + i + 1],
                    self.pixels[bottom + i],
                    self.pixels[bottom + i + 1],
                ));
            }
        }
    }
}

/// Rounded per-channel average of four opaque ARGB pixels
#[inline]
fn average4(a: u32, b: u32, c: u32, d: u32) -> u32 {
    let channel = |shift: u32| {
        let sum = ((a >> shift) & 0xFF)
            + ((b >> shift) & 0xFF)
            + ((c >> shift) & 0xFF)
            + ((d >> shift) & 0xFF);
        ((sum + 2) >> 2) << shift
    };
    0xFF00_0000 | channel(16) | channel(8) | channel(0)
}

/// View an ARGB buffer as native-endian bytes, e.g. for an SDL ARGB8888 texture
pub fn argb_bytes(pixels: &[u32]) -> &[u8] {
    // Safety: u8 has no alignment requirement and every bit pattern is valid;
    // the byte length covers exactly the u32 slice.
    unsafe { std::slice::from_raw_parts(pixels.as_ptr().cast::<u8>(), pixels.len() * 4) }
}
