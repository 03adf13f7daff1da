//! Frame buffer lifecycle
//!
//! Owns the render buffers, handles the 2x2 supersampled mode and hands the
//! finished frame out as an [`Image`]. Buffers are allocated lazily on the
//! first frame after [`Platform::configure`].

use super::clearer::BackgroundClearer;
use super::pixel_buffer::PixelBuffer;

/// A finished frame, borrowed from the platform
#[derive(Debug, Clone, Copy)]
pub struct Image<'a> {
    pub pixels: &'a [u32],
    pub width: u32,
    pub height: u32,
}

impl Image<'_> {
    /// Read a pixel (bounds checked)
    pub fn pixel_at(&self, x: u32, y: u32) -> Option<u32> {
        if x < self.width && y < self.height {
            self.pixels.get((y * self.width + x) as usize).copied()
        } else {
            None
        }
    }
}

pub struct Platform {
    window_width: u32,
    window_height: u32,
    antialias: bool,
    background: u32,
    use_clear_thread: bool,
    current: Option<PixelBuffer>,
    spare: Option<PixelBuffer>,
    clearer: Option<BackgroundClearer>,
    downsampled: Vec<u32>,
    frame_ready: bool,
}

impl Platform {
    pub fn new(use_clear_thread: bool) -> Self {
        Self {
            window_width: 0,
            window_height: 0,
            antialias: false,
            background: 0xFF00_0000,
            use_clear_thread,
            current: None,
            spare: None,
            clearer: None,
            downsampled: Vec::new(),
            frame_ready: false,
        }
    }

    /// Set the output size and supersampling mode.
    ///
    /// No-op if nothing changed. Otherwise existing buffers are dropped and
    /// reallocated at the next [`begin_frame`](Self::begin_frame).
    pub fn configure(&mut self, width: u32, height: u32, antialias: bool) {
        if width == self.window_width && height == self.window_height && antialias == self.antialias
        {
            return;
        }
        self.release();
        self.window_width = width;
        self.window_height = height;
        self.antialias = antialias;
        log::debug!(
            "configured {}x{} (buffer {}x{}, antialias {})",
            width,
            height,
            self.buffer_width(),
            self.buffer_height(),
            antialias
        );
    }

    #[inline]
    pub fn window_width(&self) -> u32 {
        self.window_width
    }

    #[inline]
    pub fn window_height(&self) -> u32 {
        self.window_height
    }

    #[inline]
    pub fn antialias(&self) -> bool {
        self.antialias
    }

    /// Scale from window to buffer coordinates (2 when supersampling)
    #[inline]
    pub fn scale(&self) -> u32 {
        if self.antialias {
            2
        } else {
            1
        }
    }

    #[inline]
    pub fn buffer_width(&self) -> u32 {
        self.window_width * self.scale()
    }

    #[inline]
    pub fn buffer_height(&self) -> u32 {
        self.window_height * self.scale()
    }

    #[inline]
    pub fn background(&self) -> u32 {
        self.background
    }

    /// Set the clear color for subsequent frames (forced opaque)
    pub fn set_background(&mut self, argb: u32) {
        self.background = argb | 0xFF00_0000;
    }

    fn allocate(&self) -> PixelBuffer {
        log::debug!(
            "allocating {}x{} frame buffer",
            self.buffer_width(),
            self.buffer_height()
        );
        let mut buffer = PixelBuffer::with_size(self.buffer_width(), self.buffer_height());
        buffer.clear(self.background);
        buffer
    }

    fn fits(&self, buffer: &PixelBuffer) -> bool {
        buffer.width() as u32 == self.buffer_width()
            && buffer.height() as u32 == self.buffer_height()
    }

    fn ensure_clearer(&mut self) {
        if !self.use_clear_thread || self.clearer.is_some() {
            return;
        }
        match BackgroundClearer::spawn() {
            Ok(clearer) => self.clearer = Some(clearer),
            Err(e) => {
                log::warn!("could not start clearing thread, clearing inline: {}", e);
                self.use_clear_thread = false;
            }
        }
    }

    /// Make a cleared buffer current.
    ///
    /// With the clearing thread, the previous frame's buffer goes to the
    /// worker and the buffer it cleared during the last frame comes back.
    pub fn begin_frame(&mut self) {
        self.ensure_clearer();
        self.frame_ready = false;
        let background = self.background;
        let previous = self.current.take();

        let next = match self.clearer.as_mut() {
            Some(clearer) => {
                let next = clearer.acquire(background);
                if let Some(previous) = previous {
                    if let Err(previous) = clearer.release(previous, background) {
                        self.spare = Some(previous);
                    }
                }
                next
            }
            None => previous,
        };

        let mut buffer = next
            .or_else(|| self.spare.take())
            .filter(|b| self.fits(b))
            .unwrap_or_else(|| self.allocate());
        if buffer.cleared_to() != Some(background) {
            buffer.clear(background);
        }
        buffer.mark_dirty();
        self.current = Some(buffer);
    }

    /// Finish the frame; downsample when supersampling
    pub fn end_frame(&mut self) {
        let Some(buffer) = &self.current else {
            return;
        };
        if self.antialias {
            buffer.downsample_into(&mut self.downsampled);
        }
        self.frame_ready = true;
    }

    /// The buffer being rendered into
    #[inline]
    pub fn buffer_mut(&mut self) -> Option<&mut PixelBuffer> {
        self.current.as_mut()
    }

    #[inline]
    pub fn buffer(&self) -> Option<&PixelBuffer> {
        self.current.as_ref()
    }

    /// The last finished frame at window resolution
    pub fn image(&self) -> Option<Image<'_>> {
        if !self.frame_ready {
            return None;
        }
        let pixels = if self.antialias {
            &self.downsampled[..]
        } else {
            self.current.as_ref()?.pixels()
        };
        Some(Image {
            pixels,
            width: self.window_width,
            height: self.window_height,
        })
    }

    /// True if anything was drawn into the current buffer
    pub fn has_content(&self) -> bool {
        self.current.as_ref().is_some_and(PixelBuffer::has_content)
    }

    /// Drop every buffer and stop the clearing thread
    pub fn release(&mut self) {
        let had_buffers = self.current.is_some() || self.spare.is_some();
        self.current = None;
        self.spare = None;
        self.clearer = None;
        self.downsampled = Vec::new();
        self.frame_ready = false;
        if had_buffers {
            log::debug!("released frame buffers");
        }
    }
}

impl Drop for Platform {
    fn drop(&mut self) {
        self.release();
    }
}
