mod clearer;
mod pixel_buffer;
mod platform;

pub use clearer::BackgroundClearer;
pub use pixel_buffer::{argb_bytes, PixelBuffer, BACKGROUND_DEPTH, Z_SHIFT};
pub use platform::{Image, Platform};
