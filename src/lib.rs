//! Software z-buffered rasterizer for molecular scenes
//!
//! Takes primitives that are already projected to integer screen space
//! (spheres, cylinders, lines, triangles, splines, text) and composites them
//! into an ARGB image with a 16-bit depth buffer and a single directional
//! light. [`Graphics3D`] is the entry point.

pub mod color;
pub mod config;
pub mod context;
pub mod display;
pub mod error;
pub mod graphics;
pub mod render;
pub mod shade;
pub mod util;
pub mod xyzd;

pub use color::{Colix, ColorRef, ColorTable};
pub use config::EngineConfig;
pub use context::RenderContext;
pub use display::{Image, PixelBuffer};
pub use error::{ColorError, ConfigError, TextError};
pub use graphics::{Graphics3D, FALLBACK_ARGB};
pub use render::hermite::{HermiteCurve, TubeDiameters};
pub use render::text::{Font, FontRasterizer, GlyphImage};
pub use render::{EndCaps, Point3i};
pub use shade::{Lighting, ShadeModel, Shades};
pub use xyzd::Xyzd;
