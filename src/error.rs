//! Error types
//!
//! Rendering itself never fails; these cover configuration I/O, the explicit
//! color-string parsers and the font rasterizer seam.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or saving an [`EngineConfig`](crate::EngineConfig)
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read or written
    #[error("config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for the expected schema
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised by the strict color-string parsers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    /// Name is not in the color dictionary
    #[error("unknown color name: {0}")]
    UnknownName(String),

    /// Looked like a hex color but did not parse
    #[error("malformed hex color: {0}")]
    MalformedHex(String),
}

/// Errors raised by a [`FontRasterizer`](crate::FontRasterizer)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    /// The rasterizer could not produce an image for the string
    #[error("font rasterizer failed for {text:?}: {reason}")]
    Rasterize { text: String, reason: String },
}
