#![forbid(unsafe_code)]

//! Backends for [`circadian_core::ChartLayout`].
//!
//! # Features
//!
//! - `raster`: PNG output via pure-Rust SVG rasterization (`resvg`)

pub mod svg;
pub mod text;

#[cfg(feature = "raster")]
pub mod raster;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid render options: {message}")]
    InvalidOptions { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
