//! Quillpad Render Library
//!
//! CPU raster implementation of the core [`DrawingContext`] boundary.
//!
//! [`DrawingContext`]: quillpad_core::surface::DrawingContext

mod export;
mod raster;

pub use export::{encode_jpeg, encode_png};
pub use raster::RasterSurface;
