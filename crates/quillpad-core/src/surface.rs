//! Raster drawing boundary.

use crate::color::SerializableColor;
use kurbo::{Point, Rect, Size};
use peniko::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Surface errors.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("No surface is attached")]
    Detached,
    #[error("Encoding failed: {0}")]
    Encode(String),
    #[error("Unsupported export format: {0:?}")]
    UnsupportedFormat(ExportFormat),
}

/// Result type for surface operations.
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// Encoded image formats a surface can export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportFormat {
    /// Lossless RGBA.
    #[default]
    Png,
    /// Lossy RGB, flattened onto white. Quality is 1-100.
    Jpeg { quality: u8 },
}

impl ExportFormat {
    /// File extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg { .. } => "jpg",
        }
    }
}

/// Canvas-style 2D drawing context over a raster.
///
/// Strokes are painted with round caps and joins. `stroke` paints the
/// segments added since the previous `stroke` call with the current color
/// and line width.
pub trait DrawingContext {
    /// Pixel size of the backing raster.
    fn backing_size(&self) -> Size;

    /// Set the color used by subsequent `stroke` calls.
    fn set_stroke_color(&mut self, color: Color);

    /// Set the line width used by subsequent `stroke` calls.
    fn set_line_width(&mut self, width: f64);

    /// Discard the current path.
    fn begin_path(&mut self);

    /// Start a new subpath.
    fn move_to(&mut self, point: Point);

    /// Append a quadratic curve from the current point.
    fn quad_to(&mut self, control: Point, end: Point);

    /// Paint pending path segments.
    fn stroke(&mut self);

    /// Reset pixels inside `rect` to the background.
    fn clear_rect(&mut self, rect: Rect);

    /// Reset every pixel to the background.
    fn clear(&mut self) {
        let size = self.backing_size();
        self.clear_rect(Rect::from_origin_size(Point::ZERO, size));
    }

    /// Encode the current pixels at full backing resolution.
    fn export(&self, format: ExportFormat) -> SurfaceResult<Vec<u8>>;

    /// Best-effort housekeeping between strokes.
    fn optimize(&mut self) {}
}

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    SetStrokeColor(SerializableColor),
    SetLineWidth(f64),
    BeginPath,
    MoveTo(Point),
    QuadTo { control: Point, end: Point },
    Stroke,
    ClearRect(Rect),
    Optimize,
}

/// Drawing context that records calls instead of painting.
#[derive(Debug, Clone)]
pub struct CommandRecorder {
    size: Size,
    commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    /// Create a recorder standing in for a raster of `size`.
    pub fn new(size: Size) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    /// Every command recorded so far.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of recorded commands matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| predicate(c)).count()
    }

    /// Line widths set so far, in order.
    pub fn line_widths(&self) -> Vec<f64> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::SetLineWidth(w) => Some(*w),
                _ => None,
            })
            .collect()
    }

    /// Drop recorded commands.
    pub fn reset(&mut self) {
        self.commands.clear();
    }
}

impl DrawingContext for CommandRecorder {
    fn backing_size(&self) -> Size {
        self.size
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.commands.push(DrawCommand::SetStrokeColor(color.into()));
    }

    fn set_line_width(&mut self, width: f64) {
        self.commands.push(DrawCommand::SetLineWidth(width));
    }

    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, point: Point) {
        self.commands.push(DrawCommand::MoveTo(point));
    }

    fn quad_to(&mut self, control: Point, end: Point) {
        self.commands.push(DrawCommand::QuadTo { control, end });
    }

    fn stroke(&mut self) {
        self.commands.push(DrawCommand::Stroke);
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.commands.push(DrawCommand::ClearRect(rect));
    }

    fn export(&self, format: ExportFormat) -> SurfaceResult<Vec<u8>> {
        Err(SurfaceError::UnsupportedFormat(format))
    }

    fn optimize(&mut self) {
        self.commands.push(DrawCommand::Optimize);
    }
}
