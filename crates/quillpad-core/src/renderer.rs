//! Incremental stroke painting onto a [`DrawingContext`].

use crate::sample::Sample;
use crate::surface::DrawingContext;
use peniko::Color;

/// Parameters frozen for the stroke being painted.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveStroke {
    brush_size: f64,
    pressure_sizing: bool,
}

/// Paints smoothed points as a continuous chain of quadratic curves.
///
/// Every operation is a no-op when no surface is supplied; nothing is queued
/// for later.
#[derive(Debug, Clone, Default)]
pub struct StrokeRenderer {
    active: Option<ActiveStroke>,
}

impl StrokeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a stroke is being painted.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Line width for `pressure` in the active stroke.
    pub fn line_width(&self, pressure: f64) -> Option<f64> {
        self.active.map(|stroke| stroke_width(stroke, pressure))
    }

    /// Start painting a stroke at `first`.
    pub fn begin_stroke<C: DrawingContext + ?Sized>(
        &mut self,
        surface: Option<&mut C>,
        first: &Sample,
        brush_size: f64,
        brush_color: Color,
        pressure_sizing: bool,
    ) {
        let stroke = ActiveStroke {
            brush_size,
            pressure_sizing,
        };
        self.active = Some(stroke);

        let Some(surface) = surface else {
            log::debug!("begin_stroke without a surface; drawing dropped");
            return;
        };
        surface.set_stroke_color(brush_color);
        surface.set_line_width(stroke_width(stroke, first.pressure));
        surface.begin_path();
        surface.move_to(first.position);
    }

    /// Paint the segment controlled by `prior` that ends halfway to `next`.
    pub fn extend_stroke<C: DrawingContext + ?Sized>(
        &mut self,
        surface: Option<&mut C>,
        prior: &Sample,
        next: &Sample,
    ) {
        let (Some(stroke), Some(surface)) = (self.active, surface) else {
            return;
        };
        let end = prior.position.midpoint(next.position);
        surface.quad_to(prior.position, end);
        if stroke.pressure_sizing {
            surface.set_line_width(stroke_width(stroke, next.pressure));
        }
        surface.stroke();
    }

    /// Flush pending segments and forget the stroke.
    pub fn end_stroke<C: DrawingContext + ?Sized>(&mut self, surface: Option<&mut C>) {
        if self.active.take().is_none() {
            return;
        }
        if let Some(surface) = surface {
            surface.stroke();
            surface.begin_path();
        }
    }

    /// Forget the stroke without painting anything.
    pub fn reset(&mut self) {
        self.active = None;
    }
}

fn stroke_width(stroke: ActiveStroke, pressure: f64) -> f64 {
    if stroke.pressure_sizing {
        stroke.brush_size * pressure
    } else {
        stroke.brush_size
    }
}
