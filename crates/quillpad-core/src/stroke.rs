//! A single continuous stroke and its vector form.

use crate::color::SerializableColor;
use crate::sample::Sample;
use kurbo::{BezPath, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a stroke.
pub type StrokeId = Uuid;

/// Samples of one contact-down-to-contact-up interaction.
///
/// Every raw sample has exactly one smoothed counterpart, so both sequences
/// always have the same length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    id: StrokeId,
    samples: Vec<Sample>,
    smoothed_points: Vec<Sample>,
    /// Brush size captured when the stroke began.
    pub brush_size: f64,
    /// Brush color captured when the stroke began.
    pub brush_color: SerializableColor,
}

impl Stroke {
    /// Start an empty stroke with frozen brush parameters.
    pub fn new(brush_size: f64, brush_color: SerializableColor) -> Self {
        Self {
            id: Uuid::new_v4(),
            samples: Vec::new(),
            smoothed_points: Vec::new(),
            brush_size,
            brush_color,
        }
    }

    pub fn id(&self) -> StrokeId {
        self.id
    }

    /// Append a raw sample together with its smoothed point.
    pub fn push(&mut self, raw: Sample, smoothed: Sample) {
        self.samples.push(raw);
        self.smoothed_points.push(smoothed);
    }

    /// Raw samples in arrival order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Smoothed points, one per raw sample.
    pub fn smoothed_points(&self) -> &[Sample] {
        &self.smoothed_points
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent smoothed point.
    pub fn last_smoothed(&self) -> Option<&Sample> {
        self.smoothed_points.last()
    }

    /// Duration between the first and last sample in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => 0.0,
        }
    }

    /// Bounding box of the smoothed points, not including brush width.
    pub fn bounds(&self) -> Rect {
        let mut points = self.smoothed_points.iter().map(|s| s.position);
        let Some(first) = points.next() else {
            return Rect::ZERO;
        };
        points.fold(Rect::from_points(first, first), |rect, p| rect.union_pt(p))
    }

    /// The path as it is painted: a chain of quadratic segments, each using
    /// a smoothed point as control and the midpoint to the next as end.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let Some(first) = self.smoothed_points.first() else {
            return path;
        };

        path.move_to(first.position);
        for pair in self.smoothed_points.windows(2) {
            let (prior, next) = (pair[0].position, pair[1].position);
            path.quad_to(prior, prior.midpoint(next));
        }
        path
    }
}
