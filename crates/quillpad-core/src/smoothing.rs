//! Three-point jitter smoothing of stroke samples.

use crate::sample::Sample;
use kurbo::Point;

/// Number of earlier samples a smoothed point depends on.
pub const WINDOW_LEN: usize = 2;

/// Smooth `sample` against the raw samples that preceded it.
///
/// With fewer than two predecessors the sample is returned unchanged.
/// Otherwise the position is `(p0 + 2 * p1 + p2) / 4` where `p0` and `p1` are
/// the last two entries of `window`. Pressure and timestamp come from `sample`.
pub fn smooth(sample: Sample, window: &[Sample]) -> Sample {
    let [.., p0, p1] = window else {
        return sample;
    };
    let (a, b, c) = (p0.position, p1.position, sample.position);
    Sample {
        position: Point::new(
            (a.x + 2.0 * b.x + c.x) / 4.0,
            (a.y + 2.0 * b.y + c.y) / 4.0,
        ),
        ..sample
    }
}

/// Rolling window over the raw samples of one stroke.
#[derive(Debug, Clone, Default)]
pub struct PathSmoother {
    window: Vec<Sample>,
}

impl PathSmoother {
    pub fn new() -> Self {
        Self {
            window: Vec::with_capacity(WINDOW_LEN),
        }
    }

    /// Forget the history of the previous stroke.
    pub fn reset(&mut self) {
        self.window.clear();
    }

    /// Smooth the next raw sample and remember it.
    pub fn push(&mut self, sample: Sample) -> Sample {
        let smoothed = smooth(sample, &self.window);
        if self.window.len() == WINDOW_LEN {
            self.window.remove(0);
        }
        self.window.push(sample);
        smoothed
    }
}
