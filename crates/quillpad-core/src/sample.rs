//! Raw contact events and their conversion to canvas-space samples.

use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Pressure used when the device reports none.
pub const DEFAULT_PRESSURE: f64 = 0.5;

/// Lowest pressure a sample may carry.
pub const MIN_PRESSURE: f64 = 0.1;

/// Highest pressure a sample may carry.
pub const MAX_PRESSURE: f64 = 1.0;

/// Phase of a contact event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactPhase {
    Start,
    Move,
    End,
    Cancel,
}

impl ContactPhase {
    /// Whether this phase terminates the contact.
    pub fn is_terminal(self) -> bool {
        matches!(self, ContactPhase::End | ContactPhase::Cancel)
    }
}

impl From<winit::event::TouchPhase> for ContactPhase {
    fn from(phase: winit::event::TouchPhase) -> Self {
        use winit::event::TouchPhase;

        match phase {
            TouchPhase::Started => Self::Start,
            TouchPhase::Moved => Self::Move,
            TouchPhase::Ended => Self::End,
            TouchPhase::Cancelled => Self::Cancel,
        }
    }
}

/// One raw touch/pointer event in client (display) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactEvent {
    /// Stable id of the contact for its whole down-to-up lifetime.
    pub contact_id: u64,
    /// Position in client coordinates.
    pub client: Point,
    /// Device-reported force, if any.
    #[serde(default)]
    pub force: Option<f64>,
    pub phase: ContactPhase,
    /// Capture time in milliseconds.
    pub timestamp: f64,
}

impl ContactEvent {
    /// Create an event without force information.
    pub fn new(contact_id: u64, client: Point, phase: ContactPhase, timestamp: f64) -> Self {
        Self {
            contact_id,
            client,
            force: None,
            phase,
            timestamp,
        }
    }

    /// Attach a device-reported force.
    pub fn with_force(mut self, force: f64) -> Self {
        self.force = Some(force);
        self
    }

    /// Convert a winit touch event. winit does not timestamp touches, so the
    /// caller supplies the capture time.
    pub fn from_touch(touch: &winit::event::Touch, timestamp: f64) -> Self {
        Self {
            contact_id: touch.id,
            client: Point::new(touch.location.x, touch.location.y),
            force: touch.force.map(|force| force.normalized()),
            phase: touch.phase.into(),
            timestamp,
        }
    }
}

/// Geometry needed to map client coordinates onto the backing raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasMetrics {
    /// Size the surface is displayed at, in client units.
    pub displayed_size: Size,
    /// True pixel size of the raster.
    pub backing_size: Size,
    /// Client-space position of the surface's top-left corner.
    #[serde(default)]
    pub origin: Point,
}

impl CanvasMetrics {
    /// Metrics for a surface displayed at its backing resolution.
    pub fn unscaled(size: Size) -> Self {
        Self {
            displayed_size: size,
            backing_size: size,
            origin: Point::ZERO,
        }
    }

    /// Per-axis factor from client units to backing pixels.
    ///
    /// An axis with no usable displayed extent maps 1:1.
    pub fn scale(&self) -> Vec2 {
        let axis = |backing: f64, displayed: f64| {
            let factor = backing / displayed;
            if displayed > 0.0 && factor.is_finite() { factor } else { 1.0 }
        };
        Vec2::new(
            axis(self.backing_size.width, self.displayed_size.width),
            axis(self.backing_size.height, self.displayed_size.height),
        )
    }

    /// Map a client-space point into backing pixels.
    pub fn to_backing(&self, client: Point) -> Point {
        let scale = self.scale();
        let local = client - self.origin;
        Point::new(local.x * scale.x, local.y * scale.y)
    }
}

/// One observed contact point in canvas pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub position: Point,
    /// Normalized pressure in `[MIN_PRESSURE, MAX_PRESSURE]`.
    pub pressure: f64,
    /// Capture time in milliseconds.
    pub timestamp: f64,
}

impl Sample {
    pub fn new(position: Point, pressure: f64, timestamp: f64) -> Self {
        Self {
            position,
            pressure,
            timestamp,
        }
    }
}

/// Convert a raw event into a sample.
///
/// Force is only honoured when `pressure_enabled` is set and the device
/// reported a finite value; the result is clamped so strokes never vanish.
pub fn sample(event: &ContactEvent, metrics: &CanvasMetrics, pressure_enabled: bool) -> Sample {
    let raw_pressure = match event.force {
        Some(force) if pressure_enabled && force.is_finite() => force,
        _ => DEFAULT_PRESSURE,
    };
    Sample {
        position: metrics.to_backing(event.client),
        pressure: raw_pressure.clamp(MIN_PRESSURE, MAX_PRESSURE),
        timestamp: event.timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;
    use winit::event::{DeviceId, Force, Touch, TouchPhase};

    fn touch(phase: TouchPhase, force: Option<Force>) -> Touch {
        Touch {
            // SAFETY: the id is only compared, never passed back to winit.
            device_id: unsafe { DeviceId::dummy() },
            phase,
            location: PhysicalPosition::new(120.0, 45.5),
            force,
            id: 9,
        }
    }

    #[test]
    fn test_touch_phases() {
        assert_eq!(ContactPhase::from(TouchPhase::Started), ContactPhase::Start);
        assert_eq!(ContactPhase::from(TouchPhase::Moved), ContactPhase::Move);
        assert_eq!(ContactPhase::from(TouchPhase::Ended), ContactPhase::End);
        assert_eq!(ContactPhase::from(TouchPhase::Cancelled), ContactPhase::Cancel);
    }

    #[test]
    fn test_from_touch() {
        let event = ContactEvent::from_touch(&touch(TouchPhase::Moved, None), 16.0);
        assert_eq!(event.contact_id, 9);
        assert_eq!(event.client, Point::new(120.0, 45.5));
        assert_eq!(event.phase, ContactPhase::Move);
        assert_eq!(event.force, None);
        assert_eq!(event.timestamp, 16.0);

        let normalized = touch(TouchPhase::Started, Some(Force::Normalized(0.8)));
        assert_eq!(ContactEvent::from_touch(&normalized, 0.0).force, Some(0.8));

        let calibrated = Force::Calibrated {
            force: 2.0,
            max_possible_force: 4.0,
            altitude_angle: None,
        };
        let event = ContactEvent::from_touch(&touch(TouchPhase::Ended, Some(calibrated)), 0.0);
        assert_eq!(event.force, Some(0.5));
        assert_eq!(event.phase, ContactPhase::End);
    }

    fn metrics() -> CanvasMetrics {
        CanvasMetrics {
            displayed_size: Size::new(400.0, 300.0),
            backing_size: Size::new(800.0, 600.0),
            origin: Point::new(20.0, 10.0),
        }
    }

    #[test]
    fn test_scales_to_backing_resolution() {
        let event = ContactEvent::new(1, Point::new(120.0, 60.0), ContactPhase::Move, 5.0);
        let s = sample(&event, &metrics(), true);
        assert!((s.position.x - 200.0).abs() < f64::EPSILON);
        assert!((s.position.y - 100.0).abs() < f64::EPSILON);
        assert!((s.timestamp - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_pressure_defaults() {
        let event = ContactEvent::new(1, Point::ZERO, ContactPhase::Start, 0.0);
        let s = sample(&event, &metrics(), true);
        assert_eq!(s.pressure, DEFAULT_PRESSURE);
    }

    #[test]
    fn test_pressure_ignored_when_disabled() {
        let event = ContactEvent::new(1, Point::ZERO, ContactPhase::Start, 0.0).with_force(0.9);
        let s = sample(&event, &metrics(), false);
        assert_eq!(s.pressure, DEFAULT_PRESSURE);
    }

    #[test]
    fn test_pressure_clamped() {
        let light = ContactEvent::new(1, Point::ZERO, ContactPhase::Move, 0.0).with_force(0.0);
        let heavy = ContactEvent::new(1, Point::ZERO, ContactPhase::Move, 0.0).with_force(3.0);
        let broken =
            ContactEvent::new(1, Point::ZERO, ContactPhase::Move, 0.0).with_force(f64::NAN);

        assert_eq!(sample(&light, &metrics(), true).pressure, MIN_PRESSURE);
        assert_eq!(sample(&heavy, &metrics(), true).pressure, MAX_PRESSURE);
        assert_eq!(sample(&broken, &metrics(), true).pressure, DEFAULT_PRESSURE);
    }

    #[test]
    fn test_zero_display_size_maps_one_to_one() {
        let metrics = CanvasMetrics {
            displayed_size: Size::ZERO,
            backing_size: Size::new(800.0, 600.0),
            origin: Point::ZERO,
        };
        let event = ContactEvent::new(1, Point::new(30.0, 40.0), ContactPhase::Move, 0.0);
        assert_eq!(sample(&event, &metrics, true).position, Point::new(30.0, 40.0));
    }

    #[test]
    fn test_event_json_shape() {
        let json = r#"{ "contact_id": 3, "client": { "x": 1.0, "y": 2.0 }, "phase": "cancel", "timestamp": 16.0 }"#;
        let event: ContactEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.phase, ContactPhase::Cancel);
        assert!(event.force.is_none());
        assert!(event.phase.is_terminal());
    }
}
