//! Per-stroke lifecycle and gesture state machine.
//!
//! A [`Session`] owns the raster surface and turns contact events into
//! painted strokes. Side effects that belong to collaborators (persistence,
//! haptics, maintenance) are not performed here; they are appended to an
//! event queue that the host drains with [`Session::drain_events`].

use crate::config::SketchConfig;
use crate::contacts::ContactTracker;
use crate::gesture::{self, GestureState, GestureTransition};
use crate::renderer::StrokeRenderer;
use crate::sample::{self, CanvasMetrics, ContactEvent, ContactPhase, Sample};
use crate::smoothing::PathSmoother;
use crate::stroke::{Stroke, StrokeId};
use crate::surface::{DrawingContext, ExportFormat, SurfaceError, SurfaceResult};
use kurbo::{BezPath, Point};

/// Session controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Drawing,
    MultiTouch,
}

/// Side effect requested by the session, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A stroke began at this (unsmoothed) sample.
    DrawStart(Sample),
    /// The active stroke was extended to this smoothed point.
    DrawMove(Sample),
    /// The active stroke finished. `aborted` is set when a multi-touch
    /// gesture cut it short.
    DrawEnd { stroke_id: StrokeId, aborted: bool },
    /// Persist what has been drawn so far.
    AutoSaveRequested,
    /// Pulse the haptic actuator.
    HapticFeedback { duration_ms: u32 },
    /// Call [`Session::run_maintenance`] when convenient.
    MaintenanceRequested,
    /// Two or more contacts are down; positions of the first two.
    MultiTouchStarted { contacts: [Point; 2] },
    /// The surface was wiped by [`Session::clear_surface`].
    Cleared,
}

/// Splitmix64 stream deciding per-move auto-save requests.
#[derive(Debug, Clone)]
struct ChanceSource {
    state: u64,
}

impl ChanceSource {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed that differs between sessions created in one process.
    fn next_session_seed() -> u64 {
        use std::sync::atomic::{AtomicU64, Ordering};

        static SESSION_COUNTER: AtomicU64 = AtomicU64::new(1);
        SESSION_COUNTER
            .fetch_add(1, Ordering::Relaxed)
            .wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform value in [0, 1).
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn chance(&mut self, probability: f64) -> bool {
        if probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.next_f64() < probability
    }
}

/// Drawing session over a surface of type `C`.
pub struct Session<C: DrawingContext> {
    config: SketchConfig,
    surface: Option<C>,
    state: SessionState,
    contacts: ContactTracker,
    /// Contact that is drawing the active stroke.
    primary: Option<u64>,
    stroke: Option<Stroke>,
    /// Last finished stroke, until a collaborator takes it.
    finished: Option<Stroke>,
    smoother: PathSmoother,
    renderer: StrokeRenderer,
    events: Vec<SessionEvent>,
    maintenance_pending: bool,
    chance: ChanceSource,
}

impl<C: DrawingContext> Session<C> {
    /// Create a session drawing onto `surface`.
    pub fn new(config: SketchConfig, surface: C) -> Self {
        Self::with_optional_surface(config, Some(surface))
    }

    /// Create a session with no surface attached yet. Drawing is dropped
    /// until one is attached.
    pub fn detached(config: SketchConfig) -> Self {
        Self::with_optional_surface(config, None)
    }

    fn with_optional_surface(config: SketchConfig, surface: Option<C>) -> Self {
        Self {
            config,
            surface,
            state: SessionState::Idle,
            contacts: ContactTracker::new(),
            primary: None,
            stroke: None,
            finished: None,
            smoother: PathSmoother::new(),
            renderer: StrokeRenderer::new(),
            events: Vec::new(),
            maintenance_pending: false,
            chance: ChanceSource::new(ChanceSource::next_session_seed()),
        }
    }

    /// Use a fixed seed for auto-save decisions.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.chance = ChanceSource::new(seed);
        self
    }

    /// Attach (or replace) the surface, returning the previous one.
    pub fn attach_surface(&mut self, surface: C) -> Option<C> {
        self.surface.replace(surface)
    }

    /// Detach the surface. Strokes in progress keep their sample data.
    pub fn detach_surface(&mut self) -> Option<C> {
        self.surface.take()
    }

    pub fn surface(&self) -> Option<&C> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut C> {
        self.surface.as_mut()
    }

    pub fn config(&self) -> &SketchConfig {
        &self.config
    }

    /// Replace the tool settings. A stroke in progress keeps its brush.
    pub fn set_config(&mut self, config: SketchConfig) {
        self.config = config;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Gesture interpretation matching the current state.
    pub fn gesture_state(&self) -> GestureState {
        match self.state {
            SessionState::Idle => GestureState::None,
            SessionState::Drawing => GestureState::SingleDraw,
            SessionState::MultiTouch => GestureState::MultiTouch,
        }
    }

    /// The stroke being drawn.
    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.stroke.as_ref()
    }

    /// Number of contacts currently down.
    pub fn active_contacts(&self) -> usize {
        self.contacts.active_count()
    }

    /// Live positions of the first two contacts during a multi-touch gesture.
    pub fn multi_touch_positions(&self) -> Option<[Point; 2]> {
        match self.state {
            SessionState::MultiTouch => self.contacts.first_two_positions(),
            _ => None,
        }
    }

    /// Events emitted since the last drain.
    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    /// Take every pending event.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Feed one raw contact event.
    pub fn handle_contact(&mut self, event: &ContactEvent, metrics: &CanvasMetrics) {
        let sample = sample::sample(event, metrics, self.config.enable_pressure_sensitivity);
        match event.phase {
            ContactPhase::Start => self.contact_start(event.contact_id, sample),
            ContactPhase::Move => self.contact_move(event.contact_id, sample),
            ContactPhase::End | ContactPhase::Cancel => self.contact_end(event.contact_id),
        }
    }

    fn contact_start(&mut self, id: u64, sample: Sample) {
        if !self.contacts.press(id, sample.position) {
            log::warn!("Duplicate start for contact {}; ignored", id);
            return;
        }

        let next = gesture::classify(
            self.contacts.active_count(),
            self.config.enable_gesture_detection,
        );
        match gesture::transition(self.gesture_state(), next) {
            GestureTransition::StrokeBegin => self.begin_stroke(id, sample),
            GestureTransition::StrokeAbort => {
                self.finish_stroke(true);
                self.enter_multi_touch();
            }
            GestureTransition::GestureBegin => self.enter_multi_touch(),
            _ => log::trace!("Contact {} down without state change", id),
        }
    }

    fn contact_move(&mut self, id: u64, sample: Sample) {
        if !self.contacts.update(id, sample.position) {
            log::trace!("Move for inactive contact {}; ignored", id);
            return;
        }
        if self.state == SessionState::Drawing && self.primary == Some(id) {
            self.extend_stroke(sample);
        }
    }

    fn contact_end(&mut self, id: u64) {
        if !self.contacts.release(id) {
            log::trace!("End for inactive contact {}; ignored", id);
            return;
        }
        match self.state {
            SessionState::Drawing if self.primary == Some(id) => self.finish_stroke(false),
            SessionState::MultiTouch if self.contacts.active_count() < 2 => {
                log::debug!("Multi-touch gesture ended");
                self.state = SessionState::Idle;
            }
            _ => {}
        }
    }

    fn begin_stroke(&mut self, id: u64, sample: Sample) {
        let brush_size = self.config.effective_brush_size();
        let brush_color = self.config.brush_color;
        let pressure_sizing = self.config.enable_pressure_sensitivity;

        let mut stroke = Stroke::new(brush_size, brush_color);
        self.smoother.reset();
        let smoothed = self.smoother.push(sample);
        stroke.push(sample, smoothed);

        self.renderer.begin_stroke(
            self.surface.as_mut(),
            &smoothed,
            brush_size,
            brush_color.into(),
            pressure_sizing,
        );
        log::debug!("Stroke {} started by contact {} (brush {})", stroke.id(), id, brush_size);

        self.stroke = Some(stroke);
        self.primary = Some(id);
        self.state = SessionState::Drawing;

        self.events.push(SessionEvent::DrawStart(sample));
        if self.config.enable_haptics {
            self.events.push(SessionEvent::HapticFeedback {
                duration_ms: self.config.haptic_duration_ms,
            });
        }
    }

    fn extend_stroke(&mut self, sample: Sample) {
        let Some(stroke) = self.stroke.as_mut() else {
            return;
        };
        let Some(prior) = stroke.last_smoothed().copied() else {
            return;
        };
        let smoothed = self.smoother.push(sample);
        stroke.push(sample, smoothed);
        self.renderer
            .extend_stroke(self.surface.as_mut(), &prior, &smoothed);
        log::trace!("Stroke extended to ({:.1}, {:.1})", smoothed.position.x, smoothed.position.y);

        self.events.push(SessionEvent::DrawMove(smoothed));
        if self.chance.chance(self.config.autosave_chance) {
            self.events.push(SessionEvent::AutoSaveRequested);
        }
    }

    fn finish_stroke(&mut self, aborted: bool) {
        self.renderer.end_stroke(self.surface.as_mut());
        self.smoother.reset();
        self.primary = None;
        self.state = SessionState::Idle;

        let Some(stroke) = self.stroke.take() else {
            return;
        };
        log::debug!(
            "Stroke {} {} after {} samples",
            stroke.id(),
            if aborted { "aborted" } else { "finished" },
            stroke.len()
        );
        self.events.push(SessionEvent::DrawEnd {
            stroke_id: stroke.id(),
            aborted,
        });
        self.finished = Some(stroke);
        self.request_maintenance();
    }

    fn enter_multi_touch(&mut self) {
        self.state = SessionState::MultiTouch;
        if let Some(contacts) = self.contacts.first_two_positions() {
            log::debug!("Multi-touch gesture started");
            self.events.push(SessionEvent::MultiTouchStarted { contacts });
        }
    }

    /// Ask the host to run surface maintenance. At most one request is
    /// outstanding at a time.
    pub fn request_maintenance(&mut self) {
        if self.maintenance_pending {
            return;
        }
        self.maintenance_pending = true;
        self.events.push(SessionEvent::MaintenanceRequested);
    }

    /// Whether a maintenance request is outstanding.
    pub fn maintenance_pending(&self) -> bool {
        self.maintenance_pending
    }

    /// Run requested maintenance. Skipped (and kept pending) while a stroke
    /// is being drawn. Returns whether anything ran.
    pub fn run_maintenance(&mut self) -> bool {
        if !self.maintenance_pending || self.state == SessionState::Drawing {
            return false;
        }
        self.maintenance_pending = false;
        if let Some(surface) = self.surface.as_mut() {
            surface.optimize();
        }
        true
    }

    /// Wipe the surface and drop any stroke in progress, along with a
    /// finished stroke nobody has taken yet. Always ends `Idle`.
    pub fn clear_surface(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.begin_path();
            surface.clear();
        }
        self.renderer.reset();
        self.smoother.reset();
        self.contacts.clear();
        self.stroke = None;
        self.finished = None;
        self.primary = None;
        self.state = SessionState::Idle;
        log::debug!("Surface cleared");
        self.events.push(SessionEvent::Cleared);
    }

    /// Encode the current pixels. Does not affect stroke state.
    pub fn export_surface(&self, format: ExportFormat) -> SurfaceResult<Vec<u8>> {
        self.surface
            .as_ref()
            .ok_or(SurfaceError::Detached)?
            .export(format)
    }

    /// Vector path of the active stroke, or of the last finished one.
    pub fn export_path(&self) -> Option<BezPath> {
        self.stroke
            .as_ref()
            .or(self.finished.as_ref())
            .map(Stroke::to_path)
    }

    /// Hand the last finished stroke to a collaborator.
    pub fn take_finished_stroke(&mut self) -> Option<Stroke> {
        self.finished.take()
    }
}

impl<C: DrawingContext + std::fmt::Debug> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("surface", &self.surface)
            .field("active_contacts", &self.contacts.active_count())
            .field("stroke", &self.stroke.as_ref().map(Stroke::id))
            .field("pending_events", &self.events.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::SerializableColor;
    use crate::surface::{CommandRecorder, DrawCommand};
    use kurbo::Size;

    fn metrics() -> CanvasMetrics {
        CanvasMetrics::unscaled(Size::new(200.0, 200.0))
    }

    fn quiet_config() -> SketchConfig {
        SketchConfig {
            enable_haptics: false,
            autosave_chance: 0.0,
            ..SketchConfig::default()
        }
    }

    fn session(config: SketchConfig) -> Session<CommandRecorder> {
        Session::new(config, CommandRecorder::new(Size::new(200.0, 200.0))).with_seed(7)
    }

    fn contact(id: u64, x: f64, y: f64, phase: ContactPhase, t: f64) -> ContactEvent {
        ContactEvent::new(id, Point::new(x, y), phase, t).with_force(1.0)
    }

    fn feed(session: &mut Session<CommandRecorder>, event: ContactEvent) {
        session.handle_contact(&event, &metrics());
    }

    fn end_count(session: &Session<CommandRecorder>) -> usize {
        session
            .events()
            .iter()
            .filter(|e| matches!(e, SessionEvent::DrawEnd { .. }))
            .count()
    }

    #[test]
    fn test_scenario_a_straight_stroke() {
        let mut s = session(quiet_config());

        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::Start, 0.0));
        feed(&mut s, contact(1, 20.0, 10.0, ContactPhase::Move, 16.0));
        feed(&mut s, contact(1, 30.0, 10.0, ContactPhase::Move, 32.0));

        let stroke = s.active_stroke().unwrap();
        assert_eq!(stroke.samples().len(), 3);
        assert_eq!(stroke.smoothed_points().len(), 3);
        assert_eq!(stroke.smoothed_points()[2].position, Point::new(20.0, 10.0));

        feed(&mut s, contact(1, 30.0, 10.0, ContactPhase::End, 48.0));

        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(end_count(&s), 1);
        assert!(s.active_stroke().is_none());
        assert_eq!(s.take_finished_stroke().map(|st| st.len()), Some(3));
    }

    #[test]
    fn test_smoothing_and_pressure_through_session() {
        let mut s = session(quiet_config());
        let points = [
            (0.0, 0.0, 0.3),
            (8.0, 4.0, 0.6),
            (16.0, 0.0, 0.9),
            (24.0, 12.0, 0.4),
            (30.0, 2.0, 0.7),
        ];

        for (i, &(x, y, force)) in points.iter().enumerate() {
            let phase = if i == 0 { ContactPhase::Start } else { ContactPhase::Move };
            let event = ContactEvent::new(1, Point::new(x, y), phase, i as f64).with_force(force);
            feed(&mut s, event);

            let stroke = s.active_stroke().unwrap();
            assert_eq!(stroke.samples().len(), stroke.smoothed_points().len());
        }

        let stroke = s.active_stroke().unwrap();
        let raw = stroke.samples();
        let smoothed = stroke.smoothed_points();
        assert_eq!(smoothed[0], raw[0]);
        assert_eq!(smoothed[1], raw[1]);
        for i in 2..raw.len() {
            let [a, b, c] = [&raw[i - 2], &raw[i - 1], &raw[i]].map(|s| s.position.to_vec2());
            let expected = (a + b * 2.0 + c) / 4.0;
            assert!((smoothed[i].position.x - expected.x).abs() < 1e-9);
            assert!((smoothed[i].position.y - expected.y).abs() < 1e-9);
        }
        for (r, sm) in raw.iter().zip(smoothed) {
            assert_eq!(r.pressure, sm.pressure);
        }
    }

    #[test]
    fn test_scenario_b_second_contact_aborts_stroke() {
        let mut s = session(quiet_config());

        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::Start, 0.0));
        feed(&mut s, contact(1, 20.0, 10.0, ContactPhase::Move, 16.0));
        let stroke_id = s.active_stroke().unwrap().id();

        feed(&mut s, contact(2, 100.0, 100.0, ContactPhase::Start, 20.0));

        assert_eq!(s.state(), SessionState::MultiTouch);
        assert_eq!(end_count(&s), 1);
        assert!(s.events().contains(&SessionEvent::DrawEnd { stroke_id, aborted: true }));
        assert!(s.events().contains(&SessionEvent::MultiTouchStarted {
            contacts: [Point::new(20.0, 10.0), Point::new(100.0, 100.0)],
        }));
        assert!(s.active_stroke().is_none());

        feed(&mut s, contact(1, 40.0, 10.0, ContactPhase::Move, 32.0));
        feed(&mut s, contact(1, 50.0, 10.0, ContactPhase::Move, 48.0));

        let finished = s.take_finished_stroke().unwrap();
        assert_eq!(finished.len(), 2);
        assert_eq!(end_count(&s), 1);
        assert_eq!(
            s.multi_touch_positions(),
            Some([Point::new(50.0, 10.0), Point::new(100.0, 100.0)])
        );
    }

    #[test]
    fn test_abort_flushes_renderer_once() {
        let mut s = session(quiet_config());

        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::Start, 0.0));
        s.surface_mut().unwrap().reset();
        feed(&mut s, contact(2, 50.0, 50.0, ContactPhase::Start, 5.0));

        let surface = s.surface().unwrap();
        assert_eq!(surface.count(|c| *c == DrawCommand::Stroke), 1);
    }

    #[test]
    fn test_multi_touch_returns_to_idle() {
        let mut s = session(quiet_config());

        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::Start, 0.0));
        feed(&mut s, contact(2, 20.0, 20.0, ContactPhase::Start, 1.0));
        assert_eq!(s.state(), SessionState::MultiTouch);

        feed(&mut s, contact(2, 20.0, 20.0, ContactPhase::End, 2.0));
        assert_eq!(s.state(), SessionState::Idle);

        // The remaining contact does not resume drawing.
        feed(&mut s, contact(1, 30.0, 30.0, ContactPhase::Move, 3.0));
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.active_stroke().is_none());
    }

    #[test]
    fn test_flicker_restarts_strokes() {
        let mut s = session(quiet_config());

        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::Start, 0.0));
        feed(&mut s, contact(2, 12.0, 12.0, ContactPhase::Start, 1.0));
        feed(&mut s, contact(2, 12.0, 12.0, ContactPhase::End, 2.0));
        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::End, 3.0));
        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::Start, 4.0));
        feed(&mut s, contact(2, 12.0, 12.0, ContactPhase::Start, 5.0));

        assert_eq!(end_count(&s), 2);
        assert_eq!(s.state(), SessionState::MultiTouch);
    }

    #[test]
    fn test_gesture_detection_disabled_ignores_second_contact() {
        let mut config = quiet_config();
        config.enable_gesture_detection = false;
        let mut s = session(config);

        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::Start, 0.0));
        feed(&mut s, contact(2, 90.0, 90.0, ContactPhase::Start, 1.0));
        feed(&mut s, contact(2, 95.0, 95.0, ContactPhase::Move, 2.0));
        feed(&mut s, contact(1, 20.0, 10.0, ContactPhase::Move, 3.0));

        assert_eq!(s.state(), SessionState::Drawing);
        let stroke = s.active_stroke().unwrap();
        assert_eq!(stroke.len(), 2);
        assert!(stroke.samples().iter().all(|sample| sample.position.x < 50.0));

        feed(&mut s, contact(2, 95.0, 95.0, ContactPhase::End, 4.0));
        assert_eq!(s.state(), SessionState::Drawing);

        feed(&mut s, contact(1, 20.0, 10.0, ContactPhase::End, 5.0));
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(end_count(&s), 1);
    }

    #[test]
    fn test_cancel_behaves_like_end() {
        let mut s = session(quiet_config());

        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::Start, 0.0));
        feed(&mut s, contact(1, 15.0, 10.0, ContactPhase::Cancel, 1.0));

        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(end_count(&s), 1);
        assert!(
            s.events()
                .iter()
                .any(|e| matches!(e, SessionEvent::DrawEnd { aborted: false, .. }))
        );
    }

    #[test]
    fn test_moves_while_idle_are_ignored() {
        let mut s = session(quiet_config());

        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::Move, 0.0));
        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::End, 1.0));

        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.events().is_empty());
        assert!(s.surface().unwrap().commands().is_empty());
    }

    #[test]
    fn test_scenario_c_no_pressure_capability() {
        let mut s = session(quiet_config());

        for (i, x) in [10.0, 20.0, 30.0, 40.0].iter().enumerate() {
            let phase = if i == 0 { ContactPhase::Start } else { ContactPhase::Move };
            feed(&mut s, ContactEvent::new(1, Point::new(*x, 5.0), phase, i as f64));
        }

        let stroke = s.active_stroke().unwrap();
        assert!(stroke.samples().iter().all(|sample| sample.pressure == 0.5));
        assert!(stroke.smoothed_points().iter().all(|sample| sample.pressure == 0.5));
    }

    #[test]
    fn test_scenario_d_brush_frozen_mid_stroke() {
        let mut config = quiet_config();
        config.brush_size = 5.0;
        config.brush_color = SerializableColor::new(255, 0, 0, 255);
        let mut s = session(config.clone());

        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::Start, 0.0));

        config.brush_size = 20.0;
        config.brush_color = SerializableColor::new(0, 0, 255, 255);
        s.set_config(config);

        feed(&mut s, contact(1, 20.0, 10.0, ContactPhase::Move, 16.0));
        feed(&mut s, contact(1, 30.0, 10.0, ContactPhase::Move, 32.0));

        let stroke = s.active_stroke().unwrap();
        assert_eq!(stroke.brush_size, 5.0);
        assert_eq!(stroke.brush_color, SerializableColor::new(255, 0, 0, 255));
        assert!(s.surface().unwrap().line_widths().iter().all(|w| *w == 5.0));

        feed(&mut s, contact(1, 30.0, 10.0, ContactPhase::End, 48.0));
        feed(&mut s, contact(1, 0.0, 0.0, ContactPhase::Start, 64.0));
        assert_eq!(s.active_stroke().unwrap().brush_size, 20.0);
    }

    #[test]
    fn test_non_positive_brush_clamped() {
        let mut config = quiet_config();
        config.brush_size = 0.0;
        config.enable_pressure_sensitivity = false;
        let mut s = session(config);

        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::Start, 0.0));

        assert_eq!(s.active_stroke().unwrap().brush_size, 1.0);
        assert_eq!(s.surface().unwrap().line_widths(), vec![1.0]);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut s = session(quiet_config());

        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::Start, 0.0));
        feed(&mut s, contact(1, 20.0, 10.0, ContactPhase::Move, 1.0));

        s.clear_surface();
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.active_stroke().is_none());
        assert_eq!(s.active_contacts(), 0);

        s.clear_surface();
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(end_count(&s), 0);

        let clears = s
            .surface()
            .unwrap()
            .count(|c| *c == DrawCommand::ClearRect(kurbo::Rect::new(0.0, 0.0, 200.0, 200.0)));
        assert_eq!(clears, 2);

        // The still-down finger no longer extends anything.
        feed(&mut s, contact(1, 30.0, 10.0, ContactPhase::Move, 2.0));
        assert!(s.active_stroke().is_none());
    }

    #[test]
    fn test_clear_from_multi_touch() {
        let mut s = session(quiet_config());

        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::Start, 0.0));
        feed(&mut s, contact(2, 20.0, 20.0, ContactPhase::Start, 1.0));
        s.clear_surface();

        assert_eq!(s.state(), SessionState::Idle);
        feed(&mut s, contact(3, 5.0, 5.0, ContactPhase::Start, 2.0));
        assert_eq!(s.state(), SessionState::Drawing);
    }

    #[test]
    fn test_event_order() {
        let mut config = quiet_config();
        config.enable_haptics = true;
        config.haptic_duration_ms = 15;
        let mut s = session(config);

        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::Start, 0.0));
        feed(&mut s, contact(1, 20.0, 10.0, ContactPhase::Move, 1.0));
        feed(&mut s, contact(1, 20.0, 10.0, ContactPhase::End, 2.0));

        let events = s.drain_events();
        assert!(matches!(events[0], SessionEvent::DrawStart(_)));
        assert_eq!(events[1], SessionEvent::HapticFeedback { duration_ms: 15 });
        assert!(matches!(events[2], SessionEvent::DrawMove(_)));
        assert!(matches!(events[3], SessionEvent::DrawEnd { aborted: false, .. }));
        assert_eq!(events[4], SessionEvent::MaintenanceRequested);
        assert_eq!(events.len(), 5);
        assert!(s.events().is_empty());
    }

    #[test]
    fn test_autosave_chance_bounds() {
        let mut config = quiet_config();
        config.autosave_chance = 1.0;
        let mut always = session(config.clone());
        config.autosave_chance = 0.0;
        let mut never = session(config);

        for s in [&mut always, &mut never] {
            feed(s, contact(1, 0.0, 0.0, ContactPhase::Start, 0.0));
            for i in 1..=10 {
                feed(s, contact(1, i as f64, 0.0, ContactPhase::Move, i as f64));
            }
        }

        let saves = |s: &Session<CommandRecorder>| {
            s.events().iter().filter(|e| **e == SessionEvent::AutoSaveRequested).count()
        };
        assert_eq!(saves(&always), 10);
        assert_eq!(saves(&never), 0);
    }

    #[test]
    fn test_autosave_is_occasional() {
        let mut config = quiet_config();
        config.autosave_chance = 0.1;
        let mut s = session(config);

        feed(&mut s, contact(1, 0.0, 0.0, ContactPhase::Start, 0.0));
        for i in 1..=2000 {
            feed(&mut s, contact(1, (i % 200) as f64, 0.0, ContactPhase::Move, i as f64));
        }

        let saves = s.events().iter().filter(|e| **e == SessionEvent::AutoSaveRequested).count();
        assert!(saves > 100 && saves < 300, "unexpected auto-save count {}", saves);
    }

    #[test]
    fn test_maintenance_at_most_once_outstanding() {
        let mut s = session(quiet_config());

        for round in 0..3 {
            let t = round as f64 * 10.0;
            feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::Start, t));
            feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::End, t + 1.0));
        }
        let requests = s
            .events()
            .iter()
            .filter(|e| **e == SessionEvent::MaintenanceRequested)
            .count();
        assert_eq!(requests, 1);
        assert!(s.maintenance_pending());

        assert!(s.run_maintenance());
        assert!(!s.maintenance_pending());
        assert!(!s.run_maintenance());
        assert_eq!(s.surface().unwrap().count(|c| *c == DrawCommand::Optimize), 1);
    }

    #[test]
    fn test_maintenance_deferred_while_drawing() {
        let mut s = session(quiet_config());

        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::Start, 0.0));
        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::End, 1.0));
        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::Start, 2.0));

        assert!(!s.run_maintenance());
        assert!(s.maintenance_pending());

        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::End, 3.0));
        assert!(s.run_maintenance());
    }

    #[test]
    fn test_detached_session_degrades_silently() {
        let mut s: Session<CommandRecorder> = Session::detached(quiet_config());

        s.handle_contact(&contact(1, 10.0, 10.0, ContactPhase::Start, 0.0), &metrics());
        s.handle_contact(&contact(1, 20.0, 10.0, ContactPhase::Move, 1.0), &metrics());
        s.handle_contact(&contact(1, 30.0, 10.0, ContactPhase::End, 2.0), &metrics());
        s.clear_surface();

        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.run_maintenance());
        assert!(matches!(s.export_surface(ExportFormat::Png), Err(SurfaceError::Detached)));
    }

    #[test]
    fn test_export_path_tracks_strokes() {
        let mut s = session(quiet_config());
        assert!(s.export_path().is_none());

        feed(&mut s, contact(1, 0.0, 0.0, ContactPhase::Start, 0.0));
        feed(&mut s, contact(1, 10.0, 0.0, ContactPhase::Move, 1.0));
        assert_eq!(s.export_path().unwrap().elements().len(), 2);

        feed(&mut s, contact(1, 10.0, 0.0, ContactPhase::End, 2.0));
        assert_eq!(s.export_path().unwrap().elements().len(), 2);

        s.take_finished_stroke();
        assert!(s.export_path().is_none());
    }

    #[test]
    fn test_clear_forgets_finished_stroke() {
        let mut s = session(quiet_config());
        feed(&mut s, contact(1, 0.0, 0.0, ContactPhase::Start, 0.0));
        feed(&mut s, contact(1, 10.0, 0.0, ContactPhase::Move, 1.0));
        feed(&mut s, contact(1, 10.0, 0.0, ContactPhase::End, 2.0));
        assert!(s.export_path().is_some());

        s.clear_surface();

        assert!(s.export_path().is_none());
        assert!(s.take_finished_stroke().is_none());
    }

    #[test]
    fn test_duplicate_start_ignored() {
        let mut s = session(quiet_config());

        feed(&mut s, contact(1, 10.0, 10.0, ContactPhase::Start, 0.0));
        feed(&mut s, contact(1, 12.0, 10.0, ContactPhase::Start, 1.0));

        assert_eq!(s.state(), SessionState::Drawing);
        assert_eq!(s.active_contacts(), 1);
        assert_eq!(s.active_stroke().unwrap().len(), 1);
    }
}
