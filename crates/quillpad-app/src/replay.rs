//! Replays contact scripts through a drawing session.

use crate::error::{AppError, AppResult};
use quillpad_core::color::SerializableColor;
use quillpad_core::config::SketchConfig;
use quillpad_core::document::SketchDocument;
use quillpad_core::sample::{CanvasMetrics, ContactEvent};
use quillpad_core::session::{Session, SessionEvent};
use quillpad_core::storage::{AutoSaveManager, Snapshot, Storage};
use quillpad_core::surface::ExportFormat;
use quillpad_render::RasterSurface;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// One step of a recorded interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    /// Feed a raw contact event.
    Contact(ContactEvent),
    /// Wipe the surface.
    Clear,
    /// Change the brush size setting.
    BrushSize(f64),
    /// Change the brush color setting.
    BrushColor(SerializableColor),
}

/// A recorded interaction on a surface with fixed metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactScript {
    pub metrics: CanvasMetrics,
    pub steps: Vec<ScriptStep>,
}

impl ContactScript {
    pub fn from_json(json: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Backing raster size in whole pixels.
    pub fn raster_size(&self) -> AppResult<(u32, u32)> {
        let size = self.metrics.backing_size;
        let width = size.width.round();
        let height = size.height.round();
        let usable = |v: f64| (1.0..=u32::MAX as f64).contains(&v);
        if !(usable(width) && usable(height)) {
            return Err(AppError::InvalidArgument(format!(
                "backing size {}x{} is not a usable raster size",
                size.width, size.height
            )));
        }
        Ok((width as u32, height as u32))
    }
}

/// Counters collected while replaying.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub strokes: usize,
    pub aborted_strokes: usize,
    pub multi_touch_gestures: usize,
    pub autosaves: usize,
    pub haptic_pulses: usize,
    pub clears: usize,
}

/// Drives a session over a raster surface and persists the result.
pub struct Replayer<S: Storage> {
    session: Session<RasterSurface>,
    metrics: CanvasMetrics,
    document: SketchDocument,
    autosave: AutoSaveManager<S>,
    stats: ReplayStats,
}

impl<S: Storage> Replayer<S> {
    pub fn new(
        config: SketchConfig,
        surface: RasterSurface,
        metrics: CanvasMetrics,
        storage: Arc<S>,
    ) -> Self {
        let document = SketchDocument::new(surface.width(), surface.height());
        Self {
            session: Session::new(config, surface),
            metrics,
            document,
            autosave: AutoSaveManager::new(storage),
            stats: ReplayStats::default(),
        }
    }

    /// Use a fixed seed for auto-save decisions.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.session = self.session.with_seed(seed);
        self
    }

    pub fn session(&self) -> &Session<RasterSurface> {
        &self.session
    }

    pub fn document(&self) -> &SketchDocument {
        &self.document
    }

    pub fn stats(&self) -> ReplayStats {
        self.stats
    }

    /// Apply one step and handle the events it produced.
    pub fn apply(&mut self, step: &ScriptStep) {
        match step {
            ScriptStep::Contact(event) => self.session.handle_contact(event, &self.metrics),
            ScriptStep::Clear => self.session.clear_surface(),
            ScriptStep::BrushSize(size) => {
                let mut config = self.session.config().clone();
                config.brush_size = *size;
                self.session.set_config(config);
            }
            ScriptStep::BrushColor(color) => {
                let mut config = self.session.config().clone();
                config.brush_color = *color;
                self.session.set_config(config);
            }
        }
        self.process_events();
    }

    /// Apply every step of a script.
    pub fn run(&mut self, script: &ContactScript) {
        for step in &script.steps {
            self.apply(step);
        }
    }

    fn process_events(&mut self) {
        for event in self.session.drain_events() {
            match event {
                SessionEvent::DrawStart(sample) => {
                    log::trace!("Draw start at {:?}", sample.position);
                }
                SessionEvent::DrawMove(_) => {}
                SessionEvent::DrawEnd { stroke_id, aborted } => {
                    self.stats.strokes += 1;
                    if aborted {
                        self.stats.aborted_strokes += 1;
                    }
                    if let Some(stroke) = self.session.take_finished_stroke() {
                        self.document.add_stroke(stroke);
                    }
                    log::debug!("Stroke {} archived", stroke_id);
                }
                SessionEvent::AutoSaveRequested => self.save_progress(),
                SessionEvent::HapticFeedback { duration_ms } => {
                    self.stats.haptic_pulses += 1;
                    log::trace!("Haptic pulse ({} ms)", duration_ms);
                }
                SessionEvent::MaintenanceRequested => {
                    self.session.run_maintenance();
                }
                SessionEvent::MultiTouchStarted { contacts } => {
                    self.stats.multi_touch_gestures += 1;
                    log::debug!("Multi-touch gesture at {:?}", contacts);
                }
                SessionEvent::Cleared => {
                    self.stats.clears += 1;
                    self.document.clear();
                }
            }
        }
    }

    /// Save finished strokes plus the one in progress, if a save is due.
    fn save_progress(&mut self) {
        self.autosave.mark_dirty();
        if !self.autosave.should_save() {
            return;
        }
        let preview = self
            .session
            .export_surface(ExportFormat::Png)
            .inspect_err(|e| log::warn!("Auto-save preview unavailable: {}", e))
            .ok();
        let snapshot = Snapshot::new(&self.document)
            .with_active(self.session.active_stroke())
            .with_preview(preview.as_deref());
        match pollster::block_on(self.autosave.maybe_save(snapshot)) {
            Ok(true) => self.stats.autosaves += 1,
            Ok(false) => {}
            Err(e) => log::warn!("Auto-save failed: {}", e),
        }
    }

    /// Export the surface, embed a PNG preview and save the sketch.
    pub fn finish(&mut self, format: ExportFormat) -> AppResult<Vec<u8>> {
        // Pending maintenance may have been deferred by a stroke in progress.
        self.session.run_maintenance();

        let image = self.session.export_surface(format)?;
        let preview = match format {
            ExportFormat::Png => image.clone(),
            _ => self.session.export_surface(ExportFormat::Png)?,
        };
        self.document.set_preview_png(&preview);

        pollster::block_on(self.autosave.save(Snapshot::new(&self.document)))?;
        log::info!(
            "Saved sketch {} with {} strokes ({} samples)",
            self.document.id,
            self.document.strokes.len(),
            self.document.sample_count()
        );
        Ok(image)
    }
}
