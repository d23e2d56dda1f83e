//! Auto-save of the sketch being drawn.
//!
//! The session only signals that a save would be useful; this manager decides
//! whether one is due and talks to the storage backend. Saves taken while a
//! stroke is still in progress include that stroke, so an abrupt exit loses
//! at most the samples captured since the last save.

use crate::document::SketchDocument;
use crate::storage::{Storage, StorageResult};
use crate::stroke::Stroke;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default minimum time between auto-saves in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 5;

/// Key under which the most recently saved sketch is mirrored.
pub const LAST_SKETCH_KEY: &str = "__last_sketch__";

/// What the last save (or load) contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveMark {
    /// Strokes in the saved sketch, including an in-progress one.
    pub strokes: usize,
    /// Raw samples across those strokes.
    pub samples: usize,
    at: Instant,
}

impl SaveMark {
    fn of(document: &SketchDocument) -> Self {
        Self {
            strokes: document.strokes.len(),
            samples: document.sample_count(),
            at: Instant::now(),
        }
    }
}

/// Everything a single auto-save writes.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    /// Finished strokes.
    pub document: &'a SketchDocument,
    /// Stroke still being drawn, if any.
    pub active: Option<&'a Stroke>,
    /// Encoded PNG of the surface, replacing the document's preview.
    pub preview_png: Option<&'a [u8]>,
}

impl<'a> Snapshot<'a> {
    pub fn new(document: &'a SketchDocument) -> Self {
        Self {
            document,
            active: None,
            preview_png: None,
        }
    }

    pub fn with_active(mut self, active: Option<&'a Stroke>) -> Self {
        self.active = active;
        self
    }

    pub fn with_preview(mut self, png: Option<&'a [u8]>) -> Self {
        self.preview_png = png;
        self
    }

    /// The document as it should be persisted. Borrows when there is nothing
    /// to add.
    pub fn materialize(&self) -> Cow<'a, SketchDocument> {
        let active = self.active.filter(|stroke| !stroke.is_empty());
        if active.is_none() && self.preview_png.is_none() {
            return Cow::Borrowed(self.document);
        }
        let mut doc = self.document.clone();
        if let Some(stroke) = active {
            doc.add_stroke(stroke.clone());
        }
        if let Some(png) = self.preview_png {
            doc.set_preview_png(png);
        }
        Cow::Owned(doc)
    }
}

/// Manages automatic sketch persistence.
pub struct AutoSaveManager<S: Storage> {
    storage: Arc<S>,
    /// Minimum time between auto-saves.
    interval: Duration,
    last_mark: Option<SaveMark>,
    /// Changes were reported since `last_mark`.
    dirty: bool,
    /// Id the current sketch is saved under.
    current_id: Option<String>,
}

impl<S: Storage> AutoSaveManager<S> {
    /// Create a manager over the given storage backend.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_mark: None,
            dirty: false,
            current_id: None,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Mark the sketch as having unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Save under `id` instead of the document's own id.
    pub fn set_sketch_id(&mut self, id: Option<String>) {
        self.current_id = id;
    }

    pub fn sketch_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    /// Contents of the last save or load.
    pub fn last_mark(&self) -> Option<SaveMark> {
        self.last_mark
    }

    /// Whether the sketch is dirty and the interval has elapsed.
    pub fn should_save(&self) -> bool {
        self.dirty
            && self
                .last_mark
                .is_none_or(|mark| mark.at.elapsed() >= self.interval)
    }

    /// Save `snapshot` if [`should_save`](Self::should_save) and it holds
    /// samples the last save did not. Returns whether a save ran.
    pub async fn maybe_save(&mut self, snapshot: Snapshot<'_>) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }
        let doc = snapshot.materialize();
        if self.last_mark.is_some_and(|mark| {
            mark.strokes == doc.strokes.len() && mark.samples == doc.sample_count()
        }) {
            log::trace!("Auto-save skipped: no new samples");
            self.dirty = false;
            return Ok(false);
        }
        self.write(&doc).await?;
        Ok(true)
    }

    /// Save immediately, also mirroring to [`LAST_SKETCH_KEY`].
    pub async fn save(&mut self, snapshot: Snapshot<'_>) -> StorageResult<()> {
        self.write(&snapshot.materialize()).await
    }

    async fn write(&mut self, doc: &SketchDocument) -> StorageResult<()> {
        let id = self.current_id.as_deref().unwrap_or(&doc.id).to_string();
        self.storage.save(&id, doc).await?;
        self.storage.save(LAST_SKETCH_KEY, doc).await?;

        let mark = SaveMark::of(doc);
        log::debug!(
            "Saved sketch {} ({} strokes, {} samples)",
            id,
            mark.strokes,
            mark.samples
        );
        self.last_mark = Some(mark);
        self.dirty = false;
        Ok(())
    }

    fn adopt(&mut self, id: String, doc: &SketchDocument) {
        self.current_id = Some(id);
        self.last_mark = Some(SaveMark::of(doc));
        self.dirty = false;
    }

    /// Load a sketch and make it current.
    pub async fn load(&mut self, id: &str) -> StorageResult<SketchDocument> {
        let doc = self.storage.load(id).await?;
        self.adopt(id.to_string(), &doc);
        Ok(doc)
    }

    /// Load the most recently saved sketch, if any.
    pub async fn load_last(&mut self) -> Option<SketchDocument> {
        let doc = self
            .storage
            .load(LAST_SKETCH_KEY)
            .await
            .inspect_err(|e| log::debug!("No last sketch to restore: {}", e))
            .ok()?;
        self.adopt(doc.id.clone(), &doc);
        Some(doc)
    }

    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        self.storage.delete(id).await
    }

    /// Ids of saved sketches, without the mirror key.
    pub async fn list_sketches(&self) -> StorageResult<Vec<String>> {
        let mut ids = self.storage.list().await?;
        ids.retain(|id| id != LAST_SKETCH_KEY);
        Ok(ids)
    }

    pub async fn exists(&self, id: &str) -> StorageResult<bool> {
        self.storage.exists(id).await
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}
