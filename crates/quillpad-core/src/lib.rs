//! Quillpad Core Library
//!
//! Platform-agnostic sketch capture: turns raw touch/pointer contacts into
//! smoothed, pressure-scaled strokes painted onto a raster surface, and
//! classifies multi-contact gestures.

pub mod color;
pub mod config;
pub mod contacts;
pub mod document;
pub mod gesture;
pub mod renderer;
pub mod sample;
pub mod session;
pub mod smoothing;
pub mod storage;
pub mod stroke;
pub mod surface;

pub use color::SerializableColor;
pub use config::{ConfigError, SketchConfig};
pub use contacts::ContactTracker;
pub use document::SketchDocument;
pub use gesture::{GestureState, GestureTransition, classify};
pub use renderer::StrokeRenderer;
pub use sample::{CanvasMetrics, ContactEvent, ContactPhase, Sample};
pub use session::{Session, SessionEvent, SessionState};
pub use smoothing::{PathSmoother, smooth};
pub use storage::{AutoSaveManager, FileStorage, MemoryStorage, Storage, StorageError};
pub use stroke::{Stroke, StrokeId};
pub use surface::{CommandRecorder, DrawCommand, DrawingContext, ExportFormat, SurfaceError};
