//! Quillpad replay tool.
//!
//! Feeds a recorded contact script through a drawing session, writes the
//! painted surface as an image and saves the sketch document.

pub mod cli;
pub mod error;
pub mod replay;

pub use cli::Cli;
pub use error::{AppError, AppResult};
pub use replay::{ContactScript, ReplayStats, Replayer, ScriptStep};

use quillpad_core::color::SerializableColor;
use quillpad_core::config::SketchConfig;
use quillpad_core::storage::{FileStorage, Storage};
use quillpad_render::RasterSurface;
use std::sync::Arc;

/// Resolve the sketch configuration from the config file and overrides.
pub fn load_config(cli: &Cli) -> AppResult<SketchConfig> {
    let mut config = match &cli.config {
        Some(path) => SketchConfig::load(path)?,
        None => SketchConfig::default(),
    };
    if let Some(hex) = &cli.brush_color {
        config.brush_color = parse_color(hex)?;
    }
    config.validate()?;
    Ok(config)
}

fn parse_color(hex: &str) -> AppResult<SerializableColor> {
    SerializableColor::from_hex(hex)
        .ok_or_else(|| AppError::InvalidArgument(format!("'{}' is not a #rrggbb[aa] color", hex)))
}

fn open_storage(cli: &Cli) -> AppResult<FileStorage> {
    let storage = match &cli.storage_dir {
        Some(dir) => FileStorage::new(dir.clone())?,
        None => FileStorage::default_location()?,
    };
    log::debug!("Saving sketches under {}", storage.base_path().display());
    Ok(storage)
}

/// Replay `script` against `storage` and return the exported image.
pub fn replay_script<S: Storage>(
    cli: &Cli,
    config: SketchConfig,
    script: &ContactScript,
    storage: Arc<S>,
) -> AppResult<(Vec<u8>, ReplayStats)> {
    let (width, height) = script.raster_size()?;
    let surface = match &cli.background {
        Some(hex) => RasterSurface::with_background(width, height, parse_color(hex)?.into()),
        None => RasterSurface::new(width, height),
    };

    let mut replayer = Replayer::new(config, surface, script.metrics, storage);
    if let Some(seed) = cli.seed {
        replayer = replayer.with_seed(seed);
    }
    replayer.run(script);
    let image = replayer.finish(cli.export_format())?;
    Ok((image, replayer.stats()))
}

/// Run the replay tool.
pub fn run(cli: &Cli) -> AppResult<()> {
    let config = load_config(cli)?;
    let script = ContactScript::load(&cli.script)?;
    log::info!(
        "Replaying {} steps from {}",
        script.steps.len(),
        cli.script.display()
    );

    let storage = Arc::new(open_storage(cli)?);
    let (image, stats) = replay_script(cli, config, &script, storage)?;

    let output = cli.output_path();
    std::fs::write(&output, &image)?;
    log::info!(
        "Wrote {} ({} bytes): {} strokes, {} aborted, {} gestures, {} auto-saves",
        output.display(),
        image.len(),
        stats.strokes,
        stats.aborted_strokes,
        stats.multi_touch_gestures,
        stats.autosaves
    );
    Ok(())
}
