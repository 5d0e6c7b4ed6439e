pub mod camera;
pub mod config;
pub mod diagnostics;
pub mod export;
pub mod pipeline;
pub mod pose;
pub mod render;
pub mod segment;
pub mod settings;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use camera::dummy::DummyCamera;
use camera::error::CameraError;
use config::PipelineConfig;
use export::{capture_look, default_filename, export, thumbnail, ExportError, ExportFormat};
use pipeline::{run_display_loop, PipelineEvent, RenderScheduler};
use pose::{ProportionalEstimator, SmoothingEstimator};
use render::{GarmentCategory, GarmentDescriptor};
use settings::{SettingsStore, StyleSettings};

const DEFAULT_RUN_SECONDS: f64 = 3.0;

/// Failures of the headless demo session.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to start async runtime: {0}")]
    Runtime(std::io::Error),

    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

fn run_duration() -> Duration {
    let seconds = match std::env::var("TRYON_RUN_SECONDS") {
        Ok(raw) => raw.trim().parse::<f64>().unwrap_or_else(|_| {
            tracing::warn!("ignoring TRYON_RUN_SECONDS={raw:?}: not a number");
            DEFAULT_RUN_SECONDS
        }),
        Err(_) => DEFAULT_RUN_SECONDS,
    };
    Duration::from_secs_f64(seconds.clamp(0.0, 3600.0))
}

fn demo_garment() -> GarmentDescriptor {
    GarmentDescriptor::new("demo-shirt", "Classic Oxford Shirt", GarmentCategory::Shirt)
        .with_price(49.0)
}

/// Run a headless try-on session against the synthetic camera.
///
/// Streams for `TRYON_RUN_SECONDS` (default 3), logs throughput, then
/// captures the look and writes it as a PNG into the working directory.
pub fn run() -> Result<(), RunError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(RunError::Runtime)?;
    runtime.block_on(run_session(PipelineConfig::from_env(), run_duration()))
}

async fn run_session(config: PipelineConfig, duration: Duration) -> Result<(), RunError> {
    let store = match &config.settings_path {
        Some(path) => {
            let store = Arc::new(SettingsStore::new(path.clone()));
            store.start_debounce_task();
            store
        }
        None => Arc::new(SettingsStore::in_memory(StyleSettings::default())),
    };

    let camera = DummyCamera::new(config.frame_width, config.frame_height);
    let mut scheduler =
        RenderScheduler::new(Box::new(camera), Arc::clone(&store), config.scheduler_config())
            .with_estimator(SmoothingEstimator::new(ProportionalEstimator::new()));
    let handle = scheduler.handle();
    handle.select_garment(Arc::new(demo_garment()));

    let mut events = handle.subscribe();
    let reporter = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let PipelineEvent::Performance { sample, assessment } = event {
                tracing::info!(
                    "{} fps ({}), {:.1}ms latency ({:?})",
                    sample.fps,
                    assessment.tier.label(),
                    sample.latency_ms,
                    assessment.latency
                );
            }
        }
    });

    scheduler.start()?;
    let refresh_hz = config.refresh_hz;
    let driver = tokio::spawn(async move {
        run_display_loop(&mut scheduler, refresh_hz).await;
        scheduler
    });

    tokio::time::sleep(duration).await;
    handle.stop();
    match driver.await {
        Ok(scheduler) => drop(scheduler),
        Err(e) => tracing::error!("display loop task failed: {e}"),
    }
    reporter.abort();

    let look = capture_look(&handle)?;
    let format = ExportFormat::Png;
    let bytes = export(&look.artifact, format, look.settings.quality())?;
    let path = default_filename(format, look.captured_at_ms);
    std::fs::write(&path, &bytes).map_err(|source| RunError::Write {
        path: path.clone(),
        source,
    })?;
    let thumb = thumbnail(&look.artifact, 160, 120)?;
    tracing::info!(
        "saved {} ({}x{}, {} bytes, thumbnail {}x{})",
        path,
        look.artifact.width,
        look.artifact.height,
        bytes.len(),
        thumb.width,
        thumb.height
    );

    if store.save().is_err() {
        tracing::warn!("style settings were not persisted");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn session_fails_cleanly_when_nothing_rendered() {
        let config = PipelineConfig {
            frame_width: 0,
            frame_height: 0,
            refresh_hz: 200,
            ..Default::default()
        };
        let result = run_session(config, Duration::from_millis(20)).await;
        assert!(matches!(result, Err(RunError::Export(ExportError::NoOutput))));
    }

    #[test]
    fn demo_garment_is_a_shirt() {
        let g = demo_garment();
        assert_eq!(g.category, GarmentCategory::Shirt);
        assert!(g.price > 0.0);
    }
}
