//! Wires camera, model, and display window into the three-stage pipeline.
//!
//! Startup failures (camera, model, window) abort before any stage thread
//! exists; once the pipeline is live, per-frame failures only cost the
//! frame they happened on.

use std::{
    sync::{
        Arc, Once,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use anyhow::{Context, Result};
use frame_sync::{Fps, Pipeline};
use ml_models::{build_transform, tch::Device};
use tracing::{debug, error, warn};
use video_io::{CameraSource, DisplayWindow, SharedFrame};

use crate::booth::{BoothConfig, telemetry};

const WINDOW_TITLE: &str = "PhotoBooth";
const MAX_CONSECUTIVE_CAPTURE_ERRORS: u32 = 30;

pub fn run(config: BoothConfig) -> Result<()> {
    static CTRL_HANDLER: Once = Once::new();

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let handler_flag = interrupted.clone();
        CTRL_HANDLER.call_once(move || {
            if let Err(err) = ctrlc::set_handler(move || {
                handler_flag.store(true, Ordering::SeqCst);
            }) {
                warn!("Failed to install Ctrl+C handler: {err}");
            }
        });
    }

    let _ = telemetry::init_metrics_recorder();

    let device = if config.use_cpu {
        Device::Cpu
    } else {
        Device::cuda_if_available()
    };
    debug!("inference device: {device:?}");

    let mut camera = CameraSource::open(&config.camera_uri, (config.width, config.height))
        .with_context(|| format!("failed to open capture source {}", config.camera_uri))?;
    debug!(
        "capture source: {} at {}x{}",
        config.camera_uri, config.width, config.height
    );

    // Window first: model loads can take a while and the user should see
    // something exists.
    let window = DisplayWindow::create(WINDOW_TITLE).context("failed to create display window")?;
    let escape = window.exit_handle();

    let mut model = build_transform(
        config.model_kind,
        &config.model_path,
        &config.labels_path,
        device,
    )
    .with_context(|| {
        format!(
            "failed to load {} model from {}",
            config.model_kind.name(),
            config.model_path.display()
        )
    })?;
    println!("Loaded {} model on {device:?}", model.name());

    let display_interval = Duration::from_millis(config.display_interval_ms);
    let mut fps = Fps::new();

    let mut consecutive_errors = 0u32;
    let source = move || {
        loop {
            match camera.next_frame() {
                Ok(Some(frame)) => {
                    consecutive_errors = 0;
                    break Some(frame);
                }
                Ok(None) => {
                    debug!("capture source reached end of stream");
                    break None;
                }
                Err(err) => {
                    consecutive_errors += 1;
                    metrics::counter!("booth_capture_errors_total").increment(1);
                    warn!("capture error: {err:#}");
                    if consecutive_errors >= MAX_CONSECUTIVE_CAPTURE_ERRORS {
                        error!("capture source failing persistently; stopping pipeline");
                        break None;
                    }
                }
            }
        }
    };

    let transform = move |frame: &SharedFrame| match model.process_frame(frame) {
        Ok(result) => Some(result),
        Err(err) => {
            metrics::counter!("booth_inference_errors_total").increment(1);
            warn!("inference failed, skipping frame: {err:#}");
            None
        }
    };

    let sink = move |frame: &SharedFrame| {
        if let Err(err) = window.show(frame) {
            metrics::counter!("booth_display_errors_total").increment(1);
            warn!("display error: {err:#}");
        }
        fps.tick(display_interval);
    };

    let pipeline = Pipeline::launch(source, transform, sink)?;
    println!("Running photobooth — press Esc or Ctrl+C to stop");
    pipeline.run(|| escape.load(Ordering::SeqCst) || interrupted.load(Ordering::SeqCst))?;

    if config.verbose {
        if let Some(handle) = telemetry::prometheus_handle() {
            print!("{}", handle.render());
        }
    }
    debug!("photobooth stopped");
    Ok(())
}
