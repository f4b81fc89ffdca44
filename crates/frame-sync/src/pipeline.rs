use std::{sync::Arc, thread, time::Duration};

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::{
    slot::{Identity, PipelineSlot},
    stage,
    stop::StopFlag,
};

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Three-stage capture → process → display pipeline.
///
/// Owns the shared stop flag, the two inter-stage slots, and the three
/// stage threads. [`launch`](Self::launch) starts everything;
/// [`run`](Self::run) parks the calling thread on an external stop
/// condition and then performs the coordinated shutdown: trip the flag
/// once, let the wake nudges ripple capture → process → display, and join
/// every thread before returning. No thread is abandoned and no frame is
/// touched after the stage holding it has been joined.
pub struct Pipeline {
    stop: StopFlag,
    stages: Vec<(&'static str, thread::JoinHandle<()>)>,
}

impl Pipeline {
    /// Wire up and start the three stage threads.
    ///
    /// `source` is polled for new frames and is never blocked by the stages
    /// after it; `transform` sees only the newest pending frame, returning
    /// `None` to skip one; `sink` likewise consumes the newest transformed
    /// frame. Each closure runs on its own named thread for the lifetime of
    /// the pipeline.
    pub fn launch<A, B, Src, Xf, Snk>(source: Src, transform: Xf, sink: Snk) -> Result<Self>
    where
        A: Identity + Clone + Send + 'static,
        B: Identity + Clone + Send + 'static,
        Src: FnMut() -> Option<A> + Send + 'static,
        Xf: FnMut(&A) -> Option<B> + Send + 'static,
        Snk: FnMut(&B) + Send + 'static,
    {
        let stop = StopFlag::new();
        let captured = Arc::new(PipelineSlot::new(stop.clone()));
        let transformed = Arc::new(PipelineSlot::new(stop.clone()));

        let capture = stage::spawn_source("capture", stop.clone(), captured.clone(), source)
            .context("failed to spawn capture stage")?;
        let process = stage::spawn_transform(
            "process",
            stop.clone(),
            captured,
            transformed.clone(),
            transform,
        )
        .context("failed to spawn process stage")?;
        let display = stage::spawn_sink("display", stop.clone(), transformed, sink)
            .context("failed to spawn display stage")?;

        Ok(Self {
            stop,
            stages: vec![
                ("capture", capture),
                ("process", process),
                ("display", display),
            ],
        })
    }

    /// Handle to the pipeline's internal stop flag.
    ///
    /// The flag is also tripped by [`run`] and by the capture stage on end
    /// of stream; external code normally signals shutdown through the
    /// `should_stop` condition instead.
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Block until `should_stop` reports true (or something inside the
    /// pipeline has already tripped the flag), then shut down.
    pub fn run<F>(self, mut should_stop: F) -> Result<()>
    where
        F: FnMut() -> bool,
    {
        while !self.stop.is_set() && !should_stop() {
            thread::sleep(STOP_POLL_INTERVAL);
        }
        self.shutdown()
    }

    /// Trip the stop flag and join all three stage threads.
    pub fn shutdown(self) -> Result<()> {
        self.stop.trip();
        let mut panicked = Vec::new();
        for (name, handle) in self.stages {
            if handle.join().is_err() {
                panicked.push(name);
            }
        }
        if !panicked.is_empty() {
            bail!("pipeline stage(s) panicked: {}", panicked.join(", "));
        }
        debug!("pipeline threads joined");
        Ok(())
    }
}
