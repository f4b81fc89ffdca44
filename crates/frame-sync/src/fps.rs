use std::{
    thread,
    time::{Duration, Instant},
};

use tracing::debug;

const REPORT_WINDOW: Duration = Duration::from_secs(1);

/// Display-side rate limiter.
///
/// Each [`tick`](Self::tick) sleeps off whatever remains of the target
/// interval since the previous tick, capping throughput; once per reporting
/// window the measured rate is logged and published as a gauge. Advisory
/// only: it shapes display cadence and never affects pipeline correctness.
pub struct Fps {
    last_tick: Option<Instant>,
    window_started: Instant,
    frames: u32,
}

impl Fps {
    pub fn new() -> Self {
        Self {
            last_tick: None,
            window_started: Instant::now(),
            frames: 0,
        }
    }

    /// Account for one displayed frame, sleeping so consecutive ticks are
    /// at least `target_interval` apart.
    pub fn tick(&mut self, target_interval: Duration) {
        if let Some(last) = self.last_tick {
            let elapsed = last.elapsed();
            if elapsed < target_interval {
                thread::sleep(target_interval - elapsed);
            }
        }
        self.last_tick = Some(Instant::now());
        self.frames += 1;

        let window = self.window_started.elapsed();
        if window >= REPORT_WINDOW {
            let rate = f64::from(self.frames) / window.as_secs_f64();
            debug!("display rate: {rate:.1} fps");
            metrics::gauge!("booth_display_fps").set(rate);
            self.frames = 0;
            self.window_started = Instant::now();
        }
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self::new()
    }
}
