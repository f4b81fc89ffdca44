//! Photobooth runtime: live camera preview annotated by a model variant.
//!
//! The module is split into focused submodules:
//! - `config`: CLI configuration parsing.
//! - `pipeline`: wires camera, model, and window into the three-stage
//!   pipeline and owns the run/shutdown sequence.
//! - `telemetry`: tracing subscriber and Prometheus metrics recorder.

pub use config::BoothConfig;
pub use pipeline::run;

mod config;
mod pipeline;
pub(crate) mod telemetry;
