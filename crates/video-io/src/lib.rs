//! OpenCV-backed camera capture and display window.
//!
//! Both sides of the pipeline's I/O boundary live here: [`CameraSource`],
//! a blocking "next frame" poll over `VideoCapture`, and [`DisplayWindow`],
//! a highgui window that shows frames and reports the Escape key through an
//! atomic exit handle. Frames travel between them as [`SharedFrame`]s:
//! reference-counted, immutable once published.

mod camera;
mod display;
mod types;

pub use camera::CameraSource;
pub use display::DisplayWindow;
pub use types::{CaptureError, DisplayError, Frame, FrameFormat, SharedFrame};
