//! Blocking camera source polled by the capture stage.

use std::sync::Arc;

use chrono::Utc;
use opencv::{
    core::{self, MatTraitConstManual},
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTrait},
};
use tracing::warn;

use crate::types::{CaptureError, Frame, FrameFormat, SharedFrame};

const CAPTURE_FPS: f64 = 30.0;

/// Camera or file-backed frame source.
///
/// Opening configures the device for MJPEG (YUYV fallback) at the target
/// resolution and 30 fps; [`next_frame`](Self::next_frame) then blocks on
/// `VideoCapture::read`, resizing when the device ignored the resolution
/// request, and yields BGR [`SharedFrame`]s until the stream ends.
pub struct CameraSource {
    capture: VideoCapture,
    target_size: (i32, i32),
    frame: Mat,
    scratch: Mat,
}

impl CameraSource {
    pub fn open(uri: &str, target_size: (i32, i32)) -> Result<Self, CaptureError> {
        let mut capture = open_video_capture(uri)?;
        configure_camera(&mut capture, target_size, CAPTURE_FPS);
        Ok(Self {
            capture,
            target_size,
            frame: Mat::default(),
            scratch: Mat::default(),
        })
    }

    /// Block until the next frame is available.
    ///
    /// Returns `Ok(None)` on end of stream (file sources run out; a closed
    /// device stops reading). Zero-sized grabs are skipped rather than
    /// surfaced.
    pub fn next_frame(&mut self) -> Result<Option<SharedFrame>, CaptureError> {
        let (target_w, target_h) = self.target_size;
        loop {
            let grabbed = self
                .capture
                .read(&mut self.frame)
                .map_err(|e| CaptureError::Other(e.into()))?;
            if !grabbed {
                return Ok(None);
            }

            let size = self
                .frame
                .size()
                .map_err(|e| CaptureError::Other(e.into()))?;
            if size.width <= 0 {
                continue;
            }

            let working = if size.width != target_w || size.height != target_h {
                opencv::imgproc::resize(
                    &self.frame,
                    &mut self.scratch,
                    core::Size {
                        width: target_w,
                        height: target_h,
                    },
                    0.0,
                    0.0,
                    opencv::imgproc::INTER_LINEAR,
                )
                .map_err(|e| CaptureError::Other(e.into()))?;
                &self.scratch
            } else {
                &self.frame
            };

            let data = working
                .data_bytes()
                .map_err(|e| CaptureError::Other(e.into()))?
                .to_vec();

            return Ok(Some(Arc::new(Frame {
                data,
                width: target_w,
                height: target_h,
                timestamp_ms: Utc::now().timestamp_millis(),
                format: FrameFormat::Bgr8,
            })));
        }
    }
}

/// Parse a `/dev/videoX` style URI and return the zero-based index if present.
pub(crate) fn parse_device_index(uri: &str) -> Option<i32> {
    if let Ok(index) = uri.parse::<i32>() {
        return Some(index);
    }
    if let Some(stripped) = uri.strip_prefix("/dev/video") {
        if stripped.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(index) = stripped.parse::<i32>() {
                return Some(index);
            }
        }
    }
    None
}

/// Attempt to open a camera input either by index or URI.
fn open_video_capture(uri: &str) -> Result<VideoCapture, CaptureError> {
    if let Some(index) = parse_device_index(uri) {
        for backend in [videoio::CAP_V4L, videoio::CAP_ANY] {
            match VideoCapture::new(index, backend) {
                Ok(cap) => {
                    if cap.is_opened().map_err(|e| CaptureError::Other(e.into()))? {
                        return Ok(cap);
                    }
                }
                Err(err) => {
                    warn!("failed to open device #{index} with backend {backend}: {err}");
                }
            }
        }
    }

    for backend in [videoio::CAP_V4L, videoio::CAP_ANY] {
        match VideoCapture::from_file(uri, backend) {
            Ok(cap) => {
                if cap.is_opened().map_err(|e| CaptureError::Other(e.into()))? {
                    return Ok(cap);
                }
            }
            Err(err) => {
                warn!("failed to open {uri} with backend {backend}: {err}");
            }
        }
    }

    Err(CaptureError::Open {
        uri: uri.to_string(),
    })
}

/// Apply common capture settings (resolution, fps, preferred pixel format).
fn configure_camera(cap: &mut VideoCapture, target_size: (i32, i32), fps: f64) {
    let mut fourcc_set = false;
    if let Ok(mjpg) = videoio::VideoWriter::fourcc('M', 'J', 'P', 'G') {
        if matches!(cap.set(videoio::CAP_PROP_FOURCC, mjpg as f64), Ok(true)) {
            fourcc_set = true;
        }
    }
    if !fourcc_set {
        if let Ok(yuyv) = videoio::VideoWriter::fourcc('Y', 'U', 'Y', 'V') {
            let _ = cap.set(videoio::CAP_PROP_FOURCC, yuyv as f64);
        }
    }
    let _ = cap.set(videoio::CAP_PROP_FRAME_WIDTH, target_size.0 as f64);
    let _ = cap.set(videoio::CAP_PROP_FRAME_HEIGHT, target_size.1 as f64);
    let _ = cap.set(videoio::CAP_PROP_FPS, fps);
}
