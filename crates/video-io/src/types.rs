use std::sync::Arc;

use anyhow::Error;
use thiserror::Error;

/// Raw frame captured from a video source.
///
/// Content is written exactly once, by whichever stage allocates it; after
/// the frame is handed to a pipeline slot it is shared and never mutated.
/// Stages that want to draw on a frame copy it first.
pub struct Frame {
    pub data: Vec<u8>,
    pub width: i32,
    pub height: i32,
    pub timestamp_ms: i64,
    pub format: FrameFormat,
}

/// Shared, immutable handle to a frame as it flows through the pipeline.
pub type SharedFrame = Arc<Frame>;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Bgr8,
}

impl Frame {
    /// Byte length a well-formed buffer must have for this geometry.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to open video source {uri:?}")]
    Open { uri: String },
    #[error(transparent)]
    Other(#[from] Error),
}

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("failed to create display window {title:?}")]
    Create { title: String },
    #[error("frame buffer is {got} bytes but {width}x{height} BGR needs {expected}")]
    BadGeometry {
        got: usize,
        width: i32,
        height: i32,
        expected: usize,
    },
    #[error(transparent)]
    Other(#[from] Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_len_matches_bgr_geometry() {
        let frame = Frame {
            data: vec![0; 6],
            width: 2,
            height: 1,
            timestamp_ms: 0,
            format: FrameFormat::Bgr8,
        };
        assert_eq!(frame.expected_len(), 6);
        assert_eq!(frame.data.len(), frame.expected_len());
    }
}
