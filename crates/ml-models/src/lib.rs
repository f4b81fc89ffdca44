//! TorchScript-backed frame transforms for the photobooth pipeline.
//!
//! Each model variant implements [`FrameTransform`]: take the newest
//! captured frame, run inference, and hand back a frame for display.
//! Classification returns the input untouched and reports through the log;
//! segmentation and detection return a freshly annotated copy. The
//! pipeline treats the transform as opaque; variants share no state beyond
//! this trait.

use std::path::{Path, PathBuf};

use anyhow::Result;
use video_io::SharedFrame;

mod annotate;
mod classify;
mod detect;
mod labels;
mod segment;
mod tensor;

pub use classify::ImageClassify;
pub use detect::ObjectDetect;
pub use segment::ImageSegment;
pub use tch;

/// One frame in, one frame out, given whatever state the model needs.
///
/// Implementations never mutate the input frame: it is shared with the
/// upstream slot. A variant that draws does so on its own copy.
pub trait FrameTransform: Send {
    fn name(&self) -> &'static str;
    fn process_frame(&mut self, frame: &SharedFrame) -> Result<SharedFrame>;
}

/// Model variant selected at pipeline construction time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelKind {
    Classify,
    Segment,
    Detect,
}

impl ModelKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "classify" | "classification" => Some(ModelKind::Classify),
            "segment" | "segmentation" => Some(ModelKind::Segment),
            "detect" | "detection" => Some(ModelKind::Detect),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Classify => "classify",
            ModelKind::Segment => "segment",
            ModelKind::Detect => "detect",
        }
    }

    pub fn default_model_path(self) -> PathBuf {
        PathBuf::from(match self {
            ModelKind::Classify => "models/mobilenet_v3.pt",
            ModelKind::Segment => "models/deeplab_v3.pt",
            ModelKind::Detect => "models/ssd_mobilenet_v2.pt",
        })
    }

    pub fn default_labels_path(self) -> PathBuf {
        PathBuf::from(match self {
            ModelKind::Classify => "models/imagenet_labels.txt",
            ModelKind::Segment => "models/pascal_voc_labels.txt",
            ModelKind::Detect => "models/coco_labels.txt",
        })
    }

    /// Input geometry the bundled model of each kind expects, (height, width).
    pub fn input_size(self) -> (i64, i64) {
        match self {
            ModelKind::Classify => (224, 224),
            ModelKind::Segment => (513, 513),
            ModelKind::Detect => (300, 300),
        }
    }
}

/// Load the selected model variant. Any failure here is a startup failure;
/// no pipeline should be assembled around a transform that did not load.
pub fn build_transform(
    kind: ModelKind,
    model_path: &Path,
    labels_path: &Path,
    device: tch::Device,
) -> Result<Box<dyn FrameTransform>> {
    let input_size = kind.input_size();
    Ok(match kind {
        ModelKind::Classify => Box::new(ImageClassify::new(
            model_path,
            labels_path,
            device,
            input_size,
        )?),
        ModelKind::Segment => Box::new(ImageSegment::new(
            model_path,
            labels_path,
            device,
            input_size,
        )?),
        ModelKind::Detect => Box::new(ObjectDetect::new(
            model_path,
            labels_path,
            device,
            input_size,
        )?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_kinds_resolve_by_name() {
        assert_eq!(ModelKind::from_name("classify"), Some(ModelKind::Classify));
        assert_eq!(
            ModelKind::from_name("segmentation"),
            Some(ModelKind::Segment)
        );
        assert_eq!(ModelKind::from_name("detect"), Some(ModelKind::Detect));
        assert_eq!(ModelKind::from_name("pose"), None);
    }

    #[test]
    fn default_paths_follow_the_kind() {
        let kind = ModelKind::Detect;
        assert!(
            kind.default_model_path()
                .to_string_lossy()
                .contains("ssd_mobilenet")
        );
        assert!(
            kind.default_labels_path()
                .to_string_lossy()
                .contains("coco")
        );
    }
}
