//! Image classification variant: report the top predictions, pass the
//! frame through untouched.

use std::path::Path;

use anyhow::{Result, bail};
use tch::{CModule, Device};
use tracing::info;
use video_io::SharedFrame;

use crate::{FrameTransform, labels, tensor};

const TOP_PREDICTIONS: usize = 5;
const REPORT_THRESHOLD: f32 = 0.01;

pub struct ImageClassify {
    module: CModule,
    device: Device,
    input_size: (i64, i64),
    labels: Vec<String>,
}

impl ImageClassify {
    pub fn new(
        model_path: &Path,
        labels_path: &Path,
        device: Device,
        input_size: (i64, i64),
    ) -> Result<Self> {
        let labels = labels::read_labels(labels_path)?;
        let module = CModule::load_on_device(model_path, device)?;
        Ok(Self {
            module,
            device,
            input_size,
            labels,
        })
    }
}

impl FrameTransform for ImageClassify {
    fn name(&self) -> &'static str {
        "classify"
    }

    fn process_frame(&mut self, frame: &SharedFrame) -> Result<SharedFrame> {
        let input = tensor::frame_to_input(frame, self.device, self.input_size)?;
        let output = self.module.forward_ts(&[input])?;
        let scores_t = output.to_device(Device::Cpu).squeeze();
        let shape = scores_t.size();
        if shape.len() != 1 {
            bail!("unexpected classifier output shape: {shape:?}");
        }

        let scores = Vec::<f32>::try_from(&scores_t)?;
        for (index, score) in top_scores(&scores, TOP_PREDICTIONS) {
            if score > REPORT_THRESHOLD {
                let label = self.labels.get(index).map(String::as_str).unwrap_or("?");
                info!("{label} @ {score:.3}");
            }
        }

        // Classification draws nothing; the captured frame goes straight on.
        Ok(frame.clone())
    }
}

/// Indices of the `count` highest scores, best first.
fn top_scores(scores: &[f32], count: usize) -> Vec<(usize, f32)> {
    let mut indexes: Vec<usize> = (0..scores.len()).collect();
    indexes.sort_unstable_by(|a, b| scores[*b].total_cmp(&scores[*a]));
    indexes.truncate(count);
    indexes.into_iter().map(|i| (i, scores[i])).collect()
}
