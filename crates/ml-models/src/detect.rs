//! Object detection variant: draw labelled boxes on a copy of the frame.

use std::{path::Path, sync::Arc};

use anyhow::{Result, bail};
use tch::{CModule, Device, IValue, Tensor};
use video_io::{Frame, SharedFrame};

use crate::{FrameTransform, annotate, labels, tensor};

const SCORE_THRESHOLD: f32 = 0.5;
const BOX_COLOR: annotate::Bgr = [0, 255, 0];
const TEXT_COLOR: annotate::Bgr = [0, 0, 0];

pub struct ObjectDetect {
    module: CModule,
    device: Device,
    input_size: (i64, i64),
    labels: Vec<String>,
}

impl ObjectDetect {
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

impl FrameTransform for ObjectDetect {
    fn name(&self) -> &'static str {
        "detect"
    }

    fn process_frame(&mut self, frame: &SharedFrame) -> Result<SharedFrame> {
        let input = tensor::frame_to_input(frame, self.device, self.input_size)?;
        let output = self.module.forward_is(&[IValue::Tensor(input)])?;

        // SSD post-processing heads: boxes [1,K,4], classes [1,K],
        // scores [1,K], valid count [1].
        let IValue::Tuple(values) = output else {
            bail!("unexpected detector output: expected a tuple");
        };
        if values.len() != 4 {
            bail!(
                "detector returned {} outputs, expected boxes/classes/scores/count",
                values.len()
            );
        }
        let boxes = flat_f32(&values[0])?;
        let classes = flat_f32(&values[1])?;
        let scores = flat_f32(&values[2])?;
        let count = flat_f32(&values[3])?;

        let detections = (count.first().copied().unwrap_or(0.0) as usize)
            .min(scores.len())
            .min(classes.len())
            .min(boxes.len() / 4);

        let mut data = frame.data.clone();
        for i in 0..detections {
            let score = scores[i];
            if score < SCORE_THRESHOLD {
                continue;
            }
            let class_id = classes[i] as usize;
            let Some(label) = self.labels.get(class_id) else {
                continue;
            };

            // box coordinates arrive normalized as (top, left, bottom, right)
            let [left, top, right, bottom] = scale_box(
                [boxes[i * 4], boxes[i * 4 + 1], boxes[i * 4 + 2], boxes[i * 4 + 3]],
                frame.width,
                frame.height,
            );
            annotate::draw_rectangle(
                &mut data,
                frame.width,
                frame.height,
                left,
                top,
                right,
                bottom,
                BOX_COLOR,
            );

            let plate_top = (top - annotate::GLYPH_HEIGHT - 4).max(0);
            let plate_right = (left + annotate::label_width(label) + 4).min(frame.width - 1);
            annotate::fill_rect(
                &mut data,
                frame.width,
                frame.height,
                left,
                plate_top,
                plate_right,
                top,
                BOX_COLOR,
            );
            annotate::draw_label(
                &mut data,
                frame.width,
                frame.height,
                left + 2,
                plate_top + 2,
                label,
                TEXT_COLOR,
            );
        }

        Ok(Arc::new(Frame {
            data,
            width: frame.width,
            height: frame.height,
            timestamp_ms: frame.timestamp_ms,
            format: frame.format,
        }))
    }
}

fn flat_f32(value: &IValue) -> Result<Vec<f32>> {
    let IValue::Tensor(tensor) = value else {
        bail!("unexpected detector output element: {value:?}");
    };
    let flat: Tensor = tensor.to_device(Device::Cpu).reshape([-1]);
    Ok(Vec::<f32>::try_from(&flat)?)
}

/// Map a normalized (top, left, bottom, right) box to clamped pixel
/// (left, top, right, bottom) coordinates.
fn scale_box(bbox: [f32; 4], width: i32, height: i32) -> [i32; 4] {
    let [top, left, bottom, right] = bbox;
    let max_x = (width - 1) as f32;
    let max_y = (height - 1) as f32;
    [
        (left * width as f32).clamp(0.0, max_x).round() as i32,
        (top * height as f32).clamp(0.0, max_y).round() as i32,
        (right * width as f32).clamp(0.0, max_x).round() as i32,
        (bottom * height as f32).clamp(0.0, max_y).round() as i32,
    ]
}

#[cfg(test)]
mod tests {
    use super::scale_box;

    #[test]
    fn boxes_scale_to_pixel_coordinates() {
        let [left, top, right, bottom] = scale_box([0.25, 0.1, 0.75, 0.9], 100, 200);
        assert_eq!(left, 10);
        assert_eq!(top, 50);
        assert_eq!(right, 90);
        assert_eq!(bottom, 150);
    }

    #[test]
    fn out_of_range_boxes_clamp_to_the_frame() {
        let [left, top, right, bottom] = scale_box([-0.5, -0.2, 1.4, 1.1], 100, 100);
        assert_eq!(left, 0);
        assert_eq!(top, 0);
        assert_eq!(right, 99);
        assert_eq!(bottom, 99);
    }
}
