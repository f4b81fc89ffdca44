//! Semantic segmentation variant: colorize the per-pixel class map and
//! blend it over a copy of the frame.

use std::{path::Path, sync::Arc};

use anyhow::{Result, bail};
use rand::Rng;
use tch::{CModule, Device, Kind};
use tracing::debug;
use video_io::{Frame, SharedFrame};

use crate::{FrameTransform, labels, tensor};

const PALETTE_SIZE: usize = 256;

pub struct ImageSegment {
    module: CModule,
    device: Device,
    input_size: (i64, i64),
    palette: [[u8; 3]; PALETTE_SIZE],
}

impl ImageSegment {
    pub fn new(
        model_path: &Path,
        labels_path: &Path,
        device: Device,
        input_size: (i64, i64),
    ) -> Result<Self> {
        let labels = labels::read_labels(labels_path)?;
        debug!("loaded {} segmentation classes", labels.len());
        let module = CModule::load_on_device(model_path, device)?;
        Ok(Self {
            module,
            device,
            input_size,
            palette: build_palette(&mut rand::thread_rng()),
        })
    }
}

impl FrameTransform for ImageSegment {
    fn name(&self) -> &'static str {
        "segment"
    }

    fn process_frame(&mut self, frame: &SharedFrame) -> Result<SharedFrame> {
        let input = tensor::frame_to_input(frame, self.device, self.input_size)?;
        let output = self.module.forward_ts(&[input])?;

        // Either a ready-made class map or per-class logits to argmax.
        let class_map = match output.size().len() {
            3 => output,
            4 => output.argmax(Some(1), false),
            _ => bail!("unexpected segmentation output shape: {:?}", output.size()),
        };
        let class_map = class_map
            .to_device(Device::Cpu)
            .to_kind(Kind::Int64)
            .squeeze_dim(0);
        let (mask_h, mask_w) = class_map.size2()?;
        let classes = Vec::<i64>::try_from(&class_map.reshape([-1]))?;

        let mut data = frame.data.clone();
        overlay_classes(
            &mut data,
            frame.width as usize,
            frame.height as usize,
            &classes,
            mask_w as usize,
            mask_h as usize,
            &self.palette,
        );

        Ok(Arc::new(Frame {
            data,
            width: frame.width,
            height: frame.height,
            timestamp_ms: frame.timestamp_ms,
            format: frame.format,
        }))
    }
}

/// Chained random palette: every entry is the average of its predecessor
/// and a fresh random byte, which keeps neighbouring class ids visually
/// related while class 0 (background) stays black.
fn build_palette(rng: &mut impl Rng) -> [[u8; 3]; PALETTE_SIZE] {
    let mut colors = [[0u8; 3]; PALETTE_SIZE];
    for i in 1..PALETTE_SIZE {
        for channel in 0..3 {
            let blended = (u16::from(colors[i - 1][channel]) + rng.gen_range(0..=255u16)) / 2;
            colors[i][channel] = blended as u8;
        }
    }
    colors
}

/// Scale the class map to frame size (nearest neighbour) and add its colors
/// onto the frame, channel-saturating like the original overlay.
fn overlay_classes(
    data: &mut [u8],
    frame_w: usize,
    frame_h: usize,
    classes: &[i64],
    mask_w: usize,
    mask_h: usize,
    palette: &[[u8; 3]; PALETTE_SIZE],
) {
    if mask_w == 0 || mask_h == 0 || classes.len() < mask_w * mask_h {
        return;
    }
    for y in 0..frame_h {
        let src_y = y * mask_h / frame_h;
        for x in 0..frame_w {
            let src_x = x * mask_w / frame_w;
            let class = classes[src_y * mask_w + src_x] as usize & (PALETTE_SIZE - 1);
            let color = palette[class];
            let idx = (y * frame_w + x) * 3;
            if idx + 2 < data.len() {
                data[idx] = data[idx].saturating_add(color[0]);
                data[idx + 1] = data[idx + 1].saturating_add(color[1]);
                data[idx + 2] = data[idx + 2].saturating_add(color[2]);
            }
        }
    }
}
