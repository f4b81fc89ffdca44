use anyhow::{Result, bail};
use tch::{Device, Kind, Tensor};
use video_io::{Frame, FrameFormat};

/// Convert a BGR frame into the `[1, 3, H, W]` RGB float tensor a model
/// expects, resized to `input_size` (height, width) when the capture
/// geometry differs.
pub(crate) fn frame_to_input(
    frame: &Frame,
    device: Device,
    input_size: (i64, i64),
) -> Result<Tensor> {
    if !matches!(frame.format, FrameFormat::Bgr8) {
        bail!("unsupported frame format");
    }
    let expected = frame.expected_len();
    if frame.data.len() != expected {
        bail!(
            "unexpected frame buffer size: got {} bytes, expected {}",
            frame.data.len(),
            expected
        );
    }

    let (frame_h, frame_w) = (i64::from(frame.height), i64::from(frame.width));
    let tensor = Tensor::from_slice(&frame.data)
        .to_device(device)
        .to_kind(Kind::Float)
        .view([1, frame_h, frame_w, 3])
        .flip([3])
        .permute([0, 3, 1, 2])
        / 255.0;

    let (in_h, in_w) = input_size;
    if (frame_h, frame_w) == (in_h, in_w) {
        Ok(tensor)
    } else {
        Ok(tensor.upsample_bilinear2d([in_h, in_w], false, None, None))
    }
}
