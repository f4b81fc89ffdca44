use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use ml_models::ModelKind;

const BOOTH_USAGE: &str = "Usage: photobooth [--model-kind <classify|segment|detect>] \
[--source <uri>] [--model <path>] [--labels <path>] [--width <px>] [--height <px>] \
[--display-interval <ms>] [--cpu] [--verbose]\n\nPositional form is also supported: \
photobooth <model-kind> [camera-uri]";

#[derive(Clone, Debug)]
pub struct BoothConfig {
    pub camera_uri: String,
    pub model_kind: ModelKind,
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub width: i32,
    pub height: i32,
    pub display_interval_ms: u64,
    pub use_cpu: bool,
    pub verbose: bool,
}

impl BoothConfig {
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut camera_uri: Option<String> = None;
        let mut model_kind: Option<ModelKind> = None;
        let mut model_path: Option<PathBuf> = None;
        let mut labels_path: Option<PathBuf> = None;
        let mut width: Option<i32> = None;
        let mut height: Option<i32> = None;
        let mut display_interval_ms: Option<u64> = None;
        let mut use_cpu = false;
        let mut verbose = false;
        let mut positional: Vec<String> = Vec::new();

        let mut idx = 1;
        while idx < args.len() {
            match args[idx].as_str() {
                "--help" | "-h" => bail!(BOOTH_USAGE),
                "--model-kind" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--model-kind requires a value"))?;
                    model_kind = Some(parse_model_kind(value)?);
                    idx += 1;
                }
                "--source" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--source requires a value"))?
                        .clone();
                    camera_uri = Some(value);
                    idx += 1;
                }
                "--model" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--model requires a value"))?
                        .clone();
                    model_path = Some(PathBuf::from(value));
                    idx += 1;
                }
                "--labels" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--labels requires a value"))?
                        .clone();
                    labels_path = Some(PathBuf::from(value));
                    idx += 1;
                }
                "--width" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--width requires a value"))?
                        .parse::<i32>()
                        .with_context(|| "--width must be a positive integer".to_string())?;
                    if value <= 0 {
                        bail!("--width must be a positive integer");
                    }
                    width = Some(value);
                    idx += 1;
                }
                "--height" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--height requires a value"))?
                        .parse::<i32>()
                        .with_context(|| "--height must be a positive integer".to_string())?;
                    if value <= 0 {
                        bail!("--height must be a positive integer");
                    }
                    height = Some(value);
                    idx += 1;
                }
                "--display-interval" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--display-interval requires a value"))?
                        .parse::<u64>()
                        .with_context(|| {
                            "--display-interval must be a positive integer of milliseconds"
                                .to_string()
                        })?;
                    if value == 0 {
                        bail!("--display-interval must be at least 1");
                    }
                    display_interval_ms = Some(value);
                    idx += 1;
                }
                "--cpu" => {
                    use_cpu = true;
                    idx += 1;
                }
                "--verbose" => {
                    verbose = true;
                    idx += 1;
                }
                arg if arg.starts_with('-') => {
                    bail!("Unrecognised flag: {arg}");
                }
                other => {
                    positional.push(other.to_string());
                    idx += 1;
                }
            }
        }

        let mut positional = positional.into_iter();
        if model_kind.is_none() {
            if let Some(value) = positional.next() {
                model_kind = Some(parse_model_kind(&value)?);
            }
        }
        if camera_uri.is_none() {
            camera_uri = positional.next();
        }

        let model_kind = model_kind.ok_or_else(|| {
            anyhow!("Missing model kind. Provide --model-kind or positional <model-kind>.\n\n{BOOTH_USAGE}")
        })?;
        let camera_uri = camera_uri.unwrap_or_else(|| "/dev/video0".to_string());
        let model_path = model_path.unwrap_or_else(|| model_kind.default_model_path());
        let labels_path = labels_path.unwrap_or_else(|| model_kind.default_labels_path());

        Ok(Self {
            camera_uri,
            model_kind,
            model_path,
            labels_path,
            width: width.unwrap_or(1280),
            height: height.unwrap_or(720),
            display_interval_ms: display_interval_ms.unwrap_or(60),
            use_cpu,
            verbose,
        })
    }
}

fn parse_model_kind(value: &str) -> Result<ModelKind> {
    ModelKind::from_name(value)
        .ok_or_else(|| anyhow!("Unknown model kind {value:?}; expected classify, segment or detect"))
}
