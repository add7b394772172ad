use anyhow::{bail, Result};
use candle_core::Device;

/// Demo-run parameters. Defaults match the reference scene: 200 polylines of
/// 20 points with 9 features each, and 75 anchors.
pub struct Config {
    pub device: String,
    pub polylines: usize,
    pub points: usize,
    pub polyline_features: usize,
    pub anchors: usize,
}

impl Config {
    pub fn from_args() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        Self::from_args_after(&args[1..])
    }

    pub fn from_args_after(args: &[String]) -> Result<Self> {
        Ok(Self {
            device: args.first().cloned().unwrap_or_else(|| "cpu".to_string()),
            polylines: args.get(1).and_then(|v| v.parse().ok()).unwrap_or(200),
            points: args.get(2).and_then(|v| v.parse().ok()).unwrap_or(20),
            polyline_features: args.get(3).and_then(|v| v.parse().ok()).unwrap_or(9),
            anchors: args.get(4).and_then(|v| v.parse().ok()).unwrap_or(75),
        })
    }
}

/// Maps an opaque device identifier ("cpu", "cuda", "cuda:<idx>") to a device.
pub fn parse_device(id: &str) -> Result<Device> {
    match id {
        "cpu" => Ok(Device::Cpu),
        "cuda" => Ok(Device::new_cuda(0)?),
        _ => {
            if let Some(idx) = id.strip_prefix("cuda:") {
                let idx: usize = idx.parse()?;
                Ok(Device::new_cuda(idx)?)
            } else {
                bail!("unknown device identifier {id:?}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_scene() {
        let config = Config::from_args_after(&[]).unwrap();
        assert_eq!(config.device, "cpu");
        assert_eq!(config.polylines, 200);
        assert_eq!(config.points, 20);
        assert_eq!(config.polyline_features, 9);
        assert_eq!(config.anchors, 75);
    }

    #[test]
    fn cpu_identifier_parses() {
        assert!(matches!(parse_device("cpu").unwrap(), Device::Cpu));
    }

    #[test]
    fn unknown_identifier_is_rejected() {
        assert!(parse_device("floppy").is_err());
        assert!(parse_device("cuda:x").is_err());
    }
}
