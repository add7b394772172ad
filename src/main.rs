use anyhow::Result;
use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use trajnet::config::{parse_device, Config};
use trajnet::data::synthetic_scene;
use trajnet::model::TargetGenerator;

/// Runs one evaluation-mode pass over a synthetic scene and logs the output
/// shapes. Usage: trajnet [device] [polylines] [points] [features] [anchors]
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_args()?;
    let device = match parse_device(&config.device) {
        Ok(d) => d,
        Err(e) => {
            warn!(
                "device {:?} unavailable ({e}), falling back to cpu",
                config.device
            );
            Device::Cpu
        }
    };

    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
    let generator = TargetGenerator::new(vb, config.polyline_features)?;
    info!(
        "target generator ready: polyline_features={}, device={device:?}",
        config.polyline_features
    );

    let scene = synthetic_scene(
        config.polylines,
        config.points,
        config.polyline_features,
        config.anchors,
        &device,
    )?;
    let (embedding, targets, confidences) = generator.generate(&scene.polylines, &scene.anchors)?;
    info!(
        "embedding {:?}, targets {:?}, confidences {:?}",
        embedding.dims(),
        targets.dims(),
        confidences.dims()
    );

    Ok(())
}
