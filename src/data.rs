use anyhow::Result;
use candle_core::{Device, Tensor};
use rand::Rng;

/// One synthetic scene: a polyline batch `[P, L, F]` plus anchors `[N, 2]`.
pub struct Scene {
    pub polylines: Tensor,
    pub anchors: Tensor,
}

/// Builds a synthetic lane-like scene for smoke runs and tests.
///
/// Each polyline is a roughly straight centerline from a random origin and
/// heading with light jitter; per-point features are (x, y, dx, dy) padded
/// with zeros up to `features`. Anchors are points a short distance further
/// along randomly chosen centerlines, the way real anchors are sampled from
/// the map ahead of the agent.
pub fn synthetic_scene(
    polylines: usize,
    points: usize,
    features: usize,
    anchors: usize,
    device: &Device,
) -> Result<Scene> {
    let mut rng = rand::thread_rng();
    let step = 2.0f32;

    let mut lines = Vec::with_capacity(polylines);
    let mut data = Vec::with_capacity(polylines * points * features);
    for _ in 0..polylines {
        let x0: f32 = rng.gen_range(-50.0..50.0);
        let y0: f32 = rng.gen_range(-50.0..50.0);
        let heading: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
        let (dy, dx) = heading.sin_cos();
        for i in 0..points {
            let jitter: f32 = rng.gen_range(-0.2..0.2);
            let x = x0 + dx * step * i as f32 + jitter;
            let y = y0 + dy * step * i as f32 - jitter;
            for k in 0..features {
                data.push(match k {
                    0 => x,
                    1 => y,
                    2 => dx * step,
                    3 => dy * step,
                    _ => 0.0,
                });
            }
        }
        lines.push((x0, y0, dx, dy));
    }
    let polylines_t = Tensor::from_vec(data, (polylines, points, features), device)?;

    let mut anchor_data = Vec::with_capacity(anchors * 2);
    for _ in 0..anchors {
        let &(x0, y0, dx, dy) = &lines[rng.gen_range(0..lines.len())];
        let ahead = step * rng.gen_range(points as f32..points as f32 * 1.5);
        anchor_data.push(x0 + dx * ahead);
        anchor_data.push(y0 + dy * ahead);
    }
    let anchors_t = Tensor::from_vec(anchor_data, (anchors, 2), device)?;

    Ok(Scene {
        polylines: polylines_t,
        anchors: anchors_t,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_tensors_have_requested_shapes() {
        let scene = synthetic_scene(7, 5, 9, 4, &Device::Cpu).unwrap();
        assert_eq!(scene.polylines.dims(), &[7, 5, 9]);
        assert_eq!(scene.anchors.dims(), &[4, 2]);
    }

    #[test]
    fn narrow_feature_widths_are_supported() {
        let scene = synthetic_scene(3, 4, 2, 2, &Device::Cpu).unwrap();
        assert_eq!(scene.polylines.dims(), &[3, 4, 2]);
    }
}
