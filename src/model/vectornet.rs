use anyhow::Result;
use candle_core::{Device, Module, Tensor, D};
use candle_nn::{self as nn, VarBuilder};

use super::attention::InteractionAttention;

/// Width of the scene embedding. Fixed by the encoder contract regardless of
/// polyline count, polyline length, or per-point feature width.
pub const EMBED_DIM: usize = 128;

const SUBGRAPH_HIDDEN: usize = 64;
const GLOBAL_HEADS: usize = 2;

/// One polyline-subgraph layer: per-point MLP, then concatenate each point
/// feature with the polyline-wide max-pool so every point sees its polyline.
/// Doubles the feature width: `[P, L, C] -> [P, L, 2 * out_dim]`.
struct SubgraphLayer {
    proj: nn::Linear,
    norm: nn::LayerNorm,
}

impl SubgraphLayer {
    fn new(vb: VarBuilder<'_>, in_dim: usize, out_dim: usize) -> Result<Self> {
        let proj = nn::linear(in_dim, out_dim, vb.pp("proj"))?;
        let norm = nn::layer_norm(out_dim, 1e-5, vb.pp("norm"))?;
        Ok(Self { proj, norm })
    }

    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let h = self.norm.forward(&self.proj.forward(x)?)?.relu()?;
        let pooled = h.max_keepdim(1)?; // [P, 1, H]
        let pooled = pooled.broadcast_as(h.shape())?;
        Ok(Tensor::cat(&[&h, &pooled], D::Minus1)?)
    }
}

/// VectorNet-style scene encoder.
///
/// Polyline subgraph layers encode each polyline's points, a global
/// self-attention layer exchanges information between polylines, and a final
/// max-pool collapses the scene into a single [`EMBED_DIM`]-wide embedding.
///
/// The rest of the crate depends only on the encode contract
/// (`[P, L, F] -> [1, EMBED_DIM]`), not on these internals.
pub struct VectorNet {
    subgraph1: SubgraphLayer,
    subgraph2: SubgraphLayer,
    global: InteractionAttention,
    device: Device,
}

impl VectorNet {
    /// `polyline_features` is the per-point feature width F; every polyline
    /// tensor passed to [`VectorNet::forward`] must carry it as its trailing
    /// dimension. The compute device is the VarBuilder's device.
    pub fn new(vb: VarBuilder<'_>, polyline_features: usize) -> Result<Self> {
        let subgraph1 = SubgraphLayer::new(vb.pp("subgraph1"), polyline_features, SUBGRAPH_HIDDEN)?;
        let subgraph2 = SubgraphLayer::new(vb.pp("subgraph2"), 2 * SUBGRAPH_HIDDEN, SUBGRAPH_HIDDEN)?;
        let global = InteractionAttention::new(vb.pp("global"), EMBED_DIM, GLOBAL_HEADS)?;
        let device = vb.device().clone();
        Ok(Self {
            subgraph1,
            subgraph2,
            global,
            device,
        })
    }

    /// Encodes a polyline batch `[P, L, F]` into a scene embedding `[1, EMBED_DIM]`.
    pub fn forward(&self, polylines: &Tensor) -> Result<Tensor> {
        let h = self.subgraph1.forward(polylines)?;
        let h = self.subgraph2.forward(&h)?; // [P, L, EMBED_DIM]

        // Max-pool points into per-polyline nodes, then let polylines interact.
        let nodes = h.max(1)?; // [P, EMBED_DIM]
        let nodes = self.global.forward(&nodes.unsqueeze(0)?)?; // [1, P, EMBED_DIM]

        Ok(nodes.max(1)?) // [1, EMBED_DIM]
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::{VarBuilder, VarMap};

    fn encoder(features: usize) -> VectorNet {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        VectorNet::new(vb, features).unwrap()
    }

    #[test]
    fn embedding_width_is_fixed_across_scene_sizes() {
        for (p, l, f) in [(1, 2, 3), (3, 5, 7), (40, 10, 9)] {
            let net = encoder(f);
            let polylines = Tensor::randn(0f32, 1f32, (p, l, f), &Device::Cpu).unwrap();
            let embedding = net.forward(&polylines).unwrap();
            assert_eq!(embedding.dims(), &[1, EMBED_DIM]);
        }
    }

    #[test]
    fn mismatched_feature_width_is_rejected() {
        let net = encoder(9);
        let polylines = Tensor::randn(0f32, 1f32, (4, 6, 7), &Device::Cpu).unwrap();
        assert!(net.forward(&polylines).is_err());
    }
}
