use anyhow::Result;
use candle_core::{Module, ModuleT, Tensor, D};
use candle_nn::{self as nn, VarBuilder};

use super::vectornet::{VectorNet, EMBED_DIM};

/// Width of the shared trunk feature broadcast across anchors.
pub const TRUNK_DIM: usize = 256;
/// Width of the per-anchor fused feature consumed by both heads.
const FUSED_DIM: usize = 64;
/// Hidden width inside the correction and confidence heads.
const HEAD_HIDDEN: usize = 128;

/// Generates candidate trajectory endpoints from anchor points sampled from
/// map centerlines.
///
/// The scene embedding from the encoder is projected to a trunk feature,
/// broadcast across the runtime-determined anchor count, and fused with each
/// anchor's 2D coordinate. Two parallel heads then regress a residual 2D
/// correction (target = anchor + correction) and an unnormalized confidence
/// logit per anchor. No parameter depends on the anchor count, so one model
/// serves any number of anchors, including zero.
pub struct TargetGenerator {
    vectornet: VectorNet,
    trunk: nn::Linear,
    fusion: nn::Linear,
    corr_hidden: nn::Linear,
    corr_norm: nn::BatchNorm,
    corr_out: nn::Linear,
    conf_hidden: nn::Linear,
    conf_norm: nn::BatchNorm,
    conf_out: nn::Linear,
}

impl TargetGenerator {
    /// `polyline_features` is the per-point feature width of the scenes this
    /// generator will see; the compute device is the VarBuilder's device.
    pub fn new(vb: VarBuilder<'_>, polyline_features: usize) -> Result<Self> {
        let vectornet = VectorNet::new(vb.pp("vectornet"), polyline_features)?;

        let trunk = nn::linear(EMBED_DIM, TRUNK_DIM, vb.pp("trunk"))?;
        // Trunk feature concatenated with one (x, y) anchor coordinate.
        let fusion = nn::linear(TRUNK_DIM + 2, FUSED_DIM, vb.pp("fusion"))?;

        let corr_hidden = nn::linear(FUSED_DIM, HEAD_HIDDEN, vb.pp("corrections.hidden"))?;
        let corr_norm = nn::batch_norm(
            HEAD_HIDDEN,
            nn::BatchNormConfig::default(),
            vb.pp("corrections.norm"),
        )?;
        let corr_out = nn::linear(HEAD_HIDDEN, 2, vb.pp("corrections.out"))?;

        let conf_hidden = nn::linear(FUSED_DIM, HEAD_HIDDEN, vb.pp("confidence.hidden"))?;
        let conf_norm = nn::batch_norm(
            HEAD_HIDDEN,
            nn::BatchNormConfig::default(),
            vb.pp("confidence.norm"),
        )?;
        let conf_out = nn::linear(HEAD_HIDDEN, 1, vb.pp("confidence.out"))?;

        Ok(Self {
            vectornet,
            trunk,
            fusion,
            corr_hidden,
            corr_norm,
            corr_out,
            conf_hidden,
            conf_norm,
            conf_out,
        })
    }

    /// Forward pass with an explicit train flag.
    ///
    /// `inputs` is a polyline batch `[P, L, F]`, `anchors` a set of N anchor
    /// points `[N, 2]`; N is read from the anchors at call time. Returns
    /// `(embedding [EMBED_DIM], targets [N, 2], confidences [N])`, targets
    /// and confidences order-preserving with the anchors.
    ///
    /// `train` selects batch statistics (updating the running statistics) in
    /// the head norms; evaluation mode uses the accumulated running
    /// statistics and is fully deterministic. Train-mode normalization needs
    /// N >= 2 for finite batch variance; this is not guarded here, callers
    /// validate their batches.
    pub fn generate_t(
        &self,
        inputs: &Tensor,
        anchors: &Tensor,
        train: bool,
    ) -> Result<(Tensor, Tensor, Tensor)> {
        let n_anchors = anchors.dim(0)?;

        // Encode the scene and expand to the working width.
        let embedding = self.vectornet.forward(inputs)?; // [1, EMBED_DIM]
        let trunk = self.trunk.forward(&embedding)?.relu()?; // [1, TRUNK_DIM]

        // Merge anchor points with the broadcast trunk feature. The zero-row
        // case (N = 0) flows through unchanged and yields empty outputs.
        let expanded = trunk.broadcast_as((n_anchors, TRUNK_DIM))?;
        let fused = Tensor::cat(&[&expanded, anchors], D::Minus1)?; // [N, TRUNK_DIM + 2]
        let fused = self.fusion.forward(&fused)?.relu()?; // [N, FUSED_DIM]

        // Corrections are residual: anchors are already plausible endpoints,
        // the head only regresses the displacement away from them.
        let corr = self.corr_hidden.forward(&fused)?;
        let corr = self.corr_norm.forward_t(&corr, train)?.relu()?;
        let corrections = self.corr_out.forward(&corr)?; // [N, 2]
        let targets = (anchors + corrections)?;

        let conf = self.conf_hidden.forward(&fused)?;
        let conf = self.conf_norm.forward_t(&conf, train)?.relu()?;
        let confidences = self.conf_out.forward(&conf)?.squeeze(D::Minus1)?; // [N]

        Ok((embedding.squeeze(0)?, targets, confidences))
    }

    /// Evaluation-mode forward pass (running normalization statistics).
    pub fn generate(&self, inputs: &Tensor, anchors: &Tensor) -> Result<(Tensor, Tensor, Tensor)> {
        self.generate_t(inputs, anchors, false)
    }

    pub fn vectornet(&self) -> &VectorNet {
        &self.vectornet
    }
}
