use anyhow::Result;
use candle_core::{Module, Tensor, D};
use candle_nn::{self as nn, VarBuilder};

/// Multi-Head Self-Attention over node features using Candle's primitives.
/// Uses nn::Linear for projections, Tensor::matmul for attention, nn::ops::softmax.
pub struct InteractionAttention {
    num_heads: usize,
    head_dim: usize,
    scale: f64,
    q_proj: nn::Linear,
    k_proj: nn::Linear,
    v_proj: nn::Linear,
    out_proj: nn::Linear,
}

impl InteractionAttention {
    pub fn new(vb: VarBuilder<'_>, dim: usize, num_heads: usize) -> Result<Self> {
        assert!(dim % num_heads == 0, "dim must be divisible by num_heads");
        let head_dim = dim / num_heads;
        let scale = (head_dim as f64).sqrt();

        let q_proj = nn::linear(dim, dim, vb.pp("q_proj"))?;
        let k_proj = nn::linear(dim, dim, vb.pp("k_proj"))?;
        let v_proj = nn::linear(dim, dim, vb.pp("v_proj"))?;
        let out_proj = nn::linear(dim, dim, vb.pp("out_proj"))?;

        Ok(Self {
            num_heads,
            head_dim,
            scale,
            q_proj,
            k_proj,
            v_proj,
            out_proj,
        })
    }

    /// Self-attention over a node sequence `[B, T, D]`, shape-preserving.
    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let (b, t, _) = x.dims3()?;

        let q = self.q_proj.forward(x)?;
        let k = self.k_proj.forward(x)?;
        let v = self.v_proj.forward(x)?;

        // Reshape for multi-head: [B, T, D] -> [B, num_heads, T, head_dim]
        let q = q
            .reshape((b, t, self.num_heads, self.head_dim))?
            .transpose(1, 2)?
            .contiguous()?;
        let k = k
            .reshape((b, t, self.num_heads, self.head_dim))?
            .transpose(1, 2)?
            .contiguous()?;
        let v = v
            .reshape((b, t, self.num_heads, self.head_dim))?
            .transpose(1, 2)?
            .contiguous()?;

        // Attention scores: Q @ K^T / sqrt(d_k)
        let k_t = k.transpose(D::Minus2, D::Minus1)?;
        let scores = (q.matmul(&k_t)? / self.scale)?;
        let attn_weights = candle_nn::ops::softmax(&scores, D::Minus1)?;

        // [B, num_heads, T, T] @ [B, num_heads, T, head_dim] -> [B, num_heads, T, head_dim]
        let attn_output = attn_weights.matmul(&v)?;

        // Merge heads back: [B, num_heads, T, head_dim] -> [B, T, D]
        let attn_output = attn_output.transpose(1, 2)?.contiguous()?.reshape((
            b,
            t,
            self.num_heads * self.head_dim,
        ))?;

        Ok(self.out_proj.forward(&attn_output)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::{VarBuilder, VarMap};

    #[test]
    fn self_attention_preserves_shape() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let attn = InteractionAttention::new(vb, 32, 4).unwrap();

        let x = Tensor::randn(0f32, 1f32, (1, 6, 32), &Device::Cpu).unwrap();
        let y = attn.forward(&x).unwrap();
        assert_eq!(y.dims(), &[1, 6, 32]);
    }
}
