use crate::error::Result;
use crate::policy::GaussianHead;
use candle_core::Tensor;
use candle_nn::{Activation, Module, Sequential, VarBuilder, linear, seq};
use derive_more::Deref;

#[derive(Deref)]
pub struct ThreadSafeSequential(pub Sequential);

// SAFETY: ThreadSafeSequential will only contain Linear and Relu layers, both of which are Sync.
unsafe impl Sync for ThreadSafeSequential {}

pub fn build_sequential(
    input_dim: usize,
    layers: &[usize],
    vb: &VarBuilder,
    prefix: &str,
) -> Result<ThreadSafeSequential> {
    let mut last_dim = input_dim;
    let mut nn = seq();
    let num_layers = layers.len();
    for (layer_idx, layer_size) in layers.iter().enumerate() {
        let layer_pp = format!("{prefix}{layer_idx}");
        if layer_idx == num_layers - 1 {
            nn = nn.add(linear(last_dim, *layer_size, vb.pp(layer_pp))?)
        } else {
            nn = nn
                .add(linear(last_dim, *layer_size, vb.pp(layer_pp))?)
                .add(Activation::Relu);
        }
        last_dim = *layer_size;
    }
    Ok(ThreadSafeSequential(nn))
}

/// The canonical head: an MLP for the mean and a free per-dimension
/// log-std parameter vector, shared across the batch.
pub struct SequentialGaussianHead {
    mean_net: ThreadSafeSequential,
    log_std: Tensor,
}

impl SequentialGaussianHead {
    pub fn new(mean_net: ThreadSafeSequential, log_std: Tensor) -> Self {
        Self { mean_net, log_std }
    }

    pub fn build(
        observation_size: usize,
        hidden_layers: &[usize],
        action_size: usize,
        vb: &VarBuilder,
        prefix: &str,
    ) -> Result<Self> {
        let layers = [hidden_layers, &[action_size]].concat();
        let mean_net = build_sequential(observation_size, &layers, vb, prefix)?;
        let log_std = vb.get(action_size, "log_std")?;
        Ok(Self { mean_net, log_std })
    }
}

impl GaussianHead for SequentialGaussianHead {
    fn compute(
        &self,
        states: &Tensor,
        _taken_actions: Option<&Tensor>,
        _role: &str,
    ) -> Result<(Tensor, Tensor)> {
        let mean = self.mean_net.forward(states)?;
        Ok((mean, self.log_std.clone()))
    }
}
