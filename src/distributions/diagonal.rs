use super::NoiseSource;
use crate::error::Result;
use candle_core::Tensor;
use std::f32;

/// Diagonal Gaussian over a batch of actions. A plain value type: every
/// method is a pure function of `{mean, std}`, so the same instance can
/// back density, sampling and entropy queries without hidden state.
///
/// All three tensors share the shape `[batch, action_dim]`.
#[derive(Debug, Clone)]
pub struct DiagGaussian {
    mean: Tensor,
    std: Tensor,
    log_std: Tensor,
}

impl DiagGaussian {
    /// Builds the distribution from the head's output. A per-dimension
    /// log-std (shape `[action_dim]` or `[1, action_dim]`) is broadcast to
    /// the batch so that everything downstream is batch-shaped.
    pub fn from_mean_log_std(mean: Tensor, log_std: Tensor) -> Result<Self> {
        let log_std = if log_std.shape() != mean.shape() {
            log_std.broadcast_as(mean.shape())?
        } else {
            log_std
        };
        let std = log_std.exp()?;
        Ok(Self { mean, std, log_std })
    }

    pub fn mean(&self) -> &Tensor {
        &self.mean
    }

    pub fn std(&self) -> &Tensor {
        &self.std
    }

    pub fn log_std(&self) -> &Tensor {
        &self.log_std
    }

    /// Reparameterized sample `mean + std * noise`: gradients flow into
    /// `mean` and `log_std`, not through the noise.
    pub fn sample_with_noise(&self, noise: &Tensor) -> Result<Tensor> {
        Ok((&self.mean + noise.mul(&self.std)?)?)
    }

    pub fn rsample(&self, noise: &mut dyn NoiseSource) -> Result<Tensor> {
        let noise = noise.standard_normal(self.mean.shape(), self.mean.device())?;
        self.sample_with_noise(&noise)
    }

    /// Per-dimension log density of `actions`, shape `[batch, action_dim]`.
    /// Reduction across the action axis is the caller's business.
    pub fn log_prob(&self, actions: &Tensor) -> Result<Tensor> {
        let var = self.std.sqr()?;
        let log_sqrt_2pi = f32::ln(f32::sqrt(2f32 * f32::consts::PI));
        let centered = (actions - &self.mean)?;
        let log_probs = ((centered.sqr()? / (2. * var)?)?.neg()? - &self.log_std)?;
        Ok((log_probs - log_sqrt_2pi as f64)?)
    }

    /// Per-dimension differential entropy, shape `[batch, action_dim]`.
    pub fn entropy(&self) -> Result<Tensor> {
        let log_2pi_plus_1_div_2 = 0.5 * ((2. * f32::consts::PI).ln() + 1.);
        Ok((&self.log_std + log_2pi_plus_1_div_2 as f64)?)
    }
}
