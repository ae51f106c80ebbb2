pub mod diagonal;

pub use diagonal::DiagGaussian;

use crate::error::Result;
use candle_core::{Device, Shape, Tensor};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;

/// Source of the standard-normal noise used by the reparameterization
/// trick. Swappable so tests can pin the noise and samplers can be seeded.
pub trait NoiseSource {
    fn standard_normal(&mut self, shape: &Shape, device: &Device) -> Result<Tensor>;
}

/// Draws from the tensor runtime's global generator.
#[derive(Debug, Default)]
pub struct StdNoise;

impl NoiseSource for StdNoise {
    fn standard_normal(&mut self, shape: &Shape, device: &Device) -> Result<Tensor> {
        Ok(Tensor::randn(0f32, 1., shape.clone(), device)?)
    }
}

/// Deterministic noise from a seeded generator, for reproducible rollouts.
#[derive(Debug)]
pub struct SeededNoise {
    rng: StdRng,
}

impl SeededNoise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl NoiseSource for SeededNoise {
    fn standard_normal(&mut self, shape: &Shape, device: &Device) -> Result<Tensor> {
        let samples: Vec<f32> = (0..shape.elem_count())
            .map(|_| self.rng.sample(StandardNormal))
            .collect();
        Ok(Tensor::from_vec(samples, shape.clone(), device)?)
    }
}
