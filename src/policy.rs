use crate::distributions::{DiagGaussian, NoiseSource, StdNoise};
use crate::error::{PolicyError, Result};
use crate::spaces::Space;
use candle_core::{D, DType, Device, Tensor};
use derive_more::Display;
use std::fmt::Debug;
use std::str::FromStr;

/// The externally owned mean/log-std head. One method so that stub heads
/// (fixed tensors, closures) are as easy to plug in as a real network;
/// `role` distinguishes named heads when one provider serves several.
pub trait GaussianHead {
    fn compute(
        &self,
        states: &Tensor,
        taken_actions: Option<&Tensor>,
        role: &str,
    ) -> Result<(Tensor, Tensor)>;
}

impl<F> GaussianHead for F
where
    F: Fn(&Tensor, Option<&Tensor>, &str) -> Result<(Tensor, Tensor)>,
{
    fn compute(
        &self,
        states: &Tensor,
        taken_actions: Option<&Tensor>,
        role: &str,
    ) -> Result<(Tensor, Tensor)> {
        self(states, taken_actions, role)
    }
}

/// How the per-dimension log probability is collapsed across the action
/// axis. Decided once at construction, no string matching on the hot path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Reduction {
    #[display("sum")]
    Sum,
    #[display("mean")]
    Mean,
    #[display("prod")]
    Prod,
    #[display("none")]
    None,
}

impl FromStr for Reduction {
    type Err = PolicyError;

    fn from_str(reduction: &str) -> Result<Self> {
        match reduction {
            "sum" => Ok(Self::Sum),
            "mean" => Ok(Self::Mean),
            "prod" => Ok(Self::Prod),
            "none" => Ok(Self::None),
            other => Err(PolicyError::InvalidConfiguration(format!(
                "reduction must be one of 'mean', 'sum', 'prod' or 'none', got '{other}'"
            ))),
        }
    }
}

impl Reduction {
    /// Collapses `[batch, action_dim]` log probabilities to `[batch, 1]`,
    /// or leaves them untouched for `None`.
    fn apply(&self, log_probs: &Tensor) -> Result<Tensor> {
        match self {
            Self::Sum => Ok(log_probs.sum_keepdim(D::Minus1)?),
            Self::Mean => Ok(log_probs.mean_keepdim(D::Minus1)?),
            // The tensor runtime has no product reduction, so multiply the
            // columns out by hand. Action dims are small.
            Self::Prod => {
                let (_, action_dim) = log_probs.dims2()?;
                let mut product = log_probs.narrow(1, 0, 1)?;
                for dim in 1..action_dim {
                    product = product.mul(&log_probs.narrow(1, dim, 1)?)?;
                }
                Ok(product)
            }
            Self::None => Ok(log_probs.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GaussianPolicyOptions {
    /// Clip sampled actions to the action-space bounds. Silently resolved
    /// to false when the space carries no bounds.
    pub clip_actions: bool,
    pub clip_log_std: bool,
    pub log_std_min: f32,
    pub log_std_max: f32,
    pub reduction: Reduction,
}

impl Default for GaussianPolicyOptions {
    fn default() -> Self {
        Self {
            clip_actions: false,
            clip_log_std: true,
            log_std_min: -20.,
            log_std_max: 2.,
            reduction: Reduction::Sum,
        }
    }
}

/// What the last `act` call recorded. Overwritten wholesale on every call.
#[derive(Debug, Clone)]
pub struct ActState {
    pub log_std: Tensor,
    pub batch_size: usize,
    pub distribution: DiagGaussian,
}

/// Stochastic policy over a diagonal Gaussian whose parameters come from an
/// injected [`GaussianHead`].
///
/// There is no internal locking: an instance is meant to be driven by one
/// logical caller per step. `act` overwrites the recorded state that
/// `get_entropy`/`get_log_std`/`distribution` read, so interleaving calls
/// from several threads can pair an accessor with the wrong `act`. Use one
/// policy (or a bare [`DiagGaussian`]) per concurrent caller instead.
pub struct GaussianPolicy<P> {
    head: P,
    device: Device,
    observation_size: usize,
    action_size: usize,
    action_bounds: Option<(Tensor, Tensor)>,
    clip_log_std: bool,
    log_std_min: f32,
    log_std_max: f32,
    reduction: Reduction,
    noise: Box<dyn NoiseSource>,
    last: Option<ActState>,
}

impl<P> Debug for GaussianPolicy<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaussianPolicy")
            .field("observation_size", &self.observation_size)
            .field("action_size", &self.action_size)
            .field("clip_actions", &self.action_bounds.is_some())
            .field("clip_log_std", &self.clip_log_std)
            .field("log_std_min", &self.log_std_min)
            .field("log_std_max", &self.log_std_max)
            .field("reduction", &self.reduction)
            .finish()
    }
}

impl<P: GaussianHead> GaussianPolicy<P> {
    /// Action clipping is resolved here: requested and bounds available.
    /// When enabled, the bounds are materialized once on the device as f32
    /// tensors of shape `[action_dim]`.
    pub fn new(
        head: P,
        observation_space: impl Into<Space>,
        action_space: impl Into<Space>,
        device: Device,
        options: GaussianPolicyOptions,
    ) -> Result<Self> {
        let observation_space = observation_space.into();
        let action_space = action_space.into();
        let action_bounds = if options.clip_actions {
            match action_space.bounds() {
                Some((low, high)) => {
                    let low = Tensor::from_vec(low.to_vec(), low.len(), &device)?;
                    let high = Tensor::from_vec(high.to_vec(), high.len(), &device)?;
                    Some((low, high))
                }
                None => None,
            }
        } else {
            None
        };
        Ok(Self {
            head,
            device,
            observation_size: observation_space.size(),
            action_size: action_space.size(),
            action_bounds,
            clip_log_std: options.clip_log_std,
            log_std_min: options.log_std_min,
            log_std_max: options.log_std_max,
            reduction: options.reduction,
            noise: Box::new(StdNoise),
            last: None,
        })
    }

    pub fn with_noise_source(mut self, noise: Box<dyn NoiseSource>) -> Self {
        self.noise = noise;
        self
    }

    pub fn observation_size(&self) -> usize {
        self.observation_size
    }

    pub fn action_size(&self) -> usize {
        self.action_size
    }

    /// Samples an action for each state in the batch and returns
    /// `(action, log_prob, mean)`, shaped `[N, action_dim]`, `[N, 1]`
    /// (`[N, action_dim]` under [`Reduction::None`]) and `[N, action_dim]`.
    ///
    /// When `taken_actions` is supplied the log probability is evaluated
    /// against those actions instead of the fresh sample, which is how a
    /// shared policy head scores recorded transitions. When action clipping
    /// is on, the density is evaluated at the clipped sample, matching the
    /// action that would actually reach the environment.
    ///
    /// `inference` detaches everything returned from the autodiff graph.
    pub fn act(
        &mut self,
        states: &Tensor,
        taken_actions: Option<&Tensor>,
        inference: bool,
        role: &str,
    ) -> Result<(Tensor, Tensor, Tensor)> {
        let states = states.to_device(&self.device)?;
        let taken_actions = match taken_actions {
            Some(actions) => Some(actions.to_device(&self.device)?),
            None => None,
        };
        let (mean, log_std) = self.head.compute(&states, taken_actions.as_ref(), role)?;
        // Clamping must precede the exp inside the distribution, otherwise
        // an extreme log-std has already overflowed the scale.
        let log_std = if self.clip_log_std {
            log_std.clamp(self.log_std_min, self.log_std_max)?
        } else {
            log_std
        };
        let batch_size = mean.dim(0)?;
        let distribution = DiagGaussian::from_mean_log_std(mean.clone(), log_std)?;
        // Recorded before sampling: when a later step fails, the accessors
        // reflect the call that failed, not the previous one.
        self.last = Some(ActState {
            log_std: distribution.log_std().clone(),
            batch_size,
            distribution: distribution.clone(),
        });

        let mut actions = distribution.rsample(self.noise.as_mut())?;
        if let Some((low, high)) = &self.action_bounds {
            actions = actions.broadcast_maximum(low)?.broadcast_minimum(high)?;
        }

        let evaluated = taken_actions.as_ref().unwrap_or(&actions);
        let log_probs = self.reduction.apply(&distribution.log_prob(evaluated)?)?;

        if inference {
            Ok((actions.detach(), log_probs.detach(), mean.detach()))
        } else {
            Ok((actions, log_probs, mean))
        }
    }

    /// Per-dimension entropy of the last distribution, `[N, action_dim]`.
    /// A scalar zero before the first `act` call, so entropy bonus terms
    /// need no conditional on the first update.
    pub fn get_entropy(&self) -> Result<Tensor> {
        match &self.last {
            Some(state) => state.distribution.entropy(),
            None => Ok(Tensor::zeros((), DType::F32, &self.device)?),
        }
    }

    /// The clamped log-std recorded by the last `act` call, broadcast to
    /// `[N, action_dim]`.
    pub fn get_log_std(&self) -> Result<Tensor> {
        match &self.last {
            Some(state) => Ok(state.log_std.clone()),
            None => Err(PolicyError::NotYetComputed("log_std")),
        }
    }

    /// The distribution built by the last `act` call, if any.
    pub fn distribution(&self) -> Option<&DiagGaussian> {
        self.last.as_ref().map(|state| &state.distribution)
    }

    pub fn last_state(&self) -> Option<&ActState> {
        self.last.as_ref()
    }
}
