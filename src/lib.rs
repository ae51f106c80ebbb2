//! A stochastic policy layer for continuous-control agents: observations go
//! in, actions sampled from a diagonal Gaussian come out. The mean and log
//! standard deviation are produced by an externally owned head (see
//! [`policy::GaussianHead`]); this crate owns the numerical contract around
//! it: log-std clamping, reparameterized sampling, action clipping and
//! log-probability reduction.

pub mod distributions;
pub mod error;
pub mod network;
pub mod policy;
pub mod spaces;

pub use error::{PolicyError, Result};
pub use policy::{GaussianHead, GaussianPolicy, GaussianPolicyOptions, Reduction};
