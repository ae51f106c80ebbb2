use candle_core::Error as TensorError;

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An accessor needed the state recorded by `act`, but `act` has not
    /// been called yet.
    #[error("{0} has not been computed yet, call act first")]
    NotYetComputed(&'static str),

    /// Errors from the tensor runtime are surfaced unchanged.
    #[error(transparent)]
    Tensor(#[from] TensorError),
}

pub type Result<T> = std::result::Result<T, PolicyError>;
