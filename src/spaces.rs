/// A flat continuous space with optional per-dimension bounds. Observation
/// and action descriptors are both expressed with this; a bare `usize`
/// converts to an unbounded space of that size.
#[derive(Debug, Clone)]
pub struct Space {
    size: usize,
    low: Option<Vec<f32>>,
    high: Option<Vec<f32>>,
}

impl Space {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            low: None,
            high: None,
        }
    }

    pub fn with_bounds(low: Vec<f32>, high: Vec<f32>) -> Self {
        Self {
            size: low.len(),
            low: Some(low),
            high: Some(high),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Both bounds, or `None` when either is missing. Bound lengths are not
    /// re-validated here; mismatches surface from the tensor ops that
    /// consume them.
    pub fn bounds(&self) -> Option<(&[f32], &[f32])> {
        match (&self.low, &self.high) {
            (Some(low), Some(high)) => Some((low, high)),
            _ => None,
        }
    }
}

impl From<usize> for Space {
    fn from(size: usize) -> Self {
        Self::new(size)
    }
}
