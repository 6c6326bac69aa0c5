use serde::{Deserialize, Serialize};

use crate::{scale_function::ScaleFunction, Error, Result, ScaleFunctionSpec};

/// Atom fractions tried, in order, when a window does not fit a batch
pub const DEFAULT_MINIBATCH_FRACTIONS: [f64; 6] =
    [1.0 / 2.0, 1.0 / 4.0, 1.0 / 8.0, 1.0 / 20.0, 1.0 / 100.0, 1.0 / 200.0];

/// Options of the memory manager
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Fraction of the memory ceiling one batch may occupy
    pub memory_fraction: f64,
    pub scale_function: ScaleFunctionSpec,
    /// Configurations skipped at the start of the trajectory
    pub offset: usize,
    /// Use the largest GPU's memory as the ceiling instead of host memory
    pub gpu: bool,
    /// Informational only, batches are always processed sequentially
    pub parallel: bool,
    /// Strictly decreasing atom fractions for the mini-batch search
    pub minibatch_fractions: Vec<f64>,
    /// Shrink the batch to a divisor of the trajectory length when that costs
    /// at most half of the batch
    pub prefer_even_batches: bool,
}
impl MemoryConfig {
    pub fn new() -> Self {
        Self {
            memory_fraction: 0.2,
            scale_function: ScaleFunctionSpec::default(),
            offset: 0,
            gpu: false,
            parallel: false,
            minibatch_fractions: DEFAULT_MINIBATCH_FRACTIONS.to_vec(),
            prefer_even_batches: false,
        }
    }

    // Setters
    pub fn with_memory_fraction(mut self, memory_fraction: f64) -> Self {
        self.memory_fraction = memory_fraction;
        self
    }
    pub fn with_scale_function(mut self, scale_function: ScaleFunctionSpec) -> Self {
        self.scale_function = scale_function;
        self
    }
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
    pub fn with_gpu(mut self, gpu: bool) -> Self {
        self.gpu = gpu;
        self
    }
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
    pub fn with_minibatch_fractions(mut self, fractions: Vec<f64>) -> Self {
        self.minibatch_fractions = fractions;
        self
    }
    pub fn with_prefer_even_batches(mut self, prefer_even_batches: bool) -> Self {
        self.prefer_even_batches = prefer_even_batches;
        self
    }

    /// Check every option and resolve the scale function
    pub fn validate(&self) -> Result<ScaleFunction> {
        if !(self.memory_fraction.is_finite()
            && self.memory_fraction > 0.0
            && self.memory_fraction <= 1.0)
        {
            return Err(Error::InvalidMemoryFraction(self.memory_fraction));
        }
        if self
            .minibatch_fractions
            .iter()
            .any(|&f| !(f > 0.0 && f < 1.0))
        {
            return Err(Error::invalid_parameter(
                "minibatch_fractions",
                "every fraction should be in (0, 1)",
            ));
        }
        if self
            .minibatch_fractions
            .windows(2)
            .any(|pair| pair[1] >= pair[0])
        {
            return Err(Error::invalid_parameter(
                "minibatch_fractions",
                "fractions should be strictly decreasing",
            ));
        }
        self.scale_function.resolve()
    }
}
impl Default for MemoryConfig {
    fn default() -> Self {
        Self::new()
    }
}
