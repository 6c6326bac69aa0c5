use ndarray::Array1;

use crate::{
    results::Estimate,
    utils::{mean, standard_error},
    Error, Result,
};

/// Partial statistic of one window over one atom range
#[derive(Clone, Debug, PartialEq)]
pub struct WindowSample {
    /// Un-normalized series of `data_range` lags, summed over atoms
    pub series: Array1<f64>,
    /// Scalar estimate of the window, additive over atom ranges
    pub value: Option<f64>,
}
impl WindowSample {
    pub fn new(series: Array1<f64>, value: Option<f64>) -> Self {
        Self { series, value }
    }
}

/// Running sums of one calculator run.
///
/// Windows are identified by their ordinal in the trajectory, so the samples
/// of one window computed on several atom mini-batches land in the same slot.
#[derive(Clone, Debug)]
pub struct Accumulator {
    label: String,
    series: Array1<f64>,
    samples: Vec<f64>,
    windows: usize,
}
impl Accumulator {
    pub(crate) fn new(label: &str, data_range: usize) -> Self {
        Self {
            label: String::from(label),
            series: Array1::zeros(data_range),
            samples: Vec::new(),
            windows: 0,
        }
    }

    pub(crate) fn add(&mut self, ordinal: usize, sample: WindowSample) -> Result<()> {
        if sample.series.len() != self.series.len() {
            return Err(Error::ShapeMismatch {
                path: self.label.clone(),
                expected: vec![self.series.len()],
                found: vec![sample.series.len()],
            });
        }
        self.series += &sample.series;
        if let Some(value) = sample.value {
            if self.samples.len() <= ordinal {
                self.samples.resize(ordinal + 1, 0.0);
            }
            self.samples[ordinal] += value;
        }
        self.windows = self.windows.max(ordinal + 1);
        Ok(())
    }

    // Getters
    pub fn series(&self) -> &Array1<f64> {
        &self.series
    }
    pub fn samples(&self) -> &Vec<f64> {
        &self.samples
    }
    /// Distinct windows seen
    pub fn windows(&self) -> usize {
        self.windows
    }

    /// Series averaged over windows
    pub fn normalized_series(&self) -> Array1<f64> {
        if self.windows == 0 {
            return self.series.clone();
        }
        &self.series / self.windows as f64
    }

    /// Mean and standard error of the window samples
    pub fn estimate(&self) -> Option<Estimate> {
        Some(Estimate::new(
            mean(&self.samples)?,
            standard_error(&self.samples),
        ))
    }
}
