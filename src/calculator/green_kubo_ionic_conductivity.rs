use std::ops::Range;

use ndarray::ArrayView3;

use super::{check_window, Accumulator, Calculator, Window, WindowSample, IONIC_CONDUCTIVITY};
use crate::{
    constants::{BOLTZMANN, ELEMENTARY_CHARGE},
    experiment::SystemProperties,
    memory::MemoryConfig,
    results::{AnalysisResult, ResultKind},
    transformations::{system_path, IONIC_CURRENT},
    utils::{correlation::origin_correlation, trapezoid},
    Result,
};

/// Ionic conductivity from the autocorrelation of the ionic current,
/// `σ = ∫<J(0) · J(t)> dt / (3 V k_B T)`, in S/m
pub struct GreenKuboIonicConductivity {
    interval: f64,
    prefactor: f64,
    window: Window,
    memory: MemoryConfig,
}
impl GreenKuboIonicConductivity {
    pub fn new(properties: &SystemProperties) -> Result<Self> {
        properties.validate()?;
        let units = properties.units;
        let current = ELEMENTARY_CHARGE * units.length / units.time;
        Ok(Self {
            interval: properties.configuration_interval_si(),
            prefactor: current * current
                / (3.0 * properties.volume_si() * BOLTZMANN * properties.temperature),
            window: Window::default(),
            memory: MemoryConfig::default(),
        })
    }
    pub fn with_window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }
    pub fn with_memory_config(mut self, memory: MemoryConfig) -> Self {
        self.memory = memory;
        self
    }
}

impl Calculator for GreenKuboIonicConductivity {
    fn name(&self) -> &str {
        "Green Kubo Ionic Conductivity"
    }
    fn category(&self) -> &str {
        IONIC_CONDUCTIVITY
    }
    fn data_paths(&self) -> Vec<String> {
        vec![system_path(IONIC_CURRENT)]
    }
    fn system(&self) -> bool {
        true
    }
    fn window(&self) -> Window {
        self.window
    }
    fn memory_config(&self) -> &MemoryConfig {
        &self.memory
    }

    fn window_statistic(
        &self,
        window: &[ArrayView3<f64>],
        _atoms: &Range<usize>,
    ) -> Result<WindowSample> {
        check_window(self.name(), window, 1)?;
        let acf = origin_correlation(window[0].view(), window[0].view());
        let integral = trapezoid(&acf.to_vec(), self.interval);
        Ok(WindowSample::new(acf, Some(self.prefactor * integral)))
    }

    fn reduce(&self, accumulator: &Accumulator) -> Result<AnalysisResult> {
        Ok(AnalysisResult {
            category: String::from(self.category()),
            method: String::from(self.name()),
            kind: ResultKind::Singular,
            label: String::from("System"),
            estimate: accumulator.estimate(),
            series: accumulator.normalized_series().to_vec(),
            windows: accumulator.windows(),
        })
    }
}
