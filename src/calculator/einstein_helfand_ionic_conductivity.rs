use std::ops::Range;

use ndarray::ArrayView3;

use super::{
    check_window, lag_times, Accumulator, Calculator, Window, WindowSample, IONIC_CONDUCTIVITY,
};
use crate::{
    constants::{BOLTZMANN, ELEMENTARY_CHARGE},
    experiment::SystemProperties,
    memory::MemoryConfig,
    results::{AnalysisResult, ResultKind},
    transformations::{system_path, TRANSLATIONAL_DIPOLE_MOMENT},
    utils::{correlation::squared_displacement, linear_fit},
    Error, Result,
};

/// Ionic conductivity from the mean square displacement of the translational
/// dipole moment, `σ = d<|M(t) - M(0)|²>/dt / (6 V k_B T)`, in S/m
pub struct EinsteinHelfandIonicConductivity {
    interval: f64,
    prefactor: f64,
    window: Window,
    memory: MemoryConfig,
}
impl EinsteinHelfandIonicConductivity {
    pub fn new(properties: &SystemProperties) -> Result<Self> {
        properties.validate()?;
        let dipole = ELEMENTARY_CHARGE * properties.units.length;
        Ok(Self {
            interval: properties.configuration_interval_si(),
            prefactor: dipole * dipole
                / (6.0 * properties.volume_si() * BOLTZMANN * properties.temperature),
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

impl Calculator for EinsteinHelfandIonicConductivity {
    fn name(&self) -> &str {
        "Einstein Helfand Ionic Conductivity"
    }
    fn category(&self) -> &str {
        IONIC_CONDUCTIVITY
    }
    fn data_paths(&self) -> Vec<String> {
        vec![system_path(TRANSLATIONAL_DIPOLE_MOMENT)]
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
        let msd = squared_displacement(window[0].view());
        let times = lag_times(msd.len(), self.interval);
        let (slope, _) = linear_fit(&times, &msd.to_vec()).ok_or_else(|| {
            Error::invalid_parameter("data_range", "a fit needs at least two configurations")
        })?;
        Ok(WindowSample::new(msd, Some(self.prefactor * slope)))
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
