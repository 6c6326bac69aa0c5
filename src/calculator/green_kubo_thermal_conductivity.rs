use std::ops::Range;

use ndarray::ArrayView3;

use super::{check_window, Accumulator, Calculator, Window, WindowSample, THERMAL_CONDUCTIVITY};
use crate::{
    constants::BOLTZMANN,
    experiment::SystemProperties,
    memory::MemoryConfig,
    results::{AnalysisResult, ResultKind},
    transformations::{system_path, THERMAL_FLUX},
    utils::{correlation::origin_correlation, trapezoid},
    Result,
};

/// Thermal conductivity from the autocorrelation of the heat flux,
/// `κ = ∫<J(0) · J(t)> dt / (3 V k_B T²)`, in W/(m K).
///
/// The flux is read in energy times velocity units.
pub struct GreenKuboThermalConductivity {
    interval: f64,
    prefactor: f64,
    window: Window,
    memory: MemoryConfig,
}
impl GreenKuboThermalConductivity {
    pub fn new(properties: &SystemProperties) -> Result<Self> {
        properties.validate()?;
        let units = properties.units;
        let flux = units.energy * units.length / units.time;
        Ok(Self {
            interval: properties.configuration_interval_si(),
            prefactor: flux * flux
                / (3.0 * properties.volume_si() * BOLTZMANN * properties.temperature.powi(2)),
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

impl Calculator for GreenKuboThermalConductivity {
    fn name(&self) -> &str {
        "Green Kubo Thermal Conductivity"
    }
    fn category(&self) -> &str {
        THERMAL_CONDUCTIVITY
    }
    fn data_paths(&self) -> Vec<String> {
        vec![system_path(THERMAL_FLUX)]
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

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, sync::Arc};

    use ndarray::Array3;

    use super::*;
    use crate::{
        calculator::run_analysis, experiment::Units, store::InMemoryStore, CancellationToken,
        Error, MachineProfile,
    };

    fn properties() -> SystemProperties {
        SystemProperties::new(1.0, 1, 2.0, [1.0, 2.0, 1.0]).with_units(Units::si())
    }

    #[test]
    fn constant_flux() {
        let mut store = InMemoryStore::new();
        store
            .insert("Thermal_Flux/Thermal_Flux", Array3::from_elem((1, 10, 3), 2.0))
            .unwrap();
        let calculator = GreenKuboThermalConductivity::new(&properties())
            .unwrap()
            .with_window(Window::new(5, 1));
        let profile = Arc::new(MachineProfile::new(1 << 30, 1, BTreeMap::new()));
        let result = run_analysis(&calculator, &store, profile, &CancellationToken::new()).unwrap();
        assert_eq!(result.series, vec![12.0; 5]);
        // ∫ 12 dt over 4 s / (3 * 2 m³ * k_B * 4 K²)
        let expected = 48.0 / (24.0 * BOLTZMANN);
        assert!((result.estimate.unwrap().value - expected).abs() < 1e-9 * expected);
    }

    #[test]
    fn system_series_need_one_row() {
        let mut store = InMemoryStore::new();
        store
            .insert("Thermal_Flux/Thermal_Flux", Array3::zeros((2, 10, 3)))
            .unwrap();
        let calculator = GreenKuboThermalConductivity::new(&properties()).unwrap();
        let profile = Arc::new(MachineProfile::new(1 << 30, 1, BTreeMap::new()));
        assert!(matches!(
            run_analysis(&calculator, &store, profile, &CancellationToken::new()),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
