use std::ops::Range;

use ndarray::{Array1, ArrayView3, Axis};

use super::{
    check_window, einstein_diffusion::UNWRAPPED_POSITIONS, lag_times, Accumulator, Calculator,
    Window, WindowSample, DIFFUSION_COEFFICIENTS,
};
use crate::{
    experiment::SystemProperties,
    memory::MemoryConfig,
    results::{AnalysisResult, ResultKind},
    store::join_path,
    utils::{
        correlation::{squared_displacement, summed_displacement},
        linear_fit,
    },
    Error, Result,
};

/// Distinct diffusion coefficient of a species pair from the correlation of
/// the displacements of different atoms,
/// `D = d<Σ_i Δr_i(t) · Σ_j Δr_j(t)>_{i≠j}/dt / (6 N_pairs)`.
///
/// Needs every atom of both species in one window, so it cannot run on atom
/// mini-batches.
pub struct EinsteinDistinctDiffusion {
    species: [String; 2],
    pairs: f64,
    interval: f64,
    length_squared: f64,
    window: Window,
    memory: MemoryConfig,
}
impl EinsteinDistinctDiffusion {
    pub fn new(properties: &SystemProperties, first: &str, second: &str) -> Result<Self> {
        properties.validate()?;
        let n_first = properties.species(first)?.n_atoms as f64;
        let n_second = properties.species(second)?.n_atoms as f64;
        let pairs = if first == second {
            n_first * (n_first - 1.0)
        } else {
            n_first * n_second
        };
        if !(pairs > 0.0) {
            return Err(Error::invalid_parameter(
                "species",
                format!("{}-{} has no distinct atom pairs", first, second),
            ));
        }
        Ok(Self {
            species: [String::from(first), String::from(second)],
            pairs,
            interval: properties.configuration_interval_si(),
            length_squared: properties.units.length.powi(2),
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

    fn same_species(&self) -> bool {
        self.species[0] == self.species[1]
    }
}

impl Calculator for EinsteinDistinctDiffusion {
    fn name(&self) -> &str {
        "Einstein Distinct Diffusion Coefficients"
    }
    fn category(&self) -> &str {
        DIFFUSION_COEFFICIENTS
    }
    fn data_paths(&self) -> Vec<String> {
        let mut paths = vec![join_path(&self.species[0], UNWRAPPED_POSITIONS)];
        if !self.same_species() {
            paths.push(join_path(&self.species[1], UNWRAPPED_POSITIONS));
        }
        paths
    }
    fn window(&self) -> Window {
        self.window
    }
    fn memory_config(&self) -> &MemoryConfig {
        &self.memory
    }
    fn supports_minibatch(&self) -> bool {
        false
    }

    fn window_statistic(
        &self,
        window: &[ArrayView3<f64>],
        _atoms: &Range<usize>,
    ) -> Result<WindowSample> {
        check_window(self.name(), window, self.data_paths().len())?;
        let first = summed_displacement(window[0].view());
        let cross: Array1<f64> = if self.same_species() {
            let total = (&first * &first).sum_axis(Axis(1));
            total - squared_displacement(window[0].view())
        } else {
            let second = summed_displacement(window[1].view());
            (&first * &second).sum_axis(Axis(1))
        };
        let cross = cross * self.length_squared;
        let times = lag_times(cross.len(), self.interval);
        let (slope, _) = linear_fit(&times, &cross.to_vec()).ok_or_else(|| {
            Error::invalid_parameter("data_range", "a fit needs at least two configurations")
        })?;
        Ok(WindowSample::new(cross, Some(slope / (6.0 * self.pairs))))
    }

    fn reduce(&self, accumulator: &Accumulator) -> Result<AnalysisResult> {
        Ok(AnalysisResult {
            category: String::from(self.category()),
            method: String::from(self.name()),
            kind: ResultKind::Distinct,
            label: format!("{}-{}", self.species[0], self.species[1]),
            estimate: accumulator.estimate(),
            series: (accumulator.normalized_series() / self.pairs).to_vec(),
            windows: accumulator.windows(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, sync::Arc};

    use ndarray::Array;

    use super::*;
    use crate::{
        calculator::run_analysis,
        experiment::{Species, Units},
        store::InMemoryStore,
        CancellationToken, MachineProfile,
    };

    fn properties() -> SystemProperties {
        SystemProperties::new(1.0, 1, 300.0, [10.0; 3])
            .with_units(Units::si())
            .with_species("Na", Species::new(2, 1.0, 1.0))
            .with_species("Cl", Species::new(1, -1.0, 1.0))
    }

    #[test]
    fn co_moving_species_are_correlated() {
        // every atom moves by t along x
        let mut store = InMemoryStore::new();
        let motion = |rows| Array::from_shape_fn((rows, 5, 3), |(_, j, k)| if k == 0 { j as f64 } else { 0.0 });
        store.insert("Na/Unwrapped_Positions", motion(2)).unwrap();
        store.insert("Cl/Unwrapped_Positions", motion(1)).unwrap();
        let profile = Arc::new(MachineProfile::new(1 << 30, 1, BTreeMap::new()));

        let pair = EinsteinDistinctDiffusion::new(&properties(), "Na", "Cl")
            .unwrap()
            .with_window(Window::new(5, 5));
        let result = run_analysis(&pair, &store, profile.clone(), &CancellationToken::new()).unwrap();
        assert_eq!(result.label, "Na-Cl");
        assert_eq!(result.kind, ResultKind::Distinct);
        // (2t)(t) over 2 pairs
        assert_eq!(result.series, vec![0.0, 1.0, 4.0, 9.0, 16.0]);

        // same species: (2t)² - 2t² over 2 ordered pairs
        let same = EinsteinDistinctDiffusion::new(&properties(), "Na", "Na")
            .unwrap()
            .with_window(Window::new(5, 5));
        assert_eq!(same.data_paths(), vec![String::from("Na/Unwrapped_Positions")]);
        let result = run_analysis(&same, &store, profile, &CancellationToken::new()).unwrap();
        assert_eq!(result.series, vec![0.0, 1.0, 4.0, 9.0, 16.0]);
        // slope of t² over t = 0..4 is 4, per pair
        assert!((result.estimate.unwrap().value - 4.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn single_atom_has_no_distinct_pairs() {
        assert!(EinsteinDistinctDiffusion::new(&properties(), "Cl", "Cl").is_err());
    }
}
