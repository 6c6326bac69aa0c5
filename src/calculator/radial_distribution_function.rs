use std::{f64::consts::PI, ops::Range};

use ndarray::{Array1, ArrayView3, Axis};

use super::{
    check_window, Accumulator, Calculator, Window, WindowSample, RADIAL_DISTRIBUTION_FUNCTION,
};
use crate::{
    experiment::SystemProperties,
    memory::MemoryConfig,
    results::{AnalysisResult, ResultKind},
    store::join_path,
    utils::minimum_image_distance_squared,
    Error, Result,
};

pub const POSITIONS: &str = "Positions";

/// Radial distribution function of a species pair under periodic boundaries.
///
/// Every window is a single configuration; the window stride selects how
/// many configurations are skipped between histograms.
pub struct RadialDistributionFunction {
    species: [String; 2],
    pairs: f64,
    box_lengths: [f64; 3],
    volume: f64,
    cutoff: f64,
    number_of_bins: usize,
    window: Window,
    memory: MemoryConfig,
}
impl RadialDistributionFunction {
    pub fn new(properties: &SystemProperties, first: &str, second: &str) -> Result<Self> {
        properties.validate()?;
        let n_first = properties.species(first)?.n_atoms as f64;
        let n_second = properties.species(second)?.n_atoms as f64;
        let pairs = if first == second {
            n_first * (n_first - 1.0) / 2.0
        } else {
            n_first * n_second
        };
        if !(pairs > 0.0) {
            return Err(Error::invalid_parameter(
                "species",
                format!("{}-{} has no atom pairs", first, second),
            ));
        }
        let cutoff = properties
            .box_lengths
            .iter()
            .fold(f64::INFINITY, |a, &b| a.min(b))
            / 2.0;
        Ok(Self {
            species: [String::from(first), String::from(second)],
            pairs,
            box_lengths: properties.box_lengths,
            volume: properties.volume(),
            cutoff,
            number_of_bins: 500,
            window: Window::new(1, 1),
            memory: MemoryConfig::default(),
        })
    }

    /// Histogram `number_of_bins` shells up to `cutoff`
    pub fn with_bins(mut self, cutoff: f64, number_of_bins: usize) -> Self {
        assert!(
            cutoff > 0.0 && number_of_bins > 0,
            "RDF needs a positive cutoff and bin count, found {} and {}",
            cutoff,
            number_of_bins
        );
        self.cutoff = cutoff;
        self.number_of_bins = number_of_bins;
        self
    }
    /// Histogram every `stride`-th configuration
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.window = Window::new(1, stride);
        self
    }
    pub fn with_memory_config(mut self, memory: MemoryConfig) -> Self {
        self.memory = memory;
        self
    }

    fn bin_width(&self) -> f64 {
        self.cutoff / self.number_of_bins as f64
    }
    /// Bin centers
    pub fn radii(&self) -> Vec<f64> {
        let dr = self.bin_width();
        (0..self.number_of_bins)
            .map(|k| (k as f64 + 0.5) * dr)
            .collect()
    }
    fn same_species(&self) -> bool {
        self.species[0] == self.species[1]
    }

    fn add_pair(&self, histogram: &mut Array1<f64>, a: &[f64; 3], b: &[f64; 3]) {
        let r = minimum_image_distance_squared(a, b, &self.box_lengths).sqrt();
        if r < self.cutoff {
            let bin = ((r / self.bin_width()) as usize).min(self.number_of_bins - 1);
            histogram[bin] += 1.0;
        }
    }
}

/// Cartesian coordinates of every atom in the first configuration of a window
pub(crate) fn coordinates(path: &str, window: &ArrayView3<f64>) -> Result<Vec<[f64; 3]>> {
    let (atoms, configurations, components) = window.dim();
    if components < 3 {
        return Err(Error::ShapeMismatch {
            path: String::from(path),
            expected: vec![atoms, configurations, 3],
            found: vec![atoms, configurations, components],
        });
    }
    Ok(window
        .index_axis(Axis(1), 0)
        .axis_iter(Axis(0))
        .map(|r| [r[0], r[1], r[2]])
        .collect())
}

impl Calculator for RadialDistributionFunction {
    fn name(&self) -> &str {
        "Radial Distribution Function"
    }
    fn category(&self) -> &str {
        RADIAL_DISTRIBUTION_FUNCTION
    }
    fn data_paths(&self) -> Vec<String> {
        let mut paths = vec![join_path(&self.species[0], POSITIONS)];
        if !self.same_species() {
            paths.push(join_path(&self.species[1], POSITIONS));
        }
        paths
    }
    fn window(&self) -> Window {
        self.window
    }
    fn series_length(&self) -> usize {
        self.number_of_bins
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
        let paths = self.data_paths();
        check_window(self.name(), window, paths.len())?;
        let mut histogram = Array1::zeros(self.number_of_bins);
        let first = coordinates(&paths[0], &window[0])?;
        if self.same_species() {
            for (i, a) in first.iter().enumerate() {
                for b in &first[i + 1..] {
                    self.add_pair(&mut histogram, a, b);
                }
            }
        } else {
            let second = coordinates(&paths[1], &window[1])?;
            for a in &first {
                for b in &second {
                    self.add_pair(&mut histogram, a, b);
                }
            }
        }
        Ok(WindowSample::new(histogram, None))
    }

    fn reduce(&self, accumulator: &Accumulator) -> Result<AnalysisResult> {
        let dr = self.bin_width();
        let density = self.pairs / self.volume;
        let rdf: Vec<f64> = accumulator
            .normalized_series()
            .iter()
            .enumerate()
            .map(|(k, &count)| {
                let (inner, outer) = (k as f64 * dr, (k + 1) as f64 * dr);
                let shell = 4.0 / 3.0 * PI * (outer.powi(3) - inner.powi(3));
                count / (density * shell)
            })
            .collect();
        Ok(AnalysisResult {
            category: String::from(self.category()),
            method: String::from(self.name()),
            kind: ResultKind::Distinct,
            label: format!("{}-{}", self.species[0], self.species[1]),
            estimate: None,
            series: rdf,
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
        calculator::run_analysis, experiment::Species, store::InMemoryStore, CancellationToken,
        MachineProfile,
    };

    fn shell(inner: f64, outer: f64) -> f64 {
        4.0 / 3.0 * PI * (outer.powi(3) - inner.powi(3))
    }

    #[test]
    fn single_pair_with_minimum_image() {
        let properties = SystemProperties::new(1.0, 1, 300.0, [10.0; 3])
            .with_species("Na", Species::new(1, 1.0, 1.0))
            .with_species("Cl", Species::new(1, -1.0, 1.0));
        let mut store = InMemoryStore::new();
        store.insert("Na/Positions", Array3::zeros((1, 3, 3))).unwrap();
        // the last configuration starts no window
        let mut cl = Array3::from_elem((1, 3, 3), 3.0);
        cl[[0, 0, 0]] = 1.05;
        cl[[0, 0, 1]] = 0.0;
        cl[[0, 0, 2]] = 0.0;
        // 0.55 away through the boundary
        cl[[0, 1, 0]] = 9.45;
        cl[[0, 1, 1]] = 0.0;
        cl[[0, 1, 2]] = 0.0;
        store.insert("Cl/Positions", cl).unwrap();

        let rdf = RadialDistributionFunction::new(&properties, "Na", "Cl")
            .unwrap()
            .with_bins(5.0, 50);
        assert_eq!(rdf.cutoff, 5.0);
        let profile = Arc::new(MachineProfile::new(1 << 30, 1, BTreeMap::new()));
        let result = run_analysis(&rdf, &store, profile, &CancellationToken::new()).unwrap();
        assert_eq!(result.windows, 2);
        assert!(result.estimate.is_none());
        assert_eq!(result.series.len(), 50);
        let expected = |inner: f64| 1000.0 * 0.5 / shell(inner, inner + 0.1);
        assert!((result.series[10] - expected(1.0)).abs() < 1e-9 * expected(1.0));
        assert!((result.series[5] - expected(0.5)).abs() < 1e-9 * expected(0.5));
        let occupied = result.series.iter().filter(|&&g| g > 0.0).count();
        assert_eq!(occupied, 2);
    }

    #[test]
    fn planar_positions_are_rejected() {
        let properties = SystemProperties::new(1.0, 1, 300.0, [10.0; 3])
            .with_species("Ar", Species::new(4, 0.0, 40.0));
        let mut store = InMemoryStore::new();
        store.insert("Ar/Positions", Array3::zeros((4, 3, 2))).unwrap();
        let rdf = RadialDistributionFunction::new(&properties, "Ar", "Ar")
            .unwrap()
            .with_bins(5.0, 10);
        let profile = Arc::new(MachineProfile::new(1 << 30, 1, BTreeMap::new()));
        assert!(matches!(
            run_analysis(&rdf, &store, profile, &CancellationToken::new()),
            Err(Error::ShapeMismatch { path, found, .. })
                if path == "Ar/Positions" && found == vec![4, 1, 2]
        ));
    }

    #[test]
    fn default_cutoff_is_half_the_shortest_edge() {
        let properties = SystemProperties::new(1.0, 1, 300.0, [12.0, 8.0, 10.0])
            .with_species("Ar", Species::new(10, 0.0, 40.0));
        let rdf = RadialDistributionFunction::new(&properties, "Ar", "Ar").unwrap();
        assert_eq!(rdf.cutoff, 4.0);
        assert_eq!(rdf.pairs, 45.0);
        assert_eq!(rdf.data_paths(), vec![String::from("Ar/Positions")]);
        assert_eq!(rdf.radii()[0], 0.004);
    }
}
