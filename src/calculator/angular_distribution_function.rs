use std::{f64::consts::PI, ops::Range};

use ndarray::{Array1, ArrayView3};

use super::{
    check_window, radial_distribution_function::coordinates, Accumulator, Calculator, Window,
    WindowSample, POSITIONS,
};
use crate::{
    experiment::SystemProperties,
    memory::MemoryConfig,
    results::{AnalysisResult, ResultKind},
    store::join_path,
    utils::minimum_image,
    Result,
};

pub const ANGULAR_DISTRIBUTION_FUNCTION: &str = "Angular_Distribution_Function";

/// Distribution of the angle `j-i-k` at the atoms `i` of a central species,
/// over every pair of neighbours `j`, `k` closer than the cutoff.
///
/// The series is normalized to unit area over `[0, π]`.
pub struct AngularDistributionFunction {
    /// Central, first and second neighbour species
    species: [String; 3],
    paths: Vec<String>,
    /// Index into `paths` of each species
    roles: [usize; 3],
    box_lengths: [f64; 3],
    cutoff: f64,
    number_of_bins: usize,
    window: Window,
    memory: MemoryConfig,
}
impl AngularDistributionFunction {
    pub fn new(
        properties: &SystemProperties,
        center: &str,
        first: &str,
        second: &str,
    ) -> Result<Self> {
        properties.validate()?;
        let mut paths: Vec<String> = vec![];
        let mut roles = [0; 3];
        for (role, name) in roles.iter_mut().zip([center, first, second]) {
            properties.species(name)?;
            let path = join_path(name, POSITIONS);
            *role = match paths.iter().position(|p| *p == path) {
                Some(index) => index,
                None => {
                    paths.push(path);
                    paths.len() - 1
                }
            };
        }
        let cutoff = properties
            .box_lengths
            .iter()
            .fold(f64::INFINITY, |a, &b| a.min(b))
            / 2.0;
        Ok(Self {
            species: [String::from(center), String::from(first), String::from(second)],
            paths,
            roles,
            box_lengths: properties.box_lengths,
            cutoff,
            number_of_bins: 500,
            window: Window::new(1, 1),
            memory: MemoryConfig::default(),
        })
    }

    /// Histogram `number_of_bins` angles of neighbours within `cutoff`
    pub fn with_bins(mut self, cutoff: f64, number_of_bins: usize) -> Self {
        assert!(
            cutoff > 0.0 && number_of_bins > 0,
            "ADF needs a positive cutoff and bin count, found {} and {}",
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
        PI / self.number_of_bins as f64
    }
    /// Bin centers in radians
    pub fn angles(&self) -> Vec<f64> {
        let width = self.bin_width();
        (0..self.number_of_bins)
            .map(|k| (k as f64 + 0.5) * width)
            .collect()
    }

    /// Separations from `origin` to the atoms of `atoms` within the cutoff,
    /// skipping atom `skip`
    fn neighbours(
        &self,
        origin: &[f64; 3],
        atoms: &[[f64; 3]],
        skip: Option<usize>,
    ) -> Vec<(usize, [f64; 3])> {
        atoms
            .iter()
            .enumerate()
            .filter(|&(index, _)| Some(index) != skip)
            .map(|(index, atom)| (index, minimum_image(origin, atom, &self.box_lengths)))
            .filter(|(_, d)| {
                let r = norm(d);
                r > 0.0 && r < self.cutoff
            })
            .collect()
    }

    fn add_angle(&self, histogram: &mut Array1<f64>, a: &[f64; 3], b: &[f64; 3]) {
        let cosine = (a[0] * b[0] + a[1] * b[1] + a[2] * b[2]) / (norm(a) * norm(b));
        let angle = cosine.clamp(-1.0, 1.0).acos();
        let bin = ((angle / self.bin_width()) as usize).min(self.number_of_bins - 1);
        histogram[bin] += 1.0;
    }
}

fn norm(d: &[f64; 3]) -> f64 {
    (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
}

impl Calculator for AngularDistributionFunction {
    fn name(&self) -> &str {
        "Angular Distribution Function"
    }
    fn category(&self) -> &str {
        ANGULAR_DISTRIBUTION_FUNCTION
    }
    fn data_paths(&self) -> Vec<String> {
        self.paths.clone()
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
        check_window(self.name(), window, self.paths.len())?;
        let coords = self
            .paths
            .iter()
            .zip(window)
            .map(|(path, view)| coordinates(path, view))
            .collect::<Result<Vec<_>>>()?;
        let [centers, firsts, seconds] = self.roles.map(|role| &coords[role]);
        let same_center = |role: usize| self.roles[role] == self.roles[0];
        let same_neighbours = self.roles[1] == self.roles[2];

        let mut histogram = Array1::zeros(self.number_of_bins);
        for (c, center) in centers.iter().enumerate() {
            let first = self.neighbours(center, firsts, same_center(1).then_some(c));
            if same_neighbours {
                for (n, (_, a)) in first.iter().enumerate() {
                    for (_, b) in &first[n + 1..] {
                        self.add_angle(&mut histogram, a, b);
                    }
                }
            } else {
                let second = self.neighbours(center, seconds, same_center(2).then_some(c));
                for (_, a) in &first {
                    for (_, b) in &second {
                        self.add_angle(&mut histogram, a, b);
                    }
                }
            }
        }
        Ok(WindowSample::new(histogram, None))
    }

    fn reduce(&self, accumulator: &Accumulator) -> Result<AnalysisResult> {
        let counts = accumulator.normalized_series();
        let total = counts.sum();
        let series = if total > 0.0 {
            (counts / (total * self.bin_width())).to_vec()
        } else {
            vec![0.0; self.number_of_bins]
        };
        Ok(AnalysisResult {
            category: String::from(self.category()),
            method: String::from(self.name()),
            kind: ResultKind::Distinct,
            label: self.species.join("-"),
            estimate: None,
            series,
            windows: accumulator.windows(),
        })
    }
}
