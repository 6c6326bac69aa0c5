use std::{collections::BTreeMap, mem::size_of, ops::Range, time::Duration};

use ndarray::{s, Array3, ArrayView3, Axis};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::{DatasetDescriptor, TrajectoryStore};
use crate::{Error, Result};

/// Trajectory store holding every dataset in memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    datasets: BTreeMap<String, Array3<f64>>,
    load_time: Duration,
}
impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            datasets: BTreeMap::new(),
            load_time: Duration::ZERO,
        }
    }

    /// Insert a complete `[rows, configurations, components]` dataset
    pub fn insert(&mut self, path: &str, data: Array3<f64>) -> Result<()> {
        if self.datasets.contains_key(path) {
            return Err(Error::DatasetExists(String::from(path)));
        }
        self.datasets.insert(String::from(path), data);
        Ok(())
    }
    pub fn get(&self, path: &str) -> Option<&Array3<f64>> {
        self.datasets.get(path)
    }
    pub fn set_load_time(&mut self, load_time: Duration) {
        self.load_time = load_time;
    }

    /// Add lattice random walks: every component moves by `+step` or `-step`
    /// with equal probability at each configuration.
    pub fn add_random_walk<R: Rng>(
        &mut self,
        path: &str,
        rows: usize,
        configurations: usize,
        step: f64,
        rng: &mut R,
    ) -> Result<()> {
        let mut data = Array3::zeros((rows, configurations, 3));
        for mut atom in data.axis_iter_mut(Axis(0)) {
            let mut position = [0.0; 3];
            for mut configuration in atom.axis_iter_mut(Axis(0)) {
                for (k, p) in position.iter_mut().enumerate() {
                    configuration[k] = *p;
                    *p += if rng.gen_bool(0.5) { step } else { -step };
                }
            }
        }
        self.insert(path, data)
    }

    /// Add uncorrelated Maxwell-Boltzmann velocities (k_B = 1)
    pub fn add_thermal_velocities<R: Rng>(
        &mut self,
        path: &str,
        rows: usize,
        configurations: usize,
        temperature: f64,
        mass: f64,
        rng: &mut R,
    ) -> Result<()> {
        let dist = Normal::new(0.0, (temperature / mass).sqrt())
            .map_err(|e| Error::invalid_parameter("temperature", e.to_string()))?;
        let samples: Vec<f64> = dist
            .sample_iter(rng)
            .take(rows * configurations * 3)
            .collect();
        let data = Array3::from_shape_vec((rows, configurations, 3), samples).map_err(|_| {
            Error::ShapeMismatch {
                path: String::from(path),
                expected: vec![rows, configurations, 3],
                found: vec![],
            }
        })?;
        self.insert(path, data)
    }

    fn dataset(&self, path: &str) -> Result<&Array3<f64>> {
        self.datasets
            .get(path)
            .ok_or_else(|| Error::DataSizeUnavailable {
                path: String::from(path),
            })
    }
}

impl TrajectoryStore for InMemoryStore {
    fn get_data_size(&self, path: &str, system: bool) -> Result<DatasetDescriptor> {
        let data = self.dataset(path)?;
        let (rows, configurations, components) = data.dim();
        if system && rows != 1 {
            return Err(Error::ShapeMismatch {
                path: String::from(path),
                expected: vec![1, configurations, components],
                found: vec![rows, configurations, components],
            });
        }
        if configurations == 0 || rows == 0 {
            return Err(Error::DataSizeUnavailable {
                path: String::from(path),
            });
        }
        Ok(DatasetDescriptor {
            path: String::from(path),
            row_count: rows,
            column_count: configurations,
            component_count: components,
            byte_size: (data.len() * size_of::<f64>()) as u64,
        })
    }

    fn get_load_time(&self) -> Duration {
        self.load_time
    }

    fn load(
        &self,
        path: &str,
        rows: Range<usize>,
        configurations: Range<usize>,
    ) -> Result<Array3<f64>> {
        let data = self.dataset(path)?;
        let (nrows, nconfigs, ncomponents) = data.dim();
        if rows.start > rows.end
            || rows.end > nrows
            || configurations.start > configurations.end
            || configurations.end > nconfigs
        {
            return Err(Error::ShapeMismatch {
                path: String::from(path),
                expected: vec![nrows, nconfigs, ncomponents],
                found: vec![rows.end, configurations.end, ncomponents],
            });
        }
        Ok(data.slice(s![rows, configurations, ..]).to_owned())
    }

    fn add_dataset(
        &mut self,
        path: &str,
        rows: usize,
        configurations: usize,
        components: usize,
    ) -> Result<()> {
        self.insert(path, Array3::zeros((rows, configurations, components)))
    }

    fn add_data(&mut self, path: &str, data: ArrayView3<f64>, start: usize) -> Result<()> {
        let target = self
            .datasets
            .get_mut(path)
            .ok_or_else(|| Error::DataSizeUnavailable {
                path: String::from(path),
            })?;
        let (rows, configurations, components) = data.dim();
        let (trows, tconfigs, tcomponents) = target.dim();
        if rows != trows || components != tcomponents || start + configurations > tconfigs {
            return Err(Error::ShapeMismatch {
                path: String::from(path),
                expected: vec![trows, tconfigs - start.min(tconfigs), tcomponents],
                found: vec![rows, configurations, components],
            });
        }
        target
            .slice_mut(s![.., start..start + configurations, ..])
            .assign(&data);
        Ok(())
    }

    fn remove_dataset(&mut self, path: &str) -> Result<()> {
        self.datasets
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| Error::DataSizeUnavailable {
                path: String::from(path),
            })
    }

    fn get_memory_information(&self) -> BTreeMap<String, u64> {
        self.datasets
            .iter()
            .map(|(path, data)| (path.clone(), (data.len() * size_of::<f64>()) as u64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn ramp(rows: usize, configurations: usize) -> Array3<f64> {
        Array::from_shape_fn((rows, configurations, 3), |(i, j, k)| {
            (i * 1000 + j * 10 + k) as f64
        })
    }

    #[test]
    fn reports_sizes() {
        let mut store = InMemoryStore::new();
        store.insert("Na/Positions", ramp(200, 100)).unwrap();
        let d = store.get_data_size("Na/Positions", false).unwrap();
        assert_eq!((d.row_count, d.column_count, d.component_count), (200, 100, 3));
        assert_eq!(d.byte_size, 200 * 100 * 3 * 8);
        assert_eq!(d.bytes_per_configuration(), 4800.0);
        assert!(matches!(
            store.get_data_size("Cl/Positions", false),
            Err(Error::DataSizeUnavailable { .. })
        ));
        assert!(matches!(
            store.get_data_size("Na/Positions", true),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn loads_blocks() {
        let mut store = InMemoryStore::new();
        store.insert("Na/Positions", ramp(4, 10)).unwrap();
        let block = store.load("Na/Positions", 1..3, 5..8).unwrap();
        assert_eq!(block.dim(), (2, 3, 3));
        assert_eq!(block[[0, 0, 0]], 1050.0);
        assert!(store.load("Na/Positions", 0..5, 0..1).is_err());
    }

    #[test]
    fn writes_into_allocated_datasets() {
        let mut store = InMemoryStore::new();
        store.add_dataset("Ionic_Current/Ionic_Current", 1, 6, 3).unwrap();
        let chunk = Array3::from_elem((1, 2, 3), 7.0);
        store
            .add_data("Ionic_Current/Ionic_Current", chunk.view(), 4)
            .unwrap();
        let data = store.get("Ionic_Current/Ionic_Current").unwrap();
        assert_eq!(data[[0, 3, 0]], 0.0);
        assert_eq!(data[[0, 5, 2]], 7.0);
        assert!(store
            .add_data("Ionic_Current/Ionic_Current", chunk.view(), 5)
            .is_err());
        assert!(matches!(
            store.add_dataset("Ionic_Current/Ionic_Current", 1, 6, 3),
            Err(Error::DatasetExists(_))
        ));

        store.remove_dataset("Ionic_Current/Ionic_Current").unwrap();
        assert!(store.get("Ionic_Current/Ionic_Current").is_none());
        assert!(matches!(
            store.remove_dataset("Ionic_Current/Ionic_Current"),
            Err(Error::DataSizeUnavailable { .. })
        ));
        store.add_dataset("Ionic_Current/Ionic_Current", 1, 6, 3).unwrap();
    }

    #[test]
    fn random_walk_steps_are_unit() {
        let mut store = InMemoryStore::new();
        let mut rng = StdRng::seed_from_u64(7);
        store
            .add_random_walk("Ar/Unwrapped_Positions", 3, 20, 0.5, &mut rng)
            .unwrap();
        let data = store.get("Ar/Unwrapped_Positions").unwrap();
        for i in 0..3 {
            assert_eq!(data[[i, 0, 0]], 0.0);
            for j in 1..20 {
                assert_eq!((data[[i, j, 1]] - data[[i, j - 1, 1]]).abs(), 0.5);
            }
        }
        assert_eq!(
            store.get_memory_information()["Ar/Unwrapped_Positions"],
            3 * 20 * 3 * 8
        );
    }
}
