use std::ops::Range;

use ndarray::{s, Array3, ArrayView3};

use crate::{memory::BatchPlan, store::TrajectoryStore, Error, Result};

/// One loaded block of the trajectory, one array per requested dataset
#[derive(Debug)]
pub struct Batch {
    index: usize,
    configurations: Range<usize>,
    atoms: Range<usize>,
    data: Vec<Array3<f64>>,
}
impl Batch {
    /// Position of the batch in the stream
    pub fn index(&self) -> usize {
        self.index
    }
    /// Absolute configuration range held by the batch
    pub fn configurations(&self) -> &Range<usize> {
        &self.configurations
    }
    /// Atom range of the batch, all atoms unless mini-batching
    pub fn atoms(&self) -> &Range<usize> {
        &self.atoms
    }
    /// Arrays shaped `[atoms, configurations, components]`
    pub fn data(&self) -> &Vec<Array3<f64>> {
        &self.data
    }
    /// Configurations in the batch
    pub fn len(&self) -> usize {
        self.configurations.len()
    }
    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }
    /// Views of `length` configurations starting at `start` (relative to the batch)
    pub fn window(&self, start: usize, length: usize) -> Vec<ArrayView3<f64>> {
        assert!(
            start + length <= self.len(),
            "Window [{}, {}) runs past a batch of {} configurations",
            start,
            start + length,
            self.len()
        );
        self.data
            .iter()
            .map(|d| d.slice(s![.., start..start + length, ..]))
            .collect()
    }
}

/// Streams trajectory batches from a store following a [`BatchPlan`]
pub struct DataManager<'a, S: TrajectoryStore + ?Sized> {
    store: &'a S,
    data_path: Vec<String>,
}
impl<'a, S: TrajectoryStore + ?Sized> DataManager<'a, S> {
    pub fn new(store: &'a S, data_path: Vec<String>) -> Self {
        Self { store, data_path }
    }
    pub fn data_path(&self) -> &Vec<String> {
        &self.data_path
    }

    /// Lazy sequence of the batches of `plan`.
    ///
    /// With atom mini-batches, every configuration batch of the first atom
    /// range is produced before the next atom range, so each atom subset is
    /// streamed in trajectory order.
    pub fn batch_generator(&self, plan: &BatchPlan) -> Result<BatchGenerator<'_, S>> {
        let row_counts = self
            .data_path
            .iter()
            .map(|path| {
                self.store
                    .get_data_size(path, plan.system())
                    .map(|d| d.row_count)
            })
            .collect::<Result<Vec<usize>>>()?;
        Ok(BatchGenerator {
            store: self.store,
            data_path: &self.data_path,
            row_counts,
            atom_ranges: plan.atom_ranges(),
            configuration_ranges: plan.configuration_ranges(),
            position: 0,
        })
    }

    /// Load the batch at `index` of the stream of `plan` alone
    pub fn load_batch(&self, plan: &BatchPlan, index: usize) -> Result<Batch> {
        let mut generator = self.batch_generator(plan)?;
        let total = generator.len();
        generator
            .nth(index)
            .unwrap_or_else(|| {
                Err(Error::invalid_parameter(
                    "index",
                    format!("the plan has {} batches, found {}", total, index),
                ))
            })
    }
}

/// Finite, ordered iterator over the batches of one plan
pub struct BatchGenerator<'a, S: TrajectoryStore + ?Sized> {
    store: &'a S,
    data_path: &'a [String],
    row_counts: Vec<usize>,
    atom_ranges: Vec<Range<usize>>,
    configuration_ranges: Vec<Range<usize>>,
    position: usize,
}
impl<'a, S: TrajectoryStore + ?Sized> BatchGenerator<'a, S> {
    fn total(&self) -> usize {
        self.atom_ranges.len() * self.configuration_ranges.len()
    }
    fn load(&self, index: usize) -> Result<Batch> {
        let atoms = self.atom_ranges[index / self.configuration_ranges.len()].clone();
        let configurations = self.configuration_ranges[index % self.configuration_ranges.len()].clone();
        let data = self
            .data_path
            .iter()
            .zip(self.row_counts.iter())
            .map(|(path, &rows)| {
                let rows = atoms.start.min(rows)..atoms.end.min(rows);
                self.store.load(path, rows, configurations.clone())
            })
            .collect::<Result<Vec<Array3<f64>>>>()?;
        Ok(Batch {
            index,
            configurations,
            atoms,
            data,
        })
    }
}
impl<'a, S: TrajectoryStore + ?Sized> Iterator for BatchGenerator<'a, S> {
    type Item = Result<Batch>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.total() {
            return None;
        }
        let batch = self.load(self.position);
        self.position += 1;
        Some(batch)
    }
    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.position = self.position.saturating_add(n);
        self.next()
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total().saturating_sub(self.position);
        (left, Some(left))
    }
}
impl<'a, S: TrajectoryStore + ?Sized> ExactSizeIterator for BatchGenerator<'a, S> {}
