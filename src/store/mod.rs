mod memory;

pub use memory::InMemoryStore;

use std::{collections::BTreeMap, ops::Range, time::Duration};

use ndarray::{Array3, ArrayView3};

use crate::Result;

/// Size information of one dataset in a trajectory store
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetDescriptor {
    pub path: String,
    /// Atoms, or 1 for system-wide series
    pub row_count: usize,
    /// Configurations
    pub column_count: usize,
    pub component_count: usize,
    pub byte_size: u64,
}
impl DatasetDescriptor {
    pub fn bytes_per_configuration(&self) -> f64 {
        self.byte_size as f64 / self.column_count as f64
    }
    pub fn bytes_per_atom_configuration(&self) -> f64 {
        self.bytes_per_configuration() / self.row_count as f64
    }
}

/// Columnar array store keyed by `species/property` paths.
///
/// Datasets are laid out as `[rows, configurations, components]`.
pub trait TrajectoryStore {
    /// Shape and byte size of a dataset. `system` selects system-wide series,
    /// which have a single row.
    fn get_data_size(&self, path: &str, system: bool) -> Result<DatasetDescriptor>;

    /// Observed latency of opening and reading the store
    fn get_load_time(&self) -> Duration {
        Duration::ZERO
    }

    /// Read a block of rows and configurations
    fn load(
        &self,
        path: &str,
        rows: Range<usize>,
        configurations: Range<usize>,
    ) -> Result<Array3<f64>>;

    /// Allocate a zeroed dataset
    fn add_dataset(
        &mut self,
        path: &str,
        rows: usize,
        configurations: usize,
        components: usize,
    ) -> Result<()>;

    /// Write `data` into an existing dataset starting at configuration `start`
    fn add_data(&mut self, path: &str, data: ArrayView3<f64>, start: usize) -> Result<()>;

    /// Drop a dataset, e.g. one left incomplete by a failed transformation
    fn remove_dataset(&mut self, path: &str) -> Result<()>;

    /// Byte size of every dataset in the store
    fn get_memory_information(&self) -> BTreeMap<String, u64>;
}

/// Join a species (or group) and a property into a store path
pub fn join_path(group: &str, property: &str) -> String {
    format!("{}/{}", group, property)
}
