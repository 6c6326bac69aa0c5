use std::sync::Arc;

use super::{BatchPlan, EnsembleLoopPlan, MemoryConfig};
use crate::{
    scale_function::{ScaleFunction, ScaleFunctionTrait},
    store::{DatasetDescriptor, TrajectoryStore},
    utils::largest_divisor_at_most,
    Error, MachineProfile, Result,
};

/// Decides how much of a set of datasets is loaded at once.
///
/// One manager serves one analysis call. It borrows the store and shares the
/// machine profile; the plans it computes are returned to the caller.
pub struct MemoryManager<'a, S: TrajectoryStore + ?Sized> {
    store: &'a S,
    data_path: Vec<String>,
    config: MemoryConfig,
    scale_function: ScaleFunction,
    profile: Arc<MachineProfile>,
}
impl<'a, S: TrajectoryStore + ?Sized> MemoryManager<'a, S> {
    /// Create a manager, validating the configuration before touching the store
    pub fn new(
        store: &'a S,
        data_path: Vec<String>,
        config: MemoryConfig,
        profile: Arc<MachineProfile>,
    ) -> Result<Self> {
        if data_path.is_empty() {
            return Err(Error::NoDataRequested);
        }
        let scale_function = config.validate()?;
        Ok(Self {
            store,
            data_path,
            config,
            scale_function,
            profile,
        })
    }

    // Getters
    pub fn data_path(&self) -> &Vec<String> {
        &self.data_path
    }
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }
    pub fn scale_function(&self) -> &ScaleFunction {
        &self.scale_function
    }
    pub fn profile(&self) -> &MachineProfile {
        &self.profile
    }

    /// Bytes a single batch may occupy
    pub fn memory_budget(&self) -> f64 {
        self.config.memory_fraction * self.memory_ceiling() as f64
    }

    /// Plan configuration-wise batches over every requested dataset
    pub fn get_batch_size(&self, system: bool) -> Result<BatchPlan> {
        let descriptors = self.descriptors(system)?;
        let per_configuration_memory: f64 = descriptors
            .iter()
            .map(DatasetDescriptor::bytes_per_configuration)
            .sum();
        let adjusted = self.scale_function.scale(per_configuration_memory);

        let configurations = self.configurations(&descriptors)?;
        let maximum_loaded_configurations =
            clip_configurations(self.memory_budget(), adjusted, configurations);
        let batch_size = self.optimal_batch_size(maximum_loaded_configurations, configurations);
        let row_count = descriptors.iter().map(|d| d.row_count).max().unwrap_or(1);

        let plan = BatchPlan::new(
            batch_size,
            configurations,
            self.config.offset,
            row_count,
            system,
        );
        log::debug!(
            "{}: {:.1} bytes per configuration ({:.1} scaled), batch size {}, {} batches, remainder {}",
            self.paths_label(),
            per_configuration_memory,
            adjusted,
            plan.batch_size(),
            plan.number_of_batches(),
            plan.remainder()
        );
        Ok(plan)
    }

    /// Partition a batch into sliding windows of `data_range` configurations
    /// spaced by `correlation_time`.
    ///
    /// Falls back to atom-wise mini-batches when a batch of `plan` cannot hold
    /// a single window; the returned plan then carries the new batch layout.
    pub fn get_ensemble_loop(
        &self,
        plan: &BatchPlan,
        data_range: usize,
        correlation_time: usize,
    ) -> Result<EnsembleLoopPlan> {
        if data_range == 0 {
            return Err(Error::invalid_parameter("data_range", "should be positive"));
        }
        if correlation_time == 0 {
            return Err(Error::invalid_parameter(
                "correlation_time",
                "should be positive",
            ));
        }
        if data_range > plan.configurations() {
            return Err(Error::RangeExceeded {
                path: self.paths_label(),
                data_range,
                available: plan.configurations(),
            });
        }

        if plan.batch_size() >= data_range {
            return Ok(EnsembleLoopPlan::new(
                *plan,
                data_range,
                correlation_time,
                false,
            ));
        }
        let mini_plan = self.compute_atomwise_minibatch(plan, data_range, correlation_time)?;
        Ok(EnsembleLoopPlan::new(
            mini_plan,
            data_range,
            correlation_time,
            true,
        ))
    }

    /// Find the largest atom fraction whose batches still hold a whole window
    /// of `data_range` configurations, ending with single atoms
    fn compute_atomwise_minibatch(
        &self,
        plan: &BatchPlan,
        data_range: usize,
        correlation_time: usize,
    ) -> Result<BatchPlan> {
        let descriptors = self.descriptors(plan.system())?;
        let configurations = plan.configurations();
        let budget = self.memory_budget();
        let row_count = plan.row_count();

        let batch_for = |atoms: usize| {
            let raw: f64 = descriptors
                .iter()
                .map(|d| d.bytes_per_atom_configuration() * atoms.min(d.row_count) as f64)
                .sum();
            clip_configurations(budget, self.scale_function.scale(raw), configurations)
        };

        for &fraction in &self.config.minibatch_fractions {
            let atoms = ((row_count as f64 * fraction).floor() as usize).max(1);
            let batch_size = batch_for(atoms);
            if batch_size >= data_range {
                log::info!(
                    "{}: mini-batching {} of {} atoms ({}), batch size {}",
                    self.paths_label(),
                    atoms,
                    row_count,
                    fraction,
                    batch_size
                );
                return Ok(plan.with_atom_batches(batch_size, atoms));
            }
        }

        log::info!(
            "{}: could not find a good mini batch fraction, using single atom mini batching",
            self.paths_label()
        );
        let batch_size = batch_for(1);
        if batch_size < data_range {
            return Err(Error::InsufficientData {
                path: self.paths_label(),
                data_range,
                correlation_time,
            });
        }
        Ok(plan.with_atom_batches(batch_size, 1))
    }

    fn memory_ceiling(&self) -> u64 {
        if self.config.gpu {
            match self.profile.max_gpu_memory_bytes() {
                Some(memory) => return memory,
                None => log::warn!("No GPUs detected, planning against host memory"),
            }
        }
        self.profile.available_memory_bytes()
    }

    fn descriptors(&self, system: bool) -> Result<Vec<DatasetDescriptor>> {
        self.data_path
            .iter()
            .map(|path| self.store.get_data_size(path, system))
            .collect()
    }

    /// Configurations available after the offset, shared by every dataset
    fn configurations(&self, descriptors: &[DatasetDescriptor]) -> Result<usize> {
        let first = &descriptors[0];
        if let Some(d) = descriptors
            .iter()
            .find(|d| d.column_count != first.column_count)
        {
            return Err(Error::InconsistentConfigurations {
                path: d.path.clone(),
                expected: first.column_count,
                found: d.column_count,
            });
        }
        if self.config.offset >= first.column_count {
            return Err(Error::OffsetExceeded {
                path: self.paths_label(),
                offset: self.config.offset,
                available: first.column_count,
            });
        }
        Ok(first.column_count - self.config.offset)
    }

    fn optimal_batch_size(&self, naive_size: usize, configurations: usize) -> usize {
        let load_time = self.store.get_load_time();
        log::debug!(
            "{}: store load time {:?}",
            self.paths_label(),
            load_time
        );
        if !self.config.prefer_even_batches {
            return naive_size;
        }
        let even = largest_divisor_at_most(configurations, naive_size);
        if 2 * even >= naive_size {
            even
        } else {
            naive_size
        }
    }

    fn paths_label(&self) -> String {
        self.data_path.join(", ")
    }
}

/// Configurations of `cost` bytes fitting in `budget`, within `[1, upper]`
fn clip_configurations(budget: f64, cost: f64, upper: usize) -> usize {
    if !(cost > 0.0) {
        return upper;
    }
    let n = (budget / cost).floor();
    if n >= upper as f64 {
        upper
    } else if n < 1.0 {
        1
    } else {
        n as usize
    }
}
