//! Derived datasets computed batch by batch and written back to the store.

mod ionic_current;
mod translational_dipole_moment;

use std::sync::Arc;

use ndarray::{Array2, Array3, Axis};

use crate::{
    data::{Batch, DataManager},
    experiment::SystemProperties,
    memory::{MemoryConfig, MemoryManager},
    store::{join_path, TrajectoryStore},
    CancellationToken, Error, MachineProfile, Result,
};

pub use ionic_current::IonicCurrent;
pub use translational_dipole_moment::TranslationalDipoleMoment;

pub const IONIC_CURRENT: &str = "Ionic_Current";
pub const TRANSLATIONAL_DIPOLE_MOMENT: &str = "Translational_Dipole_Moment";
pub const THERMAL_FLUX: &str = "Thermal_Flux";

/// Store path of a system-wide series
pub fn system_path(group: &str) -> String {
    join_path(group, group)
}

pub trait Transformation {
    fn name(&self) -> &str;
    /// System dataset written by the transformation
    fn output_path(&self) -> String;
    fn data_paths(&self) -> Vec<String>;
    fn memory_config(&self) -> &MemoryConfig;
    /// `[1, configurations, components]` series of one batch
    fn transform(&self, batch: &Batch) -> Result<Array3<f64>>;
}

/// Allocate the output dataset of `transformation` and fill it batch by batch
pub fn run_transformation<S: TrajectoryStore + ?Sized>(
    transformation: &dyn Transformation,
    store: &mut S,
    profile: Arc<MachineProfile>,
    cancel: &CancellationToken,
) -> Result<()> {
    let paths = transformation.data_paths();
    let output = transformation.output_path();
    let plan = MemoryManager::new(
        &*store,
        paths.clone(),
        transformation.memory_config().clone(),
        profile,
    )?
    .get_batch_size(false)?;
    let components = store.get_data_size(&paths[0], false)?.component_count;
    if cancel.is_cancelled() {
        return Err(Error::Cancelled(String::from(transformation.name())));
    }
    log::info!(
        "{}: writing '{}' in {} batches of {} configurations",
        transformation.name(),
        output,
        plan.total_batches(),
        plan.batch_size()
    );
    store.add_dataset(&output, 1, plan.offset() + plan.configurations(), components)?;

    let filled = (0..plan.total_batches()).try_for_each(|index| {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled(String::from(transformation.name())));
        }
        let batch = DataManager::new(&*store, paths.clone()).load_batch(&plan, index)?;
        let series = transformation.transform(&batch)?;
        store.add_data(&output, series.view(), batch.configurations().start)
    });
    if let Err(error) = filled {
        log::warn!(
            "{}: {}, removing incomplete '{}'",
            transformation.name(),
            error,
            output
        );
        if let Err(removal) = store.remove_dataset(&output) {
            log::warn!("{}: could not remove '{}': {}", transformation.name(), output, removal);
        }
        return Err(error);
    }
    Ok(())
}

/// Charged species of a system, as `(name, charge)`
pub(crate) fn charged_species(properties: &SystemProperties) -> Result<Vec<(String, f64)>> {
    let charged: Vec<(String, f64)> = properties
        .species
        .iter()
        .filter(|(_, s)| s.charge != 0.0)
        .map(|(name, s)| (name.clone(), s.charge))
        .collect();
    if charged.is_empty() {
        return Err(Error::MissingProperty(String::from("charged species")));
    }
    Ok(charged)
}

/// `Σ_s q_s Σ_atoms x` of one batch, one dataset per species
pub(crate) fn charge_weighted_sum(batch: &Batch, charges: &[f64]) -> Result<Array3<f64>> {
    let data = batch.data();
    if data.len() != charges.len() {
        return Err(Error::ShapeMismatch {
            path: String::from("charges"),
            expected: vec![data.len()],
            found: vec![charges.len()],
        });
    }
    let components = data.first().map(|d| d.dim().2).unwrap_or(0);
    let mut total = Array2::zeros((batch.len(), components));
    for (species, &charge) in data.iter().zip(charges) {
        total.scaled_add(charge, &species.sum_axis(Axis(0)));
    }
    Ok(total.insert_axis(Axis(0)))
}
