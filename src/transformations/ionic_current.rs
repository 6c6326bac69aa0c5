use ndarray::Array3;

use super::{
    charge_weighted_sum, charged_species, system_path, Transformation, IONIC_CURRENT,
};
use crate::{
    calculator::VELOCITIES, data::Batch, experiment::SystemProperties, memory::MemoryConfig,
    store::join_path, Result,
};

/// `J(t) = Σ_s q_s Σ_i v_i(t)`
pub struct IonicCurrent {
    species: Vec<String>,
    charges: Vec<f64>,
    memory: MemoryConfig,
}
impl IonicCurrent {
    pub fn new(properties: &SystemProperties) -> Result<Self> {
        let (species, charges): (Vec<String>, Vec<f64>) =
            charged_species(properties)?.into_iter().unzip();
        Ok(Self {
            species,
            charges,
            memory: MemoryConfig::default(),
        })
    }
    pub fn with_memory_config(mut self, memory: MemoryConfig) -> Self {
        self.memory = memory;
        self
    }
}

impl Transformation for IonicCurrent {
    fn name(&self) -> &str {
        IONIC_CURRENT
    }
    fn output_path(&self) -> String {
        system_path(IONIC_CURRENT)
    }
    fn data_paths(&self) -> Vec<String> {
        self.species
            .iter()
            .map(|s| join_path(s, VELOCITIES))
            .collect()
    }
    fn memory_config(&self) -> &MemoryConfig {
        &self.memory
    }
    fn transform(&self, batch: &Batch) -> Result<Array3<f64>> {
        charge_weighted_sum(batch, &self.charges)
    }
}
