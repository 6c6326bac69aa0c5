use ndarray::Array3;

use super::{
    charge_weighted_sum, charged_species, system_path, Transformation,
    TRANSLATIONAL_DIPOLE_MOMENT,
};
use crate::{
    calculator::UNWRAPPED_POSITIONS, data::Batch, experiment::SystemProperties,
    memory::MemoryConfig, store::join_path, Result,
};

/// `M(t) = Σ_s q_s Σ_i r_i(t)` over unwrapped positions
pub struct TranslationalDipoleMoment {
    species: Vec<String>,
    charges: Vec<f64>,
    memory: MemoryConfig,
}
impl TranslationalDipoleMoment {
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

impl Transformation for TranslationalDipoleMoment {
    fn name(&self) -> &str {
        TRANSLATIONAL_DIPOLE_MOMENT
    }
    fn output_path(&self) -> String {
        system_path(TRANSLATIONAL_DIPOLE_MOMENT)
    }
    fn data_paths(&self) -> Vec<String> {
        self.species
            .iter()
            .map(|s| join_path(s, UNWRAPPED_POSITIONS))
            .collect()
    }
    fn memory_config(&self) -> &MemoryConfig {
        &self.memory
    }
    fn transform(&self, batch: &Batch) -> Result<Array3<f64>> {
        charge_weighted_sum(batch, &self.charges)
    }
}
