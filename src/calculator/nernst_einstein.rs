use super::{DIFFUSION_COEFFICIENTS, IONIC_CONDUCTIVITY};
use crate::{
    constants::{BOLTZMANN, ELEMENTARY_CHARGE},
    experiment::{Species, SystemProperties},
    results::{AnalysisResult, Estimate, ResultKind, ResultsTable},
    Error, Result,
};

/// Ionic conductivity of uncorrelated ions from stored self diffusion
/// coefficients, `σ = e² / (V k_B T) Σ_s N_s q_s² D_s`, in S/m.
///
/// The corrected form adds the stored distinct coefficients of every pair of
/// charged species, `e² / (V k_B T) Σ_ab (N_a N_b / N) q_a q_b D_ab`, with `N`
/// the total number of atoms.
pub struct NernstEinstein {
    properties: SystemProperties,
    diffusion_method: String,
    distinct_method: Option<String>,
}
impl NernstEinstein {
    /// `diffusion_method` names the stored self diffusion results to use
    pub fn new(properties: &SystemProperties, diffusion_method: &str) -> Result<Self> {
        properties.validate()?;
        Ok(Self {
            properties: properties.clone(),
            diffusion_method: String::from(diffusion_method),
            distinct_method: None,
        })
    }
    /// Include the distinct diffusion results stored under `distinct_method`
    pub fn corrected(mut self, distinct_method: &str) -> Self {
        self.distinct_method = Some(String::from(distinct_method));
        self
    }

    pub fn name(&self) -> String {
        match self.distinct_method {
            Some(_) => format!(
                "Corrected Nernst Einstein Ionic Conductivity ({})",
                self.diffusion_method
            ),
            None => format!("Nernst Einstein Ionic Conductivity ({})", self.diffusion_method),
        }
    }

    fn prefactor(&self) -> f64 {
        ELEMENTARY_CHARGE.powi(2)
            / (self.properties.volume_si() * BOLTZMANN * self.properties.temperature)
    }

    /// Distinct coefficient of a pair, stored as either `A-B` or `B-A`
    fn distinct(
        &self,
        results: &ResultsTable,
        method: &str,
        a: &str,
        b: &str,
    ) -> Result<Estimate> {
        [format!("{}-{}", a, b), format!("{}-{}", b, a)]
            .iter()
            .find_map(|label| {
                results.estimate(DIFFUSION_COEFFICIENTS, method, ResultKind::Distinct, label)
            })
            .ok_or_else(|| Error::MissingProperty(format!("{} of pair '{}-{}'", method, a, b)))
    }

    pub fn compute(&self, results: &ResultsTable) -> Result<AnalysisResult> {
        let prefactor = self.prefactor();
        let mut value = 0.0;
        let mut variance = 0.0;
        for (name, species) in &self.properties.species {
            if species.charge == 0.0 {
                continue;
            }
            let diffusion = results
                .estimate(
                    DIFFUSION_COEFFICIENTS,
                    &self.diffusion_method,
                    ResultKind::Singular,
                    name,
                )
                .ok_or_else(|| {
                    Error::MissingProperty(format!(
                        "{} of species '{}'",
                        self.diffusion_method, name
                    ))
                })?;
            let weight = prefactor * species.n_atoms as f64 * species.charge.powi(2);
            value += weight * diffusion.value;
            variance += (weight * diffusion.uncertainty).powi(2);
        }

        if let Some(method) = &self.distinct_method {
            let total_atoms: usize = self.properties.species.values().map(|s| s.n_atoms).sum();
            let charged: Vec<(&String, &Species)> = self
                .properties
                .species
                .iter()
                .filter(|(_, s)| s.charge != 0.0)
                .collect();
            for (i, (a, first)) in charged.iter().enumerate() {
                for (b, second) in &charged[i..] {
                    let diffusion = self.distinct(results, method, a, b)?;
                    let weight = prefactor
                        * (first.n_atoms * second.n_atoms) as f64
                        / total_atoms as f64
                        * first.charge
                        * second.charge;
                    value += weight * diffusion.value;
                    variance += (weight * diffusion.uncertainty).powi(2);
                }
            }
        }
        log::debug!("{}: {:e} S/m", self.name(), value);
        Ok(AnalysisResult {
            category: String::from(IONIC_CONDUCTIVITY),
            method: self.name(),
            kind: ResultKind::Singular,
            label: String::from("System"),
            estimate: Some(Estimate::new(value, variance.sqrt())),
            series: vec![],
            windows: 0,
        })
    }
}
