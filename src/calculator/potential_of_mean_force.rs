use super::RADIAL_DISTRIBUTION_FUNCTION;
use crate::{
    constants::BOLTZMANN,
    experiment::SystemProperties,
    results::{AnalysisResult, Estimate, ResultKind, ResultsTable},
    Error, Result,
};

pub const POTENTIAL_OF_MEAN_FORCE: &str = "Potential_Of_Mean_Force";

/// Potential of mean force of a species pair from its stored radial
/// distribution function, `w(r) = -k_B T ln g(r)`, in simulation energy units.
///
/// The estimate is the depth of the well: the mean of `w` at its minimum and
/// at the lower of the two neighbouring bins.
pub struct PotentialOfMeanForce {
    species: [String; 2],
    thermal_energy: f64,
    rdf_method: String,
}
impl PotentialOfMeanForce {
    pub fn new(properties: &SystemProperties, first: &str, second: &str) -> Result<Self> {
        properties.validate()?;
        properties.species(first)?;
        properties.species(second)?;
        Ok(Self {
            species: [String::from(first), String::from(second)],
            thermal_energy: BOLTZMANN * properties.temperature / properties.units.energy,
            rdf_method: String::from("Radial Distribution Function"),
        })
    }

    pub fn name(&self) -> &str {
        "Potential of Mean Force"
    }
    pub fn label(&self) -> String {
        format!("{}-{}", self.species[0], self.species[1])
    }

    /// `w(r)` of each bin; empty bins are infinitely repulsive
    pub fn potential(&self, rdf: &[f64]) -> Vec<f64> {
        rdf.iter()
            .map(|&g| {
                if g > 0.0 {
                    -self.thermal_energy * g.ln()
                } else {
                    f64::INFINITY
                }
            })
            .collect()
    }

    fn stored_rdf<'a>(&self, results: &'a ResultsTable) -> Result<&'a Vec<f64>> {
        let [a, b] = &self.species;
        let stored = results.get(RADIAL_DISTRIBUTION_FUNCTION, &self.rdf_method);
        [format!("{}-{}", a, b), format!("{}-{}", b, a)]
            .iter()
            .find_map(|label| stored?.series.get(label))
            .ok_or_else(|| {
                Error::MissingProperty(format!("{} of pair '{}'", self.rdf_method, self.label()))
            })
    }

    pub fn compute(&self, results: &ResultsTable) -> Result<AnalysisResult> {
        let potential = self.potential(self.stored_rdf(results)?);
        let (minimum, depth) = potential
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, w)| w.is_finite())
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .ok_or_else(|| {
                Error::MissingProperty(format!("populated bins of the '{}' RDF", self.label()))
            })?;

        let neighbour = [minimum.checked_sub(1), Some(minimum + 1)]
            .into_iter()
            .flatten()
            .filter_map(|k| potential.get(k).copied())
            .filter(|w| w.is_finite())
            .min_by(f64::total_cmp);
        let estimate = match neighbour {
            Some(w) => Estimate::new((depth + w) / 2.0, (depth - w).abs() / 2.0 / 2f64.sqrt()),
            None => Estimate::new(depth, 0.0),
        };
        log::debug!(
            "{}: well of {} at bin {}",
            self.name(),
            self.label(),
            minimum
        );
        Ok(AnalysisResult {
            category: String::from(POTENTIAL_OF_MEAN_FORCE),
            method: String::from(self.name()),
            kind: ResultKind::Distinct,
            label: self.label(),
            estimate: Some(estimate),
            series: vec![],
            windows: 0,
        })
    }
}
