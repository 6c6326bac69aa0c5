use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub n_atoms: usize,
    /// In elementary charges
    #[serde(default)]
    pub charge: f64,
    #[serde(default = "default_mass")]
    pub mass: f64,
}
impl Species {
    pub fn new(n_atoms: usize, charge: f64, mass: f64) -> Self {
        Self {
            n_atoms,
            charge,
            mass,
        }
    }
}

fn default_mass() -> f64 {
    1.0
}

/// SI value of one simulation unit of each dimension
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Units {
    pub time: f64,
    pub length: f64,
    pub energy: f64,
}
impl Units {
    pub fn new(time: f64, length: f64, energy: f64) -> Self {
        Self {
            time,
            length,
            energy,
        }
    }
    pub fn si() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}
impl Default for Units {
    /// ps, Å, eV
    fn default() -> Self {
        Self::new(1e-12, 1e-10, 1.602_176_634e-19)
    }
}

/// Physical description of a simulated system
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemProperties {
    #[serde(default)]
    pub species: BTreeMap<String, Species>,
    pub time_step: f64,
    /// Integration steps between stored configurations
    pub sample_rate: usize,
    /// K
    pub temperature: f64,
    pub box_lengths: [f64; 3],
    #[serde(default)]
    pub units: Units,
}
impl SystemProperties {
    pub fn new(time_step: f64, sample_rate: usize, temperature: f64, box_lengths: [f64; 3]) -> Self {
        Self {
            species: BTreeMap::new(),
            time_step,
            sample_rate,
            temperature,
            box_lengths,
            units: Units::default(),
        }
    }
    pub fn with_species(mut self, name: &str, species: Species) -> Self {
        self.species.insert(String::from(name), species);
        self
    }
    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let properties: Self = serde_json::from_str(json)?;
        properties.validate()?;
        Ok(properties)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.time_step > 0.0) {
            return Err(Error::invalid_parameter("time_step", "should be positive"));
        }
        if self.sample_rate == 0 {
            return Err(Error::invalid_parameter("sample_rate", "should be positive"));
        }
        if !(self.temperature > 0.0) {
            return Err(Error::invalid_parameter("temperature", "should be positive"));
        }
        if self.box_lengths.iter().any(|&l| !(l > 0.0)) {
            return Err(Error::invalid_parameter(
                "box_lengths",
                format!("should be positive, found {:?}", self.box_lengths),
            ));
        }
        Ok(())
    }

    pub fn species(&self, name: &str) -> Result<&Species> {
        self.species
            .get(name)
            .ok_or_else(|| Error::MissingProperty(format!("species '{}'", name)))
    }

    /// Volume in simulation units
    pub fn volume(&self) -> f64 {
        self.box_lengths.iter().product()
    }
    pub fn volume_si(&self) -> f64 {
        self.volume() * self.units.length.powi(3)
    }
    /// Time between stored configurations in simulation units
    pub fn configuration_interval(&self) -> f64 {
        self.time_step * self.sample_rate as f64
    }
    pub fn configuration_interval_si(&self) -> f64 {
        self.configuration_interval() * self.units.time
    }
}
