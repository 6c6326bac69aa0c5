mod properties;

pub use properties::{Species, SystemProperties, Units};

use std::sync::Arc;

use crate::{
    calculator::{run_analysis, Calculator, NernstEinstein, PotentialOfMeanForce},
    results::{AnalysisResult, ResultsTable},
    store::TrajectoryStore,
    transformations::{run_transformation, Transformation},
    CancellationToken, MachineProfile, Result,
};

/// One simulated system: its trajectory store, physical properties and the
/// results computed so far.
///
/// Analyses run one at a time; a result is stored only when its run succeeds.
pub struct Experiment<S: TrajectoryStore> {
    name: String,
    store: S,
    properties: SystemProperties,
    profile: Arc<MachineProfile>,
    results: ResultsTable,
    cancel: CancellationToken,
}
impl<S: TrajectoryStore> Experiment<S> {
    pub fn new(name: &str, store: S, properties: SystemProperties) -> Result<Self> {
        properties.validate()?;
        Ok(Self {
            name: String::from(name),
            store,
            properties,
            profile: MachineProfile::shared(),
            results: ResultsTable::new(),
            cancel: CancellationToken::new(),
        })
    }
    pub fn with_profile(mut self, profile: Arc<MachineProfile>) -> Self {
        self.profile = profile;
        self
    }

    // Getters
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn store(&self) -> &S {
        &self.store
    }
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
    pub fn properties(&self) -> &SystemProperties {
        &self.properties
    }
    pub fn profile(&self) -> &MachineProfile {
        &self.profile
    }
    pub fn results(&self) -> &ResultsTable {
        &self.results
    }
    /// Handle that cancels the running and all later analyses until reset
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn run(&mut self, calculator: &dyn Calculator) -> Result<AnalysisResult> {
        log::info!("{}: running {}", self.name, calculator.name());
        let result = run_analysis(calculator, &self.store, self.profile.clone(), &self.cancel)?;
        self.results.insert(&result);
        Ok(result)
    }

    pub fn run_transformation(&mut self, transformation: &dyn Transformation) -> Result<()> {
        log::info!("{}: running {}", self.name, transformation.name());
        run_transformation(
            transformation,
            &mut self.store,
            self.profile.clone(),
            &self.cancel,
        )
    }

    /// Nernst-Einstein conductivity from stored `diffusion_method` results
    pub fn run_nernst_einstein(&mut self, diffusion_method: &str) -> Result<AnalysisResult> {
        let result = NernstEinstein::new(&self.properties, diffusion_method)?.compute(&self.results)?;
        self.results.insert(&result);
        Ok(result)
    }

    /// Nernst-Einstein conductivity corrected by stored distinct diffusion
    /// results of every charged pair
    pub fn run_corrected_nernst_einstein(
        &mut self,
        diffusion_method: &str,
        distinct_method: &str,
    ) -> Result<AnalysisResult> {
        let result = NernstEinstein::new(&self.properties, diffusion_method)?
            .corrected(distinct_method)
            .compute(&self.results)?;
        self.results.insert(&result);
        Ok(result)
    }

    pub fn run_potential_of_mean_force(
        &mut self,
        first: &str,
        second: &str,
    ) -> Result<AnalysisResult> {
        let result =
            PotentialOfMeanForce::new(&self.properties, first, second)?.compute(&self.results)?;
        self.results.insert(&result);
        Ok(result)
    }
}
