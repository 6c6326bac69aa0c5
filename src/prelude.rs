pub use super::calculator::{
    AngularDistributionFunction, Calculator, EinsteinDiffusion, EinsteinDistinctDiffusion,
    EinsteinHelfandIonicConductivity, GreenKuboDiffusion, GreenKuboIonicConductivity,
    GreenKuboThermalConductivity, NernstEinstein, PotentialOfMeanForce,
    RadialDistributionFunction, Window,
};
pub use super::experiment::{Experiment, Species, SystemProperties, Units};
pub use super::memory::MemoryConfig;
pub use super::results::{ResultKind, ResultsTable};
pub use super::store::{InMemoryStore, TrajectoryStore};
pub use super::transformations::{IonicCurrent, TranslationalDipoleMoment};
pub use super::{CancellationToken, Error, MachineProfile, ScaleFunctionSpec};
