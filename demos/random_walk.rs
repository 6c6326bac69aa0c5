use rand::{rngs::StdRng, SeedableRng};

use mdflow::prelude::*;

fn main() -> Result<(), Error> {
    env_logger::init();

    let properties = SystemProperties::new(0.002, 100, 1400.0, [23.0, 23.0, 23.0])
        .with_species("Na", Species::new(200, 1.0, 22.99))
        .with_species("Cl", Species::new(200, -1.0, 35.45));

    // lattice walks standing in for a molten salt trajectory
    let mut rng = StdRng::seed_from_u64(42);
    let mut store = InMemoryStore::new();
    store.add_random_walk("Na/Unwrapped_Positions", 200, 5000, 0.2, &mut rng)?;
    store.add_random_walk("Cl/Unwrapped_Positions", 200, 5000, 0.15, &mut rng)?;

    let mut experiment = Experiment::new("NaCl", store, properties)?;
    println!(
        "{} GiB available, {} cores",
        experiment.profile().available_memory_bytes() >> 30,
        experiment.profile().cpu_cores()
    );

    // a small memory fraction forces several batches
    let memory = MemoryConfig::new().with_memory_fraction(0.001);
    for species in ["Na", "Cl"] {
        let calculator = EinsteinDiffusion::new(experiment.properties(), species)?
            .with_window(Window::new(500, 20))
            .with_memory_config(memory.clone());
        let result = experiment.run(&calculator)?;
        if let Some(d) = result.estimate {
            println!(
                "D({}) = {:.3e} +- {:.1e} m^2/s over {} windows",
                species, d.value, d.uncertainty, result.windows
            );
        }
    }

    let transformation = TranslationalDipoleMoment::new(experiment.properties())?;
    experiment.run_transformation(&transformation)?;
    let conductivity = EinsteinHelfandIonicConductivity::new(experiment.properties())?
        .with_window(Window::new(500, 20));
    experiment.run(&conductivity)?;
    experiment.run_nernst_einstein("Einstein Self Diffusion Coefficients")?;

    println!("{}", experiment.results().to_json()?);
    Ok(())
}
