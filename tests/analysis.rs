use std::{collections::BTreeMap, sync::Arc};

use ndarray::{Array, Array3};
use rand::{rngs::StdRng, SeedableRng};

use mdflow::prelude::*;
use mdflow::calculator::{run_analysis, DIFFUSION_COEFFICIENTS, RADIAL_DISTRIBUTION_FUNCTION};

fn profile(memory: u64) -> Arc<MachineProfile> {
    Arc::new(MachineProfile::new(memory, 1, BTreeMap::new()))
}

fn exact_memory() -> MemoryConfig {
    MemoryConfig::new()
        .with_memory_fraction(1.0)
        .with_scale_function(ScaleFunctionSpec::linear(1.0))
}

fn properties(species: &[(&str, usize, f64)]) -> SystemProperties {
    species.iter().fold(
        SystemProperties::new(1.0, 1, 300.0, [10.0; 3]).with_units(Units::si()),
        |p, &(name, n, q)| p.with_species(name, Species::new(n, q, 1.0)),
    )
}

fn experiment(
    store: InMemoryStore,
    species: &[(&str, usize, f64)],
    memory: u64,
) -> Experiment<InMemoryStore> {
    Experiment::new("test", store, properties(species))
        .unwrap()
        .with_profile(profile(memory))
}

fn relative_difference(a: f64, b: f64) -> f64 {
    ((a - b) / b).abs()
}

#[test]
fn minibatched_einstein_matches_whole_batches() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut store = InMemoryStore::new();
    store
        .add_random_walk("Ar/Unwrapped_Positions", 8, 200, 0.3, &mut rng)
        .unwrap();
    let calculator = |properties: &SystemProperties| {
        EinsteinDiffusion::new(properties, "Ar")
            .unwrap()
            .with_window(Window::new(50, 10))
            .with_memory_config(exact_memory().with_minibatch_fractions(vec![0.125]))
    };
    let whole = run_analysis(
        &calculator(&properties(&[("Ar", 8, 0.0)])),
        &store,
        profile(1 << 30),
        &CancellationToken::new(),
    )
    .unwrap();
    // 24 bytes per atom and configuration: one atom at a time holds all 200
    let mini = run_analysis(
        &calculator(&properties(&[("Ar", 8, 0.0)])),
        &store,
        profile(24 * 200),
        &CancellationToken::new(),
    )
    .unwrap();

    assert_eq!(whole.windows, 15);
    assert_eq!(mini.windows, whole.windows);
    let (w, m) = (whole.estimate.unwrap(), mini.estimate.unwrap());
    assert!(relative_difference(m.value, w.value) < 1e-9);
    assert!(relative_difference(m.uncertainty, w.uncertainty) < 1e-6);
    for (a, b) in mini.series.iter().zip(whole.series.iter()).skip(1) {
        assert!(relative_difference(*a, *b) < 1e-9);
    }
}

#[test]
fn minibatched_green_kubo_matches_whole_batches() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut store = InMemoryStore::new();
    store
        .add_thermal_velocities("Li/Velocities", 8, 200, 2.0, 1.0, &mut rng)
        .unwrap();
    let properties = properties(&[("Li", 8, 1.0)]);
    let calculator = GreenKuboDiffusion::new(&properties, "Li")
        .unwrap()
        .with_window(Window::new(60, 5))
        .with_memory_config(exact_memory().with_minibatch_fractions(vec![0.25]));
    let whole = run_analysis(
        &calculator,
        &store,
        profile(1 << 30),
        &CancellationToken::new(),
    )
    .unwrap();
    // two atoms at a time hold all 200 configurations
    let mini = run_analysis(
        &calculator,
        &store,
        profile(48 * 200),
        &CancellationToken::new(),
    )
    .unwrap();
    assert_eq!(mini.windows, whole.windows);
    let (w, m) = (whole.estimate.unwrap(), mini.estimate.unwrap());
    assert!((m.value - w.value).abs() <= 1e-9 * w.value.abs().max(1e-12));
}

#[test]
fn green_kubo_of_constant_velocities_is_exact() {
    let mut store = InMemoryStore::new();
    let velocities = Array::from_shape_fn((5, 40, 3), |(_, _, k)| [1.0, 2.0, 2.0][k]);
    store.insert("Na/Velocities", velocities).unwrap();
    let mut experiment = experiment(store, &[("Na", 5, 1.0)], 1 << 30);
    let calculator = GreenKuboDiffusion::new(experiment.properties(), "Na")
        .unwrap()
        .with_window(Window::new(21, 4));
    let result = experiment.run(&calculator).unwrap();
    // |v|² = 9 over 20 time units, divided by 3
    let estimate = result.estimate.unwrap();
    assert!((estimate.value - 60.0).abs() < 1e-9);
    assert!(estimate.uncertainty.abs() < 1e-9);
    assert!(result.series.iter().all(|&c| (c - 9.0).abs() < 1e-12));
}

#[test]
fn random_walk_diffusion() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut store = InMemoryStore::new();
    store
        .add_random_walk("Ar/Unwrapped_Positions", 50, 2000, 1.0, &mut rng)
        .unwrap();
    let mut experiment = experiment(store, &[("Ar", 50, 0.0)], 1 << 30);
    let calculator = EinsteinDiffusion::new(experiment.properties(), "Ar")
        .unwrap()
        .with_window(Window::new(100, 10));
    let estimate = experiment.run(&calculator).unwrap().estimate.unwrap();
    // a² / (2 Δt)
    assert!(relative_difference(estimate.value, 0.5) < 0.15);
    assert!(estimate.uncertainty > 0.0);
    assert!(experiment
        .results()
        .estimate(
            DIFFUSION_COEFFICIENTS,
            "Einstein Self Diffusion Coefficients",
            ResultKind::Singular,
            "Ar"
        )
        .is_some());
}

#[test]
fn cancelled_runs_store_nothing() {
    let mut store = InMemoryStore::new();
    store
        .insert("Na/Velocities", Array3::from_elem((2, 50, 3), 1.0))
        .unwrap();
    let mut experiment = experiment(store, &[("Na", 2, 1.0)], 1 << 30);
    let calculator = GreenKuboDiffusion::new(experiment.properties(), "Na")
        .unwrap()
        .with_window(Window::new(10, 1));
    let token = experiment.cancellation_token();
    token.cancel();
    assert!(matches!(
        experiment.run(&calculator),
        Err(Error::Cancelled(_))
    ));
    assert!(experiment.results().is_empty());

    token.reset();
    assert!(experiment.run(&calculator).is_ok());
    assert!(!experiment.results().is_empty());
}

#[test]
fn failed_runs_store_nothing() {
    let mut store = InMemoryStore::new();
    store
        .insert("Na/Velocities", Array3::from_elem((2, 50, 3), 1.0))
        .unwrap();
    let mut experiment = experiment(store, &[("Na", 2, 1.0)], 1 << 30);
    let calculator = GreenKuboDiffusion::new(experiment.properties(), "Na")
        .unwrap()
        .with_window(Window::new(51, 1));
    assert!(matches!(
        experiment.run(&calculator),
        Err(Error::RangeExceeded { data_range: 51, available: 50, .. })
    ));
    assert!(experiment.results().is_empty());
}

#[test]
fn rdf_of_a_periodic_cubic_lattice() {
    // 3 x 3 x 3 sites one apart in a box of 3: six neighbours at distance 1
    let sites = Array::from_shape_fn((27, 4, 3), |(i, _, k)| ((i / [1, 3, 9][k]) % 3) as f64);
    let mut store = InMemoryStore::new();
    store.insert("Ar/Positions", sites).unwrap();
    let properties = SystemProperties::new(1.0, 1, 100.0, [3.0; 3])
        .with_species("Ar", Species::new(27, 0.0, 40.0));
    let mut experiment = Experiment::new("lattice", store, properties)
        .unwrap()
        .with_profile(profile(1 << 30));
    let rdf = RadialDistributionFunction::new(experiment.properties(), "Ar", "Ar")
        .unwrap()
        .with_bins(1.2, 2)
        .with_stride(1);
    let result = experiment.run(&rdf).unwrap();
    assert_eq!(result.windows, 3);
    assert_eq!(result.series[0], 0.0);
    let density = 27.0 * 26.0 / 2.0 / 27.0;
    let shell = 4.0 / 3.0 * std::f64::consts::PI * (1.2f64.powi(3) - 0.6f64.powi(3));
    let expected = 81.0 / (density * shell);
    assert!(relative_difference(result.series[1], expected) < 1e-9);

    let stored = experiment
        .results()
        .get(RADIAL_DISTRIBUTION_FUNCTION, "Radial Distribution Function")
        .unwrap();
    assert_eq!(stored.series["Ar-Ar"], result.series);

    // only the nearest-neighbour shell is populated
    let pmf = experiment.run_potential_of_mean_force("Ar", "Ar").unwrap();
    let thermal_energy = mdflow::constants::BOLTZMANN * 100.0 / Units::default().energy;
    let estimate = pmf.estimate.unwrap();
    assert!(relative_difference(estimate.value, -thermal_energy * expected.ln()) < 1e-9);
    assert_eq!(estimate.uncertainty, 0.0);
}

#[test]
fn nernst_einstein_from_stored_diffusion() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut store = InMemoryStore::new();
    store
        .add_random_walk("Na/Unwrapped_Positions", 10, 300, 1.0, &mut rng)
        .unwrap();
    store
        .add_random_walk("Cl/Unwrapped_Positions", 10, 300, 0.5, &mut rng)
        .unwrap();
    let mut experiment = experiment(store, &[("Na", 10, 1.0), ("Cl", 10, -1.0)], 1 << 30);

    let method = "Einstein Self Diffusion Coefficients";
    assert!(matches!(
        experiment.run_nernst_einstein(method),
        Err(Error::MissingProperty(_))
    ));
    let mut diffusion = 0.0;
    for species in ["Na", "Cl"] {
        let calculator = EinsteinDiffusion::new(experiment.properties(), species)
            .unwrap()
            .with_window(Window::new(30, 10));
        diffusion += experiment.run(&calculator).unwrap().estimate.unwrap().value;
    }
    let sigma = experiment.run_nernst_einstein(method).unwrap().estimate.unwrap();
    let prefactor = mdflow::constants::ELEMENTARY_CHARGE.powi(2)
        / (1000.0 * mdflow::constants::BOLTZMANN * 300.0);
    assert!(relative_difference(sigma.value, prefactor * 10.0 * diffusion) < 1e-9);

    let json = experiment.results().to_json().unwrap();
    let table = ResultsTable::from_json(&json).unwrap();
    let restored = table.get(DIFFUSION_COEFFICIENTS, method).unwrap();
    assert_eq!(
        restored.singular.keys().collect::<Vec<_>>(),
        vec!["Cl", "Na"]
    );
    assert!(json.contains("Nernst Einstein Ionic Conductivity"));

    let distinct_method = "Einstein Distinct Diffusion Coefficients";
    assert!(matches!(
        experiment.run_corrected_nernst_einstein(method, distinct_method),
        Err(Error::MissingProperty(_))
    ));
    // N_a N_b / N = 5 for every pair, q_a q_b = -1 only for Cl-Na
    let mut correction = 0.0;
    for (first, second, charges) in [("Cl", "Cl", 1.0), ("Cl", "Na", -1.0), ("Na", "Na", 1.0)] {
        let calculator = EinsteinDistinctDiffusion::new(experiment.properties(), first, second)
            .unwrap()
            .with_window(Window::new(30, 10));
        let distinct = experiment.run(&calculator).unwrap().estimate.unwrap();
        correction += prefactor * 5.0 * charges * distinct.value;
    }
    let corrected = experiment
        .run_corrected_nernst_einstein(method, distinct_method)
        .unwrap()
        .estimate
        .unwrap();
    let scale = sigma.value.abs() + correction.abs();
    assert!((corrected.value - sigma.value - correction).abs() < 1e-9 * scale);
}
