#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use autoevo::simulation::compound::Compound;
use autoevo::simulation::error::AutoEvoError;
use autoevo::simulation::hex::Hex;
use autoevo::simulation::layout::{PartLayout, PlacedPart};
use autoevo::simulation::membrane::{MembraneCatalog, MembraneType};
use autoevo::simulation::params::AutoEvoParams;
use autoevo::simulation::part::PartCatalog;
use autoevo::simulation::patch::{BiomeConditions, Patch, PatchId, World};
use autoevo::simulation::pipeline::{self, CancellationToken};
use autoevo::simulation::species::{Cell, Species, SpeciesId};

fn create_test_params() -> AutoEvoParams {
    AutoEvoParams {
        seed: Some(1234),
        parallel: false,
        ..AutoEvoParams::default()
    }
}

fn create_test_species(parts: &PartCatalog, names: &[&str], genus: &str) -> Species {
    let placed = names
        .iter()
        .enumerate()
        .map(|(i, name)| PlacedPart::new(parts.require(name).unwrap(), Hex::new(0, i as i32), 0))
        .collect();
    Species::unicellular(
        SpeciesId::default(),
        genus,
        "testus",
        Cell::new(PartLayout::from_parts(placed), MembraneType::single(), 0.0),
    )
}

fn create_vent_world(parts: &PartCatalog) -> (World, SpeciesId) {
    let mut world = World::new();
    world.add_patch(Patch::new(
        PatchId(0),
        "Vent",
        BiomeConditions::from_pairs(&[
            (Compound::HydrogenSulfide, 10000.0),
            (Compound::CarbonDioxide, 0.1),
        ]),
    ));
    let id = world.register_species(create_test_species(
        parts,
        &["chemoSynthesizingProteins"],
        "Sulfurus",
    ));
    world.set_population(PatchId(0), id, 300).unwrap();
    (world, id)
}

fn create_demo_world(parts: &PartCatalog) -> World {
    let mut world = World::new();
    world.add_patch(Patch::new(
        PatchId(0),
        "Vent",
        BiomeConditions::from_pairs(&[
            (Compound::HydrogenSulfide, 10000.0),
            (Compound::CarbonDioxide, 0.1),
        ]),
    ));
    world.add_patch(Patch::new(
        PatchId(1),
        "Surface",
        BiomeConditions::from_pairs(&[
            (Compound::Sunlight, 1.0),
            (Compound::CarbonDioxide, 0.09),
            (Compound::Oxygen, 0.2),
            (Compound::Glucose, 5000.0),
        ]),
    ));
    world.add_patch(Patch::new(
        PatchId(2),
        "Tidepool",
        BiomeConditions::from_pairs(&[
            (Compound::Iron, 5000.0),
            (Compound::Sunlight, 1.0),
            (Compound::CarbonDioxide, 0.09),
        ]),
    ));
    world.connect(PatchId(0), PatchId(1)).unwrap();
    world.connect(PatchId(1), PatchId(2)).unwrap();

    let vent = world.register_species(create_test_species(
        parts,
        &["chemoSynthesizingProteins", "cytoplasm"],
        "Sulfurus",
    ));
    let green = world.register_species(create_test_species(
        parts,
        &["cytoplasm", "thylakoids"],
        "Viridis",
    ));
    let mut player = create_test_species(parts, &["cytoplasm"], "Primum");
    player.player = true;
    let player = world.register_species(player);

    world.set_population(PatchId(0), vent, 500).unwrap();
    world.set_population(PatchId(1), green, 500).unwrap();
    world.set_population(PatchId(2), green, 100).unwrap();
    world.set_population(PatchId(1), player, 80).unwrap();
    world.player_patch = Some(PatchId(1));
    world
}

#[test]
fn test_lone_chemosynthesizer_fills_dont_starve_niche() {
    let parts = PartCatalog::standard();
    let membranes = MembraneCatalog::standard();
    let (mut world, id) = create_vent_world(&parts);
    let params = AutoEvoParams {
        part_inclusion_chance: 0.0,
        ..create_test_params()
    };
    let key = world.species(id).unwrap().key();

    let results = pipeline::run_generation(
        &world,
        &parts,
        &membranes,
        &params,
        &CancellationToken::new(),
    )
    .unwrap();

    let expected = params.autotroph_energy + params.metabolic_stability_energy;
    assert_eq!(expected, 41000);
    assert_eq!(results.population(key, PatchId(0)), expected);

    let niches = results.best_niches(key, PatchId(0));
    assert_eq!(niches.len(), 1);
    assert_eq!(
        niches[0],
        vec![
            "Hydrogen Sulfide Energy Efficiency".to_string(),
            "Metabolic Stability".to_string()
        ]
    );
    assert!(results.extinct_in(PatchId(0)).is_empty());

    results.apply_to_world(&mut world).unwrap();
    assert_eq!(world.patch(PatchId(0)).unwrap().population_of(id), 41000);
    assert_eq!(world.species.len(), 1);
}

#[test]
fn test_same_seed_gives_same_results() {
    let parts = PartCatalog::standard();
    let membranes = MembraneCatalog::standard();
    let world = create_demo_world(&parts);
    let params = create_test_params();

    let cancel = CancellationToken::new();
    let first = pipeline::run_generation(&world, &parts, &membranes, &params, &cancel).unwrap();
    let second = pipeline::run_generation(&world, &parts, &membranes, &params, &cancel).unwrap();

    assert_eq!(first.summary(), second.summary());
}

#[test]
fn test_parallel_matches_sequential() {
    let parts = PartCatalog::standard();
    let membranes = MembraneCatalog::standard();
    let world = create_demo_world(&parts);
    let sequential = create_test_params();
    let parallel = AutoEvoParams {
        parallel: true,
        ..sequential.clone()
    };

    let cancel = CancellationToken::new();
    let a = pipeline::run_generation(&world, &parts, &membranes, &sequential, &cancel).unwrap();
    let b = pipeline::run_generation(&world, &parts, &membranes, &parallel, &cancel).unwrap();

    assert_eq!(a.summary(), b.summary());
}

#[test]
fn test_cancelled_run_leaves_world_untouched() {
    let parts = PartCatalog::standard();
    let membranes = MembraneCatalog::standard();
    let mut world = create_demo_world(&parts);
    let before = serde_json::to_string(&world).unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = pipeline::run_generation_and_apply(
        &mut world,
        &parts,
        &membranes,
        &create_test_params(),
        &cancel,
    );

    assert!(matches!(result, Err(AutoEvoError::Cancelled)));
    assert_eq!(serde_json::to_string(&world).unwrap(), before);
}

#[test]
fn test_invalid_params_are_rejected_before_running() {
    let parts = PartCatalog::standard();
    let membranes = MembraneCatalog::standard();
    let world = create_demo_world(&parts);
    let params = AutoEvoParams {
        max_viable_variants: 0,
        ..create_test_params()
    };

    let result = pipeline::run_generation(
        &world,
        &parts,
        &membranes,
        &params,
        &CancellationToken::new(),
    );
    assert!(matches!(result, Err(AutoEvoError::InvalidConfig(_))));
}

#[test]
fn test_player_survives_and_keeps_its_niche() {
    let parts = PartCatalog::standard();
    let membranes = MembraneCatalog::standard();
    let mut world = create_demo_world(&parts);
    let player_id = world.player_species().unwrap().id;
    let player_key = world.player_species().unwrap().key();
    let params = create_test_params();

    let results = pipeline::run_generation_and_apply(
        &mut world,
        &parts,
        &membranes,
        &params,
        &CancellationToken::new(),
    )
    .unwrap();

    assert!(world.species.contains_key(&player_id));
    assert!(world.species[&player_id].player);
    assert!(!results.extinct_in(PatchId(1)).contains(&player_id));
    assert!(
        results
            .best_niches(player_key, PatchId(1))
            .iter()
            .any(|path| path.first().map(String::as_str) == Some("Be the player"))
    );
    assert!(world.patch(PatchId(1)).unwrap().population_of(player_id) >= params.be_player_energy);
    assert_eq!(world.species.values().filter(|s| s.player).count(), 1);
}

#[test]
fn test_commit_registers_new_species_with_ancestry() {
    let parts = PartCatalog::standard();
    let membranes = MembraneCatalog::standard();
    let mut world = create_demo_world(&parts);
    let original_ids: Vec<SpeciesId> = world.species.keys().copied().collect();
    let params = create_test_params();

    let results = pipeline::run_generation(
        &world,
        &parts,
        &membranes,
        &params,
        &CancellationToken::new(),
    )
    .unwrap();
    let new_count = results.new_species(&world).count();
    let ids = results.apply_to_world(&mut world).unwrap();

    assert_eq!(ids.len(), results.records().count());
    assert_eq!(world.ancestors.len(), new_count);
    for (child, parent) in &world.ancestors {
        assert!(!original_ids.contains(child));
        assert!(original_ids.contains(parent) || ids.values().any(|id| id == parent));
    }
    for (key, id) in &ids {
        let species = world.species(*id).unwrap();
        assert_eq!(species.fingerprint(), key.fingerprint);
        assert!(species.is_structurally_valid());
        assert!(world.total_population(*id) > 0);
    }
}

#[test]
fn test_species_without_niche_goes_extinct() {
    let parts = PartCatalog::standard();
    let membranes = MembraneCatalog::standard();
    let (mut world, _) = create_vent_world(&parts);
    // a pilus alone harvests nothing in a vent
    let stranded = world.register_species(create_test_species(&parts, &["pilus"], "Errans"));
    world.set_population(PatchId(0), stranded, 50).unwrap();
    let params = AutoEvoParams {
        part_inclusion_chance: 0.0,
        trophic_level_cap: 0,
        ..create_test_params()
    };

    let results = pipeline::run_generation_and_apply(
        &mut world,
        &parts,
        &membranes,
        &params,
        &CancellationToken::new(),
    )
    .unwrap();

    assert_eq!(results.extinct_in(PatchId(0)), vec![stranded]);
    assert!(!world.species.contains_key(&stranded));
    assert!(
        results
            .summary()
            .iter()
            .any(|line| line.contains("went extinct in Vent"))
    );
}
