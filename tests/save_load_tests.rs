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
use std::fs;

fn create_test_world() -> World {
    let parts = PartCatalog::standard();
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
        "Shallows",
        BiomeConditions::from_pairs(&[
            (Compound::Sunlight, 1.0),
            (Compound::CarbonDioxide, 0.09),
        ]),
    ));
    world.connect(PatchId(0), PatchId(1)).unwrap();

    let layout = PartLayout::from_parts(vec![
        PlacedPart::new(parts.require("chemoSynthesizingProteins").unwrap(), Hex::ORIGIN, 0),
        PlacedPart::new(parts.require("flagellum").unwrap(), Hex::new(0, 1), 2),
    ]);
    let mut species = Species::unicellular(
        SpeciesId::default(),
        "Sulfurus",
        "primus",
        Cell::new(layout, MembraneType::single(), -0.25),
    );
    species.behaviour.fear = 250.0;
    let id = world.register_species(species);
    world.set_population(PatchId(0), id, 1200).unwrap();
    world
}

fn temp_path(dir: &tempfile::TempDir, name: &str) -> String {
    dir.path().join(name).to_string_lossy().into_owned()
}

#[test]
fn test_save_and_load_world() {
    let world = create_test_world();
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "world.json");

    world.save_to_file(&path).expect("Failed to save world");
    let loaded = World::load_from_file(&path).expect("Failed to load world");

    assert_eq!(loaded.species.len(), world.species.len());
    assert_eq!(loaded.patches.len(), world.patches.len());
    assert_eq!(loaded.next_species_id, world.next_species_id);
    for (id, original) in &world.species {
        let restored = &loaded.species[id];
        assert_eq!(restored.key(), original.key());
        assert_eq!(restored.formatted_name(), original.formatted_name());
        assert_eq!(restored.behaviour.fear, 250.0);
    }
    let vent = loaded.patch(PatchId(0)).unwrap();
    assert_eq!(vent.population_of(SpeciesId(0)), 1200);
    assert!(vent.adjacent.contains(&PatchId(1)));
    assert_eq!(vent.biome.amount(Compound::HydrogenSulfide), 10000.0);
}

#[test]
fn test_save_creates_valid_json() {
    let world = create_test_world();
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "world.json");

    world.save_to_file(&path).expect("Failed to save");

    let json_content = fs::read_to_string(&path).expect("Failed to read save file");
    let parsed: serde_json::Value = serde_json::from_str(&json_content).expect("Invalid JSON");

    assert!(parsed.get("species").is_some());
    assert!(parsed.get("patches").is_some());
    assert!(parsed.get("ancestors").is_some());
    assert!(parsed.get("next_species_id").is_some());
}

#[test]
fn test_load_nonexistent_file() {
    let result = World::load_from_file("nonexistent_world.json");
    assert!(matches!(result, Err(AutoEvoError::Io(_))));
}

#[test]
fn test_load_invalid_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "broken.json");
    fs::write(&path, "{ this is not valid json }").expect("Failed to write test file");

    let result = World::load_from_file(&path);
    assert!(matches!(result, Err(AutoEvoError::Json(_))));
}

#[test]
fn test_params_round_trip_and_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "params.json");
    let params = AutoEvoParams {
        seed: Some(99),
        trophic_level_cap: 2,
        ..AutoEvoParams::default()
    };

    params.save_to_file(&path).unwrap();
    assert_eq!(AutoEvoParams::load_from_file(&path).unwrap(), params);

    // missing fields fall back to defaults
    fs::write(&path, r#"{ "seed": 5 }"#).unwrap();
    let partial = AutoEvoParams::load_from_file(&path).unwrap();
    assert_eq!(partial.seed, Some(5));
    assert_eq!(partial.autotroph_energy, 40000);
    assert_eq!(partial.metabolic_stability_energy, 1000);
}

#[test]
fn test_params_reject_out_of_range_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "params.json");
    fs::write(&path, r#"{ "part_inclusion_chance": 1.5 }"#).unwrap();

    let result = AutoEvoParams::load_from_file(&path);
    assert!(matches!(result, Err(AutoEvoError::InvalidConfig(_))));

    let negative = AutoEvoParams {
        predation_energy: -1,
        ..AutoEvoParams::default()
    };
    assert!(negative.validate().is_err());
    assert!(AutoEvoParams::default().validate().is_ok());
}

#[test]
fn test_load_and_continue_evolution() {
    let parts = PartCatalog::standard();
    let membranes = MembraneCatalog::standard();
    let params = AutoEvoParams {
        seed: Some(11),
        parallel: false,
        ..AutoEvoParams::default()
    };
    let mut world = create_test_world();
    let cancel = CancellationToken::new();
    pipeline::run_generation_and_apply(&mut world, &parts, &membranes, &params, &cancel).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "continue.json");
    world.save_to_file(&path).unwrap();
    let mut loaded = World::load_from_file(&path).unwrap();

    let a = pipeline::run_generation_and_apply(&mut world, &parts, &membranes, &params, &cancel)
        .unwrap();
    let b = pipeline::run_generation_and_apply(&mut loaded, &parts, &membranes, &params, &cancel)
        .unwrap();
    assert_eq!(a.summary(), b.summary());
    assert_eq!(world.next_species_id, loaded.next_species_id);
}
