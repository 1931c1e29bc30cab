#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use autoevo::simulation::cache::SimulationCache;
use autoevo::simulation::compound::Compound;
use autoevo::simulation::hex::Hex;
use autoevo::simulation::layout::{PartLayout, PlacedPart};
use autoevo::simulation::membrane::MembraneType;
use autoevo::simulation::miche::{MicheId, MicheTree};
use autoevo::simulation::miche_factory;
use autoevo::simulation::params::AutoEvoParams;
use autoevo::simulation::part::PartCatalog;
use autoevo::simulation::patch::{BiomeConditions, Patch, PatchId};
use autoevo::simulation::pressure::{self, INVIABLE_SCORE, SelectionPressure};
use autoevo::simulation::species::{Cell, Species, SpeciesId};

fn create_test_species(id: u64, placements: &[(&str, Hex)]) -> Species {
    let parts = PartCatalog::standard();
    let placed = placements
        .iter()
        .map(|(name, hex)| PlacedPart::new(parts.require(name).unwrap(), *hex, 0))
        .collect();
    Species::unicellular(
        SpeciesId(id),
        "Testus",
        "specius",
        Cell::new(PartLayout::from_parts(placed), MembraneType::single(), 0.0),
    )
}

fn create_test_cache() -> SimulationCache {
    SimulationCache::for_biome(
        PatchId(0),
        BiomeConditions::from_pairs(&[
            (Compound::Glucose, 5000.0),
            (Compound::Oxygen, 0.2),
            (Compound::CarbonDioxide, 0.1),
            (Compound::Sunlight, 1.0),
        ]),
    )
}

fn swimmer(id: u64) -> Species {
    create_test_species(id, &[("cytoplasm", Hex::ORIGIN), ("flagellum", Hex::new(0, 1))])
}

#[test]
fn test_losing_the_flagellum_loses_the_reach_niche() {
    let params = AutoEvoParams::default();
    let cache = create_test_cache();
    let original = swimmer(1);
    assert!(cache.base_speed(&original) > 0.0);

    let mut stripped = original.clone();
    if let Some(cell) = stripped.cell_mut() {
        let index = cell
            .layout
            .iter()
            .position(|p| p.part.name == "flagellum")
            .unwrap();
        cell.layout.remove_at(index);
    }
    assert_eq!(cache.base_speed(&stripped), 0.0);

    let reach = SelectionPressure::reach_compound_cloud(&params);
    assert_eq!(reach.score(&stripped, &cache), 0.0);

    let mut tree = MicheTree::new("Root", SelectionPressure::no_op());
    let leaf = tree
        .add_child(tree.root(), "Reach glucose", reach)
        .unwrap();

    assert!(!tree.insert_species(&stripped, &cache));
    assert!(tree.occupant(leaf).is_none());

    assert!(tree.insert_species(&original, &cache));
    assert_eq!(tree.occupant(leaf).map(Species::key), Some(original.key()));
}

#[test]
fn test_zero_score_is_always_inviable() {
    let params = AutoEvoParams::default();
    let cache = create_test_cache();
    let still = create_test_species(1, &[("cytoplasm", Hex::ORIGIN)]);
    let moving = swimmer(2);
    let reach = SelectionPressure::reach_compound_cloud(&params);

    assert_eq!(reach.weighted_compare(&still, &moving, &cache), INVIABLE_SCORE);
    assert_eq!(reach.weighted_compare(&still, &still, &cache), INVIABLE_SCORE);
    assert!(reach.weighted_compare(&moving, &still, &cache) > 0.0);
}

#[test]
fn test_circular_predation_cancels_weaker_hunter() {
    let cache = create_test_cache();
    // a lone pilus against a three hex blob that can engulf it
    let small = create_test_species(1, &[("pilus", Hex::ORIGIN)]);
    let large = create_test_species(
        2,
        &[
            ("cytoplasm", Hex::ORIGIN),
            ("cytoplasm", Hex::new(0, 1)),
            ("cytoplasm", Hex::new(1, 0)),
        ],
    );

    let forward = pressure::raw_predation_score(&small, &large, &cache).unwrap();
    let reverse = pressure::raw_predation_score(&large, &small, &cache).unwrap();
    assert!(forward > 0.0);
    assert!(reverse > forward);

    assert_eq!(
        pressure::predation_effectiveness(&small, &large, &cache).unwrap(),
        0.0
    );
    assert_eq!(
        pressure::predation_effectiveness(&large, &small, &cache).unwrap(),
        reverse
    );
    assert_eq!(pressure::apply_circular_predation_rule(5.0, 8.0), 0.0);
}

#[test]
fn test_same_lineage_never_preys_on_itself() {
    let cache = create_test_cache();
    let a = create_test_species(4, &[("cytoplasm", Hex::ORIGIN)]);
    let b = create_test_species(
        4,
        &[
            ("cytoplasm", Hex::ORIGIN),
            ("cytoplasm", Hex::new(0, 1)),
            ("pilus", Hex::new(1, 0)),
        ],
    );
    assert_eq!(pressure::raw_predation_score(&b, &a, &cache).unwrap(), 0.0);
}

#[test]
fn test_occupants_only_sit_on_leaves() {
    let params = AutoEvoParams::default();
    let mut patch = Patch::new(
        PatchId(0),
        "Surface",
        BiomeConditions::from_pairs(&[
            (Compound::Glucose, 5000.0),
            (Compound::Oxygen, 0.2),
            (Compound::CarbonDioxide, 0.1),
            (Compound::Sunlight, 1.0),
        ]),
    );
    patch.populations.insert(SpeciesId(1), 10);
    let cache = SimulationCache::new(&patch);
    let mut tree = miche_factory::establish_tree(&patch, false, &params).unwrap();

    let grazer = create_test_species(
        1,
        &[("cytoplasm", Hex::ORIGIN), ("thylakoids", Hex::new(0, 1))],
    );
    tree.insert_species(&grazer, &cache);
    tree.insert_species(&swimmer(2), &cache);
    miche_factory::add_predation_branch(&mut tree, &grazer, &params).unwrap();

    tree.check_invariants().unwrap();
    for id in (0..tree.len()).map(MicheId) {
        if tree.occupant(id).is_some() {
            assert!(tree.children(id).is_empty());
        }
    }

    let occupied = tree.leaves().into_iter().find(|l| tree.occupant(*l).is_some()).unwrap();
    assert!(tree.add_child(occupied, "too late", SelectionPressure::no_op()).is_err());
}

#[test]
fn test_incumbent_kept_on_tie() {
    let params = AutoEvoParams::default();
    let cache = create_test_cache();
    let first = swimmer(1);
    let twin = swimmer(2);

    let mut tree = MicheTree::new("Root", SelectionPressure::no_op());
    let leaf = tree
        .add_child(
            tree.root(),
            "Reach glucose",
            SelectionPressure::reach_compound_cloud(&params),
        )
        .unwrap();

    assert!(tree.insert_species(&first, &cache));
    assert!(!tree.insert_species(&twin, &cache));
    assert_eq!(tree.occupant(leaf).map(|s| s.id), Some(SpeciesId(1)));
}

#[test]
fn test_strictly_better_candidate_displaces_incumbent() {
    let params = AutoEvoParams::default();
    let cache = create_test_cache();
    let slow = swimmer(1);
    let fast = create_test_species(
        2,
        &[
            ("cytoplasm", Hex::ORIGIN),
            ("flagellum", Hex::new(0, 1)),
            ("flagellum", Hex::new(1, 0)),
        ],
    );
    assert!(cache.base_speed(&fast) > cache.base_speed(&slow));

    let mut tree = MicheTree::new("Root", SelectionPressure::no_op());
    let leaf = tree
        .add_child(
            tree.root(),
            "Reach glucose",
            SelectionPressure::reach_compound_cloud(&params),
        )
        .unwrap();

    assert!(tree.insert_species(&slow, &cache));
    assert!(tree.insert_species(&fast, &cache));
    assert_eq!(tree.occupant(leaf).map(|s| s.id), Some(SpeciesId(2)));

    // the displaced species cannot win the leaf back
    assert!(!tree.insert_species(&slow, &cache));
    assert_eq!(tree.occupant(leaf).map(|s| s.id), Some(SpeciesId(2)));
}

#[test]
fn test_predation_branch_names_its_prey() {
    let params = AutoEvoParams::default();
    let prey = create_test_species(3, &[("cytoplasm", Hex::ORIGIN)]);
    let mut tree = MicheTree::new("Root", SelectionPressure::no_op());
    let branch = miche_factory::add_predation_branch(&mut tree, &prey, &params).unwrap();

    assert_eq!(tree.name(branch), "Predation Effectiveness against Testus specius");
    assert_eq!(tree.children(branch).len(), 1);
    assert!(tree.hunted_prey().contains(&prey.key()));
}
