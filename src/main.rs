use autoevo::simulation::compound::Compound;
use autoevo::simulation::error::Result;
use autoevo::simulation::hex::Hex;
use autoevo::simulation::layout::{PartLayout, PlacedPart};
use autoevo::simulation::membrane::{MembraneCatalog, MembraneType};
use autoevo::simulation::params::AutoEvoParams;
use autoevo::simulation::part::PartCatalog;
use autoevo::simulation::patch::{BiomeConditions, Patch, PatchId, World};
use autoevo::simulation::pipeline::{self, CancellationToken};
use autoevo::simulation::species::{Cell, Species, SpeciesId};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Runs auto-evo generations over a small demo world.
#[derive(Debug, Parser)]
#[command(name = "autoevo", version, about)]
struct Args {
    /// JSON parameter file; defaults are used when absent.
    #[arg(long)]
    config: Option<String>,
    /// Run seed, overriding the parameter file.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of generations to run.
    #[arg(long, default_value_t = 3)]
    generations: u32,
    /// Process patches one after another instead of in parallel.
    #[arg(long)]
    sequential: bool,
    /// Write the final world to this JSON file.
    #[arg(long)]
    save: Option<String>,
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut params = match &args.config {
        Some(path) => AutoEvoParams::load_from_file(path)?,
        None => AutoEvoParams::default(),
    };
    if args.seed.is_some() {
        params.seed = args.seed;
    }
    if args.sequential {
        params.parallel = false;
    }
    params.validate()?;

    let parts = PartCatalog::standard();
    let membranes = MembraneCatalog::standard();
    let mut world = demo_world(&parts)?;
    let cancel = CancellationToken::new();

    info!("Starting auto-evo over {} patches", world.patches.len());

    for generation in 1..=args.generations {
        // each generation gets its own stream when a seed is pinned
        let mut generation_params = params.clone();
        generation_params.seed = params.seed.map(|seed| seed.wrapping_add(u64::from(generation)));

        let results = pipeline::run_generation_and_apply(
            &mut world,
            &parts,
            &membranes,
            &generation_params,
            &cancel,
        )?;

        info!(generation, species = world.species.len(), "generation committed");
        for line in results.summary() {
            info!("  {line}");
        }
    }

    if let Some(path) = &args.save {
        world.save_to_file(path)?;
        info!(path, "saved world");
    }

    Ok(())
}

fn demo_world(parts: &PartCatalog) -> Result<World> {
    let mut world = World::new();

    world.add_patch(Patch::new(
        PatchId(0),
        "Hydrothermal Vent",
        BiomeConditions::from_pairs(&[
            (Compound::HydrogenSulfide, 20000.0),
            (Compound::CarbonDioxide, 0.1),
            (Compound::Oxygen, 0.01),
        ]),
    ));
    world.add_patch(Patch::new(
        PatchId(1),
        "Epipelagic",
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
            (Compound::Iron, 8000.0),
            (Compound::Sunlight, 1.0),
            (Compound::CarbonDioxide, 0.09),
            (Compound::Oxygen, 0.15),
            (Compound::Glucose, 2000.0),
        ]),
    ));
    world.connect(PatchId(0), PatchId(1))?;
    world.connect(PatchId(1), PatchId(2))?;

    let cytoplasm = parts.require("cytoplasm")?;
    let chemo = parts.require("chemoSynthesizingProteins")?;
    let thylakoids = parts.require("thylakoids")?;

    let vent_dweller = Cell::new(
        PartLayout::from_parts(vec![
            PlacedPart::new(chemo, Hex::ORIGIN, 0),
            PlacedPart::new(cytoplasm.clone(), Hex::new(0, 1), 0),
        ]),
        MembraneType::single(),
        0.0,
    );
    let grazer = Cell::new(
        PartLayout::from_parts(vec![
            PlacedPart::new(cytoplasm.clone(), Hex::ORIGIN, 0),
            PlacedPart::new(thylakoids, Hex::new(0, 1), 0),
        ]),
        MembraneType::single(),
        0.0,
    );
    let player = Cell::new(
        PartLayout::from_parts(vec![PlacedPart::new(cytoplasm, Hex::ORIGIN, 0)]),
        MembraneType::single(),
        0.0,
    );

    let vent = world.register_species(Species::unicellular(
        SpeciesId::default(),
        "Sulfurus",
        "primus",
        vent_dweller,
    ));
    let green = world.register_species(Species::unicellular(
        SpeciesId::default(),
        "Viridis",
        "lucens",
        grazer,
    ));
    let mut primum = Species::unicellular(SpeciesId::default(), "Primum", "thrivium", player);
    primum.player = true;
    let player_id = world.register_species(primum);

    world.set_population(PatchId(0), vent, 500)?;
    world.set_population(PatchId(1), green, 500)?;
    world.set_population(PatchId(2), green, 200)?;
    world.set_population(PatchId(1), player_id, 100)?;
    world.player_patch = Some(PatchId(1));

    Ok(world)
}
