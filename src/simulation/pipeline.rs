//! The per-generation auto-evo run.
//!
//! Every patch goes through the same fixed sequence on its own tree, cache
//! and RNG stream:
//! - build the niche tree from the patch's energy sources
//! - populate it with residents, migrants and mutated variants
//! - derive predation niches, one trophic level at a time
//! - let every occupant search for a better version of itself
//! - turn niche energy into populations
//!
//! Patches run in parallel; the merged results are only applied to the world
//! once every patch has finished.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, trace};

use super::cache::SimulationCache;
use super::catalog::BuildingBlockCatalog;
use super::error::{AutoEvoError, Result};
use super::membrane::MembraneCatalog;
use super::miche::{MicheId, MicheTree};
use super::miche_factory;
use super::params::AutoEvoParams;
use super::part::PartCatalog;
use super::patch::{Patch, PatchId, World};
use super::pressure::SelectionPressure;
use super::results::{PatchOutcome, RunResults};
use super::search;
use super::species::{Species, SpeciesKey};

/// Shared flag that stops a run between steps.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(AutoEvoError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Read-only inputs shared by every patch of a run.
struct RunContext<'a> {
    world: &'a World,
    parts: &'a PartCatalog,
    membranes: &'a MembraneCatalog,
    params: &'a AutoEvoParams,
    cancel: &'a CancellationToken,
    seed: u64,
}

/// The seed a run uses: the configured one, or a fresh one that gets logged
/// so the run can be replayed.
pub fn resolve_seed(params: &AutoEvoParams) -> u64 {
    params.seed.unwrap_or_else(|| {
        let seed = rand::random::<u64>();
        info!(seed, "no seed configured, drew one");
        seed
    })
}

/// Seed of the RNG stream for one patch.
pub fn patch_seed(run_seed: u64, patch: PatchId) -> u64 {
    run_seed ^ u64::from(patch.0).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Runs one generation over every patch without touching `world`.
pub fn run_generation(
    world: &World,
    parts: &PartCatalog,
    membranes: &MembraneCatalog,
    params: &AutoEvoParams,
    cancel: &CancellationToken,
) -> Result<RunResults> {
    params.validate()?;
    let context = RunContext {
        world,
        parts,
        membranes,
        params,
        cancel,
        seed: resolve_seed(params),
    };

    let patches: Vec<&Patch> = world.patches.values().collect();
    let results = Mutex::new(RunResults::new());

    let run_one = |patch: &Patch| -> Result<()> {
        context.cancel.check()?;
        let outcome = run_patch(&context, patch)?;
        results
            .lock()
            .map_err(|_| AutoEvoError::InvariantViolation("run results lock poisoned".into()))?
            .merge(outcome);
        Ok(())
    };

    if params.parallel {
        patches.par_iter().try_for_each(|patch| run_one(patch))?;
    } else {
        patches.iter().try_for_each(|patch| run_one(patch))?;
    }

    cancel.check()?;
    let results = results
        .into_inner()
        .map_err(|_| AutoEvoError::InvariantViolation("run results lock poisoned".into()))?;
    info!(
        patches = patches.len(),
        species = results.records().count(),
        seed = context.seed,
        "auto-evo generation finished"
    );
    Ok(results)
}

/// Runs one generation and commits it to `world`.
pub fn run_generation_and_apply(
    world: &mut World,
    parts: &PartCatalog,
    membranes: &MembraneCatalog,
    params: &AutoEvoParams,
    cancel: &CancellationToken,
) -> Result<RunResults> {
    let results = run_generation(world, parts, membranes, params, cancel)?;
    results.apply_to_world(world)?;
    Ok(results)
}

fn run_patch(context: &RunContext<'_>, patch: &Patch) -> Result<PatchOutcome> {
    let params = context.params;
    let mut rng = SmallRng::seed_from_u64(patch_seed(context.seed, patch.id));
    let cache = SimulationCache::new(patch);
    let mut outcome = PatchOutcome::new(patch.id, &patch.name);

    // establish
    let is_player_patch = context.world.player_patch == Some(patch.id);
    let mut tree = miche_factory::establish_tree(patch, is_player_patch, params)?;

    let residents: Vec<Species> = context
        .world
        .residents(patch.id)?
        .into_iter()
        .cloned()
        .collect();
    let foreign: Vec<Species> = context
        .world
        .foreign_candidates(patch.id)?
        .into_iter()
        .cloned()
        .collect();

    // populate
    populate(context, &mut tree, &residents, &foreign, &cache, &mut rng, &mut outcome);
    context.cancel.check()?;

    // predation, one trophic level per round
    for level in 0..params.trophic_level_cap {
        let hunted = tree.hunted_prey();
        let prey: Vec<Species> = tree
            .all_occupants()
            .into_iter()
            .filter(|s| !hunted.contains(&s.key()))
            .cloned()
            .collect();
        if prey.is_empty() {
            break;
        }
        for target in &prey {
            miche_factory::add_predation_branch(&mut tree, target, params)?;
        }
        debug!(patch = %patch.name, level, prey = prey.len(), "derived predation niches");
        populate(context, &mut tree, &residents, &foreign, &cache, &mut rng, &mut outcome);
        context.cancel.check()?;
    }

    modify_existing_species(context, &mut tree, &cache, &mut rng, &mut outcome);
    context.cancel.check()?;

    tree.check_invariants()?;
    apply_populations(&tree, &residents, &mut outcome);

    info!(
        patch = %patch.name,
        niches = tree.leaves().len(),
        occupants = outcome.occupants.len(),
        extinct = outcome.extinct.len(),
        "patch auto-evo done"
    );
    Ok(outcome)
}

/// Inserts residents then migrants, then fills empty leaves with mutated
/// variants of nearby occupants, falling back to mutated migrants.
fn populate(
    context: &RunContext<'_>,
    tree: &mut MicheTree,
    residents: &[Species],
    foreign: &[Species],
    cache: &SimulationCache,
    rng: &mut SmallRng,
    outcome: &mut PatchOutcome,
) {
    for species in residents.iter().chain(foreign) {
        tree.insert_species(species, cache);
    }

    for leaf in tree.empty_leaves() {
        if tree.occupant(leaf).is_some() {
            continue;
        }
        let pressures = tree.path_pressures(leaf);
        let path: Vec<MicheId> = tree.path_to_root(leaf);

        let mut tried = BTreeSet::new();
        let mut filled = false;
        for node in path.iter().rev().skip(1) {
            let candidates: Vec<Species> = tree.occupants_in_subtree(*node).into_iter().cloned().collect();
            for base in candidates {
                if !tried.insert(base.key()) {
                    continue;
                }
                if try_fill(context, tree, leaf, &base, &pressures, cache, rng, outcome) {
                    filled = true;
                    break;
                }
            }
            if filled {
                break;
            }
        }

        if !filled {
            for base in foreign {
                if !tried.insert(base.key()) {
                    continue;
                }
                if try_fill(context, tree, leaf, base, &pressures, cache, rng, outcome) {
                    break;
                }
            }
        }

        if tree.occupant(leaf).is_none() {
            trace!(niche = %tree.name(leaf), "niche left empty");
        }
    }
}

/// Mutates `base` towards `pressures` and tries to insert the result.
/// Returns whether `leaf` ended up occupied.
#[allow(clippy::too_many_arguments)]
fn try_fill(
    context: &RunContext<'_>,
    tree: &mut MicheTree,
    leaf: MicheId,
    base: &Species,
    pressures: &[Arc<SelectionPressure>],
    cache: &SimulationCache,
    rng: &mut SmallRng,
    outcome: &mut PatchOutcome,
) -> bool {
    if base.player {
        return false;
    }
    let refs: Vec<&SelectionPressure> = pressures.iter().map(Arc::as_ref).collect();
    let variant = mutate(context, base, &refs, cache, rng);
    if tree.insert_species(&variant, cache) {
        outcome.record_ancestor(variant.key(), base.key());
    }
    tree.occupant(leaf).is_some()
}

/// Lets every occupant search for a better version of itself along each
/// path it holds, under that path plus its context pressures.
fn modify_existing_species(
    context: &RunContext<'_>,
    tree: &mut MicheTree,
    cache: &SimulationCache,
    rng: &mut SmallRng,
    outcome: &mut PatchOutcome,
) {
    let occupants: Vec<Species> = tree.all_occupants().into_iter().cloned().collect();
    for species in occupants.iter().filter(|s| !s.player) {
        let key = species.key();
        for leaf in tree.leaves_occupied_by(key) {
            let path = tree.path_pressures(leaf);
            let extra = miche_factory::context_pressures(species, tree, context.params);
            let refs: Vec<&SelectionPressure> = path
                .iter()
                .map(Arc::as_ref)
                .chain(extra.iter())
                .collect();

            let variant = mutate(context, species, &refs, cache, rng);
            if variant.key() == key {
                continue;
            }
            if tree.insert_species(&variant, cache) {
                debug!(
                    parent = %species,
                    child = %variant,
                    niche = %tree.name(leaf),
                    "species evolved"
                );
                outcome.record_ancestor(variant.key(), key);
            }
        }
    }
}

fn mutate(
    context: &RunContext<'_>,
    base: &Species,
    pressures: &[&SelectionPressure],
    cache: &SimulationCache,
    rng: &mut SmallRng,
) -> Species {
    let catalog = BuildingBlockCatalog::for_species(
        base,
        context.parts,
        context.membranes,
        context.params.part_inclusion_chance,
        rng,
    );
    let mut variant = search::best_variant(base, pressures, &catalog, cache, rng, context.params);
    if variant.key() != base.key() {
        variant.player = false;
    }
    variant
}

/// Turns niche energy into populations and marks residents without a niche
/// as extinct here. The player's species is never marked.
fn apply_populations(tree: &MicheTree, residents: &[Species], outcome: &mut PatchOutcome) {
    let mut held: BTreeSet<SpeciesKey> = BTreeSet::new();
    for occupant in tree.all_occupants() {
        let key = occupant.key();
        held.insert(key);
        outcome.record_occupant(occupant, tree.energy_for(key), tree.best_niches_for(key));
    }

    for resident in residents {
        if !resident.player && !held.contains(&resident.key()) {
            outcome.mark_extinct(resident);
        }
    }
}
