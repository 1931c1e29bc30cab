//! Builders for the standard niche branches and context pressures.

use tracing::debug;

use super::compound::Compound;
use super::error::Result;
use super::miche::{MicheId, MicheTree};
use super::params::AutoEvoParams;
use super::patch::Patch;
use super::pressure::SelectionPressure;
use super::species::Species;

const DONT_STARVE: &str = "and don't starve";

/// Builds the root, the optional player niche and one branch per ambient
/// energy source found in `patch`.
pub fn establish_tree(patch: &Patch, player_patch: bool, params: &AutoEvoParams) -> Result<MicheTree> {
    let mut tree = MicheTree::new("Root", SelectionPressure::no_op());
    let root = tree.root();

    if player_patch {
        tree.add_child(root, "Be the player", SelectionPressure::be_player(params))?;
    }

    add_autotrophic_branches(&mut tree, root, patch, params)?;

    debug!(patch = %patch.name, nodes = tree.len(), "established niche tree");
    Ok(tree)
}

/// Adds source branches for glucose, hydrogen sulfide, sunlight and iron,
/// each ending in a "don't starve" leaf.
pub fn add_autotrophic_branches(
    tree: &mut MicheTree,
    root: MicheId,
    patch: &Patch,
    params: &AutoEvoParams,
) -> Result<()> {
    let biome = &patch.biome;

    if biome.has(Compound::Glucose) {
        let source = tree.add_child(
            root,
            "Glucose Consumption",
            SelectionPressure::reach_compound_cloud(params),
        )?;
        add_dont_starve(tree, source, params)?;
    }

    if biome.has(Compound::HydrogenSulfide) {
        let source = tree.add_child(
            root,
            "Hydrogen Sulfide Chemosynthesis",
            SelectionPressure::autotroph(Compound::HydrogenSulfide, params),
        )?;
        add_dont_starve(tree, source, params)?;
    }

    if biome.has(Compound::Sunlight) {
        let source = tree.add_child(
            root,
            "Photosynthesis",
            SelectionPressure::autotroph(Compound::Sunlight, params),
        )?;
        let storage = tree.add_child(
            source,
            "and store energy for night",
            SelectionPressure::store_glucose(params),
        )?;
        add_dont_starve(tree, storage, params)?;
        add_dont_starve(tree, source, params)?;
    }

    if biome.has(Compound::Iron) {
        let source = tree.add_child(
            root,
            "Iron Chemosynthesis",
            SelectionPressure::autotroph(Compound::Iron, params),
        )?;
        add_dont_starve(tree, source, params)?;
    }

    Ok(())
}

/// Adds a "hunt `prey`" branch under the root with its "don't starve" leaf.
pub fn add_predation_branch(tree: &mut MicheTree, prey: &Species, params: &AutoEvoParams) -> Result<MicheId> {
    let pressure = SelectionPressure::predation(prey, params);
    let name = pressure.name();
    let root = tree.root();
    let branch = tree.add_child(root, &name, pressure)?;
    add_dont_starve(tree, branch, params)?;
    Ok(branch)
}

fn add_dont_starve(tree: &mut MicheTree, parent: MicheId, params: &AutoEvoParams) -> Result<MicheId> {
    tree.add_child(parent, DONT_STARVE, SelectionPressure::metabolic_stability(params))
}

/// Pressures a species faces in a patch on top of its niche path:
/// osmoregulation, plus escaping every predator that now hunts it.
pub fn context_pressures(
    species: &Species,
    tree: &MicheTree,
    params: &AutoEvoParams,
) -> Vec<SelectionPressure> {
    let mut pressures = vec![SelectionPressure::osmoregulation(params)];
    for predator in tree.predators_of(species.key()) {
        if predator.id != species.id {
            pressures.push(SelectionPressure::avoid_predation(predator, params));
        }
    }
    pressures
}
