//! Mutation strategies: generators of structurally altered candidates.
//!
//! Every strategy clones its input and edits the clone. A strategy that has
//! nothing legal to do returns an empty list; that is never an error.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

use super::catalog::BuildingBlockCatalog;
use super::compound::Compound;
use super::membrane::{MAX_RIGIDITY, MIN_RIGIDITY, MembraneType};
use super::params::AutoEvoParams;
use super::part::PartDefinition;
use super::species::{BehaviorAttribute, Species};

/// Selects which catalog parts an add-part strategy may use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PartFilter {
    /// Exactly the part with this name.
    Named(String),
    /// Parts at most this expensive.
    MaxMpCost(f32),
    /// Parts storing at least this much.
    MinStorage(f32),
    /// Parts running a process that consumes this compound.
    ConsumesCompound(Compound),
}

impl PartFilter {
    /// Whether `part` passes the filter.
    pub fn matches(&self, part: &PartDefinition) -> bool {
        match self {
            PartFilter::Named(name) => part.name == *name,
            PartFilter::MaxMpCost(cost) => part.mp_cost <= *cost,
            PartFilter::MinStorage(storage) => part.storage >= *storage,
            PartFilter::ConsumesCompound(compound) => part.consumes(*compound),
        }
    }
}

impl fmt::Display for PartFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartFilter::Named(name) => write!(f, "{name}"),
            PartFilter::MaxMpCost(cost) => write!(f, "part costing <= {cost} MP"),
            PartFilter::MinStorage(storage) => write!(f, "part storing >= {storage}"),
            PartFilter::ConsumesCompound(compound) => write!(f, "{compound} consumer"),
        }
    }
}

/// Which extreme a rigidity change moves towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RigidityDirection {
    /// Towards -1: faster, softer.
    Lower,
    /// Towards +1: slower, tougher.
    Raise,
}

impl RigidityDirection {
    fn target(self) -> f32 {
        match self {
            RigidityDirection::Lower => MIN_RIGIDITY,
            RigidityDirection::Raise => MAX_RIGIDITY,
        }
    }
}

/// The mutation moves available to selection pressures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MutationStrategy {
    /// One variant per matching catalog part, each with that part added.
    AddPart(PartFilter),
    /// Adds one part per filter in sequence, branching on every match.
    AddMultipleParts(Vec<PartFilter>),
    /// Removes one random part, then reattaches any islands.
    RemovePart,
    /// Moves rigidity halfway towards an extreme.
    AdjustRigidity(RigidityDirection),
    /// Swaps the membrane kind, if the catalog offers it this generation.
    ChangeMembrane(MembraneType),
    /// Adds a signed random delta to one behaviour scalar.
    AdjustBehavior {
        /// Scalar to change.
        attribute: BehaviorAttribute,
        /// Largest absolute change.
        max_delta: f32,
    },
}

impl MutationStrategy {
    /// Produces zero or more mutated clones of `species`.
    ///
    /// Colonies are not mutated structurally and always yield nothing.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        species: &Species,
        catalog: &BuildingBlockCatalog,
        rng: &mut R,
        params: &AutoEvoParams,
    ) -> Vec<Species> {
        if species.cell().is_none() {
            return Vec::new();
        }

        let variants = match self {
            MutationStrategy::AddPart(filter) => add_part(species, filter, catalog, rng, params),
            MutationStrategy::AddMultipleParts(filters) => {
                let mut current = vec![species.clone()];
                for filter in filters {
                    current = current
                        .iter()
                        .flat_map(|s| add_part(s, filter, catalog, rng, params))
                        .collect();
                }
                current
            }
            MutationStrategy::RemovePart => remove_part(species, rng).into_iter().collect(),
            MutationStrategy::AdjustRigidity(direction) => {
                adjust_rigidity(species, *direction, params.rigidity_snap_epsilon)
                    .into_iter()
                    .collect()
            }
            MutationStrategy::ChangeMembrane(membrane) => {
                change_membrane(species, membrane, catalog)
                    .into_iter()
                    .collect()
            }
            MutationStrategy::AdjustBehavior {
                attribute,
                max_delta,
            } => adjust_behavior(species, *attribute, *max_delta, rng)
                .into_iter()
                .collect(),
        };

        trace!(strategy = %self, produced = variants.len(), "applied mutation strategy");
        variants
    }
}

impl fmt::Display for MutationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationStrategy::AddPart(filter) => write!(f, "add {filter}"),
            MutationStrategy::AddMultipleParts(filters) => {
                let names: Vec<String> = filters.iter().map(ToString::to_string).collect();
                write!(f, "add {}", names.join(" + "))
            }
            MutationStrategy::RemovePart => write!(f, "remove a part"),
            MutationStrategy::AdjustRigidity(RigidityDirection::Lower) => {
                write!(f, "lower rigidity")
            }
            MutationStrategy::AdjustRigidity(RigidityDirection::Raise) => {
                write!(f, "raise rigidity")
            }
            MutationStrategy::ChangeMembrane(membrane) => {
                write!(f, "switch to {} membrane", membrane.name)
            }
            MutationStrategy::AdjustBehavior { attribute, .. } => {
                write!(f, "adjust {attribute:?}")
            }
        }
    }
}

fn add_part<R: Rng + ?Sized>(
    species: &Species,
    filter: &PartFilter,
    catalog: &BuildingBlockCatalog,
    rng: &mut R,
    params: &AutoEvoParams,
) -> Vec<Species> {
    let Some(cell) = species.cell() else {
        return Vec::new();
    };

    let mut variants = Vec::new();
    for part in catalog.parts().iter().filter(|p| filter.matches(p)) {
        if part.requires_nucleus && !cell.layout.has_nucleus() {
            continue;
        }

        let Some(placed) = cell
            .layout
            .find_realistic_position(part, rng, params.placement_radius)
        else {
            trace!(part = %part.name, "no room for part");
            continue;
        };

        let mut variant = species.clone();
        if let Some(cell) = variant.cell_mut() {
            cell.layout.add(placed);
        }
        variants.push(variant);
    }
    variants
}

fn remove_part<R: Rng + ?Sized>(species: &Species, rng: &mut R) -> Option<Species> {
    let cell = species.cell()?;
    if cell.layout.len() <= 1 {
        return None;
    }

    let index = rng.random_range(0..cell.layout.len());
    let mut variant = species.clone();
    let cell = variant.cell_mut()?;
    cell.layout.remove_at(index);
    cell.layout.attach_island_hexes();

    (cell.layout.is_connected() && cell.layout.is_on_grid()).then_some(variant)
}

fn adjust_rigidity(species: &Species, direction: RigidityDirection, epsilon: f32) -> Option<Species> {
    let current = species.cell()?.rigidity;
    let target = direction.target();

    let mut next = (current + target) / 2.0;
    if (target - next).abs() < epsilon {
        next = target;
    }
    if next == current {
        return None;
    }

    let mut variant = species.clone();
    variant.cell_mut()?.rigidity = next;
    Some(variant)
}

fn change_membrane(
    species: &Species,
    membrane: &MembraneType,
    catalog: &BuildingBlockCatalog,
) -> Option<Species> {
    if species.cell()?.membrane.name == membrane.name {
        return None;
    }
    if !catalog.membranes().iter().any(|m| m.name == membrane.name) {
        trace!(membrane = %membrane.name, "membrane not offered");
        return None;
    }
    let mut variant = species.clone();
    variant.cell_mut()?.membrane = membrane.clone();
    Some(variant)
}

fn adjust_behavior<R: Rng + ?Sized>(
    species: &Species,
    attribute: BehaviorAttribute,
    max_delta: f32,
    rng: &mut R,
) -> Option<Species> {
    if max_delta <= 0.0 {
        return None;
    }

    let current = species.behaviour.get(attribute);
    let delta = rng.random_range(-max_delta..=max_delta);

    let mut variant = species.clone();
    variant.behaviour.set(attribute, current + delta);
    (variant.behaviour.get(attribute) != current).then_some(variant)
}
