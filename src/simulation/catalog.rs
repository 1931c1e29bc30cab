//! The randomized subset of parts mutation may use this generation.

use rand::Rng;
use std::sync::Arc;

use super::membrane::{MembraneCatalog, MembraneType};
use super::part::{PartCatalog, PartDefinition};
use super::species::Species;

/// Parts and membranes a species may mutate towards this generation.
#[derive(Debug, Clone, Default)]
pub struct BuildingBlockCatalog {
    parts: Vec<Arc<PartDefinition>>,
    membranes: Vec<MembraneType>,
}

impl BuildingBlockCatalog {
    /// Filters `parts` down to what `species` could structurally use, then
    /// keeps each survivor with probability `inclusion_chance`.
    ///
    /// Parts needing a nucleus are dropped for prokaryotes, and unique parts
    /// the species already has are dropped outright.
    pub fn for_species<R: Rng + ?Sized>(
        species: &Species,
        parts: &PartCatalog,
        membranes: &MembraneCatalog,
        inclusion_chance: f32,
        rng: &mut R,
    ) -> Self {
        let bacteria = species.is_bacteria();
        let present = species.part_types();

        let parts = parts
            .parts()
            .iter()
            .filter(|part| !(part.requires_nucleus && bacteria))
            .filter(|part| !(part.unique && present.contains(&part.name)))
            .filter(|_| rng.random::<f32>() < inclusion_chance)
            .cloned()
            .collect();

        Self {
            parts,
            membranes: membranes.membranes().to_vec(),
        }
    }

    /// A catalog with exactly these parts and membranes, no rolls.
    pub fn from_parts(parts: Vec<Arc<PartDefinition>>, membranes: Vec<MembraneType>) -> Self {
        Self { parts, membranes }
    }

    /// Eligible parts in catalog order.
    pub fn parts(&self) -> &[Arc<PartDefinition>] {
        &self.parts
    }

    /// Membranes available to switch to.
    pub fn membranes(&self) -> &[MembraneType] {
        &self.membranes
    }

    /// Whether no part survived the rolls.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}
