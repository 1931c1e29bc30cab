//! Habitats (patches) and the world registry that owns species.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use super::compound::Compound;
use super::error::{AutoEvoError, Result};
use super::species::{Species, SpeciesId};

/// Patch identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct PatchId(pub u32);

/// Ambient conditions of a patch.
///
/// Environmental compounds (see [`Compound::is_environmental`]) are stored as
/// dissolved fractions in `[0, 1]`. Cloud compounds are stored as the
/// amount available to harvest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiomeConditions {
    /// Amount of each compound present.
    pub compounds: BTreeMap<Compound, f32>,
}

impl BiomeConditions {
    /// Builds conditions from `(compound, amount)` pairs.
    pub fn from_pairs(pairs: &[(Compound, f32)]) -> Self {
        Self {
            compounds: pairs.iter().copied().collect(),
        }
    }

    /// Amount of `compound`, 0 when absent.
    pub fn amount(&self, compound: Compound) -> f32 {
        self.compounds.get(&compound).copied().unwrap_or(0.0)
    }

    /// Whether the patch offers a usable amount of `compound`.
    pub fn has(&self, compound: Compound) -> bool {
        self.amount(compound) > 0.0
    }
}

/// One habitat on the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patch {
    /// Identifier.
    pub id: PatchId,
    /// Display name.
    pub name: String,
    /// Ambient compound levels.
    pub biome: BiomeConditions,
    /// Patches species can migrate in from.
    pub adjacent: BTreeSet<PatchId>,
    /// Resident species and their populations.
    pub populations: BTreeMap<SpeciesId, i64>,
}

impl Patch {
    /// Creates an empty patch.
    pub fn new(id: PatchId, name: &str, biome: BiomeConditions) -> Self {
        Self {
            id,
            name: name.to_string(),
            biome,
            adjacent: BTreeSet::new(),
            populations: BTreeMap::new(),
        }
    }

    /// Population of a species here, 0 if absent.
    pub fn population_of(&self, species: SpeciesId) -> i64 {
        self.populations.get(&species).copied().unwrap_or(0)
    }

    /// Species with a positive population, in id order.
    pub fn resident_ids(&self) -> Vec<SpeciesId> {
        self.populations
            .iter()
            .filter(|(_, population)| **population > 0)
            .map(|(id, _)| *id)
            .collect()
    }
}

/// Every patch and species the game tracks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    /// Species registry.
    pub species: BTreeMap<SpeciesId, Species>,
    /// Patch map.
    pub patches: BTreeMap<PatchId, Patch>,
    /// Patch the player currently lives in.
    pub player_patch: Option<PatchId>,
    /// Next lineage id to hand out.
    pub next_species_id: u64,
    /// Parent of every species that arose through auto-evo.
    pub ancestors: BTreeMap<SpeciesId, SpeciesId>,
}

impl World {
    /// An empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a patch, replacing any patch with the same id.
    pub fn add_patch(&mut self, patch: Patch) {
        self.patches.insert(patch.id, patch);
    }

    /// Links two patches in both directions.
    pub fn connect(&mut self, a: PatchId, b: PatchId) -> Result<()> {
        if !self.patches.contains_key(&b) {
            return Err(AutoEvoError::UnknownPatch(b));
        }
        self.patch_mut(a)?.adjacent.insert(b);
        self.patch_mut(b)?.adjacent.insert(a);
        Ok(())
    }

    /// Hands out a fresh lineage id.
    pub fn allocate_species_id(&mut self) -> SpeciesId {
        let id = SpeciesId(self.next_species_id);
        self.next_species_id += 1;
        id
    }

    /// Registers a species under a fresh id and returns that id.
    pub fn register_species(&mut self, mut species: Species) -> SpeciesId {
        let id = self.allocate_species_id();
        species.id = id;
        self.species.insert(id, species);
        id
    }

    /// Looks a patch up.
    pub fn patch(&self, id: PatchId) -> Result<&Patch> {
        self.patches.get(&id).ok_or(AutoEvoError::UnknownPatch(id))
    }

    /// Looks a patch up mutably.
    pub fn patch_mut(&mut self, id: PatchId) -> Result<&mut Patch> {
        self.patches
            .get_mut(&id)
            .ok_or(AutoEvoError::UnknownPatch(id))
    }

    /// Looks a species up.
    pub fn species(&self, id: SpeciesId) -> Result<&Species> {
        self.species.get(&id).ok_or(AutoEvoError::UnknownSpecies(id))
    }

    /// Sets a population, removing the entry when it drops to zero.
    pub fn set_population(&mut self, patch: PatchId, species: SpeciesId, population: i64) -> Result<()> {
        if !self.species.contains_key(&species) {
            return Err(AutoEvoError::UnknownSpecies(species));
        }
        let patch = self.patch_mut(patch)?;
        if population > 0 {
            patch.populations.insert(species, population);
        } else {
            patch.populations.remove(&species);
        }
        Ok(())
    }

    /// Residents of a patch, in id order.
    pub fn residents(&self, patch: PatchId) -> Result<Vec<&Species>> {
        let patch = self.patch(patch)?;
        let mut residents = Vec::new();
        for id in patch.resident_ids() {
            match self.species.get(&id) {
                Some(species) => residents.push(species),
                None => warn!(?id, patch = %patch.name, "patch lists an unregistered species"),
            }
        }
        Ok(residents)
    }

    /// Species living in patches adjacent to `patch` but not in it.
    pub fn foreign_candidates(&self, patch: PatchId) -> Result<Vec<&Species>> {
        let home = self.patch(patch)?;
        let mut seen = BTreeSet::new();
        for neighbour in &home.adjacent {
            let neighbour = self.patch(*neighbour)?;
            for id in neighbour.resident_ids() {
                if home.population_of(id) <= 0 {
                    seen.insert(id);
                }
            }
        }
        Ok(seen
            .into_iter()
            .filter_map(|id| self.species.get(&id))
            .collect())
    }

    /// Total population of a species across every patch.
    pub fn total_population(&self, species: SpeciesId) -> i64 {
        self.patches.values().map(|p| p.population_of(species)).sum()
    }

    /// The player's species, if one is flagged.
    pub fn player_species(&self) -> Option<&Species> {
        self.species.values().find(|s| s.player)
    }

    /// Saves the world to a JSON file.
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Loads a world from a JSON file.
    pub fn load_from_file(path: &str) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let world = serde_json::from_str(&json)?;
        Ok(world)
    }
}
