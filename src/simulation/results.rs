//! Run results: what each patch found, merged across patches and committed
//! to the world once the whole generation is done.
//!
//! Patches are processed in parallel, each producing a [`PatchOutcome`].
//! Outcomes are merged into [`RunResults`] in any order; the merge is order
//! independent so parallel and sequential runs agree. Nothing touches the
//! [`World`] until [`RunResults::apply_to_world`].

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use super::error::Result;
use super::patch::{PatchId, World};
use super::species::{Species, SpeciesId, SpeciesKey};

/// Below this a population is reported as critically endangered.
pub const CRITICALLY_ENDANGERED_POPULATION: i64 = 100;
/// Below this a population is reported as endangered.
pub const ENDANGERED_POPULATION: i64 = 1000;

/// Human readable status for a population.
pub fn population_label(population: i64) -> &'static str {
    if population < CRITICALLY_ENDANGERED_POPULATION {
        "Critically Endangered"
    } else if population < ENDANGERED_POPULATION {
        "Endangered"
    } else {
        "Thriving"
    }
}

/// Everything one patch decided during a run.
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    /// The patch.
    pub patch: PatchId,
    /// Its display name, for reports.
    pub patch_name: String,
    /// Leaf occupants and their resulting populations.
    pub occupants: BTreeMap<SpeciesKey, (Species, i64)>,
    /// Parent of every mutant discovered in this patch.
    pub ancestors: BTreeMap<SpeciesKey, SpeciesKey>,
    /// Niche paths held by each occupant.
    pub best_niches: BTreeMap<SpeciesKey, Vec<Vec<String>>>,
    /// Residents that lost every niche here, with their names.
    pub extinct: BTreeMap<SpeciesId, String>,
}

impl PatchOutcome {
    /// An empty outcome for a patch.
    pub fn new(patch: PatchId, patch_name: &str) -> Self {
        Self {
            patch,
            patch_name: patch_name.to_string(),
            occupants: BTreeMap::new(),
            ancestors: BTreeMap::new(),
            best_niches: BTreeMap::new(),
            extinct: BTreeMap::new(),
        }
    }

    /// Records an occupant with its population and niche paths.
    pub fn record_occupant(&mut self, species: &Species, population: i64, niches: Vec<Vec<String>>) {
        let key = species.key();
        self.occupants.insert(key, (species.clone(), population));
        self.best_niches.insert(key, niches);
    }

    /// Records that `child` was mutated from `parent`.
    pub fn record_ancestor(&mut self, child: SpeciesKey, parent: SpeciesKey) {
        if child != parent {
            self.ancestors.entry(child).or_insert(parent);
        }
    }

    /// Marks a resident as gone from this patch.
    pub fn mark_extinct(&mut self, species: &Species) {
        self.extinct.insert(species.id, species.formatted_name());
    }
}

/// A species as it appears across the merged run.
#[derive(Debug, Clone)]
pub struct SpeciesRecord {
    /// The species, carrying the name it got in the lowest patch id.
    pub species: Species,
    /// The species it was mutated from, when it is a mutant.
    pub ancestor: Option<SpeciesKey>,
    /// Population in each patch where it holds a niche.
    pub populations: BTreeMap<PatchId, i64>,
    /// Niche paths held in each patch.
    pub best_niches: BTreeMap<PatchId, Vec<Vec<String>>>,
    named_in: PatchId,
}

/// Merged results of a whole generation.
#[derive(Debug, Clone, Default)]
pub struct RunResults {
    records: BTreeMap<SpeciesKey, SpeciesRecord>,
    extinct: BTreeMap<PatchId, BTreeMap<SpeciesId, String>>,
    patch_names: BTreeMap<PatchId, String>,
}

impl RunResults {
    /// Empty results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no patch has been merged yet.
    pub fn is_empty(&self) -> bool {
        self.patch_names.is_empty()
    }

    /// Folds one patch's outcome in.
    pub fn merge(&mut self, outcome: PatchOutcome) {
        let patch = outcome.patch;
        for (key, (species, population)) in outcome.occupants {
            let ancestor = outcome.ancestors.get(&key).copied();
            let niches = outcome.best_niches.get(&key).cloned().unwrap_or_default();

            let record = self.records.entry(key).or_insert_with(|| SpeciesRecord {
                species: species.clone(),
                ancestor,
                populations: BTreeMap::new(),
                best_niches: BTreeMap::new(),
                named_in: patch,
            });
            if patch < record.named_in {
                record.species = species;
                record.named_in = patch;
                if ancestor.is_some() {
                    record.ancestor = ancestor;
                }
            } else if record.ancestor.is_none() {
                record.ancestor = ancestor;
            }
            record.populations.insert(patch, population);
            record.best_niches.insert(patch, niches);
        }
        self.extinct.insert(patch, outcome.extinct);
        self.patch_names.insert(patch, outcome.patch_name);
    }

    /// Every species holding a niche somewhere, in key order.
    pub fn records(&self) -> impl Iterator<Item = (&SpeciesKey, &SpeciesRecord)> {
        self.records.iter()
    }

    /// The record for one species.
    pub fn record(&self, key: SpeciesKey) -> Option<&SpeciesRecord> {
        self.records.get(&key)
    }

    /// Records of species not yet in `world`'s registry.
    pub fn new_species<'a>(&'a self, world: &'a World) -> impl Iterator<Item = &'a SpeciesRecord> {
        self.records
            .iter()
            .filter(move |(key, _)| !is_registered(world, **key))
            .map(|(_, record)| record)
    }

    /// Population of `key` in `patch`, 0 when it holds no niche there.
    pub fn population(&self, key: SpeciesKey, patch: PatchId) -> i64 {
        self.records
            .get(&key)
            .and_then(|record| record.populations.get(&patch))
            .copied()
            .unwrap_or(0)
    }

    /// The parent `key` was mutated from.
    pub fn ancestor(&self, key: SpeciesKey) -> Option<SpeciesKey> {
        self.records.get(&key).and_then(|record| record.ancestor)
    }

    /// Niche paths `key` holds in `patch`.
    pub fn best_niches(&self, key: SpeciesKey, patch: PatchId) -> &[Vec<String>] {
        self.records
            .get(&key)
            .and_then(|record| record.best_niches.get(&patch))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Residents that lost every niche in `patch`.
    pub fn extinct_in(&self, patch: PatchId) -> Vec<SpeciesId> {
        self.extinct
            .get(&patch)
            .map(|gone| gone.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Commits the run.
    ///
    /// New species get fresh ids in key order and their ancestry is recorded.
    /// Every processed patch's population table is replaced by the run's
    /// populations, keeping the player's own entry. Species left without a
    /// population anywhere are dropped, except the player's.
    ///
    /// Returns the id each run species ended up with.
    pub fn apply_to_world(&self, world: &mut World) -> Result<BTreeMap<SpeciesKey, SpeciesId>> {
        let mut ids = BTreeMap::new();
        for key in self.records.keys() {
            if is_registered(world, *key) {
                ids.insert(*key, key.lineage);
            }
        }

        for (key, record) in &self.records {
            if ids.contains_key(key) {
                continue;
            }
            let mut species = record.species.clone();
            species.player = false;
            let id = world.register_species(species);
            info!(
                species = %record.species,
                id = id.0,
                "registered new species"
            );
            ids.insert(*key, id);
        }

        for (key, record) in &self.records {
            let Some(id) = ids.get(key).copied() else {
                continue;
            };
            if id == key.lineage {
                continue;
            }
            let parent = record
                .ancestor
                .and_then(|ancestor| ids.get(&ancestor).copied())
                .unwrap_or(key.lineage);
            world.ancestors.insert(id, parent);
        }

        let players: BTreeSet<SpeciesId> = world
            .species
            .values()
            .filter(|s| s.player)
            .map(|s| s.id)
            .collect();

        for patch_id in self.patch_names.keys() {
            let mut populations: BTreeMap<SpeciesId, i64> = BTreeMap::new();
            for (key, record) in &self.records {
                let (Some(id), Some(population)) = (ids.get(key), record.populations.get(patch_id))
                else {
                    continue;
                };
                if *population > 0 {
                    *populations.entry(*id).or_insert(0) += population;
                }
            }

            let patch = world.patch_mut(*patch_id)?;
            for player in &players {
                if let Some(previous) = patch.populations.get(player) {
                    populations.entry(*player).or_insert(*previous);
                }
            }
            debug!(patch = %patch.name, species = populations.len(), "committed populations");
            patch.populations = populations;
        }

        let vanished: Vec<SpeciesId> = world
            .species
            .keys()
            .copied()
            .filter(|id| !players.contains(id) && world.total_population(*id) <= 0)
            .collect();
        for id in vanished {
            if let Some(species) = world.species.remove(&id) {
                info!(%species, "species went extinct everywhere");
            }
        }

        Ok(ids)
    }

    /// One line per species and patch, then one per local extinction.
    pub fn summary(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for record in self.records.values() {
            let mut name = record.species.formatted_name();
            if record.ancestor.is_some() {
                name.push_str(" (new)");
            }
            for (patch, population) in &record.populations {
                let patch_name = self.patch_names.get(patch).map_or("?", String::as_str);
                lines.push(format!(
                    "{name} in {patch_name}: {population} ({})",
                    population_label(*population)
                ));
            }
        }
        for (patch, gone) in &self.extinct {
            let patch_name = self.patch_names.get(patch).map_or("?", String::as_str);
            for name in gone.values() {
                lines.push(format!("{name} went extinct in {patch_name}"));
            }
        }
        lines
    }
}

fn is_registered(world: &World, key: SpeciesKey) -> bool {
    world
        .species
        .get(&key.lineage)
        .is_some_and(|species| species.fingerprint() == key.fingerprint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_thresholds() {
        assert_eq!(population_label(0), "Critically Endangered");
        assert_eq!(population_label(99), "Critically Endangered");
        assert_eq!(population_label(100), "Endangered");
        assert_eq!(population_label(999), "Endangered");
        assert_eq!(population_label(41000), "Thriving");
    }
}
