//! Per-generation memoization of derived biological quantities.
//!
//! One cache belongs to one patch for one generation. Entries are never
//! invalidated: the biome is fixed for the run and species are keyed by
//! their structural fingerprint, so an edited clone never hits a stale entry.

use std::cell::RefCell;
use std::collections::HashMap;

use super::compound::Compound;
use super::patch::{BiomeConditions, Patch, PatchId};
use super::physiology::{self, EnergyBalance, ProcessSpeedInfo};
use super::part::TweakedProcess;
use super::species::{Species, SpeciesKey};

/// Memoized scoring inputs for one patch.
///
/// Interior mutability keeps `score` functions taking `&SimulationCache`.
/// Each patch worker owns its cache, so nothing here is shared across threads.
#[derive(Debug)]
pub struct SimulationCache {
    patch: PatchId,
    biome: BiomeConditions,
    energy_balances: RefCell<HashMap<(SpeciesKey, PatchId), EnergyBalance>>,
    speeds: RefCell<HashMap<SpeciesKey, f32>>,
    hex_sizes: RefCell<HashMap<SpeciesKey, f32>>,
    storages: RefCell<HashMap<SpeciesKey, f32>>,
    generation_scores: RefCell<HashMap<(SpeciesKey, Compound, PatchId), f32>>,
    process_speeds: RefCell<HashMap<((String, u32), PatchId), ProcessSpeedInfo>>,
    predation_scores: RefCell<HashMap<(SpeciesKey, SpeciesKey), f64>>,
}

impl SimulationCache {
    /// A fresh cache for `patch`.
    pub fn new(patch: &Patch) -> Self {
        Self::for_biome(patch.id, patch.biome.clone())
    }

    /// A fresh cache for explicit conditions.
    pub fn for_biome(patch: PatchId, biome: BiomeConditions) -> Self {
        Self {
            patch,
            biome,
            energy_balances: RefCell::default(),
            speeds: RefCell::default(),
            hex_sizes: RefCell::default(),
            storages: RefCell::default(),
            generation_scores: RefCell::default(),
            process_speeds: RefCell::default(),
            predation_scores: RefCell::default(),
        }
    }

    /// ATP budget of `species` in this patch.
    pub fn energy_balance(&self, species: &Species) -> EnergyBalance {
        let key = (species.key(), self.patch);
        if let Some(cached) = self.energy_balances.borrow().get(&key) {
            return cached.clone();
        }
        let balance = physiology::species_energy_balance(species, &self.biome);
        self.energy_balances.borrow_mut().insert(key, balance.clone());
        balance
    }

    /// Top speed of `species`.
    pub fn base_speed(&self, species: &Species) -> f32 {
        memoize(&self.speeds, species.key(), || physiology::species_speed(species))
    }

    /// Hex count of `species`.
    pub fn base_hex_size(&self, species: &Species) -> f32 {
        memoize(&self.hex_sizes, species.key(), || {
            physiology::species_hex_size(species)
        })
    }

    /// Storage capacity of `species`.
    pub fn storage(&self, species: &Species) -> f32 {
        memoize(&self.storages, species.key(), || {
            physiology::species_storage(species)
        })
    }

    /// Weighted energy `species` generates from `compound` in this patch.
    ///
    /// Every process fed by `compound` contributes its glucose and ATP output
    /// per unit input, scaled by how fast the patch lets it run. Colonies sum
    /// over their cells.
    pub fn energy_generation_score(&self, species: &Species, compound: Compound) -> f32 {
        let key = (species.key(), compound, self.patch);
        if let Some(value) = self.generation_scores.borrow().get(&key) {
            return *value;
        }

        let mut score = 0.0;
        for cell in species.cells() {
            for placed in cell.layout.iter() {
                for process in &placed.part.processes {
                    let Some(input) = process.process.inputs.get(&compound) else {
                        continue;
                    };
                    let efficiency = self.process_maximum_speed(process).throttle;
                    let outputs = &process.process.outputs;
                    if let Some(glucose) = outputs.get(&Compound::Glucose) {
                        score += glucose / input * efficiency * physiology::GLUCOSE_USE_SCORE_MULTIPLIER;
                    }
                    if let Some(atp) = outputs.get(&Compound::Atp) {
                        score += atp / input * efficiency * physiology::ATP_USE_SCORE_MULTIPLIER;
                    }
                }
            }
        }

        self.generation_scores.borrow_mut().insert(key, score);
        score
    }

    /// Throughput of a process in this patch.
    pub fn process_maximum_speed(&self, process: &TweakedProcess) -> ProcessSpeedInfo {
        let key = (process.key(), self.patch);
        if let Some(cached) = self.process_speeds.borrow().get(&key) {
            return cached.clone();
        }
        let info = physiology::process_maximum_speed(process, &self.biome);
        self.process_speeds.borrow_mut().insert(key, info.clone());
        info
    }

    /// Raw predation score of `predator` against `prey`, computed on a miss.
    pub fn predation_score(
        &self,
        predator: &Species,
        prey: &Species,
        compute: impl FnOnce() -> f64,
    ) -> f64 {
        memoize(&self.predation_scores, (predator.key(), prey.key()), compute)
    }
}

fn memoize<K, V, F>(map: &RefCell<HashMap<K, V>>, key: K, compute: F) -> V
where
    K: std::hash::Hash + Eq,
    V: Copy,
    F: FnOnce() -> V,
{
    if let Some(value) = map.borrow().get(&key) {
        return *value;
    }
    let value = compute();
    map.borrow_mut().insert(key, value);
    value
}
