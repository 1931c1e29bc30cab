//! Mutation search: incremental mutation and pruning along a niche path.
//!
//! Starting from a base species, each pressure in turn mutates every viable
//! variant with that pressure's strategies. After each pressure the pool is
//! pruned to variants that do not lose to the base across every pressure
//! seen so far. The survivors are ranked relative to the base's own scores.

use rand::Rng;
use std::collections::HashSet;
use tracing::debug;

use super::cache::SimulationCache;
use super::catalog::BuildingBlockCatalog;
use super::naming;
use super::params::AutoEvoParams;
use super::pressure::SelectionPressure;
use super::species::Species;

/// A variant and its ranking score.
#[derive(Debug, Clone)]
pub struct RankedVariant {
    /// The candidate.
    pub species: Species,
    /// Sum of strength-weighted score ratios against the base.
    pub rank: f64,
    /// Whether this is the unmodified base.
    pub is_base: bool,
}

/// Sum of `weighted_compare(candidate, base)` over `pressures`.
pub fn compare_sum(
    candidate: &Species,
    base: &Species,
    pressures: &[&SelectionPressure],
    cache: &SimulationCache,
) -> f64 {
    pressures
        .iter()
        .map(|p| p.weighted_compare(candidate, base, cache))
        .sum()
}

struct Ranker<'a> {
    pressures: &'a [&'a SelectionPressure],
    baselines: Vec<f64>,
    base_fingerprint: u64,
    base_bonus: f64,
}

impl Ranker<'_> {
    fn rank(&self, species: &Species, cache: &SimulationCache) -> f64 {
        let mut rank: f64 = self
            .pressures
            .iter()
            .zip(&self.baselines)
            .filter(|(_, baseline)| **baseline > 0.0)
            .map(|(p, baseline)| p.score(species, cache) / baseline * p.strength)
            .sum();
        if species.fingerprint() == self.base_fingerprint {
            rank += self.base_bonus;
        }
        rank
    }

    fn ranked(&self, pool: Vec<Species>, cache: &SimulationCache) -> Vec<RankedVariant> {
        let mut ranked: Vec<RankedVariant> = pool
            .into_iter()
            .map(|species| {
                let is_base = species.fingerprint() == self.base_fingerprint;
                RankedVariant {
                    rank: self.rank(&species, cache),
                    is_base,
                    species,
                }
            })
            .collect();
        ranked.sort_by(|a, b| b.rank.total_cmp(&a.rank));
        ranked
    }
}

/// Finds the viable variants of `base` under `pressures`, best first.
///
/// The base is always part of the result. Mutated variants are renamed: a new
/// genus when the part type sets differ enough, otherwise a new epithet.
pub fn viable_variants<R: Rng + ?Sized>(
    base: &Species,
    pressures: &[&SelectionPressure],
    catalog: &BuildingBlockCatalog,
    cache: &SimulationCache,
    rng: &mut R,
    params: &AutoEvoParams,
) -> Vec<RankedVariant> {
    let ranker = Ranker {
        pressures,
        baselines: pressures.iter().map(|p| p.score(base, cache)).collect(),
        base_fingerprint: base.fingerprint(),
        base_bonus: f64::from(params.unmodified_base_bonus),
    };

    let mut viable = vec![base.clone()];

    for (index, pressure) in pressures.iter().enumerate() {
        let mut seen: HashSet<u64> = viable.iter().map(Species::fingerprint).collect();
        let mut pool = viable.clone();

        for species in &viable {
            for strategy in &pressure.strategies {
                for variant in strategy.apply(species, catalog, rng, params) {
                    if !variant.is_structurally_valid() {
                        continue;
                    }
                    if seen.insert(variant.fingerprint()) {
                        pool.push(variant);
                    }
                }
            }
        }

        let seen_so_far = &pressures[..=index];
        let generated = pool.len();
        pool.retain(|candidate| {
            candidate.fingerprint() == ranker.base_fingerprint
                || compare_sum(candidate, base, seen_so_far, cache) >= 0.0
        });

        if pool.len() > params.max_viable_variants {
            let mut ranked = ranker.ranked(pool, cache);
            ranked.truncate(params.max_viable_variants);
            if !ranked.iter().any(|v| v.is_base) {
                ranked.pop();
                ranked.push(RankedVariant {
                    species: base.clone(),
                    rank: 0.0,
                    is_base: true,
                });
            }
            pool = ranked.into_iter().map(|v| v.species).collect();
        }

        debug!(
            pressure = %pressure,
            generated,
            kept = pool.len(),
            "mutation search step"
        );
        viable = pool;
    }

    let mut ranked = ranker.ranked(viable, cache);
    for variant in ranked.iter_mut().filter(|v| !v.is_base) {
        naming::name_new_species(
            &mut variant.species,
            base,
            params.genus_split_threshold,
            rng,
        );
    }
    ranked
}

/// The best variant of `base` under `pressures`; the base itself if nothing beats it.
pub fn best_variant<R: Rng + ?Sized>(
    base: &Species,
    pressures: &[&SelectionPressure],
    catalog: &BuildingBlockCatalog,
    cache: &SimulationCache,
    rng: &mut R,
    params: &AutoEvoParams,
) -> Species {
    viable_variants(base, pressures, catalog, cache, rng, params)
        .into_iter()
        .next()
        .map(|v| v.species)
        .unwrap_or_else(|| base.clone())
}
