//! Selection pressures: named, weighted scoring functions over species.
//!
//! Scores are never negative. A score of exactly 0 means the species cannot
//! hold the niche at all.

use std::fmt;
use tracing::debug;

use super::cache::SimulationCache;
use super::compound::Compound;
use super::error::ScoreError;
use super::membrane::MembraneType;
use super::params::AutoEvoParams;
use super::physiology;
use super::species::{BehaviorAttribute, Species};
use super::strategy::{MutationStrategy, PartFilter, RigidityDirection};

/// Returned by [`SelectionPressure::weighted_compare`] when the first species
/// scores 0. Large enough to swamp any sum of ordinary comparisons.
pub const INVIABLE_SCORE: f64 = -1.0e9;

/// A predator must cover this many times the prey's hexes to engulf it.
pub const ENGULF_SIZE_RATIO: f64 = 1.5;

/// Contribution of being able to engulf the prey.
const ENGULF_SCORE: f64 = 1.0;
/// Contribution of each pilus.
const PILUS_SCORE: f64 = 0.5;
/// Parts cheaper than this are offered against predators.
const DEFENSIVE_PART_MAX_MP: f32 = 30.0;

/// What a pressure measures.
#[derive(Debug, Clone)]
pub enum PressureKind {
    /// Root of every niche tree; anything passes.
    NoOp,
    /// Only the player's species passes.
    BePlayer,
    /// Energy extracted from an ambient source per unit of osmoregulation.
    AutotrophEnergyEfficiency(Compound),
    /// "Don't starve": a non-negative ATP balance.
    MetabolicStability,
    /// Getting to compound clouds: needs movement.
    ReachCompoundCloud,
    /// Storage capacity, to last through the night.
    StoreGlucose,
    /// Cheap upkeep while standing still.
    OsmoregulationEfficiency,
    /// Hunting a specific prey species.
    PredationEffectiveness(Box<Species>),
    /// Escaping a specific predator species.
    AvoidPredation(Box<Species>),
}

impl PressureKind {
    /// Stable label of the kind, independent of its payload.
    pub fn label(&self) -> &'static str {
        match self {
            PressureKind::NoOp => "no-op",
            PressureKind::BePlayer => "be-player",
            PressureKind::AutotrophEnergyEfficiency(_) => "autotroph-energy-efficiency",
            PressureKind::MetabolicStability => "metabolic-stability",
            PressureKind::ReachCompoundCloud => "reach-compound-cloud",
            PressureKind::StoreGlucose => "store-glucose",
            PressureKind::OsmoregulationEfficiency => "osmoregulation-efficiency",
            PressureKind::PredationEffectiveness(_) => "predation-effectiveness",
            PressureKind::AvoidPredation(_) => "avoid-predation",
        }
    }
}

/// A weighted scoring criterion plus the mutations that help satisfy it.
#[derive(Debug, Clone)]
pub struct SelectionPressure {
    /// What is scored.
    pub kind: PressureKind,
    /// Weight in comparisons; 0 makes the pressure informational only.
    pub strength: f64,
    /// Population granted to occupants of a path through this pressure.
    pub energy_provided: i64,
    /// Mutations worth trying to improve this score.
    pub strategies: Vec<MutationStrategy>,
}

impl SelectionPressure {
    fn new(kind: PressureKind, strength: f32, energy_provided: i64) -> Self {
        Self {
            kind,
            strength: f64::from(strength),
            energy_provided,
            strategies: Vec::new(),
        }
    }

    fn with_strategies(mut self, strategies: Vec<MutationStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    /// The root pressure.
    pub fn no_op() -> Self {
        Self::new(PressureKind::NoOp, 0.0, 0)
    }

    /// Reserves a niche for the player's species.
    pub fn be_player(params: &AutoEvoParams) -> Self {
        Self::new(PressureKind::BePlayer, 1.0, params.be_player_energy)
    }

    /// Harvesting `compound` as an autotroph.
    pub fn autotroph(compound: Compound, params: &AutoEvoParams) -> Self {
        let strength = match compound {
            Compound::HydrogenSulfide => params.hydrogen_sulfide_strength,
            Compound::Iron => params.iron_strength,
            _ => params.sunlight_strength,
        };
        Self::new(
            PressureKind::AutotrophEnergyEfficiency(compound),
            strength,
            params.autotroph_energy,
        )
        .with_strategies(vec![MutationStrategy::AddPart(PartFilter::ConsumesCompound(
            compound,
        ))])
    }

    /// "Don't starve".
    pub fn metabolic_stability(params: &AutoEvoParams) -> Self {
        Self::new(
            PressureKind::MetabolicStability,
            params.metabolic_stability_strength,
            params.metabolic_stability_energy,
        )
        .with_strategies(vec![MutationStrategy::AddPart(PartFilter::Named(
            "metabolosome".to_string(),
        ))])
    }

    /// Chasing glucose clouds.
    pub fn reach_compound_cloud(params: &AutoEvoParams) -> Self {
        Self::new(
            PressureKind::ReachCompoundCloud,
            params.glucose_reach_strength,
            params.glucose_cloud_energy,
        )
        .with_strategies(vec![
            MutationStrategy::AdjustRigidity(RigidityDirection::Lower),
            MutationStrategy::ChangeMembrane(MembraneType::single()),
            MutationStrategy::AddPart(PartFilter::Named("flagellum".to_string())),
            MutationStrategy::AdjustBehavior {
                attribute: BehaviorAttribute::Activity,
                max_delta: params.behaviour_delta,
            },
        ])
    }

    /// Storing energy for the night.
    pub fn store_glucose(params: &AutoEvoParams) -> Self {
        Self::new(PressureKind::StoreGlucose, params.store_glucose_strength, 0).with_strategies(
            vec![MutationStrategy::AddPart(PartFilter::MinStorage(
                params.store_glucose_min_part_storage,
            ))],
        )
    }

    /// Low stationary upkeep.
    pub fn osmoregulation(params: &AutoEvoParams) -> Self {
        Self::new(
            PressureKind::OsmoregulationEfficiency,
            params.osmoregulation_strength,
            0,
        )
        .with_strategies(vec![MutationStrategy::RemovePart])
    }

    /// Hunting `prey`.
    pub fn predation(prey: &Species, params: &AutoEvoParams) -> Self {
        Self::new(
            PressureKind::PredationEffectiveness(Box::new(prey.clone())),
            params.predation_strength,
            params.predation_energy,
        )
        .with_strategies(vec![
            MutationStrategy::AddPart(PartFilter::Named("pilus".to_string())),
            MutationStrategy::AddPart(PartFilter::Named("cytoplasm".to_string())),
            MutationStrategy::AddMultipleParts(vec![
                PartFilter::Named("pilus".to_string()),
                PartFilter::Named("cytoplasm".to_string()),
            ]),
            MutationStrategy::AdjustBehavior {
                attribute: BehaviorAttribute::Aggression,
                max_delta: params.behaviour_delta,
            },
        ])
    }

    /// Escaping `predator`.
    pub fn avoid_predation(predator: &Species, params: &AutoEvoParams) -> Self {
        Self::new(
            PressureKind::AvoidPredation(Box::new(predator.clone())),
            params.avoid_predation_strength,
            0,
        )
        .with_strategies(vec![
            MutationStrategy::AddPart(PartFilter::MaxMpCost(DEFENSIVE_PART_MAX_MP)),
            MutationStrategy::AdjustRigidity(RigidityDirection::Lower),
            MutationStrategy::AdjustBehavior {
                attribute: BehaviorAttribute::Fear,
                max_delta: params.behaviour_delta,
            },
        ])
    }

    /// Display name, used in niche paths.
    pub fn name(&self) -> String {
        match &self.kind {
            PressureKind::NoOp => "Root".to_string(),
            PressureKind::BePlayer => "Be the player".to_string(),
            PressureKind::AutotrophEnergyEfficiency(compound) => {
                format!("{compound} Energy Efficiency")
            }
            PressureKind::MetabolicStability => "Metabolic Stability".to_string(),
            PressureKind::ReachCompoundCloud => "Reach Compound Cloud".to_string(),
            PressureKind::StoreGlucose => "Store Glucose".to_string(),
            PressureKind::OsmoregulationEfficiency => "Osmoregulation Efficiency".to_string(),
            PressureKind::PredationEffectiveness(prey) => {
                format!("Predation Effectiveness against {}", prey.formatted_name())
            }
            PressureKind::AvoidPredation(predator) => {
                format!("Don't get eaten by {}", predator.formatted_name())
            }
        }
    }

    /// The prey of a predation pressure.
    pub fn prey(&self) -> Option<&Species> {
        match &self.kind {
            PressureKind::PredationEffectiveness(prey) => Some(prey.as_ref()),
            _ => None,
        }
    }

    /// Scores `species`, treating unscoreable species kinds as 0.
    pub fn score(&self, species: &Species, cache: &SimulationCache) -> f64 {
        match self.try_score(species, cache) {
            Ok(score) => score,
            Err(err) => {
                debug!(pressure = self.kind.label(), species = %species, %err, "scoring as zero");
                0.0
            }
        }
    }

    /// Scores `species`, reporting kinds this pressure cannot model.
    pub fn try_score(&self, species: &Species, cache: &SimulationCache) -> Result<f64, ScoreError> {
        let score = match &self.kind {
            PressureKind::NoOp => 1.0,
            PressureKind::BePlayer => {
                if species.player {
                    1.0
                } else {
                    0.0
                }
            }
            PressureKind::AutotrophEnergyEfficiency(compound) => {
                let generated = f64::from(cache.energy_generation_score(species, *compound));
                let upkeep: f64 = species
                    .cells()
                    .iter()
                    .map(|cell| f64::from(physiology::osmoregulation_cost(cell)))
                    .sum();
                if upkeep <= 0.0 { 0.0 } else { generated / upkeep }
            }
            PressureKind::MetabolicStability => {
                let balance = cache.energy_balance(species);
                if balance.final_balance > 0.0 {
                    1.0
                } else if balance.final_balance_stationary >= 0.0 {
                    0.5
                } else {
                    0.0
                }
            }
            PressureKind::ReachCompoundCloud => {
                let speed = f64::from(cache.base_speed(species));
                let activity = f64::from(species.behaviour.fraction(BehaviorAttribute::Activity));
                speed * (1.0 + activity)
            }
            PressureKind::StoreGlucose => f64::from(cache.storage(species)),
            PressureKind::OsmoregulationEfficiency => {
                let upkeep = f64::from(cache.energy_balance(species).total_consumption_stationary);
                1.0 / (1.0 + upkeep.max(0.0))
            }
            PressureKind::PredationEffectiveness(prey) => {
                predation_effectiveness(species, prey, cache)?
            }
            PressureKind::AvoidPredation(predator) => {
                1.0 / (1.0 + predation_effectiveness(predator, species, cache)?)
            }
        };
        Ok(score.max(0.0))
    }

    /// Strength-scaled relative performance of `a` over `b`.
    ///
    /// Returns [`INVIABLE_SCORE`] whenever `a` scores 0, whatever `b` does.
    pub fn weighted_compare(&self, a: &Species, b: &Species, cache: &SimulationCache) -> f64 {
        let score_a = self.score(a, cache);
        if score_a == 0.0 {
            return INVIABLE_SCORE;
        }
        let score_b = self.score(b, cache);
        if score_b == 0.0 {
            return if score_a > 0.0 { 1.0 } else { 0.0 };
        }
        (score_a / score_b - 1.0) * self.strength
    }
}

impl fmt::Display for SelectionPressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Forward predation survives only if the prey would not win the reverse fight.
pub fn apply_circular_predation_rule(forward: f64, reverse: f64) -> f64 {
    if reverse > forward { 0.0 } else { forward }
}

/// How well `predator` hunts `prey`, before the circular rule.
///
/// Same-lineage pairs score 0. Colonies are not modeled.
pub fn raw_predation_score(
    predator: &Species,
    prey: &Species,
    cache: &SimulationCache,
) -> Result<f64, ScoreError> {
    let (Some(predator_cell), Some(prey_cell)) = (predator.cell(), prey.cell()) else {
        return Err(ScoreError::Unscoreable {
            pressure: "predation-effectiveness",
        });
    };

    if predator.id == prey.id {
        return Ok(0.0);
    }

    Ok(cache.predation_score(predator, prey, || {
        let predator_size = f64::from(cache.base_hex_size(predator));
        let prey_size = f64::from(cache.base_hex_size(prey));

        let engulf = if predator_size >= prey_size * ENGULF_SIZE_RATIO {
            ENGULF_SCORE
        } else {
            0.0
        };
        let pili = predator_cell
            .layout
            .iter()
            .filter(|p| p.part.pilus)
            .count() as f64
            * PILUS_SCORE;

        let attack = engulf + pili;
        if attack <= 0.0 {
            return 0.0;
        }

        let speed_advantage = (1.0 + f64::from(cache.base_speed(predator)))
            / (1.0 + f64::from(cache.base_speed(prey)));
        let aggression = 0.5 + f64::from(predator.behaviour.fraction(BehaviorAttribute::Aggression));
        let defence = f64::from(prey_cell.membrane.defense_factor)
            * (1.0 + 0.5 * f64::from(prey_cell.rigidity));
        let fear = 1.0 + f64::from(prey.behaviour.fraction(BehaviorAttribute::Fear));

        attack * speed_advantage * aggression / (defence * fear)
    }))
}

/// Predation score with the circular-predation rule applied.
pub fn predation_effectiveness(
    predator: &Species,
    prey: &Species,
    cache: &SimulationCache,
) -> Result<f64, ScoreError> {
    let forward = raw_predation_score(predator, prey, cache)?;
    if forward == 0.0 {
        return Ok(0.0);
    }
    let reverse = raw_predation_score(prey, predator, cache)?;
    Ok(apply_circular_predation_rule(forward, reverse))
}
