use serde::{Deserialize, Serialize};

use super::error::{AutoEvoError, Result};

/// Tunables for one auto-evo run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoEvoParams {
    /// Run seed. `None` draws a seed from entropy and logs it.
    pub seed: Option<u64>,
    /// Chance that an eligible part is offered to mutation this generation.
    /// Default: 0.4 (a 60% per-part skip roll).
    pub part_inclusion_chance: f32,
    /// How many rounds of predator niches to derive. Default: 3.
    pub trophic_level_cap: usize,
    /// Differing part types needed before a variant gets a new genus.
    pub genus_split_threshold: usize,
    /// Maximum variants kept alive during a mutation search.
    pub max_viable_variants: usize,
    /// Ranking bonus for the unmodified base species.
    pub unmodified_base_bonus: f32,
    /// Bound on a single behaviour change. Range: 0-400.
    pub behaviour_delta: f32,
    /// Rigidity steps smaller than this snap to the extreme.
    pub rigidity_snap_epsilon: f32,
    /// Furthest hex step tried from an anchor when placing a new part.
    pub placement_radius: i32,
    /// Run patches on the rayon thread pool.
    pub parallel: bool,
    /// Energy the be-the-player niche provides.
    pub be_player_energy: i64,
    /// Energy an autotrophic source niche provides.
    pub autotroph_energy: i64,
    /// Strength of hydrogen sulfide chemosynthesis.
    pub hydrogen_sulfide_strength: f32,
    /// Strength of photosynthesis.
    pub sunlight_strength: f32,
    /// Strength of iron chemolithoautotrophy.
    pub iron_strength: f32,
    /// Energy the glucose cloud niche provides.
    pub glucose_cloud_energy: i64,
    /// Strength of reaching glucose clouds.
    pub glucose_reach_strength: f32,
    /// Energy the "don't starve" niche provides.
    pub metabolic_stability_energy: i64,
    /// Strength of the "don't starve" niche.
    pub metabolic_stability_strength: f32,
    /// Strength of storing glucose for the night.
    pub store_glucose_strength: f32,
    /// Minimum part storage offered by the store glucose mutations.
    pub store_glucose_min_part_storage: f32,
    /// Energy a predation niche provides.
    pub predation_energy: i64,
    /// Strength of a predation niche.
    pub predation_strength: f32,
    /// Strength of the osmoregulation context pressure.
    pub osmoregulation_strength: f32,
    /// Strength of each avoid-predator context pressure.
    pub avoid_predation_strength: f32,
}

impl Default for AutoEvoParams {
    fn default() -> Self {
        Self {
            seed: None,
            part_inclusion_chance: 0.4,
            trophic_level_cap: 3,
            genus_split_threshold: 1,
            max_viable_variants: 40,
            unmodified_base_bonus: 0.01,
            behaviour_delta: 100.0,
            rigidity_snap_epsilon: 0.01,
            placement_radius: 3,
            parallel: true,
            be_player_energy: 1000,
            autotroph_energy: 40000,
            hydrogen_sulfide_strength: 10.0,
            sunlight_strength: 1.0,
            iron_strength: 1.0,
            glucose_cloud_energy: 20000,
            glucose_reach_strength: 5.0,
            metabolic_stability_energy: 1000,
            metabolic_stability_strength: 1.0,
            store_glucose_strength: 50.8,
            store_glucose_min_part_storage: 2.0,
            predation_energy: 10000,
            predation_strength: 10.0,
            osmoregulation_strength: 0.5,
            avoid_predation_strength: 2.0,
        }
    }
}

impl AutoEvoParams {
    /// Rejects values that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.part_inclusion_chance) {
            return Err(AutoEvoError::InvalidConfig(
                "part_inclusion_chance must be within [0, 1]",
            ));
        }
        if self.max_viable_variants == 0 {
            return Err(AutoEvoError::InvalidConfig(
                "max_viable_variants must be at least 1",
            ));
        }
        if self.placement_radius < 1 {
            return Err(AutoEvoError::InvalidConfig(
                "placement_radius must be at least 1",
            ));
        }
        if !(0.0..=super::species::MAX_BEHAVIOUR_VALUE).contains(&self.behaviour_delta) {
            return Err(AutoEvoError::InvalidConfig(
                "behaviour_delta must be within [0, 400]",
            ));
        }
        if self.rigidity_snap_epsilon <= 0.0 {
            return Err(AutoEvoError::InvalidConfig(
                "rigidity_snap_epsilon must be positive",
            ));
        }
        if self.unmodified_base_bonus < 0.0 {
            return Err(AutoEvoError::InvalidConfig(
                "unmodified_base_bonus must not be negative",
            ));
        }

        let strengths = [
            self.hydrogen_sulfide_strength,
            self.sunlight_strength,
            self.iron_strength,
            self.glucose_reach_strength,
            self.metabolic_stability_strength,
            self.store_glucose_strength,
            self.predation_strength,
            self.osmoregulation_strength,
            self.avoid_predation_strength,
        ];
        if strengths.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(AutoEvoError::InvalidConfig(
                "pressure strengths must be finite and non-negative",
            ));
        }

        let energies = [
            self.be_player_energy,
            self.autotroph_energy,
            self.glucose_cloud_energy,
            self.metabolic_stability_energy,
            self.predation_energy,
        ];
        if energies.iter().any(|e| *e < 0) {
            return Err(AutoEvoError::InvalidConfig(
                "energy provided must not be negative",
            ));
        }

        Ok(())
    }

    /// Saves the parameters to a JSON file.
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Loads parameters from a JSON file and validates them.
    ///
    /// Missing fields fall back to their defaults.
    pub fn load_from_file(path: &str) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&json)?;
        params.validate()?;
        Ok(params)
    }
}
