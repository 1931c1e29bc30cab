//! Outer boundary (membrane) kinds.

use serde::{Deserialize, Serialize};

use super::error::{AutoEvoError, Result};

/// Rigidity is kept in `[-1, 1]`; lower is more fluid and faster.
pub const MIN_RIGIDITY: f32 = -1.0;
/// Upper rigidity bound; higher resists predators better.
pub const MAX_RIGIDITY: f32 = 1.0;

/// A membrane kind and the factors it applies to the cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembraneType {
    /// Internal name.
    pub name: String,
    /// Multiplier on thrust.
    pub movement_factor: f32,
    /// Multiplier on osmoregulation cost.
    pub osmoregulation_factor: f32,
    /// Multiplier on how hard the cell is to eat.
    pub defense_factor: f32,
}

impl MembraneType {
    fn new(name: &str, movement: f32, osmoregulation: f32, defense: f32) -> Self {
        Self {
            name: name.to_string(),
            movement_factor: movement,
            osmoregulation_factor: osmoregulation,
            defense_factor: defense,
        }
    }

    /// The default single-layer membrane.
    pub fn single() -> Self {
        Self::new("single", 1.0, 1.0, 1.0)
    }
}

/// Every membrane kind a species may switch to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembraneCatalog {
    membranes: Vec<MembraneType>,
}

impl MembraneCatalog {
    /// The stock membranes.
    pub fn standard() -> Self {
        Self {
            membranes: vec![
                MembraneType::single(),
                MembraneType::new("double", 0.85, 0.8, 1.3),
                MembraneType::new("cellulose", 0.7, 0.6, 1.6),
                MembraneType::new("chitin", 0.6, 0.5, 1.9),
            ],
        }
    }

    /// All membranes in catalog order.
    pub fn membranes(&self) -> &[MembraneType] {
        &self.membranes
    }

    /// Looks up a membrane by name.
    pub fn get(&self, name: &str) -> Result<MembraneType> {
        self.membranes
            .iter()
            .find(|m| m.name == name)
            .cloned()
            .ok_or_else(|| AutoEvoError::UnknownMembrane(name.to_string()))
    }
}

impl Default for MembraneCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
