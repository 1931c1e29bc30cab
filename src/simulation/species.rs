//! Species definitions: identity, body plan, membrane and behaviour.
//!
//! Species are value-like. Mutation clones a species and edits the clone,
//! never the original.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::layout::PartLayout;
use super::membrane::{MAX_RIGIDITY, MIN_RIGIDITY, MembraneType};
use super::physiology;

/// Upper bound of every behaviour scalar.
pub const MAX_BEHAVIOUR_VALUE: f32 = 400.0;

/// Lineage identifier assigned by the world registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct SpeciesId(pub u64);

/// Identity used by caches, niche trees and run results.
///
/// Two species are the same when they share a lineage and are structurally
/// identical. Mutants keep their parent's lineage until a run is committed,
/// so the fingerprint tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesKey {
    /// Lineage the species descends from.
    pub lineage: SpeciesId,
    /// Hash of every structural field.
    pub fingerprint: u64,
}

/// The five behaviour scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorAttribute {
    /// How much the species moves around unprompted.
    Activity,
    /// Willingness to attack.
    Aggression,
    /// Tendency to grab nearby resources.
    Opportunism,
    /// Commitment to one target.
    Focus,
    /// Tendency to flee.
    Fear,
}

/// Behaviour scalars, each within `[0, MAX_BEHAVIOUR_VALUE]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Behaviour {
    /// See [`BehaviorAttribute::Activity`].
    pub activity: f32,
    /// See [`BehaviorAttribute::Aggression`].
    pub aggression: f32,
    /// See [`BehaviorAttribute::Opportunism`].
    pub opportunism: f32,
    /// See [`BehaviorAttribute::Focus`].
    pub focus: f32,
    /// See [`BehaviorAttribute::Fear`].
    pub fear: f32,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            activity: 100.0,
            aggression: 100.0,
            opportunism: 100.0,
            focus: 100.0,
            fear: 100.0,
        }
    }
}

impl Behaviour {
    /// Reads one scalar.
    pub fn get(&self, attribute: BehaviorAttribute) -> f32 {
        match attribute {
            BehaviorAttribute::Activity => self.activity,
            BehaviorAttribute::Aggression => self.aggression,
            BehaviorAttribute::Opportunism => self.opportunism,
            BehaviorAttribute::Focus => self.focus,
            BehaviorAttribute::Fear => self.fear,
        }
    }

    /// Writes one scalar, clamped to its valid range.
    pub fn set(&mut self, attribute: BehaviorAttribute, value: f32) {
        let value = value.clamp(0.0, MAX_BEHAVIOUR_VALUE);
        match attribute {
            BehaviorAttribute::Activity => self.activity = value,
            BehaviorAttribute::Aggression => self.aggression = value,
            BehaviorAttribute::Opportunism => self.opportunism = value,
            BehaviorAttribute::Focus => self.focus = value,
            BehaviorAttribute::Fear => self.fear = value,
        }
    }

    /// `value / MAX_BEHAVIOUR_VALUE`.
    pub fn fraction(&self, attribute: BehaviorAttribute) -> f32 {
        self.get(attribute) / MAX_BEHAVIOUR_VALUE
    }
}

impl Hash for Behaviour {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for value in [
            self.activity,
            self.aggression,
            self.opportunism,
            self.focus,
            self.fear,
        ] {
            value.to_bits().hash(state);
        }
    }
}

/// One cell: its parts and outer boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Placed parts.
    pub layout: PartLayout,
    /// Membrane kind.
    pub membrane: MembraneType,
    /// Membrane rigidity in `[-1, 1]`.
    pub rigidity: f32,
}

impl Cell {
    /// Creates a cell, clamping rigidity into range.
    pub fn new(layout: PartLayout, membrane: MembraneType, rigidity: f32) -> Self {
        Self {
            layout,
            membrane,
            rigidity: rigidity.clamp(MIN_RIGIDITY, MAX_RIGIDITY),
        }
    }

    /// Prokaryotes have no nucleus.
    pub fn is_bacteria(&self) -> bool {
        !self.layout.has_nucleus()
    }
}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.layout.hash(state);
        self.membrane.name.hash(state);
        self.rigidity.to_bits().hash(state);
    }
}

/// Several cells acting as one organism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Hash)]
pub struct Colony {
    /// Member cells.
    pub cells: Vec<Cell>,
}

/// The organism kinds auto-evo distinguishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Hash)]
pub enum Organism {
    /// A single cell.
    Unicellular(Cell),
    /// A colony of cells.
    Multicellular(Colony),
}

/// A species as seen by auto-evo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    /// Lineage id.
    pub id: SpeciesId,
    /// Genus half of the display name.
    pub genus: String,
    /// Epithet half of the display name.
    pub epithet: String,
    /// The player's species is never removed automatically.
    pub player: bool,
    /// Body plan.
    pub organism: Organism,
    /// Behaviour scalars consumed by the creature AI.
    pub behaviour: Behaviour,
}

impl Species {
    /// Creates a unicellular species with default behaviour.
    pub fn unicellular(id: SpeciesId, genus: &str, epithet: &str, cell: Cell) -> Self {
        Self {
            id,
            genus: genus.to_string(),
            epithet: epithet.to_string(),
            player: false,
            organism: Organism::Unicellular(cell),
            behaviour: Behaviour::default(),
        }
    }

    /// "Genus epithet".
    pub fn formatted_name(&self) -> String {
        format!("{} {}", self.genus, self.epithet)
    }

    /// Hash of the body plan, membrane and behaviour.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.organism.hash(&mut hasher);
        self.behaviour.hash(&mut hasher);
        hasher.finish()
    }

    /// Identity of this species.
    pub fn key(&self) -> SpeciesKey {
        SpeciesKey {
            lineage: self.id,
            fingerprint: self.fingerprint(),
        }
    }

    /// The single cell of a unicellular species.
    pub fn cell(&self) -> Option<&Cell> {
        match &self.organism {
            Organism::Unicellular(cell) => Some(cell),
            Organism::Multicellular(_) => None,
        }
    }

    /// Mutable access to the single cell of a unicellular species.
    pub fn cell_mut(&mut self) -> Option<&mut Cell> {
        match &mut self.organism {
            Organism::Unicellular(cell) => Some(cell),
            Organism::Multicellular(_) => None,
        }
    }

    /// Every cell of the organism.
    pub fn cells(&self) -> Vec<&Cell> {
        match &self.organism {
            Organism::Unicellular(cell) => vec![cell],
            Organism::Multicellular(colony) => colony.cells.iter().collect(),
        }
    }

    /// Whether the organism has no nucleus anywhere.
    pub fn is_bacteria(&self) -> bool {
        self.cells().iter().all(|cell| cell.is_bacteria())
    }

    /// Distinct part types across every cell.
    pub fn part_types(&self) -> std::collections::BTreeSet<String> {
        self.cells()
            .iter()
            .flat_map(|cell| cell.layout.part_types())
            .collect()
    }

    /// Total part count across every cell.
    pub fn part_count(&self) -> usize {
        self.cells().iter().map(|cell| cell.layout.len()).sum()
    }

    /// Every cell forms a single connected region on the grid.
    pub fn is_structurally_valid(&self) -> bool {
        self.cells().iter().all(|cell| {
            !cell.layout.is_empty() && cell.layout.is_connected() && cell.layout.is_on_grid()
        })
    }

    /// Base movement speed derived from the body plan.
    pub fn base_speed(&self) -> f32 {
        physiology::species_speed(self)
    }

    /// Number of hexes the organism covers.
    pub fn base_hex_size(&self) -> f32 {
        physiology::species_hex_size(self)
    }
}

impl PartialEq for Species {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Species {}

impl Hash for Species {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.genus, self.epithet)
    }
}
