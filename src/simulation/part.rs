//! Body-plan parts (organelles) and the processes they run.
//!
//! The global [`PartCatalog`] is an explicit value handed to whoever needs it;
//! there is no process-wide registry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::compound::Compound;
use super::error::{AutoEvoError, Result};
use super::hex::Hex;

/// A chemical process with per-second input and output rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BioProcess {
    /// Stable identifier.
    pub name: String,
    /// Compounds consumed per run at rate 1.
    pub inputs: BTreeMap<Compound, f32>,
    /// Compounds produced per run at rate 1.
    pub outputs: BTreeMap<Compound, f32>,
}

impl BioProcess {
    fn new(name: &str, inputs: &[(Compound, f32)], outputs: &[(Compound, f32)]) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            inputs: inputs.iter().copied().collect(),
            outputs: outputs.iter().copied().collect(),
        })
    }
}

/// A process as run by one part, with its rate multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweakedProcess {
    /// The underlying process.
    pub process: Arc<BioProcess>,
    /// How many times per second the part runs it.
    pub rate: f32,
}

impl TweakedProcess {
    /// Cache identity: process name plus exact rate.
    pub fn key(&self) -> (String, u32) {
        (self.process.name.clone(), self.rate.to_bits())
    }
}

/// Static definition of a placeable part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartDefinition {
    /// Internal name, unique within a catalog.
    pub name: String,
    /// Footprint relative to the part's own origin, before rotation.
    pub hexes: Vec<Hex>,
    /// Contribution to cell mass.
    pub mass: f32,
    /// ATP per second spent keeping this part osmotically balanced.
    pub osmoregulation_cost: f32,
    /// Compound storage capacity added to the cell.
    pub storage: f32,
    /// Mutation point cost in the editor, used as a complexity proxy.
    pub mp_cost: f32,
    /// Only cells that already have a nucleus may gain this part.
    pub requires_nucleus: bool,
    /// This part is the nucleus.
    pub is_nucleus: bool,
    /// At most one copy per body plan.
    pub unique: bool,
    /// Flagellum momentum, if the part provides thrust.
    pub movement_momentum: Option<f32>,
    /// Cilia help turning and cost ATP.
    pub cilia: bool,
    /// Pili let a predator stab prey it cannot engulf.
    pub pilus: bool,
    /// Processes this part runs.
    pub processes: Vec<TweakedProcess>,
}

impl PartDefinition {
    fn basic(name: &str, mp_cost: f32) -> Self {
        Self {
            name: name.to_string(),
            hexes: vec![Hex::ORIGIN],
            mass: 0.1,
            osmoregulation_cost: 1.0,
            storage: 1.0,
            mp_cost,
            requires_nucleus: false,
            is_nucleus: false,
            unique: false,
            movement_momentum: None,
            cilia: false,
            pilus: false,
            processes: Vec::new(),
        }
    }

    fn with_process(mut self, process: &Arc<BioProcess>, rate: f32) -> Self {
        self.processes.push(TweakedProcess {
            process: Arc::clone(process),
            rate,
        });
        self
    }

    /// Number of grid cells the part covers.
    pub fn hex_count(&self) -> usize {
        self.hexes.len()
    }

    /// Whether the part contributes thrust.
    pub fn has_movement(&self) -> bool {
        self.movement_momentum.is_some()
    }

    /// Footprint after rotating by `orientation` steps.
    pub fn rotated_hexes(&self, orientation: u8) -> impl Iterator<Item = Hex> + '_ {
        self.hexes.iter().map(move |hex| hex.rotated(orientation))
    }

    /// Whether any process of this part consumes `compound`.
    pub fn consumes(&self, compound: Compound) -> bool {
        self.processes
            .iter()
            .any(|p| p.process.inputs.contains_key(&compound))
    }
}

/// The full list of parts the game knows about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartCatalog {
    parts: Vec<Arc<PartDefinition>>,
}

impl PartCatalog {
    /// Creates a catalog from explicit definitions.
    pub fn new(parts: Vec<PartDefinition>) -> Self {
        Self {
            parts: parts.into_iter().map(Arc::new).collect(),
        }
    }

    /// The stock set of microbe parts.
    pub fn standard() -> Self {
        let glycolysis = BioProcess::new(
            "glycolysis",
            &[(Compound::Glucose, 1.0)],
            &[(Compound::Atp, 2.0)],
        );
        let respiration = BioProcess::new(
            "respiration",
            &[(Compound::Glucose, 1.0), (Compound::Oxygen, 1.0)],
            &[(Compound::Atp, 16.0)],
        );
        let chemosynthesis = BioProcess::new(
            "chemosynthesis",
            &[(Compound::HydrogenSulfide, 1.0), (Compound::CarbonDioxide, 1.0)],
            &[(Compound::Glucose, 1.0)],
        );
        let photosynthesis = BioProcess::new(
            "photosynthesis",
            &[(Compound::CarbonDioxide, 1.0), (Compound::Sunlight, 1.0)],
            &[(Compound::Glucose, 1.0)],
        );
        let iron_chemolithoautotrophy = BioProcess::new(
            "iron_chemolithoautotrophy",
            &[(Compound::Iron, 1.0)],
            &[(Compound::Atp, 3.0)],
        );

        let cytoplasm = PartDefinition {
            storage: 4.0,
            ..PartDefinition::basic("cytoplasm", 22.0)
        }
        .with_process(&glycolysis, 1.0);

        let metabolosome =
            PartDefinition::basic("metabolosome", 45.0).with_process(&respiration, 1.0);

        let chemosynthesizing_proteins = PartDefinition::basic("chemoSynthesizingProteins", 45.0)
            .with_process(&chemosynthesis, 1.0)
            .with_process(&glycolysis, 1.0);

        let thylakoids = PartDefinition::basic("thylakoids", 45.0)
            .with_process(&photosynthesis, 1.0)
            .with_process(&glycolysis, 1.0);

        let rusticyanin = PartDefinition::basic("rusticyanin", 45.0)
            .with_process(&iron_chemolithoautotrophy, 1.0);

        let flagellum = PartDefinition {
            mass: 0.3,
            storage: 0.0,
            movement_momentum: Some(100.0),
            ..PartDefinition::basic("flagellum", 55.0)
        };

        let pilus = PartDefinition {
            storage: 0.0,
            pilus: true,
            ..PartDefinition::basic("pilus", 30.0)
        };

        let cilia = PartDefinition {
            storage: 0.0,
            cilia: true,
            ..PartDefinition::basic("cilia", 40.0)
        };

        let vacuole = PartDefinition {
            storage: 8.0,
            ..PartDefinition::basic("vacuole", 50.0)
        };

        let nucleus = PartDefinition {
            hexes: vec![
                Hex::new(0, 0),
                Hex::new(1, 0),
                Hex::new(0, 1),
                Hex::new(-1, 1),
                Hex::new(-1, 0),
                Hex::new(0, -1),
                Hex::new(1, -1),
            ],
            mass: 0.7,
            osmoregulation_cost: 3.0,
            storage: 10.0,
            is_nucleus: true,
            unique: true,
            ..PartDefinition::basic("nucleus", 70.0)
        };

        let mitochondrion = PartDefinition {
            hexes: vec![Hex::new(0, 0), Hex::new(1, 0)],
            mass: 0.2,
            storage: 2.0,
            requires_nucleus: true,
            ..PartDefinition::basic("mitochondrion", 45.0)
        }
        .with_process(&respiration, 2.0);

        let chloroplast = PartDefinition {
            hexes: vec![Hex::new(0, 0), Hex::new(1, 0), Hex::new(0, 1)],
            mass: 0.3,
            storage: 2.0,
            requires_nucleus: true,
            ..PartDefinition::basic("chloroplast", 55.0)
        }
        .with_process(&photosynthesis, 3.0);

        let chemoplast = PartDefinition {
            hexes: vec![Hex::new(0, 0), Hex::new(1, 0)],
            mass: 0.2,
            storage: 2.0,
            requires_nucleus: true,
            ..PartDefinition::basic("chemoplast", 45.0)
        }
        .with_process(&chemosynthesis, 2.0);

        Self::new(vec![
            cytoplasm,
            metabolosome,
            chemosynthesizing_proteins,
            thylakoids,
            rusticyanin,
            flagellum,
            pilus,
            cilia,
            vacuole,
            nucleus,
            mitochondrion,
            chloroplast,
            chemoplast,
        ])
    }

    /// All parts in catalog order.
    pub fn parts(&self) -> &[Arc<PartDefinition>] {
        &self.parts
    }

    /// Looks up a part by internal name.
    pub fn get(&self, name: &str) -> Option<&Arc<PartDefinition>> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Like [`PartCatalog::get`] but reports a missing part as an error.
    pub fn require(&self, name: &str) -> Result<Arc<PartDefinition>> {
        self.get(name)
            .cloned()
            .ok_or_else(|| AutoEvoError::UnknownPart(name.to_string()))
    }
}
