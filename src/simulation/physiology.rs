//! Derived biological quantities: process throughput, energy balance, speed.
//!
//! Everything here is a pure function of a body plan and a patch's biome.
//! Results are memoized per generation by [`super::cache::SimulationCache`].

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::compound::Compound;
use super::hex::{Hex, forward, normalized, right};
use super::layout::{PartLayout, PlacedPart};
use super::part::TweakedProcess;
use super::patch::BiomeConditions;
use super::species::{Cell, Organism, Species};

/// Mass every cell has before its parts are counted.
pub const MICROBE_BASE_MASS: f32 = 0.7;
/// Force of a flagellum with momentum 100.
pub const FLAGELLA_BASE_FORCE: f32 = 0.75;
/// ATP per second a forward-pushing flagellum spends.
pub const FLAGELLA_ENERGY_COST: f32 = 4.0;
/// ATP per second a cilia patch spends.
pub const CILIA_ENERGY_COST: f32 = 2.0;
/// ATP per second per hex spent on basic movement.
pub const BASE_MOVEMENT_ATP_COST: f32 = 0.5;
/// Multiplier on the per-part osmoregulation costs.
pub const ATP_COST_FOR_OSMOREGULATION: f32 = 1.0;
/// How strongly rigidity slows a cell down.
pub const MEMBRANE_RIGIDITY_MOBILITY_MODIFIER: f32 = 0.1;
/// Weight of glucose output when scoring energy generation.
pub const GLUCOSE_USE_SCORE_MULTIPLIER: f32 = 1.0;
/// Weight of ATP output when scoring energy generation.
pub const ATP_USE_SCORE_MULTIPLIER: f32 = 0.5;

/// How fast a process can run in a biome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSpeedInfo {
    /// Product of `dissolved / needed` over environmental inputs.
    pub throttle: f32,
    /// Runs per second: part rate times throttle.
    pub current_speed: f32,
    /// Compounds consumed per second at `current_speed`.
    pub inputs: BTreeMap<Compound, f32>,
    /// Compounds produced per second at `current_speed`.
    pub outputs: BTreeMap<Compound, f32>,
}

/// ATP budget of a body plan in a biome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyBalance {
    /// ATP produced per second by every process.
    pub total_production: f32,
    /// ATP spent per second while standing still.
    pub total_consumption_stationary: f32,
    /// ATP spent per second while moving.
    pub total_consumption: f32,
    /// `total_production - total_consumption`.
    pub final_balance: f32,
    /// `total_production - total_consumption_stationary`.
    pub final_balance_stationary: f32,
    /// Osmoregulation share of the consumption.
    pub osmoregulation: f32,
    /// Per-hex movement share of the consumption.
    pub base_movement: f32,
    /// Flagella share of the consumption.
    pub flagella: f32,
    /// Cilia share of the consumption.
    pub cilia: f32,
    /// Production grouped by part name.
    pub production: BTreeMap<String, f32>,
    /// Consumption grouped by part name or cost category.
    pub consumption: BTreeMap<String, f32>,
}

impl EnergyBalance {
    fn add_production(&mut self, source: &str, amount: f32) {
        *self.production.entry(source.to_string()).or_insert(0.0) += amount;
    }

    fn add_consumption(&mut self, source: &str, amount: f32) {
        *self.consumption.entry(source.to_string()).or_insert(0.0) += amount;
    }
}

/// Product of `dissolved / needed` over a process's environmental inputs.
pub fn environmental_throttle(process: &TweakedProcess, biome: &BiomeConditions) -> f32 {
    process
        .process
        .inputs
        .iter()
        .filter(|(compound, _)| compound.is_environmental())
        .map(|(compound, needed)| biome.amount(*compound) / needed)
        .product()
}

/// Maximum speed of a process ignoring storage limits.
pub fn process_maximum_speed(process: &TweakedProcess, biome: &BiomeConditions) -> ProcessSpeedInfo {
    let throttle = environmental_throttle(process, biome);
    let current_speed = process.rate * throttle;

    let scale = |amounts: &BTreeMap<Compound, f32>| {
        amounts
            .iter()
            .map(|(compound, amount)| (*compound, amount * current_speed))
            .collect()
    };

    ProcessSpeedInfo {
        throttle,
        current_speed,
        inputs: scale(&process.process.inputs),
        outputs: scale(&process.process.outputs),
    }
}

/// Direction a part pushes the cell: from the part towards the origin.
pub fn part_direction(placed: &PlacedPart) -> Array1<f32> {
    normalized(&(Hex::ORIGIN.to_cartesian() - placed.position.to_cartesian()))
}

/// Sum of movement-part directions with one of each symmetric pair dropped.
///
/// Falls back to [`forward`] when the forces cancel out.
pub fn maximum_speed_direction(layout: &PartLayout) -> Array1<f32> {
    let movers: Vec<&PlacedPart> = layout.iter().filter(|p| p.part.has_movement()).collect();

    let mut direction = movers
        .iter()
        .fold(Array1::<f32>::zeros(2), |acc, placed| acc + part_direction(placed));

    for tested in &movers {
        direction = choose_from_symmetric_flagella(&movers, tested, direction);
    }

    if direction.iter().all(|v| v.abs() <= f32::EPSILON) {
        forward()
    } else {
        direction
    }
}

fn choose_from_symmetric_flagella(
    movers: &[&PlacedPart],
    tested: &PlacedPart,
    direction: Array1<f32>,
) -> Array1<f32> {
    let Some(mirror) = movers
        .iter()
        .find(|other| !std::ptr::eq(**other, tested) && other.position + tested.position == Hex::ORIGIN)
    else {
        return direction;
    };

    let length = |v: &Array1<f32>| v.dot(v).sqrt();
    let mirror_length = length(&(&direction - &part_direction(mirror)));
    let tested_length = length(&(&direction - &part_direction(tested)));

    if mirror_length > tested_length {
        direction
    } else {
        direction - part_direction(tested)
    }
}

fn directional_force(force: f32, factor: f32) -> f32 {
    if factor < 0.0 { 0.0 } else { force * factor }
}

/// Top speed of one cell. Zero without any movement part.
pub fn cell_speed(cell: &Cell) -> f32 {
    let mut mass = MICROBE_BASE_MASS;
    let mut forwards = 0.0;
    let mut backwards = 0.0;
    let mut rightwards = 0.0;
    let mut leftwards = 0.0;

    for placed in cell.layout.iter() {
        mass += placed.part.mass;

        let Some(momentum) = placed.part.movement_momentum else {
            continue;
        };

        let direction = part_direction(placed);
        let forward_factor = direction.dot(&forward());
        let right_factor = direction.dot(&right());
        let force = FLAGELLA_BASE_FORCE * momentum / 100.0;

        forwards += directional_force(force, forward_factor);
        backwards += directional_force(force, -forward_factor);
        rightwards += directional_force(force, right_factor);
        leftwards += directional_force(force, -right_factor);
    }

    let best = normalized(&maximum_speed_direction(&cell.layout));
    let forward_factor = best.dot(&forward());
    let right_factor = best.dot(&right());

    let organelle_force = directional_force(forwards, forward_factor)
        + directional_force(backwards, -forward_factor)
        + directional_force(rightwards, right_factor)
        + directional_force(leftwards, -right_factor);

    let membrane_modifier = cell.membrane.movement_factor
        * (1.0 - cell.rigidity * MEMBRANE_RIGIDITY_MOBILITY_MODIFIER);

    organelle_force * membrane_modifier / mass
}

/// ATP spent keeping the cell osmotically balanced.
pub fn osmoregulation_cost(cell: &Cell) -> f32 {
    ATP_COST_FOR_OSMOREGULATION
        * cell
            .layout
            .iter()
            .map(|p| p.part.osmoregulation_cost)
            .sum::<f32>()
        * cell.membrane.osmoregulation_factor
}

/// ATP spent on basic movement: a per-hex cost plus total part mass.
pub fn movement_cost(cell: &Cell) -> f32 {
    BASE_MOVEMENT_ATP_COST * cell.layout.hex_count() as f32
        + cell.layout.iter().map(|p| p.part.mass).sum::<f32>()
}

/// ATP budget of one cell in a biome.
pub fn cell_energy_balance(cell: &Cell, biome: &BiomeConditions) -> EnergyBalance {
    let mut balance = EnergyBalance::default();
    let mut process_production = 0.0;
    let mut process_consumption = 0.0;
    let mut movement_consumption = 0.0;
    let direction = maximum_speed_direction(&cell.layout);

    for placed in cell.layout.iter() {
        let name = placed.part.name.as_str();

        for process in &placed.part.processes {
            let speed = process_maximum_speed(process, biome);
            if let Some(amount) = speed.inputs.get(&Compound::Atp) {
                process_consumption += amount;
                balance.add_consumption(name, *amount);
            }
            if let Some(amount) = speed.outputs.get(&Compound::Atp) {
                process_production += amount;
                balance.add_production(name, *amount);
            }
        }

        if placed.part.has_movement() && part_direction(placed).dot(&direction) > 0.0 {
            movement_consumption += FLAGELLA_ENERGY_COST;
            balance.flagella += FLAGELLA_ENERGY_COST;
            balance.add_consumption(name, FLAGELLA_ENERGY_COST);
        }

        if placed.part.cilia {
            movement_consumption += CILIA_ENERGY_COST;
            balance.cilia += CILIA_ENERGY_COST;
            balance.add_consumption(name, CILIA_ENERGY_COST);
        }
    }

    balance.base_movement = movement_cost(cell);
    balance.add_consumption("baseMovement", balance.base_movement);

    balance.osmoregulation = osmoregulation_cost(cell);
    balance.add_consumption("osmoregulation", balance.osmoregulation);

    balance.total_production = process_production;
    balance.total_consumption_stationary = process_consumption + balance.osmoregulation;
    balance.total_consumption =
        balance.total_consumption_stationary + movement_consumption + balance.base_movement;
    balance.final_balance = balance.total_production - balance.total_consumption;
    balance.final_balance_stationary =
        balance.total_production - balance.total_consumption_stationary;

    balance
}

/// Compound storage capacity of a cell.
pub fn cell_storage(cell: &Cell) -> f32 {
    cell.layout.iter().map(|p| p.part.storage).sum()
}

/// Energy balance of a whole organism: the worst cell decides for colonies.
pub fn species_energy_balance(species: &Species, biome: &BiomeConditions) -> EnergyBalance {
    match &species.organism {
        Organism::Unicellular(cell) => cell_energy_balance(cell, biome),
        Organism::Multicellular(colony) => colony
            .cells
            .iter()
            .map(|cell| cell_energy_balance(cell, biome))
            .min_by(|a, b| a.final_balance.total_cmp(&b.final_balance))
            .unwrap_or_default(),
    }
}

/// Top speed of an organism; colonies move at their mean cell speed.
pub fn species_speed(species: &Species) -> f32 {
    match &species.organism {
        Organism::Unicellular(cell) => cell_speed(cell),
        Organism::Multicellular(colony) => {
            if colony.cells.is_empty() {
                return 0.0;
            }
            colony.cells.iter().map(cell_speed).sum::<f32>() / colony.cells.len() as f32
        }
    }
}

/// Hexes covered by the whole organism.
pub fn species_hex_size(species: &Species) -> f32 {
    species
        .cells()
        .iter()
        .map(|cell| cell.layout.hex_count() as f32)
        .sum()
}

/// Storage capacity of the whole organism.
pub fn species_storage(species: &Species) -> f32 {
    species.cells().iter().map(|cell| cell_storage(cell)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::membrane::MembraneType;
    use crate::simulation::part::PartCatalog;

    fn cell_with(parts: &[(&str, Hex)]) -> Cell {
        let catalog = PartCatalog::standard();
        let placed = parts
            .iter()
            .map(|(name, hex)| PlacedPart::new(catalog.require(name).unwrap(), *hex, 0))
            .collect();
        Cell::new(PartLayout::from_parts(placed), MembraneType::single(), 0.0)
    }

    #[test]
    fn rear_flagellum_pushes_forward() {
        let cell = cell_with(&[("cytoplasm", Hex::ORIGIN), ("flagellum", Hex::new(0, 1))]);
        let direction = normalized(&maximum_speed_direction(&cell.layout));
        assert!(direction.dot(&forward()) > 0.99);
        assert!(cell_speed(&cell) > 0.0);
    }

    #[test]
    fn symmetric_flagella_do_not_cancel() {
        let cell = cell_with(&[
            ("cytoplasm", Hex::ORIGIN),
            ("flagellum", Hex::new(0, 1)),
            ("flagellum", Hex::new(0, -1)),
        ]);
        assert!(cell_speed(&cell) > 0.0);
    }

    #[test]
    fn missing_dissolved_input_stalls_process() {
        let catalog = PartCatalog::standard();
        let thylakoids = catalog.require("thylakoids").unwrap();
        let dark = BiomeConditions::from_pairs(&[(Compound::CarbonDioxide, 0.1)]);
        let photosynthesis = &thylakoids.processes[0];
        assert_eq!(process_maximum_speed(photosynthesis, &dark).current_speed, 0.0);
    }
}
