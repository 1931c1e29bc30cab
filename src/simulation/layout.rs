//! Placed parts on the hex grid and the structural checks around them.
//!
//! A body plan is valid when no two parts overlap, every hex stays within
//! [`MAX_GRID_RADIUS`] of the origin and all parts form one connected region.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::hex::{Hex, HexSide};
use super::part::PartDefinition;

/// Hexes further than this from the origin are off the grid.
pub const MAX_GRID_RADIUS: i32 = 12;

/// How much more likely a forward-facing side is tried first.
const FORWARD_PLACEMENT_BIAS: f32 = 2.0;

/// A part at a position and orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedPart {
    /// The part's definition.
    pub part: Arc<PartDefinition>,
    /// Grid position of the part's origin hex.
    pub position: Hex,
    /// Rotation in sixty degree steps, `0..6`.
    pub orientation: u8,
}

impl PlacedPart {
    /// Creates a placement.
    pub fn new(part: Arc<PartDefinition>, position: Hex, orientation: u8) -> Self {
        Self {
            part,
            position,
            orientation: orientation % 6,
        }
    }

    /// Absolute grid cells covered by this placement.
    pub fn hexes(&self) -> impl Iterator<Item = Hex> + '_ {
        self.part
            .rotated_hexes(self.orientation)
            .map(move |hex| hex + self.position)
    }
}

/// An unordered set of placed parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartLayout {
    parts: Vec<PlacedPart>,
}

impl PartLayout {
    /// An empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a layout from placements without validating them.
    pub fn from_parts(parts: Vec<PlacedPart>) -> Self {
        Self { parts }
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the layout has no parts.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Iterates over the placements.
    pub fn iter(&self) -> std::slice::Iter<'_, PlacedPart> {
        self.parts.iter()
    }

    /// Total number of hexes covered.
    pub fn hex_count(&self) -> usize {
        self.parts.iter().map(|p| p.part.hex_count()).sum()
    }

    /// Map of every covered hex to the index of the part covering it.
    pub fn occupied_hexes(&self) -> BTreeMap<Hex, usize> {
        let mut occupied = BTreeMap::new();
        for (index, placed) in self.parts.iter().enumerate() {
            for hex in placed.hexes() {
                occupied.insert(hex, index);
            }
        }
        occupied
    }

    /// Whether a part with this name is present.
    pub fn contains_part(&self, name: &str) -> bool {
        self.parts.iter().any(|p| p.part.name == name)
    }

    /// Whether the body plan has a nucleus.
    pub fn has_nucleus(&self) -> bool {
        self.parts.iter().any(|p| p.part.is_nucleus)
    }

    /// Distinct part type names.
    pub fn part_types(&self) -> BTreeSet<String> {
        self.parts.iter().map(|p| p.part.name.clone()).collect()
    }

    /// Checks that `candidate` could be added: no overlap, on the grid,
    /// touching the existing body and respecting unique parts.
    pub fn can_place(&self, candidate: &PlacedPart) -> bool {
        if candidate.part.unique && self.contains_part(&candidate.part.name) {
            return false;
        }

        let occupied = self.occupied_hexes();
        let mut touches = occupied.is_empty();

        for hex in candidate.hexes() {
            if hex.distance(Hex::ORIGIN) > MAX_GRID_RADIUS || occupied.contains_key(&hex) {
                return false;
            }
            if !touches {
                touches = hex.neighbours().iter().any(|n| occupied.contains_key(n));
            }
        }

        touches
    }

    /// Adds a placement. Callers are expected to have checked [`PartLayout::can_place`].
    pub fn add(&mut self, placed: PlacedPart) {
        self.parts.push(placed);
    }

    /// Removes and returns the part at `index`.
    pub fn remove_at(&mut self, index: usize) -> PlacedPart {
        self.parts.remove(index)
    }

    /// Searches for a spot next to the existing body where `part` fits.
    ///
    /// Existing parts are visited in random order and each side of each hex
    /// is tried in a weighted random order favouring the front of the cell,
    /// at increasing radius, with every rotation. Returns `None` when nothing
    /// fits.
    pub fn find_realistic_position<R: Rng + ?Sized>(
        &self,
        part: &Arc<PartDefinition>,
        rng: &mut R,
        max_radius: i32,
    ) -> Option<PlacedPart> {
        if self.parts.is_empty() {
            let placed = PlacedPart::new(Arc::clone(part), Hex::ORIGIN, 0);
            return self.can_place(&placed).then_some(placed);
        }

        let mut order: Vec<usize> = (0..self.parts.len()).collect();
        order.shuffle(rng);

        for index in order {
            let anchor = &self.parts[index];
            for hex in anchor.hexes() {
                for side in weighted_side_order(rng) {
                    for radius in 1..=max_radius {
                        let position = hex + side.offset() * radius;
                        for orientation in 0..6u8 {
                            let candidate = PlacedPart::new(Arc::clone(part), position, orientation);
                            if self.can_place(&candidate) {
                                return Some(candidate);
                            }
                        }
                    }
                }
            }
        }

        None
    }

    /// Groups part indices into connected regions, largest region first.
    pub fn islands(&self) -> Vec<Vec<usize>> {
        let occupied = self.occupied_hexes();
        let mut seen = vec![false; self.parts.len()];
        let mut regions = Vec::new();

        for start in 0..self.parts.len() {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut region = Vec::new();
            let mut queue = VecDeque::from([start]);

            while let Some(index) = queue.pop_front() {
                region.push(index);
                for hex in self.parts[index].hexes() {
                    for neighbour in hex.neighbours() {
                        if let Some(&other) = occupied.get(&neighbour) {
                            if !seen[other] {
                                seen[other] = true;
                                queue.push_back(other);
                            }
                        }
                    }
                }
            }

            region.sort_unstable();
            regions.push(region);
        }

        regions.sort_by(|a, b| b.len().cmp(&a.len()).then(a[0].cmp(&b[0])));
        regions
    }

    /// Whether every part belongs to one connected region.
    pub fn is_connected(&self) -> bool {
        self.islands().len() <= 1
    }

    /// Whether every covered hex lies within [`MAX_GRID_RADIUS`].
    pub fn is_on_grid(&self) -> bool {
        self.parts
            .iter()
            .flat_map(|p| p.hexes())
            .all(|hex| hex.distance(Hex::ORIGIN) <= MAX_GRID_RADIUS)
    }

    /// Pulls disconnected clusters back onto the main body.
    ///
    /// The main body is the region holding the origin hex, or the largest one
    /// if nothing covers the origin. Each island is translated one hex step at
    /// a time along the shortest hex path towards the nearest main-body hex
    /// until it touches. Distinct regions are always at least two steps
    /// apart, so a single step can never overlap anything.
    pub fn attach_island_hexes(&mut self) {
        loop {
            let regions = self.islands();
            if regions.len() <= 1 {
                return;
            }

            let origin_owner = self.occupied_hexes().get(&Hex::ORIGIN).copied();
            let main_index = origin_owner
                .and_then(|owner| regions.iter().position(|r| r.contains(&owner)))
                .unwrap_or(0);

            let main_hexes: Vec<Hex> = regions[main_index]
                .iter()
                .flat_map(|&i| self.parts[i].hexes().collect::<Vec<_>>())
                .collect();

            let island = regions
                .iter()
                .enumerate()
                .find(|(i, _)| *i != main_index)
                .map(|(_, r)| r.clone())
                .unwrap_or_default();

            let mut best: Option<(i32, Hex, Hex)> = None;
            for &index in &island {
                for hex in self.parts[index].hexes() {
                    for &target in &main_hexes {
                        let distance = hex.distance(target);
                        if best.is_none_or(|(d, _, _)| distance < d) {
                            best = Some((distance, hex, target));
                        }
                    }
                }
            }

            let Some((_, from, to)) = best else {
                return;
            };

            let step = from.step_towards(to);
            if step == Hex::ORIGIN {
                return;
            }
            for &index in &island {
                self.parts[index].position = self.parts[index].position + step;
            }
        }
    }

    fn sorted_signature(&self) -> Vec<(&str, Hex, u8)> {
        let mut signature: Vec<(&str, Hex, u8)> = self
            .parts
            .iter()
            .map(|p| (p.part.name.as_str(), p.position, p.orientation))
            .collect();
        signature.sort_unstable();
        signature
    }
}

impl Hash for PartLayout {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sorted_signature().hash(state);
    }
}

/// Sides shuffled with a bias towards the front of the cell.
fn weighted_side_order<R: Rng + ?Sized>(rng: &mut R) -> Vec<HexSide> {
    let mut keyed: Vec<(f32, HexSide)> = HexSide::ALL
        .into_iter()
        .map(|side| {
            let weight = if side.is_forward() {
                FORWARD_PLACEMENT_BIAS
            } else {
                1.0
            };
            (rng.random::<f32>() * weight, side)
        })
        .collect();
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
    keyed.into_iter().map(|(_, side)| side).collect()
}
