//! The niche ("miche") tree: an arena of nodes, each carrying a pressure.
//!
//! A root-to-leaf path is one niche. Only leaves hold occupants, and a node
//! that holds an occupant never gains children.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::trace;

use super::cache::SimulationCache;
use super::error::{AutoEvoError, Result};
use super::pressure::{PressureKind, SelectionPressure};
use super::species::{Species, SpeciesKey};

/// Accumulated comparisons below this against every occupant end the descent.
pub const DISQUALIFICATION_THRESHOLD: f64 = -1.0;

/// Index of a node in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MicheId(pub usize);

#[derive(Debug, Clone)]
struct MicheNode {
    name: String,
    pressure: Arc<SelectionPressure>,
    parent: Option<MicheId>,
    children: Vec<MicheId>,
    occupant: Option<Species>,
}

/// A niche tree for one patch and one generation.
#[derive(Debug, Clone)]
pub struct MicheTree {
    nodes: Vec<MicheNode>,
}

impl MicheTree {
    /// A tree holding only a root node.
    pub fn new(name: &str, pressure: SelectionPressure) -> Self {
        Self {
            nodes: vec![MicheNode {
                name: name.to_string(),
                pressure: Arc::new(pressure),
                parent: None,
                children: Vec::new(),
                occupant: None,
            }],
        }
    }

    /// The root node.
    pub fn root(&self) -> MicheId {
        MicheId(0)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, id: MicheId) -> &MicheNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: MicheId) -> &mut MicheNode {
        &mut self.nodes[id.0]
    }

    /// Appends a child under `parent`.
    ///
    /// Fails if `parent` holds an occupant, since occupied nodes must stay
    /// leaves.
    pub fn add_child(
        &mut self,
        parent: MicheId,
        name: &str,
        pressure: SelectionPressure,
    ) -> Result<MicheId> {
        if parent.0 >= self.nodes.len() {
            return Err(AutoEvoError::InvariantViolation(format!(
                "parent node {} does not exist",
                parent.0
            )));
        }
        if self.node(parent).occupant.is_some() {
            return Err(AutoEvoError::InvariantViolation(format!(
                "cannot add `{name}` under occupied node `{}`",
                self.node(parent).name
            )));
        }

        let id = MicheId(self.nodes.len());
        self.nodes.push(MicheNode {
            name: name.to_string(),
            pressure: Arc::new(pressure),
            parent: Some(parent),
            children: Vec::new(),
            occupant: None,
        });
        self.node_mut(parent).children.push(id);
        Ok(id)
    }

    /// Diagnostic name of a node.
    pub fn name(&self, id: MicheId) -> &str {
        &self.node(id).name
    }

    /// Pressure of a node.
    pub fn pressure(&self, id: MicheId) -> &Arc<SelectionPressure> {
        &self.node(id).pressure
    }

    /// Parent of a node; `None` for the root.
    pub fn parent(&self, id: MicheId) -> Option<MicheId> {
        self.node(id).parent
    }

    /// Children of a node in insertion order.
    pub fn children(&self, id: MicheId) -> &[MicheId] {
        &self.node(id).children
    }

    /// Whether the node has no children.
    pub fn is_leaf(&self, id: MicheId) -> bool {
        self.node(id).children.is_empty()
    }

    /// Occupant of a leaf.
    pub fn occupant(&self, id: MicheId) -> Option<&Species> {
        self.node(id).occupant.as_ref()
    }

    /// Places `species` on a leaf, replacing any occupant.
    pub fn set_occupant(&mut self, id: MicheId, species: Species) -> Result<()> {
        if !self.is_leaf(id) {
            return Err(AutoEvoError::InvariantViolation(format!(
                "cannot occupy internal node `{}`",
                self.name(id)
            )));
        }
        self.node_mut(id).occupant = Some(species);
        Ok(())
    }

    /// Every leaf in depth-first order.
    pub fn leaves(&self) -> Vec<MicheId> {
        let mut leaves = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            if self.is_leaf(id) {
                leaves.push(id);
            }
            stack.extend(self.children(id).iter().rev());
        }
        leaves
    }

    /// Leaves with no occupant.
    pub fn empty_leaves(&self) -> Vec<MicheId> {
        self.leaves()
            .into_iter()
            .filter(|id| self.occupant(*id).is_none())
            .collect()
    }

    /// Nodes from the root down to `id`, inclusive.
    pub fn path_to_root(&self, id: MicheId) -> Vec<MicheId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Pressures along the root-to-`id` path.
    pub fn path_pressures(&self, id: MicheId) -> Vec<Arc<SelectionPressure>> {
        self.path_to_root(id)
            .into_iter()
            .map(|node| Arc::clone(self.pressure(node)))
            .collect()
    }

    /// Pressure names along the root-to-`id` path, root excluded.
    pub fn path_names(&self, id: MicheId) -> Vec<String> {
        self.path_to_root(id)
            .into_iter()
            .skip(1)
            .map(|node| self.pressure(node).name())
            .collect()
    }

    /// Every root-to-leaf path.
    pub fn all_traversals(&self) -> Vec<Vec<MicheId>> {
        self.leaves()
            .into_iter()
            .map(|leaf| self.path_to_root(leaf))
            .collect()
    }

    /// Distinct occupants in leaf order.
    pub fn all_occupants(&self) -> Vec<&Species> {
        self.occupants_in_subtree(self.root())
    }

    /// Distinct occupants of leaves under `id`, in leaf order.
    pub fn occupants_in_subtree(&self, id: MicheId) -> Vec<&Species> {
        let mut seen = BTreeSet::new();
        let mut occupants = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if let Some(occupant) = self.occupant(node) {
                if seen.insert(occupant.key()) {
                    occupants.push(occupant);
                }
            }
            stack.extend(self.children(node).iter().rev());
        }
        occupants
    }

    /// Leaves currently held by the species with `key`.
    pub fn leaves_occupied_by(&self, key: SpeciesKey) -> Vec<MicheId> {
        self.leaves()
            .into_iter()
            .filter(|id| self.occupant(*id).is_some_and(|s| s.key() == key))
            .collect()
    }

    /// Whether any leaf under `id` is empty.
    fn has_empty_leaf_under(&self, id: MicheId) -> bool {
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if self.is_leaf(node) && self.occupant(node).is_none() {
                return true;
            }
            stack.extend(self.children(node));
        }
        false
    }

    /// Occupants of predation niches targeting `prey`.
    pub fn predators_of(&self, prey: SpeciesKey) -> Vec<&Species> {
        let mut seen = BTreeSet::new();
        let mut predators = Vec::new();
        for path in self.all_traversals() {
            let Some(leaf) = path.last() else { continue };
            let Some(occupant) = self.occupant(*leaf) else {
                continue;
            };
            let hunts_prey = path.iter().any(|node| {
                self.pressure(*node)
                    .prey()
                    .is_some_and(|target| target.key() == prey)
            });
            if hunts_prey && seen.insert(occupant.key()) {
                predators.push(occupant);
            }
        }
        predators
    }

    /// Keys of every prey that already has a predation branch.
    pub fn hunted_prey(&self) -> BTreeSet<SpeciesKey> {
        self.nodes
            .iter()
            .filter_map(|node| match &node.pressure.kind {
                PressureKind::PredationEffectiveness(prey) => Some(prey.key()),
                _ => None,
            })
            .collect()
    }

    /// Root-exclusive pressure-name lists of every niche held by `key`.
    pub fn best_niches_for(&self, key: SpeciesKey) -> Vec<Vec<String>> {
        self.leaves_occupied_by(key)
            .into_iter()
            .map(|leaf| self.path_names(leaf))
            .collect()
    }

    /// Sum of `energy_provided` along every path `key` occupies.
    pub fn energy_for(&self, key: SpeciesKey) -> i64 {
        self.leaves_occupied_by(key)
            .into_iter()
            .flat_map(|leaf| self.path_to_root(leaf))
            .map(|node| self.pressure(node).energy_provided)
            .sum()
    }

    /// Verifies the structural invariants: occupants only on leaves and
    /// consistent parent links.
    pub fn check_invariants(&self) -> Result<()> {
        for (index, node) in self.nodes.iter().enumerate() {
            if node.occupant.is_some() && !node.children.is_empty() {
                return Err(AutoEvoError::InvariantViolation(format!(
                    "internal node `{}` holds an occupant",
                    node.name
                )));
            }
            for child in &node.children {
                if self.node(*child).parent != Some(MicheId(index)) {
                    return Err(AutoEvoError::InvariantViolation(format!(
                        "child `{}` of `{}` has a wrong parent link",
                        self.node(*child).name,
                        node.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Tries to place `candidate` in the tree.
    ///
    /// Returns whether it ended up occupying at least one leaf. An incumbent
    /// is displaced only when the candidate's accumulated weighted comparison
    /// along the path is strictly positive.
    pub fn insert_species(&mut self, candidate: &Species, cache: &SimulationCache) -> bool {
        let root = self.root();
        self.insert_below(root, candidate, cache, &BTreeMap::new())
    }

    fn insert_below(
        &mut self,
        id: MicheId,
        candidate: &Species,
        cache: &SimulationCache,
        accumulated: &BTreeMap<SpeciesKey, f64>,
    ) -> bool {
        let pressure = Arc::clone(self.pressure(id));
        if pressure.score(candidate, cache) <= 0.0 {
            return false;
        }

        let candidate_key = candidate.key();
        let mut scores = accumulated.clone();
        for occupant in self.occupants_in_subtree(id) {
            let key = occupant.key();
            if key == candidate_key {
                continue;
            }
            *scores.entry(key).or_insert(0.0) +=
                pressure.weighted_compare(candidate, occupant, cache);
        }

        if self.is_leaf(id) {
            let Some(occupant) = self.occupant(id) else {
                trace!(niche = %self.name(id), species = %candidate, "occupying empty niche");
                self.node_mut(id).occupant = Some(candidate.clone());
                return true;
            };

            let occupant_key = occupant.key();
            if occupant_key == candidate_key {
                return true;
            }
            if scores.get(&occupant_key).copied().unwrap_or(0.0) > 0.0 {
                trace!(
                    niche = %self.name(id),
                    species = %candidate,
                    replaced = %occupant,
                    "displacing incumbent"
                );
                self.node_mut(id).occupant = Some(candidate.clone());
                return true;
            }
            return false;
        }

        let rivals: Vec<SpeciesKey> = self
            .occupants_in_subtree(id)
            .iter()
            .map(|s| s.key())
            .filter(|key| *key != candidate_key)
            .collect();
        let disqualified = !rivals.is_empty()
            && rivals.iter().all(|key| {
                scores.get(key).copied().unwrap_or(0.0) < DISQUALIFICATION_THRESHOLD
            })
            && !self.has_empty_leaf_under(id);
        if disqualified {
            return false;
        }

        let children = self.children(id).to_vec();
        let mut placed = false;
        for child in children {
            placed |= self.insert_below(child, candidate, cache, &scores);
        }
        placed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::hex::Hex;
    use crate::simulation::layout::{PartLayout, PlacedPart};
    use crate::simulation::membrane::MembraneType;
    use crate::simulation::part::PartCatalog;
    use crate::simulation::species::{Cell, SpeciesId};

    fn blob(id: u64) -> Species {
        let parts = PartCatalog::standard();
        let layout = PartLayout::from_parts(vec![PlacedPart::new(
            parts.require("cytoplasm").unwrap(),
            Hex::ORIGIN,
            0,
        )]);
        Species::unicellular(
            SpeciesId(id),
            "Primum",
            "thrivium",
            Cell::new(layout, MembraneType::single(), 0.0),
        )
    }

    #[test]
    fn occupied_leaf_refuses_children() {
        let mut tree = MicheTree::new("root", SelectionPressure::no_op());
        let leaf = tree
            .add_child(tree.root(), "leaf", SelectionPressure::no_op())
            .unwrap();
        tree.set_occupant(leaf, blob(1)).unwrap();
        assert!(tree.add_child(leaf, "nested", SelectionPressure::no_op()).is_err());
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn internal_nodes_cannot_be_occupied() {
        let mut tree = MicheTree::new("root", SelectionPressure::no_op());
        tree.add_child(tree.root(), "leaf", SelectionPressure::no_op())
            .unwrap();
        assert!(tree.set_occupant(tree.root(), blob(1)).is_err());
    }

    #[test]
    fn paths_run_root_first() {
        let mut tree = MicheTree::new("root", SelectionPressure::no_op());
        let mid = tree
            .add_child(tree.root(), "mid", SelectionPressure::no_op())
            .unwrap();
        let leaf = tree.add_child(mid, "leaf", SelectionPressure::no_op()).unwrap();
        assert_eq!(tree.path_to_root(leaf), vec![tree.root(), mid, leaf]);
        assert_eq!(tree.leaves(), vec![leaf]);
    }
}
