//! # Autoevo - Automatic Species Evolution
//!
//! A headless engine that evolves the species of a patch map between game
//! generations. Each patch builds a tree of niches from its energy sources,
//! species compete for the niches, occupants mutate to fit them better and
//! the winners' populations follow from the energy their niches provide.
//!
//! ## Features
//!
//! - Niche trees with predation niches derived per trophic level
//! - Mutation search over hex body plans, membranes and behaviour
//! - Physiology scoring (energy balance, speed, storage, predation)
//! - Seeded, reproducible runs with parallel patch processing
//! - Atomic commit of new species, ancestry and populations
//! - Save/load of worlds and parameters
//!
//! ## Core Modules
//!
//! - [`simulation::pipeline`] - Per-generation run
//! - [`simulation::miche`] - Niche tree and species insertion
//! - [`simulation::search`] - Mutation search
//! - [`simulation::pressure`] - Selection pressures and scoring
//! - [`simulation::results`] - Run results and commit

/// Core auto-evo logic and data structures.
pub mod simulation {
    /// Memoized physiology scores for one patch.
    pub mod cache;
    /// Per-species subset of parts and membranes offered to mutation.
    pub mod catalog;
    /// Compounds that drive processes and niches.
    pub mod compound;
    /// Error types.
    pub mod error;
    /// Axial hex coordinates.
    pub mod hex;
    /// Hex body plans and placement search.
    pub mod layout;
    /// Membrane types.
    pub mod membrane;
    /// Niche tree and species insertion.
    pub mod miche;
    /// Builders for the standard niche branches.
    pub mod miche_factory;
    /// Genus and epithet generation.
    pub mod naming;
    /// Run parameters.
    pub mod params;
    /// Part definitions and processes.
    pub mod part;
    /// Patches and the world registry.
    pub mod patch;
    /// Energy balance, speed and storage calculations.
    pub mod physiology;
    /// Per-generation run over every patch.
    ///
    /// See [`pipeline::run_generation`] for the read-only run and
    /// [`pipeline::run_generation_and_apply`] for a run that commits.
    pub mod pipeline;
    /// Selection pressures and their scoring.
    pub mod pressure;
    /// Merged run results and the commit step.
    pub mod results;
    /// Mutation search along a niche path.
    pub mod search;
    /// Species, cells and behaviour.
    pub mod species;
    /// Mutation strategies.
    pub mod strategy;
}
