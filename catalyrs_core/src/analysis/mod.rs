//! Structural analysis of reaction networks: stoichiometry, complexes, the complex graph and
//! conservation laws
//!
//! Every analysis reads a [`ReactionSystem`](crate::reaction_network::system::ReactionSystem)
//! without modifying its content. Results are memoized inside the system and invalidated by
//! the next mutation. Analyses only see the reactions of the system itself, call
//! [`flatten`](crate::reaction_network::system::ReactionSystem::flatten) first to include
//! subsystems.
pub mod complexes;
pub mod conservation;
pub mod graph;
mod linalg;
pub mod stoichiometry;

use thiserror::Error;

use crate::reaction_network::ModelError;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum AnalysisError {
    /// A derived quantity violates an invariant of reaction network theory
    #[error("Structural inconsistency: {0}")]
    StructuralInconsistency(String),
    #[error("State has {found} entries but the system has {expected} species")]
    StateDimensionMismatch { expected: usize, found: usize },
    #[error("Unable to build subnetwork: {0}")]
    Model(#[from] ModelError),
}
