//! Module providing the ReactionSystem struct and the entities it is built from.

pub mod cache;
pub mod parameter;
pub mod reaction;
pub mod species;
pub mod system;

use std::fmt::{Display, Formatter};

use thiserror::Error;

/// The role a name plays inside a reaction system
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Role {
    Species,
    Parameter,
    IndependentVariable,
    Subsystem,
    Reaction,
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Species => write!(f, "species"),
            Role::Parameter => write!(f, "parameter"),
            Role::IndependentVariable => write!(f, "independent variable"),
            Role::Subsystem => write!(f, "subsystem"),
            Role::Reaction => write!(f, "reaction"),
        }
    }
}

/// Errors raised while building or modifying a reaction system
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ModelError {
    /// Malformed stoichiometry, coefficient, or rate
    #[error("Invalid reaction: {0}")]
    InvalidReaction(String),
    /// A name was reused for a different role, or re-added under the `Error` duplicate policy
    #[error("Name {name} is already used as a {existing}, it can't be added as a {attempted}")]
    DuplicateName {
        name: String,
        existing: Role,
        attempted: Role,
    },
    /// The same name maps to incompatible definitions
    #[error("Conflicting definitions for {name}: {reason}")]
    NameConflict { name: String, reason: String },
}
