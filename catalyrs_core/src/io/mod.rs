//! Module for reading and writing ReactionSystems
pub mod json;

use thiserror::Error;

use crate::reaction_network::ModelError;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("Unable to read or write {0}")]
    FileNotFound(String),
    #[error("Unable to parse json due to {0}")]
    DeserializeError(String),
    #[error("Unable to serialize system due to {0}")]
    SerializeError(String),
    #[error("Json describes an invalid system: {0}")]
    InvalidModel(#[from] ModelError),
}
