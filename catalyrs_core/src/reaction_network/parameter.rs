//! This module provides the Parameter struct representing a symbolic constant

use std::fmt::{Display, Formatter};
use std::hash::Hash;

use derive_builder::Builder;

use crate::expression::{var, Expr};

/// Represents a named symbolic constant, such as a rate constant
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Used to identify the parameter (must be unique within a system)
    #[builder(setter(into))]
    pub name: String,
    /// Default value
    #[builder(default = "None")]
    pub default_value: Option<f64>,
    /// Human readable description of the parameter
    #[builder(default = "None")]
    pub description: Option<String>,
}

impl Parameter {
    /// Create a parameter without a default value
    pub fn new(name: &str) -> Parameter {
        Parameter {
            name: name.to_string(),
            default_value: None,
            description: None,
        }
    }

    /// Create a parameter with a default value
    pub fn with_default(name: &str, default: f64) -> Parameter {
        Parameter {
            name: name.to_string(),
            default_value: Some(default),
            description: None,
        }
    }

    /// Symbolic reference to this parameter
    pub fn expr(&self) -> Expr {
        var(&self.name)
    }

    pub(crate) fn renamed(&self, name: String) -> Parameter {
        Parameter {
            name,
            default_value: self.default_value,
            description: self.description.clone(),
        }
    }
}

impl From<&Parameter> for Expr {
    fn from(value: &Parameter) -> Self {
        value.expr()
    }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Hash for Parameter {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}
