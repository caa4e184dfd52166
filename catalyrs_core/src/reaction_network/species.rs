//! This module provides the Species struct representing a time varying amount

use std::fmt::{Display, Formatter};
use std::hash::Hash;

use derive_builder::Builder;

use crate::expression::{var, Expr};

/// Represents a species (a concentration or a molecule count)
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Species {
    /// Used to identify the species (must be unique within a system)
    #[builder(setter(into))]
    pub name: String,
    /// Default initial value
    #[builder(default = "None")]
    pub default_value: Option<f64>,
    /// Human readable description of the species
    #[builder(default = "None")]
    pub description: Option<String>,
}

impl Species {
    /// Create a species without a default value
    pub fn new(name: &str) -> Species {
        Species {
            name: name.to_string(),
            default_value: None,
            description: None,
        }
    }

    /// Create a species with a default initial value
    pub fn with_default(name: &str, default: f64) -> Species {
        Species {
            name: name.to_string(),
            default_value: Some(default),
            description: None,
        }
    }

    /// Symbolic reference to this species
    pub fn expr(&self) -> Expr {
        var(&self.name)
    }

    pub(crate) fn renamed(&self, name: String) -> Species {
        Species {
            name,
            default_value: self.default_value,
            description: self.description.clone(),
        }
    }
}

impl From<&Species> for Expr {
    fn from(value: &Species) -> Self {
        value.expr()
    }
}

impl Display for Species {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Hash for Species {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state); // Identity is by name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let s = SpeciesBuilder::default().name("S").build().unwrap();
        assert_eq!(s, Species::new("S"));

        let i = SpeciesBuilder::default()
            .name("I")
            .default_value(Some(1.0))
            .build()
            .unwrap();
        assert_eq!(i, Species::with_default("I", 1.0));
        assert_eq!(i.expr(), var("I"));
    }

    #[test]
    fn missing_name() {
        assert!(SpeciesBuilder::default().build().is_err());
    }
}
