//! This module provides a struct for representing reactions
use std::fmt::{Display, Formatter};

use indexmap::{IndexMap, IndexSet};

use crate::expression::{classify, rename_variables, variables, Expr, SymbolKind};
use crate::reaction_network::species::Species;
use crate::reaction_network::ModelError;

/// A species together with its stoichiometric coefficient on one side of a reaction
#[derive(Clone, Debug, PartialEq)]
pub struct StoichTerm {
    pub species: Species,
    /// Always a positive integer
    pub coefficient: u32,
}

/// Represents a single reaction of a network
///
/// Substrate and product lists are normalized on construction, repeated mentions of a species
/// are merged into one term (`X + X` becomes `2X`).
///
/// A variable of the rate is a species if it names a substrate, a product, or one of the
/// rate species. Every other variable except the independent variable is a parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Reaction {
    rate: Expr,
    substrates: Vec<StoichTerm>,
    products: Vec<StoichTerm>,
    /// Species read by the rate without being consumed or produced (enzymes, inducers)
    rate_species: Vec<Species>,
    only_use_rate: bool,
}

impl Reaction {
    /// Create a new reaction from raw substrate and product lists
    ///
    /// # Parameters
    /// - `rate`: symbolic rate expression
    /// - `substrates`: species consumed by the reaction, with their coefficients
    /// - `products`: species produced by the reaction, with their coefficients
    ///
    /// # Returns
    /// The normalized reaction, or [`ModelError::InvalidReaction`] if a coefficient is not a
    /// positive integer or both sides are empty.
    ///
    /// # Examples
    /// ```rust
    /// use catalyrs_core::expression::var;
    /// use catalyrs_core::reaction_network::reaction::Reaction;
    /// use catalyrs_core::reaction_network::species::Species;
    /// let s = Species::new("S");
    /// let i = Species::new("I");
    /// // S + I --> 2I
    /// let infection = Reaction::new(
    ///     var("β"),
    ///     vec![(s.clone(), 1.), (i.clone(), 1.)],
    ///     vec![(i.clone(), 2.)],
    /// )
    /// .unwrap();
    /// assert!(infection.is_mass_action());
    /// ```
    pub fn new(
        rate: Expr,
        substrates: Vec<(Species, f64)>,
        products: Vec<(Species, f64)>,
    ) -> Result<Reaction, ModelError> {
        let substrates = normalize_terms(substrates, "substrate")?;
        let products = normalize_terms(products, "product")?;
        if substrates.is_empty() && products.is_empty() {
            return Err(ModelError::InvalidReaction(
                "a reaction needs at least one substrate or product".to_string(),
            ));
        }
        Ok(Reaction {
            rate,
            substrates,
            products,
            rate_species: Vec::new(),
            only_use_rate: false,
        })
    }

    /// Mark the rate as a complete rate law that is used as is, without mass action terms
    pub fn with_only_use_rate(mut self, only_use_rate: bool) -> Reaction {
        self.only_use_rate = only_use_rate;
        self
    }

    /// Declare species that the rate reads but the reaction neither consumes nor produces
    ///
    /// Species already part of the reaction are skipped.
    pub fn with_rate_species(mut self, species: Vec<Species>) -> Reaction {
        for s in species {
            if !self.is_species(&s.name) {
                self.rate_species.push(s);
            }
        }
        self
    }

    pub fn rate(&self) -> &Expr {
        &self.rate
    }

    pub fn substrates(&self) -> &[StoichTerm] {
        &self.substrates
    }

    pub fn products(&self) -> &[StoichTerm] {
        &self.products
    }

    pub fn rate_species(&self) -> &[Species] {
        &self.rate_species
    }

    pub fn only_use_rate(&self) -> bool {
        self.only_use_rate
    }

    /// True if `name` is a substrate, a product, or a rate species of this reaction
    pub fn is_species(&self, name: &str) -> bool {
        self.substrates
            .iter()
            .chain(self.products.iter())
            .any(|t| t.species.name == name)
            || self.rate_species.iter().any(|s| s.name == name)
    }

    /// True if the rate law is generated from the stoichiometry by the law of mass action
    ///
    /// This is the case whenever the rate does not reference any species (and the reaction was
    /// not marked with [`Reaction::with_only_use_rate`]).
    pub fn is_mass_action(&self) -> bool {
        !self.only_use_rate && !self.rate_variables().iter().any(|v| self.is_species(v))
    }

    /// Net stoichiometry (product minus substrate coefficient) per species
    ///
    /// Species whose net change is zero (pure catalysts) are left out.
    pub fn net_stoichiometry(&self) -> IndexMap<String, i64> {
        let mut net: IndexMap<String, i64> = IndexMap::new();
        for term in &self.substrates {
            *net.entry(term.species.name.clone()).or_insert(0) -= term.coefficient as i64;
        }
        for term in &self.products {
            *net.entry(term.species.name.clone()).or_insert(0) += term.coefficient as i64;
        }
        net.retain(|_, v| *v != 0);
        net
    }

    /// All species of the reaction: substrates, then products, then rate species
    pub fn species(&self) -> Vec<&Species> {
        let mut seen: IndexMap<&str, &Species> = IndexMap::new();
        let stoichiometric = self.substrates.iter().chain(self.products.iter());
        for species in stoichiometric
            .map(|t| &t.species)
            .chain(self.rate_species.iter())
        {
            seen.entry(species.name.as_str()).or_insert(species);
        }
        seen.into_values().collect()
    }

    /// Names of the variables of the rate expression
    pub fn rate_variables(&self) -> IndexSet<String> {
        variables(&self.rate)
    }

    /// Role of every rate variable, `iv` being the independent variable
    pub fn rate_roles(&self, iv: &str) -> IndexMap<String, SymbolKind> {
        classify(&self.rate, |name| self.is_species(name), iv)
    }

    /// Copy of this reaction using the definitions returned by `lookup`
    ///
    /// Terms whose species `lookup` knows take that definition. Rate variables that `lookup`
    /// knows become rate species.
    pub(crate) fn adopt_species<'a, F>(&self, lookup: F) -> Reaction
    where
        F: Fn(&str) -> Option<&'a Species>,
    {
        let adopt_terms = |terms: &[StoichTerm]| -> Vec<StoichTerm> {
            terms
                .iter()
                .map(|t| StoichTerm {
                    species: lookup(&t.species.name).unwrap_or(&t.species).clone(),
                    coefficient: t.coefficient,
                })
                .collect()
        };
        let mut adopted = Reaction {
            rate: self.rate.clone(),
            substrates: adopt_terms(&self.substrates),
            products: adopt_terms(&self.products),
            rate_species: self
                .rate_species
                .iter()
                .map(|s| lookup(&s.name).unwrap_or(s).clone())
                .collect(),
            only_use_rate: self.only_use_rate,
        };
        for name in self.rate_variables() {
            if adopted.is_species(&name) {
                continue;
            }
            if let Some(species) = lookup(&name) {
                adopted.rate_species.push(species.clone());
            }
        }
        adopted
    }

    /// Copy of this reaction with every species and parameter name passed through `rename`
    ///
    /// The independent variable `iv` keeps its name.
    pub(crate) fn renamed<F>(&self, rename: &F, iv: &str) -> Reaction
    where
        F: Fn(&str) -> String,
    {
        let rename_terms = |terms: &[StoichTerm]| -> Vec<StoichTerm> {
            terms
                .iter()
                .map(|t| StoichTerm {
                    species: t.species.renamed(rename(&t.species.name)),
                    coefficient: t.coefficient,
                })
                .collect()
        };
        Reaction {
            rate: rename_variables(&self.rate, |name| (name != iv).then(|| rename(name))),
            substrates: rename_terms(&self.substrates),
            products: rename_terms(&self.products),
            rate_species: self
                .rate_species
                .iter()
                .map(|s| s.renamed(rename(&s.name)))
                .collect(),
            only_use_rate: self.only_use_rate,
        }
    }
}

/// Merge repeated mentions and validate coefficients
fn normalize_terms(terms: Vec<(Species, f64)>, side: &str) -> Result<Vec<StoichTerm>, ModelError> {
    let mut merged: IndexMap<String, StoichTerm> = IndexMap::new();
    for (species, coefficient) in terms {
        if species.name.is_empty() {
            return Err(ModelError::InvalidReaction(format!(
                "{} species must have a name",
                side
            )));
        }
        if !coefficient.is_finite() || coefficient <= 0f64 {
            return Err(ModelError::InvalidReaction(format!(
                "{} {} has non-positive coefficient {}",
                side, species.name, coefficient
            )));
        }
        if coefficient.fract() != 0f64 || coefficient > u32::MAX as f64 {
            return Err(ModelError::InvalidReaction(format!(
                "{} {} has non-integer coefficient {}",
                side, species.name, coefficient
            )));
        }
        let coefficient = coefficient as u32;
        match merged.get_mut(&species.name) {
            Some(existing) => {
                if existing.species != species {
                    return Err(ModelError::InvalidReaction(format!(
                        "{} {} is given with two different definitions",
                        side, species.name
                    )));
                }
                existing.coefficient = existing.coefficient.checked_add(coefficient).ok_or_else(
                    || {
                        ModelError::InvalidReaction(format!(
                            "{} {} has a coefficient that is too large",
                            side, species.name
                        ))
                    },
                )?;
            }
            None => {
                merged.insert(
                    species.name.clone(),
                    StoichTerm {
                        species,
                        coefficient,
                    },
                );
            }
        }
    }
    Ok(merged.into_values().collect())
}

fn fmt_side(terms: &[StoichTerm]) -> String {
    if terms.is_empty() {
        return "∅".to_string();
    }
    terms
        .iter()
        .map(|t| {
            if t.coefficient == 1 {
                t.species.name.clone()
            } else {
                format!("{}{}", t.coefficient, t.species.name)
            }
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

impl Display for Reaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let arrow = if self.only_use_rate { "=>" } else { "-->" };
        write!(
            f,
            "{}, {} {} {}",
            self.rate,
            fmt_side(&self.substrates),
            arrow,
            fmt_side(&self.products)
        )
    }
}
