//! Module providing JSON IO for ReactionSystems
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::configuration::Configuration;
use crate::expression::Expr;
use crate::io::IoError;
use crate::reaction_network::parameter::Parameter;
use crate::reaction_network::reaction::{Reaction, StoichTerm};
use crate::reaction_network::species::Species;
use crate::reaction_network::system::ReactionSystem;

// region JSON System
/// Represents a JSON serialized reaction system, used for reading and writing systems in json
/// format
#[derive(Serialize, Deserialize)]
struct JsonSystem {
    name: String,
    independent_variable: Option<String>,
    species: Vec<JsonSpecies>,
    #[serde(default)]
    parameters: Vec<JsonParameter>,
    reactions: Vec<JsonReaction>,
    #[serde(default)]
    systems: Vec<JsonSystem>,
    combinatoric_ratelaw: Option<bool>,
}

#[derive(Serialize, Deserialize)]
struct JsonSpecies {
    name: String,
    default_value: Option<f64>,
    description: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct JsonParameter {
    name: String,
    default_value: Option<f64>,
    description: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct JsonReaction {
    rate: JsonExpr,
    #[serde(default)]
    substrates: IndexMap<String, f64>,
    #[serde(default)]
    products: IndexMap<String, f64>,
    #[serde(default)]
    rate_species: Vec<String>,
    #[serde(default)]
    only_use_rate: bool,
}

/// Serialized form of a rate expression, `{"Mul": [{"Var": "k"}, {"Const": 2.0}]}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum JsonExpr {
    Const(f64),
    Var(String),
    Add(Box<JsonExpr>, Box<JsonExpr>),
    Sub(Box<JsonExpr>, Box<JsonExpr>),
    Mul(Box<JsonExpr>, Box<JsonExpr>),
    Div(Box<JsonExpr>, Box<JsonExpr>),
    Pow(Box<JsonExpr>, Box<JsonExpr>),
    Exp(Box<JsonExpr>),
    Ln(Box<JsonExpr>),
}
// endregion JSON System

// region Conversions
impl From<JsonSpecies> for Species {
    fn from(s: JsonSpecies) -> Self {
        Self {
            name: s.name,
            default_value: s.default_value,
            description: s.description,
        }
    }
}

impl From<JsonParameter> for Parameter {
    fn from(p: JsonParameter) -> Self {
        Self {
            name: p.name,
            default_value: p.default_value,
            description: p.description,
        }
    }
}

impl From<&Species> for JsonSpecies {
    fn from(s: &Species) -> Self {
        Self {
            name: s.name.clone(),
            default_value: s.default_value,
            description: s.description.clone(),
        }
    }
}

impl From<&Parameter> for JsonParameter {
    fn from(p: &Parameter) -> Self {
        Self {
            name: p.name.clone(),
            default_value: p.default_value,
            description: p.description.clone(),
        }
    }
}

impl From<JsonExpr> for Expr {
    fn from(e: JsonExpr) -> Self {
        let boxed = |e: Box<JsonExpr>| Box::new(Expr::from(*e));
        match e {
            JsonExpr::Const(c) => Expr::Const(c),
            JsonExpr::Var(name) => Expr::Var(name),
            JsonExpr::Add(a, b) => Expr::Add(boxed(a), boxed(b)),
            JsonExpr::Sub(a, b) => Expr::Sub(boxed(a), boxed(b)),
            JsonExpr::Mul(a, b) => Expr::Mul(boxed(a), boxed(b)),
            JsonExpr::Div(a, b) => Expr::Div(boxed(a), boxed(b)),
            JsonExpr::Pow(a, b) => Expr::Pow(boxed(a), boxed(b)),
            JsonExpr::Exp(a) => Expr::Exp(boxed(a)),
            JsonExpr::Ln(a) => Expr::Ln(boxed(a)),
        }
    }
}

impl TryFrom<&Expr> for JsonExpr {
    type Error = IoError;

    fn try_from(e: &Expr) -> Result<Self, Self::Error> {
        fn boxed(e: &Expr) -> Result<Box<JsonExpr>, IoError> {
            Ok(Box::new(JsonExpr::try_from(e)?))
        }
        Ok(match e {
            Expr::Const(c) => JsonExpr::Const(*c),
            Expr::Var(name) => JsonExpr::Var(name.clone()),
            Expr::Add(a, b) => JsonExpr::Add(boxed(a)?, boxed(b)?),
            Expr::Sub(a, b) => JsonExpr::Sub(boxed(a)?, boxed(b)?),
            Expr::Mul(a, b) => JsonExpr::Mul(boxed(a)?, boxed(b)?),
            Expr::Div(a, b) => JsonExpr::Div(boxed(a)?, boxed(b)?),
            Expr::Pow(a, b) => JsonExpr::Pow(boxed(a)?, boxed(b)?),
            Expr::Exp(a) => JsonExpr::Exp(boxed(a)?),
            Expr::Ln(a) => JsonExpr::Ln(boxed(a)?),
            other => {
                return Err(IoError::SerializeError(format!(
                    "rate {} uses a function that can't be written to json",
                    other
                )))
            }
        })
    }
}

fn terms_from_json(terms: IndexMap<String, f64>) -> Vec<(Species, f64)> {
    terms
        .into_iter()
        .map(|(name, coefficient)| (Species::new(&name), coefficient))
        .collect()
}

fn terms_to_json(terms: &[StoichTerm]) -> IndexMap<String, f64> {
    terms
        .iter()
        .map(|t| (t.species.name.clone(), t.coefficient as f64))
        .collect()
}

impl ReactionSystem {
    /// Read a system from a json file
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<ReactionSystem, IoError> {
        let path = path.as_ref();
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => return Err(IoError::FileNotFound(format!("{}: {}", path.display(), err))),
        };
        ReactionSystem::from_json_str(&data)
    }

    /// Write the system to a json file
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), IoError> {
        let path = path.as_ref();
        let data = self.to_json_string()?;
        fs::write(path, data)
            .map_err(|err| IoError::FileNotFound(format!("{}: {}", path.display(), err)))
    }

    /// Parse a system from a json string
    pub fn from_json_str(data: &str) -> Result<ReactionSystem, IoError> {
        let json_system = match serde_json::from_str::<JsonSystem>(data) {
            Ok(system) => system,
            Err(err) => return Err(IoError::DeserializeError(format!("{:?}", err))),
        };
        ReactionSystem::from_json(json_system)
    }

    /// Serialize the system (including subsystems) to a json string
    pub fn to_json_string(&self) -> Result<String, IoError> {
        serde_json::to_string_pretty(&self.to_json()?)
            .map_err(|err| IoError::SerializeError(format!("{:?}", err)))
    }

    fn from_json(json_system: JsonSystem) -> Result<ReactionSystem, IoError> {
        let species: Vec<Species> = json_system.species.into_iter().map(Species::from).collect();
        let parameters: Vec<Parameter> = json_system
            .parameters
            .into_iter()
            .map(Parameter::from)
            .collect();
        // Reactions name their species, the system supplies the definitions
        let mut reactions = Vec::with_capacity(json_system.reactions.len());
        for rxn in json_system.reactions {
            let rate_species = rxn.rate_species.iter().map(|name| Species::new(name)).collect();
            let reaction = Reaction::new(
                rxn.rate.into(),
                terms_from_json(rxn.substrates),
                terms_from_json(rxn.products),
            )?
            .with_rate_species(rate_species)
            .with_only_use_rate(rxn.only_use_rate);
            reactions.push(reaction);
        }
        let iv = json_system
            .independent_variable
            .unwrap_or_else(|| Configuration::current().independent_variable);
        let mut system =
            ReactionSystem::from_parts(&json_system.name, &iv, species, parameters, reactions)?;
        if let Some(combinatoric) = json_system.combinatoric_ratelaw {
            system.set_combinatoric_ratelaw(combinatoric);
        }
        for child in json_system.systems {
            system.add_system(ReactionSystem::from_json(child)?)?;
        }
        Ok(system)
    }

    fn to_json(&self) -> Result<JsonSystem, IoError> {
        let mut reactions = Vec::with_capacity(self.num_reactions());
        for r in self.reactions() {
            reactions.push(JsonReaction {
                rate: JsonExpr::try_from(r.rate())?,
                substrates: terms_to_json(r.substrates()),
                products: terms_to_json(r.products()),
                rate_species: r.rate_species().iter().map(|s| s.name.clone()).collect(),
                only_use_rate: r.only_use_rate(),
            });
        }
        let mut systems = Vec::with_capacity(self.systems().len());
        for s in self.systems() {
            systems.push(s.to_json()?);
        }
        Ok(JsonSystem {
            name: self.name().to_string(),
            independent_variable: Some(self.iv().to_string()),
            species: self.species().map(JsonSpecies::from).collect(),
            parameters: self.parameters().map(JsonParameter::from).collect(),
            reactions,
            systems,
            combinatoric_ratelaw: Some(self.options().combinatoric_ratelaw),
        })
    }
}
// endregion Conversions
