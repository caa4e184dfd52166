//! Rate expressions
//!
//! Rates are symbolic expressions of the `RustedSciThe` engine. The engine knows only named
//! variables, so whether a variable is a species, a parameter, or the independent variable is
//! decided here by name, against the species of a reaction or system.
use std::fmt::{Display, Formatter};

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

pub use RustedSciThe::symbolic::symbolic_engine::Expr;

/// The role a variable plays inside of a reaction system
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SymbolKind {
    /// A time varying species amount
    Species,
    /// A symbolic constant
    Parameter,
    /// The independent variable (time)
    Independent,
}

impl Display for SymbolKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolKind::Species => write!(f, "species"),
            SymbolKind::Parameter => write!(f, "parameter"),
            SymbolKind::Independent => write!(f, "independent variable"),
        }
    }
}

/// Errors raised while evaluating an expression
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ExprError {
    #[error("No value given for {0}")]
    UnboundSymbol(String),
    #[error("Expression evaluates to {0}")]
    NonFinite(f64),
}

/// A named variable
pub fn var(name: &str) -> Expr {
    Expr::Var(name.to_string())
}

pub fn constant(value: f64) -> Expr {
    Expr::Const(value)
}

/// Sum of `terms`, `0` if there are none
pub fn sum(terms: Vec<Expr>) -> Expr {
    terms
        .into_iter()
        .reduce(|acc, term| acc + term)
        .unwrap_or(Expr::Const(0f64))
}

/// Product of `factors`, `1` if there are none
pub fn product(factors: Vec<Expr>) -> Expr {
    factors
        .into_iter()
        .reduce(|acc, factor| acc * factor)
        .unwrap_or(Expr::Const(1f64))
}

/// Names of the variables of `expr`, each listed once
pub fn variables(expr: &Expr) -> IndexSet<String> {
    expr.all_arguments_are_variables().into_iter().collect()
}

/// Role of every variable of `expr`
///
/// A variable named `iv` is the independent variable, a variable for which `is_species` holds
/// is a species, and everything else is a parameter.
pub fn classify<F>(expr: &Expr, is_species: F, iv: &str) -> IndexMap<String, SymbolKind>
where
    F: Fn(&str) -> bool,
{
    variables(expr)
        .into_iter()
        .map(|name| {
            let kind = if name == iv {
                SymbolKind::Independent
            } else if is_species(&name) {
                SymbolKind::Species
            } else {
                SymbolKind::Parameter
            };
            (name, kind)
        })
        .collect()
}

/// Copy of `expr` with every variable for which `rename` gives a new name renamed
///
/// All variables are renamed at once, so a new name may coincide with an old one.
pub fn rename_variables<F>(expr: &Expr, rename: F) -> Expr
where
    F: Fn(&str) -> Option<String>,
{
    let mut renamed = expr.clone();
    let mut pending = Vec::new();
    for (i, name) in variables(expr).iter().enumerate() {
        if let Some(new_name) = rename(name) {
            // Rate variables never start with a NUL character
            let placeholder = format!("\u{0}{}", i);
            renamed = renamed.rename_variable(name, &placeholder);
            pending.push((placeholder, new_name));
        }
    }
    for (placeholder, new_name) in pending {
        renamed = renamed.rename_variable(&placeholder, &new_name);
    }
    renamed
}

/// Numeric value of `expr` with every variable taken from `values`
pub fn eval(expr: &Expr, values: &IndexMap<String, f64>) -> Result<f64, ExprError> {
    let names: Vec<String> = variables(expr).into_iter().collect();
    let mut args = Vec::with_capacity(names.len());
    for name in &names {
        match values.get(name) {
            Some(value) => args.push(*value),
            None => return Err(ExprError::UnboundSymbol(name.clone())),
        }
    }
    let f = expr.clone().lambdify_owned(names.iter().map(|n| n.as_str()).collect());
    let value = f(args);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ExprError::NonFinite(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    fn values(pairs: &[(&str, f64)]) -> IndexMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn variables_are_listed_once() {
        let expr = var("k") * var("X") * var("X") + var("k");
        let mut names: Vec<String> = variables(&expr).into_iter().collect();
        names.sort();
        assert_eq!(names, vec!["X".to_string(), "k".to_string()]);
        assert!(variables(&constant(2.)).is_empty());
    }

    #[test]
    fn classification_by_name() {
        let expr = var("k") * var("X") * var("t");
        let roles = classify(&expr, |name| name == "X", "t");
        assert_eq!(roles.get("X"), Some(&SymbolKind::Species));
        assert_eq!(roles.get("k"), Some(&SymbolKind::Parameter));
        assert_eq!(roles.get("t"), Some(&SymbolKind::Independent));
    }

    #[test]
    fn empty_sum_and_product() {
        assert_eq!(sum(vec![]), constant(0.));
        assert_eq!(product(vec![]), constant(1.));
        assert_eq!(sum(vec![var("A")]), var("A"));
    }

    #[test]
    fn evaluation() {
        let expr = var("k") * var("X").pow(constant(2.)) / constant(2.);
        assert_relative_eq!(eval(&expr, &values(&[("k", 3.), ("X", 4.)])).unwrap(), 24.);
        assert_eq!(
            eval(&expr, &values(&[("k", 3.)])),
            Err(ExprError::UnboundSymbol("X".to_string()))
        );
        let blow_up = constant(1.) / var("X");
        assert!(matches!(
            eval(&blow_up, &values(&[("X", 0.)])),
            Err(ExprError::NonFinite(_))
        ));
    }

    #[test]
    fn renaming_is_simultaneous() {
        // Swapping two names must not merge them
        let expr = var("a") - var("b");
        let swapped = rename_variables(&expr, |name| match name {
            "a" => Some("b".to_string()),
            "b" => Some("a".to_string()),
            _ => None,
        });
        let vals = values(&[("a", 5.), ("b", 2.)]);
        assert_relative_eq!(eval(&swapped, &vals).unwrap(), -3.);

        let prefixed = rename_variables(&(var("k") * var("t")), |name| {
            (name != "t").then(|| format!("sub₊{}", name))
        });
        let mut names: Vec<String> = variables(&prefixed).into_iter().collect();
        names.sort();
        assert_eq!(names, vec!["sub₊k".to_string(), "t".to_string()]);
    }
}
