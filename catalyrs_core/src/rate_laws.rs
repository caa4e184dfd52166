//! Rate laws for deterministic (ODE) and stochastic (jump) interpretations of a reaction, and
//! the common named kinetics
use indexmap::IndexMap;

use crate::expression::{sum, Expr};
use crate::reaction_network::reaction::{Reaction, StoichTerm};
use crate::reaction_network::system::ReactionSystem;

// region Named Kinetics
/// Hill function, `v*X^n/(X^n + K^n)`
pub fn hill(x: Expr, v: Expr, k: Expr, n: Expr) -> Expr {
    let xn = x.pow(n.clone());
    v * xn.clone() / (xn + k.pow(n))
}

/// Repressive Hill function, `v*K^n/(X^n + K^n)`
pub fn hillr(x: Expr, v: Expr, k: Expr, n: Expr) -> Expr {
    let kn = k.pow(n.clone());
    v * kn.clone() / (x.pow(n) + kn)
}

/// Hill function with an activator `X` and a repressor `Y`, `v*X^n/(X^n + Y^n + K^n)`
pub fn hillar(x: Expr, y: Expr, v: Expr, k: Expr, n: Expr) -> Expr {
    let xn = x.pow(n.clone());
    v * xn.clone() / (xn + y.pow(n.clone()) + k.pow(n))
}

/// Michaelis-Menten function, `v*X/(X + K)`
pub fn mm(x: Expr, v: Expr, k: Expr) -> Expr {
    v * x.clone() / (x + k)
}

/// Repressive Michaelis-Menten function, `v*K/(X + K)`
pub fn mmr(x: Expr, v: Expr, k: Expr) -> Expr {
    v * k.clone() / (x + k)
}
// endregion Named Kinetics

// region Rate Laws
fn factorial(n: u32) -> f64 {
    (2..=n).map(|i| i as f64).product()
}

fn combinatoric_divisor(substrates: &[StoichTerm]) -> f64 {
    substrates.iter().map(|t| factorial(t.coefficient)).product()
}

/// Deterministic rate law of a reaction
///
/// For a mass action reaction this is `rate * Π X^n / n!` over the substrates, where the
/// factorials are only included if `combinatoric` is set. Otherwise the rate is used as is.
///
/// # Examples
/// ```rust
/// use catalyrs_core::expression::{eval, var};
/// use catalyrs_core::rate_laws::ode_rate_law;
/// use catalyrs_core::reaction_network::reaction::Reaction;
/// use catalyrs_core::reaction_network::species::Species;
/// use indexmap::IndexMap;
/// let x = Species::new("X");
/// let dimerization = Reaction::new(
///     var("k"),
///     vec![(x.clone(), 2.)],
///     vec![(Species::new("X₂"), 1.)],
/// )
/// .unwrap();
/// let values: IndexMap<String, f64> = [("k".to_string(), 1.), ("X".to_string(), 4.)].into();
/// // k*X^2/2
/// assert_eq!(eval(&ode_rate_law(&dimerization, true), &values).unwrap(), 8.);
/// assert_eq!(eval(&ode_rate_law(&dimerization, false), &values).unwrap(), 16.);
/// ```
pub fn ode_rate_law(reaction: &Reaction, combinatoric: bool) -> Expr {
    if !reaction.is_mass_action() {
        return reaction.rate().clone();
    }
    let mut law = reaction.rate().clone();
    for term in reaction.substrates() {
        let x = term.species.expr();
        law = if term.coefficient == 1 {
            law * x
        } else {
            law * x.pow(Expr::Const(term.coefficient as f64))
        };
    }
    let divisor = combinatoric_divisor(reaction.substrates());
    if combinatoric && divisor != 1f64 {
        law / Expr::Const(divisor)
    } else {
        law
    }
}

/// Stochastic propensity of a reaction, in molecule counts
///
/// For a mass action reaction this is `rate * Π C(X, n) * n!` over the substrates, that is
/// the falling factorial `rate * Π X(X-1)...(X-n+1)`. Catalysts appearing as products do not
/// change the propensity. Otherwise the rate is used as is.
pub fn jump_rate_law(reaction: &Reaction) -> Expr {
    if !reaction.is_mass_action() {
        return reaction.rate().clone();
    }
    let mut law = reaction.rate().clone();
    for term in reaction.substrates() {
        let x = term.species.expr();
        for i in 0..term.coefficient {
            law = if i == 0 {
                law * x.clone()
            } else {
                law * (x.clone() - Expr::Const(i as f64))
            };
        }
    }
    law
}

/// How a reaction is treated by jump process simulators
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum JumpKind {
    /// Mass action propensity with a time independent rate
    MassAction,
    /// Time independent propensity that is not mass action
    ConstantRate,
    /// Propensity depending explicitly on the independent variable
    VariableRate,
}

impl Reaction {
    /// Classify the reaction for jump simulation, `iv` is the independent variable
    pub fn jump_kind(&self, iv: &str) -> JumpKind {
        if self.rate_variables().contains(iv) {
            JumpKind::VariableRate
        } else if self.is_mass_action() {
            JumpKind::MassAction
        } else {
            JumpKind::ConstantRate
        }
    }
}
// endregion Rate Laws

impl ReactionSystem {
    /// ODE rate law of every reaction, honoring the system's combinatoric setting
    pub fn ode_rate_laws(&self) -> Vec<Expr> {
        let combinatoric = self.options().combinatoric_ratelaw;
        self.reactions()
            .iter()
            .map(|r| ode_rate_law(r, combinatoric))
            .collect()
    }

    /// Jump rate law of every reaction
    pub fn jump_rate_laws(&self) -> Vec<Expr> {
        self.reactions().iter().map(jump_rate_law).collect()
    }

    pub fn jump_kinds(&self) -> Vec<JumpKind> {
        self.reactions()
            .iter()
            .map(|r| r.jump_kind(self.iv()))
            .collect()
    }

    /// Right hand side of the reaction rate equations, `dX_i/dt = Σ_j N_ij * law_j`
    ///
    /// Every species gets an entry, species that never change map to `0`.
    pub fn ode_equations(&self) -> IndexMap<String, Expr> {
        let net = self.stoichiometry();
        let laws = self.ode_rate_laws();
        self.species()
            .enumerate()
            .map(|(i, species)| {
                let terms = laws
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| net.net[(i, *j)] != 0)
                    .map(|(j, law)| match net.net[(i, j)] {
                        1 => law.clone(),
                        n => Expr::Const(n as f64) * law.clone(),
                    })
                    .collect();
                (species.name.clone(), sum(terms))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{eval, var, variables};
    use crate::reaction_network::species::Species;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    fn values(pairs: &[(&str, f64)]) -> IndexMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn sir() -> ReactionSystem {
        let (s, i, r) = (Species::new("S"), Species::new("I"), Species::new("R"));
        ReactionSystem::new(
            "sir",
            vec![
                Reaction::new(
                    var("β"),
                    vec![(s.clone(), 1.), (i.clone(), 1.)],
                    vec![(i.clone(), 2.)],
                )
                .unwrap(),
                Reaction::new(var("γ"), vec![(i.clone(), 1.)], vec![(r.clone(), 1.)]).unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn named_kinetics() {
        let (x, y) = (var("X"), var("Y"));
        let (v, k) = (var("v"), var("K"));
        let two = Expr::Const(2.);
        let vals = values(&[("X", 2.), ("Y", 1.), ("v", 3.), ("K", 2.)]);
        let at = |expr: Expr| eval(&expr, &vals).unwrap();
        assert_relative_eq!(at(hill(x.clone(), v.clone(), k.clone(), two.clone())), 1.5);
        assert_relative_eq!(at(hillr(x.clone(), v.clone(), k.clone(), two.clone())), 1.5);
        assert_relative_eq!(at(mm(x.clone(), v.clone(), k.clone())), 1.5);
        assert_relative_eq!(at(mmr(var("Y"), v.clone(), k.clone())), 2.);
        assert_relative_eq!(
            at(hillar(x, y, v, k, Expr::Const(1.))),
            6. / 5.,
            epsilon = 1e-12
        );
    }

    #[test]
    fn unit_coefficients_reduce() {
        let system = sir();
        let ode = system.ode_rate_laws();
        let vals = values(&[("β", 2.), ("γ", 0.5), ("S", 3.), ("I", 5.)]);
        assert_relative_eq!(eval(&ode[0], &vals).unwrap(), 30.);
        assert_relative_eq!(eval(&ode[1], &vals).unwrap(), 2.5);
        assert_eq!(system.jump_rate_laws(), ode);
    }

    #[test]
    fn dimerization_laws() {
        let x = Species::new("X");
        let rx = Reaction::new(var("k"), vec![(x.clone(), 2.)], vec![(Species::new("D"), 1.)])
            .unwrap();
        let jump = jump_rate_law(&rx);
        // C(5, 2) * 2! = 20 ordered pairs out of five molecules
        assert_relative_eq!(eval(&jump, &values(&[("k", 1.), ("X", 5.)])).unwrap(), 20.);
        let vals = values(&[("k", 2.), ("X", 5.)]);
        assert_relative_eq!(eval(&jump, &vals).unwrap(), 2. * 5. * 4.);
        assert_relative_eq!(eval(&ode_rate_law(&rx, true), &vals).unwrap(), 25.);
        assert_relative_eq!(eval(&ode_rate_law(&rx, false), &vals).unwrap(), 50.);
    }

    #[test]
    fn catalytic_propensity_ignores_products() {
        let (e, s, p) = (Species::new("E"), Species::new("S"), Species::new("P"));
        let rx = Reaction::new(
            var("k"),
            vec![(e.clone(), 1.), (s.clone(), 2.)],
            vec![(e.clone(), 1.), (p.clone(), 1.)],
        )
        .unwrap();
        let vals = values(&[("k", 1.), ("E", 3.), ("S", 4.)]);
        // 3 * C(4, 2) * 2!
        assert_relative_eq!(eval(&jump_rate_law(&rx), &vals).unwrap(), 36.);
    }

    #[test]
    fn non_mass_action_is_literal() {
        let (x, y) = (Species::new("X"), Species::new("Y"));
        let rate = mm(x.expr(), var("v"), var("K"));
        let rx = Reaction::new(rate.clone(), vec![(x.clone(), 1.)], vec![(y.clone(), 1.)]).unwrap();
        assert_eq!(ode_rate_law(&rx, true), rate);
        assert_eq!(jump_rate_law(&rx), rate);
        assert_eq!(rx.jump_kind("t"), JumpKind::ConstantRate);

        let literal = Reaction::new(var("k"), vec![(x.clone(), 2.)], vec![])
            .unwrap()
            .with_only_use_rate(true);
        assert_eq!(ode_rate_law(&literal, true), var("k"));
        assert_eq!(literal.jump_kind("t"), JumpKind::ConstantRate);
    }

    #[test]
    fn jump_kinds() {
        let x = Species::new("X");
        let timed = Reaction::new(var("k") * var("t"), vec![(x.clone(), 1.)], vec![]).unwrap();
        assert_eq!(timed.jump_kind("t"), JumpKind::VariableRate);
        // Time dependence does not remove the mass action factors
        let law = ode_rate_law(&timed, true);
        assert!(variables(&law).contains("X"));
        let vals = values(&[("k", 2.), ("t", 3.), ("X", 5.)]);
        assert_relative_eq!(eval(&law, &vals).unwrap(), 30.);
        assert_eq!(sir().jump_kinds(), vec![JumpKind::MassAction, JumpKind::MassAction]);
    }

    #[test]
    fn sir_equations() {
        let mut system = sir();
        let equations = system.ode_equations();
        let order: Vec<&str> = equations.keys().map(|k| k.as_str()).collect();
        assert_eq!(order, vec!["S", "I", "R"]);
        let vals = values(&[("β", 0.5), ("γ", 0.25), ("S", 10.), ("I", 2.)]);
        assert_relative_eq!(eval(&equations["S"], &vals).unwrap(), -10.);
        assert_relative_eq!(eval(&equations["I"], &vals).unwrap(), 9.5);
        assert_relative_eq!(eval(&equations["R"], &vals).unwrap(), 0.5);
        system.add_species(Species::new("Z")).unwrap();
        assert_eq!(system.ode_equations().get("Z"), Some(&Expr::Const(0.)));
    }

    #[test]
    fn combinatoric_switch() {
        let x = Species::new("X");
        let mut system = ReactionSystem::new(
            "trimer",
            vec![Reaction::new(var("k"), vec![(x.clone(), 3.)], vec![]).unwrap()],
        )
        .unwrap();
        let vals = values(&[("k", 1.), ("X", 2.)]);
        assert_relative_eq!(eval(&system.ode_rate_laws()[0], &vals).unwrap(), 8. / 6.);
        system.set_combinatoric_ratelaw(false);
        assert_relative_eq!(eval(&system.ode_rate_laws()[0], &vals).unwrap(), 8.);
        // The propensity does not depend on the switch
        assert_relative_eq!(eval(&system.jump_rate_laws()[0], &vals).unwrap(), 0.);
    }
}
