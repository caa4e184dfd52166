//! Linear conservation laws, integer vectors `c` with `c · netstoich_mat = 0`
use std::sync::Arc;

use nalgebra::DMatrix;

use crate::analysis::{linalg, AnalysisError};
use crate::expression::{sum, Expr};
use crate::reaction_network::system::ReactionSystem;

/// Basis of the conservation laws of a system
#[derive(Clone, Debug, PartialEq)]
pub struct ConservationLaws {
    /// One law per row, columns follow the species order
    pub laws: DMatrix<i64>,
    /// Rank of the net stoichiometry matrix
    pub rank: usize,
}

impl ConservationLaws {
    pub(crate) fn from_system(system: &ReactionSystem) -> Result<ConservationLaws, AnalysisError> {
        let (laws, rank) = linalg::left_nullspace(&system.stoichiometry().net)?;
        if laws.nrows() + rank != system.num_species() {
            return Err(AnalysisError::StructuralInconsistency(format!(
                "{} conservation laws and rank {} do not add up to {} species",
                laws.nrows(),
                rank,
                system.num_species()
            )));
        }
        Ok(ConservationLaws { laws, rank })
    }

    pub fn len(&self) -> usize {
        self.laws.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.laws.nrows() == 0
    }
}

impl ReactionSystem {
    fn conservation(&self) -> Result<Arc<ConservationLaws>, AnalysisError> {
        self.cache
            .conservation
            .get_or_try_compute(self.revision(), || ConservationLaws::from_system(self))
    }

    /// Integer basis of the left null space of the net stoichiometry matrix
    ///
    /// Each row is a primitive integer vector over the species of the system, the number of
    /// rows is `num_species - rank(netstoich_mat)`.
    pub fn conservation_laws(&self) -> Result<DMatrix<i64>, AnalysisError> {
        Ok(self.conservation()?.laws.clone())
    }

    /// Rank of the net stoichiometry matrix
    pub fn netstoich_rank(&self) -> Result<usize, AnalysisError> {
        Ok(self.conservation()?.rank)
    }

    /// Value of every conservation law at `state`
    ///
    /// # Parameters
    /// - `state`: one value per species, in species order
    pub fn conserved_quantities(&self, state: &[f64]) -> Result<Vec<f64>, AnalysisError> {
        if state.len() != self.num_species() {
            return Err(AnalysisError::StateDimensionMismatch {
                expected: self.num_species(),
                found: state.len(),
            });
        }
        let conservation = self.conservation()?;
        Ok(conservation
            .laws
            .row_iter()
            .map(|law| {
                law.iter()
                    .zip(state.iter())
                    .map(|(c, x)| *c as f64 * x)
                    .sum::<f64>()
            })
            .collect())
    }

    /// Conservation laws as symbolic sums `Σ c_i X_i`
    pub fn conserved_equations(&self) -> Result<Vec<Expr>, AnalysisError> {
        let conservation = self.conservation()?;
        let species: Vec<Expr> = self.species().map(|s| s.expr()).collect();
        Ok(conservation
            .laws
            .row_iter()
            .map(|law| {
                let terms = law
                    .iter()
                    .zip(species.iter())
                    .filter(|(c, _)| **c != 0)
                    .map(|(c, x)| match *c {
                        1 => x.clone(),
                        c => Expr::Const(c as f64) * x.clone(),
                    })
                    .collect();
                sum(terms)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{eval, var, variables};
    use crate::reaction_network::reaction::Reaction;
    use crate::reaction_network::species::Species;
    use approx::assert_relative_eq;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn enzyme() -> ReactionSystem {
        let (e, s, c, p) = (
            Species::new("E"),
            Species::new("S"),
            Species::new("C"),
            Species::new("P"),
        );
        ReactionSystem::new(
            "enzyme",
            vec![
                Reaction::new(
                    var("kf"),
                    vec![(e.clone(), 1.), (s.clone(), 1.)],
                    vec![(c.clone(), 1.)],
                )
                .unwrap(),
                Reaction::new(
                    var("kr"),
                    vec![(c.clone(), 1.)],
                    vec![(e.clone(), 1.), (s.clone(), 1.)],
                )
                .unwrap(),
                Reaction::new(
                    var("kcat"),
                    vec![(c.clone(), 1.)],
                    vec![(e.clone(), 1.), (p.clone(), 1.)],
                )
                .unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn enzyme_laws() {
        let system = enzyme();
        let laws = system.conservation_laws().unwrap();
        assert_eq!(laws.shape(), (2, 4));
        assert_eq!(system.netstoich_rank().unwrap(), 2);
        assert!((&laws * system.netstoich_mat()).iter().all(|v| *v == 0));
        // Total enzyme E + C and total substrate S + C + P are in the span
        let quantities = system.conserved_quantities(&[1., 10., 2., 3.]).unwrap();
        assert_eq!(quantities.len(), 2);
    }

    #[test]
    fn isomerization_quantities() {
        let (a, b) = (Species::new("A"), Species::new("B"));
        let system = ReactionSystem::new(
            "iso",
            vec![
                Reaction::new(var("k1"), vec![(a.clone(), 1.)], vec![(b.clone(), 1.)])
                    .unwrap(),
                Reaction::new(var("k2"), vec![(b.clone(), 1.)], vec![(a.clone(), 1.)])
                    .unwrap(),
            ],
        )
        .unwrap();
        let quantities = system.conserved_quantities(&[2.5, 0.25]).unwrap();
        assert_eq!(quantities.len(), 1);
        assert_relative_eq!(quantities[0], 2.75);
        let equations = system.conserved_equations().unwrap();
        let mut names: Vec<String> = variables(&equations[0]).into_iter().collect();
        names.sort();
        assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
        let state: IndexMap<String, f64> = [("A".to_string(), 2.5), ("B".to_string(), 0.25)].into();
        assert_relative_eq!(eval(&equations[0], &state).unwrap(), 2.75);
    }

    #[test]
    fn state_dimension() {
        let system = enzyme();
        assert_eq!(
            system.conserved_quantities(&[1., 2.]),
            Err(AnalysisError::StateDimensionMismatch {
                expected: 4,
                found: 2
            })
        );
    }

    #[test]
    fn open_system_has_no_laws() {
        let a = Species::new("A");
        let system = ReactionSystem::new(
            "open",
            vec![Reaction::new(var("k"), vec![], vec![(a.clone(), 1.)]).unwrap()],
        )
        .unwrap();
        assert_eq!(system.conservation_laws().unwrap().nrows(), 0);
        assert!(system.conserved_quantities(&[4.]).unwrap().is_empty());
        assert!(system.conserved_equations().unwrap().is_empty());
    }
}
