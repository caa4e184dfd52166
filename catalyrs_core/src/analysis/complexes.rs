//! Reaction complexes: the multisets of species found on either side of a reaction
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use indexmap::IndexSet;
use nalgebra::DMatrix;

use crate::reaction_network::reaction::StoichTerm;
use crate::reaction_network::system::ReactionSystem;

/// A species of a complex, referenced by its index in the owning system
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ComplexElement {
    pub species_index: usize,
    pub coefficient: u32,
}

/// A reaction complex, elements are sorted by species index
///
/// The empty complex (`∅`, the source of creation and target of degradation reactions) has
/// no elements.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ReactionComplex {
    pub elements: Vec<ComplexElement>,
}

impl ReactionComplex {
    fn from_terms(system: &ReactionSystem, terms: &[StoichTerm]) -> ReactionComplex {
        let mut elements: Vec<ComplexElement> = terms
            .iter()
            .filter_map(|t| {
                system
                    .species_index(&t.species.name)
                    .map(|species_index| ComplexElement {
                        species_index,
                        coefficient: t.coefficient,
                    })
            })
            .collect();
        elements.sort();
        ReactionComplex { elements }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Human readable form, such as `S + I` or `2I`, using the species names of `system`
    pub fn label(&self, system: &ReactionSystem) -> String {
        if self.is_empty() {
            return "∅".to_string();
        }
        let names: Vec<&str> = system.species().map(|s| s.name.as_str()).collect();
        self.elements
            .iter()
            .map(|e| {
                let name = names.get(e.species_index).copied().unwrap_or("?");
                if e.coefficient == 1 {
                    name.to_string()
                } else {
                    format!("{}{}", e.coefficient, name)
                }
            })
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

impl Display for ReactionComplex {
    /// Index based form such as `1*S0 + 2*S3`
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "∅");
        }
        let terms: Vec<String> = self
            .elements
            .iter()
            .map(|e| format!("{}*S{}", e.coefficient, e.species_index))
            .collect();
        write!(f, "{}", terms.join(" + "))
    }
}

/// The distinct complexes of a system and the complexes each reaction connects
#[derive(Clone, Debug, PartialEq)]
pub struct ReactionComplexes {
    /// Distinct complexes in order of first appearance (substrate before product)
    pub complexes: Vec<ReactionComplex>,
    /// For each reaction its (substrate complex, product complex) indices
    pub reaction_map: Vec<(usize, usize)>,
    num_species: usize,
}

impl ReactionComplexes {
    pub(crate) fn from_system(system: &ReactionSystem) -> ReactionComplexes {
        let mut complexes: IndexSet<ReactionComplex> = IndexSet::new();
        let mut reaction_map = Vec::with_capacity(system.num_reactions());
        for reaction in system.reactions() {
            let (source, _) =
                complexes.insert_full(ReactionComplex::from_terms(system, reaction.substrates()));
            let (target, _) =
                complexes.insert_full(ReactionComplex::from_terms(system, reaction.products()));
            reaction_map.push((source, target));
        }
        ReactionComplexes {
            complexes: complexes.into_iter().collect(),
            reaction_map,
            num_species: system.num_species(),
        }
    }

    pub fn len(&self) -> usize {
        self.complexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.complexes.is_empty()
    }

    /// Complex composition matrix [species × complexes]
    pub fn complex_stoich_mat(&self) -> DMatrix<i64> {
        let mut mat = DMatrix::<i64>::zeros(self.num_species, self.complexes.len());
        for (c, complex) in self.complexes.iter().enumerate() {
            for e in &complex.elements {
                mat[(e.species_index, c)] = e.coefficient as i64;
            }
        }
        mat
    }

    /// Complex to reaction incidence matrix [complexes × reactions]
    ///
    /// -1 marks the substrate complex of a reaction and +1 its product complex.
    pub fn incidence_mat(&self) -> DMatrix<i64> {
        let mut mat = DMatrix::<i64>::zeros(self.complexes.len(), self.reaction_map.len());
        for (j, &(source, target)) in self.reaction_map.iter().enumerate() {
            mat[(source, j)] -= 1;
            mat[(target, j)] += 1;
        }
        mat
    }

    /// Incidence matrix restricted to the substrate complexes (positive entries removed)
    pub fn complex_outgoing_mat(&self) -> DMatrix<i64> {
        self.incidence_mat().map(|v| v.min(0))
    }
}

impl ReactionSystem {
    /// Distinct complexes of the system and the complexes connected by each reaction
    pub fn reaction_complexes(&self) -> Arc<ReactionComplexes> {
        self.cache
            .complexes
            .get_or_compute(self.revision(), || ReactionComplexes::from_system(self))
    }

    /// Number of distinct complexes
    pub fn num_complexes(&self) -> usize {
        self.reaction_complexes().len()
    }

    /// See [`ReactionComplexes::complex_stoich_mat`]
    pub fn complex_stoich_mat(&self) -> DMatrix<i64> {
        self.reaction_complexes().complex_stoich_mat()
    }

    /// See [`ReactionComplexes::incidence_mat`]
    pub fn incidence_mat(&self) -> DMatrix<i64> {
        self.reaction_complexes().incidence_mat()
    }

    /// See [`ReactionComplexes::complex_outgoing_mat`]
    pub fn complex_outgoing_mat(&self) -> DMatrix<i64> {
        self.reaction_complexes().complex_outgoing_mat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::var;
    use crate::reaction_network::reaction::Reaction;
    use crate::reaction_network::species::Species;
    use pretty_assertions::assert_eq;

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
                Reaction::new(var("γ"), vec![(i.clone(), 1.)], vec![(r.clone(), 1.)])
                    .unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn sir_complexes() {
        let system = sir();
        let complexes = system.reaction_complexes();
        let labels: Vec<String> = complexes
            .complexes
            .iter()
            .map(|c| c.label(&system))
            .collect();
        assert_eq!(labels, vec!["S + I", "2I", "I", "R"]);
        assert_eq!(complexes.reaction_map, vec![(0, 1), (2, 3)]);
        assert_eq!(format!("{}", complexes.complexes[0]), "1*S0 + 1*S1");
    }

    #[test]
    fn shared_and_empty_complexes() {
        let a = Species::new("A");
        let system = ReactionSystem::new(
            "birth_death",
            vec![
                Reaction::new(var("b"), vec![], vec![(a.clone(), 1.)]).unwrap(),
                Reaction::new(var("d"), vec![(a.clone(), 1.)], vec![]).unwrap(),
            ],
        )
        .unwrap();
        let complexes = system.reaction_complexes();
        assert_eq!(complexes.len(), 2);
        assert!(complexes.complexes[0].is_empty());
        assert_eq!(complexes.complexes[0].label(&system), "∅");
        assert_eq!(complexes.reaction_map, vec![(0, 1), (1, 0)]);
        assert_eq!(system.complex_stoich_mat(), DMatrix::from_row_slice(1, 2, &[0, 1]));
    }

    #[test]
    fn net_stoichiometry_factorizes() {
        let system = sir();
        let y = system.complex_stoich_mat();
        let b = system.incidence_mat();
        assert_eq!(y.shape(), (3, 4));
        assert_eq!(b.shape(), (4, 2));
        assert_eq!(&y * &b, system.netstoich_mat());
    }

    #[test]
    fn outgoing_matrix() {
        let system = sir();
        let expected = DMatrix::from_row_slice(4, 2, &[-1, 0, 0, 0, 0, -1, 0, 0]);
        assert_eq!(system.complex_outgoing_mat(), expected);
        assert_eq!(system.num_complexes(), 4);
    }
}
