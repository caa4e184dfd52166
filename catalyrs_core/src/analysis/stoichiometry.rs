//! Substrate, product and net stoichiometry matrices
//!
//! Rows follow the species order of the system and columns the reaction order.
use std::sync::Arc;

use nalgebra::DMatrix;
use nalgebra_sparse::{CooMatrix, CscMatrix};

use crate::reaction_network::reaction::StoichTerm;
use crate::reaction_network::system::ReactionSystem;

/// The three [species × reactions] stoichiometry matrices of a system
#[derive(Clone, Debug, PartialEq)]
pub struct StoichiometryMatrices {
    /// Substrate coefficients, entry (i, j) is the amount of species i consumed by reaction j
    pub substrate: DMatrix<i64>,
    /// Product coefficients
    pub product: DMatrix<i64>,
    /// `product - substrate`
    pub net: DMatrix<i64>,
}

impl StoichiometryMatrices {
    pub(crate) fn from_system(system: &ReactionSystem) -> StoichiometryMatrices {
        let (n_species, n_reactions) = (system.num_species(), system.num_reactions());
        let mut substrate = DMatrix::<i64>::zeros(n_species, n_reactions);
        let mut product = DMatrix::<i64>::zeros(n_species, n_reactions);
        for (j, reaction) in system.reactions().iter().enumerate() {
            fill_column(system, &mut substrate, j, reaction.substrates());
            fill_column(system, &mut product, j, reaction.products());
        }
        let net = &product - &substrate;
        StoichiometryMatrices {
            substrate,
            product,
            net,
        }
    }
}

fn fill_column(system: &ReactionSystem, mat: &mut DMatrix<i64>, column: usize, terms: &[StoichTerm]) {
    for term in terms {
        // Every species of a reaction is registered when the reaction is added
        if let Some(row) = system.species_index(&term.species.name) {
            mat[(row, column)] += term.coefficient as i64;
        }
    }
}

/// Sparse copy of a dense integer matrix, zeros are not stored
pub(crate) fn to_csc(mat: &DMatrix<i64>) -> CscMatrix<i64> {
    let mut coo = CooMatrix::new(mat.nrows(), mat.ncols());
    for j in 0..mat.ncols() {
        for i in 0..mat.nrows() {
            let value = mat[(i, j)];
            if value != 0 {
                coo.push(i, j, value);
            }
        }
    }
    CscMatrix::from(&coo)
}

impl ReactionSystem {
    /// All stoichiometry matrices, computed once per revision
    pub fn stoichiometry(&self) -> Arc<StoichiometryMatrices> {
        self.cache
            .stoichiometry
            .get_or_compute(self.revision(), || StoichiometryMatrices::from_system(self))
    }

    /// Substrate stoichiometry matrix [species × reactions]
    ///
    /// # Examples
    /// ```rust
    /// use catalyrs_core::expression::var;
    /// use catalyrs_core::reaction_network::reaction::Reaction;
    /// use catalyrs_core::reaction_network::species::Species;
    /// use catalyrs_core::reaction_network::system::ReactionSystem;
    /// let (a, b) = (Species::new("A"), Species::new("B"));
    /// let dimer = Reaction::new(var("k"), vec![(a.clone(), 2.)], vec![(b.clone(), 1.)]).unwrap();
    /// let system = ReactionSystem::new("dimerization", vec![dimer]).unwrap();
    /// assert_eq!(system.substoich_mat()[(0, 0)], 2);
    /// assert_eq!(system.netstoich_mat()[(0, 0)], -2);
    /// ```
    pub fn substoich_mat(&self) -> DMatrix<i64> {
        self.stoichiometry().substrate.clone()
    }

    /// Product stoichiometry matrix [species × reactions]
    pub fn prodstoich_mat(&self) -> DMatrix<i64> {
        self.stoichiometry().product.clone()
    }

    /// Net stoichiometry matrix [species × reactions]
    pub fn netstoich_mat(&self) -> DMatrix<i64> {
        self.stoichiometry().net.clone()
    }

    pub fn substoich_mat_sparse(&self) -> CscMatrix<i64> {
        to_csc(&self.stoichiometry().substrate)
    }

    pub fn prodstoich_mat_sparse(&self) -> CscMatrix<i64> {
        to_csc(&self.stoichiometry().product)
    }

    pub fn netstoich_mat_sparse(&self) -> CscMatrix<i64> {
        to_csc(&self.stoichiometry().net)
    }
}
