//! The directed complex graph of a network, its linkage classes, reversibility and deficiency
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use log::debug;
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;

use crate::analysis::linalg;
use crate::analysis::AnalysisError;
use crate::reaction_network::system::ReactionSystem;

/// Deficiency from its three ingredients, failing if the result would be negative
pub(crate) fn check_deficiency(
    n_complexes: usize,
    n_linkage_classes: usize,
    rank: usize,
) -> Result<usize, AnalysisError> {
    n_complexes
        .checked_sub(n_linkage_classes)
        .and_then(|d| d.checked_sub(rank))
        .ok_or_else(|| {
            AnalysisError::StructuralInconsistency(format!(
                "negative deficiency from {} complexes, {} linkage classes and rank {}",
                n_complexes, n_linkage_classes, rank
            ))
        })
}

impl ReactionSystem {
    /// Directed graph with one node per complex and one edge per reaction
    ///
    /// Node weights are complex indices and edge weights reaction indices, so node `i` is
    /// complex `i` of [`ReactionSystem::reaction_complexes`]. Parallel edges are kept.
    pub fn incidence_mat_graph(&self) -> DiGraph<usize, usize> {
        let complexes = self.reaction_complexes();
        let mut graph = DiGraph::with_capacity(complexes.len(), complexes.reaction_map.len());
        for c in 0..complexes.len() {
            graph.add_node(c);
        }
        for (j, &(source, target)) in complexes.reaction_map.iter().enumerate() {
            graph.add_edge(NodeIndex::new(source), NodeIndex::new(target), j);
        }
        graph
    }

    /// Connected components of the complex graph, ignoring edge direction
    ///
    /// Each class lists complex indices in increasing order, classes are ordered by their
    /// smallest complex.
    pub fn linkage_classes(&self) -> Vec<Vec<usize>> {
        (*self.linkage_classes_cached()).clone()
    }

    fn linkage_classes_cached(&self) -> Arc<Vec<Vec<usize>>> {
        self.cache
            .linkage_classes
            .get_or_compute(self.revision(), || {
                let complexes = self.reaction_complexes();
                let mut components = UnionFind::<usize>::new(complexes.len());
                for &(source, target) in &complexes.reaction_map {
                    components.union(source, target);
                }
                let mut classes: IndexMap<usize, Vec<usize>> = IndexMap::new();
                for c in 0..complexes.len() {
                    classes.entry(components.find(c)).or_default().push(c);
                }
                classes.into_values().collect()
            })
    }

    /// True if every reaction has a reverse reaction between the same complexes
    pub fn is_reversible(&self) -> bool {
        let graph = self.incidence_mat_graph();
        graph
            .edge_references()
            .all(|e| graph.find_edge(e.target(), e.source()).is_some())
    }

    /// True if every linkage class is strongly connected
    pub fn is_weakly_reversible(&self) -> bool {
        let graph = self.incidence_mat_graph();
        kosaraju_scc(&graph).len() == self.linkage_classes_cached().len()
    }

    /// Deficiency of the network, `complexes - linkage classes - rank(net stoichiometry)`
    ///
    /// # Examples
    /// ```rust
    /// use catalyrs_core::expression::var;
    /// use catalyrs_core::reaction_network::reaction::Reaction;
    /// use catalyrs_core::reaction_network::species::Species;
    /// use catalyrs_core::reaction_network::system::ReactionSystem;
    /// let (a, b) = (Species::new("A"), Species::new("B"));
    /// let system = ReactionSystem::new(
    ///     "isomerization",
    ///     vec![
    ///         Reaction::new(var("k₁"), vec![(a.clone(), 1.)], vec![(b.clone(), 1.)]).unwrap(),
    ///         Reaction::new(var("k₂"), vec![(b.clone(), 1.)], vec![(a.clone(), 1.)]).unwrap(),
    ///     ],
    /// )
    /// .unwrap();
    /// assert_eq!(system.deficiency().unwrap(), 0);
    /// ```
    pub fn deficiency(&self) -> Result<usize, AnalysisError> {
        let n_complexes = self.num_complexes();
        let n_linkage_classes = self.linkage_classes_cached().len();
        let rank = self.netstoich_rank()?;
        let deficiency = check_deficiency(n_complexes, n_linkage_classes, rank)?;
        debug!(
            "Deficiency of {}: {} complexes, {} linkage classes, rank {} gives {}",
            self.name(),
            n_complexes,
            n_linkage_classes,
            rank,
            deficiency
        );
        Ok(deficiency)
    }

    /// Deficiency of each linkage class on its own
    ///
    /// For a class this is `complexes in the class - 1 - rank` with the rank taken over the
    /// net stoichiometry columns of the reactions in the class.
    pub fn linkage_deficiencies(&self) -> Result<Vec<usize>, AnalysisError> {
        let net = self.stoichiometry();
        self.reactions_by_linkage_class()
            .iter()
            .zip(self.linkage_classes_cached().iter())
            .map(|(reactions, class)| {
                let rank = linalg::rank(&net.net.select_columns(reactions.iter()));
                check_deficiency(class.len(), 1, rank)
            })
            .collect()
    }

    /// Reaction indices grouped by the linkage class of their substrate complex
    pub fn reactions_by_linkage_class(&self) -> Vec<Vec<usize>> {
        let complexes = self.reaction_complexes();
        let classes = self.linkage_classes_cached();
        let mut class_of = vec![0usize; complexes.len()];
        for (k, class) in classes.iter().enumerate() {
            for &c in class {
                class_of[c] = k;
            }
        }
        let mut grouped = vec![Vec::new(); classes.len()];
        for (j, &(source, _)) in complexes.reaction_map.iter().enumerate() {
            grouped[class_of[source]].push(j);
        }
        grouped
    }

    /// One system per linkage class, holding the reactions of that class
    ///
    /// Subnetworks are named `<name>_<k>` (counting from 1) and keep the species and parameter
    /// order of this system.
    pub fn subnetworks(&self) -> Result<Vec<ReactionSystem>, AnalysisError> {
        let mut subnetworks = Vec::new();
        for (k, reaction_ids) in self.reactions_by_linkage_class().into_iter().enumerate() {
            let reactions: Vec<_> = reaction_ids
                .iter()
                .map(|&j| self.reactions()[j].clone())
                .collect();
            let mut used: IndexSet<&str> = IndexSet::new();
            for reaction in &reactions {
                for species in reaction.species() {
                    used.insert(species.name.as_str());
                }
                for variable in reaction.rate_variables() {
                    if let Some(name) = self
                        .get_species(&variable)
                        .map(|s| s.name.as_str())
                        .or_else(|| self.get_param(&variable).map(|p| p.name.as_str()))
                    {
                        used.insert(name);
                    }
                }
            }
            let species = self
                .species()
                .filter(|s| used.contains(s.name.as_str()))
                .cloned()
                .collect();
            let parameters = self
                .parameters()
                .filter(|p| used.contains(p.name.as_str()))
                .cloned()
                .collect();
            let mut subnetwork = ReactionSystem::from_parts(
                &format!("{}_{}", self.name(), k + 1),
                self.iv(),
                species,
                parameters,
                reactions,
            )?;
            subnetwork.set_duplicate_policy(self.options().duplicate_policy);
            subnetwork.set_combinatoric_ratelaw(self.options().combinatoric_ratelaw);
            subnetworks.push(subnetwork);
        }
        Ok(subnetworks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::var;
    use crate::reaction_network::reaction::Reaction;
    use crate::reaction_network::species::Species;
    use pretty_assertions::assert_eq;

    fn rx(rate: &str, subs: &[(&Species, f64)], prods: &[(&Species, f64)]) -> Reaction {
        Reaction::new(
            var(rate),
            subs.iter().map(|(s, c)| ((*s).clone(), *c)).collect(),
            prods.iter().map(|(s, c)| ((*s).clone(), *c)).collect(),
        )
        .unwrap()
    }

    fn sir() -> ReactionSystem {
        let (s, i, r) = (Species::new("S"), Species::new("I"), Species::new("R"));
        ReactionSystem::new(
            "sir",
            vec![
                rx("β", &[(&s, 1.), (&i, 1.)], &[(&i, 2.)]),
                rx("γ", &[(&i, 1.)], &[(&r, 1.)]),
            ],
        )
        .unwrap()
    }

    fn cycle() -> ReactionSystem {
        let (a, b, c) = (Species::new("A"), Species::new("B"), Species::new("C"));
        ReactionSystem::new(
            "cycle",
            vec![
                rx("k1", &[(&a, 1.)], &[(&b, 1.)]),
                rx("k2", &[(&b, 1.)], &[(&c, 1.)]),
                rx("k3", &[(&c, 1.)], &[(&a, 1.)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn negative_deficiency_is_rejected() {
        assert_eq!(check_deficiency(4, 2, 2).unwrap(), 0);
        assert!(matches!(
            check_deficiency(2, 2, 1),
            Err(AnalysisError::StructuralInconsistency(_))
        ));
        assert!(check_deficiency(1, 2, 0).is_err());
    }

    #[test]
    fn graph_structure() {
        let graph = sir().incidence_mat_graph();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 2);
        let edges: Vec<(usize, usize, usize)> = graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), *e.weight()))
            .collect();
        assert_eq!(edges, vec![(0, 1, 0), (2, 3, 1)]);
    }

    #[test]
    fn parallel_edges_kept() {
        let (a, b) = (Species::new("A"), Species::new("B"));
        let system = ReactionSystem::new(
            "parallel",
            vec![
                rx("k1", &[(&a, 1.)], &[(&b, 1.)]),
                rx("k2", &[(&a, 1.)], &[(&b, 1.)]),
            ],
        )
        .unwrap();
        assert_eq!(system.incidence_mat_graph().edge_count(), 2);
        assert!(!system.is_reversible());
    }

    #[test]
    fn sir_structure() {
        let system = sir();
        assert_eq!(system.linkage_classes(), vec![vec![0, 1], vec![2, 3]]);
        assert!(!system.is_reversible());
        assert!(!system.is_weakly_reversible());
        assert_eq!(system.deficiency().unwrap(), 0);
        assert_eq!(system.linkage_deficiencies().unwrap(), vec![0, 0]);
    }

    #[test]
    fn weakly_reversible_cycle() {
        let system = cycle();
        assert_eq!(system.linkage_classes(), vec![vec![0, 1, 2]]);
        assert!(!system.is_reversible());
        assert!(system.is_weakly_reversible());
        assert_eq!(system.deficiency().unwrap(), 0);
    }

    #[test]
    fn positive_deficiency() {
        // A -> 2A, A -> ∅: three complexes, one linkage class, rank 1
        let a = Species::new("A");
        let system = ReactionSystem::new(
            "growth",
            vec![rx("b", &[(&a, 1.)], &[(&a, 2.)]), rx("d", &[(&a, 1.)], &[])],
        )
        .unwrap();
        assert_eq!(system.linkage_classes().len(), 1);
        assert_eq!(system.deficiency().unwrap(), 1);
        assert_eq!(system.linkage_deficiencies().unwrap(), vec![1]);
    }

    #[test]
    fn empty_network() {
        let system = ReactionSystem::new_empty("empty");
        assert!(system.linkage_classes().is_empty());
        assert!(system.is_reversible());
        assert!(system.is_weakly_reversible());
        assert_eq!(system.deficiency().unwrap(), 0);
        assert!(system.subnetworks().unwrap().is_empty());
    }

    #[test]
    fn sir_subnetworks() {
        let system = sir();
        let subnetworks = system.subnetworks().unwrap();
        assert_eq!(subnetworks.len(), 2);
        assert_eq!(subnetworks[0].name(), "sir_1");
        let names: Vec<&str> = subnetworks[0].species().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["S", "I"]);
        let names: Vec<&str> = subnetworks[1].species().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["I", "R"]);
        assert_eq!(subnetworks[1].num_params(), 1);
        assert_eq!(subnetworks[1].reactions(), &system.reactions()[1..]);
        // Analysis does not change the system
        assert_eq!(system.num_reactions(), 2);
    }
}
