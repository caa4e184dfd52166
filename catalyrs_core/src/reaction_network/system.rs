//! This module provides the ReactionSystem struct, the aggregate of species, parameters and
//! reactions that every analysis works on
use indexmap::IndexMap;
use log::{debug, info};

use crate::configuration::{Configuration, DuplicatePolicy};
use crate::expression::SymbolKind;
use crate::reaction_network::cache::AnalysisCache;
use crate::reaction_network::parameter::Parameter;
use crate::reaction_network::reaction::Reaction;
use crate::reaction_network::species::Species;
use crate::reaction_network::{ModelError, Role};

/// Per system options, initialized from the global [`Configuration`]
#[derive(Clone, Debug, PartialEq)]
pub struct SystemOptions {
    /// How re-adding a present species, parameter or reaction is handled
    pub duplicate_policy: DuplicatePolicy,
    /// Whether mass action ODE rate laws divide by coefficient factorials
    pub combinatoric_ratelaw: bool,
}

impl Default for SystemOptions {
    fn default() -> Self {
        let config = Configuration::current();
        SystemOptions {
            duplicate_policy: config.duplicate_policy,
            combinatoric_ratelaw: config.combinatoric_ratelaw,
        }
    }
}

/// Represents a reaction network
///
/// Species and parameters are kept in insertion order, which fixes the row order of every
/// matrix computed from the system. Reactions are kept in insertion order too and fix the
/// column order. Subsystems attached with [`ReactionSystem::compose`] keep their own
/// namespaces until [`ReactionSystem::flatten`] is called.
#[derive(Clone, Debug)]
pub struct ReactionSystem {
    /// Name of the system, also the namespace of the system when it is used as a subsystem
    name: String,
    /// Name of the independent variable (time)
    iv: String,
    /// Map of species names to Species
    species: IndexMap<String, Species>,
    /// Map of parameter names to Parameters
    parameters: IndexMap<String, Parameter>,
    /// Ordered list of reactions
    reactions: Vec<Reaction>,
    /// Map of subsystem names to subsystems
    systems: IndexMap<String, ReactionSystem>,
    options: SystemOptions,
    /// Incremented by every mutation, guards the cache
    revision: u64,
    pub(crate) cache: AnalysisCache,
}

impl ReactionSystem {
    // region Creation Functions
    /// Create an empty system using the configured independent variable
    pub fn new_empty(name: &str) -> Self {
        let iv = Configuration::current().independent_variable;
        Self::new_empty_with_iv(name, &iv)
    }

    /// Create an empty system with an explicit independent variable
    pub fn new_empty_with_iv(name: &str, iv: &str) -> Self {
        ReactionSystem {
            name: name.to_string(),
            iv: iv.to_string(),
            species: IndexMap::new(),
            parameters: IndexMap::new(),
            reactions: Vec::new(),
            systems: IndexMap::new(),
            options: SystemOptions::default(),
            revision: 0,
            cache: AnalysisCache::default(),
        }
    }

    /// Create a system from a list of reactions
    ///
    /// Species and parameters are collected from the reactions in order of first appearance
    /// (substrates, then products, then rate expressions).
    ///
    /// # Examples
    /// ```rust
    /// use catalyrs_core::expression::var;
    /// use catalyrs_core::reaction_network::reaction::Reaction;
    /// use catalyrs_core::reaction_network::species::Species;
    /// use catalyrs_core::reaction_network::system::ReactionSystem;
    /// let (s, i, r) = (Species::new("S"), Species::new("I"), Species::new("R"));
    /// let sir = ReactionSystem::new(
    ///     "sir",
    ///     vec![
    ///         Reaction::new(var("β"), vec![(s.clone(), 1.), (i.clone(), 1.)], vec![(i.clone(), 2.)]).unwrap(),
    ///         Reaction::new(var("γ"), vec![(i.clone(), 1.)], vec![(r.clone(), 1.)]).unwrap(),
    ///     ],
    /// )
    /// .unwrap();
    /// assert_eq!(sir.num_species(), 3);
    /// assert_eq!(sir.num_params(), 2);
    /// ```
    pub fn new(name: &str, reactions: Vec<Reaction>) -> Result<Self, ModelError> {
        let mut system = Self::new_empty(name);
        for reaction in reactions {
            system.add_reaction(reaction)?;
        }
        Ok(system)
    }

    /// Create a system with explicitly ordered species and parameters
    ///
    /// Species or parameters used by the reactions but missing from the given lists are
    /// appended after them.
    pub fn from_parts(
        name: &str,
        iv: &str,
        species: Vec<Species>,
        parameters: Vec<Parameter>,
        reactions: Vec<Reaction>,
    ) -> Result<Self, ModelError> {
        let mut system = Self::new_empty_with_iv(name, iv);
        for s in species {
            system.add_species(s)?;
        }
        for p in parameters {
            system.add_param(p)?;
        }
        for r in reactions {
            system.add_reaction(r)?;
        }
        Ok(system)
    }
    // endregion Creation Functions

    // region Accessors
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the independent variable
    pub fn iv(&self) -> &str {
        &self.iv
    }

    pub fn options(&self) -> &SystemOptions {
        &self.options
    }

    /// Current revision, incremented by every mutating operation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_duplicate_policy(&mut self, policy: DuplicatePolicy) {
        self.options.duplicate_policy = policy;
    }

    pub fn set_combinatoric_ratelaw(&mut self, combinatoric: bool) {
        self.options.combinatoric_ratelaw = combinatoric;
    }

    pub fn species(&self) -> impl ExactSizeIterator<Item = &Species> {
        self.species.values()
    }

    pub fn parameters(&self) -> impl ExactSizeIterator<Item = &Parameter> {
        self.parameters.values()
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    /// Directly attached subsystems
    pub fn systems(&self) -> impl ExactSizeIterator<Item = &ReactionSystem> {
        self.systems.values()
    }

    pub fn get_system(&self, name: &str) -> Option<&ReactionSystem> {
        self.systems.get(name)
    }

    pub fn get_species(&self, name: &str) -> Option<&Species> {
        self.species.get(name)
    }

    pub fn get_param(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    pub fn num_species(&self) -> usize {
        self.species.len()
    }

    pub fn num_params(&self) -> usize {
        self.parameters.len()
    }

    pub fn num_reactions(&self) -> usize {
        self.reactions.len()
    }

    /// Row index of a species in the stoichiometry matrices
    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.species.get_index_of(name)
    }

    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.parameters.get_index_of(name)
    }

    pub fn is_species(&self, name: &str) -> bool {
        self.species.contains_key(name)
    }

    pub fn is_param(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    /// Map of species names to their index
    pub fn species_map(&self) -> IndexMap<String, usize> {
        self.species
            .keys()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect()
    }

    /// Map of parameter names to their index
    pub fn params_map(&self) -> IndexMap<String, usize> {
        self.parameters
            .keys()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect()
    }

    /// Parameters referenced by the rate of `reaction`
    pub fn reaction_params(&self, reaction: &Reaction) -> Vec<&Parameter> {
        reaction
            .rate_variables()
            .iter()
            .filter_map(|name| self.parameters.get(name))
            .collect()
    }

    /// Species the rate law of `reaction` depends on (rate species and substrates)
    pub fn dependents(&self, reaction: &Reaction) -> Vec<&Species> {
        let mut names: Vec<String> = reaction
            .rate_variables()
            .into_iter()
            .filter(|name| self.species.contains_key(name) || reaction.is_species(name))
            .collect();
        if !reaction.only_use_rate() {
            for term in reaction.substrates() {
                if !names.contains(&term.species.name) {
                    names.push(term.species.name.clone());
                }
            }
        }
        names.iter().filter_map(|n| self.species.get(n)).collect()
    }

    /// Default values of every species and parameter that has one
    pub fn default_values(&self) -> IndexMap<String, f64> {
        let species = self
            .species
            .values()
            .filter_map(|s| s.default_value.map(|v| (s.name.clone(), v)));
        let params = self
            .parameters
            .values()
            .filter_map(|p| p.default_value.map(|v| (p.name.clone(), v)));
        species.chain(params).collect()
    }

    /// True if the system has no subsystems
    pub fn is_flat(&self) -> bool {
        self.systems.is_empty()
    }

    /// Role currently held by `name` in this system's own namespace
    pub fn role_of(&self, name: &str) -> Option<Role> {
        if name == self.iv {
            Some(Role::IndependentVariable)
        } else if self.species.contains_key(name) {
            Some(Role::Species)
        } else if self.parameters.contains_key(name) {
            Some(Role::Parameter)
        } else {
            None
        }
    }
    // endregion Accessors

    // region Adding Entities
    /// Add a species to the system
    ///
    /// # Returns
    /// The index of the species. Re-adding an identical species is a no-op returning the
    /// existing index under [`DuplicatePolicy::Ignore`].
    ///
    /// # Examples
    /// ```rust
    /// use catalyrs_core::reaction_network::species::Species;
    /// use catalyrs_core::reaction_network::system::ReactionSystem;
    /// let mut system = ReactionSystem::new_empty("empty");
    /// assert_eq!(system.add_species(Species::new("X")).unwrap(), 0);
    /// assert_eq!(system.add_species(Species::new("X")).unwrap(), 0);
    /// assert_eq!(system.num_species(), 1);
    /// ```
    pub fn add_species(&mut self, species: Species) -> Result<usize, ModelError> {
        check_name(&species.name)?;
        match self.role_of(&species.name) {
            None => {
                let name = species.name.clone();
                let (idx, _) = self.species.insert_full(name.clone(), species);
                self.bump_revision();
                debug!("Added species {} to {} at index {}", name, self.name, idx);
                Ok(idx)
            }
            Some(Role::Species) => {
                let idx = self.species.get_index_of(&species.name).unwrap_or_default();
                let identical = self.species.get(&species.name) == Some(&species);
                self.resolve_duplicate(&species.name, Role::Species, identical)?;
                Ok(idx)
            }
            Some(existing) => Err(ModelError::DuplicateName {
                name: species.name,
                existing,
                attempted: Role::Species,
            }),
        }
    }

    /// Add a parameter to the system
    ///
    /// # Returns
    /// The index of the parameter, see [`ReactionSystem::add_species`] for duplicates.
    pub fn add_param(&mut self, parameter: Parameter) -> Result<usize, ModelError> {
        check_name(&parameter.name)?;
        match self.role_of(&parameter.name) {
            None => {
                let name = parameter.name.clone();
                let (idx, _) = self.parameters.insert_full(name.clone(), parameter);
                self.bump_revision();
                debug!("Added parameter {} to {} at index {}", name, self.name, idx);
                Ok(idx)
            }
            Some(Role::Parameter) => {
                let idx = self
                    .parameters
                    .get_index_of(&parameter.name)
                    .unwrap_or_default();
                let identical = self.parameters.get(&parameter.name) == Some(&parameter);
                self.resolve_duplicate(&parameter.name, Role::Parameter, identical)?;
                Ok(idx)
            }
            Some(existing) => Err(ModelError::DuplicateName {
                name: parameter.name,
                existing,
                attempted: Role::Parameter,
            }),
        }
    }

    /// Add a reaction to the system
    ///
    /// Species are identified by name. A reaction species or rate variable that names a
    /// registered species takes the system's definition of it. Species and parameters used by
    /// the reaction that are not yet part of the system are added first. Nothing is modified if
    /// the reaction is rejected.
    ///
    /// # Returns
    /// The index of the reaction (its column in the stoichiometry matrices). Re-adding a
    /// reaction that is already present returns its index under [`DuplicatePolicy::Ignore`],
    /// and fails with [`ModelError::DuplicateName`] under [`DuplicatePolicy::Error`].
    pub fn add_reaction(&mut self, reaction: Reaction) -> Result<usize, ModelError> {
        let reaction = reaction.adopt_species(|name| self.species.get(name));
        if let Some(idx) = self.reactions.iter().position(|r| *r == reaction) {
            self.resolve_duplicate(&reaction.to_string(), Role::Reaction, true)?;
            return Ok(idx);
        }

        let mut new_species: IndexMap<String, Species> = IndexMap::new();
        let mut new_params: IndexMap<String, Parameter> = IndexMap::new();
        for species in reaction.species() {
            check_name(&species.name)?;
            match self.role_of(&species.name) {
                None => {
                    new_species.insert(species.name.clone(), species.clone());
                }
                Some(Role::Species) => {}
                Some(existing) => {
                    return Err(ModelError::DuplicateName {
                        name: species.name.clone(),
                        existing,
                        attempted: Role::Species,
                    })
                }
            }
        }
        for (name, kind) in reaction.rate_roles(&self.iv) {
            check_name(&name)?;
            if kind != SymbolKind::Parameter {
                continue;
            }
            match self.role_of(&name) {
                None => {
                    new_params
                        .entry(name.clone())
                        .or_insert_with(|| Parameter::new(&name));
                }
                Some(Role::Parameter) => {}
                Some(existing) => {
                    return Err(ModelError::DuplicateName {
                        name,
                        existing,
                        attempted: Role::Parameter,
                    })
                }
            }
        }

        for (name, species) in new_species {
            self.species.insert(name, species);
        }
        for (name, parameter) in new_params {
            self.parameters.insert(name, parameter);
        }
        self.reactions.push(reaction);
        self.bump_revision();
        let idx = self.reactions.len() - 1;
        debug!(
            "Added reaction {} to {} at index {}",
            self.reactions[idx], self.name, idx
        );
        Ok(idx)
    }

    fn resolve_duplicate(&self, name: &str, role: Role, identical: bool) -> Result<(), ModelError> {
        match (self.options.duplicate_policy, identical) {
            (DuplicatePolicy::Error, _) => Err(ModelError::DuplicateName {
                name: name.to_string(),
                existing: role,
                attempted: role,
            }),
            (DuplicatePolicy::Ignore, true) => {
                debug!("Ignoring identical {} {} already in {}", role, name, self.name);
                Ok(())
            }
            (DuplicatePolicy::Ignore, false) => Err(ModelError::NameConflict {
                name: name.to_string(),
                reason: format!("a different {} with this name is already in {}", role, self.name),
            }),
        }
    }

    fn bump_revision(&mut self) {
        self.revision += 1;
    }
    // endregion Adding Entities

    // region Composition
    /// Attach a subsystem in place, keeping its namespace
    pub fn add_system(&mut self, system: ReactionSystem) -> Result<(), ModelError> {
        check_name(&system.name)?;
        if self.systems.contains_key(&system.name) {
            return Err(ModelError::DuplicateName {
                name: system.name,
                existing: Role::Subsystem,
                attempted: Role::Subsystem,
            });
        }
        if system.iv != self.iv {
            return Err(ModelError::NameConflict {
                name: system.name,
                reason: format!(
                    "subsystem uses independent variable {} but {} uses {}",
                    system.iv, self.name, self.iv
                ),
            });
        }
        debug!("Attached subsystem {} to {}", system.name, self.name);
        self.systems.insert(system.name.clone(), system);
        self.bump_revision();
        Ok(())
    }

    /// Create a copy of this system with `subsystems` attached as named children
    ///
    /// Namespaces are not merged, use [`ReactionSystem::flatten`] for that.
    pub fn compose(&self, subsystems: Vec<ReactionSystem>) -> Result<ReactionSystem, ModelError> {
        let mut composed = self.clone();
        for system in subsystems {
            composed.add_system(system)?;
        }
        info!(
            "Composed {} with {} subsystems",
            composed.name,
            composed.systems.len()
        );
        Ok(composed)
    }

    /// Create a copy of this system with the species, parameters, reactions and subsystems of
    /// `other` merged in
    ///
    /// Reactions already present are not duplicated. Fails with [`ModelError::NameConflict`]
    /// if a name is defined differently in the two systems.
    pub fn extend(&self, other: &ReactionSystem) -> Result<ReactionSystem, ModelError> {
        if self.iv != other.iv {
            return Err(ModelError::NameConflict {
                name: other.iv.clone(),
                reason: format!(
                    "{} uses independent variable {} but {} uses {}",
                    other.name, other.iv, self.name, self.iv
                ),
            });
        }
        let mut merged = self.clone();
        for species in other.species.values() {
            match merged.role_of(&species.name) {
                None => {
                    merged.species.insert(species.name.clone(), species.clone());
                }
                Some(Role::Species) if merged.species.get(&species.name) == Some(species) => {}
                Some(role) => {
                    return Err(conflict(&species.name, role, Role::Species, &self.name, &other.name))
                }
            }
        }
        for parameter in other.parameters.values() {
            match merged.role_of(&parameter.name) {
                None => {
                    merged
                        .parameters
                        .insert(parameter.name.clone(), parameter.clone());
                }
                Some(Role::Parameter)
                    if merged.parameters.get(&parameter.name) == Some(parameter) => {}
                Some(role) => {
                    return Err(conflict(
                        &parameter.name,
                        role,
                        Role::Parameter,
                        &self.name,
                        &other.name,
                    ))
                }
            }
        }
        for reaction in &other.reactions {
            if !merged.reactions.contains(reaction) {
                merged.reactions.push(reaction.clone());
            }
        }
        for (name, system) in &other.systems {
            match merged.systems.get(name) {
                Some(existing) if existing == system => {}
                Some(_) => {
                    return Err(ModelError::NameConflict {
                        name: name.clone(),
                        reason: format!(
                            "subsystem differs between {} and {}",
                            self.name, other.name
                        ),
                    })
                }
                None => {
                    merged.systems.insert(name.clone(), system.clone());
                }
            }
        }
        merged.bump_revision();
        info!("Extended {} with {}", self.name, other.name);
        Ok(merged)
    }

    /// In place version of [`ReactionSystem::extend`], the system is unchanged on error
    pub fn extend_in_place(&mut self, other: &ReactionSystem) -> Result<(), ModelError> {
        let merged = self.extend(other)?;
        *self = merged;
        Ok(())
    }

    /// Merge the whole subsystem tree into a single system
    ///
    /// Entities of a subsystem are renamed to `subsystem₊name` (nested subsystems give
    /// `outer₊inner₊name`), using the configured namespace separator. Entities of this system
    /// keep their names. Fails with [`ModelError::NameConflict`] if two entities end up with
    /// the same name.
    pub fn flatten(&self) -> Result<ReactionSystem, ModelError> {
        let separator = Configuration::current().namespace_separator;
        let mut flat = ReactionSystem::new_empty_with_iv(&self.name, &self.iv);
        flat.options = self.options.clone();
        self.flatten_into(&mut flat, "", &separator)?;
        info!(
            "Flattened {} into {} species, {} parameters and {} reactions",
            self.name,
            flat.num_species(),
            flat.num_params(),
            flat.num_reactions()
        );
        Ok(flat)
    }

    /// Depth first walk adding every entity of the tree to `flat` under its namespaced name
    fn flatten_into(
        &self,
        flat: &mut ReactionSystem,
        prefix: &str,
        separator: &str,
    ) -> Result<(), ModelError> {
        let rename = |name: &str| -> String {
            if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{}{}{}", prefix, separator, name)
            }
        };
        for species in self.species.values() {
            let name = rename(&species.name);
            flat.check_flattened_name(&name)?;
            flat.species.insert(name.clone(), species.renamed(name));
        }
        for parameter in self.parameters.values() {
            let name = rename(&parameter.name);
            flat.check_flattened_name(&name)?;
            flat.parameters.insert(name.clone(), parameter.renamed(name));
        }
        for reaction in &self.reactions {
            flat.reactions.push(reaction.renamed(&rename, &self.iv));
        }
        flat.bump_revision();
        for (name, system) in &self.systems {
            system.flatten_into(flat, &rename(name), separator)?;
        }
        Ok(())
    }

    fn check_flattened_name(&self, name: &str) -> Result<(), ModelError> {
        match self.role_of(name) {
            None => Ok(()),
            Some(role) => Err(ModelError::NameConflict {
                name: name.to_string(),
                reason: format!("flattening produces this name twice (already a {})", role),
            }),
        }
    }
    // endregion Composition
}

/// Systems are equal if their species and parameters are equal as sets, their reactions are
/// equal as ordered lists, and their subsystems are equal by name. The system name, the
/// independent variable and the options are not compared.
impl PartialEq for ReactionSystem {
    fn eq(&self, other: &Self) -> bool {
        // IndexMap equality does not depend on insertion order
        self.species == other.species
            && self.parameters == other.parameters
            && self.reactions == other.reactions
            && self.systems == other.systems
    }
}

fn check_name(name: &str) -> Result<(), ModelError> {
    if name.is_empty() {
        return Err(ModelError::InvalidReaction(
            "names must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn conflict(name: &str, existing: Role, incoming: Role, ours: &str, theirs: &str) -> ModelError {
    let reason = if existing == incoming {
        format!("the {} is defined differently in {} and {}", existing, ours, theirs)
    } else {
        format!("it is a {} in {} but a {} in {}", existing, ours, incoming, theirs)
    };
    ModelError::NameConflict {
        name: name.to_string(),
        reason,
    }
}
