//! Core rust implementation of Catalyrs, a crate for structural analysis of chemical reaction
//! networks.

pub mod analysis;
pub mod configuration;
pub mod expression;
pub mod io;
pub mod rate_laws;
pub mod reaction_network;
