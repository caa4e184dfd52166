//! Revision guarded memoization of derived network properties
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, RwLock};

use log::trace;

use crate::analysis::complexes::ReactionComplexes;
use crate::analysis::conservation::ConservationLaws;
use crate::analysis::stoichiometry::StoichiometryMatrices;

/// A single cached value, tagged with the system revision it was computed at
///
/// A value is only handed out while the revision it was computed at matches the revision
/// asked for, any mutation of the owning system makes it stale.
pub struct Memo<T> {
    slot: RwLock<Option<(u64, Arc<T>)>>,
}

impl<T> Memo<T> {
    pub fn new() -> Self {
        Memo {
            slot: RwLock::new(None),
        }
    }

    /// Whether a value computed at `revision` is currently stored
    pub fn is_fresh(&self, revision: u64) -> bool {
        match self.slot.read() {
            Ok(guard) => matches!(guard.as_ref(), Some((rev, _)) if *rev == revision),
            Err(_) => false,
        }
    }

    /// Return the stored value for `revision`, computing and storing it first if needed
    pub fn get_or_try_compute<E, F>(&self, revision: u64, compute: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Ok(guard) = self.slot.read() {
            if let Some((rev, value)) = guard.as_ref() {
                if *rev == revision {
                    return Ok(value.clone());
                }
            }
        }
        trace!(
            "Recomputing {} at revision {}",
            std::any::type_name::<T>(),
            revision
        );
        let value = Arc::new(compute()?);
        // A poisoned slot is simply not filled, the next access recomputes
        if let Ok(mut guard) = self.slot.write() {
            *guard = Some((revision, value.clone()));
        }
        Ok(value)
    }

    /// Infallible version of [`Memo::get_or_try_compute`]
    pub fn get_or_compute<F>(&self, revision: u64, compute: F) -> Arc<T>
    where
        F: FnOnce() -> T,
    {
        match self.get_or_try_compute::<std::convert::Infallible, _>(revision, || Ok(compute())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Memo::new()
    }
}

/// Cloning a memo gives an empty one, the clone recomputes on first use
impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Memo::new()
    }
}

impl<T> Debug for Memo<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let revision = match self.slot.read() {
            Ok(guard) => guard.as_ref().map(|(rev, _)| *rev),
            Err(_) => None,
        };
        f.debug_struct("Memo").field("revision", &revision).finish()
    }
}

/// All derived values cached by a reaction system
#[derive(Clone, Debug, Default)]
pub struct AnalysisCache {
    pub(crate) stoichiometry: Memo<StoichiometryMatrices>,
    pub(crate) complexes: Memo<ReactionComplexes>,
    pub(crate) linkage_classes: Memo<Vec<Vec<usize>>>,
    pub(crate) conservation: Memo<ConservationLaws>,
}
