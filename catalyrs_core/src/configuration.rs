//! Process wide defaults used when new reaction systems are created
use std::sync::{LazyLock, RwLock};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    /// What happens when an identical species or parameter is added a second time
    pub duplicate_policy: DuplicatePolicy,
    /// Whether mass action ODE rate laws divide by the factorial of each substrate coefficient
    pub combinatoric_ratelaw: bool,
    /// Placed between a subsystem name and an entity name when flattening
    pub namespace_separator: String,
    /// Name of the independent variable of newly created systems
    pub independent_variable: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            duplicate_policy: DuplicatePolicy::Ignore,
            combinatoric_ratelaw: true,
            namespace_separator: "₊".to_string(),
            independent_variable: "t".to_string(),
        }
    }
}

impl Configuration {
    /// Snapshot of the current global configuration
    ///
    /// A poisoned lock still holds a usable configuration, so it is read anyway.
    pub fn current() -> Configuration {
        match CONFIGURATION.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// How re-adding an entry that is already present in a system is handled
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DuplicatePolicy {
    /// Re-adding an identical entry is a no-op
    Ignore,
    /// Re-adding any entry is reported as a duplicate name
    Error,
}
