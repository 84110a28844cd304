//! Host/role configuration for a remote-execution tool

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Role name → ordered host addresses
pub type RoleMapping = BTreeMap<String, Vec<String>>;

/// Mutable host/role configuration handed to role resolution.
///
/// Plays the part of a remote-execution tool's global environment: a flat
/// `hosts` list, named `roledefs`, and free-form `vars` that double as the
/// fallback credential store. Passed explicitly instead of living in
/// process-wide state, so resolution stays pure with respect to its
/// inputs and outputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    /// Flat host list, set only by "__all__" queries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<String>>,

    /// Role name → host addresses
    #[serde(default)]
    pub roledefs: RoleMapping,

    /// Free-form configuration entries
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub vars: HashMap<String, String>,
}

impl Inventory {
    /// Look up a configuration entry by name
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}
