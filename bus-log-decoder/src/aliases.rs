//! Alias table and address resolution
//!
//! Alias comment lines bind a display name to a full bus address. Addresses
//! without an alias fall back to their dotted canonical form.

use crate::types::BusAddress;
use std::collections::HashMap;

/// Maps a bus address to the name of its stream
pub trait AddressResolver {
    /// Resolve an address to a display name. Never fails.
    fn resolve(&self, address: &BusAddress) -> String;
}

/// Address to display name bindings collected from alias lines
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    aliases: HashMap<BusAddress, String>,
}

impl AliasTable {
    /// Create an empty alias table
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `address`, replacing any earlier binding
    ///
    /// Returns the previous name, if there was one.
    pub fn insert(&mut self, address: BusAddress, name: impl Into<String>) -> Option<String> {
        let name = name.into();
        let previous = self.aliases.insert(address, name);
        if let Some(old) = &previous {
            log::debug!("Alias for {} redefined (was {})", address, old);
        }
        previous
    }

    /// Look up the alias bound to `address`
    pub fn get(&self, address: &BusAddress) -> Option<&str> {
        self.aliases.get(address).map(String::as_str)
    }

    /// Number of aliases defined
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// True if no alias is defined
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl AddressResolver for AliasTable {
    fn resolve(&self, address: &BusAddress) -> String {
        match self.get(address) {
            Some(alias) => alias.to_string(),
            None => address.to_string(),
        }
    }
}
