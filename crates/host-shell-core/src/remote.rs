use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// `container/exposedModule`, e.g. `remoteApp/App`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleLocator(String);

impl ModuleLocator {
    pub fn new(raw: impl Into<String>) -> Result<Self, ConfigError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        match trimmed.split_once('/') {
            Some((container, exposed)) if !container.is_empty() && !exposed.is_empty() => {
                Ok(Self(trimmed.to_string()))
            }
            _ => Err(ConfigError::InvalidRemoteEntry(raw)),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn container(&self) -> &str {
        self.0.split_once('/').map_or(self.0.as_str(), |(container, _)| container)
    }

    /// Module name as the federation container exposes it (`./App`).
    #[must_use]
    pub fn exposed_module(&self) -> String {
        let exposed = self.0.split_once('/').map_or("", |(_, exposed)| exposed);
        format!("./{exposed}")
    }
}

impl fmt::Display for ModuleLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMappingEntry {
    pub path_prefix: String,
    pub locator: ModuleLocator,
}

/// Static path-prefix to remote-module table, fixed at build/deploy time.
/// Lookups honour insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMappingTable {
    entries: Vec<RemoteMappingEntry>,
}

impl RemoteMappingTable {
    #[must_use]
    pub fn new(entries: Vec<RemoteMappingEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn production_defaults() -> Self {
        let entry = |prefix: &str, locator: &str| RemoteMappingEntry {
            path_prefix: prefix.to_string(),
            locator: ModuleLocator(locator.to_string()),
        };
        Self::new(vec![
            entry("/atena", "remoteApp/App"),
            entry("/blizzard", "remoteReactStreamlit/routes"),
            entry("/blizzard-admin", "remoteInformation/App"),
        ])
    }

    /// Parses `prefix=locator` pairs separated by commas.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut entries = Vec::new();
        for pair in raw.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
            let Some((prefix, locator)) = pair.split_once('=') else {
                return Err(ConfigError::InvalidRemoteEntry(pair.to_string()));
            };
            let prefix = prefix.trim().trim_end_matches('/');
            if !prefix.starts_with('/') || prefix.len() < 2 {
                return Err(ConfigError::InvalidRemoteEntry(pair.to_string()));
            }
            if entries
                .iter()
                .any(|entry: &RemoteMappingEntry| entry.path_prefix == prefix)
            {
                return Err(ConfigError::InvalidRemoteEntry(pair.to_string()));
            }
            entries.push(RemoteMappingEntry {
                path_prefix: prefix.to_string(),
                locator: ModuleLocator::new(locator)?,
            });
        }
        Ok(Self::new(entries))
    }

    #[must_use]
    pub fn entries(&self) -> &[RemoteMappingEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get_exact(&self, key: &str) -> Option<&ModuleLocator> {
        self.entries
            .iter()
            .find(|entry| entry.path_prefix == key)
            .map(|entry| &entry.locator)
    }

    /// Exact key first, then the first entry whose prefix starts `url`.
    #[must_use]
    pub fn lookup(&self, url: &str) -> Option<&RemoteMappingEntry> {
        if url.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|entry| entry.path_prefix == url)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|entry| url.starts_with(entry.path_prefix.as_str()))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_splits_container_and_exposed_module() {
        let locator = ModuleLocator::new("remoteReactStreamlit/routes").expect("valid locator");
        assert_eq!(locator.container(), "remoteReactStreamlit");
        assert_eq!(locator.exposed_module(), "./routes");
    }

    #[test]
    fn locator_requires_container_and_module() {
        assert!(ModuleLocator::new("remoteApp").is_err());
        assert!(ModuleLocator::new("/App").is_err());
        assert!(ModuleLocator::new("remoteApp/").is_err());
    }

    #[test]
    fn lookup_prefers_exact_key_over_earlier_prefix() {
        let table = RemoteMappingTable::production_defaults();
        let entry = table.lookup("/blizzard-admin").expect("mapped");
        assert_eq!(entry.locator.as_str(), "remoteInformation/App");
    }

    #[test]
    fn lookup_falls_back_to_first_prefix_in_insertion_order() {
        let table = RemoteMappingTable::production_defaults();
        let entry = table.lookup("/atena/stats").expect("mapped");
        assert_eq!(entry.locator.as_str(), "remoteApp/App");
        assert!(table.lookup("/unmapped").is_none());
        assert!(table.lookup("").is_none());
    }

    #[test]
    fn parse_reads_comma_separated_pairs() {
        let table =
            RemoteMappingTable::parse(" /atena/=remoteApp/App , /x=remoteX/Entry ").expect("parse");
        assert_eq!(table.entries().len(), 2);
        assert_eq!(
            table.get_exact("/atena").map(ModuleLocator::as_str),
            Some("remoteApp/App")
        );
        assert!(table.get_exact("/x").is_some());
    }

    #[test]
    fn parse_rejects_malformed_and_duplicate_entries() {
        assert!(RemoteMappingTable::parse("/atena").is_err());
        assert!(RemoteMappingTable::parse("atena=remoteApp/App").is_err());
        assert!(RemoteMappingTable::parse("/a=r/A,/a=r/B").is_err());
        assert!(RemoteMappingTable::parse("").expect("empty ok").is_empty());
    }
}
