use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Deserialize)]
struct EntityEntry {
    #[serde(default)]
    properties: Vec<String>,
    #[serde(default)]
    resources: Vec<String>,
}

/// Immutable domain → owning entity lookup built from the entity list.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EntityMapping {
    by_domain: HashMap<String, String>,
}

impl EntityMapping {
    pub fn parse(json: &[u8]) -> Result<Self> {
        let entries: HashMap<String, EntityEntry> =
            serde_json::from_slice(json).context("invalid entity list")?;

        let mut by_domain = HashMap::new();
        for (entity, entry) in entries {
            for domain in entry.properties.iter().chain(entry.resources.iter()) {
                let domain = domain.trim().to_ascii_lowercase();
                if !domain.is_empty() {
                    by_domain.insert(domain, entity.clone());
                }
            }
        }
        Ok(Self { by_domain })
    }

    /// Entity owning `host`, trying each parent domain in turn.
    pub fn entity_for_host(&self, host: &str) -> Option<&str> {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        let mut candidate = host.as_str();
        loop {
            if let Some(entity) = self.by_domain.get(candidate) {
                return Some(entity.as_str());
            }
            let (_, parent) = candidate.split_once('.')?;
            candidate = parent;
        }
    }

    pub fn len(&self) -> usize { self.by_domain.len() }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool { self.by_domain.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTITIES: &[u8] = br#"{
        "Acme Corp": {"properties": ["acme.com"], "resources": ["acmecdn.net"]},
        "Widgets": {"properties": ["widgets.io"]}
    }"#;

    #[test]
    fn lookup_walks_parent_domains() {
        let mapping = EntityMapping::parse(ENTITIES).unwrap();
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.entity_for_host("acme.com"), Some("Acme Corp"));
        assert_eq!(mapping.entity_for_host("static.img.AcmeCDN.net"), Some("Acme Corp"));
        assert_eq!(mapping.entity_for_host("widgets.io."), Some("Widgets"));
        assert_eq!(mapping.entity_for_host("example.com"), None);
    }

    #[test]
    fn rejects_non_object_lists() {
        assert!(EntityMapping::parse(b"[1, 2]").is_err());
    }
}
