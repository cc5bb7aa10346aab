//! The ordered table of known evidence sources.

use std::collections::BTreeMap;

use claim_config::SourceOverride;
use claim_core::enums::SourceCategory;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// One registry entry.
///
/// Lower `sequence` values are traversed first. Negative values mark
/// sources that may be left out of the default traversal (see
/// [`SourceRegistry::default_order`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub key: String,
    pub category: SourceCategory,
    pub display_name: String,
    pub sequence: i32,
}

impl SourceConfig {
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        category: SourceCategory,
        display_name: impl Into<String>,
        sequence: i32,
    ) -> Self {
        Self {
            key: key.into(),
            category,
            display_name: display_name.into(),
            sequence,
        }
    }
}

/// Source registry in declaration order.
///
/// Keys are unique case-insensitively. The registry is immutable once
/// built; per-claim reordering happens on copies of [`Self::default_order`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRegistry {
    entries: Vec<SourceConfig>,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SourceRegistry {
    /// Build a registry from explicit entries.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::DuplicateKey`] if two entries share a key and
    /// [`SourceError::InvalidConfig`] for a blank key.
    pub fn new(entries: Vec<SourceConfig>) -> Result<Self, SourceError> {
        for (i, entry) in entries.iter().enumerate() {
            if entry.key.trim().is_empty() {
                return Err(SourceError::InvalidConfig {
                    key: entry.key.clone(),
                    reason: "source key must not be blank".into(),
                });
            }
            if entries[..i]
                .iter()
                .any(|earlier| earlier.key.eq_ignore_ascii_case(&entry.key))
            {
                return Err(SourceError::DuplicateKey(entry.key.clone()));
            }
        }
        Ok(Self { entries })
    }

    /// The built-in source table.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                SourceConfig::new("twitter", SourceCategory::Social, "Twitter", 1),
                SourceConfig::new("bluesky", SourceCategory::Social, "BlueSky", -2),
                SourceConfig::new("news", SourceCategory::News, "News", -3),
                SourceConfig::new("gov", SourceCategory::Government, "Government", -4),
            ],
        }
    }

    /// Apply configuration overrides.
    ///
    /// An override for a known key replaces the fields it names, or removes
    /// the source when `enabled = false`. An override for an unknown key adds
    /// a source and must carry `category` and `sequence`; its display name
    /// defaults to the key.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidConfig`] when a new source is missing
    /// `category` or `sequence`.
    pub fn with_overrides(
        mut self,
        overrides: &BTreeMap<String, SourceOverride>,
    ) -> Result<Self, SourceError> {
        for (key, source) in overrides {
            let existing = self
                .entries
                .iter()
                .position(|entry| entry.key.eq_ignore_ascii_case(key));

            match (existing, source.enabled) {
                (Some(index), false) => {
                    self.entries.remove(index);
                }
                (Some(index), true) => {
                    let entry = &mut self.entries[index];
                    if let Some(sequence) = source.sequence {
                        entry.sequence = sequence;
                    }
                    if let Some(category) = source.category {
                        entry.category = category;
                    }
                    if let Some(display_name) = &source.display_name {
                        entry.display_name.clone_from(display_name);
                    }
                }
                (None, false) => {
                    tracing::debug!(source = %key, "override disables an unknown source, ignoring");
                }
                (None, true) => {
                    let (Some(category), Some(sequence)) = (source.category, source.sequence)
                    else {
                        return Err(SourceError::InvalidConfig {
                            key: key.clone(),
                            reason: "a new source needs both category and sequence".into(),
                        });
                    };
                    let display_name = source.display_name.clone().unwrap_or_else(|| key.clone());
                    self.entries
                        .push(SourceConfig::new(key.clone(), category, display_name, sequence));
                }
            }
        }
        Self::new(self.entries)
    }

    /// Built-in registry with the configured overrides applied.
    ///
    /// # Errors
    ///
    /// See [`Self::with_overrides`].
    pub fn from_config(config: &claim_config::ClaimConfig) -> Result<Self, SourceError> {
        Self::builtin().with_overrides(&config.sources)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SourceConfig> {
        self.entries
            .iter()
            .find(|entry| entry.key.eq_ignore_ascii_case(key))
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Canonical key for a case-insensitive name, if registered.
    #[must_use]
    pub fn resolve_key(&self, name: &str) -> Option<&str> {
        self.get(name.trim()).map(|entry| entry.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceConfig> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Source keys sorted ascending by sequence.
    ///
    /// The sort is stable, so equal sequences keep declaration order. With
    /// `skip_negative`, sources with a negative sequence are left out.
    #[must_use]
    pub fn default_order(&self, skip_negative: bool) -> Vec<String> {
        let mut entries: Vec<&SourceConfig> = self
            .entries
            .iter()
            .filter(|entry| !skip_negative || entry.sequence >= 0)
            .collect();
        entries.sort_by_key(|entry| entry.sequence);
        entries.into_iter().map(|entry| entry.key.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn builtin_default_order_is_ascending_by_sequence() {
        let registry = SourceRegistry::builtin();
        assert_eq!(
            registry.default_order(false),
            vec!["gov", "news", "bluesky", "twitter"]
        );
    }

    #[test]
    fn skip_negative_filters_negative_sequences() {
        let registry = SourceRegistry::builtin();
        assert_eq!(registry.default_order(true), vec!["twitter"]);
    }

    #[test]
    fn equal_sequences_keep_declaration_order() {
        let registry = SourceRegistry::new(vec![
            SourceConfig::new("b", SourceCategory::Other, "B", 0),
            SourceConfig::new("a", SourceCategory::Other, "A", 0),
            SourceConfig::new("c", SourceCategory::Other, "C", -1),
        ])
        .unwrap();
        assert_eq!(registry.default_order(false), vec!["c", "b", "a"]);
    }

    #[rstest]
    #[case("twitter", Some("twitter"))]
    #[case("Twitter", Some("twitter"))]
    #[case(" BLUESKY ", Some("bluesky"))]
    #[case("mastodon", None)]
    fn resolve_key_is_case_insensitive(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(SourceRegistry::builtin().resolve_key(name), expected);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = SourceRegistry::new(vec![
            SourceConfig::new("news", SourceCategory::News, "News", 1),
            SourceConfig::new("NEWS", SourceCategory::News, "News again", 2),
        ])
        .unwrap_err();
        assert!(matches!(err, SourceError::DuplicateKey(key) if key == "NEWS"));
    }

    #[test]
    fn overrides_reorder_disable_and_add() {
        let overrides = BTreeMap::from([
            (
                "twitter".to_string(),
                SourceOverride {
                    sequence: Some(-10),
                    ..SourceOverride::default()
                },
            ),
            (
                "gov".to_string(),
                SourceOverride {
                    enabled: false,
                    ..SourceOverride::default()
                },
            ),
            (
                "factcheck".to_string(),
                SourceOverride {
                    sequence: Some(5),
                    category: Some(SourceCategory::Other),
                    display_name: Some("Fact Check Archive".into()),
                    ..SourceOverride::default()
                },
            ),
        ]);

        let registry = SourceRegistry::builtin().with_overrides(&overrides).unwrap();

        assert!(!registry.contains("gov"));
        assert_eq!(
            registry.get("factcheck").map(|s| s.display_name.as_str()),
            Some("Fact Check Archive")
        );
        assert_eq!(
            registry.default_order(false),
            vec!["twitter", "news", "bluesky", "factcheck"]
        );
    }

    #[test]
    fn new_source_without_sequence_is_rejected() {
        let overrides = BTreeMap::from([(
            "factcheck".to_string(),
            SourceOverride {
                category: Some(SourceCategory::Other),
                ..SourceOverride::default()
            },
        )]);
        let err = SourceRegistry::builtin()
            .with_overrides(&overrides)
            .unwrap_err();
        assert!(matches!(err, SourceError::InvalidConfig { ref key, .. } if key == "factcheck"));
    }
}
