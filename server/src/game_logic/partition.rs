use std::collections::HashMap;

use crate::game_logic::sampler::UsedSet;
use crate::game_logic::utils::normalize;

/// Identifies the no-repeat history of one normal-question pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey {
    pub language: String,
    pub difficulty: String,
    pub category_id: String,
}

impl PartitionKey {
    pub fn new(language: &str, difficulty: &str, category_id: &str) -> Self {
        Self {
            language: language.to_string(),
            difficulty: normalize(difficulty),
            category_id: normalize(category_id),
        }
    }
}

/// Owns every used-set of the session, created lazily per partition.
#[derive(Debug, Default)]
pub struct PartitionIndex {
    partitions: HashMap<PartitionKey, UsedSet>,
    wildcards: HashMap<String, UsedSet>,
}

impl PartitionIndex {
    pub fn resolve(&mut self, language: &str, difficulty: &str, category_id: &str) -> &mut UsedSet {
        self.partitions
            .entry(PartitionKey::new(language, difficulty, category_id))
            .or_default()
    }

    pub fn resolve_wildcard(&mut self, language: &str) -> &mut UsedSet {
        self.wildcards.entry(language.to_string()).or_default()
    }

    pub fn peek(&self, language: &str, difficulty: &str, category_id: &str) -> Option<&UsedSet> {
        self.partitions
            .get(&PartitionKey::new(language, difficulty, category_id))
    }

    pub fn peek_wildcard(&self, language: &str) -> Option<&UsedSet> {
        self.wildcards.get(language)
    }

    /// Clear every used-set, normal and wildcard, belonging to `language`.
    pub fn reset_language(&mut self, language: &str) {
        let before = self.partitions.len();
        self.partitions.retain(|key, _| key.language != language);
        let removed = before - self.partitions.len();
        let wildcard_removed = self.wildcards.remove(language).is_some();

        tracing::debug!(
            content.language = %language,
            partitions.removed = removed,
            wildcard.removed = wildcard_removed,
            "Reset sampling history for language"
        );
    }
}
