//! Post type feature registry.
//!
//! Post types declare the features they support at startup ("expiration"
//! among them). The registry is built once and then shared read-only.

use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct PostTypeRegistry {
    supports: BTreeMap<String, BTreeSet<String>>,
}

impl PostTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a post type with its supported features. Registering the same
    /// type again adds to its features.
    pub fn register(&mut self, post_type: &str, features: &[&str]) {
        let entry = self.supports.entry(post_type.to_string()).or_default();
        entry.extend(features.iter().map(|f| f.to_string()));
    }

    pub fn add_support(&mut self, post_type: &str, feature: &str) {
        self.register(post_type, &[feature]);
    }

    pub fn supports(&self, post_type: &str, feature: &str) -> bool {
        self.supports
            .get(post_type)
            .is_some_and(|features| features.contains(feature))
    }

    /// All post types supporting `feature`, sorted by name.
    pub fn types_supporting(&self, feature: &str) -> Vec<String> {
        self.supports
            .iter()
            .filter(|(_, features)| features.contains(feature))
            .map(|(post_type, _)| post_type.clone())
            .collect()
    }
}
