
use std::collections::BTreeMap;
use std::sync::Arc;

use super::VectorIndex;

/// Read-only set of loaded indexes keyed by canonical model name.
///
/// Built once at startup and shared between request handlers.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    indexes: BTreeMap<String, Arc<VectorIndex>>,
}

impl ModelRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn from_indexes(indexes: impl IntoIterator<Item = VectorIndex>) -> Self {
        let mut registry = Self::new();
        for index in indexes {
            registry.insert(index);
        }
        registry
    }

    /// Register `index` under its name, returning any index it replaced
    #[inline]
    pub fn insert(&mut self, index: VectorIndex) -> Option<Arc<VectorIndex>> {
        self.indexes
            .insert(index.name().to_string(), Arc::new(index))
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<Arc<VectorIndex>> {
        self.indexes.get(name).cloned()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.indexes.contains_key(name)
    }

    /// Registered model names in sorted order
    #[inline]
    pub fn names(&self) -> Vec<String> {
        self.indexes.keys().cloned().collect()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<VectorIndex>)> {
        self.indexes.iter().map(|(name, index)| (name.as_str(), index))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}
