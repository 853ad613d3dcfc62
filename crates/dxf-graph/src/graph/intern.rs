//! Content-keyed string interning.

use std::sync::Arc;

use rustc_hash::FxHashSet;

/// Interning pool: two strings with equal content resolve to the identical
/// `Arc<str>` instance, so repeated values (layer names, block names) share
/// one backing allocation.
#[derive(Debug, Clone, Default)]
pub struct StringPool {
    pool: FxHashSet<Arc<str>>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pooled instance for `value`, inserting it on first use.
    pub fn intern(&mut self, value: &str) -> Arc<str> {
        if let Some(existing) = self.pool.get(value) {
            return Arc::clone(existing);
        }
        let interned: Arc<str> = Arc::from(value);
        self.pool.insert(Arc::clone(&interned));
        interned
    }

    /// Number of distinct strings held by the pool.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}
