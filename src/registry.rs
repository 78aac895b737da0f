//! Artifact Registry
//!
//! Ordered, append-only record of generated artifacts (VCL file paths).

use std::sync::{Arc, RwLock};
use tracing::debug;

/// Append-only list of artifact identifiers in registration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactRegistry {
    artifacts: Vec<String>,
}

impl ArtifactRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact. Duplicates are kept.
    pub fn append(&mut self, identifier: impl Into<String>) {
        let identifier = identifier.into();
        debug!("Registering artifact #{}: {}", self.artifacts.len() + 1, identifier);
        self.artifacts.push(identifier);
    }

    /// Most recently appended artifact
    pub fn latest(&self) -> Option<&str> {
        self.artifacts.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// All artifacts, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.artifacts.iter().map(String::as_str)
    }
}

/// Thread-safe handle to an [`ArtifactRegistry`]
///
/// Appends are serialized through the write lock, so a reader never sees a
/// partially registered artifact.
#[derive(Debug, Clone, Default)]
pub struct SharedArtifactRegistry {
    inner: Arc<RwLock<ArtifactRegistry>>,
}

impl SharedArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, identifier: impl Into<String>) {
        // A poisoned lock still holds a consistent Vec: push either happened or not.
        let mut registry = self.inner.write().unwrap_or_else(|e| e.into_inner());
        registry.append(identifier);
    }

    pub fn latest(&self) -> Option<String> {
        let registry = self.inner.read().unwrap_or_else(|e| e.into_inner());
        registry.latest().map(str::to_owned)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current registry contents
    pub fn snapshot(&self) -> ArtifactRegistry {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl From<ArtifactRegistry> for SharedArtifactRegistry {
    fn from(registry: ArtifactRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }
}
