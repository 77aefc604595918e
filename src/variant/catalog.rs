use std::sync::Arc;

use strum::IntoEnumIterator;

use super::{Behavior, VariantError, VariantKind, VariantResult};

pub type VariantFactory = Arc<dyn Fn() -> VariantResult<Box<dyn Behavior>> + Send + Sync>;

struct CatalogEntry {
    kind: VariantKind,
    factory: VariantFactory,
}

/// Compile-time registered factory table, one entry per [`VariantKind`].
///
/// Enumeration order is the declaration order of [`VariantKind`] and is the
/// same on every call.
#[derive(Clone)]
pub struct VariantCatalog {
    entries: Arc<Vec<CatalogEntry>>,
}

impl VariantCatalog {
    /// All five built-in variants.
    pub fn builtin() -> Self {
        Self::from_kinds(VariantKind::iter())
    }

    pub fn from_kinds(kinds: impl IntoIterator<Item = VariantKind>) -> Self {
        let mut entries: Vec<CatalogEntry> = Vec::new();
        for kind in kinds {
            if entries.iter().any(|entry| entry.kind == kind) {
                continue;
            }
            entries.push(CatalogEntry {
                kind,
                factory: Arc::new(move || Ok(kind.create())),
            });
        }
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Replaces the factory for `kind`, appending the kind if it is missing.
    pub fn with_factory(self, kind: VariantKind, factory: VariantFactory) -> Self {
        let mut entries: Vec<CatalogEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.kind != kind)
            .map(|entry| CatalogEntry {
                kind: entry.kind,
                factory: entry.factory.clone(),
            })
            .collect();
        let position = self
            .entries
            .iter()
            .position(|entry| entry.kind == kind)
            .unwrap_or(entries.len());
        entries.insert(position, CatalogEntry { kind, factory });
        Self {
            entries: Arc::new(entries),
        }
    }

    pub fn kinds(&self) -> Vec<VariantKind> {
        self.entries.iter().map(|entry| entry.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<VariantKind> {
        self.entries.get(index).map(|entry| entry.kind)
    }

    pub fn contains(&self, kind: VariantKind) -> bool {
        self.entries.iter().any(|entry| entry.kind == kind)
    }

    pub fn create(&self, kind: VariantKind) -> VariantResult<Box<dyn Behavior>> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.kind == kind)
            .ok_or(VariantError::UnknownKind(kind))?;
        let behavior = (entry.factory)()?;
        if behavior.kind() != kind {
            return Err(VariantError::Construction {
                kind,
                message: format!("factory produced {}", behavior.kind()),
            });
        }
        Ok(behavior)
    }
}

impl Default for VariantCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for VariantCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}
