use crate::compose::ComposedNamespace;
use crate::error::EngineError;
use std::sync::{Arc, OnceLock};
use tracing::info;

/// The well-known global binding a composed namespace is published under.
///
/// Single assignment: the first publish wins, any later one fails.
#[derive(Debug)]
pub struct ExportSlot {
    binding: String,
    cell: OnceLock<Arc<ComposedNamespace>>,
}

impl ExportSlot {
    pub fn new(binding: impl Into<String>) -> Self {
        Self { binding: binding.into(), cell: OnceLock::new() }
    }

    #[must_use]
    pub fn binding(&self) -> &str {
        &self.binding
    }

    /// Publishes `namespace`.
    ///
    /// # Errors
    /// Returns [`EngineError::AlreadyExported`] if the slot has already been written.
    pub fn publish(&self, namespace: ComposedNamespace) -> Result<Arc<ComposedNamespace>, EngineError> {
        let shared = Arc::new(namespace);
        self.cell.set(Arc::clone(&shared)).map_err(|_| EngineError::AlreadyExported {
            binding: self.binding.clone(),
            context: None,
        })?;
        info!(binding = %self.binding, keys = shared.len(), "Namespace exported");
        Ok(shared)
    }

    #[must_use]
    pub fn get(&self) -> Option<&Arc<ComposedNamespace>> {
        self.cell.get()
    }

    #[must_use]
    pub fn is_published(&self) -> bool {
        self.cell.get().is_some()
    }
}
