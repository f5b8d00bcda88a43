//! Function registry for looking up raster functions by name.

use crate::core::node::{Category, FunctionMetadata, RasterFunction};
use indexmap::IndexMap;
use std::sync::Arc;

/// Factory function for creating function instances.
pub type FunctionFactory = Arc<dyn Fn() -> Box<dyn RasterFunction> + Send + Sync>;

/// Registry entry containing metadata and factory.
#[derive(Clone)]
pub struct RegistryEntry {
    /// Factory function to create instances.
    pub factory: FunctionFactory,
    /// Cached metadata (avoids creating instance just to get metadata).
    pub metadata: FunctionMetadata,
}

/// Registry of available raster functions.
///
/// Hosts select a function by id; the registry hands out fresh instances
/// and answers metadata queries without instantiating anything.
pub struct FunctionRegistry {
    /// Functions indexed by their unique ID.
    functions: IndexMap<String, RegistryEntry>,
    /// Function IDs grouped by category.
    categories: IndexMap<Category, Vec<String>>,
}

impl FunctionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            functions: IndexMap::new(),
            categories: IndexMap::new(),
        }
    }

    /// Create a registry pre-populated with built-in functions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::functions::builtin::register_all(&mut registry);
        registry
    }

    /// Register a function type. A later registration with the same id
    /// replaces the earlier one.
    pub fn register<F>(&mut self, factory: F)
    where
        F: Fn() -> Box<dyn RasterFunction> + Send + Sync + 'static,
    {
        let metadata = factory().metadata();
        let id = metadata.id.clone();
        let category = metadata.category;

        if self.contains(&id) {
            log::debug!("Replacing registered function '{}'", id);
            self.unregister(&id);
        }

        self.functions.insert(
            id.clone(),
            RegistryEntry {
                factory: Arc::new(factory),
                metadata,
            },
        );
        self.categories.entry(category).or_default().push(id);
    }

    /// Create a new instance of a function by ID.
    pub fn create(&self, id: &str) -> Option<Box<dyn RasterFunction>> {
        self.functions.get(id).map(|e| (e.factory)())
    }

    /// Get metadata for a function without creating an instance.
    pub fn get_metadata(&self, id: &str) -> Option<&FunctionMetadata> {
        self.functions.get(id).map(|e| &e.metadata)
    }

    /// Check if a function is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.functions.contains_key(id)
    }

    /// Get all registered function IDs, in registration order.
    pub fn function_ids(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(|s| s.as_str())
    }

    /// Get all registered functions.
    pub fn functions(&self) -> impl Iterator<Item = (&str, &RegistryEntry)> {
        self.functions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Get function IDs by category.
    pub fn functions_by_category(&self, category: &Category) -> Vec<&str> {
        self.categories
            .get(category)
            .map(|ids| ids.iter().map(|s| s.as_str()).collect())
            .unwrap_or_default()
    }

    /// Search functions by id, name, description or tag.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let query = query.to_lowercase();

        self.functions
            .iter()
            .filter(|(_, entry)| {
                let metadata = &entry.metadata;
                metadata.id.to_lowercase().contains(&query)
                    || metadata.name.to_lowercase().contains(&query)
                    || metadata.description.to_lowercase().contains(&query)
                    || metadata.tags.iter().any(|t| t.to_lowercase().contains(&query))
            })
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Unregister a function.
    pub fn unregister(&mut self, id: &str) -> bool {
        if let Some(entry) = self.functions.shift_remove(id) {
            if let Some(ids) = self.categories.get_mut(&entry.metadata.category) {
                ids.retain(|i| i != id);
            }
            true
        } else {
            false
        }
    }

    /// Get the total number of registered functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Builder for creating a customized registry.
pub struct RegistryBuilder {
    registry: FunctionRegistry,
    include_builtins: bool,
}

impl RegistryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            registry: FunctionRegistry::new(),
            include_builtins: true,
        }
    }

    /// Include or exclude built-in functions.
    pub fn with_builtins(mut self, include: bool) -> Self {
        self.include_builtins = include;
        self
    }

    /// Register a custom function.
    pub fn register<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn RasterFunction> + Send + Sync + 'static,
    {
        self.registry.register(factory);
        self
    }

    /// Build the registry. Custom functions registered under a built-in id
    /// take precedence.
    pub fn build(self) -> FunctionRegistry {
        if !self.include_builtins {
            return self.registry;
        }
        let mut registry = FunctionRegistry::with_builtins();
        for (_, entry) in self.registry.functions {
            let factory = entry.factory;
            registry.register(move || factory());
        }
        registry
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
