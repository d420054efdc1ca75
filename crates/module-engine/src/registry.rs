//! Module registry: by-name lookup and category filtering.

use std::collections::HashMap;

use sphereframe_common::{SphereError, SphereResult};

use crate::module::{FrameModule, ModuleCategory, ModuleMetadata};
use crate::modules::builtin_factories;

type Factory = Box<dyn Fn() -> Box<dyn FrameModule> + Send + Sync>;

struct Entry {
    metadata: ModuleMetadata,
    factory: Factory,
}

/// Registry mapping module names to factories.
///
/// Every call to [`ModuleRegistry::create_instance`] builds a fresh,
/// uncreated module, so one registry can serve any number of pipelines.
pub struct ModuleRegistry {
    modules: HashMap<&'static str, Entry>,
}

impl ModuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Create a registry with all built-in modules registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for factory in builtin_factories() {
            registry.register(factory);
        }
        tracing::info!(count = registry.len(), "Registered built-in modules");
        registry
    }

    /// Register a factory. Overwrites any module with the same name.
    pub fn register<F>(&mut self, factory: F)
    where
        F: Fn() -> Box<dyn FrameModule> + Send + Sync + 'static,
    {
        let metadata = factory().metadata();
        if self.modules.contains_key(metadata.name) {
            tracing::debug!(module = metadata.name, "Replacing registered module");
        }
        self.modules.insert(
            metadata.name,
            Entry {
                metadata,
                factory: Box::new(factory),
            },
        );
    }

    /// Register a factory, failing if the name is already taken.
    pub fn try_register<F>(&mut self, factory: F) -> SphereResult<()>
    where
        F: Fn() -> Box<dyn FrameModule> + Send + Sync + 'static,
    {
        let name = factory().metadata().name;
        if self.modules.contains_key(name) {
            return Err(SphereError::AlreadyRegistered {
                name: name.to_string(),
            });
        }
        self.register(factory);
        Ok(())
    }

    /// Build a new instance of the named module.
    pub fn create_instance(&self, name: &str) -> SphereResult<Box<dyn FrameModule>> {
        self.modules
            .get(name)
            .map(|entry| (entry.factory)())
            .ok_or_else(|| SphereError::UnknownModule {
                name: name.to_string(),
            })
    }

    pub fn metadata(&self, name: &str) -> Option<ModuleMetadata> {
        self.modules.get(name).map(|entry| entry.metadata)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// All registered modules, sorted by name.
    pub fn list(&self) -> Vec<ModuleMetadata> {
        let mut list: Vec<_> = self.modules.values().map(|e| e.metadata).collect();
        list.sort_by_key(|m| m.name);
        list
    }

    /// Modules in `category`, sorted by name.
    pub fn list_by_category(&self, category: ModuleCategory) -> Vec<ModuleMetadata> {
        let mut list: Vec<_> = self
            .modules
            .values()
            .map(|e| e.metadata)
            .filter(|m| m.category == category)
            .collect();
        list.sort_by_key(|m| m.name);
        list
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::{ProjectionMode, ProjectionModule, TemporalToSpatial};

    #[test]
    fn empty_registry() {
        let reg = ModuleRegistry::new();
        assert!(reg.is_empty());
        assert!(reg.metadata("erp_to_square").is_none());
        assert!(reg.list().is_empty());
    }

    #[test]
    fn with_builtins_has_all_modules() {
        let reg = ModuleRegistry::with_builtins();
        assert_eq!(reg.len(), 8);
        for name in [
            "erp_to_square",
            "square_to_erp",
            "erp_square_roundtrip",
            "face_concat",
            "face_extract",
            "face_repack",
            "temporal_to_spatial",
            "spatial_to_temporal",
        ] {
            assert!(reg.contains(name), "missing {name}");
        }
    }

    #[test]
    fn list_is_sorted_by_name() {
        let reg = ModuleRegistry::with_builtins();
        let names: Vec<_> = reg.list().iter().map(|m| m.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn list_by_category_filters() {
        let reg = ModuleRegistry::with_builtins();
        let reshape: Vec<_> = reg
            .list_by_category(ModuleCategory::Reshape)
            .iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(reshape, vec!["spatial_to_temporal", "temporal_to_spatial"]);
        assert_eq!(reg.list_by_category(ModuleCategory::Projection360).len(), 3);
        assert_eq!(reg.list_by_category(ModuleCategory::FacePacking).len(), 3);
    }

    #[test]
    fn try_register_rejects_duplicates() {
        let mut reg = ModuleRegistry::new();
        reg.try_register(|| Box::new(TemporalToSpatial::new()))
            .unwrap();
        let err = reg
            .try_register(|| Box::new(TemporalToSpatial::new()))
            .unwrap_err();
        assert!(matches!(err, SphereError::AlreadyRegistered { ref name } if name == "temporal_to_spatial"));
    }

    #[test]
    fn register_overwrites() {
        let mut reg = ModuleRegistry::new();
        reg.register(|| Box::new(ProjectionModule::new(ProjectionMode::ErpToSquare)));
        reg.register(|| Box::new(ProjectionModule::new(ProjectionMode::ErpToSquare)));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn instances_are_independent() {
        let reg = ModuleRegistry::with_builtins();
        let mut a = reg.create_instance("face_extract").unwrap();
        let b = reg.create_instance("face_extract").unwrap();
        a.set_option("face_id", 3i64.into()).unwrap();
        assert_eq!(a.options().int("face_id").unwrap(), 3);
        assert_eq!(b.options().int("face_id").unwrap(), 0);
    }

    #[test]
    fn unknown_module_is_an_error() {
        let reg = ModuleRegistry::with_builtins();
        let err = reg.create_instance("blur").err().unwrap();
        assert!(matches!(err, SphereError::UnknownModule { .. }));
    }
}
