//! In-memory implementation of `TypeRegistry` and `PluginSource`.
//!
//! Resolver types are registered with the plugin that owns them and a
//! factory. Used to embed resolvers without dynamic loading, and in tests.

use crate::default::{DEFAULT_RESOLVER_TYPE, DefaultResolver};
use assetres_plugin::{
    CapabilityKind, PackageResolverFactory, PluginHandle, PluginSource, ResolverFactory, TypeName,
    TypeRegistry, metadata,
};
use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Name of the plugin owning the built-in resolver types.
pub const BUILTIN_PLUGIN: &str = "assetres";

/// A plugin whose metadata is declared up front.
#[derive(Debug)]
pub struct StaticPlugin {
    name: String,
    path: Option<PathBuf>,
    metadata: HashMap<TypeName, Map<String, Value>>,
    loads: bool,
    loaded: AtomicBool,
    load_calls: AtomicUsize,
}

impl StaticPlugin {
    pub fn builder(name: impl Into<String>) -> StaticPluginBuilder {
        StaticPluginBuilder {
            name: name.into(),
            path: None,
            metadata: HashMap::new(),
            loads: true,
        }
    }

    /// Number of times `load` was called.
    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }
}

impl PluginHandle for StaticPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn load(&self) -> bool {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        if self.loads {
            self.loaded.store(true, Ordering::SeqCst);
        }
        self.loads
    }

    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    fn metadata_for(&self, ty: &TypeName) -> Map<String, Value> {
        self.metadata.get(ty).cloned().unwrap_or_default()
    }
}

pub struct StaticPluginBuilder {
    name: String,
    path: Option<PathBuf>,
    metadata: HashMap<TypeName, Map<String, Value>>,
    loads: bool,
}

impl StaticPluginBuilder {
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Declare metadata for `ty`. Non-object values are ignored.
    pub fn metadata(mut self, ty: impl Into<String>, value: Value) -> Self {
        if let Value::Object(map) = value {
            self.metadata.insert(TypeName::new(ty.into()), map);
        }
        self
    }

    /// Make every `load` call fail.
    pub fn failing_load(mut self) -> Self {
        self.loads = false;
        self
    }

    pub fn build(self) -> Arc<StaticPlugin> {
        Arc::new(StaticPlugin {
            name: self.name,
            path: self.path,
            metadata: self.metadata,
            loads: self.loads,
            loaded: AtomicBool::new(false),
            load_calls: AtomicUsize::new(0),
        })
    }
}

#[derive(Default)]
struct TypeEntry {
    bases: Vec<TypeName>,
    plugin: Option<Arc<dyn PluginHandle>>,
    resolver_factory: Option<Arc<dyn ResolverFactory>>,
    package_factory: Option<Arc<dyn PackageResolverFactory>>,
}

/// Thread-safe in-memory type registry and plugin source.
pub struct InMemoryRegistry {
    types: RwLock<HashMap<TypeName, TypeEntry>>,
}

impl InMemoryRegistry {
    /// A registry holding only the abstract `Resolver` and `PackageResolver`
    /// roots.
    pub fn new() -> Self {
        let mut types = HashMap::new();
        for kind in [CapabilityKind::Resolver, CapabilityKind::PackageResolver] {
            types.insert(kind.root_type(), TypeEntry::default());
        }
        Self {
            types: RwLock::new(types),
        }
    }

    /// A registry with the built-in `DefaultResolver` registered.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        let plugin = StaticPlugin::builder(BUILTIN_PLUGIN)
            .metadata(
                DEFAULT_RESOLVER_TYPE,
                json!({ (metadata::IMPLEMENTS_CONTEXTS): true }),
            )
            .build();
        registry.register_resolver(DEFAULT_RESOLVER_TYPE, plugin, || {
            Some(Arc::new(DefaultResolver::default()) as Arc<dyn assetres_plugin::Resolver>)
        });
        registry
    }

    /// Register a resolver type deriving directly from `Resolver`.
    pub fn register_resolver<F>(&self, ty: &str, plugin: Arc<dyn PluginHandle>, factory: F)
    where
        F: ResolverFactory + 'static,
    {
        self.register_resolver_deriving(ty, &[], plugin, factory);
    }

    /// Register a resolver type deriving from `bases` (or `Resolver` when
    /// empty).
    pub fn register_resolver_deriving<F>(
        &self,
        ty: &str,
        bases: &[&str],
        plugin: Arc<dyn PluginHandle>,
        factory: F,
    ) where
        F: ResolverFactory + 'static,
    {
        self.insert(
            ty,
            bases,
            CapabilityKind::Resolver,
            TypeEntry {
                plugin: Some(plugin),
                resolver_factory: Some(Arc::new(factory)),
                ..Default::default()
            },
        );
    }

    pub fn register_package_resolver<F>(&self, ty: &str, plugin: Arc<dyn PluginHandle>, factory: F)
    where
        F: PackageResolverFactory + 'static,
    {
        self.insert(
            ty,
            &[],
            CapabilityKind::PackageResolver,
            TypeEntry {
                plugin: Some(plugin),
                package_factory: Some(Arc::new(factory)),
                ..Default::default()
            },
        );
    }

    /// Register an abstract intermediate type, optionally owned by a plugin
    /// that declares metadata for it.
    pub fn register_abstract(
        &self,
        ty: &str,
        bases: &[&str],
        kind: CapabilityKind,
        plugin: Option<Arc<dyn PluginHandle>>,
    ) {
        self.insert(
            ty,
            bases,
            kind,
            TypeEntry {
                plugin,
                ..Default::default()
            },
        );
    }

    /// Register a type with no relation to either capability.
    pub fn register_unrelated(&self, ty: &str, plugin: Option<Arc<dyn PluginHandle>>) {
        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        types.insert(
            TypeName::new(ty),
            TypeEntry {
                plugin,
                ..Default::default()
            },
        );
    }

    fn insert(&self, ty: &str, bases: &[&str], kind: CapabilityKind, mut entry: TypeEntry) {
        entry.bases = if bases.is_empty() {
            vec![kind.root_type()]
        } else {
            bases.iter().map(|b| TypeName::new(b)).collect()
        };
        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        types.insert(TypeName::new(ty), entry);
    }

    fn derives_from(types: &HashMap<TypeName, TypeEntry>, ty: &TypeName, root: &TypeName) -> bool {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(ty.clone());
        visited.insert(ty.clone());

        while let Some(current) = queue.pop_front() {
            if &current == root {
                return true;
            }
            let Some(entry) = types.get(&current) else {
                continue;
            };
            for base in &entry.bases {
                if visited.insert(base.clone()) {
                    queue.push_back(base.clone());
                }
            }
        }
        false
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry for InMemoryRegistry {
    fn find_all_implementing(&self, capability: CapabilityKind) -> Vec<TypeName> {
        let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
        let root = capability.root_type();
        types
            .iter()
            .filter(|(_, entry)| match capability {
                CapabilityKind::Resolver => entry.resolver_factory.is_some(),
                CapabilityKind::PackageResolver => entry.package_factory.is_some(),
            })
            .filter(|(ty, _)| *ty != &root && Self::derives_from(&types, ty, &root))
            .map(|(ty, _)| ty.clone())
            .collect()
    }

    fn implements(&self, ty: &TypeName, capability: CapabilityKind) -> bool {
        let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
        let root = capability.root_type();
        ty != &root && types.contains_key(ty) && Self::derives_from(&types, ty, &root)
    }

    fn find_by_name(&self, name: &str) -> Option<TypeName> {
        let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
        let ty = TypeName::new(name);
        types.contains_key(&ty).then_some(ty)
    }

    fn base_types(&self, ty: &TypeName) -> Vec<TypeName> {
        let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
        types.get(ty).map(|e| e.bases.clone()).unwrap_or_default()
    }

    fn resolver_factory(&self, ty: &TypeName) -> Option<Arc<dyn ResolverFactory>> {
        let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
        types.get(ty)?.resolver_factory.clone()
    }

    fn package_resolver_factory(&self, ty: &TypeName) -> Option<Arc<dyn PackageResolverFactory>> {
        let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
        types.get(ty)?.package_factory.clone()
    }
}

impl PluginSource for InMemoryRegistry {
    fn find_owning_plugin(&self, ty: &TypeName) -> Option<Arc<dyn PluginHandle>> {
        let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
        types.get(ty)?.plugin.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetres_plugin::Resolver;

    fn default_factory() -> Option<Arc<dyn Resolver>> {
        Some(Arc::new(DefaultResolver::default()))
    }

    #[test]
    fn test_builtins() {
        let registry = InMemoryRegistry::with_builtins();
        let ty = DefaultResolver::type_name();

        assert_eq!(
            registry.find_all_implementing(CapabilityKind::Resolver),
            vec![ty.clone()]
        );
        assert!(registry.implements(&ty, CapabilityKind::Resolver));
        assert!(!registry.implements(&ty, CapabilityKind::PackageResolver));
        assert!(registry.resolver_factory(&ty).unwrap().create().is_some());

        let plugin = registry.find_owning_plugin(&ty).unwrap();
        assert_eq!(plugin.name(), BUILTIN_PLUGIN);
        assert_eq!(
            plugin.metadata_for(&ty).get(metadata::IMPLEMENTS_CONTEXTS),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn test_roots_are_not_implementations() {
        let registry = InMemoryRegistry::new();
        let root = CapabilityKind::Resolver.root_type();
        assert!(registry.find_all_implementing(CapabilityKind::Resolver).is_empty());
        assert!(!registry.implements(&root, CapabilityKind::Resolver));
        assert_eq!(registry.find_by_name("Resolver"), Some(root));
    }

    #[test]
    fn test_derived_chain() {
        let registry = InMemoryRegistry::new();
        let plugin = StaticPlugin::builder("studio").build();
        registry.register_abstract(
            "StudioResolverBase",
            &[],
            CapabilityKind::Resolver,
            Some(plugin.clone()),
        );
        registry.register_resolver_deriving(
            "StudioResolver",
            &["StudioResolverBase"],
            plugin,
            default_factory,
        );
        registry.register_unrelated("NotAResolver", None);

        let ty = TypeName::new("StudioResolver");
        assert!(registry.implements(&ty, CapabilityKind::Resolver));
        assert_eq!(
            registry.base_types(&ty),
            vec![TypeName::new("StudioResolverBase")]
        );
        // Abstract types have no factory and are not enumerated.
        assert_eq!(
            registry.find_all_implementing(CapabilityKind::Resolver),
            vec![ty]
        );
        assert!(!registry.implements(&TypeName::new("NotAResolver"), CapabilityKind::Resolver));
        assert_eq!(registry.find_by_name("Missing"), None);
    }

    #[test]
    fn test_static_plugin_load_outcome() {
        let ok = StaticPlugin::builder("ok").path("/plugins/ok").build();
        assert!(!ok.is_loaded());
        assert!(ok.load());
        assert!(ok.is_loaded());
        assert_eq!(ok.path(), Some(Path::new("/plugins/ok")));

        let broken = StaticPlugin::builder("broken").failing_load().build();
        assert!(!broken.load());
        assert!(!broken.is_loaded());
        assert_eq!(broken.load_calls(), 1);
    }
}
