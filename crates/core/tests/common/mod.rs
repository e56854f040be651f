//! Resolver fixtures shared by the integration tests.

#![allow(dead_code)]

use assetres_api::{
    Asset, AssetInfo, BindingData, CacheScopeData, MemoryAsset, ResolvedPath, ResolverContext,
};
use assetres_core::{DispatchingResolver, InMemoryRegistry, ResolverSettings, StaticPlugin};
use assetres_plugin::{PackageResolver, Resolver, metadata};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Context object understood by [`TestUriResolver`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TestUriContext(pub String);

/// URI resolver that appends `?<ctx>` from the bound [`TestUriContext`].
#[derive(Debug, Default)]
pub struct TestUriResolver {
    pub resolves: AtomicUsize,
}

impl Resolver for TestUriResolver {
    fn create_identifier(&self, asset_path: &str, _anchor: Option<&ResolvedPath>) -> String {
        asset_path.to_string()
    }

    fn resolve(&self, asset_path: &str, context: Option<&ResolverContext>) -> ResolvedPath {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        match context.and_then(|ctx| ctx.get::<TestUriContext>()) {
            Some(TestUriContext(data)) => ResolvedPath::new(format!("{}?{}", asset_path, data)),
            None => ResolvedPath::new(asset_path),
        }
    }

    fn create_default_context(&self) -> ResolverContext {
        ResolverContext::from_object(TestUriContext("default".to_string()))
    }

    fn create_context_from_string(&self, context_str: &str) -> ResolverContext {
        ResolverContext::from_object(TestUriContext(context_str.to_string()))
    }

    fn is_context_dependent_path(&self, _asset_path: &str) -> bool {
        true
    }

    fn is_repository_path(&self, _path: &str) -> bool {
        true
    }

    fn asset_info(&self, asset_path: &str, _resolved_path: &ResolvedPath) -> AssetInfo {
        AssetInfo {
            repo_path: Some(asset_path.to_string()),
            ..Default::default()
        }
    }

    fn open_asset(&self, resolved_path: &ResolvedPath) -> Option<Arc<dyn Asset>> {
        Some(Arc::new(MemoryAsset::new(resolved_path.as_str().as_bytes())))
    }
}

/// Package resolver for `.pack` archives. Every packaged path exists except
/// those starting with `missing`.
#[derive(Debug, Default)]
pub struct TestPackageResolver {
    pub calls: Mutex<Vec<(String, String)>>,
    pub scopes: Mutex<Vec<&'static str>>,
}

impl PackageResolver for TestPackageResolver {
    fn resolve(&self, resolved_package_path: &str, packaged_path: &str) -> String {
        self.calls
            .lock()
            .unwrap()
            .push((resolved_package_path.to_string(), packaged_path.to_string()));
        if packaged_path.starts_with("missing") {
            return String::new();
        }
        packaged_path.to_string()
    }

    fn open_asset(
        &self,
        resolved_package_path: &str,
        resolved_packaged_path: &str,
    ) -> Option<Arc<dyn Asset>> {
        let contents = format!("{}|{}", resolved_package_path, resolved_packaged_path);
        Some(Arc::new(MemoryAsset::new(contents.into_bytes())))
    }

    fn begin_cache_scope(&self, _data: &mut CacheScopeData) {
        self.scopes.lock().unwrap().push("begin");
    }

    fn end_cache_scope(&self, _data: &mut CacheScopeData) {
        self.scopes.lock().unwrap().push("end");
    }
}

/// Primary-eligible resolver mapping `path` to `/counted/path` and counting
/// calls. Reports a repository path of `repo://<asset path>`.
#[derive(Debug, Default)]
pub struct CountingResolver {
    pub resolves: AtomicUsize,
}

impl Resolver for CountingResolver {
    fn create_identifier(&self, asset_path: &str, _anchor: Option<&ResolvedPath>) -> String {
        asset_path.to_string()
    }

    fn resolve(&self, asset_path: &str, _context: Option<&ResolverContext>) -> ResolvedPath {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        ResolvedPath::new(format!("/counted/{}", asset_path))
    }

    fn asset_info(&self, asset_path: &str, _resolved_path: &ResolvedPath) -> AssetInfo {
        AssetInfo {
            repo_path: Some(format!("repo://{}", asset_path)),
            ..Default::default()
        }
    }

    fn open_asset(&self, _resolved_path: &ResolvedPath) -> Option<Arc<dyn Asset>> {
        None
    }
}

/// Records context and cache-scope calls. `bind_context` stores a token in
/// its binding data and `unbind_context` reports whether it came back.
#[derive(Debug, Default)]
pub struct RecordingResolver {
    pub events: Mutex<Vec<String>>,
    pub resolves: AtomicUsize,
}

impl RecordingResolver {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }
}

impl Resolver for RecordingResolver {
    fn create_identifier(&self, asset_path: &str, _anchor: Option<&ResolvedPath>) -> String {
        asset_path.to_string()
    }

    fn resolve(&self, asset_path: &str, _context: Option<&ResolverContext>) -> ResolvedPath {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        ResolvedPath::new(asset_path)
    }

    fn bind_context(&self, _context: &ResolverContext, binding: &mut BindingData) {
        binding.set(Arc::new("token".to_string()));
        self.record("bind");
    }

    fn unbind_context(&self, _context: &ResolverContext, binding: &mut BindingData) {
        let token = binding.get::<String>();
        self.record(format!("unbind:{}", token.as_deref().map_or("none", String::as_str)));
    }

    fn refresh_context(&self, _context: &ResolverContext) {
        self.record("refresh");
    }

    fn begin_cache_scope(&self, data: &mut CacheScopeData) {
        self.record(if data.is_empty() { "begin:new" } else { "begin:shared" });
        if data.is_empty() {
            data.set(Arc::new(0u32));
        }
    }

    fn end_cache_scope(&self, data: &mut CacheScopeData) {
        self.record(if data.holds::<u32>() { "end:ok" } else { "end:lost" });
    }

    fn open_asset(&self, _resolved_path: &ResolvedPath) -> Option<Arc<dyn Asset>> {
        None
    }
}

/// Wrap an existing instance as a factory that counts how often it runs.
pub fn counted_factory<R: Resolver + 'static>(
    instance: Arc<R>,
    built: Arc<AtomicUsize>,
) -> impl Fn() -> Option<Arc<dyn Resolver>> + Send + Sync + 'static {
    move || {
        built.fetch_add(1, Ordering::SeqCst);
        Some(instance.clone() as Arc<dyn Resolver>)
    }
}

pub fn factory<R: Resolver + 'static>(
    instance: Arc<R>,
) -> impl Fn() -> Option<Arc<dyn Resolver>> + Send + Sync + 'static {
    move || Some(instance.clone() as Arc<dyn Resolver>)
}

pub fn package_factory<R: PackageResolver + 'static>(
    instance: Arc<R>,
) -> impl Fn() -> Option<Arc<dyn PackageResolver>> + Send + Sync + 'static {
    move || Some(instance.clone() as Arc<dyn PackageResolver>)
}

/// Register `instance` as a URI resolver for `schemes`.
pub fn register_uri<R: Resolver + 'static>(
    registry: &InMemoryRegistry,
    ty: &str,
    schemes: &[&str],
    implements_contexts: bool,
    instance: Arc<R>,
) {
    let plugin = StaticPlugin::builder(format!("{}Plugin", ty))
        .metadata(
            ty,
            json!({
                (metadata::URI_SCHEMES): schemes,
                (metadata::IMPLEMENTS_CONTEXTS): implements_contexts,
            }),
        )
        .build();
    registry.register_resolver(ty, plugin, factory(instance));
}

/// Register `instance` as a primary-eligible resolver.
pub fn register_primary<R: Resolver + 'static>(
    registry: &InMemoryRegistry,
    ty: &str,
    meta: serde_json::Value,
    instance: Arc<R>,
) {
    let plugin = StaticPlugin::builder(format!("{}Plugin", ty))
        .metadata(ty, meta)
        .build();
    registry.register_resolver(ty, plugin, factory(instance));
}

pub fn register_package(registry: &InMemoryRegistry, ty: &str, extensions: &[&str], instance: Arc<TestPackageResolver>) {
    let plugin = StaticPlugin::builder(format!("{}Plugin", ty))
        .metadata(ty, json!({ (metadata::EXTENSIONS): extensions }))
        .build();
    registry.register_package_resolver(ty, plugin, package_factory(instance));
}

pub fn builtins() -> Arc<InMemoryRegistry> {
    Arc::new(InMemoryRegistry::with_builtins())
}

pub fn dispatcher(registry: &Arc<InMemoryRegistry>) -> DispatchingResolver {
    dispatcher_with(registry, ResolverSettings::default())
}

pub fn dispatcher_with(
    registry: &Arc<InMemoryRegistry>,
    settings: ResolverSettings,
) -> DispatchingResolver {
    DispatchingResolver::builder()
        .with_registry(registry.clone())
        .with_settings(settings)
        .build()
}
