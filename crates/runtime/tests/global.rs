//! The process-wide resolver. Everything runs in one test because the
//! singleton is built once per process.

use assetres_api::{AssetResolver, ResolvedPath, ResolverContext};
use assetres_core::{DefaultResolver, StaticPlugin};
use assetres_plugin::{Resolver, TypeName};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Default)]
struct StudioResolver;

impl Resolver for StudioResolver {
    fn create_identifier(&self, asset_path: &str, _anchor: Option<&ResolvedPath>) -> String {
        asset_path.to_string()
    }

    fn resolve(&self, asset_path: &str, _context: Option<&ResolverContext>) -> ResolvedPath {
        ResolvedPath::new(format!("/studio/{}", asset_path))
    }

    fn open_asset(&self, _resolved_path: &ResolvedPath) -> Option<Arc<dyn assetres_api::Asset>> {
        None
    }
}

fn studio_factory() -> Option<Arc<dyn Resolver>> {
    Some(Arc::new(StudioResolver))
}

#[test]
fn test_global_resolver_lifecycle() {
    let plugin = StaticPlugin::builder("studio")
        .metadata("StudioResolver", json!({}))
        .build();
    assetres_runtime::register_resolver("StudioResolver", plugin, studio_factory);
    assetres_runtime::set_preferred_resolver(DefaultResolver::type_name().as_str());

    let resolver = assetres_runtime::get_resolver();
    assert!(std::ptr::eq(resolver, assetres_runtime::get_resolver()));
    assert_eq!(resolver.primary_info().type_name, DefaultResolver::type_name());
    assert_eq!(
        assetres_runtime::available_resolvers(),
        vec![TypeName::new("StudioResolver"), DefaultResolver::type_name()]
    );

    // Too late to change the primary.
    assetres_runtime::set_preferred_resolver("StudioResolver");
    assert_eq!(
        assetres_runtime::get_resolver().primary_info().type_name,
        DefaultResolver::type_name()
    );

    let studio = assetres_runtime::create_resolver("StudioResolver");
    assert_eq!(studio.resolve("a.usd", None).as_str(), "/studio/a.usd");
    let fallback = assetres_runtime::create_resolver("NoSuchResolver");
    assert!(fallback.resolve("relative/missing.usd", None).is_empty());

    assert!(Arc::ptr_eq(
        assetres_runtime::get_underlying_resolver(),
        resolver.primary_resolver()
    ));
    assert!(resolver.resolve("relative/missing.usd").is_empty());
}
