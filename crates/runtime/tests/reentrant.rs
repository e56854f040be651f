//! Resolver factories that query the global resolver helpers while the
//! singleton is being built.

use assetres_api::{AssetResolver, ResolvedPath, ResolverContext};
use assetres_core::{DefaultResolver, StaticPlugin};
use assetres_plugin::{Resolver, TypeName};
use serde_json::json;
use std::sync::{Arc, Mutex};

static SEEN: Mutex<Vec<Vec<TypeName>>> = Mutex::new(Vec::new());

struct LayeredResolver {
    fallback: Arc<dyn Resolver>,
}

impl Resolver for LayeredResolver {
    fn create_identifier(&self, asset_path: &str, anchor: Option<&ResolvedPath>) -> String {
        self.fallback.create_identifier(asset_path, anchor)
    }

    fn resolve(&self, asset_path: &str, _context: Option<&ResolverContext>) -> ResolvedPath {
        ResolvedPath::new(format!("/layered/{}", asset_path))
    }

    fn open_asset(&self, _resolved_path: &ResolvedPath) -> Option<Arc<dyn assetres_api::Asset>> {
        None
    }
}

fn layered_factory() -> Option<Arc<dyn Resolver>> {
    let available = assetres_runtime::available_resolvers();
    SEEN.lock().unwrap().push(available.clone());
    let fallback = available.last()?;
    Some(Arc::new(LayeredResolver {
        fallback: assetres_runtime::create_resolver(fallback.as_str()),
    }))
}

#[test]
fn test_factory_can_query_available_resolvers_during_build() {
    let plugin = StaticPlugin::builder("layered")
        .metadata("LayeredResolver", json!({}))
        .build();
    assetres_runtime::register_resolver("LayeredResolver", plugin, layered_factory);
    assetres_runtime::set_preferred_resolver("LayeredResolver");

    let resolver = assetres_runtime::get_resolver();
    assert_eq!(
        resolver.primary_info().type_name,
        TypeName::new("LayeredResolver")
    );
    assert_eq!(resolver.resolve("a.usd").as_str(), "/layered/a.usd");

    let seen = SEEN.lock().unwrap().clone();
    assert!(!seen.is_empty());
    for available in &seen {
        assert!(!available.contains(&TypeName::new("LayeredResolver")));
        assert_eq!(available.last(), Some(&DefaultResolver::type_name()));
    }

    // Outside construction the type is listed again.
    assert_eq!(
        assetres_runtime::available_resolvers(),
        vec![TypeName::new("LayeredResolver"), DefaultResolver::type_name()]
    );
}
