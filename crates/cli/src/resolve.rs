use assetres_api::{AssetResolver, ContextBinder, ResolverContext};
use assetres_core::DefaultResolverContext;
use std::path::PathBuf;
use tracing::info;

pub fn run(
    path: &str,
    search_paths: Vec<PathBuf>,
    contexts: &[(String, String)],
) -> Result<(), Box<dyn std::error::Error>> {
    let resolver = assetres_runtime::get_resolver();

    let pairs: Vec<(&str, &str)> = contexts
        .iter()
        .map(|(scheme, context)| (scheme.as_str(), context.as_str()))
        .collect();
    let mut context = resolver.create_context_from_strings(&pairs);
    if !search_paths.is_empty() {
        let search = ResolverContext::from_object(DefaultResolverContext::new(search_paths));
        context = ResolverContext::merged([&search, &context]);
    }

    let _binder = (!context.is_empty()).then(|| {
        info!("Binding {}", context.debug_string());
        ContextBinder::new(resolver, context)
    });

    let resolved = resolver.resolve(path);
    let backend = resolver
        .resolver_type_for(path)
        .map(|ty| ty.to_string())
        .unwrap_or_else(|| "-".to_string());

    println!("Asset Path:  {}", path);
    println!("Resolver:    {}", backend);
    println!("Extension:   {}", resolver.extension(path));
    if resolved.is_empty() {
        println!("Resolved:    <unresolved>");
        return Ok(());
    }
    println!("Resolved:    {}", resolved);

    let info = resolver.asset_info(path, &resolved);
    if let Some(version) = &info.version {
        println!("Version:     {}", version);
    }
    if let Some(repo_path) = &info.repo_path {
        println!("Repository:  {}", repo_path);
    }
    Ok(())
}
