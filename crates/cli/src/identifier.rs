use assetres_api::{AssetResolver, ResolvedPath};

pub fn run(path: &str, anchor: Option<String>, new: bool) -> Result<(), Box<dyn std::error::Error>> {
    let resolver = assetres_runtime::get_resolver();
    let anchor = anchor.map(ResolvedPath::new);

    let identifier = if new {
        resolver.create_identifier_for_new_asset(path, anchor.as_ref())
    } else {
        resolver.create_identifier(path, anchor.as_ref())
    };

    if identifier.is_empty() {
        println!("<no identifier>");
    } else {
        println!("{}", identifier);
    }
    Ok(())
}
