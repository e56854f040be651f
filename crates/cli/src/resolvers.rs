use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct ResolverRow {
    #[tabled(rename = "Type")]
    type_name: String,
    #[tabled(rename = "Plugin")]
    plugin: String,
    #[tabled(rename = "Schemes")]
    schemes: String,
    #[tabled(rename = "Primary")]
    primary: &'static str,
    #[tabled(rename = "Contexts")]
    contexts: &'static str,
    #[tabled(rename = "Scoped Caches")]
    scoped_caches: &'static str,
}

fn flag(value: bool) -> &'static str {
    if value { "yes" } else { "" }
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let resolver = assetres_runtime::get_resolver();
    let primary = &resolver.primary_info().type_name;

    let rows: Vec<ResolverRow> = resolver
        .catalog()
        .iter()
        .map(|info| ResolverRow {
            type_name: info.type_name.to_string(),
            plugin: info.plugin.name().to_string(),
            schemes: info.uri_schemes.join(", "),
            primary: flag(&info.type_name == primary),
            contexts: flag(info.implements_contexts),
            scoped_caches: flag(info.implements_scoped_caches),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::psql()));

    let extensions = resolver.package_extensions();
    if !extensions.is_empty() {
        println!("Package extensions: {}", extensions.join(", "));
    }
    let candidates: Vec<String> = resolver
        .available_resolvers()
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("Primary candidates: {}", candidates.join(", "));
    Ok(())
}
