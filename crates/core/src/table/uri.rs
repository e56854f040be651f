use crate::catalog::{ResolverCatalog, ResolverInfo};
use crate::path::extract_scheme;
use crate::plugin_resolver::PluginBackend;
use crate::primary::PrimaryResolver;
use assetres_plugin::{Resolver, TypeRegistry};
use std::collections::HashMap;
use std::sync::Arc;

/// A URI resolver and whether it is also the primary resolver.
#[derive(Debug)]
pub struct UriEntry {
    pub info: ResolverInfo,
    pub backend: PluginBackend,
    pub is_primary: bool,
}

impl UriEntry {
    pub fn resolver(&self) -> Option<Arc<dyn Resolver>> {
        self.backend.get()
    }
}

/// Scheme to URI resolver map.
///
/// Each distinct resolver type gets one entry, shared by all the schemes it
/// serves. Instances are built on first use.
#[derive(Debug, Default)]
pub struct UriResolverTable {
    entries: Vec<UriEntry>,
    by_scheme: HashMap<String, usize>,
    max_scheme_len: usize,
}

impl UriResolverTable {
    pub fn build(
        catalog: &ResolverCatalog,
        registry: &Arc<dyn TypeRegistry>,
        primary: &PrimaryResolver,
    ) -> Self {
        let mut table = Self::default();

        for info in catalog.iter().filter(|info| !info.uri_schemes.is_empty()) {
            let mut claimed = Vec::new();
            for scheme in &info.uri_schemes {
                if let Some(&owner) = table.by_scheme.get(scheme) {
                    tracing::warn!(
                        "{} registered for '{}' scheme, ignoring {}",
                        table.entries[owner].info.type_name,
                        scheme,
                        info.type_name
                    );
                    continue;
                }
                if !claimed.contains(scheme) {
                    claimed.push(scheme.clone());
                }
            }
            if claimed.is_empty() {
                continue;
            }

            let is_primary = info.type_name == primary.info.type_name;
            let backend = if is_primary {
                PluginBackend::with_instance(
                    info.plugin.clone(),
                    info.type_name.clone(),
                    registry.clone(),
                    primary.resolver.clone(),
                )
            } else {
                PluginBackend::new(info.plugin.clone(), info.type_name.clone(), registry.clone())
            };

            let idx = table.entries.len();
            for scheme in claimed {
                tracing::debug!(
                    target: "assetres::init",
                    "Registering {} for '{}' scheme",
                    info.type_name,
                    scheme
                );
                table.max_scheme_len = table.max_scheme_len.max(scheme.len());
                table.by_scheme.insert(scheme, idx);
            }
            table.entries.push(UriEntry {
                info: info.clone(),
                backend,
                is_primary,
            });
        }
        table
    }

    /// The entry serving the scheme of `path`, if any.
    pub fn lookup(&self, path: &str) -> Option<&UriEntry> {
        if self.by_scheme.is_empty() {
            return None;
        }
        let scheme = extract_scheme(path, self.max_scheme_len)?;
        self.by_scheme.get(&scheme).map(|&idx| &self.entries[idx])
    }

    /// The entry registered for `scheme`, compared case-insensitively.
    pub fn for_scheme(&self, scheme: &str) -> Option<&UriEntry> {
        self.by_scheme
            .get(&scheme.to_ascii_lowercase())
            .map(|&idx| &self.entries[idx])
    }

    pub fn entries(&self) -> &[UriEntry] {
        &self.entries
    }

    /// Entries that are not also the primary resolver.
    pub fn secondary(&self) -> impl Iterator<Item = &UriEntry> {
        self.entries.iter().filter(|entry| !entry.is_primary)
    }

    /// Registered schemes, sorted.
    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.by_scheme.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        schemes
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
