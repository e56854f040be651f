use crate::catalog::read_string_list;
use crate::error::CatalogError;
use crate::plugin_resolver::PluginPackageBackend;
use assetres_plugin::{CapabilityKind, PackageResolver, PluginSource, TypeRegistry, metadata};
use std::sync::Arc;

#[derive(Debug)]
pub struct PackageEntry {
    pub extension: String,
    pub backend: PluginPackageBackend,
}

impl PackageEntry {
    pub fn resolver(&self) -> Option<Arc<dyn PackageResolver>> {
        self.backend.get()
    }
}

/// Extension to package resolver map, one lazily built backend per
/// extension.
#[derive(Debug, Default)]
pub struct PackageResolverTable {
    entries: Vec<PackageEntry>,
}

impl PackageResolverTable {
    pub fn build(registry: &Arc<dyn TypeRegistry>, plugins: &dyn PluginSource) -> Self {
        let mut types = registry.find_all_implementing(CapabilityKind::PackageResolver);
        types.sort();
        types.dedup();

        let mut entries = Vec::new();
        for ty in types {
            let Some(plugin) = plugins.find_owning_plugin(&ty) else {
                tracing::error!("{}", CatalogError::NoOwningPlugin(ty));
                continue;
            };

            let extensions = match read_string_list(&plugin.metadata_for(&ty), &ty, metadata::EXTENSIONS) {
                Ok(Some(extensions)) => extensions,
                Ok(None) => {
                    tracing::error!(
                        "{}",
                        CatalogError::MissingMetadata {
                            ty: ty.clone(),
                            key: metadata::EXTENSIONS,
                        }
                    );
                    continue;
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    continue;
                }
            };

            for extension in extensions.into_iter().filter(|ext| !ext.is_empty()) {
                tracing::debug!(
                    target: "assetres::init",
                    "Registering package resolver {} for '{}'",
                    ty,
                    extension
                );
                entries.push(PackageEntry {
                    extension,
                    backend: PluginPackageBackend::new(plugin.clone(), ty.clone(), registry.clone()),
                });
            }
        }
        Self { entries }
    }

    /// The first entry registered for exactly `extension`.
    pub fn lookup(&self, extension: &str) -> Option<&PackageEntry> {
        self.entries.iter().find(|entry| entry.extension == extension)
    }

    pub fn entries(&self) -> &[PackageEntry] {
        &self.entries
    }

    pub fn extensions(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.extension.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
