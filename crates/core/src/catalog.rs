//! Discovery of the installed resolver implementations.

use crate::error::{CatalogError, Result};
use crate::path::validate_scheme;
use assetres_plugin::{CapabilityKind, PluginHandle, PluginSource, TypeName, TypeRegistry, metadata};
use serde_json::{Map, Value};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// What the catalog knows about one resolver implementation.
#[derive(Debug, Clone)]
pub struct ResolverInfo {
    pub plugin: Arc<dyn PluginHandle>,
    pub type_name: TypeName,
    /// Lower-cased schemes this resolver serves.
    pub uri_schemes: Vec<String>,
    /// True iff the type declares no URI schemes.
    pub can_be_primary: bool,
    pub implements_contexts: bool,
    pub implements_scoped_caches: bool,
}

/// Resolver implementations ordered by type name.
#[derive(Debug, Clone, Default)]
pub struct ResolverCatalog {
    entries: Vec<ResolverInfo>,
}

impl ResolverCatalog {
    /// Enumerate every resolver type and read its plugin metadata.
    ///
    /// Types without an owning plugin or with malformed metadata are logged
    /// and skipped. With `strict_schemes`, invalid schemes are dropped;
    /// otherwise they are kept with a warning.
    pub fn build(
        registry: &dyn TypeRegistry,
        plugins: &dyn PluginSource,
        strict_schemes: bool,
    ) -> Self {
        let mut types = registry.find_all_implementing(CapabilityKind::Resolver);
        // Registry order is not stable across runs.
        types.sort();
        types.dedup();

        let mut entries = Vec::with_capacity(types.len());
        for ty in types {
            match Self::describe(registry, plugins, &ty, strict_schemes) {
                Ok(info) => entries.push(info),
                Err(e) => tracing::error!("{}", e),
            }
        }

        tracing::debug!(
            target: "assetres::init",
            "Found resolver types: [{}]",
            entries
                .iter()
                .map(|info| info.type_name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Self { entries }
    }

    fn describe(
        registry: &dyn TypeRegistry,
        plugins: &dyn PluginSource,
        ty: &TypeName,
        strict_schemes: bool,
    ) -> Result<ResolverInfo> {
        let plugin = plugins
            .find_owning_plugin(ty)
            .ok_or_else(|| CatalogError::NoOwningPlugin(ty.clone()))?;

        let declared =
            read_string_list(&plugin.metadata_for(ty), ty, metadata::URI_SCHEMES)?.unwrap_or_default();
        let can_be_primary = declared.is_empty();

        let mut uri_schemes = Vec::with_capacity(declared.len());
        for scheme in declared {
            let scheme = scheme.to_ascii_lowercase();
            match validate_scheme(&scheme) {
                Ok(()) => uri_schemes.push(scheme),
                Err(reason) => {
                    let err = CatalogError::InvalidScheme {
                        ty: ty.clone(),
                        scheme: scheme.clone(),
                        reason,
                    };
                    if strict_schemes {
                        tracing::warn!("{}. Ignoring.", err);
                    } else {
                        tracing::warn!("{}. Accepting anyway.", err);
                        uri_schemes.push(scheme);
                    }
                }
            }
        }

        Ok(ResolverInfo {
            implements_contexts: capability_flag(
                registry,
                plugins,
                ty,
                metadata::IMPLEMENTS_CONTEXTS,
            ),
            implements_scoped_caches: capability_flag(
                registry,
                plugins,
                ty,
                metadata::IMPLEMENTS_SCOPED_CACHES,
            ),
            plugin,
            type_name: ty.clone(),
            uri_schemes,
            can_be_primary,
        })
    }

    pub fn entries(&self) -> &[ResolverInfo] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolverInfo> {
        self.entries.iter()
    }

    pub fn find(&self, ty: &TypeName) -> Option<&ResolverInfo> {
        self.entries.iter().find(|info| &info.type_name == ty)
    }

    pub fn type_names(&self) -> Vec<TypeName> {
        self.entries.iter().map(|info| info.type_name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read an optional string-list metadata field.
pub(crate) fn read_string_list(
    meta: &Map<String, Value>,
    ty: &TypeName,
    key: &'static str,
) -> Result<Option<Vec<String>>> {
    let Some(value) = meta.get(key) else {
        return Ok(None);
    };
    let shape_error = || CatalogError::MetadataShape {
        ty: ty.clone(),
        key,
        expected: "a list of strings",
    };
    let items = value.as_array().ok_or_else(shape_error)?;
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(shape_error))
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

/// Look up a boolean capability flag on `ty`, falling back to its base types
/// until one declares it or the abstract root is reached.
pub(crate) fn capability_flag(
    registry: &dyn TypeRegistry,
    plugins: &dyn PluginSource,
    ty: &TypeName,
    key: &'static str,
) -> bool {
    let root = CapabilityKind::Resolver.root_type();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(ty.clone());
    visited.insert(ty.clone());

    while let Some(current) = queue.pop_front() {
        if current == root {
            continue;
        }
        // A base type with no plugin cannot declare anything.
        let Some(plugin) = plugins.find_owning_plugin(&current) else {
            continue;
        };

        match plugin.metadata_for(&current).get(key) {
            Some(Value::Bool(flag)) => return *flag,
            Some(_) => {
                tracing::error!(
                    "{}",
                    CatalogError::MetadataShape {
                        ty: current.clone(),
                        key,
                        expected: "a boolean",
                    }
                );
                return false;
            }
            None => {}
        }

        for base in registry.base_types(&current) {
            if visited.insert(base.clone()) {
                queue.push_back(base);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_read_string_list() {
        let ty = TypeName::new("T");
        let m = meta(json!({ "uriSchemes": ["a", "b"], "bad": [1], "worse": "a" }));

        assert_eq!(
            read_string_list(&m, &ty, "uriSchemes").unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(read_string_list(&m, &ty, "missing").unwrap(), None);
        assert!(matches!(
            read_string_list(&m, &ty, "bad"),
            Err(CatalogError::MetadataShape { .. })
        ));
        assert!(read_string_list(&m, &ty, "worse").is_err());
    }
}
