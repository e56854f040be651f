//! Values read once when a dispatching resolver is built.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_DISABLE_PLUGIN_RESOLVER: &str = "ASSETRES_DISABLE_PLUGIN_RESOLVER";
pub const ENV_DISABLE_PLUGIN_URI_RESOLVERS: &str = "ASSETRES_DISABLE_PLUGIN_URI_RESOLVERS";
pub const ENV_DISABLE_STRICT_SCHEME_VALIDATION: &str = "ASSETRES_DISABLE_STRICT_SCHEME_VALIDATION";
pub const ENV_PREFERRED_RESOLVER: &str = "ASSETRES_PREFERRED_RESOLVER";
pub const ENV_DEFAULT_SEARCH_PATH: &str = "ASSETRES_DEFAULT_SEARCH_PATH";
pub const ENV_MAX_PACKAGE_DEPTH: &str = "ASSETRES_MAX_PACKAGE_DEPTH";

pub const DEFAULT_MAX_PACKAGE_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Only the built-in default resolver may become primary.
    pub disable_plugin_resolver: bool,
    /// Leave the URI table empty.
    pub disable_plugin_uri_resolvers: bool,
    /// Accept invalid URI schemes with a warning instead of dropping them.
    pub disable_strict_scheme_validation: bool,
    pub preferred_resolver: Option<String>,
    /// Search path used by the default resolver after the bound context.
    pub default_search_path: Vec<PathBuf>,
    /// Deepest package nesting `resolve` will follow.
    pub max_package_depth: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            disable_plugin_resolver: false,
            disable_plugin_uri_resolvers: false,
            disable_strict_scheme_validation: false,
            preferred_resolver: None,
            default_search_path: Vec::new(),
            max_package_depth: DEFAULT_MAX_PACKAGE_DEPTH,
        }
    }
}

impl ResolverSettings {
    /// Read every setting from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, falling back to defaults for
    /// missing or malformed values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |key: &str| lookup(key).map(|v| parse_bool(&v)).unwrap_or(false);

        let max_package_depth = match lookup(ENV_MAX_PACKAGE_DEPTH) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "Ignoring {}={:?}: not a non-negative integer",
                    ENV_MAX_PACKAGE_DEPTH,
                    raw
                );
                defaults.max_package_depth
            }),
            None => defaults.max_package_depth,
        };

        Self {
            disable_plugin_resolver: flag(ENV_DISABLE_PLUGIN_RESOLVER),
            disable_plugin_uri_resolvers: flag(ENV_DISABLE_PLUGIN_URI_RESOLVERS),
            disable_strict_scheme_validation: flag(ENV_DISABLE_STRICT_SCHEME_VALIDATION),
            preferred_resolver: lookup(ENV_PREFERRED_RESOLVER).filter(|name| !name.is_empty()),
            default_search_path: lookup(ENV_DEFAULT_SEARCH_PATH)
                .map(|raw| {
                    std::env::split_paths(&raw)
                        .filter(|p| !p.as_os_str().is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            max_package_depth,
        }
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> ResolverSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ResolverSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(settings_from(&[]), ResolverSettings::default());
    }

    #[test]
    fn test_flags_and_values() {
        let settings = settings_from(&[
            (ENV_DISABLE_PLUGIN_RESOLVER, "1"),
            (ENV_DISABLE_PLUGIN_URI_RESOLVERS, "TRUE"),
            (ENV_DISABLE_STRICT_SCHEME_VALIDATION, "no"),
            (ENV_PREFERRED_RESOLVER, "StudioResolver"),
            (ENV_MAX_PACKAGE_DEPTH, "8"),
        ]);
        assert!(settings.disable_plugin_resolver);
        assert!(settings.disable_plugin_uri_resolvers);
        assert!(!settings.disable_strict_scheme_validation);
        assert_eq!(settings.preferred_resolver.as_deref(), Some("StudioResolver"));
        assert_eq!(settings.max_package_depth, 8);
    }

    #[test]
    fn test_malformed_depth_falls_back() {
        let settings = settings_from(&[(ENV_MAX_PACKAGE_DEPTH, "deep")]);
        assert_eq!(settings.max_package_depth, DEFAULT_MAX_PACKAGE_DEPTH);
    }

    #[test]
    fn test_search_path_is_split() {
        let joined = std::env::join_paths(["/a", "/b"]).unwrap();
        let settings = settings_from(&[(ENV_DEFAULT_SEARCH_PATH, joined.to_str().unwrap())]);
        assert_eq!(
            settings.default_search_path,
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
    }

    #[test]
    fn test_serde_fills_missing_fields() {
        let settings: ResolverSettings =
            serde_json::from_str(r#"{"disable_plugin_resolver": true}"#).unwrap();
        assert!(settings.disable_plugin_resolver);
        assert_eq!(settings.max_package_depth, DEFAULT_MAX_PACKAGE_DEPTH);
    }
}
