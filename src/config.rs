//! Worker configuration.
//!
//! The deploy contract lives here: the versioned cache tag, the app-shell
//! manifest precached at install, and the fixed navigation targets. Bumping
//! `cache_name` is the only cache-invalidation mechanism; the activation
//! sweep deletes every store carrying a different tag.

use serde::{Deserialize, Serialize};

/// Service worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwConfig {
    /// Versioned cache store tag. The single "current" store name.
    pub cache_name: String,

    /// App-shell URLs precached at install (all-or-nothing).
    pub app_shell: Vec<String>,

    /// Document served when a navigation fetch fails offline.
    pub offline_fallback: String,

    /// Window target for the notification "explore" action.
    pub deep_link: String,

    /// Origin the worker controls; window paths resolve against it.
    pub scope_origin: String,
}

impl Default for SwConfig {
    fn default() -> Self {
        Self {
            cache_name: "mistake-collection-v1.0.0".to_string(),
            app_shell: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/manifest.json".to_string(),
                "/icons/icon-192x192.png".to_string(),
                "/icons/icon-512x512.png".to_string(),
            ],
            offline_fallback: "/index.html".to_string(),
            deep_link: "/?action=collection".to_string(),
            scope_origin: "https://mistakebook.app".to_string(),
        }
    }
}

impl SwConfig {
    /// Replace the cache version tag.
    pub fn with_cache_name(mut self, name: impl Into<String>) -> Self {
        self.cache_name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let config = SwConfig::default();
        assert_eq!(config.app_shell.len(), 5);
        assert!(config.app_shell.contains(&"/index.html".to_string()));
        assert_eq!(config.offline_fallback, "/index.html");
    }

    #[test]
    fn test_with_cache_name() {
        let config = SwConfig::default().with_cache_name("mistake-collection-v2.0.0");
        assert_eq!(config.cache_name, "mistake-collection-v2.0.0");
    }

    #[test]
    fn test_config_roundtrip() {
        let config = SwConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: SwConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cache_name, config.cache_name);
        assert_eq!(back.app_shell, config.app_shell);
    }
}
