//! Renderer Configuration
//!
//! A [`RendererConfig`] is handed to [`Renderer::with_config`](crate::Renderer::with_config).
//! It can be built in code or loaded from JSON so that embedders can keep it
//! next to the rest of their application settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for a renderer instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Reject elements with invalid host tags while building a render.
    ///
    /// When off, invalid tags are logged and passed through to the host.
    pub strict_elements: bool,

    /// Fail a render when a component changes the kind or number of hooks it
    /// calls. When off, a mismatched slot is re-initialised with a warning.
    pub strict_hooks: bool,

    /// Wall-clock budget for one driver invocation, in milliseconds.
    pub frame_budget_ms: u64,

    /// Fibers processed per driver invocation. When set it replaces the
    /// wall-clock budget, which makes scheduling deterministic.
    pub units_per_tick: Option<usize>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            strict_elements: false,
            strict_hooks: cfg!(debug_assertions),
            frame_budget_ms: 5,
            units_per_tick: None,
        }
    }
}

impl RendererConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// `frame_budget_ms` as a [`Duration`].
    pub fn frame_budget(&self) -> Duration {
        Duration::from_millis(self.frame_budget_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = RendererConfig::from_json(r#"{ "strict_elements": true }"#).unwrap();
        assert!(config.strict_elements);
        assert_eq!(config.frame_budget_ms, 5);
        assert_eq!(config.units_per_tick, None);
        assert_eq!(config.strict_hooks, cfg!(debug_assertions));
    }

    #[test]
    fn elements_are_permissive_by_default() {
        let config = RendererConfig::default();
        assert!(!config.strict_elements);
        assert_eq!(config.strict_hooks, cfg!(debug_assertions));
    }

    #[test]
    fn frame_budget_is_milliseconds() {
        let config = RendererConfig {
            frame_budget_ms: 16,
            ..RendererConfig::default()
        };
        assert_eq!(config.frame_budget(), Duration::from_millis(16));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(RendererConfig::from_json("{ frame_budget_ms: }").is_err());
    }
}
