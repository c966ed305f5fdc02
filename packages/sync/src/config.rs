//! Cross-context communication configuration.

use std::collections::BTreeSet;

/// Governs which inbound frames are accepted and where outbound frames
/// are addressed.
///
/// `id` identifies this instance on the wire; inbound frames are only
/// adopted when their sender id is in `acceptable_ids`. A default
/// config is disabled and accepts nobody.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CrossContextConfig {
    /// This instance's sender id, stamped on every outbound frame.
    pub id: String,
    /// Master switch for both directions.
    pub enabled: bool,
    /// Outbound addressing hint; transports without origins ignore it.
    pub target_origin: Option<String>,
    /// Sender ids whose frames this instance adopts.
    pub acceptable_ids: BTreeSet<String>,
}

impl CrossContextConfig {
    /// An enabled config with the given sender id.
    pub fn new(id: impl Into<String>) -> Self {
        CrossContextConfig {
            id: id.into(),
            enabled: true,
            target_origin: None,
            acceptable_ids: BTreeSet::new(),
        }
    }

    /// Accept frames from `id` (builder-style).
    pub fn accept(mut self, id: impl Into<String>) -> Self {
        self.acceptable_ids.insert(id.into());
        self
    }

    /// Address outbound frames to `origin` (builder-style).
    pub fn with_target_origin(mut self, origin: impl Into<String>) -> Self {
        self.target_origin = Some(origin.into());
        self
    }
}

/// Options for the cross-context configuration setters.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConfigureOptions {
    pub silent_errors: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_disabled_and_accepts_nobody() {
        let config = CrossContextConfig::default();
        assert!(!config.enabled);
        assert!(config.acceptable_ids.is_empty());
        assert_eq!(config.target_origin, None);
    }

    #[test]
    fn builder_chains() {
        let config = CrossContextConfig::new("window-a")
            .accept("window-b")
            .accept("window-c")
            .with_target_origin("https://app.example");

        assert!(config.enabled);
        assert_eq!(config.id, "window-a");
        assert!(config.acceptable_ids.contains("window-b"));
        assert!(config.acceptable_ids.contains("window-c"));
        assert_eq!(
            config.target_origin.as_deref(),
            Some("https://app.example")
        );
    }
}
