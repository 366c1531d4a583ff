//! Authentication layer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Interval of the wait-for-owner loop the machine starts by itself
    /// when a conference reports that authentication is required.
    pub wait_for_owner_timeout_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            wait_for_owner_timeout_ms: 5_000,
        }
    }
}

impl AuthConfig {
    pub fn wait_for_owner_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_for_owner_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_config_default_timeout() {
        assert_eq!(
            AuthConfig::default().wait_for_owner_timeout(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_auth_config_missing_fields_use_defaults() {
        let config: AuthConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AuthConfig::default());
    }
}
