use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::types::DEFAULT_TIMEOUT;

/// Client-wide defaults applied to every exchange.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Timeout for exchanges whose options carry none. Zero disables it.
    #[serde(rename = "defaultTimeoutMillis", deserialize_with = "millis")]
    pub default_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }
}

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_twenty_seconds() {
        assert_eq!(ClientConfig::default().default_timeout, Duration::from_secs(20));
    }

    #[test]
    fn deserializes_millis() {
        let config: ClientConfig = serde_json::from_str(r#"{"defaultTimeoutMillis":1500}"#).unwrap();
        assert_eq!(config.default_timeout, Duration::from_millis(1500));

        let config: ClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn rejects_negative_millis() {
        assert!(serde_json::from_str::<ClientConfig>(r#"{"defaultTimeoutMillis":-1}"#).is_err());
    }
}
