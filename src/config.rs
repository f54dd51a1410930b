use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::InitError;

pub const DEFAULT_HOST_URL: &str = "https://mobilesoasit.citi.com/tbslab/";
pub const DEFAULT_APPLICATION_ID: &str = "6dcb42e7-5dfb-4263-b21f-34c014a55ecc";
pub const DEFAULT_CONSUMER_ID: &str = "cititest1-ios";
pub const DEFAULT_ENVIRONMENT: &str = "NA";

/// Configuration record handed to the provider on initialization. A new
/// record is built on every settings save; fields are never defaulted after
/// an explicit save.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZsmConfig {
    pub host_url: String,
    pub application_id: String,
    pub consumer_id: String,
    #[serde(rename = "application_environment")]
    pub environment: String,
    pub request_timeout_ms: u64,
    pub retry_count: u32,
}

impl Default for ZsmConfig {
    fn default() -> Self {
        Self {
            host_url: DEFAULT_HOST_URL.to_owned(),
            application_id: DEFAULT_APPLICATION_ID.to_owned(),
            consumer_id: DEFAULT_CONSUMER_ID.to_owned(),
            environment: DEFAULT_ENVIRONMENT.to_owned(),
            request_timeout_ms: 30_000,
            retry_count: 0,
        }
    }
}

impl ZsmConfig {
    /// Configuration JSON in the shape the provider consumes.
    pub fn to_json(&self) -> Map<String, Value> {
        let Ok(Value::Object(map)) = serde_json::to_value(self) else {
            unreachable!()
        };
        map
    }

    pub fn validate(&self) -> Result<(), InitError> {
        if self.host_url.is_empty() {
            return Err(InitError::InvalidConfig("host_url is empty".to_owned()));
        }
        if !self.host_url.starts_with("http://") && !self.host_url.starts_with("https://") {
            return Err(InitError::InvalidConfig(format!(
                "host_url is not an http(s) URL: {}",
                self.host_url
            )));
        }
        if self.application_id.is_empty() {
            return Err(InitError::InvalidConfig(
                "application_id is empty".to_owned(),
            ));
        }
        if self.consumer_id.is_empty() {
            return Err(InitError::InvalidConfig("consumer_id is empty".to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ZsmConfig::default();
        assert_eq!(config.host_url, DEFAULT_HOST_URL);
        assert_eq!(config.environment, "NA");
        assert_eq!(config.request_timeout_ms, 30_000);
        assert_eq!(config.retry_count, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_json_uses_provider_keys() {
        let json = ZsmConfig::default().to_json();
        assert_eq!(
            json.get("host_url").and_then(Value::as_str),
            Some(DEFAULT_HOST_URL)
        );
        assert_eq!(
            json.get("application_environment").and_then(Value::as_str),
            Some("NA")
        );
        assert!(!json.contains_key("environment"));
    }

    #[test]
    fn empty_host_url_is_rejected() {
        let config = ZsmConfig {
            host_url: String::new(),
            ..ZsmConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(InitError::InvalidConfig(_))
        ));
    }

    #[test]
    fn non_http_host_url_is_rejected() {
        let config = ZsmConfig {
            host_url: "ftp://example.org/".to_owned(),
            ..ZsmConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_ids_are_rejected() {
        let config = ZsmConfig {
            application_id: String::new(),
            ..ZsmConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ZsmConfig {
            consumer_id: String::new(),
            ..ZsmConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
