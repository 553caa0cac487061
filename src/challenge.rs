use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single DNS-01 challenge handed to the solver by the host.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChallengeRequest {
    /// The name the TXT record must be published at, e.g. `_acme-challenge.example.com.`
    #[serde(rename = "resolvedFQDN")]
    pub resolved_fqdn: String,
    /// The zone the host believes is authoritative for `resolved_fqdn`, e.g. `example.com.`
    #[serde(rename = "resolvedZone")]
    pub resolved_zone: String,
    /// The value of the TXT record.
    pub key: String,
    /// Namespace that secret references in the config are resolved in.
    #[serde(rename = "resourceNamespace", default)]
    pub resource_namespace: String,
    /// Provider configuration, decoded with [`load_config`].
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

/// Points at a key inside a secret in the request's namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKeySelector {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub key: String,
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Inline API key. Convenient for testing, prefer `api_key_secret_ref` otherwise.
    #[serde(default)]
    pub api_key: String,
    #[serde(default, alias = "apiKeyRef")]
    pub api_key_secret_ref: SecretKeySelector,
    /// NS1 API endpoint. Empty means the public NS1 API.
    #[serde(default)]
    pub endpoint: String,
    /// Skip TLS certificate verification when talking to `endpoint`.
    #[serde(default, rename = "ignoreSSL")]
    pub ignore_ssl: bool,
    #[serde(default)]
    pub ttl: i64,
}

impl ProviderConfig {
    /// The record TTL to send, or `None` to use the provider's default.
    pub fn record_ttl(&self) -> Option<u32> {
        if self.ttl > 0 {
            Some(u32::try_from(self.ttl).unwrap_or(u32::MAX))
        } else {
            None
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() {
            ""
        } else {
            "<redacted>"
        };

        f.debug_struct("ProviderConfig")
            .field("api_key", &api_key)
            .field("api_key_secret_ref", &self.api_key_secret_ref)
            .field("endpoint", &self.endpoint)
            .field("ignore_ssl", &self.ignore_ssl)
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Decode the provider configuration attached to a challenge. A missing blob yields the defaults.
pub fn load_config(config: Option<&serde_json::Value>) -> Result<ProviderConfig> {
    match config {
        None | Some(serde_json::Value::Null) => Ok(ProviderConfig::default()),
        Some(value) => ProviderConfig::deserialize(value).map_err(Error::InvalidConfig),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn missing_config_uses_defaults() {
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg, ProviderConfig::default());
        assert!(!cfg.ignore_ssl);
        assert!(cfg.api_key.is_empty());
        assert_eq!(cfg.record_ttl(), None);

        let cfg = load_config(Some(&serde_json::Value::Null)).unwrap();
        assert_eq!(cfg, ProviderConfig::default());
    }

    #[test]
    fn decodes_all_fields() {
        let raw = json!({
            "apiKeySecretRef": { "name": "ns1-credentials", "key": "api-key" },
            "endpoint": "https://ns1.internal/v1/",
            "ignoreSSL": true,
            "ttl": 120,
            "somethingElse": "ignored",
        });

        let cfg = load_config(Some(&raw)).unwrap();
        assert_eq!(cfg.api_key_secret_ref.name, "ns1-credentials");
        assert_eq!(cfg.api_key_secret_ref.key, "api-key");
        assert_eq!(cfg.endpoint, "https://ns1.internal/v1/");
        assert!(cfg.ignore_ssl);
        assert_eq!(cfg.record_ttl(), Some(120));
    }

    #[test]
    fn accepts_legacy_secret_ref_name() {
        let raw = json!({ "apiKeyRef": { "name": "legacy", "key": "token" } });
        let cfg = load_config(Some(&raw)).unwrap();
        assert_eq!(
            cfg.api_key_secret_ref,
            SecretKeySelector {
                name: "legacy".to_string(),
                key: "token".to_string()
            }
        );
    }

    #[test]
    fn non_positive_ttl_uses_provider_default() {
        let cfg = load_config(Some(&json!({ "ttl": -5 }))).unwrap();
        assert_eq!(cfg.record_ttl(), None);
        let cfg = load_config(Some(&json!({ "ttl": 0 }))).unwrap();
        assert_eq!(cfg.record_ttl(), None);
    }

    #[test]
    fn malformed_config_is_a_configuration_error() {
        let err = load_config(Some(&json!({ "ttl": "soon" }))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().starts_with("error decoding solver config"));

        let err = load_config(Some(&json!("not an object"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let cfg = ProviderConfig {
            api_key: "super-secret".to_string(),
            ..Default::default()
        };
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn request_uses_host_field_names() {
        let request: ChallengeRequest = serde_json::from_value(json!({
            "resolvedFQDN": "_acme-challenge.example.com.",
            "resolvedZone": "example.com.",
            "key": "token-value",
            "resourceNamespace": "cert-manager",
            "config": { "apiKey": "abc" },
        }))
        .unwrap();

        assert_eq!(request.resolved_fqdn, "_acme-challenge.example.com.");
        assert_eq!(request.resolved_zone, "example.com.");
        assert_eq!(request.resource_namespace, "cert-manager");
        let cfg = load_config(request.config.as_ref()).unwrap();
        assert_eq!(cfg.api_key, "abc");
    }
}
