use tracing::{debug, instrument};

use crate::{
    challenge::ProviderConfig,
    error::{Error, Result},
    secrets::SecretStore,
};

/// Work out the NS1 API key for a challenge.
///
/// An inline `apiKey` is used as is. Otherwise `apiKeySecretRef` must name a secret and a key in
/// `namespace`, and the stored value is returned unmodified.
#[instrument(skip(config, store))]
pub async fn resolve_api_key(
    config: &ProviderConfig,
    namespace: &str,
    store: Option<&dyn SecretStore>,
) -> Result<String> {
    if !config.api_key.is_empty() {
        debug!("using inline apiKey");
        return Ok(config.api_key.clone());
    }

    let secret_ref = &config.api_key_secret_ref;
    if secret_ref.name.is_empty() {
        return Err(Error::MissingSecretRefField {
            field: "name",
            namespace: namespace.to_string(),
        });
    }
    if secret_ref.key.is_empty() {
        return Err(Error::MissingSecretRefField {
            field: "key",
            namespace: namespace.to_string(),
        });
    }

    let store = store.ok_or(Error::NotInitialized)?;
    let mut data = store
        .get_secret(namespace, &secret_ref.name)
        .await
        .map_err(|source| Error::SecretStore {
            namespace: namespace.to_string(),
            secret: secret_ref.name.clone(),
            source,
        })?;

    let value = data
        .remove(&secret_ref.key)
        .ok_or_else(|| Error::MissingSecretKey {
            key: secret_ref.key.clone(),
            secret: secret_ref.name.clone(),
            namespace: namespace.to_string(),
        })?;

    if value.is_empty() {
        return Err(Error::EmptySecretValue {
            key: secret_ref.key.clone(),
            secret: secret_ref.name.clone(),
            namespace: namespace.to_string(),
        });
    }

    String::from_utf8(value).map_err(|_| Error::SecretNotUtf8 {
        key: secret_ref.key.clone(),
        secret: secret_ref.name.clone(),
        namespace: namespace.to_string(),
    })
}
