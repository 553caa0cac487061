use std::{collections::BTreeMap, path::PathBuf};

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::SecretStoreError;

/// The decoded contents of a secret, keyed by entry name.
pub type SecretData = BTreeMap<String, Vec<u8>>;

#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretData, SecretStoreError>;
}

/// How to reach the Kubernetes API server.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct KubeConfig {
    /// API server URL. When unset the in-cluster service account or the local kubeconfig is used.
    pub api_server: Option<String>,
    /// Bearer token file for `api_server`. Re-read when it changes.
    pub token_file: Option<PathBuf>,
    pub insecure_skip_tls_verify: bool,
}

impl KubeConfig {
    async fn client_config(&self) -> Result<kube::Config, SecretStoreError> {
        let Some(server) = &self.api_server else {
            return kube::Config::infer()
                .await
                .map_err(|e| SecretStoreError::Config(e.to_string()));
        };

        let url: http::Uri = server
            .parse()
            .map_err(|e| SecretStoreError::Config(format!("invalid api_server {server:?}: {e}")))?;

        let mut config = kube::Config::new(url);
        config.accept_invalid_certs = self.insecure_skip_tls_verify;
        config.auth_info.token_file = self
            .token_file
            .as_ref()
            .map(|path| path.display().to_string());
        Ok(config)
    }
}

pub struct KubeSecretStore {
    client: Client,
}

impl KubeSecretStore {
    /// Connect to the API server. Fails if the service account token or kubeconfig cannot be read.
    pub async fn new(config: &KubeConfig) -> Result<Self, SecretStoreError> {
        let client_config = config.client_config().await?;
        debug!(cluster_url = %client_config.cluster_url, "connecting to Kubernetes");

        let client =
            Client::try_from(client_config).map_err(|e| SecretStoreError::Config(e.to_string()))?;
        Ok(KubeSecretStore { client })
    }
}

fn store_error(err: kube::Error) -> SecretStoreError {
    match err {
        kube::Error::Api(resp) if resp.code == 404 => SecretStoreError::NotFound,
        kube::Error::Api(resp) => SecretStoreError::Api {
            status: resp.code,
            message: resp.message,
        },
        kube::Error::SerdeError(e) => SecretStoreError::Decode(e),
        e => SecretStoreError::Transport(e),
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    #[instrument(skip(self))]
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretData, SecretStoreError> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = secrets.get(name).await.map_err(store_error)?;

        let data = secret
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, value.0))
            .collect::<SecretData>();
        debug!(keys = data.len(), "fetched secret");

        Ok(data)
    }
}
