use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{watch, OnceCell};
use tracing::{debug, info, instrument};

use crate::{
    challenge::{load_config, ChallengeRequest, ProviderConfig},
    credentials::resolve_api_key,
    dns::{DnsProvider, Ns1ClientFactory, ProviderClientFactory, RecordType},
    error::{Error, ProviderError, Result},
    secrets::{KubeConfig, KubeSecretStore, SecretStore},
    zone::{split_challenge, ChallengeName, ZoneFinder},
};

/// The operations a challenge-solving host drives.
#[async_trait]
pub trait Solver: Send + Sync {
    /// Identifies this solver in the issuer configuration.
    fn name(&self) -> &'static str;

    /// Called once before any challenge is handled. `stop` flips to `true` when the host shuts down.
    async fn initialize(&mut self, host: &KubeConfig, stop: watch::Receiver<bool>) -> Result<()>;

    /// Publish the challenge record. Safe to call repeatedly with the same request.
    async fn present(&self, ch: &ChallengeRequest) -> Result<()>;

    /// Remove the challenge record. Safe to call when the record is already gone.
    async fn cleanup(&self, ch: &ChallengeRequest) -> Result<()>;
}

/// Solves challenges by managing TXT records through the NS1 API.
///
/// The NS1 client is created by the first `present` or `cleanup` call and reused for the lifetime
/// of the solver. Credentials, endpoint and TLS settings from later requests are ignored.
pub struct Ns1Solver {
    zones: Arc<dyn ZoneFinder>,
    factory: Arc<dyn ProviderClientFactory>,
    secrets: Option<Arc<dyn SecretStore>>,
    client: OnceCell<Arc<dyn DnsProvider>>,
}

impl Ns1Solver {
    pub const NAME: &'static str = "ns1";

    pub fn new(zones: Arc<dyn ZoneFinder>) -> Self {
        Self::with_factory(zones, Arc::new(Ns1ClientFactory))
    }

    pub fn with_factory(
        zones: Arc<dyn ZoneFinder>,
        factory: Arc<dyn ProviderClientFactory>,
    ) -> Self {
        Ns1Solver {
            zones,
            factory,
            secrets: None,
            client: OnceCell::new(),
        }
    }

    /// Use `store` for secret lookups instead of connecting to Kubernetes in `initialize`.
    pub fn with_secret_store(mut self, store: Arc<dyn SecretStore>) -> Self {
        self.secrets = Some(store);
        self
    }

    async fn dns_client(
        &self,
        ch: &ChallengeRequest,
        cfg: &ProviderConfig,
    ) -> Result<&Arc<dyn DnsProvider>> {
        self.client
            .get_or_try_init(|| async move {
                let api_key =
                    resolve_api_key(cfg, &ch.resource_namespace, self.secrets.as_deref()).await?;
                let client = self
                    .factory
                    .build(&api_key, &cfg.endpoint, cfg.ignore_ssl)?;
                info!(endpoint = %cfg.endpoint, ignore_ssl = cfg.ignore_ssl, "initialized DNS client");
                Ok::<_, Error>(client)
            })
            .await
    }

    /// Decode the config, split the name and make sure a client exists.
    async fn prepare(
        &self,
        ch: &ChallengeRequest,
    ) -> Result<(ProviderConfig, ChallengeName, &Arc<dyn DnsProvider>)> {
        let cfg = load_config(ch.config.as_ref())?;
        debug!(config = ?cfg, "decoded configuration");

        let name = split_challenge(self.zones.as_ref(), ch).await?;
        let client = self.dns_client(ch, &cfg).await?;
        Ok((cfg, name, client))
    }
}

#[async_trait]
impl Solver for Ns1Solver {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn initialize(&mut self, host: &KubeConfig, _stop: watch::Receiver<bool>) -> Result<()> {
        if self.secrets.is_none() {
            let store = KubeSecretStore::new(host)
                .await
                .map_err(Error::SecretStoreSetup)?;
            self.secrets = Some(Arc::new(store));
        }

        Ok(())
    }

    #[instrument(skip_all, fields(fqdn = %ch.resolved_fqdn, namespace = %ch.resource_namespace))]
    async fn present(&self, ch: &ChallengeRequest) -> Result<()> {
        let (cfg, name, client) = self.prepare(ch).await?;

        info!(zone = %name.zone, domain = %name.domain, "creating TXT record");
        match client
            .create_txt_record(&name.zone, &name.fqdn, &ch.key, cfg.record_ttl())
            .await
        {
            Ok(()) => info!("created TXT record"),
            Err(ProviderError::RecordExists) => info!("TXT record already exists"),
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }

    #[instrument(skip_all, fields(fqdn = %ch.resolved_fqdn, namespace = %ch.resource_namespace))]
    async fn cleanup(&self, ch: &ChallengeRequest) -> Result<()> {
        let (_, name, client) = self.prepare(ch).await?;

        info!(zone = %name.zone, domain = %name.domain, "deleting TXT record");
        match client
            .delete_record(&name.zone, &name.fqdn, RecordType::Txt)
            .await
        {
            Ok(()) => info!("deleted TXT record"),
            Err(ProviderError::RecordMissing) => info!("TXT record was already gone"),
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }
}
