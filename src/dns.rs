pub mod ns1;

use std::sync::Arc;

use async_trait::async_trait;
use strum::{AsRefStr, Display, EnumString};

use crate::error::ProviderError;

pub use self::ns1::{Ns1Client, Ns1ClientFactory};

#[derive(AsRefStr, Clone, Copy, Debug, Display, EnumString, PartialEq, Eq, Hash)]
pub enum RecordType {
    #[strum(serialize = "TXT")]
    Txt,
}

/// Record operations against a DNS provider's API.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Create a TXT record at `fqdn` in `zone`. Fails with [`ProviderError::RecordExists`] if the
    /// provider already has a TXT record at that name.
    async fn create_txt_record(
        &self,
        zone: &str,
        fqdn: &str,
        value: &str,
        ttl: Option<u32>,
    ) -> Result<(), ProviderError>;

    /// Delete every record of `record_type` at `fqdn`. Fails with [`ProviderError::RecordMissing`]
    /// if there is none.
    async fn delete_record(
        &self,
        zone: &str,
        fqdn: &str,
        record_type: RecordType,
    ) -> Result<(), ProviderError>;

    async fn record_exists(
        &self,
        zone: &str,
        fqdn: &str,
        record_type: RecordType,
    ) -> Result<bool, ProviderError>;
}

/// Builds an authenticated [`DnsProvider`].
pub trait ProviderClientFactory: Send + Sync {
    fn build(
        &self,
        api_key: &str,
        endpoint: &str,
        insecure_tls: bool,
    ) -> Result<Arc<dyn DnsProvider>, ProviderError>;
}
