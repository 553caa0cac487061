#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;

use ns1_acme_webhook::{
    dns::{DnsProvider, ProviderClientFactory, RecordType},
    error::{ProviderError, SecretStoreError, ZoneError},
    secrets::{SecretData, SecretStore},
    zone::ZoneFinder,
    ChallengeRequest,
};

/// Answers every lookup with the same zone.
pub struct StaticZone(pub &'static str);

#[async_trait]
impl ZoneFinder for StaticZone {
    async fn find_zone(&self, _fqdn: &str) -> Result<String, ZoneError> {
        Ok(self.0.to_string())
    }
}

pub struct NoZone;

#[async_trait]
impl ZoneFinder for NoZone {
    async fn find_zone(&self, fqdn: &str) -> Result<String, ZoneError> {
        Err(ZoneError::NotFound {
            fqdn: fqdn.to_string(),
        })
    }
}

#[derive(Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<(String, String), SecretData>>,
    pub reads: AtomicUsize,
}

impl MemorySecretStore {
    pub fn insert(&self, namespace: &str, name: &str, key: &str, value: &str) {
        self.secrets
            .lock()
            .entry((namespace.to_string(), name.to_string()))
            .or_default()
            .insert(key.to_string(), value.as_bytes().to_vec());
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretData, SecretStoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.secrets
            .lock()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or(SecretStoreError::NotFound)
    }
}

/// Behaves like NS1: one TXT record per name, duplicate creates and missing deletes are errors.
#[derive(Default)]
pub struct FakeProvider {
    /// (zone, fqdn) -> (value, ttl)
    pub records: Mutex<HashMap<(String, String), (String, Option<u32>)>>,
    pub fail_with_status: Mutex<Option<u16>>,
}

impl FakeProvider {
    pub fn record(&self, zone: &str, fqdn: &str) -> Option<(String, Option<u32>)> {
        self.records
            .lock()
            .get(&(zone.to_string(), fqdn.to_string()))
            .cloned()
    }

    fn check_failure(&self) -> Result<(), ProviderError> {
        match *self.fail_with_status.lock() {
            Some(status) => Err(ProviderError::Api {
                status,
                message: "injected failure".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DnsProvider for FakeProvider {
    async fn create_txt_record(
        &self,
        zone: &str,
        fqdn: &str,
        value: &str,
        ttl: Option<u32>,
    ) -> Result<(), ProviderError> {
        self.check_failure()?;
        let key = (zone.to_string(), fqdn.to_string());
        let mut records = self.records.lock();
        if records.contains_key(&key) {
            return Err(ProviderError::RecordExists);
        }
        records.insert(key, (value.to_string(), ttl));
        Ok(())
    }

    async fn delete_record(
        &self,
        zone: &str,
        fqdn: &str,
        record_type: RecordType,
    ) -> Result<(), ProviderError> {
        assert_eq!(record_type, RecordType::Txt);
        self.check_failure()?;
        self.records
            .lock()
            .remove(&(zone.to_string(), fqdn.to_string()))
            .map(|_| ())
            .ok_or(ProviderError::RecordMissing)
    }

    async fn record_exists(
        &self,
        zone: &str,
        fqdn: &str,
        _record_type: RecordType,
    ) -> Result<bool, ProviderError> {
        Ok(self.record(zone, fqdn).is_some())
    }
}

/// Hands out the same [`FakeProvider`] and remembers how it was asked to build it.
#[derive(Default)]
pub struct RecordingFactory {
    pub provider: Arc<FakeProvider>,
    pub builds: AtomicUsize,
    pub last_build: Mutex<Option<(String, String, bool)>>,
    /// Slow builds widen the window for concurrent initialization.
    pub build_delay: Option<Duration>,
}

impl RecordingFactory {
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl ProviderClientFactory for RecordingFactory {
    fn build(
        &self,
        api_key: &str,
        endpoint: &str,
        insecure_tls: bool,
    ) -> Result<Arc<dyn DnsProvider>, ProviderError> {
        if let Some(delay) = self.build_delay {
            std::thread::sleep(delay);
        }
        self.builds.fetch_add(1, Ordering::SeqCst);
        *self.last_build.lock() = Some((api_key.to_string(), endpoint.to_string(), insecure_tls));
        Ok(self.provider.clone())
    }
}

pub fn challenge(fqdn: &str, zone: &str, key: &str, config: serde_json::Value) -> ChallengeRequest {
    ChallengeRequest {
        resolved_fqdn: fqdn.to_string(),
        resolved_zone: zone.to_string(),
        key: key.to_string(),
        resource_namespace: "cert-manager".to_string(),
        config: Some(config),
    }
}
