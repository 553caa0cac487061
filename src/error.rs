use strum::{AsRefStr, Display};
use thiserror::Error;
use trust_dns_resolver::error::ResolveError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The broad class of a failure.
#[derive(AsRefStr, Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    CredentialResolution,
    ZoneResolution,
    Provider,
}

#[derive(Debug, Error)]
pub enum Error {
    /// The per-challenge configuration blob could not be decoded.
    #[error("error decoding solver config: {0}")]
    InvalidConfig(#[source] serde_json::Error),

    /// No inline API key was given and the secret reference is incomplete.
    #[error("apiKeySecretRef.{field} must be set when no apiKey is given (namespace {namespace:?})")]
    MissingSecretRefField {
        field: &'static str,
        namespace: String,
    },

    /// The solver was asked to read a secret before `initialize` was called.
    #[error("solver has not been initialized with a secret store")]
    NotInitialized,

    #[error("failed to set up secret store: {0}")]
    SecretStoreSetup(#[source] SecretStoreError),

    #[error("failed to read secret '{namespace}/{secret}': {source}")]
    SecretStore {
        namespace: String,
        secret: String,
        #[source]
        source: SecretStoreError,
    },

    #[error("no such key {key:?} in secret '{namespace}/{secret}'")]
    MissingSecretKey {
        key: String,
        secret: String,
        namespace: String,
    },

    #[error("key {key:?} in secret '{namespace}/{secret}' is empty")]
    EmptySecretValue {
        key: String,
        secret: String,
        namespace: String,
    },

    #[error("key {key:?} in secret '{namespace}/{secret}' is not valid UTF-8")]
    SecretNotUtf8 {
        key: String,
        secret: String,
        namespace: String,
    },

    #[error(transparent)]
    Zone(#[from] ZoneError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidConfig(_)
            | Error::MissingSecretRefField { .. }
            | Error::NotInitialized
            | Error::SecretStoreSetup(_) => ErrorKind::Configuration,
            Error::SecretStore { .. }
            | Error::MissingSecretKey { .. }
            | Error::EmptySecretValue { .. }
            | Error::SecretNotUtf8 { .. } => ErrorKind::CredentialResolution,
            Error::Zone(_) => ErrorKind::ZoneResolution,
            Error::Provider(_) => ErrorKind::Provider,
        }
    }
}

#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("invalid domain name {fqdn:?}: {message}")]
    InvalidName { fqdn: String, message: String },

    #[error("DNS lookup for {name} failed: {source}")]
    Lookup {
        name: String,
        #[source]
        source: ResolveError,
    },

    #[error("could not find zone for FQDN {fqdn}")]
    NotFound { fqdn: String },

    #[error("failed to read system resolver configuration: {0}")]
    SystemConf(#[source] std::io::Error),

    #[error("failed to create DNS resolver: {0}")]
    Resolver(#[source] ResolveError),
}

#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("secret not found")]
    NotFound,

    #[error("secret store returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("secret store request failed: {0}")]
    Transport(#[source] kube::Error),

    #[error("secret could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("invalid secret store configuration: {0}")]
    Config(String),
}

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The record already exists. `present` treats this as success.
    #[error("record already exists")]
    RecordExists,

    /// The record does not exist. `cleanup` treats this as success.
    #[error("record not found")]
    RecordMissing,

    #[error("zone {zone} not found at the DNS provider")]
    ZoneMissing { zone: String },

    #[error("DNS provider returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("DNS provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid DNS provider endpoint {endpoint:?}: {message}")]
    InvalidEndpoint { endpoint: String, message: String },
}
