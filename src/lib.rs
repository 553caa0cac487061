//! An ACME DNS-01 challenge solver for NS1.
//!
//! A host (for example a cert-manager webhook) calls [`Solver::present`] to publish the
//! `_acme-challenge` TXT record for a name and [`Solver::cleanup`] to remove it again. The solver
//! works out which zone the name lives in, resolves the NS1 API key (inline, or from a Kubernetes
//! secret) and talks to the NS1 record API.

pub mod challenge;
pub mod credentials;
pub mod dns;
pub mod error;
pub mod secrets;
pub mod settings;
pub mod solver;
pub mod zone;

pub use challenge::{load_config, ChallengeRequest, ProviderConfig, SecretKeySelector};
pub use error::{Error, ErrorKind, Result};
pub use solver::{Ns1Solver, Solver};

pub const USER_AGENT: &str = concat!("ns1-acme-webhook/", env!("CARGO_PKG_VERSION"));
