use std::net::IpAddr;

use async_trait::async_trait;
use tracing::{debug, instrument};
use trust_dns_resolver::{
    config::{NameServerConfigGroup, ResolverConfig, ResolverOpts},
    error::{ResolveError, ResolveErrorKind},
    proto::rr::{Name, Record, RecordType},
    TokioAsyncResolver,
};

use crate::{
    challenge::ChallengeRequest,
    error::{Result, ZoneError},
};

/// Finds the apex of the zone a name belongs to.
#[async_trait]
pub trait ZoneFinder: Send + Sync {
    /// Returns the zone apex in fully-qualified form, e.g. `example.com.`
    async fn find_zone(&self, fqdn: &str) -> Result<String, ZoneError>;
}

/// Walks up the labels of a name, asking recursive nameservers for an SOA at each step.
pub struct RecursiveZoneFinder {
    resolver: TokioAsyncResolver,
}

impl RecursiveZoneFinder {
    /// Use the system's resolver configuration.
    pub fn from_system_conf() -> Result<Self, ZoneError> {
        let (config, options) =
            trust_dns_resolver::system_conf::read_system_conf().map_err(ZoneError::SystemConf)?;
        Self::new(config, options)
    }

    /// Use the given recursive nameservers, or the system configuration if the list is empty.
    pub fn with_nameservers(nameservers: &[IpAddr]) -> Result<Self, ZoneError> {
        if nameservers.is_empty() {
            return Self::from_system_conf();
        }

        let group = NameServerConfigGroup::from_ips_clear(nameservers, 53, true);
        let config = ResolverConfig::from_parts(None, vec![], group);
        Self::new(config, ResolverOpts::default())
    }

    fn new(config: ResolverConfig, mut options: ResolverOpts) -> Result<Self, ZoneError> {
        // Records are created and removed while we run, so never answer from cache.
        options.cache_size = 0;
        let resolver = TokioAsyncResolver::tokio(config, options).map_err(ZoneError::Resolver)?;
        Ok(RecursiveZoneFinder { resolver })
    }
}

#[async_trait]
impl ZoneFinder for RecursiveZoneFinder {
    #[instrument(skip(self))]
    async fn find_zone(&self, fqdn: &str) -> Result<String, ZoneError> {
        walk_zone(&self.resolver, fqdn).await
    }
}

/// A single SOA query. A negative answer (NXDOMAIN or NODATA) is an empty record set.
#[async_trait]
trait SoaQuery: Send + Sync {
    async fn soa_records(&self, name: Name) -> Result<Vec<Record>, ResolveError>;
}

#[async_trait]
impl SoaQuery for TokioAsyncResolver {
    async fn soa_records(&self, name: Name) -> Result<Vec<Record>, ResolveError> {
        match self.soa_lookup(name).await {
            Ok(lookup) => Ok(lookup.as_lookup().records().to_vec()),
            Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

async fn walk_zone<Q: SoaQuery + ?Sized>(query: &Q, fqdn: &str) -> Result<String, ZoneError> {
    for candidate in label_suffixes(fqdn) {
        let name = Name::from_ascii(&candidate).map_err(|e| ZoneError::InvalidName {
            fqdn: fqdn.to_string(),
            message: e.to_string(),
        })?;

        let records = query
            .soa_records(name)
            .await
            .map_err(|source| ZoneError::Lookup {
                name: candidate.clone(),
                source,
            })?;

        if let Some(apex) = soa_apex(&candidate, &records) {
            debug!(%apex, "found zone apex");
            return Ok(apex);
        }
    }

    Err(ZoneError::NotFound {
        fqdn: fqdn.to_string(),
    })
}

/// The SOA owner in `records` if it is `candidate` itself. A CNAME answer carries the SOA of the
/// target's zone, which says nothing about `candidate`.
fn soa_apex(candidate: &str, records: &[Record]) -> Option<String> {
    records
        .iter()
        .filter(|r| r.record_type() == RecordType::SOA)
        .map(|r| r.name().to_utf8())
        .find(|n| n.eq_ignore_ascii_case(candidate))
}

/// All suffixes of `fqdn` that are at least one label long, longest first, each with a trailing dot.
pub fn label_suffixes(fqdn: &str) -> Vec<String> {
    let name = un_fqdn(fqdn);
    if name.is_empty() {
        return Vec::new();
    }

    let mut suffixes = vec![format!("{name}.")];
    suffixes.extend(
        name.match_indices('.')
            .map(|(i, _)| format!("{}.", &name[i + 1..])),
    );
    suffixes
}

/// Strip a single trailing dot.
pub fn un_fqdn(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// The labels of `fqdn` in front of `zone`, or `None` if `fqdn` is not inside `zone`.
///
/// The apex itself has an empty owner.
pub fn owner_name(fqdn: &str, zone: &str) -> Option<String> {
    let fqdn = un_fqdn(fqdn);
    let zone = un_fqdn(zone);

    if zone.is_empty() {
        return None;
    }
    if fqdn.eq_ignore_ascii_case(zone) {
        return Some(String::new());
    }

    let idx = fqdn.len().checked_sub(zone.len() + 1)?;
    (fqdn.as_bytes()[idx] == b'.' && fqdn[idx + 1..].eq_ignore_ascii_case(zone))
        .then(|| fqdn[..idx].to_string())
}

/// Where a challenge record goes. None of the names has a trailing dot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChallengeName {
    /// The zone found in DNS.
    pub zone: String,
    /// The owner labels relative to `zone`, empty at the apex.
    pub domain: String,
    /// The full record name, always the challenge FQDN.
    pub fqdn: String,
}

/// Resolve the zone and owner name for a challenge.
///
/// The owner is taken relative to the zone found in DNS. The host's declared zone can lag behind
/// DNS, so it is only used for logging. If the FQDN is not inside the found zone at all, the owner
/// is the full name.
#[instrument(skip_all, fields(fqdn = %ch.resolved_fqdn))]
pub async fn split_challenge(
    finder: &dyn ZoneFinder,
    ch: &ChallengeRequest,
) -> Result<ChallengeName, ZoneError> {
    let found = finder.find_zone(&ch.resolved_fqdn).await?;
    let zone = un_fqdn(&found).to_string();
    let fqdn = un_fqdn(&ch.resolved_fqdn).to_string();

    if !un_fqdn(&ch.resolved_zone).eq_ignore_ascii_case(&zone) {
        debug!(declared = %ch.resolved_zone, %zone, "declared zone differs from DNS");
    }

    let domain = owner_name(&fqdn, &zone).unwrap_or_else(|| fqdn.clone());

    debug!(%zone, %domain, "split challenge name");
    Ok(ChallengeName { zone, domain, fqdn })
}
