use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{DnsProvider, ProviderClientFactory, RecordType};
use crate::error::ProviderError;

pub const DEFAULT_ENDPOINT: &str = "https://api.nsone.net/v1/";
const API_KEY_HEADER: &str = "X-NSONE-Key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Ns1Client {
    client: Client,
    endpoint: Url,
    api_key: String,
}

#[derive(Serialize)]
struct Answer<'a> {
    answer: [&'a str; 1],
}

#[derive(Serialize)]
struct NewRecord<'a> {
    zone: &'a str,
    domain: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    answers: [Answer<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<u32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: String,
}

impl Ns1Client {
    pub fn new(api_key: &str, endpoint: &str, insecure_tls: bool) -> Result<Ns1Client, ProviderError> {
        let endpoint = parse_endpoint(endpoint)?;

        let mut builder = Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(REQUEST_TIMEOUT);
        if insecure_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Ns1Client {
            client: builder.build()?,
            endpoint,
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn record_request(
        &self,
        method: Method,
        zone: &str,
        fqdn: &str,
        record_type: RecordType,
    ) -> Result<RequestBuilder, ProviderError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidEndpoint {
                endpoint: self.endpoint.to_string(),
                message: "cannot be a base URL".to_string(),
            })?
            .pop_if_empty()
            .extend(["zones", zone, fqdn, record_type.as_ref()]);

        Ok(self
            .client
            .request(method, url)
            .header(API_KEY_HEADER, &self.api_key))
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, ProviderError> {
    let endpoint = if endpoint.is_empty() {
        DEFAULT_ENDPOINT
    } else {
        endpoint
    };

    let url = Url::parse(endpoint).map_err(|e| ProviderError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(ProviderError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            message: "cannot be a base URL".to_string(),
        });
    }

    Ok(url)
}

/// Turn a non-success response into an error, recognizing the messages NS1 uses for the
/// conditions callers care about.
async fn check_response(res: Response, zone: &str) -> Result<Response, ProviderError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await?;
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.message)
        .unwrap_or(body);

    let err = match message.as_str() {
        "record already exists" => ProviderError::RecordExists,
        "record not found" => ProviderError::RecordMissing,
        "zone not found" => ProviderError::ZoneMissing {
            zone: zone.to_string(),
        },
        _ => ProviderError::Api {
            status: status.as_u16(),
            message,
        },
    };

    Err(err)
}

#[async_trait]
impl DnsProvider for Ns1Client {
    #[instrument(skip(self, value))]
    async fn create_txt_record(
        &self,
        zone: &str,
        fqdn: &str,
        value: &str,
        ttl: Option<u32>,
    ) -> Result<(), ProviderError> {
        let body = NewRecord {
            zone,
            domain: fqdn,
            record_type: RecordType::Txt.as_ref(),
            answers: [Answer { answer: [value] }],
            ttl,
        };

        let res = self
            .record_request(Method::PUT, zone, fqdn, RecordType::Txt)?
            .json(&body)
            .send()
            .await?;
        check_response(res, zone).await?;

        debug!("created record");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_record(
        &self,
        zone: &str,
        fqdn: &str,
        record_type: RecordType,
    ) -> Result<(), ProviderError> {
        let res = self
            .record_request(Method::DELETE, zone, fqdn, record_type)?
            .send()
            .await?;
        check_response(res, zone).await?;

        debug!("deleted record");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn record_exists(
        &self,
        zone: &str,
        fqdn: &str,
        record_type: RecordType,
    ) -> Result<bool, ProviderError> {
        let res = self
            .record_request(Method::GET, zone, fqdn, record_type)?
            .send()
            .await?;

        if res.status() == StatusCode::NOT_FOUND {
            return match check_response(res, zone).await {
                Err(ProviderError::RecordMissing) => Ok(false),
                Err(e) => Err(e),
                Ok(_) => Ok(false),
            };
        }

        check_response(res, zone).await?;
        Ok(true)
    }
}

/// Builds [`Ns1Client`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ns1ClientFactory;

impl ProviderClientFactory for Ns1ClientFactory {
    fn build(
        &self,
        api_key: &str,
        endpoint: &str,
        insecure_tls: bool,
    ) -> Result<Arc<dyn DnsProvider>, ProviderError> {
        let client = Ns1Client::new(api_key, endpoint, insecure_tls)?;
        debug!(endpoint = %client.endpoint(), insecure_tls, "created NS1 client");
        Ok(Arc::new(client))
    }
}
