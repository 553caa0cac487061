use std::path::PathBuf;

use clap::Args;
use eyre::{eyre, Result, WrapErr};

use ns1_acme_webhook::{ChallengeRequest, Solver};

#[derive(Args, Debug)]
pub struct ChallengeArgs {
    /// A ChallengeRequest JSON document. Takes the place of the other flags.
    #[clap(long, conflicts_with_all = ["fqdn", "zone", "key", "namespace", "solver_config"])]
    request: Option<PathBuf>,

    /// The name to publish the record at, e.g. _acme-challenge.example.com.
    #[clap(long)]
    fqdn: Option<String>,

    /// The zone the name is expected to be in, e.g. example.com.
    #[clap(long)]
    zone: Option<String>,

    /// The TXT record value
    #[clap(long)]
    key: Option<String>,

    /// Namespace used to look up secrets referenced by the solver config
    #[clap(long, default_value = "default")]
    namespace: String,

    /// Solver configuration as JSON, e.g. '{"apiKeySecretRef":{"name":"ns1","key":"api-key"}}'
    #[clap(long)]
    solver_config: Option<String>,
}

impl ChallengeArgs {
    fn into_request(self) -> Result<ChallengeRequest> {
        if let Some(path) = self.request {
            let contents = std::fs::read_to_string(&path)
                .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
            let request = serde_json::from_str(&contents)
                .wrap_err_with(|| format!("{} is not a valid challenge request", path.display()))?;
            return Ok(request);
        }

        let fqdn = self.fqdn.ok_or_else(|| eyre!("--fqdn or --request is required"))?;
        let key = self.key.ok_or_else(|| eyre!("--key or --request is required"))?;
        let config = self
            .solver_config
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .wrap_err("--solver-config is not valid JSON")?;

        Ok(ChallengeRequest {
            resolved_zone: self.zone.unwrap_or_default(),
            resolved_fqdn: fqdn,
            key,
            resource_namespace: self.namespace,
            config,
        })
    }
}

pub async fn present(solver: &dyn Solver, args: ChallengeArgs) -> Result<()> {
    let request = args.into_request()?;
    solver.present(&request).await?;
    println!("Presented TXT record for {}", request.resolved_fqdn);
    Ok(())
}

pub async fn cleanup(solver: &dyn Solver, args: ChallengeArgs) -> Result<()> {
    let request = args.into_request()?;
    solver.cleanup(&request).await?;
    println!("Cleaned up TXT record for {}", request.resolved_fqdn);
    Ok(())
}
