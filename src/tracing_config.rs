use eyre::Result;
use tracing::subscriber::set_global_default;
use tracing_error::ErrorLayer;
use tracing_log::LogTracer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};
use tracing_tree::HierarchicalLayer;

/// Install the global subscriber. The filter is read from `LOG` and defaults to `info`.
pub fn init_tracing() -> Result<()> {
    LogTracer::builder()
        .ignore_crate("hyper")
        .ignore_crate("trust_dns_proto")
        .with_max_level(log::LevelFilter::Debug)
        .init()?;

    let env_filter = EnvFilter::try_from_env("LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    let tree = HierarchicalLayer::new(2)
        .with_targets(true)
        .with_bracketed_fields(true);
    let subscriber = Registry::default()
        .with(env_filter)
        .with(tree)
        .with(ErrorLayer::default());

    set_global_default(subscriber)?;
    Ok(())
}
