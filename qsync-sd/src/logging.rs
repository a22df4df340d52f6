//! Tracing setup
//!
//! The configured log level is only known once the config file has been
//! read, so loading runs under a temporary subscriber and the global one is
//! installed afterwards.

use std::path::Path;

use qsync_common::config::TomlConfig;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::Result;

/// Load configuration, emitting its log records to stdout at `info`
/// (or `RUST_LOG`)
pub fn load_config(path: Option<&Path>) -> Result<TomlConfig> {
    load_config_with_writer(path, std::io::stdout)
}

/// Same as [`load_config`] with the bootstrap records sent to `writer`
pub fn load_config_with_writer<W>(path: Option<&Path>, writer: W) -> Result<TomlConfig>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .finish();

    let config = tracing::subscriber::with_default(bootstrap, || TomlConfig::load(path))?;
    Ok(config)
}

/// Install the global subscriber; `RUST_LOG` wins over `level`
pub fn init(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("qsync_sd={level},qsync_common={level},tower_http=info").into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
