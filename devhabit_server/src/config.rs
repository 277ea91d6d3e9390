use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::filter::{Directive, EnvFilter, ParseError};
use url::Url;

/// Added to `RUST_LOG` when `--log` is absent. `tower_http` carries the
/// per-request spans and response events.
pub const DEFAULT_LOG_DIRECTIVES: [&str; 2] = ["devhabit=info", "tower_http=info"];

#[derive(Parser, Debug, Clone)]
#[command(name = "devhabit")]
#[command(about = "Habit tracking REST API with sorting, data shaping and hypermedia links")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "DEVHABIT_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// SQLite database file
    #[arg(long, env = "DEVHABIT_DATABASE", default_value = "devhabit.db")]
    pub database: PathBuf,

    /// Public base URL used for generated links and Location headers
    #[arg(long, env = "DEVHABIT_PUBLIC_URL", default_value = "http://localhost:5000")]
    pub public_url: Url,

    /// Log filter override, e.g. "devhabit=debug,tower_http=debug"
    #[arg(long, env = "DEVHABIT_LOG")]
    pub log: Option<String>,
}

impl Config {
    /// The subscriber filter: `--log` verbatim, else `RUST_LOG` plus the
    /// default directives.
    pub fn log_filter(&self) -> Result<EnvFilter, ParseError> {
        match &self.log {
            Some(directives) => EnvFilter::try_new(directives),
            None => DEFAULT_LOG_DIRECTIVES
                .iter()
                .try_fold(EnvFilter::from_default_env(), |filter, directive| {
                    Ok(filter.add_directive(directive.parse::<Directive>()?))
                }),
        }
    }
}
