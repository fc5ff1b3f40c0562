//! Command-line and environment configuration.

use std::net::{IpAddr, SocketAddr};

use clap::Parser;
use tracing::Level;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "keyledger-server")]
#[command(about = "Issue and redeem single-use license keys over HTTP")]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to
    #[arg(long, env = "KEYLEDGER_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "KEYLEDGER_PORT", default_value = "3000")]
    pub port: u16,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServerConfig {
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Default log level when `RUST_LOG` is not set.
    #[must_use]
    pub fn log_level(&self) -> Level {
        if self.verbose { Level::DEBUG } else { Level::INFO }
    }
}
