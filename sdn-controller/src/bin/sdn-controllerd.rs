//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::Arc;

use clap::Parser;
use sdn_controller::session::SessionTable;
use sdn_controller::{Controller, server};
use sdn_store::InMemoryStore;
use sdn_utils::config::{Config, TlsConfig};

#[derive(Parser, Debug)]
#[command(name = "sdn-controllerd", about = "SDN control-plane controller daemon")]
struct Cli {
    #[arg(long, default_value = "0.0.0.0")]
    bind_host: String,

    #[arg(long, default_value_t = 6633)]
    bind_port: u16,

    #[arg(long, default_value = "certs/server.crt")]
    cert_file: String,

    #[arg(long, default_value = "certs/server.key")]
    key_file: String,

    #[arg(long)]
    ca_file: Option<String>,

    /// Disables hostname and peer-certificate verification. Defaults to
    /// true; pass `--no-dev-mode` to require a `--ca-file` and full
    /// client-certificate verification.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    dev_mode: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    sdn_utils::logging::init_tracing();
    let cli = Cli::parse();

    let mut config = Config::default();
    config.bind_host = cli.bind_host;
    config.bind_port = cli.bind_port;
    config.tls = TlsConfig {
        cert_file: cli.cert_file,
        key_file: cli.key_file,
        ca_file: cli.ca_file,
        dev_mode: cli.dev_mode,
    };

    let store = Arc::new(InMemoryStore::new());
    let controller = Arc::new(Controller::new(store, SessionTable::new()));

    server::run(config, controller).await?;
    Ok(())
}
