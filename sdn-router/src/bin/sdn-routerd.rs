//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::Arc;

use clap::Parser;
use sdn_router::{OspfSimulator, RouterAgent, SessionClient};
use sdn_store::InMemoryStore;
use sdn_utils::config::{Config, TlsConfig};
use sdn_utils::task::IntervalTask;

#[derive(Parser, Debug)]
#[command(name = "sdn-routerd", about = "SDN control-plane router agent")]
struct Cli {
    /// Identity previously assigned by the controller. `0` (the default)
    /// registers as a new router; an operator who already knows this
    /// router's id should pass it so reconnects update the same row
    /// instead of creating a duplicate.
    #[arg(long, default_value_t = 0)]
    id: i64,

    /// Router name registered with the controller (e.g. "R1").
    #[arg(long)]
    name: String,

    /// IP address this router identifies itself by.
    #[arg(long)]
    ip: String,

    #[arg(long, default_value = "127.0.0.1")]
    controller_host: String,

    #[arg(long, default_value_t = 6633)]
    controller_port: u16,

    #[arg(long, default_value = "certs/client.crt")]
    cert_file: String,

    #[arg(long, default_value = "certs/client.key")]
    key_file: String,

    #[arg(long)]
    ca_file: Option<String>,

    /// Disables hostname and peer-certificate verification. Defaults to
    /// true; pass `--no-dev-mode` to require a `--ca-file`.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    dev_mode: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    sdn_utils::logging::init_tracing();
    let cli = Cli::parse();

    let mut config = Config::default();
    config.bind_host = cli.controller_host;
    config.bind_port = cli.controller_port;
    config.tls = TlsConfig {
        cert_file: cli.cert_file,
        key_file: cli.key_file,
        ca_file: cli.ca_file,
        dev_mode: cli.dev_mode,
    };

    let store = Arc::new(InMemoryStore::new());
    let agent =
        Arc::new(RouterAgent::new(store.clone(), cli.id, cli.name.clone(), cli.ip.clone()));
    let ospf = Arc::new(OspfSimulator::new(store, cli.name.clone()));

    // The router runs a HELLO emitter and a dead-interval scanner
    // alongside the Controller session client.
    let hello = {
        let ospf = ospf.clone();
        IntervalTask::new(config.hello_interval, false, move || {
            let ospf = ospf.clone();
            async move { ospf.send_hellos().await }
        })
    };
    let dead_scan = {
        let ospf = ospf.clone();
        let dead_interval = config.dead_interval;
        IntervalTask::new(dead_interval, false, move || {
            let ospf = ospf.clone();
            async move {
                if let Err(error) = ospf.scan_dead_intervals(dead_interval).await {
                    error.log();
                }
            }
        })
    };

    let _client = SessionClient::start(config, agent, ospf);

    // The session client, HELLO emitter, and dead-interval scanner all run
    // as background tasks; holding their handles here keeps those tasks
    // alive for the life of the process.
    let _hello = hello;
    let _dead_scan = dead_scan;
    std::future::pending::<()>().await;
    Ok(())
}
