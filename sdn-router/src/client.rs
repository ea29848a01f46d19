//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

//! The TLS session client. Owns the socket to the Controller; a receive
//! task dispatches inbound messages, a heartbeat `IntervalTask` emits
//! `HEARTBEAT` every `heartbeat_interval_client`, and an outer
//! `IntervalTask`-driven reconnection loop retries every
//! `reconnect_interval` while disconnected.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sdn_proto::factory::RouteEntry;
use sdn_proto::{LineBuffer, Message, MessageFactory, MessageType};
use sdn_utils::config::Config;
use sdn_utils::task::IntervalTask;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_rustls::rustls::pki_types::ServerName;
use tracing::{info, warn};

use crate::core::RouterAgent;
use crate::debug::Debug;
use crate::error::Error;
use crate::ospf::OspfSimulator;

type PendingRoutes = Arc<Mutex<HashMap<String, oneshot::Sender<Option<(String, f64)>>>>>;

type OutboundTx = Arc<Mutex<Option<mpsc::UnboundedSender<Message>>>>;

/// A handle to the client's reconnect loop and live connectivity flag.
/// Dropping it cancels the reconnect `IntervalTask` and, transitively, any
/// live session spawned from it.
pub struct SessionClient {
    pub connected: Arc<AtomicBool>,
    router_name: String,
    outbound: OutboundTx,
    pending: PendingRoutes,
    _reconnect: IntervalTask,
}

impl SessionClient {
    /// `ospf` is shared with the binary's HELLO/dead-scan `IntervalTask`s so
    /// adjacency transitions reached between reconnects still use the
    /// current live connection's outbound channel (see `ospf::OspfSimulator`).
    pub fn start(config: Config, agent: Arc<RouterAgent>, ospf: Arc<OspfSimulator>) -> Self {
        let connected = Arc::new(AtomicBool::new(false));
        let pending: PendingRoutes = Arc::new(Mutex::new(HashMap::new()));
        let outbound: OutboundTx = Arc::new(Mutex::new(None));
        let router_name = agent.name.clone();

        let connected_for_task = connected.clone();
        let pending_for_task = pending.clone();
        let outbound_for_task = outbound.clone();
        let reconnect = IntervalTask::new(config.reconnect_interval, true, move || {
            let connected = connected_for_task.clone();
            let pending = pending_for_task.clone();
            let outbound = outbound_for_task.clone();
            let config = config.clone();
            let agent = agent.clone();
            let ospf = ospf.clone();
            async move {
                if connected.load(Ordering::SeqCst) {
                    return;
                }
                Debug::Reconnecting { attempt: 0 }.log();
                if let Err(error) =
                    connect_and_run(config, agent, ospf, connected, pending, outbound).await
                {
                    error.log();
                }
            }
        });

        SessionClient { connected, router_name, outbound, pending, _reconnect: reconnect }
    }

    /// Sends a `ROUTE_REQUEST` and awaits the matching `ROUTE_RESPONSE`.
    /// Returns `None` if there is no live session or the session drops
    /// before a response arrives.
    pub async fn request_route(&self, destino: &str) -> Option<(String, f64)> {
        let tx = self.outbound.lock().await.clone()?;
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.lock().await.insert(destino.to_owned(), reply_tx);
        let _ = tx.send(MessageFactory::route_request(&self.router_name, destino));
        reply_rx.await.ok().flatten()
    }
}

async fn connect_and_run(
    config: Config,
    agent: Arc<RouterAgent>,
    ospf: Arc<OspfSimulator>,
    connected: Arc<AtomicBool>,
    pending: PendingRoutes,
    outbound: OutboundTx,
) -> Result<(), Error> {
    let connector = sdn_utils::tls::client_connector(&config.tls)?;
    let addr = format!("{}:{}", config.bind_host, config.bind_port);
    let stream = TcpStream::connect(&addr).await?;
    let server_name = ServerName::try_from("controller")
        .map_err(|_| Error::Transport(std::io::Error::other("invalid server name")))?;
    let tls_stream = connector.connect(server_name, stream).await?;
    let (mut reader, mut writer) = tokio::io::split(tls_stream);

    info!(router = %agent.name, %addr, "connected to controller");

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let writer_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let Ok(bytes) = sdn_proto::encode_line(&msg) else { continue };
            if writer.write_all(&bytes).await.is_err() {
                break;
            }
        }
    });

    let register = MessageFactory::register(agent.id, &agent.name, &agent.ip);
    let _ = tx.send(register);
    ospf.set_outbound(Some(tx.clone())).await;
    *outbound.lock().await = Some(tx.clone());

    let heartbeat = {
        let tx = tx.clone();
        let name = agent.name.clone();
        IntervalTask::new(config.heartbeat_interval_client, false, move || {
            let tx = tx.clone();
            let name = name.clone();
            async move {
                let _ = tx.send(MessageFactory::heartbeat(&name));
            }
        })
    };

    connected.store(true, Ordering::SeqCst);
    let result = receive_loop(&mut reader, &tx, &agent, &pending).await;
    connected.store(false, Ordering::SeqCst);
    ospf.set_outbound(None).await;
    *outbound.lock().await = None;

    // Drop (not reset) to actually cancel the `IntervalTask`'s underlying
    // `JoinHandle` rather than just restart its interval.
    drop(heartbeat);
    drop(tx);
    let _ = writer_task.await;
    result
}

async fn receive_loop(
    reader: &mut (impl tokio::io::AsyncRead + Unpin),
    tx: &mpsc::UnboundedSender<Message>,
    agent: &Arc<RouterAgent>,
    pending: &PendingRoutes,
) -> Result<(), Error> {
    let mut buf = LineBuffer::new();
    let mut read_buf = [0u8; 4096];
    loop {
        let n = reader.read(&mut read_buf).await?;
        if n == 0 {
            return Err(Error::Disconnected);
        }
        let messages = match buf.push(&read_buf[..n]) {
            Ok(messages) => messages,
            Err(error) => {
                let _ =
                    tx.send(MessageFactory::error(&agent.name, "CONTROLLER", &error.to_string()));
                return Err(error.into());
            }
        };
        for msg in messages {
            dispatch(msg, tx, agent, pending).await?;
        }
    }
}

async fn dispatch(
    msg: Message,
    tx: &mpsc::UnboundedSender<Message>,
    agent: &Arc<RouterAgent>,
    pending: &PendingRoutes,
) -> Result<(), Error> {
    match msg.msg_type {
        MessageType::RegisterAck => {
            let success = msg.payload.get("success").and_then(|v| v.as_bool()).unwrap_or(false);
            if success {
                Debug::Registered { router: &agent.name }.log();
            } else {
                warn!(router = %agent.name, "registration rejected by controller");
                return Err(Error::Disconnected);
            }
        }
        MessageType::HeartbeatAck => {}
        MessageType::RouteUpdate => {
            let entries = parse_route_entries(&msg);
            let count = agent.apply_route_update(&entries).await?;
            info!(router = %agent.name, count, "route update applied");
        }
        MessageType::RouteResponse => {
            let ruta = msg.payload.get("ruta");
            let destino = ruta.and_then(|r| r.get("destino")).and_then(|v| v.as_str());
            let costo = ruta.and_then(|r| r.get("costo")).and_then(|v| v.as_f64());
            let camino = ruta.and_then(|r| r.get("camino")).and_then(|v| v.as_str());
            if let Some(destino) = destino
                && let Some(sender) = pending.lock().await.remove(destino)
            {
                let result = match (camino, costo) {
                    (Some(camino), Some(costo)) => Some((camino.to_owned(), costo)),
                    _ => None,
                };
                let _ = sender.send(result);
            }
        }
        MessageType::TopologyUpdate => {
            info!(router = %agent.name, "topology update (informational)");
        }
        MessageType::Error => {
            let detail = msg.payload.get("error").and_then(|v| v.as_str()).unwrap_or("");
            warn!(router = %agent.name, error = %detail, "controller reported an error");
        }
        MessageType::NeighborUpdate | MessageType::LinkState => {
            info!(router = %agent.name, "unexpected inbound {:?}", msg.msg_type);
        }
        other => {
            let _ = tx;
            warn!(msg_type = ?other, "unhandled message type at router client");
        }
    }
    Ok(())
}

fn parse_route_entries(msg: &Message) -> Vec<RouteEntry> {
    let Some(rutas) = msg.payload.get("rutas").and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    rutas
        .iter()
        .filter_map(|r| {
            Some(RouteEntry {
                destino: r.get("destino")?.as_str()?.to_owned(),
                next_hop: r.get("next_hop").and_then(|v| v.as_str()).unwrap_or("").to_owned(),
                interfaz_salida: r
                    .get("interfaz_salida")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_owned(),
                costo: r.get("costo").and_then(|v| v.as_f64()).unwrap_or(0.0),
                origen_info: r
                    .get("origen_info")
                    .and_then(|v| v.as_str())
                    .unwrap_or("Controller")
                    .to_owned(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_route_entries_reads_wire_shape() {
        let msg = Message::new(
            MessageType::RouteUpdate,
            "CONTROLLER",
            "R1",
            json!({ "rutas": [
                { "destino": "10.0.0.3", "next_hop": "10.0.0.2", "interfaz_salida": "eth_to_R2", "costo": 2.0, "origen_info": "Controller" }
            ] }),
        );
        let entries = parse_route_entries(&msg);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].destino, "10.0.0.3");
        assert_eq!(entries[0].costo, 2.0);
    }

    #[test]
    fn parse_route_entries_tolerates_empty_payload() {
        let msg = Message::new(MessageType::RouteUpdate, "CONTROLLER", "R1", json!({}));
        assert!(parse_route_entries(&msg).is_empty());
    }
}
