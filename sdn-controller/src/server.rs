//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

//! The TLS session server. One task per accepted connection owns the
//! socket; a task-owned `mpsc` queue is drained by a writer loop running
//! in the same task, so every session has exactly one writer.

use std::net::SocketAddr;
use std::sync::Arc;

use sdn_proto::{LineBuffer, Message, MessageFactory, MessageType};
use sdn_store::RouterState;
use sdn_utils::RouterId;
use sdn_utils::config::Config;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_rustls::TlsAcceptor;
use tracing::{info, warn};

use crate::core::Controller;
use crate::debug::Debug;
use crate::error::Error;
use crate::session::SessionHandle;

pub async fn run(config: Config, controller: Arc<Controller>) -> Result<(), Error> {
    let acceptor = sdn_utils::tls::server_acceptor(&config.tls)?;
    let addr: SocketAddr = format!("{}:{}", config.bind_host, config.bind_port)
        .parse()
        .map_err(|_| std::io::Error::other("invalid bind address"))?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "controller listening");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(error) => {
                warn!(%error, "accept failed");
                continue;
            }
        };
        let acceptor = acceptor.clone();
        let controller = controller.clone();
        tokio::spawn(async move {
            if let Err(error) = handle_connection(acceptor, stream, peer, controller).await {
                error.log();
            }
        });
    }
}

async fn handle_connection(
    acceptor: TlsAcceptor,
    stream: tokio::net::TcpStream,
    peer: SocketAddr,
    controller: Arc<Controller>,
) -> Result<(), Error> {
    let tls_stream = acceptor.accept(stream).await?;
    let (mut reader, mut writer) = tokio::io::split(tls_stream);

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let mut router_name: Option<String> = None;

    let writer_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let Ok(bytes) = sdn_proto::encode_line(&msg) else { continue };
            if writer.write_all(&bytes).await.is_err() {
                break;
            }
        }
    });

    let mut buf = LineBuffer::new();
    let mut read_buf = [0u8; 4096];
    let result = session_loop(&mut reader, &mut read_buf, &mut buf, &tx, &controller, &mut router_name, peer).await;

    if let Some(name) = &router_name {
        controller.sessions.remove(name).await;
        if let Some(router) = controller.store.get_router_by_name(name).await {
            let _ = controller.store.set_router_state(router.id, RouterState::Inactive).await;
        }
        Debug::SessionClosed(name).log();
    }

    drop(tx);
    let _ = writer_task.await;
    result
}

#[allow(clippy::too_many_arguments)]
async fn session_loop(
    reader: &mut (impl tokio::io::AsyncRead + Unpin),
    read_buf: &mut [u8],
    line_buf: &mut LineBuffer,
    tx: &mpsc::UnboundedSender<Message>,
    controller: &Arc<Controller>,
    router_name: &mut Option<String>,
    peer: SocketAddr,
) -> Result<(), Error> {
    loop {
        let n = reader.read(read_buf).await?;
        if n == 0 {
            return Ok(());
        }
        let messages = match line_buf.push(&read_buf[..n]) {
            Ok(messages) => messages,
            Err(error) => {
                let receiver = router_name.as_deref().unwrap_or("unknown");
                let _ = tx.send(MessageFactory::error("CONTROLLER", receiver, &error.to_string()));
                return Err(error.into());
            }
        };
        for msg in messages {
            if !dispatch(msg, tx, controller, router_name, peer).await? {
                return Ok(());
            }
        }
    }
}

/// Returns `Ok(false)` when the session should be torn down (a `DISCONNECT`
/// was received).
async fn dispatch(
    msg: Message,
    tx: &mpsc::UnboundedSender<Message>,
    controller: &Arc<Controller>,
    router_name: &mut Option<String>,
    peer: SocketAddr,
) -> Result<bool, Error> {
    match msg.msg_type {
        MessageType::Register => {
            let name = msg
                .payload
                .get("router_nombre")
                .and_then(|v| v.as_str())
                .unwrap_or(&msg.sender)
                .to_owned();
            let peer_ip = peer.ip().to_string();
            let ip = msg
                .payload
                .get("router_ip")
                .and_then(|v| v.as_str())
                .unwrap_or(&peer_ip)
                .to_owned();
            let router_id = msg.payload.get("router_id").and_then(|v| v.as_i64()).unwrap_or(0);

            let existing = if router_id != 0 {
                controller.store.get_router(RouterId::from(router_id)).await.ok()
            } else {
                None
            };
            match existing {
                Some(existing) => {
                    controller.store.update_router(existing.id, Some(&name), Some(&ip)).await?;
                    controller.store.set_router_state(existing.id, RouterState::Active).await?;
                }
                None => {
                    controller.store.create_router(&name, &ip).await?;
                }
            };

            controller
                .sessions
                .insert(name.clone(), SessionHandle { tx: tx.clone() })
                .await;
            *router_name = Some(name.clone());
            Debug::SessionRegistered(&name).log();

            let ack = MessageFactory::register_ack(&name, true, "registered");
            let _ = tx.send(ack);

            // Adding/reactivating a router changes reachability for
            // everyone, so the full recomputation already pushes this
            // router's initial route slice once its session is in the
            // table.
            controller.recompute_all().await?;
            Ok(true)
        }
        MessageType::Heartbeat => {
            if let Some(name) = router_name {
                let _ = tx.send(MessageFactory::heartbeat_ack(name));
            }
            Ok(true)
        }
        MessageType::NeighborUpdate => {
            // Accepted and logged only; never mutates the topology graph
            // (Open Question 1: the Controller's topology is operator-
            // managed, not learned from router-reported adjacencies).
            if let Some(name) = router_name {
                controller
                    .store
                    .append_message("NEIGHBOR_UPDATE", name, "CONTROLLER", msg.payload)
                    .await;
            }
            Ok(true)
        }
        MessageType::RouteRequest => {
            if let Some(name) = router_name
                && let Some(router) = controller.store.get_router_by_name(name).await
            {
                let dst_ip = msg.payload.get("destino").and_then(|v| v.as_str()).unwrap_or("");
                let dst_router = controller.store.get_router_by_ip(dst_ip).await;
                let (path, cost) = match dst_router {
                    Some(dst) => controller.shortest_path(router.id, dst.id).await,
                    None => (None, None),
                };
                let camino = path.as_deref().map(sdn_utils::path::format_path);
                let response =
                    MessageFactory::route_response(name, dst_ip, cost, camino.as_deref());
                let _ = tx.send(response);
            }
            Ok(true)
        }
        MessageType::Disconnect => Ok(false),
        other => {
            warn!(msg_type = ?other, "unhandled message type at controller");
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    use sdn_store::InMemoryStore;

    use super::*;
    use crate::session::SessionTable;

    fn peer() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 9)), 4000)
    }

    #[tokio::test]
    async fn register_ack_precedes_initial_route_update() {
        let controller =
            Arc::new(Controller::new(Arc::new(InMemoryStore::new()), SessionTable::new()));
        let r2 = controller.create_router("R2", "10.0.0.2").await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        let mut router_name = None;

        let register = MessageFactory::register(0, "R1", "10.0.0.1");
        let continue_session =
            dispatch(register, &tx, &controller, &mut router_name, peer()).await.unwrap();
        assert!(continue_session);

        let first = rx.recv().await.expect("ack expected");
        assert_eq!(first.msg_type, MessageType::RegisterAck);

        // Linking R1 to an already-registered R2 triggers a recomputation
        // that pushes a ROUTE_UPDATE to R1's now-live session, strictly
        // after its ack.
        let r1 = controller.store.get_router_by_name("R1").await.unwrap();
        controller.create_link(r1.id, r2.id, 1.0, None, None).await.unwrap();
        drop(tx);

        let second = rx.recv().await.expect("route update expected");
        assert_eq!(second.msg_type, MessageType::RouteUpdate);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn disconnect_ends_the_session_loop() {
        let controller =
            Arc::new(Controller::new(Arc::new(InMemoryStore::new()), SessionTable::new()));
        let (tx, _rx) = mpsc::unbounded_channel::<Message>();
        let mut router_name = Some("R1".to_owned());

        let msg = MessageFactory::disconnect("R1");
        let continue_session =
            dispatch(msg, &tx, &controller, &mut router_name, peer()).await.unwrap();
        assert!(!continue_session);
    }
}
