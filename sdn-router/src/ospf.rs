//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

//! The OSPF-like adjacency simulator. Runs as two
//! `IntervalTask`s owned by the binary: a HELLO emitter and a
//! dead-interval scanner, plus an explicit adjacency-establishment
//! operation invoked out of band (operator action or a test).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sdn_proto::{Message, MessageFactory, factory::NeighborReport};
use sdn_store::{FibSource, NeighborId, NeighborState, Store};
use tokio::sync::{Mutex, mpsc};

use crate::debug::Debug;
use crate::error::Error;

/// The OSPF simulator outlives any single Controller session (it is
/// constructed once per router agent), so its outbound channel toward the
/// controller is swapped on every reconnect rather than rebuilt.
pub struct OspfSimulator {
    pub store: Arc<dyn Store>,
    pub self_name: String,
    to_controller: Mutex<Option<mpsc::UnboundedSender<Message>>>,
}

impl OspfSimulator {
    pub fn new(store: Arc<dyn Store>, self_name: impl Into<String>) -> Self {
        OspfSimulator { store, self_name: self_name.into(), to_controller: Mutex::new(None) }
    }

    /// Called by the session client on connect/disconnect to keep the
    /// simulator's outbound `LINK_STATE` channel current.
    pub async fn set_outbound(&self, tx: Option<mpsc::UnboundedSender<Message>>) {
        *self.to_controller.lock().await = tx;
    }

    /// Sends a HELLO to every neighbor in `{2-Way, Full}`. Neighbor
    /// transport is out of scope for this revision (only the
    /// Router-Controller session is a real socket); this logs the
    /// simulated emission as an event.
    pub async fn send_hellos(&self) {
        let neighbors = self.store.list_neighbors().await;
        for neighbor in neighbors {
            if matches!(neighbor.state, NeighborState::TwoWay | NeighborState::Full) {
                self.store
                    .append_event(
                        "hello_sent",
                        &format!("HELLO sent to {} ({})", neighbor.peer_name, neighbor.peer_ip),
                    )
                    .await;
            }
        }
    }

    /// Processes an inbound HELLO from a known neighbor: refreshes
    /// `last_hello` and, if the neighbor was `Down`, transitions it to
    /// `2-Way`.
    pub async fn receive_hello(&self, peer_ip: &str) -> Result<(), Error> {
        let Some(neighbor) = self.store.get_neighbor_by_ip(peer_ip).await else {
            return Ok(());
        };
        self.store.touch_neighbor_hello(neighbor.id).await?;
        if neighbor.state == NeighborState::Down {
            self.transition(neighbor.id, &neighbor.peer_name, NeighborState::Down, NeighborState::TwoWay)
                .await?;
        }
        Ok(())
    }

    /// The explicit adjacency-establishment operation: `Down -> 2-Way` or
    /// `2-Way -> Full`. Reaching `Full` emits a `ROUTER_LSA`/`LINK_STATE`
    /// notice and regenerates the `Internal` FIB slice.
    pub async fn establish_adjacency(&self, id: NeighborId) -> Result<NeighborState, Error> {
        let neighbor = self.store.get_neighbor(id).await?;
        let next = match neighbor.state {
            NeighborState::Down => NeighborState::TwoWay,
            NeighborState::TwoWay => NeighborState::Full,
            NeighborState::Full => NeighborState::Full,
        };
        if next == neighbor.state {
            return Ok(next);
        }
        self.transition(id, &neighbor.peer_name, neighbor.state, next).await?;

        if next == NeighborState::Full {
            let report = NeighborReport {
                nombre: neighbor.peer_name.clone(),
                ip: neighbor.peer_ip.clone(),
                costo: neighbor.link_cost,
                estado: "Full".to_owned(),
            };
            let lsa = MessageFactory::neighbor_update(&self.self_name, &[report]);
            if let Some(tx) = self.to_controller.lock().await.as_ref() {
                let _ = tx.send(lsa);
            }
            self.regenerate_internal_fib().await;
        }

        Ok(next)
    }

    /// Scans for neighbors past `dead_interval` since their last HELLO and
    /// reverts them to `Down`, purging any FIB entry they were the next
    /// hop for.
    pub async fn scan_dead_intervals(&self, dead_interval: Duration) -> Result<usize, Error> {
        let neighbors = self.store.list_neighbors().await;
        let now = Utc::now();
        let mut expired = 0;
        for neighbor in neighbors {
            if neighbor.state == NeighborState::Down {
                continue;
            }
            let elapsed = now.signed_duration_since(neighbor.last_hello);
            if elapsed.to_std().unwrap_or(Duration::ZERO) > dead_interval {
                self.store.set_neighbor_state(neighbor.id, NeighborState::Down).await?;
                let purged = self.store.delete_fib_entries_by_next_hop(&neighbor.peer_ip).await;
                self.store
                    .append_event(
                        "neighbor_dead_interval_expired",
                        &format!(
                            "neighbor {} ({}) -> Down, purged {purged} fib entries",
                            neighbor.peer_name, neighbor.peer_ip
                        ),
                    )
                    .await;
                Debug::DeadIntervalExpired { peer: &neighbor.peer_name }.log();
                expired += 1;
            }
        }
        if expired > 0 {
            self.regenerate_internal_fib().await;
        }
        Ok(expired)
    }

    /// Simplified SPF: purge all `Internal`-tagged FIB
    /// entries, then install one directly-connected entry per `Full`
    /// neighbor. Multi-hop SPF via flooded LSAs is not simulated.
    pub async fn regenerate_internal_fib(&self) {
        self.store.purge_fib_by_source(FibSource::Internal).await;
        let neighbors = self.store.list_neighbors().await;
        let mut count = 0;
        for neighbor in neighbors.into_iter().filter(|n| n.state == NeighborState::Full) {
            let egress = format!("eth_to_{}", neighbor.peer_ip);
            let _ = self
                .store
                .upsert_fib_entry(
                    &neighbor.peer_ip,
                    &neighbor.peer_ip,
                    &egress,
                    neighbor.link_cost,
                    FibSource::Internal,
                )
                .await;
            count += 1;
        }
        Debug::FibRegenerated { tag: "Internal", count }.log();
    }

    async fn transition(
        &self,
        id: NeighborId,
        peer_name: &str,
        from: NeighborState,
        to: NeighborState,
    ) -> Result<(), Error> {
        self.store.set_neighbor_state(id, to).await?;
        Debug::NeighborTransition { peer: peer_name, from: state_label(from), to: state_label(to) }
            .log();
        Ok(())
    }
}

fn state_label(state: NeighborState) -> &'static str {
    match state {
        NeighborState::Down => "Down",
        NeighborState::TwoWay => "2-Way",
        NeighborState::Full => "Full",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdn_store::InMemoryStore;
    use sdn_utils::task::IntervalTask;

    async fn simulator() -> (OspfSimulator, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sim = OspfSimulator::new(Arc::new(InMemoryStore::new()), "R1");
        sim.set_outbound(Some(tx)).await;
        (sim, rx)
    }

    #[tokio::test]
    async fn explicit_adjacency_walks_down_to_full() {
        let (sim, _rx) = simulator().await;
        let neighbor = sim.store.create_neighbor("R2", "10.0.0.2", 1.0).await.unwrap();

        let state = sim.establish_adjacency(neighbor.id).await.unwrap();
        assert_eq!(state, NeighborState::TwoWay);

        let state = sim.establish_adjacency(neighbor.id).await.unwrap();
        assert_eq!(state, NeighborState::Full);

        let fib = sim.store.list_fib().await;
        assert_eq!(fib.len(), 1);
        assert_eq!(fib[0].next_hop_ip, "10.0.0.2");
    }

    #[tokio::test]
    async fn dead_interval_expiry_drops_neighbor_and_its_fib_entry() {
        let (sim, _rx) = simulator().await;
        let neighbor = sim.store.create_neighbor("N1", "10.0.0.9", 1.0).await.unwrap();
        sim.establish_adjacency(neighbor.id).await.unwrap();
        sim.establish_adjacency(neighbor.id).await.unwrap();
        assert_eq!(sim.store.get_neighbor(neighbor.id).await.unwrap().state, NeighborState::Full);

        // `InMemoryStore` always stamps `last_hello` at "now", so a
        // `dead_interval` of zero stands in for any elapsed time at all
        // for a neighbor that hasn't just been touched.
        let expired = sim.scan_dead_intervals(Duration::ZERO).await.unwrap();
        assert_eq!(expired, 1);
        assert_eq!(sim.store.get_neighbor(neighbor.id).await.unwrap().state, NeighborState::Down);
        assert!(sim.store.list_fib().await.is_empty());
    }

    #[tokio::test]
    async fn receive_hello_promotes_down_neighbor() {
        let (sim, _rx) = simulator().await;
        let neighbor = sim.store.create_neighbor("R2", "10.0.0.2", 1.0).await.unwrap();
        sim.receive_hello("10.0.0.2").await.unwrap();
        assert_eq!(sim.store.get_neighbor(neighbor.id).await.unwrap().state, NeighborState::TwoWay);
    }

    #[tokio::test(start_paused = true)]
    async fn dead_interval_scanner_drops_neighbor_once_interval_elapses() {
        let (sim, _rx) = simulator().await;
        let sim = Arc::new(sim);
        let neighbor = sim.store.create_neighbor("R2", "10.0.0.2", 1.0).await.unwrap();
        sim.establish_adjacency(neighbor.id).await.unwrap();
        sim.establish_adjacency(neighbor.id).await.unwrap();

        let dead_interval = Duration::from_secs(40);
        let scanner = {
            let sim = sim.clone();
            IntervalTask::new(dead_interval, false, move || {
                let sim = sim.clone();
                async move {
                    let _ = sim.scan_dead_intervals(dead_interval).await;
                }
            })
        };

        tokio::time::advance(dead_interval + Duration::from_secs(1)).await;
        tokio::task::yield_now().await;

        assert_eq!(sim.store.get_neighbor(neighbor.id).await.unwrap().state, NeighborState::Down);
        assert!(sim.store.list_fib().await.is_empty());
        drop(scanner);
    }
}
