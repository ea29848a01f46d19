//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

//! Router agent core: local neighbor/FIB CRUD and the
//! reactive handling of a controller-pushed `ROUTE_UPDATE`.

use sdn_store::{FibSource, Neighbor, NeighborId, NeighborState, Store};
use std::sync::Arc;

use crate::error::Error;

pub struct RouterAgent {
    pub store: Arc<dyn Store>,
    /// Identity presented on `REGISTER`. `0` means "not yet assigned one by
    /// an operator"; the controller then creates a fresh router row and
    /// never reports its id back, matching the wire protocol's ack shape.
    pub id: i64,
    pub name: String,
    pub ip: String,
}

impl RouterAgent {
    pub fn new(
        store: Arc<dyn Store>,
        id: i64,
        name: impl Into<String>,
        ip: impl Into<String>,
    ) -> Self {
        RouterAgent { store, id, name: name.into(), ip: ip.into() }
    }

    // ----- Neighbor CRUD (operator level) -----

    pub async fn create_neighbor(
        &self,
        peer_name: &str,
        peer_ip: &str,
        link_cost: f64,
    ) -> Result<Neighbor, Error> {
        Ok(self.store.create_neighbor(peer_name, peer_ip, link_cost).await?)
    }

    pub async fn set_neighbor_state(
        &self,
        id: NeighborId,
        state: NeighborState,
    ) -> Result<Neighbor, Error> {
        Ok(self.store.set_neighbor_state(id, state).await?)
    }

    /// Cascades: purges FIB entries whose `next_hop_ip` equals the
    /// neighbor's `peer_ip`.
    pub async fn delete_neighbor(&self, id: NeighborId) -> Result<(), Error> {
        Ok(self.store.delete_neighbor(id).await?)
    }

    // ----- FIB CRUD (operator level, tagged External) -----

    pub async fn create_fib_entry(
        &self,
        dst_ip: &str,
        next_hop_ip: &str,
        egress_iface: &str,
        total_cost: f64,
    ) -> Result<sdn_store::FibEntry, Error> {
        Ok(self
            .store
            .upsert_fib_entry(dst_ip, next_hop_ip, egress_iface, total_cost, FibSource::External)
            .await?)
    }

    pub async fn delete_fib_entry(&self, id: sdn_store::FibEntryId) -> bool {
        self.store.delete_fib_entry_id(id).await
    }

    /// Purges all `Controller`-tagged FIB entries and reinserts the
    /// entries from a received `ROUTE_UPDATE`.
    pub async fn apply_route_update(
        &self,
        entries: &[sdn_proto::factory::RouteEntry],
    ) -> Result<usize, Error> {
        self.store.purge_fib_by_source(FibSource::Controller).await;
        let mut count = 0;
        for entry in entries {
            self.store
                .upsert_fib_entry(
                    &entry.destino,
                    &entry.next_hop,
                    &entry.interfaz_salida,
                    entry.costo,
                    FibSource::Controller,
                )
                .await?;
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdn_proto::factory::RouteEntry;
    use sdn_store::InMemoryStore;

    fn agent() -> RouterAgent {
        RouterAgent::new(Arc::new(InMemoryStore::new()), 0, "R1", "10.0.0.1")
    }

    #[tokio::test]
    async fn route_update_replaces_controller_entries() {
        let agent = agent();
        agent.create_fib_entry("10.0.0.9", "10.0.0.2", "eth0", 7.0).await.unwrap();
        let first = vec![RouteEntry {
            destino: "10.0.0.3".to_owned(),
            next_hop: "10.0.0.2".to_owned(),
            interfaz_salida: "eth_to_R2".to_owned(),
            costo: 2.0,
            origen_info: "Controller".to_owned(),
        }];
        agent.apply_route_update(&first).await.unwrap();
        let fib = agent.store.list_fib().await;
        assert_eq!(fib.len(), 2);

        let second = vec![RouteEntry {
            destino: "10.0.0.4".to_owned(),
            next_hop: "10.0.0.2".to_owned(),
            interfaz_salida: "eth_to_R2".to_owned(),
            costo: 3.0,
            origen_info: "Controller".to_owned(),
        }];
        agent.apply_route_update(&second).await.unwrap();
        let fib = agent.store.list_fib().await;
        // The External entry survives; the old Controller entry is gone.
        assert_eq!(fib.len(), 2);
        assert!(fib.iter().any(|e| e.dst_ip == "10.0.0.9" && e.source == FibSource::External));
        assert!(fib.iter().any(|e| e.dst_ip == "10.0.0.4" && e.source == FibSource::Controller));
    }

    #[tokio::test]
    async fn delete_neighbor_cascades_fib_entries() {
        let agent = agent();
        let neighbor = agent.create_neighbor("R2", "10.0.0.2", 1.0).await.unwrap();
        agent
            .store
            .upsert_fib_entry("10.0.0.2", "10.0.0.2", "eth_to_R2", 1.0, FibSource::Internal)
            .await
            .unwrap();
        agent.delete_neighbor(neighbor.id).await.unwrap();
        assert!(agent.store.list_fib().await.is_empty());
    }
}
