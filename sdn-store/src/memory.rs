//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

//! The in-memory `Store` adapter. A single `tokio::sync::Mutex` guards
//! all tables — operations only need to be serialized, not lock-free.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use sdn_utils::RouterId;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::Error;
use crate::model::{
    EventLogEntry, FibEntry, FibEntryId, FibSource, Link, LinkId, LinkState, MessageLogEntry,
    Neighbor, NeighborId, NeighborState, Route, RouteId, Router, RouterState,
};
use crate::store::Store;

#[derive(Default)]
struct Tables {
    routers: Vec<Router>,
    links: Vec<Link>,
    routes: Vec<Route>,
    neighbors: Vec<Neighbor>,
    fib: Vec<FibEntry>,
    messages: Vec<MessageLogEntry>,
    events: Vec<EventLogEntry>,
}

pub struct InMemoryStore {
    tables: Mutex<Tables>,
    next_router_id: AtomicI64,
    next_link_id: AtomicI64,
    next_route_id: AtomicI64,
    next_neighbor_id: AtomicI64,
    next_fib_id: AtomicI64,
    next_message_id: AtomicI64,
    next_event_id: AtomicI64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        InMemoryStore {
            tables: Mutex::new(Tables::default()),
            next_router_id: AtomicI64::new(1),
            next_link_id: AtomicI64::new(1),
            next_route_id: AtomicI64::new(1),
            next_neighbor_id: AtomicI64::new(1),
            next_fib_id: AtomicI64::new(1),
            next_message_id: AtomicI64::new(1),
            next_event_id: AtomicI64::new(1),
        }
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(counter: &AtomicI64) -> i64 {
        counter.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn create_router(&self, name: &str, ip: &str) -> Result<Router, Error> {
        let mut tables = self.tables.lock().await;
        if tables.routers.iter().any(|r| r.name == name) {
            return Err(Error::DuplicateName(name.to_owned()));
        }
        if tables.routers.iter().any(|r| r.ip == ip) {
            return Err(Error::DuplicateIp(ip.to_owned()));
        }
        let router = Router {
            id: RouterId(Self::next(&self.next_router_id)),
            name: name.to_owned(),
            ip: ip.to_owned(),
            state: RouterState::Active,
            last_updated: Utc::now(),
        };
        tables.routers.push(router.clone());
        Ok(router)
    }

    async fn update_router(
        &self,
        id: RouterId,
        name: Option<&str>,
        ip: Option<&str>,
    ) -> Result<Router, Error> {
        let mut tables = self.tables.lock().await;
        if let Some(name) = name {
            if tables.routers.iter().any(|r| r.name == name && r.id != id) {
                return Err(Error::DuplicateName(name.to_owned()));
            }
        }
        if let Some(ip) = ip {
            if tables.routers.iter().any(|r| r.ip == ip && r.id != id) {
                return Err(Error::DuplicateIp(ip.to_owned()));
            }
        }
        let router = tables
            .routers
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound(format!("router {id}")))?;
        if let Some(name) = name {
            router.name = name.to_owned();
        }
        if let Some(ip) = ip {
            router.ip = ip.to_owned();
        }
        router.last_updated = Utc::now();
        Ok(router.clone())
    }

    async fn set_router_state(&self, id: RouterId, state: RouterState) -> Result<Router, Error> {
        let mut tables = self.tables.lock().await;
        let router = tables
            .routers
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound(format!("router {id}")))?;
        router.state = state;
        router.last_updated = Utc::now();
        Ok(router.clone())
    }

    async fn delete_router(&self, id: RouterId) -> Result<(), Error> {
        let mut tables = self.tables.lock().await;
        let before = tables.routers.len();
        tables.routers.retain(|r| r.id != id);
        if tables.routers.len() == before {
            return Err(Error::NotFound(format!("router {id}")));
        }
        tables.links.retain(|l| l.a != id && l.b != id);
        tables.routes.retain(|r| r.src != id && r.dst != id);
        Ok(())
    }

    async fn get_router(&self, id: RouterId) -> Result<Router, Error> {
        let tables = self.tables.lock().await;
        tables
            .routers
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("router {id}")))
    }

    async fn get_router_by_name(&self, name: &str) -> Option<Router> {
        let tables = self.tables.lock().await;
        tables.routers.iter().find(|r| r.name == name).cloned()
    }

    async fn get_router_by_ip(&self, ip: &str) -> Option<Router> {
        let tables = self.tables.lock().await;
        tables.routers.iter().find(|r| r.ip == ip).cloned()
    }

    async fn list_routers(&self) -> Vec<Router> {
        self.tables.lock().await.routers.clone()
    }

    async fn list_active_routers(&self) -> Vec<Router> {
        self.tables
            .lock()
            .await
            .routers
            .iter()
            .filter(|r| r.state == RouterState::Active)
            .cloned()
            .collect()
    }

    async fn create_link(
        &self,
        a: RouterId,
        b: RouterId,
        cost: f64,
        bandwidth: Option<f64>,
        delay_ms: Option<f64>,
    ) -> Result<Link, Error> {
        if a == b {
            return Err(Error::SelfLoop);
        }
        let mut tables = self.tables.lock().await;
        if !tables.routers.iter().any(|r| r.id == a) || !tables.routers.iter().any(|r| r.id == b) {
            return Err(Error::UnknownRouter);
        }
        let pair = if a <= b { (a, b) } else { (b, a) };
        if tables.links.iter().any(|l| l.unordered_pair() == pair) {
            return Err(Error::DuplicateLink);
        }
        let link = Link {
            id: LinkId(Self::next(&self.next_link_id)),
            a,
            b,
            cost,
            bandwidth,
            delay_ms,
            state: LinkState::Active,
        };
        tables.links.push(link.clone());
        Ok(link)
    }

    async fn update_link(
        &self,
        id: LinkId,
        cost: Option<f64>,
        bandwidth: Option<f64>,
        delay_ms: Option<f64>,
    ) -> Result<Link, Error> {
        let mut tables = self.tables.lock().await;
        let link = tables
            .links
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| Error::NotFound(format!("link {id:?}")))?;
        if let Some(cost) = cost {
            link.cost = cost;
        }
        if bandwidth.is_some() {
            link.bandwidth = bandwidth;
        }
        if delay_ms.is_some() {
            link.delay_ms = delay_ms;
        }
        Ok(link.clone())
    }

    async fn set_link_state(&self, id: LinkId, state: LinkState) -> Result<Link, Error> {
        let mut tables = self.tables.lock().await;
        let link = tables
            .links
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| Error::NotFound(format!("link {id:?}")))?;
        link.state = state;
        Ok(link.clone())
    }

    async fn delete_link(&self, id: LinkId) -> Result<(), Error> {
        let mut tables = self.tables.lock().await;
        let before = tables.links.len();
        tables.links.retain(|l| l.id != id);
        if tables.links.len() == before {
            return Err(Error::NotFound(format!("link {id:?}")));
        }
        Ok(())
    }

    async fn list_links(&self) -> Vec<Link> {
        self.tables.lock().await.links.clone()
    }

    async fn list_active_links(&self) -> Vec<Link> {
        self.tables
            .lock()
            .await
            .links
            .iter()
            .filter(|l| l.state == LinkState::Active)
            .cloned()
            .collect()
    }

    async fn links_incident(&self, router: RouterId) -> Vec<Link> {
        self.tables
            .lock()
            .await
            .links
            .iter()
            .filter(|l| l.a == router || l.b == router)
            .cloned()
            .collect()
    }

    async fn purge_routes_from(&self, src: RouterId) -> Result<usize, Error> {
        let mut tables = self.tables.lock().await;
        let before = tables.routes.len();
        tables.routes.retain(|r| r.src != src);
        Ok(before - tables.routes.len())
    }

    async fn purge_routes_in_scope(&self, routers: &[RouterId]) -> Result<usize, Error> {
        let mut tables = self.tables.lock().await;
        let before = tables.routes.len();
        tables
            .routes
            .retain(|r| !routers.contains(&r.src) && !routers.contains(&r.dst));
        Ok(before - tables.routes.len())
    }

    async fn insert_route(
        &self,
        src: RouterId,
        dst: RouterId,
        path: Vec<RouterId>,
        total_cost: f64,
    ) -> Result<Route, Error> {
        let mut tables = self.tables.lock().await;
        let route = Route {
            id: RouteId(Self::next(&self.next_route_id)),
            src,
            dst,
            path,
            total_cost,
            computed_at: Utc::now(),
        };
        tables.routes.push(route.clone());
        Ok(route)
    }

    async fn list_routes_from(&self, src: RouterId) -> Vec<Route> {
        self.tables
            .lock()
            .await
            .routes
            .iter()
            .filter(|r| r.src == src)
            .cloned()
            .collect()
    }

    async fn get_route(&self, src: RouterId, dst: RouterId) -> Option<Route> {
        self.tables
            .lock()
            .await
            .routes
            .iter()
            .find(|r| r.src == src && r.dst == dst)
            .cloned()
    }

    async fn list_routes(&self) -> Vec<Route> {
        self.tables.lock().await.routes.clone()
    }

    async fn create_neighbor(
        &self,
        peer_name: &str,
        peer_ip: &str,
        link_cost: f64,
    ) -> Result<Neighbor, Error> {
        let mut tables = self.tables.lock().await;
        if tables.neighbors.iter().any(|n| n.peer_name == peer_name) {
            return Err(Error::ValidationError(format!(
                "peer name already in use: {peer_name}"
            )));
        }
        if tables.neighbors.iter().any(|n| n.peer_ip == peer_ip) {
            return Err(Error::ValidationError(format!(
                "peer ip already in use: {peer_ip}"
            )));
        }
        let neighbor = Neighbor {
            id: NeighborId(Self::next(&self.next_neighbor_id)),
            peer_name: peer_name.to_owned(),
            peer_ip: peer_ip.to_owned(),
            state: NeighborState::Down,
            link_cost,
            last_hello: Utc::now(),
        };
        tables.neighbors.push(neighbor.clone());
        Ok(neighbor)
    }

    async fn get_neighbor(&self, id: NeighborId) -> Result<Neighbor, Error> {
        self.tables
            .lock()
            .await
            .neighbors
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("neighbor {id:?}")))
    }

    async fn get_neighbor_by_ip(&self, ip: &str) -> Option<Neighbor> {
        self.tables
            .lock()
            .await
            .neighbors
            .iter()
            .find(|n| n.peer_ip == ip)
            .cloned()
    }

    async fn set_neighbor_state(
        &self,
        id: NeighborId,
        state: NeighborState,
    ) -> Result<Neighbor, Error> {
        let mut tables = self.tables.lock().await;
        let neighbor = tables
            .neighbors
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| Error::NotFound(format!("neighbor {id:?}")))?;
        neighbor.state = state;
        Ok(neighbor.clone())
    }

    async fn touch_neighbor_hello(&self, id: NeighborId) -> Result<Neighbor, Error> {
        let mut tables = self.tables.lock().await;
        let neighbor = tables
            .neighbors
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| Error::NotFound(format!("neighbor {id:?}")))?;
        neighbor.last_hello = Utc::now();
        if neighbor.state == NeighborState::Down {
            neighbor.state = NeighborState::TwoWay;
        }
        Ok(neighbor.clone())
    }

    async fn delete_neighbor(&self, id: NeighborId) -> Result<(), Error> {
        let mut tables = self.tables.lock().await;
        let Some(pos) = tables.neighbors.iter().position(|n| n.id == id) else {
            return Err(Error::NotFound(format!("neighbor {id:?}")));
        };
        let peer_ip = tables.neighbors[pos].peer_ip.clone();
        tables.neighbors.remove(pos);
        tables.fib.retain(|f| f.next_hop_ip != peer_ip);
        Ok(())
    }

    async fn list_neighbors(&self) -> Vec<Neighbor> {
        self.tables.lock().await.neighbors.clone()
    }

    async fn upsert_fib_entry(
        &self,
        dst_ip: &str,
        next_hop_ip: &str,
        egress_iface: &str,
        total_cost: f64,
        source: FibSource,
    ) -> Result<FibEntry, Error> {
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables.fib.iter_mut().find(|f| f.dst_ip == dst_ip) {
            // Upgrade-or-ignore keyed on total_cost: lower cost wins, tie
            // keeps the incumbent.
            if total_cost < existing.total_cost {
                existing.next_hop_ip = next_hop_ip.to_owned();
                existing.egress_iface = egress_iface.to_owned();
                existing.total_cost = total_cost;
                existing.source = source;
            }
            return Ok(existing.clone());
        }
        let entry = FibEntry {
            id: FibEntryId(Self::next(&self.next_fib_id)),
            dst_ip: dst_ip.to_owned(),
            next_hop_ip: next_hop_ip.to_owned(),
            egress_iface: egress_iface.to_owned(),
            total_cost,
            source,
        };
        tables.fib.push(entry.clone());
        Ok(entry)
    }

    async fn delete_fib_entries_by_next_hop(&self, next_hop_ip: &str) -> usize {
        let mut tables = self.tables.lock().await;
        let before = tables.fib.len();
        tables.fib.retain(|f| f.next_hop_ip != next_hop_ip);
        before - tables.fib.len()
    }

    async fn purge_fib_by_source(&self, source: FibSource) -> usize {
        let mut tables = self.tables.lock().await;
        let before = tables.fib.len();
        tables.fib.retain(|f| f.source != source);
        before - tables.fib.len()
    }

    async fn list_fib(&self) -> Vec<FibEntry> {
        self.tables.lock().await.fib.clone()
    }

    async fn get_fib_entry(&self, dst_ip: &str) -> Option<FibEntry> {
        self.tables
            .lock()
            .await
            .fib
            .iter()
            .find(|f| f.dst_ip == dst_ip)
            .cloned()
    }

    async fn delete_fib_entry_id(&self, id: FibEntryId) -> bool {
        let mut tables = self.tables.lock().await;
        let before = tables.fib.len();
        tables.fib.retain(|f| f.id != id);
        tables.fib.len() != before
    }

    async fn append_message(
        &self,
        msg_type: &str,
        sender: &str,
        receiver: &str,
        body: Value,
    ) -> MessageLogEntry {
        let mut tables = self.tables.lock().await;
        let entry = MessageLogEntry {
            id: Self::next(&self.next_message_id),
            msg_type: msg_type.to_owned(),
            sender: sender.to_owned(),
            receiver: receiver.to_owned(),
            body,
            at: Utc::now(),
        };
        tables.messages.push(entry.clone());
        entry
    }

    async fn list_messages(&self) -> Vec<MessageLogEntry> {
        self.tables.lock().await.messages.clone()
    }

    async fn append_event(&self, event: &str, detail: &str) -> EventLogEntry {
        let mut tables = self.tables.lock().await;
        let entry = EventLogEntry {
            id: Self::next(&self.next_event_id),
            event: event.to_owned(),
            detail: detail.to_owned(),
            at: Utc::now(),
        };
        tables.events.push(entry.clone());
        entry
    }

    async fn list_events(&self) -> Vec<EventLogEntry> {
        self.tables.lock().await.events.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_name_rejected() {
        let store = InMemoryStore::new();
        store.create_router("R1", "10.0.0.1").await.unwrap();
        assert!(matches!(
            store.create_router("R1", "10.0.0.2").await,
            Err(Error::DuplicateName(..))
        ));
    }

    #[tokio::test]
    async fn duplicate_ip_rejected() {
        let store = InMemoryStore::new();
        store.create_router("R1", "10.0.0.1").await.unwrap();
        assert!(matches!(
            store.create_router("R2", "10.0.0.1").await,
            Err(Error::DuplicateIp(..))
        ));
    }

    #[tokio::test]
    async fn self_loop_link_rejected() {
        let store = InMemoryStore::new();
        let r1 = store.create_router("R1", "10.0.0.1").await.unwrap();
        assert!(matches!(
            store.create_link(r1.id, r1.id, 1.0, None, None).await,
            Err(Error::SelfLoop)
        ));
    }

    #[tokio::test]
    async fn duplicate_link_rejected() {
        let store = InMemoryStore::new();
        let r1 = store.create_router("R1", "10.0.0.1").await.unwrap();
        let r2 = store.create_router("R2", "10.0.0.2").await.unwrap();
        store.create_link(r1.id, r2.id, 1.0, None, None).await.unwrap();
        assert!(matches!(
            store.create_link(r2.id, r1.id, 1.0, None, None).await,
            Err(Error::DuplicateLink)
        ));
    }

    #[tokio::test]
    async fn delete_router_cascades_links_and_routes() {
        let store = InMemoryStore::new();
        let r1 = store.create_router("R1", "10.0.0.1").await.unwrap();
        let r2 = store.create_router("R2", "10.0.0.2").await.unwrap();
        store.create_link(r1.id, r2.id, 1.0, None, None).await.unwrap();
        store
            .insert_route(r1.id, r2.id, vec![r1.id, r2.id], 1.0)
            .await
            .unwrap();

        store.delete_router(r1.id).await.unwrap();
        assert!(store.list_links().await.is_empty());
        assert!(store.list_routes().await.is_empty());
    }

    #[tokio::test]
    async fn fib_upsert_prefers_lower_cost_and_keeps_incumbent_on_tie() {
        let store = InMemoryStore::new();
        store
            .upsert_fib_entry("10.0.0.2", "10.0.0.2", "eth0", 5.0, FibSource::Internal)
            .await
            .unwrap();
        store
            .upsert_fib_entry("10.0.0.2", "10.0.0.3", "eth1", 5.0, FibSource::Internal)
            .await
            .unwrap();
        let entry = store.get_fib_entry("10.0.0.2").await.unwrap();
        assert_eq!(entry.next_hop_ip, "10.0.0.2");

        store
            .upsert_fib_entry("10.0.0.2", "10.0.0.4", "eth2", 2.0, FibSource::Controller)
            .await
            .unwrap();
        let entry = store.get_fib_entry("10.0.0.2").await.unwrap();
        assert_eq!(entry.next_hop_ip, "10.0.0.4");
        assert_eq!(entry.total_cost, 2.0);
    }

    #[tokio::test]
    async fn delete_neighbor_cascades_fib() {
        let store = InMemoryStore::new();
        let n = store.create_neighbor("R2", "10.0.0.2", 1.0).await.unwrap();
        store
            .upsert_fib_entry("10.0.0.2", "10.0.0.2", "eth0", 1.0, FibSource::Internal)
            .await
            .unwrap();
        store.delete_neighbor(n.id).await.unwrap();
        assert!(store.get_fib_entry("10.0.0.2").await.is_none());
    }
}
