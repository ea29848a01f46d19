//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

//! The abstract `Store` port. The Controller core and Router agent core
//! depend only on this trait; a relational adapter is out of scope, so
//! only the in-memory adapter is shipped in this crate.

use async_trait::async_trait;
use sdn_utils::RouterId;

use crate::error::Error;
use crate::model::{
    EventLogEntry, FibEntry, FibEntryId, FibSource, Link, LinkId, LinkState, MessageLogEntry,
    Neighbor, NeighborId, NeighborState, Route, RouteId, Router, RouterState,
};
use serde_json::Value;

#[async_trait]
pub trait Store: Send + Sync {
    // ----- Routers -----
    async fn create_router(&self, name: &str, ip: &str) -> Result<Router, Error>;
    async fn update_router(
        &self,
        id: RouterId,
        name: Option<&str>,
        ip: Option<&str>,
    ) -> Result<Router, Error>;
    async fn set_router_state(&self, id: RouterId, state: RouterState) -> Result<Router, Error>;
    /// Cascades: purges every incident link and every route referencing
    /// this router.
    async fn delete_router(&self, id: RouterId) -> Result<(), Error>;
    async fn get_router(&self, id: RouterId) -> Result<Router, Error>;
    async fn get_router_by_name(&self, name: &str) -> Option<Router>;
    async fn get_router_by_ip(&self, ip: &str) -> Option<Router>;
    async fn list_routers(&self) -> Vec<Router>;
    async fn list_active_routers(&self) -> Vec<Router>;

    // ----- Links -----
    async fn create_link(
        &self,
        a: RouterId,
        b: RouterId,
        cost: f64,
        bandwidth: Option<f64>,
        delay_ms: Option<f64>,
    ) -> Result<Link, Error>;
    async fn update_link(
        &self,
        id: LinkId,
        cost: Option<f64>,
        bandwidth: Option<f64>,
        delay_ms: Option<f64>,
    ) -> Result<Link, Error>;
    async fn set_link_state(&self, id: LinkId, state: LinkState) -> Result<Link, Error>;
    async fn delete_link(&self, id: LinkId) -> Result<(), Error>;
    async fn list_links(&self) -> Vec<Link>;
    async fn list_active_links(&self) -> Vec<Link>;
    async fn links_incident(&self, router: RouterId) -> Vec<Link>;

    // ----- Routes (derived state) -----
    async fn purge_routes_from(&self, src: RouterId) -> Result<usize, Error>;
    async fn purge_routes_in_scope(&self, routers: &[RouterId]) -> Result<usize, Error>;
    async fn insert_route(
        &self,
        src: RouterId,
        dst: RouterId,
        path: Vec<RouterId>,
        total_cost: f64,
    ) -> Result<Route, Error>;
    async fn list_routes_from(&self, src: RouterId) -> Vec<Route>;
    async fn get_route(&self, src: RouterId, dst: RouterId) -> Option<Route>;
    async fn list_routes(&self) -> Vec<Route>;

    // ----- Neighbors (Router agent's local view) -----
    async fn create_neighbor(
        &self,
        peer_name: &str,
        peer_ip: &str,
        link_cost: f64,
    ) -> Result<Neighbor, Error>;
    async fn get_neighbor(&self, id: NeighborId) -> Result<Neighbor, Error>;
    async fn get_neighbor_by_ip(&self, ip: &str) -> Option<Neighbor>;
    async fn set_neighbor_state(
        &self,
        id: NeighborId,
        state: NeighborState,
    ) -> Result<Neighbor, Error>;
    async fn touch_neighbor_hello(&self, id: NeighborId) -> Result<Neighbor, Error>;
    /// Cascades: purges FIB entries whose `next_hop_ip` equals the
    /// neighbor's `peer_ip`.
    async fn delete_neighbor(&self, id: NeighborId) -> Result<(), Error>;
    async fn list_neighbors(&self) -> Vec<Neighbor>;

    // ----- FIB -----
    /// Upgrade-or-ignore on a destination collision: the lower cost wins;
    /// on a tie the incumbent stays.
    async fn upsert_fib_entry(
        &self,
        dst_ip: &str,
        next_hop_ip: &str,
        egress_iface: &str,
        total_cost: f64,
        source: FibSource,
    ) -> Result<FibEntry, Error>;
    async fn delete_fib_entries_by_next_hop(&self, next_hop_ip: &str) -> usize;
    async fn purge_fib_by_source(&self, source: FibSource) -> usize;
    async fn list_fib(&self) -> Vec<FibEntry>;
    async fn get_fib_entry(&self, dst_ip: &str) -> Option<FibEntry>;
    async fn delete_fib_entry_id(&self, id: FibEntryId) -> bool;

    // ----- Logs -----
    async fn append_message(
        &self,
        msg_type: &str,
        sender: &str,
        receiver: &str,
        body: Value,
    ) -> MessageLogEntry;
    async fn list_messages(&self) -> Vec<MessageLogEntry>;
    async fn append_event(&self, event: &str, detail: &str) -> EventLogEntry;
    async fn list_events(&self) -> Vec<EventLogEntry>;
}
