//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

//! Controller core: operator-level mutations and route recomputation.
//! The Graph engine is rebuilt from a fresh snapshot on every
//! recomputation; no shared mutable graph is kept anywhere.

use std::sync::Arc;

use sdn_graph::TopologyGraph;
use sdn_proto::factory::{MessageFactory, RouteEntry};
use sdn_store::{Link, LinkId, LinkState, Route, Router, RouterState, Store};
use sdn_utils::RouterId;
use tracing::info;

use crate::debug::Debug;
use crate::error::Error;
use crate::session::SessionTable;

pub struct Controller {
    pub store: Arc<dyn Store>,
    pub sessions: SessionTable,
}

impl Controller {
    pub fn new(store: Arc<dyn Store>, sessions: SessionTable) -> Self {
        Controller { store, sessions }
    }

    async fn snapshot_graph(&self) -> (TopologyGraph, Vec<Router>) {
        let routers = self.store.list_active_routers().await;
        let links = self.store.list_active_links().await;
        let ids: Vec<RouterId> = routers.iter().map(|r| r.id).collect();
        let edges: Vec<(RouterId, RouterId, f64)> =
            links.iter().map(|l| (l.a, l.b, l.cost)).collect();
        (TopologyGraph::build(&ids, &edges), routers)
    }

    // ----- Router mutations -----

    pub async fn create_router(&self, name: &str, ip: &str) -> Result<Router, Error> {
        let router = self.store.create_router(name, ip).await?;
        self.store
            .append_event("router_created", &format!("router {name} ({ip}) created"))
            .await;
        self.recompute_all().await?;
        Ok(router)
    }

    pub async fn update_router(
        &self,
        id: RouterId,
        name: Option<&str>,
        ip: Option<&str>,
    ) -> Result<Router, Error> {
        let router = self.store.update_router(id, name, ip).await?;
        self.store
            .append_event("router_updated", &format!("router {id} updated"))
            .await;
        Ok(router)
    }

    pub async fn set_router_state(
        &self,
        id: RouterId,
        state: RouterState,
    ) -> Result<Router, Error> {
        let router = self.store.set_router_state(id, state).await?;
        self.store
            .append_event("router_state_changed", &format!("router {id} -> {state:?}"))
            .await;
        if state != RouterState::Active {
            self.recompute_all().await?;
        }
        Ok(router)
    }

    pub async fn delete_router(&self, id: RouterId) -> Result<(), Error> {
        self.store.delete_router(id).await?;
        self.store
            .append_event("router_deleted", &format!("router {id} deleted"))
            .await;
        self.recompute_all().await?;
        Ok(())
    }

    // ----- Link mutations -----

    pub async fn create_link(
        &self,
        a: RouterId,
        b: RouterId,
        cost: f64,
        bandwidth: Option<f64>,
        delay_ms: Option<f64>,
    ) -> Result<Link, Error> {
        let link = self.store.create_link(a, b, cost, bandwidth, delay_ms).await?;
        self.store
            .append_event("link_created", &format!("link {a}-{b} cost {cost} created"))
            .await;
        self.recompute_endpoints(&[a, b]).await?;
        Ok(link)
    }

    pub async fn update_link(
        &self,
        id: LinkId,
        cost: Option<f64>,
        bandwidth: Option<f64>,
        delay_ms: Option<f64>,
    ) -> Result<Link, Error> {
        let link = self.store.update_link(id, cost, bandwidth, delay_ms).await?;
        self.store
            .append_event("link_updated", &format!("link {id:?} updated"))
            .await;
        if cost.is_some() {
            self.recompute_endpoints(&[link.a, link.b]).await?;
        }
        Ok(link)
    }

    pub async fn set_link_state(&self, id: LinkId, state: LinkState) -> Result<Link, Error> {
        let link = self.store.set_link_state(id, state).await?;
        self.store
            .append_event("link_state_changed", &format!("link {id:?} -> {state:?}"))
            .await;
        self.recompute_endpoints(&[link.a, link.b]).await?;
        Ok(link)
    }

    pub async fn delete_link(&self, id: LinkId) -> Result<(), Error> {
        let links = self.store.list_links().await;
        let Some(link) = links.into_iter().find(|l| l.id == id) else {
            return Err(sdn_store::Error::NotFound(format!("link {id:?}")).into());
        };
        self.store.delete_link(id).await?;
        self.store
            .append_event("link_deleted", &format!("link {id:?} deleted"))
            .await;
        self.recompute_endpoints(&[link.a, link.b]).await?;
        Ok(())
    }

    // ----- Recomputation -----

    /// Router added/deleted/state-changed to non-Active: recompute every
    /// active router's routes.
    pub async fn recompute_all(&self) -> Result<usize, Error> {
        let (graph, routers) = self.snapshot_graph().await;
        let mut total = 0;
        for router in &routers {
            total += self.recompute_from(&graph, router.id).await?;
        }
        Debug::RouteRecomputed { scope: "all", count: total }.log();
        self.store
            .append_event("routes_recomputed", &format!("{total} routes recomputed (full)"))
            .await;
        Ok(total)
    }

    /// Link mutation: recompute routes from both endpoints only.
    async fn recompute_endpoints(&self, endpoints: &[RouterId]) -> Result<usize, Error> {
        let (graph, _routers) = self.snapshot_graph().await;
        let mut total = 0;
        for &endpoint in endpoints {
            if graph.contains(endpoint) {
                total += self.recompute_from(&graph, endpoint).await?;
            }
        }
        Debug::RouteRecomputed { scope: "endpoints", count: total }.log();
        Ok(total)
    }

    /// Purges all routes from `src`, then reinserts one row per reachable
    /// destination using `all_shortest_paths_from`. Pushes the newly computed slice if `src`
    /// has an active session.
    async fn recompute_from(&self, graph: &TopologyGraph, src: RouterId) -> Result<usize, Error> {
        self.store.purge_routes_from(src).await?;
        let paths = sdn_graph::all_shortest_paths_from(graph, src);
        let mut count = 0;
        for (dst, (path, cost)) in &paths {
            self.store.insert_route(src, *dst, path.clone(), *cost).await?;
            count += 1;
        }

        if let Ok(router) = self.store.get_router(src).await
            && self.sessions.contains(&router.name).await
        {
            self.push_routes(&router).await?;
        }

        Ok(count)
    }

    /// Converts a router's route slice into a `ROUTE_UPDATE` and sends it
    /// if a session is connected.
    pub async fn push_routes(&self, router: &Router) -> Result<(), Error> {
        let Some(handle) = self.sessions.get(&router.name).await else {
            return Ok(());
        };
        let entries = self.route_entries(router.id).await?;
        let msg = MessageFactory::route_update(&router.name, &entries);
        let _ = handle.tx.send(msg);
        Ok(())
    }

    /// Builds the `{dst_ip, next_hop, interfaz_salida, costo, origen_info}`
    /// slice for a router.
    pub async fn route_entries(&self, src: RouterId) -> Result<Vec<RouteEntry>, Error> {
        let routes: Vec<Route> = self.store.list_routes_from(src).await;
        let mut entries = Vec::with_capacity(routes.len());
        for route in routes {
            if route.path.len() < 2 {
                continue;
            }
            let next_hop_id = route.path[1];
            let Ok(next_hop) = self.store.get_router(next_hop_id).await else {
                continue;
            };
            let Ok(dst) = self.store.get_router(route.dst).await else {
                continue;
            };
            entries.push(RouteEntry {
                destino: dst.ip.clone(),
                next_hop: next_hop.ip.clone(),
                interfaz_salida: format!("eth_to_R{next_hop_id}"),
                costo: route.total_cost,
                origen_info: "Controller".to_owned(),
            });
        }
        Ok(entries)
    }

    /// Broadcasts the current route slice to every connected session. Each
    /// session is attempted independently; a per-session failure does not
    /// abort the broadcast.
    pub async fn broadcast_routes(&self) {
        let sessions = self.sessions.snapshot().await;
        for (name, handle) in &sessions {
            let Some(router) = self.store.get_router_by_name(name).await else {
                continue;
            };
            match self.route_entries(router.id).await {
                Ok(entries) => {
                    let msg = MessageFactory::route_update(name, &entries);
                    let _ = handle.tx.send(msg);
                }
                Err(error) => {
                    error.log();
                }
            }
        }
        Debug::BroadcastSent { sessions: sessions.len() }.log();
        info!(count = sessions.len(), "broadcast route update sent");
    }

    pub async fn shortest_path(
        &self,
        src: RouterId,
        dst: RouterId,
    ) -> (Option<Vec<RouterId>>, Option<f64>) {
        let (graph, _) = self.snapshot_graph().await;
        match sdn_graph::shortest_path(&graph, src, dst) {
            Some((path, cost)) => (Some(path), Some(cost)),
            None => (None, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdn_store::InMemoryStore;

    async fn controller() -> Controller {
        Controller::new(Arc::new(InMemoryStore::new()), SessionTable::new())
    }

    #[tokio::test]
    async fn cheaper_direct_link_beats_longer_hop_count() {
        let ctl = controller().await;
        let r1 = ctl.create_router("R1", "10.0.0.1").await.unwrap();
        let r2 = ctl.create_router("R2", "10.0.0.2").await.unwrap();
        let r3 = ctl.create_router("R3", "10.0.0.3").await.unwrap();
        ctl.create_link(r1.id, r2.id, 1.0, None, None).await.unwrap();
        ctl.create_link(r2.id, r3.id, 1.0, None, None).await.unwrap();
        ctl.create_link(r1.id, r3.id, 5.0, None, None).await.unwrap();

        let (path, cost) = ctl.shortest_path(r1.id, r3.id).await;
        assert_eq!(path, Some(vec![r1.id, r2.id, r3.id]));
        assert_eq!(cost, Some(2.0));
    }

    #[tokio::test]
    async fn route_reroutes_when_preferred_link_goes_inactive() {
        let ctl = controller().await;
        let r1 = ctl.create_router("R1", "10.0.0.1").await.unwrap();
        let r2 = ctl.create_router("R2", "10.0.0.2").await.unwrap();
        let r3 = ctl.create_router("R3", "10.0.0.3").await.unwrap();
        ctl.create_link(r1.id, r2.id, 1.0, None, None).await.unwrap();
        let l23 = ctl.create_link(r2.id, r3.id, 1.0, None, None).await.unwrap();
        ctl.create_link(r1.id, r3.id, 5.0, None, None).await.unwrap();

        ctl.set_link_state(l23.id, LinkState::Inactive).await.unwrap();

        let (path, cost) = ctl.shortest_path(r1.id, r3.id).await;
        assert_eq!(path, Some(vec![r1.id, r3.id]));
        assert_eq!(cost, Some(5.0));
    }

    #[tokio::test]
    async fn delete_router_purges_routes() {
        let ctl = controller().await;
        let r1 = ctl.create_router("R1", "10.0.0.1").await.unwrap();
        let r2 = ctl.create_router("R2", "10.0.0.2").await.unwrap();
        ctl.create_link(r1.id, r2.id, 1.0, None, None).await.unwrap();
        assert!(!ctl.store.list_routes().await.is_empty());

        ctl.delete_router(r2.id).await.unwrap();
        assert!(ctl.store.list_routes().await.is_empty());
    }

    #[tokio::test]
    async fn link_creation_fails_on_self_loop() {
        let ctl = controller().await;
        let r1 = ctl.create_router("R1", "10.0.0.1").await.unwrap();
        assert!(ctl.create_link(r1.id, r1.id, 1.0, None, None).await.is_err());
    }
}
