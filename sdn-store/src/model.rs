//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

//! Record types for every entity the store tracks.

use chrono::{DateTime, Utc};
use sdn_utils::RouterId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouterState {
    Active,
    Inactive,
    Maintenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Router {
    pub id: RouterId,
    pub name: String,
    pub ip: String,
    pub state: RouterState,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkState {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId(pub i64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub a: RouterId,
    pub b: RouterId,
    pub cost: f64,
    pub bandwidth: Option<f64>,
    pub delay_ms: Option<f64>,
    pub state: LinkState,
}

impl Link {
    /// The unordered endpoint pair, used to enforce "at most one link
    /// between any unordered pair".
    pub fn unordered_pair(&self) -> (RouterId, RouterId) {
        if self.a <= self.b {
            (self.a, self.b)
        } else {
            (self.b, self.a)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteId(pub i64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub src: RouterId,
    pub dst: RouterId,
    pub path: Vec<RouterId>,
    pub total_cost: f64,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeighborState {
    Down,
    TwoWay,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NeighborId(pub i64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: NeighborId,
    pub peer_name: String,
    pub peer_ip: String,
    pub state: NeighborState,
    pub link_cost: f64,
    pub last_hello: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FibSource {
    Internal,
    Controller,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FibEntryId(pub i64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibEntry {
    pub id: FibEntryId,
    pub dst_ip: String,
    pub next_hop_ip: String,
    pub egress_iface: String,
    pub total_cost: f64,
    pub source: FibSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageLogEntry {
    pub id: i64,
    pub msg_type: String,
    pub sender: String,
    pub receiver: String,
    pub body: Value,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: i64,
    pub event: String,
    pub detail: String,
    pub at: DateTime<Utc>,
}
