//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug, debug_span};

/// Controller debug messages, logged through `tracing::debug!` to keep
/// high-volume/low-detail `Error` logging separate from low-volume/
/// high-detail `Debug` logging.
#[derive(Debug)]
pub enum Debug<'a> {
    SessionRegistered(&'a str),
    SessionClosed(&'a str),
    RouteRecomputed { scope: &'a str, count: usize },
    BroadcastSent { sessions: usize },
}

impl Debug<'_> {
    pub(crate) fn log(&self) {
        match self {
            Debug::SessionRegistered(name) => {
                debug_span!("session", router = %name).in_scope(|| debug!("{}", self));
            }
            Debug::SessionClosed(name) => {
                debug_span!("session", router = %name).in_scope(|| debug!("{}", self));
            }
            Debug::RouteRecomputed { scope, count } => {
                debug_span!("recompute", scope = %scope).in_scope(|| debug!(%count, "{}", self));
            }
            Debug::BroadcastSent { sessions } => {
                debug!(%sessions, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::SessionRegistered(..) => write!(f, "session registered"),
            Debug::SessionClosed(..) => write!(f, "session closed"),
            Debug::RouteRecomputed { .. } => write!(f, "routes recomputed"),
            Debug::BroadcastSent { .. } => write!(f, "route update broadcast sent"),
        }
    }
}
