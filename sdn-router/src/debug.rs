//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug, debug_span};

/// Router agent debug messages, keeping warn-level `Error` logging
/// separate from debug-level `Debug` logging.
#[derive(Debug)]
pub enum Debug<'a> {
    NeighborTransition { peer: &'a str, from: &'a str, to: &'a str },
    DeadIntervalExpired { peer: &'a str },
    FibRegenerated { tag: &'a str, count: usize },
    Registered { router: &'a str },
    Reconnecting { attempt: u32 },
}

impl Debug<'_> {
    pub(crate) fn log(&self) {
        match self {
            Debug::NeighborTransition { peer, from, to } => {
                debug_span!("neighbor", peer = %peer).in_scope(|| debug!(from = %from, to = %to, "{}", self));
            }
            Debug::DeadIntervalExpired { peer } => {
                debug_span!("neighbor", peer = %peer).in_scope(|| debug!("{}", self));
            }
            Debug::FibRegenerated { tag, count } => {
                debug_span!("fib", tag = %tag).in_scope(|| debug!(%count, "{}", self));
            }
            Debug::Registered { router } => {
                debug_span!("session", router = %router).in_scope(|| debug!("{}", self));
            }
            Debug::Reconnecting { attempt } => {
                debug!(%attempt, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::NeighborTransition { .. } => write!(f, "neighbor state transition"),
            Debug::DeadIntervalExpired { .. } => write!(f, "dead interval expired"),
            Debug::FibRegenerated { .. } => write!(f, "fib slice regenerated"),
            Debug::Registered { .. } => write!(f, "registered with controller"),
            Debug::Reconnecting { .. } => write!(f, "reconnecting to controller"),
        }
    }
}
