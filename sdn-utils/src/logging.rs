//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

//! Tracing setup shared by both binaries. File/journald layers are an
//! operational concern outside this crate's scope; only the stdout +
//! `EnvFilter` layering is kept.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initializes the global tracing subscriber. Safe to call once per
/// process; panics if a subscriber is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sdn=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
