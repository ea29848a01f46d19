//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

//! The router agent: local neighbor/FIB state, an OSPF-like adjacency
//! simulator, and the TLS session client toward the Controller.

pub mod client;
pub mod core;
pub mod debug;
pub mod error;
pub mod ospf;

pub use client::SessionClient;
pub use core::RouterAgent;
pub use error::Error;
pub use ospf::OspfSimulator;
