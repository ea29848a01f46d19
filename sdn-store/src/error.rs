//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug, warn};

/// Store-layer error kinds.
#[derive(Debug)]
pub enum Error {
    DuplicateName(String),
    DuplicateIp(String),
    SelfLoop,
    DuplicateLink,
    UnknownRouter,
    ValidationError(String),
    NotFound(String),
    PersistenceError(String),
}

impl Error {
    pub fn log(&self) {
        match self {
            Error::DuplicateName(..)
            | Error::DuplicateIp(..)
            | Error::SelfLoop
            | Error::DuplicateLink
            | Error::UnknownRouter
            | Error::ValidationError(..) => {
                debug!(error = %self, "store precondition failed");
            }
            Error::NotFound(..) => {
                debug!(error = %self, "store entity not found");
            }
            Error::PersistenceError(..) => {
                warn!(error = %self, "store operation failed");
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::DuplicateName(name) => write!(f, "router name already in use: {name}"),
            Error::DuplicateIp(ip) => write!(f, "router ip already in use: {ip}"),
            Error::SelfLoop => write!(f, "link endpoints must differ"),
            Error::DuplicateLink => write!(f, "a link between these routers already exists"),
            Error::UnknownRouter => write!(f, "unknown router id"),
            Error::ValidationError(msg) => write!(f, "validation error: {msg}"),
            Error::NotFound(what) => write!(f, "not found: {what}"),
            Error::PersistenceError(msg) => write!(f, "persistence error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
