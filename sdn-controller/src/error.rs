//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

/// Controller-side errors.
#[derive(Debug)]
pub enum Error {
    Store(sdn_store::Error),
    Protocol(sdn_proto::Error),
    Transport(std::io::Error),
    RouteUnavailable,
    SessionNotFound(String),
}

impl Error {
    pub fn log(&self) {
        match self {
            Error::Store(error) => error.log(),
            Error::Protocol(error) => error.log(),
            Error::Transport(error) => {
                warn!(error = %error, "transport error");
            }
            Error::RouteUnavailable => {
                warn!("no route available for requested destination");
            }
            Error::SessionNotFound(name) => {
                warn!(%name, "session not found");
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Store(error) => error.fmt(f),
            Error::Protocol(error) => error.fmt(f),
            Error::Transport(error) => write!(f, "transport error: {error}"),
            Error::RouteUnavailable => write!(f, "no route available"),
            Error::SessionNotFound(name) => write!(f, "no session for router {name}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Store(error) => Some(error),
            Error::Protocol(error) => Some(error),
            Error::Transport(error) => Some(error),
            Error::RouteUnavailable | Error::SessionNotFound(..) => None,
        }
    }
}

impl From<sdn_store::Error> for Error {
    fn from(error: sdn_store::Error) -> Error {
        Error::Store(error)
    }
}

impl From<sdn_proto::Error> for Error {
    fn from(error: sdn_proto::Error) -> Error {
        Error::Protocol(error)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Error {
        Error::Transport(error)
    }
}
