//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

/// Protocol framing and encoding errors.
#[derive(Debug)]
pub enum Error {
    Encode(serde_json::Error),
    Decode(serde_json::Error),
    InvalidUtf8,
    LineTooLong(usize),
}

impl Error {
    pub fn log(&self) {
        match self {
            Error::Encode(error) => {
                warn!(error = %error, "failed to encode message");
            }
            Error::Decode(error) => {
                warn!(error = %error, "failed to decode message");
            }
            Error::InvalidUtf8 => {
                warn!("received non-UTF-8 line on session");
            }
            Error::LineTooLong(len) => {
                warn!(%len, "rejected line exceeding maximum length");
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Encode(..) => write!(f, "failed to encode message"),
            Error::Decode(..) => write!(f, "failed to decode message"),
            Error::InvalidUtf8 => write!(f, "line is not valid UTF-8"),
            Error::LineTooLong(len) => write!(f, "line length {len} exceeds maximum"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Encode(error) | Error::Decode(error) => Some(error),
            Error::InvalidUtf8 | Error::LineTooLong(..) => None,
        }
    }
}
