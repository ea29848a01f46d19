//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

//! Router identity and the canonical compact path string (`R1->R3->R5`).

use std::fmt;

/// A router's numeric identity, as assigned by the Controller operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouterId(pub i64);

impl fmt::Display for RouterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RouterId {
    fn from(id: i64) -> Self {
        RouterId(id)
    }
}

/// Error returned by [`parse_path`] when the input isn't a well-formed
/// canonical path string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParseError(pub String);

impl fmt::Display for PathParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed path string: {}", self.0)
    }
}

impl std::error::Error for PathParseError {}

/// Formats a sequence of router ids as `R<id1>-><id2>-><id3>`.
pub fn format_path(path: &[RouterId]) -> String {
    path.iter()
        .map(|id| format!("R{id}"))
        .collect::<Vec<_>>()
        .join("->")
}

/// Parses the inverse of [`format_path`]. Every segment must begin with
/// `R` followed by an integer.
pub fn parse_path(s: &str) -> Result<Vec<RouterId>, PathParseError> {
    if s.is_empty() {
        return Err(PathParseError(s.to_owned()));
    }
    s.split("->")
        .map(|segment| {
            let digits = segment
                .strip_prefix('R')
                .ok_or_else(|| PathParseError(s.to_owned()))?;
            digits
                .parse::<i64>()
                .map(RouterId)
                .map_err(|_| PathParseError(s.to_owned()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let path = vec![RouterId(1), RouterId(3), RouterId(5)];
        let formatted = format_path(&path);
        assert_eq!(formatted, "R1->R3->R5");
        assert_eq!(parse_path(&formatted).unwrap(), path);
    }

    #[test]
    fn round_trip_single() {
        let path = vec![RouterId(42)];
        assert_eq!(parse_path(&format_path(&path)).unwrap(), path);
    }

    #[test]
    fn rejects_malformed_segment() {
        assert!(parse_path("R1->3->R5").is_err());
        assert!(parse_path("").is_err());
    }
}
