//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

//! The control-plane wire protocol: a newline-delimited stream of JSON
//! envelopes exchanged between a Router agent and the Controller over a
//! TLS session.

pub mod codec;
pub mod error;
pub mod factory;
pub mod message;

pub use codec::{MAX_LINE_LEN, decode_line, encode_line};
pub use error::Error;
pub use factory::MessageFactory;
pub use message::{Message, MessageType};
