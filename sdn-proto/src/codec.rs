//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

//! Framing helpers for the newline-delimited JSON stream. Receivers accumulate bytes into a buffer and extract
//! complete `\n`-terminated lines; lines beyond [`MAX_LINE_LEN`] are
//! rejected and the session is torn down.

use crate::error::Error;
use crate::message::Message;

/// Implementation-defined maximum line length.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Encodes a message as a `\n`-delimited line.
pub fn encode_line(msg: &Message) -> Result<Vec<u8>, Error> {
    let bytes = msg.to_bytes()?;
    if bytes.len() > MAX_LINE_LEN {
        return Err(Error::LineTooLong(bytes.len()));
    }
    Ok(bytes)
}

/// Decodes a single already-delimited line (without the trailing `\n`).
pub fn decode_line(line: &[u8]) -> Result<Message, Error> {
    if line.len() > MAX_LINE_LEN {
        return Err(Error::LineTooLong(line.len()));
    }
    Message::from_bytes(line)
}

/// Accumulates bytes from the socket and yields complete lines, mirroring
/// the `buffer += data; while '\n' in buffer` loop of the source
/// implementation but with an upper bound on how large the buffer may grow
/// before a line is rejected outright.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        LineBuffer::default()
    }

    /// Appends freshly-read bytes and extracts every complete line now
    /// available. Returns an error (and leaves the buffer unusable) as
    /// soon as the unterminated buffer exceeds [`MAX_LINE_LEN`].
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Message>, Error> {
        self.buf.extend_from_slice(data);

        let mut messages = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = &line[..line.len() - 1];
            if line.is_empty() {
                continue;
            }
            messages.push(decode_line(line)?);
        }

        if self.buf.len() > MAX_LINE_LEN {
            return Err(Error::LineTooLong(self.buf.len()));
        }

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::MessageFactory;

    #[test]
    fn single_message_round_trips() {
        let msg = MessageFactory::heartbeat("R1");
        let bytes = encode_line(&msg).unwrap();
        let decoded = decode_line(&bytes[..bytes.len() - 1]).unwrap();
        assert_eq!(decoded.sender, "R1");
    }

    #[test]
    fn buffer_splits_on_newline_across_pushes() {
        let msg = MessageFactory::heartbeat("R1");
        let bytes = encode_line(&msg).unwrap();
        let (first, second) = bytes.split_at(bytes.len() / 2);

        let mut buf = LineBuffer::new();
        assert!(buf.push(first).unwrap().is_empty());
        let messages = buf.push(second).unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn oversized_line_is_rejected() {
        let mut buf = LineBuffer::new();
        let huge = vec![b'a'; MAX_LINE_LEN + 1];
        assert!(buf.push(&huge).is_err());
    }

    #[test]
    fn two_messages_in_one_push() {
        let a = encode_line(&MessageFactory::heartbeat("R1")).unwrap();
        let b = encode_line(&MessageFactory::heartbeat_ack("R1")).unwrap();
        let mut combined = a;
        combined.extend_from_slice(&b);

        let mut buf = LineBuffer::new();
        let messages = buf.push(&combined).unwrap();
        assert_eq!(messages.len(), 2);
    }
}
