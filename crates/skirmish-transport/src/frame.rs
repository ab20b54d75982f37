//! Length-prefix framing, independent of any socket.
//!
//! A frame on the wire is `[4-byte big-endian length][payload]`. The queue
//! holds an inbound buffer of raw received bytes and an outbound buffer of
//! fully framed bytes waiting for the socket to accept them.

use skirmish_codec::{RxBuffer, TxBuffer};

/// Framing state for one connection: raw bytes in, whole messages out.
#[derive(Debug, Default)]
pub struct FrameQueue {
    inbound: RxBuffer,
    outbound: TxBuffer,
}

impl FrameQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends bytes read from the socket, in whatever chunking they came.
    pub fn push_inbound(&mut self, bytes: &[u8]) {
        self.inbound.push_raw(bytes);
    }

    /// Returns `true` once the inbound buffer holds a complete frame:
    /// a 4-byte length prefix plus that many payload bytes.
    pub fn has_frame(&self) -> bool {
        match self.inbound.peek_u32() {
            Ok(payload_len) => {
                self.inbound.remaining() >= 4 + payload_len as usize
            }
            Err(_) => false,
        }
    }

    /// Extracts and removes exactly one frame's payload, if complete.
    pub fn next_frame(&mut self) -> Option<RxBuffer> {
        if !self.has_frame() {
            return None;
        }
        // has_frame() guarantees the prefix and payload are present.
        let payload_len = self
            .inbound
            .peek_u32()
            .expect("checked by has_frame") as usize;
        self.inbound.pop(4);
        let payload = RxBuffer::from_bytes(&self.inbound.as_bytes()[..payload_len]);
        self.inbound.pop(payload_len);
        self.inbound.maybe_compact();
        Some(payload)
    }

    /// Queues one message for sending: length prefix, then payload.
    pub fn queue_frame(&mut self, message: &TxBuffer) {
        self.outbound.put_u32(message.len() as u32);
        self.outbound.push_raw(message.as_bytes());
    }

    /// Bytes waiting to go out, front first.
    pub fn outbound_bytes(&self) -> &[u8] {
        self.outbound.as_bytes()
    }

    /// Removes bytes the socket actually accepted.
    pub fn consume_outbound(&mut self, num_bytes: usize) {
        self.outbound.pop(num_bytes);
        self.outbound.maybe_compact();
    }

    /// Returns `true` when nothing is waiting to be sent.
    pub fn outbound_is_empty(&self) -> bool {
        self.outbound.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
