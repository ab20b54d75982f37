//! The protocol entity: one connection's message pump and phase filter.
//!
//! A connection handler changes which messages are acceptable as the
//! session moves through its phases. Rather than scattering that logic
//! through the handler, the entity carries a whitelist and a blacklist of
//! tags and turns everything arriving on the transport into a stream of
//! [`Event`]s: decoded messages, protocol violations, a disconnect, or an
//! idle timeout.

use std::collections::HashSet;
use std::time::Duration;

use skirmish_codec::{RxBuffer, TxBuffer};
use skirmish_transport::MessageTransport;
use tokio::time::Instant;

use crate::messages::{Message, MessageTag};
use crate::ProtocolError;

/// Something that happened on the connection since the last poll.
#[derive(Debug)]
pub enum Event {
    /// A well-formed, currently-permitted message.
    Message(Message),
    /// The peer broke the rules; the message (if any) was not delivered.
    ProtocolError(ProtocolError),
    /// The peer went away. The entity has halted.
    Disconnected,
    /// Nothing arrived within the idle timeout. The entity has halted.
    TimedOut,
}

/// Per-connection protocol state on top of a [`MessageTransport`].
pub struct ProtocolEntity {
    transport: MessageTransport,
    /// When non-empty, only these tags are accepted.
    whitelist: HashSet<MessageTag>,
    /// Always rejected, and checked before the whitelist.
    blacklist: HashSet<MessageTag>,
    idle_timeout: Duration,
    idle_deadline: Instant,
    running: bool,
}

impl ProtocolEntity {
    /// Wraps a transport that has already completed its handshake.
    pub fn new(transport: MessageTransport, idle_timeout: Duration) -> Self {
        Self {
            transport,
            whitelist: HashSet::new(),
            blacklist: HashSet::new(),
            idle_timeout,
            idle_deadline: Instant::now() + idle_timeout,
            running: true,
        }
    }

    /// Replaces the whitelist. An empty list accepts every tag not
    /// blacklisted.
    pub fn permit_only(&mut self, tags: impl IntoIterator<Item = MessageTag>) {
        self.whitelist = tags.into_iter().collect();
    }

    /// Replaces the blacklist.
    pub fn forbid(&mut self, tags: impl IntoIterator<Item = MessageTag>) {
        self.blacklist = tags.into_iter().collect();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stops processing. Queued outbound bytes may still be flushed by the
    /// transport's owner before the socket drops.
    pub fn halt(&mut self) {
        self.running = false;
    }

    /// Queues a message for sending.
    pub fn send(&mut self, message: &Message) {
        let mut tx = TxBuffer::new();
        tx.write(message);
        self.transport.send(&tx);
    }

    /// Pumps the transport once and reports everything that happened.
    ///
    /// Returns an empty list after a halt. Any received frame re-arms the
    /// idle deadline, even one that is rejected.
    pub fn poll(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if !self.running {
            return events;
        }

        if let Err(e) = self.transport.poll() {
            // The transport has marked itself disconnected; the event is
            // pushed below after buffered frames are drained.
            events.push(Event::ProtocolError(e.into()));
        }

        while let Some(frame) = self.transport.receive() {
            self.idle_deadline = Instant::now() + self.idle_timeout;
            match self.classify(frame) {
                Ok(message) => events.push(Event::Message(message)),
                Err(e) => events.push(Event::ProtocolError(e)),
            }
        }

        if !self.transport.is_connected() {
            self.running = false;
            events.push(Event::Disconnected);
        } else if Instant::now() >= self.idle_deadline {
            self.running = false;
            events.push(Event::TimedOut);
        }
        events
    }

    /// Gives the transport a final chance to flush queued outbound bytes,
    /// e.g. a farewell alert sent just before a halt.
    pub fn flush(&mut self) -> Result<(), ProtocolError> {
        self.transport.poll().map_err(ProtocolError::from)
    }

    fn classify(&self, mut frame: RxBuffer) -> Result<Message, ProtocolError> {
        let tag = MessageTag::from_u32(frame.read_u32()?);
        if self.blacklist.contains(&tag) {
            return Err(ProtocolError::Rejected { tag });
        }
        if !self.whitelist.is_empty() && !self.whitelist.contains(&tag) {
            return Err(ProtocolError::Rejected { tag });
        }
        let message = Message::decode_body(tag, &mut frame)?;
        if !frame.is_empty() {
            return Err(ProtocolError::TrailingBytes);
        }
        Ok(message)
    }
}

// =========================================================================
// Tests
// =========================================================================
