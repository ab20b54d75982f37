//! A framed message connection over non-blocking TCP.

use std::time::Duration;

use skirmish_codec::{RxBuffer, TxBuffer};
use tokio::net::TcpStream;
use tokio::time::Instant;

use crate::{FrameQueue, TransportError};

/// The fixed interval at which connection workers poll their transport.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Size of the stack buffer used for each non-blocking read.
const READ_CHUNK: usize = 8 * 1024;

/// One duplex connection carrying length-framed messages.
///
/// All I/O is non-blocking and driven by [`poll`](Self::poll): a poll
/// reads whatever bytes are available, then writes as much buffered
/// outbound data as the socket accepts. Once the peer closes the
/// connection the transport is permanently disconnected — sends become
/// no-ops, but frames already buffered can still be received.
pub struct MessageTransport {
    stream: TcpStream,
    frames: FrameQueue,
    connected: bool,
}

impl MessageTransport {
    /// Wraps an accepted or connected TCP stream.
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            frames: FrameQueue::new(),
            connected: true,
        }
    }

    /// Connects to a remote address (client side).
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(TransportError::Io)?;
        Ok(Self::new(stream))
    }

    /// Returns `false` once the peer has disconnected.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Moves bytes between the socket and the frame buffers.
    ///
    /// Never blocks. A read of zero bytes means the peer closed the
    /// connection; a `WouldBlock` on either direction just means
    /// "nothing to do right now".
    pub fn poll(&mut self) -> Result<(), TransportError> {
        if !self.connected {
            return Ok(());
        }

        let mut chunk = [0u8; READ_CHUNK];
        match self.stream.try_read(&mut chunk) {
            Ok(0) => {
                tracing::debug!("peer closed the connection");
                self.connected = false;
                return Ok(());
            }
            Ok(n) => self.frames.push_inbound(&chunk[..n]),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
            Err(e) => {
                tracing::debug!(error = %e, "read failed, dropping connection");
                self.connected = false;
                return Err(TransportError::Io(e));
            }
        }

        if !self.frames.outbound_is_empty() {
            match self.stream.try_write(self.frames.outbound_bytes()) {
                Ok(n) => self.frames.consume_outbound(n),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    self.connected = false;
                }
                Err(e) => {
                    self.connected = false;
                    return Err(TransportError::Io(e));
                }
            }
        }

        Ok(())
    }

    /// Returns `true` once a whole message is buffered.
    pub fn has_message(&self) -> bool {
        self.frames.has_frame()
    }

    /// Extracts exactly one buffered message, if complete.
    ///
    /// Works even after a disconnect — messages that arrived before the
    /// peer went away are still delivered.
    pub fn receive(&mut self) -> Option<RxBuffer> {
        self.frames.next_frame()
    }

    /// Queues one message for sending. No-op after disconnect.
    pub fn send(&mut self, message: &TxBuffer) {
        if !self.connected {
            return;
        }
        self.frames.queue_frame(message);
    }

    /// Polls at the fixed interval until a whole message arrives or the
    /// deadline passes.
    ///
    /// This is the only place the transport waits: it exists for
    /// synchronous exchanges such as the version handshake.
    pub async fn wait_for_message(
        &mut self,
        timeout: Duration,
    ) -> Result<RxBuffer, TransportError> {
        let deadline = Instant::now() + timeout;
        loop {
            self.poll()?;
            if let Some(message) = self.receive() {
                return Ok(message);
            }
            if !self.connected {
                return Err(TransportError::Disconnected);
            }
            if Instant::now() >= deadline {
                return Err(TransportError::Timeout);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}
