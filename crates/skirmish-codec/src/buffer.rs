//! Network byte buffers.
//!
//! Both buffers have FIFO queue semantics — bytes are appended at the back
//! and consumed from the front — but are backed by a plain `Vec<u8>` so a
//! contiguous slice of the live bytes is always available for socket I/O.
//! Consumption advances a front cursor instead of shifting the vector;
//! [`maybe_compact`](TxBuffer::maybe_compact) reclaims the dead prefix once
//! it dominates the allocation.

use crate::CodecError;

/// Shared FIFO core for [`TxBuffer`] and [`RxBuffer`].
#[derive(Debug, Clone, Default)]
struct ByteQueue {
    store: Vec<u8>,
    /// Index of the first live byte in `store`.
    front: usize,
}

impl ByteQueue {
    fn push_raw(&mut self, bytes: &[u8]) {
        self.store.extend_from_slice(bytes);
    }

    fn as_bytes(&self) -> &[u8] {
        &self.store[self.front..]
    }

    fn len(&self) -> usize {
        self.store.len() - self.front
    }

    fn pop(&mut self, num_bytes: usize) {
        debug_assert!(self.front + num_bytes <= self.store.len());
        self.front += num_bytes;
    }

    fn compact(&mut self) {
        self.store.drain(..self.front);
        self.store.shrink_to_fit();
        self.front = 0;
    }

    /// Compacts only when the consumed prefix is at least as large as the
    /// live contents, so repeated small pops stay O(1) amortized.
    fn maybe_compact(&mut self) {
        if self.store.len() >= 2 * self.len() {
            self.compact();
        }
    }
}

// ---------------------------------------------------------------------------
// TxBuffer
// ---------------------------------------------------------------------------

/// Buffer for data to be sent over the network.
///
/// Values are appended in network byte order (big endian). The transport
/// layer drains the front as the socket accepts bytes.
#[derive(Debug, Clone, Default)]
pub struct TxBuffer {
    queue: ByteQueue,
}

impl TxBuffer {
    /// Creates a new, empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw bytes without any byte-order conversion.
    pub fn push_raw(&mut self, bytes: &[u8]) {
        self.queue.push_raw(bytes);
    }

    pub fn put_u8(&mut self, value: u8) {
        self.queue.push_raw(&value.to_be_bytes());
    }

    pub fn put_u16(&mut self, value: u16) {
        self.queue.push_raw(&value.to_be_bytes());
    }

    pub fn put_u32(&mut self, value: u32) {
        self.queue.push_raw(&value.to_be_bytes());
    }

    pub fn put_u64(&mut self, value: u64) {
        self.queue.push_raw(&value.to_be_bytes());
    }

    pub fn put_i8(&mut self, value: i8) {
        self.put_u8(value as u8);
    }

    pub fn put_i16(&mut self, value: i16) {
        self.put_u16(value as u16);
    }

    pub fn put_i32(&mut self, value: i32) {
        self.put_u32(value as u32);
    }

    pub fn put_i64(&mut self, value: i64) {
        self.put_u64(value as u64);
    }

    pub fn put_f32(&mut self, value: f32) {
        self.put_u32(value.to_bits());
    }

    pub fn put_f64(&mut self, value: f64) {
        self.put_u64(value.to_bits());
    }

    /// Encodes a value at the back of the buffer.
    pub fn write<T: crate::Encode + ?Sized>(&mut self, value: &T) {
        value.encode(self);
    }

    /// The live bytes, front first — exactly what should go on the wire next.
    pub fn as_bytes(&self) -> &[u8] {
        self.queue.as_bytes()
    }

    /// Number of live bytes.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.len() == 0
    }

    /// Removes `num_bytes` from the front (bytes the socket accepted).
    pub fn pop(&mut self, num_bytes: usize) {
        self.queue.pop(num_bytes);
    }

    /// Reclaims consumed capacity when worthwhile.
    pub fn maybe_compact(&mut self) {
        self.queue.maybe_compact();
    }
}

// ---------------------------------------------------------------------------
// RxBuffer
// ---------------------------------------------------------------------------

/// Buffer for data received from the network.
///
/// Bytes arrive in network order; typed reads convert to host order and
/// consume from the front. Every read is bounds-checked — a short buffer
/// yields [`CodecError::Insufficient`], never a panic, since the contents
/// are untrusted.
#[derive(Debug, Clone, Default)]
pub struct RxBuffer {
    queue: ByteQueue,
}

impl RxBuffer {
    /// Creates a new, empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a buffer holding a copy of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut rx = Self::new();
        rx.push_raw(bytes);
        rx
    }

    /// Appends raw received bytes at the back.
    pub fn push_raw(&mut self, bytes: &[u8]) {
        self.queue.push_raw(bytes);
    }

    /// The unread bytes, front first.
    pub fn as_bytes(&self) -> &[u8] {
        self.queue.as_bytes()
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.len() == 0
    }

    /// Discards `num_bytes` from the front.
    pub fn pop(&mut self, num_bytes: usize) {
        self.queue.pop(num_bytes);
    }

    /// Reclaims consumed capacity when worthwhile.
    pub fn maybe_compact(&mut self) {
        self.queue.maybe_compact();
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        if self.remaining() < N {
            return Err(CodecError::Insufficient);
        }
        let mut raw = [0u8; N];
        raw.copy_from_slice(&self.as_bytes()[..N]);
        self.pop(N);
        Ok(raw)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(u8::from_be_bytes(self.take::<1>()?))
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_be_bytes(self.take::<2>()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_be_bytes(self.take::<4>()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_be_bytes(self.take::<8>()?))
    }

    pub fn read_i8(&mut self) -> Result<i8, CodecError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_i16(&mut self) -> Result<i16, CodecError> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        Ok(self.read_u64()? as i64)
    }

    pub fn read_f32(&mut self) -> Result<f32, CodecError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, CodecError> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Reads `num_bytes` raw bytes from the front.
    pub fn read_raw(&mut self, num_bytes: usize) -> Result<Vec<u8>, CodecError> {
        if self.remaining() < num_bytes {
            return Err(CodecError::Insufficient);
        }
        let raw = self.as_bytes()[..num_bytes].to_vec();
        self.pop(num_bytes);
        Ok(raw)
    }

    /// Reads a `u32` at the front without consuming it.
    ///
    /// Used by the transport to inspect a frame's length prefix before the
    /// whole frame has arrived.
    pub fn peek_u32(&self) -> Result<u32, CodecError> {
        let bytes = self.as_bytes();
        if bytes.len() < 4 {
            return Err(CodecError::Insufficient);
        }
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&bytes[..4]);
        Ok(u32::from_be_bytes(raw))
    }

    /// Decodes a value from the front of the buffer.
    pub fn read<T: crate::Decode>(&mut self) -> Result<T, CodecError> {
        T::decode(self)
    }
}
