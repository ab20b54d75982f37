//! The [`Encode`] and [`Decode`] traits plus implementations for the
//! primitive and composite value types the protocol is built from.
//!
//! Wire conventions:
//! - integers and floats: fixed-width big endian
//! - strings: 4-byte length + raw UTF-8 bytes
//! - sequences: 4-byte count + elements (map entries as key then value)
//!
//! Encoding is infallible — any value the type system admits has a byte
//! representation. Decoding is fallible because the bytes are untrusted.

use std::collections::{BTreeMap, BTreeSet};

use crate::{CodecError, RxBuffer, TxBuffer};

/// A value that can be written to a [`TxBuffer`].
pub trait Encode {
    fn encode(&self, tx: &mut TxBuffer);
}

/// A value that can be read back from an [`RxBuffer`].
///
/// Implementations must consume exactly the bytes they wrote in
/// [`Encode`], and must fail with [`CodecError`] — never panic — on
/// malformed input.
pub trait Decode: Sized {
    fn decode(rx: &mut RxBuffer) -> Result<Self, CodecError>;
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

macro_rules! primitive_codec {
    ($($ty:ty => $put:ident, $read:ident;)+) => {
        $(
            impl Encode for $ty {
                fn encode(&self, tx: &mut TxBuffer) {
                    tx.$put(*self);
                }
            }

            impl Decode for $ty {
                fn decode(rx: &mut RxBuffer) -> Result<Self, CodecError> {
                    rx.$read()
                }
            }
        )+
    };
}

primitive_codec! {
    u8  => put_u8,  read_u8;
    i8  => put_i8,  read_i8;
    u16 => put_u16, read_u16;
    i16 => put_i16, read_i16;
    u32 => put_u32, read_u32;
    i32 => put_i32, read_i32;
    u64 => put_u64, read_u64;
    i64 => put_i64, read_i64;
    f32 => put_f32, read_f32;
    f64 => put_f64, read_f64;
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

impl Encode for str {
    fn encode(&self, tx: &mut TxBuffer) {
        tx.put_u32(self.len() as u32);
        tx.push_raw(self.as_bytes());
    }
}

impl Encode for String {
    fn encode(&self, tx: &mut TxBuffer) {
        self.as_str().encode(tx);
    }
}

impl Decode for String {
    fn decode(rx: &mut RxBuffer) -> Result<Self, CodecError> {
        let len = rx.read_u32()? as usize;
        let raw = rx.read_raw(len)?;
        String::from_utf8(raw)
            .map_err(|_| CodecError::invalid("string is not valid UTF-8"))
    }
}

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

/// Caps `reserve` calls for decoded sequences: the advertised count is
/// attacker-controlled, so capacity is bounded by what the buffer could
/// possibly hold (every element takes at least one byte).
fn safe_capacity(count: usize, remaining: usize) -> usize {
    count.min(remaining)
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, tx: &mut TxBuffer) {
        tx.put_u32(self.len() as u32);
        for element in self {
            element.encode(tx);
        }
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(rx: &mut RxBuffer) -> Result<Self, CodecError> {
        let count = rx.read_u32()? as usize;
        let mut result = Vec::with_capacity(safe_capacity(count, rx.remaining()));
        for _ in 0..count {
            result.push(T::decode(rx)?);
        }
        Ok(result)
    }
}

impl<T: Encode> Encode for BTreeSet<T> {
    fn encode(&self, tx: &mut TxBuffer) {
        tx.put_u32(self.len() as u32);
        for element in self {
            element.encode(tx);
        }
    }
}

impl<T: Decode + Ord> Decode for BTreeSet<T> {
    fn decode(rx: &mut RxBuffer) -> Result<Self, CodecError> {
        let count = rx.read_u32()? as usize;
        let mut result = BTreeSet::new();
        for _ in 0..count {
            result.insert(T::decode(rx)?);
        }
        Ok(result)
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self, tx: &mut TxBuffer) {
        tx.put_u32(self.len() as u32);
        for (key, value) in self {
            key.encode(tx);
            value.encode(tx);
        }
    }
}

impl<K: Decode + Ord, V: Decode> Decode for BTreeMap<K, V> {
    fn decode(rx: &mut RxBuffer) -> Result<Self, CodecError> {
        let count = rx.read_u32()? as usize;
        let mut result = BTreeMap::new();
        for _ in 0..count {
            let key = K::decode(rx)?;
            let value = V::decode(rx)?;
            result.insert(key, value);
        }
        Ok(result)
    }
}

// =========================================================================
// Tests
// =========================================================================
