//! Parcel encoding: embeds compositor object references for transfer to the
//! guest.
//!
//! Layout: 16-byte header `{payload_size, payload_offset, objects_size,
//! objects_offset}`, then the payload bytes, then a 4-byte-stride table of
//! payload offsets locating each embedded object record.

use bytes::BufMut;

use crate::layer::ProducerToken;

const HEADER_SIZE: usize = 16;
const STRONG_BINDER: u32 = 2;

/// Binary container for a capability reference plus its interface tag.
/// Built once per encode call; immutable after [`Parcel::finish`].
pub struct Parcel {
    payload: Vec<u8>,
    objects: Vec<u8>,
}

impl Parcel {
    pub fn new(payload_capacity: usize, objects_capacity: usize) -> Self {
        Self {
            payload: Vec::with_capacity(payload_capacity),
            objects: Vec::with_capacity(objects_capacity),
        }
    }

    /// Appends one object record: strong-binder descriptor, producer token,
    /// ASCII interface tag, zero cookie. The record's payload offset is
    /// pushed onto the object table.
    pub fn write_object(&mut self, token: ProducerToken, tag: &str) {
        self.objects.put_u32_le(self.payload.len() as u32);

        self.payload.put_u32_le(STRONG_BINDER);
        self.payload.put_u32_le(0); // flags
        self.payload.put_i64_le(token.0);
        self.payload.put_slice(tag.as_bytes());
        while self.payload.len() % 4 != 0 {
            self.payload.put_u8(0);
        }
        self.payload.put_u64_le(0); // cookie
    }

    /// Serializes header + payload + object table.
    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.payload.len() + self.objects.len());
        out.put_u32_le(self.payload.len() as u32);
        out.put_u32_le(HEADER_SIZE as u32);
        out.put_u32_le(self.objects.len() as u32);
        out.put_u32_le((HEADER_SIZE + self.payload.len()) as u32);
        out.put_slice(&self.payload);
        out.put_slice(&self.objects);
        out
    }
}
