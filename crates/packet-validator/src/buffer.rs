//! Fixed-Capacity Packet Buffer

use tracing::warn;

/// Maximum number of bytes a single packet may occupy
pub const PACKET_CAPACITY: usize = 256;

/// Scratch buffer for one received packet.
///
/// `len` is the only trusted bound: bytes past it are stale and never exposed.
#[derive(Clone)]
pub struct PacketBuffer {
    data: [u8; PACKET_CAPACITY],
    len: usize,
}

impl PacketBuffer {
    pub fn new() -> Self {
        Self {
            data: [0; PACKET_CAPACITY],
            len: 0,
        }
    }

    /// Buffer holding a copy of `bytes`, truncated to capacity
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut buffer = Self::new();
        buffer.receive(|space| {
            let n = bytes.len().min(space.len());
            space[..n].copy_from_slice(&bytes[..n]);
            bytes.len()
        });
        buffer
    }

    /// Let `writer` fill the whole backing array and report how many bytes it wrote.
    ///
    /// A report larger than the capacity is clamped. Returns the trusted length.
    pub fn receive<F>(&mut self, writer: F) -> usize
    where
        F: FnOnce(&mut [u8]) -> usize,
    {
        let reported = writer(&mut self.data);
        if reported > PACKET_CAPACITY {
            warn!(
                "Packet source reported {} bytes, truncated to {}",
                reported, PACKET_CAPACITY
            );
        }
        self.len = reported.min(PACKET_CAPACITY);
        self.len
    }

    /// The received bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        PACKET_CAPACITY
    }

    /// Forget the current contents
    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl Default for PacketBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PacketBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketBuffer")
            .field("len", &self.len)
            .field("data", &self.as_slice())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receive_exposes_only_written_bytes() {
        let mut buffer = PacketBuffer::new();
        buffer.receive(|space| {
            space[..4].copy_from_slice(&[1, 2, 3, 4]);
            4
        });
        // Shorter packet reuses the scratch space; the stale tail stays hidden
        let len = buffer.receive(|space| {
            space[0] = 9;
            1
        });
        assert_eq!(len, 1);
        assert_eq!(buffer.as_slice(), &[9]);
    }

    #[test]
    fn test_oversized_report_is_clamped() {
        let mut buffer = PacketBuffer::new();
        let len = buffer.receive(|_| PACKET_CAPACITY * 2);
        assert_eq!(len, PACKET_CAPACITY);
        assert_eq!(buffer.as_slice().len(), PACKET_CAPACITY);
    }

    #[test]
    fn test_from_slice_and_clear() {
        let mut buffer = PacketBuffer::from_slice(&[0x10, 0x00]);
        assert_eq!(buffer.len(), 2);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), PACKET_CAPACITY);
    }
}
