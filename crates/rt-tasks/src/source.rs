//! Packet Sources
//!
//! Stand-ins for a network driver. A source writes at most one packet into
//! the space it is given and reports how many bytes it produced.

use crate::config::PacketSourceKind;
use crate::sim::SimRng;
use packet_validator::{encode_remaining_length, PACKET_CAPACITY};
use std::collections::VecDeque;

/// Non-blocking supplier of inbound packets
pub trait PacketSource: Send {
    /// Write one packet into `space` and return its length; 0 means nothing arrived.
    ///
    /// The return value is not trusted: a report larger than `space` is clamped.
    fn poll(&mut self, space: &mut [u8]) -> usize;
}

impl<P: PacketSource + ?Sized> PacketSource for Box<P> {
    fn poll(&mut self, space: &mut [u8]) -> usize {
        (**self).poll(space)
    }
}

/// Delivers the same 14-byte CONNECT-style frame on every poll
#[derive(Debug, Clone, Default)]
pub struct ConnectPacketSource;

impl ConnectPacketSource {
    pub const PACKET_LEN: usize = 14;
}

impl PacketSource for ConnectPacketSource {
    fn poll(&mut self, space: &mut [u8]) -> usize {
        if space.len() < Self::PACKET_LEN {
            return 0;
        }
        // Type code 1 (CONNECT), remaining length 12, payload 2..=13
        space[0] = 0x10;
        space[1] = 12;
        for (i, byte) in space[2..Self::PACKET_LEN].iter_mut().enumerate() {
            *byte = (i + 2) as u8;
        }
        Self::PACKET_LEN
    }
}

/// Never delivers anything
#[derive(Debug, Clone, Default)]
pub struct SilentSource;

impl PacketSource for SilentSource {
    fn poll(&mut self, _space: &mut [u8]) -> usize {
        0
    }
}

/// Replays a queue of packets, then goes silent
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    packets: VecDeque<Vec<u8>>,
}

impl ScriptedSource {
    pub fn new<I>(packets: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        Self {
            packets: packets.into_iter().collect(),
        }
    }

    /// Packets not yet delivered
    pub fn remaining(&self) -> usize {
        self.packets.len()
    }
}

impl PacketSource for ScriptedSource {
    fn poll(&mut self, space: &mut [u8]) -> usize {
        let Some(packet) = self.packets.pop_front() else {
            return 0;
        };
        let n = packet.len().min(space.len());
        space[..n].copy_from_slice(&packet[..n]);
        packet.len()
    }
}

/// Random traffic, including lengths beyond the buffer capacity.
///
/// Roughly a quarter of the packets are built as well-formed frames so the
/// accept paths are exercised too.
#[derive(Debug, Clone)]
pub struct FuzzSource {
    rng: SimRng,
}

impl FuzzSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SimRng::new(seed),
        }
    }

    fn random_bytes(&mut self, space: &mut [u8]) -> usize {
        let reported = 1 + self.rng.below(2 * PACKET_CAPACITY as u64) as usize;
        let n = reported.min(space.len());
        for byte in &mut space[..n] {
            *byte = self.rng.next_u64() as u8;
        }
        reported
    }

    fn well_formed(&mut self, space: &mut [u8]) -> usize {
        let type_code = 1 + self.rng.below(14) as u8;
        let flags = self.rng.below(16) as u8;
        let body = self.rng.below(64) as u32;
        let Some(field) = encode_remaining_length(body) else {
            return 0;
        };
        let len = 1 + field.len() + body as usize;
        if len > space.len() {
            return 0;
        }
        space[0] = (type_code << 4) | flags;
        space[1..1 + field.len()].copy_from_slice(&field);
        for byte in &mut space[1 + field.len()..len] {
            *byte = self.rng.next_u64() as u8;
        }
        len
    }
}

impl PacketSource for FuzzSource {
    fn poll(&mut self, space: &mut [u8]) -> usize {
        if self.rng.below(4) == 0 {
            self.well_formed(space)
        } else {
            self.random_bytes(space)
        }
    }
}

/// Build the source selected in configuration
pub fn packet_source(kind: PacketSourceKind, seed: u64) -> Box<dyn PacketSource> {
    match kind {
        PacketSourceKind::Connect => Box::new(ConnectPacketSource),
        PacketSourceKind::Fuzz => Box::new(FuzzSource::new(seed)),
        PacketSourceKind::Silent => Box::new(SilentSource),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packet_validator::{check_envelope, check_framing, PacketBuffer};

    #[test]
    fn test_connect_packet_layout() {
        let mut buffer = PacketBuffer::new();
        let mut source = ConnectPacketSource;
        assert_eq!(buffer.receive(|space| source.poll(space)), 14);
        assert_eq!(&buffer.as_slice()[..4], &[0x10, 12, 2, 3]);
        assert_eq!(buffer.as_slice()[13], 13);
    }

    #[test]
    fn test_connect_needs_room() {
        let mut space = [0u8; 8];
        assert_eq!(ConnectPacketSource.poll(&mut space), 0);
    }

    #[test]
    fn test_scripted_source_drains() {
        let mut source = ScriptedSource::new(vec![vec![1, 2], vec![3]]);
        let mut space = [0u8; 4];
        assert_eq!(source.poll(&mut space), 2);
        assert_eq!(source.poll(&mut space), 1);
        assert_eq!(source.remaining(), 0);
        assert_eq!(source.poll(&mut space), 0);
    }

    #[test]
    fn test_fuzz_traffic_is_handled_safely() {
        let mut source = FuzzSource::new(9);
        let mut buffer = PacketBuffer::new();
        let mut oversized = 0;
        let mut framed = 0;
        for _ in 0..2_000 {
            let len = buffer.receive(|space| {
                let reported = source.poll(space);
                if reported > PACKET_CAPACITY {
                    oversized += 1;
                }
                reported
            });
            assert!(len <= PACKET_CAPACITY);
            let _ = check_envelope(buffer.as_slice());
            if check_framing(buffer.as_slice()).is_ok() {
                framed += 1;
            }
        }
        assert!(oversized > 0);
        assert!(framed > 0);
    }

    #[test]
    fn test_boxed_source_from_kind() {
        let mut source = packet_source(PacketSourceKind::Silent, 0);
        assert_eq!(source.poll(&mut [0u8; 16]), 0);
    }
}
