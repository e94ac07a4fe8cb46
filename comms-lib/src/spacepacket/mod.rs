//! Space Packet Protocol.
//!
//! Packets are multiplexed into the data field of a transfer frame. Packets
//! built on board are telemetry packets, packets parsed on board must be
//! telecommand packets.
mod secondary;

pub use secondary::{tc, tm};

use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::bits::{BitReader, BitWriter};
use crate::config::{tc::MAX_PACKET_DATA_LENGTH, IDLE_DATA, IDLE_PACKET_APID, NORMAL_APID};
use crate::config::{PACKET_PRIMARY_HEADER_LENGTH, PACKET_VERSION_NUMBER};
use crate::counters::IdCounters;
use crate::payload::{DataField, Payload};
use crate::{Apid, Error, RestrictedId, Result, UInt};

/// Per-APID packet sequence counts, wrapping at 14 bits.
pub type SequenceCounters = IdCounters<UInt<14>, Apid>;

/// Sequence flags of a packet that is not part of a segmented group.
pub const SEQ_UNSEGMENTED: UInt<2> = UInt::new(0b11);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PacketType {
    Telemetry = 0,
    Telecommand = 1,
}

impl From<PacketType> for UInt<1> {
    fn from(value: PacketType) -> Self {
        UInt::new(value as u64)
    }
}

impl From<UInt<1>> for PacketType {
    fn from(value: UInt<1>) -> Self {
        if value.value() == 0 {
            Self::Telemetry
        } else {
            Self::Telecommand
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrimaryHeader {
    pub version: UInt<3>,
    pub packet_type: PacketType,
    pub has_secondary_header: bool,
    pub apid: Apid,
    /// Defines a packets grouping, always [SEQ_UNSEGMENTED] for packets of this protocol.
    pub sequence_flags: UInt<2>,
    pub sequence_count: UInt<14>,
    /// Length of the packet data field minus one.
    pub len_minus1: u16,
}

impl PrimaryHeader {
    /// Size of a `PrimaryHeader`
    pub const LEN: usize = PACKET_PRIMARY_HEADER_LENGTH;

    /// Decode from bytes. Returns `None` if there are not enough bytes to construct the
    /// header.
    #[must_use]
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::LEN {
            return None;
        }
        let mut r = BitReader::new(buf);
        Some(PrimaryHeader {
            version: r.get(),
            packet_type: r.get::<1>().into(),
            has_secondary_header: r.get::<1>().value() == 1,
            apid: Apid::new(r.get()),
            sequence_flags: r.get(),
            sequence_count: r.get(),
            len_minus1: r.get_u16(),
        })
    }

    /// Serialize into the first [PrimaryHeader::LEN] bytes of `dst`.
    pub fn encode(&self, dst: &mut [u8]) {
        BitWriter::new(&mut dst[..Self::LEN])
            .put(self.version)
            .put(UInt::<1>::from(self.packet_type))
            .put(UInt::<1>::new(self.has_secondary_header.into()))
            .put(self.apid.value())
            .put(self.sequence_flags)
            .put(self.sequence_count)
            .put_u16(self.len_minus1);
    }

    /// Number of bytes in the packet data field.
    #[must_use]
    pub fn data_len(&self) -> usize {
        usize::from(self.len_minus1) + 1
    }
}

/// A parsed space packet borrowing its data field from the received buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpacePacket<'a> {
    pub header: PrimaryHeader,
    /// The packet data field, including any secondary header.
    pub data: &'a [u8],
}

impl SpacePacket<'_> {
    /// Total length of the packet including the primary header.
    #[must_use]
    pub fn len(&self) -> usize {
        PrimaryHeader::LEN + self.data.len()
    }

    /// Packets always carry at least one data byte.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Display for SpacePacket<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SpacePacket{{apid: {}, seq: {}, data:[len={}]}}",
            self.header.apid.value(),
            self.header.sequence_count,
            self.data.len()
        )
    }
}

/// Append a telemetry space packet carrying `payload` to `field`.
///
/// The sequence count is taken from `counters` only if the packet fits, so a
/// rejected packet does not leave a gap in the sequence.
///
/// # Errors
/// * [Error::EmptyPayload] if the payload has no bytes
/// * [Error::TooLarge] if header and payload exceed the available space
/// * [Error::InvalidApid] if `apid` is not one of the spacecraft's APIDs
pub fn add_space_packet_to<P: Payload + ?Sized>(
    field: &mut DataField<'_>,
    counters: &SequenceCounters,
    has_secondary_header: bool,
    apid: Apid,
    payload: &P,
) -> Result<()> {
    add_packet_to(field, counters, PacketType::Telemetry, has_secondary_header, apid, payload)
}

/// Ground-side counterpart of [add_space_packet_to] appending a telecommand
/// packet, as accepted by [parse_as_space_packet].
///
/// # Errors
/// Like [add_space_packet_to].
pub fn add_telecommand_packet_to<P: Payload + ?Sized>(
    field: &mut DataField<'_>,
    counters: &SequenceCounters,
    has_secondary_header: bool,
    apid: Apid,
    payload: &P,
) -> Result<()> {
    add_packet_to(field, counters, PacketType::Telecommand, has_secondary_header, apid, payload)
}

fn add_packet_to<P: Payload + ?Sized>(
    field: &mut DataField<'_>,
    counters: &SequenceCounters,
    packet_type: PacketType,
    has_secondary_header: bool,
    apid: Apid,
    payload: &P,
) -> Result<()> {
    let size = payload.size();
    if size == 0 {
        return Err(Error::EmptyPayload);
    }
    if PrimaryHeader::LEN + size > field.available() {
        debug!(apid = apid.raw(), size, available = field.available(), "space packet too large");
        return Err(Error::TooLarge);
    }
    let Ok(len_minus1) = u16::try_from(size - 1) else {
        return Err(Error::TooLarge);
    };
    let Some(sequence_count) = counters.post_increment(apid) else {
        return Err(Error::InvalidApid(apid.raw()));
    };

    let header = PrimaryHeader {
        version: PACKET_VERSION_NUMBER,
        packet_type,
        has_secondary_header,
        apid,
        sequence_flags: SEQ_UNSEGMENTED,
        sequence_count,
        len_minus1,
    };
    header.encode(field.grow(PrimaryHeader::LEN)?);
    payload.write_to(field.grow(size)?);

    trace!(
        ?packet_type,
        apid = apid.raw(),
        sequence_count = sequence_count.value(),
        size,
        "added space packet"
    );
    Ok(())
}

/// Parse a telecommand space packet from the start of `buffer`.
///
/// Bytes after the packet's declared length are ignored.
///
/// # Errors
/// * [Error::BufferTooSmall] if there are not enough bytes for the header or
///   the declared data length
/// * [Error::InvalidSpacePacket] for a wrong version, packet type or sequence
///   flags, or a secondary header flag that does not match the APID
/// * [Error::InvalidApid] if the APID is not one of the spacecraft's APIDs
/// * [Error::InvalidPacketDataLength] if the declared length exceeds the
///   longest packet a TC frame can carry
pub fn parse_as_space_packet(buffer: &[u8]) -> Result<SpacePacket<'_>> {
    let header = PrimaryHeader::decode(buffer).ok_or(Error::BufferTooSmall {
        actual: buffer.len(),
        minimum: PrimaryHeader::LEN,
    })?;

    let secondary_header_matches_apid = if header.apid == NORMAL_APID {
        header.has_secondary_header
    } else if header.apid == IDLE_PACKET_APID {
        !header.has_secondary_header
    } else {
        true
    };
    if header.version != PACKET_VERSION_NUMBER
        || header.packet_type != PacketType::Telecommand
        || header.sequence_flags != SEQ_UNSEGMENTED
        || !secondary_header_matches_apid
    {
        return Err(Error::InvalidSpacePacket);
    }
    if !header.apid.is_valid() {
        return Err(Error::InvalidApid(header.apid.raw()));
    }
    if usize::from(header.len_minus1) > MAX_PACKET_DATA_LENGTH {
        return Err(Error::InvalidPacketDataLength(header.data_len()));
    }
    let end = PrimaryHeader::LEN + header.data_len();
    if buffer.len() < end {
        return Err(Error::BufferTooSmall {
            actual: buffer.len(),
            minimum: end,
        });
    }

    Ok(SpacePacket {
        header,
        data: &buffer[PrimaryHeader::LEN..end],
    })
}

/// Iterator over the space packets in a TC transfer frame data field.
///
/// Iteration ends at the end of the field, at idle data filling the rest of
/// the field, or after the first packet that fails to parse.
#[derive(Debug, Clone)]
pub struct SpacePackets<'a> {
    rest: &'a [u8],
}

/// Iterate over the packets in `data_field`.
#[must_use]
pub fn space_packets(data_field: &[u8]) -> SpacePackets<'_> {
    SpacePackets { rest: data_field }
}

impl<'a> Iterator for SpacePackets<'a> {
    type Item = Result<SpacePacket<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.iter().all(|b| *b == IDLE_DATA) {
            return None;
        }
        match parse_as_space_packet(self.rest) {
            Ok(packet) => {
                self.rest = &self.rest[packet.len()..];
                Some(Ok(packet))
            }
            Err(err) => {
                self.rest = &[];
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::config::tm::MAX_PACKET_LENGTH;

    fn add(
        field: &mut DataField<'_>,
        counters: &SequenceCounters,
        has_secondary_header: bool,
        apid: Apid,
        size: usize,
    ) -> Result<()> {
        add_space_packet_to(field, counters, has_secondary_header, apid, &vec![0xABu8; size])
    }

    #[test]
    fn add_writes_headers_and_counts_per_apid() {
        let counters = SequenceCounters::new();
        let mut storage = [0u8; MAX_PACKET_LENGTH];
        let mut field = DataField::new(&mut storage);

        add(&mut field, &counters, false, NORMAL_APID, 10).unwrap();
        assert_eq!(field.as_slice()[..6], hex::decode("00ccc0000009").unwrap());
        field.clear();

        add(&mut field, &counters, true, NORMAL_APID, 13).unwrap();
        assert_eq!(field.as_slice()[..6], hex::decode("08ccc001000c").unwrap());
        assert_eq!(field.len(), 6 + 13);
        field.clear();

        add(&mut field, &counters, false, IDLE_PACKET_APID, 5).unwrap();
        assert_eq!(field.as_slice()[..6], hex::decode("07ffc0000004").unwrap());
        assert_eq!(field.as_slice()[6..], [0xAB; 5]);
    }

    #[test]
    fn add_rejects_empty_payload() {
        let counters = SequenceCounters::new();
        let mut storage = [0u8; 16];
        let mut field = DataField::new(&mut storage);
        assert_eq!(
            add_space_packet_to(&mut field, &counters, false, NORMAL_APID, &[0u8; 0]),
            Err(Error::EmptyPayload)
        );
        assert!(field.is_empty());
    }

    #[test]
    fn add_payload_filling_remaining_space() {
        let counters = SequenceCounters::new();
        let mut storage = [0u8; 32];
        let mut field = DataField::new(&mut storage);
        field.extend_from_slice(&[0; 4]).unwrap();

        assert_eq!(add(&mut field, &counters, false, NORMAL_APID, 23), Err(Error::TooLarge));
        assert_eq!(field.len(), 4);
        assert_eq!(counters.get(NORMAL_APID), Some(UInt::ZERO));

        add(&mut field, &counters, false, NORMAL_APID, 22).unwrap();
        assert_eq!(field.available(), 0);
        assert_eq!(counters.get(NORMAL_APID), Some(UInt::new(1)));
    }

    #[test]
    fn add_rejects_foreign_apid() {
        let counters = SequenceCounters::new();
        let mut storage = [0u8; 32];
        let mut field = DataField::new(&mut storage);
        assert_eq!(
            add(&mut field, &counters, false, Apid::from_raw(0x123), 1),
            Err(Error::InvalidApid(0x123))
        );
        assert!(field.is_empty());
    }

    #[test]
    fn sequence_count_wraps_at_14_bits() {
        let counters = SequenceCounters::new();
        let mut storage = [0u8; 8];
        for _ in 0..0x3FFF {
            counters.post_increment(NORMAL_APID);
        }
        let mut field = DataField::new(&mut storage);
        add(&mut field, &counters, true, NORMAL_APID, 1).unwrap();
        assert_eq!(field.as_slice()[2..4], [0xFF, 0xFF]);
        field.clear();
        add(&mut field, &counters, true, NORMAL_APID, 1).unwrap();
        assert_eq!(field.as_slice()[2..4], [0xC0, 0x00]);
    }

    #[test]
    fn parse_normal_packet() {
        let buffer = [
            0x18, 0xCC, // version 0, telecommand, secondary header, normal apid
            0xC0, 0x7B, // unsegmented, sequence count 123
            0x00, 0x00, // one data byte
            0xAB, // data
            0x55, // not part of the packet
        ];
        let packet = parse_as_space_packet(&buffer).unwrap();
        assert_eq!(packet.header.apid, NORMAL_APID);
        assert_eq!(packet.header.packet_type, PacketType::Telecommand);
        assert!(packet.header.has_secondary_header);
        assert_eq!(packet.header.sequence_count, UInt::<14>::new(123));
        assert_eq!(packet.data, &[0xAB]);
        assert_eq!(packet.len(), 7);
    }

    #[test]
    fn parse_idle_packet() {
        let buffer = [
            0x17, 0xFF, // version 0, telecommand, no secondary header, idle apid
            0xC4, 0x1A, // unsegmented, sequence count 1050
            0x00, 0x01, // two data bytes
            0x01, 0x02,
        ];
        let packet = parse_as_space_packet(&buffer).unwrap();
        assert_eq!(packet.header.apid, IDLE_PACKET_APID);
        assert_eq!(packet.header.sequence_count.value(), 1050);
        assert_eq!(packet.data, &[0x01, 0x02]);

        assert_eq!(
            parse_as_space_packet(&buffer[..7]),
            Err(Error::BufferTooSmall {
                actual: 7,
                minimum: 8
            })
        );
    }

    #[test_case(0, 0x38, Error::InvalidSpacePacket ; "version")]
    #[test_case(0, 0x08, Error::InvalidSpacePacket ; "telemetry type")]
    #[test_case(0, 0x10, Error::InvalidSpacePacket ; "missing secondary header")]
    #[test_case(2, 0x40, Error::InvalidSpacePacket ; "sequence flags")]
    #[test_case(1, 0xCD, Error::InvalidApid(0x0CD) ; "apid")]
    #[test_case(4, 0x01, Error::InvalidPacketDataLength(257) ; "data length")]
    #[test_case(5, 0x01, Error::BufferTooSmall { actual: 7, minimum: 8 } ; "truncated")]
    fn parse_rejects_corrupted_field(index: usize, value: u8, expected: Error) {
        let mut buffer = [0x18, 0xCC, 0xC0, 0x7B, 0x00, 0x00, 0xAB];
        buffer[index] = value;
        assert_eq!(parse_as_space_packet(&buffer), Err(expected));
    }

    #[test]
    fn parse_rejects_secondary_header_on_idle_packet() {
        let buffer = [0x1F, 0xFF, 0xC0, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(parse_as_space_packet(&buffer), Err(Error::InvalidSpacePacket));
    }

    #[test]
    fn parse_accepts_longest_packet() {
        let mut buffer = vec![0u8; PrimaryHeader::LEN + MAX_PACKET_DATA_LENGTH + 1];
        buffer[..6].copy_from_slice(&[0x18, 0xCC, 0xC0, 0x00, 0x00, MAX_PACKET_DATA_LENGTH as u8]);
        assert!(parse_as_space_packet(&buffer).is_ok());
        buffer[5] += 1;
        assert_eq!(
            parse_as_space_packet(&buffer),
            Err(Error::InvalidPacketDataLength(MAX_PACKET_DATA_LENGTH + 2))
        );
    }

    #[test]
    fn telecommand_packet_is_accepted_by_parser() {
        let counters = SequenceCounters::new();
        let mut storage = [0u8; 16];
        let mut field = DataField::new(&mut storage);

        add_telecommand_packet_to(&mut field, &counters, true, NORMAL_APID, &[0xABu8]).unwrap();

        assert_eq!(field.as_slice(), [0x18, 0xCC, 0xC0, 0x00, 0x00, 0x00, 0xAB]);
        let packet = parse_as_space_packet(field.as_slice()).unwrap();
        assert_eq!(packet.header.packet_type, PacketType::Telecommand);
        assert_eq!(packet.data, &[0xAB]);
    }

    #[test]
    fn parse_rejects_short_buffer() {
        assert_eq!(
            parse_as_space_packet(&[0x18, 0xCC, 0xC0]),
            Err(Error::BufferTooSmall {
                actual: 3,
                minimum: 6
            })
        );
    }

    #[test]
    fn iterate_packets_until_idle_data() {
        #[rustfmt::skip]
        let data_field = [
            0x18, 0xCC, 0xC0, 0x01, 0x00, 0x00, 0xAA,
            0x17, 0xFF, 0xC0, 0x02, 0x00, 0x01, 0xBB, 0xCC,
            0x55, 0x55, 0x55,
        ];
        let packets: Vec<_> = space_packets(&data_field).collect::<Result<_>>().unwrap();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].data, &[0xAA]);
        assert_eq!(packets[1].data, &[0xBB, 0xCC]);
    }

    #[test]
    fn iteration_stops_after_error() {
        let data_field = [0x18, 0xCC, 0xC0, 0x01, 0x00, 0x00, 0xAA, 0x00, 0x01];
        let mut packets = space_packets(&data_field);
        assert!(packets.next().unwrap().is_ok());
        assert!(packets.next().unwrap().is_err());
        assert!(packets.next().is_none());
    }
}
