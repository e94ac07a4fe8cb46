//! CCSDS File Delivery Protocol data units.
//!
//! Only the fixed header layout of this mission is supported: 1 byte entity
//! IDs, 2 byte transaction sequence numbers, no CRC, no large files and no
//! segmentation.
mod directives;
mod missing;

pub use directives::{
    parse_as_ack_pdu, parse_as_end_of_file_pdu, parse_as_file_directive, parse_as_file_directive_pdu,
    parse_as_finished_pdu, parse_as_metadata_pdu, parse_as_nak_pdu, AckPdu, ConditionCode,
    DeliveryCode, DirectiveCode, EndOfFilePdu, FaultLocation, FileDirective, FileDirectivePdu,
    FileStatus, FinishedPdu, MetadataPdu, NakPdu, SegmentRequests, TransactionStatus,
    MAX_SEGMENT_REQUESTS,
};
pub use missing::{update_missing_file_data, MissingSegments, SegmentRequest};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::bits::{BitReader, BitWriter};
use crate::config::{
    tc::MAX_PDU_DATA_LENGTH, CUBESAT_ENTITY_ID, GROUND_STATION_ENTITY_ID, PDU_HEADER_LENGTH,
    PDU_VERSION,
};
use crate::payload::{DataField, Payload};
use crate::{EntityId, Error, RestrictedId, Result, UInt};

/// The only transmission mode value this mission uses.
pub const ACKNOWLEDGED_TRANSMISSION_MODE: UInt<1> = UInt::new(1);
/// Value of the entity ID length field for 1 byte IDs.
const LENGTH_OF_ENTITY_IDS: UInt<3> = UInt::new(0);
/// Value of the sequence number length field for 2 byte sequence numbers.
const LENGTH_OF_TRANSACTION_SEQUENCE_NUMBER: UInt<3> = UInt::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PduType {
    FileDirective = 0,
    FileData = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    TowardsFileReceiver = 0,
    TowardsFileSender = 1,
}

macro_rules! one_bit_enum {
    ($name:ident, $zero:ident, $one:ident) => {
        impl From<$name> for UInt<1> {
            fn from(value: $name) -> Self {
                UInt::new(value as u64)
            }
        }

        impl From<UInt<1>> for $name {
            fn from(value: UInt<1>) -> Self {
                if value.value() == 0 {
                    Self::$zero
                } else {
                    Self::$one
                }
            }
        }
    };
}

one_bit_enum!(PduType, FileDirective, FileData);
one_bit_enum!(Direction, TowardsFileReceiver, TowardsFileSender);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProtocolDataUnitHeader {
    pub version: UInt<3>,
    pub pdu_type: PduType,
    pub direction: Direction,
    pub transmission_mode: UInt<1>,
    pub crc_flag: UInt<1>,
    pub large_file_flag: UInt<1>,
    pub pdu_data_field_length: u16,
    pub segmentation_control: UInt<1>,
    /// Length of the entity IDs minus one.
    pub length_of_entity_ids: UInt<3>,
    pub segment_metadata_flag: UInt<1>,
    /// Length of the transaction sequence number minus one.
    pub length_of_transaction_sequence_number: UInt<3>,
    pub source_entity_id: EntityId,
    pub transaction_sequence_number: u16,
    pub destination_entity_id: EntityId,
}

impl ProtocolDataUnitHeader {
    pub const LEN: usize = PDU_HEADER_LENGTH;

    /// Header of a PDU sent by `source` to the other entity of the mission.
    ///
    /// The destination is left invalid if `source` is not one of the mission's
    /// entities.
    #[must_use]
    pub fn new(
        pdu_type: PduType,
        source: EntityId,
        transaction_sequence_number: u16,
        pdu_data_field_length: u16,
    ) -> Self {
        let (direction, destination) = if source == GROUND_STATION_ENTITY_ID {
            (Direction::TowardsFileSender, CUBESAT_ENTITY_ID)
        } else if source == CUBESAT_ENTITY_ID {
            (Direction::TowardsFileReceiver, GROUND_STATION_ENTITY_ID)
        } else {
            (Direction::TowardsFileReceiver, EntityId::default())
        };
        Self {
            version: PDU_VERSION,
            pdu_type,
            direction,
            transmission_mode: ACKNOWLEDGED_TRANSMISSION_MODE,
            crc_flag: UInt::ZERO,
            large_file_flag: UInt::ZERO,
            pdu_data_field_length,
            segmentation_control: UInt::ZERO,
            length_of_entity_ids: LENGTH_OF_ENTITY_IDS,
            segment_metadata_flag: UInt::ZERO,
            length_of_transaction_sequence_number: LENGTH_OF_TRANSACTION_SEQUENCE_NUMBER,
            source_entity_id: source,
            transaction_sequence_number,
            destination_entity_id: destination,
        }
    }

    /// Decode from bytes. Returns `None` if there are not enough bytes to construct the
    /// header.
    #[must_use]
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::LEN {
            return None;
        }
        let mut r = BitReader::new(buf);
        Some(Self {
            version: r.get(),
            pdu_type: r.get::<1>().into(),
            direction: r.get::<1>().into(),
            transmission_mode: r.get(),
            crc_flag: r.get(),
            large_file_flag: r.get(),
            pdu_data_field_length: r.get_u16(),
            segmentation_control: r.get(),
            length_of_entity_ids: r.get(),
            segment_metadata_flag: r.get(),
            length_of_transaction_sequence_number: r.get(),
            source_entity_id: EntityId::new(r.get()),
            transaction_sequence_number: r.get_u16(),
            destination_entity_id: EntityId::new(r.get()),
        })
    }

    /// Serialize into the first [ProtocolDataUnitHeader::LEN] bytes of `dst`.
    pub fn encode(&self, dst: &mut [u8]) {
        BitWriter::new(&mut dst[..Self::LEN])
            .put(self.version)
            .put(UInt::<1>::from(self.pdu_type))
            .put(UInt::<1>::from(self.direction))
            .put(self.transmission_mode)
            .put(self.crc_flag)
            .put(self.large_file_flag)
            .put_u16(self.pdu_data_field_length)
            .put(self.segmentation_control)
            .put(self.length_of_entity_ids)
            .put(self.segment_metadata_flag)
            .put(self.length_of_transaction_sequence_number)
            .put(self.source_entity_id.value())
            .put_u16(self.transaction_sequence_number)
            .put(self.destination_entity_id.value());
    }

    fn has_supported_layout(&self) -> bool {
        self.version == PDU_VERSION
            && self.transmission_mode == ACKNOWLEDGED_TRANSMISSION_MODE
            && self.crc_flag == UInt::<1>::ZERO
            && self.large_file_flag == UInt::<1>::ZERO
            && self.segmentation_control == UInt::<1>::ZERO
            && self.length_of_entity_ids == LENGTH_OF_ENTITY_IDS
            && self.segment_metadata_flag == UInt::<1>::ZERO
            && self.length_of_transaction_sequence_number
                == LENGTH_OF_TRANSACTION_SEQUENCE_NUMBER
    }
}

/// A parsed PDU borrowing its data field from the received buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ProtocolDataUnit<'a> {
    pub header: ProtocolDataUnitHeader,
    #[cfg_attr(feature = "serde", serde(with = "serde_bytes"))]
    pub data_field: &'a [u8],
}

/// Parse a PDU from the start of `buffer`.
///
/// Bytes after the declared data field length are ignored.
///
/// # Errors
/// * [Error::BufferTooSmall] if `buffer` is shorter than the header or the
///   declared data field
/// * [Error::InvalidProtocolDataUnit] if the version, transmission mode or any
///   of the layout fields is not the one this mission uses
/// * [Error::InvalidPduDataLength] if the data field is longer than a TC frame
///   can carry
/// * [Error::InvalidEntityId] if either entity ID is not one of the mission's
///   or both are the same
pub fn parse_as_protocol_data_unit(buffer: &[u8]) -> Result<ProtocolDataUnit<'_>> {
    let header = ProtocolDataUnitHeader::decode(buffer).ok_or(Error::BufferTooSmall {
        actual: buffer.len(),
        minimum: ProtocolDataUnitHeader::LEN,
    })?;
    if !header.has_supported_layout() {
        return Err(Error::InvalidProtocolDataUnit);
    }
    let data_len = usize::from(header.pdu_data_field_length);
    if data_len > MAX_PDU_DATA_LENGTH {
        return Err(Error::InvalidPduDataLength(data_len));
    }
    if !header.source_entity_id.is_valid()
        || !header.destination_entity_id.is_valid()
        || header.source_entity_id == header.destination_entity_id
    {
        return Err(Error::InvalidEntityId);
    }
    let end = ProtocolDataUnitHeader::LEN + data_len;
    if buffer.len() < end {
        return Err(Error::BufferTooSmall {
            actual: buffer.len(),
            minimum: end,
        });
    }

    Ok(ProtocolDataUnit {
        header,
        data_field: &buffer[ProtocolDataUnitHeader::LEN..end],
    })
}

/// Append a PDU header followed by `payload` to `field`.
///
/// # Errors
/// * [Error::InvalidEntityId] if `source` is not one of the mission's entities
/// * [Error::CapacityExceeded] if header and payload do not fit, in which case
///   `field` is unchanged
pub fn add_pdu_to<P: Payload + ?Sized>(
    field: &mut DataField<'_>,
    pdu_type: PduType,
    source: EntityId,
    transaction_sequence_number: u16,
    payload: &P,
) -> Result<()> {
    if !source.is_valid() {
        return Err(Error::InvalidEntityId);
    }
    let size = payload.size();
    let needed = ProtocolDataUnitHeader::LEN + size;
    if needed > field.available() {
        debug!(size, available = field.available(), "PDU does not fit");
        return Err(Error::CapacityExceeded {
            needed,
            available: field.available(),
        });
    }
    let Ok(pdu_data_field_length) = u16::try_from(size) else {
        return Err(Error::CapacityExceeded {
            needed,
            available: field.available(),
        });
    };

    let header = ProtocolDataUnitHeader::new(
        pdu_type,
        source,
        transaction_sequence_number,
        pdu_data_field_length,
    );
    header.encode(field.grow(ProtocolDataUnitHeader::LEN)?);
    payload.write_to(field.grow(size)?);

    trace!(?pdu_type, transaction_sequence_number, size, "added PDU");
    Ok(())
}

/// A run of file data starting at `offset` within the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FileDataPdu<'a> {
    pub offset: u32,
    #[cfg_attr(feature = "serde", serde(with = "serde_bytes"))]
    pub file_data: &'a [u8],
}

impl<'a> FileDataPdu<'a> {
    /// Size of the offset field.
    pub const OFFSET_LEN: usize = 4;

    #[must_use]
    pub const fn new(offset: u32, file_data: &'a [u8]) -> Self {
        Self { offset, file_data }
    }
}

impl Payload for FileDataPdu<'_> {
    fn size(&self) -> usize {
        Self::OFFSET_LEN + self.file_data.len()
    }

    fn write_to(&self, dst: &mut [u8]) {
        BitWriter::new(dst)
            .put_u32(self.offset)
            .put_bytes(self.file_data);
    }
}

/// Parse the data field of a file data PDU. The file data borrows from `buffer`.
///
/// # Errors
/// [Error::BufferTooSmall] if `buffer` is shorter than the offset field.
pub fn parse_as_file_data_pdu(buffer: &[u8]) -> Result<FileDataPdu<'_>> {
    if buffer.len() < FileDataPdu::OFFSET_LEN {
        return Err(Error::BufferTooSmall {
            actual: buffer.len(),
            minimum: FileDataPdu::OFFSET_LEN,
        });
    }
    let mut r = BitReader::new(buffer);
    Ok(FileDataPdu {
        offset: r.get_u32(),
        file_data: r.rest(),
    })
}
