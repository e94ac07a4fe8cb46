//! Compile-time configuration of the radio protocols.
//!
//! Lengths are derived from each other so that changing the Reed-Solomon
//! message length or a header layout updates every dependent limit.
use crate::id::restricted_id;
use crate::UInt;

// --- Channel coding ---

/// Reed-Solomon codeword length.
pub const RS_BLOCK_LENGTH: usize = 255;
/// Reed-Solomon message length, i.e., the length of a transfer frame.
pub const MESSAGE_LENGTH: usize = 223;
pub const N_PARITY_SYMBOLS: usize = RS_BLOCK_LENGTH - MESSAGE_LENGTH;

/// Length of the blocks exchanged with the radio.
#[cfg(not(feature = "disable-channel-coding"))]
pub const BLOCK_LENGTH: usize = RS_BLOCK_LENGTH;
#[cfg(feature = "disable-channel-coding")]
pub const BLOCK_LENGTH: usize = MESSAGE_LENGTH;

pub const ATTACHED_SYNC_MARKER: [u8; 4] = [0x1A, 0xCF, 0xFC, 0x1D];
#[cfg(not(feature = "disable-channel-coding"))]
pub const ATTACHED_SYNC_MARKER_LENGTH: usize = ATTACHED_SYNC_MARKER.len();
#[cfg(feature = "disable-channel-coding")]
pub const ATTACHED_SYNC_MARKER_LENGTH: usize = 0;
/// Channel access data unit: ASM followed by one block.
pub const CADU_LENGTH: usize = ATTACHED_SYNC_MARKER_LENGTH + BLOCK_LENGTH;

// --- Space Data Link Protocol ---

pub mod tm {
    use super::{MAX_FILE_SEGMENT_OVERHEAD, PACKET_PRIMARY_HEADER_LENGTH, PDU_HEADER_LENGTH};
    use crate::UInt;

    pub const TRANSFER_FRAME_VERSION_NUMBER: UInt<2> = UInt::new(0);
    pub const TRANSFER_FRAME_LENGTH: usize = super::MESSAGE_LENGTH;
    pub const TRANSFER_FRAME_PRIMARY_HEADER_LENGTH: usize = 6;
    pub const TRANSFER_FRAME_DATA_LENGTH: usize =
        TRANSFER_FRAME_LENGTH - TRANSFER_FRAME_PRIMARY_HEADER_LENGTH;

    pub const MAX_PACKET_LENGTH: usize = TRANSFER_FRAME_DATA_LENGTH;
    pub const MAX_PACKET_DATA_LENGTH: usize = MAX_PACKET_LENGTH - PACKET_PRIMARY_HEADER_LENGTH;

    pub const PACKET_SECONDARY_HEADER_LENGTH: usize = 11;
    pub const PACKET_PUS_VERSION_NUMBER: UInt<4> = UInt::new(2);
    pub const MAX_MESSAGE_DATA_LENGTH: usize =
        MAX_PACKET_DATA_LENGTH - PACKET_SECONDARY_HEADER_LENGTH;

    pub const MAX_PDU_LENGTH: usize = TRANSFER_FRAME_DATA_LENGTH;
    pub const MAX_PDU_DATA_LENGTH: usize = MAX_PDU_LENGTH - PDU_HEADER_LENGTH;
    pub(crate) const MAX_FILE_SEGMENT_LENGTH: usize =
        MAX_PDU_DATA_LENGTH - MAX_FILE_SEGMENT_OVERHEAD;
}

pub mod tc {
    use super::{MAX_FILE_SEGMENT_OVERHEAD, PACKET_PRIMARY_HEADER_LENGTH, PDU_HEADER_LENGTH};
    use crate::UInt;

    pub const TRANSFER_FRAME_VERSION_NUMBER: UInt<2> = UInt::new(0);
    pub const TRANSFER_FRAME_LENGTH: usize = super::MESSAGE_LENGTH;
    pub const TRANSFER_FRAME_PRIMARY_HEADER_LENGTH: usize = 5;
    pub const SECURITY_HEADER_LENGTH: usize = 2;
    pub const SECURITY_TRAILER_LENGTH: usize = 8;
    pub const TRANSFER_FRAME_DATA_LENGTH: usize = TRANSFER_FRAME_LENGTH
        - TRANSFER_FRAME_PRIMARY_HEADER_LENGTH
        - SECURITY_HEADER_LENGTH
        - SECURITY_TRAILER_LENGTH;

    pub const MAX_PACKET_LENGTH: usize = TRANSFER_FRAME_DATA_LENGTH;
    pub const MAX_PACKET_DATA_LENGTH: usize = MAX_PACKET_LENGTH - PACKET_PRIMARY_HEADER_LENGTH;

    pub const PACKET_SECONDARY_HEADER_LENGTH: usize = 5;
    pub const PACKET_PUS_VERSION_NUMBER: UInt<4> = UInt::new(2);
    pub const MAX_MESSAGE_DATA_LENGTH: usize =
        MAX_PACKET_DATA_LENGTH - PACKET_SECONDARY_HEADER_LENGTH;

    pub const MAX_PDU_LENGTH: usize = TRANSFER_FRAME_DATA_LENGTH;
    pub const MAX_PDU_DATA_LENGTH: usize = MAX_PDU_LENGTH - PDU_HEADER_LENGTH;
    pub(crate) const MAX_FILE_SEGMENT_LENGTH: usize =
        MAX_PDU_DATA_LENGTH - MAX_FILE_SEGMENT_OVERHEAD;
}

pub const SECURITY_PARAMETER_INDEX: u16 = 1;
/// Key of the TC authentication trailer.
pub const AUTHENTICATION_KEY: [u8; 4] = [0; 4];

restricted_id! {
    /// Spacecraft identifier (10 bits).
    pub struct SpacecraftId(UInt<10>) = [0x123];
}
pub const SPACECRAFT_ID: SpacecraftId = SpacecraftId::make(0x123);

restricted_id! {
    /// Virtual channel identifier (3 bits).
    pub struct Vcid(UInt<3>) = [0b011, 0b101];
}
pub const PUS_VCID: Vcid = Vcid::make(0b011);
pub const CFDP_VCID: Vcid = Vcid::make(0b101);

// --- Space Packet Protocol ---

pub const PACKET_VERSION_NUMBER: UInt<3> = UInt::new(0);
pub const PACKET_PRIMARY_HEADER_LENGTH: usize = 6;

restricted_id! {
    /// Application process identifier (11 bits).
    pub struct Apid(UInt<11>) = [0b000_1100_1100, 0x7FF];
}
pub const NORMAL_APID: Apid = Apid::make(0b000_1100_1100);
pub const IDLE_PACKET_APID: Apid = Apid::make(0x7FF);

/// Filler for unused data field space.
pub const IDLE_DATA: u8 = 0x55;

// --- Packet Utilization Standard ---

restricted_id! {
    /// Destination (TM) or source (TC) of PUS packets.
    pub struct ApplicationProcessUserId(UInt<16>) = [0xAA33];
}
pub const APPLICATION_PROCESS_USER_ID: ApplicationProcessUserId =
    ApplicationProcessUserId::make(0xAA33);

// --- CCSDS File Delivery Protocol ---

pub const PDU_HEADER_LENGTH: usize = 8;
pub const PDU_VERSION: UInt<3> = UInt::new(1);
const MAX_FILE_SEGMENT_OVERHEAD: usize = 4;
/// Longest run of file data a single file data PDU carries in either direction.
pub const MAX_FILE_SEGMENT_LENGTH: usize =
    min(tm::MAX_FILE_SEGMENT_LENGTH, tc::MAX_FILE_SEGMENT_LENGTH);
pub(crate) const MIN_MAX_PDU_DATA_LENGTH: usize =
    min(tm::MAX_PDU_DATA_LENGTH, tc::MAX_PDU_DATA_LENGTH);

const fn min(a: usize, b: usize) -> usize {
    if a < b {
        a
    } else {
        b
    }
}

restricted_id! {
    /// CFDP entity identifier (1 byte).
    pub struct EntityId(UInt<8>) = [0x0F, 0xF0];
}
pub const GROUND_STATION_ENTITY_ID: EntityId = EntityId::make(0x0F);
pub const CUBESAT_ENTITY_ID: EntityId = EntityId::make(0xF0);

restricted_id! {
    /// File checksum algorithm of a metadata PDU (4 bits).
    pub struct ChecksumType(UInt<4>) = [15];
}
pub const NULL_CHECKSUM_TYPE: ChecksumType = ChecksumType::make(15);
