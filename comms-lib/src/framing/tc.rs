use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::auth::{compute_mac, verify_mac};
use crate::bits::{BitReader, BitWriter};
use crate::config::tc::{
    SECURITY_HEADER_LENGTH, SECURITY_TRAILER_LENGTH, TRANSFER_FRAME_DATA_LENGTH,
    TRANSFER_FRAME_LENGTH, TRANSFER_FRAME_PRIMARY_HEADER_LENGTH, TRANSFER_FRAME_VERSION_NUMBER,
};
use crate::config::{IDLE_DATA, SECURITY_PARAMETER_INDEX, SPACECRAFT_ID};
use crate::counters::IdCounters;
use crate::payload::{DataField, Payload};
use crate::{Error, RestrictedId, Result, SpacecraftId, UInt, Vcid};

pub type Frame = [u8; TRANSFER_FRAME_LENGTH];

/// Frame sequence numbers, one per virtual channel.
pub type TcFrameCounters = IdCounters<u8, Vcid>;

const DATA_FIELD_START: usize = TRANSFER_FRAME_PRIMARY_HEADER_LENGTH + SECURITY_HEADER_LENGTH;
const TRAILER_START: usize = TRANSFER_FRAME_LENGTH - SECURITY_TRAILER_LENGTH;

/// TC transfer frame primary header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TcPrimaryHeader {
    pub version: UInt<2>,
    pub bypass_flag: bool,
    pub control_command_flag: bool,
    pub spare: UInt<2>,
    pub spacecraft_id: SpacecraftId,
    /// Upper bits of the 6-bit virtual channel field, always zero.
    pub vcid_high_bits: UInt<3>,
    pub vcid: Vcid,
    /// Frame length minus one.
    pub frame_length: UInt<10>,
    pub frame_sequence_number: u8,
}

impl TcPrimaryHeader {
    pub const LEN: usize = TRANSFER_FRAME_PRIMARY_HEADER_LENGTH;
    pub const FRAME_LENGTH: UInt<10> = UInt::new(TRANSFER_FRAME_LENGTH as u64 - 1);

    /// Header of a type-B (bypass), data frame.
    #[must_use]
    pub fn new(vcid: Vcid, frame_sequence_number: u8) -> Self {
        Self {
            version: TRANSFER_FRAME_VERSION_NUMBER,
            bypass_flag: true,
            control_command_flag: false,
            spare: UInt::ZERO,
            spacecraft_id: SPACECRAFT_ID,
            vcid_high_bits: UInt::ZERO,
            vcid,
            frame_length: Self::FRAME_LENGTH,
            frame_sequence_number,
        }
    }

    /// Construct from the provided bytes, or `None` if there are not enough bytes.
    #[must_use]
    pub fn decode(dat: &[u8]) -> Option<Self> {
        if dat.len() < Self::LEN {
            return None;
        }
        let mut r = BitReader::new(dat);
        Some(Self {
            version: r.get(),
            bypass_flag: r.get::<1>().value() == 1,
            control_command_flag: r.get::<1>().value() == 1,
            spare: r.get(),
            spacecraft_id: SpacecraftId::new(r.get()),
            vcid_high_bits: r.get(),
            vcid: Vcid::new(r.get()),
            frame_length: r.get(),
            frame_sequence_number: r.get_u8(),
        })
    }

    /// Serialize into the first [TcPrimaryHeader::LEN] bytes of `dst`.
    pub fn encode(&self, dst: &mut [u8]) {
        BitWriter::new(&mut dst[..Self::LEN])
            .put(self.version)
            .put(UInt::<1>::new(self.bypass_flag.into()))
            .put(UInt::<1>::new(self.control_command_flag.into()))
            .put(self.spare)
            .put(self.spacecraft_id.value())
            .put(self.vcid_high_bits)
            .put(self.vcid.value())
            .put(self.frame_length)
            .put_u8(self.frame_sequence_number);
    }
}

/// A received TC frame that passed all checks, borrowing the frame bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcTransferFrame<'a> {
    pub header: TcPrimaryHeader,
    pub security_parameter_index: u16,
    pub data_field: &'a [u8],
    pub trailer: &'a [u8],
}

/// Validate an uplinked frame and return a view of its parts.
///
/// The checks run in header order and the first failing one decides the error.
/// A frame is only returned when its authentication trailer matches, so no
/// part of a rejected frame may be used.
///
/// # Errors
/// * [Error::InvalidTransferFrame]: wrong version, or not a bypass data frame
/// * [Error::InvalidSpacecraftId]
/// * [Error::InvalidVcid]: unknown channel or non-zero upper VCID bits
/// * [Error::InvalidFrameLength]
/// * [Error::InvalidSecurityParameterIndex]
/// * [Error::AuthenticationFailed]
pub fn parse_as_transfer_frame(frame: &Frame) -> Result<TcTransferFrame<'_>> {
    let result = parse(frame);
    if let Err(err) = &result {
        debug!(error = %err, "rejected tc transfer frame");
    }
    result
}

fn parse(frame: &Frame) -> Result<TcTransferFrame<'_>> {
    let header = TcPrimaryHeader::decode(frame).ok_or(Error::BufferTooSmall {
        actual: frame.len(),
        minimum: TcPrimaryHeader::LEN,
    })?;

    if header.version != TRANSFER_FRAME_VERSION_NUMBER
        || !header.bypass_flag
        || header.control_command_flag
    {
        return Err(Error::InvalidTransferFrame);
    }
    if !header.spacecraft_id.is_valid() {
        return Err(Error::InvalidSpacecraftId(header.spacecraft_id.raw()));
    }
    if header.vcid_high_bits != UInt::<3>::ZERO || !header.vcid.is_valid() {
        let mut raw = header.vcid_high_bits.value();
        raw = (raw << 3) | header.vcid.raw();
        return Err(Error::InvalidVcid(raw));
    }
    if header.frame_length != TcPrimaryHeader::FRAME_LENGTH {
        return Err(Error::InvalidFrameLength(header.frame_length.value()));
    }

    let security_parameter_index = u16::from_be_bytes([frame[5], frame[6]]);
    if security_parameter_index != SECURITY_PARAMETER_INDEX {
        return Err(Error::InvalidSecurityParameterIndex(security_parameter_index));
    }

    let (authenticated, trailer) = frame.split_at(TRAILER_START);
    verify_mac(authenticated, trailer)?;

    Ok(TcTransferFrame {
        header,
        security_parameter_index,
        data_field: &authenticated[DATA_FIELD_START..],
        trailer,
    })
}

/// Ground-side builder of authenticated TC frames.
#[derive(Debug)]
pub struct TcFrameBuilder {
    counters: Arc<TcFrameCounters>,
}

impl TcFrameBuilder {
    #[must_use]
    pub fn new(counters: Arc<TcFrameCounters>) -> Self {
        Self { counters }
    }

    /// Build a frame on `vcid` carrying `payload`, padded with idle data.
    ///
    /// # Errors
    /// * [Error::InvalidVcid] if `vcid` is not one of the spacecraft's channels
    /// * [Error::CapacityExceeded] if `payload` is longer than the data field
    pub fn build<P: Payload + ?Sized>(&self, vcid: Vcid, payload: &P) -> Result<Frame> {
        if !vcid.is_valid() {
            return Err(Error::InvalidVcid(vcid.raw()));
        }
        let mut frame = [0u8; TRANSFER_FRAME_LENGTH];
        {
            let mut data_field =
                DataField::new(&mut frame[DATA_FIELD_START..DATA_FIELD_START + TRANSFER_FRAME_DATA_LENGTH]);
            payload.add_to(&mut data_field)?;
            data_field.fill_remaining(IDLE_DATA);
        }

        let sequence_number = self.counters.post_increment(vcid).unwrap_or_default();
        TcPrimaryHeader::new(vcid, sequence_number).encode(&mut frame);
        frame[TcPrimaryHeader::LEN..DATA_FIELD_START]
            .copy_from_slice(&SECURITY_PARAMETER_INDEX.to_be_bytes());
        let digest = compute_mac(&frame[..TRAILER_START])?;
        frame[TRAILER_START..].copy_from_slice(&digest);

        debug!(vcid = vcid.raw(), sequence_number, "built tc transfer frame");
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::{CFDP_VCID, PUS_VCID};

    fn test_frame() -> Frame {
        let mut frame = [0u8; TRANSFER_FRAME_LENGTH];
        #[rustfmt::skip]
        let start = [
            0x21, 0x23, // version 0, bypass, data frame, scid 0x123
            0x0C, 222,  // vcid 3, frame length 223 - 1
            13,         // frame sequence number
            0x00, 0x01, // security parameter index
            0xFF, 0xEE, // start of data field
        ];
        frame[..start.len()].copy_from_slice(&start);
        frame[TRAILER_START..].copy_from_slice(&hex::decode("3834838b28a3f62c").unwrap());
        frame
    }

    #[test]
    fn parse_valid_frame() {
        let frame = test_frame();
        let parsed = parse_as_transfer_frame(&frame).unwrap();

        assert_eq!(parsed.header.vcid, PUS_VCID);
        assert_eq!(parsed.header.spacecraft_id, SPACECRAFT_ID);
        assert_eq!(parsed.header.frame_sequence_number, 13);
        assert_eq!(parsed.security_parameter_index, 1);
        assert_eq!(parsed.data_field.len(), TRANSFER_FRAME_DATA_LENGTH);
        assert_eq!(parsed.data_field[..3], [0xFF, 0xEE, 0x00]);
        assert_eq!(parsed.trailer.len(), SECURITY_TRAILER_LENGTH);
    }

    #[test_case(0, 0b1010_0001, Error::InvalidTransferFrame ; "version")]
    #[test_case(0, 0b0000_0001, Error::InvalidTransferFrame ; "no bypass")]
    #[test_case(0, 0b0011_1001, Error::InvalidTransferFrame ; "control command")]
    #[test_case(1, 0x17, Error::InvalidSpacecraftId(0x117) ; "spacecraft id")]
    #[test_case(2, 0b0001_1100, Error::InvalidVcid(0b111) ; "vcid")]
    #[test_case(2, 0b1000_1100, Error::InvalidVcid(0b100_011) ; "vcid high bits")]
    #[test_case(3, 255, Error::InvalidFrameLength(255) ; "frame length")]
    #[test_case(5, 0xFF, Error::InvalidSecurityParameterIndex(0xFF01) ; "spi")]
    #[test_case(9, 0x01, Error::AuthenticationFailed ; "data field")]
    #[test_case(TRANSFER_FRAME_LENGTH - 1, 0, Error::AuthenticationFailed ; "trailer")]
    fn parse_rejects_corrupted_field(index: usize, value: u8, expected: Error) {
        let mut frame = test_frame();
        frame[index] = value;
        assert_eq!(parse_as_transfer_frame(&frame), Err(expected));
    }

    #[test]
    fn header_round_trip() {
        let header = TcPrimaryHeader::new(CFDP_VCID, 200);
        let mut dst = [0u8; TcPrimaryHeader::LEN];
        header.encode(&mut dst);
        assert_eq!(dst, [0x21, 0x23, 0x14, 222, 200]);
        assert_eq!(TcPrimaryHeader::decode(&dst), Some(header));
        assert_eq!(TcPrimaryHeader::decode(&dst[..4]), None);
    }

    #[test]
    fn built_frame_parses() {
        let builder = TcFrameBuilder::new(Arc::new(TcFrameCounters::new()));
        let frame = builder.build(CFDP_VCID, &[1u8, 2, 3]).unwrap();

        let parsed = parse_as_transfer_frame(&frame).unwrap();
        assert_eq!(parsed.header.vcid, CFDP_VCID);
        assert_eq!(parsed.header.frame_sequence_number, 0);
        assert_eq!(parsed.data_field[..3], [1, 2, 3]);
        assert!(parsed.data_field[3..].iter().all(|b| *b == IDLE_DATA));
    }

    #[test]
    fn builder_counts_per_vcid() {
        let counters = Arc::new(TcFrameCounters::new());
        let builder = TcFrameBuilder::new(Arc::clone(&counters));
        builder.build(PUS_VCID, &[0u8]).unwrap();
        builder.build(PUS_VCID, &[0u8]).unwrap();
        let frame = builder.build(CFDP_VCID, &[0u8]).unwrap();

        assert_eq!(frame[4], 0);
        assert_eq!(counters.get(PUS_VCID), Some(2));
        assert_eq!(counters.get(CFDP_VCID), Some(1));
    }

    #[test]
    fn builder_rejects_oversized_data_and_foreign_vcid() {
        let builder = TcFrameBuilder::new(Arc::new(TcFrameCounters::new()));
        assert!(matches!(
            builder.build(PUS_VCID, &vec![0u8; TRANSFER_FRAME_DATA_LENGTH + 1]),
            Err(Error::CapacityExceeded { .. })
        ));
        assert_eq!(
            builder.build(Vcid::from_raw(1), &[0u8]),
            Err(Error::InvalidVcid(1))
        );
        assert!(builder
            .build(PUS_VCID, &vec![0u8; TRANSFER_FRAME_DATA_LENGTH])
            .is_ok());
    }
}
