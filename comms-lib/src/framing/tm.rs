use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bits::{BitReader, BitWriter};
use crate::coding::Block;
use crate::config::tm::{
    TRANSFER_FRAME_LENGTH, TRANSFER_FRAME_PRIMARY_HEADER_LENGTH, TRANSFER_FRAME_VERSION_NUMBER,
};
use crate::config::{IDLE_DATA, SPACECRAFT_ID};
use crate::counters::IdCounters;
use crate::payload::{DataField, Payload};
use crate::{Error, RestrictedId, Result, SpacecraftId, UInt, Vcid};

pub type Frame = [u8; TRANSFER_FRAME_LENGTH];

/// Frame counters shared by all TM frame builders of a spacecraft.
#[derive(Debug, Default)]
pub struct TmFrameCounters {
    pub master_channel: IdCounters<u8, SpacecraftId>,
    pub virtual_channel: IdCounters<u8, Vcid>,
}

impl TmFrameCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// TM transfer frame primary header.
///
/// Space Data Link Protocol frames always use the first header pointer for the
/// packet data, never a secondary header or an operational control field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TmPrimaryHeader {
    pub version: UInt<2>,
    pub spacecraft_id: SpacecraftId,
    pub vcid: Vcid,
    pub operational_control_field_flag: bool,
    pub master_channel_frame_count: u8,
    pub virtual_channel_frame_count: u8,
    pub secondary_header_flag: bool,
    pub synchronization_flag: bool,
    pub packet_order_flag: bool,
    pub segment_length_id: UInt<2>,
    pub first_header_pointer: UInt<11>,
}

impl TmPrimaryHeader {
    pub const LEN: usize = TRANSFER_FRAME_PRIMARY_HEADER_LENGTH;
    /// Segment length identifier required when the synchronization flag is 0.
    pub const SEGMENT_LENGTH_ID: UInt<2> = UInt::new(0b11);

    /// Header of a frame with the given sequence counts.
    #[must_use]
    pub fn new(vcid: Vcid, master_channel_frame_count: u8, virtual_channel_frame_count: u8) -> Self {
        Self {
            version: TRANSFER_FRAME_VERSION_NUMBER,
            spacecraft_id: SPACECRAFT_ID,
            vcid,
            operational_control_field_flag: false,
            master_channel_frame_count,
            virtual_channel_frame_count,
            secondary_header_flag: false,
            synchronization_flag: false,
            packet_order_flag: false,
            segment_length_id: Self::SEGMENT_LENGTH_ID,
            first_header_pointer: UInt::ZERO,
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
            spacecraft_id: SpacecraftId::new(r.get()),
            vcid: Vcid::new(r.get()),
            operational_control_field_flag: r.get::<1>().value() == 1,
            master_channel_frame_count: r.get_u8(),
            virtual_channel_frame_count: r.get_u8(),
            secondary_header_flag: r.get::<1>().value() == 1,
            synchronization_flag: r.get::<1>().value() == 1,
            packet_order_flag: r.get::<1>().value() == 1,
            segment_length_id: r.get(),
            first_header_pointer: r.get(),
        })
    }

    /// Serialize into the first [TmPrimaryHeader::LEN] bytes of `dst`.
    pub fn encode(&self, dst: &mut [u8]) {
        BitWriter::new(&mut dst[..Self::LEN])
            .put(self.version)
            .put(self.spacecraft_id.value())
            .put(self.vcid.value())
            .put(UInt::<1>::new(self.operational_control_field_flag.into()))
            .put_u8(self.master_channel_frame_count)
            .put_u8(self.virtual_channel_frame_count)
            .put(UInt::<1>::new(self.secondary_header_flag.into()))
            .put(UInt::<1>::new(self.synchronization_flag.into()))
            .put(UInt::<1>::new(self.packet_order_flag.into()))
            .put(self.segment_length_id)
            .put(self.first_header_pointer);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Ready,
}

/// Builder of outgoing TM transfer frames.
///
/// A frame is started with [TmTransferFrame::start_new], filled through the
/// returned [Building] and completed with [Building::finish], after which
/// [TmTransferFrame::as_bytes] returns it. The same instance is reused for the
/// next frame.
#[derive(Debug)]
pub struct TmTransferFrame {
    counters: Arc<TmFrameCounters>,
    buffer: Frame,
    state: State,
}

impl TmTransferFrame {
    #[must_use]
    pub fn new(counters: Arc<TmFrameCounters>) -> Self {
        Self {
            counters,
            buffer: [0; TRANSFER_FRAME_LENGTH],
            state: State::Idle,
        }
    }

    /// Start a new frame on `vcid`, discarding any previous one.
    ///
    /// # Errors
    /// [Error::InvalidVcid] if `vcid` is not one of the spacecraft's channels.
    pub fn start_new(&mut self, vcid: Vcid) -> Result<Building<'_>> {
        if !vcid.is_valid() {
            return Err(Error::InvalidVcid(vcid.raw()));
        }
        self.state = State::Idle;
        let (header, data) = self
            .buffer
            .split_at_mut(TRANSFER_FRAME_PRIMARY_HEADER_LENGTH);
        Ok(Building {
            vcid,
            counters: &self.counters,
            header,
            data_field: DataField::new(data),
            state: &mut self.state,
        })
    }

    /// The finished frame, or `None` if no frame has been finished since the
    /// last [TmTransferFrame::start_new].
    #[must_use]
    pub fn as_bytes(&self) -> Option<&Frame> {
        (self.state == State::Ready).then_some(&self.buffer)
    }

    /// The finished frame as the message part of a channel coding block.
    #[must_use]
    pub fn to_block(&self) -> Option<Block> {
        let frame = self.as_bytes()?;
        let mut block = [0; crate::config::BLOCK_LENGTH];
        block[..TRANSFER_FRAME_LENGTH].copy_from_slice(frame);
        Some(block)
    }
}

/// A TM frame under construction.
#[derive(Debug)]
pub struct Building<'a> {
    vcid: Vcid,
    counters: &'a TmFrameCounters,
    header: &'a mut [u8],
    data_field: DataField<'a>,
    state: &'a mut State,
}

impl<'a> Building<'a> {
    /// Append `payload` to the data field.
    ///
    /// # Errors
    /// [Error::CapacityExceeded] if it does not fit into the remaining space.
    pub fn add<P: Payload + ?Sized>(&mut self, payload: &P) -> Result<()> {
        payload.add_to(&mut self.data_field)
    }

    /// The data field, for adding space packets or PDUs.
    pub fn data_field(&mut self) -> &mut DataField<'a> {
        &mut self.data_field
    }

    #[must_use]
    pub fn vcid(&self) -> Vcid {
        self.vcid
    }

    /// Stamp the frame counts, write the primary header and pad the rest of
    /// the data field with idle data.
    pub fn finish(mut self) {
        // Both ids are known valid so the counters always exist
        let mc_count = self
            .counters
            .master_channel
            .post_increment(SPACECRAFT_ID)
            .unwrap_or_default();
        let vc_count = self
            .counters
            .virtual_channel
            .post_increment(self.vcid)
            .unwrap_or_default();

        TmPrimaryHeader::new(self.vcid, mc_count, vc_count).encode(self.header);
        let used = self.data_field.len();
        self.data_field.fill_remaining(IDLE_DATA);
        *self.state = State::Ready;

        debug!(
            vcid = self.vcid.raw(),
            mc_count, vc_count, used, "finished tm transfer frame"
        );
    }
}

/// Ground-side view of a received TM frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TmTransferFrameView<'a> {
    pub header: TmPrimaryHeader,
    pub data_field: &'a [u8],
}

/// Decode a downlinked frame and check that it belongs to this spacecraft.
///
/// # Errors
/// * [Error::InvalidTransferFrame] for a wrong version number
/// * [Error::InvalidSpacecraftId] for a foreign spacecraft
/// * [Error::InvalidVcid] for an unknown virtual channel
pub fn parse_as_tm_transfer_frame(frame: &Frame) -> Result<TmTransferFrameView<'_>> {
    let Some(header) = TmPrimaryHeader::decode(frame) else {
        return Err(Error::BufferTooSmall {
            actual: frame.len(),
            minimum: TmPrimaryHeader::LEN,
        });
    };
    if header.version != TRANSFER_FRAME_VERSION_NUMBER {
        return Err(Error::InvalidTransferFrame);
    }
    if !header.spacecraft_id.is_valid() {
        return Err(Error::InvalidSpacecraftId(header.spacecraft_id.raw()));
    }
    if !header.vcid.is_valid() {
        return Err(Error::InvalidVcid(header.vcid.raw()));
    }
    Ok(TmTransferFrameView {
        header,
        data_field: &frame[TmPrimaryHeader::LEN..],
    })
}
