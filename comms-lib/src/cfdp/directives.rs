//! File directive PDUs.
//!
//! A directive PDU's data field is a one byte directive code followed by the
//! directive's parameter field. The `*Pdu` types here serialize and parse the
//! parameter field only, [FileDirective] adds the directive code.
use derive_more::From;
use heapless::Vec;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use super::missing::SegmentRequest;
use crate::bits::{BitReader, BitWriter};
use crate::config::{CUBESAT_ENTITY_ID, MIN_MAX_PDU_DATA_LENGTH, NULL_CHECKSUM_TYPE};
use crate::payload::Payload;
use crate::{ChecksumType, EntityId, Error, RestrictedId, Result, UInt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum DirectiveCode {
    EndOfFile = 4,
    Finished = 5,
    Ack = 6,
    Metadata = 7,
    Nak = 8,
}

impl TryFrom<u8> for DirectiveCode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            4 => Self::EndOfFile,
            5 => Self::Finished,
            6 => Self::Ack,
            7 => Self::Metadata,
            8 => Self::Nak,
            _ => return Err(Error::InvalidFileDirectiveCode(value)),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConditionCode {
    #[default]
    NoError,
    PositiveAckLimitReached,
    KeepAliveLimitReached,
    InvalidTransmissionMode,
    FilestoreRejection,
    FileChecksumFailure,
    FileSizeError,
    NakLimitReached,
    InactivityDetected,
    InvalidFileStructure,
    CheckLimitReached,
    UnsupportedChecksumType,
    Reserved12,
    Reserved13,
    SuspendRequestReceived,
    CancelRequestReceived,
}

impl ConditionCode {
    const ALL: [Self; 16] = [
        Self::NoError,
        Self::PositiveAckLimitReached,
        Self::KeepAliveLimitReached,
        Self::InvalidTransmissionMode,
        Self::FilestoreRejection,
        Self::FileChecksumFailure,
        Self::FileSizeError,
        Self::NakLimitReached,
        Self::InactivityDetected,
        Self::InvalidFileStructure,
        Self::CheckLimitReached,
        Self::UnsupportedChecksumType,
        Self::Reserved12,
        Self::Reserved13,
        Self::SuspendRequestReceived,
        Self::CancelRequestReceived,
    ];
}

impl From<UInt<4>> for ConditionCode {
    #[allow(clippy::cast_possible_truncation)]
    fn from(value: UInt<4>) -> Self {
        Self::ALL[value.value() as usize]
    }
}

impl From<ConditionCode> for UInt<4> {
    fn from(value: ConditionCode) -> Self {
        UInt::new(value as u64)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeliveryCode {
    #[default]
    Complete,
    Incomplete,
}

impl From<UInt<1>> for DeliveryCode {
    fn from(value: UInt<1>) -> Self {
        if value.value() == 0 {
            Self::Complete
        } else {
            Self::Incomplete
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FileStatus {
    DiscardedDeliberately,
    DiscardedByFilestore,
    Retained,
    #[default]
    Unreported,
}

impl From<UInt<2>> for FileStatus {
    fn from(value: UInt<2>) -> Self {
        match value.value() {
            0 => Self::DiscardedDeliberately,
            1 => Self::DiscardedByFilestore,
            2 => Self::Retained,
            _ => Self::Unreported,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TransactionStatus {
    #[default]
    Undefined,
    Active,
    Terminated,
    Unrecognized,
}

impl From<UInt<2>> for TransactionStatus {
    fn from(value: UInt<2>) -> Self {
        match value.value() {
            0 => Self::Undefined,
            1 => Self::Active,
            2 => Self::Terminated,
            _ => Self::Unrecognized,
        }
    }
}

/// Entity ID TLV naming the entity where a fault occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FaultLocation {
    pub entity_id: EntityId,
}

impl FaultLocation {
    pub const LEN: usize = 3;
    const TLV_TYPE_ENTITY_ID: u8 = 6;

    #[must_use]
    pub const fn new(entity_id: EntityId) -> Self {
        Self { entity_id }
    }

    fn write_to(self, w: &mut BitWriter<'_>) {
        w.put_u8(Self::TLV_TYPE_ENTITY_ID)
            .put_u8(1)
            .put(self.entity_id.value());
    }

    /// `buf` must hold exactly [FaultLocation::LEN] bytes.
    fn parse(buf: &[u8]) -> Result<Self> {
        match buf {
            &[Self::TLV_TYPE_ENTITY_ID, 1, raw] => {
                let entity_id = EntityId::from_raw(u64::from(raw));
                if entity_id.is_valid() {
                    Ok(Self::new(entity_id))
                } else {
                    Err(Error::InvalidFaultLocation)
                }
            }
            _ => Err(Error::InvalidFaultLocation),
        }
    }
}

impl Default for FaultLocation {
    fn default() -> Self {
        Self::new(CUBESAT_ENTITY_ID)
    }
}

fn check_min_len(buffer: &[u8], minimum: usize) -> Result<()> {
    if buffer.len() < minimum {
        return Err(Error::BufferTooSmall {
            actual: buffer.len(),
            minimum,
        });
    }
    Ok(())
}

/// Parse the fault location that follows `min_len` bytes of a parameter field
/// that must be exactly `min_len + FaultLocation::LEN` bytes long.
fn parse_trailing_fault_location(buffer: &[u8], min_len: usize) -> Result<FaultLocation> {
    let expected = min_len + FaultLocation::LEN;
    if buffer.len() != expected {
        return Err(Error::InvalidDataLength {
            actual: buffer.len(),
            expected,
        });
    }
    FaultLocation::parse(&buffer[min_len..])
}

/// End-of-file PDU parameter field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EndOfFilePdu {
    pub condition_code: ConditionCode,
    pub file_checksum: u32,
    pub file_size: u32,
    /// Only present on the wire if the condition code is not `NoError`.
    pub fault_location: FaultLocation,
}

impl EndOfFilePdu {
    pub const DIRECTIVE_CODE: DirectiveCode = DirectiveCode::EndOfFile;
    pub const MIN_LEN: usize = 9;

    /// EOF of a completely sent file.
    #[must_use]
    pub fn new(file_size: u32) -> Self {
        Self {
            file_size,
            ..Self::default()
        }
    }

    /// EOF of a transaction cancelled because of `condition_code`.
    #[must_use]
    pub fn with_error(
        condition_code: ConditionCode,
        file_size: u32,
        fault_location: FaultLocation,
    ) -> Self {
        Self {
            condition_code,
            file_checksum: 0,
            file_size,
            fault_location,
        }
    }

    #[must_use]
    pub fn has_fault_location(&self) -> bool {
        self.condition_code != ConditionCode::NoError
    }
}

impl Payload for EndOfFilePdu {
    fn size(&self) -> usize {
        if self.has_fault_location() {
            Self::MIN_LEN + FaultLocation::LEN
        } else {
            Self::MIN_LEN
        }
    }

    fn write_to(&self, dst: &mut [u8]) {
        let mut w = BitWriter::new(dst);
        w.put(UInt::<4>::from(self.condition_code))
            .put(UInt::<4>::ZERO)
            .put_u32(self.file_checksum)
            .put_u32(self.file_size);
        if self.has_fault_location() {
            self.fault_location.write_to(&mut w);
        }
    }
}

/// # Errors
/// * [Error::BufferTooSmall] if shorter than [EndOfFilePdu::MIN_LEN]
/// * [Error::InvalidDataLength] if a fault location is expected and the
///   buffer does not have exactly the length to hold it
/// * [Error::InvalidFaultLocation] if the fault location is not a valid entity
///   ID TLV
pub fn parse_as_end_of_file_pdu(buffer: &[u8]) -> Result<EndOfFilePdu> {
    check_min_len(buffer, EndOfFilePdu::MIN_LEN)?;
    let mut r = BitReader::new(buffer);
    let condition_code = ConditionCode::from(r.get::<4>());
    let _spare = r.get::<4>();
    let mut pdu = EndOfFilePdu {
        condition_code,
        file_checksum: r.get_u32(),
        file_size: r.get_u32(),
        fault_location: FaultLocation::default(),
    };
    if pdu.has_fault_location() {
        pdu.fault_location = parse_trailing_fault_location(buffer, EndOfFilePdu::MIN_LEN)?;
    }
    Ok(pdu)
}

/// Finished PDU parameter field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FinishedPdu {
    pub condition_code: ConditionCode,
    pub delivery_code: DeliveryCode,
    pub file_status: FileStatus,
    /// Only present on the wire if the condition code is neither `NoError` nor
    /// `UnsupportedChecksumType`.
    pub fault_location: FaultLocation,
}

impl FinishedPdu {
    pub const DIRECTIVE_CODE: DirectiveCode = DirectiveCode::Finished;
    pub const MIN_LEN: usize = 1;

    #[must_use]
    pub fn new(delivery_code: DeliveryCode, file_status: FileStatus) -> Self {
        Self {
            condition_code: ConditionCode::NoError,
            delivery_code,
            file_status,
            fault_location: FaultLocation::default(),
        }
    }

    #[must_use]
    pub fn with_error(
        condition_code: ConditionCode,
        delivery_code: DeliveryCode,
        file_status: FileStatus,
        fault_location: FaultLocation,
    ) -> Self {
        Self {
            condition_code,
            delivery_code,
            file_status,
            fault_location,
        }
    }

    #[must_use]
    pub fn has_fault_location(&self) -> bool {
        !matches!(
            self.condition_code,
            ConditionCode::NoError | ConditionCode::UnsupportedChecksumType
        )
    }
}

impl Payload for FinishedPdu {
    fn size(&self) -> usize {
        if self.has_fault_location() {
            Self::MIN_LEN + FaultLocation::LEN
        } else {
            Self::MIN_LEN
        }
    }

    fn write_to(&self, dst: &mut [u8]) {
        let mut w = BitWriter::new(dst);
        w.put(UInt::<4>::from(self.condition_code))
            .put(UInt::<1>::ZERO)
            .put(UInt::<1>::new(self.delivery_code as u64))
            .put(UInt::<2>::new(self.file_status as u64));
        if self.has_fault_location() {
            self.fault_location.write_to(&mut w);
        }
    }
}

/// # Errors
/// Like [parse_as_end_of_file_pdu].
pub fn parse_as_finished_pdu(buffer: &[u8]) -> Result<FinishedPdu> {
    check_min_len(buffer, FinishedPdu::MIN_LEN)?;
    let mut r = BitReader::new(buffer);
    let condition_code = ConditionCode::from(r.get::<4>());
    let _spare = r.get::<1>();
    let mut pdu = FinishedPdu {
        condition_code,
        delivery_code: r.get::<1>().into(),
        file_status: r.get::<2>().into(),
        fault_location: FaultLocation::default(),
    };
    if pdu.has_fault_location() {
        pdu.fault_location = parse_trailing_fault_location(buffer, FinishedPdu::MIN_LEN)?;
    }
    Ok(pdu)
}

/// Acknowledgement of an EOF or Finished PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AckPdu {
    pub acknowledged_directive: DirectiveCode,
    /// 1 if a Finished PDU is acknowledged, 0 otherwise.
    pub directive_subtype: UInt<4>,
    pub condition_code: ConditionCode,
    pub transaction_status: TransactionStatus,
}

impl AckPdu {
    pub const DIRECTIVE_CODE: DirectiveCode = DirectiveCode::Ack;
    pub const LEN: usize = 2;

    #[must_use]
    pub fn new(
        acknowledged_directive: DirectiveCode,
        condition_code: ConditionCode,
        transaction_status: TransactionStatus,
    ) -> Self {
        let directive_subtype = if acknowledged_directive == DirectiveCode::Finished {
            UInt::new(1)
        } else {
            UInt::ZERO
        };
        Self {
            acknowledged_directive,
            directive_subtype,
            condition_code,
            transaction_status,
        }
    }
}

impl Payload for AckPdu {
    fn size(&self) -> usize {
        Self::LEN
    }

    fn write_to(&self, dst: &mut [u8]) {
        BitWriter::new(dst)
            .put(UInt::<4>::new(self.acknowledged_directive as u64))
            .put(self.directive_subtype)
            .put(UInt::<4>::from(self.condition_code))
            .put(UInt::<2>::ZERO)
            .put(UInt::<2>::new(self.transaction_status as u64));
    }
}

/// # Errors
/// * [Error::BufferTooSmall] if shorter than [AckPdu::LEN]
/// * [Error::InvalidAckPduDirectiveCode] if the acknowledged directive is
///   neither EOF nor Finished
/// * [Error::InvalidDirectiveSubtypeCode] if the subtype is neither 0 nor 1
#[allow(clippy::cast_possible_truncation)]
pub fn parse_as_ack_pdu(buffer: &[u8]) -> Result<AckPdu> {
    check_min_len(buffer, AckPdu::LEN)?;
    let mut r = BitReader::new(buffer);
    let code = r.get::<4>().value() as u8;
    let acknowledged_directive = match DirectiveCode::try_from(code) {
        Ok(directive @ (DirectiveCode::EndOfFile | DirectiveCode::Finished)) => directive,
        _ => return Err(Error::InvalidAckPduDirectiveCode(code)),
    };
    let directive_subtype = r.get::<4>();
    if directive_subtype.value() > 1 {
        return Err(Error::InvalidDirectiveSubtypeCode(directive_subtype.value() as u8));
    }
    let condition_code = ConditionCode::from(r.get::<4>());
    let _spare = r.get::<2>();
    Ok(AckPdu {
        acknowledged_directive,
        directive_subtype,
        condition_code,
        transaction_status: r.get::<2>().into(),
    })
}

/// Metadata PDU parameter field, announcing a file transfer.
///
/// File names are length-value encoded with a one byte length, so names
/// longer than 255 bytes cannot be represented. They do not fit into a PDU
/// anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct MetadataPdu<'a> {
    /// Always false in acknowledged mode.
    #[builder(default)]
    pub closure_requested: bool,
    #[builder(default = NULL_CHECKSUM_TYPE)]
    pub checksum_type: ChecksumType,
    pub file_size: u32,
    #[cfg_attr(feature = "serde", serde(with = "serde_bytes"))]
    pub source_file_name: &'a [u8],
    #[cfg_attr(feature = "serde", serde(with = "serde_bytes"))]
    pub destination_file_name: &'a [u8],
}

impl MetadataPdu<'_> {
    pub const DIRECTIVE_CODE: DirectiveCode = DirectiveCode::Metadata;
    /// Flags, file size and source file name length.
    pub const MIN_LEN: usize = 6;
}

impl Payload for MetadataPdu<'_> {
    fn size(&self) -> usize {
        Self::MIN_LEN + self.source_file_name.len() + 1 + self.destination_file_name.len()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_to(&self, dst: &mut [u8]) {
        BitWriter::new(dst)
            .put(UInt::<1>::ZERO)
            .put(UInt::<1>::new(self.closure_requested.into()))
            .put(UInt::<2>::ZERO)
            .put(self.checksum_type.value())
            .put_u32(self.file_size)
            .put_u8(self.source_file_name.len() as u8)
            .put_bytes(self.source_file_name)
            .put_u8(self.destination_file_name.len() as u8)
            .put_bytes(self.destination_file_name);
    }
}

/// Parse a metadata PDU parameter field. File names borrow from `buffer`.
///
/// The checksum type is taken as is, without checking it is supported.
///
/// # Errors
/// [Error::BufferTooSmall] if the buffer ends before the fixed fields or
/// either file name.
pub fn parse_as_metadata_pdu(buffer: &[u8]) -> Result<MetadataPdu<'_>> {
    check_min_len(buffer, MetadataPdu::MIN_LEN)?;
    let mut r = BitReader::new(buffer);
    let _reserved = r.get::<1>();
    let closure_requested = r.get::<1>().value() == 1;
    let _reserved = r.get::<2>();
    let checksum_type = ChecksumType::new(r.get());
    let file_size = r.get_u32();

    let source_start = MetadataPdu::MIN_LEN;
    let source_end = source_start + usize::from(r.get_u8());
    check_min_len(buffer, source_end + 1)?;
    let destination_start = source_end + 1;
    let destination_end = destination_start + usize::from(buffer[source_end]);
    check_min_len(buffer, destination_end)?;

    Ok(MetadataPdu {
        closure_requested,
        checksum_type,
        file_size,
        source_file_name: &buffer[source_start..source_end],
        destination_file_name: &buffer[destination_start..destination_end],
    })
}

/// Most segment requests a NAK PDU fits in either direction.
pub const MAX_SEGMENT_REQUESTS: usize =
    (MIN_MAX_PDU_DATA_LENGTH - 1 - 2 * 4) / SegmentRequest::LEN;

pub type SegmentRequests = Vec<SegmentRequest, MAX_SEGMENT_REQUESTS>;

/// Negative acknowledgement requesting retransmission of file data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NakPdu {
    pub start_of_scope: u32,
    pub end_of_scope: u32,
    pub segment_requests: SegmentRequests,
}

impl NakPdu {
    pub const DIRECTIVE_CODE: DirectiveCode = DirectiveCode::Nak;
    pub const MIN_LEN: usize = 8;

    /// NAK covering `requests`, which must be ordered by offset. The scope
    /// spans from the first request's start to the last request's end.
    ///
    /// # Errors
    /// * [Error::TooManySegmentRequests] for more than [MAX_SEGMENT_REQUESTS]
    /// * [Error::InvalidSegmentRequest] if a request ends before it starts
    pub fn from_requests(requests: &[SegmentRequest]) -> Result<Self> {
        if let Some(bad) = requests.iter().find(|r| r.start_offset > r.end_offset) {
            return Err(Error::InvalidSegmentRequest {
                start: bad.start_offset,
                end: bad.end_offset,
            });
        }
        let segment_requests = SegmentRequests::from_slice(requests)
            .map_err(|()| Error::TooManySegmentRequests(requests.len()))?;
        Ok(Self {
            start_of_scope: requests.first().map_or(0, |r| r.start_offset),
            end_of_scope: requests.last().map_or(0, |r| r.end_offset),
            segment_requests,
        })
    }
}

impl Payload for NakPdu {
    fn size(&self) -> usize {
        Self::MIN_LEN + self.segment_requests.len() * SegmentRequest::LEN
    }

    fn write_to(&self, dst: &mut [u8]) {
        BitWriter::new(dst)
            .put_u32(self.start_of_scope)
            .put_u32(self.end_of_scope);
        for (request, chunk) in self
            .segment_requests
            .iter()
            .zip(dst[Self::MIN_LEN..].chunks_exact_mut(SegmentRequest::LEN))
        {
            request.write_to(chunk);
        }
    }
}

/// # Errors
/// * [Error::BufferTooSmall] if shorter than [NakPdu::MIN_LEN]
/// * [Error::InvalidDataLength] if the requests do not fill the buffer exactly
/// * [Error::TooManySegmentRequests] for more than [MAX_SEGMENT_REQUESTS]
/// * [Error::InvalidNakPdu] if the end of scope is not the end of the last
///   request
pub fn parse_as_nak_pdu(buffer: &[u8]) -> Result<NakPdu> {
    check_min_len(buffer, NakPdu::MIN_LEN)?;
    let requests = &buffer[NakPdu::MIN_LEN..];
    let remainder = requests.len() % SegmentRequest::LEN;
    if remainder != 0 {
        return Err(Error::InvalidDataLength {
            actual: buffer.len(),
            expected: buffer.len() - remainder,
        });
    }
    let n = requests.len() / SegmentRequest::LEN;
    if n > MAX_SEGMENT_REQUESTS {
        return Err(Error::TooManySegmentRequests(n));
    }

    let mut r = BitReader::new(buffer);
    let mut pdu = NakPdu {
        start_of_scope: r.get_u32(),
        end_of_scope: r.get_u32(),
        segment_requests: SegmentRequests::new(),
    };
    for request in requests
        .chunks_exact(SegmentRequest::LEN)
        .filter_map(SegmentRequest::decode)
    {
        pdu.segment_requests
            .push(request)
            .map_err(|_| Error::TooManySegmentRequests(n))?;
    }
    if let Some(last) = pdu.segment_requests.last() {
        if last.end_offset != pdu.end_of_scope {
            return Err(Error::InvalidNakPdu);
        }
    }
    Ok(pdu)
}

/// The data field of a file directive PDU, split into code and parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDirectivePdu<'a> {
    pub directive_code: DirectiveCode,
    pub parameter_field: &'a [u8],
}

/// # Errors
/// * [Error::BufferTooSmall] if `buffer` is empty
/// * [Error::InvalidFileDirectiveCode] for an unknown directive code
pub fn parse_as_file_directive_pdu(buffer: &[u8]) -> Result<FileDirectivePdu<'_>> {
    let Some((&code, parameter_field)) = buffer.split_first() else {
        return Err(Error::BufferTooSmall {
            actual: 0,
            minimum: 1,
        });
    };
    Ok(FileDirectivePdu {
        directive_code: DirectiveCode::try_from(code)?,
        parameter_field,
    })
}

/// Any file directive, serialized as the complete directive PDU data field.
#[derive(Debug, Clone, PartialEq, Eq, From)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum FileDirective<'a> {
    EndOfFile(EndOfFilePdu),
    Finished(FinishedPdu),
    Ack(AckPdu),
    Metadata(MetadataPdu<'a>),
    Nak(NakPdu),
}

impl FileDirective<'_> {
    #[must_use]
    pub fn directive_code(&self) -> DirectiveCode {
        match self {
            Self::EndOfFile(_) => EndOfFilePdu::DIRECTIVE_CODE,
            Self::Finished(_) => FinishedPdu::DIRECTIVE_CODE,
            Self::Ack(_) => AckPdu::DIRECTIVE_CODE,
            Self::Metadata(_) => MetadataPdu::DIRECTIVE_CODE,
            Self::Nak(_) => NakPdu::DIRECTIVE_CODE,
        }
    }

    fn parameters(&self) -> &dyn Payload {
        match self {
            Self::EndOfFile(pdu) => pdu,
            Self::Finished(pdu) => pdu,
            Self::Ack(pdu) => pdu,
            Self::Metadata(pdu) => pdu,
            Self::Nak(pdu) => pdu,
        }
    }
}

impl Payload for FileDirective<'_> {
    fn size(&self) -> usize {
        1 + self.parameters().size()
    }

    fn write_to(&self, dst: &mut [u8]) {
        dst[0] = self.directive_code() as u8;
        self.parameters().write_to(&mut dst[1..]);
    }
}

impl<'a> TryFrom<FileDirectivePdu<'a>> for FileDirective<'a> {
    type Error = Error;

    fn try_from(pdu: FileDirectivePdu<'a>) -> Result<Self> {
        let params = pdu.parameter_field;
        Ok(match pdu.directive_code {
            DirectiveCode::EndOfFile => parse_as_end_of_file_pdu(params)?.into(),
            DirectiveCode::Finished => parse_as_finished_pdu(params)?.into(),
            DirectiveCode::Ack => parse_as_ack_pdu(params)?.into(),
            DirectiveCode::Metadata => parse_as_metadata_pdu(params)?.into(),
            DirectiveCode::Nak => parse_as_nak_pdu(params)?.into(),
        })
    }
}

/// Parse the data field of a file directive PDU into the matching directive.
///
/// # Errors
/// Any error of [parse_as_file_directive_pdu] or the directive's parser.
pub fn parse_as_file_directive(buffer: &[u8]) -> Result<FileDirective<'_>> {
    parse_as_file_directive_pdu(buffer)?.try_into()
}
