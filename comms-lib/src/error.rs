#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("Not enough bytes: got {actual}, need at least {minimum}")]
    BufferTooSmall { actual: usize, minimum: usize },

    /// A payload did not fit into the remaining space of a data field.
    #[error("Data field capacity exceeded: need {needed} bytes, {available} available")]
    CapacityExceeded { needed: usize, available: usize },
    #[error("Payload is empty")]
    EmptyPayload,
    #[error("Payload too large for the remaining data field")]
    TooLarge,

    /// The Reed-Solomon decoder could not correct the codeword.
    #[error("Channel decoding failed: codeword is uncorrectable")]
    ChannelCodingFailed,

    #[error("Invalid transfer frame")]
    InvalidTransferFrame,
    #[error("Invalid spacecraft ID {0:#05x}")]
    InvalidSpacecraftId(u64),
    #[error("Invalid virtual channel ID {0:#05b}")]
    InvalidVcid(u64),
    #[error("Invalid frame length {0}")]
    InvalidFrameLength(u64),
    #[error("Invalid security parameter index {0}")]
    InvalidSecurityParameterIndex(u16),
    #[error("Frame authentication failed")]
    AuthenticationFailed,

    #[error("Invalid space packet")]
    InvalidSpacePacket,
    #[error("Invalid APID {0:#05x}")]
    InvalidApid(u64),
    #[error("Invalid packet data length {0}")]
    InvalidPacketDataLength(usize),
    #[error("Invalid message type ID {service}.{subtype}")]
    InvalidMessageTypeId { service: u8, subtype: u8 },
    #[error("Invalid source ID {0:#06x}")]
    InvalidSourceId(u64),

    #[error("Invalid protocol data unit")]
    InvalidProtocolDataUnit,
    #[error("Invalid PDU data field length {0}")]
    InvalidPduDataLength(usize),
    #[error("Invalid entity ID")]
    InvalidEntityId,
    #[error("Invalid file directive code {0}")]
    InvalidFileDirectiveCode(u8),
    #[error("Invalid data length: got {actual}, expected {expected}")]
    InvalidDataLength { actual: usize, expected: usize },
    #[error("Invalid fault location")]
    InvalidFaultLocation,
    #[error("Invalid directive code {0} in ACK PDU")]
    InvalidAckPduDirectiveCode(u8),
    #[error("Invalid directive subtype code {0}")]
    InvalidDirectiveSubtypeCode(u8),
    #[error("Invalid NAK PDU")]
    InvalidNakPdu,
    #[error("Too many segment requests: {0}")]
    TooManySegmentRequests(usize),
    #[error("Invalid segment request [{start}, {end})")]
    InvalidSegmentRequest { start: u32, end: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
