//! Packet Utilization Standard secondary headers.
//!
//! On the downlink the secondary header identifies the report being sent, on
//! the uplink it identifies the request and its sender.

pub mod tm {
    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};
    use typed_builder::TypedBuilder;

    use crate::bits::BitWriter;
    use crate::config::tm::{PACKET_PUS_VERSION_NUMBER, PACKET_SECONDARY_HEADER_LENGTH};
    use crate::config::{ApplicationProcessUserId, APPLICATION_PROCESS_USER_ID};
    use crate::id::restricted_id;
    use crate::payload::Payload;
    use crate::UInt;

    restricted_id! {
        /// Service type and subtype of a report, packed as `service << 8 | subtype`.
        pub struct MessageTypeId(UInt<16>) = [
            0x0101, 0x0102, 0x0107, 0x0108, // request verification
            0x0319,                         // housekeeping parameter report
            0x0606,                         // memory dump
            0x1402,                         // parameter value report
            0x1704, 0x170D,                 // file management
        ];
    }

    impl MessageTypeId {
        pub const SUCCESSFUL_ACCEPTANCE_VERIFICATION: Self = Self::make(0x0101);
        pub const FAILED_ACCEPTANCE_VERIFICATION: Self = Self::make(0x0102);
        pub const SUCCESSFUL_COMPLETION_OF_EXECUTION_VERIFICATION: Self = Self::make(0x0107);
        pub const FAILED_COMPLETION_OF_EXECUTION_VERIFICATION: Self = Self::make(0x0108);
        pub const HOUSEKEEPING_PARAMETER_REPORT: Self = Self::make(0x0319);
        pub const DUMPED_RAW_MEMORY_DATA_REPORT: Self = Self::make(0x0606);
        pub const PARAMETER_VALUE_REPORT: Self = Self::make(0x1402);
        pub const REPOSITORY_CONTENT_SUMMARY_REPORT: Self = Self::make(0x170D);
        pub const FILE_ATTRIBUTE_REPORT: Self = Self::make(0x1704);

        #[must_use]
        pub const fn from_fields(service_type: u8, subtype: u8) -> Self {
            Self::from_raw(((service_type as u64) << 8) | subtype as u64)
        }

        #[must_use]
        #[allow(clippy::cast_possible_truncation)]
        pub const fn service_type(self) -> u8 {
            (self.raw() >> 8) as u8
        }

        #[must_use]
        #[allow(clippy::cast_possible_truncation)]
        pub const fn subtype(self) -> u8 {
            self.raw() as u8
        }
    }

    /// Secondary header of a TM space packet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct SecondaryHeader {
        #[builder(default = PACKET_PUS_VERSION_NUMBER)]
        pub pus_version: UInt<4>,
        #[builder(default)]
        pub time_reference_status: UInt<4>,
        pub message_type_id: MessageTypeId,
        #[builder(default)]
        pub message_type_counter: u16,
        #[builder(default = APPLICATION_PROCESS_USER_ID)]
        pub destination_id: ApplicationProcessUserId,
        /// Spacecraft time in seconds.
        #[builder(default)]
        pub time: i32,
    }

    impl SecondaryHeader {
        pub const LEN: usize = PACKET_SECONDARY_HEADER_LENGTH;
    }

    impl Payload for SecondaryHeader {
        fn size(&self) -> usize {
            Self::LEN
        }

        fn write_to(&self, dst: &mut [u8]) {
            BitWriter::new(dst)
                .put(self.pus_version)
                .put(self.time_reference_status)
                .put(self.message_type_id.value())
                .put_u16(self.message_type_counter)
                .put(self.destination_id.value())
                .put_bytes(&self.time.to_be_bytes());
        }
    }

    /// A report: secondary header followed by the message data.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Report<'a> {
        pub header: SecondaryHeader,
        pub data: &'a [u8],
    }

    impl Payload for Report<'_> {
        fn size(&self) -> usize {
            SecondaryHeader::LEN + self.data.len()
        }

        fn write_to(&self, dst: &mut [u8]) {
            let (header, data) = dst.split_at_mut(SecondaryHeader::LEN);
            self.header.write_to(header);
            data.copy_from_slice(self.data);
        }
    }
}

pub mod tc {
    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    use crate::bits::{BitReader, BitWriter};
    use crate::config::tc::{PACKET_PUS_VERSION_NUMBER, PACKET_SECONDARY_HEADER_LENGTH};
    use crate::config::{ApplicationProcessUserId, APPLICATION_PROCESS_USER_ID};
    use crate::id::restricted_id;
    use crate::payload::Payload;
    use crate::{Error, RestrictedId, Result, UInt};

    restricted_id! {
        /// Service type and subtype of a request, packed as `service << 8 | subtype`.
        pub struct MessageTypeId(UInt<16>) = [
            0x0602, 0x0605,                 // memory management
            0x0801,                         // function management
            0x1401, 0x1403,                 // parameter management
            0x1702, 0x1703, 0x170C, 0x170E, // file management
        ];
    }

    impl MessageTypeId {
        pub const LOAD_RAW_MEMORY_DATA_AREAS: Self = Self::make(0x0602);
        pub const DUMP_RAW_MEMORY_DATA: Self = Self::make(0x0605);
        pub const PERFORM_A_FUNCTION: Self = Self::make(0x0801);
        pub const REPORT_PARAMETER_VALUES: Self = Self::make(0x1401);
        pub const SET_PARAMETER_VALUES: Self = Self::make(0x1403);
        pub const DELETE_A_FILE: Self = Self::make(0x1702);
        pub const REPORT_FILE_ATTRIBUTES: Self = Self::make(0x1703);
        pub const SUMMARY_REPORT_THE_CONTENT_OF_A_REPOSITORY: Self = Self::make(0x170C);
        pub const COPY_A_FILE: Self = Self::make(0x170E);

        #[must_use]
        pub const fn from_fields(service_type: u8, subtype: u8) -> Self {
            Self::from_raw(((service_type as u64) << 8) | subtype as u64)
        }

        #[must_use]
        #[allow(clippy::cast_possible_truncation)]
        pub const fn service_type(self) -> u8 {
            (self.raw() >> 8) as u8
        }

        #[must_use]
        #[allow(clippy::cast_possible_truncation)]
        pub const fn subtype(self) -> u8 {
            self.raw() as u8
        }
    }

    /// Secondary header of a TC space packet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct SecondaryHeader {
        pub pus_version: UInt<4>,
        pub acknowledgement_flags: UInt<4>,
        pub message_type_id: MessageTypeId,
        pub source_id: ApplicationProcessUserId,
    }

    impl SecondaryHeader {
        pub const LEN: usize = PACKET_SECONDARY_HEADER_LENGTH;

        /// Header of a request sent by the ground station, without acknowledgements.
        #[must_use]
        pub fn new(message_type_id: MessageTypeId) -> Self {
            Self {
                pus_version: PACKET_PUS_VERSION_NUMBER,
                acknowledgement_flags: UInt::ZERO,
                message_type_id,
                source_id: APPLICATION_PROCESS_USER_ID,
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
                pus_version: r.get(),
                acknowledgement_flags: r.get(),
                message_type_id: MessageTypeId::new(r.get()),
                source_id: ApplicationProcessUserId::new(r.get()),
            })
        }
    }

    impl Payload for SecondaryHeader {
        fn size(&self) -> usize {
            Self::LEN
        }

        fn write_to(&self, dst: &mut [u8]) {
            BitWriter::new(dst)
                .put(self.pus_version)
                .put(self.acknowledgement_flags)
                .put(self.message_type_id.value())
                .put(self.source_id.value());
        }
    }

    /// A request: the data field of a TC space packet with a secondary header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Request<'a> {
        pub header: SecondaryHeader,
        pub application_data: &'a [u8],
    }

    impl Payload for Request<'_> {
        fn size(&self) -> usize {
            SecondaryHeader::LEN + self.application_data.len()
        }

        fn write_to(&self, dst: &mut [u8]) {
            let (header, data) = dst.split_at_mut(SecondaryHeader::LEN);
            self.header.write_to(header);
            data.copy_from_slice(self.application_data);
        }
    }

    /// Split the data field of a TC space packet into its secondary header and
    /// application data.
    ///
    /// # Errors
    /// * [Error::BufferTooSmall] if shorter than the secondary header
    /// * [Error::InvalidSpacePacket] for an unsupported PUS version
    /// * [Error::InvalidMessageTypeId] for an unknown request
    /// * [Error::InvalidSourceId] for an unknown sender
    pub fn parse_as_request(buffer: &[u8]) -> Result<Request<'_>> {
        let header = SecondaryHeader::decode(buffer).ok_or(Error::BufferTooSmall {
            actual: buffer.len(),
            minimum: SecondaryHeader::LEN,
        })?;
        if header.pus_version != PACKET_PUS_VERSION_NUMBER {
            return Err(Error::InvalidSpacePacket);
        }
        if !header.message_type_id.is_valid() {
            return Err(Error::InvalidMessageTypeId {
                service: header.message_type_id.service_type(),
                subtype: header.message_type_id.subtype(),
            });
        }
        if !header.source_id.is_valid() {
            return Err(Error::InvalidSourceId(header.source_id.raw()));
        }
        Ok(Request {
            header,
            application_data: &buffer[SecondaryHeader::LEN..],
        })
    }
}
