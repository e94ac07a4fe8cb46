#![doc = include_str!("../README.md")]

mod bits;
mod error;

pub mod cfdp;
pub mod coding;
pub mod config;
pub mod counters;
pub mod framing;
pub mod id;
pub mod payload;
pub mod spacepacket;
pub mod uint;

pub use config::{
    ApplicationProcessUserId, Apid, ChecksumType, EntityId, SpacecraftId, Vcid,
    APPLICATION_PROCESS_USER_ID, CFDP_VCID, CUBESAT_ENTITY_ID, GROUND_STATION_ENTITY_ID,
    IDLE_PACKET_APID, NORMAL_APID, NULL_CHECKSUM_TYPE, PUS_VCID, SPACECRAFT_ID,
};
pub use counters::{Counter, IdCounters};
pub use error::{Error, Result};
pub use id::RestrictedId;
pub use payload::{DataField, Payload};
pub use uint::UInt;
