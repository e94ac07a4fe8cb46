//! Space Data Link Protocol transfer frames.
//!
//! Both directions use frames of exactly one Reed-Solomon message. TM frames
//! are built on board and parsed on ground, TC frames are built on ground and
//! parsed (and authenticated) on board.
pub mod auth;
pub mod tc;
pub mod tm;

pub use tc::{
    parse_as_transfer_frame, TcFrameBuilder, TcFrameCounters, TcPrimaryHeader, TcTransferFrame,
};
pub use tm::{
    parse_as_tm_transfer_frame, Building, TmFrameCounters, TmPrimaryHeader, TmTransferFrame,
    TmTransferFrameView,
};
