//! Channel coding of the fixed-size blocks exchanged with the radio.
//!
//! Outgoing blocks are Reed-Solomon encoded and then scrambled, incoming blocks
//! are unscrambled and then corrected. With the `disable-channel-coding`
//! feature a block is just a transfer frame and both directions pass it
//! through unchanged.
mod convolutional;
#[cfg(not(feature = "disable-channel-coding"))]
mod reed_solomon;
mod scrambler;

pub use convolutional::ConvolutionalEncoder;
#[cfg(not(feature = "disable-channel-coding"))]
pub use reed_solomon::{BlockCode, DefaultReedSolomon};
pub use scrambler::{Scrambler, TcRandomizer, TmPseudoRandomizer};

use crate::config::{ATTACHED_SYNC_MARKER, ATTACHED_SYNC_MARKER_LENGTH, BLOCK_LENGTH, CADU_LENGTH};

/// One codeword, the unit handed to and received from the transport.
pub type Block = [u8; BLOCK_LENGTH];

/// Length of a CADU after convolutional encoding including the tail bits.
pub const FULLY_ENCODED_FRAME_LENGTH: usize = ConvolutionalEncoder::encoded_size(CADU_LENGTH, true);

/// Prefix `block` with the attached sync marker.
#[must_use]
pub fn attach_sync_marker(block: &Block) -> [u8; CADU_LENGTH] {
    let mut cadu = [0u8; CADU_LENGTH];
    cadu[..ATTACHED_SYNC_MARKER_LENGTH]
        .copy_from_slice(&ATTACHED_SYNC_MARKER[..ATTACHED_SYNC_MARKER_LENGTH]);
    cadu[ATTACHED_SYNC_MARKER_LENGTH..].copy_from_slice(block);
    cadu
}

macro_rules! direction {
    ($(#[$meta:meta])* $name:ident, $scrambler:expr) => {
        $(#[$meta])*
        pub mod $name {
            #[allow(unused_imports)]
            use tracing::trace;

            #[allow(unused_imports)]
            use super::*;
            use crate::Result;

            /// Fill the parity region from the message region, then scramble
            /// the whole block.
            #[cfg(not(feature = "disable-channel-coding"))]
            pub fn encode(block: &mut Block) {
                DefaultReedSolomon.encode(block);
                $scrambler.scramble(block);
            }

            /// Unscramble the whole block, then correct it in place.
            ///
            /// Returns the number of corrected symbol errors.
            ///
            /// # Errors
            /// [crate::Error::ChannelCodingFailed] if the block cannot be corrected.
            #[cfg(not(feature = "disable-channel-coding"))]
            pub fn decode(block: &mut Block) -> Result<usize> {
                $scrambler.unscramble(block);
                let result = DefaultReedSolomon.decode(block);
                match &result {
                    Ok(n) => trace!(direction = stringify!($name), corrected = n, "decoded block"),
                    Err(err) => trace!(direction = stringify!($name), error = %err, "uncorrectable block"),
                }
                result
            }

            #[cfg(feature = "disable-channel-coding")]
            pub fn encode(_block: &mut Block) {}

            #[cfg(feature = "disable-channel-coding")]
            pub fn decode(_block: &mut Block) -> Result<usize> {
                Ok(0)
            }
        }
    };
}

direction!(
    /// Downlink channel coding.
    tm,
    TmPseudoRandomizer
);
direction!(
    /// Uplink channel coding.
    tc,
    TcRandomizer
);
