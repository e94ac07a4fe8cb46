//! Rate 1/2, constraint length 7 convolutional code.
//!
//! The encoder is a Mealy machine over the last six input bits. Each input bit
//! produces two coded bits, so one input byte becomes two output bytes.
use tracing::trace;

const CONSTRAINT_LENGTH: u32 = 7;
const N_STATE_BITS: u32 = CONSTRAINT_LENGTH - 1;
const N_STATES: usize = 1 << N_STATE_BITS;
/// Generator polynomials, the least significant bit tapping the current input.
const POLYNOMIALS: [u8; 2] = [0b111_1001, 0b101_1011];

/// Coded bit pair for every register content, indexed by `state | input << 6`.
const OUTPUTS: [u8; 2 * N_STATES] = {
    let mut outputs = [0u8; 2 * N_STATES];
    let mut register = 0;
    while register < outputs.len() {
        let r = register as u8;
        let first = ((r & POLYNOMIALS[0]).count_ones() & 1) as u8;
        let second = ((r & POLYNOMIALS[1]).count_ones() & 1) as u8;
        outputs[register] = (first << 1) | second;
        register += 1;
    }
    outputs
};

#[derive(Debug, Default, Clone)]
pub struct ConvolutionalEncoder {
    state: u8,
}

impl ConvolutionalEncoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Length of the output of [ConvolutionalEncoder::encode] for `n` input bytes.
    #[must_use]
    pub const fn encoded_size(n: usize, flush: bool) -> usize {
        2 * n + if flush { 2 } else { 0 }
    }

    /// Encode `data`, continuing from the state left by the previous call.
    ///
    /// With `flush` the register is driven back to zero with six tail bits,
    /// whose twelve coded bits fill the first one and a half of two extra
    /// bytes, and the next call starts a new message.
    #[must_use]
    pub fn encode(&mut self, data: &[u8], flush: bool) -> Vec<u8> {
        let mut encoded = Vec::with_capacity(Self::encoded_size(data.len(), flush));
        for byte in data {
            let mut coded: u16 = 0;
            for shift in (0..8).step_by(2).rev() {
                let first = (byte >> (shift + 1)) & 1;
                let second = (byte >> shift) & 1;
                coded = (coded << 4) | u16::from(self.step_twice(first, second));
            }
            encoded.extend_from_slice(&coded.to_be_bytes());
        }

        if flush {
            let mut tail: u16 = 0;
            for _ in 0..N_STATE_BITS / 2 {
                tail = (tail << 4) | u16::from(self.step_twice(0, 0));
            }
            encoded.push((tail >> 4) as u8);
            encoded.push(((tail & 0xF) << 4) as u8);
            trace!(input = data.len(), output = encoded.len(), "flushed convolutional encoder");
            self.state = 0;
        }
        encoded
    }

    /// Clock in two bits and return the four coded bits they produce.
    fn step_twice(&mut self, first: u8, second: u8) -> u8 {
        let high = self.step(first);
        let low = self.step(second);
        (high << 2) | low
    }

    fn step(&mut self, bit: u8) -> u8 {
        let output = OUTPUTS[usize::from(self.state | (bit << N_STATE_BITS))];
        self.state = (self.state >> 1) | (bit << (N_STATE_BITS - 1));
        output
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;
    use crate::config::ATTACHED_SYNC_MARKER;

    #[test]
    fn impulse_response_is_generator_polynomials() {
        let mut encoder = ConvolutionalEncoder::new();
        let encoded = encoder.encode(&[0x80], true);
        // coded pairs 11 10 11 11 00 01 11 were read off the polynomials
        // from their highest tap, followed by an all zero tail
        assert_eq!(hex::encode(encoded), "ef1c0000");
    }

    #[test]
    fn zeros_encode_to_zeros() {
        let mut encoder = ConvolutionalEncoder::new();
        assert_eq!(encoder.encode(&[0, 0], true), vec![0u8; 6]);
    }

    #[test]
    fn encodes_sync_marker() {
        let mut encoder = ConvolutionalEncoder::new();
        let encoded = encoder.encode(&ATTACHED_SYNC_MARKER, true);
        assert_eq!(hex::encode(encoded), "035d49c24ff2686b1770");
    }

    #[test]
    fn without_flush_state_carries_over() {
        let mut encoder = ConvolutionalEncoder::new();
        assert_eq!(encoder.encode(&[0xFF], false), hex::decode("d94f").unwrap());
        // the ones still in the register change the output for zero input
        assert_ne!(encoder.encode(&[0x00], false), vec![0, 0]);
    }

    #[test]
    fn flush_resets_state() {
        let mut encoder = ConvolutionalEncoder::new();
        let first = encoder.encode(&[0xA5, 0x3C], true);
        let second = encoder.encode(&[0xA5, 0x3C], true);
        assert_eq!(first, second);
    }

    #[test]
    fn chunked_encoding_equals_one_shot() {
        let mut rng = rand::thread_rng();
        let data: Vec<u8> = (0..64).map(|_| rng.gen()).collect();

        let one_shot = ConvolutionalEncoder::new().encode(&data, true);

        let mut encoder = ConvolutionalEncoder::new();
        let mut chunked = Vec::new();
        for chunk in data[..48].chunks(7) {
            chunked.extend(encoder.encode(chunk, false));
        }
        chunked.extend(encoder.encode(&data[48..], true));

        assert_eq!(chunked, one_shot);
    }

    #[test]
    fn output_length_matches_encoded_size() {
        let mut encoder = ConvolutionalEncoder::new();
        for n in [0, 1, 5, 259] {
            let data = vec![0x33; n];
            assert_eq!(
                encoder.encode(&data, false).len(),
                ConvolutionalEncoder::encoded_size(n, false)
            );
            assert_eq!(
                encoder.encode(&data, true).len(),
                ConvolutionalEncoder::encoded_size(n, true)
            );
        }
    }
}
