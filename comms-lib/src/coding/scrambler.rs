use crate::config::RS_BLOCK_LENGTH;

/// Additive (de)scrambling of a coded block.
///
/// Scramblers XOR the data with a fixed pseudo-random sequence, so applying
/// one twice restores the original data.
pub trait Scrambler: Send + Sync {
    fn scramble(&self, block: &mut [u8]);

    fn unscramble(&self, block: &mut [u8]) {
        self.scramble(block);
    }
}

/// Bytes of the sequence produced by an 8-bit Fibonacci LFSR seeded with all
/// ones. `taps` selects the register bits XORed into the feedback, with bit 7
/// holding the oldest sequence bit, which is also the output.
const fn lfsr_sequence<const N: usize>(taps: u8) -> [u8; N] {
    let mut sequence = [0u8; N];
    let mut register: u8 = 0xFF;
    let mut i = 0;
    while i < N {
        let mut byte = 0u8;
        let mut bit = 0;
        while bit < 8 {
            byte = (byte << 1) | (register >> 7);
            let feedback = ((register & taps).count_ones() & 1) as u8;
            register = (register << 1) | feedback;
            bit += 1;
        }
        sequence[i] = byte;
        i += 1;
    }
    sequence
}

fn xor_with(block: &mut [u8], sequence: &[u8]) {
    for (b, s) in block.iter_mut().zip(sequence.iter().cycle()) {
        *b ^= s;
    }
}

/// TM pseudo-randomizer, `h(x) = x^8 + x^7 + x^5 + x^3 + 1`.
///
/// # References
/// * [TM Synchronization and Channel Coding](https://ccsds.org/Pubs/131x0b5.pdf), Section 10
#[derive(Debug, Default, Clone, Copy)]
pub struct TmPseudoRandomizer;

impl TmPseudoRandomizer {
    pub const SEQUENCE: [u8; RS_BLOCK_LENGTH] = lfsr_sequence(0b1001_0101);
}

impl Scrambler for TmPseudoRandomizer {
    fn scramble(&self, block: &mut [u8]) {
        xor_with(block, &Self::SEQUENCE);
    }
}

/// TC randomizer, `h(x) = x^8 + x^6 + x^4 + x^3 + x^2 + x + 1`.
///
/// # References
/// * [TC Synchronization and Channel Coding](https://ccsds.org/Pubs/231x0b4e1.pdf), Section 6
#[derive(Debug, Default, Clone, Copy)]
pub struct TcRandomizer;

impl TcRandomizer {
    pub const SEQUENCE: [u8; RS_BLOCK_LENGTH] = lfsr_sequence(0b1111_1010);
}

impl Scrambler for TcRandomizer {
    fn scramble(&self, block: &mut [u8]) {
        xor_with(block, &Self::SEQUENCE);
    }
}
