use reed_solomon::{Decoder, Encoder};

use crate::config::{MESSAGE_LENGTH, N_PARITY_SYMBOLS, RS_BLOCK_LENGTH};
use crate::{Error, Result};

/// Systematic block code working in place on one codeword.
pub trait BlockCode: Send + Sync {
    /// Compute the parity region from the message region of `codeword`.
    fn encode(&self, codeword: &mut [u8; RS_BLOCK_LENGTH]);

    /// Correct `codeword` in place and return the number of corrected symbols.
    ///
    /// # Errors
    /// [Error::ChannelCodingFailed] if the codeword has more errors than the
    /// code can correct. The codeword is left as received.
    fn decode(&self, codeword: &mut [u8; RS_BLOCK_LENGTH]) -> Result<usize>;
}

/// Reed-Solomon (255/223) with 32 parity symbols, correcting up to 16 symbol
/// errors per codeword.
///
/// # References
/// * [TM Synchronization and Channel Coding](https://ccsds.org/Pubs/131x0b5.pdf), Section 4
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultReedSolomon;

impl DefaultReedSolomon {
    /// Number of symbol errors a codeword may contain and still be corrected.
    pub const CORRECTION_RADIUS: usize = N_PARITY_SYMBOLS / 2;
}

impl BlockCode for DefaultReedSolomon {
    fn encode(&self, codeword: &mut [u8; RS_BLOCK_LENGTH]) {
        let encoded = Encoder::new(N_PARITY_SYMBOLS).encode(&codeword[..MESSAGE_LENGTH]);
        codeword[MESSAGE_LENGTH..].copy_from_slice(encoded.ecc());
    }

    fn decode(&self, codeword: &mut [u8; RS_BLOCK_LENGTH]) -> Result<usize> {
        let mut received = *codeword;
        let (corrected, n_errors) = Decoder::new(N_PARITY_SYMBOLS)
            .correct_err_count(&mut received[..], None)
            .map_err(|_| Error::ChannelCodingFailed)?;
        codeword[..MESSAGE_LENGTH].copy_from_slice(corrected.data());
        codeword[MESSAGE_LENGTH..].copy_from_slice(corrected.ecc());
        Ok(n_errors)
    }
}

#[cfg(test)]
mod tests {
    use rand::seq::index::sample;
    use rand::Rng;

    use super::*;

    fn random_codeword() -> [u8; RS_BLOCK_LENGTH] {
        let mut rng = rand::thread_rng();
        let mut codeword = [0u8; RS_BLOCK_LENGTH];
        rng.fill(&mut codeword[..MESSAGE_LENGTH]);
        DefaultReedSolomon.encode(&mut codeword);
        codeword
    }

    #[test]
    fn encode_leaves_message_untouched() {
        let mut codeword = [0u8; RS_BLOCK_LENGTH];
        for (i, b) in codeword[..MESSAGE_LENGTH].iter_mut().enumerate() {
            *b = (i % 256) as u8;
        }
        let message = codeword;

        DefaultReedSolomon.encode(&mut codeword);

        assert_eq!(codeword[..MESSAGE_LENGTH], message[..MESSAGE_LENGTH]);
        assert_ne!(codeword[MESSAGE_LENGTH..], [0u8; N_PARITY_SYMBOLS]);
    }

    #[test]
    fn clean_codeword_has_no_corrections() {
        let original = random_codeword();
        let mut codeword = original;

        assert_eq!(DefaultReedSolomon.decode(&mut codeword), Ok(0));
        assert_eq!(codeword, original);
    }

    #[test]
    fn corrects_errors_within_radius() {
        let mut rng = rand::thread_rng();
        for n_errors in 1..=DefaultReedSolomon::CORRECTION_RADIUS {
            let original = random_codeword();
            let mut codeword = original;
            for i in sample(&mut rng, RS_BLOCK_LENGTH, n_errors) {
                codeword[i] ^= rng.gen_range(1..=255u8);
            }

            let corrected = DefaultReedSolomon.decode(&mut codeword).unwrap();

            assert_eq!(corrected, n_errors);
            assert_eq!(codeword, original);
        }
    }

    #[test]
    fn fails_beyond_radius() {
        let original = random_codeword();
        let mut codeword = original;
        // 40 symbol errors, far more than the 16 the code can correct
        for i in 0..40 {
            codeword[i * 6] ^= 0x5A;
        }
        let received = codeword;

        assert_eq!(
            DefaultReedSolomon.decode(&mut codeword),
            Err(Error::ChannelCodingFailed)
        );
        assert_eq!(codeword, received);
    }
}
