//! Message authentication code of the TC security trailer.
//!
//! The code is a keyed BLAKE2s digest truncated to the trailer length.
use blake2::digest::consts::U8;
use blake2::digest::Mac;
use blake2::Blake2sMac;

use crate::config::{tc::SECURITY_TRAILER_LENGTH, AUTHENTICATION_KEY};
use crate::{Error, Result};

type FrameMac = Blake2sMac<U8>;

pub type Digest = [u8; SECURITY_TRAILER_LENGTH];

fn keyed() -> Result<FrameMac> {
    FrameMac::new_with_salt_and_personal(&AUTHENTICATION_KEY, &[], &[])
        .map_err(|_| Error::AuthenticationFailed)
}

/// Authentication code of `data`.
///
/// # Errors
/// [Error::AuthenticationFailed] if the configured key is not a valid BLAKE2s
/// key.
pub fn compute_mac(data: &[u8]) -> Result<Digest> {
    let mut mac = keyed()?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().into())
}

/// Check `received` against the authentication code of `data` in constant time.
///
/// # Errors
/// [Error::AuthenticationFailed] if they differ.
pub fn verify_mac(data: &[u8], received: &[u8]) -> Result<()> {
    let mut mac = keyed()?;
    mac.update(data);
    mac.verify_slice(received)
        .map_err(|_| Error::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        assert_eq!(hex::encode(compute_mac(&[1, 2, 3, 4]).unwrap()), "93fc139248ab69b5");
    }

    #[test]
    fn verify_accepts_own_digest() {
        let data = b"some uplinked bytes";
        let digest = compute_mac(data).unwrap();
        assert_eq!(verify_mac(data, &digest), Ok(()));
    }

    #[test]
    fn verify_rejects_modified_data_or_digest() {
        let data = [0xAB; 32];
        let mut digest = compute_mac(&data).unwrap();

        assert_eq!(verify_mac(&data[1..], &digest), Err(Error::AuthenticationFailed));

        digest[7] ^= 1;
        assert_eq!(verify_mac(&data, &digest), Err(Error::AuthenticationFailed));
        assert_eq!(verify_mac(&data, &digest[..4]), Err(Error::AuthenticationFailed));
    }
}
