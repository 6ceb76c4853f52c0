//! Fresh shared secrets, hex encoded.
//!
//! [`generate`] derives the secret from the clock and is only kept so existing
//! setups keep producing secrets of the same shape. It is predictable and must
//! not be used to provision real accounts; use [`generate_random`] instead.

use std::time::{SystemTime, UNIX_EPOCH};

use data_encoding::HEXLOWER;
use rand::{rngs::OsRng, RngCore};

use crate::{totp::Totp, Otp, OtpError, OtpHashAlgorithm};

/// Granularity the wall clock is reduced to before hashing
const COARSE_DIVISOR: u128 = 30;

/// Derives a secret from the current coarse instant.
///
/// Fails with [`OtpError::UnsupportedAlgorithm`] for names other than
/// `sha1`, `sha256` or `sha512`.
pub fn generate(algorithm: &str) -> Result<String, OtpError> {
    let algorithm = algorithm.parse::<OtpHashAlgorithm>()?;
    let micros = SystemTime::now().duration_since(UNIX_EPOCH)?.as_micros();
    let instant = (micros / COARSE_DIVISOR) as u64;

    generate_at(algorithm, instant)
}

/// HMAC of an empty message, keyed by the instant's big-endian bytes
pub fn generate_at(algorithm: OtpHashAlgorithm, instant: u64) -> Result<String, OtpError> {
    let digest = Totp::calc_mac(&instant.to_be_bytes(), algorithm, &[])?;

    Ok(HEXLOWER.encode(&digest))
}

/// A secret of `algorithm.digest_len()` bytes from the operating system's CSPRNG
pub fn generate_random(algorithm: OtpHashAlgorithm) -> String {
    let mut secret = vec![0u8; algorithm.digest_len()];
    OsRng.fill_bytes(&mut secret);

    HEXLOWER.encode(&secret)
}
