pub mod config;
pub mod hotp;
pub mod keygen;
pub mod settings;
pub mod totp;
pub mod uri_helper;

use core::num;
use std::{fmt::Display, str::FromStr};

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

pub use settings::Settings;

/// Code lengths whose modulus fits the 31-bit truncated value
pub const SUPPORTED_DIGITS: std::ops::RangeInclusive<u32> = 1..=9;
pub use totp::{CodeResult, Totp};

#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("Unsupported hashing algorithm, found {0}. Expected one of: SHA1, SHA256 or SHA512")]
    UnsupportedAlgorithm(String),
    #[error("Could not encode the time counter for step {step} with offset {offset}")]
    CounterEncoding { step: u64, offset: i64 },
    #[error("The secret must not be empty")]
    EmptySecret,
    #[error("The time step interval must be at least one second")]
    InvalidPeriod,
    #[error("The system clock is set before the UNIX epoch")]
    Clock(#[from] std::time::SystemTimeError),
    #[error("The secret cannot be used as an HMAC key")]
    InvalidKeyLength,
    #[error("Codes must have between 1 and 9 digits, found {0}")]
    InvalidDigits(u32),
    #[error("Invalid digest")]
    InvalidDigest(Vec<u8>),
    #[error("Secret decode error")]
    SecretDecode(data_encoding::DecodeError),
    #[error("The provided URI is not valid, found {0}. Expected: {1}")]
    InvalidUriType(String, String),
    #[error("Could not parse the URI")]
    UriParseError(url::ParseError),
    #[error("Could not retrieve the secret from the URI")]
    UriMissingSecret,
    #[error("Could not parse an integer. Failed parsing: {1}")]
    IntegerParseError(num::ParseIntError, String),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OtpHashAlgorithm {
    #[default]
    SHA1,
    SHA256,
    SHA512,
}

impl OtpHashAlgorithm {
    /// Length in bytes of the HMAC output for this algorithm
    pub fn digest_len(&self) -> usize {
        match self {
            Self::SHA1 => 20,
            Self::SHA256 => 32,
            Self::SHA512 => 64,
        }
    }
}

impl Display for OtpHashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SHA1 => write!(f, "SHA1"),
            Self::SHA256 => write!(f, "SHA256"),
            Self::SHA512 => write!(f, "SHA512"),
        }
    }
}

impl FromStr for OtpHashAlgorithm {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_uppercase();

        match normalized.as_str() {
            "SHA1" => Ok(Self::SHA1),
            "SHA256" => Ok(Self::SHA256),
            "SHA512" => Ok(Self::SHA512),
            _ => Err(OtpError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OtpCode {
    code: u32,
    digits: u32,
}

impl OtpCode {
    pub fn integer(&self) -> u32 {
        self.code
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }
}

impl Display for OtpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:0padding$}",
            self.code,
            padding = (self.digits as usize)
        )
    }
}

pub trait Otp {
    /// Calculates the HMAC digest of `data`, packed as 8 big-endian bytes,
    /// keyed with the raw secret.
    fn calc_digest(
        secret: &[u8],
        algorithm: OtpHashAlgorithm,
        data: u64,
    ) -> Result<Vec<u8>, OtpError> {
        Self::calc_mac(secret, algorithm, &data.to_be_bytes())
    }

    /// HMAC of an arbitrary message under `key`
    fn calc_mac(key: &[u8], algorithm: OtpHashAlgorithm, message: &[u8]) -> Result<Vec<u8>, OtpError> {
        let digest = match algorithm {
            OtpHashAlgorithm::SHA1 => {
                let mut mac = <Hmac<Sha1> as Mac>::new_from_slice(key)
                    .map_err(|_| OtpError::InvalidKeyLength)?;
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
            OtpHashAlgorithm::SHA256 => {
                let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key)
                    .map_err(|_| OtpError::InvalidKeyLength)?;
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
            OtpHashAlgorithm::SHA512 => {
                let mut mac = <Hmac<Sha512> as Mac>::new_from_slice(key)
                    .map_err(|_| OtpError::InvalidKeyLength)?;
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
        };

        Ok(digest)
    }

    /// Encodes the HMAC digest into a truncated integer.
    fn encode_digest_truncated(digest: &[u8], target_digits_count: u32) -> Result<u32, OtpError> {
        if !SUPPORTED_DIGITS.contains(&target_digits_count) {
            return Err(OtpError::InvalidDigits(target_digits_count));
        }

        // The low nibble of the last byte picks the window, whatever the digest length
        let offset = match digest.last() {
            Some(x) => *x & 0xf,
            None => return Err(OtpError::InvalidDigest(Vec::from(digest))),
        } as usize;

        // Gets the 4 bytes that will compose the code
        let code_bytes: [u8; 4] = match digest.get(offset..offset + 4) {
            Some(x) => x
                .try_into()
                .map_err(|_| OtpError::InvalidDigest(Vec::from(digest)))?,
            None => return Err(OtpError::InvalidDigest(Vec::from(digest))),
        };

        let code = u32::from_be_bytes(code_bytes);
        let truncation_factor = 10u32
            .checked_pow(target_digits_count)
            .ok_or(OtpError::InvalidDigits(target_digits_count))?;

        Ok((code & 0x7fffffff) % truncation_factor)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::{Otp, OtpCode, OtpError, OtpHashAlgorithm};

    struct Digester;

    impl Otp for Digester {}

    #[rstest]
    #[case("sha1", OtpHashAlgorithm::SHA1)]
    #[case("SHA1", OtpHashAlgorithm::SHA1)]
    #[case("sha256", OtpHashAlgorithm::SHA256)]
    #[case("Sha512", OtpHashAlgorithm::SHA512)]
    fn parse_algorithm(#[case] input: &str, #[case] expected: OtpHashAlgorithm) {
        assert_eq!(expected, input.parse::<OtpHashAlgorithm>().unwrap());
    }

    #[rstest]
    #[case("md5")]
    #[case("")]
    #[case("sha-1")]
    fn parse_unsupported_algorithm(#[case] input: &str) {
        let err = input.parse::<OtpHashAlgorithm>().unwrap_err();
        assert!(matches!(err, OtpError::UnsupportedAlgorithm(name) if name == input));
    }

    #[test]
    fn default_algorithm_is_sha1() {
        assert_eq!(OtpHashAlgorithm::SHA1, OtpHashAlgorithm::default());
        assert_eq!("SHA256", OtpHashAlgorithm::SHA256.to_string());
    }

    #[rstest]
    #[case(42, 6, "000042")]
    #[case(0, 6, "000000")]
    #[case(999999, 6, "999999")]
    #[case(7081804, 8, "07081804")]
    fn code_is_zero_padded(#[case] code: u32, #[case] digits: u32, #[case] expected: &str) {
        assert_eq!(expected, OtpCode { code, digits }.to_string());
    }

    // RFC 4226 section 5.4 worked example
    #[test]
    fn dynamic_truncation() {
        let digest = [
            0x1f, 0x86, 0x98, 0x69, 0x0e, 0x02, 0xca, 0x16, 0x61, 0x85, 0x50, 0xef, 0x7f, 0x19,
            0xda, 0x8e, 0x94, 0x5b, 0x55, 0x5a,
        ];

        assert_eq!(872921, Digester::encode_digest_truncated(&digest, 6).unwrap());
    }

    #[test]
    fn truncation_masks_sign_bit() {
        let mut digest = [0xffu8; 20];
        digest[19] = 0x00;

        assert_eq!(
            0x7fffffff % 1_000_000,
            Digester::encode_digest_truncated(&digest, 6).unwrap()
        );
    }

    #[rstest]
    #[case(0)]
    #[case(10)]
    #[case(u32::MAX)]
    fn truncation_rejects_unsupported_digits(#[case] digits: u32) {
        let digest = [0x5au8; 20];

        assert!(matches!(
            Digester::encode_digest_truncated(&digest, digits),
            Err(OtpError::InvalidDigits(d)) if d == digits
        ));
    }

    #[test]
    fn truncation_nine_digits() {
        let mut digest = [0xffu8; 20];
        digest[19] = 0x00;

        assert_eq!(
            0x7fffffff % 1_000_000_000,
            Digester::encode_digest_truncated(&digest, 9).unwrap()
        );
    }

    #[rstest]
    #[case(&[])]
    #[case(&[0x0f, 0x01, 0x02])]
    fn truncation_rejects_short_digest(#[case] digest: &[u8]) {
        assert!(matches!(
            Digester::encode_digest_truncated(digest, 6),
            Err(OtpError::InvalidDigest(_))
        ));
    }

    #[test]
    fn counter_digest_is_mac_of_packed_counter() {
        assert_eq!(
            Digester::calc_mac(b"key", OtpHashAlgorithm::SHA1, &[0, 0, 0, 0, 0, 0, 0, 7]).unwrap(),
            Digester::calc_digest(b"key", OtpHashAlgorithm::SHA1, 7).unwrap()
        );
    }

    // RFC 2202 test case 2
    #[test]
    fn mac_of_message() {
        let mac = Digester::calc_mac(
            b"Jefe",
            OtpHashAlgorithm::SHA1,
            b"what do ya want for nothing?",
        )
        .unwrap();

        assert_eq!(
            "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79",
            data_encoding::HEXLOWER.encode(&mac)
        );
    }

    #[rstest]
    #[case(OtpHashAlgorithm::SHA1)]
    #[case(OtpHashAlgorithm::SHA256)]
    #[case(OtpHashAlgorithm::SHA512)]
    fn digest_length_matches_algorithm(#[case] algorithm: OtpHashAlgorithm) {
        let digest = Digester::calc_digest(b"12345678901234567890", algorithm, 1).unwrap();
        assert_eq!(algorithm.digest_len(), digest.len());
    }
}
