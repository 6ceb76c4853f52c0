use std::time::{SystemTime, UNIX_EPOCH};

use data_encoding::HEXLOWER;

use crate::{
    uri_helper::{self, otp_to_uri},
    Otp, OtpCode, OtpError, OtpHashAlgorithm, Settings,
};

/// A code together with the number of seconds left in the time step of `now`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeResult {
    pub code: OtpCode,
    pub expires_in: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Totp {
    pub(crate) secret: Vec<u8>,
    pub(crate) algorithm: OtpHashAlgorithm,
    pub(crate) period: u64,
    pub(crate) digits: u32,
    debug: bool,
}

impl Otp for Totp {}

impl Totp {
    /// Creates the config for the [Time-based One-time Password Algorithm](http://en.wikipedia.org/wiki/Time-based_One-time_Password_Algorithm)
    /// (TOTP) given the raw shared secret.
    ///
    /// Obs.: This method defaults to the SHA1 hash, a 6-digit code and a period of 30 seconds
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, OtpError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(OtpError::EmptySecret);
        }

        Ok(Self {
            secret,
            algorithm: OtpHashAlgorithm::SHA1,
            period: 30,
            digits: 6,
            debug: false,
        })
    }

    ///  Sets hashing algorithm
    pub fn with_algorithm(&mut self, algorithm: OtpHashAlgorithm) -> &mut Self {
        self.algorithm = algorithm;

        self
    }

    ///  Sets the period in seconds
    pub fn with_period(&mut self, period: u64) -> &mut Self {
        self.period = period;

        self
    }

    ///  Sets the number of digits to generate
    pub fn with_digits(&mut self, digits: u32) -> &mut Self {
        self.digits = digits;

        self
    }

    /// Traces every intermediate value of the derivation at debug level
    pub fn with_debug(&mut self, debug: bool) -> &mut Self {
        self.debug = debug;

        self
    }

    pub fn with_settings(&mut self, settings: &Settings) -> &mut Self {
        self.with_debug(settings.debug)
    }

    pub fn algorithm(&self) -> OtpHashAlgorithm {
        self.algorithm
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    /// Computes the code of the time step `step_offset` steps away from the one
    /// containing `now` (seconds since the UNIX epoch).
    ///
    /// `-1` is the previous code, `0` the current one and `1` the next one.
    /// The expiry always refers to the step containing `now`.
    pub fn compute_code(&self, step_offset: i64, now: u64) -> Result<CodeResult, OtpError> {
        if self.period == 0 {
            return Err(OtpError::InvalidPeriod);
        }

        let step = now / self.period;
        let counter = i64::try_from(step)
            .ok()
            .and_then(|s| s.checked_add(step_offset))
            .and_then(|c| u64::try_from(c).ok())
            .ok_or(OtpError::CounterEncoding {
                step,
                offset: step_offset,
            })?;

        let digest = Self::calc_digest(&self.secret, self.algorithm, counter)?;
        let code = Self::encode_digest_truncated(&digest, self.digits)?;
        let expires_in = self.period - now % self.period;

        if self.debug {
            log::debug!("counter: {counter} ({step} {step_offset:+})");
            log::debug!("digest: {}", HEXLOWER.encode(&digest));
            log::debug!("offset: {}", digest[digest.len() - 1] & 0xf);
            log::debug!("code: {code}");
            log::debug!("expires: {expires_in}");
        }

        Ok(CodeResult {
            code: OtpCode {
                code,
                digits: self.digits,
            },
            expires_in,
        })
    }

    /// Computes the current code from the system clock
    pub fn current_code(&self) -> Result<CodeResult, OtpError> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?;

        self.compute_code(0, now.as_secs())
    }

    /// Seconds left until the code for `now` expires, in `1..=period`
    pub fn remaining_seconds(&self, now: u64) -> Result<u64, OtpError> {
        if self.period == 0 {
            return Err(OtpError::InvalidPeriod);
        }

        Ok(self.period - now % self.period)
    }

    /// Validates a code against the steps around `now`, nearest first,
    /// returning the step offset it was found at or None if the code is invalid
    ///
    /// Obs.: the RFC recommends a window of 1 step in the future and 1 in the past
    pub fn verify(&self, candidate: u32, now: u64, window: u32) -> Result<Option<i64>, OtpError> {
        let offsets = std::iter::once(0)
            .chain((1..=i64::from(window)).flat_map(|i| [-i, i]));

        for offset in offsets {
            let generated = match self.compute_code(offset, now) {
                Ok(r) => r.code,
                // Steps before the epoch cannot match
                Err(OtpError::CounterEncoding { .. }) => continue,
                Err(e) => return Err(e),
            };

            if generated.integer() == candidate {
                return Ok(Some(offset));
            }
        }

        Ok(None)
    }

    /// Renders the otpauth enrollment URI for this secret
    pub fn to_uri(&self, account: &str, issuer: Option<&str>) -> Result<String, OtpError> {
        otp_to_uri(&self.secret, account, issuer)
    }

    pub fn from_uri(uri: &str) -> Result<Self, OtpError> {
        let parts = uri_helper::otp_from_uri(uri)?;

        let mut totp = Self::new(parts.secret)?;
        totp.with_algorithm(parts.algorithm)
            .with_period(parts.period)
            .with_digits(parts.digits);

        Ok(totp)
    }
}
