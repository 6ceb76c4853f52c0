use crate::{Otp, OtpCode, OtpError, OtpHashAlgorithm};

#[derive(Debug, Clone, PartialEq)]
pub struct Hotp {
    secret: Vec<u8>,
    algorithm: OtpHashAlgorithm,
    // How many digits to generate
    digits: u32,
}

impl Otp for Hotp {}

impl Hotp {
    /// Creates the config for the [HMAC-based One-time Password Algorithm](http://en.wikipedia.org/wiki/HMAC-based_One-time_Password_Algorithm)
    /// (HOTP) given the raw shared secret
    ///
    /// Obs.: This method defaults to a 6-digit code.
    pub fn new(secret: impl Into<Vec<u8>>, algorithm: OtpHashAlgorithm) -> Result<Self, OtpError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(OtpError::EmptySecret);
        }

        Ok(Self {
            secret,
            algorithm,
            digits: 6,
        })
    }

    ///  Sets the number of digits to generate
    pub fn with_digits(&mut self, digits: u32) -> &mut Self {
        self.digits = digits;

        self
    }

    /// Generates a HOTP from the provided counter
    /// truncated to the specified number of digits
    pub fn generate(&self, counter: u64) -> Result<OtpCode, OtpError> {
        let digest = Self::calc_digest(&self.secret, self.algorithm, counter)?;
        let code = Self::encode_digest_truncated(&digest, self.digits)?;

        Ok(OtpCode {
            code,
            digits: self.digits,
        })
    }
}
