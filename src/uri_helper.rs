use std::{borrow::Cow, str::FromStr};

use data_encoding::BASE32_NOPAD;
use percent_encoding::percent_decode_str;

use crate::{OtpError, OtpHashAlgorithm, Settings, SUPPORTED_DIGITS};

const OTP_SCHEME: &str = "otpauth";
const TOTP_TYPE: &str = "totp";

const QR_CHART_URL: &str = "https://chart.googleapis.com/chart";

const URI_SECRET_QUERY: &str = "secret";
const URI_ISSUER_QUERY: &str = "issuer";
const URI_HASH_QUERY: &str = "algorithm";
const URI_PERIOD_QUERY: &str = "period";
const URI_DIGITS_QUERY: &str = "digits";

/// What an authenticator app learns from an enrollment URI
#[derive(Debug, Clone, PartialEq)]
pub struct EnrollmentParts {
    pub issuer: Option<String>,
    pub account: String,
    pub secret: Vec<u8>,
    pub algorithm: OtpHashAlgorithm,
    pub period: u64,
    pub digits: u32,
}

/// Renders `otpauth://totp/{issuer}:{account}?secret={base32}&issuer={issuer}`
pub fn otp_to_uri(secret: &[u8], account: &str, issuer: Option<&str>) -> Result<String, OtpError> {
    let mut uri = url::Url::parse(&format!("{OTP_SCHEME}://{TOTP_TYPE}/"))
        .map_err(OtpError::UriParseError)?;

    let issuer = issuer.filter(|i| !i.is_empty());

    match issuer {
        Some(issuer) => uri.set_path(&format!("{issuer}:{account}")),
        None => uri.set_path(account),
    }

    {
        let mut query_params = uri.query_pairs_mut();

        query_params.append_pair(URI_SECRET_QUERY, &BASE32_NOPAD.encode(secret));

        if let Some(issuer) = issuer {
            query_params.append_pair(URI_ISSUER_QUERY, issuer);
        }
    }

    Ok(uri.to_string())
}

/// Builds the URL of a QR image encoding the enrollment URI of `account`.
/// Nothing is fetched; rendering is up to whoever displays the URL.
pub fn build_enrollment_uri(
    settings: &Settings,
    account: &str,
    secret: &[u8],
) -> Result<String, OtpError> {
    let otp_uri = otp_to_uri(secret, account, Some(&settings.issuer))?;
    let size = format!("{0}x{0}", settings.qr_dimension);

    let chart = url::Url::parse_with_params(
        QR_CHART_URL,
        &[
            ("chs", size.as_str()),
            ("cht", "qr"),
            ("choe", "UTF-8"),
            ("chl", otp_uri.as_str()),
        ],
    )
    .map_err(OtpError::UriParseError)?;

    Ok(chart.to_string())
}

pub fn otp_from_uri(uri: &str) -> Result<EnrollmentParts, OtpError> {
    let uri = url::Url::parse(uri).map_err(OtpError::UriParseError)?;

    let otp_type = format!("{}://{}", uri.scheme(), uri.host_str().unwrap_or("None"));
    if uri.scheme() != OTP_SCHEME || uri.host_str() != Some(TOTP_TYPE) {
        return Err(OtpError::InvalidUriType(
            otp_type,
            format!("{OTP_SCHEME}://{TOTP_TYPE}"),
        ));
    }

    let path = uri.path();
    let label = percent_decode_str(path.strip_prefix('/').unwrap_or(path)).decode_utf8_lossy();
    let (mut issuer, account) = match label.split_once(':') {
        Some((issuer, account)) => (Some(issuer.to_string()), account.to_string()),
        None => (None, label.to_string()),
    };

    let mut secret = "".to_string();
    let mut algorithm = OtpHashAlgorithm::default();
    let mut period = 30;
    let mut digits = 6;

    for params in uri.query_pairs() {
        match params.0 {
            Cow::Borrowed(URI_SECRET_QUERY) => secret = params.1.to_string(),
            Cow::Borrowed(URI_ISSUER_QUERY) => issuer = Some(params.1.to_string()),
            Cow::Borrowed(URI_HASH_QUERY) => {
                algorithm = OtpHashAlgorithm::from_str(params.1.as_ref())?
            }
            Cow::Borrowed(URI_PERIOD_QUERY) => {
                period = u64::from_str(params.1.as_ref())
                    .map_err(|e| OtpError::IntegerParseError(e, URI_PERIOD_QUERY.into()))?
            }
            Cow::Borrowed(URI_DIGITS_QUERY) => {
                digits = u32::from_str(params.1.as_ref())
                    .map_err(|e| OtpError::IntegerParseError(e, URI_DIGITS_QUERY.into()))?
            }
            _ => (),
        }
    }

    if secret.is_empty() {
        return Err(OtpError::UriMissingSecret);
    }

    if !SUPPORTED_DIGITS.contains(&digits) {
        return Err(OtpError::InvalidDigits(digits));
    }

    let secret = BASE32_NOPAD
        .decode(secret.trim_end_matches('=').to_uppercase().as_bytes())
        .map_err(OtpError::SecretDecode)?;

    Ok(EnrollmentParts {
        issuer,
        account,
        secret,
        algorithm,
        period,
        digits,
    })
}
