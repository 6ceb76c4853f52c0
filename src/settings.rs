pub const DEFAULT_ISSUER: &str = "gauthenticator";
pub const DEFAULT_QR_DIMENSION: u32 = 400;

/// Process-wide display and diagnostics options, handed explicitly to the
/// engine and to the enrollment helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Trace the code derivation at debug level
    pub debug: bool,
    /// Issuer label written into enrollment URIs
    pub issuer: String,
    /// Width and height in pixels of the rendered QR image
    pub qr_dimension: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            issuer: DEFAULT_ISSUER.to_string(),
            qr_dimension: DEFAULT_QR_DIMENSION,
        }
    }
}
