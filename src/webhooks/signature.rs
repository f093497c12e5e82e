//! Slack request signature verification using HMAC-SHA256.
//!
//! Slack signs every request with the app's signing secret:
//!
//! 1. The base string is `{version}:{timestamp}:{body}`.
//! 2. The digest is `HMAC-SHA256(signing_secret, base_string)`.
//! 3. The `X-Slack-Signature` header carries `{version}={hex_digest}`.
//!
//! Verification is the first step after the handshake check. A digest
//! mismatch or a timestamp more than [`MAX_REQUEST_AGE_SECS`] away from the
//! current time rejects the request before any handler sees it.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying `v0=<hex digest>`.
pub const HEADER_SIGNATURE: &str = "x-slack-signature";
/// Header carrying the request's unix timestamp in seconds.
pub const HEADER_TIMESTAMP: &str = "x-slack-request-timestamp";

/// Maximum distance between the request timestamp and now before the request
/// is considered a replay.
pub const MAX_REQUEST_AGE_SECS: i64 = 300;

/// Reasons a request fails authentication.
///
/// The first three are structural: the inputs cannot be checked at all.
/// The last two are verdicts on well-formed inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthenticationError {
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("malformed signature header")]
    MalformedSignature,

    #[error("invalid request timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("stale request timestamp ({age_secs}s old)")]
    StaleTimestamp { age_secs: i64 },

    #[error("signature mismatch")]
    SignatureMismatch,
}

impl AuthenticationError {
    /// Returns true if the inputs were structurally invalid, as opposed to
    /// well-formed but not authentic.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            AuthenticationError::MissingHeader(_)
                | AuthenticationError::MalformedSignature
                | AuthenticationError::InvalidTimestamp(_)
        )
    }
}

/// A parsed signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// The scheme version (`v0` today). It is part of the signed base string.
    pub version: String,
    /// The raw digest bytes.
    pub digest: Vec<u8>,
}

/// Parses a signature header of the form `{version}={hex}`.
///
/// The header must contain exactly one `=`, and the digest must be valid hex.
///
/// # Examples
///
/// ```
/// use slack_dispatch::webhooks::signature::parse_signature_header;
///
/// let parsed = parse_signature_header("v0=abcd1234").unwrap();
/// assert_eq!(parsed.version, "v0");
/// assert_eq!(parsed.digest, vec![0xab, 0xcd, 0x12, 0x34]);
///
/// assert!(parse_signature_header("abcd1234").is_err());
/// assert!(parse_signature_header("v0=ab=cd").is_err());
/// assert!(parse_signature_header("v0=xyz").is_err());
/// ```
pub fn parse_signature_header(header: &str) -> Result<SignatureHeader, AuthenticationError> {
    let mut parts = header.split('=');
    let (Some(version), Some(hex_digest), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthenticationError::MalformedSignature);
    };

    let digest = hex::decode(hex_digest).map_err(|_| AuthenticationError::MalformedSignature)?;

    Ok(SignatureHeader {
        version: version.to_string(),
        digest,
    })
}

/// Parses the timestamp header as unix seconds.
pub fn parse_timestamp(header: &str) -> Result<i64, AuthenticationError> {
    header
        .trim()
        .parse()
        .map_err(|_| AuthenticationError::InvalidTimestamp(header.to_string()))
}

fn signer(signing_secret: &[u8], version: &str, timestamp: &str, body: &[u8]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(signing_secret).expect("HMAC can take key of any size");
    mac.update(version.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    mac
}

/// Computes the HMAC-SHA256 digest for a request.
///
/// This is what a sender does; verification never compares against this
/// output directly.
pub fn compute_signature(
    signing_secret: &[u8],
    version: &str,
    timestamp: &str,
    body: &[u8],
) -> Vec<u8> {
    signer(signing_secret, version, timestamp, body)
        .finalize()
        .into_bytes()
        .to_vec()
}

/// Formats a digest as a signature header value (`{version}={hex}`).
pub fn format_signature_header(version: &str, digest: &[u8]) -> String {
    format!("{version}={}", hex::encode(digest))
}

/// Authenticates a request against an explicit clock.
///
/// # Arguments
///
/// * `signing_secret` - The app's signing secret
/// * `signature_header` - The `X-Slack-Signature` header, if present
/// * `timestamp_header` - The `X-Slack-Request-Timestamp` header, if present
/// * `body` - The raw request body, exactly as received
/// * `now` - Current unix time in seconds
///
/// # Errors
///
/// Structural errors for missing or malformed headers,
/// [`AuthenticationError::SignatureMismatch`] if the digest does not match, and
/// [`AuthenticationError::StaleTimestamp`] if the timestamp is outside the
/// replay window in either direction.
pub fn authenticate_at(
    signing_secret: &[u8],
    signature_header: Option<&str>,
    timestamp_header: Option<&str>,
    body: &[u8],
    now: i64,
) -> Result<(), AuthenticationError> {
    let signature_header =
        signature_header.ok_or(AuthenticationError::MissingHeader(HEADER_SIGNATURE))?;
    let timestamp_header =
        timestamp_header.ok_or(AuthenticationError::MissingHeader(HEADER_TIMESTAMP))?;

    let signature = parse_signature_header(signature_header)?;
    let timestamp = parse_timestamp(timestamp_header)?;

    // Sign the header text as sent, not the re-rendered integer.
    let mac = signer(signing_secret, &signature.version, timestamp_header, body);

    // Constant-time comparison via the HMAC library
    mac.verify_slice(&signature.digest)
        .map_err(|_| AuthenticationError::SignatureMismatch)?;

    let age_secs = now.saturating_sub(timestamp);
    if age_secs.saturating_abs() > MAX_REQUEST_AGE_SECS {
        return Err(AuthenticationError::StaleTimestamp { age_secs });
    }

    Ok(())
}

/// Authenticates a request against the system clock.
pub fn authenticate(
    signing_secret: &[u8],
    signature_header: Option<&str>,
    timestamp_header: Option<&str>,
    body: &[u8],
) -> Result<(), AuthenticationError> {
    authenticate_at(
        signing_secret,
        signature_header,
        timestamp_header,
        body,
        chrono::Utc::now().timestamp(),
    )
}

/// Verifies a request against an explicit clock.
///
/// Returns `Ok(true)` only if the digest matches and the timestamp is fresh,
/// `Ok(false)` for a mismatch or stale timestamp, and `Err` only when the
/// inputs are structurally invalid.
pub fn verify_at(
    signing_secret: &[u8],
    signature_header: Option<&str>,
    timestamp_header: Option<&str>,
    body: &[u8],
    now: i64,
) -> Result<bool, AuthenticationError> {
    match authenticate_at(signing_secret, signature_header, timestamp_header, body, now) {
        Ok(()) => Ok(true),
        Err(e) if e.is_structural() => Err(e),
        Err(_) => Ok(false),
    }
}

/// Verifies a request against the system clock. See [`verify_at`].
///
/// # Examples
///
/// ```
/// use slack_dispatch::webhooks::signature::{compute_signature, format_signature_header, verify};
///
/// let secret = b"8f742231b10e8888abcd99yyyzzz85a5";
/// let body = br#"{"token":"abc"}"#;
/// let timestamp = chrono::Utc::now().timestamp().to_string();
///
/// let digest = compute_signature(secret, "v0", &timestamp, body);
/// let header = format_signature_header("v0", &digest);
///
/// assert_eq!(verify(secret, Some(&header), Some(&timestamp), body), Ok(true));
/// assert_eq!(verify(b"other-secret", Some(&header), Some(&timestamp), body), Ok(false));
/// ```
pub fn verify(
    signing_secret: &[u8],
    signature_header: Option<&str>,
    timestamp_header: Option<&str>,
    body: &[u8],
) -> Result<bool, AuthenticationError> {
    verify_at(
        signing_secret,
        signature_header,
        timestamp_header,
        body,
        chrono::Utc::now().timestamp(),
    )
}
