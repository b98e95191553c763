//! GitHub webhook signature verification.
//!
//! GitHub signs webhook payloads using HMAC-SHA256 with a shared secret and
//! sends the result in `X-Hub-Signature-256` as `sha256=<hex>`. Older senders
//! only send `X-Hub-Signature` with an HMAC-SHA1 `sha1=<hex>` value; that
//! header is consulted only when the SHA-256 one is absent. Each header name
//! binds its digest, so neither header can carry the other's value.
//!
//! Verification fails closed: an absent header, an absent or empty secret, or
//! an empty body never verifies.

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

/// The primary signature header.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// The legacy SHA-1 signature header.
pub const LEGACY_SIGNATURE_HEADER: &str = "x-hub-signature";

/// The digest named by a signature header's prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    Sha256,
    Sha1,
}

impl SignatureAlgorithm {
    pub fn prefix(self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha256 => "sha256=",
            SignatureAlgorithm::Sha1 => "sha1=",
        }
    }

    /// Digest length in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            SignatureAlgorithm::Sha256 => 32,
            SignatureAlgorithm::Sha1 => 20,
        }
    }
}

/// The result of comparing a signature header against a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureCheck {
    /// The header carries the payload's signature under the secret.
    Match,

    /// The header is well-formed but does not verify.
    Mismatch,

    /// The header is absent, has an unknown prefix, bad hex, or the wrong
    /// digest length. Treated exactly like a mismatch by callers.
    Malformed,
}

impl SignatureCheck {
    pub fn is_match(self) -> bool {
        self == SignatureCheck::Match
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SignatureCheck::Match => "match",
            SignatureCheck::Mismatch => "mismatch",
            SignatureCheck::Malformed => "malformed",
        }
    }
}

/// Parses a GitHub signature header (e.g., "sha256=abc123...") into its
/// algorithm and raw bytes.
///
/// Returns `None` for malformed headers (unknown prefix, invalid hex).
/// The decoded length is not checked here. Never panics.
///
/// # Examples
///
/// ```
/// use merge_bridge::webhooks::{parse_signature_header, SignatureAlgorithm};
///
/// let (algorithm, sig) = parse_signature_header("sha256=abcd1234").unwrap();
/// assert_eq!(algorithm, SignatureAlgorithm::Sha256);
/// assert_eq!(sig, vec![0xab, 0xcd, 0x12, 0x34]);
///
/// assert!(parse_signature_header("sha1=abcd").is_some());
/// assert!(parse_signature_header("abcd1234").is_none());
/// assert!(parse_signature_header("md5=abcd1234").is_none());
/// assert!(parse_signature_header("sha256=xyz").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<(SignatureAlgorithm, Vec<u8>)> {
    let (algorithm, hex_sig) = if let Some(rest) = header.strip_prefix("sha256=") {
        (SignatureAlgorithm::Sha256, rest)
    } else if let Some(rest) = header.strip_prefix("sha1=") {
        (SignatureAlgorithm::Sha1, rest)
    } else {
        return None;
    };

    hex::decode(hex_sig).ok().map(|sig| (algorithm, sig))
}

/// Computes the HMAC-SHA256 signature of a payload using the given secret.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Computes the legacy HMAC-SHA1 signature of a payload.
pub fn compute_sha1_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a signature as a GitHub-style header value: "sha256=<hex>".
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha256={}", hex::encode(signature))
}

/// Formats a legacy signature header value: "sha1=<hex>".
pub fn format_sha1_signature_header(signature: &[u8]) -> String {
    format!("sha1={}", hex::encode(signature))
}

/// A signature header value together with the digest its header name binds.
///
/// `X-Hub-Signature-256` only ever carries SHA-256 and `X-Hub-Signature`
/// only ever carries SHA-1; a value whose prefix names the other digest is
/// malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureHeader<'a> {
    pub algorithm: SignatureAlgorithm,
    pub value: &'a str,
}

impl<'a> SignatureHeader<'a> {
    /// A value read from `X-Hub-Signature-256`.
    pub fn primary(value: &'a str) -> Self {
        SignatureHeader {
            algorithm: SignatureAlgorithm::Sha256,
            value,
        }
    }

    /// A value read from `X-Hub-Signature`.
    pub fn legacy(value: &'a str) -> Self {
        SignatureHeader {
            algorithm: SignatureAlgorithm::Sha1,
            value,
        }
    }
}

/// Picks the signature header to verify against.
///
/// The primary header wins whenever it is present, even if its value is not
/// valid text (which then checks as malformed). The legacy header is used
/// only when the primary one is absent.
pub fn select_signature_header(headers: &HeaderMap) -> Option<SignatureHeader<'_>> {
    match headers.get(SIGNATURE_HEADER) {
        Some(value) => Some(SignatureHeader::primary(value.to_str().unwrap_or_default())),
        None => headers
            .get(LEGACY_SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(SignatureHeader::legacy),
    }
}

/// Compares a signature header against the payload and secret.
///
/// Uses constant-time comparison. A prefix naming a digest other than the one
/// the header binds, or a decoded signature of the wrong length, is reported
/// as malformed before any comparison runs.
pub fn check_signature(
    payload: &[u8],
    signature_header: Option<SignatureHeader<'_>>,
    secret: Option<&[u8]>,
) -> SignatureCheck {
    let Some(header) = signature_header else {
        return SignatureCheck::Malformed;
    };
    let Some((algorithm, expected)) = parse_signature_header(header.value) else {
        return SignatureCheck::Malformed;
    };
    if algorithm != header.algorithm || expected.len() != algorithm.digest_len() {
        return SignatureCheck::Malformed;
    }

    let secret = match secret {
        Some(secret) if !secret.is_empty() => secret,
        _ => return SignatureCheck::Mismatch,
    };
    if payload.is_empty() {
        return SignatureCheck::Mismatch;
    }

    let verified = match algorithm {
        SignatureAlgorithm::Sha256 => HmacSha256::new_from_slice(secret)
            .map(|mut mac| {
                mac.update(payload);
                mac.verify_slice(&expected).is_ok()
            })
            .unwrap_or(false),
        SignatureAlgorithm::Sha1 => HmacSha1::new_from_slice(secret)
            .map(|mut mac| {
                mac.update(payload);
                mac.verify_slice(&expected).is_ok()
            })
            .unwrap_or(false),
    };

    if verified {
        SignatureCheck::Match
    } else {
        SignatureCheck::Mismatch
    }
}

/// Verifies a GitHub webhook signature against the payload and secret.
///
/// Returns `true` only for [`SignatureCheck::Match`].
///
/// # Examples
///
/// ```
/// use merge_bridge::webhooks::{
///     SignatureHeader, compute_signature, format_signature_header, verify_signature,
/// };
///
/// let payload = b"Hello, World!";
/// let secret = b"my-secret-key";
///
/// let header = format_signature_header(&compute_signature(payload, secret));
/// let primary = Some(SignatureHeader::primary(&header));
///
/// assert!(verify_signature(payload, primary, Some(secret)));
/// assert!(!verify_signature(payload, primary, Some(b"wrong-secret")));
/// assert!(!verify_signature(payload, None, Some(secret)));
/// assert!(!verify_signature(payload, primary, None));
///
/// // A SHA-256 value is not accepted from the SHA-1 header.
/// assert!(!verify_signature(payload, Some(SignatureHeader::legacy(&header)), Some(secret)));
/// ```
pub fn verify_signature(
    payload: &[u8],
    signature_header: Option<SignatureHeader<'_>>,
    secret: Option<&[u8]>,
) -> bool {
    check_signature(payload, signature_header, secret).is_match()
}
