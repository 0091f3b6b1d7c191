//! Session credential encoding, signing, and verification.
//!
//! A session credential is a compact, self-contained proof of entitlement
//! that disconnected verifiers can check without contacting this server or
//! its database. It is never persisted server-side.
//!
//! # Wire Format
//!
//! Three fields joined by `:`
//!
//! ```text
//! <account_id>:<expiry RFC 3339 UTC>:<tag>
//! ```
//!
//! Example:
//!
//! ```text
//! user@example.com:2026-08-07T10:15:30.000000Z:9f86d081884c7d65
//! ```
//!
//! The tag is the first 16 hex characters (64 bits) of
//! HMAC-SHA256(secret, `"<account_id>:<expiry>"`). The truncation keeps
//! credentials short; widening it would invalidate every outstanding
//! credential, so the length is fixed.
//!
//! # Parsing
//!
//! The expiry field contains `:` itself, so decoding splits on the FIRST
//! separator (end of the account id) and the LAST separator (start of the
//! tag). Account identifiers containing `:` are rejected at issuance to keep
//! the format unambiguous; the tag is hex and can never contain one.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of the hex-encoded authentication tag (64 bits).
pub const TAG_HEX_LEN: usize = 16;

/// Credential errors, one per distinguishable verification failure.
///
/// Callers receiving any of these must re-authorize; none are retryable
/// with the same credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Account identifier is empty or contains the field separator.
    ///
    /// Raised at issuance only; such identifiers never make it into a token.
    #[error("Account identifier must be non-empty and must not contain ':'")]
    InvalidAccountId,

    /// Token does not split into account, expiry, and tag fields.
    #[error("Token must have account, expiry, and tag fields")]
    MalformedToken,

    /// Expiry field is not a valid RFC 3339 timestamp.
    #[error("Expiry timestamp is not valid RFC 3339")]
    MalformedTimestamp,

    /// Current time is past the embedded expiry.
    #[error("Credential has expired")]
    Expired,

    /// Authentication tag does not match the token contents.
    #[error("Credential signature is invalid")]
    BadSignature,
}

/// Result of a successful verification.
///
/// The account identifier is authenticated: only a holder of the shared
/// secret could have produced the tag covering it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCredential {
    /// Authenticated account identifier
    pub account_id: String,

    /// Embedded expiry timestamp
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies session credentials under a shared symmetric secret.
///
/// The secret is loaded from configuration at startup and is immutable for
/// the process lifetime. Any party holding the same secret can verify
/// credentials offline; rotating the secret invalidates every outstanding
/// credential.
#[derive(Clone)]
pub struct TokenSigner {
    secret: String,
}

impl TokenSigner {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Issue a credential for `account_id` valid for `validity` from now.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccountId` if the account identifier is empty or
    /// contains `:` (which would make the token ambiguous to parse).
    pub fn issue(&self, account_id: &str, validity: Duration) -> Result<String, TokenError> {
        self.issue_at(account_id, validity, Utc::now())
    }

    /// Issue a credential with an explicit clock.
    pub fn issue_at(
        &self,
        account_id: &str,
        validity: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        if account_id.is_empty() || account_id.contains(':') {
            return Err(TokenError::InvalidAccountId);
        }

        let expiry = now + validity;
        // Microsecond precision with a trailing Z; the rendered string is
        // the authoritative expiry, covered by the tag.
        let expiry_str = expiry.to_rfc3339_opts(SecondsFormat::Micros, true);
        let tag = self.tag(account_id, &expiry_str);

        Ok(format!("{account_id}:{expiry_str}:{tag}"))
    }

    /// Verify a credential against the current time.
    ///
    /// # Errors
    ///
    /// - `MalformedToken`: fields cannot be separated
    /// - `MalformedTimestamp`: expiry does not parse
    /// - `Expired`: current time is strictly past the expiry
    /// - `BadSignature`: tag mismatch (checked last, in constant time)
    pub fn verify(&self, token: &str) -> Result<VerifiedCredential, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a credential with an explicit clock.
    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<VerifiedCredential, TokenError> {
        // First separator ends the account id, last separator starts the
        // tag; the expiry between them may contain separators of its own.
        let (account_id, rest) = token.split_once(':').ok_or(TokenError::MalformedToken)?;
        let (expiry_str, tag) = rest.rsplit_once(':').ok_or(TokenError::MalformedToken)?;

        let expires_at = DateTime::parse_from_rfc3339(expiry_str)
            .map_err(|_| TokenError::MalformedTimestamp)?
            .with_timezone(&Utc);

        if now > expires_at {
            return Err(TokenError::Expired);
        }

        // Constant-time comparison of the truncated tag; a non-hex or
        // wrong-length tag can never match.
        let tag_bytes = hex::decode(tag).map_err(|_| TokenError::BadSignature)?;
        self.mac(account_id, expiry_str)
            .verify_truncated_left(&tag_bytes)
            .map_err(|_| TokenError::BadSignature)?;

        Ok(VerifiedCredential {
            account_id: account_id.to_string(),
            expires_at,
        })
    }

    /// HMAC over the canonical message `"<account_id>:<expiry>"`.
    fn mac(&self, account_id: &str, expiry_str: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(self.secret.as_bytes()).expect("HMAC key length is valid");
        mac.update(account_id.as_bytes());
        mac.update(b":");
        mac.update(expiry_str.as_bytes());
        mac
    }

    /// Hex tag truncated to [`TAG_HEX_LEN`] characters.
    fn tag(&self, account_id: &str, expiry_str: &str) -> String {
        let mut tag = hex::encode(self.mac(account_id, expiry_str).finalize().into_bytes());
        tag.truncate(TAG_HEX_LEN);
        tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret")
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap()
    }

    #[test]
    fn round_trip_returns_account_and_expiry() {
        let signer = signer();
        let now = fixed_now();
        let token = signer
            .issue_at("user@example.com", Duration::hours(24), now)
            .unwrap();

        let verified = signer.verify_at(&token, now).unwrap();
        assert_eq!(verified.account_id, "user@example.com");
        assert_eq!(verified.expires_at, now + Duration::hours(24));
    }

    #[test]
    fn token_has_expected_shape() {
        let signer = signer();
        let token = signer
            .issue_at("user@example.com", Duration::hours(1), fixed_now())
            .unwrap();

        let (account, rest) = token.split_once(':').unwrap();
        let (expiry, tag) = rest.rsplit_once(':').unwrap();
        assert_eq!(account, "user@example.com");
        assert!(DateTime::parse_from_rfc3339(expiry).is_ok());
        assert_eq!(tag.len(), TAG_HEX_LEN);
        assert!(tag.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn issue_rejects_account_with_separator() {
        let err = signer()
            .issue_at("user:example", Duration::hours(1), fixed_now())
            .unwrap_err();
        assert_eq!(err, TokenError::InvalidAccountId);
    }

    #[test]
    fn issue_rejects_empty_account() {
        let err = signer()
            .issue_at("", Duration::hours(1), fixed_now())
            .unwrap_err();
        assert_eq!(err, TokenError::InvalidAccountId);
    }

    #[test]
    fn verify_rejects_missing_fields() {
        let signer = signer();
        assert_eq!(
            signer.verify_at("no-separators", fixed_now()),
            Err(TokenError::MalformedToken)
        );
        assert_eq!(
            signer.verify_at("user@example.com:only-one", fixed_now()),
            Err(TokenError::MalformedToken)
        );
        assert_eq!(signer.verify_at("", fixed_now()), Err(TokenError::MalformedToken));
    }

    #[test]
    fn verify_rejects_unparseable_expiry() {
        let err = signer()
            .verify_at("user@example.com:not-a-date:0011223344556677", fixed_now())
            .unwrap_err();
        assert_eq!(err, TokenError::MalformedTimestamp);
    }

    #[test]
    fn verify_rejects_expired_credential() {
        let signer = signer();
        let now = fixed_now();
        let token = signer
            .issue_at("user@example.com", Duration::hours(1), now)
            .unwrap();

        // Expiry itself is still valid; one microsecond past it is not.
        let expiry = now + Duration::hours(1);
        assert!(signer.verify_at(&token, expiry).is_ok());
        assert_eq!(
            signer.verify_at(&token, expiry + Duration::microseconds(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn verify_rejects_expiry_in_the_past_even_with_valid_tag() {
        let signer = signer();
        let now = fixed_now();
        // Issued an hour ago with one second of validity: the tag is
        // genuine, but the expiry is long gone.
        let token = signer
            .issue_at(
                "user@example.com",
                Duration::seconds(1),
                now - Duration::hours(1),
            )
            .unwrap();
        assert_eq!(signer.verify_at(&token, now), Err(TokenError::Expired));
    }

    #[test]
    fn flipping_any_tag_character_invalidates_the_credential() {
        let signer = signer();
        let now = fixed_now();
        let token = signer
            .issue_at("user@example.com", Duration::hours(1), now)
            .unwrap();

        let tag_start = token.len() - TAG_HEX_LEN;
        for i in tag_start..token.len() {
            let mut tampered: Vec<char> = token.chars().collect();
            tampered[i] = if tampered[i] == '0' { '1' } else { '0' };
            let tampered: String = tampered.into_iter().collect();

            assert_eq!(
                signer.verify_at(&tampered, now),
                Err(TokenError::BadSignature),
                "tampered tag position {i} was accepted"
            );
        }
    }

    #[test]
    fn verify_rejects_substituted_account() {
        let signer = signer();
        let now = fixed_now();
        let token = signer
            .issue_at("alice@example.com", Duration::hours(1), now)
            .unwrap();

        let forged = token.replacen("alice@example.com", "mallory@example.com", 1);
        assert_eq!(
            signer.verify_at(&forged, now),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn verify_rejects_token_signed_with_other_secret() {
        let now = fixed_now();
        let token = TokenSigner::new("secret-a")
            .issue_at("user@example.com", Duration::hours(1), now)
            .unwrap();

        assert_eq!(
            TokenSigner::new("secret-b").verify_at(&token, now),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn verify_rejects_non_hex_tag() {
        let signer = signer();
        let now = fixed_now();
        let token = signer
            .issue_at("user@example.com", Duration::hours(1), now)
            .unwrap();

        let truncated = &token[..token.len() - TAG_HEX_LEN];
        let forged = format!("{truncated}zzzzzzzzzzzzzzzz");
        assert_eq!(
            signer.verify_at(&forged, now),
            Err(TokenError::BadSignature)
        );
    }
}
