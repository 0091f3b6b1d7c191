//! Identity verification against the external identity provider.
//!
//! The engine never inspects identity tokens itself. It hands the opaque
//! bearer credential to an [`IdentityVerifier`] and trusts the provider's
//! attestation of a verified account identifier. The HTTP implementation
//! targets a Google-tokeninfo-style endpoint; tests substitute a fixed
//! verifier behind the same trait.

use async_trait::async_trait;
use serde::Deserialize;

/// Identity verification failures.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The provider examined the credential and did not attest a verified
    /// account. Not retryable without a fresh credential.
    #[error("{0}")]
    Rejected(String),

    /// The provider could not be reached or answered unintelligibly. The
    /// caller may retry the whole request.
    #[error("Identity provider request failed: {0}")]
    Provider(#[from] reqwest::Error),
}

/// Black-box capability: opaque bearer credential in, verified account
/// identifier out.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify_identity(
        &self,
        credential: &str,
        token_type: &str,
    ) -> Result<String, IdentityError>;
}

/// Identity verifier backed by an HTTP token-introspection endpoint.
pub struct HttpIdentityVerifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpIdentityVerifier {
    /// Build a verifier for the given introspection endpoint.
    ///
    /// The request timeout is bounded so a stalled provider cannot stall
    /// authorization indefinitely.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

/// Relevant subset of the provider's introspection response.
#[derive(Debug, Deserialize)]
struct TokenInfo {
    email: Option<String>,

    #[serde(default)]
    email_verified: Option<EmailVerified>,
}

/// Google renders this claim as a bool on some endpoints and as the string
/// `"true"` on others.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmailVerified {
    Flag(bool),
    Text(String),
}

impl EmailVerified {
    fn is_true(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Text(text) => text.eq_ignore_ascii_case("true"),
        }
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    /// Resolve a bearer credential to a verified email address.
    ///
    /// # Flow
    ///
    /// 1. Map the token type to the provider's query parameter
    /// 2. Call the introspection endpoint
    /// 3. Require a successful response carrying a verified email
    ///
    /// # Errors
    ///
    /// - `Rejected`: unsupported token type, non-success provider status,
    ///   missing email, or unverified email
    /// - `Provider`: transport failure or unparseable response body
    async fn verify_identity(
        &self,
        credential: &str,
        token_type: &str,
    ) -> Result<String, IdentityError> {
        let param = match token_type {
            "id_token" => "id_token",
            "access_token" => "access_token",
            other => {
                return Err(IdentityError::Rejected(format!(
                    "Unsupported token type: {other}"
                )));
            }
        };

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[(param, credential)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IdentityError::Rejected(
                "Identity provider rejected the credential".to_string(),
            ));
        }

        let info: TokenInfo = response.json().await?;

        let email = info.email.ok_or_else(|| {
            IdentityError::Rejected("Identity provider returned no account identifier".to_string())
        })?;

        if !info.email_verified.as_ref().is_some_and(EmailVerified::is_true) {
            return Err(IdentityError::Rejected(
                "Account email is not verified".to_string(),
            ));
        }

        Ok(email)
    }
}

/// Fixed-outcome verifier for tests: attests one account for any
/// credential, or rejects everything.
#[cfg(test)]
pub struct StaticIdentity {
    account: Option<String>,
}

#[cfg(test)]
impl StaticIdentity {
    pub fn verified(account: &str) -> Self {
        Self {
            account: Some(account.to_string()),
        }
    }

    pub fn rejecting() -> Self {
        Self { account: None }
    }
}

#[cfg(test)]
#[async_trait]
impl IdentityVerifier for StaticIdentity {
    async fn verify_identity(
        &self,
        _credential: &str,
        _token_type: &str,
    ) -> Result<String, IdentityError> {
        self.account
            .clone()
            .ok_or_else(|| IdentityError::Rejected("Credential rejected".to_string()))
    }
}
