use std::collections::BTreeSet;
use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

use crate::config::JwtSettings;

/// Classified validation failure.
///
/// Every rejected token maps to exactly one kind, so callers can log a category
/// without exposing algorithm or key detail.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("malformed claims")]
    MalformedClaims,
    #[error("token expired")]
    Expired,
    #[error("issuer or audience mismatch")]
    ClaimMismatch,
}

impl ValidationFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidSignature => "invalid_signature",
            Self::MalformedClaims => "malformed_claims",
            Self::Expired => "expired",
            Self::ClaimMismatch => "claim_mismatch",
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error(transparent)]
    Rejected(#[from] ValidationFailure),
    // Anything jsonwebtoken reports that is not a property of the token itself
    // (key format, crypto backend). Server-side detail only.
    #[error("unclassified token validation error: {0}")]
    Internal(jsonwebtoken::errors::Error),
}

/// Wire shape of the payload. Every field is required; serde rejects a partial payload.
#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: String,
    exp: i64,
    iss: String,
    aud: String,
    scope: String,
}

/// Fully validated claims. Only `TokenValidator` constructs this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSet {
    subject: String,
    expires_at: DateTime<Utc>,
    issuer: String,
    audience: String,
    scopes: BTreeSet<String>,
}

impl ClaimSet {
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.scopes
    }

    /// Exact membership. No wildcard, prefix or hierarchy matching.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}

/// Split a space-separated `scope` claim into a set. Duplicates collapse and
/// empty segments (repeated spaces) are dropped.
pub fn parse_scopes(raw: &str) -> BTreeSet<String> {
    raw.split(' ')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// HS256 bearer token verifier.
///
/// - Key material is intentionally not printable via Debug.
/// - Expiration, issuer and audience are checked here rather than by
///   `jsonwebtoken::Validation`, so that `exp == now` is rejected and the
///   failure kinds stay in a fixed order (signature, claims, expiry, issuer/audience).
#[derive(Clone)]
pub struct TokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
}

impl fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("TokenValidator")
            .field("algorithms", &self.validation.algorithms)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

impl TokenValidator {
    pub fn new(settings: &JwtSettings) -> Self {
        let decoding_key = DecodingKey::from_secret(settings.signing_key.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            decoding_key,
            validation,
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
        }
    }

    pub fn validate(&self, token: &str) -> Result<ClaimSet, TokenError> {
        self.validate_at(token, Utc::now().timestamp())
    }

    /// Validate against an explicit clock (unix seconds).
    pub fn validate_at(&self, token: &str, now: i64) -> Result<ClaimSet, TokenError> {
        check_header(token)?;

        // signature + structural decode
        let claims = jsonwebtoken::decode::<RawClaims>(token, &self.decoding_key, &self.validation)
            .map_err(classify)?
            .claims;

        if claims.sub.is_empty() {
            return Err(ValidationFailure::MalformedClaims.into());
        }
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .ok_or(ValidationFailure::MalformedClaims)?;

        if now >= claims.exp {
            return Err(ValidationFailure::Expired.into());
        }

        if claims.iss != self.issuer || claims.aud != self.audience {
            return Err(ValidationFailure::ClaimMismatch.into());
        }

        Ok(ClaimSet {
            subject: claims.sub,
            expires_at,
            issuer: claims.iss,
            audience: claims.aud,
            scopes: parse_scopes(&claims.scope),
        })
    }
}

/// Only HS256 tokens can carry our signature. `alg: none`, a missing `alg` or an
/// algorithm jsonwebtoken does not know all fail here as `InvalidSignature`.
fn check_header(token: &str) -> Result<(), TokenError> {
    match jsonwebtoken::decode_header(token) {
        Ok(header) if header.alg == Algorithm::HS256 => Ok(()),
        Ok(_) => Err(ValidationFailure::InvalidSignature.into()),
        Err(err) if matches!(err.kind(), ErrorKind::Json(_)) && lacks_hs256_alg(token) => {
            Err(ValidationFailure::InvalidSignature.into())
        }
        Err(err) => Err(classify(err)),
    }
}

// jsonwebtoken reports an unknown `alg` as a JSON error; tell that apart from a header
// that is not a JSON object at all.
fn lacks_hs256_alg(token: &str) -> bool {
    let Some(segment) = token.split('.').next() else {
        return false;
    };
    let Ok(bytes) = URL_SAFE_NO_PAD.decode(segment) else {
        return false;
    };
    match serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(&bytes) {
        Ok(header) => header.get("alg").and_then(serde_json::Value::as_str) != Some("HS256"),
        Err(_) => false,
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        // A token announcing another algorithm cannot be verified with our key.
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
            ValidationFailure::InvalidSignature.into()
        }
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::MissingRequiredClaim(_) => ValidationFailure::MalformedClaims.into(),
        ErrorKind::ExpiredSignature => ValidationFailure::Expired.into(),
        ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
            ValidationFailure::ClaimMismatch.into()
        }
        _ => TokenError::Internal(err),
    }
}
