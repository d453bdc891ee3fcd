//! Compact token format shared by the signer and the verifier.
//!
//! A token is `base64url(header).base64url(claims).base64url(signature)` without
//! padding. The signature is HMAC-SHA512 over the first two segments, keyed by
//! the token class. The algorithm is fixed: the header is checked, never
//! consulted to pick one.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use std::fmt::{Debug, Formatter};

use super::principal::Tier;

pub type SessionToken = String;

pub(crate) type HmacSha512 = Hmac<Sha512>;

pub const ALGORITHM: &str = "HS512";
pub const TOKEN_TYPE: &str = "JWT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    Access,
    Refresh,
}

impl TokenClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenClass::Access => "access",
            TokenClass::Refresh => "refresh",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
}

impl TokenError {
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::Malformed => "token_malformed",
            TokenError::InvalidSignature => "token_invalid_signature",
            TokenError::Expired => "token_expired",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct Header {
    pub alg: String,
    pub typ: String,
}

/// Claim set carried by both token classes. Refresh tokens leave `email` and `role` out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Tier>,
}

/// One HMAC instance per token class, keyed once at startup and cloned per use.
#[derive(Clone)]
pub struct KeyRing {
    access: HmacSha512,
    refresh: HmacSha512,
}

impl KeyRing {
    pub fn new(access_key: &[u8], refresh_key: &[u8]) -> anyhow::Result<Self> {
        let access = HmacSha512::new_from_slice(access_key)
            .map_err(|e| anyhow::anyhow!("access signing key rejected: {}", e))?;
        let refresh = HmacSha512::new_from_slice(refresh_key)
            .map_err(|e| anyhow::anyhow!("refresh signing key rejected: {}", e))?;
        Ok(Self { access, refresh })
    }

    pub(crate) fn mac(&self, class: TokenClass) -> HmacSha512 {
        match class {
            TokenClass::Access => self.access.clone(),
            TokenClass::Refresh => self.refresh.clone(),
        }
    }
}

impl Debug for KeyRing {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyRing(<redacted>)")
    }
}

/// Segments of a token that passed the structural check. Nothing here is trusted yet.
#[derive(Debug)]
pub(crate) struct RawToken<'a> {
    pub signing_input: &'a str,
    pub header: Vec<u8>,
    pub claims: Vec<u8>,
    pub signature: Option<Vec<u8>>,
}

/// Split and decode a token without touching any key.
///
/// Header and claims segments must decode, otherwise the token is `Malformed`.
/// A signature segment that does not decode is kept as `None` and fails later
/// as `InvalidSignature`, since no key can produce it.
pub(crate) fn split(token: &str) -> Result<RawToken<'_>, TokenError> {
    let token = token.trim();
    let mut parts = token.split('.');
    let (Some(h), Some(c), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
        return Err(TokenError::Malformed);
    };
    if h.is_empty() || c.is_empty() || s.is_empty() {
        return Err(TokenError::Malformed);
    }
    let header = URL_SAFE_NO_PAD.decode(h).map_err(|_| TokenError::Malformed)?;
    let claims = URL_SAFE_NO_PAD.decode(c).map_err(|_| TokenError::Malformed)?;
    let signature = URL_SAFE_NO_PAD.decode(s).ok();
    Ok(RawToken {
        signing_input: &token[..h.len() + 1 + c.len()],
        header,
        claims,
        signature,
    })
}

pub(crate) fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}
