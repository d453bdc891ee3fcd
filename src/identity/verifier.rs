use std::sync::Arc;

use hmac::Mac;

use super::clock::Clock;
use super::principal::Principal;
use super::token::{split, Claims, Header, KeyRing, TokenClass, TokenError, ALGORITHM};
use crate::config::AuthConfig;

/// Checks tokens against the key of the requested class and the clock.
///
/// Order of checks: structure (`Malformed`, before any key use), signature
/// (`InvalidSignature`), claim parsing (`Malformed`), expiry (`Expired`).
/// Never consults a store: every returned field comes from the signed claims.
pub struct Verifier {
    keys: KeyRing,
    clock: Arc<dyn Clock>,
}

impl Verifier {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        Ok(Self { keys: config.key_ring()?, clock })
    }

    pub fn verify(&self, token: &str, class: TokenClass) -> Result<Claims, TokenError> {
        let raw = split(token)?;

        let mut mac = self.keys.mac(class);
        mac.update(raw.signing_input.as_bytes());
        let signature = raw.signature.ok_or(TokenError::InvalidSignature)?;
        mac.verify_slice(&signature).map_err(|_| TokenError::InvalidSignature)?;

        let header: Header = serde_json::from_slice(&raw.header).map_err(|_| TokenError::Malformed)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::InvalidSignature);
        }
        let claims: Claims = serde_json::from_slice(&raw.claims).map_err(|_| TokenError::Malformed)?;

        if self.clock.now() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Verify an access token and rebuild the principal from its claims.
    pub fn verify_access(&self, token: &str) -> Result<Principal, TokenError> {
        let claims = self.verify(token, TokenClass::Access)?;
        let (Some(contact), Some(tier)) = (claims.email, claims.role) else {
            return Err(TokenError::Malformed);
        };
        Ok(Principal { subject_id: claims.sub, contact, tier })
    }

    /// Verify a refresh token, returning the subject it was minted for.
    pub fn verify_refresh(&self, token: &str) -> Result<String, TokenError> {
        self.verify(token, TokenClass::Refresh).map(|c| c.sub)
    }

    /// Advisory check: is this refresh token still usable? Never propagates the failure.
    pub fn is_refresh_usable(&self, token: &str) -> bool {
        match self.verify_refresh(token) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(target: "auth", error = %e, "refresh token not usable");
                false
            }
        }
    }
}
