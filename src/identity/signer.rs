use std::sync::Arc;

use hmac::Mac;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::clock::Clock;
use super::principal::Principal;
use super::token::{encode_segment, KeyRing, SessionToken, TokenClass, ALGORITHM, TOKEN_TYPE};
use crate::config::AuthConfig;

static HEADER_SEGMENT: Lazy<String> = Lazy::new(|| {
    let header = serde_json::json!({ "alg": ALGORITHM, "typ": TOKEN_TYPE });
    encode_segment(header.to_string().as_bytes())
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: SessionToken,
    pub refresh_token: SessionToken,
}

/// Mints signed tokens. Lifetimes come from configuration only.
pub struct Signer {
    keys: KeyRing,
    issuer: String,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
    clock: Arc<dyn Clock>,
}

impl Signer {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        Ok(Self {
            keys: config.key_ring()?,
            issuer: config.issuer.clone(),
            access_ttl_secs: config.access_ttl_secs,
            refresh_ttl_secs: config.refresh_ttl_secs,
            clock,
        })
    }

    pub fn lifetime_secs(&self, class: TokenClass) -> i64 {
        match class {
            TokenClass::Access => self.access_ttl_secs,
            TokenClass::Refresh => self.refresh_ttl_secs,
        }
    }

    pub fn issue(&self, seed: &Principal, class: TokenClass) -> SessionToken {
        let iat = self.clock.now();
        let exp = iat + self.lifetime_secs(class);
        let claims = match class {
            TokenClass::Access => serde_json::json!({
                "iss": self.issuer,
                "sub": seed.subject_id,
                "iat": iat,
                "exp": exp,
                "email": seed.contact,
                "role": seed.tier,
            }),
            TokenClass::Refresh => serde_json::json!({
                "iss": self.issuer,
                "sub": seed.subject_id,
                "iat": iat,
                "exp": exp,
            }),
        };
        let signing_input = format!("{}.{}", HEADER_SEGMENT.as_str(), encode_segment(claims.to_string().as_bytes()));
        let mut mac = self.keys.mac(class);
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        tracing::debug!(target: "auth", sub = %seed.subject_id, class = class.as_str(), exp, "token.issue");
        format!("{}.{}", signing_input, encode_segment(&signature))
    }

    pub fn issue_pair(&self, seed: &Principal) -> TokenPair {
        TokenPair {
            access_token: self.issue(seed, TokenClass::Access),
            refresh_token: self.issue(seed, TokenClass::Refresh),
        }
    }
}
