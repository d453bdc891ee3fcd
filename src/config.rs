//! Process configuration, read once at startup from `TODO_*` environment variables.
//!
//! Missing or weak signing secrets are fatal: `AppConfig::from_env` fails and
//! the server never binds.

use anyhow::{anyhow, bail, Context, Result};
use std::fmt::{Debug, Formatter};

use crate::identity::KeyRing;

pub const ENV_HTTP_PORT: &str = "TODO_HTTP_PORT";
pub const ENV_BIND: &str = "TODO_BIND";
pub const ENV_ACCESS_SECRET: &str = "TODO_JWT_SECRET";
pub const ENV_REFRESH_SECRET: &str = "TODO_JWT_REFRESH_SECRET";
pub const ENV_ACCESS_TTL: &str = "TODO_ACCESS_TTL_SECS";
pub const ENV_REFRESH_TTL: &str = "TODO_REFRESH_TTL_SECS";
pub const ENV_ISSUER: &str = "TODO_JWT_ISSUER";

pub const DEFAULT_HTTP_PORT: u16 = 8181;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_ISSUER: &str = "todo-service";
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 30;
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 10 * 60;

/// 256 bits.
pub const MIN_SECRET_BYTES: usize = 32;

#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    pub fn as_bytes(&self) -> &[u8] { &self.0 }
}

impl Debug for SecretKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey(<redacted {} bytes>)", self.0.len())
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub issuer: String,
    pub access_secret: SecretKey,
    pub refresh_secret: SecretKey,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

impl AuthConfig {
    pub fn new(
        issuer: impl Into<String>,
        access_secret: Vec<u8>,
        refresh_secret: Vec<u8>,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Result<Self> {
        if access_secret.len() < MIN_SECRET_BYTES {
            bail!("access signing secret must be at least {} bytes", MIN_SECRET_BYTES);
        }
        if refresh_secret.len() < MIN_SECRET_BYTES {
            bail!("refresh signing secret must be at least {} bytes", MIN_SECRET_BYTES);
        }
        if access_secret == refresh_secret {
            bail!("access and refresh signing secrets must differ");
        }
        if access_ttl_secs <= 0 || refresh_ttl_secs <= 0 {
            bail!("token lifetimes must be positive");
        }
        if refresh_ttl_secs <= access_ttl_secs {
            tracing::warn!(
                target: "config",
                access_ttl_secs, refresh_ttl_secs,
                "refresh tokens do not outlive access tokens"
            );
        }
        Ok(Self {
            issuer: issuer.into(),
            access_secret: SecretKey(access_secret),
            refresh_secret: SecretKey(refresh_secret),
            access_ttl_secs,
            refresh_ttl_secs,
        })
    }

    pub fn key_ring(&self) -> Result<KeyRing> {
        KeyRing::new(self.access_secret.as_bytes(), self.refresh_secret.as_bytes())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: String,
    pub http_port: u16,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let http_port = match lookup(ENV_HTTP_PORT) {
            Some(v) => v.trim().parse::<u16>().with_context(|| format!("{} is not a port: '{}'", ENV_HTTP_PORT, v))?,
            None => DEFAULT_HTTP_PORT,
        };
        let bind = lookup(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let issuer = lookup(ENV_ISSUER).unwrap_or_else(|| DEFAULT_ISSUER.to_string());

        let access_secret = lookup(ENV_ACCESS_SECRET).ok_or_else(|| anyhow!("{} must be set", ENV_ACCESS_SECRET))?;
        let refresh_secret = lookup(ENV_REFRESH_SECRET).ok_or_else(|| anyhow!("{} must be set", ENV_REFRESH_SECRET))?;
        let access_ttl = parse_secs(&lookup, ENV_ACCESS_TTL, DEFAULT_ACCESS_TTL_SECS)?;
        let refresh_ttl = parse_secs(&lookup, ENV_REFRESH_TTL, DEFAULT_REFRESH_TTL_SECS)?;

        let auth = AuthConfig::new(issuer, access_secret.into_bytes(), refresh_secret.into_bytes(), access_ttl, refresh_ttl)
            .context("invalid token configuration")?;
        Ok(Self { bind, http_port, auth })
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(p) = port { self.http_port = p; }
        self
    }
}

fn parse_secs<F>(lookup: &F, name: &str, default: i64) -> Result<i64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(v) => v.trim().parse::<i64>().with_context(|| format!("{} is not a number of seconds: '{}'", name, v)),
        None => Ok(default),
    }
}
