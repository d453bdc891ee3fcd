use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Account capability level. Serialized with the claim names used on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    #[default]
    #[serde(rename = "COMMON")]
    Standard,
    #[serde(rename = "PREMIUM")]
    Premium,
    #[serde(rename = "ADMIN")]
    Administrator,
}

impl Tier {
    pub fn as_claim(&self) -> &'static str {
        match self {
            Tier::Standard => "COMMON",
            Tier::Premium => "PREMIUM",
            Tier::Administrator => "ADMIN",
        }
    }

    /// Maximum number of todos an account of this tier may hold, `None` = unlimited.
    pub fn todo_quota(&self) -> Option<usize> {
        match self {
            Tier::Standard => Some(5),
            Tier::Premium | Tier::Administrator => None,
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_claim())
    }
}

/// Verified identity attached to a request. Built only from verified claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub subject_id: String,
    pub contact: String,
    pub tier: Tier,
}

impl Principal {
    pub fn new(subject_id: impl Into<String>, contact: impl Into<String>, tier: Tier) -> Self {
        Self { subject_id: subject_id.into(), contact: contact.into(), tier }
    }
}
