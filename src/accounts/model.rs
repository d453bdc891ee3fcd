use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{Principal, Tier, TokenPair};

/// Stored account record. `email` is the contact identifier embedded in tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub user_name: String,
    pub password_hash: String,
    pub tier: Tier,
    pub join_date: DateTime<Utc>,
}

impl Account {
    /// Token seed for this record.
    pub fn principal(&self) -> Principal {
        Principal::new(self.id.clone(), self.email.clone(), self.tier)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    pub id: String,
    pub email: String,
    pub user_name: String,
    pub join_date: NaiveDate,
}

impl From<&Account> for SignUpResponse {
    fn from(a: &Account) -> Self {
        Self { id: a.id.clone(), email: a.email.clone(), user_name: a.user_name.clone(), join_date: a.join_date.date_naive() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Body returned by sign-in and promotion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: String,
    pub email: String,
    pub user_name: String,
    pub join_date: NaiveDate,
    pub role: Tier,
    pub token: TokenPair,
}

impl LoginResponse {
    pub fn new(account: &Account, token: TokenPair) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            user_name: account.user_name.clone(),
            join_date: account.join_date.date_naive(),
            role: account.tier,
            token,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}
