use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use super::model::{Account, LoginResponse, RefreshResponse, SignInRequest, SignUpRequest, SignUpResponse};
use super::store::{AccountStore, SaveOutcome, TierTransition};
use crate::error::{ServiceError, ServiceResult};
use crate::identity::{Clock, Principal, Signer, Tier, TokenClass, Verifier};
use crate::security;

static EMAIL_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

const USER_NAME_CHARS: std::ops::RangeInclusive<usize> = 2..=5;
const PASSWORD_CHARS: std::ops::RangeInclusive<usize> = 8..=20;

fn valid_email(email: &str) -> bool {
    EMAIL_RE.as_ref().map(|re| re.is_match(email)).unwrap_or(false)
}

fn validate_sign_up(req: &SignUpRequest) -> ServiceResult<()> {
    if !valid_email(req.email.trim()) {
        return Err(ServiceError::Validation("email is not a valid address".into()));
    }
    let name_len = req.user_name.trim().chars().count();
    if !USER_NAME_CHARS.contains(&name_len) {
        return Err(ServiceError::Validation(format!(
            "user name must be {} to {} characters",
            USER_NAME_CHARS.start(),
            USER_NAME_CHARS.end()
        )));
    }
    let pw_len = req.password.chars().count();
    if !PASSWORD_CHARS.contains(&pw_len) {
        return Err(ServiceError::Validation(format!(
            "password must be {} to {} characters",
            PASSWORD_CHARS.start(),
            PASSWORD_CHARS.end()
        )));
    }
    Ok(())
}

/// Account flows that touch the store: sign-up, sign-in, refresh, promotion.
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    signer: Arc<Signer>,
    verifier: Arc<Verifier>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>, signer: Arc<Signer>, verifier: Arc<Verifier>, clock: Arc<dyn Clock>) -> Self {
        Self { store, signer, verifier, clock }
    }

    pub fn is_contact_taken(&self, email: &str) -> ServiceResult<bool> {
        if email.trim().is_empty() {
            return Err(ServiceError::Validation("email is required".into()));
        }
        let taken = self.store.exists_by_contact(email)?;
        if taken {
            warn!(target: "accounts", email = %email.trim(), "email already registered");
        }
        Ok(taken)
    }

    pub fn sign_up(&self, req: SignUpRequest) -> ServiceResult<SignUpResponse> {
        validate_sign_up(&req)?;
        if self.is_contact_taken(&req.email)? {
            return Err(ServiceError::DuplicateContact);
        }
        let joined = chrono::DateTime::from_timestamp(self.clock.now(), 0).unwrap_or_else(chrono::Utc::now);
        let account = Account {
            id: uuid::Uuid::new_v4().to_string(),
            email: req.email.trim().to_string(),
            user_name: req.user_name.trim().to_string(),
            password_hash: security::hash_password(&req.password)?,
            tier: Tier::Standard,
            join_date: joined,
        };
        // the store re-checks the contact under its write lock
        let SaveOutcome::Saved(saved) = self.store.save(account)? else {
            return Err(ServiceError::DuplicateContact);
        };
        info!(target: "accounts", id = %saved.id, "account created");
        Ok(SignUpResponse::from(&saved))
    }

    /// Unknown email and wrong password fail identically.
    pub fn sign_in(&self, req: SignInRequest) -> ServiceResult<LoginResponse> {
        let Some(account) = self.store.find_by_contact(&req.email)? else {
            security::verify_against_dummy(&req.password);
            return Err(ServiceError::InvalidCredentials);
        };
        if !security::verify_password(&account.password_hash, &req.password) {
            return Err(ServiceError::InvalidCredentials);
        }
        info!(target: "accounts", id = %account.id, "sign-in");
        let token = self.signer.issue_pair(&account.principal());
        Ok(LoginResponse::new(&account, token))
    }

    /// Mint a brand-new access token from a refresh token and the current record.
    pub fn refresh(&self, refresh_token: &str) -> ServiceResult<RefreshResponse> {
        let subject = self.verifier.verify_refresh(refresh_token)?;
        let account = self.store.find_by_id(&subject)?.ok_or(ServiceError::AccountNotFound)?;
        Ok(RefreshResponse { access_token: self.signer.issue(&account.principal(), TokenClass::Access) })
    }

    /// `Standard -> Premium`, once. Tokens issued before stay valid until they expire.
    pub fn promote(&self, principal: &Principal) -> ServiceResult<LoginResponse> {
        if principal.tier != Tier::Standard {
            return Err(ServiceError::IneligibleForPromotion);
        }
        let saved = match self.store.transition_tier(&principal.subject_id, Tier::Standard, Tier::Premium)? {
            TierTransition::Applied(account) => account,
            TierTransition::Rejected(_) => return Err(ServiceError::IneligibleForPromotion),
            TierTransition::NotFound => return Err(ServiceError::AccountNotFound),
        };
        info!(target: "accounts", id = %saved.id, tier = %saved.tier, "account promoted");
        let token = self.signer.issue_pair(&saved.principal());
        Ok(LoginResponse::new(&saved, token))
    }
}
