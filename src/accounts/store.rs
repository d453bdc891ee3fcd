use std::collections::HashMap;

use anyhow::Result;
use parking_lot::RwLock;

use super::model::Account;
use crate::identity::Tier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(Account),
    /// The contact is held by a different account; nothing was written.
    ContactTaken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierTransition {
    Applied(Account),
    /// The record was not at the expected tier; it holds this one.
    Rejected(Tier),
    NotFound,
}

/// Account persistence collaborator. Calls are synchronous; implementations own
/// their timeouts and need no isolation stronger than read-committed.
pub trait AccountStore: Send + Sync {
    fn find_by_id(&self, id: &str) -> Result<Option<Account>>;
    fn find_by_contact(&self, contact: &str) -> Result<Option<Account>>;
    fn exists_by_contact(&self, contact: &str) -> Result<bool>;
    /// Insert or replace by id. The contact check and the write are one atomic step.
    fn save(&self, account: Account) -> Result<SaveOutcome>;
    /// Move the account from `from` to `to` only if it is still at `from`.
    fn transition_tier(&self, id: &str, from: Tier, to: Tier) -> Result<TierTransition>;
}

pub(crate) fn contact_key(contact: &str) -> String {
    contact.trim().to_lowercase()
}

#[derive(Debug, Default)]
struct Tables {
    by_id: HashMap<String, Account>,
    by_contact: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    tables: RwLock<Tables>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.tables.read().by_id.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl AccountStore for InMemoryAccountStore {
    fn find_by_id(&self, id: &str) -> Result<Option<Account>> {
        Ok(self.tables.read().by_id.get(id).cloned())
    }

    fn find_by_contact(&self, contact: &str) -> Result<Option<Account>> {
        let t = self.tables.read();
        Ok(t.by_contact.get(&contact_key(contact)).and_then(|id| t.by_id.get(id)).cloned())
    }

    fn exists_by_contact(&self, contact: &str) -> Result<bool> {
        Ok(self.tables.read().by_contact.contains_key(&contact_key(contact)))
    }

    fn save(&self, account: Account) -> Result<SaveOutcome> {
        let mut t = self.tables.write();
        let key = contact_key(&account.email);
        if t.by_contact.get(&key).is_some_and(|owner| owner != &account.id) {
            return Ok(SaveOutcome::ContactTaken);
        }
        let old_key = t.by_id.get(&account.id).map(|previous| contact_key(&previous.email));
        if let Some(old_key) = old_key.filter(|k| k != &key) {
            t.by_contact.remove(&old_key);
        }
        t.by_contact.insert(key, account.id.clone());
        t.by_id.insert(account.id.clone(), account.clone());
        Ok(SaveOutcome::Saved(account))
    }

    fn transition_tier(&self, id: &str, from: Tier, to: Tier) -> Result<TierTransition> {
        let mut t = self.tables.write();
        let Some(account) = t.by_id.get_mut(id) else {
            return Ok(TierTransition::NotFound);
        };
        if account.tier != from {
            return Ok(TierTransition::Rejected(account.tier));
        }
        account.tier = to;
        Ok(TierTransition::Applied(account.clone()))
    }
}
