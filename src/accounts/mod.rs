//! Account records, the store collaborator and the flows that mint tokens for them.

mod model;
mod service;
mod store;

pub use model::{Account, LoginResponse, RefreshRequest, RefreshResponse, SignInRequest, SignUpRequest, SignUpResponse};
pub use service::AccountService;
pub use store::{AccountStore, InMemoryAccountStore, SaveOutcome, TierTransition};
