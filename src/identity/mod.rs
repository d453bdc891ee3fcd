//! Stateless session credentials and route-level access control.
//! Keep the public surface thin and split implementation across sub-modules.

mod clock;
mod policy;
mod principal;
mod request_context;
mod signer;
mod token;
mod verifier;

pub use clock::{Clock, ManualClock, SystemClock};
pub use policy::{AuthorizationPolicy, Requirement, RouteRule};
pub use principal::{Principal, Tier};
pub use request_context::{Authenticated, RequestContext};
pub use signer::{Signer, TokenPair};
pub use token::{Claims, KeyRing, SessionToken, TokenClass, TokenError};
pub use verifier::Verifier;
