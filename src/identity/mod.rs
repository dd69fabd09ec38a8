pub mod provider;
pub mod providers;
pub mod token_cache;

pub use provider::{IdentityError, IdentityProvider, Session, SignUpOutcome, SignUpRequest};
pub use providers::{CognitoProvider, CognitoSettings};
pub use token_cache::TokenCache;
