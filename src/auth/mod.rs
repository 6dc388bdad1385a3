// Pass Protector - Authentication Module
//
// `SessionManager` tracks the one current session and tells observers about
// every transition. Identity providers only produce a `Session`; persisting
// it and notifying dependents is the manager's job.

mod error;
mod manager;
mod provider;
mod session;

pub use error::AuthError;
pub use manager::{SessionManager, Subscription};
pub use provider::{AnonymousProvider, EmailProvider, IdentityProvider};
pub use session::{ProviderKind, Session};
