//! Token models: redacted secrets and issued grants.

pub mod grant;
pub mod secret;

pub use grant::*;
pub use secret::*;
