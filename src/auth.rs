//! Account identities, object type names, and redacted secrets.

pub mod account;
pub mod id;
pub mod secret;

pub use account::*;
pub use id::*;
pub use secret::*;
