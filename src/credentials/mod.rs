//! Tiered test identities and the read-only pool they are drawn from.
mod pool;
mod types;

#[cfg(test)]
mod tests;

pub use pool::{CredentialPool, PoolSizes};
pub use types::{Credential, Tier};
