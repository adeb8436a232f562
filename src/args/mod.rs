//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod resolve;
mod types;


pub use cli::HarnessArgs;
pub use resolve::default_host;
pub use types::{PositiveU64, PositiveUsize, Scheme};

pub(crate) use defaults::DEFAULT_USER_AGENT;
