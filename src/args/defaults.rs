pub(crate) const DEFAULT_USER_AGENT: &str =
    concat!("tierstress-loadtest/", env!("CARGO_PKG_VERSION"));

pub(super) const DEFAULT_TOKEN_FILE_PATH: &str = "../tokens/all/all_tokens.json";
pub(super) const DEFAULT_PATH_PREFIX: &str = "llm";
pub(super) const DEFAULT_COMPLETIONS_PATH: &str = "v1/chat/completions";
pub(super) const DEFAULT_AUTH_SCHEME: &str = "Bearer";
/// Host prefix used when only a cluster domain is configured.
pub(super) const HOST_PREFIX: &str = "maas";
