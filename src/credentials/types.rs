use std::fmt;

use serde::Deserialize;

/// Access class of a gateway user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Premium,
}

impl Tier {
    pub const ALL: [Tier; 2] = [Tier::Free, Tier::Premium];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Premium => "premium",
        }
    }

    /// Capitalized label used in prompts and console output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Tier::Free => "Free",
            Tier::Premium => "Premium",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub user_id: String,
    pub token: String,
    pub tier: Tier,
}

impl Credential {
    #[must_use]
    pub fn new(user_id: impl Into<String>, token: impl Into<String>, tier: Tier) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
            tier,
        }
    }
}

/// One record as it appears in a credential file. `tier` may be omitted, in
/// which case the array the record sits in decides it.
#[derive(Debug, Deserialize)]
pub(super) struct CredentialRecord {
    #[serde(default)]
    pub(super) user_id: String,
    #[serde(default)]
    pub(super) token: String,
    pub(super) tier: Option<Tier>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct CredentialDocument {
    #[serde(default)]
    pub(super) free: Vec<CredentialRecord>,
    #[serde(default)]
    pub(super) premium: Vec<CredentialRecord>,
}
