use std::path::Path;

use rand::Rng;
use tracing::warn;

use crate::error::PoolError;

use super::types::{Credential, CredentialDocument, CredentialRecord, Tier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolSizes {
    pub free: usize,
    pub premium: usize,
}

impl PoolSizes {
    #[must_use]
    pub const fn get(self, tier: Tier) -> usize {
        match tier {
            Tier::Free => self.free,
            Tier::Premium => self.premium,
        }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.free == 0 && self.premium == 0
    }
}

/// Credentials split by tier. Immutable once built, so concurrent draws need
/// no locking.
#[derive(Debug, Clone)]
pub struct CredentialPool {
    free: Vec<Credential>,
    premium: Vec<Credential>,
}

impl CredentialPool {
    /// Load a pool from a JSON document with `free` and `premium` arrays.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if neither
    /// tier yields a usable credential.
    pub fn load(path: &Path) -> Result<Self, PoolError> {
        let content = std::fs::read_to_string(path).map_err(|err| PoolError::Read {
            path: path.to_path_buf(),
            source: err,
        })?;
        let document: CredentialDocument =
            serde_json::from_str(&content).map_err(|err| PoolError::Parse {
                path: path.to_path_buf(),
                source: err,
            })?;
        let free = usable_records(document.free, Tier::Free);
        let premium = usable_records(document.premium, Tier::Premium);
        Self::from_tiers(free, premium)
    }

    /// Generate `sample_size` synthetic identities per tier.
    ///
    /// # Errors
    ///
    /// Returns an error when `sample_size` is zero.
    pub fn synthesize(sample_size: usize) -> Result<Self, PoolError> {
        if sample_size == 0 {
            return Err(PoolError::SampleSizeZero);
        }
        let free = (1..=sample_size)
            .map(|idx| {
                Credential::new(
                    format!("freeuser{}", idx),
                    format!("sample_free_token_{}", idx),
                    Tier::Free,
                )
            })
            .collect();
        let premium = (1..=sample_size)
            .map(|idx| {
                Credential::new(
                    format!("premiumuser{}", idx),
                    format!("sample_premium_token_{}", idx),
                    Tier::Premium,
                )
            })
            .collect();
        Self::from_tiers(free, premium)
    }

    /// Build a pool from already-validated credentials.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Empty`] when both tiers are empty.
    pub fn from_tiers(free: Vec<Credential>, premium: Vec<Credential>) -> Result<Self, PoolError> {
        if free.is_empty() && premium.is_empty() {
            return Err(PoolError::Empty);
        }
        Ok(Self { free, premium })
    }

    #[must_use]
    pub const fn sizes(&self) -> PoolSizes {
        PoolSizes {
            free: self.free.len(),
            premium: self.premium.len(),
        }
    }

    #[must_use]
    pub fn len(&self, tier: Tier) -> usize {
        self.tier(tier).len()
    }

    #[must_use]
    pub fn first(&self, tier: Tier) -> Option<&Credential> {
        self.tier(tier).first()
    }

    /// Draw a uniformly random credential of `tier`, with replacement.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::EmptyTier`] when the tier has no credentials.
    pub fn draw(&self, tier: Tier) -> Result<&Credential, PoolError> {
        self.draw_with(tier, &mut rand::thread_rng())
    }

    /// Same as [`CredentialPool::draw`] with a caller-provided RNG.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::EmptyTier`] when the tier has no credentials.
    pub fn draw_with<R: Rng + ?Sized>(
        &self,
        tier: Tier,
        rng: &mut R,
    ) -> Result<&Credential, PoolError> {
        let credentials = self.tier(tier);
        if credentials.is_empty() {
            return Err(PoolError::EmptyTier { tier });
        }
        let idx = rng.gen_range(0..credentials.len());
        credentials.get(idx).ok_or(PoolError::EmptyTier { tier })
    }

    fn tier(&self, tier: Tier) -> &[Credential] {
        match tier {
            Tier::Free => &self.free,
            Tier::Premium => &self.premium,
        }
    }
}

fn usable_records(records: Vec<CredentialRecord>, tier: Tier) -> Vec<Credential> {
    let mut usable = Vec::with_capacity(records.len());
    for (idx, record) in records.into_iter().enumerate() {
        if record.user_id.trim().is_empty() || record.token.trim().is_empty() {
            warn!("Skipping {} credential #{}: missing user_id or token.", tier, idx);
            continue;
        }
        if let Some(declared) = record.tier
            && declared != tier
        {
            warn!(
                "Skipping credential for '{}': declared tier {} but listed under {}.",
                record.user_id, declared, tier
            );
            continue;
        }
        usable.push(Credential {
            user_id: record.user_id,
            token: record.token,
            tier,
        });
    }
    usable
}
