use super::*;
use crate::error::PoolError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeSet;
use tempfile::tempdir;

fn write_tokens(content: &str) -> Result<(tempfile::TempDir, std::path::PathBuf), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("all_tokens.json");
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;
    Ok((dir, path))
}

#[test]
fn load_reads_both_tiers() -> Result<(), String> {
    let (_dir, path) = write_tokens(
        r#"{
  "free": [
    { "user_id": "freeuser1", "token": "tok-f1", "tier": "free" },
    { "user_id": "freeuser2", "token": "tok-f2", "tier": "free" }
  ],
  "premium": [
    { "user_id": "premiumuser1", "token": "tok-p1", "tier": "premium" }
  ]
}"#,
    )?;

    let pool = CredentialPool::load(&path).map_err(|err| err.to_string())?;
    if pool.sizes() != (PoolSizes { free: 2, premium: 1 }) {
        return Err(format!("Unexpected sizes: {:?}", pool.sizes()));
    }
    let first = pool.first(Tier::Free).ok_or("Missing first free credential")?;
    if first.user_id != "freeuser1" || first.token != "tok-f1" {
        return Err(format!("Unexpected first credential: {:?}", first));
    }
    Ok(())
}

#[test]
fn load_accepts_single_tier_document() -> Result<(), String> {
    let (_dir, path) =
        write_tokens(r#"{ "premium": [ { "user_id": "p1", "token": "t1" } ] }"#)?;

    let pool = CredentialPool::load(&path).map_err(|err| err.to_string())?;
    if pool.len(Tier::Free) != 0 || pool.len(Tier::Premium) != 1 {
        return Err(format!("Unexpected sizes: {:?}", pool.sizes()));
    }
    let credential = pool.first(Tier::Premium).ok_or("Missing premium credential")?;
    if credential.tier != Tier::Premium {
        return Err("Expected tier to default to the array key".to_owned());
    }
    Ok(())
}

#[test]
fn load_fails_when_both_tiers_empty() -> Result<(), String> {
    let (_dir, path) = write_tokens(r#"{ "free": [], "premium": [] }"#)?;

    match CredentialPool::load(&path) {
        Err(PoolError::Empty) => Ok(()),
        other => Err(format!("Expected PoolError::Empty, got {:?}", other)),
    }
}

#[test]
fn load_fails_on_malformed_document() -> Result<(), String> {
    let (_dir, path) = write_tokens("{ not json")?;

    match CredentialPool::load(&path) {
        Err(PoolError::Parse { .. }) => Ok(()),
        other => Err(format!("Expected PoolError::Parse, got {:?}", other)),
    }
}

#[test]
fn load_fails_on_missing_file() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("missing.json");

    match CredentialPool::load(&path) {
        Err(PoolError::Read { .. }) => Ok(()),
        other => Err(format!("Expected PoolError::Read, got {:?}", other)),
    }
}

#[test]
fn load_skips_unusable_records() -> Result<(), String> {
    let (_dir, path) = write_tokens(
        r#"{
  "free": [
    { "user_id": "", "token": "tok" },
    { "user_id": "misplaced", "token": "tok", "tier": "premium" },
    { "user_id": "ok", "token": "tok", "tier": "free" }
  ],
  "premium": [ { "user_id": "blank-token", "token": "  " } ]
}"#,
    )?;

    let pool = CredentialPool::load(&path).map_err(|err| err.to_string())?;
    if pool.sizes() != (PoolSizes { free: 1, premium: 0 }) {
        return Err(format!("Unexpected sizes: {:?}", pool.sizes()));
    }
    Ok(())
}

#[test]
fn load_fails_when_every_record_is_unusable() -> Result<(), String> {
    let (_dir, path) = write_tokens(r#"{ "free": [ { "user_id": "u", "token": "" } ] }"#)?;

    match CredentialPool::load(&path) {
        Err(PoolError::Empty) => Ok(()),
        other => Err(format!("Expected PoolError::Empty, got {:?}", other)),
    }
}

#[test]
fn synthesize_generates_sample_identities() -> Result<(), String> {
    let pool = CredentialPool::synthesize(3).map_err(|err| err.to_string())?;
    if pool.sizes() != (PoolSizes { free: 3, premium: 3 }) {
        return Err(format!("Unexpected sizes: {:?}", pool.sizes()));
    }
    let free = pool.first(Tier::Free).ok_or("Missing free credential")?;
    if free.user_id != "freeuser1" || free.token != "sample_free_token_1" {
        return Err(format!("Unexpected free credential: {:?}", free));
    }
    let premium = pool.first(Tier::Premium).ok_or("Missing premium credential")?;
    if premium.user_id != "premiumuser1" || premium.token != "sample_premium_token_1" {
        return Err(format!("Unexpected premium credential: {:?}", premium));
    }
    Ok(())
}

#[test]
fn synthesize_rejects_zero_sample_size() -> Result<(), String> {
    match CredentialPool::synthesize(0) {
        Err(PoolError::SampleSizeZero) => Ok(()),
        other => Err(format!("Expected SampleSizeZero, got {:?}", other)),
    }
}

#[test]
fn draw_from_empty_tier_fails() -> Result<(), String> {
    let pool = CredentialPool::from_tiers(vec![Credential::new("u1", "t1", Tier::Free)], vec![])
        .map_err(|err| err.to_string())?;

    match pool.draw(Tier::Premium) {
        Err(PoolError::EmptyTier {
            tier: Tier::Premium,
        }) => Ok(()),
        other => Err(format!("Expected EmptyTier, got {:?}", other)),
    }
}

#[test]
fn draw_returns_credentials_of_requested_tier() -> Result<(), String> {
    let pool = CredentialPool::synthesize(5).map_err(|err| err.to_string())?;
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let credential = pool
            .draw_with(Tier::Premium, &mut rng)
            .map_err(|err| err.to_string())?;
        if credential.tier != Tier::Premium || !credential.user_id.starts_with("premiumuser") {
            return Err(format!("Drew wrong tier: {:?}", credential));
        }
    }
    Ok(())
}

#[test]
fn draw_covers_the_whole_tier() -> Result<(), String> {
    let pool = CredentialPool::synthesize(4).map_err(|err| err.to_string())?;
    let mut rng = StdRng::seed_from_u64(42);
    let mut seen = BTreeSet::new();
    for _ in 0..400 {
        let credential = pool
            .draw_with(Tier::Free, &mut rng)
            .map_err(|err| err.to_string())?;
        seen.insert(credential.user_id.clone());
    }
    if seen.len() != 4 {
        return Err(format!("Expected all 4 identities drawn, saw {:?}", seen));
    }
    Ok(())
}

#[test]
fn from_tiers_rejects_empty_pool() -> Result<(), String> {
    match CredentialPool::from_tiers(vec![], vec![]) {
        Err(PoolError::Empty) => Ok(()),
        other => Err(format!("Expected PoolError::Empty, got {:?}", other)),
    }
}
