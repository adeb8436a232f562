
use std::process::Output;

use tempfile::tempdir;

use support_gateway::{GatewayBehavior, run_tierstress, spawn_gateway_or_skip};

fn describe(output: &Output) -> String {
    format!(
        "status: {:?}\nstdout: {}\nstderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

fn base_args(host: &str) -> Vec<String> {
    [
        "--host",
        host,
        "--protocol",
        "http",
        "--model",
        "facebook/opt-125m",
        "--use-sample-tokens",
        "--sample-size",
        "3",
        "--timeout",
        "5s",
    ]
    .iter()
    .map(|arg| (*arg).to_owned())
    .collect()
}

#[test]
fn e2e_burst_against_healthy_gateway_passes() -> Result<(), String> {
    let Some((host, _server)) = spawn_gateway_or_skip(GatewayBehavior::AllOk)? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;

    let mut args = base_args(&host);
    args.extend(
        ["--burst-iterations", "12", "--burst-vus", "4"]
            .iter()
            .map(|arg| (*arg).to_owned()),
    );
    let output = run_tierstress(args, dir.path())?;
    if output.status.code() != Some(0) {
        return Err(describe(&output));
    }
    Ok(())
}

#[test]
fn e2e_rate_probe_with_token_limited_free_tier_fails_thresholds() -> Result<(), String> {
    let Some((host, _server)) = spawn_gateway_or_skip(GatewayBehavior::FreeTokenLimited)? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;

    let mut args = base_args(&host);
    args.extend(
        [
            "--mode",
            "rate-limit-test",
            "--rate-limit-vus",
            "2",
            "--rate-limit-duration",
            "500ms",
        ]
        .iter()
        .map(|arg| (*arg).to_owned()),
    );
    let output = run_tierstress(args, dir.path())?;
    if output.status.code() != Some(99) {
        return Err(describe(&output));
    }
    Ok(())
}

#[test]
fn e2e_soak_reads_settings_from_config_file() -> Result<(), String> {
    let Some((host, _server)) = spawn_gateway_or_skip(GatewayBehavior::AllOk)? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let config = format!(
        "mode = \"soak\"\nhost = \"{}\"\nsoak_duration = \"1s\"\nsoak_rate_free = 10.0\nsoak_rate_premium = 10.0\nuse_sample_tokens = true\nsample_size = 2\n",
        host
    );
    std::fs::write(dir.path().join("tierstress.toml"), config)
        .map_err(|err| format!("write config failed: {}", err))?;

    let output = run_tierstress(["--model", "granite"], dir.path())?;
    if output.status.code() != Some(0) {
        return Err(describe(&output));
    }
    Ok(())
}

#[test]
fn e2e_missing_token_file_is_a_setup_error() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let missing = dir.path().join("absent.json");
    let output = run_tierstress(
        [
            "--host",
            "127.0.0.1:9",
            "--token-file",
            missing.to_string_lossy().as_ref(),
        ],
        dir.path(),
    )?;
    if output.status.code() != Some(1) {
        return Err(describe(&output));
    }
    Ok(())
}

#[test]
fn e2e_missing_host_is_a_setup_error() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let output = run_tierstress(["--use-sample-tokens"], dir.path())?;
    if output.status.code() != Some(1) {
        return Err(describe(&output));
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.contains("host") {
        return Err(describe(&output));
    }
    Ok(())
}
