use std::ffi::OsString;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tracing::{error, info};

use crate::args::HarnessArgs;
use crate::config::{apply_config, load_config};
use crate::credentials::{CredentialPool, Tier};
use crate::dispatch::{ReqwestTransport, RequestDispatcher};
use crate::error::AppResult;
use crate::metrics::MetricsAggregator;
use crate::plan::plan;
use crate::runner::ScenarioRunner;
use crate::shutdown::{setup_signal_shutdown_handler, shutdown_channel};
use crate::summary::{ConsoleReport, RunDescription};
use crate::threshold::{Verdict, evaluate};

/// Exit status when the run completed but thresholds were violated.
pub const EXIT_THRESHOLDS_FAILED: u8 = 99;
/// Exit status for configuration or setup failures before any traffic.
pub const EXIT_SETUP_ERROR: u8 = 1;

/// Parse arguments, run the selected mode and map the verdict to an exit code.
#[must_use]
pub fn run() -> ExitCode {
    match execute(std::env::args_os()) {
        Ok(Verdict::Pass) => ExitCode::SUCCESS,
        Ok(Verdict::Fail(_)) => ExitCode::from(EXIT_THRESHOLDS_FAILED),
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(EXIT_SETUP_ERROR)
        }
    }
}

fn execute<I>(raw_args: I) -> AppResult<Verdict>
where
    I: IntoIterator<Item = OsString>,
{
    let (mut args, matches) = parse_args(raw_args)?;
    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, &matches, &config)?;
    }

    crate::logger::init_logging(args.debug);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(args))
}

fn parse_args<I>(raw_args: I) -> AppResult<(HarnessArgs, ArgMatches)>
where
    I: IntoIterator<Item = OsString>,
{
    let matches = match HarnessArgs::command().try_get_matches_from(raw_args) {
        Ok(matches) => matches,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => return Err(err.into()),
    };
    let args = HarnessArgs::from_arg_matches(&matches)?;
    Ok((args, matches))
}

async fn run_async(args: HarnessArgs) -> AppResult<Verdict> {
    let pool = Arc::new(load_pool(&args)?);
    let plans = plan(&args.mode_settings(), pool.sizes())?;
    let template = args.request_template()?;
    let description = RunDescription {
        mode: args.mode,
        host: args.resolved_host().unwrap_or_default(),
        protocol: args.protocol,
        model_name: args.model_name.trim().to_owned(),
        free_url: template.url(Tier::Free).to_string(),
        premium_url: template.url(Tier::Premium).to_string(),
        debug: args.debug,
    };

    let metrics = Arc::new(MetricsAggregator::new()?);
    let transport = Arc::new(ReqwestTransport::new()?);
    let dispatcher = RequestDispatcher::new(
        Arc::clone(&pool),
        template,
        transport,
        Arc::clone(&metrics),
        args.debug,
    );

    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);
    let thresholds = args.thresholds();
    let report = ConsoleReport::new(description, &pool, thresholds);
    let runner = ScenarioRunner::new(dispatcher, shutdown_tx.clone());

    let result = runner.run(&plans, &report).await;
    drop(shutdown_tx.send(()));
    signal_handle.await?;

    let snapshot = result?;
    Ok(evaluate(&snapshot, &thresholds))
}

fn load_pool(args: &HarnessArgs) -> AppResult<CredentialPool> {
    if args.use_sample_tokens {
        info!("Using sample tokens for testing");
        return Ok(CredentialPool::synthesize(args.sample_size.get())?);
    }

    match CredentialPool::load(Path::new(&args.token_file_path)) {
        Ok(pool) => {
            info!(
                "Loaded {} free tokens and {} premium tokens",
                pool.len(Tier::Free),
                pool.len(Tier::Premium)
            );
            Ok(pool)
        }
        Err(err) => {
            error!("Failed to load tokens: {}", err);
            error!("Provision tokens first or set USE_SAMPLE_TOKENS=true");
            Err(err.into())
        }
    }
}
