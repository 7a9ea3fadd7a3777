mod cli;
mod config;
mod error;
mod hashing;
mod orchestrator;
mod registry;
mod state_machine;
mod strength;
mod technique;
mod ui;
mod view;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{AlgorithmArg, Cli, Command, TechniqueArg};
use config::HashcrackConfig;
use hashing::HashAlgorithm;
use orchestrator::JobOrchestrator;
use registry::SettingsUpdate;
use state_machine::JobId;
use technique::{Dictionary, TechniqueKind};
use view::ProgressView;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = HashcrackConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Crack {
            hash,
            algorithm,
            max_time,
            only,
            disable,
            dictionary,
            export,
            json,
        } => {
            let selection = Selection {
                only,
                disable,
                dictionary: dictionary.as_deref(),
            };
            let params = CrackParams {
                hash: &hash,
                algorithm,
                budget: Duration::from_secs(max_time),
                export: export.as_deref(),
                json,
            };
            run_crack(&config, selection, params).await
        }
        Command::Hash {
            plaintext,
            algorithm,
        } => {
            println!("{}", HashAlgorithm::from(algorithm).digest_hex(&plaintext));
            Ok(())
        }
        Command::Techniques => {
            let orchestrator = JobOrchestrator::from_config(&config);
            let settings = orchestrator.settings();
            let toggles: Vec<(TechniqueKind, bool)> =
                settings.toggles().iter().map(|(k, v)| (*k, *v)).collect();
            ui::print_techniques(&toggles);
            Ok(())
        }
    }
}

/// `LOG_FORMAT=json` for machine-readable logs, human-readable stderr otherwise.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("hashcrack=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hashcrack=info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").unwrap_or_default() == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .init();
    }
}

struct Selection<'a> {
    only: Vec<TechniqueArg>,
    disable: Vec<TechniqueArg>,
    dictionary: Option<&'a Path>,
}

struct CrackParams<'a> {
    hash: &'a str,
    algorithm: AlgorithmArg,
    budget: Duration,
    export: Option<&'a Path>,
    json: bool,
}

/// Folds `--only`, `--disable` and `--dictionary` into the configured toggles.
/// Returns `None` when the flags change nothing.
fn settings_from_flags(
    config: &HashcrackConfig,
    selection: Selection<'_>,
) -> Result<Option<SettingsUpdate>> {
    if selection.only.is_empty() && selection.disable.is_empty() && selection.dictionary.is_none() {
        return Ok(None);
    }

    let mut update = if selection.only.is_empty() {
        config.techniques.to_settings()
    } else {
        let kinds: Vec<TechniqueKind> = selection.only.into_iter().map(Into::into).collect();
        SettingsUpdate::only(&kinds)
    };
    for arg in selection.disable {
        update.set(arg.into(), false);
    }

    if let Some(path) = selection.dictionary {
        let dictionary = Dictionary::load(path, config.max_dictionary_bytes)
            .with_context(|| format!("loading dictionary {}", path.display()))?;
        info!(
            path = %path.display(),
            words = dictionary.words().len(),
            bytes = dictionary.size_bytes(),
            "custom dictionary loaded"
        );
        update = update.with_dictionary(dictionary);
    }
    Ok(Some(update))
}

/// Polls `id` until it is terminal. The first completion of `interrupt`
/// cancels the job; later polls no longer wait on it.
async fn follow_job(
    orchestrator: &JobOrchestrator,
    id: JobId,
    poll_interval: Duration,
    interrupt: impl Future<Output = std::io::Result<()>>,
    mut on_progress: impl FnMut(&ProgressView),
) -> Result<ProgressView> {
    let mut ticker = tokio::time::interval(poll_interval);
    tokio::pin!(interrupt);
    let mut interrupted = false;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            signal = &mut interrupt, if !interrupted => {
                interrupted = true;
                signal.context("listening for Ctrl-C")?;
                warn!(job_id = %id, "interrupted, cancelling job");
                orchestrator.cancel_job(id)?;
            }
        }

        let progress = orchestrator.get_progress(id)?;
        on_progress(&progress);
        if progress.is_terminal() {
            return Ok(progress);
        }
    }
}

async fn run_crack(
    config: &HashcrackConfig,
    selection: Selection<'_>,
    params: CrackParams<'_>,
) -> Result<()> {
    let orchestrator = Arc::new(JobOrchestrator::from_config(config));
    if let Some(update) = settings_from_flags(config, selection)? {
        orchestrator.update_settings(update)?;
    }

    let shutdown = CancellationToken::new();
    let reaper = orchestrator.spawn_reaper(config.reaper_interval(), shutdown.clone());

    let algorithm = HashAlgorithm::from(params.algorithm);
    let id = orchestrator.submit_job(params.hash, algorithm.as_str(), params.budget)?;
    debug!(job_id = %id, "polling job");

    let mut progress_ui = (!params.json).then(|| {
        let total = orchestrator.settings().enabled_kinds().len();
        ui::JobProgress::start(params.hash, total)
    });

    follow_job(
        &orchestrator,
        id,
        config.poll_interval(),
        tokio::signal::ctrl_c(),
        |progress| {
            if let Some(bar) = progress_ui.as_mut() {
                bar.update(progress);
            }
        },
    )
    .await?;

    let result = orchestrator.get_result(id)?;
    match &progress_ui {
        Some(bar) => bar.complete(&result),
        None => ui::print_json(&result).context("serializing result")?,
    }

    if let Some(path) = params.export {
        std::fs::write(path, result.to_report())
            .with_context(|| format!("writing report to {}", path.display()))?;
        info!(path = %path.display(), "report exported");
    }

    shutdown.cancel();
    reaper.await.context("reaper task failed")?;
    Ok(())
}
