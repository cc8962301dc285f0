//! `pdftrans translate`: run one translation job.

use super::super::TranslateArgs;
use anyhow::{Context, Result, bail};
use pdftrans::config::Settings;
use pdftrans::errors::JobError;
use pdftrans::job::{JobController, JobOptions, JobPhase};
use pdftrans::notify::TracingNotifier;
use pdftrans::progress::ProgressEngine;
use pdftrans::translator::CommandTranslator;
use pdftrans::ui::{TranslateUI, UiMode};
use std::sync::Arc;
use tracing::{debug, warn};

/// Job options from settings, with command-line flags taking precedence.
fn job_options(settings: &Settings, args: &TranslateArgs) -> JobOptions {
    let mut options = JobOptions::from_settings(settings);
    if let Some(ref dir) = args.output_dir {
        options.output_dir = Some(dir.clone());
    }
    if let Some(ref service) = args.service {
        options.service = service.clone();
    }
    if let Some(ref lang) = args.lang_in {
        options.lang_in = lang.clone();
    }
    if let Some(ref lang) = args.lang_out {
        options.lang_out = lang.clone();
    }
    options
}

pub async fn cmd_translate(settings: &Settings, args: &TranslateArgs, mode: UiMode) -> Result<()> {
    settings.check()?;

    let translator = Arc::new(CommandTranslator::from_settings(settings));
    let engine = ProgressEngine::new(
        settings.display_rules(),
        settings.output.split_carriage_returns,
    );
    let controller = JobController::spawn(
        translator,
        Arc::new(TracingNotifier),
        engine,
        job_options(settings, args),
    );

    let mut ui = TranslateUI::new(mode);
    let mut updates = controller.subscribe();

    match controller.start(&args.input).await {
        Ok(job_id) => debug!(%job_id, "job started"),
        Err(JobError::SpawnFailed(e)) => {
            ui.finish(&controller.snapshot());
            return Err(e).with_context(|| format!("Failed to run '{}'", settings.command()));
        }
        Err(e) => return Err(e.into()),
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if !snapshot.phase.is_active() {
                    break;
                }
                ui.render(&snapshot);
            }
            _ = &mut ctrl_c => {
                warn!("interrupted, cancelling translation");
                if let Err(e) = controller.cancel().await {
                    debug!(error = %e, "nothing to cancel");
                }
                break;
            }
        }
    }

    let snapshot = controller.wait_terminal().await?;
    ui.finish(&snapshot);

    match snapshot.phase {
        JobPhase::Succeeded => {
            if args.open {
                let artifacts = snapshot.artifacts.as_ref();
                match artifacts.and_then(|a| a.preferred()) {
                    Some(path) => open::that(path)
                        .with_context(|| format!("Failed to open {}", path.display()))?,
                    None => warn!("translation succeeded but no output PDF was found"),
                }
            }
            Ok(())
        }
        JobPhase::Cancelled => bail!("Translation cancelled"),
        _ => bail!(
            "{}",
            snapshot
                .log
                .last()
                .cloned()
                .unwrap_or_else(|| "Translation failed".to_string())
        ),
    }
}
