//! Identity verification commands.
//!
//! `verify liveness` replays a recorded frame script through the liveness
//! check, then records the outcome on the user's profile.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Subcommand;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{broadcast, oneshot};

use sh_core::config::ConfigHandle;
use sh_core::error::ShResult;
use sh_services::event_bus::AppEvent;
use sh_services::liveness::scripted::{FrameScript, ScriptedCamera, ScriptedDetector, ScriptedScheduler};
use sh_services::liveness::{LivenessControl, RunEnd};
use sh_services::SessionContext;

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum VerifyAction {
    /// Run a liveness check from a recorded frame script (JSON).
    Liveness {
        /// Frame script file. The result is recorded on the --user profile.
        #[arg(long)]
        frames: PathBuf,
    },
    /// Show a user's verification status.
    Status {
        /// Profile id (defaults to --user).
        profile: Option<String>,
    },
}

/// Mirror step changes onto the spinner until the bus closes or the task is aborted.
async fn follow_steps(mut rx: broadcast::Receiver<AppEvent>, pb: ProgressBar) {
    loop {
        match rx.recv().await {
            Ok(AppEvent::LivenessStepChanged { to, .. }) => {
                pb.set_message(format!("[{}] {}", to.as_str(), to.instruction()));
            }
            Ok(AppEvent::LivenessCountdown { remaining_secs }) => {
                pb.set_message(format!("Verified. Closing in {remaining_secs}s"));
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

pub async fn run(
    config: ConfigHandle,
    session: SessionContext,
    action: VerifyAction,
    format: OutputFormat,
) -> ShResult<()> {
    let registry = super::init_registry(&config, session).await;

    match action {
        VerifyAction::Liveness { frames } => {
            let script = Arc::new(FrameScript::load(&frames)?);
            let camera = ScriptedCamera::new(script.clone());
            let detector = ScriptedDetector::new(script.clone());
            let control = LivenessControl::new();
            let mut scheduler = ScriptedScheduler::new(script.len()).fail_when_exhausted(control.clone());
            let liveness = registry.liveness();

            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("  {spinner} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message("Starting camera...");
            if matches!(format, OutputFormat::Json) {
                pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
            }
            let follower = tokio::spawn(follow_steps(registry.event_bus().subscribe(), pb.clone()));

            let (tx, rx) = oneshot::channel();
            let result = liveness
                .run_check(&camera, &detector, &mut scheduler, &control, move |outcome| {
                    let _ = tx.send(outcome);
                })
                .await;
            follower.abort();
            pb.finish_and_clear();
            let report = match result {
                Ok(report) => report,
                Err(e) => {
                    super::print_toasts(&registry.notifications, format);
                    return Err(e);
                }
            };
            let outcome = rx.await.ok();

            let recorded = match (&outcome, registry.session.resolve_user(None).await) {
                (Some(outcome), Ok(user_id)) => {
                    match registry.verification().record_outcome(&user_id, outcome).await {
                        Ok(profile) => profile,
                        Err(e) => {
                            super::print_toasts(&registry.notifications, format);
                            return Err(e);
                        }
                    }
                }
                (Some(_), Err(_)) => {
                    tracing::info!("no user given, liveness result not recorded");
                    None
                }
                (None, _) => None,
            };

            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({
                    "report": report,
                    "outcome": outcome,
                    "profile": recorded,
                })),
                OutputFormat::Text => {
                    let verdict = match report.end {
                        RunEnd::Succeeded => style("PASSED").green().bold(),
                        RunEnd::Failed => style("FAILED").red().bold(),
                        RunEnd::TimedOut => style("TIMED OUT").red().bold(),
                        RunEnd::Stopped => style("STOPPED").yellow().bold(),
                    };
                    println!("  Liveness check {verdict}");
                    println!("  Reached step:    {}", report.final_step.as_str());
                    println!("  Blinks:          {}", report.blink_count);
                    println!(
                        "  Frames:          {} ({} without face, {} detector errors)",
                        report.frames_processed, report.frames_without_face, report.detection_errors
                    );
                    if let Some(outcome) = &outcome {
                        if outcome.success {
                            println!("  Still image:     {} bytes", outcome.image_len());
                        }
                    }
                    if let Some(profile) = &recorded {
                        println!(
                            "  Profile {}:     {}",
                            profile.id, profile.verification_status
                        );
                    }
                }
            }
        }
        VerifyAction::Status { profile } => {
            let user_id = registry.session.resolve_user(profile.as_deref()).await?;
            let profile = registry.verification().status(&user_id).await?;
            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({
                    "user_id": profile.id,
                    "liveness_verified": profile.liveness_verified,
                    "verification_status": profile.verification_status,
                })),
                OutputFormat::Text => {
                    let liveness = if profile.liveness_verified {
                        style("verified").green().to_string()
                    } else {
                        style("not verified").yellow().to_string()
                    };
                    println!("  User:          {}", profile.id);
                    println!("  Liveness:      {liveness}");
                    println!("  Verification:  {}", profile.verification_status);
                }
            }
        }
    }

    super::print_toasts(&registry.notifications, format);
    Ok(())
}
