//! LIVE-mode scenario replay CLI
//!
//! Replays a recorded task scenario through the geofence, quest and
//! movement engines and reports every signal:
//! - Accelerated mode (default): instant replay for CI checks
//! - Realtime mode (1x): paced replay for watching a session unfold
//! - `[expect]` tables turn a scenario into a regression test

mod logging;
mod output;
mod replay;
mod scenario;
mod verification;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use hustle_core::{
    EngineConfig, EngineConfigExt, GeofenceRegion, GeofenceWatch, LiveContext, LiveSignal,
    ManualTicker, MovementSession, QuestAlert, SignalHandler, TracingHandler,
};

use crate::output::{CliOutput, OutputLevel};
use crate::replay::VirtualClock;
use crate::scenario::{EntryKind, QuestAction, Scenario};
use crate::verification::{FinalState, ScenarioVerifier, VerificationResult};

// ═══════════════════════════════════════════════════════════════════════════════
// CLI Arguments
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ReplayMode {
    /// 1x speed with actual timing delays
    Realtime,
    /// Fast replay with virtual time (default)
    #[default]
    Accelerated,
}

#[derive(Parser, Debug)]
#[command(name = "hustle-replay")]
#[command(about = "Replay LIVE-mode scenarios through the HustleXP engines")]
#[command(version)]
struct Args {
    /// Path to scenario TOML file
    #[arg(short, long)]
    scenario: PathBuf,

    // ─────────────────────────────────────────────────────────────────────────
    // Replay Mode
    // ─────────────────────────────────────────────────────────────────────────
    /// Replay mode
    #[arg(long, value_enum, default_value_t = ReplayMode::Accelerated)]
    mode: ReplayMode,

    /// Custom speed multiplier (overrides --mode)
    #[arg(long)]
    speed: Option<f32>,

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration
    // ─────────────────────────────────────────────────────────────────────────
    /// Engine config TOML (overrides the scenario's [config] table)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the stored user config instead of the scenario's
    #[arg(long, conflicts_with = "config")]
    user_config: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Output Mode
    // ─────────────────────────────────────────────────────────────────────────
    /// Quiet mode: summary only
    #[arg(short, long)]
    quiet: bool,

    /// Verbose mode: show every fix and debug logs
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Main
// ═══════════════════════════════════════════════════════════════════════════════

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose, args.quiet);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

/// Replay the scenario; returns whether every expectation held
fn run(args: &Args) -> Result<bool, Box<dyn std::error::Error>> {
    let output_level = if args.quiet {
        OutputLevel::Quiet
    } else if args.verbose {
        OutputLevel::Verbose
    } else {
        OutputLevel::Normal
    };
    let mut cli = CliOutput::new(output_level);

    let speed = args.speed.unwrap_or(match args.mode {
        ReplayMode::Realtime => 1.0,
        ReplayMode::Accelerated => 0.0, // Instant
    });

    let scenario = Scenario::load(&args.scenario)?;
    let config = if let Some(path) = &args.config {
        EngineConfig::load_from_path(path)?
    } else if args.user_config {
        EngineConfig::load()
    } else {
        scenario.config.clone().unwrap_or_default()
    };

    let result = replay_scenario(&scenario, config, &mut cli, speed, args.verbose)?;

    let checks = (result.checks_total > 0).then_some((result.checks_passed, result.checks_total));
    cli.print_summary(checks);
    cli.print_failures(&result.failures);
    cli.flush();

    Ok(result.passed())
}

/// Drive every timeline entry through a fresh context and verify the outcome
fn replay_scenario(
    scenario: &Scenario,
    config: EngineConfig,
    cli: &mut CliOutput,
    speed: f32,
    trace_signals: bool,
) -> Result<VerificationResult, Box<dyn std::error::Error>> {
    config.validate()?;

    let meta = &scenario.meta;
    let start = meta.start;
    let quest_window = scenario
        .quest
        .as_ref()
        .map(|q| q.window_secs.unwrap_or(config.quest.decision_window_secs));

    let mut context = LiveContext::new(config)?;
    if trace_signals {
        context.register_handler(Box::new(TracingHandler));
    }

    let region = GeofenceRegion::new(
        &scenario.region.id,
        &meta.task_id,
        scenario.region.center(),
        scenario.region.radius_m,
        start,
    )?;
    let mut watch = GeofenceWatch::new(region);
    let mut session = MovementSession::start(&meta.task_id, &meta.worker_id, start);
    let mut alert = match (&scenario.quest, quest_window) {
        (Some(quest), Some(window)) => Some(QuestAlert::broadcast(
            &quest.id,
            &meta.task_id,
            quest.payment_cents,
            window,
            start,
        )?),
        _ => None,
    };

    let timeline = scenario.timeline()?;
    let mut clock = VirtualClock::new(start, speed);
    tracing::info!(
        scenario = %meta.name,
        entries = timeline.len(),
        instant = clock.is_instant_mode(),
        "Starting replay"
    );

    cli.scenario_start(&meta.name, meta.description.as_deref(), start);
    let mut verifier = ScenarioVerifier::new(scenario.expect.clone().unwrap_or_default());
    context.begin_task(&meta.task_id);

    // ─── Timeline ───────────────────────────────────────────────────────────
    for entry in timeline {
        clock.advance_to(entry.at);
        cli.set_now(entry.at);

        match entry.kind {
            EntryKind::Sample(sample) => {
                let update = context.on_location(&mut watch, &mut session, sample, entry.at);
                match update.reading {
                    Ok(reading) => {
                        cli.reading(&reading);
                        emit(cli, &mut verifier, &reading.signals);
                    }
                    Err(err) => cli.rejected("geofence", &err),
                }
                match update.movement {
                    Ok(outcome) => emit(cli, &mut verifier, outcome.signals()),
                    Err(err) => cli.rejected("movement", &err),
                }
            }
            EntryKind::Action(QuestAction::CompleteSession) => {
                let outcome = context.complete_session(&mut session);
                emit(cli, &mut verifier, &outcome.signals);
            }
            EntryKind::Action(action) => {
                let Some(alert) = alert.as_mut() else {
                    cli.rejected(action.label(), &"scenario has no quest");
                    continue;
                };
                let signals = match &action {
                    QuestAction::Tick { secs } => context
                        .on_quest_drive(alert, &mut ManualTicker::seconds(*secs))
                        .map(|o| o.signals),
                    QuestAction::Sync => context.sync_quest(alert, &clock).map(|o| o.signals),
                    QuestAction::Boost { amount_cents } => context
                        .boost_quest(alert, *amount_cents)
                        .map(|o| o.signals),
                    QuestAction::Accept => context.accept_quest(alert).map(|o| o.signals),
                    QuestAction::Decline => context.decline_quest(alert).map(|o| o.signals),
                    QuestAction::Cancel => context.cancel_quest(alert).map(|o| o.signals),
                    QuestAction::CompleteSession => Ok(Vec::new()),
                };
                match signals {
                    Ok(signals) => emit(cli, &mut verifier, &signals),
                    Err(err) => cli.rejected(action.label(), &err),
                }
            }
        }
        cli.flush();
    }

    context.end_task(&meta.task_id);
    context.shutdown();
    tracing::debug!(elapsed = %clock.format_elapsed(), "Replay finished");

    // ─── Verification ───────────────────────────────────────────────────────
    let final_state = FinalState {
        session_status: session.status(),
        dropped_samples: session.dropped_samples(),
        quest_status: alert.as_ref().map(QuestAlert::status),
        payment_cents: alert.as_ref().map(QuestAlert::current_payment_cents),
    };
    Ok(verifier.finalize(&final_state))
}

fn emit(cli: &mut CliOutput, verifier: &mut ScenarioVerifier, signals: &[LiveSignal]) {
    cli.handle_signals(signals);
    for signal in signals {
        verifier.record_signal(signal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replay_bundled(content: &str) -> VerificationResult {
        let scenario = Scenario::parse(content).unwrap();
        let config = scenario.config.clone().unwrap_or_default();
        let mut cli = CliOutput::new(OutputLevel::Quiet);
        replay_scenario(&scenario, config, &mut cli, 0.0, false).unwrap()
    }

    #[test]
    fn test_walk_in_scenario_meets_expectations() {
        let result = replay_bundled(include_str!("../scenarios/walk_in_accept.toml"));
        assert!(result.passed(), "Failures: {:?}", result.failures);
        assert_eq!(result.checks_total, 6);
    }

    #[test]
    fn test_teleport_scenario_meets_expectations() {
        let result = replay_bundled(include_str!("../scenarios/teleport_expire.toml"));
        assert!(result.passed(), "Failures: {:?}", result.failures);
        assert_eq!(result.checks_total, 7);
    }

    #[test]
    fn test_invalid_config_is_rejected_before_replay() {
        let scenario = Scenario::parse(include_str!("../scenarios/walk_in_accept.toml")).unwrap();
        let mut config = EngineConfig::default();
        config.geofence.max_accuracy_m = 0.0;
        let mut cli = CliOutput::new(OutputLevel::Quiet);

        assert!(replay_scenario(&scenario, config, &mut cli, 0.0, false).is_err());
    }
}
