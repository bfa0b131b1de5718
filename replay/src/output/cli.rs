//! Colored CLI output for LIVE signals
//!
//! Formats Smart Start triggers, boosts, quest decisions and movement flags
//! with colored output for easy visual parsing.

use chrono::{DateTime, Utc};
use std::io::{self, IsTerminal, Write};

use hustle_core::{GeofenceReading, LiveSignal, ProximityState, SignalHandler};

/// Output verbosity level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum OutputLevel {
    /// Only show summary at end
    Quiet,
    /// Show signals and rejected actions (default)
    #[default]
    Normal,
    /// Also show every geofence reading
    Verbose,
}

/// CLI output formatter with color support
#[derive(Debug)]
pub struct CliOutput {
    level: OutputLevel,
    scenario_start: Option<DateTime<Utc>>,
    now: Option<DateTime<Utc>>,
    use_colors: bool,
    smart_starts: u32,
    boosts: u32,
    flags_raised: u32,
    samples_dropped: u32,
    rejections: u32,
    quest_outcome: Option<&'static str>,
}

impl Default for CliOutput {
    fn default() -> Self {
        Self::new(OutputLevel::Normal)
    }
}

impl CliOutput {
    pub fn new(level: OutputLevel) -> Self {
        Self {
            level,
            scenario_start: None,
            now: None,
            use_colors: io::stdout().is_terminal(),
            smart_starts: 0,
            boosts: 0,
            flags_raised: 0,
            samples_dropped: 0,
            rejections: 0,
            quest_outcome: None,
        }
    }

    /// Set scenario start for relative timestamps
    pub fn set_scenario_start(&mut self, time: DateTime<Utc>) {
        self.scenario_start = Some(time);
    }

    /// Set the time stamped on subsequent lines
    pub fn set_now(&mut self, time: DateTime<Utc>) {
        self.now = Some(time);
    }

    /// Format timestamp relative to scenario start
    pub fn format_time(&self, time: DateTime<Utc>) -> String {
        if let Some(start) = self.scenario_start {
            let secs = (time - start).num_milliseconds() as f32 / 1000.0;
            let mins = (secs / 60.0).floor() as u32;
            format!("{:02}:{:05.2}", mins, secs % 60.0)
        } else {
            time.format("%H:%M:%S%.3f").to_string()
        }
    }

    fn stamp(&self) -> String {
        self.now
            .map(|t| self.format_time(t))
            .unwrap_or_else(|| "--:--.--".to_string())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ANSI Color Codes
    // ═══════════════════════════════════════════════════════════════════════════

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.paint("32", text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint("33", text)
    }

    fn red(&self, text: &str) -> String {
        self.paint("31", text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint("36", text)
    }

    fn magenta(&self, text: &str) -> String {
        self.paint("35", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn bold(&self, text: &str) -> String {
        self.paint("1", text)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Event Output
    // ═══════════════════════════════════════════════════════════════════════════

    /// Print the scenario banner
    pub fn scenario_start(&mut self, name: &str, description: Option<&str>, start: DateTime<Utc>) {
        self.set_scenario_start(start);
        if self.level < OutputLevel::Normal {
            return;
        }

        let label = self.bold(&self.green(&format!("═══ {} ═══", name)));
        println!("\n{}", label);
        if let Some(description) = description {
            println!("{}", self.dim(description));
        }
        println!();
    }

    /// Log a geofence reading (verbose only, except untrusted fixes)
    pub fn reading(&self, reading: &GeofenceReading) {
        match &reading.state {
            ProximityState::Determinate {
                distance_m,
                contained,
                proximity,
            } => {
                if self.level < OutputLevel::Verbose {
                    return;
                }
                let label = self.dim("FIX:");
                println!(
                    "[{}] ... {} {:.1} m from {} ({}, {:.0}%)",
                    self.stamp(),
                    label,
                    distance_m,
                    reading.region_id,
                    if *contained { "inside" } else { "outside" },
                    proximity * 100.0
                );
            }
            ProximityState::Indeterminate { reason } => {
                if self.level < OutputLevel::Normal {
                    return;
                }
                let marker = self.yellow("???");
                let label = self.yellow("UNTRUSTED FIX:");
                println!("[{}] {} {} {}", self.stamp(), marker, label, reason);
            }
        }
    }

    /// Log an operation an engine refused
    pub fn rejected(&mut self, operation: &str, reason: &dyn std::fmt::Display) {
        self.rejections += 1;
        if self.level < OutputLevel::Normal {
            return;
        }

        let marker = self.dim("x--");
        let label = self.dim("REJECTED:");
        println!("[{}] {} {} {} ({})", self.stamp(), marker, label, operation, reason);
    }

    fn signal_line(&self, signal: &LiveSignal) -> String {
        match signal {
            LiveSignal::SmartStartTriggered {
                region_id,
                distance_m,
                ..
            } => format!(
                "{} {} {} ({:.1} m from center)",
                self.green("-->"),
                self.bold(&self.green("SMART START:")),
                region_id,
                distance_m
            ),
            LiveSignal::GeofenceExited {
                region_id,
                distance_m,
                ..
            } => format!(
                "{} {} {} ({:.1} m from center)",
                self.dim("<--"),
                self.dim("LEFT GEOFENCE:"),
                region_id,
                distance_m
            ),
            LiveSignal::PriceBoostApplied {
                quest_id,
                boost_cents,
                current_payment_cents,
                automatic,
                ..
            } => format!(
                "{} {} {} +{} → {}{}",
                self.cyan("$$$"),
                self.cyan("BOOST:"),
                quest_id,
                format_cents(*boost_cents),
                self.bold(&format_cents(*current_payment_cents)),
                if *automatic { " (auto)" } else { "" }
            ),
            LiveSignal::QuestAccepted {
                quest_id,
                payment_cents,
                remaining_secs,
                ..
            } => format!(
                "{} {} {} at {} ({}s left)",
                self.green("+++"),
                self.green("QUEST ACCEPTED:"),
                quest_id,
                format_cents(*payment_cents),
                remaining_secs
            ),
            LiveSignal::QuestDeclined {
                quest_id,
                remaining_secs,
                ..
            } => format!(
                "{} {} {} ({}s left)",
                self.yellow("---"),
                self.yellow("QUEST DECLINED:"),
                quest_id,
                remaining_secs
            ),
            LiveSignal::QuestExpired {
                quest_id,
                final_payment_cents,
                elapsed_secs,
                ..
            } => format!(
                "{} {} {} after {}s at {}",
                self.yellow("<<<"),
                self.yellow("QUEST EXPIRED:"),
                quest_id,
                elapsed_secs,
                format_cents(*final_payment_cents)
            ),
            LiveSignal::MovementFlagRaised { worker_id, flag, .. } => format!(
                "{} {} {} ({})",
                self.red("!!!"),
                self.red("FLAG:"),
                self.bold(flag.label()),
                worker_id
            ),
            LiveSignal::SampleDropped { reason, .. } => format!(
                "{} {} {}",
                self.magenta("xxx"),
                self.magenta("SAMPLE DROPPED:"),
                reason
            ),
            LiveSignal::SessionCompleted { summary, .. } => format!(
                "{} {} {} samples, {:.0} m, avg {:.1} m/s",
                self.cyan("==="),
                self.cyan("SESSION COMPLETE:"),
                summary.sample_count,
                summary.total_distance_m,
                summary.average_speed_mps
            ),
        }
    }

    fn tally(&mut self, signal: &LiveSignal) {
        match signal {
            LiveSignal::SmartStartTriggered { .. } => self.smart_starts += 1,
            LiveSignal::PriceBoostApplied { .. } => self.boosts += 1,
            LiveSignal::MovementFlagRaised { .. } => self.flags_raised += 1,
            LiveSignal::SampleDropped { .. } => self.samples_dropped += 1,
            LiveSignal::QuestAccepted { .. } => self.quest_outcome = Some("accepted"),
            LiveSignal::QuestDeclined { .. } => self.quest_outcome = Some("declined"),
            LiveSignal::QuestExpired { .. } => self.quest_outcome = Some("expired"),
            LiveSignal::GeofenceExited { .. } | LiveSignal::SessionCompleted { .. } => {}
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Summary Report
    // ═══════════════════════════════════════════════════════════════════════════

    /// Print final summary
    pub fn print_summary(&self, checks_passed: Option<(u32, u32)>) {
        let line = "═".repeat(51);
        println!();
        println!("{}", line);
        println!("  LIVE REPLAY SUMMARY");
        println!("{}", line);
        println!("Smart Starts:    {}", self.smart_starts);
        println!("Price Boosts:    {}", self.boosts);
        println!(
            "Flags Raised:    {}",
            if self.flags_raised > 0 {
                self.red(&self.flags_raised.to_string())
            } else {
                "0".to_string()
            }
        );
        println!("Dropped Samples: {}", self.samples_dropped);
        println!("Rejected Calls:  {}", self.rejections);
        println!(
            "Quest Outcome:   {}",
            self.quest_outcome.unwrap_or("still broadcasting")
        );

        if let Some((passed, total)) = checks_passed {
            let status = if passed == total {
                self.green(&format!("PASSED ({}/{})", passed, total))
            } else {
                self.red(&format!("FAILED ({}/{})", passed, total))
            };
            println!("Verification:    {}", status);
        }
        println!("{}", line);
    }

    /// Print verification failures, one per line
    pub fn print_failures(&self, failures: &[String]) {
        for failure in failures {
            println!("  {} {}", self.red("✗"), failure);
        }
    }

    /// Flush stdout
    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

impl SignalHandler for CliOutput {
    fn handle_signal(&mut self, signal: &LiveSignal) {
        self.tally(signal);
        if self.level < OutputLevel::Normal {
            return;
        }
        println!("[{}] {}", self.stamp(), self.signal_line(signal));
    }
}

fn format_cents(cents: u64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_format_time_relative() {
        let mut output = CliOutput::new(OutputLevel::Normal);
        output.set_scenario_start(start());

        assert_eq!(
            output.format_time(start() + Duration::milliseconds(15_230)),
            "00:15.23"
        );
        assert_eq!(
            output.format_time(start() + Duration::milliseconds(165_500)),
            "02:45.50"
        );
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(2_500), "$25.00");
        assert_eq!(format_cents(7), "$0.07");
    }

    #[test]
    fn test_quiet_still_tallies() {
        let mut output = CliOutput::new(OutputLevel::Quiet);
        output.set_scenario_start(start());

        output.handle_signal(&LiveSignal::QuestDeclined {
            quest_id: "quest-1".to_string(),
            task_id: "task-1".to_string(),
            remaining_secs: 12,
        });
        output.rejected("accept", &"quest already declined");

        assert_eq!(output.quest_outcome, Some("declined"));
        assert_eq!(output.rejections, 1);
    }
}
