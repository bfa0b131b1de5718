use super::signal::LiveSignal;

/// Trait for systems that react to LIVE-mode signals.
/// Implement this for notification banners, haptics, analytics sinks, etc.
pub trait SignalHandler {
    /// Handle a single signal
    fn handle_signal(&mut self, signal: &LiveSignal);

    /// Handle multiple signals (default implementation calls handle_signal for each)
    fn handle_signals(&mut self, signals: &[LiveSignal]) {
        for signal in signals {
            self.handle_signal(signal);
        }
    }

    /// Called when a task session starts (optional hook for reset logic)
    fn on_session_start(&mut self, _task_id: &str) {}

    /// Called when the owning context shuts down (optional hook for cleanup)
    fn on_session_end(&mut self, _task_id: &str) {}
}

/// Collects every signal it sees, in order
#[derive(Debug, Default, Clone)]
pub struct SignalRecorder {
    signals: Vec<LiveSignal>,
}

impl SignalRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> &[LiveSignal] {
        &self.signals
    }

    /// Number of recorded signals with the given label
    pub fn count(&self, label: &str) -> usize {
        self.signals.iter().filter(|s| s.label() == label).count()
    }

    pub fn drain(&mut self) -> Vec<LiveSignal> {
        std::mem::take(&mut self.signals)
    }
}

impl SignalHandler for SignalRecorder {
    fn handle_signal(&mut self, signal: &LiveSignal) {
        self.signals.push(signal.clone());
    }
}

/// Writes each signal to the `tracing` subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHandler;

impl SignalHandler for TracingHandler {
    fn handle_signal(&mut self, signal: &LiveSignal) {
        tracing::info!(
            signal = signal.label(),
            task_id = signal.task_id(),
            detail = ?signal,
            "LIVE signal"
        );
    }

    fn on_session_start(&mut self, task_id: &str) {
        tracing::debug!(task_id, "LIVE session started");
    }

    fn on_session_end(&mut self, task_id: &str) {
        tracing::debug!(task_id, "LIVE session ended");
    }
}
