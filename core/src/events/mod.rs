pub mod handler;
pub mod signal;

pub use handler::{SignalHandler, SignalRecorder, TracingHandler};
pub use signal::LiveSignal;
