use ecsbind_utils::ElapsedDisplay;
use std::{
    fmt::{self, Display},
    sync::Mutex,
    time::Duration,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// A compilation unit's symbol dump was read.
    Load,
    /// A toolchain metadata file was read.
    Resolve,
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Operation::Load => "Load",
            Operation::Resolve => "Resolve",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub operation: Operation,
    /// Time since loading started.
    pub elapsed: Duration,
    pub unit: String,
}

/// Receives load progress. Called from worker threads.
pub trait Progress: Sync {
    fn report(&self, event: &ProgressEvent);
}

/// Prints one aligned line per event to stdout.
pub struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn report(&self, event: &ProgressEvent) {
        println!(
            "{:<15} {:<15} {}",
            event.operation,
            ElapsedDisplay(event.elapsed),
            event.unit
        );
    }
}

/// Keeps every event, for tests and for callers that render progress themselves.
#[derive(Default)]
pub struct RecordedProgress {
    pub events: Mutex<Vec<ProgressEvent>>,
}

impl Progress for RecordedProgress {
    fn report(&self, event: &ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
