// src/utils/diagnostics.rs
//! Logger capability handed to the extractors.
//!
//! The extraction routines never write to a global logger directly. They take
//! a `&dyn Diagnostics` so callers decide where anomalies go: the binary
//! forwards them to `tracing`, tests collect them in memory.

use std::fmt;
use std::sync::{Mutex, PoisonError};

pub trait Diagnostics: Send + Sync {
    /// A recoverable anomaly, e.g. a malformed cell that was skipped.
    fn warn(&self, message: fmt::Arguments<'_>);

    /// A condition the caller is about to abort on. Never exits the process.
    fn fatal(&self, message: fmt::Arguments<'_>);
}

/// Forwards to the `tracing` macros.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn warn(&self, message: fmt::Arguments<'_>) {
        tracing::warn!("{}", message);
    }

    fn fatal(&self, message: fmt::Arguments<'_>) {
        tracing::error!("{}", message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warn,
    Fatal,
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    messages: Mutex<Vec<(Severity, String)>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(Severity, String)> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(severity, _)| *severity == Severity::Warn)
            .map(|(_, msg)| msg)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    fn record(&self, severity: Severity, message: fmt::Arguments<'_>) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((severity, message.to_string()));
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn warn(&self, message: fmt::Arguments<'_>) {
        self.record(Severity::Warn, message);
    }

    fn fatal(&self, message: fmt::Arguments<'_>) {
        self.record(Severity::Fatal, message);
    }
}
