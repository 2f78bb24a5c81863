//! User-facing diagnostics.
//!
//! Operators write what went wrong here; callers decide how to show it.
//! Logging goes through `tracing` separately.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub level: ReportLevel,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reports {
    pub items: Vec<Report>,
}

impl Reports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, level: ReportLevel, message: impl Into<String>) {
        self.items.push(Report {
            level,
            message: message.into(),
        });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.report(ReportLevel::Error, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.report(ReportLevel::Info, message);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|r| r.level == ReportLevel::Error)
    }

    /// Message of the most recent error, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.items
            .iter()
            .rev()
            .find(|r| r.level == ReportLevel::Error)
            .map(|r| r.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
