//! Sink for resource misses worth surfacing to an operator.

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    FileNotFound,
    OutsideRootDirectory,
}

impl Display for ReportKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileNotFound => write!(f, "file not found"),
            Self::OutsideRootDirectory => write!(f, "file outside root directory"),
        }
    }
}

pub trait ErrorReporter: Send + Sync {
    fn report(&self, kind: ReportKind, context: &str);
}

/// Reports through `tracing` at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, kind: ReportKind, context: &str) {
        tracing::warn!(kind = %kind, context, "resource error");
    }
}
